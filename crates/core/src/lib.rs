//! `emporium-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod slug;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, check_max_len, require_text};
pub use id::UserId;
pub use slug::{Slug, SlugError};
pub use uuid::Uuid;
pub use value_object::ValueObject;
