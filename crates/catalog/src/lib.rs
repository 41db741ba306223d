//! Catalog domain module.
//!
//! Entities, drafts and field validation for brands, categories, products and
//! product images, plus canonical-path resolution. Everything here is pure;
//! persistence (uniqueness, references, cascades, timestamps) lives in
//! `emporium-infra`.

pub mod brand;
pub mod category;
pub mod image_ref;
pub mod product;
pub mod product_image;
pub mod routing;

pub use brand::{Brand, BrandId, NewBrand};
pub use category::{Category, CategoryId, NewCategory};
pub use image_ref::{ImageRef, ImageRefError};
pub use product::{NewProduct, Product, ProductId};
pub use product_image::{NewProductImage, ProductImage, ProductImageId};
pub use routing::{CanonicalPath, Route, RouteResolver, StorePaths, resolve_canonical_path};

/// Maximum length of `name`/`title` style text columns.
pub const MAX_NAME_LENGTH: usize = 255;
