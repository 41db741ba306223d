//! Identity for stored records.

use core::fmt::{Debug, Display};
use core::hash::Hash;

/// A record whose identity survives updates to its fields.
///
/// `KIND` names the record type in error messages and log fields, e.g.
/// `"brand"` or `"product image"`.
pub trait Entity {
    type Id: Copy + Eq + Hash + Debug + Display;

    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
}
