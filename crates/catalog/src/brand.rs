use serde::{Deserialize, Serialize};

use emporium_core::{DomainResult, Entity, Slug, require_text};

use crate::MAX_NAME_LENGTH;

emporium_core::uuid_id! {
    /// Brand identifier.
    pub struct BrandId; "BrandId"
}

/// Draft of a brand, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBrand {
    pub name: String,
    pub slug: Slug,
    pub is_active: bool,
}

impl NewBrand {
    /// Active brand with the given name and slug.
    pub fn new(name: impl Into<String>, slug: Slug) -> Self {
        Self {
            name: name.into(),
            slug,
            is_active: true,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name, MAX_NAME_LENGTH)
    }

    pub fn into_brand(self, id: BrandId) -> Brand {
        Brand {
            id,
            name: self.name,
            slug: self.slug,
            is_active: self.is_active,
        }
    }
}

/// A product brand. `slug` is unique across all brands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: Slug,
    pub is_active: bool,
}

impl Brand {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name, MAX_NAME_LENGTH)
    }
}

impl Entity for Brand {
    type Id = BrandId;
    const KIND: &'static str = "brand";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Brand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emporium_core::DomainError;

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    #[test]
    fn new_brand_defaults_to_active() {
        let draft = NewBrand::new("Acme", slug("acme"));
        assert!(draft.is_active);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let draft = NewBrand::new("  ", slug("acme"));
        match draft.validate() {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, "name is required"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn overlong_name_is_rejected() {
        let draft = NewBrand::new("x".repeat(MAX_NAME_LENGTH + 1), slug("acme"));
        assert!(draft.validate().is_err());
    }

    #[test]
    fn into_brand_keeps_fields_and_displays_name() {
        let id = BrandId::new();
        let brand = NewBrand::new("Acme", slug("acme")).into_brand(id);
        assert_eq!(brand.id, id);
        assert_eq!(brand.slug.as_str(), "acme");
        assert_eq!(brand.to_string(), "Acme");
        assert_eq!(*Entity::id(&brand), id);
    }
}
