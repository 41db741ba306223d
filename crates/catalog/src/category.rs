use serde::{Deserialize, Serialize};

use emporium_core::{DomainResult, Entity, Slug, require_text};

use crate::MAX_NAME_LENGTH;

emporium_core::uuid_id! {
    /// Category identifier.
    pub struct CategoryId; "CategoryId"
}

/// Draft of a category, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: Slug,
    pub is_active: bool,
}

impl NewCategory {
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

    pub fn into_category(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name,
            slug: self.slug,
            is_active: self.is_active,
        }
    }
}

/// A product category. `slug` is unique across all categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub is_active: bool,
}

impl Category {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name, MAX_NAME_LENGTH)
    }
}

impl Entity for Category {
    type Id = CategoryId;
    const KIND: &'static str = "category";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
