use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{DomainResult, Entity, check_max_len, require_text};

use crate::MAX_NAME_LENGTH;
use crate::image_ref::ImageRef;
use crate::product::ProductId;

emporium_core::uuid_id! {
    /// Product image identifier.
    pub struct ProductImageId; "ProductImageId"
}

/// Draft of a product image.
///
/// `image: None` means "use the store's placeholder".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductImage {
    pub product: ProductId,
    pub name: String,
    pub image: Option<ImageRef>,
    pub alt_text: Option<String>,
    pub is_feature: bool,
}

impl NewProductImage {
    pub fn new(product: ProductId, name: impl Into<String>) -> Self {
        Self {
            product,
            name: name.into(),
            image: None,
            alt_text: None,
            is_feature: false,
        }
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_feature = true;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(&self.name, self.alt_text.as_deref())
    }

    pub fn into_product_image(
        self,
        id: ProductImageId,
        placeholder: &ImageRef,
        at: DateTime<Utc>,
    ) -> ProductImage {
        ProductImage {
            id,
            product: self.product,
            name: self.name,
            image: self.image.unwrap_or_else(|| placeholder.clone()),
            alt_text: self.alt_text,
            is_feature: self.is_feature,
            created_at: at,
            updated_at: at,
        }
    }
}

/// An image attached to a product.
///
/// Images have no canonical path of their own; link to the owning product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product: ProductId,
    pub name: String,
    pub image: ImageRef,
    pub alt_text: Option<String>,
    pub is_feature: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductImage {
    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(&self.name, self.alt_text.as_deref())
    }

    /// Alt text for rendering, falling back to the image name.
    pub fn alt_text_or_name(&self) -> &str {
        self.alt_text.as_deref().unwrap_or(&self.name)
    }
}

impl Entity for ProductImage {
    type Id = ProductImageId;
    const KIND: &'static str = "product image";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for ProductImage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

fn validate_fields(name: &str, alt_text: Option<&str>) -> DomainResult<()> {
    require_text("name", name, MAX_NAME_LENGTH)?;
    if let Some(alt) = alt_text {
        check_max_len("alt_text", alt, MAX_NAME_LENGTH)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_placeholder_and_not_featured() {
        let at = Utc::now();
        let image = NewProductImage::new(ProductId::new(), "front")
            .into_product_image(ProductImageId::new(), &ImageRef::placeholder(), at);
        assert!(image.image.is_placeholder());
        assert!(!image.is_feature);
        assert_eq!(image.alt_text, None);
        assert_eq!(image.created_at, at);
        assert_eq!(image.updated_at, at);
    }

    #[test]
    fn explicit_image_wins_over_placeholder() {
        let uploaded = ImageRef::uploaded("front.jpg").unwrap();
        let image = NewProductImage::new(ProductId::new(), "front")
            .with_image(uploaded.clone())
            .featured()
            .into_product_image(ProductImageId::new(), &ImageRef::placeholder(), Utc::now());
        assert_eq!(image.image, uploaded);
        assert!(image.is_feature);
    }

    #[test]
    fn alt_text_is_optional_but_bounded() {
        let draft = NewProductImage::new(ProductId::new(), "front");
        assert!(draft.validate().is_ok());
        assert!(draft.clone().with_alt_text("").validate().is_ok());
        assert!(
            draft
                .with_alt_text("x".repeat(MAX_NAME_LENGTH + 1))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn alt_text_falls_back_to_name() {
        let mut image = NewProductImage::new(ProductId::new(), "front")
            .into_product_image(ProductImageId::new(), &ImageRef::placeholder(), Utc::now());
        assert_eq!(image.alt_text_or_name(), "front");
        image.alt_text = Some("Hammer, front view".to_string());
        assert_eq!(image.alt_text_or_name(), "Hammer, front view");
        assert_eq!(image.to_string(), "front");
    }
}
