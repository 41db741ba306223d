use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use emporium_core::{DomainError, DomainResult, Entity, Slug, UserId, check_max_len, require_text};

use crate::MAX_NAME_LENGTH;
use crate::brand::BrandId;
use crate::category::CategoryId;

emporium_core::uuid_id! {
    /// Product identifier.
    pub struct ProductId; "ProductId"
}

/// Maximum length of the data sheet / tutorial links.
pub const MAX_LINK_LENGTH: usize = 250;

/// Draft of a product, before the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub category: CategoryId,
    pub created_by: UserId,
    pub title: String,
    pub brand: BrandId,
    pub description: String,
    pub data_sheet: Option<Url>,
    pub tutorial: Option<Url>,
    pub slug: Slug,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub in_stock: bool,
    pub is_active: bool,
}

impl NewProduct {
    /// In-stock, active product with an empty description and no links.
    pub fn new(
        category: CategoryId,
        brand: BrandId,
        created_by: UserId,
        title: impl Into<String>,
        slug: Slug,
        price: f64,
    ) -> Self {
        Self {
            category,
            created_by,
            title: title.into(),
            brand,
            description: String::new(),
            data_sheet: None,
            tutorial: None,
            slug,
            price,
            discount_price: None,
            in_stock: true,
            is_active: true,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(
            &self.title,
            self.data_sheet.as_ref(),
            self.tutorial.as_ref(),
            self.price,
            self.discount_price,
        )
    }

    /// Materialize the draft; `created` and `updated` both start at `at`.
    pub fn into_product(self, id: ProductId, at: DateTime<Utc>) -> Product {
        Product {
            id,
            category: self.category,
            created_by: self.created_by,
            title: self.title,
            brand: self.brand,
            description: self.description,
            data_sheet: self.data_sheet,
            tutorial: self.tutorial,
            slug: self.slug,
            price: self.price,
            discount_price: self.discount_price,
            in_stock: self.in_stock,
            is_active: self.is_active,
            created: at,
            updated: at,
        }
    }
}

/// A catalog product.
///
/// `slug` is not unique: several products may share one. `created` and
/// `updated` are maintained by the store; values written by callers are
/// ignored on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category: CategoryId,
    pub created_by: UserId,
    pub title: String,
    pub brand: BrandId,
    pub description: String,
    pub data_sheet: Option<Url>,
    pub tutorial: Option<Url>,
    pub slug: Slug,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub in_stock: bool,
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Product {
    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(
            &self.title,
            self.data_sheet.as_ref(),
            self.tutorial.as_ref(),
            self.price,
            self.discount_price,
        )
    }

    /// Price a customer pays: the discount price when one is set.
    pub fn effective_price(&self) -> f64 {
        self.discount_price.unwrap_or(self.price)
    }
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "product";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.title)
    }
}

fn validate_fields(
    title: &str,
    data_sheet: Option<&Url>,
    tutorial: Option<&Url>,
    price: f64,
    discount_price: Option<f64>,
) -> DomainResult<()> {
    require_text("title", title, MAX_NAME_LENGTH)?;
    validate_link("data_sheet", data_sheet)?;
    validate_link("tutorial", tutorial)?;
    validate_amount("price", price)?;
    if let Some(discount) = discount_price {
        validate_amount("discount_price", discount)?;
    }
    Ok(())
}

fn validate_link(field: &str, link: Option<&Url>) -> DomainResult<()> {
    let Some(link) = link else {
        return Ok(());
    };
    if !matches!(link.scheme(), "http" | "https") {
        return Err(DomainError::validation(format!(
            "{field} must be an http(s) URL (got scheme {:?})",
            link.scheme()
        )));
    }
    check_max_len(field, link.as_str(), MAX_LINK_LENGTH)
}

fn validate_amount(field: &str, amount: f64) -> DomainResult<()> {
    if !amount.is_finite() {
        return Err(DomainError::validation(format!("{field} must be a finite number")));
    }
    if amount < 0.0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}
