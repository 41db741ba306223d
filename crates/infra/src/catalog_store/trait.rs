use serde::Serialize;
use thiserror::Error;

use emporium_catalog::{
    Brand, BrandId, Category, CategoryId, NewBrand, NewCategory, NewProduct, NewProductImage,
    Product, ProductId, ProductImage, ProductImageId,
};
use emporium_core::{DomainError, Entity, Slug, UserId};

/// Catalog store operation error.
///
/// ## Error Categories
///
/// - **Validation**: missing/invalid field or duplicate unique slug
/// - **NotFound**: the targeted record does not exist (any more)
/// - **Referential**: a referenced brand/category/product does not exist
/// - **Storage**: the backend itself failed (poisoned lock, database I/O)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogStoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("referential integrity violated: {0}")]
    Referential(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl CatalogStoreError {
    pub fn not_found<E: Entity>(id: &E::Id) -> Self {
        Self::NotFound {
            entity: E::KIND,
            id: id.to_string(),
        }
    }

    /// `NotFound` for a record that was read earlier but is gone now.
    pub fn vanished<E: Entity>(entity: &E) -> Self {
        Self::not_found::<E>(entity.id())
    }

    pub fn duplicate_slug<E: Entity>(slug: &Slug) -> Self {
        Self::Validation(format!("{} with slug '{}' already exists", E::KIND, slug))
    }

    pub fn missing_reference<E: Entity>(id: &E::Id) -> Self {
        Self::Referential(format!("referenced {} {} does not exist", E::KIND, id))
    }
}

impl From<DomainError> for CatalogStoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::Validation(format!("invalid identifier: {msg}")),
        }
    }
}

/// What a delete removed, cascades included.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub brands: usize,
    pub categories: usize,
    pub products: usize,
    pub images: usize,
}

impl DeleteSummary {
    pub fn total(&self) -> usize {
        self.brands + self.categories + self.products + self.images
    }
}

/// Persistent catalog storage.
///
/// Every mutation is atomic at the operation level: a cascade either removes
/// all dependents or nothing. Product listings are ordered newest `created`
/// first (ties broken by id, newest first).
///
/// Two product read scopes exist and both are explicit:
/// [`list_all_products`](CatalogStore::list_all_products) and
/// [`list_active_products`](CatalogStore::list_active_products). The active
/// scope is re-derived from `is_active` on every call.
pub trait CatalogStore: Send + Sync {
    // Brands

    /// Insert a brand; fails with `Validation` on a duplicate slug.
    fn create_brand(&self, brand: NewBrand) -> Result<Brand, CatalogStoreError>;
    fn update_brand(&self, brand: &Brand) -> Result<Brand, CatalogStoreError>;
    /// Delete a brand and, transitively, its products and their images.
    fn delete_brand(&self, id: BrandId) -> Result<DeleteSummary, CatalogStoreError>;
    fn get_brand(&self, id: BrandId) -> Result<Option<Brand>, CatalogStoreError>;
    fn find_brand_by_slug(&self, slug: &Slug) -> Result<Option<Brand>, CatalogStoreError>;
    /// All brands, ordered by name (byte order, so `"Zeta"` sorts before
    /// `"acme"`), then id.
    fn list_brands(&self) -> Result<Vec<Brand>, CatalogStoreError>;

    // Categories

    fn create_category(&self, category: NewCategory) -> Result<Category, CatalogStoreError>;
    fn update_category(&self, category: &Category) -> Result<Category, CatalogStoreError>;
    fn delete_category(&self, id: CategoryId) -> Result<DeleteSummary, CatalogStoreError>;
    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, CatalogStoreError>;
    fn find_category_by_slug(&self, slug: &Slug)
    -> Result<Option<Category>, CatalogStoreError>;
    /// All categories, in the same order as [`list_brands`](CatalogStore::list_brands).
    fn list_categories(&self) -> Result<Vec<Category>, CatalogStoreError>;

    // Products

    /// Insert a product; `created` and `updated` are set to the current time.
    fn create_product(&self, product: NewProduct) -> Result<Product, CatalogStoreError>;
    /// Rewrite a product; keeps the stored `created`, advances `updated`.
    fn update_product(&self, product: &Product) -> Result<Product, CatalogStoreError>;
    fn delete_product(&self, id: ProductId) -> Result<DeleteSummary, CatalogStoreError>;
    fn get_product(&self, id: ProductId) -> Result<Option<Product>, CatalogStoreError>;
    fn list_all_products(&self) -> Result<Vec<Product>, CatalogStoreError>;
    fn list_active_products(&self) -> Result<Vec<Product>, CatalogStoreError>;
    fn list_active_products_in_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, CatalogStoreError>;
    fn list_active_products_by_brand(
        &self,
        brand: BrandId,
    ) -> Result<Vec<Product>, CatalogStoreError>;
    /// Cascade for a deleted identity: drop every product it created.
    fn remove_products_created_by(&self, user: UserId)
    -> Result<DeleteSummary, CatalogStoreError>;

    // Product images

    /// Insert an image; a missing `image` falls back to the store placeholder.
    fn create_product_image(
        &self,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogStoreError>;
    fn update_product_image(&self, image: &ProductImage)
    -> Result<ProductImage, CatalogStoreError>;
    fn delete_product_image(&self, id: ProductImageId)
    -> Result<DeleteSummary, CatalogStoreError>;
    fn get_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<Option<ProductImage>, CatalogStoreError>;
    /// Images of a product: featured first, then oldest first.
    fn list_product_images(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, CatalogStoreError>;

    fn featured_image(
        &self,
        product: ProductId,
    ) -> Result<Option<ProductImage>, CatalogStoreError> {
        Ok(self
            .list_product_images(product)?
            .into_iter()
            .find(|image| image.is_feature))
    }
}

/// Async form of [`CatalogStore`], for backends that talk to a database.
///
/// Same operations and semantics. Every [`InMemoryCatalogStore`] implements
/// it too, so callers can be written once against this trait and run on
/// either backend.
///
/// [`InMemoryCatalogStore`]: super::InMemoryCatalogStore
#[async_trait::async_trait]
pub trait AsyncCatalogStore: Send + Sync {
    // Brands

    async fn create_brand(&self, brand: NewBrand) -> Result<Brand, CatalogStoreError>;
    async fn update_brand(&self, brand: &Brand) -> Result<Brand, CatalogStoreError>;
    async fn delete_brand(&self, id: BrandId) -> Result<DeleteSummary, CatalogStoreError>;
    async fn get_brand(&self, id: BrandId) -> Result<Option<Brand>, CatalogStoreError>;
    async fn find_brand_by_slug(&self, slug: &Slug) -> Result<Option<Brand>, CatalogStoreError>;
    async fn list_brands(&self) -> Result<Vec<Brand>, CatalogStoreError>;

    // Categories

    async fn create_category(&self, category: NewCategory)
    -> Result<Category, CatalogStoreError>;
    async fn update_category(&self, category: &Category)
    -> Result<Category, CatalogStoreError>;
    async fn delete_category(&self, id: CategoryId)
    -> Result<DeleteSummary, CatalogStoreError>;
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, CatalogStoreError>;
    async fn find_category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, CatalogStoreError>;
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogStoreError>;

    // Products

    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogStoreError>;
    async fn update_product(&self, product: &Product) -> Result<Product, CatalogStoreError>;
    async fn delete_product(&self, id: ProductId) -> Result<DeleteSummary, CatalogStoreError>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, CatalogStoreError>;
    async fn list_all_products(&self) -> Result<Vec<Product>, CatalogStoreError>;
    async fn list_active_products(&self) -> Result<Vec<Product>, CatalogStoreError>;
    async fn list_active_products_in_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, CatalogStoreError>;
    async fn list_active_products_by_brand(
        &self,
        brand: BrandId,
    ) -> Result<Vec<Product>, CatalogStoreError>;
    async fn remove_products_created_by(
        &self,
        user: UserId,
    ) -> Result<DeleteSummary, CatalogStoreError>;

    // Product images

    async fn create_product_image(
        &self,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogStoreError>;
    async fn update_product_image(
        &self,
        image: &ProductImage,
    ) -> Result<ProductImage, CatalogStoreError>;
    async fn delete_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<DeleteSummary, CatalogStoreError>;
    async fn get_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<Option<ProductImage>, CatalogStoreError>;
    async fn list_product_images(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, CatalogStoreError>;
    async fn featured_image(
        &self,
        product: ProductId,
    ) -> Result<Option<ProductImage>, CatalogStoreError>;
}
