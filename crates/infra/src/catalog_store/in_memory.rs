use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use emporium_catalog::{
    Brand, BrandId, Category, CategoryId, ImageRef, NewBrand, NewCategory, NewProduct,
    NewProductImage, Product, ProductId, ProductImage, ProductImageId,
};
use emporium_core::{Slug, UserId};

use super::clock::{Clock, SystemClock, advance_past};
use super::r#trait::{CatalogStore, CatalogStoreError, DeleteSummary};

#[derive(Debug, Default)]
struct Tables {
    brands: HashMap<BrandId, Brand>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    images: HashMap<ProductImageId, ProductImage>,
}

impl Tables {
    fn brand_slug_taken(&self, slug: &Slug, except: Option<BrandId>) -> bool {
        self.brands
            .values()
            .any(|b| &b.slug == slug && Some(b.id) != except)
    }

    fn category_slug_taken(&self, slug: &Slug, except: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| &c.slug == slug && Some(c.id) != except)
    }

    fn check_product_refs(
        &self,
        category: CategoryId,
        brand: BrandId,
    ) -> Result<(), CatalogStoreError> {
        if !self.categories.contains_key(&category) {
            return Err(CatalogStoreError::missing_reference::<Category>(&category));
        }
        if !self.brands.contains_key(&brand) {
            return Err(CatalogStoreError::missing_reference::<Brand>(&brand));
        }
        Ok(())
    }

    /// Remove the given products and every image hanging off them.
    fn cascade_products(&mut self, doomed: HashSet<ProductId>, summary: &mut DeleteSummary) {
        if doomed.is_empty() {
            return;
        }
        let before = self.images.len();
        self.images.retain(|_, image| !doomed.contains(&image.product));
        summary.images += before - self.images.len();

        let before = self.products.len();
        self.products.retain(|id, _| !doomed.contains(id));
        summary.products += before - self.products.len();
    }

    fn products_where(&self, keep: impl Fn(&Product) -> bool) -> Vec<Product> {
        let mut out: Vec<Product> = self.products.values().filter(|&p| keep(p)).cloned().collect();
        sort_newest_first(&mut out);
        out
    }
}

/// Newest `created` first; ids (UUIDv7) break ties the same way.
fn sort_newest_first(products: &mut [Product]) {
    products.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
}

/// In-memory catalog store.
///
/// Intended for tests/dev. All four tables sit behind one `RwLock`, so each
/// operation (cascades included) is atomic. Cascades are explicit here; the
/// Postgres schema gets the same behaviour from `ON DELETE CASCADE`.
#[derive(Debug)]
pub struct InMemoryCatalogStore<C = SystemClock> {
    tables: RwLock<Tables>,
    clock: C,
    placeholder: ImageRef,
}

impl InMemoryCatalogStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryCatalogStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryCatalogStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
            placeholder: ImageRef::placeholder(),
        }
    }

    /// Override the image used when a product image is created without one.
    pub fn with_placeholder(mut self, placeholder: ImageRef) -> Self {
        self.placeholder = placeholder;
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, CatalogStoreError> {
        self.tables
            .read()
            .map_err(|_| CatalogStoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, CatalogStoreError> {
        self.tables
            .write()
            .map_err(|_| CatalogStoreError::Storage("lock poisoned".to_string()))
    }
}

impl<C: Clock> CatalogStore for InMemoryCatalogStore<C> {
    fn create_brand(&self, brand: NewBrand) -> Result<Brand, CatalogStoreError> {
        brand.validate()?;
        let mut tables = self.write()?;
        if tables.brand_slug_taken(&brand.slug, None) {
            return Err(CatalogStoreError::duplicate_slug::<Brand>(&brand.slug));
        }
        let brand = brand.into_brand(BrandId::new());
        tables.brands.insert(brand.id, brand.clone());
        debug!(brand_id = %brand.id, slug = %brand.slug, "brand created");
        Ok(brand)
    }

    fn update_brand(&self, brand: &Brand) -> Result<Brand, CatalogStoreError> {
        brand.validate()?;
        let mut tables = self.write()?;
        if !tables.brands.contains_key(&brand.id) {
            return Err(CatalogStoreError::vanished(brand));
        }
        if tables.brand_slug_taken(&brand.slug, Some(brand.id)) {
            return Err(CatalogStoreError::duplicate_slug::<Brand>(&brand.slug));
        }
        tables.brands.insert(brand.id, brand.clone());
        debug!(brand_id = %brand.id, "brand updated");
        Ok(brand.clone())
    }

    fn delete_brand(&self, id: BrandId) -> Result<DeleteSummary, CatalogStoreError> {
        let mut tables = self.write()?;
        if tables.brands.remove(&id).is_none() {
            return Err(CatalogStoreError::not_found::<Brand>(&id));
        }
        let mut summary = DeleteSummary {
            brands: 1,
            ..DeleteSummary::default()
        };
        let doomed = tables
            .products
            .values()
            .filter(|p| p.brand == id)
            .map(|p| p.id)
            .collect();
        tables.cascade_products(doomed, &mut summary);
        info!(
            brand_id = %id,
            products = summary.products,
            images = summary.images,
            "brand deleted"
        );
        Ok(summary)
    }

    fn get_brand(&self, id: BrandId) -> Result<Option<Brand>, CatalogStoreError> {
        Ok(self.read()?.brands.get(&id).cloned())
    }

    fn find_brand_by_slug(&self, slug: &Slug) -> Result<Option<Brand>, CatalogStoreError> {
        Ok(self.read()?.brands.values().find(|b| &b.slug == slug).cloned())
    }

    fn list_brands(&self) -> Result<Vec<Brand>, CatalogStoreError> {
        let mut brands: Vec<Brand> = self.read()?.brands.values().cloned().collect();
        brands.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(brands)
    }

    fn create_category(&self, category: NewCategory) -> Result<Category, CatalogStoreError> {
        category.validate()?;
        let mut tables = self.write()?;
        if tables.category_slug_taken(&category.slug, None) {
            return Err(CatalogStoreError::duplicate_slug::<Category>(&category.slug));
        }
        let category = category.into_category(CategoryId::new());
        tables.categories.insert(category.id, category.clone());
        debug!(category_id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    fn update_category(&self, category: &Category) -> Result<Category, CatalogStoreError> {
        category.validate()?;
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&category.id) {
            return Err(CatalogStoreError::vanished(category));
        }
        if tables.category_slug_taken(&category.slug, Some(category.id)) {
            return Err(CatalogStoreError::duplicate_slug::<Category>(&category.slug));
        }
        tables.categories.insert(category.id, category.clone());
        debug!(category_id = %category.id, "category updated");
        Ok(category.clone())
    }

    fn delete_category(&self, id: CategoryId) -> Result<DeleteSummary, CatalogStoreError> {
        let mut tables = self.write()?;
        if tables.categories.remove(&id).is_none() {
            return Err(CatalogStoreError::not_found::<Category>(&id));
        }
        let mut summary = DeleteSummary {
            categories: 1,
            ..DeleteSummary::default()
        };
        let doomed = tables
            .products
            .values()
            .filter(|p| p.category == id)
            .map(|p| p.id)
            .collect();
        tables.cascade_products(doomed, &mut summary);
        info!(
            category_id = %id,
            products = summary.products,
            images = summary.images,
            "category deleted"
        );
        Ok(summary)
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, CatalogStoreError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    fn find_category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, CatalogStoreError> {
        Ok(self
            .read()?
            .categories
            .values()
            .find(|c| &c.slug == slug)
            .cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>, CatalogStoreError> {
        let mut categories: Vec<Category> = self.read()?.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    fn create_product(&self, product: NewProduct) -> Result<Product, CatalogStoreError> {
        product.validate()?;
        let mut tables = self.write()?;
        tables.check_product_refs(product.category, product.brand)?;
        let product = product.into_product(ProductId::new(), self.clock.now());
        tables.products.insert(product.id, product.clone());
        debug!(product_id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    fn update_product(&self, product: &Product) -> Result<Product, CatalogStoreError> {
        product.validate()?;
        let mut tables = self.write()?;
        let (created, previous) = match tables.products.get(&product.id) {
            Some(stored) => (stored.created, stored.updated),
            None => return Err(CatalogStoreError::vanished(product)),
        };
        tables.check_product_refs(product.category, product.brand)?;

        let mut saved = product.clone();
        saved.created = created;
        saved.updated = advance_past(previous, self.clock.now());
        tables.products.insert(saved.id, saved.clone());
        debug!(product_id = %saved.id, is_active = saved.is_active, "product updated");
        Ok(saved)
    }

    fn delete_product(&self, id: ProductId) -> Result<DeleteSummary, CatalogStoreError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&id) {
            return Err(CatalogStoreError::not_found::<Product>(&id));
        }
        let mut summary = DeleteSummary::default();
        tables.cascade_products(HashSet::from([id]), &mut summary);
        info!(product_id = %id, images = summary.images, "product deleted");
        Ok(summary)
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, CatalogStoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    fn list_all_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        Ok(self.read()?.products_where(|_| true))
    }

    fn list_active_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        Ok(self.read()?.products_where(|p| p.is_active))
    }

    fn list_active_products_in_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, CatalogStoreError> {
        Ok(self
            .read()?
            .products_where(|p| p.is_active && p.category == category))
    }

    fn list_active_products_by_brand(
        &self,
        brand: BrandId,
    ) -> Result<Vec<Product>, CatalogStoreError> {
        Ok(self.read()?.products_where(|p| p.is_active && p.brand == brand))
    }

    fn remove_products_created_by(
        &self,
        user: UserId,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        let mut tables = self.write()?;
        let doomed = tables
            .products
            .values()
            .filter(|p| p.created_by == user)
            .map(|p| p.id)
            .collect();
        let mut summary = DeleteSummary::default();
        tables.cascade_products(doomed, &mut summary);
        info!(
            user_id = %user,
            products = summary.products,
            images = summary.images,
            "creator's products removed"
        );
        Ok(summary)
    }

    fn create_product_image(
        &self,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogStoreError> {
        image.validate()?;
        let mut tables = self.write()?;
        if !tables.products.contains_key(&image.product) {
            return Err(CatalogStoreError::missing_reference::<Product>(&image.product));
        }
        let image =
            image.into_product_image(ProductImageId::new(), &self.placeholder, self.clock.now());
        tables.images.insert(image.id, image.clone());
        debug!(image_id = %image.id, product_id = %image.product, "product image created");
        Ok(image)
    }

    fn update_product_image(
        &self,
        image: &ProductImage,
    ) -> Result<ProductImage, CatalogStoreError> {
        image.validate()?;
        let mut tables = self.write()?;
        let (created_at, previous) = match tables.images.get(&image.id) {
            Some(stored) => (stored.created_at, stored.updated_at),
            None => return Err(CatalogStoreError::vanished(image)),
        };
        if !tables.products.contains_key(&image.product) {
            return Err(CatalogStoreError::missing_reference::<Product>(&image.product));
        }

        let mut saved = image.clone();
        saved.created_at = created_at;
        saved.updated_at = advance_past(previous, self.clock.now());
        tables.images.insert(saved.id, saved.clone());
        debug!(image_id = %saved.id, "product image updated");
        Ok(saved)
    }

    fn delete_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        let mut tables = self.write()?;
        if tables.images.remove(&id).is_none() {
            return Err(CatalogStoreError::not_found::<ProductImage>(&id));
        }
        debug!(image_id = %id, "product image deleted");
        Ok(DeleteSummary {
            images: 1,
            ..DeleteSummary::default()
        })
    }

    fn get_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<Option<ProductImage>, CatalogStoreError> {
        Ok(self.read()?.images.get(&id).cloned())
    }

    fn list_product_images(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, CatalogStoreError> {
        let mut images: Vec<ProductImage> = self
            .read()?
            .images
            .values()
            .filter(|image| image.product == product)
            .cloned()
            .collect();
        images.sort_by(|a, b| {
            b.is_feature
                .cmp(&a.is_feature)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(images)
    }
}

// Every call completes without awaiting; the async form only forwards.
#[async_trait::async_trait]
impl<C: Clock> super::r#trait::AsyncCatalogStore for InMemoryCatalogStore<C> {
    async fn create_brand(&self, brand: NewBrand) -> Result<Brand, CatalogStoreError> {
        CatalogStore::create_brand(self, brand)
    }

    async fn update_brand(&self, brand: &Brand) -> Result<Brand, CatalogStoreError> {
        CatalogStore::update_brand(self, brand)
    }

    async fn delete_brand(&self, id: BrandId) -> Result<DeleteSummary, CatalogStoreError> {
        CatalogStore::delete_brand(self, id)
    }

    async fn get_brand(&self, id: BrandId) -> Result<Option<Brand>, CatalogStoreError> {
        CatalogStore::get_brand(self, id)
    }

    async fn find_brand_by_slug(&self, slug: &Slug) -> Result<Option<Brand>, CatalogStoreError> {
        CatalogStore::find_brand_by_slug(self, slug)
    }

    async fn list_brands(&self) -> Result<Vec<Brand>, CatalogStoreError> {
        CatalogStore::list_brands(self)
    }

    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<Category, CatalogStoreError> {
        CatalogStore::create_category(self, category)
    }

    async fn update_category(
        &self,
        category: &Category,
    ) -> Result<Category, CatalogStoreError> {
        CatalogStore::update_category(self, category)
    }

    async fn delete_category(
        &self,
        id: CategoryId,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        CatalogStore::delete_category(self, id)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, CatalogStoreError> {
        CatalogStore::get_category(self, id)
    }

    async fn find_category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, CatalogStoreError> {
        CatalogStore::find_category_by_slug(self, slug)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogStoreError> {
        CatalogStore::list_categories(self)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogStoreError> {
        CatalogStore::create_product(self, product)
    }

    async fn update_product(&self, product: &Product) -> Result<Product, CatalogStoreError> {
        CatalogStore::update_product(self, product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<DeleteSummary, CatalogStoreError> {
        CatalogStore::delete_product(self, id)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, CatalogStoreError> {
        CatalogStore::get_product(self, id)
    }

    async fn list_all_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        CatalogStore::list_all_products(self)
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        CatalogStore::list_active_products(self)
    }

    async fn list_active_products_in_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, CatalogStoreError> {
        CatalogStore::list_active_products_in_category(self, category)
    }

    async fn list_active_products_by_brand(
        &self,
        brand: BrandId,
    ) -> Result<Vec<Product>, CatalogStoreError> {
        CatalogStore::list_active_products_by_brand(self, brand)
    }

    async fn remove_products_created_by(
        &self,
        user: UserId,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        CatalogStore::remove_products_created_by(self, user)
    }

    async fn create_product_image(
        &self,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogStoreError> {
        CatalogStore::create_product_image(self, image)
    }

    async fn update_product_image(
        &self,
        image: &ProductImage,
    ) -> Result<ProductImage, CatalogStoreError> {
        CatalogStore::update_product_image(self, image)
    }

    async fn delete_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        CatalogStore::delete_product_image(self, id)
    }

    async fn get_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<Option<ProductImage>, CatalogStoreError> {
        CatalogStore::get_product_image(self, id)
    }

    async fn list_product_images(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, CatalogStoreError> {
        CatalogStore::list_product_images(self, product)
    }

    async fn featured_image(
        &self,
        product: ProductId,
    ) -> Result<Option<ProductImage>, CatalogStoreError> {
        CatalogStore::featured_image(self, product)
    }
}
