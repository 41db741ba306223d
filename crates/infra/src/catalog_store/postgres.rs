//! Postgres-backed catalog store.
//!
//! Implements [`AsyncCatalogStore`](super::AsyncCatalogStore). The schema
//! lives in `migrations/0001_catalog.sql` and does most of the work:
//!
//! - slug uniqueness: unique indexes on `brands.slug` and `categories.slug`
//! - cascades: every foreign key is `ON DELETE CASCADE`
//! - `updated`/`updated_at`: set in the `UPDATE` statement, always strictly
//!   later than the stored value
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | CatalogStoreError |
//! |------------|----------------------|-------------------|
//! | Database (unique violation) | `23505` | `Validation` (duplicate slug) |
//! | Database (foreign key violation) | `23503` | `Referential` |
//! | Database (check / too long / bad text) | `23514`, `22001`, `22P02` | `Validation` |
//! | Database (other) | Any other | `Storage` |
//! | PoolClosed, I/O, etc. | N/A | `Storage` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgConnection, PgPool, Row};
use tracing::{Span, info, instrument};
use url::Url;
use uuid::Uuid;

use emporium_catalog::{
    Brand, BrandId, Category, CategoryId, ImageRef, NewBrand, NewCategory, NewProduct,
    NewProductImage, Product, ProductId, ProductImage, ProductImageId,
};
use emporium_core::{Entity, Slug, UserId};

use super::r#trait::{AsyncCatalogStore, CatalogStoreError, DeleteSummary};

/// Catalog schema, applied by [`PostgresCatalogStore::migrate`].
pub const SCHEMA_SQL: &str = include_str!("../../migrations/0001_catalog.sql");

const BRAND_COLUMNS: &str = "id, name, slug, is_active";
const CATEGORY_COLUMNS: &str = "id, name, slug, is_active";
const PRODUCT_COLUMNS: &str = "id, category_id, created_by, title, brand_id, description, \
     data_sheet, tutorial, slug, price, discount_price, in_stock, is_active, created, updated";
const IMAGE_COLUMNS: &str =
    "id, product_id, name, image, alt_text, is_feature, created_at, updated_at";

/// Byte-wise name order, matching the in-memory store whatever the
/// database collation is.
const NAME_ORDER: &str = r#"ORDER BY name COLLATE "C", id"#;

/// Statements for a delete that cascades into products and their images.
///
/// The parent row and the doomed products are locked before counting, so
/// nothing can be attached to them until the delete commits.
struct CascadePlan {
    lock_parent: &'static str,
    lock_products: &'static str,
    delete: &'static str,
}

const BRAND_CASCADE: CascadePlan = CascadePlan {
    lock_parent: "SELECT id FROM brands WHERE id = $1 FOR UPDATE",
    lock_products: "SELECT id FROM products WHERE brand_id = $1 FOR UPDATE",
    delete: "DELETE FROM brands WHERE id = $1",
};

const CATEGORY_CASCADE: CascadePlan = CascadePlan {
    lock_parent: "SELECT id FROM categories WHERE id = $1 FOR UPDATE",
    lock_products: "SELECT id FROM products WHERE category_id = $1 FOR UPDATE",
    delete: "DELETE FROM categories WHERE id = $1",
};

const PRODUCT_CASCADE: CascadePlan = CascadePlan {
    lock_parent: "SELECT id FROM products WHERE id = $1 FOR UPDATE",
    lock_products: "SELECT id FROM products WHERE id = $1 FOR UPDATE",
    delete: "DELETE FROM products WHERE id = $1",
};

const LOCK_PRODUCTS_BY_CREATOR: &str = "SELECT id FROM products WHERE created_by = $1 FOR UPDATE";

/// Postgres-backed catalog store.
///
/// `Send + Sync`; all connection handling is done by the SQLx pool. Multi-step
/// operations (deletes with cascade accounting) run in a transaction.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
    placeholder: ImageRef,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            placeholder: ImageRef::placeholder(),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, CatalogStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Override the image used when a product image is created without one.
    pub fn with_placeholder(mut self, placeholder: ImageRef) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Create tables and indexes if missing. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), CatalogStoreError> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AsyncCatalogStore for PostgresCatalogStore {
    // ---------------------------------------------------------------------
    // Brands
    // ---------------------------------------------------------------------

    #[instrument(skip(self, brand), fields(slug = %brand.slug), err)]
    async fn create_brand(&self, brand: NewBrand) -> Result<Brand, CatalogStoreError> {
        brand.validate()?;
        let brand = brand.into_brand(BrandId::new());
        sqlx::query("INSERT INTO brands (id, name, slug, is_active) VALUES ($1, $2, $3, $4)")
            .bind(brand.id.as_uuid())
            .bind(&brand.name)
            .bind(brand.slug.as_str())
            .bind(brand.is_active)
            .execute(&*self.pool)
            .await
            .map_err(|e| slug_conflict::<Brand>(&brand.slug, "create_brand", e))?;
        Ok(brand)
    }

    #[instrument(skip(self, brand), fields(brand_id = %brand.id), err)]
    async fn update_brand(&self, brand: &Brand) -> Result<Brand, CatalogStoreError> {
        brand.validate()?;
        let result =
            sqlx::query("UPDATE brands SET name = $2, slug = $3, is_active = $4 WHERE id = $1")
                .bind(brand.id.as_uuid())
                .bind(&brand.name)
                .bind(brand.slug.as_str())
                .bind(brand.is_active)
                .execute(&*self.pool)
                .await
                .map_err(|e| slug_conflict::<Brand>(&brand.slug, "update_brand", e))?;
        if result.rows_affected() == 0 {
            return Err(CatalogStoreError::vanished(brand));
        }
        Ok(brand.clone())
    }

    #[instrument(skip(self), fields(brand_id = %id), err)]
    async fn delete_brand(&self, id: BrandId) -> Result<DeleteSummary, CatalogStoreError> {
        let summary = self
            .delete_with_cascade::<Brand>(&id, &BRAND_CASCADE, *id.as_uuid())
            .await?;
        Ok(DeleteSummary { brands: 1, ..summary })
    }

    async fn get_brand(&self, id: BrandId) -> Result<Option<Brand>, CatalogStoreError> {
        let row = sqlx::query(&format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_brand", e))?;
        row.map(|r| decode::<BrandRow, Brand>(&r)).transpose()
    }

    async fn find_brand_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Brand>, CatalogStoreError> {
        let row = sqlx::query(&format!("SELECT {BRAND_COLUMNS} FROM brands WHERE slug = $1"))
            .bind(slug.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_brand_by_slug", e))?;
        row.map(|r| decode::<BrandRow, Brand>(&r)).transpose()
    }

    async fn list_brands(&self) -> Result<Vec<Brand>, CatalogStoreError> {
        let rows = sqlx::query(&format!("SELECT {BRAND_COLUMNS} FROM brands {NAME_ORDER}"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_brands", e))?;
        rows.iter().map(decode::<BrandRow, Brand>).collect()
    }

    // ---------------------------------------------------------------------
    // Categories
    // ---------------------------------------------------------------------

    #[instrument(skip(self, category), fields(slug = %category.slug), err)]
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<Category, CatalogStoreError> {
        category.validate()?;
        let category = category.into_category(CategoryId::new());
        sqlx::query("INSERT INTO categories (id, name, slug, is_active) VALUES ($1, $2, $3, $4)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(category.slug.as_str())
            .bind(category.is_active)
            .execute(&*self.pool)
            .await
            .map_err(|e| slug_conflict::<Category>(&category.slug, "create_category", e))?;
        Ok(category)
    }

    #[instrument(skip(self, category), fields(category_id = %category.id), err)]
    async fn update_category(
        &self,
        category: &Category,
    ) -> Result<Category, CatalogStoreError> {
        category.validate()?;
        let result = sqlx::query(
            "UPDATE categories SET name = $2, slug = $3, is_active = $4 WHERE id = $1",
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(category.slug.as_str())
        .bind(category.is_active)
        .execute(&*self.pool)
        .await
        .map_err(|e| slug_conflict::<Category>(&category.slug, "update_category", e))?;
        if result.rows_affected() == 0 {
            return Err(CatalogStoreError::vanished(category));
        }
        Ok(category.clone())
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_category(
        &self,
        id: CategoryId,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        let summary = self
            .delete_with_cascade::<Category>(&id, &CATEGORY_CASCADE, *id.as_uuid())
            .await?;
        Ok(DeleteSummary {
            categories: 1,
            ..summary
        })
    }

    async fn get_category(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, CatalogStoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_category", e))?;
        row.map(|r| decode::<CategoryRow, Category>(&r)).transpose()
    }

    async fn find_category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, CatalogStoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_category_by_slug", e))?;
        row.map(|r| decode::<CategoryRow, Category>(&r)).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogStoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories {NAME_ORDER}"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter().map(decode::<CategoryRow, Category>).collect()
    }

    // ---------------------------------------------------------------------
    // Products
    // ---------------------------------------------------------------------

    #[instrument(skip(self, product), fields(slug = %product.slug), err)]
    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogStoreError> {
        product.validate()?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (
                id, category_id, created_by, title, brand_id, description,
                data_sheet, tutorial, slug, price, discount_price, in_stock, is_active,
                created, updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW())
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(ProductId::new().as_uuid())
        .bind(product.category.as_uuid())
        .bind(product.created_by.as_uuid())
        .bind(&product.title)
        .bind(product.brand.as_uuid())
        .bind(&product.description)
        .bind(product.data_sheet.as_ref().map(Url::as_str))
        .bind(product.tutorial.as_ref().map(Url::as_str))
        .bind(product.slug.as_str())
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.in_stock)
        .bind(product.is_active)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;
        decode::<ProductRow, Product>(&row)
    }

    /// Rewrite a product. `created` is never touched; `updated` moves to
    /// `NOW()` or one microsecond past the stored value, whichever is later.
    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update_product(&self, product: &Product) -> Result<Product, CatalogStoreError> {
        product.validate()?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                category_id = $2,
                created_by = $3,
                title = $4,
                brand_id = $5,
                description = $6,
                data_sheet = $7,
                tutorial = $8,
                slug = $9,
                price = $10,
                discount_price = $11,
                in_stock = $12,
                is_active = $13,
                updated = GREATEST(NOW(), updated + INTERVAL '1 microsecond')
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(product.category.as_uuid())
        .bind(product.created_by.as_uuid())
        .bind(&product.title)
        .bind(product.brand.as_uuid())
        .bind(&product.description)
        .bind(product.data_sheet.as_ref().map(Url::as_str))
        .bind(product.tutorial.as_ref().map(Url::as_str))
        .bind(product.slug.as_str())
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.in_stock)
        .bind(product.is_active)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        match row {
            Some(row) => decode::<ProductRow, Product>(&row),
            None => Err(CatalogStoreError::vanished(product)),
        }
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> Result<DeleteSummary, CatalogStoreError> {
        self.delete_with_cascade::<Product>(&id, &PRODUCT_CASCADE, *id.as_uuid())
            .await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, CatalogStoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.map(|r| decode::<ProductRow, Product>(&r)).transpose()
    }

    async fn list_all_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        self.fetch_products("list_all_products", "TRUE", None).await
    }

    /// Active products only, re-filtered on every call.
    async fn list_active_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        self.fetch_products("list_active_products", "is_active", None)
            .await
    }

    async fn list_active_products_in_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Product>, CatalogStoreError> {
        self.fetch_products(
            "list_active_products_in_category",
            "is_active AND category_id = $1",
            Some(*category.as_uuid()),
        )
        .await
    }

    async fn list_active_products_by_brand(
        &self,
        brand: BrandId,
    ) -> Result<Vec<Product>, CatalogStoreError> {
        self.fetch_products(
            "list_active_products_by_brand",
            "is_active AND brand_id = $1",
            Some(*brand.as_uuid()),
        )
        .await
    }

    #[instrument(skip(self), fields(user_id = %user), err)]
    async fn remove_products_created_by(
        &self,
        user: UserId,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let doomed: Vec<Uuid> = sqlx::query_scalar(LOCK_PRODUCTS_BY_CREATOR)
            .bind(user.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_products", e))?;
        let images = count_images(&mut *tx, &doomed).await?;

        let result = sqlx::query("DELETE FROM products WHERE id = ANY($1)")
            .bind(&doomed)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_products", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let summary = DeleteSummary {
            products: result.rows_affected() as usize,
            images,
            ..DeleteSummary::default()
        };
        info!(products = summary.products, images = summary.images, "creator's products removed");
        Ok(summary)
    }

    // ---------------------------------------------------------------------
    // Product images
    // ---------------------------------------------------------------------

    #[instrument(skip(self, image), fields(product_id = %image.product), err)]
    async fn create_product_image(
        &self,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogStoreError> {
        image.validate()?;
        let stored = image.image.clone().unwrap_or_else(|| self.placeholder.clone());
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO product_images (
                id, product_id, name, image, alt_text, is_feature, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {IMAGE_COLUMNS}
            "#
        ))
        .bind(ProductImageId::new().as_uuid())
        .bind(image.product.as_uuid())
        .bind(&image.name)
        .bind(stored.as_str())
        .bind(image.alt_text.as_deref())
        .bind(image.is_feature)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product_image", e))?;
        decode::<ImageRow, ProductImage>(&row)
    }

    #[instrument(skip(self, image), fields(image_id = %image.id), err)]
    async fn update_product_image(
        &self,
        image: &ProductImage,
    ) -> Result<ProductImage, CatalogStoreError> {
        image.validate()?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE product_images SET
                product_id = $2,
                name = $3,
                image = $4,
                alt_text = $5,
                is_feature = $6,
                updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1
            RETURNING {IMAGE_COLUMNS}
            "#
        ))
        .bind(image.id.as_uuid())
        .bind(image.product.as_uuid())
        .bind(&image.name)
        .bind(image.image.as_str())
        .bind(image.alt_text.as_deref())
        .bind(image.is_feature)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product_image", e))?;
        match row {
            Some(row) => decode::<ImageRow, ProductImage>(&row),
            None => Err(CatalogStoreError::vanished(image)),
        }
    }

    #[instrument(skip(self), fields(image_id = %id), err)]
    async fn delete_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        let result = sqlx::query("DELETE FROM product_images WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product_image", e))?;
        if result.rows_affected() == 0 {
            return Err(CatalogStoreError::not_found::<ProductImage>(&id));
        }
        Ok(DeleteSummary {
            images: 1,
            ..DeleteSummary::default()
        })
    }

    async fn get_product_image(
        &self,
        id: ProductImageId,
    ) -> Result<Option<ProductImage>, CatalogStoreError> {
        let row = sqlx::query(&format!(
            "SELECT {IMAGE_COLUMNS} FROM product_images WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product_image", e))?;
        row.map(|r| decode::<ImageRow, ProductImage>(&r)).transpose()
    }

    async fn list_product_images(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, CatalogStoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {IMAGE_COLUMNS} FROM product_images
            WHERE product_id = $1
            ORDER BY is_feature DESC, created_at ASC, id ASC
            "#
        ))
        .bind(product.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_product_images", e))?;
        rows.iter().map(decode::<ImageRow, ProductImage>).collect()
    }

    async fn featured_image(
        &self,
        product: ProductId,
    ) -> Result<Option<ProductImage>, CatalogStoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {IMAGE_COLUMNS} FROM product_images
            WHERE product_id = $1 AND is_feature
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#
        ))
        .bind(product.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("featured_image", e))?;
        row.map(|r| decode::<ImageRow, ProductImage>(&r)).transpose()
    }
}

impl PostgresCatalogStore {
    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    #[instrument(skip(self, param), fields(product_count = tracing::field::Empty), err)]
    async fn fetch_products(
        &self,
        operation: &'static str,
        predicate: &str,
        param: Option<Uuid>,
    ) -> Result<Vec<Product>, CatalogStoreError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE {predicate} ORDER BY created DESC, id DESC"
        );
        let mut query = sqlx::query(&sql);
        if let Some(param) = param {
            query = query.bind(param);
        }
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        let span = Span::current();
        span.record("product_count", rows.len());
        rows.iter().map(decode::<ProductRow, Product>).collect()
    }

    /// Lock the parent and its products, count what the cascade will take,
    /// then delete the parent row; the schema's `ON DELETE CASCADE` removes
    /// the dependents.
    async fn delete_with_cascade<E: Entity>(
        &self,
        id: &E::Id,
        plan: &CascadePlan,
        key: Uuid,
    ) -> Result<DeleteSummary, CatalogStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let parent: Option<Uuid> = sqlx::query_scalar(plan.lock_parent)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_parent", e))?;
        if parent.is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(CatalogStoreError::not_found::<E>(id));
        }

        let doomed: Vec<Uuid> = sqlx::query_scalar(plan.lock_products)
            .bind(key)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_products", e))?;
        let images = count_images(&mut *tx, &doomed).await?;

        sqlx::query(plan.delete)
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let summary = DeleteSummary {
            products: doomed.len(),
            images,
            ..DeleteSummary::default()
        };
        info!(
            entity = E::KIND,
            id = %id,
            products = summary.products,
            images = summary.images,
            "deleted with cascade"
        );
        Ok(summary)
    }
}

async fn count_images(
    conn: &mut PgConnection,
    products: &[Uuid],
) -> Result<usize, CatalogStoreError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_images WHERE product_id = ANY($1)")
            .bind(products)
            .fetch_one(conn)
            .await
            .map_err(|e| map_sqlx_error("count_images", e))?;
    Ok(count as usize)
}

/// Decode a row into `R`, then convert it into the domain type.
fn decode<R, T>(row: &PgRow) -> Result<T, CatalogStoreError>
where
    R: for<'r> FromRow<'r, PgRow> + TryInto<T, Error = CatalogStoreError>,
{
    R::from_row(row)
        .map_err(|e| CatalogStoreError::Storage(format!("failed to deserialize row: {e}")))?
        .try_into()
}

fn slug_conflict<E: Entity>(slug: &Slug, operation: &str, err: sqlx::Error) -> CatalogStoreError {
    if is_unique_violation(&err) {
        CatalogStoreError::duplicate_slug::<E>(slug)
    } else {
        map_sqlx_error(operation, err)
    }
}

/// Map SQLx errors to `CatalogStoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> CatalogStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23514") | Some("22001") | Some("22P02") => {
                    CatalogStoreError::Validation(msg)
                }
                Some("23503") => CatalogStoreError::Referential(msg),
                _ => CatalogStoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            CatalogStoreError::Storage(format!("connection pool closed in {operation}"))
        }
        _ => CatalogStoreError::Storage(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn parse_slug(value: &str) -> Result<Slug, CatalogStoreError> {
    Slug::parse(value)
        .map_err(|e| CatalogStoreError::Storage(format!("stored slug {value:?} is invalid: {e}")))
}

fn parse_link(value: Option<String>) -> Result<Option<Url>, CatalogStoreError> {
    value
        .map(|v| {
            Url::parse(&v).map_err(|e| {
                CatalogStoreError::Storage(format!("stored URL {v:?} is invalid: {e}"))
            })
        })
        .transpose()
}

// SQLx row types

#[derive(Debug)]
struct BrandRow {
    id: Uuid,
    name: String,
    slug: String,
    is_active: bool,
}

impl<'r> FromRow<'r, PgRow> for BrandRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BrandRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

impl TryFrom<BrandRow> for Brand {
    type Error = CatalogStoreError;

    fn try_from(row: BrandRow) -> Result<Self, Self::Error> {
        Ok(Brand {
            id: BrandId::from_uuid(row.id),
            name: row.name,
            slug: parse_slug(&row.slug)?,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    is_active: bool,
}

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

impl TryFrom<CategoryRow> for Category {
    type Error = CatalogStoreError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Category {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            slug: parse_slug(&row.slug)?,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    category_id: Uuid,
    created_by: Uuid,
    title: String,
    brand_id: Uuid,
    description: String,
    data_sheet: Option<String>,
    tutorial: Option<String>,
    slug: String,
    price: f64,
    discount_price: Option<f64>,
    in_stock: bool,
    is_active: bool,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            category_id: row.try_get("category_id")?,
            created_by: row.try_get("created_by")?,
            title: row.try_get("title")?,
            brand_id: row.try_get("brand_id")?,
            description: row.try_get("description")?,
            data_sheet: row.try_get("data_sheet")?,
            tutorial: row.try_get("tutorial")?,
            slug: row.try_get("slug")?,
            price: row.try_get("price")?,
            discount_price: row.try_get("discount_price")?,
            in_stock: row.try_get("in_stock")?,
            is_active: row.try_get("is_active")?,
            created: row.try_get("created")?,
            updated: row.try_get("updated")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = CatalogStoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::from_uuid(row.id),
            category: CategoryId::from_uuid(row.category_id),
            created_by: UserId::from_uuid(row.created_by),
            title: row.title,
            brand: BrandId::from_uuid(row.brand_id),
            description: row.description,
            data_sheet: parse_link(row.data_sheet)?,
            tutorial: parse_link(row.tutorial)?,
            slug: parse_slug(&row.slug)?,
            price: row.price,
            discount_price: row.discount_price,
            in_stock: row.in_stock,
            is_active: row.is_active,
            created: row.created,
            updated: row.updated,
        })
    }
}

#[derive(Debug)]
struct ImageRow {
    id: Uuid,
    product_id: Uuid,
    name: String,
    image: String,
    alt_text: Option<String>,
    is_feature: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ImageRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ImageRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            image: row.try_get("image")?,
            alt_text: row.try_get("alt_text")?,
            is_feature: row.try_get("is_feature")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ImageRow> for ProductImage {
    type Error = CatalogStoreError;

    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        let image = ImageRef::parse(&row.image).map_err(|e| {
            CatalogStoreError::Storage(format!("stored image path {:?} is invalid: {e}", row.image))
        })?;
        Ok(ProductImage {
            id: ProductImageId::from_uuid(row.id),
            product: ProductId::from_uuid(row.product_id),
            name: row.name,
            image,
            alt_text: row.alt_text,
            is_feature: row.is_feature,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
