//! Canonical paths for catalog entities.
//!
//! Path construction belongs to the web layer; the catalog only says which
//! route an entity maps to and which slug fills it. [`StorePaths`] is the
//! default resolver for callers without a router of their own.

use serde::{Deserialize, Serialize};

use emporium_core::Slug;

use crate::brand::Brand;
use crate::category::Category;
use crate::product::Product;

/// Storefront routes that take a single slug argument.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    BrandList,
    CategoryList,
    ProductDetail,
}

impl Route {
    /// Namespaced route name, as registered with the web router.
    pub fn name(self) -> &'static str {
        match self {
            Route::BrandList => "store:brand_list",
            Route::CategoryList => "store:category_list",
            Route::ProductDetail => "store:product_detail",
        }
    }

    fn segment(self) -> &'static str {
        match self {
            Route::BrandList => "brands",
            Route::CategoryList => "categories",
            Route::ProductDetail => "products",
        }
    }
}

/// Routing layer collaborator: turns a route + slug into a path.
pub trait RouteResolver {
    fn reverse(&self, route: Route, slug: &Slug) -> String;
}

impl<R: RouteResolver + ?Sized> RouteResolver for &R {
    fn reverse(&self, route: Route, slug: &Slug) -> String {
        (**self).reverse(route, slug)
    }
}

/// Entities with a canonical, slug-addressed page.
///
/// Not implemented for `ProductImage`, which has no page of its own.
pub trait CanonicalPath {
    fn canonical_route(&self) -> (Route, &Slug);
}

impl CanonicalPath for Brand {
    fn canonical_route(&self) -> (Route, &Slug) {
        (Route::BrandList, &self.slug)
    }
}

impl CanonicalPath for Category {
    fn canonical_route(&self) -> (Route, &Slug) {
        (Route::CategoryList, &self.slug)
    }
}

impl CanonicalPath for Product {
    fn canonical_route(&self) -> (Route, &Slug) {
        (Route::ProductDetail, &self.slug)
    }
}

/// Resolve the canonical path of a brand, category or product.
pub fn resolve_canonical_path<E, R>(entity: &E, resolver: &R) -> String
where
    E: CanonicalPath + ?Sized,
    R: RouteResolver + ?Sized,
{
    let (route, slug) = entity.canonical_route();
    resolver.reverse(route, slug)
}

/// Default resolver: `<prefix>/brands/<slug>/`, `<prefix>/categories/<slug>/`,
/// `<prefix>/products/<slug>/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorePaths {
    prefix: String,
}

impl StorePaths {
    /// Mount the storefront under `prefix` (e.g. `"shop"` or `"/shop/"`).
    pub fn with_prefix(prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl RouteResolver for StorePaths {
    fn reverse(&self, route: Route, slug: &Slug) -> String {
        format!("{}/{}/{}/", self.prefix, route.segment(), slug)
    }
}
