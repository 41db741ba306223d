//! Store-level scenarios for the catalog.
//!
//! Exercises the in-memory backend through the `CatalogStore` trait:
//! - the active scope is a subset of the full listing
//! - slug uniqueness, cascades and timestamp rules
//! - canonical paths for stored records

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{TimeDelta, TimeZone, Utc};
    use proptest::prelude::*;

    use emporium_catalog::{
        Brand, Category, NewBrand, NewCategory, NewProduct, NewProductImage, Product,
        ProductId, StorePaths, resolve_canonical_path,
    };
    use emporium_core::{Slug, UserId};

    use crate::catalog_store::{
        CatalogStore, CatalogStoreError, DeleteSummary, InMemoryCatalogStore, SteppingClock,
    };
    use crate::config::CatalogConfig;

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    fn setup() -> InMemoryCatalogStore<SteppingClock> {
        emporium_observability::init();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        InMemoryCatalogStore::with_clock(SteppingClock::new(start, TimeDelta::seconds(1)))
    }

    fn acme_tools(store: &impl CatalogStore) -> (Brand, Category) {
        let brand = store.create_brand(NewBrand::new("Acme", slug("acme"))).unwrap();
        let category = store
            .create_category(NewCategory::new("Tools", slug("tools")))
            .unwrap();
        (brand, category)
    }

    fn add_product(
        store: &impl CatalogStore,
        brand: &Brand,
        category: &Category,
        title: &str,
        active: bool,
    ) -> Product {
        let mut draft = NewProduct::new(
            category.id,
            brand.id,
            UserId::new(),
            title,
            Slug::from_name(title).unwrap(),
            9.99,
        );
        draft.is_active = active;
        store.create_product(draft).unwrap()
    }

    fn ids(products: &[Product]) -> Vec<ProductId> {
        products.iter().map(|p| p.id).collect()
    }

    #[test]
    fn hammer_end_to_end() {
        let store = setup();
        let (brand, category) = acme_tools(&store);
        let hammer = add_product(&store, &brand, &category, "Hammer", true);

        assert_eq!(ids(&store.list_active_products().unwrap()), vec![hammer.id]);

        let mut hidden = hammer.clone();
        hidden.is_active = false;
        store.update_product(&hidden).unwrap();

        assert!(store.list_active_products().unwrap().is_empty());
        assert_eq!(ids(&store.list_all_products().unwrap()), vec![hammer.id]);
    }

    #[test]
    fn duplicate_brand_slug_keeps_first_brand() {
        let store = setup();
        let first = store.create_brand(NewBrand::new("Acme", slug("acme"))).unwrap();

        let err = store
            .create_brand(NewBrand::new("Acme Corp", slug("acme")))
            .unwrap_err();
        assert!(matches!(err, CatalogStoreError::Validation(_)));

        assert_eq!(store.get_brand(first.id).unwrap(), Some(first.clone()));
        assert_eq!(store.find_brand_by_slug(&slug("acme")).unwrap(), Some(first));
        assert_eq!(store.list_brands().unwrap().len(), 1);
    }

    #[test]
    fn deleting_category_cascades_to_products_and_images() {
        let store = setup();
        let (brand, tools) = acme_tools(&store);
        let garden = store
            .create_category(NewCategory::new("Garden", slug("garden")))
            .unwrap();

        let hammer = add_product(&store, &brand, &tools, "Hammer", true);
        let saw = add_product(&store, &brand, &tools, "Saw", false);
        let rake = add_product(&store, &brand, &garden, "Rake", true);
        for product in [&hammer, &saw, &rake] {
            store
                .create_product_image(NewProductImage::new(product.id, "front"))
                .unwrap();
        }
        store
            .create_product_image(NewProductImage::new(hammer.id, "side"))
            .unwrap();

        let summary = store.delete_category(tools.id).unwrap();
        assert_eq!(
            summary,
            DeleteSummary {
                categories: 1,
                products: 2,
                images: 3,
                ..DeleteSummary::default()
            }
        );

        assert_eq!(store.get_category(tools.id).unwrap(), None);
        assert_eq!(store.get_product(hammer.id).unwrap(), None);
        assert!(store.list_product_images(hammer.id).unwrap().is_empty());
        assert_eq!(ids(&store.list_all_products().unwrap()), vec![rake.id]);
        assert_eq!(store.list_product_images(rake.id).unwrap().len(), 1);
        // Brands are untouched by a category delete.
        assert!(store.get_brand(brand.id).unwrap().is_some());
    }

    #[test]
    fn title_update_keeps_created_and_advances_updated() {
        let store = setup();
        let (brand, category) = acme_tools(&store);
        let hammer = add_product(&store, &brand, &category, "Hammer", true);

        let mut renamed = hammer.clone();
        renamed.title = "Claw hammer".to_string();
        let saved = store.update_product(&renamed).unwrap();

        assert_eq!(saved.created, hammer.created);
        assert!(saved.updated > hammer.updated);
        assert_eq!(store.get_product(hammer.id).unwrap(), Some(saved));
    }

    #[test]
    fn update_of_deleted_product_is_not_found() {
        let store = setup();
        let (brand, category) = acme_tools(&store);
        let hammer = add_product(&store, &brand, &category, "Hammer", true);
        store.delete_product(hammer.id).unwrap();

        assert!(matches!(
            store.update_product(&hammer),
            Err(CatalogStoreError::NotFound { entity: "product", .. })
        ));
        assert!(matches!(
            store.delete_product(hammer.id),
            Err(CatalogStoreError::NotFound { .. })
        ));
    }

    #[test]
    fn products_list_newest_first() {
        let store = setup();
        let (brand, category) = acme_tools(&store);
        let t1 = add_product(&store, &brand, &category, "First", true);
        let t2 = add_product(&store, &brand, &category, "Second", true);
        let t3 = add_product(&store, &brand, &category, "Third", true);
        assert!(t1.created < t2.created && t2.created < t3.created);

        assert_eq!(
            ids(&store.list_all_products().unwrap()),
            vec![t3.id, t2.id, t1.id]
        );
        assert_eq!(
            ids(&store.list_active_products().unwrap()),
            vec![t3.id, t2.id, t1.id]
        );
    }

    #[test]
    fn storefront_listings_scope_by_brand_and_category() {
        let store = setup();
        let (acme, tools) = acme_tools(&store);
        let bolt = store.create_brand(NewBrand::new("Bolt", slug("bolt"))).unwrap();

        let hammer = add_product(&store, &acme, &tools, "Hammer", true);
        let _hidden = add_product(&store, &acme, &tools, "Prototype", false);
        let wrench = add_product(&store, &bolt, &tools, "Wrench", true);

        assert_eq!(
            ids(&store.list_active_products_in_category(tools.id).unwrap()),
            vec![wrench.id, hammer.id]
        );
        assert_eq!(
            ids(&store.list_active_products_by_brand(acme.id).unwrap()),
            vec![hammer.id]
        );
    }

    #[test]
    fn deleting_a_creator_removes_their_products() {
        let store = setup();
        let (brand, category) = acme_tools(&store);
        let author = UserId::new();

        let mut draft = NewProduct::new(
            category.id,
            brand.id,
            author,
            "Hammer",
            slug("hammer"),
            9.99,
        );
        let mine = store.create_product(draft.clone()).unwrap();
        draft.title = "Saw".to_string();
        draft.slug = slug("saw");
        store.create_product(draft).unwrap();
        store
            .create_product_image(NewProductImage::new(mine.id, "front").featured())
            .unwrap();
        let theirs = add_product(&store, &brand, &category, "Drill", true);

        let summary = store.remove_products_created_by(author).unwrap();
        assert_eq!(summary.products, 2);
        assert_eq!(summary.images, 1);
        assert_eq!(ids(&store.list_all_products().unwrap()), vec![theirs.id]);
    }

    #[test]
    fn images_fall_back_to_configured_placeholder() {
        let config = CatalogConfig::from_lookup(|key| {
            (key == "EMPORIUM_PLACEHOLDER_IMAGE").then(|| "images/products/missing.png".to_string())
        })
        .unwrap();
        let store = config.in_memory_store();
        let (brand, category) = acme_tools(&store);
        let hammer = add_product(&store, &brand, &category, "Hammer", true);

        let image = store
            .create_product_image(NewProductImage::new(hammer.id, "front"))
            .unwrap();
        assert_eq!(image.image.as_str(), "images/products/missing.png");
    }

    #[test]
    fn featured_image_comes_first() {
        let store = setup();
        let (brand, category) = acme_tools(&store);
        let hammer = add_product(&store, &brand, &category, "Hammer", true);

        let front = store
            .create_product_image(NewProductImage::new(hammer.id, "front"))
            .unwrap();
        let box_shot = store
            .create_product_image(NewProductImage::new(hammer.id, "box").featured())
            .unwrap();

        let listed: Vec<_> = store
            .list_product_images(hammer.id)
            .unwrap()
            .into_iter()
            .map(|image| image.id)
            .collect();
        assert_eq!(listed, vec![box_shot.id, front.id]);
        assert_eq!(
            store.featured_image(hammer.id).unwrap().map(|image| image.id),
            Some(box_shot.id)
        );
    }

    #[test]
    fn stored_records_resolve_canonical_paths() {
        let store = setup();
        let (brand, category) = acme_tools(&store);
        let hammer = add_product(&store, &brand, &category, "Hammer", true);
        let paths = StorePaths::default();

        assert_eq!(resolve_canonical_path(&brand, &paths), "/brands/acme/");
        assert_eq!(resolve_canonical_path(&category, &paths), "/categories/tools/");
        assert_eq!(resolve_canonical_path(&hammer, &paths), "/products/hammer/");

        let shop = StorePaths::with_prefix("/shop/");
        assert_eq!(resolve_canonical_path(&hammer, &shop), "/shop/products/hammer/");
    }

    proptest! {
        #[test]
        fn active_listing_is_the_active_subset(
            flags in proptest::collection::vec(any::<bool>(), 0..24)
        ) {
            let store = setup();
            let (brand, category) = acme_tools(&store);
            for (i, active) in flags.iter().enumerate() {
                add_product(&store, &brand, &category, &format!("Item {i}"), *active);
            }

            let all = store.list_all_products().unwrap();
            let active = store.list_active_products().unwrap();

            prop_assert_eq!(all.len(), flags.len());
            prop_assert_eq!(active.len(), flags.iter().filter(|f| **f).count());
            prop_assert!(active.iter().all(|p| p.is_active));

            let all_ids: HashSet<_> = all.iter().map(|p| p.id).collect();
            prop_assert!(active.iter().all(|p| all_ids.contains(&p.id)));

            // Same relative order as the full listing.
            let filtered: Vec<_> = all.iter().filter(|p| p.is_active).map(|p| p.id).collect();
            prop_assert_eq!(ids(&active), filtered);
        }

        #[test]
        fn full_listing_is_sorted_newest_first(count in 0usize..24) {
            let store = setup();
            let (brand, category) = acme_tools(&store);
            for i in 0..count {
                add_product(&store, &brand, &category, &format!("Item {i}"), i % 3 != 0);
            }

            let all = store.list_all_products().unwrap();
            prop_assert!(all.windows(2).all(|pair| pair[0].created >= pair[1].created));
        }
    }

    /// The same scenarios, written once against the async contract.
    mod async_contract {
        use emporium_catalog::{Brand, Category, NewBrand, NewCategory, NewProduct};
        use emporium_core::{Slug, UserId};

        use crate::catalog_store::{AsyncCatalogStore, CatalogStoreError, InMemoryCatalogStore};

        async fn seed<S: AsyncCatalogStore>(store: &S) -> (Brand, Category) {
            let brand = store
                .create_brand(NewBrand::new("Acme", Slug::parse("acme").unwrap()))
                .await
                .unwrap();
            let category = store
                .create_category(NewCategory::new("Tools", Slug::parse("tools").unwrap()))
                .await
                .unwrap();
            (brand, category)
        }

        async fn hammer_flow<S: AsyncCatalogStore>(store: &S) {
            let (brand, category) = seed(store).await;
            let hammer = store
                .create_product(NewProduct::new(
                    category.id,
                    brand.id,
                    UserId::new(),
                    "Hammer",
                    Slug::parse("hammer").unwrap(),
                    9.99,
                ))
                .await
                .unwrap();

            let active = store.list_active_products().await.unwrap();
            assert_eq!(active.iter().map(|p| p.id).collect::<Vec<_>>(), vec![hammer.id]);

            let mut hidden = hammer.clone();
            hidden.is_active = false;
            store.update_product(&hidden).await.unwrap();
            assert!(store.list_active_products().await.unwrap().is_empty());
            assert_eq!(store.list_all_products().await.unwrap().len(), 1);

            let summary = store.delete_category(category.id).await.unwrap();
            assert_eq!(summary.products, 1);
            assert!(store.get_product(hammer.id).await.unwrap().is_none());
        }

        async fn duplicate_slug_flow<S: AsyncCatalogStore>(store: &S) {
            seed(store).await;
            let err = store
                .create_brand(NewBrand::new("Acme again", Slug::parse("acme").unwrap()))
                .await
                .unwrap_err();
            assert_eq!(
                err,
                CatalogStoreError::Validation("brand with slug 'acme' already exists".to_string())
            );
        }

        #[tokio::test]
        async fn in_memory_store_through_async_contract() {
            hammer_flow(&InMemoryCatalogStore::new()).await;
            duplicate_slug_flow(&InMemoryCatalogStore::new()).await;
        }
    }
}
