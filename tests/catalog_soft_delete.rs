//! Soft-delete behaviour of the storefront catalog on the memory backend

use std::sync::{Arc, Mutex};
use vitrine::catalog::{Catalog, Category, NewProduct, PasswordHashing, Product, Profile};
use vitrine::prelude::*;

struct Shop {
    vitrine: Vitrine,
    catalog: Catalog,
    events: Arc<Mutex<Vec<DatabaseEvent>>>,
}

impl Shop {
    fn new() -> Self {
        Self::with_soft_delete(SoftDeleteConfig::default())
    }

    fn with_soft_delete(soft_delete: SoftDeleteConfig) -> Self {
        let vitrine = Vitrine::in_memory_with(SignalConfig::default(), soft_delete);
        let catalog = Catalog::install(&vitrine)
            .unwrap()
            .with_password_hashing(PasswordHashing::with_cost(8, 1).unwrap());

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        vitrine
            .signals()
            .add_callback(move |event| {
                sink.lock().unwrap().push(event.clone());
                Ok(())
            })
            .unwrap();

        Self {
            vitrine,
            catalog,
            events,
        }
    }

    fn take_events(&self) -> Vec<DatabaseEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    async fn category(&self, title: &str, parent: Option<&Category>) -> Category {
        self.catalog
            .create_category(title, parent.map(|p| p.id))
            .await
            .unwrap()
    }

    async fn product(&self, category: &Category, title: &str, price_cents: i64) -> Product {
        self.catalog
            .create_product(NewProduct::new(category.id, title, price_cents))
            .await
            .unwrap()
    }

    async fn customer(&self, username: &str) -> Profile {
        let email = format!("{}@example.com", username);
        self.catalog
            .register_user(username, &email, username, "open sesame")
            .await
            .unwrap()
            .1
    }
}

fn uid(id: Uuid) -> UniversalId {
    UniversalId::Uuid(id)
}

#[tokio::test]
async fn test_deleting_category_cascades_to_subcategory() {
    let shop = Shop::new();
    let shoes = shop.category("Shoes", None).await;
    let boots = shop.category("Boots", Some(&shoes)).await;
    let hats = shop.category("Hats", None).await;

    let outcome = shop.catalog.categories.delete(&shoes.id).await.unwrap();

    assert!(outcome.was_deactivated("categories", &uid(boots.id)));
    let listed: Vec<_> = shop
        .catalog
        .categories
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.title)
        .collect();
    assert_eq!(listed, vec!["Hats".to_string()]);
    assert!(shop.catalog.root_categories().await.unwrap().iter().all(|c| c.id == hats.id));

    let inactive = shop.catalog.categories.list_inactive().await.unwrap();
    assert_eq!(inactive.len(), 2);
    assert!(inactive.iter().all(|c| !c.is_active));
}

#[tokio::test]
async fn test_ordered_product_is_protected() {
    let shop = Shop::new();
    let profile = shop.customer("ana").await;
    let shoes = shop.category("Shoes", None).await;
    let p1 = shop.product(&shoes, "P1", 1000).await;
    let (_, items) = shop
        .catalog
        .place_order(profile.id, &[(p1.id, 1)])
        .await
        .unwrap();
    shop.take_events();

    let error = shop.catalog.products.delete(&p1.id).await.unwrap_err();

    let blockers = error.protected_dependents().unwrap();
    assert_eq!(blockers.len(), 1);
    assert_eq!(blockers[0].table, "order_items");
    assert_eq!(blockers[0].id, uid(items[0].id));
    assert!(shop.catalog.products.get_by_id(&p1.id).await.unwrap().is_some());
    assert_eq!(shop.catalog.products_in(shoes.id).await.unwrap().len(), 1);
    assert!(shop.take_events().is_empty());
}

#[tokio::test]
async fn test_protected_product_blocks_whole_category_cascade() {
    let shop = Shop::new();
    let profile = shop.customer("ana").await;
    let shoes = shop.category("Shoes", None).await;
    let boots = shop.category("Boots", Some(&shoes)).await;
    let ordered = shop.product(&boots, "Chelsea", 5000).await;
    let other = shop.product(&shoes, "Runner", 1000).await;
    shop.catalog.place_order(profile.id, &[(ordered.id, 1)]).await.unwrap();

    let error = shop.catalog.categories.delete(&shoes.id).await.unwrap_err();
    assert!(matches!(error, StoreError::HasProtectedDependents { .. }));

    // Nothing in the tree moved
    assert!(shop.catalog.categories.get_by_id(&shoes.id).await.unwrap().is_some());
    assert!(shop.catalog.categories.get_by_id(&boots.id).await.unwrap().is_some());
    assert!(shop.catalog.products.get_by_id(&ordered.id).await.unwrap().is_some());
    assert!(shop.catalog.products.get_by_id(&other.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cascade_reaches_images_and_carts_but_not_favorites() {
    let shop = Shop::new();
    let profile = shop.customer("ana").await;
    let shoes = shop.category("Shoes", None).await;
    let runner = shop.product(&shoes, "Runner", 1000).await;
    let image = shop.catalog.add_image(runner.id, "runner.png").await.unwrap();
    let entry = shop.catalog.add_to_cart(profile.id, runner.id).await.unwrap();
    let favorite = shop.catalog.add_favorite(profile.id, runner.id).await.unwrap();

    let outcome = shop.catalog.categories.delete(&shoes.id).await.unwrap();

    assert!(outcome.was_deactivated("products", &uid(runner.id)));
    assert!(outcome.was_deactivated("product_images", &uid(image.id)));
    assert!(outcome.was_deactivated("cart_entries", &uid(entry.id)));
    assert!(!outcome.was_deactivated("favorites", &uid(favorite.id)));

    let kept = shop.catalog.favorites.get_by_id(&favorite.id).await.unwrap().unwrap();
    assert_eq!(kept.product_id, runner.id);
    assert!(shop.catalog.favorite_products(profile.id).await.unwrap().is_empty());
    assert!(shop.catalog.cart_products(profile.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_user_keeps_orders_with_null_profile() {
    let shop = Shop::new();
    let (user, profile) = shop
        .catalog
        .register_user("ana", "ana@example.com", "Ana", "open sesame")
        .await
        .unwrap();
    let shoes = shop.category("Shoes", None).await;
    let runner = shop.product(&shoes, "Runner", 1000).await;
    let (order, _) = shop.catalog.place_order(profile.id, &[(runner.id, 2)]).await.unwrap();
    shop.take_events();

    let outcome = shop.catalog.users.delete(&user.id).await.unwrap();

    assert!(outcome.was_deactivated("profiles", &uid(profile.id)));
    assert!(outcome.was_nullified("orders", &uid(order.id)));

    let kept = shop.catalog.orders.get_by_id(&order.id).await.unwrap().unwrap();
    assert!(kept.is_active);
    assert_eq!(kept.profile_id, None);
    assert_eq!(shop.catalog.order_items(order.id).await.unwrap().len(), 1);
    assert!(shop
        .catalog
        .authenticate("ana", "open sesame")
        .await
        .unwrap()
        .is_none());

    let events = shop.take_events();
    let root = format!("users:{}", user.id);
    let nullify = events
        .iter()
        .find(|e| e.table_name == "orders")
        .unwrap();
    assert_eq!(nullify.event_type, EventType::Update);
    assert_eq!(nullify.payload.get("profile_id"), Some(&PostgresValue::Null));
    assert_eq!(nullify.cascade_root(), Some(root.as_str()));

    let last = events.last().unwrap();
    assert_eq!(last.event_type, EventType::SoftDelete);
    assert_eq!(last.table_name, "users");
    assert_eq!(last.cascade_root(), None);
}

#[tokio::test]
async fn test_soft_deleted_row_is_kept_in_storage() {
    let shop = Shop::new();
    let shoes = shop.category("Shoes", None).await;
    let runner = shop.product(&shoes, "Runner", 1000).await;

    shop.catalog.products.delete(&runner.id).await.unwrap();

    let stored = shop
        .catalog
        .products
        .get_by_id_in(QueryScope::All, &runner.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.title, "Runner");
    assert!(shop.catalog.products.get_by_id(&runner.id).await.unwrap().is_none());
    assert!(shop.catalog.search_products("run").await.unwrap().is_empty());
    assert_eq!(shop.catalog.products.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_batch_delete_isolates_protected_failure() {
    let shop = Shop::new();
    let profile = shop.customer("ana").await;
    let shoes = shop.category("Shoes", None).await;
    let ordered = shop.product(&shoes, "Ordered", 1000).await;
    let spare = shop.product(&shoes, "Spare", 1000).await;
    shop.catalog.place_order(profile.id, &[(ordered.id, 1)]).await.unwrap();

    let report = shop
        .catalog
        .products
        .delete_many(vec![ordered.id, spare.id])
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.succeeded[0].root.id, uid(spare.id));
    let failure = report.failure_for(&uid(ordered.id)).unwrap();
    assert!(failure.protected_dependents().is_some());

    assert!(shop.catalog.products.get_by_id(&ordered.id).await.unwrap().is_some());
    assert!(shop.catalog.products.get_by_id(&spare.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_inactive_order_item_still_protects_by_default() {
    let shop = Shop::new();
    let profile = shop.customer("ana").await;
    let shoes = shop.category("Shoes", None).await;
    let runner = shop.product(&shoes, "Runner", 1000).await;
    let (order, _) = shop.catalog.place_order(profile.id, &[(runner.id, 1)]).await.unwrap();

    // Cancelling the order soft-deletes its items
    shop.catalog.orders.delete(&order.id).await.unwrap();
    assert!(shop.catalog.order_items(order.id).await.unwrap().is_empty());

    let error = shop.catalog.products.delete(&runner.id).await.unwrap_err();
    assert_eq!(error.protected_dependents().map(<[_]>::len), Some(1));
}

#[tokio::test]
async fn test_inactive_order_item_released_when_configured() {
    let shop = Shop::with_soft_delete(SoftDeleteConfig::new(false));
    let profile = shop.customer("ana").await;
    let shoes = shop.category("Shoes", None).await;
    let runner = shop.product(&shoes, "Runner", 1000).await;
    let (order, _) = shop.catalog.place_order(profile.id, &[(runner.id, 1)]).await.unwrap();

    shop.catalog.orders.delete(&order.id).await.unwrap();

    assert!(shop.catalog.products.delete(&runner.id).await.is_ok());
}

#[tokio::test]
async fn test_hard_delete_after_removing_protection() {
    let shop = Shop::new();
    let profile = shop.customer("ana").await;
    let shoes = shop.category("Shoes", None).await;
    let runner = shop.product(&shoes, "Runner", 1000).await;
    let (order, items) = shop.catalog.place_order(profile.id, &[(runner.id, 1)]).await.unwrap();

    let error = shop.catalog.products.hard_delete(&runner.id).await.unwrap_err();
    assert!(error.protected_dependents().is_some());

    shop.catalog.order_items.hard_delete(&items[0].id).await.unwrap();
    shop.catalog.products.hard_delete(&runner.id).await.unwrap();

    assert!(shop
        .catalog
        .products
        .get_by_id_in(QueryScope::All, &runner.id)
        .await
        .unwrap()
        .is_none());
    assert!(shop.catalog.orders.get_by_id(&order.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_restore_only_touches_the_record() {
    let shop = Shop::new();
    let shoes = shop.category("Shoes", None).await;
    let boots = shop.category("Boots", Some(&shoes)).await;
    shop.catalog.categories.delete(&shoes.id).await.unwrap();

    shop.catalog.categories.restore(&shoes.id).await.unwrap();

    assert!(shop.catalog.categories.get_by_id(&shoes.id).await.unwrap().is_some());
    assert!(shop.catalog.categories.get_by_id(&boots.id).await.unwrap().is_none());
    assert!(shop.catalog.subcategories(shoes.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_for_unregistered_table_fails() {
    let vitrine = Vitrine::in_memory();
    let error = vitrine.store::<Category>().unwrap_err();
    assert!(matches!(error, VitrineError::SchemaNotRegistered(ref table) if table == "categories"));
}

#[tokio::test]
async fn test_registering_twice_is_rejected() {
    let shop = Shop::new();
    let error = shop.vitrine.register::<Category>().unwrap_err();
    assert!(matches!(
        error.as_store(),
        Some(StoreError::InvalidConfiguration { .. })
    ));
}
