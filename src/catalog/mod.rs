//! Storefront catalog
//!
//! Users and their profiles, a category tree, products with images, carts,
//! favorites and orders. Deleting goes through the soft-delete engine like
//! any other table, so removing a category takes its subcategories and
//! products with it, while a product that was ever ordered stays put.

mod models;
mod password;
mod rules;

pub use models::{
    CartEntry, Category, Favorite, Order, OrderItem, Product, ProductImage, Profile, User,
};
pub use password::PasswordHashing;
pub use rules::{
    generate_order_code, is_order_code, normalize_email, slugify, validate_email,
    validate_password, validate_prices, validate_title, ORDER_CODE_ALPHABET, ORDER_CODE_LEN,
    PASSWORD_MIN_LEN,
};

use crate::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

const ORDER_CODE_ATTEMPTS: usize = 8;

/// Register every catalog table, referenced tables first
pub fn register_all(vitrine: &Vitrine) -> Result<(), VitrineError> {
    vitrine.register::<User>()?;
    vitrine.register::<Profile>()?;
    vitrine.register::<Category>()?;
    vitrine.register::<Product>()?;
    vitrine.register::<ProductImage>()?;
    vitrine.register::<Order>()?;
    vitrine.register::<OrderItem>()?;
    vitrine.register::<CartEntry>()?;
    vitrine.register::<Favorite>()?;
    vitrine.validate()
}

/// Create every catalog table in dependency order
///
/// With `recreate`, tables are dropped first, dependents before the tables
/// they reference.
pub async fn migrate_all(vitrine: &Vitrine, recreate: bool) -> Result<(), VitrineError> {
    if recreate {
        let pool = vitrine.pool().ok_or(VitrineError::NotConnected("migrate_all"))?;
        for drop_sql in [
            Favorite::drop_table_sql(),
            CartEntry::drop_table_sql(),
            OrderItem::drop_table_sql(),
            Order::drop_table_sql(),
            ProductImage::drop_table_sql(),
            Product::drop_table_sql(),
            Category::drop_table_sql(),
            Profile::drop_table_sql(),
            User::drop_table_sql(),
        ] {
            sqlx::query(&drop_sql).execute(pool).await?;
        }
    }

    vitrine.auto_migrate::<User>(false).await?;
    vitrine.auto_migrate::<Profile>(false).await?;
    vitrine.auto_migrate::<Category>(false).await?;
    vitrine.auto_migrate::<Product>(false).await?;
    vitrine.auto_migrate::<ProductImage>(false).await?;
    vitrine.auto_migrate::<Order>(false).await?;
    vitrine.auto_migrate::<OrderItem>(false).await?;
    vitrine.auto_migrate::<CartEntry>(false).await?;
    vitrine.auto_migrate::<Favorite>(false).await?;
    Ok(())
}

/// Fields accepted when listing a new product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: Uuid,
    pub title: String,
    pub price_cents: i64,
    pub promo_price_cents: Option<i64>,
    pub description: Option<String>,
    pub featured: bool,
    pub in_stock: bool,
}

impl NewProduct {
    pub fn new(category_id: Uuid, title: impl Into<String>, price_cents: i64) -> Self {
        Self {
            category_id,
            title: title.into(),
            price_cents,
            promo_price_cents: None,
            description: None,
            featured: false,
            in_stock: true,
        }
    }

    pub fn promo(mut self, promo_price_cents: i64) -> Self {
        self.promo_price_cents = Some(promo_price_cents);
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }
}

fn id_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}

/// Typed stores for every catalog table plus the storefront operations
#[derive(Clone, Debug)]
pub struct Catalog {
    pub users: GenericStore<User>,
    pub profiles: GenericStore<Profile>,
    pub categories: GenericStore<Category>,
    pub products: GenericStore<Product>,
    pub images: GenericStore<ProductImage>,
    pub orders: GenericStore<Order>,
    pub order_items: GenericStore<OrderItem>,
    pub cart: GenericStore<CartEntry>,
    pub favorites: GenericStore<Favorite>,
    passwords: PasswordHashing,
}

impl Catalog {
    /// Stores over an instance where [`register_all`] has run
    pub fn new(vitrine: &Vitrine) -> Result<Self, VitrineError> {
        Ok(Self {
            users: vitrine.store()?,
            profiles: vitrine.store()?,
            categories: vitrine.store()?,
            products: vitrine.store()?,
            images: vitrine.store()?,
            orders: vitrine.store()?,
            order_items: vitrine.store()?,
            cart: vitrine.store()?,
            favorites: vitrine.store()?,
            passwords: PasswordHashing::default(),
        })
    }

    /// Hash new passwords with a different argon2 cost
    pub fn with_password_hashing(mut self, passwords: PasswordHashing) -> Self {
        self.passwords = passwords;
        self
    }

    /// Register all tables on `vitrine` and open the catalog
    pub fn install(vitrine: &Vitrine) -> Result<Self, VitrineError> {
        register_all(vitrine)?;
        Self::new(vitrine)
    }

    // Accounts

    async fn ensure_unused(&self, field: &str, value: &str, message: &str) -> Result<(), StoreError> {
        // Soft-deleted accounts keep their username and email
        let taken = self
            .users
            .count_in(
                QueryScope::All,
                QueryBuilder::new().filter(QueryFilter::eq(field, Value::from(value))),
            )
            .await?;
        if taken > 0 {
            return Err(StoreError::validation("users", field, message));
        }
        Ok(())
    }

    /// Create a user together with its empty profile
    ///
    /// The email is stored lowercased and, like the username, must not belong
    /// to any other account.
    pub async fn register_user(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        password: &str,
    ) -> Result<(User, Profile), StoreError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;
        self.ensure_unused("username", username, "username is already taken")
            .await?;
        self.ensure_unused("email", &email, "a user with this email already exists")
            .await?;

        let user = self
            .users
            .create(User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email,
                password_hash: self.passwords.hash(password)?,
                first_name: first_name.to_string(),
                phone: None,
                is_staff: false,
                created_at: None,
                is_active: true,
            })
            .await?;
        let profile = self
            .profiles
            .create(Profile {
                id: Uuid::new_v4(),
                user_id: user.id,
                phone: None,
                city: None,
                postal_code: None,
                is_active: true,
            })
            .await?;
        info!(username = %user.username, "user registered");
        Ok((user, profile))
    }

    /// Active user matching `login` as a username or an email, if the password fits
    ///
    /// Deactivated accounts never authenticate.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Option<User>, StoreError> {
        let mut user = self
            .users
            .find_one(QueryBuilder::new().filter(QueryFilter::eq("username", Value::from(login))))
            .await?;
        if user.is_none() {
            let email = normalize_email(login);
            user = self
                .users
                .find_one(QueryBuilder::new().filter(QueryFilter::eq("email", Value::from(email))))
                .await?;
        }

        let Some(user) = user else {
            debug!(login, "no active user for login");
            return Ok(None);
        };
        if !self.passwords.verify(password, &user.password_hash)? {
            debug!(login, "password rejected");
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Replace an active user's password after checking the current one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new: &str,
    ) -> Result<User, StoreError> {
        let mut user = self
            .users
            .get_by_id(&user_id)
            .await?
            .ok_or_else(|| StoreError::not_found("users", user_id))?;
        if !self.passwords.verify(current, &user.password_hash)? {
            return Err(StoreError::validation("users", "password", "current password is incorrect"));
        }
        validate_password(new)?;

        user.password_hash = self.passwords.hash(new)?;
        self.users.update(&user_id, user).await
    }

    pub async fn profile_of(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.profiles
            .find_one(QueryBuilder::new().filter(QueryFilter::eq("user_id", id_value(user_id))))
            .await
    }

    // Categories

    async fn ensure_unique_title(&self, title: &str, except: Option<Uuid>) -> Result<(), StoreError> {
        let mut query = QueryBuilder::new().filter(QueryFilter::eq("title", Value::from(title)));
        if let Some(id) = except {
            query = query.filter(QueryFilter::ne("id", id_value(id)));
        }
        if self.categories.count_where(query).await? > 0 {
            return Err(StoreError::validation(
                "categories",
                "title",
                format!("a category named {:?} already exists", title),
            ));
        }
        Ok(())
    }

    /// Titles are unique among active categories; the slug follows the title
    pub async fn create_category(
        &self,
        title: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Category, StoreError> {
        validate_title("categories", title)?;
        self.ensure_unique_title(title, None).await?;
        if let Some(parent) = parent_id {
            if self.categories.get_by_id(&parent).await?.is_none() {
                return Err(StoreError::not_found("categories", parent));
            }
        }

        self.categories
            .create(Category {
                id: Uuid::new_v4(),
                parent_id,
                title: title.to_string(),
                slug: slugify(title),
                is_active: true,
            })
            .await
    }

    pub async fn rename_category(&self, id: Uuid, title: &str) -> Result<Category, StoreError> {
        validate_title("categories", title)?;
        let mut category = self
            .categories
            .get_by_id(&id)
            .await?
            .ok_or_else(|| StoreError::not_found("categories", id))?;
        self.ensure_unique_title(title, Some(id)).await?;

        category.title = title.to_string();
        category.slug = slugify(title);
        self.categories.update(&id, category).await
    }

    /// Active top-level categories, by title
    pub async fn root_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.categories
            .find(
                QueryBuilder::new()
                    .filter(QueryFilter::is_null("parent_id"))
                    .order_by("title", SortOrder::Asc),
            )
            .await
    }

    pub async fn subcategories(&self, parent_id: Uuid) -> Result<Vec<Category>, StoreError> {
        self.categories
            .find(
                QueryBuilder::new()
                    .filter(QueryFilter::eq("parent_id", id_value(parent_id)))
                    .order_by("title", SortOrder::Asc),
            )
            .await
    }

    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        self.categories
            .find_one(QueryBuilder::new().filter(QueryFilter::eq("slug", Value::from(slug))))
            .await
    }

    // Products

    pub async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        validate_title("products", &new.title)?;
        validate_prices(new.price_cents, new.promo_price_cents)?;
        if self.categories.get_by_id(&new.category_id).await?.is_none() {
            return Err(StoreError::not_found("categories", new.category_id));
        }

        self.products
            .create(Product {
                id: Uuid::new_v4(),
                category_id: new.category_id,
                slug: slugify(&new.title),
                title: new.title,
                price_cents: new.price_cents,
                promo_price_cents: new.promo_price_cents,
                description: new.description,
                featured: new.featured,
                in_stock: new.in_stock,
                created_at: None,
                is_active: true,
            })
            .await
    }

    pub async fn set_prices(
        &self,
        id: Uuid,
        price_cents: i64,
        promo_price_cents: Option<i64>,
    ) -> Result<Product, StoreError> {
        validate_prices(price_cents, promo_price_cents)?;
        let mut product = self
            .products
            .get_by_id(&id)
            .await?
            .ok_or_else(|| StoreError::not_found("products", id))?;

        product.price_cents = price_cents;
        product.promo_price_cents = promo_price_cents;
        self.products.update(&id, product).await
    }

    pub async fn add_image(&self, product_id: Uuid, url: &str) -> Result<ProductImage, StoreError> {
        if self.products.get_by_id(&product_id).await?.is_none() {
            return Err(StoreError::not_found("products", product_id));
        }
        self.images
            .create(ProductImage {
                id: Uuid::new_v4(),
                product_id,
                url: url.to_string(),
                is_active: true,
            })
            .await
    }

    pub async fn products_in(&self, category_id: Uuid) -> Result<Vec<Product>, StoreError> {
        self.products
            .find(
                QueryBuilder::new()
                    .filter(QueryFilter::eq("category_id", id_value(category_id)))
                    .order_by("title", SortOrder::Asc),
            )
            .await
    }

    /// Featured products in stock, newest first
    pub async fn featured_products(&self, limit: u64) -> Result<Vec<Product>, StoreError> {
        self.products
            .find(
                QueryBuilder::new()
                    .filter(QueryFilter::eq("featured", Value::Bool(true)))
                    .filter(QueryFilter::eq("in_stock", Value::Bool(true)))
                    .order_by("created_at", SortOrder::Desc)
                    .limit(limit),
            )
            .await
    }

    /// Case-insensitive title search over active products
    pub async fn search_products(&self, term: &str) -> Result<Vec<Product>, StoreError> {
        let pattern = format!("%{}%", term);
        self.products
            .find(
                QueryBuilder::new()
                    .filter(QueryFilter::ilike("title", &pattern))
                    .order_by("title", SortOrder::Asc),
            )
            .await
    }

    async fn active_product(&self, product_id: Uuid) -> Result<Product, StoreError> {
        self.products
            .get_by_id(&product_id)
            .await?
            .ok_or_else(|| StoreError::not_found("products", product_id))
    }

    async fn active_profile(&self, profile_id: Uuid) -> Result<Profile, StoreError> {
        self.profiles
            .get_by_id(&profile_id)
            .await?
            .ok_or_else(|| StoreError::not_found("profiles", profile_id))
    }

    // Cart and favorites

    pub async fn add_to_cart(&self, profile_id: Uuid, product_id: Uuid) -> Result<CartEntry, StoreError> {
        self.active_profile(profile_id).await?;
        self.active_product(product_id).await?;

        let existing = self
            .cart
            .find_one(
                QueryBuilder::new()
                    .filter(QueryFilter::eq("profile_id", id_value(profile_id)))
                    .filter(QueryFilter::eq("product_id", id_value(product_id))),
            )
            .await?;
        if let Some(entry) = existing {
            return Ok(entry);
        }

        self.cart
            .create(CartEntry {
                id: Uuid::new_v4(),
                profile_id,
                product_id,
                is_active: true,
            })
            .await
    }

    /// Soft-deletes the matching cart entries; returns how many were removed
    pub async fn remove_from_cart(&self, profile_id: Uuid, product_id: Uuid) -> Result<usize, StoreError> {
        let report = self
            .cart
            .delete_where(
                QueryBuilder::new()
                    .filter(QueryFilter::eq("profile_id", id_value(profile_id)))
                    .filter(QueryFilter::eq("product_id", id_value(product_id))),
            )
            .await?;
        Ok(report.succeeded.len())
    }

    /// Active products in a profile's cart
    pub async fn cart_products(&self, profile_id: Uuid) -> Result<Vec<Product>, StoreError> {
        let entries = self
            .cart
            .find(QueryBuilder::new().filter(QueryFilter::eq("profile_id", id_value(profile_id))))
            .await?;
        self.products_by_ids(entries.iter().map(|e| e.product_id)).await
    }

    /// Favoriting the same product twice returns the existing favorite
    pub async fn add_favorite(&self, profile_id: Uuid, product_id: Uuid) -> Result<Favorite, StoreError> {
        self.active_profile(profile_id).await?;
        self.active_product(product_id).await?;

        let existing = self
            .favorites
            .find_one(
                QueryBuilder::new()
                    .filter(QueryFilter::eq("profile_id", id_value(profile_id)))
                    .filter(QueryFilter::eq("product_id", id_value(product_id))),
            )
            .await?;
        if let Some(favorite) = existing {
            return Ok(favorite);
        }

        self.favorites
            .create(Favorite {
                id: Uuid::new_v4(),
                profile_id,
                product_id,
                is_active: true,
            })
            .await
    }

    /// Favorites still pointing at an active product
    pub async fn favorite_products(&self, profile_id: Uuid) -> Result<Vec<Product>, StoreError> {
        let favorites = self
            .favorites
            .find(QueryBuilder::new().filter(QueryFilter::eq("profile_id", id_value(profile_id))))
            .await?;
        self.products_by_ids(favorites.iter().map(|f| f.product_id)).await
    }

    async fn products_by_ids(
        &self,
        ids: impl Iterator<Item = Uuid>,
    ) -> Result<Vec<Product>, StoreError> {
        let ids: Vec<Value> = ids.map(id_value).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.products
            .find(
                QueryBuilder::new()
                    .filter(QueryFilter::in_values("id", ids))
                    .order_by("title", SortOrder::Asc),
            )
            .await
    }

    // Orders

    async fn unused_order_code(&self) -> Result<String, StoreError> {
        for _ in 0..ORDER_CODE_ATTEMPTS {
            let code = generate_order_code(&mut rand::rng());
            let clashes = self
                .orders
                .count_in(
                    QueryScope::All,
                    QueryBuilder::new().filter(QueryFilter::eq("code", Value::from(code.as_str()))),
                )
                .await?;
            if clashes == 0 {
                return Ok(code);
            }
        }
        Err(StoreError::validation(
            "orders",
            "code",
            "could not find an unused order code",
        ))
    }

    /// Place an order for `(product, quantity)` lines at current prices
    pub async fn place_order(
        &self,
        profile_id: Uuid,
        lines: &[(Uuid, i32)],
    ) -> Result<(Order, Vec<OrderItem>), StoreError> {
        if lines.is_empty() {
            return Err(StoreError::validation("orders", "items", "an order needs at least one item"));
        }
        if let Some((_, quantity)) = lines.iter().find(|(_, quantity)| *quantity <= 0) {
            return Err(StoreError::validation(
                "order_items",
                "quantity",
                format!("quantity must be positive, got {}", quantity),
            ));
        }

        self.active_profile(profile_id).await?;
        let mut priced = Vec::with_capacity(lines.len());
        for &(product_id, quantity) in lines {
            let product = self.active_product(product_id).await?;
            if !product.in_stock {
                return Err(StoreError::validation(
                    "order_items",
                    "product_id",
                    format!("{} is out of stock", product.title),
                ));
            }
            priced.push((product, quantity));
        }

        let order = self
            .orders
            .create(Order {
                id: Uuid::new_v4(),
                profile_id: Some(profile_id),
                code: self.unused_order_code().await?,
                created_at: None,
                is_active: true,
            })
            .await?;

        let mut items = Vec::with_capacity(priced.len());
        for (product, quantity) in priced {
            items.push(
                self.order_items
                    .create(OrderItem {
                        id: Uuid::new_v4(),
                        order_id: order.id,
                        product_id: product.id,
                        quantity,
                        unit_price_cents: product.effective_price_cents(),
                        is_active: true,
                    })
                    .await?,
            );
        }

        info!(order = %order.code, items = items.len(), "order placed");
        Ok((order, items))
    }

    pub async fn orders_for(&self, profile_id: Uuid) -> Result<Vec<Order>, StoreError> {
        self.orders
            .find(
                QueryBuilder::new()
                    .filter(QueryFilter::eq("profile_id", id_value(profile_id)))
                    .order_by("created_at", SortOrder::Desc),
            )
            .await
    }

    pub async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError> {
        self.order_items
            .find(QueryBuilder::new().filter(QueryFilter::eq("order_id", id_value(order_id))))
            .await
    }

    pub async fn order_total_cents(&self, order_id: Uuid) -> Result<i64, StoreError> {
        self.order_items(order_id)
            .await?
            .iter()
            .try_fold(0i64, |total, item| {
                item.unit_price_cents
                    .checked_mul(i64::from(item.quantity))
                    .and_then(|line| total.checked_add(line))
            })
            .ok_or_else(|| StoreError::validation("orders", "total", "order total overflows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "correct horse";

    fn catalog() -> Catalog {
        let vitrine = Vitrine::in_memory();
        Catalog::install(&vitrine)
            .unwrap()
            .with_password_hashing(PasswordHashing::with_cost(8, 1).unwrap())
    }

    async fn shoe(catalog: &Catalog, title: &str, price_cents: i64) -> Product {
        let category = match catalog.category_by_slug("shoes").await.unwrap() {
            Some(category) => category,
            None => catalog.create_category("Shoes", None).await.unwrap(),
        };
        catalog
            .create_product(NewProduct::new(category.id, title, price_cents))
            .await
            .unwrap()
    }

    #[test]
    fn test_register_all_wires_relations() {
        let vitrine = Vitrine::in_memory();
        register_all(&vitrine).unwrap();

        let registry = vitrine.registry().snapshot().unwrap();
        assert_eq!(registry.len(), 9);
        let product_dependents: Vec<_> = registry
            .dependents_of("products")
            .into_iter()
            .map(|(relation, _)| (relation.dependent_table, relation.on_delete))
            .collect();
        assert_eq!(
            product_dependents,
            vec![
                ("product_images", OnDelete::Cascade),
                ("order_items", OnDelete::Protect),
                ("cart_entries", OnDelete::Cascade),
                ("favorites", OnDelete::Ignore),
            ]
        );
    }

    #[tokio::test]
    async fn test_category_titles_unique_among_active() {
        let catalog = catalog();
        let shoes = catalog.create_category("Shoes", None).await.unwrap();
        assert_eq!(shoes.slug, "shoes");

        let duplicate = catalog.create_category("Shoes", None).await.unwrap_err();
        assert!(matches!(duplicate, StoreError::Validation { ref field, .. } if field == "title"));

        catalog.categories.delete(&shoes.id).await.unwrap();
        assert!(catalog.create_category("Shoes", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_rename_category_updates_slug() {
        let catalog = catalog();
        let shoes = catalog.create_category("Shoes", None).await.unwrap();
        catalog.create_category("Hats", None).await.unwrap();

        let renamed = catalog.rename_category(shoes.id, "Running Shoes").await.unwrap();
        assert_eq!(renamed.slug, "running-shoes");
        assert!(catalog.rename_category(shoes.id, "Hats").await.is_err());
        assert!(catalog.rename_category(shoes.id, "Running Shoes").await.is_ok());
        assert!(catalog.category_by_slug("running-shoes").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_product_price_rules() {
        let catalog = catalog();
        let shoes = catalog.create_category("Shoes", None).await.unwrap();

        let error = catalog
            .create_product(NewProduct::new(shoes.id, "Runner", 1000).promo(1500))
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::Validation { .. }));

        let runner = catalog
            .create_product(NewProduct::new(shoes.id, "Runner", 1000).promo(800))
            .await
            .unwrap();
        assert_eq!(runner.effective_price_cents(), 800);
        assert!(catalog.set_prices(runner.id, 500, Some(600)).await.is_err());

        let missing = catalog
            .create_product(NewProduct::new(Uuid::new_v4(), "Ghost", 100))
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_place_order_captures_prices() {
        let catalog = catalog();
        let (_, profile) = catalog.register_user("ana", "ana@example.com", "Ana", PASSWORD).await.unwrap();
        let shoes = catalog.create_category("Shoes", None).await.unwrap();
        let runner = catalog
            .create_product(NewProduct::new(shoes.id, "Runner", 1000).promo(900))
            .await
            .unwrap();
        let boot = catalog
            .create_product(NewProduct::new(shoes.id, "Boot", 2500))
            .await
            .unwrap();

        let (order, items) = catalog
            .place_order(profile.id, &[(runner.id, 2), (boot.id, 1)])
            .await
            .unwrap();

        assert!(is_order_code(&order.code));
        assert_eq!(items.len(), 2);
        assert_eq!(catalog.order_total_cents(order.id).await.unwrap(), 4300);
        assert_eq!(catalog.orders_for(profile.id).await.unwrap().len(), 1);

        assert!(catalog.place_order(profile.id, &[]).await.is_err());
        assert!(catalog.place_order(profile.id, &[(runner.id, 0)]).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let catalog = catalog();
        catalog.register_user("ana", "ana@example.com", "Ana", PASSWORD).await.unwrap();
        let error = catalog
            .register_user("ana", "other@example.com", "Ana", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::Validation { ref field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn test_email_unique_ignoring_case() {
        let catalog = catalog();
        let (alice, _) = catalog
            .register_user("alice", "Shared@Example.com", "Alice", PASSWORD)
            .await
            .unwrap();
        assert_eq!(alice.email, "shared@example.com");

        let error = catalog
            .register_user("bob", "SHARED@example.com", "Bob", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::Validation { ref field, .. } if field == "email"));
        assert_eq!(catalog.users.count().await.unwrap(), 1);

        // Still reserved after the account is deactivated
        catalog.users.delete(&alice.id).await.unwrap();
        assert!(catalog
            .register_user("carol", "shared@example.com", "Carol", PASSWORD)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_registration_input_rules() {
        let catalog = catalog();
        assert!(catalog.register_user("ana", "not-an-email", "Ana", PASSWORD).await.is_err());
        assert!(catalog.register_user("ana", "ana@example.com", "Ana", "short").await.is_err());
        assert_eq!(catalog.users.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_by_username_or_email() {
        let catalog = catalog();
        let (ana, _) = catalog
            .register_user("ana", "ana@example.com", "Ana", PASSWORD)
            .await
            .unwrap();
        assert_ne!(ana.password_hash, PASSWORD);

        let by_name = catalog.authenticate("ana", PASSWORD).await.unwrap().unwrap();
        assert_eq!(by_name.id, ana.id);
        let by_email = catalog.authenticate("ANA@example.com", PASSWORD).await.unwrap().unwrap();
        assert_eq!(by_email.id, ana.id);

        assert!(catalog.authenticate("ana", "wrong horse").await.unwrap().is_none());
        assert!(catalog.authenticate("nobody", PASSWORD).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_authenticate() {
        let catalog = catalog();
        let (ana, _) = catalog
            .register_user("ana", "ana@example.com", "Ana", PASSWORD)
            .await
            .unwrap();
        catalog.users.delete(&ana.id).await.unwrap();

        assert!(catalog.authenticate("ana", PASSWORD).await.unwrap().is_none());
        assert!(catalog.authenticate("ana@example.com", PASSWORD).await.unwrap().is_none());

        catalog.users.restore(&ana.id).await.unwrap();
        assert!(catalog.authenticate("ana", PASSWORD).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_change_password() {
        let catalog = catalog();
        let (ana, _) = catalog
            .register_user("ana", "ana@example.com", "Ana", PASSWORD)
            .await
            .unwrap();

        let error = catalog
            .change_password(ana.id, "wrong horse", "battery staple")
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::Validation { ref field, .. } if field == "password"));
        assert!(catalog.change_password(ana.id, PASSWORD, "short").await.is_err());

        catalog
            .change_password(ana.id, PASSWORD, "battery staple")
            .await
            .unwrap();
        assert!(catalog.authenticate("ana", PASSWORD).await.unwrap().is_none());
        assert!(catalog.authenticate("ana", "battery staple").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_add_favorite_twice_keeps_one() {
        let catalog = catalog();
        let (_, profile) = catalog
            .register_user("ana", "ana@example.com", "Ana", PASSWORD)
            .await
            .unwrap();
        let runner = shoe(&catalog, "Runner", 1000).await;

        let first = catalog.add_favorite(profile.id, runner.id).await.unwrap();
        let second = catalog.add_favorite(profile.id, runner.id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(catalog.favorites.count().await.unwrap(), 1);
        assert_eq!(catalog.favorite_products(profile.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_order_total_overflow_is_an_error() {
        let catalog = catalog();
        let (_, profile) = catalog
            .register_user("ana", "ana@example.com", "Ana", PASSWORD)
            .await
            .unwrap();
        let runner = shoe(&catalog, "Runner", 1000).await;
        let (order, _) = catalog.place_order(profile.id, &[(runner.id, 1)]).await.unwrap();

        catalog
            .order_items
            .create(OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: runner.id,
                quantity: 2,
                unit_price_cents: i64::MAX,
                is_active: true,
            })
            .await
            .unwrap();

        let error = catalog.order_total_cents(order.id).await.unwrap_err();
        assert!(matches!(error, StoreError::Validation { ref field, .. } if field == "total"));
    }
}
