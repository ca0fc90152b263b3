//! Storefront tables
//!
//! Foreign keys live on the dependent side and declare what happens to the
//! dependent when the referenced record is deleted.

use crate::prelude::*;

#[model]
#[table(name = "users")]
pub struct User {
    #[primary_key]
    pub id: Uuid,

    #[field(create, update)]
    pub username: String,

    #[field(create, update)]
    pub email: String,

    /// Argon2id PHC string, never the password itself
    #[field(create, update)]
    pub password_hash: String,

    #[field(create, update)]
    pub first_name: String,

    #[field(create, update)]
    pub phone: Option<String>,

    #[field(create, update)]
    pub is_staff: bool,

    #[field(readonly)]
    pub created_at: Option<DateTime<Utc>>,

    #[soft_delete]
    pub is_active: bool,
}

#[model]
#[table(name = "profiles")]
pub struct Profile {
    #[primary_key]
    pub id: Uuid,

    #[field(create)]
    #[foreign_key(references = "users", on_delete = "cascade")]
    pub user_id: Uuid,

    #[field(create, update)]
    pub phone: Option<String>,

    #[field(create, update)]
    pub city: Option<String>,

    #[field(create, update)]
    pub postal_code: Option<String>,

    #[soft_delete]
    pub is_active: bool,
}

#[model]
#[table(name = "categories")]
pub struct Category {
    #[primary_key]
    pub id: Uuid,

    #[field(create)]
    #[foreign_key(references = "categories", on_delete = "cascade")]
    pub parent_id: Option<Uuid>,

    #[field(create, update)]
    pub title: String,

    #[field(create, update)]
    pub slug: String,

    #[soft_delete]
    pub is_active: bool,
}

impl Category {
    pub fn is_subcategory(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[model]
#[table(name = "products")]
pub struct Product {
    #[primary_key]
    pub id: Uuid,

    #[field(create, update)]
    #[foreign_key(references = "categories", on_delete = "cascade")]
    pub category_id: Uuid,

    #[field(create, update)]
    pub title: String,

    #[field(create, update)]
    pub slug: String,

    /// Price in cents
    #[field(create, update)]
    pub price_cents: i64,

    #[field(create, update)]
    pub promo_price_cents: Option<i64>,

    #[field(create, update)]
    pub description: Option<String>,

    #[field(create, update)]
    pub featured: bool,

    #[field(create, update)]
    pub in_stock: bool,

    #[field(readonly)]
    pub created_at: Option<DateTime<Utc>>,

    #[soft_delete]
    pub is_active: bool,
}

impl Product {
    /// Promotional price when one is set, otherwise the list price
    pub fn effective_price_cents(&self) -> i64 {
        self.promo_price_cents.unwrap_or(self.price_cents)
    }
}

#[model]
#[table(name = "product_images")]
pub struct ProductImage {
    #[primary_key]
    pub id: Uuid,

    #[field(create)]
    #[foreign_key(references = "products", on_delete = "cascade")]
    pub product_id: Uuid,

    #[field(create, update)]
    pub url: String,

    #[soft_delete]
    pub is_active: bool,
}

#[model]
#[table(name = "orders")]
pub struct Order {
    #[primary_key]
    pub id: Uuid,

    #[field(create)]
    #[foreign_key(references = "profiles", on_delete = "set_null")]
    pub profile_id: Option<Uuid>,

    #[field(create)]
    pub code: String,

    #[field(readonly)]
    pub created_at: Option<DateTime<Utc>>,

    #[soft_delete]
    pub is_active: bool,
}

#[model]
#[table(name = "order_items")]
pub struct OrderItem {
    #[primary_key]
    pub id: Uuid,

    #[field(create)]
    #[foreign_key(references = "orders", on_delete = "cascade")]
    pub order_id: Uuid,

    #[field(create)]
    #[foreign_key(references = "products", on_delete = "protect")]
    pub product_id: Uuid,

    #[field(create, update)]
    pub quantity: i32,

    /// Unit price captured when the order was placed
    #[field(create)]
    pub unit_price_cents: i64,

    #[soft_delete]
    pub is_active: bool,
}

#[model]
#[table(name = "cart_entries")]
pub struct CartEntry {
    #[primary_key]
    pub id: Uuid,

    #[field(create)]
    #[foreign_key(references = "profiles", on_delete = "cascade")]
    pub profile_id: Uuid,

    #[field(create)]
    #[foreign_key(references = "products", on_delete = "cascade")]
    pub product_id: Uuid,

    #[soft_delete]
    pub is_active: bool,
}

#[model]
#[table(name = "favorites")]
pub struct Favorite {
    #[primary_key]
    pub id: Uuid,

    #[field(create)]
    #[foreign_key(references = "profiles", on_delete = "cascade")]
    pub profile_id: Uuid,

    #[field(create)]
    #[foreign_key(references = "products", on_delete = "ignore")]
    pub product_id: Uuid,

    #[soft_delete]
    pub is_active: bool,
}
