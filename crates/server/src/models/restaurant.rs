//! Restaurant and menu domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tavola_core::{MenuItemId, RestaurantId, UserId};

/// A restaurant on the marketplace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    /// Account that owns and manages this restaurant.
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    /// Cuisine tags (e.g. "italian", "pizza").
    pub cuisine: Vec<String>,
    pub address: String,
    pub phone: String,
    /// Whether the restaurant is currently accepting orders.
    pub is_open: bool,
    /// Advertised delivery time in minutes.
    pub delivery_time_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One item on a restaurant's menu.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Unavailable items stay on the menu but cannot be ordered.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
