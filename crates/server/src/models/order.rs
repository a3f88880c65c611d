//! Order domain types.
//!
//! An order is a snapshot: items, addresses, and pricing are frozen at
//! checkout and never change afterwards. Only `status` and `payment_status`
//! are mutable, and `status` only through the transition table in
//! `tavola_core::order`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tavola_core::{
    MenuItemId, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, PromotionId,
    RestaurantId, UserId,
};

/// A persisted order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Customer who placed the order.
    pub user_id: UserId,
    /// Restaurant the order is addressed to.
    pub restaurant_id: RestaurantId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Pricing snapshot, already rounded to cents.
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    /// Discount taken off by a promotion; zero when none was applied.
    pub discount: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_id: Option<PromotionId>,
    pub delivery_address: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One snapshotted line of an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// Menu item this line was created from. The name and price below are
    /// the values at checkout time, not live menu values.
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
