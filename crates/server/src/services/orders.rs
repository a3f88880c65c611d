//! Order service: checkout, lifecycle transitions, and authorization.
//!
//! Pricing is never taken from the client. Checkout rebuilds the cart from
//! the stored menu, recomputes totals with the platform pricing policy, and
//! snapshots the result. Status changes go through the transition table in
//! `tavola_core::order` and land as a compare-and-swap, so a concurrent
//! update surfaces as a `Conflict` instead of silently winning.

use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use tavola_core::{
    Cart, CartLine, MenuItemId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, PricingPolicy,
    RestaurantId, UserId, UserRole,
};

use crate::db::RepositoryError;
use crate::db::orders::{NewOrder, NewOrderItem, OrderRepository};
use crate::db::restaurants::RestaurantRepository;
use crate::error::{AppError, Result};
use crate::models::order::Order;
use crate::models::user::CurrentUser;
use crate::services::payment::{self, PaymentIntent};

/// One requested line at checkout: which item, how many. Name and price are
/// looked up server-side.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
}

/// Checkout request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub restaurant_id: RestaurantId,
    pub items: Vec<CheckoutLine>,
    pub delivery_address: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub promotion_code: Option<String>,
}

/// A placed order plus the payment intent for card/PayPal checkouts.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub payment_intent: Option<PaymentIntent>,
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from submitted cart lines.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for empty/duplicate/unknown lines or
    /// unavailable items, `NotFound` for an unknown restaurant or promotion
    /// code, and `Conflict` for an exhausted or expired promotion.
    #[instrument(skip(self, input), fields(user = %user.id, restaurant = %input.restaurant_id))]
    pub async fn checkout(&self, user: &CurrentUser, input: CheckoutInput) -> Result<PlacedOrder> {
        if input.items.is_empty() {
            return Err(AppError::Validation("Cart is empty".to_owned()));
        }
        if input.delivery_address.trim().is_empty() {
            return Err(AppError::Validation("Delivery address is required".to_owned()));
        }
        if input.phone.trim().is_empty() {
            return Err(AppError::Validation("Phone number is required".to_owned()));
        }

        let restaurants = RestaurantRepository::new(self.pool);
        let restaurant = restaurants
            .get(input.restaurant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Restaurant not found".to_owned()))?;
        if !restaurant.is_open {
            return Err(AppError::Validation(
                "Restaurant is not accepting orders".to_owned(),
            ));
        }

        let cart = self.build_cart(&restaurants, &input).await?;
        let totals = cart.totals(&PricingPolicy::default());

        let items = cart
            .lines()
            .iter()
            .map(|line| NewOrderItem {
                menu_item_id: line.menu_item_id,
                name: line.name.clone(),
                price: line.price,
                quantity: i32::try_from(line.quantity).unwrap_or(i32::MAX),
                image_url: line.image.clone(),
            })
            .collect();

        // The promotion is redeemed inside the order transaction, and the
        // discount is priced off the row that redemption returns, so the
        // stored amount always matches the promotion actually consumed.
        let orders = OrderRepository::new(self.pool);
        let order = orders
            .create(NewOrder {
                user_id: user.id,
                restaurant_id: input.restaurant_id,
                payment_method: input.payment_method,
                subtotal: totals.subtotal,
                tax: totals.tax,
                delivery_fee: totals.delivery_fee,
                total_before_discount: totals.total,
                promotion_code: input.promotion_code,
                delivery_address: input.delivery_address,
                phone: input.phone,
                special_instructions: input.special_instructions,
                items,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    AppError::NotFound("Promotion code not found".to_owned())
                }
                RepositoryError::Conflict(msg) => AppError::Conflict(msg),
                other => AppError::Database(other),
            })?;

        let payment_intent = input
            .payment_method
            .requires_payment_intent()
            .then(|| payment::create_payment_intent(order.total, order.id));

        info!(order = %order.id, total = %order.total, "Order placed");
        Ok(PlacedOrder {
            order,
            payment_intent,
        })
    }

    /// List the caller's own orders, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user: &CurrentUser,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        Ok(OrderRepository::new(self.pool)
            .list_for_user(user.id, status)
            .await?)
    }

    /// List a restaurant's incoming orders. Owner or admin only.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when the caller neither owns the restaurant nor
    /// is an admin.
    pub async fn list_for_restaurant(
        &self,
        user: &CurrentUser,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Order>> {
        self.ensure_restaurant_access(user, restaurant_id).await?;
        Ok(OrderRepository::new(self.pool)
            .list_for_restaurant(restaurant_id)
            .await?)
    }

    /// Get one order. Visible to its customer, the restaurant owner, and
    /// admins.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids and `Forbidden` for anyone else's
    /// order.
    pub async fn get(&self, user: &CurrentUser, id: OrderId) -> Result<Order> {
        let order = OrderRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        if order.user_id == user.id {
            return Ok(order);
        }
        let owner = self.restaurant_owner(order.restaurant_id).await?;
        if may_manage_restaurant_orders(user, owner) {
            return Ok(order);
        }
        Err(AppError::Forbidden("Forbidden".to_owned()))
    }

    /// Advance an order's delivery status.
    ///
    /// Only the owner of the order's restaurant or an admin may do this.
    /// The change must be legal per the transition table and is applied as
    /// a compare-and-swap against the status that was read.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for unauthorized callers, `InvalidTransition`
    /// for illegal moves, and `Conflict` when a concurrent update won.
    #[instrument(skip(self), fields(user = %user.id, order = %id, to = %new_status))]
    pub async fn update_status(
        &self,
        user: &CurrentUser,
        id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order> {
        let orders = OrderRepository::new(self.pool);
        let order = orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        let owner = self.restaurant_owner(order.restaurant_id).await?;
        if !may_manage_restaurant_orders(user, owner) {
            return Err(AppError::Forbidden("Forbidden".to_owned()));
        }

        order.status.transition(new_status)?;

        orders
            .update_status(id, order.status, new_status)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Order was updated concurrently; retry".to_owned())
            })
    }

    /// Cancel an order. Only the owning customer may cancel, and only
    /// before the order reaches a terminal state.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when the caller does not own the order and
    /// `InvalidTransition` when the order is already delivered or
    /// cancelled.
    #[instrument(skip(self), fields(user = %user.id, order = %id))]
    pub async fn cancel(&self, user: &CurrentUser, id: OrderId) -> Result<Order> {
        let orders = OrderRepository::new(self.pool);
        let order = orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        if !may_cancel(user, order.user_id) {
            return Err(AppError::Forbidden("Forbidden".to_owned()));
        }

        order.status.transition(OrderStatus::Cancelled)?;

        orders
            .update_status(id, order.status, OrderStatus::Cancelled)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Order was updated concurrently; retry".to_owned())
            })
    }

    /// Record the outcome of the mock payment flow. Owning customer only.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when the caller does not own the order and
    /// `Conflict` when the payment has already been settled.
    #[instrument(skip(self), fields(user = %user.id, order = %id))]
    pub async fn confirm_payment(
        &self,
        user: &CurrentUser,
        id: OrderId,
        outcome: PaymentStatus,
    ) -> Result<Order> {
        if outcome == PaymentStatus::Pending {
            return Err(AppError::Validation(
                "Payment outcome must be completed or failed".to_owned(),
            ));
        }

        let orders = OrderRepository::new(self.pool);
        let order = orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        if !may_cancel(user, order.user_id) {
            return Err(AppError::Forbidden("Forbidden".to_owned()));
        }

        // The settle is conditioned on the payment still being pending, so a
        // racing confirmation loses with a Conflict instead of overwriting.
        orders
            .settle_payment(id, outcome)
            .await?
            .ok_or_else(|| AppError::Conflict("Payment has already been settled".to_owned()))
    }

    /// Rebuild the cart server-side from the stored menu.
    async fn build_cart(
        &self,
        restaurants: &RestaurantRepository<'_>,
        input: &CheckoutInput,
    ) -> Result<Cart> {
        let ids: Vec<MenuItemId> = input.items.iter().map(|l| l.menu_item_id).collect();
        let menu_items = restaurants
            .menu_items_by_ids(input.restaurant_id, &ids)
            .await?;

        let mut cart: Option<Cart> = None;
        for line in &input.items {
            if line.quantity == 0 {
                return Err(AppError::Validation(
                    "Line quantity must be at least 1".to_owned(),
                ));
            }
            let item = menu_items
                .iter()
                .find(|m| m.id == line.menu_item_id)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "Menu item {} does not belong to this restaurant",
                        line.menu_item_id
                    ))
                })?;
            if !item.available {
                return Err(AppError::Validation(format!(
                    "{} is currently unavailable",
                    item.name
                )));
            }
            cart = Some(Cart::add_item(
                cart,
                input.restaurant_id,
                CartLine {
                    menu_item_id: item.id,
                    name: item.name.clone(),
                    price: item.price,
                    quantity: line.quantity,
                    image: item.image_url.clone(),
                },
            ));
        }

        cart.ok_or_else(|| AppError::Validation("Cart is empty".to_owned()))
    }

    async fn restaurant_owner(&self, restaurant_id: RestaurantId) -> Result<Option<UserId>> {
        let restaurant = RestaurantRepository::new(self.pool).get(restaurant_id).await?;
        Ok(restaurant.map(|r| r.owner_id))
    }

    async fn ensure_restaurant_access(
        &self,
        user: &CurrentUser,
        restaurant_id: RestaurantId,
    ) -> Result<()> {
        let owner = self.restaurant_owner(restaurant_id).await?;
        if may_manage_restaurant_orders(user, owner) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Forbidden".to_owned()))
        }
    }
}

/// Whether `caller` may cancel or settle an order placed by `placed_by`.
///
/// Strictly the owning customer. Admins manage delivery status, not the
/// customer's own order.
fn may_cancel(caller: &CurrentUser, placed_by: UserId) -> bool {
    caller.id == placed_by
}

/// Whether `caller` may act on a restaurant's orders (status updates,
/// incoming-order listing).
///
/// Admins always may; a restaurant account may only for the restaurant it
/// owns. `owner` is `None` when the restaurant does not exist.
fn may_manage_restaurant_orders(caller: &CurrentUser, owner: Option<UserId>) -> bool {
    if caller.is_admin() {
        return true;
    }
    caller.role == UserRole::Restaurant && owner == Some(caller.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: i32, role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: format!("user{id}@example.com"),
            name: format!("User {id}"),
            role,
        }
    }

    #[test]
    fn only_the_owning_customer_may_cancel() {
        let placed_by = UserId::new(1);

        assert!(may_cancel(&caller(1, UserRole::Customer), placed_by));
        assert!(!may_cancel(&caller(2, UserRole::Customer), placed_by));
    }

    #[test]
    fn admins_cannot_cancel_on_a_customers_behalf() {
        let placed_by = UserId::new(1);

        assert!(!may_cancel(&caller(99, UserRole::Admin), placed_by));
    }

    #[test]
    fn restaurant_owner_and_admin_may_manage_orders() {
        let owner = Some(UserId::new(5));

        assert!(may_manage_restaurant_orders(&caller(5, UserRole::Restaurant), owner));
        assert!(may_manage_restaurant_orders(&caller(99, UserRole::Admin), owner));
    }

    #[test]
    fn other_callers_may_not_manage_orders() {
        let owner = Some(UserId::new(5));

        // A different restaurant account, a customer, and even a customer
        // whose id happens to match the owner's are all refused.
        assert!(!may_manage_restaurant_orders(&caller(6, UserRole::Restaurant), owner));
        assert!(!may_manage_restaurant_orders(&caller(2, UserRole::Customer), owner));
        assert!(!may_manage_restaurant_orders(&caller(5, UserRole::Customer), owner));
    }

    #[test]
    fn missing_restaurant_leaves_only_admins() {
        assert!(may_manage_restaurant_orders(&caller(99, UserRole::Admin), None));
        assert!(!may_manage_restaurant_orders(&caller(5, UserRole::Restaurant), None));
    }
}
