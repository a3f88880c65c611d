//! Order repository.
//!
//! Orders are snapshots: the row and its items are written once, in one
//! transaction, and only the status columns change afterwards. Status
//! changes are compare-and-swap - the UPDATE names the status the caller
//! read, so a concurrent writer makes the statement match zero rows instead
//! of silently overwriting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use tavola_core::{
    MenuItemId, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, PromotionId,
    RestaurantId, UserId, round2,
};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem};
use crate::models::promotion::Promotion;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    restaurant_id: RestaurantId,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    subtotal: Decimal,
    tax: Decimal,
    delivery_fee: Decimal,
    discount: Decimal,
    total: Decimal,
    promotion_id: Option<PromotionId>,
    delivery_address: String,
    phone: String,
    special_instructions: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            restaurant_id: self.restaurant_id,
            status: self.status,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            subtotal: self.subtotal,
            tax: self.tax,
            delivery_fee: self.delivery_fee,
            discount: self.discount,
            total: self.total,
            promotion_id: self.promotion_id,
            delivery_address: self.delivery_address,
            phone: self.phone,
            special_instructions: self.special_instructions,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    menu_item_id: MenuItemId,
    name: String,
    price: Decimal,
    quantity: i32,
    image_url: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        Self {
            id: r.id,
            order_id: r.order_id,
            menu_item_id: r.menu_item_id,
            name: r.name,
            price: r.price,
            quantity: r.quantity,
            image_url: r.image_url,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, restaurant_id, status, payment_method, \
     payment_status, subtotal, tax, delivery_fee, discount, total, promotion_id, \
     delivery_address, phone, special_instructions, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, menu_item_id, name, price, quantity, image_url";

/// Everything needed to persist a new order in one transaction.
///
/// Carries the pre-discount total; the discount itself is priced during
/// [`OrderRepository::create`] from the promotion row the redemption
/// returns, so the stored amount cannot drift from the terms that were
/// consumed.
#[derive(Debug)]
pub struct NewOrder {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total_before_discount: Decimal,
    pub promotion_code: Option<String>,
    pub delivery_address: String,
    pub phone: String,
    pub special_instructions: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Snapshot of one cart line at checkout.
#[derive(Debug)]
pub struct NewOrderItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an order with its items, redeeming the promotion code (if
    /// any) in the same transaction.
    ///
    /// Either everything lands or nothing does: a failed item insert or an
    /// unredeemable code rolls the whole checkout back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the promotion code exists
    /// but is no longer redeemable, `NotFound` when it does not exist, and
    /// `Database` for query failures.
    #[instrument(skip(self, new_order), fields(user = %new_order.user_id, restaurant = %new_order.restaurant_id))]
    pub async fn create(&self, new_order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let redeemed = match &new_order.promotion_code {
            None => None,
            Some(code) => {
                match super::promotions::redeem_by_code(&mut *tx, code).await? {
                    Some(promotion) => Some(promotion),
                    None => {
                        // Distinguish unknown codes from exhausted/expired ones
                        // for the error message; the transaction rolls back
                        // either way.
                        let exists: (bool,) = sqlx::query_as(
                            "SELECT EXISTS(SELECT 1 FROM promotions WHERE code = UPPER($1))",
                        )
                        .bind(code)
                        .fetch_one(&mut *tx)
                        .await?;
                        return Err(if exists.0 {
                            RepositoryError::Conflict(
                                "promotion code is no longer redeemable".to_owned(),
                            )
                        } else {
                            RepositoryError::NotFound
                        });
                    }
                }
            }
        };
        let promotion_id = redeemed.as_ref().map(|p| p.id);
        let (discount, total) =
            settle_totals(redeemed.as_ref(), new_order.total_before_discount);

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders
                 (user_id, restaurant_id, status, payment_method, payment_status,
                  subtotal, tax, delivery_fee, discount, total, promotion_id,
                  delivery_address, phone, special_instructions)
             VALUES ($1, $2, 'pending', $3, 'pending', $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_order.user_id)
        .bind(new_order.restaurant_id)
        .bind(new_order.payment_method)
        .bind(new_order.subtotal)
        .bind(new_order.tax)
        .bind(new_order.delivery_fee)
        .bind(discount)
        .bind(total)
        .bind(promotion_id)
        .bind(&new_order.delivery_address)
        .bind(&new_order.phone)
        .bind(&new_order.special_instructions)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new_order.items.len());
        for item in &new_order.items {
            let item_row = sqlx::query_as::<_, OrderItemRow>(&format!(
                "INSERT INTO order_items
                     (order_id, menu_item_id, name, price, quantity, image_url)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {ORDER_ITEM_COLUMNS}"
            ))
            .bind(order_row.id)
            .bind(item.menu_item_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .bind(&item.image_url)
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::from(item_row));
        }

        tx.commit().await?;

        debug!(order = %order_row.id, "Created order");
        Ok(order_row.into_order(items))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let items = self.items_for(id).await?;
        Ok(Some(row.into_order(items)))
    }

    /// List a customer's orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders
                     WHERE user_id = $1 AND status = $2
                     ORDER BY created_at DESC"
                ))
                .bind(user_id)
                .bind(status)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders
                     WHERE user_id = $1
                     ORDER BY created_at DESC"
                ))
                .bind(user_id)
                .fetch_all(self.pool)
                .await?
            }
        };

        self.attach_items(rows).await
    }

    /// List a restaurant's incoming orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE restaurant_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(restaurant_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Compare-and-swap the order status.
    ///
    /// Succeeds only when the row still holds `expected`; returns `None`
    /// when it does not (a concurrent writer got there first, or the order
    /// vanished). Transition legality is the service layer's job - this
    /// method only guarantees atomicity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self), fields(order = %id))]
    pub async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&status_cas_sql())
            .bind(id)
            .bind(expected)
            .bind(to)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        let items = self.items_for(id).await?;
        Ok(Some(row.into_order(items)))
    }

    /// Settle a pending payment (called by the payment stub on
    /// confirmation).
    ///
    /// The UPDATE only matches while the payment is still pending; `None`
    /// means another confirmation settled it first (or the order is gone).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self), fields(order = %id))]
    pub async fn settle_payment(
        &self,
        id: OrderId,
        outcome: PaymentStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&payment_settle_sql())
            .bind(id)
            .bind(outcome)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        let items = self.items_for(id).await?;
        Ok(Some(row.into_order(items)))
    }

    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            orders.push(row.into_order(items));
        }
        Ok(orders)
    }
}

/// The compare-and-swap statement behind [`OrderRepository::update_status`].
fn status_cas_sql() -> String {
    format!(
        "UPDATE orders
         SET status = $3, updated_at = NOW()
         WHERE id = $1 AND status = $2
         RETURNING {ORDER_COLUMNS}"
    )
}

/// The guarded settle behind [`OrderRepository::settle_payment`].
fn payment_settle_sql() -> String {
    format!(
        "UPDATE orders
         SET payment_status = $2, updated_at = NOW()
         WHERE id = $1 AND payment_status = 'pending'
         RETURNING {ORDER_COLUMNS}"
    )
}

/// Price the discount off the promotion row the redemption returned and
/// derive the charged total.
fn settle_totals(redeemed: Option<&Promotion>, total_before_discount: Decimal) -> (Decimal, Decimal) {
    let discount = redeemed.map_or(Decimal::ZERO, |p| {
        p.terms().discount_for(total_before_discount)
    });
    (discount, round2(total_before_discount - discount))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    use tavola_core::PromotionKind;

    use super::*;

    #[test]
    fn status_update_is_conditioned_on_the_status_that_was_read() {
        // The WHERE clause must name both the id and the expected status;
        // dropping the status predicate would turn the update into a blind
        // overwrite.
        let sql = status_cas_sql();
        assert!(sql.contains("WHERE id = $1 AND status = $2"));
        assert!(sql.contains("SET status = $3"));
    }

    #[test]
    fn payment_settle_only_matches_while_pending() {
        // Two racing confirmations both pass the service's read; the second
        // UPDATE must match zero rows, not overwrite the first outcome.
        let sql = payment_settle_sql();
        assert!(sql.contains("WHERE id = $1 AND payment_status = 'pending'"));
        assert!(sql.contains("SET payment_status = $2"));
    }

    fn redeemed_promotion(kind: PromotionKind, value: Decimal) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: PromotionId::new(1),
            restaurant_id: RestaurantId::new(1),
            code: "WELCOME10".to_owned(),
            description: "Welcome discount".to_owned(),
            kind,
            value,
            usage_limit: 100,
            usage_count: 3,
            expiry_date: now + Duration::days(30),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn discount_is_priced_off_the_redeemed_row() {
        let promotion = redeemed_promotion(PromotionKind::Percentage, dec!(10));

        let (discount, total) = settle_totals(Some(&promotion), dec!(33.76));
        assert_eq!(discount, dec!(3.38));
        assert_eq!(total, dec!(30.38));
    }

    #[test]
    fn no_promotion_means_no_discount() {
        let (discount, total) = settle_totals(None, dec!(33.76));
        assert_eq!(discount, Decimal::ZERO);
        assert_eq!(total, dec!(33.76));
    }
}
