//! Single-restaurant cart aggregate and pricing policy.
//!
//! A cart holds line items for exactly one restaurant. It is ephemeral: the
//! client keeps it until checkout, the server rebuilds one from the submitted
//! lines (with trusted menu prices) to compute what the order actually costs.
//! An empty cart does not exist - callers hold `Option<Cart>` and a mutation
//! that removes the last line yields `None`.
//!
//! Pricing is recomputed from the lines on every call; derived totals are
//! never stored independently of the items that produced them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::money::round2;
use crate::types::{MenuItemId, RestaurantId};

/// One line in a cart: a menu item snapshot plus a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Menu item this line refers to.
    pub menu_item_id: MenuItemId,
    /// Item name at the time it was added.
    pub name: String,
    /// Unit price at the time it was added.
    pub price: Decimal,
    /// Number of units. Always >= 1; setting it to 0 removes the line.
    pub quantity: u32,
    /// Optional image URL for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLine {
    /// Price of the whole line (`price * quantity`), unrounded.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Derived cart totals. Satisfies `total == round2(subtotal + tax + delivery_fee)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Totals of the empty cart: all zero, no delivery fee.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

/// Tax rate and delivery fee used to derive totals from cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPolicy {
    /// Fraction of the subtotal charged as tax (0.10 = 10%).
    pub tax_rate: Decimal,
    /// Flat delivery fee added to every order.
    pub delivery_fee: Decimal,
}

impl Default for PricingPolicy {
    /// Platform defaults: 10% tax, 2.99 delivery fee.
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            delivery_fee: Decimal::new(299, 2),
        }
    }
}

impl PricingPolicy {
    /// Compute totals for a set of lines.
    ///
    /// Tax is rounded to cents before it is added into the total, so the
    /// invariant `total == round2(subtotal + tax + delivery_fee)` holds for
    /// the *rounded* tax value a caller sees, not a hidden unrounded one.
    #[must_use]
    pub fn compute_totals(&self, lines: &[CartLine]) -> CartTotals {
        if lines.is_empty() {
            return CartTotals::zero();
        }

        let subtotal = round2(lines.iter().map(CartLine::line_total).sum());
        let tax = round2(subtotal * self.tax_rate);
        let delivery_fee = self.delivery_fee;
        let total = round2(subtotal + tax + delivery_fee);

        CartTotals {
            subtotal,
            tax,
            delivery_fee,
            total,
        }
    }
}

/// A cart: ordered lines for exactly one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    restaurant_id: RestaurantId,
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create a cart containing a single line.
    #[must_use]
    pub fn new(restaurant_id: RestaurantId, line: CartLine) -> Self {
        Self {
            restaurant_id,
            lines: vec![line],
        }
    }

    /// Build a cart from pre-validated lines.
    ///
    /// Returns `None` when `lines` is empty; an empty cart is represented as
    /// absence, never as a zero-line `Cart`.
    #[must_use]
    pub fn from_lines(restaurant_id: RestaurantId, lines: Vec<CartLine>) -> Option<Self> {
        if lines.is_empty() {
            None
        } else {
            Some(Self {
                restaurant_id,
                lines,
            })
        }
    }

    /// The restaurant every line belongs to.
    #[must_use]
    pub const fn restaurant_id(&self) -> RestaurantId {
        self.restaurant_id
    }

    /// The lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Add a line to a possibly-absent cart, returning the new cart.
    ///
    /// Policy (kept from the source product): adding an item from a
    /// different restaurant silently replaces the whole cart with a
    /// single-line cart. Within the same restaurant, an existing line for
    /// the same menu item has the quantities summed; otherwise the line is
    /// appended.
    #[must_use]
    pub fn add_item(cart: Option<Self>, restaurant_id: RestaurantId, line: CartLine) -> Self {
        let Some(mut cart) = cart else {
            return Self::new(restaurant_id, line);
        };

        if cart.restaurant_id != restaurant_id {
            return Self::new(restaurant_id, line);
        }

        match cart
            .lines
            .iter_mut()
            .find(|l| l.menu_item_id == line.menu_item_id)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => cart.lines.push(line),
        }
        cart
    }

    /// Remove the line for `menu_item_id`, dropping the cart if it was the
    /// last one. Removing an id that is not in the cart is a no-op.
    #[must_use]
    pub fn remove_item(mut self, menu_item_id: MenuItemId) -> Option<Self> {
        self.lines.retain(|l| l.menu_item_id != menu_item_id);
        if self.lines.is_empty() { None } else { Some(self) }
    }

    /// Set the quantity of the line for `menu_item_id`.
    ///
    /// A quantity of 0 behaves exactly like [`Cart::remove_item`]. Updating
    /// an id that is not in the cart is a no-op.
    #[must_use]
    pub fn update_quantity(mut self, menu_item_id: MenuItemId, quantity: u32) -> Option<Self> {
        if quantity == 0 {
            return self.remove_item(menu_item_id);
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.menu_item_id == menu_item_id) {
            line.quantity = quantity;
        }
        Some(self)
    }

    /// Derived totals under `policy`. Pure; calling it never mutates the cart.
    #[must_use]
    pub fn totals(&self, policy: &PricingPolicy) -> CartTotals {
        policy.compute_totals(&self.lines)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn line(id: i32, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            menu_item_id: MenuItemId::new(id),
            name: format!("item-{id}"),
            price,
            quantity,
            image: None,
        }
    }

    fn cart_with(lines: Vec<CartLine>) -> Cart {
        Cart::from_lines(RestaurantId::new(1), lines).expect("non-empty")
    }

    #[test]
    fn menu_scenario_totals() {
        // Two margherita at 10.99 plus one garlic bread at 5.99.
        let cart = cart_with(vec![line(1, dec!(10.99), 2), line(2, dec!(5.99), 1)]);
        let totals = cart.totals(&PricingPolicy::default());

        assert_eq!(totals.subtotal, dec!(27.97));
        assert_eq!(totals.tax, dec!(2.80)); // round2(2.797)
        assert_eq!(totals.delivery_fee, dec!(2.99));
        assert_eq!(totals.total, dec!(33.76));
    }

    #[test]
    fn totals_are_idempotent() {
        let cart = cart_with(vec![line(1, dec!(10.99), 2), line(2, dec!(5.99), 1)]);
        let policy = PricingPolicy::default();
        assert_eq!(cart.totals(&policy), cart.totals(&policy));
    }

    #[test]
    fn total_invariant_holds() {
        let policy = PricingPolicy::default();
        let awkward_prices = [dec!(0.01), dec!(1.33), dec!(7.77), dec!(10.99), dec!(19.95)];
        for (i, price) in awkward_prices.into_iter().enumerate() {
            let cart = cart_with(vec![line(i32::try_from(i).unwrap(), price, 3)]);
            let t = cart.totals(&policy);
            assert_eq!(t.total, round2(t.subtotal + t.tax + t.delivery_fee));
        }
    }

    #[test]
    fn adding_same_item_merges_quantities() {
        let r = RestaurantId::new(1);
        let cart = Cart::add_item(None, r, line(1, dec!(10.99), 1));
        let cart = Cart::add_item(Some(cart), r, line(1, dec!(10.99), 2));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn adding_from_other_restaurant_replaces_cart() {
        let cart = Cart::add_item(None, RestaurantId::new(1), line(1, dec!(10.99), 2));
        let cart = Cart::add_item(
            Some(cart),
            RestaurantId::new(2),
            line(9, dec!(4.50), 1),
        );
        assert_eq!(cart.restaurant_id(), RestaurantId::new(2));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].menu_item_id, MenuItemId::new(9));
    }

    #[test]
    fn quantity_zero_removes_line() {
        let cart = cart_with(vec![line(1, dec!(10.99), 2), line(2, dec!(5.99), 1)]);
        let cart = cart.update_quantity(MenuItemId::new(2), 0).expect("one line left");
        assert_eq!(cart.lines().len(), 1);

        // Removing the last line removes the cart itself.
        assert!(cart.update_quantity(MenuItemId::new(1), 0).is_none());
    }

    #[test]
    fn removing_last_line_yields_absent_cart() {
        let cart = cart_with(vec![line(1, dec!(10.99), 1)]);
        assert!(cart.remove_item(MenuItemId::new(1)).is_none());
    }

    #[test]
    fn removing_unknown_item_is_noop() {
        let cart = cart_with(vec![line(1, dec!(10.99), 1)]);
        let cart = cart.remove_item(MenuItemId::new(99)).expect("unchanged");
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn empty_lines_produce_zero_totals() {
        assert_eq!(
            PricingPolicy::default().compute_totals(&[]),
            CartTotals::zero()
        );
    }
}
