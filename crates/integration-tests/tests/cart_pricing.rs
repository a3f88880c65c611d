//! Integration tests for cart aggregation and pricing.
//!
//! These walk a cart through the same sequence of mutations the checkout
//! flow performs and verify the derived totals at each step.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tavola_core::{Cart, CartLine, CartTotals, MenuItemId, PricingPolicy, RestaurantId, round2};

fn line(id: i32, name: &str, price: Decimal, quantity: u32) -> CartLine {
    CartLine {
        menu_item_id: MenuItemId::new(id),
        name: name.to_owned(),
        price,
        quantity,
        image: None,
    }
}

// =============================================================================
// Full Checkout Scenario
// =============================================================================

#[test]
fn test_build_cart_and_price_it() {
    let pizza_palace = RestaurantId::new(1);

    // Customer adds two margherita, then garlic bread, then one more
    // margherita through the "add again" path.
    let cart = Cart::add_item(None, pizza_palace, line(1, "Margherita", dec!(10.99), 2));
    let cart = Cart::add_item(
        Some(cart),
        pizza_palace,
        line(2, "Garlic Bread", dec!(5.99), 1),
    );
    let cart = Cart::add_item(Some(cart), pizza_palace, line(1, "Margherita", dec!(10.99), 1));

    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.item_count(), 4);

    // Changed their mind: back down to two margherita.
    let cart = cart
        .update_quantity(MenuItemId::new(1), 2)
        .expect("cart still has lines");

    let totals = cart.totals(&PricingPolicy::default());
    assert_eq!(totals.subtotal, dec!(27.97));
    assert_eq!(totals.tax, dec!(2.80));
    assert_eq!(totals.delivery_fee, dec!(2.99));
    assert_eq!(totals.total, dec!(33.76));
}

#[test]
fn test_switching_restaurant_starts_over() {
    let cart = Cart::add_item(None, RestaurantId::new(1), line(1, "Margherita", dec!(10.99), 2));
    let cart = Cart::add_item(
        Some(cart),
        RestaurantId::new(2),
        line(9, "California Roll", dec!(8.25), 1),
    );

    assert_eq!(cart.restaurant_id(), RestaurantId::new(2));
    assert_eq!(cart.lines().len(), 1);

    let totals = cart.totals(&PricingPolicy::default());
    assert_eq!(totals.subtotal, dec!(8.25));
}

#[test]
fn test_emptying_the_cart_drops_it() {
    let cart = Cart::add_item(None, RestaurantId::new(1), line(1, "Margherita", dec!(10.99), 1));
    let cart = Cart::add_item(Some(cart), RestaurantId::new(1), line(2, "Coke", dec!(2.50), 1));

    let cart = cart.remove_item(MenuItemId::new(1)).expect("one line left");
    assert!(cart.remove_item(MenuItemId::new(2)).is_none());
}

// =============================================================================
// Pricing Invariants
// =============================================================================

#[test]
fn test_total_equals_rounded_component_sum() {
    let policy = PricingPolicy::default();
    let carts = [
        vec![line(1, "a", dec!(0.01), 1)],
        vec![line(1, "a", dec!(3.33), 3), line(2, "b", dec!(0.45), 7)],
        vec![line(1, "a", dec!(19.95), 2), line(2, "b", dec!(10.99), 1)],
    ];

    for lines in carts {
        let cart = Cart::from_lines(RestaurantId::new(1), lines).expect("non-empty");
        let t = cart.totals(&policy);
        assert_eq!(t.total, round2(t.subtotal + t.tax + t.delivery_fee));
    }
}

#[test]
fn test_no_lines_means_no_charges() {
    // No delivery fee materializes out of an empty cart.
    assert_eq!(PricingPolicy::default().compute_totals(&[]), CartTotals::zero());
}

#[test]
fn test_totals_do_not_mutate_the_cart() {
    let cart = Cart::add_item(None, RestaurantId::new(1), line(1, "Margherita", dec!(10.99), 2));
    let before = cart.clone();
    let _ = cart.totals(&PricingPolicy::default());
    let _ = cart.totals(&PricingPolicy::default());
    assert_eq!(cart, before);
}
