//! Integration tests for promotion terms against checkout totals.
//!
//! These combine cart pricing with promotion validation, mimicking the
//! checkout flow: price the cart, validate the code against the total,
//! apply the discount.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tavola_core::{
    Cart, CartLine, MenuItemId, PricingPolicy, PromotionKind, PromotionTerms, RestaurantId, round2,
};

fn pizza_cart() -> Cart {
    // The 33.76 reference order: 2 x 10.99 + 5.99, 10% tax, 2.99 delivery.
    Cart::from_lines(
        RestaurantId::new(1),
        vec![
            CartLine {
                menu_item_id: MenuItemId::new(1),
                name: "Margherita".to_owned(),
                price: dec!(10.99),
                quantity: 2,
                image: None,
            },
            CartLine {
                menu_item_id: MenuItemId::new(2),
                name: "Garlic Bread".to_owned(),
                price: dec!(5.99),
                quantity: 1,
                image: None,
            },
        ],
    )
    .expect("non-empty")
}

fn active(kind: PromotionKind, value: Decimal) -> PromotionTerms {
    PromotionTerms {
        kind,
        value,
        usage_limit: 100,
        usage_count: 0,
        expiry_date: Utc::now() + Duration::days(30),
    }
}

// =============================================================================
// Checkout With a Code
// =============================================================================

#[test]
fn test_percentage_code_applied_at_checkout() {
    let totals = pizza_cart().totals(&PricingPolicy::default());
    assert_eq!(totals.total, dec!(33.76));

    let welcome10 = active(PromotionKind::Percentage, dec!(10));
    let verdict = welcome10.validate(totals.total, Utc::now());
    assert!(verdict.is_valid);
    assert_eq!(verdict.discount, dec!(3.38)); // round2(3.376)

    let charged = round2(totals.total - verdict.discount);
    assert_eq!(charged, dec!(30.38));
}

#[test]
fn test_fixed_code_applied_at_checkout() {
    let totals = pizza_cart().totals(&PricingPolicy::default());

    let save5 = active(PromotionKind::Fixed, dec!(5));
    let verdict = save5.validate(totals.total, Utc::now());
    assert!(verdict.is_valid);
    assert_eq!(verdict.discount, dec!(5));
    assert_eq!(round2(totals.total - verdict.discount), dec!(28.76));
}

#[test]
fn test_oversized_fixed_code_zeroes_but_never_negates() {
    let totals = pizza_cart().totals(&PricingPolicy::default());

    let save100 = active(PromotionKind::Fixed, dec!(100));
    let discount = save100.discount_for(totals.total);
    assert_eq!(discount, totals.total);
    assert_eq!(totals.total - discount, Decimal::ZERO);
}

// =============================================================================
// Rejection Paths
// =============================================================================

#[test]
fn test_expired_code_rejected_at_checkout() {
    let totals = pizza_cart().totals(&PricingPolicy::default());

    let mut stale = active(PromotionKind::Percentage, dec!(10));
    stale.expiry_date = Utc::now() - Duration::days(1);

    let verdict = stale.validate(totals.total, Utc::now());
    assert!(!verdict.is_valid);
    assert_eq!(verdict.discount, Decimal::ZERO);
}

#[test]
fn test_last_use_is_the_last_use() {
    let mut nearly_spent = active(PromotionKind::Fixed, dec!(5));
    nearly_spent.usage_limit = 3;
    nearly_spent.usage_count = 2;
    assert!(nearly_spent.is_active(Utc::now()));

    // The redemption the storage layer would perform.
    nearly_spent.usage_count += 1;
    assert!(!nearly_spent.is_active(Utc::now()));
    assert!(!nearly_spent.validate(dec!(20), Utc::now()).is_valid);
}

#[test]
fn test_expiry_boundary_is_exclusive() {
    let now = Utc::now();
    let mut p = active(PromotionKind::Fixed, dec!(5));
    p.expiry_date = now;

    // A code expiring exactly now is already expired.
    assert!(!p.is_active(now));
    assert!(p.is_active(now - Duration::seconds(1)));
}
