//! Mock payment intents.
//!
//! Card and PayPal checkouts hand the client a payment intent to confirm.
//! There is no real payment processor behind this; the intent is generated
//! locally with the same shape a Stripe-style integration would return, so
//! the checkout flow and its consumers are exercised end to end.

use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use tavola_core::OrderId;

/// A client-confirmable payment intent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Intent identifier (`pi_` prefixed).
    pub id: String,
    /// Secret the client uses to confirm the intent.
    pub client_secret: String,
    /// Amount to charge.
    pub amount: Decimal,
    /// Order this intent pays for.
    pub order_id: OrderId,
    /// Intent lifecycle status; always starts here.
    pub status: &'static str,
}

/// Create a payment intent for an order total.
#[must_use]
pub fn create_payment_intent(amount: Decimal, order_id: OrderId) -> PaymentIntent {
    let id = format!("pi_{}", Uuid::new_v4().simple());
    let nonce: u64 = rand::rng().random();
    PaymentIntent {
        client_secret: format!("{id}_secret_{nonce:016x}"),
        id,
        amount,
        order_id,
        status: "requires_payment_method",
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn intents_are_unique_and_well_formed() {
        let a = create_payment_intent(dec!(33.76), OrderId::new(1));
        let b = create_payment_intent(dec!(33.76), OrderId::new(1));

        assert!(a.id.starts_with("pi_"));
        assert!(a.client_secret.starts_with(&a.id));
        assert_eq!(a.status, "requires_payment_method");
        assert_ne!(a.id, b.id);
    }
}
