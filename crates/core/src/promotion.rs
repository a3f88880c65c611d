//! Promotion (discount code) rules.
//!
//! A promotion reduces an order total at validation time. Whether a code is
//! redeemable is derived, never stored: under its usage limit and not past
//! its expiry. The actual usage-count increment is an atomic guarded update
//! at the storage layer (see the server's promotion repository); this module
//! only answers "is it active" and "how much does it take off".

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::money::round2;

/// How a promotion's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "promotion_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// `value` is a percentage of the order total (20 = 20% off).
    Percentage,
    /// `value` is a flat amount off.
    Fixed,
}

impl std::fmt::Display for PromotionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percentage => write!(f, "percentage"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

/// The redeemability terms of a promotion, independent of which restaurant
/// owns it or how it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionTerms {
    pub kind: PromotionKind,
    /// Percentage (0-100) or flat amount, depending on `kind`.
    pub value: Decimal,
    pub usage_limit: i32,
    pub usage_count: i32,
    pub expiry_date: DateTime<Utc>,
}

impl PromotionTerms {
    /// Whether the promotion can still be redeemed at `now`.
    ///
    /// Derived, per the product rules: under the usage limit and strictly
    /// before expiry.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.usage_count < self.usage_limit && now < self.expiry_date
    }

    /// The discount this promotion takes off `order_total`.
    ///
    /// Percentage discounts are rounded to cents. The result is clamped to
    /// the order total: a promotion can zero an order but never push it
    /// negative.
    #[must_use]
    pub fn discount_for(&self, order_total: Decimal) -> Decimal {
        let raw = match self.kind {
            PromotionKind::Percentage => {
                round2(order_total * self.value / Decimal::ONE_HUNDRED)
            }
            PromotionKind::Fixed => self.value,
        };
        raw.min(order_total).max(Decimal::ZERO)
    }

    /// Validate this promotion against an order total at `now`.
    #[must_use]
    pub fn validate(&self, order_total: Decimal, now: DateTime<Utc>) -> PromotionVerdict {
        if self.usage_count >= self.usage_limit {
            return PromotionVerdict::rejected("Promotion code has reached its usage limit");
        }
        if now >= self.expiry_date {
            return PromotionVerdict::rejected("Promotion code has expired");
        }
        PromotionVerdict {
            is_valid: true,
            discount: self.discount_for(order_total),
            message: "Promotion applied".to_owned(),
        }
    }
}

/// Outcome of validating a code against an order total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionVerdict {
    pub is_valid: bool,
    pub discount: Decimal,
    pub message: String,
}

impl PromotionVerdict {
    /// A rejection with a zero discount and the given reason.
    #[must_use]
    pub fn rejected(message: &str) -> Self {
        Self {
            is_valid: false,
            discount: Decimal::ZERO,
            message: message.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    fn terms(kind: PromotionKind, value: Decimal) -> PromotionTerms {
        PromotionTerms {
            kind,
            value,
            usage_limit: 100,
            usage_count: 0,
            expiry_date: Utc::now() + Duration::days(7),
        }
    }

    #[test]
    fn percentage_discount_is_rounded_to_cents() {
        let p = terms(PromotionKind::Percentage, dec!(15));
        assert_eq!(p.discount_for(dec!(33.76)), dec!(5.06)); // round2(5.064)
    }

    #[test]
    fn fixed_discount_is_clamped_to_order_total() {
        let p = terms(PromotionKind::Fixed, dec!(50));
        assert_eq!(p.discount_for(dec!(33.76)), dec!(33.76));
        assert_eq!(p.discount_for(dec!(60)), dec!(50));
    }

    #[test]
    fn expired_code_never_validates() {
        let mut p = terms(PromotionKind::Percentage, dec!(10));
        p.expiry_date = Utc::now() - Duration::hours(1);
        // Still under the usage limit, but expiry wins.
        assert!(p.usage_count < p.usage_limit);
        assert!(!p.is_active(Utc::now()));

        let verdict = p.validate(dec!(20), Utc::now());
        assert!(!verdict.is_valid);
        assert_eq!(verdict.discount, Decimal::ZERO);
        assert!(verdict.message.contains("expired"));
    }

    #[test]
    fn exhausted_code_never_validates() {
        let mut p = terms(PromotionKind::Fixed, dec!(5));
        p.usage_count = p.usage_limit;
        assert!(!p.is_active(Utc::now()));

        let verdict = p.validate(dec!(20), Utc::now());
        assert!(!verdict.is_valid);
        assert!(verdict.message.contains("usage limit"));
    }

    #[test]
    fn active_code_validates_with_discount() {
        let p = terms(PromotionKind::Percentage, dec!(20));
        let verdict = p.validate(dec!(40), Utc::now());
        assert!(verdict.is_valid);
        assert_eq!(verdict.discount, dec!(8.00));
    }
}
