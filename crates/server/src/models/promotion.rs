//! Promotion domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tavola_core::{PromotionId, PromotionKind, PromotionTerms, RestaurantId};

/// A persisted promotion owned by a restaurant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: PromotionId,
    pub restaurant_id: RestaurantId,
    /// Uppercase redemption code, globally unique.
    pub code: String,
    pub description: String,
    pub kind: PromotionKind,
    pub value: Decimal,
    pub usage_limit: i32,
    pub usage_count: i32,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// The pure redeemability terms, for validation in `tavola_core`.
    #[must_use]
    pub fn terms(&self) -> PromotionTerms {
        PromotionTerms {
            kind: self.kind,
            value: self.value,
            usage_limit: self.usage_limit,
            usage_count: self.usage_count,
            expiry_date: self.expiry_date,
        }
    }
}
