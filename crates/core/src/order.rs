//! Order status lifecycle.
//!
//! An order moves forward through the kitchen pipeline one step at a time:
//!
//! ```text
//! pending -> confirmed -> preparing -> ready -> out_for_delivery -> delivered
//! ```
//!
//! `cancelled` is reachable from any non-terminal state. `delivered` and
//! `cancelled` are terminal: once an order reaches either, every further
//! transition is rejected. The table lives here, in one place, so the server
//! enforces it at the boundary instead of overwriting status text blindly.

use serde::{Deserialize, Serialize};

/// Delivery status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "order_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All states, in pipeline order (cancelled last).
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether no further transition is permitted from this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Position in the forward pipeline; `None` for cancelled, which sits
    /// outside it.
    const fn pipeline_index(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Preparing => Some(2),
            Self::Ready => Some(3),
            Self::OutForDelivery => Some(4),
            Self::Delivered => Some(5),
            Self::Cancelled => None,
        }
    }

    /// Whether the transition `self -> to` is allowed.
    ///
    /// Allowed: exactly one forward step along the pipeline, or a move to
    /// `cancelled` from any non-terminal state. Everything else - backward
    /// moves, skipping ahead, self-transitions, and anything out of a
    /// terminal state - is rejected.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(to, Self::Cancelled) {
            return true;
        }
        match (self.pipeline_index(), to.pipeline_index()) {
            (Some(from), Some(next)) => next == from + 1,
            _ => false,
        }
    }

    /// Check a transition, producing the typed failure used at the API
    /// boundary.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when [`Self::can_transition`] is false.
    pub const fn transition(self, to: Self) -> Result<Self, TransitionError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// A rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid status transition: {from} -> {to}")]
pub struct TransitionError {
    /// Status the order was in.
    pub from: OrderStatus,
    /// Status the caller asked for.
    pub to: OrderStatus,
}

/// Payment status: an axis independent of delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Paypal,
    Cash,
}

impl PaymentMethod {
    /// Whether checkout should hand back a payment intent for client-side
    /// confirmation. Cash settles offline.
    #[must_use]
    pub const fn requires_payment_intent(self) -> bool {
        !matches!(self, Self::Cash)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn forward_single_steps_are_allowed() {
        use OrderStatus::*;
        for (from, to) in [
            (Pending, Confirmed),
            (Confirmed, Preparing),
            (Preparing, Ready),
            (Ready, OutForDelivery),
            (OutForDelivery, Delivered),
        ] {
            assert!(from.can_transition(to), "{from} -> {to} should be allowed");
        }
    }

    #[test]
    fn cancel_allowed_from_every_non_terminal_state() {
        for from in OrderStatus::ALL {
            let allowed = from.can_transition(OrderStatus::Cancelled);
            assert_eq!(allowed, !from.is_terminal(), "cancel from {from}");
        }
    }

    #[test]
    fn terminal_states_lock_out_every_target() {
        for from in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for to in OrderStatus::ALL {
                assert!(!from.can_transition(to), "{from} -> {to} must be rejected");
                assert_eq!(
                    from.transition(to),
                    Err(TransitionError { from, to })
                );
            }
        }
    }

    #[test]
    fn backward_and_skipping_moves_are_rejected() {
        use OrderStatus::*;
        for (from, to) in [
            (Delivered, Pending),
            (Ready, Confirmed),
            (Pending, Preparing),
            (Confirmed, OutForDelivery),
            (Preparing, Preparing),
        ] {
            assert!(!from.can_transition(to), "{from} -> {to} must be rejected");
        }
    }

    #[test]
    fn every_status_pair_has_a_verdict() {
        // The table is total: can_transition never panics and agrees with
        // transition() for all 49 pairs.
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(from.can_transition(to), from.transition(to).is_ok());
            }
        }
    }

    #[test]
    fn status_text_roundtrips() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_str(&status.to_string()), Ok(status));
        }
        assert!(OrderStatus::from_str("en_route").is_err());
    }

    #[test]
    fn cash_needs_no_payment_intent() {
        assert!(!PaymentMethod::Cash.requires_payment_intent());
        assert!(PaymentMethod::Card.requires_payment_intent());
        assert!(PaymentMethod::Paypal.requires_payment_intent());
    }
}
