//! Integration tests for the order status machine.
//!
//! These verify the delivery pipeline end to end: the happy path, the
//! cancellation windows, and that the transition table is total.

use tavola_core::OrderStatus;

// =============================================================================
// Happy Path
// =============================================================================

#[test]
fn test_full_delivery_pipeline() {
    let mut status = OrderStatus::Pending;
    let pipeline = [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    for next in pipeline {
        status = status.transition(next).expect("forward step is legal");
    }
    assert_eq!(status, OrderStatus::Delivered);
    assert!(status.is_terminal());
}

#[test]
fn test_no_skipping_ahead() {
    assert!(OrderStatus::Pending.transition(OrderStatus::Preparing).is_err());
    assert!(OrderStatus::Confirmed.transition(OrderStatus::Delivered).is_err());
    assert!(OrderStatus::Pending.transition(OrderStatus::Delivered).is_err());
}

#[test]
fn test_no_going_backward() {
    assert!(OrderStatus::Preparing.transition(OrderStatus::Confirmed).is_err());
    assert!(OrderStatus::Delivered.transition(OrderStatus::Pending).is_err());
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancel_allowed_until_terminal() {
    for status in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
    ] {
        assert_eq!(
            status.transition(OrderStatus::Cancelled).expect("cancellable"),
            OrderStatus::Cancelled
        );
    }
}

#[test]
fn test_terminal_states_are_locked() {
    for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
        assert!(terminal.is_terminal());
        for target in OrderStatus::ALL {
            assert!(
                terminal.transition(target).is_err(),
                "{terminal} -> {target} must be rejected"
            );
        }
    }
}

#[test]
fn test_cancelled_order_cannot_be_revived() {
    let cancelled = OrderStatus::Pending
        .transition(OrderStatus::Cancelled)
        .expect("cancellable");
    assert!(cancelled.transition(OrderStatus::Confirmed).is_err());
    assert!(cancelled.transition(OrderStatus::Pending).is_err());
}

// =============================================================================
// Table Totality
// =============================================================================

#[test]
fn test_every_status_pair_has_a_verdict() {
    // 7 x 7 pairs, each either Ok or a TransitionError naming both ends.
    for from in OrderStatus::ALL {
        for to in OrderStatus::ALL {
            match from.transition(to) {
                Ok(next) => assert_eq!(next, to),
                Err(e) => {
                    let msg = e.to_string();
                    assert!(msg.contains(&from.to_string()));
                    assert!(msg.contains(&to.to_string()));
                }
            }
        }
    }
}

#[test]
fn test_self_transition_is_rejected() {
    for status in OrderStatus::ALL {
        assert!(status.transition(status).is_err(), "{status} -> {status}");
    }
}
