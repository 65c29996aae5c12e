//! Input validation tests
//!
//! Request-boundary parsing for rahba-api: path parameter and enum body
//! field rejection. Pagination clamping and storefront host resolution
//! are tested next to their implementations in handlers/shared.rs and
//! extractors.rs.

use rahba_types::{OrderStatus, Plan};

// ============================================================================
// Path Parameter Validation
// ============================================================================

#[test]
fn test_valid_uuid_path_param() {
    let uuid = "550e8400-e29b-41d4-a716-446655440000";
    assert!(uuid::Uuid::parse_str(uuid).is_ok());
}

#[test]
fn test_invalid_uuid_path_params() {
    let invalid_ids = [
        "",
        "not-a-uuid",
        "550e8400-e29b-41d4-a716",
        "550e8400-e29b-41d4-a716-446655440000-extra",
        "../../../etc/passwd",
        "' OR 1=1 --",
    ];

    for id in &invalid_ids {
        assert!(uuid::Uuid::parse_str(id).is_err(), "Should reject: {}", id);
    }
}

// ============================================================================
// Order Status Transitions (request body)
// ============================================================================

#[test]
fn test_known_order_statuses_parse() {
    for status in ["pending", "confirmed", "shipped", "delivered", "cancelled"] {
        assert!(
            status.parse::<OrderStatus>().is_ok(),
            "Should accept: {}",
            status
        );
    }
}

#[test]
fn test_unknown_order_statuses_are_rejected() {
    for status in ["teleported", "", "refunded", "pending; DROP TABLE orders"] {
        assert!(
            status.parse::<OrderStatus>().is_err(),
            "Should reject: {}",
            status
        );
    }
}

// ============================================================================
// Plan Selection (request body)
// ============================================================================

#[test]
fn test_known_plans_parse() {
    assert!("standard".parse::<Plan>().is_ok());
    assert!("pro".parse::<Plan>().is_ok());
}

#[test]
fn test_unknown_plans_are_rejected() {
    for plan in ["free", "enterprise", "", "pro '; --"] {
        assert!(plan.parse::<Plan>().is_err(), "Should reject: {}", plan);
    }
}
