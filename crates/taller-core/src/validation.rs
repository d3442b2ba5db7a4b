//! # Validation Module
//!
//! Request-shape checks that run before any I/O.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Validation Layers                             │
//! │                                                                     │
//! │  Layer 1: Request intake (out of scope)                             │
//! │  └── Deserialization, shape-sniffing of legacy payloads             │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE - shape checks before a connection is         │
//! │           even acquired (empty batch, non-positive quantity)        │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database CHECK constraints (stock_on_hand >= 0, ...)      │
//! │                                                                     │
//! │  Defense in depth: each layer catches a different class of error    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{PaymentInput, SaleLineRequest};
use crate::{MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Sale Request Validation
// =============================================================================

/// Validates the shape of a sale request: non-empty line set, positive
/// in-range quantities, non-negative payment figures.
///
/// Only shape is checked here. Product existence, stock, and the
/// deposit-vs-total bound need the catalog and are checked by the
/// orchestrator.
pub fn validate_sale_request(lines: &[SaleLineRequest], payment: &PaymentInput) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptySale);
    }

    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            }
            .into());
        }
        if line.quantity <= 0 || line.quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::InvalidQuantity {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            });
        }
    }

    validate_payment_input(payment)
}

/// Validates payment metadata: tendered and deposit must be non-negative.
pub fn validate_payment_input(payment: &PaymentInput) -> CoreResult<()> {
    if payment.amount_tendered_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "amount_tendered".to_string(),
        }
        .into());
    }
    if payment.deposit_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "deposit".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product name for catalog writes.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a sale price in cents. Zero-priced products are not sellable,
/// and the cap keeps `price × quantity` safely inside `i64`.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates the stock figures of a catalog write.
///
/// Mirrors the intake rules: neither counter may be negative, and the
/// reorder threshold may not start above the stock on hand.
pub fn validate_stock_levels(stock_on_hand: i64, reorder_threshold: i64) -> ValidationResult<()> {
    if stock_on_hand < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "stock_on_hand".to_string(),
        });
    }

    if reorder_threshold < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "reorder_threshold".to_string(),
        });
    }

    if reorder_threshold > stock_on_hand {
        return Err(ValidationError::OutOfRange {
            field: "reorder_threshold".to_string(),
            min: 0,
            max: stock_on_hand,
        });
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    fn line(product_id: &str, quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_empty_sale_rejected() {
        let err = validate_sale_request(&[], &PaymentInput::cash(1000)).unwrap_err();
        assert!(matches!(err, CoreError::EmptySale));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        for qty in [0, -1] {
            let err =
                validate_sale_request(&[line("p-1", qty)], &PaymentInput::cash(1000)).unwrap_err();
            assert!(matches!(err, CoreError::InvalidQuantity { quantity, .. } if quantity == qty));
        }
    }

    #[test]
    fn test_quantity_cap() {
        assert!(
            validate_sale_request(&[line("p-1", MAX_LINE_QUANTITY)], &PaymentInput::cash(0)).is_ok()
        );
        assert!(validate_sale_request(
            &[line("p-1", MAX_LINE_QUANTITY + 1)],
            &PaymentInput::cash(0)
        )
        .is_err());
    }

    #[test]
    fn test_negative_payment_figures_rejected() {
        let payment = PaymentInput {
            method: PaymentMethod::Cash,
            amount_tendered_cents: -1,
            deposit_cents: 0,
        };
        assert!(validate_payment_input(&payment).is_err());

        let payment = PaymentInput {
            method: PaymentMethod::Cash,
            amount_tendered_cents: 0,
            deposit_cents: -1,
        };
        assert!(validate_payment_input(&payment).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Pantalla iPhone 12").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-100).is_err());
        // Above the cap a subtotal could overflow i64
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_stock_levels() {
        assert!(validate_stock_levels(10, 2).is_ok());
        assert!(validate_stock_levels(5, 5).is_ok());
        assert!(validate_stock_levels(-1, 0).is_err());
        assert!(validate_stock_levels(10, -1).is_err());
        // Threshold above stock is an intake mistake
        assert!(validate_stock_levels(3, 5).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
