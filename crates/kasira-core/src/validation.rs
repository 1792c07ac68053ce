//! # Validation Module
//!
//! Input validation for settlement and ledger operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / transport)                                      │
//! │  ├── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation before any I/O        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK / FOREIGN KEY constraints                        │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation rejects; it never adjusts. The cart's clamping lives in the
//! cart, where it is reported as a warning.

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a line quantity on a settlement request.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a ledger payment amount.
///
/// ## Rules
/// - Must be strictly positive; zero and negative repayments are
///   rejected, never recorded as no-ops
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a tendered amount at settlement.
///
/// ## Rules
/// - Zero is allowed: a sale saved entirely as debt tenders nothing
/// - Negative is not
pub fn validate_tendered_amount(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "tendered amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a requested additional discount.
///
/// Only the sign is checked here; the ceiling against the subtotal is a
/// clamp inside the composition, not a rejection.
pub fn validate_additional_discount(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "additional discount".to_string(),
        });
    }

    Ok(())
}

/// Validates a member discount percentage.
pub fn validate_discount_percent(percent: u32) -> ValidationResult<()> {
    if percent > 100 {
        return Err(ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a required identifier field.
pub fn validate_required_id(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an optional free-form note.
pub fn validate_note(note: Option<&str>) -> ValidationResult<()> {
    if let Some(note) = note {
        if note.len() > 500 {
            return Err(ValidationError::TooLong {
                field: "note".to_string(),
                max: 500,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
