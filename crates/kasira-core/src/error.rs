//! # Error Types
//!
//! Domain-specific error types for kasira-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasira-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasira-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures, concurrency conflicts,     │
//! │                         plus a transparent wrapper around CoreError    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (id, bound, requested amount)
//! 3. Errors are enum variants, never String
//! 4. Recoverable errors (validation, not-found) are distinct from errors
//!    that abort a settlement outright (insufficient stock)
//! 5. Clamping (stock ceiling, discount ceiling) is NOT an error; it is a
//!    warning surfaced through the cart and calculation types

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Settlement engine business errors.
///
/// These errors represent business rule violations or domain logic
/// failures. They should be caught and translated to user-facing messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Member cannot be found.
    ///
    /// ## When This Occurs
    /// - Settlement or receivable creation references an unknown member
    /// - Member was deactivated between preview and settlement
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Receivable not found.
    #[error("Receivable not found: {0}")]
    ReceivableNotFound(String),

    /// Suspended sale not found or already claimed by another cashier.
    #[error("Suspended sale not available: {0}")]
    SuspendedSaleNotAvailable(String),

    /// Insufficient stock to complete a settlement.
    ///
    /// This is a settlement-time hard failure: the whole settlement
    /// aborts and nothing is persisted. It is deliberately stricter than
    /// the cart, where an over-ceiling quantity merely clamps.
    ///
    /// ## User Workflow
    /// ```text
    /// Settle (qty: 5)
    ///      │
    ///      ▼
    /// Guarded stock decrement: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Beras 5kg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole settlement rolls back, UI shows: "Only 3 Beras 5kg in stock"
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// A sale whose tendered payment is short needs a registered member.
    ///
    /// Walk-in customers have no account to attach the debt to; this is a
    /// business invariant, not a missing feature.
    #[error("An under-paid sale requires a registered member to carry the receivable")]
    ReceivableRequiresMember,

    /// Payment would push amount_paid past amount_due.
    ///
    /// The ledger never accepts an overpayment; the message names the
    /// largest amount it will accept so the caller can retry.
    #[error("Payment exceeds outstanding balance: at most {remaining} accepted")]
    PaymentExceedsBalance { remaining: Money },

    /// Receivable is already fully paid; its state machine is terminal.
    #[error("Receivable {0} is already paid in full")]
    ReceivableAlreadySettled(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Referenced line is not present in the cart.
    #[error("Product {0} is not in the cart")]
    LineNotInCart(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Beras 5kg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Beras 5kg: available 3, requested 5"
        );
    }

    #[test]
    fn test_overpayment_names_the_bound() {
        let err = CoreError::PaymentExceedsBalance {
            remaining: Money::from_cents(1500),
        };
        assert_eq!(
            err.to_string(),
            "Payment exceeds outstanding balance: at most 1500 accepted"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "amount must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "cashier_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
