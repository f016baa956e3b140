//! Document status rules and line validation.
//!
//! Sales, purchase receipts, and returns share the same one-way status
//! machine (registered, then possibly voided) and the same up-front line
//! validation, applied before any transaction starts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Status of a stock/cash document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// In force; its ledger effects stand.
    Registered,
    /// Reversed; its ledger effects were replayed backwards. Terminal.
    Voided,
}

impl DocumentStatus {
    /// Checks that the document can still be voided.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyVoided` for a voided document.
    pub const fn ensure_voidable(self) -> Result<(), DocumentError> {
        match self {
            Self::Registered => Ok(()),
            Self::Voided => Err(DocumentError::AlreadyVoided),
        }
    }
}

/// A priced document line as submitted by the caller (sales, returns).
#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
    /// The unit being moved.
    pub unit_id: Uuid,
    /// Quantity moved.
    pub quantity: i32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Discount per unit.
    pub discount: Decimal,
}

/// A costed document line as submitted by the caller (purchase receipts).
#[derive(Debug, Clone, Copy)]
pub struct CostedLine {
    /// The unit being received.
    pub unit_id: Uuid,
    /// Quantity received.
    pub quantity: i32,
    /// Cost per unit, supplied by the caller.
    pub unit_cost: Decimal,
}

/// Validates priced lines before any transaction starts.
///
/// # Errors
///
/// Returns the first violation: empty document, non-positive quantity,
/// negative price, negative discount, or a discount above the price.
pub fn validate_priced_lines(lines: &[PricedLine]) -> Result<(), DocumentError> {
    if lines.is_empty() {
        return Err(DocumentError::EmptyDocument);
    }
    for (index, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(DocumentError::NonPositiveQuantity { line: index });
        }
        if line.unit_price.is_sign_negative() {
            return Err(DocumentError::NegativePrice { line: index });
        }
        if line.discount.is_sign_negative() {
            return Err(DocumentError::NegativeDiscount { line: index });
        }
        if line.discount > line.unit_price {
            return Err(DocumentError::DiscountAbovePrice { line: index });
        }
    }
    Ok(())
}

/// Validates costed lines before any transaction starts.
///
/// # Errors
///
/// Returns the first violation: empty document, non-positive quantity, or
/// negative cost.
pub fn validate_costed_lines(lines: &[CostedLine]) -> Result<(), DocumentError> {
    if lines.is_empty() {
        return Err(DocumentError::EmptyDocument);
    }
    for (index, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(DocumentError::NonPositiveQuantity { line: index });
        }
        if line.unit_cost.is_sign_negative() {
            return Err(DocumentError::NegativeCost { line: index });
        }
    }
    Ok(())
}

/// Errors shared by all document kinds.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document was already voided; voiding is one-way and idempotent
    /// only in its refusal.
    #[error("Document is already voided")]
    AlreadyVoided,

    /// A document needs at least one line.
    #[error("Document has no lines")]
    EmptyDocument,

    /// Line quantity must be positive.
    #[error("Line {line}: quantity must be positive")]
    NonPositiveQuantity {
        /// Zero-based line index.
        line: usize,
    },

    /// Line price cannot be negative.
    #[error("Line {line}: unit price cannot be negative")]
    NegativePrice {
        /// Zero-based line index.
        line: usize,
    },

    /// Line discount cannot be negative.
    #[error("Line {line}: discount cannot be negative")]
    NegativeDiscount {
        /// Zero-based line index.
        line: usize,
    },

    /// Line discount cannot exceed the unit price.
    #[error("Line {line}: discount cannot exceed the unit price")]
    DiscountAbovePrice {
        /// Zero-based line index.
        line: usize,
    },

    /// Line cost cannot be negative.
    #[error("Line {line}: unit cost cannot be negative")]
    NegativeCost {
        /// Zero-based line index.
        line: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn priced(quantity: i32, unit_price: Decimal, discount: Decimal) -> PricedLine {
        PricedLine {
            unit_id: Uuid::new_v4(),
            quantity,
            unit_price,
            discount,
        }
    }

    #[test]
    fn test_voiding_is_one_way() {
        assert!(DocumentStatus::Registered.ensure_voidable().is_ok());
        assert!(matches!(
            DocumentStatus::Voided.ensure_voidable(),
            Err(DocumentError::AlreadyVoided)
        ));
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(matches!(
            validate_priced_lines(&[]),
            Err(DocumentError::EmptyDocument)
        ));
        assert!(matches!(
            validate_costed_lines(&[]),
            Err(DocumentError::EmptyDocument)
        ));
    }

    #[test]
    fn test_priced_line_validation() {
        assert!(validate_priced_lines(&[priced(1, dec!(9.99), dec!(1.00))]).is_ok());
        assert!(matches!(
            validate_priced_lines(&[priced(0, dec!(1.00), Decimal::ZERO)]),
            Err(DocumentError::NonPositiveQuantity { line: 0 })
        ));
        assert!(matches!(
            validate_priced_lines(&[
                priced(1, dec!(1.00), Decimal::ZERO),
                priced(1, dec!(-1.00), Decimal::ZERO)
            ]),
            Err(DocumentError::NegativePrice { line: 1 })
        ));
        assert!(matches!(
            validate_priced_lines(&[priced(1, dec!(1.00), dec!(2.00))]),
            Err(DocumentError::DiscountAbovePrice { line: 0 })
        ));
    }

    #[test]
    fn test_costed_line_validation() {
        let good = CostedLine {
            unit_id: Uuid::new_v4(),
            quantity: 5,
            unit_cost: dec!(2.50),
        };
        assert!(validate_costed_lines(&[good]).is_ok());

        let bad = CostedLine {
            unit_cost: dec!(-0.01),
            ..good
        };
        assert!(matches!(
            validate_costed_lines(&[good, bad]),
            Err(DocumentError::NegativeCost { line: 1 })
        ));
    }
}
