//! Strictly positive stock quantities.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// A validated, strictly positive quantity of stock units.
///
/// Every mutation that moves stock goes through [`Quantity::new`] before the
/// remote call is issued, so a non-positive quantity never reaches the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    /// Validate a raw quantity coming from user input.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        Self::for_field("quantity", value)
    }

    /// Validate a raw quantity, naming the offending field on failure.
    pub fn for_field(field: &str, value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::NonPositiveQuantity {
                field: field.to_string(),
                value,
            });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
