//! Domain error types.
//!
//! Validation failures are raised as [`DomainError`]. A product that fits in no
//! box is *not* an error: it is reported as an unpackable
//! [`PackagingResult`](crate::result::PackagingResult).

use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors raised while building or validating domain entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Non-positive or non-finite extents, blank identities or duplicate
    /// entries. The name is historical: it covers every input-validation
    /// failure of the entities, not only geometric ones.
    #[error("{}", invalid_dimensions_message(.reason, .entity_id.as_deref()))]
    InvalidDimensions {
        reason: String,
        entity_id: Option<String>,
    },

    /// Packing was attempted on an order without products.
    #[error("{}", empty_order_message(.order_id.as_deref()))]
    EmptyOrder { order_id: Option<String> },
}

impl DomainError {
    /// Builds an `InvalidDimensions` error without an offending entity.
    pub fn invalid(reason: impl Into<String>) -> Self {
        DomainError::InvalidDimensions {
            reason: reason.into(),
            entity_id: None,
        }
    }

    /// Builds an `InvalidDimensions` error naming the offending entity.
    pub fn invalid_for(reason: impl Into<String>, entity_id: impl Into<String>) -> Self {
        DomainError::InvalidDimensions {
            reason: reason.into(),
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn empty_order(order_id: impl Into<String>) -> Self {
        DomainError::EmptyOrder {
            order_id: Some(order_id.into()),
        }
    }

    /// Stable error code sent to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidDimensions { .. } => "InvalidDimensionsException",
            DomainError::EmptyOrder { .. } => "EmptyOrderException",
        }
    }

    /// All human-readable messages carried by this error.
    pub fn errors(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

fn invalid_dimensions_message(reason: &str, entity_id: Option<&str>) -> String {
    match entity_id {
        Some(id) => format!("Invalid dimensions for product '{}': {}", id, reason),
        None => format!("Invalid dimensions: {}", reason),
    }
}

fn empty_order_message(order_id: Option<&str>) -> String {
    match order_id {
        Some(id) => format!(
            "Order '{}' cannot be empty - at least one product is required",
            id
        ),
        None => "Order cannot be empty - at least one product is required".to_string(),
    }
}
