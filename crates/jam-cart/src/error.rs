//! Cart error types.

use jam_data::FetchError;
use jam_storage::StorageError;
use thiserror::Error;

/// Errors that can occur in cart operations.
#[derive(Error, Debug)]
pub enum CartError {
    /// Durable storage could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// The pricing or catalog backend failed (network, timeout, non-2xx).
    #[error("Pricing backend error: {0}")]
    PricingBackend(#[from] FetchError),

    /// The backend answered with a payload that does not match its schema.
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    /// Requested quantity exceeds what the catalog can supply.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Invalid caller input.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CartError {
    /// Whether retrying the same call may succeed.
    ///
    /// Only transport-level backend failures qualify; a malformed response
    /// or a stock shortage will not fix itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            CartError::PricingBackend(e) => e.is_retryable(),
            CartError::Persistence(StorageError::Unavailable(_)) => true,
            _ => false,
        }
    }

    /// HTTP status code of a backend failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CartError::PricingBackend(e) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        let e = CartError::PricingBackend(FetchError::HttpError {
            status: 503,
            message: "unavailable".to_string(),
        });
        assert!(e.is_retryable());
        assert_eq!(e.status(), Some(503));

        let e = CartError::PricingBackend(FetchError::HttpError {
            status: 400,
            message: "bad".to_string(),
        });
        assert!(!e.is_retryable());

        assert!(!CartError::InvalidResponse("missing total".to_string()).is_retryable());
        assert!(CartError::PricingBackend(FetchError::Timeout).is_retryable());

        let e = CartError::from(StorageError::Unavailable("disabled".to_string()));
        assert!(e.is_retryable());
    }

    #[test]
    fn test_insufficient_stock_message() {
        let e = CartError::InsufficientStock {
            product_id: "p1".to_string(),
            requested: 5,
            available: 2,
        };
        assert_eq!(
            e.to_string(),
            "Insufficient stock for p1: requested 5, available 2"
        );
    }
}
