//! Uniqueness oracle port for card-number existence checks.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

/// Boxed future type alias used by [`UniquenessOracle`] to keep the trait dyn-compatible.
pub type ExistsFuture<'a> =
    Pin<Box<dyn Future<Output = Result<bool, Box<dyn Error + Send + Sync>>> + Send + 'a>>;

/// Answers whether a candidate value is already present in the external store.
///
/// `Ok(true)` means at least one record carries the value; `Ok(false)` means
/// the value is free. Transport or service failures surface as `Err`, kept
/// distinct from both answers so callers can treat them as tolerated
/// transient failures rather than a false "found" signal.
pub trait UniquenessOracle: Send + Sync {
    /// Checks whether any record carries exactly `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the search request fails (network, auth, rate-limit, etc.).
    fn exists(&self, value: &str) -> ExistsFuture<'_>;
}
