//! Record store port for writing a single field back to a record.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

/// Boxed future type alias used by [`RecordStore`] to keep the trait dyn-compatible.
pub type UpdateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), Box<dyn Error + Send + Sync>>> + Send + 'a>>;

/// Persists a single field value on an existing record.
pub trait RecordStore: Send + Sync {
    /// Sets `field_name` to `value` on the record identified by `record_id`.
    ///
    /// # Errors
    ///
    /// Returns an error on any write failure; the error is propagated
    /// unchanged to the caller.
    fn update_field(&self, record_id: &str, field_name: &str, value: &str) -> UpdateFuture<'_>;
}
