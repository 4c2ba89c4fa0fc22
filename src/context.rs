//! Service context bundling the CRM port trait objects.

use crate::adapters::live::LiveCrmClient;
use crate::ports::{RecordStore, UniquenessOracle};

/// Bundles the external-CRM port trait objects into a single context.
///
/// Each field provides access to one collaborator capability. Constructors
/// wire up different adapter implementations.
pub struct ServiceContext {
    /// Uniqueness oracle for card-number existence checks.
    pub oracle: Box<dyn UniquenessOracle>,
    /// Record store for writing the card number back to the contact.
    pub store: Box<dyn RecordStore>,
}

impl ServiceContext {
    /// Creates a live context backed by the real CRM API.
    #[must_use]
    pub fn live() -> Self {
        let crm = LiveCrmClient::new();
        Self { oracle: Box::new(crm.clone()), store: Box::new(crm) }
    }
}
