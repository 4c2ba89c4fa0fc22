//! Live adapters backed by the real CRM REST API.

pub mod crm;

pub use crm::LiveCrmClient;
