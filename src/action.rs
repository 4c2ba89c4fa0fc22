//! Workflow invocation boundary: input/output field mapping.
//!
//! The hosting platform invokes the action with a JSON event carrying named
//! input fields and expects a named output-fields structure back. Every
//! invocation terminates in a well-formed response with a `status` field;
//! no failure propagates past this boundary.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::allocator::{self, AllocationResult};
use crate::ports::{RecordStore, UniquenessOracle};

/// Name of the CRM contact property that holds the card number.
pub const CARD_FIELD: &str = "member_card_no";

/// A workflow event as delivered by the hosting platform.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowEvent {
    /// Named input fields configured on the workflow step.
    #[serde(rename = "inputFields")]
    pub input_fields: InputFields,
}

/// Input fields of the card-number action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputFields {
    /// Identifier of the contact record to update.
    #[serde(default)]
    pub contact_to_update: Option<String>,
    /// The member identifier; the platform may deliver it as a string or a number.
    #[serde(default)]
    pub member_id: Option<Value>,
    /// The contact's current card number, if any.
    #[serde(default)]
    pub member_no: Option<String>,
}

impl InputFields {
    /// String form of the member id, coercing a numeric value.
    fn member_id_string(&self) -> Option<String> {
        match self.member_id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Overall outcome reported in the `status` output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// A card number was generated and persisted.
    Success,
    /// The contact already had a card number.
    Skipped,
    /// Invalid input, exhausted attempt budget, or a failed write.
    Error,
}

/// Output fields returned to the hosting platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFields {
    /// Overall outcome of the invocation.
    pub status: Status,
    /// Human-readable explanation of the outcome.
    pub message: String,
    /// The resulting card number; null on any non-success outcome.
    pub member_card_no: Option<String>,
    /// The member id the card number was derived from (success only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id_used: Option<String>,
    /// The suffix taken from the member id (success only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_5_digits: Option<String>,
    /// Oracle queries used, including the accepting one (success only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_needed: Option<u32>,
}

impl OutputFields {
    fn error(message: String) -> Self {
        Self {
            status: Status::Error,
            message,
            member_card_no: None,
            member_id_used: None,
            last_5_digits: None,
            attempts_needed: None,
        }
    }

    fn skipped(existing: String) -> Self {
        Self {
            status: Status::Skipped,
            message: "Member card number already exists".into(),
            member_card_no: Some(existing),
            member_id_used: None,
            last_5_digits: None,
            attempts_needed: None,
        }
    }
}

/// The action's response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Named output fields consumed by the hosting platform.
    #[serde(rename = "outputFields")]
    pub output_fields: OutputFields,
}

/// Executes the action for one workflow event.
///
/// This is the catch-all boundary: every allocation outcome, including
/// invalid input and failed writes, is translated into a structured response
/// rather than an error, so the hosting platform never sees an uncaught
/// failure.
pub async fn handle<R: Rng>(
    event: &WorkflowEvent,
    oracle: &dyn UniquenessOracle,
    store: &dyn RecordStore,
    rng: &mut R,
) -> ActionResponse {
    let fields = &event.input_fields;
    let member_id = fields.member_id_string();

    eprintln!(
        "processing contact {} with member_id: {}",
        fields.contact_to_update.as_deref().unwrap_or("(none)"),
        member_id.as_deref().unwrap_or("(none)")
    );

    // The idempotence guard precedes everything else: a re-run on an
    // already-processed record needs neither a contact id nor CRM traffic.
    if allocator::already_assigned(fields.member_no.as_deref()) {
        let existing = fields.member_no.clone().unwrap_or_default();
        return ActionResponse { output_fields: OutputFields::skipped(existing) };
    }

    let Some(contact_id) = fields.contact_to_update.as_deref() else {
        return ActionResponse {
            output_fields: OutputFields::error("Missing contact_to_update input".into()),
        };
    };

    let result = allocator::allocate(
        member_id.as_deref(),
        fields.member_no.as_deref(),
        contact_id,
        CARD_FIELD,
        oracle,
        store,
        rng,
    )
    .await;

    let output_fields = match result {
        AllocationResult::Skipped(existing) => OutputFields::skipped(existing),
        AllocationResult::Invalid(reason) => OutputFields::error(reason),
        AllocationResult::Exhausted(attempts) => OutputFields::error(format!(
            "Failed to generate unique member_card_no after {attempts} attempts"
        )),
        AllocationResult::Failed(message) => OutputFields::error(format!("Error: {message}")),
        AllocationResult::Allocated { card_number, attempts_used } => OutputFields {
            status: Status::Success,
            message: format!("Generated member card number: {card_number}"),
            member_id_used: member_id.clone(),
            last_5_digits: member_id.as_deref().and_then(allocator::last_five).map(String::from),
            attempts_needed: Some(attempts_used),
            member_card_no: Some(card_number),
        },
    };

    ActionResponse { output_fields }
}
