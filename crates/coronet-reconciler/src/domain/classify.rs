//! Provider status classification
//!
//! The Commit Provider's status vocabulary is its own; the monitor only
//! needs a three-way partition of the raw string, refined to four outcomes
//! by artifact presence. The vocabulary lives here and nowhere else.

use crate::ports::outbound::{OrderFile, OrderStatusSnapshot};

/// Final statuses meaning the commit landed.
const SUCCESS_STATUSES: &[&str] = &["minted", "sent", "confirmed", "completed"];

/// Final statuses meaning the order will never land.
const FAILURE_STATUSES: &[&str] = &[
    "canceled",
    "cancelled",
    "failed",
    "timeout",
    "timed_out",
    "refunded",
    "expired",
];

/// Three-way partition of a raw provider status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Terminal success vocabulary.
    Success,
    /// Terminal failure vocabulary.
    Failure,
    /// Anything else: the order is still moving.
    InFlight,
}

/// Partition a raw status string. Matching is case-insensitive; unknown
/// strings are in-flight, never a failure.
pub fn classify_status(raw: &str) -> StatusClass {
    let status = raw.trim().to_ascii_lowercase();
    if SUCCESS_STATUSES.contains(&status.as_str()) {
        StatusClass::Success
    } else if FAILURE_STATUSES.contains(&status.as_str()) {
        StatusClass::Failure
    } else {
        StatusClass::InFlight
    }
}

/// Exactly one reconciliation outcome per polled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Terminal success with the artifact attached. The only path to
    /// completion.
    Inscribed {
        /// Ledger artifact identifier.
        inscription_id: String,
        /// Public URL of the artifact.
        inscription_url: Option<String>,
        /// Commitment transaction id.
        txid: Option<String>,
    },
    /// Final-looking status, artifact not yet attached. Keep polling until
    /// the stuck window runs out.
    AwaitingArtifact,
    /// Provider-reported terminal failure.
    Failed,
    /// Non-terminal intermediate status.
    InFlight,
}

/// Classify a full snapshot into its reconciliation outcome.
pub fn classify_outcome(snapshot: &OrderStatusSnapshot) -> OrderOutcome {
    match classify_status(&snapshot.status) {
        StatusClass::Success => match artifact(&snapshot.files) {
            Some((inscription_id, file)) => OrderOutcome::Inscribed {
                inscription_id,
                inscription_url: file.inscription_url.clone(),
                txid: file.txid.clone(),
            },
            None => OrderOutcome::AwaitingArtifact,
        },
        StatusClass::Failure => OrderOutcome::Failed,
        StatusClass::InFlight => OrderOutcome::InFlight,
    }
}

/// First file carrying an inscription id, with the id resolved.
fn artifact(files: &[OrderFile]) -> Option<(String, &OrderFile)> {
    files
        .iter()
        .find_map(|f| f.inscription_id.clone().map(|id| (id, f)))
}
