//! Ingress HTTP API.
//!
//! Community-facing surface: submit proposals, vote, browse the leaderboard,
//! and read operator status. Handlers talk to the store through the
//! [`ProposalDirectory`] port only; every competition decision stays with the
//! scheduler.
//!
//! | Route | Verb | Purpose |
//! |---|---|---|
//! | `/proposals` | POST | submit a proposal |
//! | `/proposals` | GET | leaderboard, votes descending |
//! | `/proposals/:id` | GET | one proposal |
//! | `/proposals/:id/votes` | POST | cast one vote |
//! | `/proposals/:id/reject` | POST | moderate an active proposal out |
//! | `/status` | GET | cursor position and per-status counts |
//! | `/health` | GET | liveness |

use crate::ports::{DirectoryError, ProposalDirectory, ProposalDraft, StatusSummary};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared_types::{Proposal, ProposalId};
use std::sync::Arc;

const NAME_MAX: usize = 64;
const TICKER_MAX: usize = 16;
const DESCRIPTION_MAX: usize = 512;

/// Application state shared across handlers.
#[derive(Clone)]
struct ApiState {
    directory: Arc<dyn ProposalDirectory>,
}

/// Build the ingress router over a directory backend.
pub fn router(directory: Arc<dyn ProposalDirectory>) -> Router {
    let state = ApiState { directory };
    Router::new()
        .route("/proposals", post(submit_proposal).get(list_proposals))
        .route("/proposals/:id", get(get_proposal))
        .route("/proposals/:id/votes", post(cast_vote))
        .route("/proposals/:id/reject", post(reject_proposal))
        .route("/status", get(status_summary))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Error envelope every non-2xx response carries.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        let status = match &err {
            DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
            DirectoryError::Conflict { .. } => StatusCode::CONFLICT,
            DirectoryError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Submission body.
#[derive(Debug, Deserialize)]
struct SubmitProposalRequest {
    name: String,
    ticker: String,
    #[serde(default)]
    description: String,
}

impl SubmitProposalRequest {
    /// Validate field shapes and normalize the ticker to uppercase.
    fn into_draft(self) -> Result<ProposalDraft, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() || name.len() > NAME_MAX {
            return Err(ApiError::invalid(format!(
                "name must be 1..={NAME_MAX} characters"
            )));
        }

        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() || ticker.len() > TICKER_MAX {
            return Err(ApiError::invalid(format!(
                "ticker must be 1..={TICKER_MAX} characters"
            )));
        }

        if self.description.len() > DESCRIPTION_MAX {
            return Err(ApiError::invalid(format!(
                "description must be at most {DESCRIPTION_MAX} characters"
            )));
        }

        Ok(ProposalDraft {
            name,
            ticker,
            description: self.description,
        })
    }
}

async fn submit_proposal(
    State(state): State<ApiState>,
    Json(request): Json<SubmitProposalRequest>,
) -> Result<(StatusCode, Json<Proposal>), ApiError> {
    let draft = request.into_draft()?;
    let proposal = state.directory.submit_proposal(draft).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

async fn list_proposals(State(state): State<ApiState>) -> Result<Json<Vec<Proposal>>, ApiError> {
    Ok(Json(state.directory.list_proposals().await?))
}

async fn get_proposal(
    State(state): State<ApiState>,
    Path(id): Path<ProposalId>,
) -> Result<Json<Proposal>, ApiError> {
    Ok(Json(state.directory.proposal(id).await?))
}

async fn cast_vote(
    State(state): State<ApiState>,
    Path(id): Path<ProposalId>,
) -> Result<Json<Proposal>, ApiError> {
    Ok(Json(state.directory.cast_vote(id).await?))
}

async fn reject_proposal(
    State(state): State<ApiState>,
    Path(id): Path<ProposalId>,
) -> Result<Json<Proposal>, ApiError> {
    Ok(Json(state.directory.reject_proposal(id).await?))
}

async fn status_summary(State(state): State<ApiState>) -> Result<Json<StatusSummary>, ApiError> {
    Ok(Json(state.directory.status_summary().await?))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "coronet",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryStore;
    use coronet_scheduler::CompetitionStore;
    use shared_types::ProposalStatus;

    fn test_state() -> (ApiState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            ApiState {
                directory: store.clone(),
            },
            store,
        )
    }

    fn request(name: &str, ticker: &str, description: &str) -> SubmitProposalRequest {
        SubmitProposalRequest {
            name: name.to_string(),
            ticker: ticker.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_validation_rejects_bad_shapes() {
        assert!(request("", "ORB", "").into_draft().is_err());
        assert!(request("   ", "ORB", "").into_draft().is_err());
        assert!(request(&"x".repeat(65), "ORB", "").into_draft().is_err());
        assert!(request("Orbit", "", "").into_draft().is_err());
        assert!(request("Orbit", &"T".repeat(17), "").into_draft().is_err());
        assert!(request("Orbit", "ORB", &"d".repeat(513))
            .into_draft()
            .is_err());

        let err = request("", "ORB", "").into_draft().unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_ticker_is_normalized_to_uppercase() {
        let draft = request("  Orbit ", "orb", "an orbit token")
            .into_draft()
            .unwrap();
        assert_eq!(draft.name, "Orbit");
        assert_eq!(draft.ticker, "ORB");
    }

    #[tokio::test]
    async fn test_submit_then_fetch_roundtrip() {
        let (state, _store) = test_state();

        let (status, Json(created)) = submit_proposal(
            State(state.clone()),
            Json(request("Orbit", "orb", "an orbit token")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.id, 1);
        assert_eq!(created.ticker, "ORB");
        assert_eq!(created.status, ProposalStatus::Active);

        let Json(fetched) = get_proposal(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(fetched, created);

        let err = get_proposal(State(state), Path(99)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_votes_reorder_the_leaderboard() {
        let (state, _store) = test_state();
        for name in ["first", "second"] {
            submit_proposal(State(state.clone()), Json(request(name, "TKR", "")))
                .await
                .unwrap();
        }

        cast_vote(State(state.clone()), Path(2)).await.unwrap();
        let Json(voted) = cast_vote(State(state.clone()), Path(2)).await.unwrap();
        assert_eq!(voted.total_votes, 2);

        let Json(listed) = list_proposals(State(state)).await.unwrap();
        let ids: Vec<ProposalId> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_vote_conflicts_once_out_of_contention() {
        let (state, store) = test_state();
        submit_proposal(State(state.clone()), Json(request("Orbit", "ORB", "")))
            .await
            .unwrap();
        store
            .update_proposal(1, shared_types::CompetitionPatch::status(ProposalStatus::Expired))
            .await
            .unwrap();

        let err = cast_vote(State(state.clone()), Path(1)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = cast_vote(State(state), Path(42)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reject_is_active_only() {
        let (state, _store) = test_state();
        submit_proposal(State(state.clone()), Json(request("Orbit", "ORB", "")))
            .await
            .unwrap();

        let Json(rejected) = reject_proposal(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(rejected.status, ProposalStatus::Rejected);

        let err = reject_proposal(State(state), Path(1)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_status_reports_cursor_and_counts() {
        let (state, store) = test_state();
        submit_proposal(State(state.clone()), Json(request("Orbit", "ORB", "")))
            .await
            .unwrap();
        store.advance_tracker(840_011, "hash-840011").await.unwrap();

        let Json(summary) = status_summary(State(state)).await.unwrap();
        assert_eq!(summary.last_processed_block, Some(840_011));
        assert_eq!(summary.proposals.active, 1);
        assert_eq!(summary.proposals.inscribed, 0);
    }
}
