//! Secondary launch trigger.
//!
//! A committed proposal is announced to an external asset-creation service
//! with a single webhook POST. The scheduler fires this detached from the
//! tick and only logs failures, so the adapter stays deliberately dumb: no
//! retries, no state.

use async_trait::async_trait;
use coronet_scheduler::{SchedulerError, SchedulerResult, TokenLauncher};
use reqwest::Client;
use serde::Serialize;
use shared_types::{Proposal, ProposalId};
use std::time::Duration;
use tracing::debug;

/// Webhook payload for a winning proposal.
#[derive(Debug, Serialize)]
struct LaunchWire<'a> {
    proposal_id: ProposalId,
    name: &'a str,
    ticker: &'a str,
    description: &'a str,
    total_votes: u64,
}

/// [`TokenLauncher`] that POSTs winners to a configured webhook.
pub struct WebhookLauncher {
    url: String,
    client: Client,
}

impl WebhookLauncher {
    /// Build a launcher POSTing to `url`.
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl TokenLauncher for WebhookLauncher {
    async fn launch(&self, proposal: Proposal) -> SchedulerResult<()> {
        let payload = LaunchWire {
            proposal_id: proposal.id,
            name: &proposal.name,
            ticker: &proposal.ticker,
            description: &proposal.description,
            total_votes: proposal.total_votes,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SchedulerError::Launch {
                reason: format!("POST {}: {e}", self.url),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SchedulerError::Launch {
                reason: format!("POST {}: {status} {body}", self.url),
            });
        }

        debug!(proposal_id = proposal.id, "launch webhook delivered");
        Ok(())
    }
}

/// [`TokenLauncher`] for deployments without a launch webhook.
pub struct NoopLauncher;

#[async_trait]
impl TokenLauncher for NoopLauncher {
    async fn launch(&self, proposal: Proposal) -> SchedulerResult<()> {
        debug!(
            proposal_id = proposal.id,
            ticker = %proposal.ticker,
            "no launch webhook configured, skipping"
        );
        Ok(())
    }
}
