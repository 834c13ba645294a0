//! Esplora-backed chain source.
//!
//! Reads block heights and block metadata from an esplora-style HTTP API:
//!
//! - `GET /blocks/tip/height` -> plain-text height
//! - `GET /block-height/{height}` -> plain-text block hash
//! - `GET /block/{hash}` -> JSON block metadata
//!
//! Every failure collapses into [`SchedulerError::Chain`]; the scheduler
//! treats an unreadable chain as "skip this tick", so fine-grained error
//! taxonomy buys nothing here.

use crate::config::ChainConfig;
use async_trait::async_trait;
use coronet_scheduler::{BlockInfo, ChainSource, SchedulerError, SchedulerResult};
use reqwest::Client;
use serde::Deserialize;
use shared_types::BlockHeight;

/// Block metadata as esplora serves it. Only the fields we stamp onto
/// proposals and orders.
#[derive(Debug, Deserialize)]
struct EsploraBlock {
    id: String,
    height: BlockHeight,
    timestamp: u64,
}

/// [`ChainSource`] over an esplora instance.
pub struct EsploraChainSource {
    base_url: String,
    client: Client,
}

impl EsploraChainSource {
    /// Build a client against `config.base_url`.
    pub fn new(config: &ChainConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_text(&self, url: &str) -> SchedulerResult<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SchedulerError::Chain {
                reason: format!("GET {url}: {e}"),
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SchedulerError::Chain {
                reason: format!("GET {url}: {status} {body}"),
            });
        }
        resp.text().await.map_err(|e| SchedulerError::Chain {
            reason: format!("GET {url}: {e}"),
        })
    }
}

#[async_trait]
impl ChainSource for EsploraChainSource {
    async fn current_height(&self) -> SchedulerResult<BlockHeight> {
        let url = format!("{}/blocks/tip/height", self.base_url);
        let body = self.get_text(&url).await?;
        body.trim().parse().map_err(|e| SchedulerError::Chain {
            reason: format!("unparseable tip height {body:?}: {e}"),
        })
    }

    async fn block_at(&self, height: BlockHeight) -> SchedulerResult<BlockInfo> {
        let hash_url = format!("{}/block-height/{height}", self.base_url);
        let hash = self.get_text(&hash_url).await?.trim().to_string();

        let block_url = format!("{}/block/{hash}", self.base_url);
        let resp = self
            .client
            .get(&block_url)
            .send()
            .await
            .map_err(|e| SchedulerError::Chain {
                reason: format!("GET {block_url}: {e}"),
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SchedulerError::Chain {
                reason: format!("GET {block_url}: {status} {body}"),
            });
        }
        let block =
            resp.json::<EsploraBlock>()
                .await
                .map_err(|e| SchedulerError::Chain {
                    reason: format!("unparseable block {hash}: {e}"),
                })?;

        if block.height != height {
            // A reorg between the two requests can hand back a block at a
            // different height; surface it rather than stamp bad provenance.
            return Err(SchedulerError::Chain {
                reason: format!(
                    "block {hash} reports height {}, expected {height}",
                    block.height
                ),
            });
        }

        Ok(BlockInfo {
            height: block.height,
            hash: block.id,
            timestamp: block.timestamp,
        })
    }
}
