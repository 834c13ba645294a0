//! Commit Provider order desk over HTTP.
//!
//! One physical adapter implements both provider ports: the scheduler's
//! creation side ([`OrderGateway`]) and the monitor's polling side
//! ([`OrderStatusGateway`]). Each subsystem receives the same `Arc` upcast to
//! the one trait it owns.
//!
//! - `POST /orders` creates an inscription order
//! - `GET /orders/{order_id}` returns the current status snapshot
//!
//! The polling side keeps the provider's failure taxonomy: 429 maps to
//! [`ReconcilerError::RateLimited`], 5xx to
//! [`ReconcilerError::ProviderUnavailable`], network failures to
//! [`ReconcilerError::Transport`]. The retry combinator in the monitor keys
//! off exactly that split.

use crate::config::ProviderConfig;
use async_trait::async_trait;
use coronet_reconciler::{OrderFile, OrderStatusGateway, OrderStatusSnapshot, ReconcilerError, ReconcilerResult};
use coronet_scheduler::{CreateOrderRequest, OrderGateway, OrderReceipt, SchedulerError, SchedulerResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Creation payload as the order desk expects it: the commit request plus
/// the delivery address this deployment inscribes to.
#[derive(Debug, Serialize)]
struct CreateOrderWire<'a> {
    #[serde(flatten)]
    request: &'a CreateOrderRequest,
    receive_address: &'a str,
}

/// Creation response from the order desk.
#[derive(Debug, Deserialize)]
struct OrderReceiptWire {
    order_id: String,
    payment_address: String,
    payment_amount: u64,
}

/// Status snapshot as the order desk serves it. Parsed liberally: a desk
/// that omits amounts or files still yields a usable snapshot.
#[derive(Debug, Deserialize)]
struct OrderStatusWire {
    status: String,
    #[serde(default)]
    paid_amount: u64,
    #[serde(default)]
    total_amount: u64,
    #[serde(default)]
    files: Vec<OrderFileWire>,
}

#[derive(Debug, Deserialize)]
struct OrderFileWire {
    #[serde(default)]
    inscription_id: Option<String>,
    #[serde(default)]
    inscription_url: Option<String>,
    #[serde(default)]
    txid: Option<String>,
}

/// HTTP adapter for the Commit Provider order desk.
pub struct HttpOrderProvider {
    base_url: String,
    client: Client,
    api_key: Option<String>,
    destination_address: String,
}

impl HttpOrderProvider {
    /// Build a client against `config.base_url`.
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            api_key: config.api_key.clone(),
            destination_address: config.destination_address.clone(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Map a non-success polling response onto the monitor's taxonomy.
    fn classify_poll_failure(status: StatusCode, body: String) -> ReconcilerError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            ReconcilerError::RateLimited
        } else if status.is_server_error() {
            ReconcilerError::ProviderUnavailable {
                reason: format!("{status} {body}"),
            }
        } else {
            ReconcilerError::BadResponse {
                reason: format!("{status} {body}"),
            }
        }
    }
}

#[async_trait]
impl OrderGateway for HttpOrderProvider {
    async fn create_order(&self, request: CreateOrderRequest) -> SchedulerResult<OrderReceipt> {
        let proposal_id = request.proposal_id;
        let url = format!("{}/orders", self.base_url);
        let payload = CreateOrderWire {
            request: &request,
            receive_address: &self.destination_address,
        };
        debug!(
            proposal_id,
            correlation_id = %request.correlation_id,
            "creating inscription order"
        );

        let resp = self
            .authorized(self.client.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SchedulerError::OrderCreation {
                proposal_id,
                reason: format!("POST {url}: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SchedulerError::OrderCreation {
                proposal_id,
                reason: format!("POST {url}: {status} {body}"),
            });
        }

        let receipt =
            resp.json::<OrderReceiptWire>()
                .await
                .map_err(|e| SchedulerError::OrderCreation {
                    proposal_id,
                    reason: format!("unparseable order receipt: {e}"),
                })?;

        Ok(OrderReceipt {
            order_id: receipt.order_id,
            payment_address: receipt.payment_address,
            payment_amount: receipt.payment_amount,
        })
    }
}

#[async_trait]
impl OrderStatusGateway for HttpOrderProvider {
    async fn order_status(&self, order_id: &str) -> ReconcilerResult<OrderStatusSnapshot> {
        let url = format!("{}/orders/{order_id}", self.base_url);

        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ReconcilerError::Transport {
                reason: format!("GET {url}: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::classify_poll_failure(status, body));
        }

        let wire = resp
            .json::<OrderStatusWire>()
            .await
            .map_err(|e| ReconcilerError::BadResponse {
                reason: format!("unparseable status for order {order_id}: {e}"),
            })?;

        Ok(OrderStatusSnapshot {
            status: wire.status,
            paid_amount: wire.paid_amount,
            total_amount: wire.total_amount,
            files: wire
                .files
                .into_iter()
                .map(|f| OrderFile {
                    inscription_id: f.inscription_id,
                    inscription_url: f.inscription_url,
                    txid: f.txid,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_creation_payload_carries_destination_address() {
        let request = CreateOrderRequest {
            correlation_id: Uuid::nil(),
            name: "Orbit".into(),
            ticker: "ORB".into(),
            description: "an orbit token".into(),
            total_votes: 12,
            proposal_id: 4,
            block_height: 840_002,
            block_hash: "00000abc".into(),
        };
        let wire = CreateOrderWire {
            request: &request,
            receive_address: "bc1qdest",
        };

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["receive_address"], "bc1qdest");
        assert_eq!(json["name"], "Orbit");
        assert_eq!(json["ticker"], "ORB");
        assert_eq!(json["total_votes"], 12);
        assert_eq!(json["block_height"], 840_002);
    }

    #[test]
    fn test_poll_failure_taxonomy() {
        assert!(matches!(
            HttpOrderProvider::classify_poll_failure(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ReconcilerError::RateLimited
        ));
        assert!(matches!(
            HttpOrderProvider::classify_poll_failure(
                StatusCode::BAD_GATEWAY,
                "upstream died".into()
            ),
            ReconcilerError::ProviderUnavailable { .. }
        ));
        assert!(matches!(
            HttpOrderProvider::classify_poll_failure(StatusCode::NOT_FOUND, String::new()),
            ReconcilerError::BadResponse { .. }
        ));
    }

    #[test]
    fn test_sparse_status_snapshot_still_parses() {
        let wire: OrderStatusWire = serde_json::from_str(r#"{"status": "minted"}"#).unwrap();
        assert_eq!(wire.status, "minted");
        assert_eq!(wire.paid_amount, 0);
        assert!(wire.files.is_empty());

        let wire: OrderStatusWire = serde_json::from_str(
            r#"{
                "status": "completed",
                "paid_amount": 25000,
                "total_amount": 25000,
                "files": [{"inscription_id": "abc123i0", "txid": "deadbeef"}]
            }"#,
        )
        .unwrap();
        assert_eq!(wire.files.len(), 1);
        assert_eq!(wire.files[0].inscription_id.as_deref(), Some("abc123i0"));
        assert_eq!(wire.files[0].inscription_url, None);
    }
}
