use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::core::adventure::ADVENTURE_DAILY_EP_THRESHOLD;
use crate::core::CompletionReceipt;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Need {required} EP today to start an adventure (have {daily_ep})")]
    Ineligible { required: u64, daily_ep: u64 },

    #[error("Request failed with status: {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureTicket {
    pub start_time: DateTime<Utc>,
}

/// Remote service that confirms habit completions and adventure starts.
///
/// Its answers are advisory. Local reward math never waits on or rolls back
/// for a response.
pub trait ConfirmationService: Send + Sync {
    fn complete_habit(
        &self,
        user_id: &str,
        habit_id: &str,
        timestamp: DateTime<Utc>,
    ) -> impl Future<Output = Result<HabitAck, ServiceError>> + Send;

    fn start_adventure(
        &self,
        user_id: &str,
        daily_ep: u64,
    ) -> impl Future<Output = Result<AdventureTicket, ServiceError>> + Send;
}

/// Fire-and-forget confirmation of a completed habit.
pub fn dispatch_completion<S>(
    service: Arc<S>,
    user_id: String,
    receipt: CompletionReceipt,
) -> JoinHandle<()>
where
    S: ConfirmationService + 'static,
{
    tokio::spawn(async move {
        match service
            .complete_habit(&user_id, &receipt.habit_id, receipt.timestamp)
            .await
        {
            Ok(ack) => {
                tracing::debug!(
                    habit = %receipt.habit_id,
                    success = ack.success,
                    "completion confirmed"
                )
            }
            Err(e) => {
                tracing::warn!(
                    habit = %receipt.habit_id,
                    error = %e,
                    "completion confirmation failed"
                )
            }
        }
    })
}

/// Ask the service to start an adventure. Below the threshold the request is
/// refused without a round trip.
pub async fn request_adventure<S>(
    service: &S,
    user_id: &str,
    daily_ep: u64,
) -> Result<AdventureTicket, ServiceError>
where
    S: ConfirmationService,
{
    if daily_ep < ADVENTURE_DAILY_EP_THRESHOLD {
        return Err(ServiceError::Ineligible {
            required: ADVENTURE_DAILY_EP_THRESHOLD,
            daily_ep,
        });
    }
    service.start_adventure(user_id, daily_ep).await
}

#[cfg(feature = "remote")]
pub use http::HttpConfirmationClient;

#[cfg(feature = "remote")]
mod http {
    use std::time::Duration;

    use chrono::{DateTime, Utc};
    use reqwest::{Client, StatusCode};
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};

    use super::{AdventureTicket, ConfirmationService, HabitAck, ServiceError};
    use crate::core::adventure::ADVENTURE_DAILY_EP_THRESHOLD;

    /// JSON-over-HTTP client for the confirmation endpoints.
    pub struct HttpConfirmationClient {
        client: Client,
        base_url: String,
    }

    impl HttpConfirmationClient {
        pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| ServiceError::Transport(e.to_string()))?;
            Ok(Self {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
            })
        }

        async fn post_request<T: DeserializeOwned>(
            &self,
            endpoint: &str,
            body: &Value,
        ) -> Result<T, ServiceError> {
            let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| ServiceError::Transport(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::FORBIDDEN && endpoint.ends_with("start-adventure") {
                let daily_ep = body.get("dailyEp").and_then(Value::as_u64).unwrap_or(0);
                return Err(ServiceError::Ineligible {
                    required: ADVENTURE_DAILY_EP_THRESHOLD,
                    daily_ep,
                });
            }
            if !status.is_success() {
                return Err(ServiceError::Status(status.as_u16()));
            }

            response
                .json::<T>()
                .await
                .map_err(|e| ServiceError::Transport(e.to_string()))
        }
    }

    impl ConfirmationService for HttpConfirmationClient {
        async fn complete_habit(
            &self,
            user_id: &str,
            habit_id: &str,
            timestamp: DateTime<Utc>,
        ) -> Result<HabitAck, ServiceError> {
            let body = json!({
                "userId": user_id,
                "habitId": habit_id,
                "timestamp": timestamp,
            });
            self.post_request("api/complete-habit", &body).await
        }

        async fn start_adventure(
            &self,
            user_id: &str,
            daily_ep: u64,
        ) -> Result<AdventureTicket, ServiceError> {
            let body = json!({
                "userId": user_id,
                "dailyEp": daily_ep,
            });
            self.post_request("api/start-adventure", &body).await
        }
    }
}
