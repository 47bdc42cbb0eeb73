use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::card::ReputationCard;
use super::{ClientConfig, ClientError};
use crate::address;
use crate::api::ApiResponse;
use crate::query::{ReputationData, ReviewsData};

/// HTTP client for the query API
#[derive(Clone)]
pub struct ReputationClient {
    client: Client,
    api_url: Url,
    config: ClientConfig,
}

impl ReputationClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api_url = Url::parse(&config.api_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("repOWR-widget/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            client,
            api_url,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn reputation(&self, address: &str) -> Result<ReputationData, ClientError> {
        self.get(&[("endpoint", "reputation"), ("address", address)])
            .await
    }

    pub async fn reviews(&self, address: &str, limit: usize) -> Result<ReviewsData, ClientError> {
        let limit = limit.to_string();
        self.get(&[
            ("endpoint", "reviews"),
            ("address", address),
            ("limit", limit.as_str()),
        ])
        .await
    }

    /// Card for the configured default address
    pub async fn fetch_default_card(&self) -> Result<ReputationCard, ClientError> {
        self.fetch_card(&self.config.default_address).await
    }

    /// Normalize locally, then fetch reputation and reviews in parallel
    pub async fn fetch_card(&self, address: &str) -> Result<ReputationCard, ClientError> {
        let raw = address::normalize(address)?.to_string();

        let reputation = self.reputation(&raw);
        let (reputation, reviews) = if self.config.show_reviews {
            let reviews = self.reviews(&raw, self.config.review_limit);
            let (reputation, reviews) = futures::future::try_join(reputation, reviews).await?;
            (reputation, Some(reviews))
        } else {
            (reputation.await?, None)
        };

        Ok(ReputationCard::build(reputation, reviews))
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, ClientError> {
        let mut url = self.api_url.clone();
        url.query_pairs_mut().extend_pairs(params);

        debug!(url = %url, "Fetching");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        // Error answers carry the envelope too; prefer its message
        match serde_json::from_slice::<ApiResponse<T>>(&body) {
            Ok(envelope) if envelope.success => match envelope.data {
                Some(data) => Ok(data),
                None => Err(ClientError::Api("Empty response".to_string())),
            },
            Ok(envelope) => Err(ClientError::Api(
                envelope.error.unwrap_or_else(|| "Request failed".to_string()),
            )),
            Err(e) if status.is_success() => {
                warn!(error = %e, "Unexpected response body");
                Err(ClientError::Api("Malformed response".to_string()))
            }
            Err(_) => Err(ClientError::Status(status.as_u16())),
        }
    }
}
