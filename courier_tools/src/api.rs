use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::PushGatewayConfig,
    data_objects::{AssignmentConfirmedPush, OrderAvailablePush, PushReceipt},
    PushApiError,
};

/// A thin client for the rider push gateway. One instance can be shared freely; the underlying
/// HTTP client is reference counted.
#[derive(Clone)]
pub struct PushApi {
    config: PushGatewayConfig,
    client: Arc<Client>,
}

impl PushApi {
    pub fn new(config: PushGatewayConfig) -> Result<Self, PushApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| PushApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PushApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PushApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PushApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PushApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PushApiError::RestResponseError(e.to_string()))?;
            Err(PushApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}/v1/apps/{}{path}", self.config.gateway_host, self.config.app_id)
    }

    /// Tells `rider_id` that an order is up for grabs.
    pub async fn push_order_available(
        &self,
        rider_id: &str,
        payload: OrderAvailablePush,
    ) -> Result<PushReceipt, PushApiError> {
        #[derive(Deserialize)]
        struct PushResponse {
            receipt: PushReceipt,
        }
        let path = format!("/riders/{rider_id}/notifications");
        let body = serde_json::json!({
            "kind": "order_available",
            "payload": payload,
        });
        debug!("Pushing order-available for [{}] to rider {rider_id}", payload.order_number);
        let result = self.rest_query::<PushResponse, serde_json::Value>(Method::POST, &path, Some(body)).await?;
        info!("Pushed order-available for [{}] to rider {rider_id}", payload.order_number);
        Ok(result.receipt)
    }

    /// Confirms to the winning rider that the order is theirs.
    pub async fn push_assignment_confirmed(
        &self,
        rider_id: &str,
        payload: AssignmentConfirmedPush,
    ) -> Result<PushReceipt, PushApiError> {
        #[derive(Deserialize)]
        struct PushResponse {
            receipt: PushReceipt,
        }
        let path = format!("/riders/{rider_id}/notifications");
        let body = serde_json::json!({
            "kind": "assignment_confirmed",
            "payload": payload,
        });
        debug!("Pushing assignment-confirmed for [{}] to rider {rider_id}", payload.order_number);
        let result = self.rest_query::<PushResponse, serde_json::Value>(Method::POST, &path, Some(body)).await?;
        info!("Pushed assignment-confirmed for [{}] to rider {rider_id}", payload.order_number);
        Ok(result.receipt)
    }
}
