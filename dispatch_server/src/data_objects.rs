use serde::{Deserialize, Serialize};

/// Body of `POST /api/orders/{order_id}/accept`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptOrderParams {
    pub rider_id: String,
}

/// Body of `POST /api/orders/{order_id}/reject`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectOrderParams {
    pub rider_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query string of `GET /api/vendors/nearby`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyVendorsQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub radius: Option<f64>,
}
