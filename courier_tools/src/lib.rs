mod api;
mod config;
mod error;

mod data_objects;

pub use api::PushApi;
pub use config::PushGatewayConfig;
pub use data_objects::{AssignmentConfirmedPush, OrderAvailablePush, PushReceipt};
pub use error::PushApiError;
