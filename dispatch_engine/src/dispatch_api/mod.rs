pub mod dispatch_flow_api;
pub mod fleet_api;

pub use dispatch_flow_api::DispatchFlowApi;
pub use fleet_api::FleetApi;
