//! The behaviour contracts for dispatch engine backends.
//!
//! Any store that can provide an atomic conditional update over a single order row can back the
//! engine; [`SqliteDatabase`](crate::SqliteDatabase) is the shipped implementation. The traits are
//! deliberately split: [`DispatchDatabase`] owns the concurrency-critical dispatch flow, while
//! [`FleetManagement`] is plain read-only lookups over riders and vendors.
pub mod data_objects;
mod dispatch_database;
mod fleet_management;

pub use data_objects::{AcceptedOrder, AvailableOrders, BroadcastResult, Pagination, RiderProfile, SweepResult};
pub use dispatch_database::{DispatchDatabase, DispatchError};
pub use fleet_management::FleetManagement;
