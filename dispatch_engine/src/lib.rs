//! Dispatch Engine
//!
//! The dispatch engine is the core of the delivery marketplace backend: it decides which riders
//! are eligible for a ready order, broadcasts the order to them, and resolves the race among
//! riders accepting the same order concurrently so that exactly one ever wins.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly. Instead, use the public API provided by
//!    the engine. The exception is the data types used in the database, defined in the `db_types`
//!    module, which are public.
//! 2. The dispatch engine public API ([`mod@dispatch_api`]): broadcasting, acceptance, rejection
//!    and the rider- and customer-facing queries. Backends implement the traits in [`mod@traits`]
//!    to drive it; correctness rests on the backend's atomic conditional update, not on any
//!    in-process locking.
//! 3. Vendor proximity matching ([`mod@geo`]): a pure haversine radius search that determines
//!    which vendors (and hence which riders) are in range of a customer.
//!
//! The engine also provides a set of events that can be subscribed to. These are emitted when a
//! ready order is broadcast and when a rider wins an order, and they are strictly
//! fire-and-forget: notification delivery can never block or roll back a dispatch decision.
pub mod db_types;
pub mod dispatch_api;
pub mod events;
pub mod geo;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use dispatch_api::{DispatchFlowApi, FleetApi};
pub use traits::{DispatchDatabase, DispatchError, FleetManagement};
