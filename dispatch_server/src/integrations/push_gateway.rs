//! Wires the engine's dispatch events to the rider push gateway.
//!
//! Delivery is strictly best-effort. A gateway failure is logged and dropped; it never reaches
//! the dispatch caller, and it never rolls back an assignment.
use courier_tools::{AssignmentConfirmedPush, OrderAvailablePush, PushApi, PushGatewayConfig};
use dispatch_engine::events::{EventHooks, OrderAvailableEvent, RiderAssignedEvent};
use log::*;

use crate::errors::ServerError;

/// Installs the order-available and rider-assigned push hooks on `hooks`.
pub fn configure_push_hooks(hooks: &mut EventHooks, config: PushGatewayConfig) -> Result<(), ServerError> {
    let api = PushApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let available_api = api.clone();
    hooks.on_order_available(move |event: OrderAvailableEvent| {
        let api = available_api.clone();
        Box::pin(async move {
            let rider_id = event.rider_id.as_str().to_string();
            let payload = OrderAvailablePush {
                order_number: event.order.order_number.as_str().to_string(),
                total_price: event.order.total_price,
                currency: event.order.currency.clone(),
                pickup_city: event.order.city.clone(),
                dropoff_lines: event.order.address_lines(),
            };
            if let Err(e) = api.push_order_available(&rider_id, payload).await {
                warn!("📬️ Could not push order-available for [{}] to rider {rider_id}. {e}", event.order.order_number);
            }
        })
    });
    let assigned_api = api;
    hooks.on_rider_assigned(move |event: RiderAssignedEvent| {
        let api = assigned_api.clone();
        Box::pin(async move {
            let rider_id = event.rider.id.as_str().to_string();
            let payload = AssignmentConfirmedPush {
                order_number: event.order.order_number.as_str().to_string(),
                rider_name: event.rider.name.clone(),
                total_price: event.order.total_price,
                currency: event.order.currency.clone(),
                dropoff_lines: event.order.address_lines(),
            };
            if let Err(e) = api.push_assignment_confirmed(&rider_id, payload).await {
                warn!(
                    "📬️ Could not push assignment-confirmed for [{}] to rider {rider_id}. {e}",
                    event.order.order_number
                );
            }
        })
    });
    Ok(())
}
