use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderAvailableEvent, RiderAssignedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub rider_assigned_producer: Vec<EventProducer<RiderAssignedEvent>>,
    pub order_available_producer: Vec<EventProducer<OrderAvailableEvent>>,
}

pub struct EventHandlers {
    pub on_rider_assigned: Option<EventHandler<RiderAssignedEvent>>,
    pub on_order_available: Option<EventHandler<OrderAvailableEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_rider_assigned = hooks.on_rider_assigned.map(|f| EventHandler::new(buffer_size, f));
        let on_order_available = hooks.on_order_available.map(|f| EventHandler::new(buffer_size, f));
        Self { on_rider_assigned, on_order_available }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_rider_assigned {
            result.rider_assigned_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_available {
            result.order_available_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_rider_assigned {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_available {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_rider_assigned: Option<Handler<RiderAssignedEvent>>,
    pub on_order_available: Option<Handler<OrderAvailableEvent>>,
}

impl EventHooks {
    pub fn on_rider_assigned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RiderAssignedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_rider_assigned = Some(Arc::new(f));
        self
    }

    pub fn on_order_available<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderAvailableEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_available = Some(Arc::new(f));
        self
    }
}
