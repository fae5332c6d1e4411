use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use dispatch_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    DispatchFlowApi,
    FleetApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::push_gateway::configure_push_hooks,
    routes::{
        health,
        AcceptOrderRoute,
        BroadcastOrderRoute,
        NearbyVendorsRoute,
        OrderByIdRoute,
        RejectOrderRoute,
        RiderOrdersRoute,
    },
    sweep_worker::start_sweep_worker,
};

const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut hooks = EventHooks::default();
    if let Some(push_config) = config.push_config.clone() {
        configure_push_hooks(&mut hooks, push_config)?;
        info!("📬️ Rider push notifications enabled");
    }
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if let Some(older_than) = config.pending_request_timeout {
        start_sweep_worker(db.clone(), producers.clone(), older_than, config.sweep_interval_secs);
    }
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let dispatch_api = DispatchFlowApi::new(db.clone(), producers.clone());
        let fleet_api = FleetApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(NearbyVendorsRoute::<SqliteDatabase>::new())
            .service(RiderOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(BroadcastOrderRoute::<SqliteDatabase>::new())
            .service(AcceptOrderRoute::<SqliteDatabase>::new())
            .service(RejectOrderRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("dds::access_log"))
            .app_data(web::Data::new(dispatch_api))
            .app_data(web::Data::new(fleet_api))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
