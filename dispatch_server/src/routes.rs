//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) should be expressed as futures or asynchronous functions. Async handlers get executed
//! concurrently by worker threads and thus don't block execution.
use actix_web::{get, web, HttpResponse, Responder};
use dispatch_engine::{
    db_types::{OrderId, RiderId},
    geo::Coordinates,
    traits::{DispatchDatabase, FleetManagement, Pagination},
    DispatchFlowApi,
    FleetApi,
};
use log::*;

use crate::{
    data_objects::{AcceptOrderParams, NearbyVendorsQuery, RejectOrderParams},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Proximity  ----------------------------------------------------
route!(nearby_vendors => Get "/vendors/nearby" impl FleetManagement);
/// Route handler for the vendor proximity search.
///
/// Returns the active vendors within range of the given point, nearest first, with display
/// distances in km. `radius` is optional; the search is permissive, so a vendor whose own service
/// radius covers the point is returned even when `radius` does not reach it.
pub async fn nearby_vendors<B: FleetManagement>(
    query: web::Query<NearbyVendorsQuery>,
    api: web::Data<FleetApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    debug!("💻️ GET vendors/nearby ({}, {})", query.lat, query.lon);
    let origin = Coordinates::new(query.lat, query.lon);
    let matches = api.vendors_near(origin, query.radius).await?;
    Ok(HttpResponse::Ok().json(matches))
}

//----------------------------------------------   Rider queries  ----------------------------------------------------
route!(rider_orders => Get "/riders/{rider_id}/orders" impl DispatchDatabase);
/// The rider's eligible-order listing. Non-authoritative: anything listed here can be claimed by
/// another rider before this one acts.
pub async fn rider_orders<B: DispatchDatabase>(
    path: web::Path<String>,
    query: web::Query<Pagination>,
    api: web::Data<DispatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let rider_id = RiderId::from(path.into_inner());
    debug!("💻️ GET orders for rider {rider_id}");
    let available = api.available_orders(&rider_id, &query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(available))
}

route!(order_by_id => Get "/orders/{order_id}" impl DispatchDatabase);
pub async fn order_by_id<B: DispatchDatabase>(
    path: web::Path<String>,
    api: web::Data<DispatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ GET order [{order_id}]");
    match api.fetch_order(&order_id).await? {
        Some((order, items)) => Ok(HttpResponse::Ok().json(serde_json::json!({ "order": order, "items": items }))),
        None => Err(ServerError::NoRecordFound(format!("Order [{order_id}] does not exist"))),
    }
}

//----------------------------------------------   Dispatch flow  ----------------------------------------------------
route!(broadcast_order => Post "/orders/{order_id}/broadcast" impl DispatchDatabase);
/// Broadcasts a `Ready` order to every eligible rider. Idempotent; repeat calls report zero new
/// riders and notify no-one.
pub async fn broadcast_order<B: DispatchDatabase>(
    path: web::Path<String>,
    api: web::Data<DispatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    debug!("💻️ POST broadcast for order [{order_id}]");
    let result = api.broadcast_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(accept_order => Post "/orders/{order_id}/accept" impl DispatchDatabase);
/// Route handler for a rider accepting an order.
///
/// Exactly one rider ever wins a given order. Losers receive a 409 whose body distinguishes
/// `already_assigned` (naming the winner) from `no_longer_ready`; rider apps should treat both as
/// "move on", not as failures.
pub async fn accept_order<B: DispatchDatabase>(
    path: web::Path<String>,
    body: web::Json<AcceptOrderParams>,
    api: web::Data<DispatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let rider_id = RiderId::from(body.into_inner().rider_id);
    debug!("💻️ POST accept for order [{order_id}] by rider {rider_id}");
    let accepted = api.accept_order(&rider_id, &order_id).await?;
    Ok(HttpResponse::Ok().json(accepted))
}

route!(reject_order => Post "/orders/{order_id}/reject" impl DispatchDatabase);
/// Marks the rider's own pending request as rejected. Affects nothing but that one row.
pub async fn reject_order<B: DispatchDatabase>(
    path: web::Path<String>,
    body: web::Json<RejectOrderParams>,
    api: web::Data<DispatchFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let params = body.into_inner();
    let rider_id = RiderId::from(params.rider_id);
    debug!("💻️ POST reject for order [{order_id}] by rider {rider_id}");
    let request = api.reject_order(&rider_id, &order_id, params.reason).await?;
    Ok(HttpResponse::Ok().json(request))
}
