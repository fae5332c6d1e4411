//! Endpoint tests against a real, throwaway SQLite store. Each test spins up an in-process actix
//! app wired exactly like the production server, minus the push hooks.
use actix_web::{test, web, App};
use dispatch_common::Money;
use dispatch_engine::{
    db_types::{NewOrder, NewRider, NewVendor, OrderId, OrderStatusType, RiderId, VendorId},
    events::EventProducers,
    test_utils::{prepare_test_env, random_db_path},
    DispatchFlowApi,
    FleetApi,
    SqliteDatabase,
};
use serde_json::Value;

use crate::routes::{
    health,
    AcceptOrderRoute,
    BroadcastOrderRoute,
    NearbyVendorsRoute,
    OrderByIdRoute,
    RejectOrderRoute,
    RiderOrdersRoute,
};

async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database")
}

async fn seed_fixtures(db: &SqliteDatabase) {
    db.insert_vendor(NewVendor::new(VendorId::from("vend-a"), "Vendor A").at(13.75, 100.5))
        .await
        .expect("Error seeding vendor");
    for id in ["r1", "r2"] {
        let rider = NewRider {
            id: RiderId::from(id),
            name: format!("Rider {id}"),
            phone: None,
            vendor_id: Some(VendorId::from("vend-a")),
            is_active: true,
        };
        db.insert_rider(rider).await.expect("Error seeding rider");
    }
    let order = NewOrder::new(OrderId("100".into()), "cust-100".into(), Money::from(30_000))
        .with_status(OrderStatusType::Ready)
        .with_address("14 Soi Sukhumvit 11", None, "Bangkok", "10110")
        .with_item(VendorId::from("vend-a"), "prod-1", 2, Money::from(15_000));
    db.insert_order(order).await.expect("Error seeding order");
}

macro_rules! test_app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(DispatchFlowApi::new($db.clone(), EventProducers::default())))
                .app_data(web::Data::new(FleetApi::new($db.clone())))
                .service(health)
                .service(
                    web::scope("/api")
                        .service(NearbyVendorsRoute::<SqliteDatabase>::new())
                        .service(RiderOrdersRoute::<SqliteDatabase>::new())
                        .service(OrderByIdRoute::<SqliteDatabase>::new())
                        .service(BroadcastOrderRoute::<SqliteDatabase>::new())
                        .service(AcceptOrderRoute::<SqliteDatabase>::new())
                        .service(RejectOrderRoute::<SqliteDatabase>::new()),
                ),
        )
        .await
    };
}

#[actix_web::test]
async fn health_check() {
    let db = new_test_db().await;
    let app = test_app!(db);
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn dispatch_flow_over_http() {
    let db = new_test_db().await;
    seed_fixtures(&db).await;
    let app = test_app!(db);

    // broadcast reaches both riders
    let req = test::TestRequest::post().uri("/api/orders/100/broadcast").to_request();
    let broadcast: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(broadcast["newly_added"].as_array().map(Vec::len), Some(2));

    // the order shows up in r1's listing
    let req = test::TestRequest::get().uri("/api/riders/r1/orders").to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing["orders"][0]["order_number"], "100");

    // the order detail includes its line items
    let req = test::TestRequest::get().uri("/api/orders/100").to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["order"]["order_number"], "100");
    assert_eq!(detail["items"].as_array().map(Vec::len), Some(1));

    // r1 accepts and wins
    let req = test::TestRequest::post()
        .uri("/api/orders/100/accept")
        .set_json(serde_json::json!({ "rider_id": "r1" }))
        .to_request();
    let accepted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(accepted["order"]["status"], "OutForDelivery");
    assert_eq!(accepted["rider"]["id"], "r1");

    // r2 loses with a machine-readable 409 naming the winner
    let req = test::TestRequest::post()
        .uri("/api/orders/100/accept")
        .set_json(serde_json::json!({ "rider_id": "r2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outcome"], "already_assigned");
    assert_eq!(body["winner"]["id"], "r1");

    // the claimed order has left the listing
    let req = test::TestRequest::get().uri("/api/riders/r2/orders").to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing["orders"].as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn reject_is_not_repeatable_over_http() {
    let db = new_test_db().await;
    seed_fixtures(&db).await;
    let app = test_app!(db);

    let req = test::TestRequest::post().uri("/api/orders/100/broadcast").to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/orders/100/reject")
        .set_json(serde_json::json!({ "rider_id": "r1", "reason": "too far" }))
        .to_request();
    let rejected: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rejected["status"], "Rejected");
    assert_eq!(rejected["rejection_reason"], "too far");

    // a second reject finds no pending request to act on
    let req = test::TestRequest::post()
        .uri("/api/orders/100/reject")
        .set_json(serde_json::json!({ "rider_id": "r1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 412);
}

#[actix_web::test]
async fn unknown_order_is_a_404() {
    let db = new_test_db().await;
    let app = test_app!(db);
    let req = test::TestRequest::get().uri("/api/orders/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);

    let req = test::TestRequest::post().uri("/api/orders/nope/broadcast").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_web::test]
async fn nearby_vendors_query() {
    let db = new_test_db().await;
    seed_fixtures(&db).await;
    let app = test_app!(db);

    let req = test::TestRequest::get().uri("/api/vendors/nearby?lat=13.75&lon=100.5").to_request();
    let matches: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(matches[0]["vendor_id"], "vend-a");
    assert_eq!(matches[0]["distance_km"], 0.0);

    // the far side of the city, outside every radius
    let req = test::TestRequest::get().uri("/api/vendors/nearby?lat=14.5&lon=101.5&radius=10").to_request();
    let matches: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(matches.as_array().map(Vec::len), Some(0));
}
