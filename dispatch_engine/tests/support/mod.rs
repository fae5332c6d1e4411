use dispatch_common::Money;
use dispatch_engine::{
    db_types::{NewOrder, NewRider, NewVendor, OrderId, OrderStatusType, RiderId, VendorId},
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

/// Creates a fresh, fully migrated database at a random path and returns a handle to it.
pub async fn new_test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/dispatch_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 25).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    db
}

pub async fn seed_vendor(db: &SqliteDatabase, id: &str) {
    db.insert_vendor(NewVendor::new(VendorId::from(id), &format!("Vendor {id}")).at(13.75, 100.5))
        .await
        .expect("Error seeding vendor");
}

pub async fn seed_rider(db: &SqliteDatabase, id: &str, vendor: Option<&str>) {
    let rider = NewRider {
        id: RiderId::from(id),
        name: format!("Rider {id}"),
        phone: Some(format!("+66-000-{id}")),
        vendor_id: vendor.map(VendorId::from),
        is_active: true,
    };
    db.insert_rider(rider).await.expect("Error seeding rider");
}

/// Inserts a `Ready` order with one line item per vendor in `vendors`.
pub async fn seed_ready_order(db: &SqliteDatabase, number: &str, vendors: &[&str]) -> i64 {
    let mut order = NewOrder::new(OrderId(number.into()), format!("cust-{number}"), Money::from(45_000))
        .with_status(OrderStatusType::Ready)
        .with_address("14 Soi Sukhumvit 11", None, "Bangkok", "10110");
    for (i, vendor) in vendors.iter().enumerate() {
        order = order.with_item(VendorId::from(*vendor), &format!("prod-{i}"), 1, Money::from(15_000));
    }
    let order = db.insert_order(order).await.expect("Error seeding order");
    order.id
}
