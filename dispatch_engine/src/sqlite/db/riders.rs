use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewRider, Rider, RiderId, VendorId},
    traits::DispatchError,
};

pub async fn insert_rider(rider: NewRider, conn: &mut SqliteConnection) -> Result<Rider, DispatchError> {
    let rider = sqlx::query_as(
        "INSERT INTO riders (id, name, phone, vendor_id, is_active) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(rider.id)
    .bind(rider.name)
    .bind(rider.phone)
    .bind(rider.vendor_id)
    .bind(rider.is_active)
    .fetch_one(conn)
    .await?;
    Ok(rider)
}

pub async fn fetch_rider(rider_id: &RiderId, conn: &mut SqliteConnection) -> Result<Option<Rider>, sqlx::Error> {
    let rider =
        sqlx::query_as("SELECT * FROM riders WHERE id = $1").bind(rider_id.as_str()).fetch_optional(conn).await?;
    Ok(rider)
}

/// Active riders affiliated with any of the given vendors, in id order for determinism.
pub async fn active_riders_for_vendors(
    vendor_ids: &[VendorId],
    conn: &mut SqliteConnection,
) -> Result<Vec<Rider>, sqlx::Error> {
    if vendor_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM riders WHERE is_active = 1 AND vendor_id IN (");
    let mut in_clause = builder.separated(", ");
    for vendor_id in vendor_ids {
        in_clause.push_bind(vendor_id.as_str());
    }
    builder.push(") ORDER BY id");
    let riders = builder.build_query_as::<Rider>().fetch_all(conn).await?;
    Ok(riders)
}
