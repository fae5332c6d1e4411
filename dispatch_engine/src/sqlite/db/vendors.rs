use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{NewVendor, Vendor, VendorId},
    geo::{Coordinates, VendorLocation},
    traits::DispatchError,
};

pub async fn insert_vendor(vendor: NewVendor, conn: &mut SqliteConnection) -> Result<Vendor, DispatchError> {
    let vendor = sqlx::query_as(
        "INSERT INTO vendors (id, name, latitude, longitude, service_radius_km, is_active) VALUES ($1, $2, $3, $4, \
         $5, $6) RETURNING *",
    )
    .bind(vendor.id)
    .bind(vendor.name)
    .bind(vendor.latitude)
    .bind(vendor.longitude)
    .bind(vendor.service_radius_km)
    .bind(vendor.is_active)
    .fetch_one(conn)
    .await?;
    Ok(vendor)
}

pub async fn fetch_vendor(vendor_id: &VendorId, conn: &mut SqliteConnection) -> Result<Option<Vendor>, sqlx::Error> {
    let vendor =
        sqlx::query_as("SELECT * FROM vendors WHERE id = $1").bind(vendor_id.as_str()).fetch_optional(conn).await?;
    Ok(vendor)
}

#[derive(Debug, Clone, FromRow)]
struct VendorLocationRow {
    id: VendorId,
    name: String,
    latitude: f64,
    longitude: f64,
    service_radius_km: Option<f64>,
}

/// Every active vendor with a complete coordinate pair, as matcher input. Vendors missing either
/// coordinate are filtered out here, not in the matcher.
pub async fn active_vendor_locations(conn: &mut SqliteConnection) -> Result<Vec<VendorLocation>, sqlx::Error> {
    let rows: Vec<VendorLocationRow> = sqlx::query_as(
        "SELECT id, name, latitude, longitude, service_radius_km FROM vendors WHERE is_active = 1 AND latitude IS \
         NOT NULL AND longitude IS NOT NULL ORDER BY id",
    )
    .fetch_all(conn)
    .await?;
    let locations = rows
        .into_iter()
        .map(|r| VendorLocation {
            vendor_id: r.id,
            name: r.name,
            position: Coordinates::new(r.latitude, r.longitude),
            service_radius_km: r.service_radius_km,
        })
        .collect();
    Ok(locations)
}
