use log::trace;

use crate::{
    db_types::{Rider, RiderId, Vendor, VendorId},
    geo::{nearby_vendors, Coordinates, VendorMatch},
    traits::{DispatchError, FleetManagement},
};

/// Thin read API over riders and vendors, including the proximity search.
#[derive(Debug, Clone)]
pub struct FleetApi<B> {
    db: B,
}

impl<B> FleetApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> FleetApi<B>
where B: FleetManagement
{
    /// Vendors within range of `origin`, nearest first. Takes a point-in-time snapshot of active
    /// vendor locations; the result carries no guarantee beyond the moment of the read.
    pub async fn vendors_near(
        &self,
        origin: Coordinates,
        radius_km: Option<f64>,
    ) -> Result<Vec<VendorMatch>, DispatchError> {
        let snapshot = self.db.active_vendor_locations().await?;
        let matches = nearby_vendors(origin, radius_km, &snapshot);
        trace!("🧭️ Proximity search matched {} of {} active vendors", matches.len(), snapshot.len());
        Ok(matches)
    }

    pub async fn fetch_rider(&self, rider_id: &RiderId) -> Result<Option<Rider>, DispatchError> {
        self.db.fetch_rider(rider_id).await
    }

    pub async fn fetch_vendor(&self, vendor_id: &VendorId) -> Result<Option<Vendor>, DispatchError> {
        self.db.fetch_vendor(vendor_id).await
    }
}
