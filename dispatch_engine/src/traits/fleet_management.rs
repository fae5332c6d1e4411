use crate::{
    db_types::{Rider, RiderId, Vendor, VendorId},
    geo::VendorLocation,
    traits::DispatchError,
};

/// Read-only lookups over riders and vendors. These have no authority over dispatch state; they
/// feed the broadcaster's candidate set and the proximity matcher's vendor snapshot.
#[allow(async_fn_in_trait)]
pub trait FleetManagement: Clone {
    /// Fetches a single rider by id.
    async fn fetch_rider(&self, rider_id: &RiderId) -> Result<Option<Rider>, DispatchError>;

    /// Fetches a single vendor by id.
    async fn fetch_vendor(&self, vendor_id: &VendorId) -> Result<Option<Vendor>, DispatchError>;

    /// Fetches the active riders affiliated with any of the given vendors.
    async fn active_riders_for_vendors(&self, vendor_ids: &[VendorId]) -> Result<Vec<Rider>, DispatchError>;

    /// A snapshot of every active vendor that has a complete coordinate pair, in a form the
    /// proximity matcher consumes directly.
    async fn active_vendor_locations(&self) -> Result<Vec<VendorLocation>, DispatchError>;
}
