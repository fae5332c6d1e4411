//! Vendor proximity matching.
//!
//! A pure, deterministic radius search over a snapshot of vendor locations. Distances are
//! great-circle (haversine) distances in km. The search is permissive: a vendor is in range if it
//! lies within *either* the caller's requested radius or the vendor's own declared service radius.
//! Staleness between the snapshot read and later use is the caller's concern.
use serde::{Deserialize, Serialize};

use crate::db_types::VendorId;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Radius applied when the caller does not request one.
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 10.0;
/// Service radius applied to vendors that have not declared one.
pub const DEFAULT_SERVICE_RADIUS_KM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A vendor location snapshot, as read from the store. Vendors without a complete coordinate pair
/// never reach the matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorLocation {
    pub vendor_id: VendorId,
    pub name: String,
    pub position: Coordinates,
    pub service_radius_km: Option<f64>,
}

/// A vendor that matched a proximity search, annotated with its distance from the origin.
/// `distance_km` is rounded to 2 decimal places for display; the unrounded value was used for the
/// threshold comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorMatch {
    pub vendor_id: VendorId,
    pub name: String,
    pub position: Coordinates,
    pub distance_km: f64,
}

/// Great-circle distance between two coordinates in km, via the haversine formula.
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Returns the vendors within range of `origin`, ordered by ascending distance. Ties preserve the
/// input order. `radius_km` falls back to [`DEFAULT_SEARCH_RADIUS_KM`] when `None`.
pub fn nearby_vendors(origin: Coordinates, radius_km: Option<f64>, vendors: &[VendorLocation]) -> Vec<VendorMatch> {
    let radius = radius_km.unwrap_or(DEFAULT_SEARCH_RADIUS_KM);
    let mut matches = vendors
        .iter()
        .filter_map(|v| {
            let distance = haversine_distance(origin, v.position);
            let service_radius = v.service_radius_km.unwrap_or(DEFAULT_SERVICE_RADIUS_KM);
            (distance <= radius.max(service_radius)).then(|| VendorMatch {
                vendor_id: v.vendor_id.clone(),
                name: v.name.clone(),
                position: v.position,
                distance_km: distance,
            })
        })
        .collect::<Vec<VendorMatch>>();
    // sort_by is stable, so equidistant vendors keep their snapshot order
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    for m in &mut matches {
        m.distance_km = (m.distance_km * 100.0).round() / 100.0;
    }
    matches
}

#[cfg(test)]
mod test {
    use super::*;

    fn vendor(id: &str, lat: f64, lon: f64, service_radius: Option<f64>) -> VendorLocation {
        VendorLocation {
            vendor_id: VendorId::from(id),
            name: id.to_string(),
            position: Coordinates::new(lat, lon),
            service_radius_km: service_radius,
        }
    }

    #[test]
    fn haversine_known_distances() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere
        let d = haversine_distance(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.05, "got {d}");
        let zero = haversine_distance(Coordinates::new(13.75, 100.5), Coordinates::new(13.75, 100.5));
        assert!(zero.abs() < 1e-9);
    }

    #[test]
    fn vendor_in_range_via_either_radius() {
        // ~9.9 km east of the origin, with a 5 km service radius
        let vendors = vec![vendor("v1", 0.0, 0.089, Some(5.0))];
        let origin = Coordinates::new(0.0, 0.0);

        // requested radius covers it
        let found = nearby_vendors(origin, Some(10.0), &vendors);
        assert_eq!(found.len(), 1);

        // requested radius too small, but a large service radius still admits it
        let vendors = vec![vendor("v1", 0.0, 0.089, Some(15.0))];
        let found = nearby_vendors(origin, Some(5.0), &vendors);
        assert_eq!(found.len(), 1);

        // neither radius reaches
        let vendors = vec![vendor("v1", 0.0, 0.089, Some(5.0))];
        let found = nearby_vendors(origin, Some(5.0), &vendors);
        assert!(found.is_empty());
    }

    #[test]
    fn default_radii_apply() {
        // ~9.9 km away; the default search radius (10 km) reaches it
        let vendors = vec![vendor("v1", 0.0, 0.089, None)];
        let found = nearby_vendors(Coordinates::new(0.0, 0.0), None, &vendors);
        assert_eq!(found.len(), 1);

        // ~11.3 km away; neither the default search radius nor the default 5 km service radius reaches
        let vendors = vec![vendor("v1", 0.0, 0.102, None)];
        let found = nearby_vendors(Coordinates::new(0.0, 0.0), None, &vendors);
        assert!(found.is_empty());
    }

    #[test]
    fn ordered_by_distance_with_stable_ties() {
        let vendors = vec![
            vendor("far", 0.0, 0.05, None),
            vendor("tie_a", 0.0, 0.02, None),
            vendor("near", 0.01, 0.0, None),
            vendor("tie_b", 0.0, -0.02, None),
        ];
        let found = nearby_vendors(Coordinates::new(0.0, 0.0), Some(10.0), &vendors);
        let ids = found.iter().map(|m| m.vendor_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["near", "tie_a", "tie_b", "far"]);
    }

    #[test]
    fn display_distance_is_rounded() {
        let vendors = vec![vendor("v1", 0.0, 0.089, None)];
        let found = nearby_vendors(Coordinates::new(0.0, 0.0), Some(10.0), &vendors);
        let d = found[0].distance_km;
        assert_eq!((d * 100.0).round() / 100.0, d);
        assert!((d - 9.9).abs() < 0.02, "got {d}");
    }
}
