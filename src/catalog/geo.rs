//! Distance-based place lookup

use std::cmp::Ordering;

use crate::models::{Coordinates, Place};

/// Great-circle distance in kilometers
#[must_use]
pub fn distance_km(from: &Coordinates, to: &Coordinates) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        haversine::Location {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        haversine::Units::Kilometers,
    )
}

/// Geographic search functionality
pub struct GeographicSearch;

impl GeographicSearch {
    /// Places within `radius_km` of `center`, closest first.
    ///
    /// Places without coordinates are skipped. Equal distances are ordered by name.
    #[must_use]
    pub fn places_within_radius<'a>(
        places: &'a [Place],
        center: &Coordinates,
        radius_km: f64,
        limit: usize,
    ) -> Vec<(&'a Place, f64)> {
        let mut results: Vec<(&Place, f64)> = places
            .iter()
            .filter_map(|place| {
                let coordinates = place.coordinates.as_ref()?;
                let distance = distance_km(center, coordinates);
                (distance <= radius_km).then_some((place, distance))
            })
            .collect();

        results.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.name.cmp(&b.0.name))
        });
        results.truncate(limit);
        results
    }
}
