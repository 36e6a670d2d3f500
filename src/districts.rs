//! Static directory of Abuja districts.
//!
//! Loaded once at process start, enumerable in fixed display order, queryable
//! by exact name. No component infers district membership from coordinates;
//! the relationship is one-directional and purely nominal.

use once_cell::sync::Lazy;

use crate::models::District;

/// Nominal centroid of Abuja, used as the map fallback and as the last-resort
/// default coordinate for admin-created listings.
pub const CITY_CENTER: (f64, f64) = (9.0579, 7.4951);

pub static DISTRICTS: Lazy<Vec<District>> = Lazy::new(|| {
    [
        ("maitama", "Maitama", "Diplomatic and high-end residential area", 9.0820, 7.4878),
        ("asokoro", "Asokoro", "Exclusive residential district near Aso Rock", 9.0406, 7.5149),
        ("wuse2", "Wuse II", "Vibrant commercial and residential hub", 9.0677, 7.4626),
        ("jabi", "Jabi", "Modern district with Jabi Lake", 9.0736, 7.4237),
        ("gwarinpa", "Gwarinpa", "Africa's largest housing estate", 9.1019, 7.3925),
        ("katampe", "Katampe", "Serene hillside residential area", 9.0892, 7.4456),
        ("lifecamp", "Life Camp", "Growing residential and commercial zone", 9.0831, 7.3847),
        ("utako", "Utako", "Central business and residential district", 9.0582, 7.4419),
    ]
    .into_iter()
    .map(|(id, name, description, latitude, longitude)| District {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        latitude,
        longitude,
    })
    .collect()
});

/// All districts in display order.
pub fn all() -> &'static [District] {
    &DISTRICTS
}

/// Exact, case-sensitive name lookup.
pub fn by_name(name: &str) -> Option<&'static District> {
    DISTRICTS.iter().find(|d| d.name == name)
}

/// Coordinates for a listing: explicit values win; otherwise the district's
/// reference point; otherwise the city centroid.
pub fn resolve_coordinates(
    district: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> (f64, f64) {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => by_name(district)
            .map(|d| (d.latitude, d.longitude))
            .unwrap_or(CITY_CENTER),
    }
}
