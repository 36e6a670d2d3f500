//! Predicate logic for the public listing search.
//!
//! The filter is a pure predicate, not a validating gate: criteria that match
//! nothing simply yield an empty result, never an error.

use crate::models::{Listing, ListingFilter, ListingStatus};

/// True when `listing` should appear in public results for `filter`.
///
/// Closed-out listings (sold/pending) never match, regardless of criteria.
/// Supplied criteria must all hold: exact type, case-insensitive district,
/// inclusive price bounds, exact bedroom count.
pub fn matches(listing: &Listing, filter: &ListingFilter) -> bool {
    if listing.status != ListingStatus::Available {
        return false;
    }
    if let Some(kind) = &filter.kind {
        if listing.kind.as_str() != kind.as_str() {
            return false;
        }
    }
    if let Some(district) = &filter.district {
        if !listing.district.eq_ignore_ascii_case(district) {
            return false;
        }
    }
    if let Some(min) = filter.min_price {
        if listing.price < min {
            return false;
        }
    }
    if let Some(max) = filter.max_price {
        if listing.price > max {
            return false;
        }
    }
    if let Some(bedrooms) = filter.bedrooms {
        if listing.bedrooms != Some(bedrooms) {
            return false;
        }
    }
    true
}

/// Apply `filter` to a collection, preserving its order.
pub fn apply(listings: Vec<Listing>, filter: &ListingFilter) -> Vec<Listing> {
    listings.into_iter().filter(|l| matches(l, filter)).collect()
}

/// Parse a `"<min>-<max>"` price range as used by the search form.
///
/// Either side may be empty, meaning unbounded. Non-numeric bound text also
/// degrades to unbounded: the range comes from a select box, and a mangled
/// query string should widen the search rather than fail it.
pub fn parse_price_range(raw: &str) -> (Option<i64>, Option<i64>) {
    let (min, max) = match raw.split_once('-') {
        Some(parts) => parts,
        None => (raw, ""),
    };
    (parse_bound(min), parse_bound(max))
}

fn parse_bound(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}
