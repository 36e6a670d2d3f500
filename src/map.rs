//! Map projection: turns listings into a render plan the client-side map
//! surface can draw without touching domain types.
//!
//! The plan is markers plus one viewport instruction. Tile rendering, zoom and
//! pan interaction, and popup display belong to the map surface itself.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::districts::CITY_CENTER;
use crate::models::{Id, Listing, ListingKind};

/// Zoom used when a single listing is centered.
pub const CLOSE_ZOOM: u8 = 14;
/// Zoom used for the city-wide fallback view.
pub const OVERVIEW_ZOOM: u8 = 11;
/// Pixel margin applied when fitting a bounding box.
pub const FIT_PADDING_PX: u32 = 50;

/// Marker glyph category. Derived solely from the listing type; the mapping is
/// total because the type enum is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MarkerGlyph {
    House,
    Land,
}

impl From<ListingKind> for MarkerGlyph {
    fn from(kind: ListingKind) -> Self {
        match kind {
            ListingKind::House => MarkerGlyph::House,
            ListingKind::Land => MarkerGlyph::Land,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPopup {
    pub title: String,
    pub district: String,
    /// "House" / "Land" badge; multi-listing mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind_label: Option<String>,
    /// Featured badge; multi-listing mode only, omitted when not featured.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub featured: bool,
    /// Pre-formatted price ("₦450M"); multi-listing mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Secondary stat: bedroom count for houses, land size for land,
    /// whichever is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MarkerPopup {
    /// Minimal popup used when one listing is already in focus.
    fn brief(listing: &Listing) -> Self {
        MarkerPopup {
            title: listing.title.clone(),
            district: listing.district.clone(),
            kind_label: None,
            featured: false,
            price: None,
            detail: None,
        }
    }

    /// Full popup used on the browse map, where the marker is the listing's
    /// only representation.
    fn detailed(listing: &Listing) -> Self {
        MarkerPopup {
            title: listing.title.clone(),
            district: listing.district.clone(),
            kind_label: Some(
                match listing.kind {
                    ListingKind::House => "House",
                    ListingKind::Land => "Land",
                }
                .to_string(),
            ),
            featured: listing.featured,
            price: Some(format_price(listing.price)),
            detail: secondary_stat(listing),
        }
    }
}

fn secondary_stat(listing: &Listing) -> Option<String> {
    let bedrooms = listing.bedrooms.map(|n| format!("{n} Bedrooms"));
    let land_size = listing
        .land_size
        .map(|n| format!("{} sqm", group_digits(i64::from(n))));
    match listing.kind {
        ListingKind::House => bedrooms.or(land_size),
        ListingKind::Land => land_size.or(bedrooms),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub listing_id: Id,
    pub latitude: f64,
    pub longitude: f64,
    pub glyph: MarkerGlyph,
    pub popup: MarkerPopup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Viewport {
    #[serde(rename_all = "camelCase")]
    Center { latitude: f64, longitude: f64, zoom: u8 },
    /// Bounding box the surface should fit, with a pixel padding margin.
    #[serde(rename_all = "camelCase")]
    Fit {
        south: f64,
        west: f64,
        north: f64,
        east: f64,
        padding: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub markers: Vec<Marker>,
    pub viewport: Viewport,
}

fn marker(listing: &Listing, popup: MarkerPopup) -> Marker {
    Marker {
        listing_id: listing.id,
        latitude: listing.latitude,
        longitude: listing.longitude,
        glyph: listing.kind.into(),
        popup,
    }
}

/// Plan for a detail page: one marker, close zoom, brief popup.
pub fn plan_for_listing(listing: &Listing) -> RenderPlan {
    RenderPlan {
        markers: vec![marker(listing, MarkerPopup::brief(listing))],
        viewport: Viewport::Center {
            latitude: listing.latitude,
            longitude: listing.longitude,
            zoom: CLOSE_ZOOM,
        },
    }
}

/// Plan for the browse map. Out-of-range coordinates are passed through as-is;
/// coordinate sanity belongs to the admin mutation path.
pub fn build_map_plan(listings: &[Listing]) -> RenderPlan {
    let markers = listings
        .iter()
        .map(|l| marker(l, MarkerPopup::detailed(l)))
        .collect();
    let viewport = match listings {
        [] => Viewport::Center {
            latitude: CITY_CENTER.0,
            longitude: CITY_CENTER.1,
            zoom: OVERVIEW_ZOOM,
        },
        [only] => Viewport::Center {
            latitude: only.latitude,
            longitude: only.longitude,
            zoom: CLOSE_ZOOM,
        },
        many => {
            let mut south = f64::INFINITY;
            let mut west = f64::INFINITY;
            let mut north = f64::NEG_INFINITY;
            let mut east = f64::NEG_INFINITY;
            for l in many {
                south = south.min(l.latitude);
                north = north.max(l.latitude);
                west = west.min(l.longitude);
                east = east.max(l.longitude);
            }
            Viewport::Fit { south, west, north, east, padding: FIT_PADDING_PX }
        }
    };
    RenderPlan { markers, viewport }
}

/// Format a naira amount the way the site displays prices: billions to one
/// decimal, millions to a whole number, anything smaller with grouped digits.
/// Pure and locale-independent.
pub fn format_price(price: i64) -> String {
    if price >= 1_000_000_000 {
        format!("₦{:.1}B", price as f64 / 1e9)
    } else if price >= 1_000_000 {
        format!("₦{}M", (price as f64 / 1e6).round() as i64)
    } else {
        format!("₦{}", group_digits(price))
    }
}

fn group_digits(value: i64) -> String {
    let raw = value.to_string();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{sign}{out}")
}
