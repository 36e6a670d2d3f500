use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

pub type Id = Uuid;

/// Listing category. The enum is closed: every listing is exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Land,
    #[default]
    House,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Land => "land",
            ListingKind::House => "house",
        }
    }
}

impl std::str::FromStr for ListingKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "land" => Ok(ListingKind::Land),
            "house" => Ok(ListingKind::House),
            other => Err(format!("unknown listing type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Available,
    Sold,
    Pending,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Sold => "sold",
            ListingStatus::Pending => "pending",
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ListingStatus::Available),
            "sold" => Ok(ListingStatus::Sold),
            "pending" => Ok(ListingStatus::Pending),
            other => Err(format!("unknown listing status: {other}")),
        }
    }
}

/// A sub-unit of a multi-unit listing (a plot size or unit type within one
/// estate). Carries its own price and status; the parent price is advisory
/// ("starting from") whenever variations price themselves.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    #[serde(default = "Uuid::new_v4")]
    pub id: Id,
    pub name: String,
    pub price: Option<i64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub bq: Option<i32>,
    pub land_size: Option<i32>,
    pub units_available: Option<i32>,
    #[serde(default)]
    pub status: ListingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Id,
    pub title: String,
    pub description: String,
    /// Whole naira, never negative.
    pub price: i64,
    /// Free-text annotation such as "Per Plot".
    pub price_label: Option<String>,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    /// Advisory district name; not validated against the directory.
    pub district: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    /// Boys'-quarters room count.
    pub bq: Option<i32>,
    /// Plot size in square meters.
    pub land_size: Option<i32>,
    /// Ordered; first entry is the main image.
    pub images: Vec<String>,
    pub features: Vec<String>,
    #[serde(default)]
    pub variations: Vec<Variation>,
    pub status: ListingStatus,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub price_label: Option<String>,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub district: String,
    pub address: String,
    /// When absent, the district directory supplies reference coordinates.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub bq: Option<i32>,
    pub land_size: Option<i32>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub variations: Vec<Variation>,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default)]
    pub featured: bool,
}

impl NewListing {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title", "must not be empty"));
        }
        if self.district.trim().is_empty() {
            return Err(ApiError::validation("district", "must not be empty"));
        }
        if self.price < 0 {
            return Err(ApiError::validation("price", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub price_label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ListingKind>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub bq: Option<i32>,
    pub land_size: Option<i32>,
    pub images: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub variations: Option<Vec<Variation>>,
    pub status: Option<ListingStatus>,
    pub featured: Option<bool>,
}

/// Filter specification for the public listing surface. Every supplied
/// criterion must match; only available listings are ever considered.
///
/// The filter is a predicate, not a validator: `kind` and `district` stay raw
/// strings so that unknown values match nothing instead of failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    /// Exact match against "land"/"house".
    pub kind: Option<String>,
    /// Compared case-insensitively.
    pub district: Option<String>,
    /// Inclusive bounds; either side may be absent (unbounded).
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<i32>,
}

/// A named Abuja submarket with reference coordinates. Static; a listing's
/// membership in a district is purely nominal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    New,
    Contacted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for InquiryStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(InquiryStatus::New),
            "contacted" => Ok(InquiryStatus::Contacted),
            "closed" => Ok(InquiryStatus::Closed),
            other => Err(format!("unknown inquiry status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub listing_id: Option<Id>,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewInquiry {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub listing_id: Option<Id>,
}

impl NewInquiry {
    /// Field-level validation, performed once at the boundary. Every rejection
    /// names the offending field.
    pub fn validate(&self) -> Result<(), ApiError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::validation(field, "must not be empty"));
            }
        }
        if !email_shape_ok(&self.email) {
            return Err(ApiError::validation("email", "must look like local@domain.tld"));
        }
        Ok(())
    }
}

/// Accepts anything shaped like `local@domain.tld`. Deliverability is the mail
/// provider's problem, not ours.
fn email_shape_ok(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Id,
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    /// Ascending sort key for public display; ties break arbitrarily.
    pub display_order: i32,
    /// Soft-delete flag: inactive members are hidden from public views but
    /// retained in storage.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl NewTeamMember {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name", "must not be empty"));
        }
        if self.role.trim().is_empty() {
            return Err(ApiError::validation("role", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamMember {
    pub name: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Id,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    /// Rich HTML produced by the admin editor; opaque to this service.
    pub content: String,
    pub cover_image: Option<String>,
    pub author: String,
    pub status: PostStatus,
    /// Set exactly once, at the first draft -> published transition.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub status: PostStatus,
}

fn default_author() -> String {
    "Sabi Consults".to_string()
}

impl NewBlogPost {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title", "must not be empty"));
        }
        if self.slug.trim().is_empty() {
            return Err(ApiError::validation("slug", "must not be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(ApiError::validation("content", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPost {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub status: Option<PostStatus>,
}

/// Site-wide contact details shown on the public site. Stored as key/value
/// pairs; unset keys fall back to these defaults.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub whatsapp_number: String,
    pub phone_number: String,
    pub email: String,
    pub instagram_handle: String,
    pub address: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        SiteSettings {
            whatsapp_number: "2348000000000".to_string(),
            phone_number: "+234 800 000 0000".to_string(),
            email: "hello@sabiconsults.com".to_string(),
            instagram_handle: "sabi_consults".to_string(),
            address: "Abuja, Nigeria".to_string(),
        }
    }
}

impl SiteSettings {
    /// Merge stored key/value pairs over the defaults, ignoring unknown keys.
    pub fn from_pairs<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut settings = SiteSettings::default();
        for (key, value) in pairs {
            match key.as_str() {
                "whatsapp_number" => settings.whatsapp_number = value,
                "phone_number" => settings.phone_number = value,
                "email" => settings.email = value,
                "instagram_handle" => settings.instagram_handle = value,
                "address" => settings.address = value,
                _ => {}
            }
        }
        settings
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub whatsapp_number: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub instagram_handle: Option<String>,
    pub address: Option<String>,
}

impl SettingsUpdate {
    /// The (storage key, value) pairs actually supplied by this update.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(v) = &self.whatsapp_number {
            out.push(("whatsapp_number", v.clone()));
        }
        if let Some(v) = &self.phone_number {
            out.push(("phone_number", v.clone()));
        }
        if let Some(v) = &self.email {
            out.push(("email", v.clone()));
        }
        if let Some(v) = &self.instagram_handle {
            out.push(("instagram_handle", v.clone()));
        }
        if let Some(v) = &self.address {
            out.push(("address", v.clone()));
        }
        out
    }
}
