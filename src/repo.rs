use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("storage: {0}")]
    Storage(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

use async_trait::async_trait;

#[async_trait]
pub trait ListingRepo: Send + Sync {
    /// Every listing regardless of status, newest first. Back-office view.
    async fn list_listings(&self) -> RepoResult<Vec<Listing>>;
    /// Available listings matching `filter`, newest first. Public view.
    async fn filter_listings(&self, filter: &ListingFilter) -> RepoResult<Vec<Listing>>;
    /// Featured available listings, newest first, at most `limit`.
    async fn featured_listings(&self, limit: usize) -> RepoResult<Vec<Listing>>;
    async fn get_listing(&self, id: Id) -> RepoResult<Listing>;
    async fn create_listing(&self, new: NewListing) -> RepoResult<Listing>;
    async fn update_listing(&self, id: Id, upd: UpdateListing) -> RepoResult<Listing>;
    async fn delete_listing(&self, id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait InquiryRepo: Send + Sync {
    async fn list_inquiries(&self) -> RepoResult<Vec<Inquiry>>;
    async fn create_inquiry(&self, new: NewInquiry) -> RepoResult<Inquiry>;
    async fn update_inquiry_status(&self, id: Id, status: InquiryStatus) -> RepoResult<Inquiry>;
}

#[async_trait]
pub trait TeamRepo: Send + Sync {
    /// Members ordered by display_order ascending; inactive ones only when
    /// requested (back-office view).
    async fn list_team(&self, include_inactive: bool) -> RepoResult<Vec<TeamMember>>;
    async fn get_team_member(&self, id: Id) -> RepoResult<TeamMember>;
    async fn create_team_member(&self, new: NewTeamMember) -> RepoResult<TeamMember>;
    async fn update_team_member(&self, id: Id, upd: UpdateTeamMember) -> RepoResult<TeamMember>;
    /// Soft delete: clears is_active, keeps the record.
    async fn deactivate_team_member(&self, id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait BlogRepo: Send + Sync {
    /// Published posts by publish date, or everything by creation date when
    /// drafts are included.
    async fn list_posts(&self, include_drafts: bool) -> RepoResult<Vec<BlogPost>>;
    async fn get_post(&self, id: Id) -> RepoResult<BlogPost>;
    /// Published posts only; drafts are invisible by slug.
    async fn get_post_by_slug(&self, slug: &str) -> RepoResult<BlogPost>;
    async fn create_post(&self, new: NewBlogPost) -> RepoResult<BlogPost>;
    async fn update_post(&self, id: Id, upd: UpdateBlogPost) -> RepoResult<BlogPost>;
    async fn delete_post(&self, id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get_settings(&self) -> RepoResult<SiteSettings>;
    async fn update_settings(&self, upd: SettingsUpdate) -> RepoResult<SiteSettings>;
}

pub trait Repo: ListingRepo + InquiryRepo + TeamRepo + BlogRepo + SettingsRepo {}

impl<T> Repo for T where T: ListingRepo + InquiryRepo + TeamRepo + BlogRepo + SettingsRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use crate::{districts, filter};
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, RwLock};
    use uuid::Uuid;

    const SNAPSHOT_PATH: &str = "data/state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        listings: HashMap<Id, Listing>,
        inquiries: HashMap<Id, Inquiry>,
        team: HashMap<Id, TeamMember>,
        posts: HashMap<Id, BlogPost>,
        settings: HashMap<String, String>,
    }

    /// Development/test backend. Holds everything behind one lock and writes a
    /// JSON snapshot after each mutation so local state survives restarts.
    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Arc<PathBuf>,
    }

    impl InMemRepo {
        fn snapshot_path() -> PathBuf {
            match std::env::var("SABI_DATA_DIR") {
                Ok(dir) => {
                    let mut p = PathBuf::from(dir);
                    p.push("state.json");
                    p
                }
                Err(_) => PathBuf::from(SNAPSHOT_PATH),
            }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        tracing::info!("loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        tracing::warn!(
                            "failed to parse snapshot '{}': {e}; starting empty",
                            path.display()
                        );
                        State::default()
                    }
                },
                Err(_) => {
                    tracing::debug!("no snapshot at '{}'; starting empty", path.display());
                    State::default()
                }
            }
        }

        fn persist(&self) {
            let path = self.snapshot_path.clone();
            if let Ok(s) = serde_json::to_vec_pretty(&*self.state.read().unwrap()) {
                if let Some(dir) = path.parent() {
                    let _ = std::fs::create_dir_all(dir);
                }
                if let Err(e) = std::fs::write(&*path, s) {
                    tracing::warn!("failed to write snapshot '{}': {e}", path.display());
                }
            }
        }

        pub fn new() -> Self {
            let snapshot_path = Self::snapshot_path();
            let state = Self::load_state_from(&snapshot_path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Arc::new(snapshot_path),
            }
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self {
            Self::new()
        }
    }

    fn newest_first(mut listings: Vec<Listing>) -> Vec<Listing> {
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        listings
    }

    #[async_trait]
    impl ListingRepo for InMemRepo {
        async fn list_listings(&self) -> RepoResult<Vec<Listing>> {
            let s = self.state.read().unwrap();
            Ok(newest_first(s.listings.values().cloned().collect()))
        }

        async fn filter_listings(&self, spec: &ListingFilter) -> RepoResult<Vec<Listing>> {
            let s = self.state.read().unwrap();
            let all = newest_first(s.listings.values().cloned().collect());
            Ok(filter::apply(all, spec))
        }

        async fn featured_listings(&self, limit: usize) -> RepoResult<Vec<Listing>> {
            let s = self.state.read().unwrap();
            let mut v = newest_first(
                s.listings
                    .values()
                    .filter(|l| l.featured && l.status == ListingStatus::Available)
                    .cloned()
                    .collect(),
            );
            v.truncate(limit);
            Ok(v)
        }

        async fn get_listing(&self, id: Id) -> RepoResult<Listing> {
            let s = self.state.read().unwrap();
            s.listings.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn create_listing(&self, new: NewListing) -> RepoResult<Listing> {
            let (latitude, longitude) =
                districts::resolve_coordinates(&new.district, new.latitude, new.longitude);
            let now = Utc::now();
            let listing = Listing {
                id: Uuid::new_v4(),
                title: new.title,
                description: new.description,
                price: new.price,
                price_label: new.price_label,
                kind: new.kind,
                district: new.district,
                address: new.address,
                latitude,
                longitude,
                bedrooms: new.bedrooms,
                bathrooms: new.bathrooms,
                bq: new.bq,
                land_size: new.land_size,
                images: new.images,
                features: new.features,
                variations: new.variations,
                status: new.status,
                featured: new.featured,
                created_at: now,
                updated_at: now,
            };
            let mut s = self.state.write().unwrap();
            s.listings.insert(listing.id, listing.clone());
            drop(s);
            self.persist();
            Ok(listing)
        }

        async fn update_listing(&self, id: Id, upd: UpdateListing) -> RepoResult<Listing> {
            let mut s = self.state.write().unwrap();
            let listing = s.listings.get_mut(&id).ok_or(RepoError::NotFound)?;

            if let Some(title) = upd.title {
                listing.title = title;
            }
            if let Some(description) = upd.description {
                listing.description = description;
            }
            if let Some(price) = upd.price {
                listing.price = price;
            }
            if let Some(price_label) = upd.price_label {
                listing.price_label = Some(price_label);
            }
            if let Some(kind) = upd.kind {
                listing.kind = kind;
            }
            if let Some(district) = upd.district {
                listing.district = district;
            }
            if let Some(address) = upd.address {
                listing.address = address;
            }
            if let Some(latitude) = upd.latitude {
                listing.latitude = latitude;
            }
            if let Some(longitude) = upd.longitude {
                listing.longitude = longitude;
            }
            if let Some(bedrooms) = upd.bedrooms {
                listing.bedrooms = Some(bedrooms);
            }
            if let Some(bathrooms) = upd.bathrooms {
                listing.bathrooms = Some(bathrooms);
            }
            if let Some(bq) = upd.bq {
                listing.bq = Some(bq);
            }
            if let Some(land_size) = upd.land_size {
                listing.land_size = Some(land_size);
            }
            if let Some(images) = upd.images {
                listing.images = images;
            }
            if let Some(features) = upd.features {
                listing.features = features;
            }
            if let Some(variations) = upd.variations {
                listing.variations = variations;
            }
            if let Some(status) = upd.status {
                listing.status = status;
            }
            if let Some(featured) = upd.featured {
                listing.featured = featured;
            }
            listing.updated_at = Utc::now();

            let updated = listing.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn delete_listing(&self, id: Id) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            s.listings.remove(&id).ok_or(RepoError::NotFound)?;
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl InquiryRepo for InMemRepo {
        async fn list_inquiries(&self) -> RepoResult<Vec<Inquiry>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.inquiries.values().cloned().collect();
            v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(v)
        }

        async fn create_inquiry(&self, new: NewInquiry) -> RepoResult<Inquiry> {
            let inquiry = Inquiry {
                id: Uuid::new_v4(),
                name: new.name,
                email: new.email,
                phone: new.phone,
                message: new.message,
                listing_id: new.listing_id,
                status: InquiryStatus::New,
                created_at: Utc::now(),
            };
            let mut s = self.state.write().unwrap();
            s.inquiries.insert(inquiry.id, inquiry.clone());
            drop(s);
            self.persist();
            Ok(inquiry)
        }

        async fn update_inquiry_status(
            &self,
            id: Id,
            status: InquiryStatus,
        ) -> RepoResult<Inquiry> {
            let mut s = self.state.write().unwrap();
            let inquiry = s.inquiries.get_mut(&id).ok_or(RepoError::NotFound)?;
            inquiry.status = status;
            let updated = inquiry.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }
    }

    #[async_trait]
    impl TeamRepo for InMemRepo {
        async fn list_team(&self, include_inactive: bool) -> RepoResult<Vec<TeamMember>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .team
                .values()
                .filter(|m| include_inactive || m.is_active)
                .cloned()
                .collect();
            v.sort_by_key(|m| m.display_order);
            Ok(v)
        }

        async fn get_team_member(&self, id: Id) -> RepoResult<TeamMember> {
            let s = self.state.read().unwrap();
            s.team.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn create_team_member(&self, new: NewTeamMember) -> RepoResult<TeamMember> {
            let now = Utc::now();
            let member = TeamMember {
                id: Uuid::new_v4(),
                name: new.name,
                role: new.role,
                bio: new.bio,
                image: new.image,
                email: new.email,
                phone: new.phone,
                linkedin: new.linkedin,
                twitter: new.twitter,
                display_order: new.display_order,
                is_active: new.is_active,
                created_at: now,
                updated_at: now,
            };
            let mut s = self.state.write().unwrap();
            s.team.insert(member.id, member.clone());
            drop(s);
            self.persist();
            Ok(member)
        }

        async fn update_team_member(
            &self,
            id: Id,
            upd: UpdateTeamMember,
        ) -> RepoResult<TeamMember> {
            let mut s = self.state.write().unwrap();
            let member = s.team.get_mut(&id).ok_or(RepoError::NotFound)?;
            if let Some(name) = upd.name {
                member.name = name;
            }
            if let Some(role) = upd.role {
                member.role = role;
            }
            if let Some(bio) = upd.bio {
                member.bio = Some(bio);
            }
            if let Some(image) = upd.image {
                member.image = Some(image);
            }
            if let Some(email) = upd.email {
                member.email = Some(email);
            }
            if let Some(phone) = upd.phone {
                member.phone = Some(phone);
            }
            if let Some(linkedin) = upd.linkedin {
                member.linkedin = Some(linkedin);
            }
            if let Some(twitter) = upd.twitter {
                member.twitter = Some(twitter);
            }
            if let Some(display_order) = upd.display_order {
                member.display_order = display_order;
            }
            if let Some(is_active) = upd.is_active {
                member.is_active = is_active;
            }
            member.updated_at = Utc::now();
            let updated = member.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn deactivate_team_member(&self, id: Id) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let member = s.team.get_mut(&id).ok_or(RepoError::NotFound)?;
            member.is_active = false;
            member.updated_at = Utc::now();
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl BlogRepo for InMemRepo {
        async fn list_posts(&self, include_drafts: bool) -> RepoResult<Vec<BlogPost>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .posts
                .values()
                .filter(|p| include_drafts || p.status == PostStatus::Published)
                .cloned()
                .collect();
            if include_drafts {
                v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            } else {
                v.sort_by(|a, b| b.published_at.cmp(&a.published_at));
            }
            Ok(v)
        }

        async fn get_post(&self, id: Id) -> RepoResult<BlogPost> {
            let s = self.state.read().unwrap();
            s.posts.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn get_post_by_slug(&self, slug: &str) -> RepoResult<BlogPost> {
            let s = self.state.read().unwrap();
            s.posts
                .values()
                .find(|p| p.slug == slug && p.status == PostStatus::Published)
                .cloned()
                .ok_or(RepoError::NotFound)
        }

        async fn create_post(&self, new: NewBlogPost) -> RepoResult<BlogPost> {
            let mut s = self.state.write().unwrap();
            if s.posts.values().any(|p| p.slug == new.slug) {
                return Err(RepoError::Conflict);
            }
            let now = Utc::now();
            let post = BlogPost {
                id: Uuid::new_v4(),
                title: new.title,
                slug: new.slug,
                excerpt: new.excerpt,
                content: new.content,
                cover_image: new.cover_image,
                author: new.author,
                status: new.status,
                published_at: (new.status == PostStatus::Published).then_some(now),
                created_at: now,
                updated_at: now,
            };
            s.posts.insert(post.id, post.clone());
            drop(s);
            self.persist();
            Ok(post)
        }

        async fn update_post(&self, id: Id, upd: UpdateBlogPost) -> RepoResult<BlogPost> {
            let mut s = self.state.write().unwrap();

            // Uniqueness check before taking the mutable borrow.
            if let Some(slug) = &upd.slug {
                if s.posts.values().any(|p| p.slug == *slug && p.id != id) {
                    return Err(RepoError::Conflict);
                }
            }

            let post = s.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
            let now = Utc::now();
            if let Some(title) = upd.title {
                post.title = title;
            }
            if let Some(slug) = upd.slug {
                post.slug = slug;
            }
            if let Some(excerpt) = upd.excerpt {
                post.excerpt = Some(excerpt);
            }
            if let Some(content) = upd.content {
                post.content = content;
            }
            if let Some(cover_image) = upd.cover_image {
                post.cover_image = Some(cover_image);
            }
            if let Some(author) = upd.author {
                post.author = author;
            }
            if let Some(status) = upd.status {
                // The publish timestamp is written once, on the first
                // transition into published, and never again.
                if status == PostStatus::Published && post.published_at.is_none() {
                    post.published_at = Some(now);
                }
                post.status = status;
            }
            post.updated_at = now;
            let updated = post.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn delete_post(&self, id: Id) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            s.posts.remove(&id).ok_or(RepoError::NotFound)?;
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl SettingsRepo for InMemRepo {
        async fn get_settings(&self) -> RepoResult<SiteSettings> {
            let s = self.state.read().unwrap();
            Ok(SiteSettings::from_pairs(
                s.settings.iter().map(|(k, v)| (k.clone(), v.clone())),
            ))
        }

        async fn update_settings(&self, upd: SettingsUpdate) -> RepoResult<SiteSettings> {
            let mut s = self.state.write().unwrap();
            for (key, value) in upd.pairs() {
                s.settings.insert(key.to_string(), value);
            }
            let merged =
                SiteSettings::from_pairs(s.settings.iter().map(|(k, v)| (k.clone(), v.clone())));
            drop(s);
            self.persist();
            Ok(merged)
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use crate::districts;
    use chrono::{DateTime, Utc};
    use sqlx::types::Json;
    use sqlx::{Pool, Postgres, QueryBuilder};
    use uuid::Uuid;

    #[derive(Clone)]
    pub struct PgRepo {
        pool: Pool<Postgres>,
    }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self {
            Self { pool }
        }
    }

    fn storage_err(e: sqlx::Error) -> RepoError {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            other => RepoError::Storage(other.to_string()),
        }
    }

    /// Unique violations become Conflict; everything else is a storage error.
    fn write_err(e: sqlx::Error) -> RepoError {
        if let sqlx::Error::Database(db) = &e {
            if db.code().as_deref() == Some("23505") {
                return RepoError::Conflict;
            }
        }
        storage_err(e)
    }

    // Row structs own the snake_case storage schema; the From impls are the
    // single place it maps onto the canonical entities.

    #[derive(sqlx::FromRow)]
    struct ListingRow {
        id: Uuid,
        title: String,
        description: String,
        price: i64,
        price_label: Option<String>,
        kind: String,
        district: String,
        address: String,
        latitude: f64,
        longitude: f64,
        bedrooms: Option<i32>,
        bathrooms: Option<i32>,
        bq: Option<i32>,
        land_size: Option<i32>,
        images: Vec<String>,
        features: Vec<String>,
        variations: Json<Vec<Variation>>,
        status: String,
        featured: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl From<ListingRow> for Listing {
        fn from(r: ListingRow) -> Self {
            Listing {
                id: r.id,
                title: r.title,
                description: r.description,
                price: r.price,
                price_label: r.price_label,
                kind: r.kind.parse().unwrap_or_default(),
                district: r.district,
                address: r.address,
                latitude: r.latitude,
                longitude: r.longitude,
                bedrooms: r.bedrooms,
                bathrooms: r.bathrooms,
                bq: r.bq,
                land_size: r.land_size,
                images: r.images,
                features: r.features,
                variations: r.variations.0,
                status: r.status.parse().unwrap_or_default(),
                featured: r.featured,
                created_at: r.created_at,
                updated_at: r.updated_at,
            }
        }
    }

    #[derive(sqlx::FromRow)]
    struct InquiryRow {
        id: Uuid,
        name: String,
        email: String,
        phone: String,
        message: String,
        listing_id: Option<Uuid>,
        status: String,
        created_at: DateTime<Utc>,
    }

    impl From<InquiryRow> for Inquiry {
        fn from(r: InquiryRow) -> Self {
            Inquiry {
                id: r.id,
                name: r.name,
                email: r.email,
                phone: r.phone,
                message: r.message,
                listing_id: r.listing_id,
                status: r.status.parse().unwrap_or_default(),
                created_at: r.created_at,
            }
        }
    }

    #[derive(sqlx::FromRow)]
    struct TeamMemberRow {
        id: Uuid,
        name: String,
        role: String,
        bio: Option<String>,
        image: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        linkedin: Option<String>,
        twitter: Option<String>,
        display_order: i32,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl From<TeamMemberRow> for TeamMember {
        fn from(r: TeamMemberRow) -> Self {
            TeamMember {
                id: r.id,
                name: r.name,
                role: r.role,
                bio: r.bio,
                image: r.image,
                email: r.email,
                phone: r.phone,
                linkedin: r.linkedin,
                twitter: r.twitter,
                display_order: r.display_order,
                is_active: r.is_active,
                created_at: r.created_at,
                updated_at: r.updated_at,
            }
        }
    }

    #[derive(sqlx::FromRow)]
    struct BlogPostRow {
        id: Uuid,
        title: String,
        slug: String,
        excerpt: Option<String>,
        content: String,
        cover_image: Option<String>,
        author: String,
        status: String,
        published_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl From<BlogPostRow> for BlogPost {
        fn from(r: BlogPostRow) -> Self {
            BlogPost {
                id: r.id,
                title: r.title,
                slug: r.slug,
                excerpt: r.excerpt,
                content: r.content,
                cover_image: r.cover_image,
                author: r.author,
                status: r.status.parse().unwrap_or_default(),
                published_at: r.published_at,
                created_at: r.created_at,
                updated_at: r.updated_at,
            }
        }
    }

    const LISTING_COLUMNS: &str = "id, title, description, price, price_label, kind, district, \
        address, latitude, longitude, bedrooms, bathrooms, bq, land_size, images, features, \
        variations, status, featured, created_at, updated_at";

    #[async_trait]
    impl ListingRepo for PgRepo {
        async fn list_listings(&self) -> RepoResult<Vec<Listing>> {
            let rows: Vec<ListingRow> = sqlx::query_as(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC"
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;
            Ok(rows.into_iter().map(Into::into).collect())
        }

        async fn filter_listings(&self, spec: &ListingFilter) -> RepoResult<Vec<Listing>> {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "SELECT {LISTING_COLUMNS} FROM listings WHERE status = 'available'"
            ));
            if let Some(kind) = &spec.kind {
                qb.push(" AND kind = ").push_bind(kind.clone());
            }
            if let Some(district) = &spec.district {
                qb.push(" AND lower(district) = lower(")
                    .push_bind(district.clone())
                    .push(")");
            }
            if let Some(min) = spec.min_price {
                qb.push(" AND price >= ").push_bind(min);
            }
            if let Some(max) = spec.max_price {
                qb.push(" AND price <= ").push_bind(max);
            }
            if let Some(bedrooms) = spec.bedrooms {
                qb.push(" AND bedrooms = ").push_bind(bedrooms);
            }
            qb.push(" ORDER BY created_at DESC");
            let rows: Vec<ListingRow> = qb
                .build_query_as()
                .fetch_all(&self.pool)
                .await
                .map_err(storage_err)?;
            Ok(rows.into_iter().map(Into::into).collect())
        }

        async fn featured_listings(&self, limit: usize) -> RepoResult<Vec<Listing>> {
            let rows: Vec<ListingRow> = sqlx::query_as(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings \
                 WHERE featured AND status = 'available' \
                 ORDER BY created_at DESC LIMIT $1"
            ))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;
            Ok(rows.into_iter().map(Into::into).collect())
        }

        async fn get_listing(&self, id: Id) -> RepoResult<Listing> {
            let row: ListingRow = sqlx::query_as(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
            ))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
            Ok(row.into())
        }

        async fn create_listing(&self, new: NewListing) -> RepoResult<Listing> {
            let (latitude, longitude) =
                districts::resolve_coordinates(&new.district, new.latitude, new.longitude);
            let row: ListingRow = sqlx::query_as(&format!(
                "INSERT INTO listings (id, title, description, price, price_label, kind, \
                 district, address, latitude, longitude, bedrooms, bathrooms, bq, land_size, \
                 images, features, variations, status, featured) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19) \
                 RETURNING {LISTING_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.price)
            .bind(&new.price_label)
            .bind(new.kind.as_str())
            .bind(&new.district)
            .bind(&new.address)
            .bind(latitude)
            .bind(longitude)
            .bind(new.bedrooms)
            .bind(new.bathrooms)
            .bind(new.bq)
            .bind(new.land_size)
            .bind(&new.images)
            .bind(&new.features)
            .bind(Json(&new.variations))
            .bind(new.status.as_str())
            .bind(new.featured)
            .fetch_one(&self.pool)
            .await
            .map_err(write_err)?;
            Ok(row.into())
        }

        async fn update_listing(&self, id: Id, upd: UpdateListing) -> RepoResult<Listing> {
            let row: ListingRow = sqlx::query_as(&format!(
                "UPDATE listings SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 price = COALESCE($4, price), \
                 price_label = COALESCE($5, price_label), \
                 kind = COALESCE($6, kind), \
                 district = COALESCE($7, district), \
                 address = COALESCE($8, address), \
                 latitude = COALESCE($9, latitude), \
                 longitude = COALESCE($10, longitude), \
                 bedrooms = COALESCE($11, bedrooms), \
                 bathrooms = COALESCE($12, bathrooms), \
                 bq = COALESCE($13, bq), \
                 land_size = COALESCE($14, land_size), \
                 images = COALESCE($15, images), \
                 features = COALESCE($16, features), \
                 variations = COALESCE($17, variations), \
                 status = COALESCE($18, status), \
                 featured = COALESCE($19, featured), \
                 updated_at = now() \
                 WHERE id = $1 RETURNING {LISTING_COLUMNS}"
            ))
            .bind(id)
            .bind(upd.title)
            .bind(upd.description)
            .bind(upd.price)
            .bind(upd.price_label)
            .bind(upd.kind.map(|k| k.as_str()))
            .bind(upd.district)
            .bind(upd.address)
            .bind(upd.latitude)
            .bind(upd.longitude)
            .bind(upd.bedrooms)
            .bind(upd.bathrooms)
            .bind(upd.bq)
            .bind(upd.land_size)
            .bind(upd.images)
            .bind(upd.features)
            .bind(upd.variations.map(Json))
            .bind(upd.status.map(|s| s.as_str()))
            .bind(upd.featured)
            .fetch_one(&self.pool)
            .await
            .map_err(write_err)?;
            Ok(row.into())
        }

        async fn delete_listing(&self, id: Id) -> RepoResult<()> {
            let result = sqlx::query("DELETE FROM listings WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(storage_err)?;
            if result.rows_affected() == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }
    }

    const INQUIRY_COLUMNS: &str =
        "id, name, email, phone, message, listing_id, status, created_at";

    #[async_trait]
    impl InquiryRepo for PgRepo {
        async fn list_inquiries(&self) -> RepoResult<Vec<Inquiry>> {
            let rows: Vec<InquiryRow> = sqlx::query_as(&format!(
                "SELECT {INQUIRY_COLUMNS} FROM inquiries ORDER BY created_at DESC"
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;
            Ok(rows.into_iter().map(Into::into).collect())
        }

        async fn create_inquiry(&self, new: NewInquiry) -> RepoResult<Inquiry> {
            let row: InquiryRow = sqlx::query_as(&format!(
                "INSERT INTO inquiries (id, name, email, phone, message, listing_id, status) \
                 VALUES ($1,$2,$3,$4,$5,$6,'new') RETURNING {INQUIRY_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.message)
            .bind(new.listing_id)
            .fetch_one(&self.pool)
            .await
            .map_err(write_err)?;
            Ok(row.into())
        }

        async fn update_inquiry_status(
            &self,
            id: Id,
            status: InquiryStatus,
        ) -> RepoResult<Inquiry> {
            let row: InquiryRow = sqlx::query_as(&format!(
                "UPDATE inquiries SET status = $2 WHERE id = $1 RETURNING {INQUIRY_COLUMNS}"
            ))
            .bind(id)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
            Ok(row.into())
        }
    }

    const TEAM_COLUMNS: &str = "id, name, role, bio, image, email, phone, linkedin, twitter, \
        display_order, is_active, created_at, updated_at";

    #[async_trait]
    impl TeamRepo for PgRepo {
        async fn list_team(&self, include_inactive: bool) -> RepoResult<Vec<TeamMember>> {
            let sql = if include_inactive {
                format!("SELECT {TEAM_COLUMNS} FROM team_members ORDER BY display_order")
            } else {
                format!(
                    "SELECT {TEAM_COLUMNS} FROM team_members WHERE is_active \
                     ORDER BY display_order"
                )
            };
            let rows: Vec<TeamMemberRow> = sqlx::query_as(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_err)?;
            Ok(rows.into_iter().map(Into::into).collect())
        }

        async fn get_team_member(&self, id: Id) -> RepoResult<TeamMember> {
            let row: TeamMemberRow = sqlx::query_as(&format!(
                "SELECT {TEAM_COLUMNS} FROM team_members WHERE id = $1"
            ))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
            Ok(row.into())
        }

        async fn create_team_member(&self, new: NewTeamMember) -> RepoResult<TeamMember> {
            let row: TeamMemberRow = sqlx::query_as(&format!(
                "INSERT INTO team_members (id, name, role, bio, image, email, phone, linkedin, \
                 twitter, display_order, is_active) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) RETURNING {TEAM_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.role)
            .bind(&new.bio)
            .bind(&new.image)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.linkedin)
            .bind(&new.twitter)
            .bind(new.display_order)
            .bind(new.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(write_err)?;
            Ok(row.into())
        }

        async fn update_team_member(
            &self,
            id: Id,
            upd: UpdateTeamMember,
        ) -> RepoResult<TeamMember> {
            let row: TeamMemberRow = sqlx::query_as(&format!(
                "UPDATE team_members SET \
                 name = COALESCE($2, name), \
                 role = COALESCE($3, role), \
                 bio = COALESCE($4, bio), \
                 image = COALESCE($5, image), \
                 email = COALESCE($6, email), \
                 phone = COALESCE($7, phone), \
                 linkedin = COALESCE($8, linkedin), \
                 twitter = COALESCE($9, twitter), \
                 display_order = COALESCE($10, display_order), \
                 is_active = COALESCE($11, is_active), \
                 updated_at = now() \
                 WHERE id = $1 RETURNING {TEAM_COLUMNS}"
            ))
            .bind(id)
            .bind(upd.name)
            .bind(upd.role)
            .bind(upd.bio)
            .bind(upd.image)
            .bind(upd.email)
            .bind(upd.phone)
            .bind(upd.linkedin)
            .bind(upd.twitter)
            .bind(upd.display_order)
            .bind(upd.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
            Ok(row.into())
        }

        async fn deactivate_team_member(&self, id: Id) -> RepoResult<()> {
            let result = sqlx::query(
                "UPDATE team_members SET is_active = FALSE, updated_at = now() WHERE id = $1",
            )
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
            if result.rows_affected() == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }
    }

    const POST_COLUMNS: &str = "id, title, slug, excerpt, content, cover_image, author, status, \
        published_at, created_at, updated_at";

    #[async_trait]
    impl BlogRepo for PgRepo {
        async fn list_posts(&self, include_drafts: bool) -> RepoResult<Vec<BlogPost>> {
            let sql = if include_drafts {
                format!("SELECT {POST_COLUMNS} FROM blog_posts ORDER BY created_at DESC")
            } else {
                format!(
                    "SELECT {POST_COLUMNS} FROM blog_posts WHERE status = 'published' \
                     ORDER BY published_at DESC"
                )
            };
            let rows: Vec<BlogPostRow> = sqlx::query_as(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_err)?;
            Ok(rows.into_iter().map(Into::into).collect())
        }

        async fn get_post(&self, id: Id) -> RepoResult<BlogPost> {
            let row: BlogPostRow =
                sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1"))
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(storage_err)?;
            Ok(row.into())
        }

        async fn get_post_by_slug(&self, slug: &str) -> RepoResult<BlogPost> {
            let row: BlogPostRow = sqlx::query_as(&format!(
                "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1 AND status = 'published'"
            ))
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
            Ok(row.into())
        }

        async fn create_post(&self, new: NewBlogPost) -> RepoResult<BlogPost> {
            let row: BlogPostRow = sqlx::query_as(&format!(
                "INSERT INTO blog_posts (id, title, slug, excerpt, content, cover_image, author, \
                 status, published_at) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8, \
                         CASE WHEN $8 = 'published' THEN now() END) \
                 RETURNING {POST_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(&new.title)
            .bind(&new.slug)
            .bind(&new.excerpt)
            .bind(&new.content)
            .bind(&new.cover_image)
            .bind(&new.author)
            .bind(new.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(write_err)?;
            Ok(row.into())
        }

        async fn update_post(&self, id: Id, upd: UpdateBlogPost) -> RepoResult<BlogPost> {
            // published_at is written once: only when this update publishes a
            // post that has never been published before.
            let row: BlogPostRow = sqlx::query_as(&format!(
                "UPDATE blog_posts SET \
                 title = COALESCE($2, title), \
                 slug = COALESCE($3, slug), \
                 excerpt = COALESCE($4, excerpt), \
                 content = COALESCE($5, content), \
                 cover_image = COALESCE($6, cover_image), \
                 author = COALESCE($7, author), \
                 status = COALESCE($8, status), \
                 published_at = CASE \
                     WHEN $8 = 'published' AND published_at IS NULL THEN now() \
                     ELSE published_at END, \
                 updated_at = now() \
                 WHERE id = $1 RETURNING {POST_COLUMNS}"
            ))
            .bind(id)
            .bind(upd.title)
            .bind(upd.slug)
            .bind(upd.excerpt)
            .bind(upd.content)
            .bind(upd.cover_image)
            .bind(upd.author)
            .bind(upd.status.map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(write_err)?;
            Ok(row.into())
        }

        async fn delete_post(&self, id: Id) -> RepoResult<()> {
            let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(storage_err)?;
            if result.rows_affected() == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl SettingsRepo for PgRepo {
        async fn get_settings(&self) -> RepoResult<SiteSettings> {
            let pairs: Vec<(String, String)> =
                sqlx::query_as("SELECT key, value FROM site_settings")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(storage_err)?;
            Ok(SiteSettings::from_pairs(pairs))
        }

        async fn update_settings(&self, upd: SettingsUpdate) -> RepoResult<SiteSettings> {
            let mut tx = self.pool.begin().await.map_err(storage_err)?;
            for (key, value) in upd.pairs() {
                sqlx::query(
                    "INSERT INTO site_settings (key, value) VALUES ($1, $2) \
                     ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
                )
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(storage_err)?;
            }
            tx.commit().await.map_err(storage_err)?;
            self.get_settings().await
        }
    }
}
