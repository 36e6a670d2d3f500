use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use actix_web::{web, HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::auth::{self, Auth};
use crate::error::ApiError;
use crate::models::*;
use crate::repo::{BlogRepo, InquiryRepo, ListingRepo, Repo, SettingsRepo, TeamRepo};
use crate::{districts, filter, map};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::resource("/listings")
                    .route(web::get().to(list_listings))
                    .route(web::post().to(create_listing)),
            )
            // Registered before /listings/{id} so "featured" is not read as an id.
            .service(web::resource("/listings/featured").route(web::get().to(featured_listings)))
            .service(
                web::resource("/listings/{id}")
                    .route(web::get().to(get_listing))
                    .route(web::put().to(update_listing))
                    .route(web::delete().to(delete_listing)),
            )
            .service(web::resource("/listings/{id}/map-plan").route(web::get().to(listing_map_plan)))
            .service(web::resource("/map-plan").route(web::get().to(map_plan)))
            .service(web::resource("/districts").route(web::get().to(list_districts)))
            .service(
                web::resource("/inquiries")
                    .route(web::get().to(list_inquiries))
                    .route(web::post().to(submit_inquiry)),
            )
            .service(
                web::resource("/inquiries/{id}/status")
                    .route(web::patch().to(update_inquiry_status)),
            )
            .service(
                web::resource("/team")
                    .route(web::get().to(list_team))
                    .route(web::post().to(create_team_member)),
            )
            .service(
                web::resource("/team/{id}")
                    .route(web::get().to(get_team_member))
                    .route(web::put().to(update_team_member))
                    .route(web::delete().to(delete_team_member)),
            )
            .service(
                web::resource("/posts")
                    .route(web::get().to(list_posts))
                    .route(web::post().to(create_post)),
            )
            .service(web::resource("/posts/slug/{slug}").route(web::get().to(get_post_by_slug)))
            .service(
                web::resource("/posts/{id}")
                    .route(web::get().to(get_post))
                    .route(web::put().to(update_post))
                    .route(web::delete().to(delete_post)),
            )
            .service(
                web::resource("/settings")
                    .route(web::get().to(get_settings))
                    .route(web::put().to(update_settings)),
            )
            .service(web::resource("/instagram").route(web::get().to(instagram_feed)))
            .service(web::resource("/auth/login").route(web::post().to(login)))
            .service(web::resource("/auth/refresh").route(web::post().to(refresh_token)))
            .service(web::resource("/auth/me").route(web::get().to(auth_me))),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
}

// Every mutation passes one of these before any repository call. The Auth
// extractor has already rejected missing/invalid tokens with 401 by the time
// the handler body runs.
macro_rules! ensure_admin {
    ($auth:expr) => {
        if !$auth.is_admin() {
            return Err(ApiError::Forbidden);
        }
    };
}
macro_rules! ensure_staff {
    ($auth:expr) => {
        if !$auth.is_staff() {
            return Err(ApiError::Forbidden);
        }
    };
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    /// Raw on purpose: unknown values must match nothing, not fail.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub district: Option<String>,
    pub price_range: Option<String>,
    pub bedrooms: Option<i32>,
}

impl ListingQuery {
    fn to_filter(&self) -> ListingFilter {
        let (min_price, max_price) = self
            .price_range
            .as_deref()
            .map(filter::parse_price_range)
            .unwrap_or((None, None));
        ListingFilter {
            kind: self.kind.clone(),
            district: self.district.clone(),
            min_price,
            max_price,
            bedrooms: self.bedrooms,
        }
    }
}

// ---------------- Listings ----------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(
        ("type" = Option<String>, Query, description = "land or house"),
        ("district" = Option<String>, Query, description = "District name, case-insensitive"),
        ("priceRange" = Option<String>, Query, description = "\"<min>-<max>\", either side open"),
        ("bedrooms" = Option<i32>, Query, description = "Exact bedroom count"),
        ("include_all" = Option<bool>, Query, description = "Back office only: every status")
    ),
    responses((status = 200, description = "Matching available listings, newest first", body = [Listing]))
)]
pub async fn list_listings(
    req: HttpRequest,
    auth: Option<Auth>,
    data: web::Data<AppState>,
    query: web::Query<ListingQuery>,
) -> Result<HttpResponse, ApiError> {
    let want_all = req.query_string().contains("include_all=1");
    let is_staff = auth.as_ref().map(Auth::is_staff).unwrap_or(false);
    if want_all && is_staff {
        let listings = data.repo.list_listings().await?;
        return Ok(HttpResponse::Ok().json(listings));
    }
    let listings = data.repo.filter_listings(&query.to_filter()).await?;
    Ok(HttpResponse::Ok().json(listings))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = NewListing,
    responses(
        (status = 201, description = "Listing created", body = Listing),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden - Admins only")
    )
)]
pub async fn create_listing(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<NewListing>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    let new = payload.into_inner();
    new.validate()?;
    let listing = data.repo.create_listing(new).await?;
    metrics::increment_counter!("sabi_listings_created_total");
    Ok(HttpResponse::Created().json(listing))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing", body = Listing),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn get_listing(
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let listing = data.repo.get_listing(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/featured",
    responses((status = 200, description = "Featured available listings, at most four", body = [Listing]))
)]
pub async fn featured_listings(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let listings = data.repo.featured_listings(4).await?;
    Ok(HttpResponse::Ok().json(listings))
}

#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}",
    request_body = UpdateListing,
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing updated", body = Listing),
        (status = 403, description = "Forbidden - Admins only"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn update_listing(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<UpdateListing>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    let listing = data
        .repo
        .update_listing(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 403, description = "Forbidden - Admins only"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn delete_listing(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    data.repo.delete_listing(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------- Map ---------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/map-plan",
    params(
        ("type" = Option<String>, Query, description = "land or house"),
        ("district" = Option<String>, Query, description = "District name, case-insensitive"),
        ("priceRange" = Option<String>, Query, description = "\"<min>-<max>\", either side open"),
        ("bedrooms" = Option<i32>, Query, description = "Exact bedroom count")
    ),
    responses((status = 200, description = "Markers and viewport for the browse map", body = map::RenderPlan))
)]
pub async fn map_plan(
    data: web::Data<AppState>,
    query: web::Query<ListingQuery>,
) -> Result<HttpResponse, ApiError> {
    let listings = data.repo.filter_listings(&query.to_filter()).await?;
    Ok(HttpResponse::Ok().json(map::build_map_plan(&listings)))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/map-plan",
    params(("id" = Id, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Single-listing map plan", body = map::RenderPlan),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn listing_map_plan(
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let listing = data.repo.get_listing(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(map::plan_for_listing(&listing)))
}

// ---------------- Districts ---------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/districts",
    responses((status = 200, description = "Districts in display order", body = [District]))
)]
pub async fn list_districts() -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(districts::all()))
}

// ---------------- Inquiries ---------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/inquiries",
    request_body = NewInquiry,
    responses(
        (status = 201, description = "Inquiry recorded", body = Inquiry),
        (status = 400, description = "Validation failed, field named in body")
    )
)]
pub async fn submit_inquiry(
    data: web::Data<AppState>,
    payload: web::Json<NewInquiry>,
) -> Result<HttpResponse, ApiError> {
    let new = payload.into_inner();
    new.validate()?;
    let inquiry = data.repo.create_inquiry(new).await?;
    metrics::increment_counter!("sabi_inquiries_submitted_total");
    Ok(HttpResponse::Created().json(inquiry))
}

#[utoipa::path(
    get,
    path = "/api/v1/inquiries",
    responses(
        (status = 200, description = "All inquiries, newest first", body = [Inquiry]),
        (status = 403, description = "Forbidden - back office only")
    )
)]
pub async fn list_inquiries(
    auth: Auth,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    ensure_staff!(auth);
    let inquiries = data.repo.list_inquiries().await?;
    Ok(HttpResponse::Ok().json(inquiries))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateInquiryStatus {
    pub status: InquiryStatus,
}

#[utoipa::path(
    patch,
    path = "/api/v1/inquiries/{id}/status",
    request_body = UpdateInquiryStatus,
    params(("id" = Id, Path, description = "Inquiry id")),
    responses(
        (status = 200, description = "Inquiry updated", body = Inquiry),
        (status = 404, description = "Inquiry not found")
    )
)]
pub async fn update_inquiry_status(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<UpdateInquiryStatus>,
) -> Result<HttpResponse, ApiError> {
    ensure_staff!(auth);
    let inquiry = data
        .repo
        .update_inquiry_status(path.into_inner(), payload.status)
        .await?;
    Ok(HttpResponse::Ok().json(inquiry))
}

// ---------------- Team --------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/team",
    params(("include_inactive" = Option<bool>, Query, description = "Back office only")),
    responses((status = 200, description = "Team members by display order", body = [TeamMember]))
)]
pub async fn list_team(
    req: HttpRequest,
    auth: Option<Auth>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let want_inactive = req.query_string().contains("include_inactive=1");
    let is_staff = auth.as_ref().map(Auth::is_staff).unwrap_or(false);
    let members = data.repo.list_team(want_inactive && is_staff).await?;
    Ok(HttpResponse::Ok().json(members))
}

pub async fn get_team_member(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    ensure_staff!(auth);
    let member = data.repo.get_team_member(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(member))
}

#[utoipa::path(
    post,
    path = "/api/v1/team",
    request_body = NewTeamMember,
    responses(
        (status = 201, description = "Team member created", body = TeamMember),
        (status = 403, description = "Forbidden - Admins only")
    )
)]
pub async fn create_team_member(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<NewTeamMember>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    let new = payload.into_inner();
    new.validate()?;
    let member = data.repo.create_team_member(new).await?;
    Ok(HttpResponse::Created().json(member))
}

#[utoipa::path(
    put,
    path = "/api/v1/team/{id}",
    request_body = UpdateTeamMember,
    params(("id" = Id, Path, description = "Team member id")),
    responses(
        (status = 200, description = "Team member updated", body = TeamMember),
        (status = 404, description = "Team member not found")
    )
)]
pub async fn update_team_member(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<UpdateTeamMember>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    let member = data
        .repo
        .update_team_member(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(member))
}

#[utoipa::path(
    delete,
    path = "/api/v1/team/{id}",
    params(("id" = Id, Path, description = "Team member id")),
    responses(
        (status = 204, description = "Team member deactivated"),
        (status = 404, description = "Team member not found")
    )
)]
pub async fn delete_team_member(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    // Soft path: the record stays for the back office, the public list drops it.
    data.repo.deactivate_team_member(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------- Blog --------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(("include_drafts" = Option<bool>, Query, description = "Back office only")),
    responses((status = 200, description = "Posts, published first unless drafts included", body = [BlogPost]))
)]
pub async fn list_posts(
    req: HttpRequest,
    auth: Option<Auth>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let want_drafts = req.query_string().contains("include_drafts=1");
    let is_staff = auth.as_ref().map(Auth::is_staff).unwrap_or(false);
    let posts = data.repo.list_posts(want_drafts && is_staff).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    ensure_staff!(auth);
    let post = data.repo.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/slug/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Published post", body = BlogPost),
        (status = 404, description = "No published post with this slug")
    )
)]
pub async fn get_post_by_slug(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let post = data.repo.get_post_by_slug(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = NewBlogPost,
    responses(
        (status = 201, description = "Post created", body = BlogPost),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_post(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<NewBlogPost>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    let new = payload.into_inner();
    new.validate()?;
    let post = data.repo.create_post(new).await?;
    Ok(HttpResponse::Created().json(post))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    request_body = UpdateBlogPost,
    params(("id" = Id, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post updated", body = BlogPost),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn update_post(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<UpdateBlogPost>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    let post = data
        .repo
        .update_post(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = Id, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn delete_post(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    data.repo.delete_post(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------- Settings ----------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses((status = 200, description = "Site settings with defaults applied", body = SiteSettings))
)]
pub async fn get_settings(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let settings = data.repo.get_settings().await?;
    Ok(HttpResponse::Ok().json(settings))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Settings updated", body = SiteSettings),
        (status = 403, description = "Forbidden - Admins only")
    )
)]
pub async fn update_settings(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<SettingsUpdate>,
) -> Result<HttpResponse, ApiError> {
    ensure_admin!(auth);
    let settings = data.repo.update_settings(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(settings))
}

// ---------------- Instagram ---------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstagramPost {
    pub id: String,
    pub media_url: String,
    pub permalink: String,
    pub caption: Option<String>,
    pub media_type: String,
}

#[derive(Deserialize)]
struct InstagramApiResponse {
    data: Vec<InstagramMedia>,
}

#[derive(Deserialize)]
struct InstagramMedia {
    id: String,
    media_url: Option<String>,
    permalink: String,
    caption: Option<String>,
    media_type: String,
    thumbnail_url: Option<String>,
}

const INSTAGRAM_CACHE_TTL: Duration = Duration::from_secs(3600);

// Pod-local response cache; the Graph API rate limit is tight.
static INSTAGRAM_CACHE: Lazy<RwLock<Option<(Instant, Vec<InstagramPost>)>>> =
    Lazy::new(|| RwLock::new(None));

/// Proxy the consultancy's Instagram feed. Unconfigured or failing upstream
/// degrades to an empty feed; the public page shows a placeholder instead.
pub async fn instagram_feed() -> Result<HttpResponse, ApiError> {
    let Ok(token) = std::env::var("INSTAGRAM_ACCESS_TOKEN") else {
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "posts": [] })));
    };

    {
        let cache = INSTAGRAM_CACHE.read().unwrap();
        if let Some((fetched_at, posts)) = cache.as_ref() {
            if fetched_at.elapsed() < INSTAGRAM_CACHE_TTL {
                return Ok(HttpResponse::Ok().json(serde_json::json!({ "posts": posts })));
            }
        }
    }

    let url = format!(
        "https://graph.instagram.com/me/media\
         ?fields=id,media_url,permalink,caption,media_type,thumbnail_url\
         &access_token={token}&limit=6"
    );
    let posts = match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            match resp.json::<InstagramApiResponse>().await {
                Ok(body) => body
                    .data
                    .into_iter()
                    .filter_map(|m| {
                        // Videos embed via their thumbnail.
                        let media_url = if m.media_type == "VIDEO" {
                            m.thumbnail_url.or(m.media_url)
                        } else {
                            m.media_url
                        };
                        let media_url = media_url?;
                        Some(InstagramPost {
                            id: m.id,
                            media_url,
                            permalink: m.permalink,
                            caption: m.caption,
                            media_type: m.media_type,
                        })
                    })
                    .collect(),
                Err(e) => {
                    log::warn!("instagram response parse failed: {e}");
                    Vec::new()
                }
            }
        }
        Ok(resp) => {
            log::warn!("instagram api returned {}", resp.status());
            Vec::new()
        }
        Err(e) => {
            log::warn!("instagram api request failed: {e}");
            Vec::new()
        }
    };

    *INSTAGRAM_CACHE.write().unwrap() = Some((Instant::now(), posts.clone()));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "posts": posts })))
}

// ---------------- Auth --------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "JWT issued"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(payload: web::Json<LoginRequest>) -> Result<HttpResponse, ApiError> {
    let Some(role) = auth::validate_credentials(&payload.email, &payload.password) else {
        return Err(ApiError::Unauthorized);
    };
    let token = auth::create_jwt(&payload.email, vec![role]).map_err(|_| ApiError::Internal)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token, "role": role })))
}

pub async fn refresh_token(auth: Auth) -> Result<HttpResponse, ApiError> {
    let token =
        auth::create_jwt(&auth.0.sub, auth.0.roles.clone()).map_err(|_| ApiError::Internal)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "token": token })))
}

#[derive(Serialize)]
struct MeResponse {
    email: String,
    role: String,
}

pub async fn auth_me(auth: Auth) -> Result<HttpResponse, ApiError> {
    let role = if auth.is_admin() { "admin" } else { "staff" };
    let me = MeResponse {
        email: auth.0.sub.clone(),
        role: role.to_string(),
    };
    Ok(HttpResponse::Ok().json(me))
}
