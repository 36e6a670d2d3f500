use crate::map::{Marker, MarkerGlyph, MarkerPopup, RenderPlan, Viewport};
use crate::models::{
    BlogPost, District, Inquiry, InquiryStatus, Listing, ListingKind, ListingStatus, NewBlogPost,
    NewInquiry, NewListing, NewTeamMember, PostStatus, SettingsUpdate, SiteSettings, TeamMember,
    UpdateBlogPost, UpdateListing, UpdateTeamMember, Variation,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_listings,
        crate::routes::create_listing,
        crate::routes::get_listing,
        crate::routes::update_listing,
        crate::routes::delete_listing,
        crate::routes::featured_listings,
        crate::routes::listing_map_plan,
        crate::routes::map_plan,
        crate::routes::list_districts,
        crate::routes::submit_inquiry,
        crate::routes::list_inquiries,
        crate::routes::update_inquiry_status,
        crate::routes::list_team,
        crate::routes::create_team_member,
        crate::routes::update_team_member,
        crate::routes::delete_team_member,
        crate::routes::list_posts,
        crate::routes::get_post_by_slug,
        crate::routes::create_post,
        crate::routes::update_post,
        crate::routes::delete_post,
        crate::routes::get_settings,
        crate::routes::update_settings,
        crate::routes::login,
    ),
    components(schemas(
        Listing, NewListing, UpdateListing, Variation, ListingKind, ListingStatus,
        District, Inquiry, NewInquiry, InquiryStatus,
        TeamMember, NewTeamMember, UpdateTeamMember,
        BlogPost, NewBlogPost, UpdateBlogPost, PostStatus,
        SiteSettings, SettingsUpdate,
        RenderPlan, Marker, MarkerPopup, MarkerGlyph, Viewport,
        crate::routes::UpdateInquiryStatus,
        crate::routes::LoginRequest,
        crate::routes::InstagramPost,
    )),
    tags(
        (name = "listings", description = "Property listing operations"),
        (name = "inquiries", description = "Contact inquiry intake and triage"),
        (name = "team", description = "Team member operations"),
        (name = "posts", description = "Blog operations"),
    )
)]
pub struct ApiDoc;
