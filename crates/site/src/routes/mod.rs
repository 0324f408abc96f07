//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Public catalog (available bags)
//! GET  /bag/{id}                - Public bag detail
//! GET  /health                  - Health check
//!
//! # Admin auth
//! GET  /admin                   - Login/signup page (?error=...)
//! POST /admin/login             - Password login
//! POST /admin/signup            - Account creation
//! POST /admin/logout            - Logout
//! POST /admin/login/google      - Start Google OAuth
//! GET  /admin/callback          - OAuth callback (server-side ?code= exchange)
//! GET  /admin/callback/complete - Fragment-relay completion
//!
//! # Admin console (requires session cookie)
//! GET  /admin/bags              - Bag table
//! GET  /admin/add-bag           - Create form
//! POST /admin/add-bag           - Create action
//! GET  /admin/bags/{id}         - Edit form
//! POST /admin/bags/{id}         - Update action
//! POST /admin/bags/{id}/delete  - Delete action
//! GET  /admin/settings          - Settings form
//! POST /admin/settings          - Settings upsert
//!
//! # API
//! POST /api/cloudinary/signature - Signed upload ticket
//! ```

pub mod admin;
pub mod api;
pub mod bag;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::auth::login_page))
        .route("/login", post(admin::auth::login))
        .route("/signup", post(admin::auth::signup))
        .route("/logout", post(admin::auth::logout))
        .route("/login/google", post(admin::auth::login_google))
        .route("/callback", get(admin::auth::callback))
        .route("/callback/complete", get(admin::auth::callback_complete))
        .route("/bags", get(admin::bags::list))
        .route(
            "/add-bag",
            get(admin::bags::add_page).post(admin::bags::create),
        )
        .route(
            "/bags/{id}",
            get(admin::bags::edit_page).post(admin::bags::update),
        )
        .route("/bags/{id}/delete", post(admin::bags::delete))
        .route(
            "/settings",
            get(admin::settings::page).post(admin::settings::update),
        )
}

/// Create the API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/cloudinary/signature", post(api::cloudinary::signature))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/bag/{id}", get(bag::show))
        .nest("/admin", admin_routes())
        .nest("/api", api_routes())
}
