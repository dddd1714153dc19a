use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use mongodb::bson::oid::ObjectId;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::models::{CartItem, MenuItem, Review, User};
use crate::store::{UserInsert, UpdateOutcome};

use super::auth::{ensure_self, require_admin, require_claims};
use super::error::ApiError;
use super::responses::{
    AdminStatusResponse, CartQuery, DeleteResponse, HealthResponse, InsertResponse,
    PaymentIntentRequest, PaymentIntentResponse, StatsResponse, TokenRequest, TokenResponse,
    UpdateResponse,
};
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(50)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .expect("default governor config is valid"),
    );

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", delete(delete_user))
        .route("/users/admin/{id}", patch(promote_user).get(admin_status))
        .route("/jwt", post(issue_token))
        .route("/menus", get(list_menu).post(create_menu_item))
        .route("/menus/{id}", delete(delete_menu_item))
        .route("/reviews", get(list_reviews))
        .route("/carts", get(list_carts).post(create_cart_item))
        .route("/carts/{id}", delete(delete_cart_item))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/admin-stats", get(admin_stats))
        .layer(GovernorLayer::new(governor_conf))
        .layer(tower_http::request_id::SetRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
            tower_http::request_id::MakeRequestUuid::default(),
        ))
        .layer(tower_http::request_id::PropagateRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "bistro backend is running"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, ApiError> {
    let claims = require_claims(&state, &headers)?;
    require_admin(&state, &claims).await?;

    let users = state.store.list_users().await?;
    debug!(count = users.len(), "users listed");
    Ok(Json(users))
}

async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<Json<InsertResponse>, ApiError> {
    match state.store.create_user(&user).await? {
        UserInsert::Created(id) => {
            debug!(email = %user.email, id = %id, "user created");
            Ok(Json(InsertResponse::created(id)))
        }
        UserInsert::AlreadyExists => {
            debug!(email = %user.email, "user already exists");
            Ok(Json(InsertResponse::already_exists()))
        }
    }
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteResponse>, ApiError> {
    let claims = require_claims(&state, &headers)?;
    require_admin(&state, &claims).await?;

    let id = parse_id(&id)?;
    let deleted = state.store.delete_user(id).await?;
    debug!(id = %id, deleted, "user delete requested");
    Ok(Json(DeleteResponse {
        deleted_count: deleted,
    }))
}

async fn promote_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<UpdateResponse>, ApiError> {
    let claims = require_claims(&state, &headers)?;
    require_admin(&state, &claims).await?;

    let id = parse_id(&id)?;
    let UpdateOutcome { matched, modified } = state.store.promote_user(id).await?;
    if matched == 0 {
        warn!(id = %id, "promotion target not found");
        return Err(ApiError::NotFound);
    }
    debug!(id = %id, modified, "user promoted to admin");
    Ok(Json(UpdateResponse {
        matched_count: matched,
        modified_count: modified,
    }))
}

/// Self-scoped admin-status lookup: the requested email must match the
/// caller's claims before the store is consulted.
async fn admin_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    let claims = require_claims(&state, &headers)?;
    ensure_self(&email, &claims)?;

    let user = state.store.find_user_by_email(&email).await?;
    let admin = user.is_some_and(|user| user.is_admin());
    debug!(email = %email, admin, "admin status requested");
    Ok(Json(AdminStatusResponse { admin }))
}

async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.tokens.issue(&request.email).map_err(|error| {
        warn!(error = %error, "token issuance failed");
        ApiError::Internal
    })?;
    debug!(email = %request.email, "token issued");
    Ok(Json(TokenResponse { token }))
}

async fn list_menu(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let items = state.store.list_menu().await?;
    debug!(count = items.len(), "menu listed");
    Ok(Json(items))
}

async fn create_menu_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(item): Json<MenuItem>,
) -> Result<Json<InsertResponse>, ApiError> {
    let claims = require_claims(&state, &headers)?;
    require_admin(&state, &claims).await?;

    let id = state.store.insert_menu_item(&item).await?;
    debug!(id = %id, "menu item created");
    Ok(Json(InsertResponse::created(id)))
}

async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteResponse>, ApiError> {
    let claims = require_claims(&state, &headers)?;
    require_admin(&state, &claims).await?;

    let id = parse_id(&id)?;
    let deleted = state.store.delete_menu_item(id).await?;
    if deleted == 0 {
        warn!(id = %id, "menu item not found");
        return Err(ApiError::NotFound);
    }
    debug!(id = %id, "menu item deleted");
    Ok(Json(DeleteResponse {
        deleted_count: deleted,
    }))
}

async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = state.store.list_reviews().await?;
    debug!(count = reviews.len(), "reviews listed");
    Ok(Json(reviews))
}

/// Cart listing filters by the caller-supplied email; there is no ownership
/// proof beyond the equality match.
async fn list_carts(
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> Result<Json<Vec<CartItem>>, ApiError> {
    let items = state.store.carts_for(&query.email).await?;
    debug!(email = %query.email, count = items.len(), "carts listed");
    Ok(Json(items))
}

async fn create_cart_item(
    State(state): State<AppState>,
    Json(item): Json<CartItem>,
) -> Result<Json<InsertResponse>, ApiError> {
    let id = state.store.insert_cart_item(&item).await?;
    debug!(email = %item.email, id = %id, "cart item added");
    Ok(Json(InsertResponse::created(id)))
}

async fn delete_cart_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state.store.delete_cart_item(id).await?;
    debug!(id = %id, deleted, "cart item delete requested");
    Ok(Json(DeleteResponse {
        deleted_count: deleted,
    }))
}

async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let client_secret = state.payments.create_intent(request.price).await?;
    debug!("payment intent issued");
    Ok(Json(PaymentIntentResponse { client_secret }))
}

async fn admin_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.stats().await?;
    debug!(
        users = stats.users,
        menu_items = stats.menu_items,
        orders = stats.orders,
        "admin stats computed"
    );
    Ok(Json(StatsResponse {
        users: stats.users,
        menu_item: stats.menu_items,
        orders: stats.orders,
        revenue: stats.revenue,
    }))
}

fn parse_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::InvalidId)
}
