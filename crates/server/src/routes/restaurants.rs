//! Restaurant and menu routes.
//!
//! Listing and menu reads are public. Mutations require the restaurant's
//! owner or an admin, and every menu mutation drops the cached menu so the
//! next read sees the change within one request.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use tavola_core::{MenuItemId, RestaurantId, UserRole};

use crate::db::RestaurantRepository;
use crate::db::restaurants::{MenuItemInput, RestaurantInput};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, MenuItem, Restaurant};
use crate::routes::{ApiResponse, success};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(list).post(create))
        .route("/restaurants/user/mine", get(mine))
        .route("/restaurants/{id}", get(get_one).put(update))
        .route("/restaurants/{id}/menu", get(menu).post(create_menu_item))
        .route(
            "/menu-items/{id}",
            put(update_menu_item).delete(delete_menu_item),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestaurantBody {
    name: String,
    description: String,
    #[serde(default)]
    cuisine: Vec<String>,
    address: String,
    phone: String,
    #[serde(default = "default_true")]
    is_open: bool,
    #[serde(default = "default_delivery_time")]
    delivery_time_minutes: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuItemBody {
    name: String,
    description: String,
    price: Decimal,
    category: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default = "default_true")]
    available: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_delivery_time() -> i32 {
    30
}

impl RestaurantBody {
    fn validate(&self) -> Result<RestaurantInput> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_owned()));
        }
        if self.delivery_time_minutes <= 0 {
            return Err(AppError::Validation(
                "Delivery time must be positive".to_owned(),
            ));
        }
        Ok(RestaurantInput {
            name: self.name.clone(),
            description: self.description.clone(),
            cuisine: self.cuisine.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            is_open: self.is_open,
            delivery_time_minutes: self.delivery_time_minutes,
        })
    }
}

impl MenuItemBody {
    fn validate(&self) -> Result<MenuItemInput> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_owned()));
        }
        if self.price <= Decimal::ZERO {
            return Err(AppError::Validation("Price must be positive".to_owned()));
        }
        Ok(MenuItemInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            category: self.category.clone(),
            image_url: self.image_url.clone(),
            available: self.available,
        })
    }
}

async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Restaurant>>>> {
    let restaurants = RestaurantRepository::new(state.pool()).list().await?;
    Ok(success(restaurants))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<RestaurantId>,
) -> Result<Json<ApiResponse<Restaurant>>> {
    let restaurant = RestaurantRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_owned()))?;
    Ok(success(restaurant))
}

/// The caller's own restaurant (restaurant accounts only).
async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ApiResponse<Restaurant>>> {
    let restaurant = RestaurantRepository::new(state.pool())
        .get_by_owner(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("You have no restaurant yet".to_owned()))?;
    Ok(success(restaurant))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<RestaurantBody>,
) -> Result<(StatusCode, Json<ApiResponse<Restaurant>>)> {
    if user.role != UserRole::Restaurant && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only restaurant accounts can create a restaurant".to_owned(),
        ));
    }

    let input = body.validate()?;
    let restaurant = RestaurantRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, success(restaurant)))
}

async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RestaurantId>,
    Json(body): Json<RestaurantBody>,
) -> Result<Json<ApiResponse<Restaurant>>> {
    ensure_owner(&state, &user, id).await?;

    let input = body.validate()?;
    let restaurant = RestaurantRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(success(restaurant))
}

/// Public menu, served through the per-restaurant cache.
async fn menu(
    State(state): State<AppState>,
    Path(id): Path<RestaurantId>,
) -> Result<Json<ApiResponse<Arc<Vec<MenuItem>>>>> {
    if let Some(items) = state.menu_cache().get(&id).await {
        return Ok(success(items));
    }

    let repo = RestaurantRepository::new(state.pool());
    repo.get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_owned()))?;

    let items = Arc::new(repo.menu(id).await?);
    state.menu_cache().insert(id, Arc::clone(&items)).await;
    Ok(success(items))
}

async fn create_menu_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RestaurantId>,
    Json(body): Json<MenuItemBody>,
) -> Result<(StatusCode, Json<ApiResponse<MenuItem>>)> {
    ensure_owner(&state, &user, id).await?;

    let input = body.validate()?;
    let item = RestaurantRepository::new(state.pool())
        .create_menu_item(id, &input)
        .await?;
    state.invalidate_menu(id).await;
    Ok((StatusCode::CREATED, success(item)))
}

async fn update_menu_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<MenuItemId>,
    Json(body): Json<MenuItemBody>,
) -> Result<Json<ApiResponse<MenuItem>>> {
    let repo = RestaurantRepository::new(state.pool());
    let existing = repo
        .get_menu_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Menu item not found".to_owned()))?;
    ensure_owner(&state, &user, existing.restaurant_id).await?;

    let input = body.validate()?;
    let item = repo.update_menu_item(id, &input).await?;
    state.invalidate_menu(existing.restaurant_id).await;
    Ok(success(item))
}

async fn delete_menu_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<MenuItemId>,
) -> Result<Json<ApiResponse<()>>> {
    let repo = RestaurantRepository::new(state.pool());
    let existing = repo
        .get_menu_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Menu item not found".to_owned()))?;
    ensure_owner(&state, &user, existing.restaurant_id).await?;

    repo.delete_menu_item(id).await?;
    state.invalidate_menu(existing.restaurant_id).await;
    Ok(success(()))
}

/// Reject callers who neither own the restaurant nor hold the admin role.
pub(crate) async fn ensure_owner(
    state: &AppState,
    user: &CurrentUser,
    restaurant_id: RestaurantId,
) -> Result<()> {
    if user.is_admin() {
        return Ok(());
    }

    let restaurant = RestaurantRepository::new(state.pool())
        .get(restaurant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_owned()))?;

    if restaurant.owner_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Forbidden".to_owned()))
    }
}
