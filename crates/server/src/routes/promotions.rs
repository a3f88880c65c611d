//! Promotion routes.
//!
//! `validate` is advisory: it tells the client what a code would be worth
//! right now. The binding check happens again at checkout, atomically,
//! inside the order transaction.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use tavola_core::{PromotionId, PromotionKind, PromotionVerdict, RestaurantId};

use crate::db::PromotionRepository;
use crate::db::promotions::PromotionInput;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Promotion;
use crate::routes::restaurants::ensure_owner;
use crate::routes::{ApiResponse, success};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/promotions", post(create))
        .route("/promotions/restaurant/{id}", get(list_for_restaurant))
        .route("/promotions/code/{code}", get(get_by_code))
        .route("/promotions/validate", post(validate))
        .route("/promotions/{id}", put(update).delete(delete))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody {
    restaurant_id: RestaurantId,
    #[serde(flatten)]
    terms: TermsBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TermsBody {
    code: String,
    description: String,
    kind: PromotionKind,
    value: Decimal,
    usage_limit: i32,
    expiry_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateBody {
    code: String,
    order_total: Decimal,
}

impl TermsBody {
    fn validate(self) -> Result<PromotionInput> {
        if self.code.trim().is_empty() {
            return Err(AppError::Validation("Code is required".to_owned()));
        }
        if self.value <= Decimal::ZERO {
            return Err(AppError::Validation("Value must be positive".to_owned()));
        }
        if self.kind == PromotionKind::Percentage && self.value > Decimal::from(100) {
            return Err(AppError::Validation(
                "Percentage cannot exceed 100".to_owned(),
            ));
        }
        if self.usage_limit <= 0 {
            return Err(AppError::Validation(
                "Usage limit must be positive".to_owned(),
            ));
        }
        Ok(PromotionInput {
            code: self.code,
            description: self.description,
            kind: self.kind,
            value: self.value,
            usage_limit: self.usage_limit,
            expiry_date: self.expiry_date,
        })
    }
}

async fn list_for_restaurant(
    State(state): State<AppState>,
    Path(id): Path<RestaurantId>,
) -> Result<Json<ApiResponse<Vec<Promotion>>>> {
    let promotions = PromotionRepository::new(state.pool())
        .list_for_restaurant(id)
        .await?;
    Ok(success(promotions))
}

async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Promotion>>> {
    let promotion = PromotionRepository::new(state.pool())
        .get_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid promotion code".to_owned()))?;
    Ok(success(promotion))
}

/// Preview what a code would be worth against a given total.
async fn validate(
    State(state): State<AppState>,
    Json(body): Json<ValidateBody>,
) -> Result<Json<ApiResponse<PromotionVerdict>>> {
    let verdict = match PromotionRepository::new(state.pool())
        .get_by_code(&body.code)
        .await?
    {
        Some(promotion) => promotion.terms().validate(body.order_total, Utc::now()),
        None => PromotionVerdict::rejected("Invalid promotion code"),
    };
    Ok(success(verdict))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<ApiResponse<Promotion>>)> {
    ensure_owner(&state, &user, body.restaurant_id).await?;

    let input = body.terms.validate()?;
    let promotion = PromotionRepository::new(state.pool())
        .create(body.restaurant_id, &input)
        .await?;
    Ok((StatusCode::CREATED, success(promotion)))
}

async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PromotionId>,
    Json(body): Json<TermsBody>,
) -> Result<Json<ApiResponse<Promotion>>> {
    let repo = PromotionRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Promotion not found".to_owned()))?;
    ensure_owner(&state, &user, existing.restaurant_id).await?;

    let input = body.validate()?;
    let promotion = repo.update(id, &input).await?;
    Ok(success(promotion))
}

async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PromotionId>,
) -> Result<Json<ApiResponse<()>>> {
    let repo = PromotionRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Promotion not found".to_owned()))?;
    ensure_owner(&state, &user, existing.restaurant_id).await?;

    repo.delete(id).await?;
    Ok(success(()))
}
