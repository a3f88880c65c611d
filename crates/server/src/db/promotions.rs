//! Promotion repository.
//!
//! Redemption is a single guarded UPDATE: the usage-limit and expiry checks
//! happen in the same statement as the increment, so two concurrent
//! redemptions of the last remaining use cannot both succeed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use tavola_core::{PromotionId, PromotionKind, RestaurantId};

use super::RepositoryError;
use crate::models::promotion::Promotion;

#[derive(Debug, sqlx::FromRow)]
struct PromotionRow {
    id: PromotionId,
    restaurant_id: RestaurantId,
    code: String,
    description: String,
    kind: PromotionKind,
    value: Decimal,
    usage_limit: i32,
    usage_count: i32,
    expiry_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PromotionRow> for Promotion {
    fn from(r: PromotionRow) -> Self {
        Self {
            id: r.id,
            restaurant_id: r.restaurant_id,
            code: r.code,
            description: r.description,
            kind: r.kind,
            value: r.value,
            usage_limit: r.usage_limit,
            usage_count: r.usage_count,
            expiry_date: r.expiry_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const PROMOTION_COLUMNS: &str = "id, restaurant_id, code, description, kind, value, \
     usage_limit, usage_count, expiry_date, created_at, updated_at";

/// Fields for creating or updating a promotion.
#[derive(Debug)]
pub struct PromotionInput {
    pub code: String,
    pub description: String,
    pub kind: PromotionKind,
    pub value: Decimal,
    pub usage_limit: i32,
    pub expiry_date: DateTime<Utc>,
}

/// Repository for promotion database operations.
pub struct PromotionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromotionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a restaurant's promotions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Promotion>, RepositoryError> {
        let rows = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions
             WHERE restaurant_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(restaurant_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Promotion::from).collect())
    }

    /// Look up a promotion by code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Promotion>, RepositoryError> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE code = UPPER($1)"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Promotion::from))
    }

    /// Get a promotion by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PromotionId) -> Result<Option<Promotion>, RepositoryError> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Promotion::from))
    }

    /// Create a promotion for a restaurant. Codes are stored uppercase.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    #[instrument(skip(self, input), fields(restaurant = %restaurant_id, code = %input.code))]
    pub async fn create(
        &self,
        restaurant_id: RestaurantId,
        input: &PromotionInput,
    ) -> Result<Promotion, RepositoryError> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            "INSERT INTO promotions
                 (restaurant_id, code, description, kind, value, usage_limit, expiry_date)
             VALUES ($1, UPPER($2), $3, $4, $5, $6, $7)
             RETURNING {PROMOTION_COLUMNS}"
        ))
        .bind(restaurant_id)
        .bind(&input.code)
        .bind(&input.description)
        .bind(input.kind)
        .bind(input.value)
        .bind(input.usage_limit)
        .bind(input.expiry_date)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("promotion code already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Update a promotion's terms. The usage count is not touched here, and
    /// the new limit may not undercut it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the promotion does not exist
    /// and `Conflict` if the new usage limit is below the recorded usage.
    pub async fn update(
        &self,
        id: PromotionId,
        input: &PromotionInput,
    ) -> Result<Promotion, RepositoryError> {
        let row = sqlx::query_as::<_, PromotionRow>(&update_sql())
            .bind(id)
            .bind(&input.code)
            .bind(&input.description)
            .bind(input.kind)
            .bind(input.value)
            .bind(input.usage_limit)
            .bind(input.expiry_date)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                let exists: (bool,) =
                    sqlx::query_as("SELECT EXISTS(SELECT 1 FROM promotions WHERE id = $1)")
                        .bind(id)
                        .fetch_one(self.pool)
                        .await?;
                Err(if exists.0 {
                    RepositoryError::Conflict(
                        "usage limit cannot be lower than the recorded usage".to_owned(),
                    )
                } else {
                    RepositoryError::NotFound
                })
            }
        }
    }

    /// Delete a promotion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the promotion does not exist.
    pub async fn delete(&self, id: PromotionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM promotions WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Atomically redeem a promotion by code inside an open transaction.
///
/// The increment carries its own limit and expiry guards, so a concurrent
/// redemption that exhausts the code makes this statement match zero rows
/// instead of over-counting. Returns the promotion as it was *before* this
/// redemption's increment (`usage_count` is decremented back for the
/// caller), or `None` when the code is unknown or no longer redeemable.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn redeem_by_code(
    conn: &mut PgConnection,
    code: &str,
) -> Result<Option<Promotion>, RepositoryError> {
    let row = sqlx::query_as::<_, PromotionRow>(&redeem_sql())
        .bind(code)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|mut r| {
        r.usage_count -= 1;
        Promotion::from(r)
    }))
}

/// The guarded update behind [`PromotionRepository::update`].
///
/// The limit check rides on the UPDATE itself so a redemption landing
/// between a read and this write cannot push `usage_count` past the new
/// limit.
fn update_sql() -> String {
    format!(
        "UPDATE promotions
         SET code = UPPER($2), description = $3, kind = $4, value = $5,
             usage_limit = $6, expiry_date = $7, updated_at = NOW()
         WHERE id = $1 AND usage_count <= $6
         RETURNING {PROMOTION_COLUMNS}"
    )
}

/// The guarded increment behind [`redeem_by_code`].
fn redeem_sql() -> String {
    format!(
        "UPDATE promotions
         SET usage_count = usage_count + 1, updated_at = NOW()
         WHERE code = UPPER($1)
           AND usage_count < usage_limit
           AND expiry_date > NOW()
         RETURNING {PROMOTION_COLUMNS}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redemption_guards_live_in_the_same_statement_as_the_increment() {
        // Limit and expiry are checked by the UPDATE itself, so two
        // concurrent redemptions of the last use cannot both match.
        let sql = redeem_sql();
        assert!(sql.contains("usage_count = usage_count + 1"));
        assert!(sql.contains("usage_count < usage_limit"));
        assert!(sql.contains("expiry_date > NOW()"));
    }

    #[test]
    fn terms_update_cannot_undercut_recorded_usage() {
        // Lowering the limit below the current count would trip the table's
        // CHECK constraint and surface as a raw database error; the guard
        // turns it into a zero-row match instead.
        let sql = update_sql();
        assert!(sql.contains("WHERE id = $1 AND usage_count <= $6"));
    }
}
