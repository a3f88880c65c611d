//! Restaurant and menu repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use tavola_core::{MenuItemId, RestaurantId, UserId};

use super::RepositoryError;
use crate::models::restaurant::{MenuItem, Restaurant};

#[derive(Debug, sqlx::FromRow)]
struct RestaurantRow {
    id: RestaurantId,
    owner_id: UserId,
    name: String,
    description: String,
    cuisine: Vec<String>,
    address: String,
    phone: String,
    is_open: bool,
    delivery_time_minutes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(r: RestaurantRow) -> Self {
        Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            description: r.description,
            cuisine: r.cuisine,
            address: r.address,
            phone: r.phone,
            is_open: r.is_open,
            delivery_time_minutes: r.delivery_time_minutes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: MenuItemId,
    restaurant_id: RestaurantId,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    image_url: Option<String>,
    available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(r: MenuItemRow) -> Self {
        Self {
            id: r.id,
            restaurant_id: r.restaurant_id,
            name: r.name,
            description: r.description,
            price: r.price,
            category: r.category,
            image_url: r.image_url,
            available: r.available,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const RESTAURANT_COLUMNS: &str = "id, owner_id, name, description, cuisine, address, phone, \
     is_open, delivery_time_minutes, created_at, updated_at";

const MENU_ITEM_COLUMNS: &str = "id, restaurant_id, name, description, price, category, \
     image_url, available, created_at, updated_at";

/// Fields for creating or updating a restaurant.
#[derive(Debug)]
pub struct RestaurantInput {
    pub name: String,
    pub description: String,
    pub cuisine: Vec<String>,
    pub address: String,
    pub phone: String,
    pub is_open: bool,
    pub delivery_time_minutes: i32,
}

/// Fields for creating or updating a menu item.
#[derive(Debug)]
pub struct MenuItemInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: Option<String>,
    pub available: bool,
}

/// Repository for restaurants and their menus.
pub struct RestaurantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RestaurantRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all restaurants, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        let rows = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Restaurant::from).collect())
    }

    /// Get a restaurant by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Restaurant::from))
    }

    /// Get the restaurant owned by a user, if any. One restaurant per owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Restaurant::from))
    }

    /// Create a restaurant for an owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has one.
    #[instrument(skip(self, input), fields(owner = %owner_id))]
    pub async fn create(
        &self,
        owner_id: UserId,
        input: &RestaurantInput,
    ) -> Result<Restaurant, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "INSERT INTO restaurants
                 (owner_id, name, description, cuisine, address, phone, is_open,
                  delivery_time_minutes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {RESTAURANT_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.cuisine)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(input.is_open)
        .bind(input.delivery_time_minutes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("owner already has a restaurant".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Update a restaurant's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the restaurant does not exist.
    pub async fn update(
        &self,
        id: RestaurantId,
        input: &RestaurantInput,
    ) -> Result<Restaurant, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "UPDATE restaurants
             SET name = $2, description = $3, cuisine = $4, address = $5, phone = $6,
                 is_open = $7, delivery_time_minutes = $8, updated_at = NOW()
             WHERE id = $1
             RETURNING {RESTAURANT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.cuisine)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(input.is_open)
        .bind(input.delivery_time_minutes)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Full menu of a restaurant, grouped for display by category then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn menu(&self, restaurant_id: RestaurantId) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items
             WHERE restaurant_id = $1
             ORDER BY category, name"
        ))
        .bind(restaurant_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// Fetch specific menu items of one restaurant by ID.
    ///
    /// Used at checkout to reprice submitted cart lines; items belonging to
    /// other restaurants are simply not returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn menu_items_by_ids(
        &self,
        restaurant_id: RestaurantId,
        ids: &[MenuItemId],
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let rows = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items
             WHERE restaurant_id = $1 AND id = ANY($2)"
        ))
        .bind(restaurant_id)
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// Get a single menu item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_menu_item(
        &self,
        id: MenuItemId,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(MenuItem::from))
    }

    /// Add an item to a restaurant's menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, input), fields(restaurant = %restaurant_id))]
    pub async fn create_menu_item(
        &self,
        restaurant_id: RestaurantId,
        input: &MenuItemInput,
    ) -> Result<MenuItem, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "INSERT INTO menu_items
                 (restaurant_id, name, description, price, category, image_url, available)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {MENU_ITEM_COLUMNS}"
        ))
        .bind(restaurant_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .bind(&input.image_url)
        .bind(input.available)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a menu item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn update_menu_item(
        &self,
        id: MenuItemId,
        input: &MenuItemInput,
    ) -> Result<MenuItem, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "UPDATE menu_items
             SET name = $2, description = $3, price = $4, category = $5, image_url = $6,
                 available = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING {MENU_ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .bind(&input.image_url)
        .bind(input.available)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a menu item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn delete_menu_item(&self, id: MenuItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
