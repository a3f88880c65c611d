//! Demo data seeding.
//!
//! Creates a few restaurant accounts with menus and promotion codes so a
//! fresh database has something to order from. Seeding is idempotent: a
//! restaurant whose owner already exists is skipped.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher};
use sqlx::PgPool;

use super::{CommandError, connect};

/// Every seeded account logs in with this password.
const DEMO_PASSWORD: &str = "Password123";

struct DemoMenuItem {
    name: &'static str,
    description: &'static str,
    price: &'static str,
    category: &'static str,
}

struct DemoPromotion {
    code: &'static str,
    description: &'static str,
    kind: &'static str,
    value: &'static str,
    usage_limit: i32,
}

struct DemoRestaurant {
    owner_email: &'static str,
    owner_name: &'static str,
    name: &'static str,
    description: &'static str,
    cuisine: &'static [&'static str],
    address: &'static str,
    phone: &'static str,
    delivery_time_minutes: i32,
    menu: &'static [DemoMenuItem],
    promotion: DemoPromotion,
}

const DEMO_RESTAURANTS: &[DemoRestaurant] = &[
    DemoRestaurant {
        owner_email: "owner@pizzapalace.example",
        owner_name: "Gina Russo",
        name: "Pizza Palace",
        description: "Wood-fired pizzas and classic Italian sides.",
        cuisine: &["Italian", "Pizza"],
        address: "12 Via Roma, Springfield",
        phone: "+1-555-0101",
        delivery_time_minutes: 30,
        menu: &[
            DemoMenuItem {
                name: "Margherita Pizza",
                description: "Tomato, mozzarella, fresh basil.",
                price: "10.99",
                category: "Pizza",
            },
            DemoMenuItem {
                name: "Pepperoni Pizza",
                description: "Loaded with pepperoni and extra cheese.",
                price: "12.99",
                category: "Pizza",
            },
            DemoMenuItem {
                name: "Garlic Bread",
                description: "Toasted baguette with garlic butter.",
                price: "5.99",
                category: "Sides",
            },
        ],
        promotion: DemoPromotion {
            code: "WELCOME10",
            description: "10% off your first order",
            kind: "percentage",
            value: "10",
            usage_limit: 100,
        },
    },
    DemoRestaurant {
        owner_email: "owner@burgerbarn.example",
        owner_name: "Hank Doyle",
        name: "Burger Barn",
        description: "Smash burgers, fries, and thick shakes.",
        cuisine: &["American", "Burgers"],
        address: "48 Main Street, Springfield",
        phone: "+1-555-0102",
        delivery_time_minutes: 25,
        menu: &[
            DemoMenuItem {
                name: "Classic Smash Burger",
                description: "Double patty, cheddar, house sauce.",
                price: "9.49",
                category: "Burgers",
            },
            DemoMenuItem {
                name: "Loaded Fries",
                description: "Fries with cheese sauce and scallions.",
                price: "6.49",
                category: "Sides",
            },
            DemoMenuItem {
                name: "Vanilla Shake",
                description: "Hand-spun with real vanilla bean.",
                price: "4.99",
                category: "Drinks",
            },
        ],
        promotion: DemoPromotion {
            code: "SAVE5",
            description: "$5 off any order",
            kind: "fixed",
            value: "5",
            usage_limit: 50,
        },
    },
    DemoRestaurant {
        owner_email: "owner@sushispot.example",
        owner_name: "Aiko Tanaka",
        name: "Sushi Spot",
        description: "Fresh nigiri, rolls, and donburi bowls.",
        cuisine: &["Japanese", "Sushi"],
        address: "7 Harbor Lane, Springfield",
        phone: "+1-555-0103",
        delivery_time_minutes: 40,
        menu: &[
            DemoMenuItem {
                name: "Salmon Nigiri Set",
                description: "Eight pieces of fresh salmon nigiri.",
                price: "14.50",
                category: "Nigiri",
            },
            DemoMenuItem {
                name: "California Roll",
                description: "Crab, avocado, cucumber.",
                price: "8.25",
                category: "Rolls",
            },
            DemoMenuItem {
                name: "Miso Soup",
                description: "Tofu, wakame, scallion.",
                price: "3.50",
                category: "Sides",
            },
        ],
        promotion: DemoPromotion {
            code: "SUSHI15",
            description: "15% off sushi orders",
            kind: "percentage",
            value: "15",
            usage_limit: 75,
        },
    },
];

/// Seed demo restaurants, menus, and promotions.
///
/// # Errors
///
/// Returns an error when the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(DEMO_PASSWORD.as_bytes(), &salt)
        .map_err(|_| CommandError::PasswordHash)?
        .to_string();

    for demo in DEMO_RESTAURANTS {
        seed_restaurant(&pool, demo, &password_hash).await?;
    }

    tracing::info!("Seeding complete");
    Ok(())
}

async fn seed_restaurant(
    pool: &PgPool,
    demo: &DemoRestaurant,
    password_hash: &str,
) -> Result<(), CommandError> {
    let mut tx = pool.begin().await?;

    let owner_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (email, password_hash, name, role)
         VALUES ($1, $2, $3, 'restaurant')
         ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
         RETURNING id",
    )
    .bind(demo.owner_email)
    .bind(password_hash)
    .bind(demo.owner_name)
    .fetch_one(&mut *tx)
    .await?;

    let restaurant_id: Option<i32> = sqlx::query_scalar(
        "INSERT INTO restaurants
             (owner_id, name, description, cuisine, address, phone, is_open,
              delivery_time_minutes)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
         ON CONFLICT (owner_id) DO NOTHING
         RETURNING id",
    )
    .bind(owner_id)
    .bind(demo.name)
    .bind(demo.description)
    .bind(demo.cuisine.iter().map(|c| (*c).to_owned()).collect::<Vec<_>>())
    .bind(demo.address)
    .bind(demo.phone)
    .bind(demo.delivery_time_minutes)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(restaurant_id) = restaurant_id else {
        tracing::info!(restaurant = demo.name, "Already seeded, skipping");
        tx.rollback().await?;
        return Ok(());
    };

    for item in demo.menu {
        sqlx::query(
            "INSERT INTO menu_items
                 (restaurant_id, name, description, price, category, available)
             VALUES ($1, $2, $3, $4::NUMERIC, $5, TRUE)",
        )
        .bind(restaurant_id)
        .bind(item.name)
        .bind(item.description)
        .bind(item.price)
        .bind(item.category)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "INSERT INTO promotions
             (restaurant_id, code, description, kind, value, usage_limit, expiry_date)
         VALUES ($1, UPPER($2), $3, $4::promotion_kind, $5::NUMERIC, $6,
                 NOW() + INTERVAL '90 days')
         ON CONFLICT (code) DO NOTHING",
    )
    .bind(restaurant_id)
    .bind(demo.promotion.code)
    .bind(demo.promotion.description)
    .bind(demo.promotion.kind)
    .bind(demo.promotion.value)
    .bind(demo.promotion.usage_limit)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(restaurant = demo.name, "Seeded");
    Ok(())
}
