//! User roles.

use serde::{Deserialize, Serialize};

/// Role attached to every account.
///
/// Stored as the `user_role` enum type in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "user_role", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Ordinary diner: browses, orders, cancels their own orders.
    #[default]
    Customer,
    /// Restaurant owner: manages one restaurant, its menu, promotions,
    /// and the delivery status of its orders.
    Restaurant,
    /// Platform operator: full access.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Restaurant => write!(f, "restaurant"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "restaurant" => Ok(Self::Restaurant),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for role in [UserRole::Customer, UserRole::Restaurant, UserRole::Admin] {
            assert_eq!(UserRole::from_str(&role.to_string()), Ok(role));
        }
        assert!(UserRole::from_str("owner").is_err());
    }
}
