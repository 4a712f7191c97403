use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A persisted coffee order.
///
/// `id` is assigned by the store and never changes after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CoffeeOrder {
    pub id: i32,
    pub user_name: String,
    pub coffee_type: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for placing an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateCoffeeOrder {
    #[schema(example = "Ada")]
    pub user_name: String,
    #[schema(example = "latte")]
    pub coffee_type: String,
}

impl CreateCoffeeOrder {
    pub fn new(user_name: impl Into<String>, coffee_type: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            coffee_type: coffee_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_order_requires_both_fields() {
        let parsed: Result<CreateCoffeeOrder, _> =
            serde_json::from_str(r#"{"user_name":"Ada"}"#);
        assert!(parsed.is_err());

        let parsed: CreateCoffeeOrder =
            serde_json::from_str(r#"{"user_name":"Ada","coffee_type":"latte"}"#).unwrap();
        assert_eq!(parsed, CreateCoffeeOrder::new("Ada", "latte"));
    }

    #[test]
    fn order_serializes_with_wire_field_names() {
        let order = CoffeeOrder {
            id: 7,
            user_name: "Ada".into(),
            coffee_type: "latte".into(),
            created_at: DateTime::parse_from_rfc3339("2024-01-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["user_name"], "Ada");
        assert_eq!(value["coffee_type"], "latte");
        assert_eq!(value["created_at"], "2024-01-01T10:00:00Z");
    }
}
