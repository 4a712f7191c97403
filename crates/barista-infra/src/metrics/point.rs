use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub const REQUEST_DURATION: &str = "RequestDuration";
pub const REQUEST_COUNT: &str = "RequestCount";
pub const CREATED_COFFEE_ORDERS: &str = "CreatedCoffeeOrders";
pub const ERROR_COUNT: &str = "ErrorCount";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricUnit {
    Seconds,
    Count,
}

impl MetricUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Seconds => "Seconds",
            MetricUnit::Count => "Count",
        }
    }

    /// UCUM unit string used by OpenTelemetry instruments
    pub fn ucum(&self) -> &'static str {
        match self {
            MetricUnit::Seconds => "s",
            MetricUnit::Count => "1",
        }
    }
}

/// One observation. Dimension order is irrelevant, hence the sorted map.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub dimensions: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl MetricPoint {
    pub fn new(name: impl Into<String>, value: f64, unit: MetricUnit) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
            dimensions: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.into(), value.into());
        self
    }

    pub fn dimension(&self, key: &str) -> Option<&str> {
        self.dimensions.get(key).map(String::as_str)
    }

    pub fn request_duration(endpoint: &str, elapsed: Duration) -> Self {
        Self::new(REQUEST_DURATION, elapsed.as_secs_f64(), MetricUnit::Seconds)
            .with_dimension("Endpoint", endpoint)
    }

    pub fn request_count(endpoint: &str, status: u16) -> Self {
        Self::new(REQUEST_COUNT, 1.0, MetricUnit::Count)
            .with_dimension("Endpoint", endpoint)
            .with_dimension("StatusCode", status.to_string())
    }

    pub fn orders_created(user_name: &str, coffee_type: &str) -> Self {
        Self::new(CREATED_COFFEE_ORDERS, 1.0, MetricUnit::Count)
            .with_dimension("UserName", user_name)
            .with_dimension("CoffeeType", coffee_type)
    }

    pub fn error_count(error_type: &str) -> Self {
        Self::new(ERROR_COUNT, 1.0, MetricUnit::Count).with_dimension("ErrorType", error_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_count_dimensions() {
        let point = MetricPoint::request_count("/coffee/{id}", 404);
        assert_eq!(point.name, REQUEST_COUNT);
        assert_eq!(point.value, 1.0);
        assert_eq!(point.unit, MetricUnit::Count);
        assert_eq!(point.dimension("Endpoint"), Some("/coffee/{id}"));
        assert_eq!(point.dimension("StatusCode"), Some("404"));
    }

    #[test]
    fn duration_is_in_seconds() {
        let point = MetricPoint::request_duration("/health", Duration::from_millis(1500));
        assert_eq!(point.unit, MetricUnit::Seconds);
        assert!((point.value - 1.5).abs() < 1e-9);
        assert_eq!(point.unit.ucum(), "s");
    }
}
