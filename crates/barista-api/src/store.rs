//! Order store calls wrapped in request-scoped child spans

use std::future::Future;
use std::time::{Duration, Instant};

use barista_core::{AppError, CoffeeOrder, CreateCoffeeOrder};
use barista_db::OrderStore;
use barista_infra::Tracing;
use chrono::{DateTime, Utc};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};

/// Borrowed view of the store that records one `db.*` span per call,
/// parented on the request span.
pub(crate) struct TracedStore<'a> {
    inner: &'a dyn OrderStore,
    tracing: &'a Tracing,
    parent: &'a Context,
}

impl<'a> TracedStore<'a> {
    pub(crate) fn new(inner: &'a dyn OrderStore, tracing: &'a Tracing, parent: &'a Context) -> Self {
        Self {
            inner,
            tracing,
            parent,
        }
    }

    async fn observe<T, F>(
        &self,
        operation: &'static str,
        mut attributes: Vec<KeyValue>,
        call: F,
    ) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        attributes.push(KeyValue::new("db.system", "postgresql"));
        attributes.push(KeyValue::new("db.operation", operation));
        attributes.push(KeyValue::new("db.sql.table", "coffee_orders"));

        let cx = self.tracing.start(
            format!("db.{}", operation),
            SpanKind::Client,
            self.parent,
            attributes,
        );
        let started = Instant::now();
        let result = call.await;

        let span = cx.span();
        span.set_attribute(KeyValue::new(
            "db.query.duration",
            started.elapsed().as_secs_f64(),
        ));
        match &result {
            Ok(_) => span.set_status(Status::Ok),
            Err(e) => {
                span.record_error(e);
                span.set_status(Status::error(e.to_string()));
            }
        }
        span.end();

        result
    }

    pub(crate) async fn ping(&self) -> Result<(), AppError> {
        self.observe("ping", vec![], self.inner.ping()).await
    }

    pub(crate) async fn get_order(&self, id: i32) -> Result<CoffeeOrder, AppError> {
        self.observe(
            "get_order",
            vec![KeyValue::new("coffee_order.id", i64::from(id))],
            self.inner.get_order(id),
        )
        .await
    }

    pub(crate) async fn create_order(
        &self,
        order: &CreateCoffeeOrder,
    ) -> Result<CoffeeOrder, AppError> {
        self.observe("create_order", vec![], self.inner.create_order(order))
            .await
    }

    pub(crate) async fn create_order_at(
        &self,
        order: &CreateCoffeeOrder,
        created_at: DateTime<Utc>,
    ) -> Result<CoffeeOrder, AppError> {
        self.observe(
            "create_order_at",
            vec![KeyValue::new("coffee_order.created_at", created_at.to_rfc3339())],
            self.inner.create_order_at(order, created_at),
        )
        .await
    }

    pub(crate) async fn slow_count(&self, delay: Duration) -> Result<i64, AppError> {
        self.observe(
            "slow_count",
            vec![KeyValue::new("db.sleep_seconds", delay.as_secs_f64())],
            self.inner.slow_count(delay),
        )
        .await
    }
}
