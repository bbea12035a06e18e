//! This module provides a `tracing` layer that forwards events from the rest
//! of the application to the log viewer.
use crate::logger::{LogOptions, Logger};
use crate::record::{CallSite, LogLevel};
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    EnvFilter, Layer,
};

/// Category given to records that come from `tracing` events.
pub const TRACING_CATEGORY: &str = "Tracing";

/// Events from this crate are never forwarded, so the logger's own
/// diagnostics cannot feed back into it.
const OWN_TARGET: &str = "webview_logger";

/// A `tracing` layer that turns events into viewer records.
pub struct ViewerLayer {
    logger: Arc<Logger>,
}

impl ViewerLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    /// Installs the global subscriber: an `EnvFilter` (from `RUST_LOG`,
    /// defaulting to `info`), a console formatter, and this layer.
    ///
    /// # Errors
    ///
    /// This function will return an error if a global default subscriber has
    /// already been set.
    pub fn init_subscriber(
        logger: Arc<Logger>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(ViewerLayer::new(logger));

        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }
}

impl<S> Layer<S> for ViewerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if target == OWN_TARGET || target.starts_with("webview_logger::") {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let function = metadata
            .module_path()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or_default();
        let callsite = CallSite::new(
            metadata.file().unwrap_or(target),
            function,
            metadata.line().unwrap_or(0),
        );

        let mut options = LogOptions::new()
            .source(target)
            .category(TRACING_CATEGORY)
            .callsite(callsite);
        if !visitor.fields.is_empty() {
            options = options.data(Value::Object(visitor.fields));
        }

        self.logger
            .log(visitor.message, LogLevel::from(metadata.level()), options);
    }
}

/// Collects the `message` field as text and every other field as JSON.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &tracing::field::Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.insert(field, Value::String(format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        let value = Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.insert(field, value);
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }
}
