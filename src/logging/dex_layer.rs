use std::{collections::BTreeMap, time::SystemTime};

use tracing::{info, Level};
use tracing_subscriber::Layer;

use super::{EventSpan, LogEvent};

/// Collects `LogEvent`s emitted through `log_event!` into the enclosing INFO
/// span and logs a single entry when the outermost span closes.
#[derive(Default)]
pub struct DexLogsLayer {
    pub prod: bool,
    pub log_type: &'static str,
}

impl<S> Layer<S> for DexLogsLayer
where
    S: tracing::Subscriber,
    S: for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if *span.metadata().level() > Level::INFO {
            return;
        }

        let mut extensions = span.extensions_mut();
        extensions.insert(EventSpan::new(span.name()));
        extensions.insert(StartTime(SystemTime::now()));
    }

    fn on_close(&self, id: tracing::span::Id, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        let Some(mut event_span) = extensions.remove::<EventSpan>() else {
            return;
        };
        event_span.latency = match extensions.remove::<StartTime>() {
            Some(start) => SystemTime::now()
                .duration_since(start.0)
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or_default(),
            None => 0,
        };
        drop(extensions);

        let parent = span
            .scope()
            .skip(1)
            .find(|parent| parent.extensions().get::<EventSpan>().is_some());
        match parent {
            Some(parent) => {
                if let Some(parent_event_span) = parent.extensions_mut().get_mut::<EventSpan>() {
                    parent_event_span.children.push(event_span);
                }
            }
            None if event_span.is_empty() => {}
            None => {
                let entry = serde_json::to_string(&event_span).unwrap_or_default();
                if self.prod {
                    info!(
                        labels.log_type = self.log_type,
                        labels.handler = span.name(),
                        entry = entry,
                        "'{}' log entry",
                        span.name()
                    );
                } else {
                    info!("'{}' log entry ==> {entry}", span.name());
                }
            }
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let collector = FieldCollector::new(event);
        let Some(encoded) = collector.fields.get("event") else {
            return;
        };
        let Ok(log) = serde_json::from_str::<LogEvent>(encoded) else {
            return;
        };

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                let mut extensions = span.extensions_mut();
                if let Some(event_span) = extensions.get_mut::<EventSpan>() {
                    event_span.events.push(log);
                    return;
                }
            }
        }
    }
}

struct StartTime(SystemTime);

/// Keeps only the string-valued fields of an event.
struct FieldCollector {
    fields: BTreeMap<&'static str, String>,
}

impl FieldCollector {
    fn new(event: &tracing::Event<'_>) -> Self {
        let mut collector = FieldCollector {
            fields: BTreeMap::new(),
        };
        event.record(&mut collector);
        collector
    }
}

impl tracing::field::Visit for FieldCollector {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.insert(field.name(), value.to_owned());
    }

    fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {}
}
