// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-logstash.
//
// tracing-logstash is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// mpdpopm is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with mpdpopm.  If not,
// see <http://www.gnu.org/licenses/>.

//! [tracing-logstash](crate) [`Layer`] implementation.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! # Mapping tracing Events to Logstash documents
//!
//! - `message` is the event's "message" field (empty if it has none)
//! - `name` is the event's target
//! - `severity` & `severityText` come from the event's level, on the configured scale
//! - `className` & `lineNumber` are the event's module path (or file, failing that) & line
//! - `stacktrace` is rendered from the first field recorded as an error, e.g.
//!   `error!(error = &err as &dyn std::error::Error, "oops")`
//!
//! The "contextual data" against which configured keys are looked up is made up of the event's
//! own fields followed by the fields of each span in the event's scope, innermost first. So
//! given
//!
//! ```rust
//! use tracing::{info, info_span};
//! let span = info_span!("request", request_id = 17, user = "alice");
//! let _guard = span.enter();
//! info!(user = "bob", "Hello, world!");
//! ```
//!
//! `request_id` would be "17" & `user` would be "bob".

use crate::{
    appender::LogstashAppender,
    config::Config,
    error::{Result, DIAGNOSTICS_TARGET},
    event::{LogEvent, Location},
    severity::{Level, Severity},
    thrown::Thrown,
    transport::{Transport, UdpTransport},
};

use backtrace::Backtrace;
use tracing_core::{
    field::{Field, Visit},
    span, Event, Subscriber,
};
use tracing_subscriber::{
    layer::Context,
    registry::{LookupSpan, SpanRef},
};

use std::borrow::Cow;

// When the tracing-log feature is enabled, use NormalizeEvent to extract file/line metadata
// from events that originated from the `log` crate. This follows the same pattern used by
// tracing-subscriber's fmt layer.
// See: https://github.com/tokio-rs/tracing/blob/master/tracing-subscriber/src/fmt/fmt_layer.rs
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     recording field values                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Field values recorded on a span, stored in that span's extensions
#[derive(Debug, Default)]
struct SpanFields(Vec<(String, String)>);

impl SpanFields {
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
    fn put(&mut self, key: &str, value: String) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_owned(), value)),
        }
    }
}

struct SpanVisitor<'a>(&'a mut SpanFields);

impl Visit for SpanVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.put(field.name(), value.to_owned());
    }
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.put(field.name(), format!("{:?}", value));
    }
}

/// Pulls the message, the first error & everything else out of an [`Event`]
struct EventVisitor {
    message: Option<String>,
    thrown: Option<Thrown>,
    fields: Vec<(String, String)>,
    capture_backtraces: bool,
}

impl EventVisitor {
    fn new(capture_backtraces: bool) -> EventVisitor {
        EventVisitor {
            message: None,
            thrown: None,
            fields: Vec::new(),
            capture_backtraces,
        }
    }
    fn put(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            // Metadata smuggled in by tracing-log; we get at it through `NormalizeEvent`
            name if name.starts_with("log.") => (),
            name => self.fields.push((name.to_owned(), value)),
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_owned());
    }
    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if self.thrown.is_none() {
            self.thrown = Some(if self.capture_backtraces {
                Thrown::with_backtrace(value, &Backtrace::new())
            } else {
                Thrown::from_error(value)
            });
        }
        self.put(field, value.to_string());
    }
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // The tracing macros take care to "pre-format" the `message` field so that `value`
        // actually refers to a `std::fmt::Arguments` instance, which will print to a debug
        // format without enclosing double-quotes.
        self.put(field, format!("{:?}", value));
    }
}

/// A tracing [`Event`], as seen by the [`Encoder`](crate::encoder::Encoder)
struct TracingEvent<'a, 'm, S>
where
    S: for<'l> LookupSpan<'l>,
{
    logger_name: &'m str,
    location: Option<Location>,
    message: String,
    severity: Severity,
    thrown: Option<Thrown>,
    fields: Vec<(String, String)>,
    scope: Vec<SpanRef<'a, S>>,
}

impl<S> LogEvent for TracingEvent<'_, '_, S>
where
    S: for<'l> LookupSpan<'l>,
{
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }
    fn logger_name(&self) -> &str {
        self.logger_name
    }
    fn severity(&self) -> Severity {
        self.severity.clone()
    }
    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
    fn thrown(&self) -> Option<&Thrown> {
        self.thrown.as_ref()
    }
    fn context(&self, key: &str) -> Option<Cow<'_, str>> {
        if let Some((_, value)) = self.fields.iter().rev().find(|(k, _)| k == key) {
            return Some(Cow::Borrowed(value));
        }
        for span in &self.scope {
            let ext = span.extensions();
            if let Some(value) = ext.get::<SpanFields>().and_then(|f| f.get(key)) {
                return Some(Cow::Owned(value.to_owned()));
            }
        }
        None
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will send [`Event`]s to
/// Logstash.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct Layer<T: Transport = UdpTransport> {
    appender: LogstashAppender<T>,
    capture_backtraces: bool,
}

impl Layer<UdpTransport> {
    /// Construct a [`Layer`] that will send over UDP to the host & port named in `config`.
    ///
    /// Like [`LogstashAppender::new`], this doesn't fail; if the host can't be resolved the
    /// [`Layer`] will simply drop everything.
    pub fn new(config: Config) -> Self {
        Layer::with_appender(LogstashAppender::new(config))
    }
    /// Construct a [`Layer`] configured from the environment; see [`Config::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Layer::new(Config::from_env()?))
    }
}

impl<T: Transport> Layer<T> {
    pub fn with_appender(appender: LogstashAppender<T>) -> Self {
        Layer {
            appender,
            capture_backtraces: true,
        }
    }
    /// Whether to capture a backtrace when an event carries an error (the default), to be
    /// rendered into the `stacktrace` field
    pub fn with_backtraces(mut self, capture: bool) -> Self {
        self.capture_backtraces = capture;
        self
    }
    pub fn appender(&self) -> &LogstashAppender<T> {
        &self.appender
    }
}

impl<S, T> tracing_subscriber::layer::Layer<S> for Layer<T>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    T: Transport + 'static,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            // Another Layer of ours in the same registry may have got here first.
            let mut ext = span.extensions_mut();
            match ext.get_mut::<SpanFields>() {
                Some(fields) => attrs.record(&mut SpanVisitor(fields)),
                None => {
                    let mut fields = SpanFields::default();
                    attrs.record(&mut SpanVisitor(&mut fields));
                    ext.insert(fields);
                }
            }
        }
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut ext = span.extensions_mut();
            if let Some(fields) = ext.get_mut::<SpanFields>() {
                values.record(&mut SpanVisitor(fields));
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // Our own complaints go to the other layers, not back to us.
        if event.metadata().target() == DIAGNOSTICS_TARGET || !self.appender.transport().is_ready() {
            return;
        }

        // When the tracing-log feature is enabled, use normalized_metadata() to get
        // file/line info for events that originated from the `log` crate.
        // For native tracing events, normalized_metadata() returns None and we use
        // the event's own metadata.
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        let mut visitor = EventVisitor::new(self.capture_backtraces);
        event.record(&mut visitor);

        let config = self.appender.config();
        let location = config.append_class_information().then(|| Location {
            class_name: meta.module_path().or(meta.file()).map(str::to_owned),
            line_number: meta.line(),
        });

        let view = TracingEvent {
            logger_name: meta.target(),
            location,
            message: visitor.message.unwrap_or_default(),
            severity: config.severity_scale().severity(Level::from(meta.level())),
            thrown: visitor.thrown,
            fields: visitor.fields,
            scope: ctx
                .event_scope(event)
                .map(|scope| scope.collect())
                .unwrap_or_default(),
        };
        self.appender.append(&view);
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use crate::{
        error::Error,
        thrown::LINE_SEPARATOR,
    };

    use tracing::{error, info, info_span};
    use tracing_subscriber::{
        layer::SubscriberExt, // Needed to get `with()`
        registry::Registry,
    };

    use std::{
        net::UdpSocket,
        sync::{Arc, Mutex},
        time::Duration,
    };

    /// A [`Transport`] that just keeps everything it's sent
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<Vec<u8>>>>);

    impl Transport for Capture {
        fn send(&self, buf: &[u8]) -> Result<usize> {
            self.0.lock().unwrap().push(buf.to_vec());
            Ok(buf.len())
        }
    }

    impl Capture {
        fn docs(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|v| String::from_utf8(v.clone()).unwrap())
                .collect()
        }
    }

    fn capture_with(config: Config, f: impl FnOnce()) -> Vec<String> {
        let capture = Capture::default();
        let layer = Layer::with_appender(LogstashAppender::with_transport(config, capture.clone()))
            .with_backtraces(false);
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        capture.docs()
    }

    #[derive(Debug)]
    struct Failure;

    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Error")
        }
    }

    impl std::error::Error for Failure {}

    #[test]
    fn without_details() {
        let docs = capture_with(Config::builder("localhost", 12345).build(), || {
            info!("Hello World!");
        });
        assert_eq!(
            docs,
            vec![r#"{"message":"Hello World!","name":"tracing_logstash::layer::smoke","severity":400,"severityText":"INFO"}"#]
        );
    }

    #[test]
    fn with_details() {
        let config = Config::builder("localhost", 12345)
            .application("Test")
            .environment("Development")
            .append_class_information(true)
            .mdc_keys_as_str("key1,key2,key3")
            .build();
        let docs = capture_with(config, || {
            let span = info_span!("task", key2 = "value2", key4 = "value4");
            let _guard = span.enter();
            let err = Failure;
            error!(error = &err as &(dyn std::error::Error + 'static), "Some message");
        });
        assert_eq!(1, docs.len());

        let doc: serde_json::Value = serde_json::from_str(&docs[0]).unwrap();
        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "message",
                "name",
                "severity",
                "severityText",
                "application",
                "environment",
                "className",
                "lineNumber",
                "stacktrace",
                "key2"
            ]
        );
        assert_eq!(doc["message"], "Some message");
        assert_eq!(doc["severity"], 200);
        assert_eq!(doc["severityText"], "ERROR");
        assert_eq!(doc["className"], "tracing_logstash::layer::smoke");
        assert!(doc["lineNumber"].as_str().unwrap().parse::<u32>().is_ok());
        assert_eq!(doc["stacktrace"], format!("Error{}", LINE_SEPARATOR));
        assert_eq!(doc["key2"], "value2");
    }

    #[test]
    fn context_precedence() {
        let config = Config::builder("localhost", 12345)
            .mdc_keys_as_str("user, request_id, late, missing")
            .build();
        let docs = capture_with(config, || {
            let outer = info_span!(
                "request",
                request_id = 17,
                user = "alice",
                late = tracing::field::Empty
            );
            let _outer = outer.enter();
            let inner = info_span!("handler", user = "carol");
            let _inner = inner.enter();
            info!("first");
            outer.record("late", "recorded");
            info!(user = "bob", "second");
        });
        assert_eq!(
            docs,
            vec![
                r#"{"message":"first","name":"tracing_logstash::layer::smoke","severity":400,"severityText":"INFO","user":"carol","request_id":"17"}"#,
                r#"{"message":"second","name":"tracing_logstash::layer::smoke","severity":400,"severityText":"INFO","user":"bob","request_id":"17","late":"recorded"}"#,
            ]
        );
    }

    #[test]
    fn ignores_own_diagnostics() {
        let docs = capture_with(Config::builder("localhost", 12345).build(), || {
            error!(target: DIAGNOSTICS_TARGET, "Could not send UDP packet");
            info!(target: "elsewhere", "kept");
        });
        assert_eq!(1, docs.len());
        assert!(docs[0].contains(r#""name":"elsewhere""#));
    }

    #[test]
    fn with_captured_backtrace() {
        let capture = Capture::default();
        let layer = Layer::with_appender(LogstashAppender::with_transport(
            Config::builder("localhost", 12345)
                .stacktrace_length(Some(500))
                .build(),
            capture.clone(),
        ));
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            let err = Failure;
            error!(error = &err as &(dyn std::error::Error + 'static), "boom");
        });
        let docs = capture.docs();
        assert_eq!(1, docs.len());
        let doc: serde_json::Value = serde_json::from_str(&docs[0]).unwrap();
        let trace = doc["stacktrace"].as_str().unwrap();
        assert!(trace.starts_with("Error"));
        assert!(trace.chars().count() <= 500);
        assert!(trace.ends_with(crate::thrown::TRUNCATION_MARKER));
    }

    #[test]
    fn over_udp() {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let port = rx.local_addr().unwrap().port();

        let layer = Layer::new(
            Config::builder("127.0.0.1", port)
                .parameters_as_str("group=PSP&group2=REQUEST")
                .unwrap()
                .build(),
        );
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            info!("Test static keys!");
        });

        let mut buf = [0u8; 1024];
        let n = rx.recv(&mut buf).unwrap();
        assert_eq!(
            std::str::from_utf8(&buf[..n]).unwrap(),
            r#"{"message":"Test static keys!","name":"tracing_logstash::layer::smoke","severity":400,"severityText":"INFO","group":"PSP","group2":"REQUEST"}"#
        );
    }

    #[test]
    fn unresolvable_host() {
        let layer = Layer::new(Config::builder("no-such-host.invalid", 5000).build());
        assert!(!layer.appender().transport().is_ready());
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            info!("Goes nowhere");
        });
    }

    #[test]
    fn two_destinations() {
        let (first, second) = (Capture::default(), Capture::default());
        let config = Config::builder("localhost", 12345)
            .mdc_key("requestId")
            .build();
        let subscriber = Registry::default()
            .with(Layer::with_appender(LogstashAppender::with_transport(
                config.clone(),
                first.clone(),
            )))
            .with(Layer::with_appender(LogstashAppender::with_transport(
                config,
                second.clone(),
            )));
        tracing::subscriber::with_default(subscriber, || {
            let span = info_span!("request", requestId = "r-1", late = tracing::field::Empty);
            let _guard = span.enter();
            span.record("late", "x");
            info!("hi");
        });
        let expected = vec![
            r#"{"message":"hi","name":"tracing_logstash::layer::smoke","severity":400,"severityText":"INFO","requestId":"r-1"}"#,
        ];
        assert_eq!(first.docs(), expected);
        assert_eq!(second.docs(), expected);
    }

    #[test]
    fn from_attributes() {
        assert!(matches!(
            Config::from_attributes(vec![("logstashHost", "127.0.0.1")]),
            Err(Error::MissingPort { .. })
        ));
        let layer = Layer::new(
            Config::from_attributes(vec![("logstashHost", "127.0.0.1"), ("logstashPort", "5000")])
                .unwrap(),
        );
        assert!(layer.appender().transport().is_ready());
        assert_eq!(5000, layer.appender().config().port());
    }
}
