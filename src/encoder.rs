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

//! Encoding log events as Logstash JSON documents.
//!
//! [`Encoder`] turns one [`LogEvent`] into one flat JSON object. The fields always appear in this
//! order:
//!
//! 1. `message`
//! 2. `name` (the logger name)
//! 3. `severity` (a bare number)
//! 4. `severityText`
//! 5. `application`, if configured
//! 6. `environment`, if configured
//! 7. `className` & `lineNumber` (both strings), if configured to append class information
//! 8. `stacktrace`, if the event carries an error
//! 9. each configured contextual key that the event actually has a value for
//! 10. each configured literal parameter
//!
//! For example, with no optional configuration at all:
//!
//! ```rust
//! use tracing_logstash::{
//!     config::Config,
//!     encoder::Encoder,
//!     event::Record,
//!     severity::{Level, SeverityScale},
//! };
//! let encoder = Encoder::new(Config::builder("localhost", 5000).build());
//! let record = Record::builder("Hello World!", "my_app", SeverityScale::Log4j.severity(Level::Info))
//!     .build();
//! assert_eq!(
//!     encoder.encode(&record),
//!     br#"{"message":"Hello World!","name":"my_app","severity":400,"severityText":"INFO"}"#
//! );
//! ```

use crate::{config::Config, event::LogEvent, json::JsonObject};

/// Encodes [`LogEvent`]s according to a [`Config`].
///
/// Encoding has no side-effects & depends only upon the event & the configuration, so the same
/// [`Encoder`] may be shared freely across threads.
#[derive(Clone, Debug)]
pub struct Encoder {
    config: Config,
}

impl Encoder {
    pub fn new(config: Config) -> Encoder {
        Encoder { config }
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    /// Encode `event` to UTF-8 JSON
    pub fn encode<E: LogEvent + ?Sized>(&self, event: &E) -> Vec<u8> {
        let mut obj = JsonObject::with_capacity(256);

        let severity = event.severity();
        obj.field("message", &*event.message())
            .field("name", event.logger_name())
            .field("severity", severity.level())
            .field("severityText", severity.name());

        if let Some(application) = self.config.application() {
            obj.field("application", application);
        }
        if let Some(environment) = self.config.environment() {
            obj.field("environment", environment);
        }

        if self.config.append_class_information() {
            let location = event.location();
            let class_name = location.as_ref().and_then(|l| l.class_name.as_deref());
            let line_number = location
                .as_ref()
                .and_then(|l| l.line_number)
                .map(|n| n.to_string());
            obj.field("className", class_name)
                .field("lineNumber", line_number.as_deref());
        }

        if let Some(thrown) = event.thrown() {
            obj.field(
                "stacktrace",
                &*thrown.truncated(self.config.stacktrace_length()),
            );
        }

        for key in self.config.mdc_keys() {
            if let Some(value) = event.context(key) {
                obj.field(key, &*value);
            }
        }

        for (key, value) in self.config.parameters() {
            obj.field(key, value.as_str());
        }

        obj.finish()
    }
}
