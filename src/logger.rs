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

//! A [`log`] implementation that sends straight to Logstash.
//!
//! [`log`]: https://docs.rs/log/latest/log/index.html
//!
//! Programs that log through the [`log`] facade, & don't otherwise use [`tracing`], can install a
//! [`Logger`] directly:
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! ```no_run
//! use tracing_logstash::{config::Config, logger};
//! logger::init(Config::builder("logstash.local", 5000).build(), log::LevelFilter::Info).unwrap();
//! log::info!(user = "alice"; "Hello, world!");
//! ```
//!
//! The record's structured key-values serve as the contextual data, its target as the logger
//! name & its module path (or file) & line as the location.
//!
//! With no [`tracing`] subscriber installed, the sink's own complaints (a host that won't
//! resolve, a failed send) are written to stderr.

use crate::{
    appender::LogstashAppender,
    config::Config,
    error::DIAGNOSTICS_TARGET,
    event::{LogEvent, Location},
    severity::{Level, Severity},
    transport::{Transport, UdpTransport},
};

use log::{kv::Key, LevelFilter, Metadata, Record};

use std::borrow::Cow;

/// A [`log::Record`], as seen by the [`Encoder`](crate::encoder::Encoder)
struct LogRecord<'a, 'r> {
    record: &'a Record<'r>,
    severity: Severity,
}

impl LogEvent for LogRecord<'_, '_> {
    fn message(&self) -> Cow<'_, str> {
        match self.record.args().as_str() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(self.record.args().to_string()),
        }
    }
    fn logger_name(&self) -> &str {
        self.record.target()
    }
    fn severity(&self) -> Severity {
        self.severity.clone()
    }
    fn location(&self) -> Option<Location> {
        Some(Location {
            class_name: self
                .record
                .module_path()
                .or(self.record.file())
                .map(str::to_owned),
            line_number: self.record.line(),
        })
    }
    fn context(&self, key: &str) -> Option<Cow<'_, str>> {
        self.record
            .key_values()
            .get(Key::from_str(key))
            .map(|value| Cow::Owned(value.to_string()))
    }
}

/// A [`log::Log`] implementation that hands each [`Record`] to a [`LogstashAppender`]
pub struct Logger<T: Transport = UdpTransport> {
    appender: LogstashAppender<T>,
    level: LevelFilter,
}

impl Logger<UdpTransport> {
    pub fn new(config: Config, level: LevelFilter) -> Self {
        Logger::with_appender(LogstashAppender::new(config), level)
    }
}

impl<T: Transport> Logger<T> {
    pub fn with_appender(appender: LogstashAppender<T>, level: LevelFilter) -> Self {
        Logger { appender, level }
    }
    pub fn appender(&self) -> &LogstashAppender<T> {
        &self.appender
    }
}

impl<T: Transport + Send + Sync> log::Log for Logger<T> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        // If `tracing` is forwarding to `log`, our own diagnostics could come back around.
        metadata.level() <= self.level && metadata.target() != DIAGNOSTICS_TARGET
    }
    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let severity = self
            .appender
            .config()
            .severity_scale()
            .severity(Level::from(record.level()));
        self.appender.append(&LogRecord { record, severity });
    }
    fn flush(&self) {}
}

/// Install a [`Logger`] sending to the host & port named in `config` as the global logger, at
/// `level`
pub fn init(config: Config, level: LevelFilter) -> std::result::Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(Logger::new(config, level)))?;
    log::set_max_level(level);
    Ok(())
}
