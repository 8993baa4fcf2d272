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

//! The view of a log event that the [`Encoder`](crate::encoder::Encoder) works from.
//!
//! Each logging framework has its own idea of what an event is. [`LogEvent`] is the least the
//! encoder needs to know about one; the [`layer`](crate::layer) & [`logger`](crate::logger)
//! modules adapt [`tracing`] & [`log`] respectively, and [`Record`] is a plain owned
//! implementation for everyone else (and for testing).
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`log`]: https://docs.rs/log/latest/log/index.html

use crate::{severity::Severity, thrown::Thrown};

use std::borrow::Cow;

/// Where in the source a log event was raised
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// The enclosing "class"; for Rust, the module path
    pub class_name: Option<String>,
    pub line_number: Option<u32>,
}

/// Operations all log events must support.
pub trait LogEvent {
    /// The formatted message
    fn message(&self) -> Cow<'_, str>;
    /// The name of the logger that raised this event
    fn logger_name(&self) -> &str;
    fn severity(&self) -> Severity;
    fn location(&self) -> Option<Location> {
        None
    }
    /// The error attached to this event, if any
    fn thrown(&self) -> Option<&Thrown> {
        None
    }
    /// Look up `key` in the contextual data that was in effect when this event was raised.
    fn context(&self, key: &str) -> Option<Cow<'_, str>>;
}

/// An owned [`LogEvent`]
#[derive(Clone, Debug)]
pub struct Record {
    message: String,
    logger_name: String,
    severity: Severity,
    location: Option<Location>,
    thrown: Option<Thrown>,
    context: Vec<(String, String)>,
}

impl Record {
    pub fn builder<M: Into<String>, N: Into<String>>(
        message: M,
        logger_name: N,
        severity: Severity,
    ) -> RecordBuilder {
        RecordBuilder {
            imp: Record {
                message: message.into(),
                logger_name: logger_name.into(),
                severity,
                location: None,
                thrown: None,
                context: Vec::new(),
            },
        }
    }
}

pub struct RecordBuilder {
    imp: Record,
}

impl RecordBuilder {
    pub fn location<C: Into<String>>(mut self, class_name: C, line_number: u32) -> Self {
        self.imp.location = Some(Location {
            class_name: Some(class_name.into()),
            line_number: Some(line_number),
        });
        self
    }
    pub fn thrown(mut self, thrown: Thrown) -> Self {
        self.imp.thrown = Some(thrown);
        self
    }
    /// Add a contextual key/value pair; a later value for the same key shadows an earlier one.
    pub fn context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.imp.context.push((key.into(), value.into()));
        self
    }
    pub fn build(self) -> Record {
        self.imp
    }
}

impl LogEvent for Record {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }
    fn logger_name(&self) -> &str {
        &self.logger_name
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
        self.context
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Cow::Borrowed(v.as_str()))
    }
}
