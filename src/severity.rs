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

//! Severity level defintions.
//!
//! Every Logstash document carries a `severity` (a number) and a `severityText` (its name). The
//! host logging framework has its own notion of level; [`Level`] is the framework-neutral version
//! of that, and a [`SeverityScale`] decides which number each [`Level`] becomes on the wire.
//!
//! Two scales are supported. [`SeverityScale::Log4j`] (the default) uses the "int levels" most
//! Logstash pipelines already expect, where smaller is more severe and the steps are hundreds:
//!
//! | Level | severity |
//! |-------|----------|
//! | FATAL | 100      |
//! | ERROR | 200      |
//! | WARN  | 300      |
//! | INFO  | 400      |
//! | DEBUG | 500      |
//! | TRACE | 600      |
//!
//! [`SeverityScale::Syslog`] uses the syslog severities (`LOG_EMERG` is 0, `LOG_DEBUG` is 7) as
//! documented in the `syslog()` manual [page].
//!
//! [page]: https://man7.org/linux/man-pages/man3/syslog.3.html

use crate::error::{Error, Result};

use backtrace::Backtrace;

type StdResult<T, E> = std::result::Result<T, E>;

/// Framework-neutral log level
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    /// The upper-case name under which this level appears in `severityText`
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", self.as_str())
    }
}

impl std::convert::From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match level {
            &tracing::Level::TRACE => Level::Trace,
            &tracing::Level::DEBUG => Level::Debug,
            &tracing::Level::INFO => Level::Info,
            &tracing::Level::WARN => Level::Warn,
            &tracing::Level::ERROR => Level::Error,
        }
    }
}

#[cfg(feature = "log")]
impl std::convert::From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Level::Trace,
            log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

/// The numeric severity & its name, as they will appear in a Logstash document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Severity {
    level: i64,
    name: std::borrow::Cow<'static, str>,
}

impl Severity {
    pub fn new<N: Into<std::borrow::Cow<'static, str>>>(level: i64, name: N) -> Severity {
        Severity {
            level,
            name: name.into(),
        }
    }
    /// The numeric level; always emitted as a bare JSON number
    pub fn level(&self) -> i64 {
        self.level
    }
    /// The human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How a [`Level`] is mapped to a numeric [`Severity`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SeverityScale {
    /// FATAL=100, ERROR=200, WARN=300, INFO=400, DEBUG=500, TRACE=600
    #[default]
    Log4j,
    /// The syslog severity; TRACE & DEBUG both map to `LOG_DEBUG`
    Syslog,
}

impl SeverityScale {
    pub fn severity(&self, level: Level) -> Severity {
        let n = match self {
            SeverityScale::Log4j => match level {
                Level::Fatal => 100,
                Level::Error => 200,
                Level::Warn => 300,
                Level::Info => 400,
                Level::Debug => 500,
                Level::Trace => 600,
            },
            SeverityScale::Syslog => SyslogLevel::from(level) as i64,
        };
        Severity::new(n, level.as_str())
    }
}

impl std::str::FromStr for SeverityScale {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("log4j") {
            Ok(SeverityScale::Log4j)
        } else if s.eq_ignore_ascii_case("syslog") {
            Ok(SeverityScale::Syslog)
        } else {
            Err(Error::BadSeverityScale {
                text: s.to_owned(),
                back: Backtrace::new(),
            })
        }
    }
}

/// The eight syslog severities; the discriminants duplicate the constants in `<syslog.h>`.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SyslogLevel {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

impl std::convert::From<Level> for SyslogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Fatal => SyslogLevel::LOG_EMERG,
            Level::Error => SyslogLevel::LOG_ERR,
            Level::Warn => SyslogLevel::LOG_WARNING,
            Level::Info => SyslogLevel::LOG_INFO,
            Level::Debug | Level::Trace => SyslogLevel::LOG_DEBUG,
        }
    }
}
