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
//! [tracing-logstash](crate) errors

use backtrace::Backtrace;

/// The `tracing` target under which this crate reports its own troubles.
///
/// The [`Layer`](crate::layer::Layer) refuses to forward events with this target, so a failing
/// send can never feed back into the sink that failed.
pub const DIAGNOSTICS_TARGET: &str = "tracing_logstash::diagnostics";

/// Report a failure inside the sink.
///
/// When the current subscriber is interested in [`DIAGNOSTICS_TARGET`] the report is a `tracing`
/// event at level ERROR; otherwise (no subscriber installed yet, or a program logging only
/// through the `log` adapter) it's written to stderr.
pub(crate) fn report(args: std::fmt::Arguments<'_>) {
    report_to(args, &mut std::io::stderr())
}

fn report_to<W: std::io::Write>(args: std::fmt::Arguments<'_>, fallback: &mut W) {
    if ::tracing::enabled!(target: DIAGNOSTICS_TARGET, ::tracing::Level::ERROR) {
        ::tracing::error!(target: DIAGNOSTICS_TARGET, "{}", args);
    } else {
        // Nowhere left to complain if stderr fails, too.
        let _ = writeln!(fallback, "tracing-logstash: {}", args);
    }
}

/// [tracing-logstash](crate) error type
///
/// Like its sibling crates, [tracing-logstash](crate) eschews libraries like [thiserror],
/// [anyhow] & [Snafu] in favor of a straightforward enumeration with a few match arms chosen on
/// the basis what the caller will need to repond.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// The Logstash port was not an integer in 0-65535
    BadPort { text: String, back: Backtrace },
    /// No Logstash port was configured
    MissingPort { back: Backtrace },
    /// A boolean attribute was neither "true" nor "false"
    BadBoolean {
        name: &'static str,
        text: String,
        back: Backtrace,
    },
    /// The stacktrace length was not an integer
    BadStacktraceLength { text: String, back: Backtrace },
    /// Unknown severity scale name
    BadSeverityScale { text: String, back: Backtrace },
    /// The same literal parameter was given twice
    DuplicateParameter { key: String, back: Backtrace },
    /// Failed to resolve the Logstash host to a socket address
    Resolve {
        host: String,
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
        back: Backtrace,
    },
    /// Failed to create the outbound socket
    Socket {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadPort { text, .. } => {
                write!(f, "logstashPort must be an integer value in 0-65535, not {:?}", text)
            }
            Error::MissingPort { .. } => write!(f, "No logstashPort was provided"),
            Error::BadBoolean { name, text, .. } => {
                write!(f, "{} must be either true or false, not {:?}", name, text)
            }
            Error::BadStacktraceLength { text, .. } => {
                write!(f, "stacktraceLength must be an integer value, not {:?}", text)
            }
            Error::BadSeverityScale { text, .. } => write!(
                f,
                "severityScale must be either log4j or syslog, not {:?}",
                text
            ),
            Error::DuplicateParameter { key, .. } => {
                write!(f, "The parameter {:?} was given more than once", key)
            }
            Error::Resolve {
                host,
                source: Some(source),
                ..
            } => write!(f, "Could not find host {}: {}", host, source),
            Error::Resolve { host, .. } => write!(f, "Could not find host {}", host),
            Error::Socket { source, .. } => write!(f, "Could not create UDP socket: {}", source),
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other tracing-logstash error"),
        }
    }
}

impl std::fmt::Debug for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadPort { back, .. }
            | Error::MissingPort { back }
            | Error::BadBoolean { back, .. }
            | Error::BadStacktraceLength { back, .. }
            | Error::BadSeverityScale { back, .. }
            | Error::DuplicateParameter { back, .. }
            | Error::Resolve { back, .. }
            | Error::Socket { back, .. }
            | Error::Transport { back, .. } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "tracing-logstash error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Resolve {
                source: Some(source),
                ..
            }
            | Error::Socket { source, .. }
            | Error::Transport { source, .. } => {
                Some(&**source as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A [`Layer`](tracing_subscriber::Layer) that keeps the messages of events reported under
/// [`DIAGNOSTICS_TARGET`]
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct DiagnosticsRecorder(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

#[cfg(test)]
impl DiagnosticsRecorder {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl<S: tracing_core::Subscriber> tracing_subscriber::Layer<S> for DiagnosticsRecorder {
    fn on_event(
        &self,
        event: &tracing_core::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        struct Message(String);
        impl tracing_core::field::Visit for Message {
            fn record_debug(
                &mut self,
                field: &tracing_core::field::Field,
                value: &dyn std::fmt::Debug,
            ) {
                if field.name() == "message" {
                    self.0 = format!("{:?}", value);
                }
            }
        }
        if event.metadata().target() == DIAGNOSTICS_TARGET {
            let mut msg = Message(String::new());
            event.record(&mut msg);
            self.0.lock().unwrap().push(msg.0);
        }
    }
}
