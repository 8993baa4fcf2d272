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

//! Errors attached to log events, rendered as stack traces.
//!
//! Logstash consumers expect a `stacktrace` field that looks like the classic multi-line
//! rendering:
//!
//! ```text
//! connection refused
//! 	at my_app::net::connect(src/net.rs:42)
//! 	at my_app::main(src/main.rs:7)
//! Caused by: os error 111
//! ```
//!
//! That is: the error's [`Display`], one `at` line per backtrace frame (if a [`Backtrace`] was
//! captured), then one `Caused by:` line per error in its [`source`] chain. Each line is
//! terminated by the platform line separator.
//!
//! [`Display`]: std::fmt::Display
//! [`source`]: std::error::Error::source

use backtrace::Backtrace;

/// The platform line separator
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// The platform line separator
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Appended to stack traces that have been truncated
pub const TRUNCATION_MARKER: &str = "...[truncated by logstash appender]";

/// An error attached to a log event, already rendered to its multi-line text.
///
/// The error itself generally doesn't outlive the call that logged it, so we render eagerly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thrown {
    text: String,
}

impl Thrown {
    /// Render `err` & its `source` chain, without any frames.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Thrown {
        Thrown::render(err, None)
    }
    /// Render `err`, the frames in `back`, and then `err`'s `source` chain.
    pub fn with_backtrace(err: &(dyn std::error::Error + 'static), back: &Backtrace) -> Thrown {
        Thrown::render(err, Some(back))
    }
    /// Take a stack trace that some other party has already rendered.
    pub fn from_rendered<S: Into<String>>(text: S) -> Thrown {
        Thrown { text: text.into() }
    }
    /// The full, untruncated, rendering
    pub fn rendered(&self) -> &str {
        &self.text
    }
    /// The rendering, cut down to `limit` characters (if given).
    ///
    /// Truncation keeps the first `min(len, limit) - len(TRUNCATION_MARKER)` characters & then
    /// appends [`TRUNCATION_MARKER`]. Note that this happens even when the rendering is already
    /// shorter than `limit`. When `limit` is smaller than the marker itself, the kept prefix
    /// saturates at zero characters & the result is just the marker.
    pub fn truncated(&self, limit: Option<usize>) -> std::borrow::Cow<'_, str> {
        match limit {
            None => std::borrow::Cow::Borrowed(&self.text),
            Some(limit) => {
                let keep = self
                    .text
                    .chars()
                    .count()
                    .min(limit)
                    .saturating_sub(TRUNCATION_MARKER.chars().count());
                let mut out: String = self.text.chars().take(keep).collect();
                out.push_str(TRUNCATION_MARKER);
                std::borrow::Cow::Owned(out)
            }
        }
    }

    fn render(err: &(dyn std::error::Error + 'static), back: Option<&Backtrace>) -> Thrown {
        use std::fmt::Write;
        let mut text = String::new();
        // `write!` to a `String` can't fail
        let _ = write!(text, "{}{}", err, LINE_SEPARATOR);
        if let Some(back) = back {
            for frame in back.frames() {
                for sym in frame.symbols() {
                    let name = match sym.name() {
                        Some(name) => name.to_string(),
                        None => continue,
                    };
                    let _ = match (sym.filename(), sym.lineno()) {
                        (Some(file), Some(line)) => write!(
                            text,
                            "\tat {}({}:{}){}",
                            name,
                            file.display(),
                            line,
                            LINE_SEPARATOR
                        ),
                        _ => write!(text, "\tat {}(Unknown Source){}", name, LINE_SEPARATOR),
                    };
                }
            }
        }
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = write!(text, "Caused by: {}{}", cause, LINE_SEPARATOR);
            source = cause.source();
        }
        Thrown { text }
    }
}
