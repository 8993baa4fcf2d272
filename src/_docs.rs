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

//! # General tracing-logstash Documentation
//!
//! ## Introduction
//!
//! General (i.e. not documenting a particular struct or a method) documentation goes here.
//!
//! ## From Log Events to Logstash Datagrams
//!
//! The journey from a log call to Logstash happens in three steps:
//!
//! 1. adapting the logging framework's event to a [LogEvent]
//! 2. encoding that [LogEvent] to a flat JSON object
//! 3. sending that object, as one UDP datagram, to Logstash
//!
//! [LogEvent]: crate::event::LogEvent
//!
//! ### Adapting Framework Events
//!
//! The encoder knows nothing of [tracing] or [log]. Trait [LogEvent] is the narrow view it needs of
//! an event: a message, a logger name, a [Severity], optionally a [Location] & a [Thrown] error,
//! and a way to look up contextual values by key. Each framework gets a private adapter:
//!
//! [tracing]: https://docs.rs/tracing/latest/tracing/index.html
//! [log]: https://docs.rs/log/latest/log/index.html
//! [Severity]: crate::severity::Severity
//! [Location]: crate::event::Location
//! [Thrown]: crate::thrown::Thrown
//!
//! - the [Layer](crate::layer::Layer) adapts [tracing] [Event]s, taking contextual values from the
//!   event's fields & then from the fields of its enclosing spans
//! - the [Logger](crate::logger::Logger) adapts [log] records, taking contextual values from the
//!   record's key-values
//!
//! [Event]: tracing::Event
//!
//! [Record](crate::event::Record) is a plain, owned implementation, handy for tests & for callers
//! who want to drive an [appender] by hand.
//!
//! [appender]: crate::appender::LogstashAppender
//!
//! ### Severities
//!
//! Logstash expects a numeric `severity` alongside the textual `severityText`. The numbers come
//! from a [SeverityScale]: either log4j's (FATAL is 100, ERROR 200 ... TRACE 600) or syslog's
//! (0 for EMERG through 7 for DEBUG). Log4j's is the default.
//!
//! [SeverityScale]: crate::severity::SeverityScale
//!
//! ### Encoding
//!
//! The [Encoder] writes each field in a fixed order, escaping strings the way Java's json-simple
//! does (so a `/` comes out as `\/`, and control & certain Unicode characters as `\uXXXX`). A
//! contextual key is only written if the event actually has a value for it. A rendered error is cut
//! down to the configured length, marker included.
//!
//! [Encoder]: crate::encoder::Encoder
//!
//! ### Sending the Datagram
//!
//! The [Transport] trait is the seam between encoding & the network. [UdpTransport] resolves the
//! destination & creates its socket once, up-front. If either step fails the failure is logged &
//! the transport (and so the appender) silently drops everything from then on. A failed send is
//! logged & forgotten.
//!
//! [Transport]: crate::transport::Transport
//! [UdpTransport]: crate::transport::UdpTransport
//!
//! ## Diagnostics
//!
//! Trouble inside this crate (a host that won't resolve, a send that fails) is reported via
//! [tracing] under the target [DIAGNOSTICS_TARGET]. The [Layer](crate::layer::Layer) ignores events
//! with that target, so they'll show up in whatever other layers you've stacked up (a console
//! layer, say) but never loop back to Logstash.
//!
//! When the current subscriber isn't interested in that target the report goes to stderr
//! instead. That covers a [Layer](crate::layer::Layer) whose host won't resolve (it's set up
//! before any subscriber is installed) & programs that only use the
//! [Logger](crate::logger::Logger).
//!
//! [DIAGNOSTICS_TARGET]: crate::error::DIAGNOSTICS_TARGET
