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

//! A [`tracing-subscriber`] [`Layer`] implementation for sending [`tracing`] [`Event`]s to
//! [Logstash] as JSON documents over UDP
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/0.1.35/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//! [Logstash]: https://www.elastic.co/logstash
//!
//! # Introduction
//!
//! [Logstash] will happily accept JSON documents, one per UDP datagram, via its [udp input] &
//! [json codec]. This crate turns each log event into one such document & fires it off. There's
//! no acknowledgement, no retry & no buffering: a log call never blocks on the network & never
//! fails. Events that can't be delivered are simply lost (after a complaint is logged under the
//! [`DIAGNOSTICS_TARGET`](error::DIAGNOSTICS_TARGET) target, or written to stderr if no
//! subscriber wants it).
//!
//! [udp input]: https://www.elastic.co/guide/en/logstash/current/plugins-inputs-udp.html
//! [json codec]: https://www.elastic.co/guide/en/logstash/current/plugins-codecs-json.html
//!
//! A document looks something like this:
//!
//! ```text
//! {"message":"Hello, world!","name":"my_app::server","severity":400,"severityText":"INFO",
//!  "application":"my_app","environment":"Production","requestId":"r-17"}
//! ```
//!
//! (all on one line). See [`encoder`] for the precise layout.
//!
//! # Usage
//!
//! [`tracing-logstash`](crate)'s [`Layer`] only needs to know where Logstash is listening:
//!
//! ```rust
//! use tracing::info;
//! use tracing_logstash::{config::Config, layer::Layer};
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! let subscriber = Registry::default().with(Layer::new(Config::builder("127.0.0.1", 5000).build()));
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! info!("Hello, world!");
//! ```
//!
//! That said, the document contents are configurable: an application & environment name can be
//! stamped on every document, the event's location can be included, errors recorded on events are
//! rendered (to a bounded length) into a `stacktrace` field, selected span & event fields can be
//! copied over & fixed key/value pairs can be added:
//!
//! ```no_run
//! use tracing::{error, info_span};
//! use tracing_logstash::{config::Config, layer::Layer};
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! let config = Config::builder("logstash.local", 5000)
//!     .application("my_app")
//!     .environment("Production")
//!     .append_class_information(true)
//!     .stacktrace_length(Some(4096))
//!     .mdc_keys_as_str("requestId, user")
//!     .parameters_as_str("team=payments&tier=1")
//!     .unwrap()
//!     .build();
//! let subscriber = Registry::default().with(Layer::new(config));
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! let span = info_span!("request", requestId = "r-17");
//! let _enter = span.enter();
//! let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
//! error!(error = &err as &(dyn std::error::Error + 'static), "Couldn't save the cart");
//! ```
//!
//! The same settings can be read from the environment; see [`config`].
//!
//! Programs using the [`log`] crate can either bridge to [`tracing`] via [`tracing-log`] (the
//! `tracing-log` feature makes sure such events keep their location), or skip [`tracing`]
//! altogether with the [`log::Log`] implementation in `logger` (the `log` feature).
//!
//! [`log`]: https://docs.rs/log/latest/log/index.html
//! [`log::Log`]: https://docs.rs/log/latest/log/trait.Log.html
//! [`tracing-log`]: https://docs.rs/tracing-log/latest/tracing_log/index.html

pub mod _docs;
pub mod appender;
pub mod config;
pub mod encoder;
pub mod error;
pub mod event;
pub mod json;
pub mod layer;
#[cfg(feature = "log")]
pub mod logger;
pub mod severity;
pub mod thrown;
pub mod transport;
