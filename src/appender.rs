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

//! The appender: an [`Encoder`] and a [`Transport`], glued together.
//!
//! [`LogstashAppender`] is what the framework adapters ([`Layer`] & [`Logger`]) hand their events
//! to. It makes three promises:
//!
//! 1. it never returns an error to whoever is logging; failures are reported through [`tracing`]
//!    under the [`DIAGNOSTICS_TARGET`] target (or to stderr, if no subscriber is interested) &
//!    the event is lost
//! 2. if the transport couldn't be set up, every event is dropped without even being encoded
//! 3. a failure to send one event has no bearing on the next
//!
//! [`Layer`]: crate::layer::Layer
//! [`Logger`]: crate::logger::Logger
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`DIAGNOSTICS_TARGET`]: crate::error::DIAGNOSTICS_TARGET

use crate::{
    config::Config,
    encoder::Encoder,
    error::report,
    event::LogEvent,
    transport::{Transport, UdpTransport},
};

/// Encode log events & ship them to Logstash, best-effort.
pub struct LogstashAppender<T: Transport = UdpTransport> {
    encoder: Encoder,
    transport: T,
}

impl LogstashAppender<UdpTransport> {
    /// Set up an appender that will send over UDP to the host & port named in `config`.
    ///
    /// This never fails: if the host can't be resolved (or a socket created) that's logged
    /// & the resulting appender will quietly drop every event.
    pub fn new(config: Config) -> Self {
        let transport = UdpTransport::open(config.host(), config.port());
        LogstashAppender::with_transport(config, transport)
    }
}

impl<T: Transport> LogstashAppender<T> {
    /// Set up an appender with a custom [`Transport`]
    pub fn with_transport(config: Config, transport: T) -> Self {
        LogstashAppender {
            encoder: Encoder::new(config),
            transport,
        }
    }
    pub fn config(&self) -> &Config {
        self.encoder.config()
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    /// Ship `event` to Logstash; never fails, never retries.
    pub fn append<E: LogEvent + ?Sized>(&self, event: &E) {
        if !self.transport.is_ready() {
            return;
        }
        let buf = self.encoder.encode(event);
        if let Err(err) = self.transport.send(&buf) {
            report(format_args!(
                "Could not send UDP packet to {}:{}: {}",
                self.config().host(),
                self.config().port(),
                err
            ));
        }
    }
    /// Shut down; after this, [`append`](LogstashAppender::append) drops everything.
    pub fn stop(&mut self) {
        self.transport.close();
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{
        error::{DiagnosticsRecorder, Error, Result},
        event::Record,
        severity::{Level, SeverityScale},
    };

    use backtrace::Backtrace;
    use tracing_subscriber::{layer::SubscriberExt, registry::Registry};

    use std::{
        net::UdpSocket,
        sync::{Arc, Mutex},
        time::Duration,
    };

    /// Records what it's given; fails on demand.
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Vec<u8>>>,
        fail: bool,
        closed: bool,
    }

    impl Transport for Recorder {
        fn is_ready(&self) -> bool {
            !self.closed
        }
        fn send(&self, buf: &[u8]) -> Result<usize> {
            if self.fail {
                return Err(Error::Transport {
                    source: Box::new(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "network unreachable",
                    )),
                    back: Backtrace::new(),
                });
            }
            self.sent.lock().unwrap().push(buf.to_vec());
            Ok(buf.len())
        }
        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn record(msg: &str) -> Record {
        Record::builder(msg, "appender", SeverityScale::Log4j.severity(Level::Info)).build()
    }

    #[test]
    fn append_and_stop() {
        let mut appender =
            LogstashAppender::with_transport(Config::builder("localhost", 1).build(), Recorder::default());
        appender.append(&record("one"));
        appender.append(&record("two"));
        assert_eq!(2, appender.transport().sent.lock().unwrap().len());
        appender.stop();
        appender.append(&record("three"));
        assert_eq!(2, appender.transport().sent.lock().unwrap().len());
        appender.stop();
    }

    #[test]
    fn send_failures_are_swallowed() {
        let appender = LogstashAppender::with_transport(
            Config::builder("localhost", 1).build(),
            Recorder {
                fail: true,
                ..Default::default()
            },
        );
        let recorder = DiagnosticsRecorder::default();
        let subscriber = Registry::default().with(recorder.clone());
        tracing::subscriber::with_default(subscriber, || {
            appender.append(&record("lost"));
            appender.append(&record("also lost"));
        });
        assert!(appender.transport().is_ready());
        assert_eq!(
            recorder.messages(),
            vec![
                "Could not send UDP packet to localhost:1: Transport error: network unreachable";
                2
            ]
        );
    }

    #[test]
    fn unresolvable_host_is_inert() {
        let mut appender = LogstashAppender::new(Config::builder("no-such-host.invalid", 5000).build());
        assert!(!appender.transport().is_ready());
        appender.append(&record("nowhere to go"));
        appender.stop();
    }

    #[test]
    fn over_the_wire() {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let port = rx.local_addr().unwrap().port();

        let appender = Arc::new(LogstashAppender::new(
            Config::builder("127.0.0.1", port)
                .application("Test")
                .build(),
        ));

        // Many threads may log at once
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let appender = Arc::clone(&appender);
                std::thread::spawn(move || appender.append(&record(&format!("thread {}", i))))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut seen = Vec::new();
        let mut buf = [0u8; 2048];
        for _ in 0..4 {
            let n = rx.recv(&mut buf).unwrap();
            let doc: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
            assert_eq!(doc["application"], "Test");
            seen.push(doc["message"].as_str().unwrap().to_owned());
        }
        seen.sort();
        assert_eq!(seen, vec!["thread 0", "thread 1", "thread 2", "thread 3"]);
    }
}
