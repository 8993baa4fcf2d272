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

//! The Logstash transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well as
//! the UDP implementation.
//!
//! # Examples
//!
//! To send Logstash documents over UDP to port 5000 on the loopback interface:
//!
//! ```rust
//! use tracing_logstash::transport::{Transport, UdpTransport};
//! let transpo = UdpTransport::connect("127.0.0.1", 5000).unwrap();
//! assert!(transpo.is_ready());
//! ```
//!
//! A host that can't be resolved is an error for [`UdpTransport::connect`]...
//!
//! ```rust
//! use tracing_logstash::transport::UdpTransport;
//! let transpo = UdpTransport::connect("some-host.domain.invalid", 5514);
//! assert!(transpo.is_err()); // no such host, after all
//! ```
//!
//! but [`UdpTransport::open`] will log the failure & hand back a transport that silently drops
//! everything it's given:
//!
//! ```rust
//! use tracing_logstash::transport::{Transport, UdpTransport};
//! let transpo = UdpTransport::open("some-host.domain.invalid", 5514);
//! assert!(!transpo.is_ready());
//! assert_eq!(0, transpo.send(b"{}").unwrap());
//! ```

use crate::error::{report, Error, Result, DIAGNOSTICS_TARGET};

use backtrace::Backtrace;

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Whether [`send`](Transport::send) can possibly deliver anything.
    fn is_ready(&self) -> bool {
        true
    }
    /// Send a slice of bytes on this transport mechanism, as one message.
    ///
    /// Implementations that are not [ready](Transport::is_ready) shall return `Ok(0)`.
    fn send(&self, buf: &[u8]) -> Result<usize>;
    /// Release any resources held by this transport; subsequent sends are dropped.
    fn close(&mut self) {}
}

/// Sending Logstash documents via UDP datagrams.
///
/// The destination address & the socket are each set up exactly once, in the constructor, and
/// re-used for every send. Both are `Option`s: a [`UdpTransport`] whose setup failed (or that
/// has been [closed](Transport::close)) quietly drops everything.
///
/// Sends only read the socket, so a [`UdpTransport`] may be shared between threads; each
/// datagram is handed to the OS in a single call.
#[derive(Debug)]
pub struct UdpTransport {
    address: Option<SocketAddr>,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP to `host`:`port`, failing if the
    /// host can't be resolved or the socket can't be created.
    pub fn connect(host: &str, port: u16) -> Result<UdpTransport> {
        let address = resolve(host, port)?;
        let socket = bind(&address)?;
        Ok(UdpTransport {
            address: Some(address),
            socket: Some(socket),
        })
    }
    /// Construct a [`Transport`] implementation via UDP to `host`:`port`.
    ///
    /// This never fails; if the host can't be resolved, or the socket can't be created, the
    /// failure is reported (under [`DIAGNOSTICS_TARGET`] if anyone's listening, to stderr if
    /// not) & the transport returned will drop everything sent to it.
    pub fn open(host: &str, port: u16) -> UdpTransport {
        let address = resolve(host, port)
            .map_err(|err| report(format_args!("{}", err)))
            .ok();
        // If we couldn't resolve the host there's no point in creating a socket.
        let socket = address.as_ref().and_then(|addr| {
            bind(addr)
                .map_err(|err| report(format_args!("{}", err)))
                .ok()
        });
        UdpTransport { address, socket }
    }
    /// A [`UdpTransport`] that will never send anything
    pub fn disabled() -> UdpTransport {
        UdpTransport {
            address: None,
            socket: None,
        }
    }
    /// The resolved destination, if resolution succeeded
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }
    /// The local address of our socket
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl Transport for UdpTransport {
    fn is_ready(&self) -> bool {
        self.address.is_some() && self.socket.is_some()
    }
    fn send(&self, buf: &[u8]) -> Result<usize> {
        match (&self.socket, &self.address) {
            (Some(socket), Some(address)) => {
                socket.send_to(buf, address).map_err(|err| Error::Transport {
                    source: Box::new(err),
                    back: Backtrace::new(),
                })
            }
            _ => Ok(0),
        }
    }
    fn close(&mut self) {
        // Dropping the socket closes it; `take()` makes a second close a no-op.
        if self.socket.take().is_some() {
            ::tracing::debug!(target: DIAGNOSTICS_TARGET, "closed UDP socket");
        }
    }
}

/// Resolve `host`:`port` to the first address the resolver offers
fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|err| Error::Resolve {
            host: host.to_owned(),
            source: Some(Box::new(err)),
            back: Backtrace::new(),
        })?
        .next()
        .ok_or_else(|| Error::Resolve {
            host: host.to_owned(),
            source: None,
            back: Backtrace::new(),
        })
}

/// Bind to any available port on the wildcard address of `dest`'s family
fn bind(dest: &SocketAddr) -> Result<UdpSocket> {
    let local: SocketAddr = match dest {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    UdpSocket::bind(local).map_err(|err| Error::Socket {
        source: Box::new(err),
        back: Backtrace::new(),
    })
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::error::DiagnosticsRecorder;

    use tracing_subscriber::{layer::SubscriberExt, registry::Registry};

    use std::time::Duration;

    fn listener() -> (UdpSocket, u16) {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let port = sock.local_addr().unwrap().port();
        (sock, port)
    }

    #[test]
    fn sends_one_datagram() {
        let (rx, port) = listener();
        let transpo = UdpTransport::connect("127.0.0.1", port).unwrap();
        assert!(transpo.is_ready());
        assert_eq!(transpo.address(), Some(SocketAddr::from(([127, 0, 0, 1], port))));
        assert!(transpo.local_addr().is_some());

        assert_eq!(13, transpo.send(b"{\"a\":\"b\"}    ").unwrap());
        let mut buf = [0u8; 1024];
        let n = rx.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"{\"a\":\"b\"}    ");
    }

    #[test]
    fn unresolvable_host() {
        assert!(matches!(
            UdpTransport::connect("no-such-host.invalid", 5000),
            Err(Error::Resolve { .. })
        ));

        let recorder = DiagnosticsRecorder::default();
        let subscriber = Registry::default().with(recorder.clone());
        let transpo = tracing::subscriber::with_default(subscriber, || {
            UdpTransport::open("no-such-host.invalid", 5000)
        });
        let messages = recorder.messages();
        assert_eq!(1, messages.len());
        assert!(messages[0].starts_with("Could not find host no-such-host.invalid"));
        assert!(!transpo.is_ready());
        assert!(transpo.address().is_none());
        assert!(transpo.local_addr().is_none());
        assert_eq!(0, transpo.send(b"dropped").unwrap());
    }

    #[test]
    fn close_is_idempotent() {
        let (_rx, port) = listener();
        let mut transpo = UdpTransport::open("127.0.0.1", port);
        assert!(transpo.is_ready());
        transpo.close();
        assert!(!transpo.is_ready());
        assert_eq!(0, transpo.send(b"late").unwrap());
        transpo.close();

        let mut transpo = UdpTransport::disabled();
        transpo.close();
        assert!(!transpo.is_ready());
    }
}
