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

//! Send a handful of events to a UDP listener on the loopback interface & print what arrives.

use tracing::{debug, error, info, info_span, trace, warn};
use tracing_logstash::{config::Config, layer::Layer};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

use std::{net::UdpSocket, time::Duration};

pub fn main() {
    // Play Logstash...
    let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
    rx.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let port = rx.local_addr().unwrap().port();

    // setup the real subscriber...
    let config = Config::builder("127.0.0.1", port)
        .application("udp-test")
        .environment("Development")
        .append_class_information(true)
        .mdc_keys_as_str("requestId")
        .parameters_as_str("group=PSP&group2=REQUEST")
        .unwrap()
        .build();
    let subscriber = Registry::default().with(Layer::new(config));
    // and install it.
    let _guard = tracing::subscriber::set_default(subscriber);

    let span = info_span!("request", requestId = "r-17");
    let _enter = span.enter();
    trace!("Hello, 世界!");
    debug!("Hello, 世界!");
    info!("Hello, 世界!");
    warn!("Hello, 世界!");
    let err = std::io::Error::new(std::io::ErrorKind::Other, "Hello, 世界!");
    error!(error = &err as &(dyn std::error::Error + 'static), "Hello, 世界!");

    let mut buf = [0u8; 65536];
    for _ in 0..5 {
        let n = rx.recv(&mut buf).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        println!("{}", doc);
    }
}
