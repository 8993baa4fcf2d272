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

//! Send `log` records (no `tracing` involved) to a UDP listener on the loopback interface & print
//! what arrives.

use log::{debug, error, info, trace, warn};
use tracing_logstash::{config::Config, logger};

use std::{net::UdpSocket, time::Duration};

pub fn main() {
    let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
    rx.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let port = rx.local_addr().unwrap().port();

    logger::init(
        Config::builder("127.0.0.1", port)
            .application("log-test")
            .append_class_information(true)
            .mdc_keys_as_str("user")
            .build(),
        log::LevelFilter::Debug,
    )
    .unwrap();

    trace!("你好, UDP socket."); // filtered
    debug!("你好, UDP socket.");
    info!(user = "alice"; "你好, UDP socket.");
    warn!("你好, UDP socket.");
    error!("你好, UDP socket.");

    let mut buf = [0u8; 65536];
    for _ in 0..4 {
        let n = rx.recv(&mut buf).unwrap();
        println!("{}", String::from_utf8_lossy(&buf[..n]));
    }
}
