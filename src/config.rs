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

//! Appender configuration.
//!
//! A [`Config`] is assembled once, through a [`ConfigBuilder`], and never changes thereafter. It
//! can also be parsed from the textual attributes a configuration file would supply:
//!
//! | attribute                | meaning                                            |
//! |--------------------------|----------------------------------------------------|
//! | `application`            | sent as `application`, if given                    |
//! | `environment`            | sent as `environment`, if given                    |
//! | `logstashHost`           | where to send; defaults to `localhost`             |
//! | `logstashPort`           | required; 0-65535                                  |
//! | `mdcKeys`                | comma-separated contextual keys to send            |
//! | `parameters`             | `key=value` pairs, joined by `&`, sent every time  |
//! | `appendClassInformation` | `true` to send `className` & `lineNumber`          |
//! | `stacktraceLength`       | truncate stack traces to this many characters      |
//! | `severityScale`          | `log4j` (the default) or `syslog`                  |
//!
//! ```rust
//! use tracing_logstash::config::Config;
//! let config = Config::from_attributes([
//!     ("logstashHost", "logs.example.com"),
//!     ("logstashPort", "5514"),
//!     ("mdcKeys", "requestId, user"),
//!     ("parameters", "group=PSP&group2=REQUEST"),
//! ])
//! .unwrap();
//! assert_eq!(config.mdc_keys(), &["requestId".to_string(), "user".to_string()]);
//! ```

use crate::{
    error::{Error, Result},
    severity::SeverityScale,
};

use backtrace::Backtrace;

use std::collections::HashMap;

/// Environment variables consulted by [`Config::from_env`], along with the attribute each
/// stands in for.
pub const ENV_ATTRIBUTES: [(&str, &str); 9] = [
    ("LOGSTASH_APPLICATION", "application"),
    ("LOGSTASH_ENVIRONMENT", "environment"),
    ("LOGSTASH_HOST", "logstashHost"),
    ("LOGSTASH_PORT", "logstashPort"),
    ("LOGSTASH_MDC_KEYS", "mdcKeys"),
    ("LOGSTASH_PARAMETERS", "parameters"),
    ("LOGSTASH_APPEND_CLASS_INFORMATION", "appendClassInformation"),
    ("LOGSTASH_STACKTRACE_LENGTH", "stacktraceLength"),
    ("LOGSTASH_SEVERITY_SCALE", "severityScale"),
];

/// Immutable appender configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    application: Option<String>,
    environment: Option<String>,
    host: String,
    port: u16,
    mdc_keys: Vec<String>,
    parameters: Vec<(String, String)>,
    append_class_information: bool,
    stacktrace_length: Option<usize>,
    severity_scale: SeverityScale,
}

impl Config {
    /// Start building a [`Config`] that will send to `host`:`port`
    pub fn builder<H: Into<String>>(host: H, port: u16) -> ConfigBuilder {
        ConfigBuilder {
            imp: Config {
                application: None,
                environment: None,
                host: host.into(),
                port,
                mdc_keys: Vec::new(),
                parameters: Vec::new(),
                append_class_information: false,
                stacktrace_length: None,
                severity_scale: SeverityScale::default(),
            },
        }
    }

    /// Parse a [`Config`] from textual attributes; see the [module](crate::config) docs for
    /// the names. Unrecognized attributes are ignored.
    pub fn from_attributes<I, K, V>(attrs: I) -> Result<Config>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let attrs: HashMap<String, String> = attrs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
            .collect();

        let port = match attr(&attrs, "logstashPort") {
            Some(text) => parse_port(text)?,
            None => {
                return Err(Error::MissingPort {
                    back: Backtrace::new(),
                })
            }
        };

        let mut builder = Config::builder(attr(&attrs, "logstashHost").unwrap_or("localhost"), port);
        if let Some(application) = attr(&attrs, "application") {
            builder = builder.application(application);
        }
        if let Some(environment) = attr(&attrs, "environment") {
            builder = builder.environment(environment);
        }
        if let Some(keys) = attr(&attrs, "mdcKeys") {
            builder = builder.mdc_keys_as_str(keys);
        }
        if let Some(params) = attr(&attrs, "parameters") {
            builder = builder.parameters_as_str(params)?;
        }
        if let Some(text) = attr(&attrs, "appendClassInformation") {
            builder = builder.append_class_information(parse_bool("appendClassInformation", text)?);
        }
        if let Some(text) = attr(&attrs, "stacktraceLength") {
            builder = builder.stacktrace_length(parse_stacktrace_length(text)?);
        }
        if let Some(text) = attr(&attrs, "severityScale") {
            builder = builder.severity_scale(text.parse()?);
        }
        Ok(builder.build())
    }

    /// Parse a [`Config`] from the environment variables listed in [`ENV_ATTRIBUTES`].
    pub fn from_env() -> Result<Config> {
        Config::from_attributes(
            ENV_ATTRIBUTES
                .iter()
                .filter_map(|(var, name)| std::env::var(var).ok().map(|val| (*name, val))),
        )
    }

    pub fn application(&self) -> Option<&str> {
        self.application.as_deref()
    }
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    /// Contextual keys to look up on each event, in the order they'll be sent
    pub fn mdc_keys(&self) -> &[String] {
        &self.mdc_keys
    }
    /// Literal key/value pairs sent with every event, in the order they'll be sent
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }
    pub fn append_class_information(&self) -> bool {
        self.append_class_information
    }
    pub fn stacktrace_length(&self) -> Option<usize> {
        self.stacktrace_length
    }
    pub fn severity_scale(&self) -> SeverityScale {
        self.severity_scale
    }
}

pub struct ConfigBuilder {
    imp: Config,
}

impl ConfigBuilder {
    pub fn application<S: Into<String>>(mut self, application: S) -> Self {
        self.imp.application = Some(application.into());
        self
    }
    pub fn environment<S: Into<String>>(mut self, environment: S) -> Self {
        self.imp.environment = Some(environment.into());
        self
    }
    pub fn mdc_key<S: Into<String>>(mut self, key: S) -> Self {
        self.imp.mdc_keys.push(key.into());
        self
    }
    /// Add keys from a comma-separated list, in order. All whitespace is removed (any Unicode
    /// whitespace, including inside a key, so `"request id"` becomes `requestid`) & empty keys
    /// are dropped.
    pub fn mdc_keys_as_str(mut self, keys: &str) -> Self {
        self.imp.mdc_keys.extend(
            keys.split(',')
                .map(|key| key.chars().filter(|c| !c.is_whitespace()).collect::<String>())
                .filter(|key| !key.is_empty()),
        );
        self
    }
    /// Add one literal parameter; naming the same key twice is an error.
    pub fn parameter<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Result<Self> {
        let key = key.into();
        if self.imp.parameters.iter().any(|(k, _)| *k == key) {
            return Err(Error::DuplicateParameter {
                key,
                back: Backtrace::new(),
            });
        }
        self.imp.parameters.push((key, value.into()));
        Ok(self)
    }
    /// Add literal parameters from a list like `a=b&c=d`. Items without an `=` are skipped;
    /// each item is split at its first `=`, so `a=b=c` sets `a` to `b=c`.
    ///
    /// Parameters are written to each document in the order given here (not hash order).
    pub fn parameters_as_str(self, params: &str) -> Result<Self> {
        params
            .split('&')
            .filter_map(|item| item.split_once('='))
            .try_fold(self, |builder, (k, v)| builder.parameter(k, v))
    }
    pub fn append_class_information(mut self, append: bool) -> Self {
        self.imp.append_class_information = append;
        self
    }
    /// Truncate stack traces to `length` characters (`None` disables truncation)
    pub fn stacktrace_length(mut self, length: Option<usize>) -> Self {
        self.imp.stacktrace_length = length;
        self
    }
    pub fn severity_scale(mut self, scale: SeverityScale) -> Self {
        self.imp.severity_scale = scale;
        self
    }
    pub fn build(self) -> Config {
        self.imp
    }
}

fn attr<'a>(attrs: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    attrs.get(name).map(String::as_str)
}

fn parse_port(text: &str) -> Result<u16> {
    text.parse::<u16>().map_err(|_| Error::BadPort {
        text: text.to_owned(),
        back: Backtrace::new(),
    })
}

fn parse_bool(name: &'static str, text: &str) -> Result<bool> {
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::BadBoolean {
            name,
            text: text.to_owned(),
            back: Backtrace::new(),
        })
    }
}

/// Negative lengths mean "don't truncate"
fn parse_stacktrace_length(text: &str) -> Result<Option<usize>> {
    text.parse::<i64>()
        .map(|n| usize::try_from(n).ok())
        .map_err(|_| Error::BadStacktraceLength {
            text: text.to_owned(),
            back: Backtrace::new(),
        })
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn builder() {
        let c = Config::builder("logstash.local", 5514)
            .application("Test")
            .environment("Development")
            .mdc_keys_as_str(" key1, key2 ,\tkey3,,")
            .parameters_as_str("group=PSP&group2=REQUEST&bogus&a=b=c")
            .unwrap()
            .append_class_information(true)
            .stacktrace_length(Some(100))
            .build();
        assert_eq!(c.application(), Some("Test"));
        assert_eq!(c.environment(), Some("Development"));
        assert_eq!(c.host(), "logstash.local");
        assert_eq!(c.port(), 5514);
        assert_eq!(c.mdc_keys(), &["key1", "key2", "key3"]);
        assert_eq!(
            c.parameters(),
            &[
                ("group".to_string(), "PSP".to_string()),
                ("group2".to_string(), "REQUEST".to_string()),
                ("a".to_string(), "b=c".to_string())
            ]
        );
        assert!(c.append_class_information());
        assert_eq!(c.stacktrace_length(), Some(100));
        assert_eq!(c.severity_scale(), SeverityScale::Log4j);

        assert!(Config::builder("localhost", 1)
            .parameters_as_str("a=1&a=2")
            .is_err());
    }

    #[test]
    fn empty_lists() {
        let c = Config::builder("localhost", 1)
            .mdc_keys_as_str("")
            .parameters_as_str("")
            .unwrap()
            .build();
        assert!(c.mdc_keys().is_empty());
        assert!(c.parameters().is_empty());
    }

    #[test]
    fn list_order() {
        let c = Config::builder("localhost", 1)
            .mdc_keys_as_str(" request id ,\tuser")
            .parameters_as_str("group=PSP&group2=REQUEST")
            .unwrap()
            .build();
        assert_eq!(c.mdc_keys(), ["requestid", "user"]);
        assert_eq!(
            c.parameters(),
            [
                ("group".to_owned(), "PSP".to_owned()),
                ("group2".to_owned(), "REQUEST".to_owned())
            ]
        );
    }

    #[test]
    fn attributes() {
        let c = Config::from_attributes([("logstashPort", "12345")]).unwrap();
        assert_eq!(c, Config::builder("localhost", 12345).build());

        let c = Config::from_attributes(vec![
            ("application", "Test"),
            ("logstashHost", "127.0.0.1"),
            ("logstashPort", "12345"),
            ("mdcKeys", "key1,key2"),
            ("appendClassInformation", "TRUE"),
            ("stacktraceLength", "-1"),
            ("severityScale", "syslog"),
            ("somethingElse", "ignored"),
        ])
        .unwrap();
        assert_eq!(c.application(), Some("Test"));
        assert_eq!(c.environment(), None);
        assert_eq!(c.host(), "127.0.0.1");
        assert!(c.append_class_information());
        assert_eq!(c.stacktrace_length(), None);
        assert_eq!(c.severity_scale(), SeverityScale::Syslog);

        let c = Config::from_attributes([("logstashPort", "1"), ("stacktraceLength", "250")]).unwrap();
        assert_eq!(c.stacktrace_length(), Some(250));
    }

    #[test]
    fn bad_attributes() {
        assert!(matches!(
            Config::from_attributes(Vec::<(&str, &str)>::new()),
            Err(Error::MissingPort { .. })
        ));
        assert!(matches!(
            Config::from_attributes([("logstashPort", "sixty")]),
            Err(Error::BadPort { .. })
        ));
        assert!(matches!(
            Config::from_attributes([("logstashPort", "65536")]),
            Err(Error::BadPort { .. })
        ));
        assert!(matches!(
            Config::from_attributes([("logstashPort", "1"), ("appendClassInformation", "yes")]),
            Err(Error::BadBoolean { .. })
        ));
        assert!(matches!(
            Config::from_attributes([("logstashPort", "1"), ("stacktraceLength", "long")]),
            Err(Error::BadStacktraceLength { .. })
        ));
        assert!(matches!(
            Config::from_attributes([("logstashPort", "1"), ("parameters", "a=1&a=1")]),
            Err(Error::DuplicateParameter { .. })
        ));
        assert!(matches!(
            Config::from_attributes([("logstashPort", "1"), ("severityScale", "loud")]),
            Err(Error::BadSeverityScale { .. })
        ));
    }
}
