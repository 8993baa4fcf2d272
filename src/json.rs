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

//! Just enough JSON to build a flat Logstash document.
//!
//! Logstash documents are flat objects whose values are strings, save for the odd number. Rather
//! than build a tree & serialize it, [`JsonObject`] appends `"key":value` pairs to a byte buffer
//! in exactly the order they're given. That ordering is part of the wire format, so a map-based
//! serializer won't do.
//!
//! String escaping follows the rules of the venerable json-simple library, which are a bit more
//! aggressive than RFC [8259] requires: in addition to the mandatory escapes, forward slashes are
//! escaped, as are the C1 controls (U+007F-U+009F) & the General Punctuation through Currency
//! Symbols blocks (U+2000-U+20FF).
//!
//! [8259]: https://datatracker.ietf.org/doc/html/rfc8259

use bytes::BufMut;

/// A value to be written into a [`JsonObject`].
///
/// Only [`JsonValue::Number`] is written bare; everything else is quoted. In particular a
/// [`JsonValue::Null`] is written as the empty string `""`, not `null`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JsonValue<'a> {
    Number(i64),
    Text(&'a str),
    Null,
}

impl<'a> std::convert::From<&'a str> for JsonValue<'a> {
    fn from(s: &'a str) -> Self {
        JsonValue::Text(s)
    }
}

impl<'a> std::convert::From<Option<&'a str>> for JsonValue<'a> {
    fn from(s: Option<&'a str>) -> Self {
        s.map(JsonValue::Text).unwrap_or(JsonValue::Null)
    }
}

impl std::convert::From<i64> for JsonValue<'_> {
    fn from(n: i64) -> Self {
        JsonValue::Number(n)
    }
}

/// Write `s` to `buf`, escaped for inclusion in a JSON string (the surrounding quotes are *not*
/// written).
pub fn escape_into<B: BufMut>(s: &str, buf: &mut B) {
    let mut utf8 = [0u8; 4];
    for ch in s.chars() {
        match ch {
            '"' => buf.put_slice(b"\\\""),
            '\\' => buf.put_slice(b"\\\\"),
            '\u{0008}' => buf.put_slice(b"\\b"),
            '\u{000C}' => buf.put_slice(b"\\f"),
            '\n' => buf.put_slice(b"\\n"),
            '\r' => buf.put_slice(b"\\r"),
            '\t' => buf.put_slice(b"\\t"),
            '/' => buf.put_slice(b"\\/"),
            '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}' | '\u{2000}'..='\u{20FF}' => {
                buf.put_slice(format!("\\u{:04X}", ch as u32).as_bytes())
            }
            _ => buf.put_slice(ch.encode_utf8(&mut utf8).as_bytes()),
        }
    }
}

/// Escape `s` for inclusion in a JSON string.
pub fn escape(s: &str) -> String {
    let mut buf = Vec::with_capacity(s.len());
    escape_into(s, &mut buf);
    // always valid UTF-8: whole `char`s from `s` & ASCII escapes
    String::from_utf8_lossy(&buf).into_owned()
}

/// A flat JSON object under construction.
///
/// The opening brace is written along with the first field, so an object to which nothing was
/// ever added finishes as `{}`.
#[derive(Debug, Default)]
pub struct JsonObject {
    buf: Vec<u8>,
}

impl JsonObject {
    pub fn new() -> JsonObject {
        JsonObject::default()
    }
    pub fn with_capacity(cap: usize) -> JsonObject {
        JsonObject {
            buf: Vec::with_capacity(cap),
        }
    }
    /// Append `"key":value`; `key` is escaped, as is `value` if it's text.
    pub fn field<'a, V: Into<JsonValue<'a>>>(&mut self, key: &str, value: V) -> &mut Self {
        if self.buf.is_empty() {
            self.buf.put_u8(b'{');
        } else {
            self.buf.put_u8(b',');
        }
        self.buf.put_u8(b'"');
        escape_into(key, &mut self.buf);
        self.buf.put_slice(b"\":");
        match value.into() {
            JsonValue::Number(n) => self.buf.put_slice(n.to_string().as_bytes()),
            JsonValue::Text(s) => {
                self.buf.put_u8(b'"');
                escape_into(s, &mut self.buf);
                self.buf.put_u8(b'"');
            }
            JsonValue::Null => self.buf.put_slice(b"\"\""),
        }
        self
    }
    /// Close the object & hand back its UTF-8 encoding.
    pub fn finish(mut self) -> Vec<u8> {
        if self.buf.is_empty() {
            self.buf.put_u8(b'{');
        }
        self.buf.put_u8(b'}');
        self.buf
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn printable_ascii_is_untouched() {
        let s = "Hello, world! 0123456789 abc XYZ ~`@#$%^&*()_+-=[]{}|;:',.<>?";
        assert_eq!(escape(s), s);
    }

    #[test]
    fn short_escapes() {
        assert_eq!(escape("\"quoted\""), "\\\"quoted\\\"");
        assert_eq!(escape("C:\\temp"), "C:\\\\temp");
        assert_eq!(escape("a/b"), "a\\/b");
        assert_eq!(escape("\u{8}\u{c}\n\r\t"), "\\b\\f\\n\\r\\t");
    }

    #[test]
    fn unicode_escapes() {
        assert_eq!(escape("\u{0}"), "\\u0000");
        assert_eq!(escape("\u{1}\u{1b}\u{1f}"), "\\u0001\\u001B\\u001F");
        assert_eq!(escape("\u{7f}\u{85}\u{9f}"), "\\u007F\\u0085\\u009F");
        assert_eq!(escape("\u{2028}x\u{20ac}"), "\\u2028x\\u20AC");
        // Just outside the ranges
        assert_eq!(escape("\u{a0}\u{1fff}\u{2100}"), "\u{a0}\u{1fff}\u{2100}");
        assert_eq!(escape("Hello, 世界! 🦀"), "Hello, 世界! 🦀");

        // Every control character without a short form gets a \u escape
        for c in (0u32..0x20).filter(|c| ![8, 9, 10, 12, 13].contains(c)) {
            let ch = char::from_u32(c).unwrap();
            assert_eq!(escape(&ch.to_string()), format!("\\u{:04X}", c));
        }
    }

    #[test]
    fn objects() {
        let mut obj = JsonObject::new();
        obj.field("message", "Hi \"there\"")
            .field("severity", 400i64)
            .field("lineNumber", "17")
            .field("nothing", JsonValue::Null);
        assert_eq!(
            std::str::from_utf8(&obj.finish()).unwrap(),
            r#"{"message":"Hi \"there\"","severity":400,"lineNumber":"17","nothing":""}"#
        );

        assert_eq!(JsonObject::new().finish(), b"{}");

        let mut obj = JsonObject::with_capacity(64);
        obj.field("a/b", None::<&str>);
        assert_eq!(obj.finish(), br#"{"a\/b":""}"#);
    }
}
