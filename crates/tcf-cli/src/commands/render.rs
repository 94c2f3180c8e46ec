//! Plain-text renderings shared by the built-in commands.

use std::fmt::Write as _;

use serde_json::Value;

use crate::session::Cookies;

/// Flattens `value` into `dotted.key: value` lines.
///
/// Strings print bare, `null` prints as an empty value and array elements
/// are keyed by position.
#[must_use]
pub fn dump_dotted(value: &Value) -> String {
    let mut out = String::new();
    dump_into(&mut out, "", value);
    out
}

fn dump_into(out: &mut String, prefix: &str, value: &Value) {
    let child = |key: &str| {
        if prefix.is_empty() {
            key.to_owned()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                dump_into(out, &child(key), inner);
            }
        }
        Value::Array(items) => {
            for (index, inner) in items.iter().enumerate() {
                dump_into(out, &child(&index.to_string()), inner);
            }
        }
        Value::String(text) => {
            let _ = writeln!(out, "{prefix}: {text}");
        }
        Value::Null => {
            let _ = writeln!(out, "{prefix}:");
        }
        scalar => {
            let _ = writeln!(out, "{prefix}: {scalar}");
        }
    }
}

/// `name: value` per cookie, sorted by name.
#[must_use]
pub fn render_cookies(cookies: &Cookies) -> String {
    cookies
        .iter()
        .fold(String::new(), |mut out, (name, value)| {
            let _ = writeln!(out, "{name}: {value}");
            out
        })
}

/// Netscape cookie-jar lines for `hostname`, one per cookie.
#[must_use]
pub fn render_cookiejar(hostname: &str, cookies: &Cookies) -> String {
    cookies
        .iter()
        .fold(String::new(), |mut out, (name, value)| {
            let _ = writeln!(out, "{hostname}\tFALSE\t/\tTRUE\t0\t{name}\t{value}");
            out
        })
}
