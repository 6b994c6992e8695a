//! Compact frame dumps for traffic tracing

use std::fmt::Write;

/// Render bytes as `(len):hh:hh...=text`
///
/// The text half prints printable ASCII as-is and everything else as `<hh>`.
pub fn xxd(data: &[u8]) -> String {
    let mut out = String::with_capacity(8 + data.len() * 5);
    let _ = write!(out, "({})", data.len());
    for b in data {
        let _ = write!(out, ":{:02x}", b);
    }
    out.push('=');
    for &b in data {
        if (32..=126).contains(&b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "<{:02x}>", b);
        }
    }
    out
}
