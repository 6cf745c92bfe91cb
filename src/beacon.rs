//! Beacon URL construction
//!
//! Builds the percent-encoded `__utm.gif` query strings the collector
//! expects. Everything here is a pure function of its inputs; storage and
//! network never reach into this module.
//!
//! The encoding is the collector's own variant of form encoding: a reduced
//! safe set (`.` `-` `*` `_` plus alphanumerics), `+` for a literal space,
//! and uppercase `%XX` escapes per UTF-8 byte for everything else.

use crate::device::DeviceProfile;
use crate::session::SessionRecord;

/// Tracking protocol version reported as `utmwv`
const PROTOCOL_VERSION: &str = "4.4ma";

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode `s` for a beacon query string.
pub fn encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    for ch in s.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '*' | '_' => out.push(ch),
            ' ' => out.push('+'),
            _ => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).bytes() {
                    out.push('%');
                    out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
                    out.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
                }
            }
        }
    }
    out
}

/// Render the `&utmp=` page-view parameter.
///
/// A leading `/` is enforced before encoding so report paths stay rooted.
pub fn page_param(path: &str) -> String {
    if path.starts_with('/') {
        format!("&utmp={}", encode(path))
    } else {
        format!("&utmp={}", encode(&format!("/{}", path)))
    }
}

/// Render the `&utmt=event&utme=` event parameter.
///
/// `value` carries the wire sentinel: a negative value means "no value" and
/// the trailing parenthetical is omitted.
pub fn event_param(category: &str, action: &str, label: Option<&str>, value: i64) -> String {
    let mut param = String::from("&utmt=event&utme=5(");
    param.push_str(&encode(category));
    param.push('*');
    param.push_str(&encode(action));
    if let Some(label) = label {
        param.push('*');
        param.push_str(&encode(label));
    }
    param.push(')');
    if value >= 0 {
        param.push('(');
        param.push_str(&value.to_string());
        param.push(')');
    }
    param
}

/// Build the invariant head of every beacon URL.
///
/// Computed once per agent construction; the session cookie baked in here
/// reflects the session as it stood at initialization.
pub fn root_prefix(
    host: &str,
    account_id: &str,
    device: &DeviceProfile,
    session: &SessionRecord,
) -> String {
    let mut url = format!("http://{}/__utm.gif", host);
    url.push_str(&format!("?utmwv={}", PROTOCOL_VERSION));
    // constant cache-buster slot
    url.push_str("&utmn=-1");
    url.push_str(&format!("&utmcs={}", device.encoding));
    url.push_str(&format!(
        "&utmsr={}x{}",
        device.screen_width, device.screen_height
    ));
    url.push_str(&format!("&utmsc={}-bit", device.color_depth));
    url.push_str(&format!("&utmhn={}", device.hostname));
    url.push_str(&format!("&utmul={}", device.locale));
    url.push_str(&format!("&utmac={}", account_id));
    url.push_str(&format!("&utmcc={}", session.cookie()));
    url
}
