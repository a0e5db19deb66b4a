//! `/desk` endpoint logic.
//!
//! ```text
//! GET /desk?height=<n>  ─▶ 200 "OK"             (posts a target height)
//! GET /desk             ─▶ 200 {"height":<n>}   (0 = unknown)
//! anything else         ─▶ 404 "Not found"
//! ```
//!
//! Pure routing and formatting; the server binding lives in `hal::net`.

use crate::logging::format_to_buffer;
use crate::mailbox::DeskMailbox;

/// Path of the only endpoint.
pub const DESK_PATH: &str = "/desk";

/// Name of the query parameter carrying a target height.
pub const HEIGHT_PARAM: &str = "height";

/// Parsed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeskRoute {
    /// Move to this height (clamped later by the motion controller).
    SetHeight(u16),
    /// Report the last known height.
    GetHeight,
    NotFound,
}

/// Response to send back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response<'b> {
    pub status: u16,
    pub content_type: &'static str,
    pub body: &'b str,
}

/// Scratch space for a formatted response body.
pub type BodyBuffer = [u8; 32];

/// Route a request by path and query string.
pub fn route(uri: &str) -> DeskRoute {
    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    };

    if path != DESK_PATH {
        return DeskRoute::NotFound;
    }

    let height = query.and_then(|q| {
        q.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == HEIGHT_PARAM).then_some(value)
        })
    });

    match height {
        Some(value) => DeskRoute::SetHeight(parse_int(value)),
        None => DeskRoute::GetHeight,
    }
}

/// Lenient integer parse: optional leading whitespace and sign, then
/// digits up to the first non-digit. No digits gives 0, overflow saturates.
///
/// Negatives give 0, so `height=-5` ends up at the minimum height. A plain
/// 16-bit cast would wrap it to 65531 and send the desk to the maximum.
pub fn parse_int(text: &str) -> u16 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: u16 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add((byte - b'0') as u16);
    }

    if negative {
        0
    } else {
        value
    }
}

/// Act on a route and build its response.
pub fn respond<'b>(route: DeskRoute, mailbox: &DeskMailbox, body: &'b mut BodyBuffer) -> Response<'b> {
    match route {
        DeskRoute::SetHeight(height) => {
            mailbox.request(height);
            Response {
                status: 200,
                content_type: "text/plain",
                body: "OK",
            }
        }
        DeskRoute::GetHeight => {
            let len = format_to_buffer(
                &mut body[..],
                format_args!("{{\"height\":{}}}", mailbox.height()),
            );
            Response {
                status: 200,
                content_type: "text/plain",
                body: core::str::from_utf8(&body[..len]).unwrap_or(""),
            }
        }
        DeskRoute::NotFound => Response {
            status: 404,
            content_type: "text/plain",
            body: "Not found",
        },
    }
}
