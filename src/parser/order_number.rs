// ==========================================
// Cut-List Import Pipeline - order number resolution
// ==========================================
// Order numbers come in two shapes: a bare base ("53526") and a variant
// ("53526-a", "53526 B2"). The separator may be a dash or a space; the
// stored form always uses a dash. A trailing bare dash ("53526-") is a
// known artifact of the exporting tool and normalizes to the base.
// ==========================================

use crate::domain::OrderNumberIdentity;
use crate::parser::error::{ParseError, ParseResult};
use regex::Regex;
use std::sync::OnceLock;

fn order_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // base digits, then optionally a dash/space separator and a
        // short alphanumeric suffix (1-3 chars)
        Regex::new(r"^(\d+)(?:[-\s]([a-zA-Z0-9]{1,3}))?$").unwrap()
    })
}

/// Split a raw order number into base and optional variant suffix.
///
/// Accepts "53526", "53526-a", "53526 B2" and the degenerate trailing
/// dash "53526-". Anything else is a hard parse failure.
pub fn parse_order_number(raw: &str) -> ParseResult<OrderNumberIdentity> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidOrderNumber(raw.to_string()));
    }

    // exporter artifact: bare trailing dash with no suffix
    let trimmed = trimmed.strip_suffix('-').unwrap_or(trimmed);

    let caps = order_number_re()
        .captures(trimmed)
        .ok_or_else(|| ParseError::InvalidOrderNumber(raw.to_string()))?;

    Ok(OrderNumberIdentity {
        base: caps[1].to_string(),
        suffix: caps.get(2).map(|m| m.as_str().to_lowercase()),
    })
}

/// Quick shape check used by the row classifier.
pub fn looks_like_order_number(raw: &str) -> bool {
    let t = raw.trim();
    let t = t.strip_suffix('-').unwrap_or(t);
    !t.is_empty() && order_number_re().is_match(t)
}
