// ==========================================
// Cut-List Import Pipeline - article number decomposition
// ==========================================
// An article number is 8 digits with an optional trailing "p"/"P"
// (promotional batch marker): leading catalog digit, 4-digit profile
// number, 3-digit color code. "19016050" -> profile 9016, color 050.
// Steel reinforcement articles (201/202 prefix after the leading digit
// is kept, i.e. the raw number starts with 201/202) carry no PVC
// profile and are skipped silently upstream.
// ==========================================

use crate::parser::error::{ParseError, ParseResult};
use regex::Regex;
use std::sync::OnceLock;

/// Profile number + color code extracted from one article number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleParts {
    pub profile_number: String,
    pub color_code: String,
}

fn article_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8}[pP]?$").unwrap())
}

/// Shape check: 8 digits, optional trailing p/P.
pub fn is_article_number(raw: &str) -> bool {
    article_re().is_match(raw.trim())
}

/// Steel reinforcement articles start with 201 or 202; they are not
/// PVC profiles and must not produce requirement rows.
pub fn is_steel_article(raw: &str) -> bool {
    let t = raw.trim();
    t.starts_with("201") || t.starts_with("202")
}

/// Decompose an article number into profile number and color code.
pub fn parse_article_number(raw: &str) -> ParseResult<ArticleParts> {
    let trimmed = raw.trim();
    if !is_article_number(trimmed) {
        return Err(ParseError::InvalidArticleNumber(raw.to_string()));
    }

    // drop the optional promo marker, then the leading catalog digit
    let digits = trimmed.trim_end_matches(['p', 'P']);
    let body = &digits[1..];

    Ok(ArticleParts {
        profile_number: body[..4].to_string(),
        color_code: body[4..].to_string(),
    })
}
