// ==========================================
// Cut-List Import Pipeline - parsing layer
// ==========================================
// bytes -> text (encoding) -> lines (row) -> ParsedDocument (document).
// Everything here is pure: no database, no filesystem.
// ==========================================

pub mod amount;
pub mod article_number;
pub mod beam_calc;
pub mod document;
pub mod encoding;
pub mod error;
pub mod order_number;
pub mod row;

pub use beam_calc::{calculate_beams_and_meters, BeamQuantity, BEAM_LENGTH_MM, REST_ROUNDING_MM};
pub use document::parse_document;
pub use encoding::{decode_cut_list, SourceEncoding};
pub use error::{ParseError, ParseResult};
pub use order_number::parse_order_number;

use crate::domain::ParsedDocument;

/// Full pipeline for one file's raw bytes.
pub fn parse_cut_list_bytes(bytes: &[u8]) -> ParseResult<(ParsedDocument, SourceEncoding)> {
    let (text, encoding) = decode_cut_list(bytes);
    let doc = parse_document(&text)?;
    Ok((doc, encoding))
}
