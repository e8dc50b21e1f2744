// ==========================================
// Cut-List Import Pipeline - row classification
// ==========================================
// Pure, stateless classification of one semicolon-delimited line. The
// section parser (document.rs) owns all state; this module only answers
// "what does this line look like".
// ==========================================

use crate::parser::article_number::is_article_number;
use crate::parser::order_number::looks_like_order_number;
use regex::Regex;
use std::sync::OnceLock;

/// Which list the two unit sections belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSection {
    Windows,
    Doors,
}

/// Which summary counter a total line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalKind {
    Units,
    Subunits,
    GlassPanes,
}

/// Header metadata keys recognized at the top of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKey {
    Client,
    Project,
    System,
    Deadline,
    PvcDeliveryDate,
}

/// Shape of one line, before any section context is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RowClass {
    /// "klient: Kowalski" style header line, with the trimmed value.
    Metadata(MetadataKey, String),
    /// "Lista okien" / "Lista drzwi" section heading.
    SectionMarker(UnitSection),
    /// "Łączna liczba okien: 12" style total, with the parsed count.
    Total(TotalKind, u32),
    /// >=4 fields, order number + article number + two counts.
    RequirementShaped,
    /// >=5 fields, numeric position and dimensions.
    UnitShaped,
    Unrecognized,
}

fn deadline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "termin realizacji:" with arbitrary filler between the words
    RE.get_or_init(|| Regex::new(r"^termin.*realizacji:").unwrap())
}

/// Lowercase and fold Polish diacritics so matching survives files that
/// were saved without them.
fn fold(line: &str) -> String {
    line.to_lowercase()
        .chars()
        .map(|c| match c {
            'ą' => 'a',
            'ć' => 'c',
            'ę' => 'e',
            'ł' => 'l',
            'ń' => 'n',
            'ó' => 'o',
            'ś' => 's',
            'ź' | 'ż' => 'z',
            other => other,
        })
        .collect()
}

fn metadata_value(line: &str) -> String {
    line.split_once(':')
        .map(|(_, v)| v.trim().trim_matches(';').trim().to_string())
        .unwrap_or_default()
}

fn trailing_number(folded: &str) -> Option<u32> {
    let digits: String = folded
        .chars()
        .rev()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.chars().rev().collect::<String>().parse().ok()
}

fn is_count(field: &str) -> bool {
    let t = field.trim();
    !t.is_empty() && t.chars().all(|c| c.is_ascii_digit())
}

/// Classify one raw line.
pub fn classify_row(line: &str) -> RowClass {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return RowClass::Unrecognized;
    }

    let folded = fold(trimmed);

    // ===== header metadata =====
    if folded.starts_with("klient:") {
        return RowClass::Metadata(MetadataKey::Client, metadata_value(trimmed));
    }
    if folded.starts_with("projekt:") {
        return RowClass::Metadata(MetadataKey::Project, metadata_value(trimmed));
    }
    if folded.starts_with("system:") {
        return RowClass::Metadata(MetadataKey::System, metadata_value(trimmed));
    }
    if deadline_re().is_match(&folded) {
        return RowClass::Metadata(MetadataKey::Deadline, metadata_value(trimmed));
    }
    if folded.starts_with("dostawa pvc:") {
        return RowClass::Metadata(MetadataKey::PvcDeliveryDate, metadata_value(trimmed));
    }

    // ===== section markers and totals =====
    if folded.contains("lista okien") {
        return RowClass::SectionMarker(UnitSection::Windows);
    }
    if folded.contains("lista drzwi") {
        return RowClass::SectionMarker(UnitSection::Doors);
    }
    if folded.contains("laczna liczba") {
        let count = trailing_number(&folded).unwrap_or(0);
        if folded.contains("okien") {
            return RowClass::Total(TotalKind::Units, count);
        }
        if folded.contains("skrzyd") {
            return RowClass::Total(TotalKind::Subunits, count);
        }
        if folded.contains("szyb") {
            return RowClass::Total(TotalKind::GlassPanes, count);
        }
        return RowClass::Unrecognized;
    }

    // ===== data rows =====
    let fields: Vec<&str> = trimmed.split(';').map(str::trim).collect();

    // the numeric fields are NOT part of the shape check: a material
    // row with a mangled count must surface as a row issue downstream,
    // not vanish as unrecognized
    if fields.len() >= 4 && looks_like_order_number(fields[0]) && is_article_number(fields[1]) {
        return RowClass::RequirementShaped;
    }

    if fields.len() >= 5 && is_count(fields[0]) && is_count(fields[1]) && is_count(fields[2]) {
        return RowClass::UnitShaped;
    }

    RowClass::Unrecognized
}
