// ==========================================
// Cut-List Import Pipeline - section document parser
// ==========================================
// Turns one decoded export file into a ParsedDocument. The file layout:
//
//   klient: / projekt: / system: / termin realizacji: / dostawa pvc:
//   <requirement rows>                  (until a section marker)
//   Lista okien  <unit rows>  Łączna liczba okien: N
//   Lista drzwi  <unit rows>  Łączna liczba ... totals
//
// All state lives in ParserState; every line goes through the pure
// classifier first. Malformed data rows become row_issues, never
// errors: only a file with no usable requirement rows at all fails.
// ==========================================

use crate::domain::{
    DocumentTotals, ParsedDocument, ParsedRequirement, ParsedUnit, RowIssue,
};
use crate::parser::article_number::{is_steel_article, parse_article_number};
use crate::parser::beam_calc::calculate_beams_and_meters;
use crate::parser::error::{ParseError, ParseResult};
use crate::parser::order_number::parse_order_number;
use crate::parser::row::{classify_row, MetadataKey, RowClass, TotalKind, UnitSection};
use std::collections::HashMap;

// ==========================================
// ParserState - where in the file we are
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Before any "Lista ..." marker: requirement rows.
    Requirements,
    /// Inside a unit list.
    Units(UnitSection),
}

#[derive(Debug)]
struct ParserState {
    section: Section,
    order_number: Option<String>,
    client: Option<String>,
    project: Option<String>,
    system: Option<String>,
    deadline: Option<String>,
    pvc_delivery_date: Option<String>,
    requirements: Vec<ParsedRequirement>,
    finished_units: Vec<ParsedUnit>,
    totals: DocumentTotals,
    row_issues: Vec<RowIssue>,
}

impl ParserState {
    fn new() -> Self {
        ParserState {
            section: Section::Requirements,
            order_number: None,
            client: None,
            project: None,
            system: None,
            deadline: None,
            pvc_delivery_date: None,
            requirements: Vec::new(),
            finished_units: Vec::new(),
            totals: DocumentTotals::default(),
            row_issues: Vec::new(),
        }
    }

    fn issue(&mut self, row: usize, field: Option<&str>, reason: impl Into<String>) {
        self.row_issues.push(RowIssue {
            row,
            field: field.map(str::to_string),
            reason: reason.into(),
        });
    }
}

/// Parse one decoded cut-list file into a structured document.
pub fn parse_document(text: &str) -> ParseResult<ParsedDocument> {
    let mut state = ParserState::new();

    for (idx, line) in text.lines().enumerate() {
        let row = idx + 1;
        match classify_row(line) {
            RowClass::Metadata(key, value) => apply_metadata(&mut state, key, value),
            RowClass::SectionMarker(which) => state.section = Section::Units(which),
            RowClass::Total(kind, count) => match kind {
                TotalKind::Units => state.totals.units = count,
                TotalKind::Subunits => state.totals.subunits = count,
                TotalKind::GlassPanes => state.totals.glass_panes = count,
            },
            RowClass::RequirementShaped => {
                if state.section == Section::Requirements {
                    parse_requirement_row(&mut state, row, line);
                } else {
                    state.issue(row, None, "material row inside a unit list");
                }
            }
            RowClass::UnitShaped => {
                if let Section::Units(_) = state.section {
                    parse_unit_row(&mut state, row, line);
                }
                // unit-shaped noise before any list marker is ignored;
                // header exports sometimes carry numeric filler lines
            }
            RowClass::Unrecognized => {
                // headers, blank lines, decorations
            }
        }
    }

    let order_number = state
        .order_number
        .take()
        .ok_or(ParseError::MissingOrderNumber)?;
    if state.requirements.is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    fill_project_and_system(&mut state);

    Ok(ParsedDocument {
        order_number,
        client: state.client,
        project: state.project,
        system: state.system,
        deadline: state.deadline,
        pvc_delivery_date: state.pvc_delivery_date,
        requirements: state.requirements,
        finished_units: state.finished_units,
        totals: state.totals,
        row_issues: state.row_issues,
    })
}

fn apply_metadata(state: &mut ParserState, key: MetadataKey, value: String) {
    if value.is_empty() {
        return;
    }
    let slot = match key {
        MetadataKey::Client => &mut state.client,
        MetadataKey::Project => &mut state.project,
        MetadataKey::System => &mut state.system,
        MetadataKey::Deadline => &mut state.deadline,
        MetadataKey::PvcDeliveryDate => &mut state.pvc_delivery_date,
    };
    // first occurrence wins
    if slot.is_none() {
        *slot = Some(value);
    }
}

// ==========================================
// requirement rows: order;article;beams;rest_mm
// ==========================================
fn parse_requirement_row(state: &mut ParserState, row: usize, line: &str) {
    let fields: Vec<&str> = line.trim().split(';').map(str::trim).collect();

    let identity = match parse_order_number(fields[0]) {
        Ok(id) => id,
        Err(e) => {
            state.issue(row, Some("order_number"), e.to_string());
            return;
        }
    };
    // the first material row fixes the document's order number
    if state.order_number.is_none() {
        state.order_number = Some(identity.full());
    }

    let article = fields[1];
    if is_steel_article(article) {
        // steel reinforcement is not a PVC material requirement
        tracing::debug!(row, article, "skipping steel article");
        return;
    }
    let parts = match parse_article_number(article) {
        Ok(p) => p,
        Err(e) => {
            state.issue(row, Some("article_number"), e.to_string());
            return;
        }
    };

    let raw_beams: u32 = match fields[2].parse() {
        Ok(n) => n,
        Err(_) => {
            state.issue(row, Some("beam_count"), format!("not a count: {:?}", fields[2]));
            return;
        }
    };
    let raw_rest: u32 = match fields[3].parse() {
        Ok(n) => n,
        Err(_) => {
            state.issue(row, Some("remainder_mm"), format!("not a length: {:?}", fields[3]));
            return;
        }
    };

    let quantity = calculate_beams_and_meters(raw_beams, raw_rest);
    state.requirements.push(ParsedRequirement {
        profile_number: parts.profile_number,
        article_number: article.to_string(),
        color_code: parts.color_code,
        raw_beam_count: raw_beams,
        raw_remainder_mm: raw_rest,
        calculated_beams: quantity.beams,
        calculated_meters: quantity.meters,
    });
}

// ==========================================
// unit rows: lp;width;height;profile_type;quantity;reference
// ==========================================
fn parse_unit_row(state: &mut ParserState, row: usize, line: &str) {
    let fields: Vec<&str> = line.trim().split(';').map(str::trim).collect();

    let position: u32 = fields[0].parse().unwrap_or(0);
    let width_mm: u32 = fields[1].parse().unwrap_or(0);
    let height_mm: u32 = fields[2].parse().unwrap_or(0);

    if width_mm == 0 || height_mm == 0 {
        // placeholder rows the export tool emits for cancelled positions
        tracing::debug!(row, "skipping zero-dimension unit row");
        return;
    }

    let profile_type = fields.get(3).map(|s| s.to_string()).unwrap_or_default();
    let quantity: u32 = match fields.get(4).and_then(|s| s.parse().ok()) {
        Some(0) | None => {
            state.issue(row, Some("quantity"), "missing or zero unit quantity");
            return;
        }
        Some(n) => n,
    };
    let reference = fields.get(5).map(|s| s.to_string()).unwrap_or_default();

    state.finished_units.push(ParsedUnit {
        position,
        width_mm,
        height_mm,
        profile_type,
        quantity,
        reference,
    });
}

// ==========================================
// project / system auto-fill
// ==========================================
// Older exports omit the header lines; the unit list still carries the
// information. system <- most frequent profile type, project <- shared
// reference prefix (up to the last separator).
fn fill_project_and_system(state: &mut ParserState) {
    if state.system.is_none() {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for unit in &state.finished_units {
            if !unit.profile_type.is_empty() {
                *counts.entry(unit.profile_type.as_str()).or_default() += 1;
            }
        }
        state.system = counts
            .into_iter()
            .max_by_key(|(_, n)| *n)
            .map(|(t, _)| t.to_string());
    }

    if state.project.is_none() {
        let refs: Vec<&str> = state
            .finished_units
            .iter()
            .map(|u| u.reference.as_str())
            .filter(|r| !r.is_empty())
            .collect();
        if let Some(prefix) = common_reference_prefix(&refs) {
            state.project = Some(prefix);
        }
    }
}

fn common_reference_prefix(refs: &[&str]) -> Option<String> {
    let first = *refs.first()?;
    let mut len = first.len();
    for r in &refs[1..] {
        // compare whole characters; the slice below must never land
        // inside a multibyte sequence
        let mut common = 0;
        for ((i, a), b) in first.char_indices().zip(r.chars()) {
            if i >= len || a != b {
                break;
            }
            common = i + a.len_utf8();
        }
        len = common;
    }
    // cut back to the last separator so we keep whole tokens only
    let prefix = &first[..len];
    let end = prefix.rfind(['/', '-', '_', ' '])?;
    let trimmed = prefix[..end].trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Klient: Kowalski Jan
Projekt: Osiedle Wschód
System: Salamander 82
Termin realizacji: 2025-12-15
Dostawa PVC: 01.12.2025
53526;19016050;10;1500
53526;19016051;4;0
53526;20154000;2;500
Lista okien
Lp;Szerokość;Wysokość;Typ;Ilość;Referencja
1;1200;1400;Okno R;2;BUD-A/01
2;900;2100;Okno RU;1;BUD-A/02
3;0;0;Okno R;1;BUD-A/03
Łączna liczba okien: 3
Lista drzwi
1;1000;2100;Drzwi D;1;BUD-A/10
Łączna liczba skrzydeł: 5
Łączna liczba szyb: 7
";

    #[test]
    fn test_parses_full_sample() {
        let doc = parse_document(SAMPLE).unwrap();

        assert_eq!(doc.order_number, "53526");
        assert_eq!(doc.client.as_deref(), Some("Kowalski Jan"));
        assert_eq!(doc.project.as_deref(), Some("Osiedle Wschód"));
        assert_eq!(doc.system.as_deref(), Some("Salamander 82"));
        assert_eq!(doc.deadline.as_deref(), Some("2025-12-15"));
        assert_eq!(doc.pvc_delivery_date.as_deref(), Some("01.12.2025"));

        // steel row 20154000 skipped silently
        assert_eq!(doc.requirements.len(), 2);
        assert_eq!(doc.requirements[0].profile_number, "9016");
        assert_eq!(doc.requirements[0].color_code, "050");
        assert_eq!(doc.requirements[0].calculated_beams, 9);
        assert_eq!(doc.requirements[0].calculated_meters, 5.0);
        assert_eq!(doc.requirements[1].calculated_beams, 4);
        assert_eq!(doc.requirements[1].calculated_meters, 0.0);

        // zero-dimension window filtered; 2 windows + 1 door remain
        assert_eq!(doc.finished_units.len(), 3);
        assert_eq!(doc.finished_units[2].profile_type, "Drzwi D");

        assert_eq!(doc.totals.units, 3);
        assert_eq!(doc.totals.subunits, 5);
        assert_eq!(doc.totals.glass_panes, 7);

        assert!(doc.row_issues.is_empty());
    }

    #[test]
    fn test_variant_order_number_from_first_row() {
        let text = "53526-a;19016050;10;1500\n53526-a;19016051;4;0\n";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.order_number, "53526-a");
    }

    #[test]
    fn test_trailing_dash_order_number_normalizes() {
        let text = "53526-;19016050;10;1500\n";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.order_number, "53526");
    }

    #[test]
    fn test_missing_order_number_fails() {
        let text = "Klient: Nowak\nLista okien\n1;1200;1400;Okno R;2;X\n";
        assert!(matches!(
            parse_document(text),
            Err(ParseError::MissingOrderNumber)
        ));
    }

    #[test]
    fn test_steel_only_file_is_empty() {
        let text = "53526;20154000;2;500\n";
        assert!(matches!(parse_document(text), Err(ParseError::EmptyDocument)));
    }

    #[test]
    fn test_bad_rows_become_issues_not_errors() {
        let text = "\
53526;19016050;10;1500
53526;19016051;abc;0
1;1200;1400;Okno R;0;X
";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.requirements.len(), 1);
        assert_eq!(doc.row_issues.len(), 1);
        assert_eq!(doc.row_issues[0].row, 2);
        assert_eq!(doc.row_issues[0].field.as_deref(), Some("beam_count"));

        let summary = doc.validation_summary();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.success_rows, 1);
        assert_eq!(summary.failed_rows, 1);
    }

    #[test]
    fn test_short_article_row_is_excluded_silently() {
        // 6-digit code is not an article number: the row is not
        // material-shaped at all and must not disturb order capture
        let text = "\
53526;123456;10;1500
53526;19016050;4;0
";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.order_number, "53526");
        assert_eq!(doc.requirements.len(), 1);
        assert_eq!(doc.requirements[0].article_number, "19016050");
        assert!(doc.row_issues.is_empty());
    }

    #[test]
    fn test_system_autofill_from_profile_types() {
        let text = "\
53526;19016050;10;1500
Lista okien
1;1200;1400;Okno R;2;BUD-A/01
2;900;2100;Okno R;1;BUD-A/02
3;800;800;Okno RU;1;BUD-A/03
";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.system.as_deref(), Some("Okno R"));
        assert_eq!(doc.project.as_deref(), Some("BUD-A"));
    }

    #[test]
    fn test_project_autofill_survives_multibyte_references() {
        // references that diverge inside a multibyte character share
        // no whole character, so no project is derived
        let text = "\
53526;19016050;10;1500
Lista okien
1;1200;1400;Okno R;2;\u{105}bc/01
2;900;2100;Okno R;1;\u{107}bc/02
";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.project, None);
    }

    #[test]
    fn test_project_autofill_keeps_shared_multibyte_prefix() {
        let text = "\
53526;19016050;10;1500
Lista okien
1;1200;1400;Okno R;2;Łąka/01
2;900;2100;Okno R;1;Łąka/02
";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.project.as_deref(), Some("Łąka"));
    }

    #[test]
    fn test_explicit_header_wins_over_autofill() {
        let text = "\
System: Salamander 82
53526;19016050;10;1500
Lista okien
1;1200;1400;Okno R;2;BUD-A/01
";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.system.as_deref(), Some("Salamander 82"));
    }
}
