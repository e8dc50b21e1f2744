// ==========================================
// Cut-List Import Pipeline - monetary amount parsing
// ==========================================
// Supplier documents write amounts the Polish way: comma decimal
// separator, spaces (incl. NBSP) as thousands separators, sometimes a
// currency sign glued on. "1 234,56 €" -> 1234.56
// ==========================================

/// Parse a locale-formatted amount. Returns None instead of failing:
/// an unparseable amount downgrades to "no value", never aborts a row.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '€')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = cleaned.replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}
