/// Normalizes a phone number matched by a pattern fallback
///
/// Whitespace is removed and a leading Turkish country code (`+90`, `0090`
/// or a bare `90` in front of a ten-digit number) becomes a single leading
/// zero. Numbers without a country code are returned unchanged apart from
/// the whitespace removal.
pub fn normalize_phone(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let national = if let Some(rest) = compact.strip_prefix("+90") {
        format!("0{}", rest)
    } else if let Some(rest) = compact.strip_prefix("0090") {
        format!("0{}", rest)
    } else if compact.len() == 12 && compact.starts_with("90") && is_digits(&compact) {
        format!("0{}", &compact[2..])
    } else {
        compact
    };

    // "+90 0532..." leaves a doubled zero behind
    let trimmed = national.trim_start_matches('0');
    if trimmed.len() < national.len() {
        format!("0{}", trimmed)
    } else {
        national
    }
}

fn is_digits(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit())
}
