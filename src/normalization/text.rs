/// Trim whitespace; blank input becomes `None`.
pub fn normalize_str(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a trimmed integer; blank or malformed input is `None`, not an error.
pub fn safe_int(value: Option<&str>) -> Option<i64> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Join the present parts with a single space.
pub fn join_name(parts: &[Option<String>]) -> Option<String> {
    let joined = parts
        .iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_absent() {
        assert_eq!(normalize_str(None), None);
        assert_eq!(normalize_str(Some("")), None);
        assert_eq!(normalize_str(Some(" \t\n")), None);
        assert_eq!(normalize_str(Some("  The Comedy Store ")).as_deref(), Some("The Comedy Store"));
    }

    #[test]
    fn integers_parse_or_vanish() {
        assert_eq!(safe_int(Some(" 120 ")), Some(120));
        assert_eq!(safe_int(Some("")), None);
        assert_eq!(safe_int(Some("12.5")), None);
        assert_eq!(safe_int(None), None);
    }

    #[test]
    fn joins_present_name_parts() {
        assert_eq!(
            join_name(&[Some("Ada".into()), Some("Lovelace".into())]).as_deref(),
            Some("Ada Lovelace")
        );
        assert_eq!(join_name(&[None, Some("Lovelace".into())]).as_deref(), Some("Lovelace"));
        assert_eq!(join_name(&[None, None]), None);
    }
}
