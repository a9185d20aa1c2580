//! Account label helpers.

/// Drop the leading account number from a label.
///
/// `"800002 Savings"` becomes `"Savings"`. A single-token label is returned
/// trimmed but otherwise unchanged.
pub fn clean_account_name(label: &str) -> String {
    let trimmed = label.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// First whitespace-separated token of a label, which the site uses as the
/// option value for account selects.
pub fn account_number(label: &str) -> &str {
    label.split_whitespace().next().unwrap_or("")
}
