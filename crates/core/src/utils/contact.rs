//! Contact field helpers (email shape check, Indonesian phone formatting).

/// Checks the `local@domain.tld` shape with no whitespace anywhere.
///
/// This is a shape check only; deliverability is the backend's concern.
pub fn validate_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Needs a dot with at least one character on each side.
    domain
        .char_indices()
        .any(|(idx, c)| c == '.' && idx > 0 && idx + 1 < domain.len())
}

/// Normalizes a phone number to `+62...` international form.
///
/// - non-digits are dropped
/// - a leading `0` becomes `62`
/// - a bare leading `8` gets `62` prepended
/// - the result is prefixed with `+`
///
/// Empty input stays empty.
pub fn format_phone_number(phone: &str) -> String {
    if phone.is_empty() {
        return String::new();
    }

    let mut cleaned: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if let Some(rest) = cleaned.strip_prefix('0') {
        cleaned = format!("62{}", rest);
    }
    if cleaned.starts_with('8') {
        cleaned = format!("62{}", cleaned);
    }

    format!("+{}", cleaned)
}
