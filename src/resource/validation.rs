//! Structural checks shared by every resource kind
//!
//! Each check returns the violated constraint as a message; the resource's
//! `validate()` wraps it into [`crate::Error::Configuration`] with its own
//! kind and name.

/// Maximum length of a DNS subdomain name (object names)
const MAX_SUBDOMAIN_LEN: usize = 253;

/// Maximum length of a DNS label (namespaces)
const MAX_LABEL_LEN: usize = 63;

/// Binary and decimal SI suffixes accepted in quantities
const QUANTITY_SUFFIXES: &[&str] = &[
    "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "n", "u", "m", "k", "M", "G", "T", "P", "E",
];

/// Check an object name is an RFC 1123 DNS subdomain.
///
/// Names end up as kubectl arguments and file contents, so rejecting anything
/// outside `[a-z0-9.-]` also rules out shell metacharacters.
pub fn validate_name(field: &str, name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if name.len() > MAX_SUBDOMAIN_LEN {
        return Err(format!(
            "{field} '{name}' is longer than {MAX_SUBDOMAIN_LEN} characters"
        ));
    }
    check_dns_chars(field, name, true)
}

/// Check a namespace is an RFC 1123 DNS label
pub fn validate_namespace(namespace: &str) -> Result<(), String> {
    if namespace.is_empty() {
        return Err("namespace must not be empty".to_string());
    }
    if namespace.len() > MAX_LABEL_LEN {
        return Err(format!(
            "namespace '{namespace}' is longer than {MAX_LABEL_LEN} characters"
        ));
    }
    check_dns_chars("namespace", namespace, false)
}

fn check_dns_chars(field: &str, value: &str, allow_dots: bool) -> Result<(), String> {
    let valid_char = |c: char| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || (allow_dots && c == '.')
    };
    if let Some(bad) = value.chars().find(|c| !valid_char(*c)) {
        return Err(format!(
            "{field} '{value}' contains invalid character '{bad}' (lowercase alphanumerics, '-'{} only)",
            if allow_dots { " and '.'" } else { "" }
        ));
    }
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let starts = value.chars().next().is_some_and(alnum);
    let ends = value.chars().last().is_some_and(alnum);
    if !starts || !ends {
        return Err(format!(
            "{field} '{value}' must start and end with an alphanumeric character"
        ));
    }
    Ok(())
}

/// Check a resource quantity string such as `100m`, `128Mi`, `1.5` or `2e3`.
///
/// Negative quantities are rejected; requests, limits and storage sizes are
/// never negative.
pub fn validate_quantity(field: &str, value: &str) -> Result<(), String> {
    let malformed = || format!("{field} '{value}' is not a valid quantity");

    let unsigned = value.strip_prefix('+').unwrap_or(value);
    if unsigned.starts_with('-') {
        return Err(format!("{field} '{value}' must not be negative"));
    }

    let number_end = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_end);

    let has_digit = number.chars().any(|c| c.is_ascii_digit());
    let dots = number.matches('.').count();
    if !has_digit || dots > 1 {
        return Err(malformed());
    }

    if suffix.is_empty() || QUANTITY_SUFFIXES.contains(&suffix) {
        return Ok(());
    }

    // Decimal exponent: e|E followed by an optionally signed integer
    let exponent = suffix
        .strip_prefix('e')
        .or_else(|| suffix.strip_prefix('E'))
        .ok_or_else(malformed)?;
    let digits = exponent
        .strip_prefix('+')
        .or_else(|| exponent.strip_prefix('-'))
        .unwrap_or(exponent);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }
    Ok(())
}

/// Check a replica count is non-negative
pub fn validate_replicas(field: &str, replicas: i32) -> Result<(), String> {
    if replicas < 0 {
        return Err(format!("{field} must not be negative (got {replicas})"));
    }
    Ok(())
}

/// Check a port number is in 1..=65535
pub fn validate_port(field: &str, port: u16) -> Result<(), String> {
    if port == 0 {
        return Err(format!("{field} must be between 1 and 65535"));
    }
    Ok(())
}

/// Check a ConfigMap/Secret data key or env var name
///
/// Keys may contain alphanumerics, '-', '_' and '.'.
pub fn validate_key(field: &str, key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    let valid = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if let Some(bad) = key.chars().find(|c| !valid(*c)) {
        return Err(format!("{field} '{key}' contains invalid character '{bad}'"));
    }
    Ok(())
}
