//! Name Codec
//!
//! Pure helpers mapping container host names and IPv4 addresses to the
//! canonical owner names records are stored under.

use std::net::Ipv4Addr;

/// Maximum length of a single label (octets)
pub const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a name in presentation form, without the root dot
pub const MAX_NAME_LEN: usize = 253;

/// Suffix of every IPv4 reverse lookup name
pub const REVERSE_SUFFIX: &str = "in-addr.arpa.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Invalid name: {name} ({reason})")]
    InvalidName { name: String, reason: &'static str },
}

/// Normalize a configured suffix domain: trim dots and whitespace, lowercase.
///
/// Returns `None` when nothing is left, meaning names are rooted directly.
pub fn normalize_suffix(suffix: &str) -> Option<String> {
    let trimmed = suffix.trim().trim_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

/// Build the canonical forward name for a host identifier.
///
/// `web` with suffix `docker` becomes `web.docker.`; without a suffix it
/// becomes `web.`. The result is lowercase.
pub fn to_canonical_name(host_id: &str, suffix: Option<&str>) -> Result<String, NameError> {
    let mut name = host_id.to_ascii_lowercase();
    if let Some(suffix) = suffix {
        name.push('.');
        name.push_str(&suffix.to_ascii_lowercase());
    }

    validate_name(&name)?;

    name.push('.');
    Ok(name)
}

/// Build the reverse lookup name for an IPv4 address, e.g.
/// `10.0.0.5` -> `5.0.0.10.in-addr.arpa.`
pub fn to_reverse_name(address: Ipv4Addr) -> String {
    let [a, b, c, d] = address.octets();
    format!("{}.{}.{}.{}.{}", d, c, b, a, REVERSE_SUFFIX)
}

/// Check a name in presentation form without its trailing dot
fn validate_name(name: &str) -> Result<(), NameError> {
    let invalid = |reason| NameError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("name too long"));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(invalid("empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(invalid("label too long"));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(invalid("invalid character"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("label starts or ends with hyphen"));
        }
    }

    Ok(())
}
