// Tabfix URL Normalizer
// Maps raw tab URLs to the identity keys used for duplicate detection and
// hostname comparison. Every function here is pure and never panics.

use url::Url;

use crate::types::settings::DuplicateKeyMode;

/// Reduces a URL to its duplicate-detection key.
///
/// Unparsable input is returned unchanged.
pub fn normalize(raw: &str, mode: DuplicateKeyMode) -> String {
    match mode {
        DuplicateKeyMode::OriginPath => match Url::parse(raw) {
            Ok(url) => format!("{}{}", url.origin().ascii_serialization(), url.path()),
            Err(_) => raw.to_string(),
        },
        DuplicateKeyMode::StripFragment => match Url::parse(raw) {
            Ok(_) => raw.split_once('#').map_or(raw, |(before, _)| before).to_string(),
            Err(_) => raw.to_string(),
        },
    }
}

/// Lowercase hostname of a URL, or `None` for unparsable or host-less URLs.
pub fn hostname(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Strips a single leading `www.` label.
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Hostname with a leading `www.` removed.
pub fn site_host(raw: &str) -> Option<String> {
    hostname(raw).map(|h| strip_www(&h).to_string())
}

/// True when the URL parses and its scheme is one of `schemes`.
pub fn is_allowed_scheme(raw: &str, schemes: &[String]) -> bool {
    if raw.is_empty() {
        return false;
    }
    match Url::parse(raw) {
        Ok(url) => schemes.iter().any(|s| s.eq_ignore_ascii_case(url.scheme())),
        Err(_) => false,
    }
}
