// src/resolve/mirror.rs
// Picks the download link that matches the configured mirror.

use crate::config::ResolutionConfig;

// Security updates are only published here, never on the regular mirrors
const SECURITY_REPOSITORY: &str = "security.debian.org/debian-security";

// "http://ftp.us.debian.org/debian/pool/main/d/dbus/x.deb" -> "ftp.us.debian.org/debian"
// Everything after the first "/{root}" is cut off, the scheme is dropped.
pub fn normalize(candidate: &str, root: &str) -> Option<String> {
    let (_, rest) = candidate.split_once("//")?;
    let marker = format!("/{root}");
    let host = match rest.find(&marker) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(format!("{host}{marker}"))
}

pub fn is_security(candidate: &str) -> bool {
    candidate.contains(SECURITY_REPOSITORY)
}

pub fn accepts(candidate: &str, config: &ResolutionConfig) -> bool {
    is_security(candidate)
        || normalize(candidate, config.mirror_root()).as_deref() == Some(config.mirror.as_str())
}

// First acceptable candidate in page order
pub fn select<'a>(candidates: &'a [String], config: &ResolutionConfig) -> Option<&'a str> {
    candidates
        .iter()
        .map(String::as_str)
        .find(|candidate| accepts(candidate, config))
}
