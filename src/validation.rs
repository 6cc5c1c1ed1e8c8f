// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use tracing::warn;
use url::Url;

const MAX_TARGET_LENGTH: usize = 2000;

/// Characters that must never reach the scanner command line. This is an
/// argument-injection defense, not URL syntax validation.
const SHELL_METACHARACTERS: &[char] = &[
    '`', '$', '(', ')', '{', '}', '[', ']', '|', ';', '&', '<', '>', ' ',
];

/// Loopback and private-network host prefixes. Scanning these is allowed
/// but flagged.
const PRIVATE_HOST_PREFIXES: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "0.0.0.0",
    "::1",
    "192.168.",
    "10.",
    "172.16.",
];

/// Check a target URL before any subprocess is spawned for it.
///
/// Accepts only http/https URLs up to 2000 bytes with a parseable, non-empty
/// host free of shell metacharacters and `..` sequences. No side effects
/// beyond logging.
pub fn is_valid_target(target: &str) -> bool {
    if target.is_empty() || target.len() > MAX_TARGET_LENGTH {
        return false;
    }

    if target.contains(SHELL_METACHARACTERS) {
        return false;
    }

    let parsed = match Url::parse(target) {
        Ok(url) => url,
        Err(_) => return false,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let host = match parsed.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => return false,
    };

    if host.contains("..") {
        return false;
    }

    let host_lower = host.to_ascii_lowercase();
    if PRIVATE_HOST_PREFIXES
        .iter()
        .any(|prefix| host_lower.starts_with(prefix))
    {
        warn!("scanning loopback/private host {}", host);
    }

    true
}
