//! Score functions for monitoring snapshots.

/// Response headers that count towards the security score.
pub const SECURITY_HEADERS: [&str; 5] = [
    "strict-transport-security",
    "x-content-type-options",
    "x-frame-options",
    "content-security-policy",
    "x-xss-protection",
];

const SECURITY_BASE_SCORE: usize = 50;
const SECURITY_HEADER_WEIGHT: usize = 50;
const HTTPS_BONUS: usize = 10;

/// Step function of response time.
pub fn performance_score(response_time_ms: u64) -> u8 {
    match response_time_ms {
        0..500 => 100,
        500..1000 => 80,
        1000..2000 => 60,
        2000..3000 => 40,
        _ => 20,
    }
}

/// Performance score for a probe result.
///
/// A failed latency check on an unreachable target reports 0 ms, which the
/// step function alone would score as 100. That case scores 0 instead.
pub fn probe_performance_score(response_time_ms: u64, uptime: bool) -> u8 {
    if response_time_ms == 0 && !uptime {
        0
    } else {
        performance_score(response_time_ms)
    }
}

/// `50 + 50 * found / 5`, plus 10 over HTTPS, clamped to 100.
pub fn security_score(found_headers: usize, https: bool) -> u8 {
    let found = found_headers.min(SECURITY_HEADERS.len());
    let mut score = SECURITY_BASE_SCORE + SECURITY_HEADER_WEIGHT * found / SECURITY_HEADERS.len();
    if https {
        score += HTTPS_BONUS;
    }
    score.min(100) as u8
}

/// Count how many of [`SECURITY_HEADERS`] are present.
pub fn count_security_headers(headers: &reqwest::header::HeaderMap) -> usize {
    SECURITY_HEADERS
        .iter()
        .filter(|name| headers.contains_key(**name))
        .count()
}
