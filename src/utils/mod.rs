use regex::Regex;

/// Shape check for Kick.com channel/VOD URLs. Advisory only: the backend is
/// the authority, so a mismatch should produce a hint, never a hard stop.
pub fn is_kick_url(url: &str) -> bool {
    let re = Regex::new(r"(?i)^https?://(www\.)?kick\.com/[A-Za-z0-9_]").expect("valid pattern");
    re.is_match(url)
}

/// VOD URLs carry a /video/ path segment; everything else is a channel page.
pub fn is_vod_url(url: &str) -> bool {
    url.contains("/video/")
}

/// Parse "HH:MM:SS", "MM:SS", or bare seconds into seconds. Mirrors the
/// backend's leniency; anything non-numeric is None.
pub fn parse_clock_time(time_str: &str) -> Option<u64> {
    let parts: Vec<&str> = time_str.split(':').collect();
    let nums: Option<Vec<u64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
    let nums = nums?;

    match nums.as_slice() {
        [h, m, s] => Some(h * 3600 + m * 60 + s),
        [m, s] => Some(m * 60 + s),
        [s] => Some(*s),
        _ => None,
    }
}

pub fn sanitize_filename(filename: &str) -> String {
    // Remove or replace characters that are invalid in filenames
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
