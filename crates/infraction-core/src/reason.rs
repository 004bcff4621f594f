//! Reason normalization.
//!
//! The moderation data service and the platform audit log both cap reasons
//! at 512 characters. Longer reasons are cut and end with a placeholder.

/// Maximum reason length, in characters.
pub const REASON_MAX_CHARS: usize = 512;

/// Marker appended to truncated reasons.
pub const PLACEHOLDER: &str = "...";

/// Truncate `reason` to at most [`REASON_MAX_CHARS`] characters.
///
/// A truncated result is exactly `REASON_MAX_CHARS` long and ends with
/// [`PLACEHOLDER`]. Lengths are counted in `char`s so multi-byte text is
/// never split inside a code point.
pub fn normalize(reason: &str) -> String {
    if reason.chars().count() <= REASON_MAX_CHARS {
        return reason.to_string();
    }

    let keep = REASON_MAX_CHARS - PLACEHOLDER.chars().count();
    let mut out: String = reason.chars().take(keep).collect();
    out.push_str(PLACEHOLDER);
    out
}

/// [`normalize`] over an optional reason.
pub fn normalize_opt(reason: Option<&str>) -> Option<String> {
    reason.map(normalize)
}
