//! Canonicalization of dialed strings to 10-digit national numbers
//!
//! Dialed strings arrive in every historical format the PBX has ever seen:
//! local, with the domestic trunk prefix, with the country code, with both,
//! with punctuation. One canonical 10-digit key is what correlation and
//! storage agree on.

/// Normalize a raw dialed string to the canonical 10-digit national form
///
/// Strips every non-digit, then applies a fixed-precedence prefix chain:
///
/// 1. `01152…` (trunk plus country) loses the 5-digit prefix; else
/// 2. `01…` longer than 10 digits loses the trunk pair; else
/// 3. `52…` at 12 digits or more keeps the trailing 10.
/// 4. An 11-digit result with a leading `1` loses that digit.
/// 5. Anything still longer than 10 keeps the trailing 10.
///
/// Returns `Some` only when exactly 10 digits remain. Prefix checks run
/// before the trailing-10 fallback so a country-qualified number is never
/// truncated at the wrong end. Never fails on malformed input.
pub fn normalize_mx_phone10(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    // All slicing below is byte-indexed on an ASCII-only string.
    let mut rest: &str = &digits;
    if let Some(stripped) = rest.strip_prefix("01152") {
        rest = stripped;
    } else if rest.starts_with("01") && rest.len() > 10 {
        rest = &rest[2..];
    } else if rest.starts_with("52") && rest.len() >= 12 {
        rest = &rest[rest.len() - 10..];
    }

    if rest.len() == 11 && rest.starts_with('1') {
        rest = &rest[1..];
    }
    if rest.len() > 10 {
        rest = &rest[rest.len() - 10..];
    }

    if rest.len() == 10 {
        Some(rest.to_string())
    } else {
        None
    }
}
