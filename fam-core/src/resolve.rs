//! Date-token substitution in expected-file name patterns.
//!
//! Patterns may embed any of three tokens, each bound to a fixed date
//! layout. Resolution is pure: unknown tokens are left verbatim and a
//! pattern without tokens passes through untouched (modulo trimming).

use chrono::NaiveDate;

/// Recognized tokens and the chrono format each one expands to.
const DATE_TOKENS: [(&str, &str); 3] = [
    ("<dateToken>", "%m%d%Y"),  // 11122024
    ("<dateToken1>", "%Y%m%d"), // 20241112
    ("<dateToken2>", "%Y%d%m"), // 20241211
];

/// Substitute every recognized date token in `pattern` against `date`.
///
/// The result is trimmed; hand-edited catalogs tend to carry stray
/// whitespace around pattern names.
pub fn resolve_pattern(pattern: &str, date: NaiveDate) -> String {
    let mut resolved = pattern.to_string();
    for (token, format) in DATE_TOKENS {
        if resolved.contains(token) {
            let formatted = date.format(format).to_string();
            resolved = resolved.replace(token, &formatted);
        }
    }
    resolved.trim().to_string()
}
