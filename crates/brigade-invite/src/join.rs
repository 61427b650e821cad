//! Join links: `{origin}/join/{token}`.
//!
//! The token alone identifies both the kitchen and the credential, so no
//! kitchen appears in the URL.

/// Path segment that precedes the token.
pub const JOIN_SEGMENT: &str = "/join/";

/// Build the join URL for `token` on `origin`.
pub fn join_url(origin: &str, token: &str) -> String {
    format!("{}{}{}", origin.trim_end_matches('/'), JOIN_SEGMENT, token)
}

/// Extract the token from a join URL or path.
///
/// Accepts full URLs and bare paths. Query strings, fragments and trailing
/// slashes are ignored. Returns `None` when there is no join segment or the
/// token is empty.
pub fn parse_join_path(input: &str) -> Option<&str> {
    let start = input.rfind(JOIN_SEGMENT)? + JOIN_SEGMENT.len();
    let rest = &input[start..];
    let end = rest
        .find(|c: char| matches!(c, '?' | '#' | '/'))
        .unwrap_or(rest.len());
    let token = rest[..end].trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
