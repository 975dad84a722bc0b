//! Dotted path helpers shared by set paths, dependency names, mask names and
//! circumstance names.

/// Separator between path segments
pub const SEPARATOR: char = '.';

/// Check that `path` is non-empty and has no empty or whitespace-padded
/// segments.
///
/// Returns the reason on failure so callers can wrap it in their own error.
pub(crate) fn validate(path: &str) -> Result<(), String> {
    if path.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    if path.split(SEPARATOR).any(|segment| segment.trim().is_empty()) {
        return Err(format!("segments separated by '{}' must not be empty", SEPARATOR));
    }
    if path.split(SEPARATOR).any(|segment| segment != segment.trim()) {
        return Err("segments must not start or end with whitespace".to_string());
    }
    Ok(())
}

/// Iterate the segments of a validated path
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR)
}

/// Join a parent path and a child segment
pub(crate) fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", parent, SEPARATOR, segment)
    }
}
