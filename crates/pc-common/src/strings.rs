//! String helpers.

/// True when the value is absent, empty, or whitespace only.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}
