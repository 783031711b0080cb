//! Entry-path helpers.
//!
//! Paths are dot-separated keys with bracketed indices (`a.b[2].c`). A
//! bracketed index opens a new level just like a dot does, so the parent of
//! `a.b[2]` is `a.b` and the parent of `a.b` is `a`.

/// True when `prefix` is a strict structural ancestor of `path`.
pub fn is_strict_prefix(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() {
        return !path.is_empty();
    }
    path.len() > prefix.len()
        && path.starts_with(prefix)
        && matches!(path.as_bytes()[prefix.len()], b'.' | b'[')
}

/// The path one level up, or `None` for the empty path. Top-level paths
/// report the empty path as their parent.
pub fn parent_path(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    let cut = match (path.rfind('.'), path.rfind('[')) {
        (Some(d), Some(b)) => d.max(b),
        (Some(d), None) => d,
        (None, Some(b)) => b,
        (None, None) => return Some(""),
    };
    Some(&path[..cut])
}

/// Dot-separated segments; an indexed segment like `b[2]` stays whole.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// Last dot-separated segment (`a.b[2]` yields `b[2]`).
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// True when some segment is `name` followed by a bracketed integer index.
pub fn has_indexed_segment(path: &str, name: &str) -> bool {
    segments(path).any(|segment| {
        segment
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
            .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
    })
}

/// The `path` key relative to an ancestor `anchor` (leading separator trimmed).
pub fn relative_key<'a>(anchor: &str, path: &'a str) -> &'a str {
    let rest = &path[anchor.len()..];
    rest.strip_prefix('.').unwrap_or(rest)
}

/// First segment of the key below `anchor` (`props` for `x.props.text` under `x`).
pub fn first_relative_segment<'a>(anchor: &str, path: &'a str) -> &'a str {
    let rest = relative_key(anchor, path);
    let end = rest
        .find(['.', '['])
        .unwrap_or(rest.len());
    &rest[..end]
}
