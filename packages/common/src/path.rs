//! Canonical content paths.
//!
//! A path is a `/`-delimited string locating a node in the remote content
//! tree. All functions here are pure.

/// Join a child key onto a parent path.
///
/// An empty parent yields the child unchanged, so `join("", "x") == "x"`.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Resolve the path a node should synchronize with.
///
/// An explicit, non-empty path always wins. Otherwise a page path is joined
/// with the item path (empty when absent). `None` means there is nothing to
/// synchronize.
pub fn canonical(
    explicit_path: Option<&str>,
    page_path: Option<&str>,
    item_path: Option<&str>,
) -> Option<String> {
    if let Some(explicit) = explicit_path.filter(|p| !p.is_empty()) {
        return Some(explicit.to_string());
    }

    page_path.map(|page| join(page, item_path.unwrap_or("")))
}

/// Collapse repeated separators and drop a trailing one.
///
/// The root path `/` is kept as is.
pub fn sanitize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;

    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(c);
    }

    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }

    out
}

/// Parent of a path, or `None` at a root segment
pub fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(idx) => Some(&path[..idx]),
    }
}

/// Last segment of a path
pub fn last_segment(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Iterate a path and all of its ancestors, nearest first
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(path), |p| parent(p))
}
