//! Slash-delimited workspace paths.
//!
//! Paths are stored denormalized on every entry, so every path must pass
//! through [`normalize`] before it is stored or compared.

/// Root sentinel, returned only when the caller passed a leading `/`
pub const ROOT: &str = "/";

/// Canonicalize a raw path string.
///
/// Drops empty and `.` segments, pops on `..` (absorbed at the root), and
/// rejoins with `/`. Character legality is not checked here.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let rooted = trimmed.starts_with('/');
    let mut stack: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            name => stack.push(name),
        }
    }

    if stack.is_empty() {
        return if rooted { ROOT.to_string() } else { String::new() };
    }
    stack.join("/")
}

/// Join a parent path and a child name; the bare name at the root.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() || parent == ROOT {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// All-but-last segment, or `None` for a top-level path.
pub fn parent_of(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

/// Last segment of the path.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Number of segments; zero for the empty path and the root sentinel.
pub fn depth(path: &str) -> usize {
    segments(path).count()
}

pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// True when `path` equals `ancestor` or lies underneath it.
///
/// Matching is segment-aware: `src2/a` is not within `src`.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if path == ancestor {
        return true;
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Replace the `old_prefix` portion of `path` with `new_prefix`.
///
/// Returns `None` when `path` is not within `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_within(path, old_prefix) {
        return None;
    }
    if path == old_prefix {
        return Some(new_prefix.to_string());
    }
    let rest = &path[old_prefix.len() + 1..];
    Some(join(new_prefix, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_segments() {
        assert_eq!(normalize("src//components/./Button.jsx"), "src/components/Button.jsx");
        assert_eq!(normalize("src/lib/../App.jsx"), "src/App.jsx");
        assert_eq!(normalize("  a/b/  "), "a/b");
    }

    #[test]
    fn test_normalize_absorbs_parent_past_root() {
        assert_eq!(normalize("../../a"), "a");
        assert_eq!(normalize("a/../.."), "");
    }

    #[test]
    fn test_normalize_root_sentinel() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/./.."), "/");
        assert_eq!(normalize("/src/App.jsx"), "src/App.jsx");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_join_and_split() {
        assert_eq!(join("", "a.txt"), "a.txt");
        assert_eq!(join("/", "a.txt"), "a.txt");
        assert_eq!(join("src", "a.txt"), "src/a.txt");
        assert_eq!(parent_of("src/lib/a.txt"), Some("src/lib"));
        assert_eq!(parent_of("a.txt"), None);
        assert_eq!(file_name("src/lib/a.txt"), "a.txt");
        assert_eq!(file_name("a.txt"), "a.txt");
        assert_eq!(depth("src/lib/a.txt"), 3);
        assert_eq!(depth(""), 0);
        assert_eq!(depth(ROOT), 0);
    }

    #[test]
    fn test_is_within_is_segment_aware() {
        assert!(is_within("src", "src"));
        assert!(is_within("src/a.js", "src"));
        assert!(!is_within("src2/a.js", "src"));
        assert!(!is_within("sr", "src"));
    }

    #[test]
    fn test_rebase() {
        assert_eq!(rebase("a/b/c.txt", "a/b", "a/c"), Some("a/c/c.txt".to_string()));
        assert_eq!(rebase("a/b", "a/b", "x"), Some("x".to_string()));
        assert_eq!(rebase("a/b/c.txt", "a/b", ""), Some("c.txt".to_string()));
        assert_eq!(rebase("a/bc", "a/b", "z"), None);
    }
}
