//! Entry name rules and collision-free name generation.

use crate::error::TreeError;
use unicode_normalization::UnicodeNormalization;

/// Characters that may never appear in an entry name
pub const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Attempts made by [`duplicate_name`] before giving up
pub const MAX_DUPLICATE_ATTEMPTS: usize = 200;

/// Validate an entry name.
pub fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.trim().is_empty() {
        return Err(TreeError::Validation("Name cannot be empty".to_string()));
    }

    if let Some(c) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(TreeError::Validation(format!(
            "Name '{}' contains invalid character '{}'",
            name, c
        )));
    }

    if name == "." || name == ".." {
        return Err(TreeError::Validation(format!(
            "Name '{}' is reserved",
            name
        )));
    }

    Ok(())
}

/// Comparison key for sibling collision checks (NFC, then lowercase).
pub fn name_key(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}

pub fn names_collide(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}

/// Resolve `base` against a sibling set by appending ` (n)`.
///
/// Files keep their extension after the suffix; folders take it on the whole name.
pub fn unique_name<'a>(siblings: impl IntoIterator<Item = &'a str>, base: &str, is_file: bool) -> String {
    let taken: std::collections::HashSet<String> = siblings.into_iter().map(name_key).collect();
    if !taken.contains(&name_key(base)) {
        return base.to_string();
    }

    let (stem, ext) = if is_file {
        split_extension(base)
    } else {
        (base, "")
    };
    let mut n = 1;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if !taken.contains(&name_key(&candidate)) {
            return candidate;
        }
        n += 1;
    }
}

/// Name for a duplicate of `name`: `<stem> copy<ext>`, then `<stem> copy 2<ext>`, ...
///
/// Folders never split an extension. Returns `None` once
/// [`MAX_DUPLICATE_ATTEMPTS`] candidates have been tried.
pub fn duplicate_name<'a>(
    siblings: impl IntoIterator<Item = &'a str>,
    name: &str,
    is_file: bool,
) -> Option<String> {
    let taken: std::collections::HashSet<String> = siblings.into_iter().map(name_key).collect();
    let (stem, ext) = if is_file {
        split_extension(name)
    } else {
        (name, "")
    };
    let stem = strip_copy_suffix(stem);

    let first = format!("{} copy{}", stem, ext);
    if !taken.contains(&name_key(&first)) {
        return Some(first);
    }
    (2..=MAX_DUPLICATE_ATTEMPTS)
        .map(|i| format!("{} copy {}{}", stem, i, ext))
        .find(|candidate| !taken.contains(&name_key(candidate)))
}

/// Split `name.ext`; dotfiles like `.gitignore` have no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Drop a trailing ` copy` or ` copy N` (case-insensitive).
fn strip_copy_suffix(stem: &str) -> &str {
    let lower = stem.to_ascii_lowercase();
    let mut end = lower.len();
    if let Some(idx) = lower.rfind(' ') {
        let tail = &lower[idx + 1..];
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            end = idx;
        }
    }
    if lower[..end].ends_with(" copy") {
        &stem[..end - " copy".len()]
    } else {
        stem
    }
}
