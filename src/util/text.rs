use std::borrow::Cow;

use sha2::{Digest, Sha256};

/// Longest slug body kept before a hash suffix is appended.
const MAX_SLUG_LEN: usize = 96;
/// Hex digits of the SHA-256 digest used to disambiguate lossy slugs.
const HASH_SUFFIX_LEN: usize = 12;

/// Converts an identifier into a filesystem-safe directory name.
///
/// Lower-cases the input and collapses every run of non-alphanumeric
/// characters into a single `-`, trimming dashes at both ends. Unicode
/// letters and digits are kept as-is (lower-cased).
///
/// When normalisation leaves nothing, or the result has to be cut to
/// 96 characters, a short SHA-256 digest of the original
/// identifier is appended so that such identifiers do not all collapse onto
/// the same name.
///
/// # Examples
///
/// ```
/// use podvault::util::slugify;
///
/// assert_eq!(slugify("abc-123"), "abc-123");
/// assert_eq!(slugify("https://Example.com/ep/42?x=1"), "https-example-com-ep-42-x-1");
/// ```
pub fn slugify(identifier: &str) -> String {
    let mut slug = String::with_capacity(identifier.len());
    let mut pending_dash = false;

    for c in identifier.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    let truncated = slug.chars().count() > MAX_SLUG_LEN;
    if truncated {
        slug = slug.chars().take(MAX_SLUG_LEN).collect();
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() || truncated {
        let digest = format!("{:x}", Sha256::digest(identifier.as_bytes()));
        let suffix = &digest[..HASH_SUFFIX_LEN];
        if slug.is_empty() {
            return suffix.to_string();
        }
        slug.push('-');
        slug.push_str(suffix);
    }

    slug
}

/// Makes a single path component out of untrusted text.
///
/// Path separators and control characters are replaced with `_` and
/// surrounding whitespace is trimmed; everything else is kept verbatim.
/// Returns `None` for names that cannot stand alone as a component
/// (empty, `.` or `..`).
///
/// Returns `Cow::Borrowed` when nothing needed replacing.
pub fn sanitize_component(name: &str) -> Option<Cow<'_, str>> {
    let trimmed = name.trim();
    if matches!(trimmed, "" | "." | "..") {
        return None;
    }

    let needs_replace = trimmed
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control());

    if !needs_replace {
        return Some(Cow::Borrowed(trimmed));
    }

    let replaced: String = trimmed
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    Some(Cow::Owned(replaced))
}
