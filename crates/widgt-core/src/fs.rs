//! Filesystem helpers shared by the deployment engine and request routing.

use std::io;
use std::path::{Path, PathBuf};

/// Characters never allowed in a widget directory name. `.` is included so
/// an identifier can never smuggle a `..` traversal segment.
const INVALID_DIR_CHARS: &[char] = &['.', '<', '>', ':', '"', '|', '?', '*', '\\'];

/// The character substituted for disallowed identifier characters.
const REPLACEMENT_CHAR: char = '_';

/// Map a widget identifier to a filesystem-safe directory name.
///
/// Strips a leading `http://` or `https://` scheme, keeps `/` so that
/// IRI-style identifiers become nested directories, and replaces `.` and
/// other disallowed characters with `_`.
#[must_use]
pub fn dir_name_for_id(identifier: &str) -> String {
    let stripped = identifier
        .strip_prefix("http://")
        .or_else(|| identifier.strip_prefix("https://"))
        .unwrap_or(identifier);

    stripped
        .chars()
        .map(|c| {
            if c.is_control() || INVALID_DIR_CHARS.contains(&c) {
                REPLACEMENT_CHAR
            } else {
                c
            }
        })
        .collect()
}

/// Compute the blake3 checksum of a file's contents as a hex string.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be read.
pub fn checksum(path: &Path) -> io::Result<String> {
    let contents = std::fs::read(path)?;
    Ok(blake3::hash(&contents).to_hex().to_string())
}

/// Map an incoming request path to a file below the widget base directory.
///
/// Finds `service_prefix` followed by `/` in the request path (ASCII
/// case-insensitive), decodes `%20` to spaces in the remainder, and joins it
/// onto `base_dir`. Returns `None` when the prefix does not occur. The
/// returned path is not guaranteed to exist.
#[must_use]
pub fn map_request_path(
    base_dir: &Path,
    service_prefix: &str,
    request_path: &str,
) -> Option<PathBuf> {
    let needle = format!("{service_prefix}/");
    let start = find_ignore_ascii_case(request_path, &needle)?;
    let relative = request_path
        .get(start.saturating_add(needle.len())..)?
        .replace("%20", " ");
    Some(base_dir.join(relative))
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.char_indices().map(|(i, _)| i).find(|&i| {
        haystack
            .get(i..i.saturating_add(needle.len()))
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(needle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_name_strips_scheme_and_replaces_dots() {
        assert_eq!(
            dir_name_for_id("http://example.org/clock"),
            "example_org/clock"
        );
        assert_eq!(
            dir_name_for_id("https://example.org/clock"),
            "example_org/clock"
        );
    }

    #[test]
    fn dir_name_defuses_traversal_segments() {
        assert_eq!(dir_name_for_id("../../etc/passwd"), "__/__/etc/passwd");
    }

    #[test]
    fn dir_name_replaces_reserved_characters() {
        assert_eq!(dir_name_for_id(r#"a:b|c?d"e"#), "a_b_c_d_e");
    }

    #[test]
    fn checksum_changes_with_content() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("feature.xml");

        std::fs::write(&file, "one").unwrap();
        let first = checksum(&file).unwrap();

        std::fs::write(&file, "two").unwrap();
        let second = checksum(&file).unwrap();

        assert_ne!(first, second);
        assert_eq!(second, checksum(&file).unwrap());
    }

    #[test]
    fn request_path_maps_below_base_dir() {
        let mapped = map_request_path(
            Path::new("/srv/widgets"),
            "widgt",
            "/app/WIDGT/example_org/clock/index.html",
        )
        .unwrap();
        assert_eq!(
            mapped,
            Path::new("/srv/widgets/example_org/clock/index.html")
        );
    }

    #[test]
    fn request_path_decodes_spaces() {
        let mapped =
            map_request_path(Path::new("/srv"), "widgt", "/widgt/my%20widget/index.html").unwrap();
        assert_eq!(mapped, Path::new("/srv/my widget/index.html"));
    }

    #[test]
    fn request_path_without_prefix_does_not_map() {
        assert!(map_request_path(Path::new("/srv"), "widgt", "/other/index.html").is_none());
    }
}
