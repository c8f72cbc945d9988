//! Upload file-name handling.

use uuid::Uuid;

/// Reduce a client-supplied name to a safe single path component.
///
/// Directory parts are dropped, characters outside `[A-Za-z0-9._-]` become
/// `_`, and leading dots are removed so the result can never be hidden or
/// climb out of the upload directory. Returns `None` if nothing is left.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Name of the private file an upload is written to before it is committed.
///
/// Sanitized names never start with a dot, so a staging file cannot collide
/// with a committed upload.
pub fn staging_file_name(file_name: &str, id: Uuid) -> String {
    format!(".{file_name}.{}.part", id.simple())
}

/// Lowercase text after the last dot, if there is a non-empty one.
pub fn file_extension(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_names_are_hidden_and_unique() {
        let a = staging_file_name("notes.txt", Uuid::now_v7());
        let b = staging_file_name("notes.txt", Uuid::now_v7());
        assert!(a.starts_with(".notes.txt."));
        assert!(a.ends_with(".part"));
        assert_ne!(a, b);
        assert_eq!(sanitize_file_name(&a).as_deref(), Some(&a[1..]));
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(sanitize_file_name("report-2024_v2.pdf").as_deref(), Some("report-2024_v2.pdf"));
    }

    #[test]
    fn directories_are_stripped() {
        assert_eq!(sanitize_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_file_name("C:\\Users\\a\\scan.dcm").as_deref(), Some("scan.dcm"));
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(sanitize_file_name("my file (1).txt").as_deref(), Some("my_file__1_.txt"));
        assert_eq!(sanitize_file_name("résumé.docx").as_deref(), Some("r_sum_.docx"));
    }

    #[test]
    fn leading_dots_are_removed() {
        assert_eq!(sanitize_file_name(".bashrc.txt").as_deref(), Some("bashrc.txt"));
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name("dir/"), None);
        assert_eq!(sanitize_file_name("???"), None);
    }

    #[test]
    fn extension_is_last_dot_segment() {
        assert_eq!(file_extension("a.tar.GZ").as_deref(), Some("gz"));
        assert_eq!(file_extension("scan.DCM").as_deref(), Some("dcm"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
