/// Where a request path crosses into a zip archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipBoundary {
    /// Path of the archive file, through the `.zip` suffix
    pub archive: String,
    /// Path inside the archive, without leading or trailing separators.
    /// Empty for the archive root.
    pub tail: String,
}

/// Split `path` at the first `.zip/` it contains.
///
/// Backslashes are treated as separators and the suffix is matched without
/// regard to ASCII case. A path that ends in `.zip` names the archive root.
/// Archives are never nested: anything after the first boundary is tail.
pub fn split_zip_path(path: &str) -> Option<ZipBoundary> {
    const DOT_ZIP: &str = ".zip";

    let path = path.replace('\\', "/");
    let lower = path.to_ascii_lowercase();

    if let Some(dot_zip_slash) = lower.find(".zip/") {
        let archive_end = dot_zip_slash + DOT_ZIP.len();
        return Some(ZipBoundary {
            archive: path[..archive_end].to_string(),
            tail: path[archive_end + 1..].trim_end_matches('/').to_string(),
        });
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.len() > DOT_ZIP.len() && lower[..trimmed.len()].ends_with(DOT_ZIP) {
        return Some(ZipBoundary {
            archive: trimmed.to_string(),
            tail: String::new(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(path: &str) -> Option<(String, String)> {
        split_zip_path(path).map(|b| (b.archive, b.tail))
    }

    fn pair(archive: &str, tail: &str) -> Option<(String, String)> {
        Some((archive.to_string(), tail.to_string()))
    }

    #[test]
    fn splits_at_the_boundary() {
        assert_eq!(
            split("/project/assets.zip/icons/logo.svg"),
            pair("/project/assets.zip", "icons/logo.svg")
        );
    }

    #[test]
    fn no_boundary_without_dot_zip_slash() {
        assert_eq!(split("notAnArchive/file.txt"), None);
        assert_eq!(split("/a/zip/file.txt"), None);
        assert_eq!(split("/a/file.zipped/x"), None);
        assert_eq!(split(".zip"), None);
    }

    #[test]
    fn backslashes_are_separators() {
        assert_eq!(
            split(r"C:\work\pkg.zip\src\index.js"),
            pair("C:/work/pkg.zip", "src/index.js")
        );
    }

    #[test]
    fn only_the_first_archive_counts() {
        assert_eq!(
            split("/a/outer.zip/inner.zip/file"),
            pair("/a/outer.zip", "inner.zip/file")
        );
    }

    #[test]
    fn suffix_case_is_ignored_but_kept() {
        assert_eq!(
            split("/p/Assets.ZIP/Icons/Logo.SVG"),
            pair("/p/Assets.ZIP", "Icons/Logo.SVG")
        );
    }

    #[test]
    fn archive_itself_is_the_root() {
        assert_eq!(split("/p/pkg.zip"), pair("/p/pkg.zip", ""));
        assert_eq!(split("/p/pkg.zip/"), pair("/p/pkg.zip", ""));
        assert_eq!(split("/p/pkg.zip/src/"), pair("/p/pkg.zip", "src"));
    }
}
