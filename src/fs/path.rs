//! Lexical path helpers shared by the filesystem implementations.
//!
//! None of these touch the disk.

use std::path::{Component, Path, PathBuf};

fn component_str(component: Component<'_>) -> String {
    match component {
        Component::Prefix(prefix) => prefix.as_os_str().to_string_lossy().into_owned(),
        Component::RootDir => std::path::MAIN_SEPARATOR.to_string(),
        Component::CurDir => ".".to_string(),
        Component::ParentDir => "..".to_string(),
        Component::Normal(name) => name.to_string_lossy().into_owned(),
    }
}

fn to_string(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        ".".to_string()
    } else {
        path.to_string_lossy().into_owned()
    }
}

/// Resolve `.` and `..` and drop redundant separators.
///
/// `..` above the root is discarded; at the start of a relative path it is
/// kept.
pub fn clean(path: &str) -> String {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in Path::new(path).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
        }
    }
    to_string(&out)
}

/// Everything but the last element: `dir("/a/b") == "/a"`, `dir("a") == "."`
pub fn dir(path: &str) -> String {
    let p = Path::new(path);
    match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => clean(&parent.to_string_lossy()),
        Some(_) => ".".to_string(),
        None if p.has_root() => clean(path),
        None => ".".to_string(),
    }
}

/// The last element: `base("/a/b") == "b"`, `base("/") == "/"`
pub fn base(path: &str) -> String {
    Path::new(path)
        .components()
        .next_back()
        .map(component_str)
        .unwrap_or_else(|| ".".to_string())
}

/// Suffix of the last element starting at its final dot, or `""`
pub fn ext(path: &str) -> String {
    let name = base(path);
    match name.rfind('.') {
        Some(dot) if name != "." && name != ".." => name[dot..].to_string(),
        _ => String::new(),
    }
}

/// Join non-empty parts with the platform separator and clean the result
pub fn join(parts: &[&str]) -> String {
    let sep = std::path::MAIN_SEPARATOR.to_string();
    let joined = parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(&sep);
    if joined.is_empty() {
        return String::new();
    }
    clean(&joined)
}

pub fn is_abs(path: &str) -> bool {
    Path::new(path).is_absolute()
}

/// Absolute form of `path`, resolving relative paths against `cwd`
pub fn abs(path: &str, cwd: Option<&str>) -> Option<String> {
    if is_abs(path) {
        return Some(clean(path));
    }
    cwd.map(|cwd| join(&[cwd, path]))
}

/// The prefix and root components a path starts with
fn rooted<'a>(parts: &[Component<'a>]) -> Vec<Component<'a>> {
    parts
        .iter()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .copied()
        .collect()
}

/// Express `target` relative to `base`.
///
/// Fails when the two do not share a root, or when `base` climbs out through
/// `..` in a way that cannot be undone lexically.
pub fn rel(base: &str, target: &str) -> Option<String> {
    let base = clean(base);
    let target = clean(target);
    if base == target {
        return Some(".".to_string());
    }

    let base_parts: Vec<Component<'_>> = Path::new(&base)
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();
    let target_parts: Vec<Component<'_>> = Path::new(&target)
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();

    if rooted(&base_parts) != rooted(&target_parts) {
        return None;
    }

    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    if base_parts[common..].contains(&Component::ParentDir) {
        return None;
    }

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for component in &target_parts[common..] {
        out.push(component);
    }
    Some(to_string(&out))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn clean_resolves_dots() {
        assert_eq!(clean("/a/./b/../c/"), "/a/c");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(clean("../a/.."), "..");
        assert_eq!(clean(""), ".");
    }

    #[test]
    fn dir_and_base() {
        assert_eq!(dir("/a/b"), "/a");
        assert_eq!(dir("/a"), "/");
        assert_eq!(dir("/"), "/");
        assert_eq!(dir("a"), ".");
        assert_eq!(base("/a/b"), "b");
        assert_eq!(base("/"), "/");
        assert_eq!(base(""), ".");
    }

    #[test]
    fn ext_uses_the_last_dot() {
        assert_eq!(ext("/a/b.tar.gz"), ".gz");
        assert_eq!(ext("/a.d/b"), "");
        assert_eq!(ext(".bashrc"), ".bashrc");
    }

    #[test]
    fn join_skips_empty_parts() {
        assert_eq!(join(&["/a", "", "b/../c"]), "/a/c");
        assert_eq!(join(&["", ""]), "");
    }

    #[test]
    fn abs_needs_a_working_dir_for_relative_paths() {
        assert_eq!(abs("x/y", Some("/w")), Some("/w/x/y".to_string()));
        assert_eq!(abs("/x/../y", None), Some("/y".to_string()));
        assert_eq!(abs("x", None), None);
    }

    #[test]
    fn rel_between_paths() {
        assert_eq!(rel("/a/b", "/a/c/d"), Some("../c/d".to_string()));
        assert_eq!(rel("/a", "/a"), Some(".".to_string()));
        assert_eq!(rel("a", "/a"), None);
        assert_eq!(rel("../x", "y"), None);
    }

    #[test]
    fn rooted_keeps_only_leading_root_components() {
        let parts: Vec<_> = Path::new("/a/b").components().collect();
        assert_eq!(rooted(&parts), vec![Component::RootDir]);
        let parts: Vec<_> = Path::new("a/b").components().collect();
        assert!(rooted(&parts).is_empty());
    }
}
