#![cfg(unix)]

mod common;

use pretty_assertions::assert_eq;

use common::pkg_zip;
use zipfs::{EntryKind, FileSystem, RealFs, RealFsOptions, ZipFs};

fn workspace() -> (tempfile::TempDir, String) {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("pkg.zip"), pkg_zip()).unwrap();
    std::fs::write(tmp.path().join("plain.txt"), "on disk").unwrap();
    let root = tmp.path().to_string_lossy().into_owned();
    (tmp, root)
}

#[tokio::test]
async fn reads_through_an_archive_on_disk() {
    let (_tmp, root) = workspace();
    let fs = ZipFs::new(RealFs::default());

    let src = fs.read_directory(&format!("{root}/pkg.zip/src")).await.unwrap();
    assert_eq!(src.sorted_keys(), vec!["index.js"]);

    let top = fs.read_directory(&format!("{root}/pkg.zip")).await.unwrap();
    assert_eq!(top.get("src").unwrap().kind(), EntryKind::Dir);
    assert_eq!(top.get("readme.md").unwrap().base(), "README.md");

    let readme = fs.read_file(&format!("{root}/pkg.zip/readme.md")).await.unwrap();
    assert_eq!(&*readme, "# pkg\n");
}

#[tokio::test]
async fn relative_paths_resolve_against_the_working_dir() {
    let (_tmp, root) = workspace();
    let fs = ZipFs::new(RealFs::new(RealFsOptions {
        watch: false,
        working_dir: Some(root.clone()),
    }));

    let path = fs.abs("pkg.zip/src/index.js").unwrap();
    assert_eq!(path, format!("{root}/pkg.zip/src/index.js"));
    assert_eq!(&*fs.read_file(&path).await.unwrap(), "console.log('hi');\n");
}

#[tokio::test]
async fn disk_files_are_served_by_the_disk() {
    let (_tmp, root) = workspace();
    let fs = ZipFs::new(RealFs::default());

    assert_eq!(&*fs.read_file(&format!("{root}/plain.txt")).await.unwrap(), "on disk");
    let listing = fs.read_directory(&root).await.unwrap();
    assert_eq!(listing.sorted_keys(), vec!["pkg.zip", "plain.txt"]);
    assert!(fs.archives().is_empty());
}

#[tokio::test]
async fn reads_inside_archives_leave_no_watch_entries() {
    let (_tmp, root) = workspace();
    let fs = ZipFs::new(RealFs::new(RealFsOptions {
        watch: true,
        working_dir: None,
    }));

    let inside = format!("{root}/pkg.zip/README.md");
    fs.read_file(&inside).await.unwrap();

    // The disk saw a miss for the inner path; the archive contents are not watched
    let data = fs.watch_data();
    assert_eq!(data.paths.get(&inside), Some(&zipfs::WatchState::Missing));
}
