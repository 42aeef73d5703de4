mod common;

use anhl_core::{Backend, EntryKind, FsError};
use anhl_filesystem::{CopyOptions, MoveOptions};

use common::{flatten, host_facade, names, open_dir};

#[tokio::test]
async fn test_list_sorts_directories_first() {
    let temp = tempfile::tempdir().expect("temp dir");
    std::fs::create_dir(temp.path().join("zeta")).expect("mkdir zeta");
    std::fs::create_dir(temp.path().join("Alpha")).expect("mkdir Alpha");
    std::fs::write(temp.path().join("b.txt"), "b").expect("write b");
    std::fs::write(temp.path().join("A.md"), "a").expect("write A");

    let fs = host_facade();
    assert_eq!(fs.backend(), Backend::Host);
    let root = open_dir(&fs, temp.path()).await;
    let entries = fs.list(&root).await.expect("list root");

    assert_eq!(names(&entries), vec!["Alpha", "zeta", "A.md", "b.txt"]);
    assert!(entries[0].is_dir());
    assert!(entries.iter().all(|e| e.path.starts_with(&root.path)));
}

#[tokio::test]
async fn test_write_then_read_roundtrip() {
    let temp = tempfile::tempdir().expect("temp dir");
    let fs = host_facade();
    let root = open_dir(&fs, temp.path()).await;

    let written = fs
        .write_text(&root, "notes.md", "# hello\nworld")
        .await
        .expect("write text");
    assert_eq!(written.kind, EntryKind::File);
    assert_eq!(written.name, "notes.md");

    let text = fs.read_text(&written).await.expect("read text");
    assert_eq!(text, "# hello\nworld");

    let stat = fs.stat(&written).await.expect("stat file");
    assert_eq!(stat.kind, EntryKind::File);
    assert_eq!(stat.size, Some(13));
    assert!(stat.modified.is_some());
}

#[tokio::test]
async fn test_read_text_replaces_invalid_utf8() {
    let temp = tempfile::tempdir().expect("temp dir");
    std::fs::write(temp.path().join("bad.txt"), [b'o', b'k', 0xff, b'!']).expect("write bytes");

    let fs = host_facade();
    let root = open_dir(&fs, temp.path()).await;
    let entries = fs.list(&root).await.expect("list");
    let text = fs.read_text(&entries[0]).await.expect("read lossy");
    assert_eq!(text, "ok\u{fffd}!");
}

#[tokio::test]
async fn test_mkdir_is_idempotent() {
    let temp = tempfile::tempdir().expect("temp dir");
    let fs = host_facade();
    let root = open_dir(&fs, temp.path()).await;

    let first = fs.mkdir(&root, "docs").await.expect("first mkdir");
    let second = fs.mkdir(&root, "docs").await.expect("second mkdir");
    assert_eq!(first, second);
    assert!(temp.path().join("docs").is_dir());
}

#[tokio::test]
async fn test_copy_directory_is_byte_identical() {
    let temp = tempfile::tempdir().expect("temp dir");
    let src = temp.path().join("src");
    std::fs::create_dir_all(src.join("nested/deeper")).expect("create tree");
    std::fs::write(src.join("a.txt"), "alpha").expect("write a");
    std::fs::write(src.join("nested/img.bin"), [0u8, 159, 146, 150, 255]).expect("write bin");
    std::fs::write(src.join("nested/deeper/c.md"), "see").expect("write c");
    std::fs::create_dir(temp.path().join("dst")).expect("create dst");

    let fs = host_facade();
    let root = open_dir(&fs, temp.path()).await;
    let entries = fs.list(&root).await.expect("list root");
    let (dst, src_entry) = (&entries[0], &entries[1]);
    assert_eq!(src_entry.name, "src");

    let copied = fs
        .copy(src_entry, dst, &CopyOptions::default())
        .await
        .expect("copy dir");
    assert_eq!(copied.name, "src");

    let original = flatten(&fs.build_tree(src_entry).await.expect("tree src"), "");
    let duplicate = flatten(&fs.build_tree(&copied).await.expect("tree copy"), "");
    assert_eq!(original, duplicate);
    assert_eq!(
        std::fs::read(temp.path().join("dst/src/nested/img.bin")).expect("read copy"),
        vec![0u8, 159, 146, 150, 255]
    );
}

#[tokio::test]
async fn test_copy_into_own_subtree_is_rejected() {
    let temp = tempfile::tempdir().expect("temp dir");
    std::fs::create_dir_all(temp.path().join("src/inner")).expect("create tree");

    let fs = host_facade();
    let root = open_dir(&fs, temp.path()).await;
    let src = fs.list(&root).await.expect("list root").remove(0);
    let inner = fs.list(&src).await.expect("list src").remove(0);

    let err = fs
        .copy(&src, &inner, &CopyOptions::default())
        .await
        .expect_err("copy into subtree should fail");
    match err {
        FsError::Io { source, .. } => {
            assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput);
        }
        other => panic!("expected Io, got: {other:?}"),
    }
    assert!(!temp.path().join("src/inner/src").exists());
}

#[tokio::test]
async fn test_move_renames_and_removes_source() {
    let temp = tempfile::tempdir().expect("temp dir");
    std::fs::create_dir(temp.path().join("archive")).expect("mkdir archive");
    std::fs::write(temp.path().join("todo.md"), "- [ ] ship").expect("write todo");

    let fs = host_facade();
    let root = open_dir(&fs, temp.path()).await;
    let entries = fs.list(&root).await.expect("list");
    let (archive, todo) = (&entries[0], &entries[1]);

    let moved = fs
        .move_entry(
            todo,
            archive,
            &MoveOptions {
                new_name: Some("done.md".to_string()),
                source_parent: None,
            },
        )
        .await
        .expect("move file");
    assert_eq!(moved.name, "done.md");
    assert!(!temp.path().join("todo.md").exists());
    assert_eq!(fs.read_text(&moved).await.expect("read moved"), "- [ ] ship");
}

#[tokio::test]
async fn test_remove_directory_recursively() {
    let temp = tempfile::tempdir().expect("temp dir");
    std::fs::create_dir_all(temp.path().join("old/a/b")).expect("create tree");
    std::fs::write(temp.path().join("old/a/b/c.txt"), "c").expect("write c");

    let fs = host_facade();
    let root = open_dir(&fs, temp.path()).await;
    let old = fs.list(&root).await.expect("list").remove(0);
    fs.remove(&old, Some(&root)).await.expect("remove dir");
    assert!(!temp.path().join("old").exists());

    let err = fs.stat(&old).await.expect_err("stat removed entry");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_host_has_no_interactive_picker() {
    let fs = host_facade();
    let err = fs
        .pick_directory(None)
        .await
        .expect_err("host cannot pick interactively");
    match err {
        FsError::UnsupportedOperation { operation, backend, .. } => {
            assert_eq!(operation, "pick_directory");
            assert_eq!(backend, Backend::Host);
        }
        other => panic!("expected UnsupportedOperation, got: {other:?}"),
    }

    let err = fs
        .private_workspace_root()
        .await
        .expect_err("host has no private workspace");
    assert_eq!(err.code(), "UNSUPPORTED_OPERATION");
    assert!(fs.check_file_system_support().supported);
}
