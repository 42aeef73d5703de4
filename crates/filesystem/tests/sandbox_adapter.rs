mod common;

use std::sync::Arc;

use anhl_core::{CapabilityRef, EntryKind, FsError, SandboxScope};
use anhl_filesystem::testing::MemorySandboxBridge;
use anhl_filesystem::{CopyOptions, MoveOptions, PermissionState, SandboxAdapter};

use common::{names, sandbox_facade};

fn seeded() -> Arc<MemorySandboxBridge> {
    let bridge = MemorySandboxBridge::new();
    bridge.seed_file(SandboxScope::Documents, "notes/today.md", b"# today");
    bridge.seed_file(SandboxScope::Documents, "notes/archive/2023.md", b"old");
    bridge.seed_file(SandboxScope::Documents, "readme.txt", b"hi");
    Arc::new(bridge)
}

#[tokio::test]
async fn test_pick_without_uri_uses_documents_scope() {
    let bridge = seeded();
    let fs = sandbox_facade(&bridge);

    let root = fs.pick_directory(None).await.expect("pick");
    assert_eq!(root.name, "");
    assert_eq!(root.path, "");
    assert_eq!(
        root.capability,
        CapabilityRef::Scoped {
            scope: SandboxScope::Documents,
            relative_path: String::new(),
        }
    );

    let entries = fs.list(&root).await.expect("list documents");
    assert_eq!(names(&entries), vec!["notes", "readme.txt"]);
    assert_eq!(entries[0].path, "notes");
}

#[tokio::test]
async fn test_pick_saf_uri_maps_to_external_storage() {
    let bridge = Arc::new(MemorySandboxBridge::new());
    bridge.seed_file(SandboxScope::ExternalStorage, "Documents/Notes/idea.md", b"idea");
    bridge.set_picked_uri(Some(
        "content://com.android.externalstorage.documents/tree/primary%3ADocuments%2FNotes",
    ));
    let fs = sandbox_facade(&bridge);

    let root = fs.pick_directory(None).await.expect("pick saf");
    assert_eq!(root.name, "Notes");
    assert_eq!(root.path, "Documents/Notes");
    let entries = fs.list(&root).await.expect("list picked");
    assert_eq!(names(&entries), vec!["idea.md"]);
    assert_eq!(
        entries[0].capability,
        CapabilityRef::Scoped {
            scope: SandboxScope::ExternalStorage,
            relative_path: "Documents/Notes/idea.md".to_string(),
        }
    );
}

#[tokio::test]
async fn test_list_stats_entries_without_kind_hints() {
    let bridge = MemorySandboxBridge::new().without_kind_hints();
    bridge.seed_dir(SandboxScope::Data, "cache");
    bridge.seed_file(SandboxScope::Data, "a.json", b"{}");
    let bridge = Arc::new(bridge);
    let fs = sandbox_facade(&bridge);

    let entries = fs
        .list(&SandboxAdapter::scope_root(SandboxScope::Data))
        .await
        .expect("list data");
    assert_eq!(names(&entries), vec!["cache", "a.json"]);
    assert_eq!(entries[0].kind, EntryKind::Directory);
    assert_eq!(entries[1].kind, EntryKind::File);
}

#[tokio::test]
async fn test_same_scope_file_copy_uses_native_copy() {
    let bridge = seeded();
    let fs = sandbox_facade(&bridge);
    let root = SandboxAdapter::scope_root(SandboxScope::Documents);
    let entries = fs.list(&root).await.expect("list");
    let (notes, readme) = (&entries[0], &entries[1]);

    let copied = fs
        .copy(readme, notes, &CopyOptions::default())
        .await
        .expect("copy file");
    assert_eq!(copied.path, "notes/readme.txt");
    assert_eq!(bridge.native_copies(), 1);
    assert_eq!(
        bridge.read(SandboxScope::Documents, "notes/readme.txt"),
        Some(b"hi".to_vec())
    );
}

#[tokio::test]
async fn test_cross_scope_directory_copy_walks_tree() {
    let bridge = seeded();
    let fs = sandbox_facade(&bridge);
    let docs = SandboxAdapter::scope_root(SandboxScope::Documents);
    let notes = fs.list(&docs).await.expect("list").remove(0);
    let data = SandboxAdapter::scope_root(SandboxScope::Data);

    let copied = fs
        .copy(&notes, &data, &CopyOptions::default())
        .await
        .expect("copy across scopes");
    assert_eq!(
        copied.capability,
        CapabilityRef::Scoped {
            scope: SandboxScope::Data,
            relative_path: "notes".to_string(),
        }
    );
    assert_eq!(bridge.native_copies(), 0);
    assert_eq!(
        bridge.read(SandboxScope::Data, "notes/archive/2023.md"),
        Some(b"old".to_vec())
    );
    assert!(bridge.exists(SandboxScope::Documents, "notes/today.md"));
}

#[tokio::test]
async fn test_move_within_scope_renames() {
    let bridge = seeded();
    let fs = sandbox_facade(&bridge);
    let docs = SandboxAdapter::scope_root(SandboxScope::Documents);
    let entries = fs.list(&docs).await.expect("list");
    let notes = &entries[0];

    let moved = fs
        .move_entry(
            notes,
            &docs,
            &MoveOptions {
                new_name: Some("journal".to_string()),
                source_parent: None,
            },
        )
        .await
        .expect("rename dir");
    assert_eq!(moved.path, "journal");
    assert_eq!(bridge.native_renames(), 1);
    assert!(bridge.exists(SandboxScope::Documents, "journal/archive/2023.md"));
    assert!(!bridge.exists(SandboxScope::Documents, "notes"));
}

#[tokio::test]
async fn test_move_across_scopes_copies_then_removes() {
    let bridge = seeded();
    let fs = sandbox_facade(&bridge);
    let docs = SandboxAdapter::scope_root(SandboxScope::Documents);
    let readme = fs.list(&docs).await.expect("list").remove(1);
    let cache = SandboxAdapter::scope_root(SandboxScope::Cache);

    let moved = fs
        .move_entry(&readme, &cache, &MoveOptions::default())
        .await
        .expect("move across scopes");
    assert_eq!(moved.backend(), anhl_core::Backend::Sandbox);
    assert_eq!(bridge.native_renames(), 0);
    assert_eq!(bridge.read(SandboxScope::Cache, "readme.txt"), Some(b"hi".to_vec()));
    assert!(!bridge.exists(SandboxScope::Documents, "readme.txt"));
}

#[tokio::test]
async fn test_shared_storage_write_requires_all_files_access() {
    let bridge = Arc::new(MemorySandboxBridge::new());
    bridge.set_all_files_access(false);
    let fs = sandbox_facade(&bridge);
    let external = SandboxAdapter::scope_root(SandboxScope::ExternalStorage);

    let err = fs
        .write_text(&external, "a.md", "x")
        .await
        .expect_err("all files access missing");
    match &err {
        FsError::PermissionDenied { remedy, .. } => {
            assert!(remedy.as_deref().is_some_and(|r| r.contains("system settings")));
        }
        other => panic!("expected PermissionDenied, got: {other:?}"),
    }
    assert_eq!(bridge.all_files_requests(), 1);

    // 同一会话内不会再次跳转设置页
    fs.write_text(&external, "a.md", "x")
        .await
        .expect_err("still denied");
    assert_eq!(bridge.all_files_requests(), 1);

    // 私有作用域不受影响
    let data = SandboxAdapter::scope_root(SandboxScope::Data);
    fs.write_text(&data, "a.md", "x")
        .await
        .expect("private write");
}

#[tokio::test]
async fn test_granted_all_files_is_cached() {
    let bridge = Arc::new(MemorySandboxBridge::new());
    bridge.set_all_files_access(false);
    bridge.set_grant_all_files_on_request(true);
    let fs = sandbox_facade(&bridge);
    let external = SandboxAdapter::scope_root(SandboxScope::External);

    fs.mkdir(&external, "Books").await.expect("granted on request");
    fs.mkdir(&external, "Books").await.expect("mkdir is idempotent");
    assert_eq!(bridge.all_files_requests(), 1);
    assert!(bridge.exists(SandboxScope::External, "Books"));
}

#[tokio::test]
async fn test_ensure_mobile_permissions_is_advisory_for_storage() {
    let bridge = Arc::new(MemorySandboxBridge::new());
    bridge.set_storage_permission(PermissionState::Prompt);
    bridge.set_grant_storage_on_request(false);
    let fs = sandbox_facade(&bridge);

    fs.ensure_mobile_permissions()
        .await
        .expect("storage refusal is only logged");
    assert_eq!(bridge.storage_requests(), 1);
}

#[tokio::test]
async fn test_private_workspace_root_lives_in_data_scope() {
    let bridge = Arc::new(MemorySandboxBridge::new());
    let fs = sandbox_facade(&bridge);

    let first = fs.private_workspace_root().await.expect("workspace root");
    let second = fs.private_workspace_root().await.expect("workspace root again");
    assert_eq!(first, second);
    assert_eq!(first.name, "workspace");
    assert_eq!(
        first.capability,
        CapabilityRef::Scoped {
            scope: SandboxScope::Data,
            relative_path: "workspace".to_string(),
        }
    );
    assert!(bridge.exists(SandboxScope::Data, "workspace"));
}

#[tokio::test]
async fn test_missing_entry_reports_not_found() {
    let bridge = seeded();
    let fs = sandbox_facade(&bridge);
    let docs = SandboxAdapter::scope_root(SandboxScope::Documents);
    let readme = fs.list(&docs).await.expect("list").remove(1);
    fs.remove(&readme, None).await.expect("remove");

    let err = fs.read_text(&readme).await.expect_err("read removed");
    assert_eq!(err.code(), "NOT_FOUND");
}
