//! Backend-agnostic domain model shared by the filesystem adapters and the search engine.

pub mod domain;

pub use domain::{
    Backend, CapabilityRef, Entry, EntryKind, ExternalPathInfo, FsError, FsResult, HandleId,
    SandboxScope, Stat, TreeEntry, file_name, is_full_device_path, join_path, normalize_path,
    sort_entries, to_relative_external_path,
};
