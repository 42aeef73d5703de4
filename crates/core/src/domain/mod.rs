mod backend;
mod entry;
mod error;
mod ids;
mod path;

pub use backend::{Backend, SandboxScope};
pub use entry::{CapabilityRef, Entry, EntryKind, Stat, TreeEntry, sort_entries};
pub use error::{FsError, FsResult};
pub use ids::HandleId;
pub use path::{
    ExternalPathInfo, file_name, is_full_device_path, join_path, normalize_path,
    to_relative_external_path,
};
