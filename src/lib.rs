//! Core library for `share_transfer`.
//!
//! Convenience layer over a hierarchical remote file share:
//! - `remote_path`/`mapping`: remote path splitting and local<->remote path translation
//! - `ensure`: materialize a remote directory chain
//! - `walk`: lazy pre-order enumeration of a remote tree
//! - `transfer`: chunked uploads, atomic downloads, whole-tree copies with a size ceiling
//! - `metadata`: key/value metadata on remote objects
//!
//! The remote side is abstracted by `store::RemoteStore` (with an in-memory
//! `MemoryShare`), the local side by `local::LocalFs` (with `StdFs`).

pub mod config;
pub mod ensure;
pub mod errors;
pub mod handle;
pub mod local;
pub mod logging;
pub mod mapping;
pub mod metadata;
pub mod remote_path;
pub mod share;
pub mod store;
pub mod transfer;
pub mod walk;

pub use config::{Config, LogLevel, load_config_from_env, load_config_from_xml_path};
pub use ensure::{DirectoryEnsurer, ensure_directory_chain};
pub use errors::{Result, ShareError, StoreError};
pub use handle::{DirectoryHandle, FileHandle, ObjectHandle};
pub use local::{LocalFs, StdFs};
pub use logging::init_tracing;
pub use mapping::PathMapping;
pub use metadata::MetadataEditor;
pub use remote_path::{RemotePath, split_remote_path};
pub use share::Share;
pub use store::{MemoryShare, ObjectKind, RemoteStore};
pub use transfer::{TransferEngine, TransferOptions, TransferStats};
pub use walk::{RemoteEntry, Want, list_entries};
