//! Change auditor
//!
//! Content-hashes every file under the project root and folds the hashes
//! into a Merkle root, so a long-running process can tell cheaply whether
//! anything changed since the last scan.

pub mod checkpoint;
pub mod merkle;
pub mod snapshot;

pub use checkpoint::Checkpoint;
pub use merkle::{merkle_root, sha256_hex};
pub use snapshot::{classify_changes, detect_changes, AuditSnapshot, ChangeAuditor, ChangeSet};
