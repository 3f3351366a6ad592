//! Object repositories: RAM-resident and disk-resident storage for a
//! single class's population, sharing a common delta-log wire format.

mod blob_member;
mod delta_log;
mod disk_repo;
mod ram_repo;

pub use blob_member::{BlobMemberHandler, BlobMemberKind, BlobStoreRegistry};
pub use delta_log::{encode_line, parse_line, DeltaLine};
pub use disk_repo::DiskObjectRepository;
pub use ram_repo::{IndexKind, RamObjectRepository};
