//! Append-only blob storage (binary and text-document member backing).

mod blob_repo;

pub use blob_repo::BlobRepository;
