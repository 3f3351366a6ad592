//! Sorted block-oriented key/value file (ISAM).

mod isam_file;

pub use isam_file::IsamFile;
