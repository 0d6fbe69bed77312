//! Archive export.
//!
//! Packages the tiles of one grid as a ZIP archive held entirely in
//! memory; nothing touches the filesystem. See [`export_archive`].

mod archive;

pub use archive::{export_archive, ARCHIVE_FILENAME};
