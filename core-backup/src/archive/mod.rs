//! Archive reading and writing.
//!
//! Two shapes exist on disk: a plain APK copied verbatim, and a zip bundle
//! holding the primary APK plus its splits as stored entries. The writer
//! produces both; the readers pull the primary APK payload back out for
//! metadata extraction.

pub mod reader;
pub mod writer;

pub use reader::{canonical_entry, reader_for, ApkReader, ArchiveReader, BundleReader};
pub use writer::{ArchivePart, ArchiveWriter, PartProgress};
