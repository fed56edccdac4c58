//! Store-facing operations behind the HTTP handlers.
//!
//! Each function takes an [`ObjectStore`](crate::client::ObjectStore) and
//! plain arguments and returns [`ApiError`](crate::error::ApiError) on
//! failure, so handlers only deal with extraction and response shaping.

pub mod buckets;
pub mod listing;
pub mod transfer;

pub use listing::{list_entries, relative_name, Entry, ListingResult};
pub use transfer::{Download, UploadInput, Uploaded, ZipArchive};
