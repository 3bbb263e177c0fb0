//! Object storage for uploaded files.
//!
//! Uploads are written to a local temporary file, pushed to the bucket under
//! `uploads/{filename}`, and the temporary file is removed once the upload
//! call returns. Staged objects are never mutated or deleted afterwards.

mod error;
mod gcs;
mod traits;
mod types;

pub use error::StorageError;
pub use gcs::GcsObjectStore;
pub use traits::ObjectStore;
pub use types::{gcs_uri, stage_upload, staged_object_path, StagedObject, UPLOAD_PREFIX};
