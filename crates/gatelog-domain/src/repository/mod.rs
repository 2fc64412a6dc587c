//! Collaborator traits for remote persistence and plate recognition

use std::future::Future;

use gatelog_types::Result;

/// Remote store for one collection of records.
///
/// Failures are reported as `Error::RemoteUnavailable` when the store cannot
/// be reached and `Error::RemoteOperationFailed` when it rejects the call.
/// Timeouts, if any, are the implementation's concern.
pub trait RemoteCollection<T> {
    /// Load the whole collection, newest first
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<T>>>;

    /// Persist a new record. Any id on `record` is ignored; the returned
    /// record carries the identity assigned by the store.
    fn create(&self, record: T) -> impl Future<Output = Result<T>>;

    /// Delete a record by identity
    fn delete(&self, id: &str) -> impl Future<Output = Result<()>>;
}

/// Licence plate OCR.
pub trait PlateReader {
    /// Read the plate text from an image. `Ok("")` means no plate was
    /// detected; `Err(Error::OcrFailed)` means the reader itself failed.
    fn recognize_plate(&self, image: &[u8]) -> impl Future<Output = Result<String>>;
}
