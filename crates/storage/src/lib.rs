pub mod bucket;
pub mod error;
pub mod key;
pub mod progress;
pub mod store;
pub mod upload;

pub use bucket::{Bucket, UploadRequest, UploadTarget};
pub use error::{StorageError, UploadError};
pub use progress::{ProgressTracker, UploadProgress};
pub use store::{ObjectStore, http::HttpObjectStore, memory::MemoryObjectStore};
pub use upload::{RetryPolicy, UploadedObject, Uploader};
