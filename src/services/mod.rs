pub mod page_store;
pub mod file_service;
pub mod document_service;

pub use page_store::{PageStore, StorageError};
pub use file_service::FileStore;
pub use document_service::DocumentStore;
