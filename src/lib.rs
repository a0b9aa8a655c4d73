//! Folio - a small wiki served over HTTP
//!
//! Pages are plain title/body pairs kept either as text files or as documents
//! in a SQLite database. The router, handlers, template set and storage backend
//! are wired together explicitly, so tests can swap any of them.

pub mod components;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod router;
pub mod services;
pub mod types;

// Re-export commonly used items
pub use config::{Config, StorageKind};
pub use errors::WikiError;
pub use router::{build_router, Action, Route};
pub use types::{AppState, Page, PageTitle};
pub use services::{DocumentStore, FileStore, PageStore, StorageError};
pub use components::{RenderError, Renderer, TemplateData, TemplateSet};
