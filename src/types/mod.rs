use std::fmt;
use std::sync::Arc;

use crate::components::Renderer;

/// Application state shared across all handlers
pub struct AppState<S> {
    pub store: Arc<S>,
    pub templates: Arc<dyn Renderer>,
}

impl<S> AppState<S> {
    pub fn new(store: S, templates: Arc<dyn Renderer>) -> Self {
        Self { store: Arc::new(store), templates }
    }
}

// Manual impl so `S` itself does not have to be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            templates: Arc::clone(&self.templates),
        }
    }
}

/// A page title: one or more ASCII letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageTitle(String);

impl PageTitle {
    /// Validate a raw title, returning `None` when it cannot be routed
    pub fn parse(raw: &str) -> Option<Self> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A wiki page as loaded from storage or submitted through the edit form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: PageTitle,
    pub body: Vec<u8>,
}

impl Page {
    pub fn new(title: PageTitle, body: impl Into<Vec<u8>>) -> Self {
        Self { title, body: body.into() }
    }

    /// Placeholder used when a title has no stored page yet
    pub fn empty(title: PageTitle) -> Self {
        Self { title, body: Vec::new() }
    }

    /// Body decoded for display; invalid UTF-8 is replaced, not rejected.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
