pub mod templates;

pub use templates::{RenderError, Renderer, TemplateData, TemplateSet, TEMPLATE_NAMES};
