use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;

use crate::errors::WikiError;
use crate::types::Page;

/// Templates every renderer must provide
pub const TEMPLATE_NAMES: [&str; 4] = ["front", "view", "edit", "notExist"];

const BUILTIN: [(&str, &str); 4] = [
    ("front", include_str!("../../templates/front.html")),
    ("view", include_str!("../../templates/view.html")),
    ("edit", include_str!("../../templates/edit.html")),
    ("notExist", include_str!("../../templates/notExist.html")),
];

/// Data handed to a template
#[derive(Debug, Clone, Copy)]
pub enum TemplateData<'a> {
    /// Index page: every stored title
    Front { names: &'a [String] },
    /// Any single-page template
    Page(&'a Page),
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct FrontContext<'a> {
    names: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PageContext<'a> {
    title: &'a str,
    body: Cow<'a, str>,
}

/// Template parsing or rendering failure
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct RenderError(#[from] minijinja::Error);

/// Renders a named template with page data
pub trait Renderer: Send + Sync {
    fn render(&self, name: &str, data: &TemplateData<'_>) -> Result<String, RenderError>;
}

/// Named minijinja templates.
///
/// Output is always HTML-escaped and undefined variables are errors, so a
/// template that asks for `{{ Body }}` on the front page fails to render.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    env: Environment<'static>,
}

impl TemplateSet {
    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    }

    /// The templates compiled into the binary
    pub fn builtin() -> Result<Self, RenderError> {
        Self::from_sources(BUILTIN)
    }

    /// Parse templates from `(name, source)` pairs
    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, RenderError> {
        let mut env = Self::environment();
        for (name, source) in sources {
            env.add_template_owned(name.to_string(), source.to_string())?;
        }
        Ok(Self { env })
    }

    /// Load `<name>.html` for every required template from `dir`.
    ///
    /// A missing file falls back to the built-in template of that name; a file
    /// that exists but cannot be read or parsed is an error.
    pub fn load(dir: &Path) -> Result<Self, WikiError> {
        let mut env = Self::environment();
        for (name, builtin) in BUILTIN {
            let path = dir.join(format!("{}.html", name));
            let source = match fs::read_to_string(&path) {
                Ok(source) => {
                    debug!("Loaded template {:?} from {:?}", name, path);
                    source
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    info!("No {:?}, using built-in {} template", path, name);
                    builtin.to_string()
                }
                Err(e) => return Err(WikiError::Io(e)),
            };
            env.add_template_owned(name.to_string(), source)
                .map_err(RenderError::from)?;
        }
        Ok(Self { env })
    }
}

impl Renderer for TemplateSet {
    fn render(&self, name: &str, data: &TemplateData<'_>) -> Result<String, RenderError> {
        let template = self.env.get_template(name)?;
        let html = match *data {
            TemplateData::Front { names } => template.render(FrontContext { names })?,
            TemplateData::Page(page) => template.render(PageContext {
                title: page.title.as_str(),
                body: page.body_text(),
            })?,
        };
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageTitle;
    use pretty_assertions::assert_eq;

    fn page(title: &str, body: &str) -> Page {
        Page::new(PageTitle::parse(title).unwrap(), body)
    }

    #[test]
    fn builtin_set_has_every_template() {
        let set = TemplateSet::builtin().unwrap();
        let p = page("Home", "hello");
        for name in TEMPLATE_NAMES.iter().filter(|n| **n != "front") {
            let html = set.render(name, &TemplateData::Page(&p)).unwrap();
            assert!(html.contains("Home"), "{name} should mention the title");
        }
        let names = vec!["Home".to_string()];
        let front = set.render("front", &TemplateData::Front { names: &names }).unwrap();
        assert!(front.contains(r#"<a href="/view/Home">Home</a>"#), "{front}");
    }

    #[test]
    fn substitutes_and_escapes_page_fields() {
        let set =
            TemplateSet::from_sources([("view", "<h1>{{ Title }}</h1><p>{{ Body }}</p>")]).unwrap();
        let html = set.render("view", &TemplateData::Page(&page("Tags", "<b>&</b>"))).unwrap();
        assert_eq!(html, "<h1>Tags</h1><p>&lt;b&gt;&amp;&lt;&#x2f;b&gt;</p>");
    }

    #[test]
    fn loops_over_names() {
        let source = "<ul>{% for name in Names %}<li>{{ name }}</li>{% endfor %}</ul>";
        let set = TemplateSet::from_sources([("front", source)]).unwrap();
        let names = vec!["Alpha".to_string(), "Beta".to_string()];
        let html = set.render("front", &TemplateData::Front { names: &names }).unwrap();
        assert_eq!(html, "<ul><li>Alpha</li><li>Beta</li></ul>");

        let html = set.render("front", &TemplateData::Front { names: &[] }).unwrap();
        assert_eq!(html, "<ul></ul>");
    }

    #[test]
    fn rejects_malformed_sources() {
        for source in ["{{ Title", "{% for name in Names %}x", "{% endfor %}"] {
            assert!(TemplateSet::from_sources([("bad", source)]).is_err(), "{source:?} parsed");
        }
    }

    #[test]
    fn field_missing_from_data_is_a_render_error() {
        let set = TemplateSet::from_sources([("front", "{{ Body }}")]).unwrap();
        assert!(set.render("front", &TemplateData::Front { names: &[] }).is_err());
    }

    #[test]
    fn unknown_template_is_a_render_error() {
        let set = TemplateSet::from_sources(Vec::<(&str, &str)>::new()).unwrap();
        let err = set.render("view", &TemplateData::Page(&page("A", ""))).unwrap_err();
        assert!(err.to_string().contains("view"), "{err}");
    }

    #[test]
    fn load_prefers_files_and_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("view.html"), "custom {{ Title }}").unwrap();

        let set = TemplateSet::load(dir.path()).unwrap();
        let p = page("Home", "");
        assert_eq!(set.render("view", &TemplateData::Page(&p)).unwrap(), "custom Home");
        assert!(set.render("edit", &TemplateData::Page(&p)).unwrap().contains("/save/Home"));
    }

    #[test]
    fn load_fails_on_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("edit.html"), "{% for name in Names %}").unwrap();

        assert!(matches!(TemplateSet::load(dir.path()), Err(WikiError::Render(_))));
    }
}
