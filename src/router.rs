//! Request routing.
//!
//! `/` goes to the index; every other path must look like
//! `/(edit|save|view)/<title>` with an alphanumeric title, or it gets a 404
//! before any handler or storage call runs.

use axum::{
    extract::{Request, State},
    response::Response,
    routing::any,
    Router,
};
use log::{info, warn};

use crate::errors::WikiError;
use crate::handlers;
use crate::services::PageStore;
use crate::types::{AppState, PageTitle};

/// What a matched path asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Save,
}

impl Action {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "view" => Some(Action::View),
            "edit" => Some(Action::Edit),
            "save" => Some(Action::Save),
            _ => None,
        }
    }
}

/// A request path that matched `/(edit|save|view)/<title>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub action: Action,
    pub title: PageTitle,
}

impl Route {
    /// Match a raw (still percent-encoded) request path
    pub fn match_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        let (action, title) = rest.split_once('/')?;
        Some(Self {
            action: Action::from_segment(action)?,
            title: PageTitle::parse(title)?,
        })
    }
}

/// Build the application router around an already opened store and template set
pub fn build_router<S: PageStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", any(handlers::handle_index::<S>))
        .fallback(dispatch::<S>)
        .with_state(state)
}

/// Match the path and hand the title to the handler bound to its action
async fn dispatch<S: PageStore>(
    State(state): State<AppState<S>>,
    request: Request,
) -> Result<Response, WikiError> {
    let path = request.uri().path().to_string();
    let Some(route) = Route::match_path(&path) else {
        warn!("No route for {} {}", request.method(), path);
        return Err(WikiError::NotFound);
    };

    info!("{} {}", request.method(), path);
    match route.action {
        Action::View => handlers::handle_view(&state, route.title).await,
        Action::Edit => handlers::handle_edit(&state, route.title).await,
        Action::Save => handlers::handle_save(&state, route.title, request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(action: Action, title: &str) -> Option<Route> {
        Some(Route { action, title: PageTitle::parse(title).unwrap() })
    }

    #[test]
    fn matches_each_action() {
        assert_eq!(Route::match_path("/view/FrontPage"), route(Action::View, "FrontPage"));
        assert_eq!(Route::match_path("/edit/Page2"), route(Action::Edit, "Page2"));
        assert_eq!(Route::match_path("/save/x"), route(Action::Save, "x"));
    }

    #[test]
    fn rejects_everything_else() {
        for path in [
            "",
            "/",
            "/view",
            "/view/",
            "/view/a/b",
            "/view/has%20space",
            "/view/has space",
            "/view/dash-ed",
            "/view/..",
            "/delete/Page",
            "/View/Page",
            "view/Page",
            "//view/Page",
        ] {
            assert_eq!(Route::match_path(path), None, "{path:?} should not match");
        }
    }
}
