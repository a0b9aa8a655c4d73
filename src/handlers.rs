use axum::{
    body::{to_bytes, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use log::{debug, info, warn};
use percent_encoding::percent_decode;

use crate::components::TemplateData;
use crate::errors::WikiError;
use crate::services::PageStore;
use crate::types::{AppState, Page, PageTitle};

/// Largest form body read on save
const MAX_FORM_BYTES: usize = 10 << 20;

/// Handle root path requests: list every page
pub async fn handle_index<S: PageStore>(
    State(state): State<AppState<S>>,
) -> Result<Response, WikiError> {
    let names = state.store.list_titles().await?;
    info!("Index request, {} pages", names.len());
    render(&state, "front", &TemplateData::Front { names: &names })
}

/// Show a page, or an invitation to create it
pub async fn handle_view<S: PageStore>(
    state: &AppState<S>,
    title: PageTitle,
) -> Result<Response, WikiError> {
    match state.store.load(&title).await {
        Ok(page) => render(state, "view", &TemplateData::Page(&page)),
        Err(e) if e.is_not_found() => {
            debug!("Page {} does not exist", title);
            render(state, "notExist", &TemplateData::Page(&Page::empty(title)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Show the edit form, blank for a page that does not exist yet
pub async fn handle_edit<S: PageStore>(
    state: &AppState<S>,
    title: PageTitle,
) -> Result<Response, WikiError> {
    let page = match state.store.load(&title).await {
        Ok(page) => page,
        Err(e) if e.is_not_found() => Page::empty(title),
        Err(e) => return Err(e.into()),
    };
    render(state, "edit", &TemplateData::Page(&page))
}

/// Store the submitted body and redirect to the page.
///
/// `body` comes from an urlencoded request body, else from the query string.
/// A missing or unreadable form saves an empty page.
pub async fn handle_save<S: PageStore>(
    state: &AppState<S>,
    title: PageTitle,
    request: Request,
) -> Result<Response, WikiError> {
    let query = request.uri().query().unwrap_or_default().to_string();
    let posted = if is_urlencoded(request.headers()) {
        match to_bytes(request.into_body(), MAX_FORM_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Ignoring unreadable form for {}: {}", title, e);
                Bytes::new()
            }
        }
    } else {
        Bytes::new()
    };
    let body = form_value(&posted, "body")
        .or_else(|| form_value(query.as_bytes(), "body"))
        .unwrap_or_default();

    let page = Page::new(title, body);
    state.store.save(&page).await?;
    info!("Saved page {} ({} bytes)", page.title, page.body.len());

    Ok(redirect_found(&format!("/view/{}", page.title)))
}

fn render<S>(
    state: &AppState<S>,
    name: &str,
    data: &TemplateData<'_>,
) -> Result<Response, WikiError> {
    let html = state.templates.render(name, data)?;
    Ok(Html(html).into_response())
}

/// `302 Found`; `axum::response::Redirect` only offers 303/307/308
fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn is_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

/// First value of `key` in an urlencoded form, decoded to raw bytes
fn form_value(encoded: &[u8], key: &str) -> Option<Vec<u8>> {
    encoded.split(|b| *b == b'&').find_map(|pair| {
        let (name, value) = match pair.iter().position(|b| *b == b'=') {
            Some(eq) => (&pair[..eq], &pair[eq + 1..]),
            None => (pair, &pair[pair.len()..]),
        };
        (form_decode(name) == key.as_bytes()).then(|| form_decode(value))
    })
}

fn form_decode(raw: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = raw.iter().map(|&b| if b == b'+' { b' ' } else { b }).collect();
    percent_decode(&spaced).collect()
}
