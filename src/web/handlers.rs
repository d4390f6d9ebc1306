use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;

use super::page;
use crate::marshal::FormFields;
use crate::registry::Registry;
use crate::time_utils;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub title: String,
}

/// Render the control page
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let previous = state.registry.touch();
    let last_contact = time_utils::describe_last_contact(previous, Utc::now());

    Html(page::render_page(
        &state.title,
        &state.registry.snapshot(),
        &last_contact,
        &state.registry.messages().list(),
    ))
}

/// Accept a form submission and send the browser back to the page
pub async fn submit(State(state): State<AppState>, request: Request) -> Response {
    let (form, malformed) = read_form(&state, request).await;
    if let Some(reason) = &malformed {
        state
            .registry
            .warn(format!("Malformed form submission: {}", reason));
    }

    // A broken body that yielded no field leaves every entry alone.
    if malformed.is_some() && form.is_empty() {
        state.registry.touch();
    } else {
        tracing::debug!(fields = form.len(), "Received form submission");
        for error in state.registry.apply_submission(&form) {
            tracing::debug!(code = error.to_error_code(), "Rejected form field");
            state.registry.warn(error.to_string());
        }
    }

    Redirect::to("/").into_response()
}

/// Any other path goes back to the page
pub async fn redirect_home(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    state.registry.touch();
    tracing::debug!(path = %uri.path(), "Redirecting unknown path");

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/")])
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Decode a urlencoded or multipart body.
///
/// Returns the fields decoded so far and, if decoding stopped early, why.
/// A multipart body keeps every part that completed before the failure.
async fn read_form(state: &AppState, request: Request) -> (FormFields, Option<String>) {
    let mut form = FormFields::new();

    if !is_multipart(&request) {
        return match Form::<Vec<(String, String)>>::from_request(request, state).await {
            Ok(Form(pairs)) => (pairs.into_iter().collect(), None),
            Err(e) => (form, Some(e.body_text())),
        };
    }

    let mut multipart = match Multipart::from_request(request, state).await {
        Ok(multipart) => multipart,
        Err(e) => return (form, Some(e.body_text())),
    };
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return (form, None),
            Err(e) => return (form, Some(e.body_text())),
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.text().await {
            Ok(text) => form.insert(name, text),
            Err(e) => return (form, Some(e.body_text())),
        }
    }
}
