use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::memento::{
    self, memento_headers, original_headers, MementoError, Resolution, LINK_FORMAT_MEDIA_TYPE,
};
use crate::models::*;
use crate::store::RevisionStore;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

const TIMEGATE_WELCOME: &str = "This is a Memento TimeGate (RFC 7089).\n\n\
    Request /timegate/<Page_title> with an Accept-Datetime header, e.g.\n\
    Accept-Datetime: Sat, 10 Aug 2013 00:00:00 GMT\n\
    to be redirected to the revision of that page current at that time.\n\
    The full list of revisions is available at /timemap/<Page_title>.\n";

type HandlerError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Store validation errors (duplicate page, out-of-order revision) are safe
/// to expose and come back as BAD_REQUEST.
fn internal_error(e: impl std::fmt::Display) -> HandlerError {
    let msg = e.to_string();

    if msg.contains("already exists") || msg.contains("must not precede") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Report a negotiation rejection with the status the core assigned it.
fn rejection(e: MementoError) -> HandlerError {
    tracing::warn!("Memento request rejected: {}", e);
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, e.to_string())
}

fn parse_title(raw: &str) -> Result<Title, HandlerError> {
    Title::parse(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

/// Parse the identifier of a TimeGate or TimeMap request. A title that
/// cannot name a page is an unknown resource there, not a bad request.
fn parse_identifier(raw: &str) -> Result<Title, HandlerError> {
    Title::parse(raw).map_err(|e| {
        tracing::debug!("Unknown identifier {:?}: {}", raw, e);
        (StatusCode::NOT_FOUND, format!("Page {} not found", raw))
    })
}

fn page_not_found(title: &Title) -> HandlerError {
    (StatusCode::NOT_FOUND, format!("Page {} not found", title))
}

/// Build a response from a status, core-produced headers and a body.
fn respond_with(
    status: StatusCode,
    headers: &[(&'static str, String)],
    content_type: &'static str,
    body: impl Into<Body>,
) -> Result<Response, HandlerError> {
    let mut response = (status, body.into()).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    for (name, value) in headers {
        response_headers.insert(
            HeaderName::from_static(*name),
            HeaderValue::from_str(value).map_err(internal_error)?,
        );
    }
    Ok(response)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// TimeGate
// ============================================================

/// `GET /timegate` without a page: an informational page, not a negotiation.
pub async fn timegate_welcome() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], TIMEGATE_WELCOME)
}

/// Datetime negotiation for one page.
pub async fn timegate(
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HandlerError> {
    let title = parse_identifier(&raw_title)?;

    let (_, timeline) = state
        .store
        .lookup(&title)
        .map_err(internal_error)?
        .ok_or_else(|| page_not_found(&title))?;
    let original = state.store.original_resource(&title);

    let accept_datetime = headers
        .get(memento::headers::ACCEPT_DATETIME)
        .map(|value| {
            value.to_str().map_err(|_| {
                rejection(MementoError::InvalidDatetime(
                    "non-ASCII header value".to_string(),
                ))
            })
        })
        .transpose()?;

    let negotiated = state
        .responder
        .respond(&original, &timeline, accept_datetime)
        .map_err(rejection)?;

    match negotiated.resolution {
        Resolution::Redirect => respond_with(
            StatusCode::FOUND,
            &negotiated.headers,
            TEXT_PLAIN,
            Body::empty(),
        ),
        Resolution::Direct => {
            let revision = state
                .db()
                .get_revision(negotiated.memento.revision_id)
                .map_err(internal_error)?
                .ok_or_else(|| page_not_found(&title))?;
            respond_with(
                StatusCode::OK,
                &negotiated.headers,
                TEXT_PLAIN,
                revision.content,
            )
        }
    }
}

// ============================================================
// TimeMap
// ============================================================

pub async fn timemap(
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
) -> Result<Response, HandlerError> {
    let title = parse_identifier(&raw_title)?;

    let (_, timeline) = state
        .store
        .lookup(&title)
        .map_err(internal_error)?
        .ok_or_else(|| page_not_found(&title))?;
    let original = state.store.original_resource(&title);

    let document = memento::render_time_map(&original, &timeline).map_err(rejection)?;
    respond_with(StatusCode::OK, &[], LINK_FORMAT_MEDIA_TYPE, document)
}

// ============================================================
// Original Resources and Mementos
// ============================================================

/// Query parameters for viewing a page.
#[derive(Debug, Deserialize)]
pub struct ViewPageQuery {
    /// Show this revision instead of the current one.
    pub oldid: Option<i64>,
}

/// Serve the current text of a page, or with `?oldid=` one of its
/// revisions, annotated with Memento headers when the namespace is included.
pub async fn view_page(
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
    Query(query): Query<ViewPageQuery>,
) -> Result<Response, HandlerError> {
    let title = parse_title(&raw_title)?;
    let db = state.db();

    let page = db
        .get_page_by_title(&title)
        .map_err(internal_error)?
        .ok_or_else(|| page_not_found(&title))?;

    let revision_id = query.oldid.unwrap_or(page.latest_revision_id);
    let revision = db
        .get_revision(revision_id)
        .map_err(internal_error)?
        .filter(|revision| revision.page_id == page.id)
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("Revision {} of {} not found", revision_id, title),
        ))?;

    if !state.store.is_included(&title) {
        return respond_with(StatusCode::OK, &[], TEXT_PLAIN, revision.content);
    }

    let timeline = state
        .store
        .fetch_timeline(&page)
        .map_err(internal_error)?
        .ok_or_else(|| page_not_found(&title))?;
    let original = state.store.original_resource(&title);

    let headers = match query.oldid {
        Some(_) => {
            let memento = timeline
                .find_revision(revision.id)
                .ok_or_else(|| page_not_found(&title))?;
            memento_headers(&original, &timeline, memento)
        }
        None => original_headers(&original),
    };

    respond_with(StatusCode::OK, &headers, TEXT_PLAIN, revision.content)
}

// ============================================================
// Pages (store administration)
// ============================================================

pub async fn list_pages(State(state): State<AppState>) -> Result<Json<Vec<Page>>, HandlerError> {
    state.db().get_all_pages().map(Json).map_err(internal_error)
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
) -> Result<Json<PageHistory>, HandlerError> {
    let title = parse_title(&raw_title)?;
    state
        .db()
        .get_page_history(&title)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| page_not_found(&title))
}

/// Response for a freshly created page.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedPage {
    pub page: Page,
    pub revision: Revision,
}

pub async fn create_page(
    State(state): State<AppState>,
    Json(input): Json<CreatePageInput>,
) -> Result<(StatusCode, Json<CreatedPage>), HandlerError> {
    state
        .db()
        .create_page(input)
        .map(|(page, revision)| (StatusCode::CREATED, Json(CreatedPage { page, revision })))
        .map_err(internal_error)
}

pub async fn list_revisions(
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
) -> Result<Json<Vec<Revision>>, HandlerError> {
    let title = parse_title(&raw_title)?;
    let page = state
        .db()
        .get_page_by_title(&title)
        .map_err(internal_error)?
        .ok_or_else(|| page_not_found(&title))?;

    state
        .db()
        .get_revisions(page.id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn add_revision(
    State(state): State<AppState>,
    Path(raw_title): Path<String>,
    Json(input): Json<CreateRevisionInput>,
) -> Result<(StatusCode, Json<Revision>), HandlerError> {
    let title = parse_title(&raw_title)?;
    let page = state
        .db()
        .get_page_by_title(&title)
        .map_err(internal_error)?
        .ok_or_else(|| page_not_found(&title))?;

    state
        .db()
        .add_revision(page.id, input)
        .map_err(internal_error)?
        .map(|r| (StatusCode::CREATED, Json(r)))
        .ok_or_else(|| page_not_found(&title))
}
