//! Browser front end for the lyrics pipeline.
//!
//! `POST /` runs one action, stores the resulting session record and
//! redirects to `GET /?state_id=<id>`, which renders that record.

pub mod dispatch;
pub mod form;
pub mod page;

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Form, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use lyric_contracts::models::ModelRegistry;
use lyric_contracts::session::{SessionRecord, SessionStore};
use lyric_engine::LyricsAgent;
use serde::Deserialize;

use crate::dispatch::{dispatch, OUTPUTS_PREFIX};
use crate::form::IndexForm;
use crate::page::PageRenderer;

#[derive(Clone)]
pub struct AppState {
    agent: LyricsAgent,
    store: Arc<dyn SessionStore>,
    registry: Arc<ModelRegistry>,
    pages: Arc<PageRenderer>,
    output_dir: PathBuf,
}

impl AppState {
    pub fn new(
        agent: LyricsAgent,
        store: Arc<dyn SessionStore>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            agent,
            store,
            registry: Arc::new(ModelRegistry::default()),
            pages: Arc::new(PageRenderer::new()?),
            output_dir: output_dir.into(),
        })
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn output_dir(&self) -> &FsPath {
        &self.output_dir
    }

    fn blank_record(&self) -> SessionRecord {
        let defaults = self.agent.defaults();
        SessionRecord {
            analysis_model: defaults.analysis.clone(),
            prompt_model: defaults.prompt.clone(),
            image_model: defaults.image.clone(),
            ..SessionRecord::default()
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route(&format!("/{OUTPUTS_PREFIX}/{{file}}"), get(output_file))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    state_id: Option<String>,
}

type HandlerError = (StatusCode, String);

fn internal(err: impl std::fmt::Display) -> HandlerError {
    tracing::error!(error = %err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, HandlerError> {
    let stored = match query.state_id.as_deref() {
        Some(id) => state.store.get(id).map_err(internal)?,
        None => None,
    };
    let record = stored.unwrap_or_else(|| state.blank_record());
    let html = state
        .pages
        .render(&record, &state.registry)
        .map_err(|err| internal(format!("{err:#}")))?;
    Ok(Html(html))
}

async fn submit(
    State(state): State<AppState>,
    Form(form): Form<IndexForm>,
) -> Result<Redirect, HandlerError> {
    let action = form.action();
    let record = form.into_record(state.agent.defaults());
    tracing::info!(action = %action.name(), "form submitted");

    let agent = state.agent.clone();
    let output_dir = state.output_dir.clone();
    let record = tokio::task::spawn_blocking(move || dispatch(&agent, &output_dir, &action, record))
        .await
        .map_err(internal)?;

    let id = state.store.insert(record.stamped()).map_err(internal)?;
    Ok(Redirect::to(&format!("/?state_id={id}")))
}

async fn output_file(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    if !is_plain_file_name(&file) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read(state.output_dir.join(&file)).await {
        Ok(bytes) => {
            let mime = image::guess_format(&bytes)
                .map(|format| format.to_mime_type())
                .unwrap_or("application/octet-stream");
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.starts_with('.')
}
