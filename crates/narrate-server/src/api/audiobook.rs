//! Audiobook generation endpoints

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use narrate_core::{
    engine::{assemble, job_span},
    extract_text, AudiobookOutput, Credential, Voice,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, Instrument, Span};

use crate::error::ApiError;
use crate::state::AppState;

/// JSON body of `/generate-audiobook`
#[derive(Debug, Deserialize)]
pub struct AudiobookRequest {
    pub text: String,
    pub api_key: String,
    #[serde(default)]
    pub voice: Option<String>,
    /// Split into parts of at most this many seconds
    #[serde(default)]
    pub max_duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub characters: usize,
    pub segments: usize,
    pub estimated_cost_usd: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub voices: Vec<&'static str>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        voices: Voice::all().iter().map(Voice::as_str).collect(),
    })
}

pub async fn estimate_cost(
    State(state): State<AppState>,
    Json(req): Json<EstimateRequest>,
) -> Json<EstimateResponse> {
    let characters = req.text.chars().count();
    let segments = state.pipeline.segmenter().segment(&req.text).len();
    Json(EstimateResponse {
        characters,
        segments,
        estimated_cost_usd: state.config.estimate_cost(characters),
    })
}

pub async fn generate_audiobook(
    State(state): State<AppState>,
    Json(req): Json<AudiobookRequest>,
) -> Result<Response, ApiError> {
    info!("Audiobook request: {} chars", req.text.chars().count());
    narrate(state, req.text, req.voice, req.api_key, req.max_duration).await
}

/// Multipart upload with a `file` field (.txt or .epub) plus the same
/// options as the JSON endpoint.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut api_key = String::new();
    let mut voice = None;
    let mut max_duration = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or_default() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await?;
                upload = Some((filename, content.to_vec()));
            }
            "api_key" => api_key = field.text().await?,
            "voice" => voice = Some(field.text().await?),
            "max_duration" => max_duration = parse_seconds(&field.text().await?)?,
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    let (filename, content) = upload.ok_or_else(|| ApiError::bad_request("Missing file field"))?;
    info!("Upload request: {} ({} bytes)", filename, content.len());

    let text = tokio::task::spawn_blocking(move || extract_text(&filename, &content))
        .await
        .map_err(|e| ApiError::internal(format!("Extraction task failed: {}", e)))??;

    narrate(state, text, voice, api_key, max_duration).await
}

async fn narrate(
    state: AppState,
    text: String,
    voice: Option<String>,
    api_key: String,
    max_duration: Option<u64>,
) -> Result<Response, ApiError> {
    let voice: Voice = match voice.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.parse()?,
        _ => state.default_voice,
    };
    let credential = Credential::new(api_key.trim());
    if credential.is_empty() {
        return Err(ApiError::bad_request("api_key is required"));
    }
    let max_duration = max_duration.map(Duration::from_secs);

    async {
        let segments = state.pipeline.prepare(&text, max_duration)?;
        info!("Narrating {} segments", segments.len());
        let results = state
            .pipeline
            .synthesize(&segments, voice, &credential, |event| {
                debug!(?event, "progress")
            })
            .await?;

        // Decoding and muxing are CPU bound; keep them off the runtime threads.
        let pipeline = state.pipeline.clone();
        let span = Span::current();
        let output = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            assemble(pipeline.decoder(), &results, max_duration, |event| {
                debug!(?event, "progress")
            })
        })
        .await
        .map_err(|e| ApiError::internal(format!("Assembly task failed: {}", e)))??;

        Ok::<_, ApiError>(output)
    }
    .instrument(job_span(voice))
    .await
    .map(download)
}

fn download(output: AudiobookOutput) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", output.filename());
    (
        [
            (header::CONTENT_TYPE, output.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.bytes,
    )
        .into_response()
}

/// Form values arrive as text; blank means "no limit".
fn parse_seconds(value: &str) -> Result<Option<u64>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("Invalid max_duration: {}", value)))
}
