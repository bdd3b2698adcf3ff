use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use bytes::BufMut;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warp::http::{HeaderValue, Response, StatusCode, header};
use warp::multipart::{FormData, Part};
use warp::{Filter, Rejection, Reply};

use crate::config::ServerConfig;
use crate::generator::DocGenerator;
use crate::packaging::{ARCHIVE_FILE_NAME, ArtifactPackager};
use crate::web::rate_limit::RateLimiter;

/// Shared state cloned into every route closure.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide scratch root; each request gets its own subdirectory.
    pub scratch_dir: PathBuf,
    pub limiter: Arc<RateLimiter>,
    pub generator: Arc<DocGenerator>,
    pub packager: Arc<ArtifactPackager>,
}

impl AppState {
    pub fn new(scratch_dir: PathBuf, config: &ServerConfig) -> Self {
        Self {
            scratch_dir,
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_per_minute,
                config.rate_limit_per_day,
            )),
            generator: Arc::new(DocGenerator::new()),
            packager: Arc::new(ArtifactPackager::new()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
struct MissingFile;
impl warp::reject::Reject for MissingFile {}

#[derive(Debug)]
struct RateLimited {
    retry_after: u64,
}
impl warp::reject::Reject for RateLimited {}

#[derive(Debug)]
struct InternalError {
    message: String,
}
impl warp::reject::Reject for InternalError {}

pub async fn run_server(port: u16) -> Result<()> {
    let config = ServerConfig::from_env();

    // Scratch storage lives for the whole process; dropping the handle on
    // shutdown removes whatever is left under it.
    let scratch = tempfile::tempdir()?;
    let state = AppState::new(scratch.path().to_path_buf(), &config);
    let routes = routes(state, config.allowed_origins.clone());

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    tracing::info!("listening on {addr}");

    let (_bound, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        tokio::signal::ctrl_c().await.ok();
    });
    server.await;

    drop(scratch);
    Ok(())
}

/// Build the complete route tree with shared state.
pub fn routes(
    state: AppState,
    allowed_origins: Vec<String>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let root = warp::path::end().and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "message": "API Documentation Generator API is running"
        }))
    });

    // The quota check runs before the body is touched, so a rejected
    // request does no pipeline work at all.
    let generate = warp::path!("api" / "generate")
        .and(warp::post())
        .and(rate_limited(Arc::clone(&state.limiter)))
        .and(warp::multipart::form().max_length(u64::MAX))
        .and(with_state(state))
        .and_then(generate_docs);

    let cors = warp::cors()
        .allow_origins(allowed_origins.iter().map(String::as_str))
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD"])
        .allow_headers(vec![
            "content-type",
            "authorization",
            "accept",
            "origin",
            "x-requested-with",
        ]);

    root.or(generate).recover(handle_rejection).with(cors)
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn rate_limited(
    limiter: Arc<RateLimiter>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::any()
        .and_then(move || {
            let limiter = Arc::clone(&limiter);
            async move {
                limiter
                    .check()
                    .map_err(|retry_after| warp::reject::custom(RateLimited { retry_after }))
            }
        })
        .untuple_one()
}

/// `POST /api/generate`: turn one uploaded source file into a
/// documentation archive.
async fn generate_docs(form: FormData, state: AppState) -> Result<impl Reply, Rejection> {
    let parts: Vec<Part> = form
        .try_collect()
        .await
        .map_err(|e| internal("failed to read upload", e))?;
    let part = parts
        .into_iter()
        .find(|p| p.name() == "file")
        .ok_or_else(|| warp::reject::custom(MissingFile))?;

    // Only the leaf of the client-supplied name is kept, inside a
    // collision-proof per-request directory.
    let file_name = part
        .filename()
        .map(Path::new)
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.txt".to_string());

    let data = collect_part(part)
        .await
        .map_err(|e| internal("failed to read upload", e))?;

    let request_dir = state.scratch_dir.join(Uuid::new_v4().to_string());
    let result = run_pipeline(&state, &request_dir, &file_name, &data).await;

    // The archive bytes are already in memory, so cleanup cannot race the
    // client receiving the payload.
    spawn_cleanup(request_dir);

    let bytes = result?;
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
        )
        .body(bytes)
        .map_err(|e| internal("failed to build response", e))?;

    Ok(response)
}

/// Save the upload, generate documentation, package it, and return the
/// archive bytes.
async fn run_pipeline(
    state: &AppState,
    request_dir: &Path,
    file_name: &str,
    data: &[u8],
) -> Result<Vec<u8>, Rejection> {
    fs::create_dir_all(request_dir).map_err(|e| internal("failed to create scratch dir", e))?;

    let upload_path = request_dir.join(file_name);
    fs::write(&upload_path, data).map_err(|e| internal("failed to save upload", e))?;

    let documentation = state
        .generator
        .generate_from_file(&upload_path)
        .await
        .map_err(|e| internal("failed to generate documentation", e))?;

    let archive_path = state
        .packager
        .package(&documentation, request_dir)
        .map_err(|e| internal("failed to package documentation", e))?;

    fs::read(&archive_path).map_err(|e| internal("failed to read archive", e))
}

async fn collect_part(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut data, buf| {
            data.put(buf);
            async move { Ok(data) }
        })
        .await
}

/// Remove a request's scratch directory in the background. Failure is
/// logged, never surfaced, since the response has already been produced.
fn spawn_cleanup(request_dir: PathBuf) {
    tokio::spawn(async move {
        if let Err(e) = tokio::fs::remove_dir_all(&request_dir).await {
            tracing::warn!("scratch cleanup of {} failed: {e}", request_dir.display());
        }
    });
}

fn internal(context: &str, error: impl std::fmt::Display) -> Rejection {
    tracing::error!("{context}: {error}");
    warp::reject::custom(InternalError {
        message: error.to_string(),
    })
}

/// Map rejections to the JSON error body the frontend expects.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, detail, retry_after) = if err.find::<MissingFile>().is_some() {
        (StatusCode::BAD_REQUEST, "No file uploaded".to_string(), None)
    } else if let Some(limited) = err.find::<RateLimited>() {
        (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded".to_string(),
            Some(limited.retry_after),
        )
    } else if let Some(internal) = err.find::<InternalError>() {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            internal.message.clone(),
            None,
        )
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string(), None)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
            None,
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Payload too large".to_string(),
            None,
        )
    } else {
        tracing::error!("unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
            None,
        )
    };

    let mut response =
        warp::reply::with_status(warp::reply::json(&ErrorBody { detail }), status).into_response();
    if let Some(secs) = retry_after {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert("retry-after", value);
        }
    }
    Ok(response)
}
