use axum::{
    Router,
    extract::{Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use matcher::{
    FilterSelection, GenerationResult, MediaType, PromptResponder, book_presets, custom_prompt,
    match_lines, validate_languages, validate_mood,
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::models::{
    BOOK_HEADING, BookSearchRequest, CUSTOM_HEADING, CustomSearchRequest, FilterOptions,
    MEDIA_HEADING, MatchView, PresetQuery, SearchResponse, SearchStatus,
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

const CORRELATION_HEADER: &str = "x-correlation-id";

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

#[derive(Clone)]
pub struct AppState {
    pub responder: PromptResponder,
}

pub fn create_app(responder: PromptResponder) -> Router {
    build_router(AppState { responder })
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/options", get(filter_options))
        .route("/search/media", post(search_media))
        .route("/search/books/presets", get(list_book_presets))
        .route("/search/books", post(search_books))
        .route("/search/custom", post(search_custom))
        .layer(from_fn(correlation_id_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

/// Tag every request with a correlation id and run it inside a span carrying it
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header {
        request.headers_mut().insert(CORRELATION_HEADER, value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Matcher",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Finds books, movies and series that fit your mood",
        "endpoints": {
            "GET /options": "Filter vocabulary and form defaults",
            "POST /search/media": "Search movies or series from a filter selection",
            "GET /search/books/presets": "Preset book searches for a mood",
            "POST /search/books": "Run a preset book search",
            "POST /search/custom": "Free-text search",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn filter_options() -> Json<FilterOptions> {
    Json(FilterOptions::new())
}

async fn search_media(
    State(state): State<AppState>,
    Json(selection): Json<FilterSelection>,
) -> ApiResult<SearchResponse> {
    info!(media = selection.media.label(), mood = %selection.mood, "Media search requested");

    selection
        .validate()
        .map_err(|e| bad_request_error(&e.to_string()))?;

    let heading = match selection.media {
        MediaType::Books => BOOK_HEADING,
        _ => MEDIA_HEADING,
    };
    run_search(&state, heading, selection.to_prompt()).await
}

/// Mood and languages end up verbatim in the preset prompts
fn check_book_inputs(mood: &str, languages: &[String]) -> Result<(), ApiError> {
    validate_mood(mood)
        .and_then(|_| validate_languages(languages))
        .map_err(|e| bad_request_error(&e.to_string()))
}

async fn list_book_presets(Query(query): Query<PresetQuery>) -> ApiResult<Value> {
    let (mood, languages) = (query.mood(), query.languages());
    check_book_inputs(&mood, &languages)?;

    let presets = book_presets(&mood, &languages);
    Ok(Json(json!({ "presets": presets })))
}

async fn search_books(
    State(state): State<AppState>,
    Json(request): Json<BookSearchRequest>,
) -> ApiResult<SearchResponse> {
    info!(preset = request.preset, mood = %request.mood, "Book search requested");

    check_book_inputs(&request.mood, &request.languages)?;
    let preset = book_presets(&request.mood, &request.languages)
        .into_iter()
        .find(|p| p.id == request.preset)
        .ok_or_else(|| bad_request_error(&format!("unknown preset: {}", request.preset)))?;

    run_search(&state, BOOK_HEADING, preset.prompt).await
}

async fn search_custom(
    State(state): State<AppState>,
    Json(request): Json<CustomSearchRequest>,
) -> ApiResult<SearchResponse> {
    let Some(prompt) = custom_prompt(&request.prompt) else {
        info!("Blank custom search, nothing to do");
        return Ok(Json(SearchResponse::skipped(CUSTOM_HEADING)));
    };

    info!(prompt_len = prompt.len(), "Custom search requested");
    run_search(&state, CUSTOM_HEADING, prompt.to_string()).await
}

async fn run_search(
    state: &AppState,
    heading: &'static str,
    prompt: String,
) -> ApiResult<SearchResponse> {
    let mut notices = Vec::new();
    let result = state
        .responder
        .respond(&prompt, &mut notices)
        .await
        .map_err(|e| {
            error!("Refused to generate: {}", e);
            bad_request_error(&e.to_string())
        })?;

    let (status, matches) = match result {
        GenerationResult::Success(text) => {
            let matches: Vec<MatchView> = match_lines(&text).into_iter().map(Into::into).collect();
            info!(matches = matches.len(), "Search completed");
            (SearchStatus::Completed, matches)
        }
        GenerationResult::Exhausted { attempts, .. } => {
            error!(attempts, "Search failed, model unavailable");
            (SearchStatus::Unavailable, Vec::new())
        }
    };

    Ok(Json(SearchResponse {
        status,
        heading,
        prompt: Some(prompt),
        matches,
        notices,
    }))
}
