//! REST API for the packing service.
//!
//! Translates the JSON contract to the packing use case. Uses Axum as the web
//! framework and supports CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::error::DomainError;
use crate::service::{
    DimensionsDto, OrderDto, PackagingRequest, PackagingResponse, PackagingService,
    PackedBox, PackedOrder, ProductDto,
};

const VALIDATION_TITLE: &str = "Your request parameters didn't validate.";
const DOMAIN_ERROR_TITLE: &str = "Domain validation error";
const REQUEST_BODY_ERROR_TITLE: &str = "Request body validation error";

#[derive(Clone)]
struct ApiState {
    service: Arc<PackagingService>,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Error envelope shared by every 400 response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Your request parameters didn't validate.")]
    pub title: String,
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    #[schema(example = "InvalidDimensionsException")]
    pub code: String,
    #[schema(example = "Domain validation error")]
    pub title: String,
    #[schema(example = "Invalid dimensions for product 'PS5': All dimensions must be positive numbers")]
    pub reason: String,
}

impl ErrorResponse {
    fn new(code: &str, title: &str, reasons: Vec<String>) -> Self {
        Self {
            title: VALIDATION_TITLE.to_string(),
            errors: reasons
                .into_iter()
                .map(|reason| ErrorDetail {
                    code: code.to_string(),
                    title: title.to_string(),
                    reason,
                })
                .collect(),
        }
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(err: &DomainError) -> Self {
        Self::new(err.code(), DOMAIN_ERROR_TITLE, err.errors())
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        warn!("⚠️ Rejected packaging request: {}", self);
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&self))).into_response()
    }
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    warn!("⚠️ Invalid request body: {}", err.body_text());
    let body = ErrorResponse::new(
        "InvalidRequestBody",
        REQUEST_BODY_ERROR_TITLE,
        vec![err.body_text()],
    );
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = 3)]
    pub active_boxes: usize,
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_packaging, handle_healthcheck),
    components(
        schemas(
            PackagingRequest,
            OrderDto,
            ProductDto,
            DimensionsDto,
            PackagingResponse,
            PackedOrder,
            PackedBox,
            ErrorResponse,
            ErrorDetail,
            HealthResponse
        )
    ),
    tags(
        (name = "packaging", description = "Packing orders into boxes"),
        (name = "health", description = "Service status")
    )
)]
struct ApiDoc;

/// Builds the application router.
pub fn router(service: PackagingService, expose_docs: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        service: Arc::new(service),
    };

    let mut app = Router::new()
        .route("/packaging/orders", post(handle_packaging))
        .route("/healthcheck", get(handle_healthcheck));

    if expose_docs {
        app = app.route("/docs/openapi.json", get(serve_openapi_json));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until the server terminates.
pub async fn start_api_server(config: ApiConfig, service: PackagingService) -> std::io::Result<()> {
    let active_boxes = service.active_boxes().len();
    let app = router(service, config.expose_docs());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        error!("❌ Could not bind API server to {}: {}", addr, err);
        err
    })?;

    info!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 {} active box types", active_boxes);
    info!("📦 API Endpoints:");
    info!("   - POST /packaging/orders");
    info!("   - GET /healthcheck");
    if config.expose_docs() {
        info!("📑 Documentation:");
        info!("   - GET /docs/openapi.json");
    }

    axum::serve(listener, app).await.map_err(|err| {
        error!("❌ API server terminated with an error: {err}");
        err
    })
}

/// Handler for POST /packaging/orders.
///
/// Packs every order of the batch and lists the boxes each one needs.
/// Products that fit in no box are reported in an entry without a box.
#[utoipa::path(
    post,
    path = "/packaging/orders",
    request_body = PackagingRequest,
    responses(
        (status = 200, description = "Orders packed", body = PackagingResponse),
        (
            status = BAD_REQUEST,
            description = "Malformed body or invalid order",
            body = ErrorResponse
        )
    ),
    tag = "packaging"
)]
async fn handle_packaging(
    State(state): State<ApiState>,
    payload: Result<Json<PackagingRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    info!("📥 New packaging request: {} orders", request.orders.len());
    match state.service.execute(&request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/healthcheck",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
async fn handle_healthcheck(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_boxes: state.service.active_boxes().len(),
    })
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}
