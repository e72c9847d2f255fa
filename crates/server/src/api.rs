use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use camquote_core::domain::document::QuotationDocument;
use camquote_core::domain::inventory::{InventoryItem, InventoryItemId};
use camquote_core::domain::line_item::{validate_payloads, LineItemPayload, QuotationLineItem};
use camquote_core::errors::{ApplicationError, FieldViolation, InterfaceError};
use camquote_db::{ExtractionResultRepository, InventoryRepository, RepositoryError};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bootstrap::AppState;
use crate::health::health;
use crate::pdf;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    pub success: bool,
    pub item: InventoryItem,
}

#[derive(Debug, Serialize)]
pub struct DeleteItemResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub items: Vec<QuotationLineItem>,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PdfRequest {
    pub items: Vec<LineItemPayload>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldViolation>,
    pub correlation_id: String,
}

type ApiRejection = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<Json<T>, ApiRejection>;

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/inventory", get(list_inventory).post(add_inventory_item))
        .route("/api/inventory/{id}", delete(delete_inventory_item))
        .route("/api/process", post(process_raw_text))
        .route("/api/generate-pdf", post(generate_pdf))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Credentials rule out wildcard origins, so methods and headers mirror the
// request instead.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(
                    event_name = "system.server.cors_origin_invalid",
                    correlation_id = "bootstrap",
                    origin = %origin,
                    error = %error,
                    "ignoring invalid CORS origin"
                );
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn reject(error: ApplicationError, correlation_id: &str) -> ApiRejection {
    let interface = error.into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(
            event_name = "api.request.failed",
            correlation_id = %correlation_id,
            error = %interface,
            "request failed"
        );
    }

    let details = match &interface {
        InterfaceError::BadRequest { details, .. } => details.clone(),
        _ => Vec::new(),
    };
    let body = ApiError {
        error: interface.to_string(),
        message: interface.user_message(),
        details,
        correlation_id: interface.correlation_id().to_string(),
    };
    (status, Json(body))
}

fn persistence(error: RepositoryError) -> ApplicationError {
    match error {
        RepositoryError::Duplicate(id) => {
            ApplicationError::Conflict(format!("inventory item `{id}` already exists"))
        }
        other => ApplicationError::Persistence(other.to_string()),
    }
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse { message: "CCTV Quotation API is running" })
}

pub async fn list_inventory(State(state): State<AppState>) -> ApiResult<Vec<InventoryItem>> {
    let correlation_id = new_correlation_id();
    let items = state
        .inventory
        .list()
        .await
        .map_err(|error| reject(persistence(error), &correlation_id))?;
    Ok(Json(items))
}

pub async fn add_inventory_item(
    State(state): State<AppState>,
    Json(item): Json<InventoryItem>,
) -> ApiResult<AddItemResponse> {
    let correlation_id = new_correlation_id();
    item.validate().map_err(|error| reject(error.into(), &correlation_id))?;

    state
        .inventory
        .add(item.clone())
        .await
        .map_err(|error| reject(persistence(error), &correlation_id))?;

    info!(
        event_name = "inventory.item.added",
        correlation_id = %correlation_id,
        item_id = %item.id.as_str(),
        category = %item.category,
        "inventory item added"
    );
    Ok(Json(AddItemResponse { success: true, item }))
}

pub async fn delete_inventory_item(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<DeleteItemResponse> {
    let correlation_id = new_correlation_id();
    let id = InventoryItemId(id);

    let removed = state
        .inventory
        .remove(&id)
        .await
        .map_err(|error| reject(persistence(error), &correlation_id))?;

    info!(
        event_name = "inventory.item.deleted",
        correlation_id = %correlation_id,
        item_id = %id.as_str(),
        removed,
        "inventory item deleted"
    );
    Ok(Json(DeleteItemResponse { success: true, message: "Item deleted".to_string() }))
}

pub async fn process_raw_text(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> ApiResult<ProcessResponse> {
    let correlation_id = new_correlation_id();
    let inventory = state
        .inventory
        .list()
        .await
        .map_err(|error| reject(persistence(error), &correlation_id))?;

    let outcome = state.registry.pipeline().run(&request.raw_text, &inventory).await;
    let result = outcome.to_result(&request.raw_text);
    state
        .results
        .save_latest(&result)
        .await
        .map_err(|error| reject(persistence(error), &correlation_id))?;

    info!(
        event_name = "extraction.request.completed",
        correlation_id = %correlation_id,
        provider = %outcome.provider_label,
        items = outcome.items.len(),
        failed_providers = outcome.failures.len(),
        "raw text processed"
    );
    let message = outcome.summary();
    Ok(Json(ProcessResponse { items: outcome.items, success: true, message }))
}

pub async fn generate_pdf(
    State(state): State<AppState>,
    Json(request): Json<PdfRequest>,
) -> Result<Response, ApiRejection> {
    let correlation_id = new_correlation_id();
    let items =
        validate_payloads(request.items).map_err(|error| reject(error.into(), &correlation_id))?;
    let item_count = items.len();
    let document = QuotationDocument::new(items)
        .with_customer(request.customer_name, request.customer_location)
        .with_info_page(true);

    let rendered =
        pdf::render(&document, state.notice_font.as_deref())
            .map_err(|error| reject(error.into(), &correlation_id))?;
    let filename = format!("HDC_Quotation_{}.pdf", Local::now().format("%Y%m%d_%H%M%S"));

    info!(
        event_name = "quotation.pdf.generated",
        correlation_id = %correlation_id,
        items = item_count,
        filename = %filename,
        "quotation pdf generated"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, format!("attachment; filename={filename}"))
        .body(Body::from(rendered.into_inner()))
        .map_err(|error| {
            let failure = ApplicationError::Render(format!("response assembly failed: {error}"));
            reject(failure, &correlation_id)
        })
}
