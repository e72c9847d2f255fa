use axum::{extract::State, http::StatusCode, Json};
use camquote_db::{ExtractionResultRepository, InventoryRepository};
use chrono::Utc;
use serde::Serialize;

use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub inventory: HealthCheck,
    pub latest_result: HealthCheck,
    pub extractors: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let inventory = inventory_check(&state).await;
    let latest_result = latest_result_check(&state).await;
    let ready = inventory.status == "ready" && latest_result.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "camquote-server runtime initialized".to_string(),
        },
        inventory,
        latest_result,
        extractors: extractor_check(&state),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn inventory_check(state: &AppState) -> HealthCheck {
    match state.inventory.list().await {
        Ok(items) => {
            HealthCheck { status: "ready", detail: format!("{} inventory items loaded", items.len()) }
        }
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("inventory unavailable: {error}") }
        }
    }
}

async fn latest_result_check(state: &AppState) -> HealthCheck {
    match state.results.load_latest().await {
        Ok(Some(result)) => HealthCheck {
            status: "ready",
            detail: format!(
                "latest result has {} items from {}",
                result.item_count, result.provider_label
            ),
        },
        Ok(None) => HealthCheck { status: "ready", detail: "no extraction stored yet".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("latest result unreadable: {error}") }
        }
    }
}

// Rule-based parsing always backs the chain, so missing providers never make
// the service unready.
fn extractor_check(state: &AppState) -> HealthCheck {
    let labels = state.registry.configured_labels();
    if labels.is_empty() {
        HealthCheck {
            status: "ready",
            detail: "no AI provider configured; rule-based parsing only".to_string(),
        }
    } else {
        HealthCheck { status: "ready", detail: format!("provider chain: {}", labels.join(" -> ")) }
    }
}
