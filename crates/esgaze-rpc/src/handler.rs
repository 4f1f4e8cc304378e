//! JSON-RPC request handlers.

use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use esgaze_core::{AppConfig, EditorService, EsGazeError, LoadRecord};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}({:?})", method, params);

    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    match dispatch_method(&state.service, method, &params).await {
        Ok(value) => (StatusCode::OK, Json(JsonRpcResponse::success(id, value))),
        Err(e) => {
            error!("RPC error for {}: {}", method, e);
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
    }
}

// ============================================================================
// Helper macros for extracting parameters
// ============================================================================

/// Extract an optional string parameter, supporting both snake_case and camelCase.
macro_rules! get_str_param {
    ($params:expr, $snake:literal, $camel:literal) => {
        $params
            .get($snake)
            .or_else(|| $params.get($camel))
            .and_then(|v| v.as_str())
    };
}

/// Extract a required string parameter or return an error.
macro_rules! require_str_param {
    ($params:expr, $snake:literal, $camel:literal) => {
        match get_str_param!($params, $snake, $camel) {
            Some(s) => s.to_string(),
            None => {
                return Err(EsGazeError::InvalidParams {
                    message: format!("Missing required parameter: {}", $snake),
                });
            }
        }
    };
}

/// Extract the editor version parameter, defaulting to the bundled version.
macro_rules! get_version_param {
    ($params:expr) => {
        get_str_param!($params, "version", "version")
            .unwrap_or(AppConfig::EDITOR_ASSET_VERSION)
            .to_string()
    };
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate service handler.
async fn dispatch_method(
    service: &EditorService,
    method: &str,
    params: &Value,
) -> esgaze_core::Result<Value> {
    match method {
        // ====================================================================
        // Preload coordinator
        // ====================================================================
        "preload_editor" => {
            let module = service.preloader().preload().await?;
            Ok(serde_json::to_value(LoadRecord::from_module(&module))?)
        }

        "warm_editor" => {
            service.preloader().warm();
            Ok(json!({"started": true}))
        }

        "is_editor_loaded" => Ok(json!({
            "isLoaded": service.preloader().is_loaded(),
            "isPreloading": service.preloader().is_preloading(),
        })),

        "get_editor_cache_status" => {
            let status = service.preloader().cache_status().await;
            Ok(serde_json::to_value(status)?)
        }

        "clear_editor_cache" => {
            service.preloader().clear_cache().await;
            Ok(json!({"cleared": true}))
        }

        // ====================================================================
        // Host cache tier (raw operations)
        // ====================================================================
        "get_editor_cache_info" => {
            let version = get_version_param!(params);
            let cache_info = service.host_cache().query_cache_info(&version).await?;
            Ok(serde_json::to_value(cache_info)?)
        }

        "read_editor_cache" => {
            let version = get_version_param!(params);
            let payload = service.host_cache().read_cache(&version).await?;
            Ok(json!({"payload": payload}))
        }

        "write_editor_cache" => {
            let version = get_version_param!(params);
            let payload = require_str_param!(params, "payload", "payload");
            service.host_cache().write_cache(&version, &payload).await?;
            Ok(json!({"written": true}))
        }

        "invalidate_editor_cache" => {
            let version = get_version_param!(params);
            service.host_cache().invalidate_cache(&version).await?;
            Ok(json!({"invalidated": true}))
        }

        "get_editor_cache_size" => {
            let size_bytes = service.host_cache().cache_size().await?;
            Ok(json!({"sizeBytes": size_bytes}))
        }

        _ => Err(EsGazeError::InvalidParams {
            message: format!("Unknown method: {}", method),
        }),
    }
}
