//! Registration, query and action handlers

use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::{logging, InstanceRecord, ProcessRole, ServiceRecord, StressTestSpec, StressorRecord, SuccessEnvelope};

use crate::control_impl::ControlPlaneServer;
use crate::error::{ControlError, ControlResult};
use crate::services::apply_trigger_defaults;
use crate::traits::StressTrigger;
use crate::web::dashboard;

/// Form posted by the dashboard's stressor row
#[derive(Debug, Deserialize)]
pub struct TriggerForm {
    #[serde(rename = "target.endpoint", default)]
    pub target_endpoint: String,
}

fn decode_json<B: DeserializeOwned>(body: &[u8]) -> ControlResult<B> {
    serde_json::from_slice(body).map_err(|e| ControlError::invalid_json(e.to_string()))
}

/// PUT /register/service/:service
pub async fn register_service<T>(
    State(server): State<ControlPlaneServer<T>>,
    Path(service): Path<String>,
    body: Bytes,
) -> ControlResult<Json<SuccessEnvelope>>
where
    T: StressTrigger + 'static,
{
    let record: ServiceRecord = decode_json(&body)?;
    server.registry().register_service(&service, &record.endpoint).await?;
    Ok(Json(SuccessEnvelope::new("Server added to the list")))
}

/// PUT /register/stressor/:name
pub async fn register_stressor<T>(
    State(server): State<ControlPlaneServer<T>>,
    Path(name): Path<String>,
    body: Bytes,
) -> ControlResult<Json<SuccessEnvelope>>
where
    T: StressTrigger + 'static,
{
    let record: StressorRecord = decode_json(&body)?;
    server
        .registry()
        .register_stressor(&name, &record.base_endpoint, record.test_in_progress)
        .await?;
    Ok(Json(SuccessEnvelope::new("Stressor added to the list")))
}

/// PUT /register/instance/:name
pub async fn register_instance<T>(
    State(server): State<ControlPlaneServer<T>>,
    Path(name): Path<String>,
    body: Bytes,
) -> ControlResult<Json<SuccessEnvelope>>
where
    T: StressTrigger + 'static,
{
    let record: InstanceRecord = decode_json(&body)?;
    server.registry().register_instance(&name, record).await;
    Ok(Json(SuccessEnvelope::new("Instance added to the list")))
}

/// GET /registry
pub async fn get_registry<T>(State(server): State<ControlPlaneServer<T>>) -> ControlResult<Response>
where
    T: StressTrigger + 'static,
{
    let snapshot = server.registry().snapshot().await;
    let body = serde_json::to_vec(&snapshot).map_err(|e| {
        logging::log_error(ProcessRole::current(), "Registry serialization", &e);
        ControlError::Serialization(e)
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json; charset=utf-8")], body).into_response())
}

/// POST /actions/trigger-stressor/:name
pub async fn trigger_stressor<T>(
    State(server): State<ControlPlaneServer<T>>,
    Path(name): Path<String>,
    form: Result<Form<TriggerForm>, FormRejection>,
) -> ControlResult<Redirect>
where
    T: StressTrigger + 'static,
{
    let stressor = server.registry().find_stressor_by_name(&name).await?;
    let Form(form) = form.map_err(|e| ControlError::InvalidForm { message: e.body_text() })?;

    let spec = apply_trigger_defaults(StressTestSpec::new(form.target_endpoint))?;
    if let Err(e) = server.trigger().trigger(&stressor.base_endpoint, spec).await {
        logging::log_error(ProcessRole::current(), "Stress test trigger", &e);
        return Err(e);
    }
    Ok(Redirect::to("/"))
}

/// GET /
pub async fn get_dashboard<T>(State(server): State<ControlPlaneServer<T>>) -> Html<String>
where
    T: StressTrigger + 'static,
{
    let snapshot = server.registry().snapshot().await;
    Html(dashboard::render_dashboard(&snapshot))
}

/// GET /static/styles/:style
pub async fn get_style(Path(style): Path<String>) -> Response {
    match dashboard::stylesheet(&style) {
        Some(css) => ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
