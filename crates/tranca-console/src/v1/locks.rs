//! Lock coordinator console endpoints

use std::time::Duration;

use actix_web::{HttpResponse, Responder, Scope, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use tranca_common::{HOLD_MS, RESOURCE_ID, is_valid};
use tranca_core::model::{ActiveLock, LockSummary, PendingLock};
use tranca_core::service::lock::LockService;

use crate::model::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateParam {
    pub resource_id: Option<String>,
    pub hold_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockParam {
    pub resource_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub locks: Vec<ActiveLock>,
    pub summary: LockSummary,
    pub recent_log: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub queue: Vec<PendingLock>,
    pub summary: LockSummary,
}

fn validate_resource(resource: Option<&str>) -> Result<String, HttpResponse> {
    let resource = resource.unwrap_or_default().trim();
    if resource.is_empty() {
        return Err(ApiResult::http_parameter_missing(RESOURCE_ID));
    }
    if !is_valid(resource) {
        return Err(ApiResult::http_parameter_invalid(format!(
            "illegal resourceId '{}'",
            resource
        )));
    }
    Ok(resource.to_string())
}

#[get("/status")]
async fn status(data: web::Data<AppState>) -> impl Responder {
    let locks = data.lock_service.active_locks();
    let summary = LockSummary::of_active(&locks);
    let recent_log = data.lock_service.recent_log();
    ApiResult::http_success(StatusView {
        locks,
        summary,
        recent_log,
    })
}

#[get("/queue")]
async fn queue(data: web::Data<AppState>) -> impl Responder {
    let queue = data.lock_service.pending_queue();
    let summary = LockSummary::of_pending(&queue);
    ApiResult::http_success(QueueView { queue, summary })
}

#[post("/simulate/read")]
async fn simulate_read(
    data: web::Data<AppState>,
    params: web::Query<SimulateParam>,
) -> impl Responder {
    simulate(&data, &params, false)
}

#[post("/simulate/write")]
async fn simulate_write(
    data: web::Data<AppState>,
    params: web::Query<SimulateParam>,
) -> impl Responder {
    simulate(&data, &params, true)
}

fn simulate(data: &AppState, params: &SimulateParam, exclusive: bool) -> HttpResponse {
    let resource = match validate_resource(params.resource_id.as_deref()) {
        Ok(resource) => resource,
        Err(response) => return response,
    };
    let hold_ms = match params.hold_ms {
        Some(hold_ms) => hold_ms,
        None => return ApiResult::http_parameter_missing(HOLD_MS),
    };

    let hold = Duration::from_millis(hold_ms);
    let session = if exclusive {
        LockService::simulate_write(&data.lock_service, &resource, hold)
    } else {
        LockService::simulate_read(&data.lock_service, &resource, hold)
    };
    ApiResult::http_success(session)
}

#[post("/unlock")]
async fn unlock(data: web::Data<AppState>, params: web::Query<UnlockParam>) -> impl Responder {
    let resource = match validate_resource(params.resource_id.as_deref()) {
        Ok(resource) => resource,
        Err(response) => return response,
    };
    match data.lock_service.force_unlock(&resource) {
        Ok(()) => {
            info!(resource = %resource, "Force unlock requested via console");
            ApiResult::http_success("ok".to_string())
        }
        Err(e) => ApiResult::http_parameter_invalid(e.to_string()),
    }
}

#[post("/clear")]
async fn clear(data: web::Data<AppState>) -> impl Responder {
    data.lock_service.clear_all();
    info!("Clear all locks requested via console");
    ApiResult::http_success("ok".to_string())
}

pub fn routes() -> Scope {
    web::scope("/locks")
        .service(status)
        .service(queue)
        .service(simulate_read)
        .service(simulate_write)
        .service(unlock)
        .service(clear)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use serde_json::Value;

    use tranca_core::service::audit::AuditService;

    use super::*;

    fn app_state() -> web::Data<AppState> {
        let audit = Arc::new(AuditService::new(64));
        web::Data::new(AppState {
            lock_service: Arc::new(LockService::new(audit)),
        })
    }

    #[actix_web::test]
    async fn test_status_empty() {
        let app =
            test::init_service(App::new().app_data(app_state()).service(routes())).await;

        let req = test::TestRequest::get().uri("/locks/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["summary"]["total"], 0);
        assert!(body["data"]["locks"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_simulate_then_status_shows_lock() {
        let state = app_state();
        let app = test::init_service(App::new().app_data(state.clone()).service(routes())).await;

        let req = test::TestRequest::post()
            .uri("/locks/simulate/write?resourceId=orders&holdMs=500")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["code"], 0);
        let session = body["data"].as_str().unwrap().to_string();
        assert!(session.starts_with("sim-"));

        // Let the detached simulation task win the lock
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let req = test::TestRequest::get().uri("/locks/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["summary"]["writers"], 1);
        assert_eq!(body["data"]["locks"][0]["sessionId"], session.as_str());
        assert_eq!(body["data"]["locks"][0]["mode"], "WRITE");
    }

    #[actix_web::test]
    async fn test_unlock_requires_resource_id() {
        let app =
            test::init_service(App::new().app_data(app_state()).service(routes())).await;

        let req = test::TestRequest::post().uri("/locks/unlock").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], tranca_common::error::PARAMETER_MISSING.code);
    }

    #[actix_web::test]
    async fn test_unlock_rejects_illegal_resource_id() {
        let app =
            test::init_service(App::new().app_data(app_state()).service(routes())).await;

        let req = test::TestRequest::post()
            .uri("/locks/unlock?resourceId=bad%2Fname")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["code"],
            tranca_common::error::PARAMETER_VALIDATE_ERROR.code
        );
    }

    #[actix_web::test]
    async fn test_clear_resets_everything() {
        let state = app_state();
        let app = test::init_service(App::new().app_data(state.clone()).service(routes())).await;

        let req = test::TestRequest::post()
            .uri("/locks/simulate/read?resourceId=orders&holdMs=5000")
            .to_request();
        let _: Value = test::call_and_read_body_json(&app, req).await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let req = test::TestRequest::post().uri("/locks/clear").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["code"], 0);

        let req = test::TestRequest::get().uri("/locks/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["summary"]["total"], 0);
    }
}
