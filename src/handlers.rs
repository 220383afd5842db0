// region:    --- Imports
use crate::auction::finalizer::BidFinalizer;
use crate::mail::Mailer;
use crate::order::notifier::OrderNotifier;
use crate::report::{ReportEmailRequest, MISSING_FIELDS_MESSAGE};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- State & Routes
#[derive(Clone)]
pub struct AppState {
    pub mailer: Arc<dyn Mailer>,
    pub finalizer: Arc<BidFinalizer>,
    pub order_notifier: Arc<OrderNotifier>,
    pub from_address: String,
}

/// 라우터 설정
pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/report-email",
            post(handle_report_email).fallback(handle_method_not_allowed),
        )
        .route("/orders/process", post(handle_process_orders))
        .route("/auctions/finalize", post(handle_finalize_auctions))
        .layer(cors)
        .with_state(state)
}
// endregion: --- State & Routes

// region:    --- Report Handlers

/// 리포트 메일 발송
pub async fn handle_report_email(
    State(state): State<AppState>,
    payload: Result<Json<ReportEmailRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("{:<12} --> 요청 본문 해석 실패: {}", "Report", rejection);
            ReportEmailRequest::default()
        }
    };

    let message = match request.into_message(&state.from_address) {
        Ok(message) => message,
        Err(missing) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": MISSING_FIELDS_MESSAGE,
                    "missing": missing,
                })),
            )
                .into_response()
        }
    };

    match state.mailer.send(&message).await {
        Ok(()) => {
            info!(
                "{:<12} --> 리포트 메일 발송: to={}, subject=\"{}\"",
                "Report", message.to, message.subject
            );
            Json(serde_json::json!({ "success": true })).into_response()
        }
        Err(e) => {
            error!("{:<12} --> 리포트 메일 발송 실패: {}", "Report", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to send email",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// POST 이외의 메서드
pub async fn handle_method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        "Method Not Allowed. Please use POST.",
    )
}

// endregion: --- Report Handlers

// region:    --- Job Handlers

/// 메일 미발송 주문 처리
pub async fn handle_process_orders(State(state): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 미발송 주문 처리 요청", "Order");
    match state.order_notifier.process_pending().await {
        Ok(outcomes) if outcomes.is_empty() => {
            info!("{:<12} --> 처리할 신규 주문 없음", "Order");
            (StatusCode::OK, "No new orders.")
        }
        Ok(_) => (StatusCode::OK, "Processed orders successfully."),
        Err(e) => {
            error!("{:<12} --> 주문 처리 오류: {}", "Order", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error processing orders.")
        }
    }
}

/// 경매 마감 스윕 수동 실행
pub async fn handle_finalize_auctions(State(state): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 경매 마감 수동 실행 요청", "Finalizer");
    match state.finalizer.run(Utc::now()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

// endregion: --- Job Handlers
