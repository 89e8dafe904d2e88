use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use super::auth::{AdminSession, CookiePolicy};
use crate::application::AppState;
use crate::errors::AppError;
use smartlock_types::api::{
    AdminOrderView, LoginRequest, LoginResponse, MessageCreatedResponse,
    PaymentIntentRequest, PaymentIntentResponse, PlaceOrderRequest, PlaceOrderResponse,
    TrackVisitRequest, UpdateStatusRequest,
};
use smartlock_types::domain::contact::{ContactMessage, MessageDraft};
use smartlock_types::domain::order::Order;
use smartlock_types::domain::product::{Product, ProductDraft};
use smartlock_types::domain::visit::SiteStats;
use smartlock_types::ports::StoreRepository;

type Shared<R> = State<Arc<AppState<R>>>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid {what} id: {raw}")))
}

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub async fn list_products<R: StoreRepository>(
    State(state): Shared<R>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.catalog.list_products().await?))
}

pub async fn get_product<R: StoreRepository>(
    State(state): Shared<R>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id, "product")?;
    Ok(Json(state.catalog.get_product(id).await?))
}

pub async fn create_product<R: StoreRepository>(
    _admin: AdminSession,
    State(state): Shared<R>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.catalog.create_product(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product<R: StoreRepository>(
    _admin: AdminSession,
    State(state): Shared<R>,
    Path(id): Path<String>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id, "product")?;
    Ok(Json(state.catalog.update_product(id, body(payload)?).await?))
}

pub async fn delete_product<R: StoreRepository>(
    _admin: AdminSession,
    State(state): Shared<R>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "product")?;
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn place_order<R: StoreRepository>(
    State(state): Shared<R>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), AppError> {
    let placement = state.checkout.place_order(body(payload)?).await?;
    let code = if placement.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((code, Json(PlaceOrderResponse::from(&placement.order))))
}

pub async fn create_payment_intent<R: StoreRepository>(
    State(state): Shared<R>,
    payload: Result<Json<PaymentIntentRequest>, JsonRejection>,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    let intent = state.checkout.create_payment_intent(body(payload)?).await?;
    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

pub async fn submit_message<R: StoreRepository>(
    State(state): Shared<R>,
    payload: Result<Json<MessageDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageCreatedResponse>), AppError> {
    let message = state.messages.submit(body(payload)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageCreatedResponse {
            message_id: message.id,
        }),
    ))
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|v| v.trim().to_string())
}

pub async fn track_visit<R: StoreRepository>(
    State(state): Shared<R>,
    headers: HeaderMap,
    payload: Result<Json<TrackVisitRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .analytics
        .track(body(payload)?, forwarded_ip(&headers), agent)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn login<R: StoreRepository>(
    State(state): Shared<R>,
    Extension(cookies): Extension<CookiePolicy>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let creds = body(payload)?;
    let issued = state.guard.login(&creds.username, &creds.password)?;
    let cookie = cookies.session_cookie(&issued.token, state.guard.ttl().num_seconds());
    let res = LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    };
    Ok(([(SET_COOKIE, cookie)], Json(res)).into_response())
}

pub async fn logout(Extension(cookies): Extension<CookiePolicy>) -> Response {
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, cookies.cleared_cookie())],
    )
        .into_response()
}

pub async fn admin_list_orders<R: StoreRepository>(
    _admin: AdminSession,
    State(state): Shared<R>,
) -> Result<Json<Vec<AdminOrderView>>, AppError> {
    Ok(Json(state.orders.list_orders().await?))
}

pub async fn update_order_status<R: StoreRepository>(
    _admin: AdminSession,
    State(state): Shared<R>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let id = parse_id(&id, "order")?;
    let req = body(payload)?;
    Ok(Json(state.orders.update_status(id, &req.status).await?))
}

pub async fn admin_list_messages<R: StoreRepository>(
    _admin: AdminSession,
    State(state): Shared<R>,
) -> Result<Json<Vec<ContactMessage>>, AppError> {
    Ok(Json(state.messages.list_messages().await?))
}

pub async fn update_message_status<R: StoreRepository>(
    _admin: AdminSession,
    State(state): Shared<R>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ContactMessage>, AppError> {
    let id = parse_id(&id, "message")?;
    let req = body(payload)?;
    Ok(Json(state.messages.update_status(id, &req.status).await?))
}

pub async fn admin_stats<R: StoreRepository>(
    _admin: AdminSession,
    State(state): Shared<R>,
) -> Result<Json<SiteStats>, AppError> {
    Ok(Json(state.analytics.stats().await?))
}
