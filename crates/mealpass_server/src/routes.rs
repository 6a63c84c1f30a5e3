use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Local, NaiveDate};
use mealpass::{DietPreference, Error, MealType, PlanType};
use qrcode::{QrCode, render::svg};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::ApiError,
    state::AppState,
    wire::{AttendanceBody, DashboardBody, MarkBody, MemberBody, SubscriptionBody},
};

const DEFAULT_DAYS: i64 = 30;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const QR_SIZE: u32 = 256;

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: Arc<AppState>, cors_origin: Option<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.map_or_else(AllowOrigin::any, AllowOrigin::exact))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/users", post(enroll_handler))
        .route("/users/{id}", get(member_handler))
        .route("/qr/{id}", get(qr_handler))
        .route("/admin/users", get(members_handler))
        .route("/subscriptions", post(subscription_handler))
        .route("/subscriptions/renew", post(subscription_handler))
        .route("/attendance/mark", post(mark_handler))
        .route("/admin/dashboard", get(dashboard_handler))
        .route("/admin/attendance", get(attendance_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Deserialize)]
struct EnrollRequest {
    name: String,
    phone: String,
}

async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EnrollRequest>,
) -> ApiResult<(StatusCode, Json<MemberBody>)> {
    let member = state.pass.registry.enroll(&payload.name, &payload.phone)?;
    Ok((StatusCode::CREATED, Json(member.into())))
}

async fn member_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Json<MemberBody>> {
    Ok(Json(state.pass.registry.describe(&id)?.into()))
}

/// 会员二维码，扫码页解析出的内容会原样交给 `/attendance/mark`
async fn qr_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let member = state
        .pass
        .registry
        .member(&id)?
        .ok_or_else(|| Error::IdentityNotFound(id.clone()))?;
    let code = QrCode::new(state.qr_content(&member.id).as_bytes())?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .build();
    Ok(([(CONTENT_TYPE, "image/svg+xml")], image))
}

#[derive(Deserialize)]
struct MembersQuery {
    search: Option<String>,
}

async fn members_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MembersQuery>,
) -> ApiResult<Json<Vec<MemberBody>>> {
    let members = state.pass.registry.overview(query.search.as_deref())?;
    Ok(Json(members.into_iter().map(MemberBody::from).collect()))
}

/// 管理端的天数输入框会把数字当字符串提交
#[derive(Deserialize)]
#[serde(untagged)]
enum DaysField {
    Count(i64),
    Text(String),
}

impl DaysField {
    fn count(&self) -> ApiResult<i64> {
        match self {
            DaysField::Count(days) => Ok(*days),
            DaysField::Text(text) => text.trim().parse().map_err(|_| ApiError::InvalidDays(text.clone())),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionRequest {
    user_id: String,
    plan_type: String,
    veg_type: String,
    days: Option<DaysField>,
    start_date: Option<DateTime<Local>>,
    end_date: Option<DateTime<Local>>,
}

impl SubscriptionRequest {
    /// 旧版管理端开通时只传起止日期，这里换算成四舍五入后的天数
    fn days(&self, now: DateTime<Local>) -> ApiResult<i64> {
        match (&self.days, self.end_date) {
            (Some(days), _) => days.count(),
            (None, Some(end)) => {
                let span = end - self.start_date.unwrap_or(now);
                Ok((span.num_seconds() + SECONDS_PER_DAY / 2).div_euclid(SECONDS_PER_DAY))
            }
            (None, None) => Ok(DEFAULT_DAYS),
        }
    }
}

async fn subscription_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubscriptionRequest>,
) -> ApiResult<Json<SubscriptionBody>> {
    let plan: PlanType = payload.plan_type.parse()?;
    let diet: DietPreference = payload.veg_type.parse()?;
    let days = payload.days(state.pass.clock.now())?;
    let subscription = state
        .pass
        .ledger
        .activate_or_renew(&payload.user_id, plan, diet, days)
        .await?;
    let status = subscription.status_at(state.pass.clock.now());
    Ok(Json(SubscriptionBody::new(&subscription, status)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkRequest {
    /// 扫码得到的原始内容，可以是完整 URL
    user_id: String,
    meal_type: String,
}

async fn mark_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MarkRequest>,
) -> ApiResult<Json<MarkBody>> {
    let meal_type: MealType = payload.meal_type.parse()?;
    let redemption = state.pass.engine.redeem(&payload.user_id, meal_type).await?;
    Ok(Json(redemption.into()))
}

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

impl DateQuery {
    fn date_or(&self, today: NaiveDate) -> ApiResult<NaiveDate> {
        match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(date) => {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| ApiError::InvalidDate(date.to_owned()))
            }
            None => Ok(today),
        }
    }
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<DashboardBody>> {
    let reporter = &state.pass.reporter;
    let date = query.date_or(reporter.today())?;
    Ok(Json(reporter.daily_counts(date)?.into()))
}

async fn attendance_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<AttendanceBody>>> {
    let reporter = &state.pass.reporter;
    let date = query.date_or(reporter.today())?;
    let entries = reporter.daily_attendance(date)?;
    Ok(Json(entries.into_iter().map(AttendanceBody::from).collect()))
}
