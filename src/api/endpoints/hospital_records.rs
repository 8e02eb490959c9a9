//! Hospital record endpoints. ADMIN and DOCTOR callers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::types::ApiContext;
use crate::authorization::{require_any, Caller, STAFF};
use crate::services::hospital_record::{
    self, DoctorWithMostRecords, HospitalRecordEditRequest, HospitalRecordRequest,
    HospitalRecordResponse, MonthWithHospitalRecords,
};

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<HospitalRecordResponse>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(hospital_record::list_hospital_records(&conn)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<HospitalRecordRequest>,
) -> Result<(StatusCode, Json<HospitalRecordResponse>), ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok((
        StatusCode::CREATED,
        Json(hospital_record::create_hospital_record(&conn, &request)?),
    ))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<HospitalRecordResponse>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(hospital_record::get_hospital_record(&conn, id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<HospitalRecordEditRequest>,
) -> Result<Json<HospitalRecordResponse>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(hospital_record::update_hospital_record(&conn, id, &request)?))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    hospital_record::delete_hospital_record(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/hospital-records/by-date?start=&end=`
pub async fn by_date(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<Json<Vec<HospitalRecordResponse>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(hospital_record::hospital_records_admitted_between(
        &conn,
        query.start,
        query.end,
    )?))
}

/// `GET /api/hospital-records/busiest-month`: current calendar year.
pub async fn busiest_month(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<MonthWithHospitalRecords>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    let today = chrono::Local::now().date_naive();
    Ok(Json(hospital_record::month_with_most_hospital_records(&conn, today)?))
}

/// `GET /api/hospital-records/busiest-doctor`
pub async fn busiest_doctor(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<DoctorWithMostRecords>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(hospital_record::doctor_with_most_hospital_records(&conn)?))
}
