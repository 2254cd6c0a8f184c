use std::sync::Arc;

use axum::extract::{Extension, Json, Path, Query, State};
use chrono::NaiveDate;
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{
    AvailabilityError, AvailabilityQuery, DayAvailability, ListVeterinariansQuery,
    SetAvailabilityRequest,
};
use crate::services::{availability::AvailabilityService, veterinarian::VeterinarianService};

fn parse_date(raw: Option<&str>) -> Result<NaiveDate, AvailabilityError> {
    let raw = raw
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or(AvailabilityError::MissingDate)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| AvailabilityError::InvalidDate)
}

#[axum::debug_handler]
pub async fn list_veterinarians(
    State(state): State<Arc<AppState>>,
    Extension(_actor): Extension<Actor>,
    Query(query): Query<ListVeterinariansQuery>,
) -> Result<Json<Value>, AppError> {
    let service = VeterinarianService::new(state.store.as_ref());
    let vets = service.list_veterinarians(&query).await?;

    Ok(Json(json!({
        "success": true,
        "data": vets
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Extension(_actor): Extension<Actor>,
    Path(veterinarian_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(query.date.as_deref())?;

    let service = AvailabilityService::new(state.store.as_ref());
    let slots = service.compute_slots(&veterinarian_id, date).await?;

    Ok(Json(json!({
        "success": true,
        "data": DayAvailability {
            veterinarian_id,
            date,
            slots,
        }
    })))
}

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(veterinarian_id): Path<String>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let service = VeterinarianService::new(state.store.as_ref());
    let vet = service
        .set_availability(&actor, &veterinarian_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": vet
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn dates_must_be_iso_calendar_days() {
        assert_eq!(
            parse_date(Some("2024-06-03")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
        );
        assert_matches!(parse_date(None), Err(AvailabilityError::MissingDate));
        assert_matches!(parse_date(Some("03/06/2024")), Err(AvailabilityError::InvalidDate));
    }
}
