//! Shipping quote and delivery scheduling handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use freshdart_core::shipping::{DEFAULT_DAYS_TO_SHOW, MAX_WEIGHT_KG, available_delivery_dates};
use freshdart_core::{DeliveryTimeSlot, ShippingQuote, ShippingType};

use crate::error::{AppError, Result};
use crate::routes::bounded;
use crate::state::AppState;

/// Longest date range the picker may request.
const MAX_DAYS_TO_SHOW: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub weight_kg: Decimal,
    #[serde(default)]
    pub shipping_type: ShippingType,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryDateParams {
    #[serde(default)]
    pub shipping_type: ShippingType,
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryDates {
    pub estimated_days: u32,
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: &'static str,
    pub label: &'static str,
}

/// Shipping cost for a parcel weight.
#[instrument(skip(state))]
pub async fn quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<ShippingQuote>> {
    if params.weight_kg < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "weight_kg cannot be negative".to_string(),
        ));
    }
    if params.weight_kg > Decimal::from(MAX_WEIGHT_KG) {
        return Err(AppError::BadRequest(format!(
            "weight_kg must be at most {MAX_WEIGHT_KG}"
        )));
    }

    let rates = state.shipping_rates().get().await?;
    Ok(Json(rates.quote(params.weight_kg, params.shipping_type)))
}

/// Selectable delivery dates, starting after the shipping estimate and
/// skipping Sundays.
#[instrument(skip(state))]
pub async fn delivery_dates(
    State(state): State<AppState>,
    Query(params): Query<DeliveryDateParams>,
) -> Result<Json<DeliveryDates>> {
    let days = bounded(
        params.days,
        "days",
        i64::from(DEFAULT_DAYS_TO_SHOW),
        1,
        MAX_DAYS_TO_SHOW,
    )?;
    let days = u32::try_from(days).map_err(|_| AppError::BadRequest("invalid days".to_string()))?;

    let rates = state.shipping_rates().get().await?;
    let estimated_days = rates.quote(Decimal::ZERO, params.shipping_type).estimated_days;
    let today = Utc::now().date_naive();

    Ok(Json(DeliveryDates {
        estimated_days,
        dates: available_delivery_dates(today, estimated_days, days),
    }))
}

pub async fn time_slots() -> Json<Vec<TimeSlot>> {
    Json(
        DeliveryTimeSlot::ALL
            .into_iter()
            .map(|slot| TimeSlot {
                id: slot.id(),
                label: slot.label(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_time_slots_in_day_order() {
        let Json(slots) = time_slots().await;
        let ids: Vec<_> = slots.iter().map(|slot| slot.id).collect();
        assert_eq!(ids, ["morning", "afternoon", "evening"]);
    }
}
