use axum::extract::{Query, State};
use axum::Json;

use velodb_store::Bike;

use super::{map_store_error, ApiError, AppState};

/// `GET /api/bikes`: every bike in the current snapshots, as a bare JSON
/// array. The store is re-read on each call.
pub(super) async fn list_bikes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Bike>>, ApiError> {
    let bikes =
        velodb_store::load_bikes(&state.config.data_dir).map_err(|e| map_store_error(&e))?;
    Ok(Json(bikes))
}

/// `GET /api/compare?bike_ids=a&bike_ids=b`: the matching bikes in request
/// order. Unknown ids are silently omitted; no parameters yield an empty
/// array.
///
/// `bike_ids` repeats as a query key, so the raw pair list is collected
/// instead of a struct (`serde_urlencoded` cannot fold repeated keys into a
/// `Vec` field).
pub(super) async fn compare(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Bike>>, ApiError> {
    let ids: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == "bike_ids")
        .map(|(_, value)| value)
        .collect();

    let bikes =
        velodb_store::find_bikes(&state.config.data_dir, &ids).map_err(|e| map_store_error(&e))?;
    Ok(Json(bikes))
}
