use axum::{extract::State, http::StatusCode, response::Json, Json as RequestJson};

use crate::api::handlers::{
    created, service_error, ApiResult, AppState, Batch, Created, Deleted, Updated,
};
use crate::logic::{DeliveryOperations, MapPointOperations};
use crate::model::{
    DeliveryRequest, DeliveryRequestCreate, DeliveryRequestDelete, DeliveryRequestFilter,
    DeliveryRequestRow, DeliveryRequestUpdate, MapPoint, MapPointCreate, MapPointDelete,
    MapPointFilter, MapPointUpdate, PointThrashFilter, PointThrashRow,
};
use crate::store::Store;

pub async fn create_map_points<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<MapPointCreate>>,
) -> ApiResult<(StatusCode, Json<Created<MapPoint>>)> {
    MapPointOperations::create(&app.store, batch.into_vec())
        .await
        .map(created)
        .map_err(service_error)
}

pub async fn list_map_points<S: Store>(
    State(app): State<AppState<S>>,
    filter: Option<RequestJson<MapPointFilter>>,
) -> ApiResult<Json<Vec<MapPoint>>> {
    let filter = filter.map(|RequestJson(filter)| filter).unwrap_or_default();
    MapPointOperations::list(&app.store, &filter)
        .await
        .map(Json)
        .map_err(service_error)
}

pub async fn list_point_thrash<S: Store>(
    State(app): State<AppState<S>>,
    filter: Option<RequestJson<PointThrashFilter>>,
) -> ApiResult<Json<Vec<PointThrashRow>>> {
    let filter = filter.map(|RequestJson(filter)| filter).unwrap_or_default();
    MapPointOperations::point_thrash(&app.store, &filter)
        .await
        .map(Json)
        .map_err(service_error)
}

pub async fn update_map_points<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<MapPointUpdate>>,
) -> ApiResult<Json<Updated<MapPoint>>> {
    MapPointOperations::update(&app.store, batch.into_vec())
        .await
        .map(|updated| Json(Updated { updated }))
        .map_err(service_error)
}

pub async fn delete_map_points<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<MapPointDelete>>,
) -> ApiResult<Json<Deleted<MapPoint>>> {
    MapPointOperations::delete(&app.store, batch.into_vec())
        .await
        .map(|deleted| Json(Deleted { deleted }))
        .map_err(service_error)
}

pub async fn create_delivery_requests<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<DeliveryRequestCreate>>,
) -> ApiResult<(StatusCode, Json<Created<DeliveryRequest>>)> {
    DeliveryOperations::create(&app.store, batch.into_vec())
        .await
        .map(created)
        .map_err(service_error)
}

pub async fn list_delivery_requests<S: Store>(
    State(app): State<AppState<S>>,
    filter: Option<RequestJson<DeliveryRequestFilter>>,
) -> ApiResult<Json<Vec<DeliveryRequestRow>>> {
    let filter = filter.map(|RequestJson(filter)| filter).unwrap_or_default();
    DeliveryOperations::list(&app.store, &filter)
        .await
        .map(Json)
        .map_err(service_error)
}

pub async fn update_delivery_requests<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<DeliveryRequestUpdate>>,
) -> ApiResult<Json<Updated<DeliveryRequest>>> {
    DeliveryOperations::update(&app.store, batch.into_vec())
        .await
        .map(|updated| Json(Updated { updated }))
        .map_err(service_error)
}

pub async fn delete_delivery_requests<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<DeliveryRequestDelete>>,
) -> ApiResult<Json<Deleted<DeliveryRequest>>> {
    DeliveryOperations::delete(&app.store, batch.into_vec())
        .await
        .map(|deleted| Json(Deleted { deleted }))
        .map_err(service_error)
}
