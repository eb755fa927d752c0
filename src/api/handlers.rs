use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use log::error;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::logic::{
    validate_all, AchievementOperations, CatalogOperations, CourierOperations, ServiceError,
    UserOperations,
};
use crate::model::{
    Achievement, AchievementCreate, AchievementDelete, AchievementQuery, AchievementUpdate,
    CatalogEntry, CatalogKey, CatalogQuery, CatalogRename, Courier, CourierCreate, CourierDelete,
    CourierFilter, CourierUpdate, Id, NewUser, User, UserAchievementLink, UserAchievementRow,
    UserAchievementUpdate, UserCreate, UserDelete, UserFilter, UserIdQuery, UserRow, UserUpdate,
};
use crate::store::Store;
use crate::App;

pub type AppState<S> = Arc<App<S>>;

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Mutation bodies take either one command object or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Batch<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Batch<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Batch::Many(items) => items,
            Batch::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created<T> {
    pub created: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Updated<T> {
    pub updated: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted<T> {
    pub deleted: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub linked: BTreeSet<Id>,
}

pub fn service_error(err: ServiceError) -> ApiError {
    let status = match &err {
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::MissingIdentity { .. } | ServiceError::Unresolved(_) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::Storage(cause) => {
            error!("Storage failure: {:#}", cause);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(&err.to_string())))
}

fn hash_failed(err: anyhow::Error) -> ApiError {
    service_error(ServiceError::Storage(err))
}

pub(crate) fn created<T>(items: Vec<T>) -> (StatusCode, Json<Created<T>>) {
    (StatusCode::CREATED, Json(Created { created: items }))
}

// Catalogs: roles, statuses, trash types, maps

pub async fn list_catalog<S: Store, E: CatalogEntry>(
    State(app): State<AppState<S>>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<E>>> {
    CatalogOperations::list::<S, E>(&app.store, &query)
        .await
        .map(Json)
        .map_err(service_error)
}

pub async fn create_catalog<S, E, C>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<C>>,
) -> ApiResult<(StatusCode, Json<Created<E>>)>
where
    S: Store,
    E: CatalogEntry,
    C: Into<String> + DeserializeOwned + Send,
{
    let names = batch.into_vec().into_iter().map(Into::into).collect();
    CatalogOperations::create::<S, E>(&app.store, names)
        .await
        .map(created)
        .map_err(service_error)
}

pub async fn rename_catalog<S, E, C>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<C>>,
) -> ApiResult<Json<Updated<E>>>
where
    S: Store,
    E: CatalogEntry,
    C: Into<CatalogRename> + DeserializeOwned + Send,
{
    let renames = batch.into_vec().into_iter().map(Into::into).collect();
    CatalogOperations::rename::<S, E>(&app.store, renames)
        .await
        .map(|updated| Json(Updated { updated }))
        .map_err(service_error)
}

pub async fn delete_catalog<S, E, C>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<C>>,
) -> ApiResult<Json<Deleted<E>>>
where
    S: Store,
    E: CatalogEntry,
    C: Into<CatalogKey> + DeserializeOwned + Send,
{
    let keys = batch.into_vec().into_iter().map(Into::into).collect();
    CatalogOperations::delete::<S, E>(&app.store, keys)
        .await
        .map(|deleted| Json(Deleted { deleted }))
        .map_err(service_error)
}

// Users

/// Hashes every credential before the commands reach the core.
pub(crate) fn hash_users<S: Store>(
    app: &App<S>,
    items: Vec<UserCreate>,
) -> ApiResult<Vec<NewUser>> {
    validate_all(&items).map_err(service_error)?;
    items
        .into_iter()
        .map(|item| {
            let hash = app.hasher.hash(&item.password).map_err(hash_failed)?;
            Ok(item.into_new_user(hash))
        })
        .collect()
}

pub async fn create_users<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<UserCreate>>,
) -> ApiResult<(StatusCode, Json<Created<User>>)> {
    let users = hash_users(&app, batch.into_vec())?;
    UserOperations::create(&app.store, users)
        .await
        .map(created)
        .map_err(service_error)
}

pub async fn list_users<S: Store>(
    State(app): State<AppState<S>>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Json<Vec<UserRow>>> {
    UserOperations::list(&app.store, &filter)
        .await
        .map(Json)
        .map_err(service_error)
}

pub async fn update_users<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<UserUpdate>>,
) -> ApiResult<Json<Updated<User>>> {
    UserOperations::update(&app.store, batch.into_vec())
        .await
        .map(|updated| Json(Updated { updated }))
        .map_err(service_error)
}

pub async fn delete_users<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<UserDelete>>,
) -> ApiResult<Json<Deleted<User>>> {
    UserOperations::delete(&app.store, batch.into_vec())
        .await
        .map(|deleted| Json(Deleted { deleted }))
        .map_err(service_error)
}

// Couriers

pub async fn create_couriers<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<CourierCreate>>,
) -> ApiResult<(StatusCode, Json<Created<Courier>>)> {
    let items = batch.into_vec();
    validate_all(&items).map_err(service_error)?;
    let couriers = items
        .into_iter()
        .map(|item| {
            let hash = app.hasher.hash(&item.password).map_err(hash_failed)?;
            Ok(item.into_new_courier(hash))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    CourierOperations::create(&app.store, couriers)
        .await
        .map(created)
        .map_err(service_error)
}

pub async fn list_couriers<S: Store>(
    State(app): State<AppState<S>>,
    Query(filter): Query<CourierFilter>,
) -> ApiResult<Json<Vec<Courier>>> {
    CourierOperations::list(&app.store, &filter)
        .await
        .map(Json)
        .map_err(service_error)
}

pub async fn update_couriers<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<CourierUpdate>>,
) -> ApiResult<Json<Updated<Courier>>> {
    CourierOperations::update(&app.store, batch.into_vec())
        .await
        .map(|updated| Json(Updated { updated }))
        .map_err(service_error)
}

pub async fn delete_couriers<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<CourierDelete>>,
) -> ApiResult<Json<Deleted<Courier>>> {
    CourierOperations::delete(&app.store, batch.into_vec())
        .await
        .map(|deleted| Json(Deleted { deleted }))
        .map_err(service_error)
}

// Achievements

pub async fn list_achievements<S: Store>(
    State(app): State<AppState<S>>,
    Query(query): Query<AchievementQuery>,
) -> ApiResult<Json<Vec<Achievement>>> {
    AchievementOperations::list(&app.store, &query)
        .await
        .map(Json)
        .map_err(service_error)
}

pub async fn create_achievements<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<AchievementCreate>>,
) -> ApiResult<(StatusCode, Json<Created<Achievement>>)> {
    AchievementOperations::create(&app.store, batch.into_vec())
        .await
        .map(created)
        .map_err(service_error)
}

pub async fn update_achievements<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<AchievementUpdate>>,
) -> ApiResult<Json<Updated<Achievement>>> {
    AchievementOperations::update(&app.store, batch.into_vec())
        .await
        .map(|updated| Json(Updated { updated }))
        .map_err(service_error)
}

pub async fn delete_achievements<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<AchievementDelete>>,
) -> ApiResult<Json<Deleted<Achievement>>> {
    AchievementOperations::delete(&app.store, batch.into_vec())
        .await
        .map(|deleted| Json(Deleted { deleted }))
        .map_err(service_error)
}

pub async fn user_achievements<S: Store>(
    State(app): State<AppState<S>>,
    Query(query): Query<UserIdQuery>,
) -> ApiResult<Json<Vec<UserAchievementRow>>> {
    AchievementOperations::user_achievements(&app.store, query.user_id)
        .await
        .map(Json)
        .map_err(service_error)
}

pub async fn sync_user_achievements<S: Store>(
    State(app): State<AppState<S>>,
    Query(query): Query<UserIdQuery>,
) -> ApiResult<Json<SyncResponse>> {
    AchievementOperations::sync(&app.store, query.user_id)
        .await
        .map(|outcome| {
            Json(SyncResponse {
                linked: outcome.linked(),
            })
        })
        .map_err(service_error)
}

pub async fn update_user_achievements<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(batch): RequestJson<Batch<UserAchievementUpdate>>,
) -> ApiResult<Json<Updated<UserAchievementLink>>> {
    AchievementOperations::update_links(&app.store, batch.into_vec())
        .await
        .map(|updated| Json(Updated { updated }))
        .map_err(service_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoleCreate;

    #[test]
    fn batch_accepts_object_or_array() {
        let one: Batch<RoleCreate> = serde_json::from_str(r#"{"name": "admin"}"#).unwrap();
        assert_eq!(one.into_vec().len(), 1);

        let many: Batch<RoleCreate> =
            serde_json::from_str(r#"[{"name": "admin"}, {"name": "courier"}]"#).unwrap();
        let names: Vec<String> = many.into_vec().into_iter().map(Into::into).collect();
        assert_eq!(names, vec!["admin".to_string(), "courier".to_string()]);
    }

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ServiceError::Validation("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::MissingIdentity { index: 0 }, StatusCode::BAD_REQUEST),
            (ServiceError::Unresolved("who".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Storage(anyhow::anyhow!("down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let (status, _) = service_error(err);
            assert_eq!(status, expected);
        }
    }
}
