use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::api::{auth_handlers, map_handlers};
use crate::model::{
    Map, MapCreate, MapDelete, MapUpdate, Role, RoleCreate, RoleDelete, RoleUpdate, Status,
    StatusCreate, StatusDelete, StatusUpdate, ThrashType, ThrashTypeCreate, ThrashTypeDelete,
    ThrashTypeUpdate,
};
use crate::store::Store;

pub fn create_router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/healthcheck", get(handlers::health_check))
        // Authentication
        .route("/register", post(auth_handlers::register::<S>))
        .route("/auth/token", post(auth_handlers::issue_token::<S>))
        .route("/users/me", get(auth_handlers::current_user))
        // Roles
        .route("/roles", get(handlers::list_catalog::<S, Role>))
        .route(
            "/role/create",
            post(handlers::create_catalog::<S, Role, RoleCreate>),
        )
        .route(
            "/role/update",
            post(handlers::rename_catalog::<S, Role, RoleUpdate>),
        )
        .route(
            "/role/delete",
            post(handlers::delete_catalog::<S, Role, RoleDelete>),
        )
        // Statuses
        .route("/statuses", get(handlers::list_catalog::<S, Status>))
        .route(
            "/status/create",
            post(handlers::create_catalog::<S, Status, StatusCreate>),
        )
        .route(
            "/status/update",
            post(handlers::rename_catalog::<S, Status, StatusUpdate>),
        )
        .route(
            "/status/delete",
            post(handlers::delete_catalog::<S, Status, StatusDelete>),
        )
        // Trash types
        .route("/thrash_types", get(handlers::list_catalog::<S, ThrashType>))
        .route(
            "/thrash_type/create",
            post(handlers::create_catalog::<S, ThrashType, ThrashTypeCreate>),
        )
        .route(
            "/thrash_type/update",
            post(handlers::rename_catalog::<S, ThrashType, ThrashTypeUpdate>),
        )
        .route(
            "/thrash_type/delete",
            post(handlers::delete_catalog::<S, ThrashType, ThrashTypeDelete>),
        )
        // Maps
        .route("/maps", get(handlers::list_catalog::<S, Map>))
        .route(
            "/map/create",
            post(handlers::create_catalog::<S, Map, MapCreate>),
        )
        .route(
            "/map/update",
            post(handlers::rename_catalog::<S, Map, MapUpdate>),
        )
        .route(
            "/map/delete",
            post(handlers::delete_catalog::<S, Map, MapDelete>),
        )
        // Users
        .route("/users", get(handlers::list_users::<S>))
        .route("/users/create", post(handlers::create_users::<S>))
        .route("/users/update", post(handlers::update_users::<S>))
        .route("/users/delete", post(handlers::delete_users::<S>))
        // Couriers
        .route("/couriers", get(handlers::list_couriers::<S>))
        .route("/courier/create", post(handlers::create_couriers::<S>))
        .route("/couriers/update", post(handlers::update_couriers::<S>))
        .route("/couriers/delete", post(handlers::delete_couriers::<S>))
        // Achievements
        .route("/achievements", get(handlers::list_achievements::<S>))
        .route(
            "/achievements/create",
            post(handlers::create_achievements::<S>),
        )
        .route(
            "/achievements/update",
            post(handlers::update_achievements::<S>),
        )
        .route(
            "/achievements/delete",
            post(handlers::delete_achievements::<S>),
        )
        .route("/user/achievements", get(handlers::user_achievements::<S>))
        .route(
            "/user/achievements/sync",
            get(handlers::sync_user_achievements::<S>),
        )
        .route(
            "/user/achievements/update",
            post(handlers::update_user_achievements::<S>),
        )
        // Map points
        .route(
            "/map/point/create",
            post(map_handlers::create_map_points::<S>),
        )
        .route("/map/points", post(map_handlers::list_map_points::<S>))
        .route(
            "/map/points/update",
            post(map_handlers::update_map_points::<S>),
        )
        .route(
            "/map/points/delete",
            post(map_handlers::delete_map_points::<S>),
        )
        .route(
            "/map/points/thrash",
            post(map_handlers::list_point_thrash::<S>),
        )
        // Delivery requests
        .route(
            "/delivery/requests/create",
            post(map_handlers::create_delivery_requests::<S>),
        )
        .route(
            "/delivery/requests",
            post(map_handlers::list_delivery_requests::<S>),
        )
        .route(
            "/delivery/requests/update",
            post(map_handlers::update_delivery_requests::<S>),
        )
        .route(
            "/delivery/requests/delete",
            post(map_handlers::delete_delivery_requests::<S>),
        )
}
