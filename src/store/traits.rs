use std::collections::BTreeSet;

use anyhow::Result;

use crate::logic::query::ListQuery;
use crate::model::{
    Achievement, CatalogKind, CatalogLookup, Courier, DeliveryRequest, DeliveryRequestRow, Id,
    LinkTable, MapPoint, NewCourier, NewDeliveryRequest, NewMapPoint, NewUser, PersonLookup,
    PointThrashRow, User, UserAchievementLink, UserAchievementRow, UserRow,
};

/// Raised by a backend when a write hits one of the named unique constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unique constraint `{constraint}` violated")]
pub struct UniqueViolation {
    pub constraint: String,
}

/// Connection-pool handle. Every core operation borrows one and opens a
/// [`Session`] for the duration of the call.
#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    type Session: Session;

    async fn begin(&self) -> Result<Self::Session>;
}

/// One transaction scope. Dropping a session without calling
/// [`Session::commit`] discards every staged change.
#[async_trait::async_trait]
pub trait Session: Send + Sized {
    async fn commit(self) -> Result<()>;
    async fn rollback(self) -> Result<()>;

    // Name-only catalogs: roles, statuses, trash types, maps
    async fn find_catalog(
        &mut self,
        kind: CatalogKind,
        lookup: &CatalogLookup,
    ) -> Result<Option<(Id, String)>>;
    async fn list_catalog(
        &mut self,
        kind: CatalogKind,
        lookup: Option<&CatalogLookup>,
    ) -> Result<Vec<(Id, String)>>;
    async fn insert_catalog(&mut self, kind: CatalogKind, name: &str) -> Result<Id>;
    async fn rename_catalog(&mut self, kind: CatalogKind, id: Id, name: &str) -> Result<()>;
    async fn delete_catalog(&mut self, kind: CatalogKind, id: Id) -> Result<bool>;
    /// Whether any delivery request still points at the status.
    async fn status_in_use(&mut self, status_id: Id) -> Result<bool>;

    // Users
    async fn find_user(&mut self, lookup: &PersonLookup) -> Result<Option<User>>;
    async fn insert_user(&mut self, user: &NewUser, role_id: Option<Id>) -> Result<User>;
    async fn save_user(&mut self, user: &User) -> Result<()>;
    async fn delete_user(&mut self, id: Id) -> Result<bool>;
    async fn list_users(&mut self, query: &ListQuery) -> Result<Vec<UserRow>>;

    // Couriers
    async fn find_courier(&mut self, lookup: &PersonLookup) -> Result<Option<Courier>>;
    async fn insert_courier(&mut self, courier: &NewCourier) -> Result<Courier>;
    async fn save_courier(&mut self, courier: &Courier) -> Result<()>;
    async fn delete_courier(&mut self, id: Id) -> Result<bool>;
    async fn list_couriers(&mut self, query: &ListQuery) -> Result<Vec<Courier>>;

    // Achievements and their per-user unlock state
    async fn find_achievement(&mut self, lookup: &CatalogLookup) -> Result<Option<Achievement>>;
    async fn list_achievements(&mut self) -> Result<Vec<Achievement>>;
    async fn insert_achievement(
        &mut self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Achievement>;
    async fn save_achievement(&mut self, achievement: &Achievement) -> Result<()>;
    async fn delete_achievement(&mut self, id: Id) -> Result<bool>;
    async fn find_achievement_link(
        &mut self,
        user_id: Id,
        achievement_id: Id,
    ) -> Result<Option<UserAchievementLink>>;
    async fn save_achievement_link(&mut self, link: &UserAchievementLink) -> Result<()>;
    /// Links joined with their achievement; orphan links are left out.
    async fn list_user_achievements(&mut self, user_id: Id) -> Result<Vec<UserAchievementRow>>;

    // Link tables
    /// Inserts the pair; adding an existing pair is a no-op.
    async fn add_link(&mut self, table: LinkTable, owner: Id, target: Id) -> Result<()>;
    async fn remove_link(&mut self, table: LinkTable, owner: Id, target: Id) -> Result<()>;
    async fn list_linked(&mut self, table: LinkTable, owner: Id) -> Result<BTreeSet<Id>>;

    // Map points
    async fn find_map_point(&mut self, id: Id) -> Result<Option<MapPoint>>;
    async fn insert_map_point(&mut self, point: &NewMapPoint) -> Result<Id>;
    /// Writes the scalar columns; `accepted_thrash` is owned by the link table.
    async fn save_map_point(&mut self, point: &MapPoint) -> Result<()>;
    async fn delete_map_point(&mut self, id: Id) -> Result<bool>;
    async fn list_map_points(&mut self, query: &ListQuery) -> Result<Vec<MapPoint>>;
    async fn list_point_thrash(&mut self, query: &ListQuery) -> Result<Vec<PointThrashRow>>;

    // Delivery requests
    async fn find_delivery_request(&mut self, id: Id) -> Result<Option<DeliveryRequest>>;
    async fn insert_delivery_request(&mut self, request: &NewDeliveryRequest) -> Result<Id>;
    /// Writes the scalar columns; `thrash_types` is owned by the link table.
    async fn save_delivery_request(&mut self, request: &DeliveryRequest) -> Result<()>;
    async fn delete_delivery_request(&mut self, id: Id) -> Result<bool>;
    async fn list_delivery_requests(&mut self, query: &ListQuery)
        -> Result<Vec<DeliveryRequestRow>>;
}
