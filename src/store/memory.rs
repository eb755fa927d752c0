use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use itertools::Itertools;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::logic::query::{Column, ListQuery, Projection, Value};
use crate::model::{
    Achievement, CatalogKind, CatalogLookup, Courier, DeliveryRequest, DeliveryRequestRow, Id,
    LinkTable, MapPoint, NewCourier, NewDeliveryRequest, NewMapPoint, NewUser, PersonLookup,
    PointThrashRow, User, UserAchievementLink, UserAchievementRow, UserRow, COURIER_ROLE,
    DEFAULT_USER_ROLE, PENDING_STATUS,
};
use crate::store::traits::{Session, Store, UniqueViolation};

#[derive(Debug, Clone, Default)]
struct Tables {
    sequences: HashMap<&'static str, Id>,
    catalogs: BTreeMap<CatalogKind, BTreeMap<Id, String>>,
    users: BTreeMap<Id, User>,
    couriers: BTreeMap<Id, Courier>,
    achievements: BTreeMap<Id, Achievement>,
    achievement_links: BTreeMap<(Id, Id), UserAchievementLink>,
    point_thrash: BTreeSet<(Id, Id)>,
    delivery_thrash: BTreeSet<(Id, Id)>,
    map_points: BTreeMap<Id, MapPoint>,
    delivery_requests: BTreeMap<Id, DeliveryRequest>,
}

fn unique(constraint: &str, taken: bool) -> Result<()> {
    if taken {
        return Err(UniqueViolation {
            constraint: constraint.to_string(),
        }
        .into());
    }
    Ok(())
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> Id {
        let next = self.sequences.entry(table).or_insert(0);
        *next += 1;
        *next
    }

    fn catalog(&self, kind: CatalogKind) -> impl Iterator<Item = (&Id, &String)> {
        self.catalogs.get(&kind).into_iter().flatten()
    }

    fn catalog_name(&self, kind: CatalogKind, id: Option<Id>) -> Option<String> {
        let id = id?;
        self.catalogs.get(&kind)?.get(&id).cloned()
    }

    fn thrash_names(&self, links: &BTreeSet<(Id, Id)>, owner: Id) -> Vec<String> {
        links
            .range((owner, Id::MIN)..=(owner, Id::MAX))
            .filter_map(|(_, thrash_id)| self.catalog_name(CatalogKind::ThrashType, Some(*thrash_id)))
            .sorted()
            .collect()
    }

    /// Plain owner/target pairs. Achievement links carry unlock state and
    /// live in `achievement_links` instead.
    fn links(&self, table: LinkTable) -> Result<&BTreeSet<(Id, Id)>> {
        match table {
            LinkTable::PointThrash => Ok(&self.point_thrash),
            LinkTable::DeliveryThrash => Ok(&self.delivery_thrash),
            LinkTable::UserAchievement => Err(anyhow!("{:?} is not a pair link table", table)),
        }
    }

    fn links_mut(&mut self, table: LinkTable) -> Result<&mut BTreeSet<(Id, Id)>> {
        match table {
            LinkTable::PointThrash => Ok(&mut self.point_thrash),
            LinkTable::DeliveryThrash => Ok(&mut self.delivery_thrash),
            LinkTable::UserAchievement => Err(anyhow!("{:?} is not a pair link table", table)),
        }
    }

    fn map_point(&self, point: &MapPoint) -> MapPoint {
        MapPoint {
            accepted_thrash: self.thrash_names(&self.point_thrash, point.id),
            ..point.clone()
        }
    }

    fn delivery_request(&self, request: &DeliveryRequest) -> DeliveryRequest {
        DeliveryRequest {
            thrash_types: self.thrash_names(&self.delivery_thrash, request.id),
            ..request.clone()
        }
    }

    fn user_row(&self, user: &User) -> UserRow {
        UserRow {
            id: user.id,
            phone_number: user.phone_number.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            birthday: user.birthday,
            role: self.catalog_name(CatalogKind::Role, user.role_id),
        }
    }

    fn find_user(&self, lookup: &PersonLookup) -> Option<&User> {
        self.users.values().find(|user| match lookup {
            PersonLookup::Id(id) => user.id == *id,
            PersonLookup::Username(username) => user.username.as_ref() == Some(username),
            PersonLookup::Phone(phone) => &user.phone_number == phone,
        })
    }

    fn find_courier(&self, lookup: &PersonLookup) -> Option<&Courier> {
        self.couriers.values().find(|courier| match lookup {
            PersonLookup::Id(id) => courier.id == *id,
            PersonLookup::Username(username) => courier.username.as_ref() == Some(username),
            PersonLookup::Phone(phone) => &courier.phone_number == phone,
        })
    }

    fn check_user_keys(&self, id: Option<Id>, phone: &str, username: Option<&String>) -> Result<()> {
        let others = || self.users.values().filter(move |user| Some(user.id) != id);
        unique(
            "users_phone_number_key",
            others().any(|user| user.phone_number == phone),
        )?;
        unique(
            "users_username_key",
            username.is_some() && others().any(|user| user.username.as_ref() == username),
        )
    }

    fn check_courier_keys(
        &self,
        id: Option<Id>,
        phone: &str,
        username: Option<&String>,
    ) -> Result<()> {
        let others = || self.couriers.values().filter(move |courier| Some(courier.id) != id);
        unique(
            "couriers_phone_number_key",
            others().any(|courier| courier.phone_number == phone),
        )?;
        unique(
            "couriers_username_key",
            username.is_some() && others().any(|courier| courier.username.as_ref() == username),
        )
    }

    fn check_achievement_title(&self, id: Option<Id>, title: &str) -> Result<()> {
        unique(
            "achievements_title_key",
            self.achievements
                .values()
                .any(|achievement| Some(achievement.id) != id && achievement.title == title),
        )
    }

    fn check_catalog_name(&self, kind: CatalogKind, id: Option<Id>, name: &str) -> Result<()> {
        unique(
            kind.unique_constraint(),
            self.catalog(kind)
                .any(|(other, existing)| Some(*other) != id && existing == name),
        )
    }
}

/// In-process backend with the same constraints and cascade rules as the
/// Postgres schema. Sessions are serialized: `begin` takes the lock, works on
/// a copy of every table and writes the copy back on commit.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Starts with the rows the initial migration seeds.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (kind, name) in [
            (CatalogKind::Role, DEFAULT_USER_ROLE),
            (CatalogKind::Status, PENDING_STATUS),
        ] {
            let id = tables.next_id(kind.table());
            tables
                .catalogs
                .entry(kind)
                .or_default()
                .insert(id, name.to_string());
        }
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemorySession { guard, working })
    }
}

pub struct MemorySession {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait::async_trait]
impl Session for MemorySession {
    async fn commit(self) -> Result<()> {
        let MemorySession { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }

    async fn find_catalog(
        &mut self,
        kind: CatalogKind,
        lookup: &CatalogLookup,
    ) -> Result<Option<(Id, String)>> {
        Ok(self
            .working
            .catalog(kind)
            .find(|(id, name)| match lookup {
                CatalogLookup::Id(wanted) => *id == wanted,
                CatalogLookup::Name(wanted) => *name == wanted,
            })
            .map(|(id, name)| (*id, name.clone())))
    }

    async fn list_catalog(
        &mut self,
        kind: CatalogKind,
        lookup: Option<&CatalogLookup>,
    ) -> Result<Vec<(Id, String)>> {
        match lookup {
            Some(lookup) => Ok(self.find_catalog(kind, lookup).await?.into_iter().collect()),
            None => Ok(self
                .working
                .catalog(kind)
                .map(|(id, name)| (*id, name.clone()))
                .collect()),
        }
    }

    async fn insert_catalog(&mut self, kind: CatalogKind, name: &str) -> Result<Id> {
        self.working.check_catalog_name(kind, None, name)?;
        let id = self.working.next_id(kind.table());
        self.working
            .catalogs
            .entry(kind)
            .or_default()
            .insert(id, name.to_string());
        Ok(id)
    }

    async fn rename_catalog(&mut self, kind: CatalogKind, id: Id, name: &str) -> Result<()> {
        self.working.check_catalog_name(kind, Some(id), name)?;
        if let Some(existing) = self
            .working
            .catalogs
            .get_mut(&kind)
            .and_then(|entries| entries.get_mut(&id))
        {
            *existing = name.to_string();
        }
        Ok(())
    }

    async fn delete_catalog(&mut self, kind: CatalogKind, id: Id) -> Result<bool> {
        let tables = &mut self.working;
        if kind == CatalogKind::Status
            && tables
                .delivery_requests
                .values()
                .any(|request| request.status_id == id)
        {
            return Err(anyhow!(
                "status {} is referenced by delivery_requests.status_id",
                id
            ));
        }
        let removed = tables
            .catalogs
            .get_mut(&kind)
            .and_then(|entries| entries.remove(&id))
            .is_some();
        if !removed {
            return Ok(false);
        }
        match kind {
            CatalogKind::Role => tables
                .users
                .values_mut()
                .filter(|user| user.role_id == Some(id))
                .for_each(|user| user.role_id = None),
            CatalogKind::Map => tables
                .map_points
                .values_mut()
                .filter(|point| point.map_id == Some(id))
                .for_each(|point| point.map_id = None),
            CatalogKind::ThrashType => {
                tables.point_thrash.retain(|(_, thrash_id)| *thrash_id != id);
                tables.delivery_thrash.retain(|(_, thrash_id)| *thrash_id != id);
            }
            CatalogKind::Status => {}
        }
        Ok(true)
    }

    async fn status_in_use(&mut self, status_id: Id) -> Result<bool> {
        Ok(self
            .working
            .delivery_requests
            .values()
            .any(|request| request.status_id == status_id))
    }

    async fn find_user(&mut self, lookup: &PersonLookup) -> Result<Option<User>> {
        Ok(self.working.find_user(lookup).cloned())
    }

    async fn insert_user(&mut self, user: &NewUser, role_id: Option<Id>) -> Result<User> {
        self.working
            .check_user_keys(None, &user.phone_number, user.username.as_ref())?;
        let id = self.working.next_id("users");
        let stored = User {
            id,
            phone_number: user.phone_number.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            birthday: user.birthday,
            role_id,
            password: user.password.clone(),
        };
        self.working.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn save_user(&mut self, user: &User) -> Result<()> {
        self.working
            .check_user_keys(Some(user.id), &user.phone_number, user.username.as_ref())?;
        if let Some(existing) = self.working.users.get_mut(&user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn delete_user(&mut self, id: Id) -> Result<bool> {
        let tables = &mut self.working;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.achievement_links.retain(|(user_id, _), _| *user_id != id);
        tables
            .delivery_requests
            .values_mut()
            .filter(|request| request.user_id == Some(id))
            .for_each(|request| request.user_id = None);
        Ok(true)
    }

    async fn list_users(&mut self, query: &ListQuery) -> Result<Vec<UserRow>> {
        let tables = &self.working;
        Ok(tables
            .users
            .values()
            .map(|user| tables.user_row(user))
            .filter(|row| query.matches(row))
            .collect())
    }

    async fn find_courier(&mut self, lookup: &PersonLookup) -> Result<Option<Courier>> {
        Ok(self.working.find_courier(lookup).cloned())
    }

    async fn insert_courier(&mut self, courier: &NewCourier) -> Result<Courier> {
        self.working
            .check_courier_keys(None, &courier.phone_number, courier.username.as_ref())?;
        let id = self.working.next_id("couriers");
        let stored = Courier {
            id,
            phone_number: courier.phone_number.clone(),
            username: courier.username.clone(),
            name: courier.name.clone(),
            surname: courier.surname.clone(),
            birthday: courier.birthday,
            delivery_count: courier.delivery_count,
            salary: courier.salary,
            role: COURIER_ROLE.to_string(),
            password: courier.password.clone(),
        };
        self.working.couriers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn save_courier(&mut self, courier: &Courier) -> Result<()> {
        self.working.check_courier_keys(
            Some(courier.id),
            &courier.phone_number,
            courier.username.as_ref(),
        )?;
        if let Some(existing) = self.working.couriers.get_mut(&courier.id) {
            *existing = courier.clone();
        }
        Ok(())
    }

    async fn delete_courier(&mut self, id: Id) -> Result<bool> {
        let tables = &mut self.working;
        if tables.couriers.remove(&id).is_none() {
            return Ok(false);
        }
        tables
            .delivery_requests
            .values_mut()
            .filter(|request| request.courier_id == Some(id))
            .for_each(|request| request.courier_id = None);
        Ok(true)
    }

    async fn list_couriers(&mut self, query: &ListQuery) -> Result<Vec<Courier>> {
        Ok(self
            .working
            .couriers
            .values()
            .filter(|courier| query.matches(*courier))
            .cloned()
            .collect())
    }

    async fn find_achievement(&mut self, lookup: &CatalogLookup) -> Result<Option<Achievement>> {
        Ok(self
            .working
            .achievements
            .values()
            .find(|achievement| match lookup {
                CatalogLookup::Id(id) => achievement.id == *id,
                CatalogLookup::Name(title) => &achievement.title == title,
            })
            .cloned())
    }

    async fn list_achievements(&mut self) -> Result<Vec<Achievement>> {
        Ok(self.working.achievements.values().cloned().collect())
    }

    async fn insert_achievement(
        &mut self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Achievement> {
        self.working.check_achievement_title(None, title)?;
        let id = self.working.next_id("achievements");
        let achievement = Achievement {
            id,
            title: title.to_string(),
            description: description.map(str::to_string),
        };
        self.working.achievements.insert(id, achievement.clone());
        Ok(achievement)
    }

    async fn save_achievement(&mut self, achievement: &Achievement) -> Result<()> {
        self.working
            .check_achievement_title(Some(achievement.id), &achievement.title)?;
        if let Some(existing) = self.working.achievements.get_mut(&achievement.id) {
            *existing = achievement.clone();
        }
        Ok(())
    }

    async fn delete_achievement(&mut self, id: Id) -> Result<bool> {
        Ok(self.working.achievements.remove(&id).is_some())
    }

    async fn find_achievement_link(
        &mut self,
        user_id: Id,
        achievement_id: Id,
    ) -> Result<Option<UserAchievementLink>> {
        Ok(self
            .working
            .achievement_links
            .get(&(user_id, achievement_id))
            .cloned())
    }

    async fn save_achievement_link(&mut self, link: &UserAchievementLink) -> Result<()> {
        if let Some(existing) = self
            .working
            .achievement_links
            .get_mut(&(link.user_id, link.achievement_id))
        {
            *existing = link.clone();
        }
        Ok(())
    }

    async fn list_user_achievements(&mut self, user_id: Id) -> Result<Vec<UserAchievementRow>> {
        let tables = &self.working;
        Ok(tables
            .achievement_links
            .range((user_id, Id::MIN)..=(user_id, Id::MAX))
            .filter_map(|((_, achievement_id), link)| {
                let achievement = tables.achievements.get(achievement_id)?;
                Some(UserAchievementRow {
                    id: achievement.id,
                    title: achievement.title.clone(),
                    description: achievement.description.clone(),
                    unlock_date: link.unlock_date,
                    unlocked: link.unlocked,
                })
            })
            .collect())
    }

    async fn add_link(&mut self, table: LinkTable, owner: Id, target: Id) -> Result<()> {
        match table {
            LinkTable::UserAchievement => {
                self.working
                    .achievement_links
                    .entry((owner, target))
                    .or_insert_with(|| UserAchievementLink::locked(owner, target));
            }
            LinkTable::PointThrash | LinkTable::DeliveryThrash => {
                self.working.links_mut(table)?.insert((owner, target));
            }
        }
        Ok(())
    }

    async fn remove_link(&mut self, table: LinkTable, owner: Id, target: Id) -> Result<()> {
        match table {
            LinkTable::UserAchievement => {
                self.working.achievement_links.remove(&(owner, target));
            }
            LinkTable::PointThrash | LinkTable::DeliveryThrash => {
                self.working.links_mut(table)?.remove(&(owner, target));
            }
        }
        Ok(())
    }

    async fn list_linked(&mut self, table: LinkTable, owner: Id) -> Result<BTreeSet<Id>> {
        let range = (owner, Id::MIN)..=(owner, Id::MAX);
        Ok(match table {
            LinkTable::UserAchievement => self
                .working
                .achievement_links
                .range(range)
                .map(|((_, target), _)| *target)
                .collect(),
            LinkTable::PointThrash | LinkTable::DeliveryThrash => self
                .working
                .links(table)?
                .range(range)
                .map(|(_, target)| *target)
                .collect(),
        })
    }

    async fn find_map_point(&mut self, id: Id) -> Result<Option<MapPoint>> {
        let tables = &self.working;
        Ok(tables.map_points.get(&id).map(|point| tables.map_point(point)))
    }

    async fn insert_map_point(&mut self, point: &NewMapPoint) -> Result<Id> {
        let id = self.working.next_id("map_points");
        self.working.map_points.insert(
            id,
            MapPoint {
                id,
                title: point.title.clone(),
                address: point.address.clone(),
                phone_number: point.phone_number.clone(),
                email: point.email.clone(),
                website: point.website.clone(),
                description: point.description.clone(),
                coordinates: point.coordinates,
                map_id: point.map_id,
                accepted_thrash: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn save_map_point(&mut self, point: &MapPoint) -> Result<()> {
        if let Some(existing) = self.working.map_points.get_mut(&point.id) {
            *existing = MapPoint {
                accepted_thrash: Vec::new(),
                ..point.clone()
            };
        }
        Ok(())
    }

    async fn delete_map_point(&mut self, id: Id) -> Result<bool> {
        let tables = &mut self.working;
        if tables.map_points.remove(&id).is_none() {
            return Ok(false);
        }
        tables.point_thrash.retain(|(point_id, _)| *point_id != id);
        Ok(true)
    }

    async fn list_map_points(&mut self, query: &ListQuery) -> Result<Vec<MapPoint>> {
        let tables = &self.working;
        Ok(tables
            .map_points
            .values()
            .filter(|point| {
                query.matches_with(|column| match column {
                    Column::MapCity => tables
                        .catalog_name(CatalogKind::Map, point.map_id)
                        .map(Value::from),
                    other => point.project(other),
                })
            })
            .map(|point| tables.map_point(point))
            .collect())
    }

    async fn list_point_thrash(&mut self, query: &ListQuery) -> Result<Vec<PointThrashRow>> {
        let tables = &self.working;
        let mut rows = Vec::new();
        for point in tables.map_points.values() {
            let names = tables.thrash_names(&tables.point_thrash, point.id);
            let names: Vec<Option<String>> = match names.is_empty() {
                true => vec![None],
                false => names.into_iter().map(Some).collect(),
            };
            for thrash_type in names {
                let row = PointThrashRow {
                    point_id: point.id,
                    thrash_type,
                    title: point.title.clone(),
                    city: tables.catalog_name(CatalogKind::Map, point.map_id),
                    email: point.email.clone(),
                    address: point.address.clone(),
                    phone_number: point.phone_number.clone(),
                    website: point.website.clone(),
                    description: point.description.clone(),
                    coordinates: point.coordinates,
                };
                if query.matches(&row) {
                    rows.push(row);
                }
            }
        }
        Ok(rows)
    }

    async fn find_delivery_request(&mut self, id: Id) -> Result<Option<DeliveryRequest>> {
        let tables = &self.working;
        Ok(tables
            .delivery_requests
            .get(&id)
            .map(|request| tables.delivery_request(request)))
    }

    async fn insert_delivery_request(&mut self, request: &NewDeliveryRequest) -> Result<Id> {
        let id = self.working.next_id("delivery_requests");
        self.working.delivery_requests.insert(
            id,
            DeliveryRequest {
                id,
                address: request.address.clone(),
                create_date: request.create_date,
                price: request.price,
                courier_id: request.courier_id,
                user_id: request.user_id,
                status_id: request.status_id,
                thrash_types: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn save_delivery_request(&mut self, request: &DeliveryRequest) -> Result<()> {
        if let Some(existing) = self.working.delivery_requests.get_mut(&request.id) {
            *existing = DeliveryRequest {
                thrash_types: Vec::new(),
                ..request.clone()
            };
        }
        Ok(())
    }

    async fn delete_delivery_request(&mut self, id: Id) -> Result<bool> {
        let tables = &mut self.working;
        if tables.delivery_requests.remove(&id).is_none() {
            return Ok(false);
        }
        tables.delivery_thrash.retain(|(request_id, _)| *request_id != id);
        Ok(true)
    }

    async fn list_delivery_requests(
        &mut self,
        query: &ListQuery,
    ) -> Result<Vec<DeliveryRequestRow>> {
        let tables = &self.working;
        let mut rows = Vec::new();
        for request in tables.delivery_requests.values() {
            let courier = request
                .courier_id
                .and_then(|id| tables.couriers.get(&id));
            let user = request.user_id.and_then(|id| tables.users.get(&id));
            let names = tables.thrash_names(&tables.delivery_thrash, request.id);
            let names: Vec<Option<String>> = match names.is_empty() {
                true => vec![None],
                false => names.into_iter().map(Some).collect(),
            };
            for thrash_type in names {
                let row = DeliveryRequestRow {
                    id: request.id,
                    delivery_address: request.address.clone(),
                    create_date: request.create_date,
                    price: request.price,
                    thrash_type,
                    status: tables.catalog_name(CatalogKind::Status, Some(request.status_id)),
                    courier_name: courier.and_then(|c| c.name.clone()),
                    courier_surname: courier.and_then(|c| c.surname.clone()),
                    courier_phone_number: courier.map(|c| c.phone_number.clone()),
                    user_name: user.and_then(|u| u.name.clone()),
                    user_surname: user.and_then(|u| u.surname.clone()),
                    user_phone_number: user.map(|u| u.phone_number.clone()),
                    user_username: user.and_then(|u| u.username.clone()),
                };
                if query.matches(&row) {
                    rows.push(row);
                }
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_session_discards_changes() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        session
            .insert_catalog(CatalogKind::Map, "Kazan")
            .await
            .unwrap();
        drop(session);

        let mut session = store.begin().await.unwrap();
        let maps = session.list_catalog(CatalogKind::Map, None).await.unwrap();
        assert!(maps.is_empty());
    }

    #[tokio::test]
    async fn catalog_names_are_unique() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let err = session
            .insert_catalog(CatalogKind::Role, DEFAULT_USER_ROLE)
            .await
            .unwrap_err();
        let violation = err.downcast_ref::<UniqueViolation>().unwrap();
        assert_eq!(violation.constraint, "roles_name_key");
    }

    #[tokio::test]
    async fn deleting_a_role_clears_user_references() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let role_id = session
            .insert_catalog(CatalogKind::Role, "moderator")
            .await
            .unwrap();
        let user = NewUser {
            phone_number: "8 (900) 000-00-01".to_string(),
            username: None,
            name: None,
            surname: None,
            birthday: None,
            password: "hashed".to_string(),
            role: None,
        };
        let stored = session.insert_user(&user, Some(role_id)).await.unwrap();
        assert!(session.delete_catalog(CatalogKind::Role, role_id).await.unwrap());

        let reloaded = session
            .find_user(&PersonLookup::Id(stored.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.role_id, None);
    }

    #[tokio::test]
    async fn achievement_links_stay_out_of_trash_sets() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        session
            .add_link(LinkTable::UserAchievement, 1, 7)
            .await
            .unwrap();
        session.add_link(LinkTable::DeliveryThrash, 1, 3).await.unwrap();

        let achievements = session
            .list_linked(LinkTable::UserAchievement, 1)
            .await
            .unwrap();
        assert_eq!(achievements, BTreeSet::from([7]));
        let thrash = session
            .list_linked(LinkTable::DeliveryThrash, 1)
            .await
            .unwrap();
        assert_eq!(thrash, BTreeSet::from([3]));

        assert!(Tables::default().links(LinkTable::UserAchievement).is_err());
    }
}
