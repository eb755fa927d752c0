use log::{debug, info, warn};

use crate::logic::catalog_ops::resolve_name;
use crate::logic::error::{ServiceError, ServiceResult};
use crate::logic::identity::{
    courier_delete_target, courier_update_targets, user_delete_target, user_update_target,
};
use crate::logic::patch::{CourierPatch, Patch, UserPatch};
use crate::logic::query::{Listing, QueryComposer};
use crate::logic::sync::sync_user_achievements;
use crate::model::{
    non_empty, CatalogKind, CatalogLookup, Courier, CourierDelete, CourierFilter, CourierUpdate,
    NewCourier, NewUser, PersonLookup, User, UserDelete, UserFilter, UserRow, UserUpdate,
    DEFAULT_USER_ROLE,
};
use crate::store::{Session, Store};

pub struct UserOperations;

impl UserOperations {
    pub async fn find<S: Store>(store: &S, lookup: &PersonLookup) -> ServiceResult<Option<User>> {
        let mut session = store.begin().await?;
        Ok(session.find_user(lookup).await?)
    }

    /// Creates users with already-hashed credentials. Each new user gets a
    /// locked link to every existing achievement in the same transaction.
    pub async fn create<S: Store>(store: &S, users: Vec<NewUser>) -> ServiceResult<Vec<User>> {
        let mut session = store.begin().await?;
        let mut created = Vec::with_capacity(users.len());
        for mut user in users {
            // empty means no username
            user.username = non_empty(&user.username).map(str::to_string);
            if let Some(existing) = Self::colliding_key(&mut session, &user).await? {
                warn!("Refusing to create user: {} already exists", existing);
                return Err(ServiceError::Conflict(format!("{} already exists", existing)));
            }

            let role_name = non_empty(&user.role).unwrap_or(DEFAULT_USER_ROLE);
            let role_id = resolve_name(&mut session, CatalogKind::Role, Some(role_name)).await?;
            if role_id.is_none() && non_empty(&user.role).is_some() {
                return Err(ServiceError::Unresolved(format!(
                    "role '{}' does not exist",
                    role_name
                )));
            }

            let stored = session.insert_user(&user, role_id).await?;
            let linked = sync_user_achievements(&mut session, stored.id).await?;
            debug!(
                "User {} starts with {} achievement links",
                stored.id,
                linked.linked().len()
            );
            created.push(stored);
        }
        session.commit().await?;

        info!("Created {} users", created.len());
        Ok(created)
    }

    async fn colliding_key<Sn: Session>(
        session: &mut Sn,
        user: &NewUser,
    ) -> anyhow::Result<Option<String>> {
        let phone = PersonLookup::Phone(user.phone_number.clone());
        if session.find_user(&phone).await?.is_some() {
            return Ok(Some(user.phone_number.clone()));
        }
        if let Some(username) = non_empty(&user.username) {
            let lookup = PersonLookup::Username(username.to_string());
            if session.find_user(&lookup).await?.is_some() {
                return Ok(Some(username.to_string()));
            }
        }
        Ok(None)
    }

    /// An identity filter turns the listing into a single lookup and every
    /// other filter is ignored.
    pub async fn list<S: Store>(store: &S, filter: &UserFilter) -> ServiceResult<Vec<UserRow>> {
        let mut session = store.begin().await?;
        match QueryComposer::users(filter) {
            Listing::Direct(lookup) => {
                let Some(user) = session.find_user(&lookup).await? else {
                    return Ok(Vec::new());
                };
                let role = match user.role_id {
                    Some(role_id) => session
                        .find_catalog(CatalogKind::Role, &CatalogLookup::Id(role_id))
                        .await?
                        .map(|(_, name)| name),
                    None => None,
                };
                Ok(vec![UserRow {
                    id: user.id,
                    phone_number: user.phone_number,
                    username: user.username,
                    name: user.name,
                    surname: user.surname,
                    birthday: user.birthday,
                    role,
                }])
            }
            Listing::Scan(query) => Ok(session.list_users(&query).await?),
        }
    }

    /// Applies partial updates. Items without a resolvable target are skipped.
    /// A role name that does not resolve leaves the role unchanged.
    pub async fn update<S: Store>(store: &S, updates: Vec<UserUpdate>) -> ServiceResult<Vec<User>> {
        let mut session = store.begin().await?;
        let mut updated = Vec::new();
        for (index, update) in updates.iter().enumerate() {
            let Some(lookup) = user_update_target(update) else {
                debug!("Skipping user update item {}: no key", index);
                continue;
            };
            let Some(user) = session.find_user(&lookup).await? else {
                debug!("Skipping user update item {}: {:?} not found", index, lookup);
                continue;
            };
            let role_id =
                resolve_name(&mut session, CatalogKind::Role, non_empty(&update.role)).await?;
            let user = UserPatch::from_update(update, role_id).apply(user);
            session.save_user(&user).await?;
            updated.push(user);
        }
        session.commit().await?;

        Ok(updated)
    }

    /// Deleting a user drops their achievement links with them.
    pub async fn delete<S: Store>(store: &S, deletes: Vec<UserDelete>) -> ServiceResult<Vec<User>> {
        let mut session = store.begin().await?;
        let mut deleted = Vec::new();
        for (index, delete) in deletes.iter().enumerate() {
            let Some(lookup) = user_delete_target(delete) else {
                warn!("Aborting user delete: item {} carries no key", index);
                return Err(ServiceError::MissingIdentity { index });
            };
            let Some(user) = session.find_user(&lookup).await? else {
                debug!("Skipping user delete item {}: {:?} not found", index, lookup);
                continue;
            };
            session.delete_user(user.id).await?;
            deleted.push(user);
        }
        session.commit().await?;

        info!("Deleted {} users", deleted.len());
        Ok(deleted)
    }
}

pub struct CourierOperations;

impl CourierOperations {
    pub async fn create<S: Store>(
        store: &S,
        couriers: Vec<NewCourier>,
    ) -> ServiceResult<Vec<Courier>> {
        let mut session = store.begin().await?;
        let mut created = Vec::with_capacity(couriers.len());
        for mut courier in couriers {
            courier.username = non_empty(&courier.username).map(str::to_string);
            let mut keys = vec![PersonLookup::Phone(courier.phone_number.clone())];
            if let Some(username) = non_empty(&courier.username) {
                keys.push(PersonLookup::Username(username.to_string()));
            }
            for key in &keys {
                if session.find_courier(key).await?.is_some() {
                    warn!("Refusing to create courier: {:?} already exists", key);
                    return Err(ServiceError::Conflict(format!(
                        "courier {:?} already exists",
                        key
                    )));
                }
            }
            created.push(session.insert_courier(&courier).await?);
        }
        session.commit().await?;

        info!("Created {} couriers", created.len());
        Ok(created)
    }

    pub async fn list<S: Store>(store: &S, filter: &CourierFilter) -> ServiceResult<Vec<Courier>> {
        let mut session = store.begin().await?;
        match QueryComposer::couriers(filter) {
            Listing::Direct(lookup) => Ok(session.find_courier(&lookup).await?.into_iter().collect()),
            Listing::Scan(query) => Ok(session.list_couriers(&query).await?),
        }
    }

    /// Tries id, phone and username in turn until one finds a courier.
    pub async fn update<S: Store>(
        store: &S,
        updates: Vec<CourierUpdate>,
    ) -> ServiceResult<Vec<Courier>> {
        let mut session = store.begin().await?;
        let mut updated = Vec::new();
        for (index, update) in updates.iter().enumerate() {
            let mut target = None;
            for lookup in courier_update_targets(update) {
                if let Some(courier) = session.find_courier(&lookup).await? {
                    target = Some(courier);
                    break;
                }
            }
            let Some(courier) = target else {
                debug!("Skipping courier update item {}: no match", index);
                continue;
            };
            let courier = CourierPatch::from(update).apply(courier);
            session.save_courier(&courier).await?;
            updated.push(courier);
        }
        session.commit().await?;

        Ok(updated)
    }

    pub async fn delete<S: Store>(
        store: &S,
        deletes: Vec<CourierDelete>,
    ) -> ServiceResult<Vec<Courier>> {
        let mut session = store.begin().await?;
        let mut deleted = Vec::new();
        for (index, delete) in deletes.iter().enumerate() {
            let Some(lookup) = courier_delete_target(delete) else {
                warn!("Aborting courier delete: item {} carries no key", index);
                return Err(ServiceError::MissingIdentity { index });
            };
            let Some(courier) = session.find_courier(&lookup).await? else {
                debug!("Skipping courier delete item {}: {:?} not found", index, lookup);
                continue;
            };
            session.delete_courier(courier.id).await?;
            deleted.push(courier);
        }
        session.commit().await?;

        info!("Deleted {} couriers", deleted.len());
        Ok(deleted)
    }
}
