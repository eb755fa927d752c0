use log::{debug, info, warn};

use crate::logic::error::{validate_all, ServiceError, ServiceResult};
use crate::logic::identity::{delete_target, rename_target};
use crate::model::{
    CatalogEntry, CatalogKey, CatalogKind, CatalogLookup, CatalogQuery, CatalogRename, Id,
    PENDING_STATUS,
};
use crate::store::{Session, Store};

/// Create/rename/delete pipeline shared by roles, statuses, trash types and
/// maps. Each call runs in one session and commits once at the end.
pub struct CatalogOperations;

impl CatalogOperations {
    pub async fn list<S: Store, E: CatalogEntry>(
        store: &S,
        query: &CatalogQuery,
    ) -> ServiceResult<Vec<E>> {
        let mut session = store.begin().await?;
        let lookup = query.lookup();
        let rows = session.list_catalog(E::KIND, lookup.as_ref()).await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| E::from_parts(id, name))
            .collect())
    }

    /// Creates every named entry. A name that already exists, in storage or
    /// earlier in the same batch, fails the whole call with a conflict.
    pub async fn create<S: Store, E: CatalogEntry>(
        store: &S,
        names: Vec<String>,
    ) -> ServiceResult<Vec<E>> {
        let kind = E::KIND;
        if let Some(index) = names.iter().position(|name| name.is_empty()) {
            return Err(ServiceError::Validation(format!(
                "item {}: {} name must not be empty",
                index,
                kind.label()
            )));
        }

        let mut session = store.begin().await?;
        let mut created = Vec::with_capacity(names.len());
        for name in names {
            let lookup = CatalogLookup::Name(name.clone());
            if session.find_catalog(kind, &lookup).await?.is_some() {
                warn!("Refusing to create {} '{}': already exists", kind.label(), name);
                return Err(ServiceError::Conflict(format!("{} already exists", name)));
            }
            let id = session.insert_catalog(kind, &name).await?;
            created.push(E::from_parts(id, name));
        }
        session.commit().await?;

        info!("Created {} {} entries", created.len(), kind.label());
        Ok(created)
    }

    /// Renames entries. Items whose target cannot be found are skipped.
    pub async fn rename<S: Store, E: CatalogEntry>(
        store: &S,
        renames: Vec<CatalogRename>,
    ) -> ServiceResult<Vec<E>> {
        validate_all(&renames)?;
        let kind = E::KIND;

        let mut session = store.begin().await?;
        let mut updated = Vec::new();
        for (index, rename) in renames.into_iter().enumerate() {
            let Some(lookup) = rename_target(&rename) else {
                debug!("Skipping {} update item {}: no key", kind.label(), index);
                continue;
            };
            let Some((id, _)) = session.find_catalog(kind, &lookup).await? else {
                debug!("Skipping {} update item {}: {:?} not found", kind.label(), index, lookup);
                continue;
            };
            session.rename_catalog(kind, id, &rename.new_name).await?;
            updated.push(E::from_parts(id, rename.new_name));
        }
        session.commit().await?;

        Ok(updated)
    }

    /// Deletes entries. An item with no key aborts the whole call before
    /// anything is committed; an item that matches nothing is skipped.
    pub async fn delete<S: Store, E: CatalogEntry>(
        store: &S,
        keys: Vec<CatalogKey>,
    ) -> ServiceResult<Vec<E>> {
        let kind = E::KIND;

        let mut session = store.begin().await?;
        let mut deleted = Vec::new();
        for (index, key) in keys.iter().enumerate() {
            let Some(lookup) = delete_target(key) else {
                warn!("Aborting {} delete: item {} carries no key", kind.label(), index);
                return Err(ServiceError::MissingIdentity { index });
            };
            let Some((id, name)) = session.find_catalog(kind, &lookup).await? else {
                debug!("Skipping {} delete item {}: {:?} not found", kind.label(), index, lookup);
                continue;
            };
            if kind == CatalogKind::Status && session.status_in_use(id).await? {
                warn!("Refusing to delete status '{}': still assigned", name);
                return Err(ServiceError::Conflict(format!(
                    "status '{}' is still assigned to delivery requests",
                    name
                )));
            }
            session.delete_catalog(kind, id).await?;
            deleted.push(E::from_parts(id, name));
        }
        session.commit().await?;

        info!("Deleted {} {} entries", deleted.len(), kind.label());
        Ok(deleted)
    }
}

/// Id of the named entry, if it exists. Empty names resolve to nothing.
pub async fn resolve_name<Sn: Session>(
    session: &mut Sn,
    kind: CatalogKind,
    name: Option<&str>,
) -> anyhow::Result<Option<Id>> {
    let Some(name) = name.filter(|name| !name.is_empty()) else {
        return Ok(None);
    };
    let found = session
        .find_catalog(kind, &CatalogLookup::Name(name.to_string()))
        .await?;
    if found.is_none() {
        debug!("No {} named '{}'", kind.label(), name);
    }
    Ok(found.map(|(id, _)| id))
}

/// Id of the status new delivery requests start in, created on first use.
pub async fn pending_status_id<Sn: Session>(session: &mut Sn) -> anyhow::Result<Id> {
    match resolve_name(session, CatalogKind::Status, Some(PENDING_STATUS)).await? {
        Some(id) => Ok(id),
        None => {
            info!("Creating missing '{}' status", PENDING_STATUS);
            session.insert_catalog(CatalogKind::Status, PENDING_STATUS).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Map, Role, Status, ThrashType};
    use crate::store::MemoryStore;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn duplicate_role_is_a_conflict_and_leaves_one_row() {
        let store = MemoryStore::new();
        CatalogOperations::create::<_, Role>(&store, names(&["courier"]))
            .await
            .unwrap();

        let second = CatalogOperations::create::<_, Role>(&store, names(&["courier"])).await;
        assert!(matches!(second, Err(ServiceError::Conflict(_))));

        let query = CatalogQuery {
            name: Some("courier".to_string()),
            ..Default::default()
        };
        let roles: Vec<Role> = CatalogOperations::list(&store, &query).await.unwrap();
        assert_eq!(roles.len(), 1);
    }

    async fn assert_unique_names<E: CatalogEntry>() {
        let label = E::KIND.label();
        let store = MemoryStore::new();
        CatalogOperations::create::<_, E>(&store, names(&["first", "second"]))
            .await
            .unwrap();

        let duplicate = CatalogOperations::create::<_, E>(&store, names(&["third", "first"])).await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))), "{}", label);

        let rename = CatalogRename {
            old_id: None,
            old_name: Some("second".to_string()),
            new_name: "first".to_string(),
        };
        let renamed = CatalogOperations::rename::<_, E>(&store, vec![rename]).await;
        assert!(matches!(renamed, Err(ServiceError::Conflict(_))), "{}", label);

        for (name, expected) in [("first", 1), ("second", 1), ("third", 0)] {
            let query = CatalogQuery {
                name: Some(name.to_string()),
                ..Default::default()
            };
            let rows: Vec<E> = CatalogOperations::list(&store, &query).await.unwrap();
            assert_eq!(rows.len(), expected, "{} {}", label, name);
        }
    }

    #[tokio::test]
    async fn every_catalog_rejects_duplicate_names() {
        assert_unique_names::<Role>().await;
        assert_unique_names::<Status>().await;
        assert_unique_names::<ThrashType>().await;
        assert_unique_names::<Map>().await;
    }

    #[tokio::test]
    async fn conflict_mid_batch_persists_nothing() {
        let store = MemoryStore::new();
        let result =
            CatalogOperations::create::<_, Map>(&store, names(&["Kazan", "Perm", "Kazan"])).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        let maps: Vec<Map> = CatalogOperations::list(&store, &CatalogQuery::default())
            .await
            .unwrap();
        assert!(maps.is_empty());
    }

    #[tokio::test]
    async fn rename_skips_unknown_targets() {
        let store = MemoryStore::new();
        CatalogOperations::create::<_, ThrashType>(&store, names(&["paper", "glass"]))
            .await
            .unwrap();

        let renames = vec![
            CatalogRename {
                old_id: None,
                old_name: Some("paper".to_string()),
                new_name: "cardboard".to_string(),
            },
            CatalogRename {
                old_id: None,
                old_name: Some("metal".to_string()),
                new_name: "steel".to_string(),
            },
        ];
        let updated: Vec<ThrashType> = CatalogOperations::rename(&store, renames).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].thrash_type, "cardboard");
    }

    #[tokio::test]
    async fn delete_with_missing_key_deletes_nothing() {
        let store = MemoryStore::new();
        CatalogOperations::create::<_, Map>(&store, names(&["Kazan", "Perm"]))
            .await
            .unwrap();

        let keys = vec![
            CatalogKey {
                id: None,
                name: Some("Kazan".to_string()),
            },
            CatalogKey::default(),
        ];
        let result = CatalogOperations::delete::<_, Map>(&store, keys).await;
        assert!(matches!(result, Err(ServiceError::MissingIdentity { index: 1 })));

        let maps: Vec<Map> = CatalogOperations::list(&store, &CatalogQuery::default())
            .await
            .unwrap();
        assert_eq!(maps.len(), 2);
    }

    #[tokio::test]
    async fn pending_status_is_created_once() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let first = pending_status_id(&mut session).await.unwrap();
        let second = pending_status_id(&mut session).await.unwrap();
        assert_eq!(first, second);
        session.commit().await.unwrap();

        let statuses: Vec<Status> = CatalogOperations::list(&store, &CatalogQuery::default())
            .await
            .unwrap();
        assert_eq!(statuses.len(), 1);
    }
}
