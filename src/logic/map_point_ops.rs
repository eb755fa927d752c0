use log::{debug, info, warn};

use crate::logic::catalog_ops::resolve_name;
use crate::logic::error::{validate_all, ServiceError, ServiceResult};
use crate::logic::patch::{MapPointPatch, Patch};
use crate::logic::query::{Listing, QueryComposer};
use crate::logic::sync::{replace_links, resolve_thrash_names};
use crate::model::{
    non_empty, CatalogKind, Id, LinkTable, MapPoint, MapPointCreate, MapPointDelete,
    MapPointFilter, MapPointUpdate, PointThrashFilter, PointThrashRow,
};
use crate::store::{Session, Store};

pub struct MapPointOperations;

impl MapPointOperations {
    /// An unknown city leaves the point without a map and unknown trash
    /// type names are dropped; neither is an error.
    pub async fn create<S: Store>(
        store: &S,
        items: Vec<MapPointCreate>,
    ) -> ServiceResult<Vec<MapPoint>> {
        validate_all(&items)?;

        let mut session = store.begin().await?;
        let mut created = Vec::with_capacity(items.len());
        for item in &items {
            let map_id = resolve_name(&mut session, CatalogKind::Map, non_empty(&item.city)).await?;
            let id = session.insert_map_point(&item.to_new_point(map_id)).await?;
            let accepted = resolve_thrash_names(&mut session, &item.accepted_thrash).await?;
            replace_links(&mut session, LinkTable::PointThrash, id, &accepted).await?;
            created.push(Self::reload(&mut session, id).await?);
        }
        session.commit().await?;

        info!("Created {} map points", created.len());
        Ok(created)
    }

    pub async fn list<S: Store>(store: &S, filter: &MapPointFilter) -> ServiceResult<Vec<MapPoint>> {
        let mut session = store.begin().await?;
        match QueryComposer::map_points(filter) {
            Listing::Direct(id) => Ok(session.find_map_point(id).await?.into_iter().collect()),
            Listing::Scan(query) => Ok(session.list_map_points(&query).await?),
        }
    }

    /// Map points joined with each accepted trash type and their city.
    pub async fn point_thrash<S: Store>(
        store: &S,
        filter: &PointThrashFilter,
    ) -> ServiceResult<Vec<PointThrashRow>> {
        let mut session = store.begin().await?;
        let query = QueryComposer::point_thrash(filter);
        Ok(session.list_point_thrash(&query).await?)
    }

    /// A present `accepted_thrash` list replaces the accepted set wholesale.
    pub async fn update<S: Store>(
        store: &S,
        updates: Vec<MapPointUpdate>,
    ) -> ServiceResult<Vec<MapPoint>> {
        let mut session = store.begin().await?;
        let mut updated = Vec::new();
        for (index, update) in updates.iter().enumerate() {
            let Some(id) = update.id else {
                debug!("Skipping map point update item {}: no id", index);
                continue;
            };
            let Some(point) = session.find_map_point(id).await? else {
                debug!("Skipping map point update item {}: point {} not found", index, id);
                continue;
            };
            let map_id =
                resolve_name(&mut session, CatalogKind::Map, non_empty(&update.city)).await?;
            let point = MapPointPatch::from_update(update, map_id).apply(point);
            session.save_map_point(&point).await?;

            if let Some(names) = &update.accepted_thrash {
                let accepted = resolve_thrash_names(&mut session, names).await?;
                replace_links(&mut session, LinkTable::PointThrash, id, &accepted).await?;
            }
            updated.push(Self::reload(&mut session, id).await?);
        }
        session.commit().await?;

        Ok(updated)
    }

    pub async fn delete<S: Store>(
        store: &S,
        deletes: Vec<MapPointDelete>,
    ) -> ServiceResult<Vec<MapPoint>> {
        let mut session = store.begin().await?;
        let mut deleted = Vec::new();
        for (index, delete) in deletes.iter().enumerate() {
            let Some(id) = delete.id else {
                warn!("Aborting map point delete: item {} carries no id", index);
                return Err(ServiceError::MissingIdentity { index });
            };
            let Some(point) = session.find_map_point(id).await? else {
                debug!("Skipping map point delete item {}: point {} not found", index, id);
                continue;
            };
            session.delete_map_point(id).await?;
            deleted.push(point);
        }
        session.commit().await?;

        info!("Deleted {} map points", deleted.len());
        Ok(deleted)
    }

    async fn reload<Sn: Session>(session: &mut Sn, id: Id) -> ServiceResult<MapPoint> {
        session
            .find_map_point(id)
            .await?
            .ok_or_else(|| ServiceError::Storage(anyhow::anyhow!("map point {} vanished", id)))
    }
}
