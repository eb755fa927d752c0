use chrono::Utc;
use log::{debug, info, warn};

use crate::logic::catalog_ops::{pending_status_id, resolve_name};
use crate::logic::error::{validate_all, ServiceError, ServiceResult};
use crate::logic::patch::{DeliveryRequestPatch, Patch};
use crate::logic::query::QueryComposer;
use crate::logic::sync::{resolve_thrash_names, sync_links};
use crate::model::{
    non_empty, CatalogKind, DeliveryRequest, DeliveryRequestCreate, DeliveryRequestDelete,
    DeliveryRequestFilter, DeliveryRequestRow, DeliveryRequestUpdate, Id, LinkTable,
    NewDeliveryRequest, PersonLookup,
};
use crate::store::{Session, Store};

pub struct DeliveryOperations;

impl DeliveryOperations {
    /// Creates requests in the pending status. At least one of the user or
    /// courier phones has to resolve; unknown trash type names are skipped.
    pub async fn create<S: Store>(
        store: &S,
        items: Vec<DeliveryRequestCreate>,
    ) -> ServiceResult<Vec<DeliveryRequest>> {
        validate_all(&items)?;

        let mut session = store.begin().await?;
        let status_id = pending_status_id(&mut session).await?;
        let mut created = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let user_id = Self::user_by_phone(&mut session, non_empty(&item.user_phone)).await?;
            let courier_id =
                Self::courier_by_phone(&mut session, non_empty(&item.courier_phone)).await?;
            if user_id.is_none() && courier_id.is_none() {
                warn!("Aborting delivery request create: item {} names no known person", index);
                return Err(ServiceError::Unresolved(format!(
                    "item {}: neither the user nor the courier phone resolves",
                    index
                )));
            }

            let request = NewDeliveryRequest {
                address: item.address.clone(),
                create_date: item.create_date.unwrap_or_else(Utc::now),
                price: item.price,
                courier_id,
                user_id,
                status_id,
            };
            let id = session.insert_delivery_request(&request).await?;
            let thrash = resolve_thrash_names(&mut session, &item.thrash_types).await?;
            sync_links(&mut session, LinkTable::DeliveryThrash, id, &thrash).await?;
            created.push(Self::reload(&mut session, id).await?);
        }
        session.commit().await?;

        info!("Created {} delivery requests", created.len());
        Ok(created)
    }

    pub async fn list<S: Store>(
        store: &S,
        filter: &DeliveryRequestFilter,
    ) -> ServiceResult<Vec<DeliveryRequestRow>> {
        let mut session = store.begin().await?;
        let query = QueryComposer::delivery_requests(filter);
        Ok(session.list_delivery_requests(&query).await?)
    }

    /// References given by name or phone that do not resolve are left as
    /// stored.
    pub async fn update<S: Store>(
        store: &S,
        updates: Vec<DeliveryRequestUpdate>,
    ) -> ServiceResult<Vec<DeliveryRequest>> {
        let mut session = store.begin().await?;
        let mut updated = Vec::new();
        for (index, update) in updates.iter().enumerate() {
            let Some(id) = update.id_req else {
                debug!("Skipping delivery request update item {}: no id", index);
                continue;
            };
            let Some(request) = session.find_delivery_request(id).await? else {
                debug!("Skipping delivery request update item {}: {} not found", index, id);
                continue;
            };
            let status_id =
                resolve_name(&mut session, CatalogKind::Status, non_empty(&update.status)).await?;
            let courier_id =
                Self::courier_by_phone(&mut session, non_empty(&update.courier_phone)).await?;
            let user_id = Self::user_by_phone(&mut session, non_empty(&update.user_phone)).await?;

            let request = DeliveryRequestPatch::from_update(update, status_id, courier_id, user_id)
                .apply(request);
            session.save_delivery_request(&request).await?;
            updated.push(request);
        }
        session.commit().await?;

        Ok(updated)
    }

    pub async fn delete<S: Store>(
        store: &S,
        deletes: Vec<DeliveryRequestDelete>,
    ) -> ServiceResult<Vec<DeliveryRequest>> {
        let mut session = store.begin().await?;
        let mut deleted = Vec::new();
        for (index, delete) in deletes.iter().enumerate() {
            let Some(id) = delete.req_id else {
                warn!("Aborting delivery request delete: item {} carries no id", index);
                return Err(ServiceError::MissingIdentity { index });
            };
            let Some(request) = session.find_delivery_request(id).await? else {
                debug!("Skipping delivery request delete item {}: {} not found", index, id);
                continue;
            };
            session.delete_delivery_request(id).await?;
            deleted.push(request);
        }
        session.commit().await?;

        info!("Deleted {} delivery requests", deleted.len());
        Ok(deleted)
    }

    async fn user_by_phone<Sn: Session>(
        session: &mut Sn,
        phone: Option<&str>,
    ) -> anyhow::Result<Option<Id>> {
        let Some(phone) = phone else {
            return Ok(None);
        };
        let user = session
            .find_user(&PersonLookup::Phone(phone.to_string()))
            .await?;
        Ok(user.map(|user| user.id))
    }

    async fn courier_by_phone<Sn: Session>(
        session: &mut Sn,
        phone: Option<&str>,
    ) -> anyhow::Result<Option<Id>> {
        let Some(phone) = phone else {
            return Ok(None);
        };
        let courier = session
            .find_courier(&PersonLookup::Phone(phone.to_string()))
            .await?;
        Ok(courier.map(|courier| courier.id))
    }

    async fn reload<Sn: Session>(session: &mut Sn, id: Id) -> ServiceResult<DeliveryRequest> {
        session.find_delivery_request(id).await?.ok_or_else(|| {
            ServiceError::Storage(anyhow::anyhow!("delivery request {} vanished", id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::catalog_ops::CatalogOperations;
    use crate::logic::person_ops::{CourierOperations, UserOperations};
    use crate::model::{
        CatalogKey, CatalogQuery, NewCourier, NewUser, Status, ThrashType, PENDING_STATUS,
    };
    use crate::store::MemoryStore;

    const USER_PHONE: &str = "8 (900) 000-00-01";
    const COURIER_PHONE: &str = "8 (900) 100-00-01";

    async fn people(store: &MemoryStore) {
        UserOperations::create(
            store,
            vec![NewUser {
                phone_number: USER_PHONE.to_string(),
                username: Some("kate".to_string()),
                name: Some("Kate".to_string()),
                surname: None,
                birthday: None,
                password: "hashed".to_string(),
                role: None,
            }],
        )
        .await
        .unwrap();
        CourierOperations::create(
            store,
            vec![NewCourier {
                phone_number: COURIER_PHONE.to_string(),
                username: None,
                name: Some("Ivan".to_string()),
                surname: None,
                birthday: None,
                delivery_count: Some(0),
                salary: None,
                password: "hashed".to_string(),
            }],
        )
        .await
        .unwrap();
        CatalogOperations::create::<_, ThrashType>(store, vec!["plastic".to_string()])
            .await
            .unwrap();
    }

    fn request(user: Option<&str>, courier: Option<&str>) -> DeliveryRequestCreate {
        DeliveryRequestCreate {
            courier_phone: courier.map(str::to_string),
            user_phone: user.map(str::to_string),
            address: "Baumana 10".to_string(),
            create_date: None,
            price: Some(150.0),
            thrash_types: vec!["plastic".to_string(), "batteries".to_string()],
        }
    }

    #[tokio::test]
    async fn new_request_is_pending_and_found_by_courier_phone() {
        let store = MemoryStore::new();
        people(&store).await;

        let created =
            DeliveryOperations::create(&store, vec![request(Some(USER_PHONE), Some(COURIER_PHONE))])
                .await
                .unwrap();
        assert_eq!(created[0].thrash_types, vec!["plastic".to_string()]);
        assert!(created[0].user_id.is_some());
        assert!(created[0].courier_id.is_some());

        let rows = DeliveryOperations::list(
            &store,
            &DeliveryRequestFilter {
                courier_phone_number_filter: Some(COURIER_PHONE.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status.as_deref(), Some(PENDING_STATUS));
        assert_eq!(rows[0].user_username.as_deref(), Some("kate"));
    }

    #[tokio::test]
    async fn request_needs_a_known_person() {
        let store = MemoryStore::new();
        people(&store).await;
        let result =
            DeliveryOperations::create(&store, vec![request(Some("8 (000) 000-00-00"), None)]).await;
        assert!(matches!(result, Err(ServiceError::Unresolved(_))));
    }

    #[tokio::test]
    async fn update_changes_status_and_keeps_unresolved_references() {
        let store = MemoryStore::new();
        people(&store).await;
        CatalogOperations::create::<_, Status>(&store, vec!["done".to_string()])
            .await
            .unwrap();
        let created = DeliveryOperations::create(&store, vec![request(Some(USER_PHONE), None)])
            .await
            .unwrap();

        let update = DeliveryRequestUpdate {
            id_req: Some(created[0].id),
            status: Some("done".to_string()),
            courier_phone: Some("8 (000) 000-00-00".to_string()),
            price: Some(0.0),
            ..Default::default()
        };
        let updated = DeliveryOperations::update(&store, vec![update]).await.unwrap();
        assert_ne!(updated[0].status_id, created[0].status_id);
        assert_eq!(updated[0].courier_id, None);
        assert_eq!(updated[0].price, Some(0.0));
        assert_eq!(updated[0].address, "Baumana 10");
    }

    #[tokio::test]
    async fn assigned_status_cannot_be_deleted() {
        let store = MemoryStore::new();
        people(&store).await;
        DeliveryOperations::create(&store, vec![request(Some(USER_PHONE), None)])
            .await
            .unwrap();

        let result = CatalogOperations::delete::<_, Status>(
            &store,
            vec![CatalogKey {
                id: None,
                name: Some(PENDING_STATUS.to_string()),
            }],
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        let statuses: Vec<Status> = CatalogOperations::list(&store, &CatalogQuery::default())
            .await
            .unwrap();
        assert!(statuses.iter().any(|s| s.status_name == PENDING_STATUS));
    }

    #[tokio::test]
    async fn delete_without_id_aborts() {
        let store = MemoryStore::new();
        people(&store).await;
        let created = DeliveryOperations::create(&store, vec![request(Some(USER_PHONE), None)])
            .await
            .unwrap();

        let result = DeliveryOperations::delete(
            &store,
            vec![
                DeliveryRequestDelete {
                    req_id: Some(created[0].id),
                },
                DeliveryRequestDelete { req_id: None },
            ],
        )
        .await;
        assert!(matches!(result, Err(ServiceError::MissingIdentity { index: 1 })));

        let rows = DeliveryOperations::list(&store, &DeliveryRequestFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
