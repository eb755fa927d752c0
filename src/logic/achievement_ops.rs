use chrono::Utc;
use log::{debug, info, warn};

use crate::logic::error::{validate_all, ServiceError, ServiceResult};
use crate::logic::identity::{achievement_delete_target, achievement_update_target};
use crate::logic::patch::{AchievementPatch, Patch};
use crate::logic::query::ListQuery;
use crate::logic::sync::{sync_user_achievements, SyncOutcome};
use crate::model::{
    non_empty, Achievement, AchievementCreate, AchievementDelete, AchievementQuery,
    AchievementUpdate, CatalogLookup, Id, PersonLookup, UserAchievementLink, UserAchievementRow,
    UserAchievementUpdate,
};
use crate::store::{Session, Store};

pub struct AchievementOperations;

impl AchievementOperations {
    pub async fn list<S: Store>(
        store: &S,
        query: &AchievementQuery,
    ) -> ServiceResult<Vec<Achievement>> {
        let mut session = store.begin().await?;
        match query.lookup() {
            Some(lookup) => Ok(session.find_achievement(&lookup).await?.into_iter().collect()),
            None => Ok(session.list_achievements().await?),
        }
    }

    /// Creates achievements, then backfills a locked link for every existing
    /// user before the single commit.
    pub async fn create<S: Store>(
        store: &S,
        items: Vec<AchievementCreate>,
    ) -> ServiceResult<Vec<Achievement>> {
        validate_all(&items)?;

        let mut session = store.begin().await?;
        let mut created = Vec::with_capacity(items.len());
        for item in &items {
            let lookup = CatalogLookup::Name(item.title.clone());
            if session.find_achievement(&lookup).await?.is_some() {
                warn!("Refusing to create achievement '{}': already exists", item.title);
                return Err(ServiceError::Conflict(format!("{} already exists", item.title)));
            }
            let achievement = session
                .insert_achievement(&item.title, non_empty(&item.description))
                .await?;
            created.push(achievement);
        }

        let users = session.list_users(&ListQuery::default()).await?;
        for user in &users {
            sync_user_achievements(&mut session, user.id).await?;
        }
        session.commit().await?;

        info!(
            "Created {} achievements, backfilled links for {} users",
            created.len(),
            users.len()
        );
        Ok(created)
    }

    pub async fn update<S: Store>(
        store: &S,
        updates: Vec<AchievementUpdate>,
    ) -> ServiceResult<Vec<Achievement>> {
        let mut session = store.begin().await?;
        let mut updated = Vec::new();
        for (index, update) in updates.iter().enumerate() {
            let Some(lookup) = achievement_update_target(update) else {
                debug!("Skipping achievement update item {}: no key", index);
                continue;
            };
            let Some(achievement) = session.find_achievement(&lookup).await? else {
                debug!("Skipping achievement update item {}: {:?} not found", index, lookup);
                continue;
            };
            let achievement = AchievementPatch::from(update).apply(achievement);
            session.save_achievement(&achievement).await?;
            updated.push(achievement);
        }
        session.commit().await?;

        Ok(updated)
    }

    /// Items without a key are skipped rather than aborting the call. Links
    /// that point at a deleted achievement are left in place.
    pub async fn delete<S: Store>(
        store: &S,
        deletes: Vec<AchievementDelete>,
    ) -> ServiceResult<Vec<Achievement>> {
        let mut session = store.begin().await?;
        let mut deleted = Vec::new();
        for (index, delete) in deletes.iter().enumerate() {
            let Some(lookup) = achievement_delete_target(delete) else {
                debug!("Skipping achievement delete item {}: no key", index);
                continue;
            };
            let Some(achievement) = session.find_achievement(&lookup).await? else {
                debug!("Skipping achievement delete item {}: {:?} not found", index, lookup);
                continue;
            };
            session.delete_achievement(achievement.id).await?;
            deleted.push(achievement);
        }
        session.commit().await?;

        info!("Deleted {} achievements", deleted.len());
        Ok(deleted)
    }

    pub async fn user_achievements<S: Store>(
        store: &S,
        user_id: Id,
    ) -> ServiceResult<Vec<UserAchievementRow>> {
        let mut session = store.begin().await?;
        Ok(session.list_user_achievements(user_id).await?)
    }

    /// Links the user to every achievement they are missing.
    pub async fn sync<S: Store>(store: &S, user_id: Id) -> ServiceResult<SyncOutcome> {
        let mut session = store.begin().await?;
        Self::require_user(&mut session, user_id).await?;
        let outcome = sync_user_achievements(&mut session, user_id).await?;
        if let SyncOutcome::Linked(ids) = &outcome {
            session.commit().await?;
            info!("Linked user {} to achievements {:?}", user_id, ids);
        }
        Ok(outcome)
    }

    /// Sets unlock state per link. Unknown links are skipped; an unlock with
    /// no date is stamped with the current time.
    pub async fn update_links<S: Store>(
        store: &S,
        updates: Vec<UserAchievementUpdate>,
    ) -> ServiceResult<Vec<UserAchievementLink>> {
        validate_all(&updates)?;

        let mut session = store.begin().await?;
        let mut updated = Vec::new();
        for update in &updates {
            let Some(mut link) = session
                .find_achievement_link(update.user_id, update.achievement_id)
                .await?
            else {
                debug!(
                    "Skipping unknown link user={} achievement={}",
                    update.user_id, update.achievement_id
                );
                continue;
            };
            link.unlocked = update.unlocked;
            link.unlock_date = match update.unlocked {
                true => Some(update.unlock_date.unwrap_or_else(Utc::now)),
                false => None,
            };
            session.save_achievement_link(&link).await?;
            updated.push(link);
        }
        session.commit().await?;

        Ok(updated)
    }

    async fn require_user<Sn: Session>(session: &mut Sn, user_id: Id) -> ServiceResult<()> {
        match session.find_user(&PersonLookup::Id(user_id)).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::Unresolved(format!("user {} does not exist", user_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::person_ops::UserOperations;
    use crate::model::{NewUser, UserDelete};
    use crate::store::MemoryStore;

    async fn seeded_user(store: &MemoryStore, phone: &str) -> Id {
        let user = NewUser {
            phone_number: phone.to_string(),
            username: None,
            name: None,
            surname: None,
            birthday: None,
            password: "hashed".to_string(),
            role: None,
        };
        UserOperations::create(store, vec![user]).await.unwrap()[0].id
    }

    fn achievement(title: &str) -> AchievementCreate {
        AchievementCreate {
            title: title.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn creating_achievements_backfills_existing_users() {
        let store = MemoryStore::new();
        let user_id = seeded_user(&store, "8 (900) 000-00-01").await;

        AchievementOperations::create(&store, vec![achievement("First pickup")])
            .await
            .unwrap();

        let rows = AchievementOperations::user_achievements(&store, user_id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].unlocked);
        assert_eq!(rows[0].unlock_date, None);
    }

    #[tokio::test]
    async fn new_users_start_with_every_achievement_locked() {
        let store = MemoryStore::new();
        AchievementOperations::create(&store, vec![achievement("A"), achievement("B")])
            .await
            .unwrap();
        let user_id = seeded_user(&store, "8 (900) 000-00-02").await;

        let rows = AchievementOperations::user_achievements(&store, user_id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| !row.unlocked));
    }

    #[tokio::test]
    async fn achievement_titles_stay_unique() {
        let store = MemoryStore::new();
        AchievementOperations::create(&store, vec![achievement("A"), achievement("B")])
            .await
            .unwrap();

        let duplicate =
            AchievementOperations::create(&store, vec![achievement("C"), achievement("A")]).await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

        let rename = AchievementUpdate {
            old_title: Some("B".to_string()),
            new_title: Some("A".to_string()),
            ..Default::default()
        };
        let renamed = AchievementOperations::update(&store, vec![rename]).await;
        assert!(matches!(renamed, Err(ServiceError::Conflict(_))));

        let titles: Vec<_> = AchievementOperations::list(&store, &AchievementQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn sync_twice_reports_up_to_date() {
        let store = MemoryStore::new();
        let user_id = seeded_user(&store, "8 (900) 000-00-03").await;

        // inserted straight through a session, so no backfill ran
        let mut session = store.begin().await.unwrap();
        let added = session.insert_achievement("Eco hero", None).await.unwrap();
        session.commit().await.unwrap();

        let first = AchievementOperations::sync(&store, user_id).await.unwrap();
        let second = AchievementOperations::sync(&store, user_id).await.unwrap();
        assert_eq!(first, SyncOutcome::Linked([added.id].into_iter().collect()));
        assert_eq!(second, SyncOutcome::UpToDate);
    }

    #[tokio::test]
    async fn sync_for_unknown_user_is_unresolved() {
        let store = MemoryStore::new();
        let result = AchievementOperations::sync(&store, 404).await;
        assert!(matches!(result, Err(ServiceError::Unresolved(_))));
    }

    #[tokio::test]
    async fn unlock_without_date_is_stamped() {
        let store = MemoryStore::new();
        let user_id = seeded_user(&store, "8 (900) 000-00-04").await;
        let created = AchievementOperations::create(&store, vec![achievement("Sorter")])
            .await
            .unwrap();

        let updated = AchievementOperations::update_links(
            &store,
            vec![UserAchievementUpdate {
                user_id,
                achievement_id: created[0].id,
                unlocked: true,
                unlock_date: None,
            }],
        )
        .await
        .unwrap();
        assert!(updated[0].unlocked);
        assert!(updated[0].unlock_date.is_some());
    }

    #[tokio::test]
    async fn deleting_an_achievement_keeps_links_but_deleting_a_user_drops_them() {
        let store = MemoryStore::new();
        let user_id = seeded_user(&store, "8 (900) 000-00-05").await;
        let created = AchievementOperations::create(&store, vec![achievement("Collector")])
            .await
            .unwrap();

        AchievementOperations::delete(
            &store,
            vec![
                AchievementDelete::default(),
                AchievementDelete {
                    id: Some(created[0].id),
                    title: None,
                },
            ],
        )
        .await
        .unwrap();

        let mut session = store.begin().await.unwrap();
        let link = session
            .find_achievement_link(user_id, created[0].id)
            .await
            .unwrap();
        assert!(link.is_some());
        drop(session);

        UserOperations::delete(
            &store,
            vec![UserDelete {
                id: Some(user_id),
                ..Default::default()
            }],
        )
        .await
        .unwrap();

        let mut session = store.begin().await.unwrap();
        let link = session
            .find_achievement_link(user_id, created[0].id)
            .await
            .unwrap();
        assert!(link.is_none());
    }
}
