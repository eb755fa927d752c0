//! Demo data, loaded through the regular mutation pipeline.

use anyhow::Result;
use chrono::NaiveDate;
use log::info;

use crate::auth::CredentialHasher;
use crate::logic::{
    AchievementOperations, CatalogOperations, CourierOperations, DeliveryOperations,
    MapPointOperations, UserOperations,
};
use crate::model::{
    AchievementCreate, CatalogQuery, DeliveryRequestCreate, Map, MapPointCreate, NewCourier,
    NewUser, Point, Role, Status, ThrashType,
};
use crate::store::Store;

const DEMO_USER_PHONE: &str = "8 (900) 123-45-67";
const DEMO_COURIER_PHONE: &str = "8 (900) 765-43-21";

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub async fn load_seed_data<S: Store>(store: &S, hasher: &dyn CredentialHasher) -> Result<()> {
    let seeded: Vec<ThrashType> = CatalogOperations::list(
        store,
        &CatalogQuery {
            id: None,
            name: Some("plastic".to_string()),
        },
    )
    .await?;
    if !seeded.is_empty() {
        info!("Seed data already present, skipping");
        return Ok(());
    }

    load_catalogs(store).await?;
    load_people(store, hasher).await?;
    load_achievements(store).await?;
    load_map_points(store).await?;
    load_delivery_requests(store).await?;

    info!("Seed data loaded");
    Ok(())
}

async fn load_catalogs<S: Store>(store: &S) -> Result<()> {
    CatalogOperations::create::<_, ThrashType>(
        store,
        names(&["plastic", "glass", "paper", "metal", "batteries"]),
    )
    .await?;
    CatalogOperations::create::<_, Status>(store, names(&["in_progress", "delivered"])).await?;
    CatalogOperations::create::<_, Role>(store, names(&["admin"])).await?;
    CatalogOperations::create::<_, Map>(store, names(&["Moscow", "Kazan"])).await?;
    Ok(())
}

async fn load_people<S: Store>(store: &S, hasher: &dyn CredentialHasher) -> Result<()> {
    UserOperations::create(
        store,
        vec![NewUser {
            phone_number: DEMO_USER_PHONE.to_string(),
            username: Some("eco_anna".to_string()),
            name: Some("Anna".to_string()),
            surname: Some("Petrova".to_string()),
            birthday: NaiveDate::from_ymd_opt(1998, 4, 12),
            password: hasher.hash("anna-demo")?,
            role: None,
        }],
    )
    .await?;

    CourierOperations::create(
        store,
        vec![NewCourier {
            phone_number: DEMO_COURIER_PHONE.to_string(),
            username: Some("ivan_courier".to_string()),
            name: Some("Ivan".to_string()),
            surname: Some("Sidorov".to_string()),
            birthday: NaiveDate::from_ymd_opt(1990, 11, 3),
            delivery_count: Some(0),
            salary: Some(45000.0),
            password: hasher.hash("ivan-demo")?,
        }],
    )
    .await?;
    Ok(())
}

async fn load_achievements<S: Store>(store: &S) -> Result<()> {
    AchievementOperations::create(
        store,
        vec![
            AchievementCreate {
                title: "First drop-off".to_string(),
                description: Some("Hand over recyclables for the first time".to_string()),
            },
            AchievementCreate {
                title: "Battery saver".to_string(),
                description: Some("Recycle batteries at a collection point".to_string()),
            },
        ],
    )
    .await?;
    Ok(())
}

async fn load_map_points<S: Store>(store: &S) -> Result<()> {
    MapPointOperations::create(
        store,
        vec![
            MapPointCreate {
                title: "Green Yard".to_string(),
                address: "Tverskaya 12".to_string(),
                phone_number: Some("8 (495) 000-11-22".to_string()),
                email: Some("yard@example.org".to_string()),
                website: None,
                description: Some("Sorted collection containers".to_string()),
                coordinates: Point::new(55.7652, 37.6050),
                city: Some("Moscow".to_string()),
                accepted_thrash: names(&["plastic", "glass", "paper"]),
            },
            MapPointCreate {
                title: "Kremlin Recycling".to_string(),
                address: "Baumana 5".to_string(),
                phone_number: None,
                email: None,
                website: Some("https://example.org/recycling".to_string()),
                description: None,
                coordinates: Point::new(55.7887, 49.1221),
                city: Some("Kazan".to_string()),
                accepted_thrash: names(&["batteries", "metal"]),
            },
        ],
    )
    .await?;
    Ok(())
}

async fn load_delivery_requests<S: Store>(store: &S) -> Result<()> {
    DeliveryOperations::create(
        store,
        vec![DeliveryRequestCreate {
            courier_phone: Some(DEMO_COURIER_PHONE.to_string()),
            user_phone: Some(DEMO_USER_PHONE.to_string()),
            address: "Arbat 24, apt 7".to_string(),
            create_date: None,
            price: Some(350.0),
            thrash_types: names(&["plastic", "paper"]),
        }],
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Argon2Hasher;
    use crate::logic::query::ListQuery;
    use crate::model::{DeliveryRequestFilter, MapPointFilter};
    use crate::store::{MemoryStore, Session};

    #[tokio::test]
    async fn seed_loads_once() {
        let store = MemoryStore::new();
        let hasher = Argon2Hasher::with_cost(1024, 1).unwrap();
        load_seed_data(&store, &hasher).await.unwrap();
        load_seed_data(&store, &hasher).await.unwrap();

        let points = MapPointOperations::list(&store, &MapPointFilter::default())
            .await
            .unwrap();
        assert_eq!(points.len(), 2);

        let requests = DeliveryOperations::list(&store, &DeliveryRequestFilter::default())
            .await
            .unwrap();
        // one row per requested trash type
        assert_eq!(requests.len(), 2);

        let mut session = store.begin().await.unwrap();
        let users = session.list_users(&ListQuery::default()).await.unwrap();
        assert_eq!(users.len(), 1);
        let rows = session.list_user_achievements(users[0].id).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
