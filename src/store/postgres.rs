use std::collections::BTreeSet;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};

use crate::logic::query::{Join, ListQuery, Value};
use crate::model::{
    Achievement, CatalogKind, CatalogLookup, Courier, DeliveryRequest, DeliveryRequestRow, Id,
    LinkTable, MapPoint, NewCourier, NewDeliveryRequest, NewMapPoint, NewUser, PersonLookup, Point,
    PointThrashRow, User, UserAchievementLink, UserAchievementRow, UserRow,
};
use crate::store::traits::{Session, Store, UniqueViolation};

const USER_COLUMNS: &str = "id, phone_number, username, name, surname, birthday, role_id, password";

const COURIER_COLUMNS: &str =
    "id, phone_number, username, name, surname, birthday, delivery_count, salary, role, password";

const MAP_POINT_SELECT: &str = r#"
    SELECT p.id, p.title, p.address, p.phone_number, p.email, p.website, p.description,
           p.coord_x, p.coord_y, p.map_id,
           COALESCE(ARRAY_AGG(t.thrash_type ORDER BY t.thrash_type)
                    FILTER (WHERE t.thrash_type IS NOT NULL), '{}') AS accepted_thrash
    FROM map_points p
    LEFT JOIN point_thrash_links l ON l.map_point_id = p.id
    LEFT JOIN thrash_types t ON t.id = l.thrash_type_id
"#;

const DELIVERY_REQUEST_SELECT: &str = r#"
    SELECT d.id, d.address, d.create_date, d.price, d.courier_id, d.user_id, d.status_id,
           COALESCE(ARRAY_AGG(t.thrash_type ORDER BY t.thrash_type)
                    FILTER (WHERE t.thrash_type IS NOT NULL), '{}') AS thrash_types
    FROM delivery_requests d
    LEFT JOIN delivery_thrash_links l ON l.request_id = d.id
    LEFT JOIN thrash_types t ON t.id = l.thrash_type_id
    WHERE d.id = $1
    GROUP BY d.id
"#;

const POINT_THRASH_SELECT: &str = r#"
    SELECT p.id AS point_id, t.thrash_type, p.title, m.city, p.email, p.address,
           p.phone_number, p.website, p.description, p.coord_x, p.coord_y
    FROM map_points p
    LEFT JOIN point_thrash_links l ON l.map_point_id = p.id
    LEFT JOIN thrash_types t ON t.id = l.thrash_type_id
    LEFT JOIN maps m ON m.id = p.map_id
"#;

const DELIVERY_ROW_SELECT: &str = r#"
    SELECT d.id, d.address AS delivery_address, d.create_date, d.price,
           t.thrash_type,
           s.status_name AS status,
           c.name AS courier_name, c.surname AS courier_surname,
           c.phone_number AS courier_phone_number,
           u.name AS user_name, u.surname AS user_surname,
           u.phone_number AS user_phone_number, u.username AS user_username
    FROM delivery_requests d
    LEFT JOIN delivery_thrash_links l ON l.request_id = d.id
    LEFT JOIN thrash_types t ON t.id = l.thrash_type_id
    LEFT JOIN statuses s ON s.id = d.status_id
    LEFT JOIN couriers c ON c.id = d.courier_id
    LEFT JOIN users u ON u.id = d.user_id
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to open transaction")?;
        Ok(PgSession { tx })
    }
}

/// One Postgres transaction. sqlx rolls it back when dropped uncommitted.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

/// Unique violations surface as [`UniqueViolation`] so callers can report a
/// conflict; everything else keeps its context.
fn write_error(err: sqlx::Error, what: &'static str) -> anyhow::Error {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return UniqueViolation {
                    constraint: constraint.to_string(),
                }
                .into();
            }
        }
    }
    anyhow::Error::new(err).context(what)
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
    for (index, predicate) in query.predicates.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        builder.push(predicate.column.sql());
        builder.push(predicate.cmp.sql());
        match &predicate.value {
            Value::Int(v) => builder.push_bind(*v),
            Value::Float(v) => builder.push_bind(*v),
            Value::Text(v) => builder.push_bind(v.clone()),
            Value::Date(v) => builder.push_bind(*v),
            Value::Timestamp(v) => builder.push_bind(*v),
        };
    }
}

fn person_column(lookup: &PersonLookup) -> &'static str {
    match lookup {
        PersonLookup::Id(_) => "id",
        PersonLookup::Username(_) => "username",
        PersonLookup::Phone(_) => "phone_number",
    }
}

fn map_point_from_row(row: &PgRow) -> MapPoint {
    MapPoint {
        id: row.get("id"),
        title: row.get("title"),
        address: row.get("address"),
        phone_number: row.get("phone_number"),
        email: row.get("email"),
        website: row.get("website"),
        description: row.get("description"),
        coordinates: Point::new(row.get("coord_x"), row.get("coord_y")),
        map_id: row.get("map_id"),
        accepted_thrash: row.get("accepted_thrash"),
    }
}

#[async_trait::async_trait]
impl Session for PgSession {
    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit transaction")
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")
    }

    async fn find_catalog(
        &mut self,
        kind: CatalogKind,
        lookup: &CatalogLookup,
    ) -> Result<Option<(Id, String)>> {
        let column = match lookup {
            CatalogLookup::Id(_) => "id",
            CatalogLookup::Name(_) => kind.name_column(),
        };
        let sql = format!(
            "SELECT id, {} AS name FROM {} WHERE {} = $1",
            kind.name_column(),
            kind.table(),
            column
        );
        let query = sqlx::query(&sql);
        let query = match lookup {
            CatalogLookup::Id(id) => query.bind(*id),
            CatalogLookup::Name(name) => query.bind(name.as_str()),
        };
        let row = query
            .fetch_optional(&mut *self.tx)
            .await
            .with_context(|| format!("Failed to fetch {}", kind.label()))?;

        Ok(row.map(|row| (row.get("id"), row.get("name"))))
    }

    async fn list_catalog(
        &mut self,
        kind: CatalogKind,
        lookup: Option<&CatalogLookup>,
    ) -> Result<Vec<(Id, String)>> {
        if let Some(lookup) = lookup {
            return Ok(self.find_catalog(kind, lookup).await?.into_iter().collect());
        }
        let sql = format!(
            "SELECT id, {} AS name FROM {} ORDER BY id",
            kind.name_column(),
            kind.table()
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .with_context(|| format!("Failed to list {}", kind.table()))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("id"), row.get("name")))
            .collect())
    }

    async fn insert_catalog(&mut self, kind: CatalogKind, name: &str) -> Result<Id> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1) RETURNING id",
            kind.table(),
            kind.name_column()
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, "Failed to insert catalog entry"))?;

        Ok(row.get("id"))
    }

    async fn rename_catalog(&mut self, kind: CatalogKind, id: Id, name: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET {} = $2 WHERE id = $1",
            kind.table(),
            kind.name_column()
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(name)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, "Failed to rename catalog entry"))?;

        Ok(())
    }

    async fn delete_catalog(&mut self, kind: CatalogKind, id: Id) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .with_context(|| format!("Failed to delete {}", kind.label()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn status_in_use(&mut self, status_id: Id) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM delivery_requests WHERE status_id = $1) AS in_use",
        )
        .bind(status_id)
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to check status usage")?;

        Ok(row.get("in_use"))
    }

    async fn find_user(&mut self, lookup: &PersonLookup) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} = $1",
            USER_COLUMNS,
            person_column(lookup)
        );
        let query = sqlx::query_as::<_, User>(&sql);
        let query = match lookup {
            PersonLookup::Id(id) => query.bind(*id),
            PersonLookup::Username(value) | PersonLookup::Phone(value) => query.bind(value.as_str()),
        };
        query
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch user")
    }

    async fn insert_user(&mut self, user: &NewUser, role_id: Option<Id>) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (phone_number, username, name, surname, birthday, password, role_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.phone_number)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.surname)
            .bind(user.birthday)
            .bind(&user.password)
            .bind(role_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, "Failed to insert user"))
    }

    async fn save_user(&mut self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET phone_number = $2, username = $3, name = $4, surname = $5,
                birthday = $6, role_id = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.phone_number)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(user.birthday)
        .bind(user.role_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| write_error(e, "Failed to update user"))?;

        Ok(())
    }

    async fn delete_user(&mut self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&mut self, query: &ListQuery) -> Result<Vec<UserRow>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT u.id, u.phone_number, u.username, u.name, u.surname, u.birthday, \
             r.name AS role FROM users u LEFT JOIN roles r ON r.id = u.role_id",
        );
        push_filters(&mut builder, query);
        builder.push(" ORDER BY u.id");

        builder
            .build_query_as::<UserRow>()
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list users")
    }

    async fn find_courier(&mut self, lookup: &PersonLookup) -> Result<Option<Courier>> {
        let sql = format!(
            "SELECT {} FROM couriers WHERE {} = $1",
            COURIER_COLUMNS,
            person_column(lookup)
        );
        let query = sqlx::query_as::<_, Courier>(&sql);
        let query = match lookup {
            PersonLookup::Id(id) => query.bind(*id),
            PersonLookup::Username(value) | PersonLookup::Phone(value) => query.bind(value.as_str()),
        };
        query
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch courier")
    }

    async fn insert_courier(&mut self, courier: &NewCourier) -> Result<Courier> {
        let sql = format!(
            "INSERT INTO couriers (phone_number, username, name, surname, birthday, \
             delivery_count, salary, password) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            COURIER_COLUMNS
        );
        sqlx::query_as::<_, Courier>(&sql)
            .bind(&courier.phone_number)
            .bind(&courier.username)
            .bind(&courier.name)
            .bind(&courier.surname)
            .bind(courier.birthday)
            .bind(courier.delivery_count)
            .bind(courier.salary)
            .bind(&courier.password)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, "Failed to insert courier"))
    }

    async fn save_courier(&mut self, courier: &Courier) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE couriers
            SET phone_number = $2, username = $3, name = $4, surname = $5,
                birthday = $6, delivery_count = $7, salary = $8
            WHERE id = $1
            "#,
        )
        .bind(courier.id)
        .bind(&courier.phone_number)
        .bind(&courier.username)
        .bind(&courier.name)
        .bind(&courier.surname)
        .bind(courier.birthday)
        .bind(courier.delivery_count)
        .bind(courier.salary)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| write_error(e, "Failed to update courier"))?;

        Ok(())
    }

    async fn delete_courier(&mut self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM couriers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete courier")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_couriers(&mut self, query: &ListQuery) -> Result<Vec<Courier>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT c.id, c.phone_number, c.username, c.name, c.surname, c.birthday, \
             c.delivery_count, c.salary, c.role, c.password FROM couriers c",
        );
        push_filters(&mut builder, query);
        builder.push(" ORDER BY c.id");

        builder
            .build_query_as::<Courier>()
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list couriers")
    }

    async fn find_achievement(&mut self, lookup: &CatalogLookup) -> Result<Option<Achievement>> {
        let query = match lookup {
            CatalogLookup::Id(id) => {
                sqlx::query_as::<_, Achievement>(
                    "SELECT id, title, description FROM achievements WHERE id = $1",
                )
                .bind(*id)
            }
            CatalogLookup::Name(title) => {
                sqlx::query_as::<_, Achievement>(
                    "SELECT id, title, description FROM achievements WHERE title = $1",
                )
                .bind(title.as_str())
            }
        };
        query
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch achievement")
    }

    async fn list_achievements(&mut self) -> Result<Vec<Achievement>> {
        sqlx::query_as::<_, Achievement>("SELECT id, title, description FROM achievements ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list achievements")
    }

    async fn insert_achievement(
        &mut self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Achievement> {
        sqlx::query_as::<_, Achievement>(
            "INSERT INTO achievements (title, description) VALUES ($1, $2) \
             RETURNING id, title, description",
        )
        .bind(title)
        .bind(description)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| write_error(e, "Failed to insert achievement"))
    }

    async fn save_achievement(&mut self, achievement: &Achievement) -> Result<()> {
        sqlx::query("UPDATE achievements SET title = $2, description = $3 WHERE id = $1")
            .bind(achievement.id)
            .bind(&achievement.title)
            .bind(&achievement.description)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, "Failed to update achievement"))?;

        Ok(())
    }

    async fn delete_achievement(&mut self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM achievements WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete achievement")?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_achievement_link(
        &mut self,
        user_id: Id,
        achievement_id: Id,
    ) -> Result<Option<UserAchievementLink>> {
        sqlx::query_as::<_, UserAchievementLink>(
            r#"
            SELECT user_id, achievement_id, unlocked, unlock_date
            FROM user_achievement_links
            WHERE user_id = $1 AND achievement_id = $2
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch achievement link")
    }

    async fn save_achievement_link(&mut self, link: &UserAchievementLink) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_achievement_links
            SET unlocked = $3, unlock_date = $4
            WHERE user_id = $1 AND achievement_id = $2
            "#,
        )
        .bind(link.user_id)
        .bind(link.achievement_id)
        .bind(link.unlocked)
        .bind(link.unlock_date)
        .execute(&mut *self.tx)
        .await
        .context("Failed to update achievement link")?;

        Ok(())
    }

    async fn list_user_achievements(&mut self, user_id: Id) -> Result<Vec<UserAchievementRow>> {
        sqlx::query_as::<_, UserAchievementRow>(
            r#"
            SELECT a.id, a.title, a.description, l.unlock_date, l.unlocked
            FROM user_achievement_links l
            JOIN achievements a ON a.id = l.achievement_id
            WHERE l.user_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to list user achievements")
    }

    async fn add_link(&mut self, table: LinkTable, owner: Id, target: Id) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            table.table(),
            table.owner_column(),
            table.target_column()
        );
        sqlx::query(&sql)
            .bind(owner)
            .bind(target)
            .execute(&mut *self.tx)
            .await
            .with_context(|| format!("Failed to insert into {}", table.table()))?;

        Ok(())
    }

    async fn remove_link(&mut self, table: LinkTable, owner: Id, target: Id) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            table.table(),
            table.owner_column(),
            table.target_column()
        );
        sqlx::query(&sql)
            .bind(owner)
            .bind(target)
            .execute(&mut *self.tx)
            .await
            .with_context(|| format!("Failed to delete from {}", table.table()))?;

        Ok(())
    }

    async fn list_linked(&mut self, table: LinkTable, owner: Id) -> Result<BTreeSet<Id>> {
        let sql = format!(
            "SELECT {} AS target FROM {} WHERE {} = $1",
            table.target_column(),
            table.table(),
            table.owner_column()
        );
        let rows = sqlx::query(&sql)
            .bind(owner)
            .fetch_all(&mut *self.tx)
            .await
            .with_context(|| format!("Failed to read {}", table.table()))?;

        Ok(rows.iter().map(|row| row.get("target")).collect())
    }

    async fn find_map_point(&mut self, id: Id) -> Result<Option<MapPoint>> {
        let sql = format!("{} WHERE p.id = $1 GROUP BY p.id", MAP_POINT_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch map point")?;

        Ok(row.as_ref().map(map_point_from_row))
    }

    async fn insert_map_point(&mut self, point: &NewMapPoint) -> Result<Id> {
        let row = sqlx::query(
            r#"
            INSERT INTO map_points
                (title, address, phone_number, email, website, description, coord_x, coord_y, map_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&point.title)
        .bind(&point.address)
        .bind(&point.phone_number)
        .bind(&point.email)
        .bind(&point.website)
        .bind(&point.description)
        .bind(point.coordinates.x)
        .bind(point.coordinates.y)
        .bind(point.map_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| write_error(e, "Failed to insert map point"))?;

        Ok(row.get("id"))
    }

    async fn save_map_point(&mut self, point: &MapPoint) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE map_points
            SET title = $2, address = $3, phone_number = $4, email = $5, website = $6,
                description = $7, coord_x = $8, coord_y = $9, map_id = $10
            WHERE id = $1
            "#,
        )
        .bind(point.id)
        .bind(&point.title)
        .bind(&point.address)
        .bind(&point.phone_number)
        .bind(&point.email)
        .bind(&point.website)
        .bind(&point.description)
        .bind(point.coordinates.x)
        .bind(point.coordinates.y)
        .bind(point.map_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| write_error(e, "Failed to update map point"))?;

        Ok(())
    }

    async fn delete_map_point(&mut self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM map_points WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete map point")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_map_points(&mut self, query: &ListQuery) -> Result<Vec<MapPoint>> {
        let mut builder = QueryBuilder::<Postgres>::new(MAP_POINT_SELECT);
        if query.requires(Join::Map) {
            builder.push(" LEFT JOIN maps m ON m.id = p.map_id");
        }
        push_filters(&mut builder, query);
        builder.push(" GROUP BY p.id ORDER BY p.id");

        let rows = builder
            .build()
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list map points")?;

        Ok(rows.iter().map(map_point_from_row).collect())
    }

    async fn list_point_thrash(&mut self, query: &ListQuery) -> Result<Vec<PointThrashRow>> {
        let mut builder = QueryBuilder::<Postgres>::new(POINT_THRASH_SELECT);
        push_filters(&mut builder, query);
        builder.push(" ORDER BY p.id, t.thrash_type");

        let rows = builder
            .build()
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list point trash types")?;

        Ok(rows
            .iter()
            .map(|row| PointThrashRow {
                point_id: row.get("point_id"),
                thrash_type: row.get("thrash_type"),
                title: row.get("title"),
                city: row.get("city"),
                email: row.get("email"),
                address: row.get("address"),
                phone_number: row.get("phone_number"),
                website: row.get("website"),
                description: row.get("description"),
                coordinates: Point::new(row.get("coord_x"), row.get("coord_y")),
            })
            .collect())
    }

    async fn find_delivery_request(&mut self, id: Id) -> Result<Option<DeliveryRequest>> {
        let row = sqlx::query(DELIVERY_REQUEST_SELECT)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to fetch delivery request")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(DeliveryRequest {
            id: row.get("id"),
            address: row.get("address"),
            create_date: row.get("create_date"),
            price: row.get("price"),
            courier_id: row.get("courier_id"),
            user_id: row.get("user_id"),
            status_id: row.get("status_id"),
            thrash_types: row.get("thrash_types"),
        }))
    }

    async fn insert_delivery_request(&mut self, request: &NewDeliveryRequest) -> Result<Id> {
        let row = sqlx::query(
            r#"
            INSERT INTO delivery_requests (address, create_date, price, courier_id, user_id, status_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&request.address)
        .bind(request.create_date)
        .bind(request.price)
        .bind(request.courier_id)
        .bind(request.user_id)
        .bind(request.status_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| write_error(e, "Failed to insert delivery request"))?;

        Ok(row.get("id"))
    }

    async fn save_delivery_request(&mut self, request: &DeliveryRequest) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE delivery_requests
            SET address = $2, create_date = $3, price = $4, courier_id = $5,
                user_id = $6, status_id = $7
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(&request.address)
        .bind(request.create_date)
        .bind(request.price)
        .bind(request.courier_id)
        .bind(request.user_id)
        .bind(request.status_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| write_error(e, "Failed to update delivery request"))?;

        Ok(())
    }

    async fn delete_delivery_request(&mut self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM delivery_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete delivery request")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_delivery_requests(
        &mut self,
        query: &ListQuery,
    ) -> Result<Vec<DeliveryRequestRow>> {
        let mut builder = QueryBuilder::<Postgres>::new(DELIVERY_ROW_SELECT);
        push_filters(&mut builder, query);
        builder.push(" ORDER BY d.id, t.thrash_type");

        builder
            .build_query_as::<DeliveryRequestRow>()
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list delivery requests")
    }
}
