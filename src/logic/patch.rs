//! Explicit partial updates. A patch carries only the fields an update
//! command actually supplied; applying it overwrites exactly those fields and
//! leaves everything else as stored.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{
    non_empty, Achievement, AchievementUpdate, Courier, CourierUpdate, DeliveryRequest,
    DeliveryRequestUpdate, Id, MapPoint, MapPointUpdate, Point, User, UserUpdate,
};

pub trait Patch<T> {
    fn apply(&self, target: T) -> T;
}

fn overwrite<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

fn overwrite_opt<T: Clone>(field: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *field = value.clone();
    }
}

fn text(value: &Option<String>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub phone_number: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub role_id: Option<Id>,
}

impl UserPatch {
    /// A new phone only applies when the old one was named, and a new
    /// username only when the current one was named.
    pub fn from_update(update: &UserUpdate, role_id: Option<Id>) -> Self {
        let phone_number = non_empty(&update.phone_number_old)
            .and_then(|_| text(&update.phone_number_new));
        let username = non_empty(&update.username).and_then(|_| text(&update.username_new));
        Self {
            phone_number,
            username,
            name: text(&update.name),
            surname: text(&update.surname),
            birthday: update.birthday,
            role_id,
        }
    }
}

impl Patch<User> for UserPatch {
    fn apply(&self, mut user: User) -> User {
        overwrite(&mut user.phone_number, &self.phone_number);
        overwrite_opt(&mut user.username, &self.username);
        overwrite_opt(&mut user.name, &self.name);
        overwrite_opt(&mut user.surname, &self.surname);
        overwrite_opt(&mut user.birthday, &self.birthday);
        overwrite_opt(&mut user.role_id, &self.role_id);
        user
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourierPatch {
    pub phone_number: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub delivery_count: Option<i32>,
    pub salary: Option<f64>,
}

impl From<&CourierUpdate> for CourierPatch {
    fn from(update: &CourierUpdate) -> Self {
        Self {
            phone_number: text(&update.phone_number_new),
            username: text(&update.username_new),
            name: text(&update.name),
            surname: text(&update.surname),
            birthday: update.birthday,
            delivery_count: update.delivery_count,
            salary: update.salary,
        }
    }
}

impl Patch<Courier> for CourierPatch {
    fn apply(&self, mut courier: Courier) -> Courier {
        overwrite(&mut courier.phone_number, &self.phone_number);
        overwrite_opt(&mut courier.username, &self.username);
        overwrite_opt(&mut courier.name, &self.name);
        overwrite_opt(&mut courier.surname, &self.surname);
        overwrite_opt(&mut courier.birthday, &self.birthday);
        overwrite_opt(&mut courier.delivery_count, &self.delivery_count);
        overwrite_opt(&mut courier.salary, &self.salary);
        courier
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapPointPatch {
    pub title: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub coordinates: Option<Point>,
    pub map_id: Option<Id>,
}

impl MapPointPatch {
    pub fn from_update(update: &MapPointUpdate, map_id: Option<Id>) -> Self {
        Self {
            title: text(&update.title),
            address: text(&update.address),
            phone_number: text(&update.phone_number),
            email: text(&update.email),
            website: text(&update.website),
            description: text(&update.description),
            coordinates: update.coordinates,
            map_id,
        }
    }
}

impl Patch<MapPoint> for MapPointPatch {
    fn apply(&self, mut point: MapPoint) -> MapPoint {
        overwrite(&mut point.title, &self.title);
        overwrite(&mut point.address, &self.address);
        overwrite_opt(&mut point.phone_number, &self.phone_number);
        overwrite_opt(&mut point.email, &self.email);
        overwrite_opt(&mut point.website, &self.website);
        overwrite_opt(&mut point.description, &self.description);
        overwrite(&mut point.coordinates, &self.coordinates);
        overwrite_opt(&mut point.map_id, &self.map_id);
        point
    }
}

/// References arrive already resolved; a name or phone that did not resolve
/// is simply absent here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryRequestPatch {
    pub address: Option<String>,
    pub create_date: Option<DateTime<Utc>>,
    pub status_id: Option<Id>,
    pub courier_id: Option<Id>,
    pub user_id: Option<Id>,
    pub price: Option<f64>,
}

impl DeliveryRequestPatch {
    pub fn from_update(
        update: &DeliveryRequestUpdate,
        status_id: Option<Id>,
        courier_id: Option<Id>,
        user_id: Option<Id>,
    ) -> Self {
        Self {
            address: text(&update.address),
            create_date: update.create_date,
            status_id,
            courier_id,
            user_id,
            price: update.price,
        }
    }
}

impl Patch<DeliveryRequest> for DeliveryRequestPatch {
    fn apply(&self, mut request: DeliveryRequest) -> DeliveryRequest {
        overwrite(&mut request.address, &self.address);
        overwrite(&mut request.create_date, &self.create_date);
        overwrite(&mut request.status_id, &self.status_id);
        overwrite_opt(&mut request.courier_id, &self.courier_id);
        overwrite_opt(&mut request.user_id, &self.user_id);
        overwrite_opt(&mut request.price, &self.price);
        request
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl From<&AchievementUpdate> for AchievementPatch {
    fn from(update: &AchievementUpdate) -> Self {
        Self {
            title: text(&update.new_title),
            description: text(&update.description),
        }
    }
}

impl Patch<Achievement> for AchievementPatch {
    fn apply(&self, mut achievement: Achievement) -> Achievement {
        overwrite(&mut achievement.title, &self.title);
        overwrite_opt(&mut achievement.description, &self.description);
        achievement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_user() -> User {
        User {
            id: 1,
            phone_number: "8 (900) 111-11-11".to_string(),
            username: Some("kate".to_string()),
            name: Some("Kate".to_string()),
            surname: Some("Ivanova".to_string()),
            birthday: None,
            role_id: Some(1),
            password: "hash".to_string(),
        }
    }

    #[test]
    fn absent_and_empty_fields_are_left_untouched() {
        let update = UserUpdate {
            id: Some(1),
            name: Some(String::new()),
            surname: Some("Petrova".to_string()),
            ..Default::default()
        };
        let patched = UserPatch::from_update(&update, None).apply(stored_user());
        assert_eq!(patched.name.as_deref(), Some("Kate"));
        assert_eq!(patched.surname.as_deref(), Some("Petrova"));
        assert_eq!(patched.role_id, Some(1));
        assert_eq!(patched.password, "hash");
    }

    #[test]
    fn new_phone_requires_old_phone() {
        let update = UserUpdate {
            id: Some(1),
            phone_number_new: Some("8 (900) 999-99-99".to_string()),
            ..Default::default()
        };
        let patched = UserPatch::from_update(&update, None).apply(stored_user());
        assert_eq!(patched.phone_number, "8 (900) 111-11-11");

        let update = UserUpdate {
            phone_number_old: Some("8 (900) 111-11-11".to_string()),
            ..update
        };
        let patched = UserPatch::from_update(&update, None).apply(stored_user());
        assert_eq!(patched.phone_number, "8 (900) 999-99-99");
    }

    #[test]
    fn achievement_description_survives_title_only_update() {
        let stored = Achievement {
            id: 3,
            title: "First pickup".to_string(),
            description: Some("Hand over your first bag".to_string()),
        };
        let update = AchievementUpdate {
            id: Some(3),
            new_title: Some("Rookie".to_string()),
            ..Default::default()
        };
        let patched = AchievementPatch::from(&update).apply(stored);
        assert_eq!(patched.title, "Rookie");
        assert_eq!(patched.description.as_deref(), Some("Hand over your first bag"));
    }
}
