use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Id, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Id,
    pub phone_number: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub role_id: Option<Id>,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Courier {
    pub id: Id,
    pub phone_number: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub delivery_count: Option<i32>,
    pub salary: Option<f64>,
    pub role: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Flat user listing row with the role name joined in.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: Id,
    pub phone_number: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub role: Option<String>,
}

/// A user ready for insertion; `password` already holds hashed material.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub phone_number: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub password: String,
    pub role: Option<String>,
}

/// A courier ready for insertion; `password` already holds hashed material.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCourier {
    pub phone_number: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub delivery_count: Option<i32>,
    pub salary: Option<f64>,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub phone_number: String,
    pub password: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub role: Option<String>,
}

impl UserCreate {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            phone_number: self.phone_number,
            username: self.username,
            name: self.name,
            surname: self.surname,
            birthday: self.birthday,
            password: password_hash,
            role: self.role,
        }
    }
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<(), String> {
        if self.phone_number.is_empty() {
            return Err("phone_number is required".to_string());
        }
        if self.password.is_empty() {
            return Err("password is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourierCreate {
    pub phone_number: String,
    pub password: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub delivery_count: Option<i32>,
    pub salary: Option<f64>,
}

impl CourierCreate {
    pub fn into_new_courier(self, password_hash: String) -> NewCourier {
        NewCourier {
            phone_number: self.phone_number,
            username: self.username,
            name: self.name,
            surname: self.surname,
            birthday: self.birthday,
            delivery_count: self.delivery_count,
            salary: self.salary,
            password: password_hash,
        }
    }
}

impl Validate for CourierCreate {
    fn validate(&self) -> Result<(), String> {
        if self.phone_number.is_empty() {
            return Err("phone_number is required".to_string());
        }
        if self.password.is_empty() {
            return Err("password is required".to_string());
        }
        Ok(())
    }
}

/// Update payload for a user. The target is picked by `phone_number_old`,
/// then `id`, then `username`; the remaining fields are the patch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub id: Option<Id>,
    pub phone_number_old: Option<String>,
    pub phone_number_new: Option<String>,
    pub username: Option<String>,
    pub username_new: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub role: Option<String>,
}

/// Update payload for a courier. `phone_number` and `username` identify the
/// courier; `*_new` fields replace them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourierUpdate {
    pub id: Option<Id>,
    pub phone_number: Option<String>,
    pub username: Option<String>,
    pub phone_number_new: Option<String>,
    pub username_new: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub delivery_count: Option<i32>,
    pub salary: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDelete {
    pub id: Option<Id>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourierDelete {
    pub id: Option<Id>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub id_filter: Option<Id>,
    pub phone_filter: Option<String>,
    pub username_filter: Option<String>,
    pub name_filter: Option<String>,
    pub last_name_filter: Option<String>,
    pub birthday_filter_from: Option<NaiveDate>,
    pub birthday_filter_to: Option<NaiveDate>,
    pub role_filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourierFilter {
    pub id_filter: Option<Id>,
    pub phone_filter: Option<String>,
    pub username_filter: Option<String>,
    pub name_filter: Option<String>,
    pub last_name_filter: Option<String>,
    pub delivery_count_from: Option<i32>,
    pub delivery_count_to: Option<i32>,
    pub salary_from: Option<f64>,
    pub salary_to: Option<f64>,
    pub birthday_from: Option<NaiveDate>,
    pub birthday_to: Option<NaiveDate>,
}
