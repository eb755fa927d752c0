use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Id, Validate};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRequest {
    pub id: Id,
    pub address: String,
    pub create_date: DateTime<Utc>,
    pub price: Option<f64>,
    pub courier_id: Option<Id>,
    pub user_id: Option<Id>,
    pub status_id: Id,
    /// Names of the requested trash types, read from the link table.
    pub thrash_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDeliveryRequest {
    pub address: String,
    pub create_date: DateTime<Utc>,
    pub price: Option<f64>,
    pub courier_id: Option<Id>,
    pub user_id: Option<Id>,
    pub status_id: Id,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryRequestCreate {
    pub courier_phone: Option<String>,
    pub user_phone: Option<String>,
    pub address: String,
    pub create_date: Option<DateTime<Utc>>,
    pub price: Option<f64>,
    #[serde(default)]
    pub thrash_types: Vec<String>,
}

impl Validate for DeliveryRequestCreate {
    fn validate(&self) -> Result<(), String> {
        if self.address.is_empty() {
            return Err("address is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryRequestUpdate {
    pub id_req: Option<Id>,
    pub address: Option<String>,
    pub create_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub courier_phone: Option<String>,
    pub user_phone: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryRequestDelete {
    pub req_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryRequestFilter {
    pub id_filter: Option<Id>,
    pub address_filter: Option<String>,
    pub create_date_from: Option<DateTime<Utc>>,
    pub create_date_to: Option<DateTime<Utc>>,
    pub thrash_type_filter: Option<String>,
    pub status_filter: Option<String>,
    pub courier_name_filter: Option<String>,
    pub courier_surname_filter: Option<String>,
    pub courier_phone_number_filter: Option<String>,
    pub user_phone_number_filter: Option<String>,
    pub user_surname_filter: Option<String>,
    pub user_name_filter: Option<String>,
    pub user_username_filter: Option<String>,
}

/// One delivery request joined with one trash type (or none), its status,
/// courier and user.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DeliveryRequestRow {
    pub id: Id,
    pub delivery_address: String,
    pub create_date: DateTime<Utc>,
    pub price: Option<f64>,
    pub thrash_type: Option<String>,
    pub status: Option<String>,
    pub courier_name: Option<String>,
    pub courier_surname: Option<String>,
    pub courier_phone_number: Option<String>,
    pub user_name: Option<String>,
    pub user_surname: Option<String>,
    pub user_phone_number: Option<String>,
    pub user_username: Option<String>,
}
