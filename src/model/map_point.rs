use serde::{Deserialize, Serialize};

use crate::model::{Id, Point, Validate};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub id: Id,
    pub title: String,
    pub address: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub coordinates: Point,
    pub map_id: Option<Id>,
    /// Names of the accepted trash types, read from the link table.
    pub accepted_thrash: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMapPoint {
    pub title: String,
    pub address: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub coordinates: Point,
    pub map_id: Option<Id>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapPointCreate {
    pub title: String,
    pub address: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub coordinates: Point,
    pub city: Option<String>,
    #[serde(default)]
    pub accepted_thrash: Vec<String>,
}

impl MapPointCreate {
    pub fn to_new_point(&self, map_id: Option<Id>) -> NewMapPoint {
        NewMapPoint {
            title: self.title.clone(),
            address: self.address.clone(),
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
            website: self.website.clone(),
            description: self.description.clone(),
            coordinates: self.coordinates,
            map_id,
        }
    }
}

impl Validate for MapPointCreate {
    fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() || self.address.is_empty() {
            return Err("title and address are required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapPointUpdate {
    pub id: Option<Id>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub coordinates: Option<Point>,
    pub city: Option<String>,
    /// When present the accepted set is replaced wholesale.
    pub accepted_thrash: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapPointDelete {
    pub id: Option<Id>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapPointFilter {
    pub id_filter: Option<Id>,
    pub title_filter: Option<String>,
    pub address_filter: Option<String>,
    pub phone_filter: Option<String>,
    pub email_filter: Option<String>,
    pub website_filter: Option<String>,
    pub coordinates_filter: Option<Point>,
    pub city_map_filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PointThrashFilter {
    pub point_id_filter: Option<Id>,
    pub thrash_type_filter: Option<String>,
    pub title_filter: Option<String>,
    pub city_filter: Option<String>,
    pub email_filter: Option<String>,
    pub address_filter: Option<String>,
    pub phone_number_filter: Option<String>,
    pub website_filter: Option<String>,
    pub coordinates_filter: Option<Point>,
}

/// One map point joined with one accepted trash type (or none) and its city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointThrashRow {
    pub point_id: Id,
    pub thrash_type: Option<String>,
    pub title: String,
    pub city: Option<String>,
    pub email: Option<String>,
    pub address: String,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub coordinates: Point,
}
