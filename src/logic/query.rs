//! Builds filtered read queries from optional-field filter objects.
//!
//! A composed [`ListQuery`] is backend-neutral: the Postgres store renders it
//! into SQL with `QueryBuilder`, the in-memory store evaluates it against rows
//! through [`Projection`].

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::logic::identity::person_lookup;
use crate::model::{
    non_empty, Courier, CourierFilter, DeliveryRequestFilter, DeliveryRequestRow, Id, MapPoint,
    MapPointFilter, PersonLookup, Point, PointThrashFilter, PointThrashRow, UserFilter, UserRow,
};

/// Comparison used for the "to" end of every range filter.
///
/// The legacy service compared birthday, delivery count and salary upper
/// bounds with `>=`; switching this to [`Cmp::Ge`] restores that behavior.
pub const RANGE_UPPER_BOUND: Cmp = Cmp::Le;

/// Comparison used for the "from" end of every range filter.
pub const RANGE_LOWER_BOUND: Cmp = Cmp::Ge;

/// Every column a filter can target, qualified by the alias used in all
/// listing queries (`u` users, `r` roles, `c` couriers, `p` map points,
/// `m` maps, `t` trash types, `s` statuses, `d` delivery requests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    UserName,
    UserSurname,
    UserPhone,
    UserUsername,
    UserBirthday,
    RoleName,
    CourierName,
    CourierSurname,
    CourierPhone,
    CourierBirthday,
    CourierDeliveryCount,
    CourierSalary,
    PointId,
    PointTitle,
    PointAddress,
    PointPhone,
    PointEmail,
    PointWebsite,
    PointX,
    PointY,
    MapCity,
    ThrashTypeName,
    StatusName,
    RequestId,
    RequestAddress,
    RequestCreateDate,
}

impl Column {
    pub fn sql(&self) -> &'static str {
        match self {
            Column::UserName => "u.name",
            Column::UserSurname => "u.surname",
            Column::UserPhone => "u.phone_number",
            Column::UserUsername => "u.username",
            Column::UserBirthday => "u.birthday",
            Column::RoleName => "r.name",
            Column::CourierName => "c.name",
            Column::CourierSurname => "c.surname",
            Column::CourierPhone => "c.phone_number",
            Column::CourierBirthday => "c.birthday",
            Column::CourierDeliveryCount => "c.delivery_count",
            Column::CourierSalary => "c.salary",
            Column::PointId => "p.id",
            Column::PointTitle => "p.title",
            Column::PointAddress => "p.address",
            Column::PointPhone => "p.phone_number",
            Column::PointEmail => "p.email",
            Column::PointWebsite => "p.website",
            Column::PointX => "p.coord_x",
            Column::PointY => "p.coord_y",
            Column::MapCity => "m.city",
            Column::ThrashTypeName => "t.thrash_type",
            Column::StatusName => "s.status_name",
            Column::RequestId => "d.id",
            Column::RequestAddress => "d.address",
            Column::RequestCreateDate => "d.create_date",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Value {
    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => f64::from(*a).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&f64::from(*b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ge,
    Le,
}

impl Cmp {
    pub fn sql(&self) -> &'static str {
        match self {
            Cmp::Eq => " = ",
            Cmp::Ge => " >= ",
            Cmp::Le => " <= ",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Cmp::Eq => ordering == Ordering::Equal,
            Cmp::Ge => ordering != Ordering::Less,
            Cmp::Le => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: Column,
    pub cmp: Cmp,
    pub value: Value,
}

impl Predicate {
    /// SQL semantics: a missing (NULL) value never matches.
    pub fn matches(&self, actual: Option<Value>) -> bool {
        actual
            .and_then(|actual| actual.compare(&self.value))
            .map(|ordering| self.cmp.holds(ordering))
            .unwrap_or(false)
    }
}

/// Optional joins a listing pulls in only when a predicate needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Join {
    Map,
}

/// Conjunction of predicates plus the optional joins they require.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub joins: BTreeSet<Join>,
    pub predicates: Vec<Predicate>,
}

impl ListQuery {
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn requires(&self, join: Join) -> bool {
        self.joins.contains(&join)
    }

    fn push(&mut self, column: Column, cmp: Cmp, value: Value) {
        self.predicates.push(Predicate { column, cmp, value });
    }

    fn text(&mut self, column: Column, value: &Option<String>) -> &mut Self {
        if let Some(value) = non_empty(value) {
            self.push(column, Cmp::Eq, value.into());
        }
        self
    }

    fn exact<V: Into<Value>>(&mut self, column: Column, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(column, Cmp::Eq, value.into());
        }
        self
    }

    fn range<V: Into<Value>>(&mut self, column: Column, from: Option<V>, to: Option<V>) -> &mut Self {
        if let Some(from) = from {
            self.push(column, RANGE_LOWER_BOUND, from.into());
        }
        if let Some(to) = to {
            self.push(column, RANGE_UPPER_BOUND, to.into());
        }
        self
    }

    fn coordinates(&mut self, value: Option<Point>) -> &mut Self {
        if let Some(point) = value {
            self.push(Column::PointX, Cmp::Eq, point.x.into());
            self.push(Column::PointY, Cmp::Eq, point.y.into());
        }
        self
    }

    fn join(&mut self, join: Join) -> &mut Self {
        self.joins.insert(join);
        self
    }

    pub fn matches<R: Projection>(&self, row: &R) -> bool {
        self.matches_with(|column| row.project(column))
    }

    pub fn matches_with<F>(&self, lookup: F) -> bool
    where
        F: Fn(Column) -> Option<Value>,
    {
        self.predicates
            .iter()
            .all(|predicate| predicate.matches(lookup(predicate.column)))
    }
}

/// Column access for rows evaluated outside the database.
pub trait Projection {
    fn project(&self, column: Column) -> Option<Value>;
}

impl Projection for UserRow {
    fn project(&self, column: Column) -> Option<Value> {
        match column {
            Column::UserName => self.name.clone().map(Value::from),
            Column::UserSurname => self.surname.clone().map(Value::from),
            Column::UserPhone => Some(self.phone_number.clone().into()),
            Column::UserUsername => self.username.clone().map(Value::from),
            Column::UserBirthday => self.birthday.map(Value::from),
            Column::RoleName => self.role.clone().map(Value::from),
            _ => None,
        }
    }
}

impl Projection for Courier {
    fn project(&self, column: Column) -> Option<Value> {
        match column {
            Column::CourierName => self.name.clone().map(Value::from),
            Column::CourierSurname => self.surname.clone().map(Value::from),
            Column::CourierPhone => Some(self.phone_number.clone().into()),
            Column::CourierBirthday => self.birthday.map(Value::from),
            Column::CourierDeliveryCount => self.delivery_count.map(Value::from),
            Column::CourierSalary => self.salary.map(Value::from),
            _ => None,
        }
    }
}

impl Projection for MapPoint {
    fn project(&self, column: Column) -> Option<Value> {
        match column {
            Column::PointId => Some(self.id.into()),
            Column::PointTitle => Some(self.title.clone().into()),
            Column::PointAddress => Some(self.address.clone().into()),
            Column::PointPhone => self.phone_number.clone().map(Value::from),
            Column::PointEmail => self.email.clone().map(Value::from),
            Column::PointWebsite => self.website.clone().map(Value::from),
            Column::PointX => Some(self.coordinates.x.into()),
            Column::PointY => Some(self.coordinates.y.into()),
            _ => None,
        }
    }
}

impl Projection for PointThrashRow {
    fn project(&self, column: Column) -> Option<Value> {
        match column {
            Column::PointId => Some(self.point_id.into()),
            Column::ThrashTypeName => self.thrash_type.clone().map(Value::from),
            Column::PointTitle => Some(self.title.clone().into()),
            Column::MapCity => self.city.clone().map(Value::from),
            Column::PointEmail => self.email.clone().map(Value::from),
            Column::PointAddress => Some(self.address.clone().into()),
            Column::PointPhone => self.phone_number.clone().map(Value::from),
            Column::PointWebsite => self.website.clone().map(Value::from),
            Column::PointX => Some(self.coordinates.x.into()),
            Column::PointY => Some(self.coordinates.y.into()),
            _ => None,
        }
    }
}

impl Projection for DeliveryRequestRow {
    fn project(&self, column: Column) -> Option<Value> {
        match column {
            Column::RequestId => Some(self.id.into()),
            Column::RequestAddress => Some(self.delivery_address.clone().into()),
            Column::RequestCreateDate => Some(self.create_date.into()),
            Column::ThrashTypeName => self.thrash_type.clone().map(Value::from),
            Column::StatusName => self.status.clone().map(Value::from),
            Column::CourierName => self.courier_name.clone().map(Value::from),
            Column::CourierSurname => self.courier_surname.clone().map(Value::from),
            Column::CourierPhone => self.courier_phone_number.clone().map(Value::from),
            Column::UserName => self.user_name.clone().map(Value::from),
            Column::UserSurname => self.user_surname.clone().map(Value::from),
            Column::UserPhone => self.user_phone_number.clone().map(Value::from),
            Column::UserUsername => self.user_username.clone().map(Value::from),
            _ => None,
        }
    }
}

/// Either a direct single-entity lookup or a filtered scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<K> {
    Direct(K),
    Scan(ListQuery),
}

pub struct QueryComposer;

impl QueryComposer {
    /// Any identity filter short-circuits to a direct lookup; the remaining
    /// filters are ignored in that case.
    pub fn users(filter: &UserFilter) -> Listing<PersonLookup> {
        if let Some(lookup) = person_lookup(
            filter.id_filter,
            non_empty(&filter.username_filter),
            non_empty(&filter.phone_filter),
        ) {
            return Listing::Direct(lookup);
        }

        let mut query = ListQuery::default();
        query
            .text(Column::UserName, &filter.name_filter)
            .text(Column::UserSurname, &filter.last_name_filter)
            .range(
                Column::UserBirthday,
                filter.birthday_filter_from,
                filter.birthday_filter_to,
            )
            .text(Column::RoleName, &filter.role_filter);
        Listing::Scan(query)
    }

    pub fn couriers(filter: &CourierFilter) -> Listing<PersonLookup> {
        if let Some(lookup) = person_lookup(
            filter.id_filter,
            non_empty(&filter.username_filter),
            non_empty(&filter.phone_filter),
        ) {
            return Listing::Direct(lookup);
        }

        let mut query = ListQuery::default();
        query
            .text(Column::CourierName, &filter.name_filter)
            .text(Column::CourierSurname, &filter.last_name_filter)
            .range(
                Column::CourierDeliveryCount,
                filter.delivery_count_from,
                filter.delivery_count_to,
            )
            .range(Column::CourierSalary, filter.salary_from, filter.salary_to)
            .range(Column::CourierBirthday, filter.birthday_from, filter.birthday_to);
        Listing::Scan(query)
    }

    pub fn map_points(filter: &MapPointFilter) -> Listing<Id> {
        if let Some(id) = filter.id_filter {
            return Listing::Direct(id);
        }

        let mut query = ListQuery::default();
        query
            .text(Column::PointPhone, &filter.phone_filter)
            .text(Column::PointEmail, &filter.email_filter)
            .text(Column::PointTitle, &filter.title_filter)
            .text(Column::PointWebsite, &filter.website_filter)
            .text(Column::PointAddress, &filter.address_filter)
            .coordinates(filter.coordinates_filter);
        if non_empty(&filter.city_map_filter).is_some() {
            query
                .join(Join::Map)
                .text(Column::MapCity, &filter.city_map_filter);
        }
        Listing::Scan(query)
    }

    /// Map points left-joined through trash types and maps; the join shape
    /// does not depend on which filters are set.
    pub fn point_thrash(filter: &PointThrashFilter) -> ListQuery {
        let mut query = ListQuery::default();
        query
            .exact(Column::PointId, filter.point_id_filter)
            .text(Column::ThrashTypeName, &filter.thrash_type_filter)
            .text(Column::PointTitle, &filter.title_filter)
            .text(Column::PointPhone, &filter.phone_number_filter)
            .text(Column::PointEmail, &filter.email_filter)
            .text(Column::PointAddress, &filter.address_filter)
            .coordinates(filter.coordinates_filter)
            .text(Column::PointWebsite, &filter.website_filter)
            .text(Column::MapCity, &filter.city_filter);
        query
    }

    /// Delivery requests left-joined through trash types, statuses, couriers
    /// and users; the join shape does not depend on which filters are set.
    pub fn delivery_requests(filter: &DeliveryRequestFilter) -> ListQuery {
        let mut query = ListQuery::default();
        query
            .exact(Column::RequestId, filter.id_filter)
            .text(Column::RequestAddress, &filter.address_filter)
            .range(
                Column::RequestCreateDate,
                filter.create_date_from,
                filter.create_date_to,
            )
            .text(Column::ThrashTypeName, &filter.thrash_type_filter)
            .text(Column::StatusName, &filter.status_filter)
            .text(Column::CourierName, &filter.courier_name_filter)
            .text(Column::CourierSurname, &filter.courier_surname_filter)
            .text(Column::CourierPhone, &filter.courier_phone_number_filter)
            .text(Column::UserName, &filter.user_name_filter)
            .text(Column::UserSurname, &filter.user_surname_filter)
            .text(Column::UserUsername, &filter.user_username_filter)
            .text(Column::UserPhone, &filter.user_phone_number_filter);
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courier(delivery_count: i32, salary: f64) -> Courier {
        Courier {
            id: 1,
            phone_number: "8 (900) 000-00-01".to_string(),
            username: None,
            name: Some("Ivan".to_string()),
            surname: None,
            birthday: None,
            delivery_count: Some(delivery_count),
            salary: Some(salary),
            role: "courier".to_string(),
            password: String::new(),
        }
    }

    #[test]
    fn identity_filter_bypasses_other_filters() {
        let filter = UserFilter {
            username_filter: Some("kate".to_string()),
            phone_filter: Some("8 (900) 123-45-67".to_string()),
            name_filter: Some("Kate".to_string()),
            ..Default::default()
        };
        assert_eq!(
            QueryComposer::users(&filter),
            Listing::Direct(PersonLookup::Username("kate".to_string()))
        );
    }

    #[test]
    fn empty_identity_strings_fall_through_to_scan() {
        let filter = UserFilter {
            username_filter: Some(String::new()),
            role_filter: Some("basic_user".to_string()),
            ..Default::default()
        };
        let Listing::Scan(query) = QueryComposer::users(&filter) else {
            panic!("expected a scan");
        };
        assert_eq!(query.predicates.len(), 1);
        assert_eq!(query.predicates[0].column, Column::RoleName);
    }

    #[test]
    fn range_upper_bound_is_inclusive_less_or_equal() {
        assert_eq!(RANGE_UPPER_BOUND, Cmp::Le);

        let filter = CourierFilter {
            delivery_count_from: Some(5),
            delivery_count_to: Some(10),
            ..Default::default()
        };
        let Listing::Scan(query) = QueryComposer::couriers(&filter) else {
            panic!("expected a scan");
        };
        assert!(query.matches(&courier(5, 0.0)));
        assert!(query.matches(&courier(10, 0.0)));
        assert!(!query.matches(&courier(11, 0.0)));
        assert!(!query.matches(&courier(4, 0.0)));
    }

    #[test]
    fn null_columns_never_match() {
        let filter = CourierFilter {
            salary_from: Some(100.0),
            ..Default::default()
        };
        let Listing::Scan(query) = QueryComposer::couriers(&filter) else {
            panic!("expected a scan");
        };
        let mut unpaid = courier(1, 0.0);
        unpaid.salary = None;
        assert!(!query.matches(&unpaid));
        assert!(query.matches(&courier(1, 150.0)));
    }

    #[test]
    fn map_join_only_when_city_is_filtered() {
        let plain = MapPointFilter {
            title_filter: Some("Recycling hub".to_string()),
            ..Default::default()
        };
        let Listing::Scan(query) = QueryComposer::map_points(&plain) else {
            panic!("expected a scan");
        };
        assert!(!query.requires(Join::Map));

        let by_city = MapPointFilter {
            city_map_filter: Some("Kazan".to_string()),
            ..Default::default()
        };
        let Listing::Scan(query) = QueryComposer::map_points(&by_city) else {
            panic!("expected a scan");
        };
        assert!(query.requires(Join::Map));
    }

    #[test]
    fn delivery_filter_by_courier_phone() {
        let filter = DeliveryRequestFilter {
            courier_phone_number_filter: Some("8 (900) 000-00-01".to_string()),
            ..Default::default()
        };
        let query = QueryComposer::delivery_requests(&filter);
        let row = DeliveryRequestRow {
            id: 7,
            delivery_address: "Lenina 1".to_string(),
            create_date: Utc::now(),
            price: None,
            thrash_type: None,
            status: Some("pending".to_string()),
            courier_name: None,
            courier_surname: None,
            courier_phone_number: Some("8 (900) 000-00-01".to_string()),
            user_name: None,
            user_surname: None,
            user_phone_number: None,
            user_username: None,
        };
        assert!(query.matches(&row));
        assert!(QueryComposer::delivery_requests(&DeliveryRequestFilter::default()).is_unfiltered());
    }
}
