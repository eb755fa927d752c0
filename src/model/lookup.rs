use crate::model::Id;

/// A single natural-key lookup for users and couriers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonLookup {
    Id(Id),
    Username(String),
    Phone(String),
}

/// A single lookup for entities identified by id or by a unique name
/// (roles, statuses, trash types, maps, achievements).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLookup {
    Id(Id),
    Name(String),
}

/// Many-to-many tables, addressed as `(owner, target)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkTable {
    /// user -> achievement
    UserAchievement,
    /// map point -> trash type
    PointThrash,
    /// delivery request -> trash type
    DeliveryThrash,
}

impl LinkTable {
    pub fn table(&self) -> &'static str {
        match self {
            LinkTable::UserAchievement => "user_achievement_links",
            LinkTable::PointThrash => "point_thrash_links",
            LinkTable::DeliveryThrash => "delivery_thrash_links",
        }
    }

    pub fn owner_column(&self) -> &'static str {
        match self {
            LinkTable::UserAchievement => "user_id",
            LinkTable::PointThrash => "map_point_id",
            LinkTable::DeliveryThrash => "request_id",
        }
    }

    pub fn target_column(&self) -> &'static str {
        match self {
            LinkTable::UserAchievement => "achievement_id",
            LinkTable::PointThrash | LinkTable::DeliveryThrash => "thrash_type_id",
        }
    }
}
