use serde::{Deserialize, Serialize};

use crate::model::{non_empty, CatalogLookup, Id, Validate};

/// The four entities that are nothing more than a unique name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CatalogKind {
    Role,
    Status,
    ThrashType,
    Map,
}

impl CatalogKind {
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Role => "roles",
            CatalogKind::Status => "statuses",
            CatalogKind::ThrashType => "thrash_types",
            CatalogKind::Map => "maps",
        }
    }

    pub fn name_column(&self) -> &'static str {
        match self {
            CatalogKind::Role => "name",
            CatalogKind::Status => "status_name",
            CatalogKind::ThrashType => "thrash_type",
            CatalogKind::Map => "city",
        }
    }

    pub fn unique_constraint(&self) -> &'static str {
        match self {
            CatalogKind::Role => "roles_name_key",
            CatalogKind::Status => "statuses_status_name_key",
            CatalogKind::ThrashType => "thrash_types_thrash_type_key",
            CatalogKind::Map => "maps_city_key",
        }
    }

    /// Singular label used in log lines and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Role => "role",
            CatalogKind::Status => "status",
            CatalogKind::ThrashType => "thrash_type",
            CatalogKind::Map => "map",
        }
    }
}

pub trait CatalogEntry: Serialize + Clone + Send + Sync + Unpin + 'static {
    const KIND: CatalogKind;

    fn from_parts(id: Id, name: String) -> Self;
    fn id(&self) -> Id;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: Id,
    pub status_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrashType {
    pub id: Id,
    pub thrash_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub id: Id,
    pub city: String,
}

impl CatalogEntry for Role {
    const KIND: CatalogKind = CatalogKind::Role;

    fn from_parts(id: Id, name: String) -> Self {
        Self { id, name }
    }
    fn id(&self) -> Id {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl CatalogEntry for Status {
    const KIND: CatalogKind = CatalogKind::Status;

    fn from_parts(id: Id, status_name: String) -> Self {
        Self { id, status_name }
    }
    fn id(&self) -> Id {
        self.id
    }
    fn name(&self) -> &str {
        &self.status_name
    }
}

impl CatalogEntry for ThrashType {
    const KIND: CatalogKind = CatalogKind::ThrashType;

    fn from_parts(id: Id, thrash_type: String) -> Self {
        Self { id, thrash_type }
    }
    fn id(&self) -> Id {
        self.id
    }
    fn name(&self) -> &str {
        &self.thrash_type
    }
}

impl CatalogEntry for Map {
    const KIND: CatalogKind = CatalogKind::Map;

    fn from_parts(id: Id, city: String) -> Self {
        Self { id, city }
    }
    fn id(&self) -> Id {
        self.id
    }
    fn name(&self) -> &str {
        &self.city
    }
}

/// Kind-agnostic rename command the pipeline works with.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRename {
    pub old_id: Option<Id>,
    pub old_name: Option<String>,
    pub new_name: String,
}

impl Validate for CatalogRename {
    fn validate(&self) -> Result<(), String> {
        if self.old_id.is_none() && non_empty(&self.old_name).is_none() {
            return Err("either the old id or the old name is required".to_string());
        }
        if self.new_name.is_empty() {
            return Err("new name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Kind-agnostic identity of a catalog row to delete.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogKey {
    pub id: Option<Id>,
    pub name: Option<String>,
}

/// Query-string filter shared by the catalog listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub id: Option<Id>,
    pub name: Option<String>,
}

impl CatalogQuery {
    /// Name wins over id, matching the lookup order used by mutations.
    pub fn lookup(&self) -> Option<CatalogLookup> {
        match (non_empty(&self.name), self.id) {
            (Some(name), _) => Some(CatalogLookup::Name(name.to_string())),
            (None, Some(id)) => Some(CatalogLookup::Id(id)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleCreate {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleUpdate {
    pub old_id: Option<Id>,
    pub old_name: Option<String>,
    pub new_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleDelete {
    pub id: Option<Id>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCreate {
    pub status_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub old_id: Option<Id>,
    pub old_status: Option<String>,
    pub new_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusDelete {
    pub id: Option<Id>,
    pub status_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrashTypeCreate {
    pub thrash_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrashTypeUpdate {
    pub old_id: Option<Id>,
    pub old_thrash_type: Option<String>,
    pub new_thrash_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrashTypeDelete {
    pub id: Option<Id>,
    pub thrash_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapCreate {
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapUpdate {
    pub old_id: Option<Id>,
    pub old_city: Option<String>,
    pub new_city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapDelete {
    pub id: Option<Id>,
    pub city: Option<String>,
}

impl From<RoleCreate> for String {
    fn from(value: RoleCreate) -> Self {
        value.name
    }
}

impl From<StatusCreate> for String {
    fn from(value: StatusCreate) -> Self {
        value.status_name
    }
}

impl From<ThrashTypeCreate> for String {
    fn from(value: ThrashTypeCreate) -> Self {
        value.thrash_type
    }
}

impl From<MapCreate> for String {
    fn from(value: MapCreate) -> Self {
        value.city
    }
}

impl From<RoleUpdate> for CatalogRename {
    fn from(value: RoleUpdate) -> Self {
        Self {
            old_id: value.old_id,
            old_name: value.old_name,
            new_name: value.new_name,
        }
    }
}

impl From<StatusUpdate> for CatalogRename {
    fn from(value: StatusUpdate) -> Self {
        Self {
            old_id: value.old_id,
            old_name: value.old_status,
            new_name: value.new_status,
        }
    }
}

impl From<ThrashTypeUpdate> for CatalogRename {
    fn from(value: ThrashTypeUpdate) -> Self {
        Self {
            old_id: value.old_id,
            old_name: value.old_thrash_type,
            new_name: value.new_thrash_type,
        }
    }
}

impl From<MapUpdate> for CatalogRename {
    fn from(value: MapUpdate) -> Self {
        Self {
            old_id: value.old_id,
            old_name: value.old_city,
            new_name: value.new_city,
        }
    }
}

impl From<RoleDelete> for CatalogKey {
    fn from(value: RoleDelete) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<StatusDelete> for CatalogKey {
    fn from(value: StatusDelete) -> Self {
        Self {
            id: value.id,
            name: value.status_name,
        }
    }
}

impl From<ThrashTypeDelete> for CatalogKey {
    fn from(value: ThrashTypeDelete) -> Self {
        Self {
            id: value.id,
            name: value.thrash_type,
        }
    }
}

impl From<MapDelete> for CatalogKey {
    fn from(value: MapDelete) -> Self {
        Self {
            id: value.id,
            name: value.city,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_requires_some_old_key() {
        let rename = CatalogRename::from(StatusUpdate {
            old_id: None,
            old_status: Some(String::new()),
            new_status: "done".to_string(),
        });
        assert!(rename.validate().is_err());

        let rename = CatalogRename::from(MapUpdate {
            old_id: Some(3),
            old_city: None,
            new_city: "Kazan".to_string(),
        });
        assert!(rename.validate().is_ok());
    }

    #[test]
    fn catalog_query_prefers_name() {
        let query = CatalogQuery {
            id: Some(1),
            name: Some("courier".to_string()),
        };
        assert_eq!(query.lookup(), Some(CatalogLookup::Name("courier".to_string())));
        assert_eq!(CatalogQuery::default().lookup(), None);
    }
}
