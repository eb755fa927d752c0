//! Picks the one lookup that identifies a mutation or listing target.
//!
//! Every resolver here is pure: it inspects which keys a command carries and
//! returns the lookup to perform, or `None` when the command carries no usable
//! key. Empty strings count as absent.

use crate::model::{
    non_empty, AchievementDelete, AchievementUpdate, CatalogKey, CatalogLookup, CatalogRename,
    CourierDelete, CourierUpdate, Id, PersonLookup, UserDelete, UserUpdate,
};

/// Person lookup order: id, then username, then phone. Exactly one lookup is
/// produced; there is no fallback when it finds nothing.
pub fn person_lookup(
    id: Option<Id>,
    username: Option<&str>,
    phone: Option<&str>,
) -> Option<PersonLookup> {
    let username = username.filter(|v| !v.is_empty());
    let phone = phone.filter(|v| !v.is_empty());
    match (id, username, phone) {
        (Some(id), _, _) => Some(PersonLookup::Id(id)),
        (None, Some(username), _) => Some(PersonLookup::Username(username.to_string())),
        (None, None, Some(phone)) => Some(PersonLookup::Phone(phone.to_string())),
        (None, None, None) => None,
    }
}

/// Catalog lookup order: the natural-key string wins over the numeric id.
pub fn catalog_lookup(id: Option<Id>, name: Option<&str>) -> Option<CatalogLookup> {
    match (name.filter(|v| !v.is_empty()), id) {
        (Some(name), _) => Some(CatalogLookup::Name(name.to_string())),
        (None, Some(id)) => Some(CatalogLookup::Id(id)),
        (None, None) => None,
    }
}

pub fn rename_target(rename: &CatalogRename) -> Option<CatalogLookup> {
    catalog_lookup(rename.old_id, non_empty(&rename.old_name))
}

pub fn delete_target(key: &CatalogKey) -> Option<CatalogLookup> {
    catalog_lookup(key.id, non_empty(&key.name))
}

pub fn achievement_update_target(update: &AchievementUpdate) -> Option<CatalogLookup> {
    catalog_lookup(update.id, non_empty(&update.old_title))
}

pub fn achievement_delete_target(delete: &AchievementDelete) -> Option<CatalogLookup> {
    catalog_lookup(delete.id, non_empty(&delete.title))
}

/// User update target: `phone_number_old`, then `id`, then `username`.
pub fn user_update_target(update: &UserUpdate) -> Option<PersonLookup> {
    if let Some(phone) = non_empty(&update.phone_number_old) {
        return Some(PersonLookup::Phone(phone.to_string()));
    }
    if let Some(id) = update.id {
        return Some(PersonLookup::Id(id));
    }
    non_empty(&update.username).map(|username| PersonLookup::Username(username.to_string()))
}

/// Courier update candidates in the order they are tried: id, phone, username.
/// Unlike the other resolvers the caller falls through to the next candidate
/// when a lookup finds nothing.
pub fn courier_update_targets(update: &CourierUpdate) -> Vec<PersonLookup> {
    let mut targets = Vec::new();
    if let Some(id) = update.id {
        targets.push(PersonLookup::Id(id));
    }
    if let Some(phone) = non_empty(&update.phone_number) {
        targets.push(PersonLookup::Phone(phone.to_string()));
    }
    if let Some(username) = non_empty(&update.username) {
        targets.push(PersonLookup::Username(username.to_string()));
    }
    targets
}

pub fn user_delete_target(delete: &UserDelete) -> Option<PersonLookup> {
    person_lookup(delete.id, non_empty(&delete.username), non_empty(&delete.phone))
}

pub fn courier_delete_target(delete: &CourierDelete) -> Option<PersonLookup> {
    person_lookup(delete.id, non_empty(&delete.username), non_empty(&delete.phone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_lookup_prefers_id_then_username() {
        assert_eq!(
            person_lookup(Some(4), Some("kate"), Some("8 (900) 111-11-11")),
            Some(PersonLookup::Id(4))
        );
        assert_eq!(
            person_lookup(None, Some("kate"), Some("8 (900) 111-11-11")),
            Some(PersonLookup::Username("kate".to_string()))
        );
        assert_eq!(
            person_lookup(None, Some(""), Some("8 (900) 111-11-11")),
            Some(PersonLookup::Phone("8 (900) 111-11-11".to_string()))
        );
        assert_eq!(person_lookup(None, None, Some("")), None);
    }

    #[test]
    fn catalog_rename_prefers_old_name_over_id() {
        let rename = CatalogRename {
            old_id: Some(2),
            old_name: Some("paper".to_string()),
            new_name: "cardboard".to_string(),
        };
        assert_eq!(
            rename_target(&rename),
            Some(CatalogLookup::Name("paper".to_string()))
        );

        let by_id = CatalogRename {
            old_name: None,
            ..rename
        };
        assert_eq!(rename_target(&by_id), Some(CatalogLookup::Id(2)));
    }

    #[test]
    fn user_update_prefers_old_phone() {
        let update = UserUpdate {
            id: Some(9),
            phone_number_old: Some("8 (900) 222-22-22".to_string()),
            username: Some("kate".to_string()),
            ..Default::default()
        };
        assert_eq!(
            user_update_target(&update),
            Some(PersonLookup::Phone("8 (900) 222-22-22".to_string()))
        );

        let update = UserUpdate {
            phone_number_old: None,
            ..update
        };
        assert_eq!(user_update_target(&update), Some(PersonLookup::Id(9)));
        assert_eq!(user_update_target(&UserUpdate::default()), None);
    }

    #[test]
    fn courier_update_lists_every_candidate() {
        let update = CourierUpdate {
            phone_number: Some("8 (900) 333-33-33".to_string()),
            username: Some("runner".to_string()),
            ..Default::default()
        };
        assert_eq!(
            courier_update_targets(&update),
            vec![
                PersonLookup::Phone("8 (900) 333-33-33".to_string()),
                PersonLookup::Username("runner".to_string()),
            ]
        );
        assert!(courier_update_targets(&CourierUpdate::default()).is_empty());
    }
}
