use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{non_empty, CatalogLookup, Id, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Achievement {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
}

/// Unlock state of one achievement for one user.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserAchievementLink {
    pub user_id: Id,
    pub achievement_id: Id,
    pub unlocked: bool,
    pub unlock_date: Option<DateTime<Utc>>,
}

impl UserAchievementLink {
    pub fn locked(user_id: Id, achievement_id: Id) -> Self {
        Self {
            user_id,
            achievement_id,
            unlocked: false,
            unlock_date: None,
        }
    }
}

/// An achievement as seen by one user.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserAchievementRow {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub unlock_date: Option<DateTime<Utc>>,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AchievementCreate {
    pub title: String,
    pub description: Option<String>,
}

impl Validate for AchievementCreate {
    fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() {
            return Err("title is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AchievementUpdate {
    pub id: Option<Id>,
    pub old_title: Option<String>,
    pub new_title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AchievementDelete {
    pub id: Option<Id>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserAchievementUpdate {
    pub user_id: Id,
    pub achievement_id: Id,
    #[serde(default)]
    pub unlocked: bool,
    pub unlock_date: Option<DateTime<Utc>>,
}

impl Validate for UserAchievementUpdate {
    fn validate(&self) -> Result<(), String> {
        if !self.unlocked && self.unlock_date.is_some() {
            return Err("unlock_date is only accepted for unlocked achievements".to_string());
        }
        Ok(())
    }
}

/// Listing filter for achievements; the id is checked before the title.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AchievementQuery {
    pub id: Option<Id>,
    pub title: Option<String>,
}

impl AchievementQuery {
    pub fn lookup(&self) -> Option<CatalogLookup> {
        match (self.id, non_empty(&self.title)) {
            (Some(id), _) => Some(CatalogLookup::Id(id)),
            (None, Some(title)) => Some(CatalogLookup::Name(title.to_string())),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Id,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_date_requires_unlocked() {
        let update = UserAchievementUpdate {
            user_id: 1,
            achievement_id: 2,
            unlocked: false,
            unlock_date: Some(Utc::now()),
        };
        assert!(update.validate().is_err());

        let update = UserAchievementUpdate {
            unlocked: true,
            ..update
        };
        assert!(update.validate().is_ok());
    }
}
