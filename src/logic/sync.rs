//! Reconciles set-valued associations against a reference set using only the
//! `add_link`/`remove_link`/`list_linked` session primitives.

use std::collections::BTreeSet;

use anyhow::Result;
use log::debug;

use crate::model::{CatalogKind, CatalogLookup, Id, LinkTable};
use crate::store::Session;

/// Result of an additive sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// These targets were linked by this call.
    Linked(BTreeSet<Id>),
    /// Every reference target was already linked; nothing was written.
    UpToDate,
}

impl SyncOutcome {
    pub fn linked(&self) -> BTreeSet<Id> {
        match self {
            SyncOutcome::Linked(ids) => ids.clone(),
            SyncOutcome::UpToDate => BTreeSet::new(),
        }
    }
}

pub fn missing_links(reference: &BTreeSet<Id>, existing: &BTreeSet<Id>) -> BTreeSet<Id> {
    reference.difference(existing).copied().collect()
}

/// Links every reference target the owner is not linked to yet. Existing
/// links outside the reference set are kept.
pub async fn sync_links<Sn: Session>(
    session: &mut Sn,
    table: LinkTable,
    owner: Id,
    reference: &BTreeSet<Id>,
) -> Result<SyncOutcome> {
    let existing = session.list_linked(table, owner).await?;
    let missing = missing_links(reference, &existing);
    if missing.is_empty() {
        return Ok(SyncOutcome::UpToDate);
    }
    for target in &missing {
        session.add_link(table, owner, *target).await?;
    }
    Ok(SyncOutcome::Linked(missing))
}

/// Makes the owner's links equal `target`, touching only the difference.
pub async fn replace_links<Sn: Session>(
    session: &mut Sn,
    table: LinkTable,
    owner: Id,
    target: &BTreeSet<Id>,
) -> Result<()> {
    let existing = session.list_linked(table, owner).await?;
    for stale in existing.difference(target) {
        session.remove_link(table, owner, *stale).await?;
    }
    for fresh in target.difference(&existing) {
        session.add_link(table, owner, *fresh).await?;
    }
    Ok(())
}

/// Gives a user a locked link to every achievement they are missing.
pub async fn sync_user_achievements<Sn: Session>(
    session: &mut Sn,
    user_id: Id,
) -> Result<SyncOutcome> {
    let reference: BTreeSet<Id> = session
        .list_achievements()
        .await?
        .into_iter()
        .map(|achievement| achievement.id)
        .collect();
    sync_links(session, LinkTable::UserAchievement, user_id, &reference).await
}

/// Resolves each trash type name on its own; names that do not resolve are
/// dropped.
pub async fn resolve_thrash_names<Sn: Session>(
    session: &mut Sn,
    names: &[String],
) -> Result<BTreeSet<Id>> {
    let mut ids = BTreeSet::new();
    for name in names.iter().filter(|name| !name.is_empty()) {
        let lookup = CatalogLookup::Name(name.clone());
        match session.find_catalog(CatalogKind::ThrashType, &lookup).await? {
            Some((id, _)) => {
                ids.insert(id);
            }
            None => debug!("Skipping unknown thrash type '{}'", name),
        }
    }
    Ok(ids)
}
