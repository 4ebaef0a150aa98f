use tracing::{info, warn};

use super::{RelationKind, RelationStore};
use crate::error::{AppError, AppResult};

fn reject_self_follow(kind: RelationKind, actor: i64, target: i64) -> AppResult<()> {
    if kind == RelationKind::Follow && actor == target {
        warn!(user_id = actor, "self subscription rejected");
        return Err(AppError::BadRequest("You cannot subscribe to yourself.".into()));
    }
    Ok(())
}

async fn ensure_target(store: &dyn RelationStore, kind: RelationKind, target: i64) -> AppResult<()> {
    if !store.target_exists(kind, target).await? {
        return Err(AppError::NotFound(kind.target_not_found().into()));
    }
    Ok(())
}

/// Creates the pair or fails with `Conflict` if it is already there.
pub async fn add(
    store: &dyn RelationStore,
    kind: RelationKind,
    actor: i64,
    target: i64,
) -> AppResult<()> {
    reject_self_follow(kind, actor, target)?;
    ensure_target(store, kind, target).await?;

    if store.contains(kind, actor, target).await? {
        warn!(?kind, actor, target, "relation already present");
        return Err(AppError::Conflict(kind.already_exists().into()));
    }
    // A concurrent add may win between the check and the insert.
    if !store.insert(kind, actor, target).await? {
        warn!(?kind, actor, target, "relation insert lost a race");
        return Err(AppError::Conflict(kind.already_exists().into()));
    }

    info!(?kind, actor, target, "relation added");
    Ok(())
}

/// Deletes the pair or fails with `BadRequest` if it does not exist.
pub async fn remove(
    store: &dyn RelationStore,
    kind: RelationKind,
    actor: i64,
    target: i64,
) -> AppResult<()> {
    reject_self_follow(kind, actor, target)?;
    ensure_target(store, kind, target).await?;

    if !store.delete(kind, actor, target).await? {
        warn!(?kind, actor, target, "relation missing");
        return Err(AppError::BadRequest(kind.missing().into()));
    }

    info!(?kind, actor, target, "relation removed");
    Ok(())
}
