use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

use ember_shared::clients::db::DbPool;
use ember_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{OverlayGrant, Permission, Role, User};
use crate::schema::{overlay_grants, permission_role, permissions, roles, users};

/// Source tag for permissions granted through the static role table.
pub const SOURCE_ROLE: &str = "role";

/// One entry of the resolved permission set, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    pub key: String,
    pub label: String,
    pub category: String,
    pub source: String,
    pub source_label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolvedPermissions {
    pub permissions: Vec<EffectivePermission>,
    /// Stable digest over the (key, source) pairs; clients compare it to
    /// decide whether a cached permission UI is stale.
    pub hash: String,
}

/// Union role grants with overlay grants. On a duplicate key the overlay
/// wins, so a Twitch-tier grant shows its own label instead of the role's.
/// Output is ordered by (category, key) for display grouping.
pub fn merge_grants(
    role_grants: Vec<EffectivePermission>,
    overlay_grants: Vec<EffectivePermission>,
) -> Vec<EffectivePermission> {
    let mut by_key: BTreeMap<String, EffectivePermission> = BTreeMap::new();
    for grant in role_grants {
        by_key.insert(grant.key.clone(), grant);
    }
    for grant in overlay_grants {
        by_key.insert(grant.key.clone(), grant);
    }

    let mut merged: Vec<EffectivePermission> = by_key.into_values().collect();
    merged.sort_by(|a, b| (a.category.as_str(), a.key.as_str()).cmp(&(b.category.as_str(), b.key.as_str())));
    merged
}

/// SHA-256 over the sorted `key:source` pairs, hex-encoded. Stable under
/// input permutation so it only changes when the effective set changes.
pub fn permission_hash(perms: &[EffectivePermission]) -> String {
    let mut pairs: Vec<String> = perms
        .iter()
        .map(|p| format!("{}:{}", p.key, p.source))
        .collect();
    pairs.sort();

    let mut hasher = Sha256::new();
    for pair in &pairs {
        hasher.update(pair.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Cache key for a user's resolved permission set.
pub fn cache_key(user_id: Uuid) -> String {
    format!("perm:{user_id}")
}

/// Resolve the effective permission set for a user: role-table grants merged
/// with the currently-valid overlay grants.
pub fn resolve(pool: &DbPool, user_id: Uuid) -> AppResult<ResolvedPermissions> {
    let mut conn = pool.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let (user, role): (User, Role) = users::table
        .inner_join(roles::table)
        .filter(users::id.eq(user_id))
        .first::<(User, Role)>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let role_perms: Vec<Permission> = permission_role::table
        .inner_join(permissions::table)
        .filter(permission_role::role_id.eq(user.role_id))
        .select(permissions::all_columns)
        .load::<Permission>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let now = Utc::now();
    let overlays: Vec<(OverlayGrant, Permission)> = overlay_grants::table
        .inner_join(permissions::table)
        .filter(overlay_grants::user_id.eq(user_id))
        .filter(overlay_grants::valid_from.le(now))
        .filter(overlay_grants::valid_until.gt(now))
        .load::<(OverlayGrant, Permission)>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let role_grants = role_perms
        .into_iter()
        .map(|p| EffectivePermission {
            key: p.key,
            label: p.label,
            category: p.category,
            source: SOURCE_ROLE.to_string(),
            source_label: role.name.clone(),
        })
        .collect();

    let overlay_grants = overlays
        .into_iter()
        .map(|(grant, p)| EffectivePermission {
            key: p.key,
            label: p.label,
            category: p.category,
            source: grant.source,
            source_label: grant.source_label,
        })
        .collect();

    let permissions = merge_grants(role_grants, overlay_grants);
    let hash = permission_hash(&permissions);

    Ok(ResolvedPermissions { permissions, hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(key: &str, category: &str, source: &str, source_label: &str) -> EffectivePermission {
        EffectivePermission {
            key: key.to_string(),
            label: key.to_string(),
            category: category.to_string(),
            source: source.to_string(),
            source_label: source_label.to_string(),
        }
    }

    #[test]
    fn overlay_wins_on_duplicate_key() {
        let merged = merge_grants(
            vec![perm("chat.emotes", "chat", SOURCE_ROLE, "member")],
            vec![perm("chat.emotes", "chat", "twitch", "Twitch Tier 2")],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, "twitch");
        assert_eq!(merged[0].source_label, "Twitch Tier 2");
    }

    #[test]
    fn ordered_by_category_then_key() {
        let merged = merge_grants(
            vec![
                perm("forum.post", "forum", SOURCE_ROLE, "member"),
                perm("chat.send", "chat", SOURCE_ROLE, "member"),
            ],
            vec![perm("chat.emotes", "chat", "twitch", "Twitch Tier 1")],
        );
        let keys: Vec<&str> = merged.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["chat.emotes", "chat.send", "forum.post"]);
    }

    #[test]
    fn hash_is_stable_under_permutation() {
        let a = vec![
            perm("forum.post", "forum", SOURCE_ROLE, "member"),
            perm("chat.send", "chat", SOURCE_ROLE, "member"),
        ];
        let b: Vec<_> = a.iter().rev().cloned().collect();
        assert_eq!(permission_hash(&a), permission_hash(&b));
    }

    #[test]
    fn hash_changes_with_source() {
        let from_role = vec![perm("chat.emotes", "chat", SOURCE_ROLE, "member")];
        let from_twitch = vec![perm("chat.emotes", "chat", "twitch", "Twitch Tier 1")];
        assert_ne!(permission_hash(&from_role), permission_hash(&from_twitch));
    }

    #[test]
    fn hash_ignores_label_changes() {
        let mut a = vec![perm("chat.emotes", "chat", "twitch", "Twitch Tier 1")];
        let hash_before = permission_hash(&a);
        a[0].source_label = "Twitch Tier 3".to_string();
        a[0].label = "renamed".to_string();
        assert_eq!(permission_hash(&a), hash_before);
    }
}
