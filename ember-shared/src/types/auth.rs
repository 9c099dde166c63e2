use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known role levels. Roles live in the access database; the level is an
/// ordinal rank baked into the token so every service can gate on it without
/// a lookup. A user may only act on users/roles of strictly lower level.
pub mod role_level {
    pub const MEMBER: i32 = 10;
    pub const MODERATOR: i32 = 50;
    pub const ADMIN: i32 = 90;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    /// Role name at token issue time, for display/logging only.
    pub role: String,
    /// Ordinal role level used for authorization comparisons.
    pub level: i32,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, role: impl Into<String>, level: i32, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            role: role.into(),
            level,
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn is_staff(&self) -> bool {
        self.level >= role_level::MODERATOR
    }

    pub fn is_admin(&self) -> bool {
        self.level >= role_level::ADMIN
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
    pub level: i32,
    pub token_id: Uuid,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.level >= role_level::MODERATOR
    }

    /// Strict level gate: an actor may only touch targets of lower rank.
    pub fn outranks(&self, target_level: i32) -> bool {
        self.level > target_level
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            level: claims.level,
            token_id: claims.jti,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outranks_is_strict() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: "admin".into(),
            level: role_level::ADMIN,
            token_id: Uuid::new_v4(),
        };
        assert!(admin.outranks(role_level::MODERATOR));
        assert!(!admin.outranks(role_level::ADMIN));
        assert!(!admin.outranks(role_level::ADMIN + 1));
    }

    #[test]
    fn staff_threshold_includes_admin() {
        let claims = Claims::new(Uuid::new_v4(), "admin", role_level::ADMIN, 3600);
        assert!(claims.is_staff());
        assert!(claims.is_admin());

        let member = Claims::new(Uuid::new_v4(), "member", role_level::MEMBER, 3600);
        assert!(!member.is_staff());
    }
}
