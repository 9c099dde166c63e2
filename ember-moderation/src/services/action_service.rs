use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::UserAction;

pub const ACTION_BAN: &str = "ban";
pub const ACTION_MUTE: &str = "mute";
pub const ACTION_WARN: &str = "warn";

pub const VALID_ACTION_TYPES: [&str; 3] = [ACTION_BAN, ACTION_MUTE, ACTION_WARN];

pub fn is_valid_action_type(action_type: &str) -> bool {
    VALID_ACTION_TYPES.contains(&action_type)
}

/// Expiry timestamp for an action with an optional duration. `None` means
/// the action stands until lifted.
pub fn expiry_from_duration(now: DateTime<Utc>, duration_days: Option<i32>) -> Option<DateTime<Utc>> {
    duration_days.map(|days| now + Duration::days(days as i64))
}

/// Whether an action currently binds: still flagged active and not past its
/// expiry.
pub fn in_force(action: &UserAction, now: DateTime<Utc>) -> bool {
    if !action.is_active {
        return false;
    }
    match action.expires_at {
        Some(expires_at) => expires_at > now,
        None => true,
    }
}

/// Count the bans that would still bind the user after lifting `lifted_id`.
/// The account unlocks only when this reaches zero; lifting one of several
/// bans must not unlock.
pub fn remaining_active_bans(actions: &[UserAction], lifted_id: Uuid, now: DateTime<Utc>) -> usize {
    actions
        .iter()
        .filter(|a| a.id != lifted_id)
        .filter(|a| a.action_type == ACTION_BAN)
        .filter(|a| in_force(a, now))
        .count()
}

pub mod report_status {
    pub const OPEN: &str = "open";
    pub const ASSIGNED: &str = "assigned";
    pub const RESOLVED: &str = "resolved";
    pub const DISMISSED: &str = "dismissed";
}

/// Report lifecycle: open → assigned → resolved/dismissed, with a shortcut
/// from open straight to a terminal state.
pub fn report_transition_allowed(from: &str, to: &str) -> bool {
    use report_status::*;
    matches!(
        (from, to),
        (OPEN, ASSIGNED) | (OPEN, RESOLVED) | (OPEN, DISMISSED) | (ASSIGNED, RESOLVED) | (ASSIGNED, DISMISSED)
    )
}

pub mod appeal_status {
    pub const OPEN: &str = "open";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
}

pub fn appeal_verdict_allowed(verdict: &str) -> bool {
    matches!(verdict, appeal_status::APPROVED | appeal_status::REJECTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(action_type: &str, is_active: bool, expires_at: Option<DateTime<Utc>>) -> UserAction {
        UserAction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            action_type: action_type.to_string(),
            reason: "test".to_string(),
            duration_days: None,
            expires_at,
            is_active,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn expiry_from_duration_days() {
        let now = Utc::now();
        assert_eq!(expiry_from_duration(now, None), None);
        assert_eq!(expiry_from_duration(now, Some(7)), Some(now + Duration::days(7)));
    }

    #[test]
    fn in_force_respects_expiry_and_flag() {
        let now = Utc::now();
        assert!(in_force(&action(ACTION_BAN, true, None), now));
        assert!(in_force(&action(ACTION_BAN, true, Some(now + Duration::hours(1))), now));
        assert!(!in_force(&action(ACTION_BAN, true, Some(now - Duration::hours(1))), now));
        assert!(!in_force(&action(ACTION_BAN, false, None), now));
    }

    #[test]
    fn lifting_last_ban_leaves_none() {
        let now = Utc::now();
        let ban = action(ACTION_BAN, true, None);
        let mute = action(ACTION_MUTE, true, None);
        let actions = vec![ban.clone(), mute];
        assert_eq!(remaining_active_bans(&actions, ban.id, now), 0);
    }

    #[test]
    fn lifting_one_of_several_bans_leaves_rest() {
        let now = Utc::now();
        let first = action(ACTION_BAN, true, None);
        let second = action(ACTION_BAN, true, Some(now + Duration::days(2)));
        let actions = vec![first.clone(), second];
        assert_eq!(remaining_active_bans(&actions, first.id, now), 1);
    }

    #[test]
    fn expired_bans_do_not_block_unlock() {
        let now = Utc::now();
        let lifted = action(ACTION_BAN, true, None);
        let expired = action(ACTION_BAN, true, Some(now - Duration::days(1)));
        let inactive = action(ACTION_BAN, false, None);
        let actions = vec![lifted.clone(), expired, inactive];
        assert_eq!(remaining_active_bans(&actions, lifted.id, now), 0);
    }

    #[test]
    fn report_transitions() {
        use report_status::*;
        assert!(report_transition_allowed(OPEN, ASSIGNED));
        assert!(report_transition_allowed(OPEN, RESOLVED));
        assert!(report_transition_allowed(ASSIGNED, DISMISSED));
        assert!(!report_transition_allowed(RESOLVED, ASSIGNED));
        assert!(!report_transition_allowed(ASSIGNED, OPEN));
        assert!(!report_transition_allowed(DISMISSED, RESOLVED));
    }

    #[test]
    fn appeal_verdicts() {
        assert!(appeal_verdict_allowed("approved"));
        assert!(appeal_verdict_allowed("rejected"));
        assert!(!appeal_verdict_allowed("open"));
        assert!(!appeal_verdict_allowed("escalated"));
    }

    #[test]
    fn action_type_validation() {
        assert!(is_valid_action_type("ban"));
        assert!(is_valid_action_type("mute"));
        assert!(is_valid_action_type("warn"));
        assert!(!is_valid_action_type("shadowban"));
    }
}
