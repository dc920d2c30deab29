use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A user's role in the organization.
///
/// Roles form a total order by seniority: `Owner` ranks highest, and the
/// declaration order matches the numeric levels stored in the `roles` table
/// (1 = Owner .. 5 = Accountant). The derived `Ord` therefore sorts from most
/// to least senior; use [`Role::at_least`] for gate checks rather than
/// comparing levels by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    DirectManager,
    TeamLeader,
    Employee,
    Accountant,
}

impl Role {
    /// Numeric level as stored in `roles.level` (1 is most senior).
    pub const fn level(self) -> i16 {
        match self {
            Role::Owner => 1,
            Role::DirectManager => 2,
            Role::TeamLeader => 3,
            Role::Employee => 4,
            Role::Accountant => 5,
        }
    }

    pub fn from_level(level: i16) -> Option<Role> {
        match level {
            1 => Some(Role::Owner),
            2 => Some(Role::DirectManager),
            3 => Some(Role::TeamLeader),
            4 => Some(Role::Employee),
            5 => Some(Role::Accountant),
            _ => None,
        }
    }

    /// True when this role is at least as senior as `min`.
    pub fn at_least(self, min: Role) -> bool {
        self.level() <= min.level()
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::DirectManager => "Direct Manager",
            Role::TeamLeader => "Team Leader",
            Role::Employee => "Employee",
            Role::Accountant => "Accountant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip() {
        for level in 1..=5 {
            let role = Role::from_level(level).unwrap();
            assert_eq!(role.level(), level);
        }
        assert_eq!(Role::from_level(0), None);
        assert_eq!(Role::from_level(6), None);
    }

    #[test]
    fn test_seniority_order() {
        assert!(Role::Owner < Role::DirectManager);
        assert!(Role::DirectManager < Role::TeamLeader);
        assert!(Role::TeamLeader < Role::Employee);
        assert!(Role::Employee < Role::Accountant);
    }

    #[test]
    fn test_at_least() {
        assert!(Role::Owner.at_least(Role::DirectManager));
        assert!(Role::DirectManager.at_least(Role::DirectManager));
        assert!(!Role::TeamLeader.at_least(Role::DirectManager));
        assert!(!Role::Accountant.at_least(Role::Employee));
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::DirectManager).unwrap(),
            "\"direct_manager\""
        );
        let parsed: Role = serde_json::from_str("\"team_leader\"").unwrap();
        assert_eq!(parsed, Role::TeamLeader);
    }
}
