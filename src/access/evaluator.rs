use uuid::Uuid;

use super::decision::{AccessDecision, DenyReason, ResourceKind};
use super::directory::Directory;
use super::matrix::Action;
use super::role::Role;

/// The authenticated identity an access check runs for.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub role: Role,
    pub is_owner: bool,
}

/// Minimum-role gate. Pure: no lookups, same inputs always give the same
/// decision.
pub fn authorize(actor: &Actor, min: Role) -> AccessDecision {
    if actor.role.at_least(min) {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny(DenyReason::InsufficientPermissions)
    }
}

/// Financial data is reachable by Owner, Direct Manager and Accountant only.
pub fn can_access_financial(actor: &Actor) -> AccessDecision {
    match actor.role {
        Role::Owner | Role::DirectManager | Role::Accountant => AccessDecision::Allow,
        Role::TeamLeader | Role::Employee => {
            AccessDecision::Deny(DenyReason::FinancialAccessDenied)
        }
    }
}

/// Evaluates per-resource access rules against a [`Directory`].
///
/// Rules are checked in a fixed order and the first match wins. Owner and
/// Direct Manager short-circuit to allow before any lookup; everyone else
/// pays for a target lookup first, so a missing row is always `NotFound` no
/// matter who asked.
#[derive(Clone)]
pub struct AccessEvaluator<D> {
    directory: D,
}

impl<D: Directory> AccessEvaluator<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Can `actor` touch the employee record `employee_id`?
    ///
    /// Team Leaders see employees in their own department; level 4 sees only
    /// their own record. An actor without an employee profile matches no
    /// scoped rule and is denied, not treated as an error.
    pub async fn can_access_employee(
        &self,
        actor: &Actor,
        employee_id: Uuid,
    ) -> Result<AccessDecision, sqlx::Error> {
        if actor.role.at_least(Role::DirectManager) {
            return Ok(AccessDecision::Allow);
        }

        let Some(target) = self.directory.employee(employee_id).await? else {
            return Ok(AccessDecision::NotFound(ResourceKind::Employee));
        };

        let profile = self.directory.employee_profile_of(actor.user_id).await?;

        match actor.role {
            Role::TeamLeader => {
                let own_dept = profile.and_then(|p| p.department_id);
                match (own_dept, target.department_id) {
                    (Some(a), Some(b)) if a == b => Ok(AccessDecision::Allow),
                    _ => Ok(AccessDecision::Deny(DenyReason::DepartmentAccessDenied)),
                }
            }
            Role::Employee => {
                if profile.is_some_and(|p| p.employee_id == employee_id) {
                    Ok(AccessDecision::Allow)
                } else {
                    Ok(AccessDecision::Deny(DenyReason::SelfAccessOnly))
                }
            }
            _ => Ok(AccessDecision::Deny(DenyReason::PermissionDenied)),
        }
    }

    /// Can `actor` touch the client `client_id`?
    ///
    /// Any role may act on a client assigned to them. Team Leaders
    /// additionally reach clients whose category resolves to their
    /// department.
    pub async fn can_access_client(
        &self,
        actor: &Actor,
        client_id: Uuid,
    ) -> Result<AccessDecision, sqlx::Error> {
        if actor.role.at_least(Role::DirectManager) {
            return Ok(AccessDecision::Allow);
        }

        let Some(target) = self.directory.client(client_id).await? else {
            return Ok(AccessDecision::NotFound(ResourceKind::Client));
        };

        let profile = self.directory.employee_profile_of(actor.user_id).await?;

        if let (Some(profile), Some(assignee)) = (&profile, target.assigned_employee_id)
            && profile.employee_id == assignee
        {
            return Ok(AccessDecision::Allow);
        }

        if actor.role == Role::TeamLeader {
            let own_dept = profile.and_then(|p| p.department_id);
            if let (Some(a), Some(b)) = (own_dept, target.department_id)
                && a == b
            {
                return Ok(AccessDecision::Allow);
            }
        }

        Ok(AccessDecision::Deny(DenyReason::ClientAccessDenied))
    }

    /// Can `actor` touch the task `task_id`?
    ///
    /// Creators (by user id) and assignees (by employee id) always can.
    /// Team Leaders additionally reach tasks assigned inside their
    /// department; an unassigned task never matches that rule.
    pub async fn can_access_task(
        &self,
        actor: &Actor,
        task_id: Uuid,
    ) -> Result<AccessDecision, sqlx::Error> {
        if actor.role.at_least(Role::DirectManager) {
            return Ok(AccessDecision::Allow);
        }

        let Some(target) = self.directory.task(task_id).await? else {
            return Ok(AccessDecision::NotFound(ResourceKind::Task));
        };

        if target.created_by == Some(actor.user_id) {
            return Ok(AccessDecision::Allow);
        }

        let profile = self.directory.employee_profile_of(actor.user_id).await?;

        if let (Some(profile), Some(assignee)) = (&profile, target.assigned_to)
            && profile.employee_id == assignee
        {
            return Ok(AccessDecision::Allow);
        }

        if actor.role == Role::TeamLeader
            && let Some(assignee) = target.assigned_to
        {
            let own_dept = profile.as_ref().and_then(|p| p.department_id);
            let assignee_dept = self.directory.department_of_employee(assignee).await?;
            if let (Some(a), Some(b)) = (own_dept, assignee_dept)
                && a == b
            {
                return Ok(AccessDecision::Allow);
            }
        }

        Ok(AccessDecision::Deny(DenyReason::TaskAccessDenied))
    }

    /// Matrix lookup for a resource/action pair. Owners bypass the matrix;
    /// a role without a stored matrix grants nothing.
    pub async fn has_permission(
        &self,
        actor: &Actor,
        resource: &str,
        action: Action,
    ) -> Result<bool, sqlx::Error> {
        if actor.is_owner || actor.role == Role::Owner {
            return Ok(true);
        }
        let matrix = self.directory.role_permissions(actor.role_id).await?;
        Ok(matrix.is_some_and(|m| m.allows(resource, action)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::access::directory::{ClientRef, EmployeeProfile, EmployeeRef, TaskRef};
    use crate::access::matrix::PermissionMatrix;

    #[derive(Default)]
    struct InMemoryDirectory {
        profiles: HashMap<Uuid, EmployeeProfile>,
        employees: HashMap<Uuid, EmployeeRef>,
        clients: HashMap<Uuid, ClientRef>,
        tasks: HashMap<Uuid, TaskRef>,
        permissions: HashMap<Uuid, PermissionMatrix>,
    }

    impl Directory for InMemoryDirectory {
        async fn employee_profile_of(
            &self,
            user_id: Uuid,
        ) -> Result<Option<EmployeeProfile>, sqlx::Error> {
            Ok(self.profiles.get(&user_id).cloned())
        }

        async fn employee(&self, employee_id: Uuid) -> Result<Option<EmployeeRef>, sqlx::Error> {
            Ok(self.employees.get(&employee_id).cloned())
        }

        async fn client(&self, client_id: Uuid) -> Result<Option<ClientRef>, sqlx::Error> {
            Ok(self.clients.get(&client_id).cloned())
        }

        async fn task(&self, task_id: Uuid) -> Result<Option<TaskRef>, sqlx::Error> {
            Ok(self.tasks.get(&task_id).cloned())
        }

        async fn department_of_employee(
            &self,
            employee_id: Uuid,
        ) -> Result<Option<Uuid>, sqlx::Error> {
            Ok(self
                .employees
                .get(&employee_id)
                .and_then(|e| e.department_id))
        }

        async fn role_permissions(
            &self,
            role_id: Uuid,
        ) -> Result<Option<PermissionMatrix>, sqlx::Error> {
            Ok(self.permissions.get(&role_id).cloned())
        }
    }

    fn actor(role: Role) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role_id: Uuid::new_v4(),
            role,
            is_owner: role == Role::Owner,
        }
    }

    fn with_profile(dir: &mut InMemoryDirectory, actor: &Actor, department_id: Option<Uuid>) -> Uuid {
        let employee_id = Uuid::new_v4();
        dir.profiles.insert(
            actor.user_id,
            EmployeeProfile {
                employee_id,
                department_id,
            },
        );
        dir.employees
            .insert(employee_id, EmployeeRef { department_id });
        employee_id
    }

    #[tokio::test]
    async fn test_senior_roles_allow_before_lookup() {
        // Empty directory: a lookup would yield NotFound, so Allow proves
        // the short-circuit.
        let eval = AccessEvaluator::new(InMemoryDirectory::default());
        let id = Uuid::new_v4();
        for role in [Role::Owner, Role::DirectManager] {
            let a = actor(role);
            assert_eq!(eval.can_access_employee(&a, id).await.unwrap(), AccessDecision::Allow);
            assert_eq!(eval.can_access_client(&a, id).await.unwrap(), AccessDecision::Allow);
            assert_eq!(eval.can_access_task(&a, id).await.unwrap(), AccessDecision::Allow);
        }
    }

    #[tokio::test]
    async fn test_missing_resource_is_not_found_for_junior_roles() {
        let eval = AccessEvaluator::new(InMemoryDirectory::default());
        let id = Uuid::new_v4();
        for role in [Role::TeamLeader, Role::Employee, Role::Accountant] {
            let a = actor(role);
            assert_eq!(
                eval.can_access_employee(&a, id).await.unwrap(),
                AccessDecision::NotFound(ResourceKind::Employee)
            );
            assert_eq!(
                eval.can_access_client(&a, id).await.unwrap(),
                AccessDecision::NotFound(ResourceKind::Client)
            );
            assert_eq!(
                eval.can_access_task(&a, id).await.unwrap(),
                AccessDecision::NotFound(ResourceKind::Task)
            );
        }
    }

    #[tokio::test]
    async fn test_team_leader_employee_department_scope() {
        let mut dir = InMemoryDirectory::default();
        let leader = actor(Role::TeamLeader);
        let dept = Uuid::new_v4();
        with_profile(&mut dir, &leader, Some(dept));

        let same_dept = Uuid::new_v4();
        dir.employees.insert(same_dept, EmployeeRef { department_id: Some(dept) });
        let other_dept = Uuid::new_v4();
        dir.employees.insert(other_dept, EmployeeRef { department_id: Some(Uuid::new_v4()) });
        let no_dept = Uuid::new_v4();
        dir.employees.insert(no_dept, EmployeeRef { department_id: None });

        let eval = AccessEvaluator::new(dir);
        assert_eq!(
            eval.can_access_employee(&leader, same_dept).await.unwrap(),
            AccessDecision::Allow
        );
        assert_eq!(
            eval.can_access_employee(&leader, other_dept).await.unwrap(),
            AccessDecision::Deny(DenyReason::DepartmentAccessDenied)
        );
        assert_eq!(
            eval.can_access_employee(&leader, no_dept).await.unwrap(),
            AccessDecision::Deny(DenyReason::DepartmentAccessDenied)
        );
    }

    #[tokio::test]
    async fn test_team_leader_without_department_denied() {
        let mut dir = InMemoryDirectory::default();
        let leader = actor(Role::TeamLeader);
        with_profile(&mut dir, &leader, None);

        let target = Uuid::new_v4();
        dir.employees.insert(target, EmployeeRef { department_id: Some(Uuid::new_v4()) });

        let eval = AccessEvaluator::new(dir);
        assert_eq!(
            eval.can_access_employee(&leader, target).await.unwrap(),
            AccessDecision::Deny(DenyReason::DepartmentAccessDenied)
        );
    }

    #[tokio::test]
    async fn test_employee_self_access_only() {
        let mut dir = InMemoryDirectory::default();
        let me = actor(Role::Employee);
        let my_employee_id = with_profile(&mut dir, &me, Some(Uuid::new_v4()));

        let colleague = Uuid::new_v4();
        dir.employees.insert(colleague, EmployeeRef { department_id: None });

        let eval = AccessEvaluator::new(dir);
        assert_eq!(
            eval.can_access_employee(&me, my_employee_id).await.unwrap(),
            AccessDecision::Allow
        );
        assert_eq!(
            eval.can_access_employee(&me, colleague).await.unwrap(),
            AccessDecision::Deny(DenyReason::SelfAccessOnly)
        );
    }

    #[tokio::test]
    async fn test_actor_without_profile_is_denied_not_an_error() {
        let mut dir = InMemoryDirectory::default();
        let target = Uuid::new_v4();
        dir.employees.insert(target, EmployeeRef { department_id: Some(Uuid::new_v4()) });
        dir.clients.insert(
            target,
            ClientRef { assigned_employee_id: Some(Uuid::new_v4()), department_id: None },
        );
        dir.tasks.insert(
            target,
            TaskRef { assigned_to: Some(Uuid::new_v4()), created_by: Some(Uuid::new_v4()) },
        );

        let eval = AccessEvaluator::new(dir);
        let me = actor(Role::Employee);
        assert_eq!(
            eval.can_access_employee(&me, target).await.unwrap(),
            AccessDecision::Deny(DenyReason::SelfAccessOnly)
        );
        assert_eq!(
            eval.can_access_client(&me, target).await.unwrap(),
            AccessDecision::Deny(DenyReason::ClientAccessDenied)
        );
        assert_eq!(
            eval.can_access_task(&me, target).await.unwrap(),
            AccessDecision::Deny(DenyReason::TaskAccessDenied)
        );
    }

    #[tokio::test]
    async fn test_accountant_on_employee_record_is_permission_denied() {
        let mut dir = InMemoryDirectory::default();
        let target = Uuid::new_v4();
        dir.employees.insert(target, EmployeeRef { department_id: None });

        let eval = AccessEvaluator::new(dir);
        assert_eq!(
            eval.can_access_employee(&actor(Role::Accountant), target).await.unwrap(),
            AccessDecision::Deny(DenyReason::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn test_assigned_client_reachable_by_any_role() {
        for role in [Role::TeamLeader, Role::Employee, Role::Accountant] {
            let mut dir = InMemoryDirectory::default();
            let me = actor(role);
            let my_employee_id = with_profile(&mut dir, &me, None);

            let client = Uuid::new_v4();
            dir.clients.insert(
                client,
                ClientRef { assigned_employee_id: Some(my_employee_id), department_id: None },
            );

            let eval = AccessEvaluator::new(dir);
            assert_eq!(
                eval.can_access_client(&me, client).await.unwrap(),
                AccessDecision::Allow,
                "role {role:?} should reach its own assigned client"
            );
        }
    }

    #[tokio::test]
    async fn test_team_leader_client_department_scope() {
        let mut dir = InMemoryDirectory::default();
        let leader = actor(Role::TeamLeader);
        let dept = Uuid::new_v4();
        with_profile(&mut dir, &leader, Some(dept));

        let in_dept = Uuid::new_v4();
        dir.clients.insert(
            in_dept,
            ClientRef { assigned_employee_id: None, department_id: Some(dept) },
        );
        let outside = Uuid::new_v4();
        dir.clients.insert(
            outside,
            ClientRef { assigned_employee_id: None, department_id: Some(Uuid::new_v4()) },
        );
        let uncategorized = Uuid::new_v4();
        dir.clients.insert(
            uncategorized,
            ClientRef { assigned_employee_id: None, department_id: None },
        );

        let eval = AccessEvaluator::new(dir);
        assert_eq!(eval.can_access_client(&leader, in_dept).await.unwrap(), AccessDecision::Allow);
        assert_eq!(
            eval.can_access_client(&leader, outside).await.unwrap(),
            AccessDecision::Deny(DenyReason::ClientAccessDenied)
        );
        assert_eq!(
            eval.can_access_client(&leader, uncategorized).await.unwrap(),
            AccessDecision::Deny(DenyReason::ClientAccessDenied)
        );
    }

    #[tokio::test]
    async fn test_task_creator_and_assignee_access() {
        let mut dir = InMemoryDirectory::default();
        let creator = actor(Role::Employee);
        let assignee = actor(Role::Employee);
        let assignee_employee_id = with_profile(&mut dir, &assignee, None);

        let task = Uuid::new_v4();
        dir.tasks.insert(
            task,
            TaskRef { assigned_to: Some(assignee_employee_id), created_by: Some(creator.user_id) },
        );

        let eval = AccessEvaluator::new(dir);
        assert_eq!(eval.can_access_task(&creator, task).await.unwrap(), AccessDecision::Allow);
        assert_eq!(eval.can_access_task(&assignee, task).await.unwrap(), AccessDecision::Allow);

        let bystander = actor(Role::Employee);
        assert_eq!(
            eval.can_access_task(&bystander, task).await.unwrap(),
            AccessDecision::Deny(DenyReason::TaskAccessDenied)
        );
    }

    #[tokio::test]
    async fn test_team_leader_task_department_scope() {
        let mut dir = InMemoryDirectory::default();
        let leader = actor(Role::TeamLeader);
        let dept = Uuid::new_v4();
        with_profile(&mut dir, &leader, Some(dept));

        let in_dept_employee = Uuid::new_v4();
        dir.employees.insert(in_dept_employee, EmployeeRef { department_id: Some(dept) });
        let outside_employee = Uuid::new_v4();
        dir.employees.insert(outside_employee, EmployeeRef { department_id: Some(Uuid::new_v4()) });

        let in_dept_task = Uuid::new_v4();
        dir.tasks.insert(
            in_dept_task,
            TaskRef { assigned_to: Some(in_dept_employee), created_by: Some(Uuid::new_v4()) },
        );
        let outside_task = Uuid::new_v4();
        dir.tasks.insert(
            outside_task,
            TaskRef { assigned_to: Some(outside_employee), created_by: Some(Uuid::new_v4()) },
        );

        let eval = AccessEvaluator::new(dir);
        assert_eq!(
            eval.can_access_task(&leader, in_dept_task).await.unwrap(),
            AccessDecision::Allow
        );
        assert_eq!(
            eval.can_access_task(&leader, outside_task).await.unwrap(),
            AccessDecision::Deny(DenyReason::TaskAccessDenied)
        );
    }

    #[tokio::test]
    async fn test_unassigned_task_denies_team_leader() {
        let mut dir = InMemoryDirectory::default();
        let leader = actor(Role::TeamLeader);
        with_profile(&mut dir, &leader, Some(Uuid::new_v4()));

        let task = Uuid::new_v4();
        dir.tasks.insert(task, TaskRef { assigned_to: None, created_by: Some(Uuid::new_v4()) });

        let eval = AccessEvaluator::new(dir);
        assert_eq!(
            eval.can_access_task(&leader, task).await.unwrap(),
            AccessDecision::Deny(DenyReason::TaskAccessDenied)
        );
    }

    #[tokio::test]
    async fn test_decisions_are_idempotent() {
        let mut dir = InMemoryDirectory::default();
        let leader = actor(Role::TeamLeader);
        let dept = Uuid::new_v4();
        with_profile(&mut dir, &leader, Some(dept));
        let target = Uuid::new_v4();
        dir.employees.insert(target, EmployeeRef { department_id: Some(dept) });

        let eval = AccessEvaluator::new(dir);
        let first = eval.can_access_employee(&leader, target).await.unwrap();
        let second = eval.can_access_employee(&leader, target).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_authorize_gate() {
        assert_eq!(authorize(&actor(Role::Owner), Role::TeamLeader), AccessDecision::Allow);
        assert_eq!(authorize(&actor(Role::TeamLeader), Role::TeamLeader), AccessDecision::Allow);
        assert_eq!(
            authorize(&actor(Role::Employee), Role::TeamLeader),
            AccessDecision::Deny(DenyReason::InsufficientPermissions)
        );
        assert_eq!(
            authorize(&actor(Role::Accountant), Role::Employee),
            AccessDecision::Deny(DenyReason::InsufficientPermissions)
        );
    }

    #[test]
    fn test_financial_gate() {
        for role in [Role::Owner, Role::DirectManager, Role::Accountant] {
            assert_eq!(can_access_financial(&actor(role)), AccessDecision::Allow);
        }
        for role in [Role::TeamLeader, Role::Employee] {
            assert_eq!(
                can_access_financial(&actor(role)),
                AccessDecision::Deny(DenyReason::FinancialAccessDenied)
            );
        }
    }

    #[tokio::test]
    async fn test_has_permission_owner_bypass_and_fail_closed() {
        let mut dir = InMemoryDirectory::default();
        let mut accountant = actor(Role::Accountant);
        dir.permissions.insert(
            accountant.role_id,
            PermissionMatrix::from_value(json!({
                "financial": {"create": true, "read": true, "update": true, "delete": false}
            })),
        );

        let eval = AccessEvaluator::new(dir);
        assert!(eval.has_permission(&accountant, "financial", Action::Read).await.unwrap());
        assert!(!eval.has_permission(&accountant, "financial", Action::Delete).await.unwrap());
        assert!(!eval.has_permission(&accountant, "users", Action::Read).await.unwrap());

        // Role with no stored matrix grants nothing.
        accountant.role_id = Uuid::new_v4();
        assert!(!eval.has_permission(&accountant, "financial", Action::Read).await.unwrap());

        let owner = actor(Role::Owner);
        assert!(eval.has_permission(&owner, "anything", Action::Delete).await.unwrap());
    }
}
