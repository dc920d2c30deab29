/// Resource families the evaluator can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Employee,
    Client,
    Task,
}

impl ResourceKind {
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Employee => "employee",
            ResourceKind::Client => "client",
            ResourceKind::Task => "task",
        }
    }

    /// Wire code used when the resource being checked does not exist.
    pub fn not_found_code(self) -> &'static str {
        match self {
            ResourceKind::Employee => "EMPLOYEE_NOT_FOUND",
            ResourceKind::Client => "CLIENT_NOT_FOUND",
            ResourceKind::Task => "TASK_NOT_FOUND",
        }
    }
}

/// Why an access check denied the actor.
///
/// Each variant carries a stable wire code; clients branch on the code, so
/// these strings are part of the API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    InsufficientPermissions,
    PermissionDenied,
    DepartmentAccessDenied,
    SelfAccessOnly,
    ClientAccessDenied,
    TaskAccessDenied,
    FinancialAccessDenied,
}

impl DenyReason {
    pub fn code(self) -> &'static str {
        match self {
            DenyReason::NotAuthenticated => "NOT_AUTHENTICATED",
            DenyReason::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            DenyReason::PermissionDenied => "PERMISSION_DENIED",
            DenyReason::DepartmentAccessDenied => "DEPARTMENT_ACCESS_DENIED",
            DenyReason::SelfAccessOnly => "SELF_ACCESS_ONLY",
            DenyReason::ClientAccessDenied => "CLIENT_ACCESS_DENIED",
            DenyReason::TaskAccessDenied => "TASK_ACCESS_DENIED",
            DenyReason::FinancialAccessDenied => "FINANCIAL_ACCESS_DENIED",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            DenyReason::NotAuthenticated => "Authentication required",
            DenyReason::InsufficientPermissions => "Insufficient permissions",
            DenyReason::PermissionDenied => "Permission denied",
            DenyReason::DepartmentAccessDenied => {
                "Access denied: employee is outside your department"
            }
            DenyReason::SelfAccessOnly => "Access denied: you can only access your own record",
            DenyReason::ClientAccessDenied => "Access denied to this client",
            DenyReason::TaskAccessDenied => "Access denied to this task",
            DenyReason::FinancialAccessDenied => "Access denied to financial data",
        }
    }
}

/// Outcome of an access check.
///
/// `NotFound` is distinct from `Deny`: when the target row does not exist the
/// caller must answer 404 regardless of who asked, and must not leak whether
/// access would have been granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
    NotFound(ResourceKind),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DenyReason::SelfAccessOnly.code(), "SELF_ACCESS_ONLY");
        assert_eq!(DenyReason::FinancialAccessDenied.code(), "FINANCIAL_ACCESS_DENIED");
        assert_eq!(ResourceKind::Client.not_found_code(), "CLIENT_NOT_FOUND");
    }

    #[test]
    fn test_is_allowed() {
        assert!(AccessDecision::Allow.is_allowed());
        assert!(!AccessDecision::Deny(DenyReason::PermissionDenied).is_allowed());
        assert!(!AccessDecision::NotFound(ResourceKind::Task).is_allowed());
    }
}
