use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};

use crate::access::{self, AccessDecision, DenyReason, Role};
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Turns an [`AccessDecision`] into a handler result.
pub trait DecisionExt {
    fn into_result(self) -> Result<(), AppError>;
}

impl DecisionExt for AccessDecision {
    fn into_result(self) -> Result<(), AppError> {
        match self {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(DenyReason::NotAuthenticated) => Err(AppError::unauthorized(
                DenyReason::NotAuthenticated.code(),
                DenyReason::NotAuthenticated.message(),
            )),
            AccessDecision::Deny(reason) => {
                Err(AppError::forbidden(reason.code(), reason.message()))
            }
            AccessDecision::NotFound(kind) => Err(AppError::not_found(
                kind.not_found_code(),
                format!("{} not found", capitalize(kind.name())),
            )),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Minimum-role gate for use inside handlers.
pub fn require_level(user: &CurrentUser, min: Role) -> Result<(), AppError> {
    access::authorize(&user.actor(), min).into_result()
}

/// Router-level gate for the financial routes. Placed with
/// `middleware::from_fn_with_state` so no financial handler runs for roles
/// outside {Owner, Direct Manager, Accountant}.
pub async fn require_financial_access(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let user = CurrentUser::from_request_parts(&mut parts, &state).await?;

    access::can_access_financial(&user.actor()).into_result()?;

    req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::ResourceKind;
    use axum::http::StatusCode;

    #[test]
    fn test_allow_maps_to_ok() {
        assert!(AccessDecision::Allow.into_result().is_ok());
    }

    #[test]
    fn test_deny_maps_to_forbidden_with_code() {
        let err = AccessDecision::Deny(DenyReason::SelfAccessOnly)
            .into_result()
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "SELF_ACCESS_ONLY");
    }

    #[test]
    fn test_unauthenticated_maps_to_401() {
        let err = AccessDecision::Deny(DenyReason::NotAuthenticated)
            .into_result()
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "NOT_AUTHENTICATED");
    }

    #[test]
    fn test_not_found_maps_to_404_with_kind_code() {
        let err = AccessDecision::NotFound(ResourceKind::Task)
            .into_result()
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "TASK_NOT_FOUND");
        assert_eq!(err.error.to_string(), "Task not found");
    }
}
