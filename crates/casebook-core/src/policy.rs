//! Access policy: pure predicates over (actor, case, action).
//!
//! Nothing here touches storage. Listing is the one place where the policy
//! produces a query scope instead of a boolean, so that unauthorized rows are
//! excluded by the store's query rather than filtered out after loading.

use std::fmt;

use crate::error::CaseError;
use crate::model::{Actor, Case, CaseId, Permission, Role};
use crate::store::CaseScope;

/// Operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    List,
    Edit,
    AssignLawyer,
    Delete,
    Transition,
    AttachEvidence,
    GrantAccess,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::View => "view",
            Self::List => "list",
            Self::Edit => "edit",
            Self::AssignLawyer => "assign a lawyer to",
            Self::Delete => "delete",
            Self::Transition => "change the status of",
            Self::AttachEvidence => "attach evidence to",
            Self::GrantAccess => "grant access to",
        })
    }
}

/// Admin, the owning client, the assigned lawyer, or anyone on the access list.
#[must_use]
pub fn can_view(actor: &Actor, case: &Case) -> bool {
    actor.is_admin()
        || case.client() == &actor.id
        || case.is_assigned_to(&actor.id)
        || case.grant_for(&actor.id).is_some()
}

/// Query scope applied when `actor` lists cases.
#[must_use]
pub fn can_list(actor: &Actor) -> CaseScope {
    match actor.role {
        Role::Admin => CaseScope::Unrestricted,
        Role::Lawyer => CaseScope::Lawyer {
            lawyer: actor.id.clone(),
            specialization: actor.specialization,
        },
        Role::Client => CaseScope::Client {
            client: actor.id.clone(),
        },
    }
}

/// Admin always; a lawyer when assigned or holding an Edit grant; clients
/// never. The client reopen path is decided by the lifecycle engine.
#[must_use]
pub fn can_edit(actor: &Actor, case: &Case) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Lawyer => {
            case.is_assigned_to(&actor.id) || case.grant_for(&actor.id) == Some(Permission::Edit)
        }
        Role::Client => false,
    }
}

#[must_use]
pub fn can_assign_lawyer(actor: &Actor) -> bool {
    actor.is_admin()
}

#[must_use]
pub fn can_delete(actor: &Actor, case: &Case) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Client => case.client() == &actor.id,
        Role::Lawyer => false,
    }
}

/// Evidence may come from the case's parties (admin, client, assigned
/// lawyer) or from someone holding an Edit grant. View-only grantees may
/// read the case but not add to it.
#[must_use]
pub fn can_attach_evidence(actor: &Actor, case: &Case) -> bool {
    actor.is_admin()
        || case.client() == &actor.id
        || case.is_assigned_to(&actor.id)
        || case.grant_for(&actor.id) == Some(Permission::Edit)
}

/// Turn a policy decision into a `Forbidden` error.
///
/// # Errors
///
/// Returns [`CaseError::Forbidden`] when `allowed` is false.
pub fn ensure(
    allowed: bool,
    actor: &Actor,
    action: Action,
    case_id: &CaseId,
) -> Result<(), CaseError> {
    if allowed {
        return Ok(());
    }
    tracing::warn!(actor = %actor.id, role = %actor.role, %action, %case_id, "action denied");
    Err(CaseError::Forbidden {
        actor: actor.id.to_string(),
        action,
        case_id: case_id.to_string(),
    })
}
