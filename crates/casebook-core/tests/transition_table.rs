use proptest::prelude::*;

use casebook_core::db;
use casebook_core::error::CaseError;
use casebook_core::model::{Actor, CaseDraft, CaseId, Category, Status};
use casebook_core::store::{SqliteCaseStore, SqliteNotificationStore, SqliteUserDirectory};
use casebook_core::CaseService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Who {
    Admin,
    AssignedLawyer,
    OtherLawyer,
    OwningClient,
    OtherClient,
}

const EVERYONE: [Who; 5] = [
    Who::Admin,
    Who::AssignedLawyer,
    Who::OtherLawyer,
    Who::OwningClient,
    Who::OtherClient,
];

fn actor(who: Who) -> Actor {
    match who {
        Who::Admin => Actor::admin("admin", "Ari"),
        Who::AssignedLawyer => Actor::lawyer("lawyer-civil", "Lin", Category::Civil),
        Who::OtherLawyer => Actor::lawyer("lawyer-family", "Fay", Category::Family),
        Who::OwningClient => Actor::client("client-owner", "Carol"),
        Who::OtherClient => Actor::client("client-other", "Xavi"),
    }
}

/// Rows of the transition table and who may use them. On a Filed case the
/// civil lawyer is not yet assigned but matches the category.
fn permitted(from: Status, to: Status, who: Who) -> Option<bool> {
    let allowed = match (from, to) {
        (Status::Filed, Status::InProgress) => who == Who::AssignedLawyer,
        (Status::InProgress, Status::HearingScheduled | Status::Closed) => {
            matches!(who, Who::Admin | Who::AssignedLawyer)
        }
        (Status::Closed, Status::InProgress) => {
            matches!(who, Who::Admin | Who::AssignedLawyer | Who::OwningClient)
        }
        _ => return None,
    };
    Some(allowed)
}

/// File a civil case and walk it to `status` through legal transitions.
fn case_in(service: &CaseService<'_>, status: Status) -> CaseId {
    let owner = actor(Who::OwningClient);
    let lawyer = actor(Who::AssignedLawyer);
    let case = service
        .file_case(
            &owner,
            CaseDraft {
                case_number: None,
                title: "Dispute".into(),
                description: "Boundary fence".into(),
                category: Some(Category::Civil),
            },
        )
        .unwrap();
    let id = case.id().clone();
    if status != Status::Filed {
        service
            .change_status(&lawyer, &id, Status::InProgress)
            .unwrap();
    }
    if matches!(status, Status::HearingScheduled | Status::Closed) {
        service.change_status(&lawyer, &id, status).unwrap();
    }
    id
}

fn check(from: Status, to: Status, who: Who) -> Result<(), TestCaseError> {
    let conn = db::open_in_memory().unwrap();
    let cases = SqliteCaseStore::new(&conn);
    let users = SqliteUserDirectory::new(&conn);
    let notes = SqliteNotificationStore::new(&conn);
    let service = CaseService::new(&cases, &users, &notes);
    let admin = actor(Who::Admin);

    let id = case_in(&service, from);
    prop_assert_eq!(service.get_case(&admin, &id).unwrap().status(), from);

    let outcome = service.change_status(&actor(who), &id, to);
    let persisted = service.get_case(&admin, &id).unwrap().status();

    match permitted(from, to, who) {
        None => {
            prop_assert!(
                matches!(outcome, Err(CaseError::InvalidTransition { .. })),
                "{from} -> {to} by {who:?}: {outcome:?}"
            );
            prop_assert_eq!(persisted, from);
        }
        Some(false) => {
            prop_assert!(
                matches!(outcome, Err(CaseError::Forbidden { .. })),
                "{from} -> {to} by {who:?}: {outcome:?}"
            );
            prop_assert_eq!(persisted, from);
        }
        Some(true) => {
            let changed = outcome.map_err(|err| TestCaseError::fail(err.to_string()))?;
            prop_assert_eq!(changed.status(), to);
            prop_assert_eq!(persisted, to);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn transitions_follow_table(
        from in prop::sample::select(Status::ALL.to_vec()),
        to in prop::sample::select(Status::ALL.to_vec()),
        who in prop::sample::select(EVERYONE.to_vec()),
    ) {
        check(from, to, who)?;
    }
}

#[test]
fn every_triple_is_covered() {
    for from in Status::ALL {
        for to in Status::ALL {
            for who in EVERYONE {
                if let Err(err) = check(from, to, who) {
                    panic!("{from} -> {to} by {who:?}: {err}");
                }
            }
        }
    }
}
