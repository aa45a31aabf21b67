//! Case service: the single entry point a transport layer calls.
//!
//! Each operation takes the acting user plus validated parameters, reads
//! current persisted state, checks the access policy, and writes once.
//! Errors from the policy, the lifecycle engine and the stores propagate
//! unchanged.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::CasebookConfig;
use crate::error::{CaseError, Entity};
use crate::lifecycle::{self, LifecycleEngine, StatusChange};
use crate::model::{
    Actor, Case, CaseDraft, CaseId, CasePatch, EvidenceRef, HearingDraft, NewCase, Notification,
    NotificationId, Permission, Status, UserId,
};
use crate::notify::NotificationEmitter;
use crate::policy::{self, Action};
use crate::store::{CaseQuery, CaseStore, NotificationStore, UserDirectory};

const CASE_NUMBER_ATTEMPTS: usize = 8;

/// Workflow knobs taken from `[cases]` in the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub case_number_prefix: String,
    pub require_category: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            case_number_prefix: "CASE".to_string(),
            require_category: false,
        }
    }
}

impl From<&CasebookConfig> for ServiceSettings {
    fn from(config: &CasebookConfig) -> Self {
        Self {
            case_number_prefix: config.cases.case_number_prefix.clone(),
            require_category: config.cases.require_category,
        }
    }
}

pub struct CaseService<'a> {
    cases: &'a dyn CaseStore,
    users: &'a dyn UserDirectory,
    notifier: NotificationEmitter<'a>,
    settings: ServiceSettings,
}

impl<'a> CaseService<'a> {
    #[must_use]
    pub fn new(
        cases: &'a dyn CaseStore,
        users: &'a dyn UserDirectory,
        notifications: &'a dyn NotificationStore,
    ) -> Self {
        Self {
            cases,
            users,
            notifier: NotificationEmitter::new(notifications),
            settings: ServiceSettings::default(),
        }
    }

    /// Build a service honoring the `[cases]` and `[notifications]` config.
    #[must_use]
    pub fn with_config(
        cases: &'a dyn CaseStore,
        users: &'a dyn UserDirectory,
        notifications: &'a dyn NotificationStore,
        config: &CasebookConfig,
    ) -> Self {
        Self {
            cases,
            users,
            notifier: NotificationEmitter::new(notifications)
                .enabled(config.notifications.enabled),
            settings: ServiceSettings::from(config),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn engine(&self) -> LifecycleEngine<'_> {
        LifecycleEngine::new(self.cases, self.users, &self.notifier)
    }

    /// Cases visible to `actor`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list_cases(&self, actor: &Actor) -> Result<Vec<Case>, CaseError> {
        self.list_cases_with(actor, None, None)
    }

    /// [`Self::list_cases`] narrowed by status and capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list_cases_with(
        &self,
        actor: &Actor,
        status: Option<Status>,
        limit: Option<u32>,
    ) -> Result<Vec<Case>, CaseError> {
        let mut query = CaseQuery::scoped(policy::can_list(actor));
        query.status = status;
        query.limit = limit;
        self.cases.find_matching(&query)
    }

    /// File a new case owned by `actor`.
    ///
    /// The client is always the actor. A missing case number is generated.
    ///
    /// # Errors
    ///
    /// `Validation` on blank title, description or case number, or a
    /// missing category when categories are required; `Conflict` when a
    /// supplied case number is taken.
    pub fn file_case(&self, actor: &Actor, draft: CaseDraft) -> Result<Case, CaseError> {
        let title = required("title", &draft.title)?;
        let description = required("description", &draft.description)?;
        if self.settings.require_category && draft.category.is_none() {
            return Err(CaseError::validation("category is required"));
        }
        let case_number = match draft.case_number {
            Some(number) => required("case number", &number)?,
            None => self.generate_case_number()?,
        };

        let case = self.cases.create(NewCase {
            case_number,
            title,
            description,
            category: draft.category,
            client: actor.id.clone(),
        })?;
        info!(case_id = %case.id(), actor = %actor.id, case_number = %case.case_number(), "case filed");
        Ok(case)
    }

    fn generate_case_number(&self) -> Result<String, CaseError> {
        let mut candidate = String::new();
        for _ in 0..CASE_NUMBER_ATTEMPTS {
            let suffix = Uuid::new_v4().simple().to_string();
            candidate = format!(
                "{}-{}",
                self.settings.case_number_prefix,
                suffix[..8].to_ascii_uppercase()
            );
            if !self.cases.case_number_exists(&candidate)? {
                return Ok(candidate);
            }
            debug!(%candidate, "generated case number taken, retrying");
        }
        Err(CaseError::Conflict(candidate))
    }

    /// # Errors
    ///
    /// `NotFound` when absent, `Forbidden` when `actor` may not view it.
    pub fn get_case(&self, actor: &Actor, case_id: &CaseId) -> Result<Case, CaseError> {
        let case = self.cases.find_by_id(case_id)?;
        policy::ensure(policy::can_view(actor, &case), actor, Action::View, case_id)?;
        Ok(case)
    }

    /// Move a case to `to` following the transition table.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` or `Forbidden`; see
    /// [`LifecycleEngine::apply`].
    pub fn change_status(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        to: Status,
    ) -> Result<Case, CaseError> {
        self.change_status_with(actor, case_id, StatusChange::new(to))
    }

    /// [`Self::change_status`] with hearing details for Hearing Scheduled.
    ///
    /// # Errors
    ///
    /// As [`Self::change_status`], plus `Validation` when hearing details
    /// accompany any other transition.
    pub fn change_status_with(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        change: StatusChange,
    ) -> Result<Case, CaseError> {
        let case = self.cases.find_by_id(case_id)?;
        lifecycle::authorize(actor, &case, change.to)?;
        self.engine().apply(actor, case_id, change)
    }

    /// # Errors
    ///
    /// See [`LifecycleEngine::assign_lawyer`].
    pub fn assign_lawyer(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Case, CaseError> {
        self.engine().assign_lawyer(actor, case_id, lawyer_id)
    }

    /// # Errors
    ///
    /// `NotFound` when absent, `Forbidden` unless admin or owning client.
    pub fn delete_case(&self, actor: &Actor, case_id: &CaseId) -> Result<(), CaseError> {
        let case = self.cases.find_by_id(case_id)?;
        policy::ensure(policy::can_delete(actor, &case), actor, Action::Delete, case_id)?;
        self.cases.delete_by_id(case_id)?;
        info!(%case_id, actor = %actor.id, "case removed");
        Ok(())
    }

    /// Append an evidence reference uploaded by `actor`.
    ///
    /// # Errors
    ///
    /// `Validation` on a blank reference, `NotFound`, or `Forbidden`.
    pub fn attach_evidence(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        file_ref: &str,
    ) -> Result<Case, CaseError> {
        let file_ref = required("file reference", file_ref)?;
        let mut case = self.cases.find_by_id(case_id)?;
        policy::ensure(
            policy::can_attach_evidence(actor, &case),
            actor,
            Action::AttachEvidence,
            case_id,
        )?;
        case.evidence.push(EvidenceRef {
            file_ref,
            uploaded_by: actor.id.clone(),
            uploaded_at: Utc::now(),
        });
        let saved = self.cases.save(&case)?;
        info!(%case_id, actor = %actor.id, count = saved.evidence().len(), "evidence attached");
        Ok(saved)
    }

    /// Append a hearing record without changing status.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Forbidden` unless `actor` can edit the case.
    pub fn add_hearing(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        hearing: HearingDraft,
    ) -> Result<Case, CaseError> {
        let mut case = self.cases.find_by_id(case_id)?;
        policy::ensure(policy::can_edit(actor, &case), actor, Action::Edit, case_id)?;
        case.hearings
            .push(lifecycle::hearing_record(actor, hearing, Utc::now()));
        let saved = self.cases.save(&case)?;
        info!(%case_id, actor = %actor.id, "hearing recorded");
        Ok(saved)
    }

    /// Add or upgrade an access-list entry for `user_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing case or user, `Forbidden` unless `actor`
    /// can edit the case.
    pub fn grant_access(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        user_id: &UserId,
        permission: Permission,
    ) -> Result<Case, CaseError> {
        let mut case = self.cases.find_by_id(case_id)?;
        policy::ensure(
            policy::can_edit(actor, &case),
            actor,
            Action::GrantAccess,
            case_id,
        )?;
        let user = self
            .users
            .find(user_id)?
            .ok_or_else(|| CaseError::not_found(Entity::User, user_id))?;
        case.grant(user.id, permission);
        let saved = self.cases.save(&case)?;
        info!(%case_id, user = %user_id, %permission, actor = %actor.id, "access granted");
        Ok(saved)
    }

    /// Edit title and description; set the category only while unset.
    ///
    /// # Errors
    ///
    /// `Validation` on an empty patch, a blank field, or a different
    /// category on a categorized case; `NotFound`; `Forbidden`.
    pub fn update_details(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        patch: CasePatch,
    ) -> Result<Case, CaseError> {
        if patch == CasePatch::default() {
            return Err(CaseError::validation("nothing to update"));
        }
        let mut case = self.cases.find_by_id(case_id)?;
        policy::ensure(policy::can_edit(actor, &case), actor, Action::Edit, case_id)?;

        if let Some(title) = patch.title {
            case.title = required("title", &title)?;
        }
        if let Some(description) = patch.description {
            case.description = required("description", &description)?;
        }
        if let Some(category) = patch.category {
            match case.category {
                Some(existing) if existing != category => {
                    return Err(CaseError::validation(format!(
                        "category is already {existing} and cannot change"
                    )));
                }
                _ => case.category = Some(category),
            }
        }

        let saved = self.cases.save(&case)?;
        info!(%case_id, actor = %actor.id, "case details updated");
        Ok(saved)
    }

    /// The actor's own notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list_notifications(
        &self,
        actor: &Actor,
        unread_only: bool,
    ) -> Result<Vec<Notification>, CaseError> {
        self.notifier.list(&actor.id, unread_only)
    }

    /// # Errors
    ///
    /// `NotFound` unless `actor` is the recipient.
    pub fn mark_notification_read(
        &self,
        actor: &Actor,
        id: &NotificationId,
    ) -> Result<Notification, CaseError> {
        self.notifier.mark_read(id, &actor.id)
    }
}

fn required(field: &str, value: &str) -> Result<String, CaseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CaseError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{CaseService, ServiceSettings};
    use crate::config::CasebookConfig;
    use crate::db;
    use crate::error::CaseError;
    use crate::model::{
        Actor, CaseDraft, CaseId, CasePatch, Category, HearingDraft, Permission, Role, Status,
        UserId,
    };
    use crate::store::{SqliteCaseStore, SqliteNotificationStore, SqliteUserDirectory};
    use rusqlite::Connection;

    fn draft(title: &str, category: Option<Category>) -> CaseDraft {
        CaseDraft {
            case_number: None,
            title: title.into(),
            description: "Boundary fence".into(),
            category,
        }
    }

    struct Fixture {
        conn: Connection,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                conn: db::open_in_memory().unwrap(),
            }
        }

        fn run<T>(&self, f: impl FnOnce(&CaseService<'_>, &SqliteUserDirectory<'_>) -> T) -> T {
            self.run_with(&CasebookConfig::default(), f)
        }

        fn run_with<T>(
            &self,
            config: &CasebookConfig,
            f: impl FnOnce(&CaseService<'_>, &SqliteUserDirectory<'_>) -> T,
        ) -> T {
            let cases = SqliteCaseStore::new(&self.conn);
            let users = SqliteUserDirectory::new(&self.conn);
            let notes = SqliteNotificationStore::new(&self.conn);
            let service = CaseService::with_config(&cases, &users, &notes, config);
            f(&service, &users)
        }
    }

    #[test]
    fn file_case_forces_client_and_generates_number() {
        Fixture::new().run(|service, _| {
            let client = Actor::client("client-1", "Cee");
            let case = service
                .file_case(&client, draft("  Dispute  ", Some(Category::Civil)))
                .unwrap();
            assert_eq!(case.client(), &client.id);
            assert_eq!(case.title(), "Dispute");
            assert_eq!(case.status(), Status::Filed);
            assert!(case.lawyer().is_none());
            assert!(case.case_number().starts_with("CASE-"));
            assert_eq!(case.case_number().len(), "CASE-".len() + 8);

            let admin = Actor::admin("admin", "Root");
            let filed_by_admin = service.file_case(&admin, draft("Other", None)).unwrap();
            assert_eq!(filed_by_admin.client(), &admin.id);
            assert_ne!(filed_by_admin.case_number(), case.case_number());
        });
    }

    #[test]
    fn file_case_validates_input() {
        Fixture::new().run(|service, _| {
            let client = Actor::client("client-1", "Cee");
            assert!(matches!(
                service.file_case(&client, draft("   ", None)),
                Err(CaseError::Validation(_))
            ));

            let mut blank_number = draft("Dispute", None);
            blank_number.case_number = Some("  ".into());
            assert!(matches!(
                service.file_case(&client, blank_number),
                Err(CaseError::Validation(_))
            ));

            let mut numbered = draft("Dispute", None);
            numbered.case_number = Some("LAW-7".into());
            let first = service.file_case(&client, numbered.clone()).unwrap();
            assert_eq!(first.case_number(), "LAW-7");
            assert!(matches!(
                service.file_case(&client, numbered),
                Err(CaseError::Conflict(_))
            ));
        });
    }

    #[test]
    fn config_controls_prefix_and_required_category() {
        let mut config = CasebookConfig::default();
        config.cases.case_number_prefix = "LAW".into();
        config.cases.require_category = true;

        Fixture::new().run_with(&config, |service, _| {
            assert_eq!(
                service.settings(),
                &ServiceSettings {
                    case_number_prefix: "LAW".into(),
                    require_category: true,
                }
            );
            let client = Actor::client("client-1", "Cee");
            assert!(matches!(
                service.file_case(&client, draft("Dispute", None)),
                Err(CaseError::Validation(_))
            ));
            let case = service
                .file_case(&client, draft("Dispute", Some(Category::Family)))
                .unwrap();
            assert!(case.case_number().starts_with("LAW-"));
        });
    }

    #[test]
    fn disabled_notifications_still_transition() {
        let mut config = CasebookConfig::default();
        config.notifications.enabled = false;

        Fixture::new().run_with(&config, |service, _| {
            let client = Actor::client("client-1", "Cee");
            let lawyer = Actor::lawyer("lawyer-1", "Ada", Category::Civil);
            let case = service
                .file_case(&client, draft("Dispute", Some(Category::Civil)))
                .unwrap();
            let accepted = service
                .change_status(&lawyer, case.id(), Status::InProgress)
                .unwrap();
            assert_eq!(accepted.status(), Status::InProgress);
            assert!(service.list_notifications(&client, false).unwrap().is_empty());
        });
    }

    #[test]
    fn get_case_checks_view_permission() {
        Fixture::new().run(|service, _| {
            let client = Actor::client("client-1", "Cee");
            let case = service.file_case(&client, draft("Dispute", None)).unwrap();

            assert_eq!(service.get_case(&client, case.id()).unwrap(), case);
            assert!(matches!(
                service.get_case(&Actor::client("client-2", "Dee"), case.id()),
                Err(CaseError::Forbidden { .. })
            ));
            assert!(matches!(
                service.get_case(&client, &CaseId::new("missing")),
                Err(CaseError::NotFound { .. })
            ));
        });
    }

    #[test]
    fn change_status_on_missing_case_is_not_found() {
        Fixture::new().run(|service, _| {
            let admin = Actor::admin("admin", "Root");
            assert!(matches!(
                service.change_status(&admin, &CaseId::new("missing"), Status::Closed),
                Err(CaseError::NotFound { .. })
            ));
        });
    }

    #[test]
    fn delete_is_limited_to_admin_and_owner() {
        Fixture::new().run(|service, _| {
            let client = Actor::client("client-1", "Cee");
            let first = service.file_case(&client, draft("One", None)).unwrap();
            let second = service.file_case(&client, draft("Two", None)).unwrap();

            assert!(matches!(
                service.delete_case(&Actor::client("client-2", "Dee"), first.id()),
                Err(CaseError::Forbidden { .. })
            ));
            assert!(matches!(
                service.delete_case(
                    &Actor::lawyer("lawyer-1", "Ada", Category::Civil),
                    first.id()
                ),
                Err(CaseError::Forbidden { .. })
            ));
            service.delete_case(&client, first.id()).unwrap();
            service
                .delete_case(&Actor::admin("admin", "Root"), second.id())
                .unwrap();
            assert!(service.list_cases(&client).unwrap().is_empty());
            assert!(matches!(
                service.delete_case(&client, first.id()),
                Err(CaseError::NotFound { .. })
            ));
        });
    }

    #[test]
    fn evidence_is_appended_in_order() {
        Fixture::new().run(|service, _| {
            let client = Actor::client("client-1", "Cee");
            let case = service.file_case(&client, draft("Dispute", None)).unwrap();

            service
                .attach_evidence(&client, case.id(), "files/deed.pdf")
                .unwrap();
            let updated = service
                .attach_evidence(&client, case.id(), "files/photo.jpg")
                .unwrap();
            let refs: Vec<_> = updated
                .evidence()
                .iter()
                .map(|e| e.file_ref.as_str())
                .collect();
            assert_eq!(refs, ["files/deed.pdf", "files/photo.jpg"]);
            assert_eq!(updated.evidence()[0].uploaded_by, client.id);
            assert!(updated.updated_at() > case.updated_at());

            assert!(matches!(
                service.attach_evidence(&client, case.id(), "  "),
                Err(CaseError::Validation(_))
            ));
            assert!(matches!(
                service.attach_evidence(&Actor::client("client-2", "Dee"), case.id(), "x"),
                Err(CaseError::Forbidden { .. })
            ));
        });
    }

    #[test]
    fn grant_access_requires_edit_and_known_user() {
        Fixture::new().run(|service, users| {
            let client = Actor::client("client-1", "Cee");
            let admin = Actor::admin("admin", "Root");
            let reviewer = users
                .register("Rex", Role::Lawyer, Some(Category::Family))
                .unwrap();
            let reviewer_actor = Actor::from(reviewer.clone());
            let case = service
                .file_case(&client, draft("Dispute", Some(Category::Civil)))
                .unwrap();

            assert!(matches!(
                service.grant_access(&client, case.id(), &reviewer.id, Permission::View),
                Err(CaseError::Forbidden { .. })
            ));
            assert!(matches!(
                service.grant_access(&admin, case.id(), &UserId::new("ghost"), Permission::View),
                Err(CaseError::NotFound { .. })
            ));

            service
                .grant_access(&admin, case.id(), &reviewer.id, Permission::View)
                .unwrap();
            assert!(service.get_case(&reviewer_actor, case.id()).is_ok());
            assert_eq!(service.list_cases(&reviewer_actor).unwrap().len(), 1);
            assert!(matches!(
                service.update_details(
                    &reviewer_actor,
                    case.id(),
                    CasePatch {
                        title: Some("Renamed".into()),
                        ..CasePatch::default()
                    }
                ),
                Err(CaseError::Forbidden { .. })
            ));

            let upgraded = service
                .grant_access(&admin, case.id(), &reviewer.id, Permission::Edit)
                .unwrap();
            assert_eq!(upgraded.access_list().len(), 1);
            assert_eq!(upgraded.grant_for(&reviewer.id), Some(Permission::Edit));
        });
    }

    #[test]
    fn update_details_sets_category_once() {
        Fixture::new().run(|service, _| {
            let client = Actor::client("client-1", "Cee");
            let admin = Actor::admin("admin", "Root");
            let case = service.file_case(&client, draft("Dispute", None)).unwrap();

            assert!(matches!(
                service.update_details(&admin, case.id(), CasePatch::default()),
                Err(CaseError::Validation(_))
            ));

            let categorized = service
                .update_details(
                    &admin,
                    case.id(),
                    CasePatch {
                        title: Some("Fence dispute".into()),
                        category: Some(Category::Civil),
                        ..CasePatch::default()
                    },
                )
                .unwrap();
            assert_eq!(categorized.title(), "Fence dispute");
            assert_eq!(categorized.category(), Some(Category::Civil));
            assert_eq!(categorized.client(), &client.id);

            assert!(matches!(
                service.update_details(
                    &admin,
                    case.id(),
                    CasePatch {
                        category: Some(Category::Criminal),
                        ..CasePatch::default()
                    }
                ),
                Err(CaseError::Validation(_))
            ));
            assert!(matches!(
                service.update_details(
                    &admin,
                    case.id(),
                    CasePatch {
                        description: Some(" ".into()),
                        ..CasePatch::default()
                    }
                ),
                Err(CaseError::Validation(_))
            ));
        });
    }

    #[test]
    fn add_hearing_keeps_status_and_requires_edit() {
        Fixture::new().run(|service, _| {
            let client = Actor::client("client-1", "Cee");
            let lawyer = Actor::lawyer("lawyer-1", "Ada", Category::Civil);
            let case = service
                .file_case(&client, draft("Dispute", Some(Category::Civil)))
                .unwrap();
            service
                .change_status(&lawyer, case.id(), Status::InProgress)
                .unwrap();

            assert!(matches!(
                service.add_hearing(&client, case.id(), HearingDraft::default()),
                Err(CaseError::Forbidden { .. })
            ));
            let with_hearing = service
                .add_hearing(
                    &lawyer,
                    case.id(),
                    HearingDraft {
                        notes: Some("Preliminary".into()),
                        ..HearingDraft::default()
                    },
                )
                .unwrap();
            assert_eq!(with_hearing.status(), Status::InProgress);
            assert_eq!(with_hearing.hearings().len(), 1);
            assert_eq!(
                with_hearing.hearings()[0].notes.as_deref(),
                Some("Preliminary")
            );
        });
    }

    #[test]
    fn list_cases_filters_by_status_and_limit() {
        Fixture::new().run(|service, _| {
            let client = Actor::client("client-1", "Cee");
            let lawyer = Actor::lawyer("lawyer-1", "Ada", Category::Civil);
            let first = service
                .file_case(&client, draft("One", Some(Category::Civil)))
                .unwrap();
            let second = service
                .file_case(&client, draft("Two", Some(Category::Civil)))
                .unwrap();
            service
                .change_status(&lawyer, first.id(), Status::InProgress)
                .unwrap();

            let all = service.list_cases(&client).unwrap();
            let ids: Vec<_> = all.iter().map(|c| c.id().clone()).collect();
            assert_eq!(ids, vec![second.id().clone(), first.id().clone()]);

            let filed = service
                .list_cases_with(&client, Some(Status::Filed), None)
                .unwrap();
            assert_eq!(filed.len(), 1);
            assert_eq!(filed[0].id(), second.id());

            let limited = service.list_cases_with(&client, None, Some(1)).unwrap();
            assert_eq!(limited.len(), 1);
        });
    }
}
