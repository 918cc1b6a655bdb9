//! NGO registry: accounts, profile setup, approval and rescue statistics.

use std::sync::Arc;

use chrono::Utc;
use pawlink_common::{AppError, AppResult, IdGenerator};
use pawlink_db::{
    entities::ngo_profile::{self, NgoStatus},
    repositories::{NgoFilter, ProfileSetup, SharedNgoStore},
};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use super::animal::AnimalKind;
use super::geo::GeoPoint;
use super::password::{hash_password, verify_password};
use crate::Actor;

/// Produces an NGO's rating after its statistics change.
pub trait RatingPolicy: Send + Sync {
    /// Rating for the profile as it stands after the change.
    fn rating(&self, profile: &ngo_profile::Model) -> f64;
}

/// Keeps whatever rating is stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRatingPolicy;

impl RatingPolicy for NoOpRatingPolicy {
    fn rating(&self, profile: &ngo_profile::Model) -> f64 {
        profile.rating
    }
}

/// NGO registry service.
#[derive(Clone)]
pub struct NgoRegistry {
    store: SharedNgoStore,
    rating_policy: Arc<dyn RatingPolicy>,
    id_gen: IdGenerator,
}

/// Input for registering an NGO account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterNgoInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for completing an NGO profile.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSetupInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(max = 2048))]
    pub description: Option<String>,

    /// Capability ids, e.g. `["dogs", "cats"]`.
    #[validate(length(min = 1, max = 8))]
    pub animals: Vec<String>,

    #[serde(default)]
    pub transport: bool,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(default)]
    #[validate(length(max = 512))]
    pub address: String,

    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,

    #[validate(url, length(max = 512))]
    pub website: Option<String>,
}

/// An authenticated NGO with its API token.
#[derive(Debug, Clone)]
pub struct NgoSession {
    pub profile: ngo_profile::Model,
    pub token: String,
}

/// Whether an admin may move an NGO from `from` to `to`.
const fn transition_allowed(from: NgoStatus, to: NgoStatus) -> bool {
    matches!(
        (from, to),
        (NgoStatus::PendingApproval | NgoStatus::Suspended, NgoStatus::Approved)
            | (NgoStatus::Approved, NgoStatus::Suspended)
    )
}

impl NgoRegistry {
    /// Create a registry that keeps stored ratings.
    #[must_use]
    pub fn new(store: SharedNgoStore) -> Self {
        Self {
            store,
            rating_policy: Arc::new(NoOpRatingPolicy),
            id_gen: IdGenerator::new(),
        }
    }

    /// Replace the rating policy.
    #[must_use]
    pub fn with_rating_policy(mut self, policy: Arc<dyn RatingPolicy>) -> Self {
        self.rating_policy = policy;
        self
    }

    /// Register an NGO account. It starts `PendingApproval` with an incomplete profile.
    pub async fn register(&self, input: RegisterNgoInput) -> AppResult<ngo_profile::Model> {
        input.validate()?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        let email = input.email.trim().to_lowercase();

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "An NGO with this email already exists".to_string(),
            ));
        }

        let model = ngo_profile::Model {
            id: self.id_gen.generate(),
            name: name.to_string(),
            email,
            password: hash_password(&input.password)?,
            token: Some(self.id_gen.generate_token()),
            description: None,
            status: NgoStatus::PendingApproval,
            animals: serde_json::json!([]),
            transport: false,
            latitude: 0.0,
            longitude: 0.0,
            address: String::new(),
            contact_phone: None,
            website: None,
            total_rescues: 0,
            rating: 0.0,
            profile_complete: false,
            registered_at: Utc::now().into(),
            approved_at: None,
        };

        let profile = self.store.create(model).await?;
        info!(ngo_id = %profile.id, "NGO registered");
        Ok(profile)
    }

    /// Complete the NGO's profile. Status is left unchanged.
    ///
    /// Only the NGO itself or an admin may do this.
    pub async fn complete_setup(
        &self,
        actor: &Actor,
        id: &str,
        input: ProfileSetupInput,
    ) -> AppResult<ngo_profile::Model> {
        if !actor.is_admin() && actor.id() != id {
            return Err(AppError::Forbidden(
                "Cannot edit another NGO's profile".to_string(),
            ));
        }
        input.validate()?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let mut animals: Vec<String> = Vec::with_capacity(input.animals.len());
        for raw in &input.animals {
            let kind = AnimalKind::from_capability(raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown animal type: {}", raw.trim()))
            })?;
            let capability = kind.as_str().to_string();
            if !animals.contains(&capability) {
                animals.push(capability);
            }
        }
        if animals.is_empty() {
            return Err(AppError::Validation(
                "Select at least one animal type".to_string(),
            ));
        }

        let location = GeoPoint::new(input.latitude, input.longitude);
        let address = input.address.trim();
        if !location.in_range() {
            return Err(AppError::Validation("Coordinates are out of range".to_string()));
        }
        if location.is_unset() && address.is_empty() {
            return Err(AppError::Validation("Location is required".to_string()));
        }

        let setup = ProfileSetup {
            name: name.to_string(),
            description: trimmed(input.description),
            animals,
            transport: input.transport,
            latitude: location.latitude,
            longitude: location.longitude,
            address: address.to_string(),
            contact_phone: trimmed(input.contact_phone),
            website: trimmed(input.website),
        };

        let profile = self.store.update_setup(id, &setup).await?;
        info!(ngo_id = %id, animals = ?setup.animals, "NGO profile completed");
        Ok(profile)
    }

    /// Change an NGO's approval status. Admin only.
    ///
    /// Re-applying the current status is a no-op.
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: &str,
        status: NgoStatus,
    ) -> AppResult<ngo_profile::Model> {
        let admin_id = actor.admin_id()?;
        let profile = self.store.get_by_id(id).await?;

        if profile.status == status {
            return Ok(profile);
        }
        if !transition_allowed(profile.status, status) {
            return Err(AppError::Validation(format!(
                "Cannot change NGO status from {} to {}",
                profile.status.as_str(),
                status.as_str()
            )));
        }

        let updated = self.store.update_status(id, status, Utc::now()).await?;
        info!(
            ngo_id = %id,
            admin_id = %admin_id,
            from = profile.status.as_str(),
            to = status.as_str(),
            "NGO status changed"
        );
        Ok(updated)
    }

    /// Add one rescue to the NGO's count and refresh its rating.
    pub async fn record_rescue(&self, id: &str) -> AppResult<ngo_profile::Model> {
        let profile = self.store.increment_rescues(id).await?;
        self.apply_rating(profile).await
    }

    /// Recompute the rating of an NGO whose rescue count was already updated.
    pub async fn refresh_rating(&self, id: &str) -> AppResult<ngo_profile::Model> {
        let profile = self.store.get_by_id(id).await?;
        self.apply_rating(profile).await
    }

    async fn apply_rating(&self, profile: ngo_profile::Model) -> AppResult<ngo_profile::Model> {
        let rating = self.rating_policy.rating(&profile);
        if !rating.is_finite() || rating == profile.rating {
            return Ok(profile);
        }

        debug!(ngo_id = %profile.id, rating, "NGO rating updated");
        self.store.update_rating(&profile.id, rating).await
    }

    /// Get an NGO by ID.
    pub async fn get(&self, id: &str) -> AppResult<ngo_profile::Model> {
        self.store.get_by_id(id).await
    }

    /// Find NGOs matching a filter.
    pub async fn find(&self, filter: &NgoFilter) -> AppResult<Vec<ngo_profile::Model>> {
        self.store.list(filter).await
    }

    /// Resolve an API token to its NGO.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<ngo_profile::Model>> {
        self.store.find_by_token(token).await
    }

    /// Authenticate an NGO by email and password.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<NgoSession> {
        let profile = self
            .store
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &profile.password)? {
            return Err(AppError::Unauthorized);
        }
        let token = profile.token.clone().ok_or(AppError::Unauthorized)?;

        Ok(NgoSession { profile, token })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::fixtures::{ORIGIN, ngo_at, seed_ngo};
    use pawlink_db::MemoryStore;

    fn registry(store: &MemoryStore) -> NgoRegistry {
        NgoRegistry::new(Arc::new(store.clone()))
    }

    fn admin() -> Actor {
        Actor::Admin { id: "admin1".into() }
    }

    fn register_input(email: &str) -> RegisterNgoInput {
        RegisterNgoInput {
            name: "Paws Trust".to_string(),
            email: email.to_string(),
            password: "s3cret-pass".to_string(),
        }
    }

    fn setup_input(animals: &[&str]) -> ProfileSetupInput {
        ProfileSetupInput {
            name: "Paws Trust".to_string(),
            description: Some("Street animal rescue".to_string()),
            animals: animals.iter().map(ToString::to_string).collect(),
            transport: true,
            latitude: ORIGIN.latitude,
            longitude: ORIGIN.longitude,
            address: "Koramangala".to_string(),
            contact_phone: None,
            website: Some("https://paws.example".to_string()),
        }
    }

    struct PerRescue;

    impl RatingPolicy for PerRescue {
        fn rating(&self, profile: &ngo_profile::Model) -> f64 {
            f64::from(profile.total_rescues).min(5.0)
        }
    }

    #[tokio::test]
    async fn test_register_starts_pending_and_incomplete() {
        let store = MemoryStore::new();
        let ngo = registry(&store)
            .register(register_input("Team@Paws.org"))
            .await
            .unwrap();

        assert_eq!(ngo.status, NgoStatus::PendingApproval);
        assert!(!ngo.profile_complete);
        assert_eq!(ngo.email, "team@paws.org");
        assert_ne!(ngo.password, "s3cret-pass");
        assert!(ngo.token.is_some());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        registry.register(register_input("team@paws.org")).await.unwrap();

        let result = registry.register(register_input("TEAM@paws.org")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        let ngo = registry.register(register_input("team@paws.org")).await.unwrap();

        let session = registry
            .authenticate("team@paws.org", "s3cret-pass")
            .await
            .unwrap();
        assert_eq!(session.profile.id, ngo.id);
        assert_eq!(Some(session.token), ngo.token);

        assert!(matches!(
            registry.authenticate("team@paws.org", "nope-nope").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            registry.authenticate("ghost@paws.org", "s3cret-pass").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_complete_setup() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        let ngo = registry.register(register_input("team@paws.org")).await.unwrap();
        let actor = Actor::Ngo { id: ngo.id.clone() };

        let done = registry
            .complete_setup(&actor, &ngo.id, setup_input(&["Cats", "dogs", "cats"]))
            .await
            .unwrap();

        assert!(done.profile_complete);
        assert_eq!(done.capabilities(), ["cats", "dogs"]);
        assert_eq!(done.status, NgoStatus::PendingApproval);
    }

    #[tokio::test]
    async fn test_complete_setup_requires_capabilities() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        let ngo = registry.register(register_input("team@paws.org")).await.unwrap();
        let actor = Actor::Ngo { id: ngo.id.clone() };

        let empty = registry.complete_setup(&actor, &ngo.id, setup_input(&[])).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let unknown = registry
            .complete_setup(&actor, &ngo.id, setup_input(&["dragons"]))
            .await;
        assert!(matches!(unknown, Err(AppError::Validation(_))));

        let mut nowhere = setup_input(&["dogs"]);
        nowhere.latitude = 0.0;
        nowhere.longitude = 0.0;
        nowhere.address = " ".to_string();
        let unlocated = registry.complete_setup(&actor, &ngo.id, nowhere).await;
        assert!(matches!(unlocated, Err(AppError::Validation(_))));

        assert!(!registry.get(&ngo.id).await.unwrap().profile_complete);
    }

    #[tokio::test]
    async fn test_complete_setup_other_ngo_forbidden() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        let ngo = registry.register(register_input("team@paws.org")).await.unwrap();
        let intruder = Actor::Ngo { id: "someone-else".into() };

        let result = registry
            .complete_setup(&intruder, &ngo.id, setup_input(&["dogs"]))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_set_status_graph() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        seed_ngo(&store, ngo_at("n1", NgoStatus::PendingApproval, &["dogs"], ORIGIN)).await;

        let approved = registry
            .set_status(&admin(), "n1", NgoStatus::Approved)
            .await
            .unwrap();
        assert!(approved.approved_at.is_some());

        // Same status twice is a no-op
        let again = registry
            .set_status(&admin(), "n1", NgoStatus::Approved)
            .await
            .unwrap();
        assert_eq!(again, approved);

        registry
            .set_status(&admin(), "n1", NgoStatus::Suspended)
            .await
            .unwrap();
        let back = registry
            .set_status(&admin(), "n1", NgoStatus::PendingApproval)
            .await;
        assert!(matches!(back, Err(AppError::Validation(_))));

        let reapproved = registry
            .set_status(&admin(), "n1", NgoStatus::Approved)
            .await
            .unwrap();
        assert_eq!(reapproved.approved_at, approved.approved_at);
    }

    #[tokio::test]
    async fn test_set_status_requires_admin_and_known_id() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        seed_ngo(&store, ngo_at("n1", NgoStatus::PendingApproval, &["dogs"], ORIGIN)).await;

        let as_ngo = registry
            .set_status(&Actor::Ngo { id: "n1".into() }, "n1", NgoStatus::Approved)
            .await;
        assert!(matches!(as_ngo, Err(AppError::Forbidden(_))));

        let unknown = registry.set_status(&admin(), "nope", NgoStatus::Approved).await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_rescue_with_default_policy_keeps_rating() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        seed_ngo(&store, ngo_at("n1", NgoStatus::Approved, &["dogs"], ORIGIN)).await;

        let ngo = registry.record_rescue("n1").await.unwrap();
        assert_eq!(ngo.total_rescues, 1);
        assert_eq!(ngo.rating, 0.0);
    }

    #[tokio::test]
    async fn test_record_rescue_applies_policy() {
        let store = MemoryStore::new();
        let registry = registry(&store).with_rating_policy(Arc::new(PerRescue));
        seed_ngo(&store, ngo_at("n1", NgoStatus::Approved, &["dogs"], ORIGIN)).await;

        registry.record_rescue("n1").await.unwrap();
        let ngo = registry.record_rescue("n1").await.unwrap();

        assert_eq!(ngo.total_rescues, 2);
        assert_eq!(ngo.rating, 2.0);
    }

    #[tokio::test]
    async fn test_find_by_status_and_capability() {
        let store = MemoryStore::new();
        let registry = registry(&store);
        seed_ngo(&store, ngo_at("n1", NgoStatus::Approved, &["cats"], ORIGIN)).await;
        seed_ngo(&store, ngo_at("n2", NgoStatus::Approved, &["birds"], ORIGIN)).await;
        seed_ngo(&store, ngo_at("n3", NgoStatus::Suspended, &["cats"], ORIGIN)).await;

        let filter = NgoFilter {
            status: Some(NgoStatus::Approved),
            capability: Some("cats".to_string()),
            search: None,
        };
        let found = registry.find(&filter).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "n1");
    }
}
