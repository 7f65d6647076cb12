//! Current organization selection.
//!
//! The selected tenant survives restarts, but only as a hint: the membership
//! list is always refetched and [`OrganizationStore::load_memberships`]
//! revalidates the persisted selection against it. The invariant is that
//! `current_organization` is either `None` or one of `organizations` once
//! memberships are loaded.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stockroom_core::{Organization, OrganizationId};

use super::kv::{load_state, save_state, KeyValueStore, PersistenceError};

/// Name of the persisted store.
pub const ORGANIZATION_STORE: &str = "current-organization";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedOrganization {
    current_organization: Option<Organization>,
}

pub struct OrganizationStore {
    current_organization: Option<Organization>,
    organizations: Vec<Organization>,
    is_loading: bool,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl Default for OrganizationStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for OrganizationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizationStore")
            .field("current_organization", &self.current_organization)
            .field("organizations", &self.organizations.len())
            .field("is_loading", &self.is_loading)
            .finish()
    }
}

impl OrganizationStore {
    pub fn in_memory() -> Self {
        Self {
            current_organization: None,
            organizations: Vec::new(),
            is_loading: true,
            store: None,
        }
    }

    /// Hydrate the persisted selection. Memberships start empty and
    /// `is_loading` stays true until they are loaded.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let persisted = match load_state::<PersistedOrganization>(store.as_ref(), ORGANIZATION_STORE) {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, store = ORGANIZATION_STORE, "Failed to load persisted organization");
                PersistedOrganization::default()
            }
        };
        Self {
            current_organization: persisted.current_organization,
            organizations: Vec::new(),
            is_loading: true,
            store: Some(store),
        }
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let state = PersistedOrganization {
            current_organization: self.current_organization.clone(),
        };
        save_state(store.as_ref(), ORGANIZATION_STORE, &state)
    }

    pub fn current_organization(&self) -> Option<&Organization> {
        self.current_organization.as_ref()
    }

    pub fn current_organization_id(&self) -> Option<OrganizationId> {
        self.current_organization.as_ref().map(|org| org.id)
    }

    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
    }

    /// Install freshly fetched memberships and revalidate the selection.
    ///
    /// A selection still present in `organizations` is kept (refreshed with
    /// the server copy); otherwise the first membership is selected, or none
    /// when the user belongs to no organization.
    pub fn load_memberships(
        &mut self,
        organizations: Vec<Organization>,
    ) -> Result<(), PersistenceError> {
        let selected = self
            .current_organization
            .as_ref()
            .and_then(|current| organizations.iter().find(|org| org.id == current.id))
            .or_else(|| organizations.first())
            .cloned();

        if selected.as_ref().map(|org| org.id) != self.current_organization_id() {
            tracing::debug!(
                previous = ?self.current_organization_id(),
                selected = ?selected.as_ref().map(|org| org.id),
                "Revalidated current organization"
            );
        }

        self.organizations = organizations;
        self.current_organization = selected;
        self.is_loading = false;
        self.persist()
    }

    /// Select a member organization. Unknown ids are ignored.
    ///
    /// Returns whether the selection changed.
    pub fn switch_organization(&mut self, id: OrganizationId) -> Result<bool, PersistenceError> {
        let Some(organization) = self.organizations.iter().find(|org| org.id == id).cloned() else {
            return Ok(false);
        };
        self.current_organization = Some(organization);
        self.persist()?;
        Ok(true)
    }

    /// Sign-out: forget everything and wait for the next load.
    pub fn reset(&mut self) -> Result<(), PersistenceError> {
        self.current_organization = None;
        self.organizations.clear();
        self.is_loading = true;
        self.persist()
    }
}
