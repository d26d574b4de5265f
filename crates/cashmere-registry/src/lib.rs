//! Signifier Registry: the dual-indexed store of canonical documents,
//! per-version RDF text, and the inverted `(artifact, property) ->
//! signifier_id` index, all mutated behind one lock so a reader never
//! observes a partial update.

mod persistence;

use cashmere_core::{CashmereError, Signifier, SignifierStatus};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

pub use persistence::FileStore;

/// Filter/pagination parameters for [`SignifierRegistry::list_filtered`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<SignifierStatus>,
    pub affordance_uri: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// id -> canonical document of the *current* version.
    documents: HashMap<String, Signifier>,
    /// (id, version) -> RDF Turtle text.
    rdf_versions: HashMap<(String, u32), String>,
    /// (artifact_uri, property_uri) -> ids referencing it in their
    /// current version's structured conditions.
    property_index: HashMap<(String, String), HashSet<String>>,
}

impl RegistryState {
    fn reindex_properties(&mut self, id: &str, signifier: &Signifier) {
        for keys in self.property_index.values_mut() {
            keys.remove(id);
        }
        for key in signifier.property_keys() {
            self.property_index
                .entry(key)
                .or_default()
                .insert(id.to_string());
        }
    }

    fn remove_from_index(&mut self, id: &str) {
        for keys in self.property_index.values_mut() {
            keys.remove(id);
        }
    }
}

/// The Signifier Registry. Construct with `in_memory()` for tests or
/// embedded use, or `with_storage()` for write-through persistence
/// matching the reference's `rdf/`, `json/`, `indexes/` layout.
pub struct SignifierRegistry {
    state: RwLock<RegistryState>,
    store: Option<FileStore>,
    base_uri: String,
}

impl SignifierRegistry {
    pub fn in_memory() -> Self {
        SignifierRegistry {
            state: RwLock::new(RegistryState::default()),
            store: None,
            base_uri: "http://example.org/signifiers".to_string(),
        }
    }

    /// Opens (or creates) a file-backed registry at `dir`, loading any
    /// previously persisted signifiers.
    pub fn with_storage(dir: impl Into<PathBuf>) -> Result<Self, CashmereError> {
        let store = FileStore::new(dir.into())?;
        let mut state = RegistryState::default();
        for (id, signifier) in store.load_all_documents()? {
            state.reindex_properties(&id, &signifier);
            state.documents.insert(id, signifier);
        }
        for ((id, version), text) in store.load_all_rdf()? {
            state.rdf_versions.insert((id, version), text);
        }
        Ok(SignifierRegistry {
            state: RwLock::new(state),
            store: Some(store),
            base_uri: "http://example.org/signifiers".to_string(),
        })
    }

    /// Creates a new signifier. If `rdf_data` is supplied it is stored
    /// as-is and a failure to persist it is only logged — the caller
    /// already vouched for it being valid RDF by providing the text. If
    /// RDF is generated instead, a failure to persist it is a hard
    /// error: the registry cannot vouch for a signifier it cannot
    /// represent in RDF.
    pub fn create(
        &self,
        mut signifier: Signifier,
        rdf_data: Option<String>,
    ) -> Result<Signifier, CashmereError> {
        signifier.validate()?;
        signifier.version = 1;

        let mut state = self.state.write();
        if state.documents.contains_key(&signifier.signifier_id) {
            return Err(CashmereError::AlreadyExists(signifier.signifier_id.clone()));
        }

        let rdf_text = match rdf_data {
            Some(text) => text,
            None => cashmere_rdf::generate_rdf(&signifier, Some(&self.base_uri))?,
        };

        let id = signifier.signifier_id.clone();
        state.reindex_properties(&id, &signifier);
        state
            .rdf_versions
            .insert((id.clone(), signifier.version), rdf_text.clone());
        state.documents.insert(id.clone(), signifier.clone());
        drop(state);

        if let Some(store) = &self.store {
            store.save_document(&signifier)?;
            if let Err(e) = store.save_rdf(&id, signifier.version, &rdf_text) {
                tracing::warn!(id, error = %e, "failed to persist provided RDF");
            }
            store.save_property_index(&self.snapshot_property_index())?;
        }

        Ok(signifier)
    }

    /// Parses `raw_rdf` into a signifier and creates it, storing the
    /// original RDF text verbatim.
    pub fn create_from_rdf(&self, raw_rdf: &str) -> Result<Signifier, CashmereError> {
        let signifier = cashmere_rdf::parse_signifier(raw_rdf)?;
        self.create(signifier, Some(raw_rdf.to_string()))
    }

    pub fn get(&self, id: &str) -> Result<Signifier, CashmereError> {
        self.state
            .read()
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| CashmereError::NotFound(id.to_string()))
    }

    /// RDF text for `id`. `version` defaults to the current version.
    pub fn get_rdf(&self, id: &str, version: Option<u32>) -> Result<String, CashmereError> {
        let state = self.state.read();
        let version = match version {
            Some(v) => v,
            None => {
                state
                    .documents
                    .get(id)
                    .ok_or_else(|| CashmereError::NotFound(id.to_string()))?
                    .version
            }
        };
        state
            .rdf_versions
            .get(&(id.to_string(), version))
            .cloned()
            .ok_or_else(|| CashmereError::NotFound(format!("{id}@v{version}")))
    }

    /// Updates a signifier. `bump_version` selects between an in-place
    /// update (same version, old RDF overwritten) and a new version
    /// (old `(id, version)` RDF text remains addressable, but is no
    /// longer the current document).
    pub fn update(
        &self,
        id: &str,
        mut updated: Signifier,
        bump_version: bool,
    ) -> Result<Signifier, CashmereError> {
        updated.signifier_id = id.to_string();

        let mut state = self.state.write();
        let current = state
            .documents
            .get(id)
            .ok_or_else(|| CashmereError::NotFound(id.to_string()))?
            .clone();

        updated.version = if bump_version {
            current.version + 1
        } else {
            current.version
        };
        updated.validate()?;

        let rdf_text = cashmere_rdf::generate_rdf(&updated, Some(&self.base_uri))?;

        state.reindex_properties(id, &updated);
        state
            .rdf_versions
            .insert((id.to_string(), updated.version), rdf_text.clone());
        state.documents.insert(id.to_string(), updated.clone());
        drop(state);

        if let Some(store) = &self.store {
            store.save_document(&updated)?;
            store.save_rdf(id, updated.version, &rdf_text)?;
            store.save_property_index(&self.snapshot_property_index())?;
        }

        Ok(updated)
    }

    /// Toggles status without bumping the version.
    pub fn update_status(
        &self,
        id: &str,
        status: SignifierStatus,
    ) -> Result<Signifier, CashmereError> {
        let mut state = self.state.write();
        let mut current = state
            .documents
            .get(id)
            .ok_or_else(|| CashmereError::NotFound(id.to_string()))?
            .clone();
        current.status = status;
        state.documents.insert(id.to_string(), current.clone());
        drop(state);

        if let Some(store) = &self.store {
            store.save_document(&current)?;
        }
        Ok(current)
    }

    /// Removes every version of `id` and prunes it from the property
    /// index. There is no per-version deletion exposed publicly.
    pub fn delete(&self, id: &str) -> Result<(), CashmereError> {
        let mut state = self.state.write();
        if !state.documents.contains_key(id) {
            return Err(CashmereError::NotFound(id.to_string()));
        }
        state.documents.remove(id);
        state.rdf_versions.retain(|(doc_id, _), _| doc_id != id);
        state.remove_from_index(id);
        drop(state);

        if let Some(store) = &self.store {
            store.delete_document(id)?;
            store.save_property_index(&self.snapshot_property_index())?;
        }
        Ok(())
    }

    /// Lists current-version signifiers, optionally including
    /// deprecated ones.
    pub fn list(&self, include_deprecated: bool) -> Vec<Signifier> {
        self.state
            .read()
            .documents
            .values()
            .filter(|s| include_deprecated || s.status == SignifierStatus::Active)
            .cloned()
            .collect()
    }

    /// Lists current-version signifiers filtered by status and/or
    /// affordance URI, with offset/limit pagination applied after
    /// filtering. `limit` defaults to 100 when unset, matching the
    /// storage layer's default page size.
    pub fn list_filtered(&self, filter: &ListFilter) -> Vec<Signifier> {
        let mut signifiers: Vec<Signifier> = self
            .state
            .read()
            .documents
            .values()
            .filter(|s| filter.status.map_or(true, |status| s.status == status))
            .filter(|s| {
                filter
                    .affordance_uri
                    .as_deref()
                    .map_or(true, |uri| s.affordance_uri == uri)
            })
            .cloned()
            .collect();
        signifiers.sort_by(|a, b| a.signifier_id.cmp(&b.signifier_id));

        let limit = filter.limit.unwrap_or(100);
        signifiers
            .into_iter()
            .skip(filter.offset)
            .take(limit)
            .collect()
    }

    /// Signifier ids whose current version references `(artifact,
    /// property)` in a structured condition.
    pub fn find_by_property(&self, artifact: &str, property: &str) -> Vec<String> {
        self.state
            .read()
            .property_index
            .get(&(artifact.to_string(), property.to_string()))
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn snapshot_property_index(&self) -> HashMap<(String, String), HashSet<String>> {
        self.state.read().property_index.clone()
    }
}
