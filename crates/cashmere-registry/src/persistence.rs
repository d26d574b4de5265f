use cashmere_core::{CashmereError, Signifier};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Write-through file persistence mirroring the reference layout:
/// `rdf/{id}_v{version}.ttl`, `json/{id}.json`,
/// `indexes/property_index.json`. The property index is re-serialized
/// on every mutation, matching the reference's unbatched write.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Result<Self, CashmereError> {
        for sub in ["rdf", "json", "indexes"] {
            fs::create_dir_all(root.join(sub))
                .map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))?;
        }
        Ok(FileStore { root })
    }

    pub fn save_document(&self, signifier: &Signifier) -> Result<(), CashmereError> {
        let path = self.root.join("json").join(format!("{}.json", signifier.signifier_id));
        let text = serde_json::to_string_pretty(signifier)
            .map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))?;
        fs::write(path, text).map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))
    }

    pub fn save_rdf(&self, id: &str, version: u32, text: &str) -> Result<(), CashmereError> {
        let path = self.root.join("rdf").join(format!("{id}_v{version}.ttl"));
        fs::write(path, text).map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))
    }

    pub fn delete_document(&self, id: &str) -> Result<(), CashmereError> {
        let json_path = self.root.join("json").join(format!("{id}.json"));
        if json_path.exists() {
            fs::remove_file(&json_path).map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))?;
        }
        let rdf_dir = self.root.join("rdf");
        if let Ok(entries) = fs::read_dir(&rdf_dir) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with(&format!("{id}_v")) && name.ends_with(".ttl") {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }
        Ok(())
    }

    pub fn save_property_index(
        &self,
        index: &HashMap<(String, String), std::collections::HashSet<String>>,
    ) -> Result<(), CashmereError> {
        let joined: HashMap<String, Vec<String>> = index
            .iter()
            .map(|((artifact, property), ids)| {
                let mut ids: Vec<String> = ids.iter().cloned().collect();
                ids.sort();
                (format!("{artifact}|{property}"), ids)
            })
            .collect();
        let path = self.root.join("indexes").join("property_index.json");
        let text = serde_json::to_string_pretty(&joined)
            .map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))?;
        fs::write(path, text).map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))
    }

    pub fn load_all_documents(&self) -> Result<Vec<(String, Signifier)>, CashmereError> {
        let dir = self.root.join("json");
        let mut out = Vec::new();
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(_) => return Ok(out),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = fs::read_to_string(&path)
                .map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))?;
            let signifier: Signifier = serde_json::from_str(&text)
                .map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))?;
            out.push((signifier.signifier_id.clone(), signifier));
        }
        Ok(out)
    }

    pub fn load_all_rdf(&self) -> Result<Vec<((String, u32), String)>, CashmereError> {
        let dir = self.root.join("rdf");
        let mut out = Vec::new();
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(_) => return Ok(out),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some((id, version_part)) = stem.rsplit_once("_v") else {
                continue;
            };
            let Ok(version) = version_part.parse::<u32>() else {
                continue;
            };
            let text = fs::read_to_string(&path)
                .map_err(|e| CashmereError::Internal(anyhow::anyhow!(e)))?;
            out.push(((id.to_string(), version), text));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashmere_core::{IntentContext, IntentionDescription, Provenance, SignifierStatus};

    fn sample() -> Signifier {
        Signifier {
            signifier_id: "s1".to_string(),
            version: 1,
            status: SignifierStatus::Active,
            intent: IntentionDescription {
                nl_text: "raise the blinds".to_string(),
                structured: None,
            },
            context: IntentContext::default(),
            affordance_uri: "http://example.org/affordances#RaiseBlinds".to_string(),
            provenance: Provenance {
                created_at: chrono::Utc::now(),
                created_by: "tester".to_string(),
                source: "manual".to_string(),
            },
            indexes: serde_json::Map::new(),
        }
    }

    #[test]
    fn round_trips_document_and_rdf() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        store.save_document(&sample()).unwrap();
        store.save_rdf("s1", 1, "@prefix ex: <http://example.org/> .").unwrap();

        let docs = store.load_all_documents().unwrap();
        assert_eq!(docs.len(), 1);
        let rdf = store.load_all_rdf().unwrap();
        assert_eq!(rdf.len(), 1);
        assert_eq!(rdf[0].0, ("s1".to_string(), 1));
    }

    #[test]
    fn delete_removes_json_and_all_rdf_versions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        store.save_document(&sample()).unwrap();
        store.save_rdf("s1", 1, "a").unwrap();
        store.save_rdf("s1", 2, "b").unwrap();
        store.delete_document("s1").unwrap();
        assert!(store.load_all_documents().unwrap().is_empty());
        assert!(store.load_all_rdf().unwrap().is_empty());
    }
}
