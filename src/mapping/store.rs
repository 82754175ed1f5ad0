use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::mapping::{AccountMapping, CostCenterCode};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Failed to read mapping file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Mapping file {path} is corrupt: {source}. Fix or remove it before syncing.")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tempo account id to Unit4 work order, persisted as a JSON object.
pub struct MappingStore {
    path: PathBuf,
    mappings: BTreeMap<String, AccountMapping>,
}

impl MappingStore {
    /// Load the mapping file. A missing file is an empty mapping; an
    /// unreadable or corrupt one is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MappingError> {
        let path = path.into();
        let mappings = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| MappingError::Read {
                path: path.clone(),
                source,
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|source| MappingError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, mappings })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.mappings)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lookup(&self, account_id: &str) -> Option<&CostCenterCode> {
        self.mappings.get(account_id).map(|m| &m.cost_center)
    }

    pub fn get(&self, account_id: &str) -> Option<&AccountMapping> {
        self.mappings.get(account_id)
    }

    /// Insert or overwrite the mapping for `account_id`.
    pub fn upsert(
        &mut self,
        account_id: &str,
        cost_center: CostCenterCode,
        display_name: &str,
        sample_reference: Option<&str>,
    ) {
        self.mappings.insert(
            account_id.to_string(),
            AccountMapping {
                cost_center,
                display_name: display_name.to_string(),
                sample_reference: sample_reference.map(String::from),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
