// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Kubeconfig file handling.
//!
//! Only the fields the provider touches are typed; everything else is carried
//! through unchanged as raw YAML.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value as Yaml;
use thiserror::Error;

use super::types::{context_name, WriteKubeconfigOptions};

/// Environment variable listing kubeconfig files.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

#[derive(Error, Debug)]
pub enum KubeconfigError {
    #[error("Failed to read kubeconfig {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write kubeconfig {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse kubeconfig: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Kubeconfig {0} already exists")]
    AlreadyExists(PathBuf),

    #[error("Entry '{name}' already exists in {kind} with different content")]
    Conflict { kind: &'static str, name: String },

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// A named `clusters` or `users` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
    #[serde(flatten)]
    pub body: BTreeMap<String, Yaml>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextRef {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Yaml>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    #[serde(default)]
    pub context: ContextRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kubeconfig {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub clusters: Vec<NamedEntry>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub users: Vec<NamedEntry>,
    #[serde(rename = "current-context", default)]
    pub current_context: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Yaml>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

impl Default for Kubeconfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            clusters: Vec::new(),
            contexts: Vec::new(),
            users: Vec::new(),
            current_context: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// User entry name k3d uses for a cluster.
pub fn user_name(cluster_name: &str) -> String {
    format!("admin@{}", context_name(cluster_name))
}

fn merge_named<T: Clone + PartialEq>(
    kind: &'static str,
    target: &mut Vec<T>,
    incoming: Vec<T>,
    name_of: impl Fn(&T) -> &str,
    overwrite: bool,
) -> Result<(), KubeconfigError> {
    for entry in incoming {
        match target.iter().position(|e| name_of(e) == name_of(&entry)) {
            Some(i) if target[i] == entry => {}
            Some(i) if overwrite => target[i] = entry,
            Some(_) => {
                return Err(KubeconfigError::Conflict {
                    kind,
                    name: name_of(&entry).to_string(),
                })
            }
            None => target.push(entry),
        }
    }
    Ok(())
}

impl Kubeconfig {
    pub fn parse(raw: &str) -> Result<Self, KubeconfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Load a kubeconfig, `None` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, KubeconfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(KubeconfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn to_yaml(&self) -> Result<String, KubeconfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Merge entries of `other` into `self`. Same-named entries with
    /// different content are replaced when `overwrite` is set and rejected
    /// otherwise.
    pub fn merge(&mut self, other: Kubeconfig, overwrite: bool) -> Result<(), KubeconfigError> {
        merge_named("clusters", &mut self.clusters, other.clusters, |e| e.name.as_str(), overwrite)?;
        merge_named("users", &mut self.users, other.users, |e| e.name.as_str(), overwrite)?;
        merge_named("contexts", &mut self.contexts, other.contexts, |e| e.name.as_str(), overwrite)?;
        Ok(())
    }

    /// Remove every entry belonging to a k3d cluster. Returns whether
    /// anything was removed.
    pub fn remove_cluster(&mut self, cluster_name: &str) -> bool {
        let context = context_name(cluster_name);
        let user = user_name(cluster_name);
        let before = self.clusters.len() + self.users.len() + self.contexts.len();

        self.clusters.retain(|c| c.name != context);
        self.users.retain(|u| u.name != user);
        self.contexts.retain(|c| c.name != context);
        if self.current_context == context {
            self.current_context.clear();
        }

        before != self.clusters.len() + self.users.len() + self.contexts.len()
    }

    pub fn has_context(&self, name: &str) -> bool {
        self.contexts.iter().any(|c| c.name == name)
    }

    /// Write atomically: a temp file in the target directory is renamed over
    /// the destination.
    pub fn write_atomic(&self, path: &Path) -> Result<(), KubeconfigError> {
        let write_err = |source| KubeconfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(write_err)?;

        let yaml = self.to_yaml()?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(yaml.as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

/// Default kubeconfig: first entry of `$KUBECONFIG`, else `~/.kube/config`.
pub fn default_kubeconfig_path() -> Result<PathBuf, KubeconfigError> {
    if let Some(raw) = std::env::var_os(KUBECONFIG_ENV) {
        if let Some(first) = std::env::split_paths(&raw).find(|p| !p.as_os_str().is_empty()) {
            return Ok(first);
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".kube").join("config"))
        .ok_or(KubeconfigError::NoHomeDir)
}

/// Write a cluster's kubeconfig to `path` following `opts`.
pub fn write_kubeconfig(
    mut incoming: Kubeconfig,
    path: &Path,
    opts: WriteKubeconfigOptions,
) -> Result<(), KubeconfigError> {
    let new_context = incoming.current_context.clone();

    let mut target = match Kubeconfig::load(path)? {
        Some(_) if opts.overwrite_existing => incoming,
        Some(mut existing) if opts.update_existing => {
            let keep_context = existing.current_context.clone();
            incoming.current_context.clear();
            existing.merge(incoming, opts.overwrite_existing)?;
            existing.current_context = keep_context;
            existing
        }
        Some(_) => return Err(KubeconfigError::AlreadyExists(path.to_path_buf())),
        None => incoming,
    };

    if opts.update_current_context {
        target.current_context = new_context;
    } else if !target.has_context(&target.current_context) {
        target.current_context.clear();
    }

    target.write_atomic(path)
}

/// Remove a k3d cluster's entries from the kubeconfig at `path`. A missing
/// file has nothing to remove.
pub fn remove_cluster_from_file(path: &Path, cluster_name: &str) -> Result<(), KubeconfigError> {
    let Some(mut config) = Kubeconfig::load(path)? else {
        return Ok(());
    };
    if config.remove_cluster(cluster_name) {
        config.write_atomic(path)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "kubeconfig_tests.rs"]
mod tests;
