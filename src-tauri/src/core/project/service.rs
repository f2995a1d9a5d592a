//! Project Service
//!
//! Saves and loads whole projects through a [`ProjectStorage`], using the
//! serialization engine for the tagged tree format.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Project, ProjectDetail, ProjectStorage};
use crate::core::serialization::{
    ClassRegistry, Diagnostic, SerdeError, SerializationEngine, UnknownTagPolicy,
};
use crate::core::{CoreError, CoreResult, ProjectId};

/// Directory (key prefix) holding project files
pub const PROJECTS_PREFIX: &str = "projects";

/// Storage key of a project
pub fn project_key(id: ProjectId) -> String {
    format!("{PROJECTS_PREFIX}/{id}.json")
}

/// A loaded project and what the engine had to degrade while rebuilding it
#[derive(Debug)]
pub struct LoadedProject {
    pub project: Project,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ProjectService<'r> {
    storage: Arc<dyn ProjectStorage>,
    registry: &'r ClassRegistry,
    policy: UnknownTagPolicy,
    pretty: bool,
}

impl<'r> ProjectService<'r> {
    pub fn new(storage: Arc<dyn ProjectStorage>, registry: &'r ClassRegistry) -> Self {
        Self {
            storage,
            registry,
            policy: UnknownTagPolicy::default(),
            pretty: true,
        }
    }

    pub fn with_policy(mut self, policy: UnknownTagPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Indented (default) or compact project files
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn storage(&self) -> &Arc<dyn ProjectStorage> {
        &self.storage
    }

    fn engine(&self) -> SerializationEngine<'r> {
        SerializationEngine::new(self.registry).with_policy(self.policy)
    }

    /// Touches `updatedAt` and writes the project.
    pub async fn save(&self, project: &mut Project) -> CoreResult<()> {
        project.detail.update_timestamp();
        let text = self
            .engine()
            .to_json_string(project, self.pretty)
            .map_err(|e| CoreError::ProjectSaveFailed(e.to_string()))?;

        let key = project_key(project.id());
        self.storage.write(&key, text).await?;
        debug!("Saved project {} to {}", project.id(), key);
        Ok(())
    }

    pub async fn load(&self, id: ProjectId) -> CoreResult<Project> {
        Ok(self.load_with_diagnostics(id).await?.project)
    }

    pub async fn load_with_diagnostics(&self, id: ProjectId) -> CoreResult<LoadedProject> {
        let key = project_key(id);
        let text = self
            .storage
            .read(&key)
            .await?
            .ok_or(CoreError::ProjectNotFound(id))?;

        let (project, diagnostics) = {
            let engine = self.engine();
            let project = engine
                .from_json_str::<Project>(&text)
                .map_err(|e| corrupted(&key, e))?;
            (project, engine.take_diagnostics())
        };

        if !diagnostics.is_empty() {
            warn!(
                "Project {} loaded with {} degraded node(s)",
                id,
                diagnostics.len()
            );
        }
        debug!("Loaded project {} from {}", id, key);
        Ok(LoadedProject {
            project,
            diagnostics,
        })
    }

    /// Removes a project. Returns whether it existed.
    pub async fn delete(&self, id: ProjectId) -> CoreResult<bool> {
        let deleted = self.storage.delete(&project_key(id)).await?;
        if deleted {
            info!("Deleted project {}", id);
        }
        Ok(deleted)
    }

    /// Details of every readable project, most recently updated first.
    /// Unreadable entries are skipped with a warning.
    pub async fn list(&self) -> CoreResult<Vec<ProjectDetail>> {
        let mut details = Vec::new();
        for key in self.storage.list(PROJECTS_PREFIX).await? {
            let text = match self.storage.read(&key).await {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping project {}: {}", key, e);
                    continue;
                }
            };
            match self.read_detail(&text) {
                Ok(detail) => details.push(detail),
                Err(e) => warn!("Skipping project {}: {}", key, e),
            }
        }
        details.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(details)
    }

    fn read_detail(&self, text: &str) -> Result<ProjectDetail, SerdeError> {
        let tree: Value = serde_json::from_str(text)?;
        let detail = tree.get("detail").ok_or_else(|| SerdeError::MissingField {
            field: "detail".to_string(),
            path: "$".to_string(),
        })?;
        self.engine().deserialize(detail)
    }
}

fn corrupted(key: &str, err: SerdeError) -> CoreError {
    CoreError::ProjectCorrupted(format!("{key}: {err}"))
}
