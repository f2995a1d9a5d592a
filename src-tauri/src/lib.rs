//! QuranCaption Core Library
//!
//! Editing core for captioning Quran recitation videos: the timeline and its
//! interval rules, the tagged project document, subtitle export, and the
//! session that owns the open project.

pub mod core;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{debug, info, warn};

use crate::core::assets::DurationProbe;
use crate::core::project::{Project, ProjectService};
use crate::core::values::Duration;
use crate::core::{AssetId, CoreError, CoreResult, ProjectId, TimeMs};

// =============================================================================
// Project Session
// =============================================================================

/// A duration probe owed to an imported asset.
///
/// Holds the session generation at import time so that a result arriving
/// after the project was closed or replaced is dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingProbe {
    pub generation: u64,
    pub project_id: ProjectId,
    pub asset_id: AssetId,
    pub file_path: String,
}

impl PendingProbe {
    /// Runs the probe. The session is not borrowed while it runs.
    pub async fn run(&self, probe: &dyn DurationProbe) -> CoreResult<TimeMs> {
        probe.duration_ms(&self.file_path).await
    }
}

/// The currently open project
#[derive(Debug, Default)]
pub struct ProjectSession {
    project: Option<Project>,
    /// Bumped every time the open project changes
    generation: u64,
}

impl ProjectSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `project`, replacing the current one.
    pub fn open(&mut self, project: Project) -> Option<Project> {
        self.generation += 1;
        info!(
            "Opened project {} ({})",
            project.detail.name,
            project.id()
        );
        self.project.replace(project)
    }

    /// Closes the current project and hands it back.
    pub fn close(&mut self) -> Option<Project> {
        self.generation += 1;
        let closed = self.project.take();
        if let Some(project) = &closed {
            info!("Closed project {}", project.id());
        }
        closed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_open(&self) -> bool {
        self.project.is_some()
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn project_mut(&mut self) -> Option<&mut Project> {
        self.project.as_mut()
    }

    /// The open project, or [`CoreError::NoProjectOpen`]
    pub fn require_project(&mut self) -> CoreResult<&mut Project> {
        self.project.as_mut().ok_or(CoreError::NoProjectOpen)
    }

    /// Loads project `id` through `service` and opens it.
    pub async fn open_from(&mut self, service: &ProjectService<'_>, id: ProjectId) -> CoreResult<()> {
        let project = service.load(id).await?;
        self.open(project);
        Ok(())
    }

    /// Saves the open project through `service`.
    pub async fn save(&mut self, service: &ProjectService<'_>) -> CoreResult<()> {
        let project = self.require_project()?;
        project.refresh_detail();
        service.save(project).await
    }

    /// Adds the file at `file_path` to the open project with a zero duration.
    ///
    /// Returns the probe still owed for audio and video files, `None` for
    /// images.
    pub fn import_asset(
        &mut self,
        file_path: &str,
        youtube_url: Option<&str>,
    ) -> CoreResult<(AssetId, Option<PendingProbe>)> {
        let generation = self.generation;
        let project = self.require_project()?;
        let asset_id = project.content.add_asset(file_path, youtube_url)?;
        let project_id = project.id();

        let pending = project
            .content
            .asset_by_id(asset_id)
            .filter(|asset| asset.asset_type.is_timed())
            .map(|asset| PendingProbe {
                generation,
                project_id,
                asset_id,
                file_path: asset.file_path.clone(),
            });
        Ok((asset_id, pending))
    }

    /// Applies a finished probe. Returns whether the asset was updated.
    ///
    /// Results for another project, a closed session or a removed asset are
    /// dropped without error. A failed probe leaves the duration at zero and
    /// clears `exists` when the file is gone.
    pub fn apply_probe_result(
        &mut self,
        pending: &PendingProbe,
        result: CoreResult<TimeMs>,
    ) -> bool {
        if pending.generation != self.generation {
            debug!(
                "Dropping stale probe for asset {} (generation {} != {})",
                pending.asset_id, pending.generation, self.generation
            );
            return false;
        }
        let Some(project) = self.project.as_mut() else {
            return false;
        };
        if project.id() != pending.project_id {
            return false;
        }
        let Some(asset) = project.content.asset_by_id_mut(pending.asset_id) else {
            debug!("Dropping probe for removed asset {}", pending.asset_id);
            return false;
        };

        match result {
            Ok(ms) => {
                asset.duration = Duration::new(ms);
                debug!("Asset {} lasts {} ms", asset.id, ms);
            }
            Err(CoreError::FileNotFound(path)) => {
                warn!("Asset file missing: {}", path);
                asset.exists = false;
            }
            Err(e) => {
                warn!("Could not probe {}: {}", asset.file_path, e);
            }
        }
        true
    }

    /// Imports an asset and waits for its duration.
    pub async fn import_asset_with_probe(
        &mut self,
        file_path: &str,
        youtube_url: Option<&str>,
        probe: &dyn DurationProbe,
    ) -> CoreResult<AssetId> {
        let (asset_id, pending) = self.import_asset(file_path, youtube_url)?;
        if let Some(pending) = pending {
            let result = pending.run(probe).await;
            self.apply_probe_result(&pending, result);
        }
        Ok(asset_id)
    }

    /// Marks assets whose file disappeared. Returns how many were marked.
    pub fn refresh_asset_existence(&mut self) -> usize {
        let Some(project) = self.project.as_mut() else {
            return 0;
        };
        let mut missing = 0;
        for asset in project.content.assets.iter_mut() {
            if !Path::new(&asset.file_path).exists() {
                if asset.exists {
                    warn!("Asset file missing: {}", asset.file_path);
                }
                asset.exists = false;
                missing += 1;
            }
        }
        missing
    }
}

// =============================================================================
// Logging
// =============================================================================

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Installs the global subscriber: stderr plus, when `log_dir` is given, a
/// daily rolling file. `RUST_LOG` adds directives on top of `info`.
pub fn init_logging(log_dir: Option<&Path>) {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = log_dir.map(|dir| {
        let dir: PathBuf = dir.to_path_buf();
        let _ = std::fs::create_dir_all(&dir);
        let file_appender = tracing_appender::rolling::daily(&dir, "qurancaption.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, repeated CLI setup).
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::class_registry::initialize_class_registry;
    use crate::core::project::MemoryProjectStorage;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedProbe(CoreResult<TimeMs>);

    #[async_trait]
    impl DurationProbe for FixedProbe {
        async fn duration_ms(&self, path: &str) -> CoreResult<TimeMs> {
            match &self.0 {
                Ok(ms) => Ok(*ms),
                Err(CoreError::FileNotFound(_)) => Err(CoreError::FileNotFound(path.to_string())),
                Err(e) => Err(CoreError::ProbeFailed(e.to_string())),
            }
        }
    }

    fn session() -> ProjectSession {
        let mut session = ProjectSession::new();
        session.open(Project::new("Al-Fatiha", "Mishary").unwrap());
        session
    }

    fn asset_duration(session: &ProjectSession, id: AssetId) -> TimeMs {
        session
            .project()
            .unwrap()
            .content
            .asset_by_id(id)
            .unwrap()
            .duration
            .ms()
    }

    #[test]
    fn test_import_inserts_immediately_with_zero_duration() {
        let mut session = session();
        let (id, pending) = session.import_asset("C:\\audio\\fatiha.mp3", None).unwrap();

        assert_eq!(asset_duration(&session, id), 0);
        let pending = pending.unwrap();
        assert_eq!(pending.file_path, "C:/audio/fatiha.mp3");
        assert_eq!(pending.generation, session.generation());
    }

    #[test]
    fn test_image_needs_no_probe() {
        let mut session = session();
        let (_, pending) = session.import_asset("/bg/sky.png", None).unwrap();
        assert!(pending.is_none());
    }

    #[test]
    fn test_unknown_format_is_refused() {
        let mut session = session();
        let result = session.import_asset("/notes/readme.txt", None);
        assert!(matches!(result, Err(CoreError::UnsupportedAssetFormat(_))));
        assert!(session.project().unwrap().content.assets.is_empty());
    }

    #[test]
    fn test_import_without_project() {
        let mut session = ProjectSession::new();
        assert!(matches!(
            session.import_asset("/a.mp3", None),
            Err(CoreError::NoProjectOpen)
        ));
    }

    #[test]
    fn test_probe_result_applied() {
        let mut session = session();
        let (id, pending) = session.import_asset("/a.mp3", None).unwrap();

        assert!(session.apply_probe_result(&pending.unwrap(), Ok(61_250)));
        assert_eq!(asset_duration(&session, id), 61_250);
    }

    #[test]
    fn test_stale_probe_after_reopen_is_dropped() {
        let mut session = session();
        let (_, pending) = session.import_asset("/a.mp3", None).unwrap();
        let pending = pending.unwrap();

        let previous = session.close().unwrap();
        session.open(previous);

        assert!(!session.apply_probe_result(&pending, Ok(5_000)));
        assert_eq!(
            session.project().unwrap().content.assets[0].duration.ms(),
            0
        );
    }

    #[test]
    fn test_probe_for_removed_asset_is_dropped() {
        let mut session = session();
        let (id, pending) = session.import_asset("/a.mp3", None).unwrap();
        session
            .project_mut()
            .unwrap()
            .content
            .remove_asset(id)
            .unwrap();

        assert!(!session.apply_probe_result(&pending.unwrap(), Ok(5_000)));
    }

    #[test]
    fn test_missing_file_clears_exists() {
        let mut session = session();
        let (id, pending) = session.import_asset("/gone.mp4", None).unwrap();

        session.apply_probe_result(
            &pending.unwrap(),
            Err(CoreError::FileNotFound("/gone.mp4".to_string())),
        );

        let asset = session.project().unwrap().content.asset_by_id(id).unwrap();
        assert!(!asset.exists);
        assert_eq!(asset.duration.ms(), 0);
    }

    #[test]
    fn test_probe_failure_keeps_zero_duration() {
        let mut session = session();
        let (id, pending) = session.import_asset("/a.mp3", None).unwrap();

        session.apply_probe_result(
            &pending.unwrap(),
            Err(CoreError::ProbeFailed("exit 1".to_string())),
        );

        let asset = session.project().unwrap().content.asset_by_id(id).unwrap();
        assert!(asset.exists);
        assert_eq!(asset.duration.ms(), 0);
    }

    #[tokio::test]
    async fn test_import_with_probe() {
        let mut session = session();
        let id = session
            .import_asset_with_probe("/a.wav", None, &FixedProbe(Ok(3_000)))
            .await
            .unwrap();
        assert_eq!(asset_duration(&session, id), 3_000);
    }

    #[tokio::test]
    async fn test_save_and_reopen_through_service() {
        let registry = initialize_class_registry();
        let service = ProjectService::new(Arc::new(MemoryProjectStorage::new()), &registry);
        let mut session = session();
        session
            .import_asset_with_probe("/a.mp3", None, &FixedProbe(Ok(10_000)))
            .await
            .unwrap();
        session.save(&service).await.unwrap();
        let id = session.project().unwrap().id();

        session.close();
        session.open_from(&service, id).await.unwrap();

        let project = session.project().unwrap();
        assert_eq!(project.content.assets.len(), 1);
        assert_eq!(project.content.assets[0].duration.ms(), 10_000);
    }

    #[test]
    fn test_refresh_asset_existence() {
        let dir = tempfile::TempDir::new().unwrap();
        let present = dir.path().join("present.mp3");
        std::fs::write(&present, b"id3").unwrap();

        let mut session = session();
        session
            .import_asset(&present.to_string_lossy(), None)
            .unwrap();
        session
            .import_asset(&dir.path().join("absent.mp3").to_string_lossy(), None)
            .unwrap();

        assert_eq!(session.refresh_asset_existence(), 1);
        let assets = &session.project().unwrap().content.assets;
        assert!(assets[0].exists);
        assert!(!assets[1].exists);
    }
}
