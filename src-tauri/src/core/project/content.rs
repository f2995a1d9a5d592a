//! Project Content
//!
//! Timeline, imported assets, translations and per-target styles.

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::{ProjectTranslation, VideoStyle};
use crate::core::assets::{Asset, AssetType};
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::timeline::{Timeline, Track, TrackType};
use crate::core::{AssetId, CoreError, CoreResult};

/// Style target of the Arabic text
pub const ARABIC_TARGET: &str = "arabic";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectContent {
    pub timeline: Timeline,
    pub assets: Vec<Asset>,
    pub project_translation: ProjectTranslation,
    /// Target (`"arabic"` or edition name) → style document
    pub video_styles: BTreeMap<String, VideoStyle>,
}

impl ProjectContent {
    /// Subtitle, video and audio tracks with no clips
    pub fn default_content() -> Self {
        let mut video_styles = BTreeMap::new();
        video_styles.insert(ARABIC_TARGET.to_string(), VideoStyle::default());
        Self {
            timeline: Timeline::new(vec![
                Track::subtitle(ARABIC_TARGET),
                Track::new(TrackType::Video),
                Track::new(TrackType::Audio),
            ]),
            assets: Vec::new(),
            project_translation: ProjectTranslation::default(),
            video_styles,
        }
    }

    /// Imports the file at `file_path`. Unknown formats are refused.
    pub fn add_asset(&mut self, file_path: &str, youtube_url: Option<&str>) -> CoreResult<AssetId> {
        let asset = match youtube_url {
            Some(url) => Asset::from_youtube(file_path, url),
            None => Asset::new(file_path),
        };

        if asset.asset_type == AssetType::Unknown {
            warn!("Refusing to import {}: unsupported format", asset.file_path);
            return Err(CoreError::UnsupportedAssetFormat(asset.file_name));
        }

        info!("Imported asset {} ({:?})", asset.file_name, asset.asset_type);
        let id = asset.id;
        self.assets.push(asset);
        Ok(id)
    }

    pub fn asset_by_id(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn asset_by_id_mut(&mut self, id: AssetId) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.id == id)
    }

    /// Removes an asset and every media clip playing it.
    pub fn remove_asset(&mut self, id: AssetId) -> CoreResult<Asset> {
        let index = self
            .assets
            .iter()
            .position(|a| a.id == id)
            .ok_or(CoreError::AssetNotFound(id))?;
        let removed_clips = self.timeline.remove_asset_from_tracks(id);
        info!("Removed asset {} and {} clip(s)", id, removed_clips);
        Ok(self.assets.remove(index))
    }

    /// Puts an asset on the first video and/or audio track.
    pub fn add_asset_to_timeline(
        &mut self,
        id: AssetId,
        as_video: bool,
        as_audio: bool,
    ) -> CoreResult<()> {
        let asset = self
            .asset_by_id(id)
            .cloned()
            .ok_or(CoreError::AssetNotFound(id))?;

        let kinds = [(as_video, TrackType::Video), (as_audio, TrackType::Audio)];
        for (_, kind) in kinds.iter().filter(|(wanted, _)| *wanted) {
            let track = self
                .timeline
                .first_track_mut(*kind)
                .ok_or_else(|| CoreError::TrackNotFound(kind.name().to_string()))?;
            track.add_asset(&asset)?;
        }
        Ok(())
    }

    pub fn video_style(&self, target: &str) -> Option<&VideoStyle> {
        self.video_styles.get(target)
    }

    pub fn video_style_mut(&mut self, target: &str) -> &mut VideoStyle {
        self.video_styles.entry(target.to_string()).or_default()
    }
}

impl Serializable for ProjectContent {
    const TYPE_NAME: &'static str = "ProjectContent";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.object("timeline", &self.timeline)?
            .list("assets", &self.assets)?
            .object("projectTranslation", &self.project_translation)?
            .map("videoStyles", &self.video_styles)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            timeline: fields.object_or_else("timeline", Timeline::default)?,
            assets: fields.list("assets")?,
            project_translation: fields
                .object_or_else("projectTranslation", ProjectTranslation::default)?,
            video_styles: fields.map("videoStyles")?,
        })
    }
}
