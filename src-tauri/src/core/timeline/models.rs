//! Timeline Model
//!
//! The ordered collection of a project's tracks.

use super::{Clip, EditCursor, Track, TrackType};
use crate::core::assets::Asset;
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::values::Duration;
use crate::core::AssetId;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timeline {
    pub tracks: Vec<Track>,
}

impl Timeline {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// First track of `kind`
    pub fn first_track(&self, kind: TrackType) -> Option<&Track> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    pub fn first_track_mut(&mut self, kind: TrackType) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.kind() == kind)
    }

    pub fn subtitle_track(&self) -> Option<&Track> {
        self.first_track(TrackType::Subtitle)
    }

    pub fn subtitle_track_mut(&mut self) -> Option<&mut Track> {
        self.first_track_mut(TrackType::Subtitle)
    }

    pub fn video_track(&self) -> Option<&Track> {
        self.first_track(TrackType::Video)
    }

    pub fn audio_track(&self) -> Option<&Track> {
        self.first_track(TrackType::Audio)
    }

    pub fn longest_track_duration(&self) -> Duration {
        self.tracks
            .iter()
            .map(Track::duration)
            .max()
            .unwrap_or_default()
    }

    /// Removes the asset's clips from audio and video tracks, shifting what
    /// follows. Returns the number of clips removed.
    pub fn remove_asset_from_tracks(&mut self, asset_id: AssetId) -> usize {
        self.tracks
            .iter_mut()
            .filter(|t| matches!(t.kind(), TrackType::Audio | TrackType::Video))
            .map(|t| t.remove_clips_with_asset(asset_id))
            .sum()
    }

    /// The background image: a video track holding a single clip ending at 0
    pub fn background_image<'a>(&self, assets: &'a [Asset]) -> Option<&'a Asset> {
        let track = self.video_track()?;
        match track.clips() {
            [clip] if clip.end_time() == 0 => clip_to_asset(clip, assets),
            _ => None,
        }
    }

    /// Asset playing at the cursor on the first track of `kind`
    pub fn current_asset_on_track<'a>(
        &self,
        kind: TrackType,
        cursor: &impl EditCursor,
        assets: &'a [Asset],
    ) -> Option<&'a Asset> {
        let clip = self.first_track(kind)?.clip_at(cursor)?;
        clip_to_asset(clip, assets)
    }

    /// Clips of the first subtitle track, in time order
    pub fn subtitle_clips(&self) -> &[Clip] {
        self.subtitle_track().map(Track::clips).unwrap_or_default()
    }
}

fn clip_to_asset<'a>(clip: &Clip, assets: &'a [Asset]) -> Option<&'a Asset> {
    let asset_id = clip.asset_id()?;
    assets.iter().find(|a| a.id == asset_id)
}

impl Serializable for Timeline {
    const TYPE_NAME: &'static str = "Timeline";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.list("tracks", &self.tracks)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            tracks: fields.list("tracks")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(path: &str, duration_ms: i64) -> Asset {
        let mut asset = Asset::new(path);
        asset.duration = Duration::new(duration_ms);
        asset
    }

    fn timeline() -> Timeline {
        Timeline::new(vec![
            Track::subtitle("arabic"),
            Track::new(TrackType::Video),
            Track::new(TrackType::Audio),
        ])
    }

    #[test]
    fn test_first_track_by_kind() {
        let timeline = timeline();
        assert_eq!(timeline.first_track(TrackType::Video).map(Track::kind), Some(TrackType::Video));
        assert!(timeline.first_track(TrackType::Unknown).is_none());
        assert!(timeline.subtitle_clips().is_empty());
    }

    #[test]
    fn test_longest_track_duration() {
        let mut timeline = timeline();
        let audio = asset("/a/recitation.mp3", 4000);
        timeline.tracks[2].add_asset(&audio).unwrap();
        assert_eq!(timeline.longest_track_duration().ms(), 4000);
        assert_eq!(Timeline::default().longest_track_duration().ms(), 0);
    }

    #[test]
    fn test_background_image() {
        let mut timeline = timeline();
        let image = asset("/a/background.png", 0);
        let assets = vec![image.clone()];
        assert!(timeline.background_image(&assets).is_none());

        timeline.tracks[1].add_asset(&image).unwrap();
        assert_eq!(timeline.background_image(&assets).map(|a| a.id), Some(image.id));
    }

    #[test]
    fn test_remove_asset_only_touches_media_tracks() {
        let mut timeline = timeline();
        let audio = asset("/a/recitation.mp3", 1000);
        timeline.tracks[0].add_asset(&audio).unwrap();
        timeline.tracks[2].add_asset(&audio).unwrap();
        timeline.tracks[2].add_asset(&audio).unwrap();

        assert_eq!(timeline.remove_asset_from_tracks(audio.id), 2);
        assert_eq!(timeline.tracks[0].len(), 1);
        assert!(timeline.tracks[2].is_empty());
    }

    #[test]
    fn test_current_asset_on_track() {
        let mut timeline = timeline();
        let video = asset("/a/clip.mp4", 3000);
        let assets = vec![video.clone()];
        timeline.tracks[1].add_asset(&video).unwrap();

        let found = timeline.current_asset_on_track(TrackType::Video, &1500_i64, &assets);
        assert_eq!(found.map(|a| a.id), Some(video.id));
        assert!(timeline
            .current_asset_on_track(TrackType::Video, &9000_i64, &assets)
            .is_none());
    }
}
