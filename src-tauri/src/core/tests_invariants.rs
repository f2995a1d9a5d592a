//! Invariant Tests for the Editing Core
//!
//! Edit sequences and document round trips that cut across modules: track
//! rules after every edit, refused edits leaving state untouched, the
//! serialize/deserialize law on whole projects, and identifier ordering.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::core::assets::{Asset, AssetType};
use crate::core::class_registry::initialize_class_registry;
use crate::core::ids::random_id;
use crate::core::project::{Category, Edition, Project, VideoStyle};
use crate::core::serialization::{SerializationEngine, UnknownTagPolicy};
use crate::core::timeline::{PredefinedSubtitleType, RemovalMode, Track, TrackType};
use crate::core::values::{Duration, Verse, VerseRange, Word};
use crate::core::{TimeMs, TimeRange};

fn spans(track: &Track) -> Vec<(u64, TimeMs, TimeMs)> {
    track
        .clips()
        .iter()
        .map(|c| (c.id(), c.start_time(), c.end_time()))
        .collect()
}

fn silence_track(clips: &[(u64, TimeMs, TimeMs)]) -> Track {
    let registry = initialize_class_registry();
    let engine = SerializationEngine::new(&registry);
    let clips: Vec<Value> = clips
        .iter()
        .map(|&(id, start, end)| {
            json!({
                "__type": "SilenceClip",
                "id": id,
                "startTime": start,
                "endTime": end,
                "duration": end - start,
                "type": "Silence"
            })
        })
        .collect();
    engine
        .deserialize(&json!({"__type": "SubtitleTrack", "type": "Subtitle", "clips": clips}))
        .unwrap()
}

fn verse(id: u32, words: usize) -> Verse {
    Verse::new(
        id,
        (0..words)
            .map(|i| Word::new(format!("كلمة{i}"), format!("kalima{i}"), format!("word{i}")))
            .collect(),
    )
}

fn media(path: &str, duration_ms: TimeMs) -> Asset {
    let mut asset = Asset::new(path);
    asset.duration = Duration::new(duration_ms);
    asset
}

/// A project touched by every kind of edit
fn edited_project() -> Project {
    let mut project = Project::new("Al-Fatiha", "Mishary Alafasy").unwrap();

    let mut verses = BTreeMap::new();
    verses.insert("1:1".to_string(), "In the name of Allah".to_string());
    verses.insert("1:2".to_string(), "All praise is due to Allah".to_string());
    project.content.project_translation.add_edition(
        Edition::new("en-sahih", "Saheeh International", "en"),
        verses,
    );

    let audio = project.content.add_asset("/media/fatiha.mp3", None).unwrap();
    project.content.asset_by_id_mut(audio).unwrap().duration = Duration::new(45_000);
    project
        .content
        .add_asset_to_timeline(audio, false, true)
        .unwrap();

    let seed = project.content.project_translation.clone();
    let track = project.content.timeline.subtitle_track_mut().unwrap();
    track
        .add_predefined_subtitle(PredefinedSubtitleType::Istiadhah, &3_000_i64)
        .unwrap();
    track
        .add_subtitle(&verse(1, 4), 0, 3, 1, &seed, &8_000_i64)
        .unwrap();
    track.add_silence(None, &9_000_i64).unwrap();
    track
        .add_subtitle(&verse(2, 4), 0, 1, 1, &seed, &12_000_i64)
        .unwrap();

    let mut category: Category = serde_json::from_value(json!({
        "name": "text",
        "description": "Text appearance",
        "styles": {
            "color": {"name": "color", "value": "#ffffff", "valueType": "color", "css": "color: {value};"},
            "font-size": {"name": "font-size", "value": 40, "valueType": "number", "valueMin": 10, "valueMax": 200, "step": 1}
        },
        "futureKey": {"nested": [1, 2, 3]}
    }))
    .unwrap();
    category.icon = "text_fields".to_string();
    let mut styles = BTreeMap::new();
    styles.insert("text".to_string(), category);
    project
        .content
        .video_styles
        .insert("en-sahih".to_string(), VideoStyle::new(styles));

    project.project_editor_state.timeline.cursor_position = 12_000;
    project.refresh_detail();
    project
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[test]
fn test_scenario_assets_appended_with_one_ms_gap() {
    let mut track = Track::subtitle("arabic");
    track.add_asset(&media("/a.mp3", 1000)).unwrap();
    track.add_asset(&media("/b.mp3", 2000)).unwrap();

    let placed: Vec<_> = spans(&track).into_iter().map(|(_, s, e)| (s, e)).collect();
    assert_eq!(placed, vec![(0, 1000), (1001, 3001)]);
}

#[test]
fn test_scenario_end_time_that_would_invert_neighbour_is_refused() {
    let mut track = silence_track(&[(1, 0, 999), (2, 1000, 1999)]);
    let before = track.clone();

    assert!(track.update_end_time(1, 1999).is_err());
    assert_eq!(track, before);
}

#[test]
fn test_scenario_verse_range_with_tolerance() {
    let mut track = Track::subtitle("arabic");
    track.add_silence(None, &4199_i64).unwrap();
    track
        .add_subtitle(&verse(5, 3), 0, 2, 2, &(), &6000_i64)
        .unwrap();
    track
        .add_subtitle(&verse(6, 3), 0, 2, 2, &(), &9500_i64)
        .unwrap();
    assert_eq!(
        (track.clips()[1].start_time(), track.clips()[2].start_time()),
        (4200, 6001)
    );

    let range = VerseRange::get_verse_range(TimeRange::new(5000, 10000), track.clips());
    assert_eq!(range.parts.len(), 1);
    assert_eq!(range.parts[0].surah, 2);
    assert_eq!(range.parts[0].verse_start, 5);
    assert_eq!(range.parts[0].verse_end, 6);
}

#[test]
fn test_scenario_duration_round_trip() {
    let registry = initialize_class_registry();
    let engine = SerializationEngine::new(&registry);

    let tree = engine.serialize(&Duration::new(65_000)).unwrap();
    let back: Duration = engine.deserialize(&tree).unwrap();

    assert_eq!(back.ms(), 65_000);
    assert_eq!(back.formatted_time(false), "01:05");
}

#[test]
fn test_scenario_shift_removal_packs_following_clips() {
    let mut track = silence_track(&[(1, 0, 999), (2, 1000, 1999), (3, 2000, 2999)]);

    track.remove_clip(2, RemovalMode::Shift).unwrap();

    assert_eq!(spans(&track), vec![(1, 0, 999), (3, 1000, 1999)]);
    assert_eq!(track.clips()[1].duration(), 999);
}

// =============================================================================
// Track invariants under edit sequences
// =============================================================================

#[test]
fn test_edit_sequence_preserves_track_rules() {
    let mut track = Track::subtitle("arabic");
    let mut cursor: TimeMs = 0;

    for step in 0..40u32 {
        cursor += 700 + TimeMs::from(step % 5) * 150;
        let before = track.clone();
        let result = match step % 6 {
            0 | 1 => track
                .add_subtitle(&verse(step + 1, 5), 0, 4, 1, &(), &cursor)
                .map(|_| ()),
            2 => track.add_silence(None, &cursor).map(|_| ()),
            3 => {
                let target = track.clips()[track.len() / 2].id();
                track.add_silence(Some(target), &cursor).map(|_| ())
            }
            4 => {
                let id = track.clips()[0].id();
                let end = track.clips()[0].end_time() + 250;
                track.update_end_time(id, end)
            }
            _ => {
                let last = track.last_clip().map(|c| c.id()).unwrap();
                let start = track.last_clip().unwrap().start_time() - 300;
                track.update_start_time(last, start)
            }
        };

        if result.is_err() {
            assert_eq!(track, before, "refused edit at step {step} mutated the track");
        }
        assert!(
            track.invariant_violations().is_empty(),
            "step {step}: {:?}",
            track.invariant_violations()
        );
    }
    assert!(track.len() > 10);
}

#[test]
fn test_refused_edits_are_no_ops() {
    let mut track = silence_track(&[(1, 0, 999), (2, 1000, 1999), (3, 2000, 2999)]);
    let before = track.clone();

    assert!(track.update_start_time(2, 50).is_err());
    assert!(track.update_start_time(2, 1950).is_err());
    assert!(track.update_end_time(2, 2950).is_err());
    assert!(track.update_end_time(99, 500).is_err());
    assert!(track.remove_clip(99, RemovalMode::Hold).is_err());
    assert!(track.add_silence(None, &2999_i64).is_err());
    assert!(track.add_silence(Some(99), &0_i64).is_err());

    assert_eq!(track, before);
}

#[test]
fn test_hold_removal_keeps_later_clips() {
    let mut track = silence_track(&[(1, 0, 999), (2, 1000, 1999), (3, 2000, 2999)]);

    track.remove_clip(2, RemovalMode::Hold).unwrap();

    assert_eq!(spans(&track), vec![(1, 0, 999), (3, 1000, 2999)]);
    assert!(track.invariant_violations().is_empty());
}

#[test]
fn test_removing_audio_asset_repacks_audio_track() {
    let mut project = Project::new("Test", "not set").unwrap();
    let first = project.content.add_asset("/a.mp3", None).unwrap();
    let second = project.content.add_asset("/b.mp3", None).unwrap();
    for (id, ms) in [(first, 1000), (second, 2000)] {
        project.content.asset_by_id_mut(id).unwrap().duration = Duration::new(ms);
        project.content.add_asset_to_timeline(id, false, true).unwrap();
    }

    project.content.remove_asset(first).unwrap();

    let audio = project.timeline().first_track(TrackType::Audio).unwrap();
    assert_eq!(audio.len(), 1);
    assert_eq!(
        (audio.clips()[0].start_time(), audio.clips()[0].end_time()),
        (0, 2000)
    );
    assert_eq!(
        project.content.assets[0].asset_type,
        AssetType::Audio
    );
}

// =============================================================================
// Document round trips
// =============================================================================

#[test]
fn test_project_round_trip_law() {
    let registry = initialize_class_registry();
    let engine = SerializationEngine::new(&registry);
    let project = edited_project();

    let first = engine.serialize(&project).unwrap();
    let rebuilt: Project = engine.deserialize(&first).unwrap();
    let second = engine.serialize(&rebuilt).unwrap();

    assert_eq!(rebuilt, project);
    assert_eq!(first, second);
    assert_eq!(first["__type"], "Project");
    assert_eq!(
        first["content"]["timeline"]["tracks"][0]["__type"],
        "SubtitleTrack"
    );
    assert_eq!(
        first["content"]["timeline"]["tracks"][0]["clips"][0]["__type"],
        "PredefinedSubtitleClip"
    );
    assert_eq!(
        first["content"]["videoStyles"]["en-sahih"]["styles"]["text"]["futureKey"],
        json!({"nested": [1, 2, 3]})
    );
    assert!(engine.take_diagnostics().is_empty());
}

#[test]
fn test_seeded_translations_survive_round_trip() {
    let registry = initialize_class_registry();
    let engine = SerializationEngine::new(&registry);
    let project = edited_project();

    let text = engine.to_json_string(&project, true).unwrap();
    let rebuilt: Project = engine.from_json_str(&text).unwrap();

    let subtitle = rebuilt
        .timeline()
        .subtitle_clips()
        .iter()
        .find(|c| c.subtitle().is_some_and(|s| s.verse == 1))
        .unwrap();
    let translation = subtitle.translation("en-sahih").unwrap();
    assert_eq!(translation.text, "In the name of Allah");
    assert!(translation.is_status_complete());
    assert_eq!(rebuilt.detail.translations.get("Saheeh International"), Some(&50));
}

#[test]
fn test_deep_clone_is_independent() {
    let registry = initialize_class_registry();
    let engine = SerializationEngine::new(&registry);
    let project = edited_project();

    assert_eq!(engine.deep_clone(&project).unwrap(), project);

    let mut copy = engine.deep_clone(&project).unwrap();
    let first = copy.timeline().subtitle_clips()[0].id();
    copy.timeline_mut()
        .subtitle_track_mut()
        .unwrap()
        .remove_clip(first, RemovalMode::Shift)
        .unwrap();
    copy.detail.name = "Copy".to_string();

    assert_eq!(project.detail.name, "Al-Fatiha");
    assert_eq!(project.timeline().subtitle_clips().len(), 4);
    assert_eq!(copy.timeline().subtitle_clips().len(), 3);

    let again = engine.deep_clone(&project).unwrap();
    assert_eq!(again, project);
    assert_eq!(
        engine.serialize(&again).unwrap(),
        engine.serialize(&project).unwrap()
    );
}

#[test]
fn test_fresh_project_round_trips_field_for_field() {
    let registry = initialize_class_registry();
    let engine = SerializationEngine::new(&registry);
    let mut project = Project::new("Al-Ikhlas", "Abdul Basit").unwrap();
    project.detail.update_timestamp();

    let rebuilt: Project = engine
        .from_json_str(&engine.to_json_string(&project, false).unwrap())
        .unwrap();
    assert_eq!(rebuilt, project);
    assert_eq!(rebuilt.detail.updated_at, project.detail.updated_at);
    assert_eq!(
        rebuilt.content.video_style("arabic").unwrap().last_updated,
        project.content.video_style("arabic").unwrap().last_updated
    );
    assert_eq!(engine.deep_clone(&project).unwrap(), project);
}

#[test]
fn test_unknown_tag_policies_on_whole_document() {
    let registry = initialize_class_registry();
    let project = edited_project();
    let mut tree = SerializationEngine::new(&registry).serialize(&project).unwrap();
    tree["content"]["timeline"]["tracks"][0]["clips"][2]["__type"] = json!("HologramClip");

    let degrade = SerializationEngine::new(&registry);
    let rebuilt: Project = degrade.deserialize(&tree).unwrap();
    // The legacy `type` field still identifies the clip.
    assert_eq!(rebuilt.timeline().subtitle_clips().len(), 4);
    assert!(rebuilt.timeline().subtitle_clips()[2].is_silence());
    let diagnostics = degrade.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].path.ends_with("clips[2]"));

    let strict = SerializationEngine::new(&registry).with_policy(UnknownTagPolicy::FailFast);
    assert!(strict.deserialize::<Project>(&tree).is_err());
}

#[test]
fn test_missing_required_field_is_an_error() {
    let registry = initialize_class_registry();
    let engine = SerializationEngine::new(&registry);
    let mut tree = engine.serialize(&edited_project()).unwrap();
    tree.as_object_mut().unwrap().remove("detail");

    assert!(engine.deserialize::<Project>(&tree).is_err());
}

// =============================================================================
// Identifiers
// =============================================================================

#[test]
fn test_ids_strictly_increase_across_entities() {
    let project = Project::new("A", "B").unwrap();
    let asset = Asset::new("/x.mp3");
    let next = random_id();

    assert!(project.id() < asset.id);
    assert!(asset.id < next);

    let mut last = next;
    for _ in 0..10_000 {
        let id = random_id();
        assert!(id > last);
        last = id;
    }
}
