//! Class Registry Initialization
//!
//! Registers every persisted type of the project document and the child
//! fields that must be rebuilt with a specific constructor.

use std::sync::OnceLock;

use crate::core::assets::Asset;
use crate::core::captions::Exportation;
use crate::core::project::{
    Edition, Project, ProjectContent, ProjectDetail, ProjectEditorState, ProjectTranslation,
    SubtitlesEditorState, TimelineState, VideoPreviewState, VideoStyle,
};
use crate::core::serialization::ClassRegistry;
use crate::core::timeline::{Clip, Timeline, Track};
use crate::core::values::{Duration, Status, Translation, VerseRange};

/// Builds the registry holding every project document type.
pub fn initialize_class_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();

    // Values
    registry
        .register_class::<Duration>("Duration")
        .register_class::<Status>("Status")
        .register_class::<VerseRange>("VerseRange")
        .register_class::<Translation>("Translation")
        .register_class::<Translation>("VerseTranslation")
        .register_class::<Translation>("PredefinedSubtitleTranslation");

    // Timeline
    registry
        .register_class::<Clip>("Clip")
        .register_class::<Clip>("SilenceClip")
        .register_class::<Clip>("SubtitleClip")
        .register_class::<Clip>("PredefinedSubtitleClip")
        .register_class::<Clip>("AssetClip")
        .register_class::<Track>("Track")
        .register_class::<Track>("SubtitleTrack")
        .register_class::<Track>("AssetTrack")
        .register_class::<Timeline>("Timeline")
        .register_child_field::<Translation>("Clip", "translations", "VerseTranslation")
        .register_child_field::<Translation>("SubtitleClip", "translations", "VerseTranslation")
        .register_child_field::<Translation>(
            "PredefinedSubtitleClip",
            "translations",
            "PredefinedSubtitleTranslation",
        )
        .register_child_field::<Clip>("Track", "clips", "Clip")
        .register_child_field::<Track>("Timeline", "tracks", "Track");

    // Assets
    registry
        .register_class::<Asset>("Asset")
        .register_child_field::<Duration>("Asset", "duration", "Duration");

    // Project
    registry
        .register_class::<Edition>("Edition")
        .register_class::<ProjectTranslation>("ProjectTranslation")
        .register_class::<VideoStyle>("VideoStyle")
        .register_class::<TimelineState>("TimelineState")
        .register_class::<VideoPreviewState>("VideoPreviewState")
        .register_class::<SubtitlesEditorState>("SubtitlesEditorState")
        .register_class::<ProjectEditorState>("ProjectEditorState")
        .register_class::<ProjectDetail>("ProjectDetail")
        .register_class::<ProjectContent>("ProjectContent")
        .register_class::<Project>("Project")
        .register_class::<Exportation>("Exportation")
        .register_child_field::<Edition>("ProjectTranslation", "addedTranslations", "Edition")
        .register_child_field::<Duration>("ProjectDetail", "duration", "Duration")
        .register_child_field::<Status>("ProjectDetail", "status", "Status")
        .register_child_field::<VerseRange>("ProjectDetail", "verseRange", "VerseRange")
        .register_child_field::<Timeline>("ProjectContent", "timeline", "Timeline")
        .register_child_field::<Asset>("ProjectContent", "assets", "Asset")
        .register_child_field::<ProjectTranslation>(
            "ProjectContent",
            "projectTranslation",
            "ProjectTranslation",
        )
        .register_child_field::<VideoStyle>("ProjectContent", "videoStyles", "VideoStyle")
        .register_child_field::<TimelineState>("ProjectEditorState", "timeline", "TimelineState")
        .register_child_field::<VideoPreviewState>(
            "ProjectEditorState",
            "videoPreview",
            "VideoPreviewState",
        )
        .register_child_field::<SubtitlesEditorState>(
            "ProjectEditorState",
            "subtitlesEditor",
            "SubtitlesEditorState",
        )
        .register_child_field::<ProjectDetail>("Project", "detail", "ProjectDetail")
        .register_child_field::<ProjectContent>("Project", "content", "ProjectContent")
        .register_child_field::<ProjectEditorState>(
            "Project",
            "projectEditorState",
            "ProjectEditorState",
        );

    registry
}

/// Process-wide registry for application code that does not own one.
pub fn global_registry() -> &'static ClassRegistry {
    static REGISTRY: OnceLock<ClassRegistry> = OnceLock::new();
    REGISTRY.get_or_init(initialize_class_registry)
}
