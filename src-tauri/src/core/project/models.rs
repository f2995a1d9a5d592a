//! Project Aggregate
//!
//! The root of a saved project file.

use super::{ProjectContent, ProjectDetail, ProjectEditorState};
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::timeline::Timeline;
use crate::core::{CoreResult, ProjectId};

#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    pub detail: ProjectDetail,
    pub content: ProjectContent,
    pub project_editor_state: ProjectEditorState,
}

impl Project {
    /// New project with the default tracks
    pub fn new(name: &str, reciter: &str) -> CoreResult<Self> {
        Ok(Self::with_content(
            ProjectDetail::new(name, reciter)?,
            ProjectContent::default_content(),
        ))
    }

    pub fn with_content(detail: ProjectDetail, content: ProjectContent) -> Self {
        Self {
            detail,
            content,
            project_editor_state: ProjectEditorState::default(),
        }
    }

    pub fn id(&self) -> ProjectId {
        self.detail.id
    }

    pub fn timeline(&self) -> &Timeline {
        &self.content.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.content.timeline
    }

    /// Recomputes the derived detail attributes from the timeline.
    pub fn refresh_detail(&mut self) {
        self.detail
            .update_video_detail_attributes(&self.content.timeline);
        for edition in &self.content.project_translation.added_translations {
            self.detail
                .update_percentage_translated(edition, &self.content.timeline);
        }
    }
}

impl Serializable for Project {
    const TYPE_NAME: &'static str = "Project";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.object("detail", &self.detail)?
            .object("content", &self.content)?
            .object("projectEditorState", &self.project_editor_state)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            detail: fields.object("detail")?,
            content: fields.object_or_else("content", ProjectContent::default_content)?,
            project_editor_state: fields
                .object_or_else("projectEditorState", ProjectEditorState::default)?,
        })
    }
}
