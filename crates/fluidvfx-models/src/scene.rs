//! Scene definitions.
//!
//! A scene is a static catalog entry pairing display metadata with the two
//! instructions sent to the generation service: one for compositing the
//! uploaded photo into the scene, one for animating the composite.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use validator::{Validate, ValidationError};

/// Maximum length of a scene identifier.
pub const MAX_SCENE_ID_LEN: usize = 64;

/// Scene identifier (e.g. `wave`, `rocket-car`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is non-empty lowercase kebab-case.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_SCENE_ID_LEN
            && !self.0.starts_with('-')
            && !self.0.ends_with('-')
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SceneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for SceneId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn validate_scene_id(id: &SceneId) -> Result<(), ValidationError> {
    if id.is_well_formed() {
        Ok(())
    } else {
        Err(ValidationError::new("scene_id")
            .with_message("scene ids must be lowercase letters, digits and '-'".into()))
    }
}

/// Themed scene the user can place themselves into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Stable identifier
    #[validate(custom(function = "validate_scene_id"))]
    pub id: SceneId,
    /// Display name
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    /// Display glyph
    #[serde(default)]
    pub emoji: String,
    /// One-line description shown next to the name
    #[serde(default)]
    pub description: String,
    /// Presentation accent (gradient or colour token)
    #[serde(default)]
    pub accent: String,
    /// Instruction for compositing the photo into the scene
    #[validate(length(min = 1))]
    pub image_prompt: String,
    /// Instruction for animating the composite into a video
    #[validate(length(min = 1))]
    pub video_prompt: String,
}

impl Scene {
    /// Short label for menus and logs, e.g. `🌊 Giant Wave`.
    pub fn label(&self) -> String {
        if self.emoji.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.emoji, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str) -> Scene {
        Scene {
            id: SceneId::new(id),
            name: "Giant Wave".to_string(),
            emoji: "🌊".to_string(),
            description: String::new(),
            accent: String::new(),
            image_prompt: "Place this person on a surfboard".to_string(),
            video_prompt: "Tracking shot".to_string(),
        }
    }

    #[test]
    fn test_scene_id_format() {
        assert!(SceneId::new("wave").is_well_formed());
        assert!(SceneId::new("rocket-car").is_well_formed());
        assert!(!SceneId::new("").is_well_formed());
        assert!(!SceneId::new("Rocket Car").is_well_formed());
        assert!(!SceneId::new("-wave").is_well_formed());
    }

    #[test]
    fn test_scene_validation() {
        assert!(scene("wave").validate().is_ok());
        assert!(scene("Wave!").validate().is_err());

        let mut missing_prompt = scene("wave");
        missing_prompt.video_prompt.clear();
        assert!(missing_prompt.validate().is_err());
    }

    #[test]
    fn test_scene_camel_case_fields() {
        let json = serde_json::to_value(scene("wave")).unwrap();
        assert_eq!(json["id"], "wave");
        assert!(json.get("imagePrompt").is_some());
        assert!(json.get("videoPrompt").is_some());
    }

    #[test]
    fn test_scene_label() {
        assert_eq!(scene("wave").label(), "🌊 Giant Wave");
    }
}
