//! Static scene catalog.
//!
//! The catalog is loaded once at startup, either from the built-in scene list
//! or from a JSON file, and never mutated afterwards. Scenes are handed out as
//! `Arc<Scene>` so a session can hold a reference into the catalog.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use schemars::schema::RootSchema;
use validator::Validate;

use crate::error::{ModelError, ModelResult};
use crate::scene::{Scene, SceneId};

const BUILTIN_SCENES: &str = include_str!("../assets/scenes.json");

/// Immutable, ordered collection of scenes.
#[derive(Debug, Clone)]
pub struct SceneCatalog {
    scenes: Vec<Arc<Scene>>,
    index: HashMap<SceneId, usize>,
}

impl SceneCatalog {
    /// Catalog shipped with the application.
    pub fn builtin() -> ModelResult<Self> {
        Self::from_json(BUILTIN_SCENES)
    }

    /// Parse a catalog from a JSON array of scenes.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let scenes: Vec<Scene> = serde_json::from_str(json)?;
        Self::new(scenes)
    }

    /// Load a catalog from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ModelResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `FLUIDVFX_SCENE_CATALOG` if set, otherwise the built-in catalog.
    pub fn from_env() -> ModelResult<Self> {
        match std::env::var("FLUIDVFX_SCENE_CATALOG") {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim()),
            _ => Self::builtin(),
        }
    }

    /// Build a catalog, validating every entry.
    pub fn new(scenes: Vec<Scene>) -> ModelResult<Self> {
        if scenes.is_empty() {
            return Err(ModelError::EmptyCatalog);
        }

        let mut index = HashMap::with_capacity(scenes.len());
        for (position, scene) in scenes.iter().enumerate() {
            scene
                .validate()
                .map_err(|e| ModelError::invalid_scene(scene.id.as_str(), e.to_string()))?;

            if index.insert(scene.id.clone(), position).is_some() {
                return Err(ModelError::DuplicateScene(scene.id.to_string()));
            }
        }

        Ok(Self {
            scenes: scenes.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    /// Look up a scene by id.
    pub fn get(&self, id: &str) -> Option<Arc<Scene>> {
        self.index.get(id).map(|&i| Arc::clone(&self.scenes[i]))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Scenes in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scene>> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// JSON Schema describing the catalog file format.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(Vec<Scene>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_SCENES: &str = r#"[
        {"id": "wave", "name": "Giant Wave", "imagePrompt": "surf", "videoPrompt": "ride"},
        {"id": "volcano", "name": "Volcano Flight", "imagePrompt": "fly", "videoPrompt": "erupt"}
    ]"#;

    #[test]
    fn test_builtin_catalog() {
        let catalog = SceneCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 6);
        assert!(catalog.contains("wave"));
        assert!(catalog.contains("lightspeed"));

        let first = catalog.iter().next().unwrap();
        assert_eq!(first.id.as_str(), "wave");
    }

    #[test]
    fn test_lookup_shares_catalog_entry() {
        let catalog = SceneCatalog::from_json(TWO_SCENES).unwrap();
        let a = catalog.get("volcano").unwrap();
        let b = catalog.get("volcano").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(catalog.get("tornado").is_none());
    }

    #[test]
    fn test_rejects_duplicates() {
        let json = r#"[
            {"id": "wave", "name": "A", "imagePrompt": "a", "videoPrompt": "a"},
            {"id": "wave", "name": "B", "imagePrompt": "b", "videoPrompt": "b"}
        ]"#;
        assert!(matches!(
            SceneCatalog::from_json(json),
            Err(ModelError::DuplicateScene(id)) if id == "wave"
        ));
    }

    #[test]
    fn test_rejects_empty_and_invalid() {
        assert!(matches!(
            SceneCatalog::from_json("[]"),
            Err(ModelError::EmptyCatalog)
        ));

        let json = r#"[{"id": "wave", "name": "A", "imagePrompt": "", "videoPrompt": "a"}]"#;
        assert!(matches!(
            SceneCatalog::from_json(json),
            Err(ModelError::InvalidScene { .. })
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_SCENES.as_bytes()).unwrap();

        let catalog = SceneCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);

        assert!(matches!(
            SceneCatalog::from_path("/nonexistent/scenes.json"),
            Err(ModelError::Io(_))
        ));
    }

    #[test]
    fn test_schema_describes_prompts() {
        let schema = serde_json::to_string(&SceneCatalog::json_schema()).unwrap();
        assert!(schema.contains("imagePrompt"));
        assert!(schema.contains("videoPrompt"));
    }
}
