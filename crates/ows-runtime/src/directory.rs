use ows_core::{Character, Entity};
use serde::Deserialize;

/// Lookup of the characters and entities a script can name.
pub trait ObjectDirectory: Send + Sync {
    /// By id or unique name.
    fn character(&self, key: &str) -> Option<Character>;
    /// By id or name.
    fn entity(&self, key: &str) -> Option<Entity>;
    fn characters(&self) -> Vec<Character>;
    fn entities(&self) -> Vec<Entity>;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaticDirectory {
    pub characters: Vec<Character>,
    pub entities: Vec<Entity>,
}

impl StaticDirectory {
    pub fn new(characters: Vec<Character>, entities: Vec<Entity>) -> Self {
        Self {
            characters,
            entities,
        }
    }
}

fn key_matches(key: &str, id: &str, name: &str) -> bool {
    id == key || name.eq_ignore_ascii_case(key)
}

impl ObjectDirectory for StaticDirectory {
    fn character(&self, key: &str) -> Option<Character> {
        self.characters
            .iter()
            .find(|character| key_matches(key, &character.id, &character.unique_name))
            .cloned()
    }

    fn entity(&self, key: &str) -> Option<Entity> {
        self.entities
            .iter()
            .find(|entity| key_matches(key, &entity.id, &entity.name))
            .cloned()
    }

    fn characters(&self) -> Vec<Character> {
        self.characters.clone()
    }

    fn entities(&self) -> Vec<Entity> {
        self.entities.clone()
    }
}

#[cfg(test)]
mod directory_tests {
    use super::*;

    #[test]
    fn static_directory_deserializes_and_matches_names() {
        let directory: StaticDirectory = serde_json::from_str(
            r#"{"characters":[{"id":"c1","uniqueName":"Bob"}],"entities":[{"id":"e1","name":"Door"}]}"#,
        )
        .expect("directory json should parse");
        assert_eq!(
            directory.character("BOB").map(|character| character.id),
            Some("c1".to_string())
        );
        assert_eq!(
            directory.character("c1").map(|character| character.unique_name),
            Some("Bob".to_string())
        );
        assert_eq!(
            directory.entity("DOOR").map(|entity| entity.id),
            Some("e1".to_string())
        );
        assert!(directory.character("ALICE").is_none());

        let empty: StaticDirectory = serde_json::from_str("{}").expect("empty json should parse");
        assert!(empty.characters().is_empty());
    }
}
