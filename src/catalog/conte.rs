use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogItem;

/// Narration language of an audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// French
    Fr,
    /// Bambara
    Bm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub id: String,
    pub language: Language,
    pub url: String,
    /// Length in seconds
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContePage {
    pub id: String,
    pub page_number: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A story from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conte {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub is_premium: bool,
    pub image_url: String,
    #[serde(default)]
    pub pages: Vec<ContePage>,
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moral: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conte {
    pub fn audio_for(&self, language: Language) -> Option<&AudioTrack> {
        self.audio_tracks.iter().find(|t| t.language == language)
    }

    /// Pages sorted by page number, regardless of wire order.
    pub fn ordered_pages(&self) -> Vec<&ContePage> {
        let mut pages: Vec<&ContePage> = self.pages.iter().collect();
        pages.sort_by_key(|p| p.page_number);
        pages
    }

    /// Total narration length across every track of the given language.
    pub fn total_duration(&self, language: Language) -> u32 {
        self.audio_tracks
            .iter()
            .filter(|t| t.language == language)
            .map(|t| t.duration)
            .sum()
    }
}

impl CatalogItem for Conte {
    const COLLECTION: &'static str = "contes";
    const LIST_FIELD: &'static str = "contes";
    const ITEM_FIELD: &'static str = "conte";
    const CACHE_KEY: &'static str = "zirin_contes_cache";

    fn id(&self) -> &str {
        &self.id
    }

    fn is_premium(&self) -> bool {
        self.is_premium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTE_JSON: &str = r#"{
        "id": "c1",
        "title": "Le lièvre et l'hyène",
        "description": "Un conte de ruse",
        "category": "Sagesse",
        "isPremium": false,
        "imageUrl": "https://cdn.zirin.app/c1.jpg",
        "pages": [
            { "id": "p2", "pageNumber": 2, "text": "Fin." },
            { "id": "p1", "pageNumber": 1, "text": "Il était une fois...", "imageUrl": "https://cdn.zirin.app/p1.jpg" }
        ],
        "audioTracks": [
            { "id": "a1", "language": "fr", "url": "https://cdn.zirin.app/a1.mp3", "duration": 120 },
            { "id": "a2", "language": "bm", "url": "https://cdn.zirin.app/a2.mp3", "duration": 140 }
        ],
        "createdAt": "2024-03-01T09:00:00Z",
        "updatedAt": "2024-03-02T09:00:00Z"
    }"#;

    #[test]
    fn test_conte_wire_format() {
        let conte: Conte = serde_json::from_str(CONTE_JSON).unwrap();
        assert_eq!(conte.id(), "c1");
        assert!(!conte.is_premium());
        assert!(conte.moral.is_none());
        assert_eq!(conte.audio_for(Language::Bm).unwrap().id, "a2");

        let pages: Vec<u32> = conte.ordered_pages().iter().map(|p| p.page_number).collect();
        assert_eq!(pages, vec![1, 2]);
    }

    #[test]
    fn test_conte_serializes_camel_case() {
        let conte: Conte = serde_json::from_str(CONTE_JSON).unwrap();
        let value = serde_json::to_value(&conte).unwrap();
        assert_eq!(value["isPremium"], serde_json::json!(false));
        assert_eq!(value["audioTracks"][0]["language"], serde_json::json!("fr"));
        assert!(value.get("moral").is_none());
    }

    #[test]
    fn test_total_duration() {
        let conte: Conte = serde_json::from_str(CONTE_JSON).unwrap();
        assert_eq!(conte.total_duration(Language::Fr), 120);
        assert_eq!(conte.total_duration(Language::Bm), 140);
    }
}
