use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogItem;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Facile,
    Moyen,
    Difficile,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Facile => "Facile",
            Difficulty::Moyen => "Moyen",
            Difficulty::Difficile => "Difficile",
        };
        f.write_str(label)
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_answer(s).as_str() {
            "facile" | "easy" => Ok(Difficulty::Facile),
            "moyen" | "medium" => Ok(Difficulty::Moyen),
            "difficile" | "hard" => Ok(Difficulty::Difficile),
            _ => Err(Error::Invalid(format!("Unknown difficulty: {}", s))),
        }
    }
}

/// A riddle from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devinette {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub category: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Devinette {
    pub fn hint(&self, index: usize) -> Option<&str> {
        self.hints.get(index).map(String::as_str)
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        let expected = normalize_answer(&self.answer);
        !expected.is_empty() && normalize_answer(answer) == expected
    }
}

impl CatalogItem for Devinette {
    const COLLECTION: &'static str = "devinettes";
    const LIST_FIELD: &'static str = "devinettes";
    const ITEM_FIELD: &'static str = "devinette";
    const CACHE_KEY: &'static str = "zirin_devinettes_cache";

    fn id(&self) -> &str {
        &self.id
    }

    fn is_premium(&self) -> bool {
        self.is_premium
    }
}

/// Result of checking a player's answer against a riddle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevinetteAnswer {
    pub devinette_id: String,
    pub user_answer: String,
    pub is_correct: bool,
    pub points_earned: u32,
    pub answered_at: DateTime<Utc>,
}

impl DevinetteAnswer {
    pub fn evaluate(devinette: &Devinette, user_answer: &str, answered_at: DateTime<Utc>) -> Self {
        let is_correct = devinette.is_correct(user_answer);
        Self {
            devinette_id: devinette.id.clone(),
            user_answer: user_answer.to_string(),
            is_correct,
            points_earned: if is_correct { devinette.points } else { 0 },
            answered_at,
        }
    }
}

/// Lowercase, strip French diacritics and punctuation, collapse whitespace.
pub fn normalize_answer(input: &str) -> String {
    let folded: String = input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' | 'á' => 'a',
            'é' | 'è' | 'ê' | 'ë' | 'ɛ' => 'e',
            'î' | 'ï' | 'í' => 'i',
            'ô' | 'ö' | 'ó' | 'ɔ' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            'ÿ' => 'y',
            'ɲ' => 'n',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
