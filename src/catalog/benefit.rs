// Benefit catalog entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stars::RepoId;
use crate::stars::record::deserialize_optional_repo;

/// Benefit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI & Dev Tools")]
    AiDevTools,
    #[serde(rename = "Cloud & Hosting")]
    CloudHosting,
    Learning,
    Design,
    Productivity,
    Lifestyle,
    #[serde(rename = "Domains & Security")]
    DomainsSecurity,
    Other,
}

impl Category {
    /// All categories, in filter bar order.
    pub const ALL: [Category; 8] = [
        Category::AiDevTools,
        Category::CloudHosting,
        Category::Learning,
        Category::Design,
        Category::Productivity,
        Category::Lifestyle,
        Category::DomainsSecurity,
        Category::Other,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Category::AiDevTools => "AI & Dev Tools",
            Category::CloudHosting => "Cloud & Hosting",
            Category::Learning => "Learning",
            Category::Design => "Design",
            Category::Productivity => "Productivity",
            Category::Lifestyle => "Lifestyle",
            Category::DomainsSecurity => "Domains & Security",
            Category::Other => "Other",
        }
    }

    /// Parse a category from its title, case-insensitively.
    pub fn from_title(title: &str) -> Option<Self> {
        let title = title.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.title().eq_ignore_ascii_case(title))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A student benefit offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub link: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Manually assigned score, higher is more popular. Tie-break after stars.
    pub popularity: u32,
    /// GitHub repository whose stars rank this benefit.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_repo",
        skip_serializing_if = "Option::is_none"
    )]
    pub repo: Option<RepoId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_titles_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_title(category.title()), Some(category));

            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.title()));
        }
        assert_eq!(Category::from_title("cloud & hosting"), Some(Category::CloudHosting));
        assert_eq!(Category::from_title("All"), None);
    }

    #[test]
    fn test_benefit_deserialize() {
        let json = r#"{
            "id": "netlify",
            "name": "Netlify",
            "category": "Cloud & Hosting",
            "description": "Deploy sites",
            "link": "https://netlify.com",
            "tags": ["Hosting"],
            "popularity": 7,
            "repo": "netlify/cli"
        }"#;

        let benefit: Benefit = serde_json::from_str(json).unwrap();
        assert_eq!(benefit.category, Category::CloudHosting);
        assert_eq!(benefit.repo, RepoId::parse("netlify/cli"));
    }

    #[test]
    fn test_benefit_without_repo() {
        let json = r#"{
            "id": "canva",
            "name": "Canva Pro",
            "category": "Design",
            "description": "Design tool",
            "link": "https://canva.com",
            "popularity": 8,
            "repo": "  "
        }"#;

        let benefit: Benefit = serde_json::from_str(json).unwrap();
        assert!(benefit.repo.is_none());
        assert!(benefit.tags.is_empty());
    }
}
