// Benefit catalog module.
// Loads the curated benefit list and provides search and ranking over it.

pub mod benefit;
pub mod search;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{HubError, Result};

pub use benefit::{Benefit, Category};
pub use search::{rank, repo_ids};

const EMBEDDED_CATALOG: &str = include_str!("../../data/benefits.json");

/// Load the catalog bundled with the binary.
pub fn load_embedded() -> Result<Vec<Benefit>> {
    parse(EMBEDDED_CATALOG)
}

/// Load a catalog from a JSON file.
pub fn load_from(path: &Path) -> Result<Vec<Benefit>> {
    let contents = fs::read_to_string(path)?;
    parse(&contents)
}

/// Parse a catalog, rejecting duplicate ids.
pub fn parse(json: &str) -> Result<Vec<Benefit>> {
    let benefits: Vec<Benefit> = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    if let Some(duplicate) = benefits.iter().find(|b| !seen.insert(b.id.as_str())) {
        return Err(HubError::Other(format!(
            "duplicate benefit id in catalog: {}",
            duplicate.id
        )));
    }

    Ok(benefits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_catalog_loads() {
        let benefits = load_embedded().unwrap();
        assert!(!benefits.is_empty());

        let repos = repo_ids(&benefits);
        assert!(!repos.is_empty());
        assert!(repos.len() <= benefits.iter().filter(|b| b.repo.is_some()).count());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let entry = r#"{"id": "dup", "name": "A", "category": "Other", "description": "",
            "link": "https://a.example", "tags": [], "popularity": 1}"#;
        let json = format!("[{}, {}]", entry, entry);

        assert!(matches!(parse(&json), Err(HubError::Other(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{"id": "x", "name": "X", "category": "Learning", "description": "d",
                "link": "https://x.example", "tags": ["t"], "popularity": 2, "repo": "x/y"}]"#,
        )
        .unwrap();

        let benefits = load_from(&path).unwrap();
        assert_eq!(benefits.len(), 1);
        assert_eq!(benefits[0].category, Category::Learning);
    }

    #[test]
    fn test_malformed_catalog_is_error() {
        assert!(matches!(parse("{"), Err(HubError::Json(_))));
    }
}
