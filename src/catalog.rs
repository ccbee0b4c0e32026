use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One entry of the content catalog: a district, monument, museum,
/// restaurant or park.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Place {
    pub name: String,
    pub category: String,
    pub district: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The immutable place dataset, loaded once at startup.
pub struct Catalog {
    places: Vec<Place>,
    categories: Vec<String>,
    by_category: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Parses the dataset shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(include_str!("../data/places.json"))
    }

    /// Loads an alternate dataset from disk (the `--data` flag).
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let places: Vec<Place> = serde_json::from_str(content)?;

        // Categories keep the order of their first appearance in the data.
        let mut categories = Vec::new();
        let mut seen = HashSet::new();
        let mut by_category: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, place) in places.iter().enumerate() {
            if seen.insert(place.category.clone()) {
                categories.push(place.category.clone());
            }
            by_category.entry(place.category.clone()).or_default().push(idx);
        }

        Ok(Self {
            places,
            categories,
            by_category,
        })
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn places_in(&self, category: &str) -> Vec<&Place> {
        self.by_category
            .get(category)
            .map(|indices| indices.iter().map(|&i| &self.places[i]).collect())
            .unwrap_or_default()
    }

    /// Case-insensitive substring filter over name, district, summary and
    /// tags, in dataset order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Place> {
        let query = query.to_lowercase();

        self.places
            .iter()
            .filter(|place| {
                place.name.to_lowercase().contains(&query)
                    || place.district.to_lowercase().contains(&query)
                    || place.summary.to_lowercase().contains(&query)
                    || place.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"name": "Vieux-Lyon", "category": "Quartiers", "district": "5e",
         "summary": "Ruelles pavées, traboules et architecture Renaissance.",
         "tags": ["traboules", "renaissance"]},
        {"name": "Basilique de Fourvière", "category": "Monuments", "district": "5e",
         "summary": "Basilique emblématique et vue panoramique sur la ville.",
         "tags": ["basilique", "panorama"]},
        {"name": "Croix-Rousse", "category": "Quartiers", "district": "4e",
         "summary": "Quartier des Canuts, artistique et vivant.",
         "tags": ["canuts", "soie"]}
    ]"#;

    #[test]
    fn categories_keep_first_seen_order() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.categories(), ["Quartiers", "Monuments"]);
        assert_eq!(catalog.places_in("Quartiers").len(), 2);
        assert_eq!(catalog.places_in("Monuments").len(), 1);
        assert!(catalog.places_in("Parcs").is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_all_fields() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.search("TRABOULES", 10).len(), 1);
        assert_eq!(catalog.search("basilique", 10).len(), 1);
        assert_eq!(catalog.search("5e", 10).len(), 2);
        assert!(catalog.search("marseille", 10).is_empty());
    }

    #[test]
    fn search_respects_the_limit() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.search("e", 2).len(), 2);
    }

    #[test]
    fn builtin_dataset_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.categories().len() >= 4);
    }
}
