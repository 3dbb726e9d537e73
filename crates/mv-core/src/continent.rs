use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// A continent reachable through the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinentDef {
    /// Display name.
    pub name: String,
    /// Player level that unlocks it.
    #[serde(default)]
    pub level_required: u32,
}

/// Continents keyed by element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinentCatalog {
    continents: BTreeMap<Element, ContinentDef>,
}

impl ContinentCatalog {
    /// Look up a continent.
    pub fn get(&self, element: Element) -> Option<&ContinentDef> {
        self.continents.get(&element)
    }

    /// Continent name, falling back to the element title.
    pub fn name_of(&self, element: Element) -> String {
        self.get(element)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| element.title().to_string())
    }

    /// Unlock level; unknown continents unlock at level 1.
    pub fn level_required(&self, element: Element) -> u32 {
        self.get(element).map(|c| c.level_required).unwrap_or(1)
    }

    /// Elements in canonical order; every element when the catalog is empty.
    pub fn order(&self) -> Vec<Element> {
        if self.continents.is_empty() {
            return Element::ALL.to_vec();
        }
        self.continents.keys().copied().collect()
    }

    /// Elements unlocked at `level`.
    pub fn unlocked_at(&self, level: u32) -> BTreeSet<Element> {
        self.order()
            .into_iter()
            .filter(|el| self.level_required(*el) <= level)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocks_by_level() {
        let cat: ContinentCatalog = serde_json::from_value(serde_json::json!({
            "base": { "name": "Verdant Vale", "level_required": 0 },
            "fire": { "name": "Emberlands", "level_required": 4 },
            "earth": { "name": "Stonereach", "level_required": 2 }
        }))
        .unwrap();
        assert_eq!(cat.order(), vec![Element::Base, Element::Earth, Element::Fire]);
        assert_eq!(cat.unlocked_at(1), BTreeSet::from([Element::Base]));
        assert_eq!(
            cat.unlocked_at(4),
            BTreeSet::from([Element::Base, Element::Earth, Element::Fire])
        );
        assert_eq!(cat.name_of(Element::Ice), "Ice");
    }
}
