//! Elements double as continent ids and as the elemental axis of combat.
//!
//! The declaration order of [`Element`] is the canonical order: every
//! ordered collection of elements (unlocked continents, gear point maps,
//! portal listings) follows it through the derived `Ord`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An element / continent id.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// The neutral starting continent.
    #[default]
    Base,
    /// Earth.
    Earth,
    /// Wind.
    Wind,
    /// Fire.
    Fire,
    /// Water.
    Water,
    /// Light.
    Light,
    /// Lightning.
    Lightning,
    /// Dark.
    Dark,
    /// Ice.
    Ice,
}

impl Element {
    /// Every element in canonical order.
    pub const ALL: [Element; 9] = [
        Element::Base,
        Element::Earth,
        Element::Wind,
        Element::Fire,
        Element::Water,
        Element::Light,
        Element::Lightning,
        Element::Dark,
        Element::Ice,
    ];

    /// Lowercase id used in data files and command ids.
    pub fn id(self) -> &'static str {
        match self {
            Element::Base => "base",
            Element::Earth => "earth",
            Element::Wind => "wind",
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Light => "light",
            Element::Lightning => "lightning",
            Element::Dark => "dark",
            Element::Ice => "ice",
        }
    }

    /// Capitalized name for messages.
    pub fn title(self) -> &'static str {
        match self {
            Element::Base => "Base",
            Element::Earth => "Earth",
            Element::Wind => "Wind",
            Element::Fire => "Fire",
            Element::Water => "Water",
            Element::Light => "Light",
            Element::Lightning => "Lightning",
            Element::Dark => "Dark",
            Element::Ice => "Ice",
        }
    }

    /// Parse an element id, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|e| e.id() == lower)
    }

    /// The spell a follower casts through a wand attuned to this element.
    pub fn signature_spell(self) -> Option<&'static str> {
        match self {
            Element::Base => None,
            Element::Earth => Some("boulder"),
            Element::Wind => Some("tornado"),
            Element::Fire => Some("fireblast"),
            Element::Water => Some("tide"),
            Element::Light => Some("radiance"),
            Element::Lightning => Some("spark"),
            Element::Dark => Some("shade"),
            Element::Ice => Some("iceblast"),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Element {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::parse(s).ok_or_else(|| CoreError::UnknownElement(s.to_string()))
    }
}

/// One of the four allocatable stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stat {
    /// Maximum hit points.
    Hp,
    /// Maximum magic points.
    Mp,
    /// Attack.
    Atk,
    /// Defense.
    Def,
}

impl Stat {
    /// Allocation order used by balanced spending and remainders.
    pub const ALL: [Stat; 4] = [Stat::Hp, Stat::Mp, Stat::Atk, Stat::Def];

    /// Uppercase label, as shown in messages.
    pub fn label(self) -> &'static str {
        match self {
            Stat::Hp => "HP",
            Stat::Mp => "MP",
            Stat::Atk => "ATK",
            Stat::Def => "DEF",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HP" => Ok(Stat::Hp),
            "MP" => Ok(Stat::Mp),
            "ATK" => Ok(Stat::Atk),
            "DEF" => Ok(Stat::Def),
            _ => Err(CoreError::UnknownStat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_ord() {
        let mut shuffled = vec![Element::Ice, Element::Base, Element::Fire, Element::Earth];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Element::Base, Element::Earth, Element::Fire, Element::Ice]
        );
    }

    #[test]
    fn parse_roundtrip() {
        for e in Element::ALL {
            assert_eq!(e.id().parse::<Element>().ok(), Some(e));
        }
        assert_eq!(Element::parse("FIRE"), Some(Element::Fire));
        assert!("plasma".parse::<Element>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Element::Lightning).unwrap();
        assert_eq!(json, "\"lightning\"");
    }

    #[test]
    fn element_map_keys_serialize_as_strings() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Element::Water, 3);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"water":3}"#);
        let back: std::collections::BTreeMap<Element, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn stat_parse() {
        assert_eq!("atk".parse::<Stat>().ok(), Some(Stat::Atk));
        assert_eq!(Stat::Def.to_string(), "DEF");
        assert!("luck".parse::<Stat>().is_err());
    }

    #[test]
    fn base_has_no_signature_spell() {
        assert_eq!(Element::Base.signature_spell(), None);
        assert_eq!(Element::Fire.signature_spell(), Some("fireblast"));
    }
}
