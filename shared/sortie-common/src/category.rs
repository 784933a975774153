//! Category Tags
//!
//! Events are labelled with one of a fixed set of tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryTag {
    Concert,
    Sport,
    OpenAir,
    Cinema,
    Theatre,
    Expo,
    Nautical,
    Shopping,
    BoardGames,
    FairsAndShows,
}

/// Returned when a name is not part of the tag set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a known category")]
pub struct InvalidCategoryTag(pub String);

impl CategoryTag {
    /// Every tag, in display order.
    pub const ALL: [Self; 10] = [
        Self::Concert,
        Self::Sport,
        Self::OpenAir,
        Self::Cinema,
        Self::Theatre,
        Self::Expo,
        Self::Nautical,
        Self::Shopping,
        Self::BoardGames,
        Self::FairsAndShows,
    ];

    /// Stored and wire name of the tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Concert => "concert",
            Self::Sport => "sport",
            Self::OpenAir => "plein air",
            Self::Cinema => "cinéma",
            Self::Theatre => "théatre",
            Self::Expo => "expo",
            Self::Nautical => "nautique",
            Self::Shopping => "shopping",
            Self::BoardGames => "jeux de société",
            Self::FairsAndShows => "foire et salons",
        }
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryTag {
    type Err = InvalidCategoryTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| InvalidCategoryTag(s.to_string()))
    }
}

impl TryFrom<String> for CategoryTag {
    type Error = InvalidCategoryTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryTag> for String {
    fn from(tag: CategoryTag) -> Self {
        tag.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_parses_back() {
        for tag in CategoryTag::ALL {
            assert_eq!(tag.as_str().parse::<CategoryTag>(), Ok(tag));
        }
    }

    #[test]
    fn test_accented_names() {
        assert_eq!("cinéma".parse(), Ok(CategoryTag::Cinema));
        assert_eq!("jeux de société".parse(), Ok(CategoryTag::BoardGames));
        assert!("cinema".parse::<CategoryTag>().is_err());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = "karaoke".parse::<CategoryTag>().unwrap_err();
        assert_eq!(err, InvalidCategoryTag("karaoke".into()));
        assert!("Sport".parse::<CategoryTag>().is_err(), "tags are case sensitive");
    }

    #[test]
    fn test_serde_uses_tag_names() {
        let json = serde_json::to_string(&CategoryTag::OpenAir).unwrap();
        assert_eq!(json, "\"plein air\"");

        let tag: CategoryTag = serde_json::from_str("\"foire et salons\"").unwrap();
        assert_eq!(tag, CategoryTag::FairsAndShows);

        assert!(serde_json::from_str::<CategoryTag>("\"bowling\"").is_err());
    }
}
