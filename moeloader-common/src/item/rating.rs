//! General enum for rating items found by the site adapters
//! # Item Rating
//! Most image boards classify posts by how explicit they are, but they don't agree on the wire
//! format:
//! * Moebooru sites send `s`, `q` or `e` and only `e` means explicit.
//! * Sankaku sends the same letters but treats everything that is not `s` as unsafe.
//!
//! The adapter owns that mapping through an [`ExplicitRule`], so callers only ever look at
//! [`ResultItem::is_explicit`](crate::item::ResultItem::is_explicit).

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum Rating {
    /// Represents posts that are don't involve anything suggestive or sensitive.
    Safe,
    /// Represents posts that have some degree of nudity or sexually suggestive elements.
    Questionable,
    /// Represents posts that have explicit elements of pornography, gore, death, etc.
    Explicit,
    /// Represents a failure to parse the `rating` tag into one of the above.
    #[default]
    Unknown,
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Questionable => write!(f, "Questionable"),
            Self::Explicit => write!(f, "Explicit"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Rating {
    /// Guess the variant according to the rating tag present in the post
    pub fn from_rating_str(s: &str) -> Self {
        match s {
            "s" | "g" | "safe" | "sensitive" | "general" => Self::Safe,
            "q" | "questionable" => Self::Questionable,
            "e" | "explicit" => Self::Explicit,
            _ => Self::Unknown,
        }
    }
}

/// How a site encodes "this item is explicit" in its rating field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplicitRule {
    /// Only the explicit code (`e`) is explicit.
    ExplicitCode,
    /// Anything other than the safe code (`s`) is explicit, including a missing rating.
    NotSafe,
}

impl ExplicitRule {
    pub fn is_explicit(self, code: &str) -> bool {
        match self {
            Self::ExplicitCode => Rating::from_rating_str(code) == Rating::Explicit,
            Self::NotSafe => code != "s",
        }
    }
}
