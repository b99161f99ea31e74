use moeloader_common::serde::{self, Deserialize};

use crate::lenient;

#[derive(Deserialize, Debug, Default)]
#[serde(crate = "self::serde")]
pub struct KonachanPost {
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub width: u32,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub height: u32,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub score: i64,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub creator_id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub tags: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub rating: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub preview_url: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub sample_url: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub file_url: String,
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub file_size: u64,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub source: String,
}
