use moeloader_common::serde::{self, Deserialize};

use crate::lenient;

#[derive(Deserialize, Debug, Default)]
#[serde(crate = "self::serde")]
pub struct SankakuPost {
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub width: u32,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub height: u32,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub total_score: i64,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub fav_count: i64,
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    pub is_favorited: bool,
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    pub redirect_to_signup: bool,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub rating: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub created_at: SankakuDate,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub author: SankakuAuthor,
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
    #[serde(default, deserialize_with = "lenient::vec_or_empty")]
    pub tags: Vec<SankakuTag>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(crate = "self::serde")]
pub struct SankakuDate {
    /// Unix seconds.
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub s: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(crate = "self::serde")]
pub struct SankakuAuthor {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(crate = "self::serde")]
pub struct SankakuTag {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name_en: String,
}

/// Body of `/users/me`.
#[derive(Deserialize, Debug, Default)]
#[serde(crate = "self::serde")]
pub struct SankakuMe {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub user: SankakuUser,
}

#[derive(Deserialize, Debug, Default)]
#[serde(crate = "self::serde")]
pub struct SankakuUser {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
}

/// Body of `/posts/{id}/favorite`.
#[derive(Deserialize, Debug, Default)]
#[serde(crate = "self::serde")]
pub struct SankakuFavorite {
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub score: Option<i64>,
}
