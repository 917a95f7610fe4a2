//! Text model configuration

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};

/// What to do with a class of special tokens (URLs, users, numbers, emoticons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenOption {
    /// Leave the token as written
    Keep,
    /// Replace the token with a placeholder shared by its whole class
    Group,
    /// Remove the token
    Delete,
}

impl TokenOption {
    /// All variants, in a fixed order
    pub const ALL: [TokenOption; 3] = [TokenOption::Keep, TokenOption::Group, TokenOption::Delete];
}

/// Options recognised by [`TfIdfModel`](crate::text::TfIdfModel).
///
/// Missing fields take their default when read from JSON, so a config file
/// only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TextModelConfig {
    /// Lowercase the text
    pub lc: bool,
    /// Remove diacritics (é -> e)
    pub strip_diac: bool,
    /// Collapse runs of the same character
    pub del_dup: bool,
    /// Delete punctuation
    pub del_punc: bool,
    pub url_option: TokenOption,
    pub usr_option: TokenOption,
    pub num_option: TokenOption,
    pub emo_option: TokenOption,
    /// Negative entries are word n-grams, positive entries character q-grams
    pub token_list: Vec<i32>,
    /// Weight terms by tf-idf instead of raw term frequency
    pub tfidf: bool,
}

impl Default for TextModelConfig {
    fn default() -> Self {
        Self {
            lc: true,
            strip_diac: true,
            del_dup: true,
            del_punc: false,
            url_option: TokenOption::Group,
            usr_option: TokenOption::Group,
            num_option: TokenOption::Group,
            emo_option: TokenOption::Group,
            token_list: vec![-2, -1, 3, 4],
            tfidf: true,
        }
    }
}

impl TextModelConfig {
    /// Replace the token list
    pub fn with_token_list(mut self, token_list: Vec<i32>) -> Self {
        self.token_list = token_list;
        self
    }

    /// Set tf-idf weighting
    pub fn with_tfidf(mut self, tfidf: bool) -> Self {
        self.tfidf = tfidf;
        self
    }

    /// Check the options can build a model
    pub fn validate(&self) -> Result<()> {
        if self.token_list.is_empty() {
            return Err(SVMError::InvalidParameter(
                "token_list must not be empty".to_string(),
            ));
        }
        if self.token_list.contains(&0) {
            return Err(SVMError::InvalidParameter(
                "token_list entries must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
