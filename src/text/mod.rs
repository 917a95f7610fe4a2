//! Text vectorization
//!
//! Normalizes raw text, splits it into word n-grams and character q-grams and
//! weights the resulting terms by tf-idf. The options are collected in
//! [`TextModelConfig`], which is also the search space of [`crate::search`].

pub mod config;
pub mod model;
pub mod normalize;
pub mod tokenize;

pub use self::config::*;
pub use self::model::*;
pub use self::normalize::normalize;
pub use self::tokenize::tokenize;
