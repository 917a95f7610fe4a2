//! Text normalization applied before tokenization

use crate::text::{TextModelConfig, TokenOption};
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap();
    static ref USR_RE: Regex = Regex::new(r"@\w+").unwrap();
    static ref NUM_RE: Regex = Regex::new(r"\d+(?:[.,]\d+)*").unwrap();
}

const URL_GROUP: &str = "_url";
const USR_GROUP: &str = "_usr";
const NUM_GROUP: &str = "_num";

const POSITIVE_EMOTICONS: &[&str] = &[
    ":)", ":-)", ":))", ";)", ";-)", ":D", ":-D", "xD", "XD", ":p", ":P", ":-P", "=)", "(:", ":]",
    "<3", "^^", "^_^",
];
const NEGATIVE_EMOTICONS: &[&str] = &[
    ":(", ":-(", ":((", ":'(", "):", ":[", "=(", "D:", ":/", ":-/", ":\\", "</3", ":@", ">:(",
];
const NEUTRAL_EMOTICONS: &[&str] = &[":|", ":-|", ":o", ":O", ":-o", ":-O", "o_o", "O_O"];

/// Normalize `text` according to `config`; the result has single spaces between words
pub fn normalize(text: &str, config: &TextModelConfig) -> String {
    let text = replace_class(&URL_RE, text, config.url_option, URL_GROUP);
    let text = replace_class(&USR_RE, &text, config.usr_option, USR_GROUP);
    let mut text = replace_emoticons(&text, config.emo_option);

    if config.lc {
        text = text.to_lowercase();
    }
    if config.strip_diac {
        text = strip_diacritics(&text);
    }

    let mut text = replace_class(&NUM_RE, &text, config.num_option, NUM_GROUP);

    if config.del_punc {
        text = delete_punctuation(&text);
    }
    if config.del_dup {
        text = collapse_repeats(&text);
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn replace_class(pattern: &Regex, text: &str, option: TokenOption, group: &str) -> String {
    let replaced: Cow<'_, str> = match option {
        TokenOption::Keep => Cow::Borrowed(text),
        TokenOption::Group => pattern.replace_all(text, group),
        TokenOption::Delete => pattern.replace_all(text, ""),
    };
    replaced.into_owned()
}

fn emoticon_group(token: &str) -> Option<&'static str> {
    if POSITIVE_EMOTICONS.contains(&token) {
        Some("_pos")
    } else if NEGATIVE_EMOTICONS.contains(&token) {
        Some("_neg")
    } else if NEUTRAL_EMOTICONS.contains(&token) {
        Some("_neu")
    } else {
        None
    }
}

fn replace_emoticons(text: &str, option: TokenOption) -> String {
    if option == TokenOption::Keep {
        return text.to_string();
    }

    text.split_whitespace()
        .filter_map(|token| match (emoticon_group(token), option) {
            (Some(group), TokenOption::Group) => Some(group),
            (Some(_), _) => None,
            (None, _) => Some(token),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decompose and drop combining marks, so "canción" becomes "cancion"
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|&c| !is_combining_mark(c)).collect()
}

fn delete_punctuation(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '_' || !(c.is_ascii_punctuation() || "¿¡«»“”‘’…".contains(c)))
        .collect()
}

/// Collapse runs of the same character into one
pub fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous = None;
    for c in text.chars() {
        if previous != Some(c) {
            out.push(c);
        }
        previous = Some(c);
    }
    out
}
