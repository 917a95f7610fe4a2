//! Word n-gram and character q-gram tokenization

/// Tokens of an already normalized text.
///
/// For each entry `n` of `token_list`: `n < 0` emits word `|n|`-grams joined
/// by `~`, `n > 0` emits character `n`-grams (prefixed `q:`) over the words
/// joined and wrapped by `~`.
pub fn tokenize(normalized: &str, token_list: &[i32]) -> Vec<String> {
    let words: Vec<&str> = normalized.split_whitespace().collect();
    let mut tokens = Vec::new();

    for &n in token_list {
        let size = n.unsigned_abs() as usize;
        if n < 0 {
            word_ngrams(&words, size, &mut tokens);
        } else if n > 0 {
            char_qgrams(&words, size, &mut tokens);
        }
    }

    tokens
}

fn word_ngrams(words: &[&str], n: usize, tokens: &mut Vec<String>) {
    if n == 1 {
        tokens.extend(words.iter().map(|w| w.to_string()));
    } else {
        tokens.extend(words.windows(n).map(|window| window.join("~")));
    }
}

fn char_qgrams(words: &[&str], q: usize, tokens: &mut Vec<String>) {
    let text: Vec<char> = format!("~{}~", words.join("~")).chars().collect();
    tokens.extend(
        text.windows(q)
            .map(|window| format!("q:{}", window.iter().collect::<String>())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words() {
        assert_eq!(tokenize("a b c", &[-1]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_word_bigrams() {
        assert_eq!(tokenize("a b c", &[-2]), vec!["a~b", "b~c"]);
        assert!(tokenize("a", &[-2]).is_empty());
    }

    #[test]
    fn test_char_qgrams() {
        assert_eq!(
            tokenize("ab c", &[3]),
            vec!["q:~ab", "q:ab~", "q:b~c", "q:~c~"]
        );
        assert!(tokenize("", &[3]).is_empty());
    }

    #[test]
    fn test_combined_lists_keep_order() {
        assert_eq!(tokenize("ab", &[-1, 2]), vec!["ab", "q:~a", "q:ab", "q:b~"]);
    }

    #[test]
    fn test_multibyte_qgrams() {
        assert_eq!(tokenize("ñu", &[4]), vec!["q:~ñu~"]);
    }
}
