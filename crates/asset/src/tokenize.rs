//! Delimiter-run tokenizer shared by all three text parsers.

/// Whitespace set used for splitting directive lines.
pub const WHITESPACE: &[char] = &[' ', '\t', '\r', '\n', '\x0b', '\x0c'];

/// Separator between the attribute slots of a face-list corner.
pub const SLASH: &[char] = &['/'];

/// Split `line` on runs of `delimiters`.
///
/// Leading and trailing delimiters are dropped and consecutive delimiters
/// never produce empty tokens, so a line made only of delimiters yields an
/// empty vector. Tokens borrow from `line`.
pub fn tokenize<'a>(line: &'a str, delimiters: &[char]) -> Vec<&'a str> {
    line.split(|c: char| delimiters.contains(&c))
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_runs_and_strips_ends() {
        assert_eq!(
            tokenize("  v\t1.0   2.0 3.0  \r", WHITESPACE),
            vec!["v", "1.0", "2.0", "3.0"]
        );
    }

    #[test]
    fn only_delimiters_is_empty() {
        assert!(tokenize("", WHITESPACE).is_empty());
        assert!(tokenize(" \t  ", WHITESPACE).is_empty());
        assert!(tokenize("///", SLASH).is_empty());
    }

    #[test]
    fn slash_corners() {
        assert_eq!(tokenize("12//7", SLASH), vec!["12", "7"]);
        assert_eq!(tokenize("1/2/3", SLASH), vec!["1", "2", "3"]);
        assert_eq!(tokenize("5", SLASH), vec!["5"]);
    }

    #[test]
    fn no_quoting() {
        assert_eq!(tokenize("o \"my object\"", WHITESPACE), vec!["o", "\"my", "object\""]);
    }
}
