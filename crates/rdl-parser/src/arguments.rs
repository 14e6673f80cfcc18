//! Multi-parameter call recognition
//!
//! Given the text right after an opening parenthesis, find the matching
//! close and split the enclosed text into top-level arguments. Commas inside
//! nested parentheses or inside quoted literals do not split.

/// One argument of a call, trimmed, with its byte offset in the scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentText {
    pub text: String,
    pub offset: usize,
}

/// Result of splitting a parenthesised argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitArguments {
    pub arguments: Vec<ArgumentText>,
    /// Bytes consumed, including the closing parenthesis
    pub consumed: usize,
}

fn trimmed(text: &str, start: usize, end: usize) -> ArgumentText {
    let raw = &text[start..end];
    let leading = raw.len() - raw.trim_start().len();
    ArgumentText {
        text: raw.trim().to_string(),
        offset: start + leading,
    }
}

/// Split `text` (positioned just after `(`) into top-level arguments.
///
/// Returns `None` when the parentheses never balance. An empty list
/// (`Now()`) yields no arguments.
pub fn split_arguments(text: &str) -> Option<SplitArguments> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut arg_start = 0;
    let mut arguments = Vec::new();

    for (i, c) in text.char_indices() {
        if in_quote {
            // a doubled quote closes and immediately reopens
            if c == '"' {
                in_quote = false;
            }
            continue;
        }
        match c {
            '"' => in_quote = true,
            '(' => depth += 1,
            ')' if depth == 0 => {
                let last = trimmed(text, arg_start, i);
                if !(arguments.is_empty() && last.text.is_empty()) {
                    arguments.push(last);
                }
                return Some(SplitArguments {
                    arguments,
                    consumed: i + 1,
                });
            }
            ')' => depth -= 1,
            ',' if depth == 0 => {
                arguments.push(trimmed(text, arg_start, i));
                arg_start = i + 1;
            }
            _ => {}
        }
    }

    None
}

/// Find the parenthesis closing a group whose `(` was just consumed.
/// Returns the inner text's length.
pub fn find_group_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;

    for (i, c) in text.char_indices() {
        if in_quote {
            if c == '"' {
                in_quote = false;
            }
            continue;
        }
        match c {
            '"' => in_quote = true,
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(split: &SplitArguments) -> Vec<&str> {
        split.arguments.iter().map(|a| a.text.as_str()).collect()
    }

    #[test]
    fn test_nested_and_quoted_commas() {
        let split = split_arguments(r#"1 > 0, Left("a,b", 1), "x, y") & rest"#).unwrap();
        assert_eq!(texts(&split), vec!["1 > 0", r#"Left("a,b", 1)"#, r#""x, y""#]);
        assert_eq!(&r#"1 > 0, Left("a,b", 1), "x, y") & rest"#[split.consumed..], " & rest");
    }

    #[test]
    fn test_argument_offsets() {
        let split = split_arguments("a,  b)").unwrap();
        assert_eq!(split.arguments[1].offset, 4);
    }

    #[test]
    fn test_empty_argument_list() {
        let split = split_arguments(")").unwrap();
        assert!(split.arguments.is_empty());
        assert_eq!(split.consumed, 1);
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(split_arguments("1, (2, 3)"), None);
        assert_eq!(find_group_end("1 + (2"), None);
    }

    #[test]
    fn test_escaped_quote_inside_argument() {
        let split = split_arguments(r#""a "" , b", 2)"#).unwrap();
        assert_eq!(texts(&split), vec![r#""a "" , b""#, "2"]);
    }
}
