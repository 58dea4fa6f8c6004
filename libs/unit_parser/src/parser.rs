//! Line-level parser for the unit file format.
use crate::error::{FormatSnafu, Result};
use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{char, one_of, space0},
    combinator::{all_consuming, recognize, rest},
    sequence::{delimited, pair, separated_pair},
    IResult,
};

/// One logical line of a unit file, continuation lines already joined.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Line {
    Group(String),
    Entry(String, String),
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@')
}

fn is_group_char(c: char) -> bool {
    c != '[' && c != ']' && !c.is_control()
}

fn comment(i: &str) -> IResult<&str, &str> {
    recognize(pair(one_of("#;"), rest))(i)
}

fn group_header(i: &str) -> IResult<&str, &str> {
    all_consuming(delimited(char('['), take_while1(is_group_char), char(']')))(i)
}

// returns (key, value), whitespace around '=' is dropped
fn entry(i: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        take_while1(is_key_char),
        delimited(space0, tag("="), space0),
        rest,
    )(i)
}

/* A value continues when it ends with an odd number of backslashes,
 * an even number is a run of escaped backslashes. */
fn strip_continuation(value: &str) -> Option<&str> {
    let count = value.chars().rev().take_while(|c| *c == '\\').count();
    if count % 2 == 1 {
        Some(&value[..value.len() - 1])
    } else {
        None
    }
}

fn is_comment(line: &str) -> bool {
    comment(line).is_ok()
}

/// Split the content into groups and entries.
pub(crate) fn parse_lines(content: &str) -> Result<Vec<Line>> {
    let mut result = Vec::new();
    let mut have_group = false;
    let mut lines = content.lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() || is_comment(line) {
            continue;
        }

        if line.starts_with('[') {
            let (_, name) = group_header(line).map_err(|_| {
                FormatSnafu {
                    line: index + 1,
                    what: format!("invalid group header '{}'", line),
                }
                .build()
            })?;
            have_group = true;
            result.push(Line::Group(name.to_string()));
            continue;
        }

        let (_, (key, value)) = all_consuming(entry)(line).map_err(|_| {
            FormatSnafu {
                line: index + 1,
                what: format!("expected key=value, got '{}'", line),
            }
            .build()
        })?;

        if !have_group {
            return FormatSnafu {
                line: index + 1,
                what: format!("key '{}' outside of any group", key),
            }
            .fail();
        }

        let mut value = value.to_string();
        while let Some(stripped) = strip_continuation(&value) {
            let mut joined = stripped.to_string();
            joined.push(' ');

            /* comment lines in a continuation are dropped,
             * the continuation ends with the input */
            let next = loop {
                match lines.next() {
                    Some((_, l)) if is_comment(l.trim()) => continue,
                    other => break other,
                }
            };
            let done = match next {
                Some((_, l)) => {
                    joined.push_str(l.trim());
                    false
                }
                None => true,
            };
            value = joined;
            if done {
                break;
            }
        }

        result.push(Line::Entry(key.to_string(), value.trim_end().to_string()));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn entry_line(k: &str, v: &str) -> Line {
        Line::Entry(k.to_string(), v.to_string())
    }

    #[test]
    fn test_group_header() {
        assert_eq!(group_header("[Unit]").unwrap().1, "Unit");
        assert_eq!(group_header("[X-Container]").unwrap().1, "X-Container");
        assert_eq!(group_header("[with space]").unwrap().1, "with space");
        assert!(group_header("[]").is_err());
        assert!(group_header("[Unit").is_err());
        assert!(group_header("[Unit] trailing").is_err());
        assert!(group_header("[a[b]").is_err());
    }

    #[test]
    fn test_entry() {
        assert_eq!(entry("Key=Value").unwrap().1, ("Key", "Value"));
        assert_eq!(entry("Key = Value").unwrap().1, ("Key", "Value"));
        assert_eq!(entry("Key=").unwrap().1, ("Key", ""));
        assert_eq!(entry("Key=a=b").unwrap().1, ("Key", "a=b"));
        assert_eq!(entry("Foo@bar.x_y-z=1").unwrap().1, ("Foo@bar.x_y-z", "1"));
        assert!(entry("=Value").is_err());
        assert!(all_consuming(entry)("Key Value").is_err());
    }

    #[test]
    fn test_parse_lines() {
        let content = "# comment\n; other comment\n\n  [Unit]  \nDescription=test\n\n[Service]\nExecStart=/bin/true\n";
        assert_eq!(
            parse_lines(content).unwrap(),
            vec![
                Line::Group("Unit".to_string()),
                entry_line("Description", "test"),
                Line::Group("Service".to_string()),
                entry_line("ExecStart", "/bin/true"),
            ]
        );
    }

    #[test]
    fn test_continuation() {
        let content = "[Service]\nExecStart=/bin/echo \\\n    one \\\n# skipped\n  two\nNext=\\\\\n";
        assert_eq!(
            parse_lines(content).unwrap(),
            vec![
                Line::Group("Service".to_string()),
                entry_line("ExecStart", "/bin/echo  one  two"),
                entry_line("Next", "\\\\"),
            ]
        );

        /* continuation at end of input */
        assert_eq!(
            parse_lines("[A]\nKey=value\\").unwrap(),
            vec![Line::Group("A".to_string()), entry_line("Key", "value")]
        );
    }

    #[test]
    fn test_escapes_kept() {
        assert_eq!(
            parse_lines("[A]\nKey=a\\nb\\tc").unwrap()[1],
            entry_line("Key", "a\\nb\\tc")
        );
    }

    #[test]
    fn test_format_errors() {
        match parse_lines("Key=value\n").unwrap_err() {
            Error::FormatError { line, .. } => assert_eq!(line, 1),
            e => panic!("unexpected error {}", e),
        }
        match parse_lines("[Unit]\nA=b\njunk\n").unwrap_err() {
            Error::FormatError { line, .. } => assert_eq!(line, 3),
            e => panic!("unexpected error {}", e),
        }
        assert!(parse_lines("[Unit\n").is_err());
    }
}
