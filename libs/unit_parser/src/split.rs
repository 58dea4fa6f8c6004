//! Splitting of values into words and the reverse escaping of argument
//! vectors, following the quoting rules systemd applies to command lines.
use crate::error::{QuotingSnafu, Result};
use std::iter::Peekable;
use std::str::Chars;

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/* Reads `count` digits of `radix` after the escape, starting from `value`.
 * Nothing is consumed unless the whole sequence is valid. */
fn take_digits(chars: &mut Peekable<Chars>, count: usize, radix: u32, value: u32) -> Option<char> {
    let mut look = chars.clone();
    let mut value = value;
    for _ in 0..count {
        value = value * radix + look.next()?.to_digit(radix)?;
    }
    if value == 0 || value > 0xff {
        return None;
    }
    let c = char::from_u32(value)?;
    for _ in 0..count {
        chars.next();
    }
    Some(c)
}

/* Unknown escapes stand for the escaped character itself. */
fn unescape_one(e: char, chars: &mut Peekable<Chars>) -> char {
    match e {
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{b}',
        's' => ' ',
        'x' => take_digits(chars, 2, 16, 0).unwrap_or(e),
        '0'..='7' => {
            let first = e.to_digit(8).unwrap_or_default();
            take_digits(chars, 2, 8, first).unwrap_or(e)
        }
        _ => e,
    }
}

/// Split a value into words.
///
/// Words are separated by unquoted whitespace. Single and double quotes may
/// start anywhere in a word and are removed. Backslash escapes are decoded
/// both inside and outside of quotes. An unterminated quote is an error.
pub fn split_words(value: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut chars = value.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if is_separator(*c)) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut word = String::new();
        let mut quote: Option<char> = None;
        while let Some(c) = chars.next() {
            match (quote, c) {
                (_, '\\') => match chars.next() {
                    Some(e) => word.push(unescape_one(e, &mut chars)),
                    None => word.push('\\'),
                },
                (None, '\'' | '"') => quote = Some(c),
                (Some(q), c) if c == q => quote = None,
                (None, c) if is_separator(c) => break,
                (_, c) => word.push(c),
            }
        }

        if quote.is_some() {
            return QuotingSnafu { value }.fail();
        }
        words.push(word);
    }

    Ok(words)
}

fn word_needs_quoting(word: &str) -> bool {
    word.is_empty()
        || word
            .chars()
            .any(|c| is_separator(c) || c.is_control() || matches!(c, '"' | '\'' | '\\' | ';'))
}

fn escape_word(word: &str, out: &mut String) {
    if !word_needs_quoting(word) {
        out.push_str(word);
        return;
    }

    out.push('"');
    for c in word.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x100 && c.is_control() => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Join words into one value that [`split_words`] turns back into the same
/// words. Words without special characters are written as they are.
pub fn escape_words<S: AsRef<str>>(words: &[S]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        escape_word(word.as_ref(), &mut out);
    }
    out
}
