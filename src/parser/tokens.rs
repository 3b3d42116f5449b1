//! Shared lexing helpers (spec component C).
//!
//! A hand-rolled tokenizer in the teacher's style (`examples/euanmacinnes-clarium/src/server/query/query_common.rs`):
//! no lexer-generator dependency, just a single pass that respects quoted strings and
//! turns the statement text into a flat token list the clause parsers slice by keyword.

use crate::error::DocSqlError;

/// Split `input` into tokens: parenthesis/comma punctuation, quoted strings (escape
/// stripped, quotes removed), dotted identifiers (`a.b.c`), numbers, and multi-character
/// comparison operators. Tokens are returned verbatim (case preserved) except quoted
/// strings, whose surrounding quotes are stripped.
pub fn tokenize(input: &str) -> Result<Vec<String>, DocSqlError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        if ch.is_whitespace() {
            i += 1;
            continue;
        }
        if ch == '"' || ch == '\'' {
            let quote = ch;
            let start = i + 1;
            let mut j = start;
            let mut out = String::new();
            let mut closed = false;
            while j < bytes.len() {
                let c = bytes[j] as char;
                if c == '\\' && j + 1 < bytes.len() {
                    out.push(bytes[j + 1] as char);
                    j += 2;
                    continue;
                }
                if c == quote {
                    closed = true;
                    j += 1;
                    break;
                }
                out.push(c);
                j += 1;
            }
            if !closed {
                return Err(DocSqlError::parse_at("unterminated string literal", i));
            }
            tokens.push(format!("\"{out}\""));
            i = j;
            continue;
        }
        if ch == '(' || ch == ')' || ch == ',' || ch == '*' {
            tokens.push(ch.to_string());
            i += 1;
            continue;
        }
        // Multi-char comparison operators.
        if ch == '>' || ch == '<' || ch == '!' || ch == '=' {
            let two = if i + 1 < bytes.len() { &input[i..i + 2] } else { "" };
            if two == ">=" || two == "<=" || two == "!=" || two == "<>" {
                tokens.push(two.to_string());
                i += 2;
                continue;
            }
            tokens.push(ch.to_string());
            i += 1;
            continue;
        }
        // Identifier / dotted path / number / keyword: run until a boundary character.
        let start = i;
        while i < bytes.len() {
            let c = bytes[i] as char;
            if c.is_whitespace() || "()=<>!,*\"'".contains(c) {
                break;
            }
            i += 1;
        }
        if i == start {
            return Err(DocSqlError::parse_at(format!("unexpected character '{ch}'"), i));
        }
        tokens.push(input[start..i].to_string());
    }
    Ok(tokens)
}

/// Strip quotes from a token produced by `tokenize` for a quoted string. No-op if the
/// token isn't quoted.
pub fn unquote(tok: &str) -> &str {
    if tok.len() >= 2 && tok.starts_with('"') && tok.ends_with('"') {
        &tok[1..tok.len() - 1]
    } else {
        tok
    }
}

pub fn is_quoted(tok: &str) -> bool {
    tok.len() >= 2 && tok.starts_with('"') && tok.ends_with('"')
}

/// Find the first occurrence of `needle` (case-insensitive) at parenthesis depth 0.
/// Tokens `"("`/`")"` are treated as depth-changing punctuation.
pub fn find_token_ci(tokens: &[String], needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, t) in tokens.iter().enumerate() {
        match t.as_str() {
            "(" => {
                depth += 1;
                continue;
            }
            ")" => {
                depth -= 1;
                continue;
            }
            _ => {}
        }
        if depth == 0 && t.eq_ignore_ascii_case(needle) {
            return Some(i);
        }
    }
    None
}

/// Find the last occurrence of `needle` at depth 0 (used for right-associative splits).
pub fn rfind_token_ci(tokens: &[String], needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut found = None;
    for (i, t) in tokens.iter().enumerate() {
        match t.as_str() {
            "(" => {
                depth += 1;
                continue;
            }
            ")" => {
                depth -= 1;
                continue;
            }
            _ => {}
        }
        if depth == 0 && t.eq_ignore_ascii_case(needle) {
            found = Some(i);
        }
    }
    found
}

/// Split `tokens[open_paren_idx..]` (where `tokens[open_paren_idx] == "("`) into the
/// index just past the matching `")"`. Returns the inner token slice and the index after
/// the close paren.
pub fn matching_paren(tokens: &[String], open_paren_idx: usize) -> Result<(usize, usize), DocSqlError> {
    let mut depth = 0i32;
    for (off, t) in tokens[open_paren_idx..].iter().enumerate() {
        match t.as_str() {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Ok((open_paren_idx + 1, open_paren_idx + off));
                }
            }
            _ => {}
        }
    }
    Err(DocSqlError::parse("unterminated parenthesized group"))
}

/// Split a comma-separated token slice at depth 0 into sub-slices (used for column
/// lists, value lists, `IN (...)` lists).
pub fn split_on_commas(tokens: &[String]) -> Vec<&[String]> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, t) in tokens.iter().enumerate() {
        match t.as_str() {
            "(" => depth += 1,
            ")" => depth -= 1,
            "," if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start <= tokens.len() {
        parts.push(&tokens[start..]);
    }
    parts
}
