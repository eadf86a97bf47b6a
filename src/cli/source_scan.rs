//! Declaration scanner for Ruby test files
//!
//! Finds test classes and the test methods they declare, with the line span of each method.
//! Recognized declarations:
//!
//! - `def test_something ... end`
//! - `test "does something" do ... end` (named `test_does_something`, as Rails does)
//! - single-line forms such as `def test_x; assert true; end` and `def test_x = assert(true)`
//!
//! Block ends are matched by indentation: a declaration ends at the first `end` indented exactly
//! like the declaration itself. Methods outside any class are not registered.

use std::path::Path;

use super::registry::{Suite, TestMethod};

/// Scan `source` (the contents of `file`) into suites.
pub fn scan_suites(file: &Path, source: &str) -> Vec<Suite> {
    let lines: Vec<&str> = source.lines().collect();
    let mut suites: Vec<Suite> = Vec::new();
    // (indent, index into `suites`) of classes still open
    let mut open: Vec<(usize, usize)> = Vec::new();

    let mut idx = 0;
    while idx < lines.len() {
        let (indent, trimmed) = split_indent(lines[idx]);
        if trimmed.is_empty() || trimmed.starts_with('#') {
            idx += 1;
            continue;
        }

        if is_end(trimmed) {
            while open.last().is_some_and(|&(class_indent, _)| class_indent > indent) {
                open.pop();
            }
            if open.last().is_some_and(|&(class_indent, _)| class_indent == indent) {
                open.pop();
            }
            idx += 1;
            continue;
        }

        if let Some(name) = class_name(trimmed) {
            let qualified = match open.last() {
                Some(&(_, parent)) => format!("{}::{}", suites[parent].name, name),
                None => name.to_string(),
            };
            suites.push(Suite::new(qualified));
            open.push((indent, suites.len() - 1));
            idx += 1;
            continue;
        }

        if let Some(test_name) = test_name(trimmed) {
            let line_count = declaration_length(&lines, idx, indent, trimmed);
            if let Some(&(_, suite)) = open.last() {
                suites[suite]
                    .methods
                    .push(TestMethod::new(test_name, file, line_number(idx), clamp_u32(line_count)));
            }
            idx += line_count;
            continue;
        }

        idx += 1;
    }

    suites
}

fn line_number(idx: usize) -> u32 {
    clamp_u32(idx + 1)
}

fn clamp_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn split_indent(line: &str) -> (usize, &str) {
    let trimmed = line.trim_start();
    (line.len() - trimmed.len(), trimmed.trim_end())
}

fn is_end(trimmed: &str) -> bool {
    match trimmed.strip_prefix("end") {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '#', ';', '.', ')']),
        None => false,
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `class Foo < Minitest::Test` → `Foo`. `class << self` is not a class declaration.
fn class_name(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix("class ")?.trim_start();
    let end = rest
        .find(|c: char| !(is_ident_char(c) || c == ':'))
        .unwrap_or(rest.len());
    let name = &rest[..end];
    if name.is_empty() { None } else { Some(name) }
}

/// Name of the test method declared on this line, if any.
fn test_name(trimmed: &str) -> Option<String> {
    if let Some(rest) = trimmed.strip_prefix("def ") {
        let rest = rest.trim_start();
        let end = rest
            .find(|c: char| !(is_ident_char(c) || c == '?' || c == '!'))
            .unwrap_or(rest.len());
        let name = &rest[..end];
        return name.starts_with("test_").then(|| name.to_string());
    }

    let rest = trimmed.strip_prefix("test")?;
    let rest = match rest.strip_prefix('(') {
        Some(rest) => rest,
        None if rest.starts_with(' ') => rest,
        None => return None,
    };
    let rest = rest.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &rest[1..];
    let description = &body[..body.find(quote)?];
    Some(format!("test_{}", underscore_whitespace(description)))
}

/// Replace each run of whitespace with a single `_`.
fn underscore_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn is_single_line(trimmed: &str) -> bool {
    let code = trimmed.split(" #").next().unwrap_or(trimmed).trim_end();
    is_endless_def(code)
        || (code.ends_with("end") && (code.contains(';') || code.contains(" do ")))
        || (code.contains('{') && code.ends_with('}'))
}

/// `def name = expr` or `def name(args) = expr`, which has no closing `end`.
///
/// A setter such as `def name=(value)` is not endless.
fn is_endless_def(code: &str) -> bool {
    let Some(rest) = code.strip_prefix("def ") else {
        return false;
    };
    let rest = rest.trim_start();
    let name_end = rest
        .find(|c: char| !(is_ident_char(c) || c == '?' || c == '!'))
        .unwrap_or(rest.len());
    let mut rest = &rest[name_end..];

    if rest.starts_with('(') {
        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in rest.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else {
            return false;
        };
        rest = &rest[close + 1..];
    } else if !rest.starts_with([' ', '\t']) {
        return false;
    }

    let Some(after) = rest.trim_start().strip_prefix('=') else {
        return false;
    };
    !after.starts_with(['=', '~', '>'])
}

/// Number of lines the declaration starting at `idx` occupies.
fn declaration_length(lines: &[&str], idx: usize, indent: usize, trimmed: &str) -> usize {
    if is_single_line(trimmed) {
        return 1;
    }
    for (offset, line) in lines[idx + 1..].iter().enumerate() {
        let (line_indent, line_trimmed) = split_indent(line);
        if line_trimmed.is_empty() || !is_end(line_trimmed) {
            continue;
        }
        if line_indent == indent {
            return offset + 2;
        }
        if line_indent < indent {
            // the enclosing block closed first
            return offset + 1;
        }
    }
    lines.len() - idx
}
