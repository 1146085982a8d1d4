//! Pattern parser.
//!
//! One pass of recursive descent over the pattern bytes builds the
//! [`Ast`] arena, followed by two short passes: backreference linking
//! and cardinality computation. The accepted syntax:
//!
//! ```text
//! expr       := concat ('|' concat)*
//! concat     := atom_q*
//! atom_q     := atom quantifier?
//! atom       := '.' | class | escaped | backref | group | literal
//! quantifier := '*' | '+' | '?' | '{' n '}' | '{' n ',' '}' | '{' n ',' m '}'
//! group      := '(' expr ')' | '(?:' expr ')' | '(?F' path ')'
//! ```
//!
//! Escapes: `\d \D \s \S \w \W` expand to preset classes, `\xHH` is a
//! literal byte, `\t \r \n \f \v` are the usual control bytes,
//! `\1`..`\9` are backreferences, and any other `\X` is a literal `X`.
//! Classes support ranges and a leading `^`; negation complements
//! within [`MIN_CHAR`]`..`[`MAX_CHAR`] only, and `.` is that whole
//! range. `(?Fpath)` reads a word per line from `path`, eagerly.
//!
//! A quantifier with nothing to bind to is an ordinary literal, and a
//! stray `)` simply ends the parse.

use std::fs;
use std::mem;

use crate::ast::{Ast, Expr, ExprId, ExprKind, Repeat};
use crate::count::Count;
use crate::error::{ParseError, ParseErrorKind};

#[cfg(test)]
mod tests;

/// Lowest byte in the `.` class.
pub const MIN_CHAR: u8 = 32;
/// One past the highest byte in the `.` class.
pub const MAX_CHAR: u8 = 128;

/// Parses `pattern` into an [`Ast`].
///
/// ```
/// use everyword::Count;
///
/// let ast = everyword::parse("[1-9][0-9]{0,2}")?;
/// assert_eq!(ast.full_length(), Count::Finite(999));
/// # Ok::<(), everyword::ParseError>(())
/// ```
pub fn parse(pattern: &str) -> Result<Ast, ParseError> {
    let mut parser = Parser {
        pattern,
        bytes: pattern.as_bytes(),
        pos: 0,
        exprs: Vec::new(),
        groups: 0,
        backref_at: Vec::new(),
    };
    let root = parser.parse_expr()?;
    let Parser {
        exprs,
        groups,
        backref_at,
        ..
    } = parser;
    let mut ast = Ast {
        exprs,
        root,
        groups,
        referenced_groups: Vec::new(),
        quantified_backref: false,
    };
    link_backrefs(&mut ast, pattern, &backref_at)?;
    ast.calc_full_length();
    Ok(ast)
}

/// Resolves every backref to its group and records which ordinals are
/// referenced.
fn link_backrefs(
    ast: &mut Ast,
    pattern: &str,
    backref_at: &[(ExprId, usize)],
) -> Result<(), ParseError> {
    let mut by_ordinal: [Option<ExprId>; 10] = [None; 10];
    for (index, expr) in ast.exprs.iter().enumerate() {
        if (1..=9).contains(&expr.group) {
            by_ordinal[expr.group as usize] = Some(ExprId::new(index));
        }
    }

    let mut referenced = Vec::new();
    let mut quantified = false;
    for &(id, at) in backref_at {
        let repeat = ast.exprs[id.index()].repeat;
        let num = match ast.exprs[id.index()].kind {
            ExprKind::Backref { num, .. } => num,
            _ => continue,
        };
        let Some(group_id) = by_ordinal[num as usize] else {
            return Err(ParseError::new(
                pattern,
                at,
                ParseErrorKind::UnresolvedBackref(num),
            ));
        };
        if let ExprKind::Backref { target, .. } = &mut ast.exprs[id.index()].kind {
            *target = Some(group_id);
        }
        if !referenced.contains(&num) {
            referenced.push(num);
        }
        if repeat.is_quantified() {
            quantified = true;
        }
    }
    referenced.sort_unstable();
    ast.referenced_groups = referenced;
    ast.quantified_backref = quantified;
    Ok(())
}

struct Parser<'p> {
    pattern: &'p str,
    bytes: &'p [u8],
    pos: usize,
    exprs: Vec<Expr>,
    groups: u32,
    /// Backref nodes with their source offsets, for linking errors.
    backref_at: Vec<(ExprId, usize)>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn error(&self, at: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.pattern, at, kind)
    }

    fn push(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId::new(self.exprs.len());
        self.exprs.push(Expr {
            kind,
            repeat: Repeat::ONCE,
            group: 0,
            full_length: Count::Finite(0),
        });
        id
    }

    /// `expr := concat ('|' concat)*`, up to a `)` or the end of the
    /// pattern. The `)` is left for the caller.
    fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        let mut alternatives = Vec::new();
        let mut atoms: Vec<ExprId> = Vec::new();
        while let Some(ch) = self.peek() {
            match ch {
                b'.' => {
                    self.bump();
                    let id = self.push(ExprKind::Charset(full_class()));
                    atoms.push(id);
                }
                b'[' => {
                    let set = self.parse_class()?;
                    let id = self.push(ExprKind::Charset(set));
                    atoms.push(id);
                }
                b'\\' => {
                    if let Some(digit @ b'1'..=b'9') = self.peek_at(1) {
                        let at = self.pos;
                        self.bump();
                        self.bump();
                        let id = self.push(ExprKind::Backref {
                            num: digit - b'0',
                            target: None,
                        });
                        self.backref_at.push((id, at));
                        atoms.push(id);
                    } else {
                        let set = self.parse_escape()?;
                        let id = self.push(ExprKind::Charset(set));
                        atoms.push(id);
                    }
                }
                b'*' if !atoms.is_empty() => {
                    self.bump();
                    self.repeat_last(&atoms, 0, None);
                }
                b'+' if !atoms.is_empty() => {
                    self.bump();
                    self.repeat_last(&atoms, 1, None);
                }
                b'?' if !atoms.is_empty() => {
                    self.bump();
                    self.repeat_last(&atoms, 0, Some(1));
                }
                b'{' if !atoms.is_empty() => {
                    let (min, max) = self.parse_repeat()?;
                    self.repeat_last(&atoms, min, max);
                }
                b'|' => {
                    self.bump();
                    let concat = self.push(ExprKind::Concat(mem::take(&mut atoms)));
                    alternatives.push(concat);
                }
                b'(' => {
                    let id = self.parse_group()?;
                    atoms.push(id);
                }
                b')' => break,
                _ => {
                    self.bump();
                    let id = self.push(ExprKind::Charset(vec![ch]));
                    atoms.push(id);
                }
            }
        }
        // a trailing empty alternative is dropped, mid-pattern ones
        // are kept
        if !atoms.is_empty() {
            let concat = self.push(ExprKind::Concat(atoms));
            alternatives.push(concat);
        }
        Ok(self.push(ExprKind::Alter(alternatives)))
    }

    fn repeat_last(&mut self, atoms: &[ExprId], min: i64, max: Option<i64>) {
        if let Some(&last) = atoms.last() {
            self.exprs[last.index()].repeat = Repeat { min, max };
        }
    }

    /// Called at a `(`.
    fn parse_group(&mut self) -> Result<ExprId, ParseError> {
        self.bump();
        if self.peek() == Some(b'?') {
            self.bump();
            match self.peek() {
                Some(b'F') => {
                    self.bump();
                    let (path, words) = self.parse_words()?;
                    if self.peek() == Some(b')') {
                        self.bump();
                    }
                    return Ok(self.push(ExprKind::Words { path, words }));
                }
                Some(b':') => self.bump(),
                // any other `(?X` form: non-capturing, bytes kept
                _ => {}
            }
            let id = self.parse_expr()?;
            if self.peek() == Some(b')') {
                self.bump();
            }
            Ok(id)
        } else {
            self.groups += 1;
            let group = self.groups;
            let id = self.parse_expr()?;
            if self.peek() == Some(b')') {
                self.bump();
            }
            self.exprs[id.index()].group = group;
            Ok(id)
        }
    }

    /// Called at a `[`.
    fn parse_class(&mut self) -> Result<Vec<u8>, ParseError> {
        let start = self.pos;
        self.bump();
        let negate = if self.peek() == Some(b'^') {
            self.bump();
            true
        } else {
            false
        };

        let mut members = [false; 256];
        let mut prev: Option<u8> = None;
        let mut closed = false;
        while let Some(ch) = self.peek() {
            if ch == b'\\' {
                for b in self.parse_escape()? {
                    members[b as usize] = true;
                }
                // the backslash itself is what a following `-` ranges
                // from
                prev = Some(b'\\');
            } else if ch == b'-' && prev.is_some() {
                self.bump();
                let Some(hi) = self.peek() else { break };
                self.bump();
                let lo = prev.take().unwrap_or(hi);
                for b in lo..=hi {
                    members[b as usize] = true;
                }
                prev = Some(hi);
            } else if ch == b']' {
                self.bump();
                closed = true;
                break;
            } else {
                self.bump();
                members[ch as usize] = true;
                prev = Some(ch);
            }
        }
        if !closed {
            return Err(self.error(start, ParseErrorKind::UnclosedBracket));
        }

        if negate {
            negate_in_window(&mut members);
        }
        let set = collect_members(&members);
        if set.is_empty() {
            return Err(self.error(start, ParseErrorKind::EmptyClass));
        }
        Ok(set)
    }

    /// Called at a `\`; returns the byte set it denotes. Backrefs are
    /// recognized by the caller before this runs, so a digit here is a
    /// literal (as inside a class).
    fn parse_escape(&mut self) -> Result<Vec<u8>, ParseError> {
        self.bump();
        let Some(ch) = self.peek() else {
            // trailing backslash denotes a NUL byte
            return Ok(vec![0]);
        };
        self.bump();
        let set = match ch {
            b'd' => class_of(&[(b'0', b'9')], &[], false),
            b'D' => class_of(&[(b'0', b'9')], &[], true),
            b's' => class_of(&[], SPACE_BYTES, false),
            b'S' => class_of(&[], SPACE_BYTES, true),
            b'w' => class_of(WORD_RANGES, &[b'_'], false),
            b'W' => class_of(WORD_RANGES, &[b'_'], true),
            b'x' => match (self.peek(), self.peek_at(1)) {
                (Some(hi), Some(lo)) => {
                    let at = self.pos;
                    let hi = hex_value(hi)
                        .ok_or_else(|| self.error(at, ParseErrorKind::BadHexDigit(hi as char)))?;
                    let lo = hex_value(lo).ok_or_else(|| {
                        self.error(at + 1, ParseErrorKind::BadHexDigit(lo as char))
                    })?;
                    self.bump();
                    self.bump();
                    vec![(hi << 4) | lo]
                }
                // fewer than two bytes left: a literal `x`
                _ => vec![b'x'],
            },
            b't' => vec![b'\t'],
            b'r' => vec![b'\r'],
            b'n' => vec![b'\n'],
            b'f' => vec![0x0c],
            b'v' => vec![0x0b],
            other => vec![other],
        };
        Ok(set)
    }

    /// Called at a `{`.
    fn parse_repeat(&mut self) -> Result<(i64, Option<i64>), ParseError> {
        let start = self.pos;
        let rest = &self.bytes[start..];
        let Some(close) = memchr::memchr(b'}', rest) else {
            return Err(self.error(start, ParseErrorKind::UnclosedBrace));
        };
        let body = &rest[1..close];
        let bounds = match memchr::memchr(b',', body) {
            None => {
                let n = atoi(body);
                (n, Some(n))
            }
            Some(comma) if comma + 1 == body.len() => (atoi(&body[..comma]), None),
            Some(comma) => (atoi(&body[..comma]), Some(atoi(&body[comma + 1..]))),
        };
        self.pos = start + close + 1;
        Ok(bounds)
    }

    /// Called right after `(?F`; the path runs to the next `)` (left
    /// for the caller) or the end of the pattern.
    fn parse_words(&mut self) -> Result<(String, Vec<Vec<u8>>), ParseError> {
        let start = self.pos;
        let end = memchr::memchr(b')', &self.bytes[start..]).map_or(self.bytes.len(), |i| start + i);
        let path = String::from_utf8_lossy(&self.bytes[start..end]).into_owned();
        self.pos = end;

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(source) => {
                return Err(self.error(start, ParseErrorKind::WordFile { path, source }));
            }
        };
        let mut words = Vec::new();
        let mut from = 0;
        for nl in memchr::memchr_iter(b'\n', &data) {
            words.push(data[from..nl].to_vec());
            from = nl + 1;
        }
        // bytes after the last newline are not a word
        Ok((path, words))
    }
}

const SPACE_BYTES: &[u8] = &[b' ', b'\t', b'\n', b'\r', 0x0c, 0x0b];
const WORD_RANGES: &[(u8, u8)] = &[(b'a', b'z'), (b'A', b'Z'), (b'0', b'9')];

/// The `.` class: every byte in `MIN_CHAR..MAX_CHAR`.
fn full_class() -> Vec<u8> {
    (MIN_CHAR..MAX_CHAR).collect()
}

fn class_of(ranges: &[(u8, u8)], singles: &[u8], negate: bool) -> Vec<u8> {
    let mut members = [false; 256];
    for &(lo, hi) in ranges {
        for b in lo..=hi {
            members[b as usize] = true;
        }
    }
    for &b in singles {
        members[b as usize] = true;
    }
    if negate {
        negate_in_window(&mut members);
    }
    collect_members(&members)
}

/// Negation complements `MIN_CHAR..MAX_CHAR` only; members outside the
/// window are left as they are.
fn negate_in_window(members: &mut [bool; 256]) {
    for slot in members
        .iter_mut()
        .take(MAX_CHAR as usize)
        .skip(MIN_CHAR as usize)
    {
        *slot = !*slot;
    }
}

/// Members in byte order: charsets come out sorted and deduplicated.
fn collect_members(members: &[bool; 256]) -> Vec<u8> {
    (0..=255u8).filter(|&b| members[b as usize]).collect()
}

fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

/// Leading integer of `bytes`, C `atoi` style: optional sign, trailing
/// junk ignored, `0` when there are no digits at all.
fn atoi(bytes: &[u8]) -> i64 {
    let mut pos = 0;
    while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
        pos += 1;
    }
    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };
    let mut value: i64 = 0;
    while let Some(&b) = bytes.get(pos) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
        pos += 1;
    }
    if negative {
        -value
    } else {
        value
    }
}
