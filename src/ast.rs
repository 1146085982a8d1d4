//! Arena-allocated pattern AST.
//!
//! A parsed pattern is a tree of [`Expr`] nodes stored in one [`Ast`]
//! arena and addressed by [`ExprId`]. Children always precede their
//! parent in the arena, and the root is always an [`ExprKind::Alter`]
//! whose children are all [`ExprKind::Concat`]s; concats never nest.
//! The arena is immutable once [`parse`][crate::parse()] returns, so
//! any number of iterator trees can read it concurrently.

use core::ops;

use crate::count::Count;

/// Handle to an [`Expr`] inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    pub(crate) fn new(index: usize) -> ExprId {
        ExprId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Repetition bounds attached to an expression.
///
/// `max == None` is the unbounded quantifier (`*`, `+`, `{n,}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    /// Fewest repetitions.
    pub min: i64,
    /// Most repetitions, or `None` when unbounded.
    pub max: Option<i64>,
}

impl Repeat {
    pub(crate) const ONCE: Repeat = Repeat {
        min: 1,
        max: Some(1),
    };

    /// `true` unless this is the plain single repetition.
    pub fn is_quantified(self) -> bool {
        self != Repeat::ONCE
    }
}

/// One parsed (sub)expression.
#[derive(Debug)]
pub struct Expr {
    /// What this node produces.
    pub kind: ExprKind,
    /// Attached repetition quantifier.
    pub repeat: Repeat,
    /// Capturing-group ordinal, `0` for non-capturing nodes.
    pub group: u32,
    /// Cached cardinality of this subtree, ignoring `repeat` (the
    /// enclosing concat accounts for the repetition dimension).
    pub full_length: Count,
}

/// The five expression shapes.
#[derive(Debug)]
pub enum ExprKind {
    /// `\1`..`\9`: clone of the referenced group's current word.
    Backref {
        /// Referenced group ordinal.
        num: u8,
        /// Referent, filled in by the linking pass.
        target: Option<ExprId>,
    },
    /// One byte out of an ordered set: a literal, a class, `.`, or an
    /// escape. Never empty.
    Charset(Vec<u8>),
    /// One line out of a word file (`(?Fpath)`).
    Words {
        /// The path as written in the pattern.
        path: String,
        /// The lines, bytes taken verbatim.
        words: Vec<Vec<u8>>,
    },
    /// Subexpressions in a row, each with its own repetition.
    Concat(Vec<ExprId>),
    /// Exactly one of the listed alternatives, each a concat.
    Alter(Vec<ExprId>),
}

/// A parsed pattern: the expression arena plus pattern-wide facts.
#[derive(Debug)]
pub struct Ast {
    pub(crate) exprs: Vec<Expr>,
    pub(crate) root: ExprId,
    pub(crate) groups: u32,
    pub(crate) referenced_groups: Vec<u8>,
    pub(crate) quantified_backref: bool,
}

impl Ast {
    /// Root of the pattern; always an [`ExprKind::Alter`].
    pub fn root(&self) -> ExprId {
        self.root
    }

    /// Total number of words in the pattern's language.
    pub fn full_length(&self) -> Count {
        self[self.root].full_length
    }

    /// Number of capturing groups in the pattern.
    pub fn group_count(&self) -> u32 {
        self.groups
    }

    /// `true` when some backref carries a quantifier other than the
    /// plain single repetition. Word numbering is not stable for such
    /// patterns, so offset-based access refuses them.
    pub fn quantified_backref(&self) -> bool {
        self.quantified_backref
    }

    pub(crate) fn has_backrefs(&self) -> bool {
        !self.referenced_groups.is_empty()
    }

    /// Group ordinals some backref points at, ascending.
    pub(crate) fn referenced_groups(&self) -> &[u8] {
        &self.referenced_groups
    }

    /// Children of a concat node; empty for any other node.
    pub(crate) fn concat_children(&self, id: ExprId) -> &[ExprId] {
        match &self[id].kind {
            ExprKind::Concat(children) => children,
            _ => &[],
        }
    }

    /// Fills in `full_length` for every node. Children precede their
    /// parent in the arena, so a single forward sweep is post-order.
    pub(crate) fn calc_full_length(&mut self) {
        for i in 0..self.exprs.len() {
            let full_length = match &self.exprs[i].kind {
                ExprKind::Backref { .. } => Count::Finite(0),
                ExprKind::Charset(chars) => Count::Finite(chars.len() as i64),
                ExprKind::Words { words, .. } => Count::Finite(words.len() as i64),
                ExprKind::Alter(children) => {
                    let mut total = Count::Finite(0);
                    for &child in children {
                        total = total.saturating_add(self.exprs[child.index()].full_length);
                        if total.is_unlimited() {
                            break;
                        }
                    }
                    total
                }
                ExprKind::Concat(children) => {
                    let mut total = Count::Finite(1);
                    for &child in children {
                        let sub = &self.exprs[child.index()];
                        if sub.full_length.is_unlimited() && sub.repeat.max != Some(0) {
                            total = Count::Unlimited;
                        } else if sub.full_length != Count::Finite(0) && sub.repeat.max.is_none() {
                            total = Count::Unlimited;
                        } else if sub.full_length != Count::Finite(0) {
                            // zero-length children contribute no choices
                            if let Some(max) = sub.repeat.max {
                                total = total.saturating_mul(counted_lengths(
                                    sub.full_length,
                                    sub.repeat.min,
                                    max,
                                ));
                            }
                        }
                        if total.is_unlimited() {
                            break;
                        }
                    }
                    total
                }
            };
            self.exprs[i].full_length = full_length;
        }
    }
}

/// `Σ length^j` over `j = min ..= max`: how many words one child
/// contributes across all of its admissible repetition counts.
fn counted_lengths(length: Count, min: i64, max: i64) -> Count {
    if length == Count::Finite(1) {
        return Count::Finite(max.saturating_sub(min).saturating_add(1).max(0));
    }
    let mut all_counts = Count::Finite(0);
    let mut fixed = length.saturating_pow(min);
    let mut j = min;
    while j <= max {
        all_counts = all_counts.saturating_add(fixed);
        if all_counts.is_unlimited() {
            break;
        }
        fixed = fixed.saturating_mul(length);
        j += 1;
    }
    all_counts
}

impl ops::Index<ExprId> for Ast {
    type Output = Expr;

    fn index(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }
}
