//! Enumerate every word of a regular language, in order.
//!
//! Most regex crates answer "does this string match?". `everyword`
//! goes the other way: given a pattern, it *produces* the (possibly
//! infinite) sequence of every string the pattern can match, in a
//! defined total order, with random access by index and a cardinality
//! query for finite languages.
//!
//! ```
//! use everyword::{Count, Generator};
//!
//! let gen = Generator::new("[ab]{1,2}")?;
//! assert_eq!(gen.full_length(), Count::Finite(6));
//!
//! let words: Vec<Vec<u8>> = gen.collect();
//! assert_eq!(words, [&b"a"[..], b"b", b"aa", b"ab", b"ba", b"bb"]);
//! # Ok::<(), everyword::Error>(())
//! ```
//!
//! Words come out shortest repetition total first, then by composition
//! of that total, then in odometer order with the rightmost position
//! fastest — so `[01]{3}` counts `000`, `001`, `010`, ... `111`.
//! Seeking does not enumerate what it skips:
//!
//! ```
//! use everyword::Generator;
//!
//! let mut gen = Generator::with_offset_count("[1-9][0-9]{0,2}", 998, None)?;
//! assert_eq!(gen.next(), Some(b"999".to_vec()));
//! # Ok::<(), everyword::Error>(())
//! ```
//!
//! # Pattern syntax
//!
//! 7-bit ASCII patterns with quantifiers (`*`, `+`, `?`, `{n}`,
//! `{n,}`, `{n,m}`), classes with ranges and negation (`[a-z]`,
//! `[^0-9]`), preset classes (`.`, `\d`, `\s`, `\w` and their
//! complements), byte and control escapes (`\xHH`, `\t`, ...), groups
//! with backreferences (`(ab|cd)\1`), and word files: `(?Fpath)`
//! enumerates the lines of `path`. See [`parse()`] for the grammar.
//! Matching-only constructs (anchors, lookaround) are not supported —
//! there is no matcher here.
//!
//! # Layers
//!
//! - [`Generator`]: the high-level surface — an iterator with an
//!   `(offset, count)` window, length query, indexing, and slicing.
//! - [`parse()`] + [`Alteration`]: the raw engine — caller-managed
//!   buffers, [`inc`][Alteration::inc]/[`value`][Alteration::value]
//!   stepping, [`set_offset`][Alteration::set_offset] seeking, and the
//!   [`inc_in_place`][Alteration::inc_in_place] fast path that patches
//!   only the bytes that change.
//! - [`debug`]: pretty-printers for the parsed tree and live iterator
//!   state, as exposed by the `everyword` driver's `-p`/`-d` flags.

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::checked_conversions)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_into_iter_loop)]
#![warn(clippy::filter_map_next)]
#![warn(clippy::flat_map_option)]
#![warn(clippy::from_iter_instead_of_collect)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::linkedlist)]
#![warn(clippy::macro_use_imports)]
#![warn(clippy::needless_continue)]
#![warn(clippy::needless_for_each)]
#![warn(clippy::ref_option_ref)]
#![warn(clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::string_add_assign)]
#![warn(clippy::string_lit_as_bytes)]
#![warn(clippy::todo)]
#![warn(clippy::unnested_or_patterns)]
#![warn(clippy::verbose_file_reads)]
#![warn(future_incompatible)]
#![warn(nonstandard_style)]
#![warn(rust_2018_idioms)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::let_and_return)]

pub mod ast;
mod count;
pub mod debug;
mod error;
mod generator;
mod iter;
mod parse;

pub use crate::ast::Ast;
pub use crate::ast::ExprId;
pub use crate::count::Count;
pub use crate::count::BIGNUM;
pub use crate::error::Error;
pub use crate::error::ParseError;
pub use crate::error::ParseErrorKind;
pub use crate::generator::Generator;
pub use crate::iter::Alteration;
pub use crate::parse::parse;
pub use crate::parse::MAX_CHAR;
pub use crate::parse::MIN_CHAR;
