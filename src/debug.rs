//! Pretty-printers for parsed patterns and live iterator state.
//!
//! [`AstPrinter`] shows the parsed tree of a pattern; [`StatePrinter`]
//! shows an [`Alteration`] tree mid-enumeration, including each
//! concatenation's composition row and overflow marks. The rendered
//! text carries terminal styling; print it through [`anstream`] (as
//! the `everyword` driver does for `-p` and `-d`) and the styling is
//! stripped automatically when the output is not a terminal.

use core::fmt;
use core::fmt::Write as _;

use crate::ast::{Ast, ExprId, ExprKind, Repeat};
use crate::iter::{Alteration, Concatenation};

fn kind_style() -> anstyle::Style {
    anstyle::Style::new().bold()
}

fn group_style() -> anstyle::Style {
    anstyle::Style::new().fg_color(Some(anstyle::AnsiColor::Cyan.into()))
}

fn length_style() -> anstyle::Style {
    anstyle::Style::new().fg_color(Some(anstyle::AnsiColor::Green.into()))
}

fn overflow_style() -> anstyle::Style {
    anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::AnsiColor::Red.into()))
}

/// Displays the parsed tree of a pattern.
pub struct AstPrinter<'a> {
    ast: &'a Ast,
}

impl<'a> AstPrinter<'a> {
    /// Printer over `ast`.
    pub fn new(ast: &'a Ast) -> AstPrinter<'a> {
        AstPrinter { ast }
    }
}

impl fmt::Display for AstPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.ast, self.ast.root(), 0)
    }
}

fn write_expr(f: &mut fmt::Formatter<'_>, ast: &Ast, id: ExprId, indent: usize) -> fmt::Result {
    let expr = &ast[id];
    let kind = kind_style();
    write!(f, "{:indent$}", "")?;
    match &expr.kind {
        ExprKind::Backref { num, .. } => {
            write!(f, "{kind}backref{kind:#} \\{num}")?;
            write!(f, " -> {}#{num}{:#}", group_style(), group_style())?;
        }
        ExprKind::Charset(chars) => {
            write!(f, "{kind}charset{kind:#} ")?;
            write!(f, "{} [{}]", repeat_label(expr.repeat), charset_label(chars))?;
        }
        ExprKind::Words { path, words } => {
            write!(f, "{kind}words{kind:#} ")?;
            write!(f, "{} <{path}> ({} words)", repeat_label(expr.repeat), words.len())?;
        }
        ExprKind::Concat(children) => {
            write!(f, "{kind}concat{kind:#} ({} parts)", children.len())?;
        }
        ExprKind::Alter(children) => {
            write!(f, "{kind}alter{kind:#} ")?;
            write!(f, "{} ({} alternatives)", repeat_label(expr.repeat), children.len())?;
        }
    }
    if expr.group != 0 {
        write!(f, " {}#{}{:#}", group_style(), expr.group, group_style())?;
    }
    let length = length_style();
    writeln!(f, " {length}len={}{length:#}", expr.full_length)?;

    match &expr.kind {
        ExprKind::Concat(children) | ExprKind::Alter(children) => {
            for &child in children {
                write_expr(f, ast, child, indent + 2)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Displays an [`Alteration`] tree mid-enumeration.
pub struct StatePrinter<'a> {
    ast: &'a Ast,
    root: &'a Alteration,
}

impl<'a> StatePrinter<'a> {
    /// Printer over the iterator `root` of `ast`.
    pub fn new(ast: &'a Ast, root: &'a Alteration) -> StatePrinter<'a> {
        StatePrinter { ast, root }
    }
}

impl fmt::Display for StatePrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_alteration(f, self.ast, self.root, 0)
    }
}

fn write_alteration(
    f: &mut fmt::Formatter<'_>,
    ast: &Ast,
    alter: &Alteration,
    indent: usize,
) -> fmt::Result {
    let expr = &ast[alter.src];
    let kind = kind_style();
    let length = length_style();
    write!(f, "{:indent$}", "")?;
    match &expr.kind {
        ExprKind::Backref { num, .. } => {
            writeln!(f, "{kind}backref{kind:#} \\{num}")?;
        }
        ExprKind::Charset(chars) => {
            writeln!(
                f,
                "{kind}charset{kind:#} [{}] {length}len={}{length:#} ptr={}",
                charset_label(chars),
                expr.full_length,
                alter.ptr
            )?;
        }
        ExprKind::Words { words, .. } => {
            writeln!(
                f,
                "{kind}words{kind:#} ({} words) {length}len={}{length:#} ptr={}",
                words.len(),
                expr.full_length,
                alter.ptr
            )?;
        }
        ExprKind::Alter(_) | ExprKind::Concat(_) => {
            writeln!(
                f,
                "{kind}alter{kind:#} {length}len={}{length:#} ptr={}",
                expr.full_length,
                alter.ptr
            )?;
            for concat in &alter.concats {
                write_concatenation(f, ast, concat, indent + 2)?;
            }
        }
    }
    Ok(())
}

fn write_concatenation(
    f: &mut fmt::Formatter<'_>,
    ast: &Ast,
    concat: &Concatenation,
    indent: usize,
) -> fmt::Result {
    let expr = &ast[concat.src];
    let kind = kind_style();
    let length = length_style();
    write!(
        f,
        "{:indent$}{kind}concat{kind:#} {length}len={}{length:#} min={}",
        "", expr.full_length, concat.min_length
    )?;
    for (added, max) in concat.added.iter().zip(&concat.maxs) {
        write!(f, " (+{added}/{max})")?;
    }
    if concat.overflowed {
        let overflow = overflow_style();
        write!(f, " {overflow}[OVR]{overflow:#}")?;
    }
    writeln!(f)?;
    for alter in &concat.alters {
        write_alteration(f, ast, alter, indent + 2)?;
    }
    Ok(())
}

/// Charset contents with non-printable bytes hex-escaped.
fn charset_label(chars: &[u8]) -> String {
    let mut label = String::new();
    for &b in chars {
        if (0x20..=0x7e).contains(&b) {
            label.push(b as char);
        } else {
            let _ = write!(label, "\\x{b:02x}");
        }
    }
    label
}

fn repeat_label(repeat: Repeat) -> String {
    match repeat.max {
        Some(max) => format!("{{{},{}}}", repeat.min, max),
        None => format!("{{{},}}", repeat.min),
    }
}

/// Prints the parsed tree to stdout; used by the driver's `-p`.
pub fn print_ast(ast: &Ast) {
    anstream::println!("{}", AstPrinter::new(ast));
}

/// Prints live iterator state to stdout; used by the driver's `-d`.
pub fn print_state(ast: &Ast, root: &Alteration) {
    anstream::println!("{}", StatePrinter::new(ast, root));
}
