use super::*;

use crate::ast::ExprKind;
use crate::error::ParseErrorKind;

/// Every charset in the arena, in the order the atoms were parsed.
fn charsets(ast: &Ast) -> Vec<Vec<u8>> {
    ast.exprs
        .iter()
        .filter_map(|expr| match &expr.kind {
            ExprKind::Charset(chars) => Some(chars.clone()),
            _ => None,
        })
        .collect()
}

/// Repeats of the root's first alternative, atom by atom.
fn root_repeats(ast: &Ast) -> Vec<(i64, Option<i64>)> {
    let ExprKind::Alter(alternatives) = &ast[ast.root()].kind else {
        panic!("root is not an alter");
    };
    ast.concat_children(alternatives[0])
        .iter()
        .map(|&atom| {
            let repeat = ast[atom].repeat;
            (repeat.min, repeat.max)
        })
        .collect()
}

fn alternative_count(ast: &Ast) -> usize {
    match &ast[ast.root()].kind {
        ExprKind::Alter(alternatives) => alternatives.len(),
        _ => 0,
    }
}

fn kind_of(err: ParseError) -> ParseErrorKind {
    match err.kind() {
        ParseErrorKind::UnclosedBrace => ParseErrorKind::UnclosedBrace,
        ParseErrorKind::UnclosedBracket => ParseErrorKind::UnclosedBracket,
        ParseErrorKind::BadHexDigit(ch) => ParseErrorKind::BadHexDigit(*ch),
        ParseErrorKind::UnresolvedBackref(num) => ParseErrorKind::UnresolvedBackref(*num),
        ParseErrorKind::EmptyClass => ParseErrorKind::EmptyClass,
        ParseErrorKind::WordFile { .. } => panic!("unexpected word file error"),
    }
}

#[test]
fn literals_become_singleton_charsets() {
    let ast = parse("ab").unwrap();
    assert_eq!(charsets(&ast), [b"a".to_vec(), b"b".to_vec()]);
    assert_eq!(ast.full_length(), Count::Finite(1));
}

#[test]
fn classes_come_out_sorted_and_deduplicated() {
    let ast = parse("[cbaacb]").unwrap();
    assert_eq!(charsets(&ast), [b"abc".to_vec()]);
}

#[test]
fn class_ranges() {
    let ast = parse("[a-c0-2]").unwrap();
    assert_eq!(charsets(&ast), [b"012abc".to_vec()]);
}

#[test]
fn class_negation_stays_in_the_printable_window() {
    let ast = parse("[^a]").unwrap();
    let set = &charsets(&ast)[0];
    assert_eq!(set.len(), 95);
    assert!(!set.contains(&b'a'));
    assert!(set.contains(&b' '));
    assert!(set.contains(&0x7f));
    assert!(!set.contains(&0x80));
}

#[test]
fn dot_is_the_whole_window() {
    let ast = parse(".").unwrap();
    let set = &charsets(&ast)[0];
    assert_eq!(set.len(), 96);
    assert_eq!(set.first(), Some(&MIN_CHAR));
    assert_eq!(set.last(), Some(&(MAX_CHAR - 1)));
}

#[test]
fn preset_classes() {
    let ast = parse(r"\d").unwrap();
    assert_eq!(charsets(&ast), [b"0123456789".to_vec()]);

    let ast = parse(r"\s").unwrap();
    assert_eq!(charsets(&ast), [vec![9, 10, 11, 12, 13, 32]]);

    let ast = parse(r"\w").unwrap();
    let set = &charsets(&ast)[0];
    assert_eq!(set.len(), 63);
    assert!(set.contains(&b'_'));
}

#[test]
fn negated_presets_complement_the_window_only() {
    let ast = parse(r"\D").unwrap();
    let set = &charsets(&ast)[0];
    assert!(!set.contains(&b'5'));
    assert!(set.contains(&b' '));
    assert_eq!(set.len(), 86);

    // members below the window survive negation
    let ast = parse(r"\S").unwrap();
    let set = &charsets(&ast)[0];
    assert!(set.contains(&b'\t'));
    assert!(!set.contains(&b' '));
    assert!(set.contains(&b'!'));
}

#[test]
fn byte_and_control_escapes() {
    let ast = parse(r"\x41\t\n\q").unwrap();
    assert_eq!(
        charsets(&ast),
        [
            b"A".to_vec(),
            b"\t".to_vec(),
            b"\n".to_vec(),
            b"q".to_vec()
        ]
    );
}

#[test]
fn short_hex_escape_is_a_literal_x() {
    let ast = parse(r"a\x4").unwrap();
    assert_eq!(
        charsets(&ast),
        [b"a".to_vec(), b"x".to_vec(), b"4".to_vec()]
    );
}

#[test]
fn escapes_inside_classes() {
    let ast = parse(r"[\d\x21]").unwrap();
    assert_eq!(charsets(&ast), [b"!0123456789".to_vec()]);
}

#[test]
fn quantifiers_bind_the_previous_atom() {
    let ast = parse("a{2,3}b{4,}c*d+e?f{7}").unwrap();
    assert_eq!(
        root_repeats(&ast),
        [
            (2, Some(3)),
            (4, None),
            (0, None),
            (1, None),
            (0, Some(1)),
            (7, Some(7)),
        ]
    );
}

#[test]
fn quantifier_without_an_atom_is_a_literal() {
    let ast = parse("*a").unwrap();
    assert_eq!(charsets(&ast), [b"*".to_vec(), b"a".to_vec()]);
    assert_eq!(ast.full_length(), Count::Finite(1));
}

#[test]
fn alternation_splits_at_the_top_level() {
    let ast = parse("ab|cd|e").unwrap();
    assert_eq!(alternative_count(&ast), 3);
    assert_eq!(ast.full_length(), Count::Finite(3));
}

#[test]
fn empty_alternatives() {
    // kept in the middle, dropped at the end
    assert_eq!(alternative_count(&parse("a||b").unwrap()), 3);
    assert_eq!(parse("a||b").unwrap().full_length(), Count::Finite(3));
    assert_eq!(alternative_count(&parse("a|").unwrap()), 1);
    assert_eq!(alternative_count(&parse("|a").unwrap()), 2);
}

#[test]
fn empty_pattern_has_no_words() {
    let ast = parse("").unwrap();
    assert_eq!(ast.full_length(), Count::Finite(0));
}

#[test]
fn groups_number_in_source_order() {
    let ast = parse("(a(b))(c)").unwrap();
    assert_eq!(ast.group_count(), 3);
    let ordinals: Vec<u32> = ast
        .exprs
        .iter()
        .filter(|expr| expr.group != 0)
        .map(|expr| expr.group)
        .collect();
    assert_eq!(ordinals.len(), 3);
    assert!(ordinals.contains(&1));
    assert!(ordinals.contains(&2));
    assert!(ordinals.contains(&3));
}

#[test]
fn non_capturing_groups_take_no_ordinal() {
    let ast = parse("(?:a)(b)").unwrap();
    assert_eq!(ast.group_count(), 1);
}

#[test]
fn unknown_special_group_keeps_its_bytes() {
    let ast = parse("(?=a)").unwrap();
    assert_eq!(ast.group_count(), 0);
    assert_eq!(charsets(&ast), [b"=".to_vec(), b"a".to_vec()]);
}

#[test]
fn backrefs_link_to_their_group() {
    let ast = parse(r"(ab)\1").unwrap();
    let target = ast
        .exprs
        .iter()
        .find_map(|expr| match expr.kind {
            ExprKind::Backref { target, .. } => target,
            _ => None,
        })
        .expect("backref should be linked");
    assert_eq!(ast[target].group, 1);
    assert_eq!(ast.referenced_groups(), [1]);
    assert!(!ast.quantified_backref());
}

#[test]
fn quantified_backrefs_are_flagged() {
    assert!(parse(r"(a)\1{2}").unwrap().quantified_backref());
    assert!(parse(r"(a)\1?").unwrap().quantified_backref());
    assert!(!parse(r"(a)\1").unwrap().quantified_backref());
}

#[test]
fn unresolved_backref_is_an_error() {
    assert!(matches!(
        kind_of(parse(r"\1").unwrap_err()),
        ParseErrorKind::UnresolvedBackref(1)
    ));
    assert!(matches!(
        kind_of(parse(r"(a)\2").unwrap_err()),
        ParseErrorKind::UnresolvedBackref(2)
    ));
}

#[test]
fn malformed_patterns_are_rejected() {
    assert!(matches!(
        kind_of(parse("[ab").unwrap_err()),
        ParseErrorKind::UnclosedBracket
    ));
    assert!(matches!(
        kind_of(parse("a{2").unwrap_err()),
        ParseErrorKind::UnclosedBrace
    ));
    assert!(matches!(
        kind_of(parse("[]").unwrap_err()),
        ParseErrorKind::EmptyClass
    ));
    assert!(matches!(
        kind_of(parse(r"[^\x20-\x7f]").unwrap_err()),
        ParseErrorKind::EmptyClass
    ));
    assert!(matches!(
        kind_of(parse(r"\xZ1").unwrap_err()),
        ParseErrorKind::BadHexDigit('Z')
    ));
}

#[test]
fn unbalanced_parens_are_tolerated() {
    // a `(` that never closes runs to the end of the pattern
    let ast = parse("(ab").unwrap();
    assert_eq!(ast.group_count(), 1);
    assert_eq!(ast.full_length(), Count::Finite(1));
    // a stray `)` ends the parse
    let ast = parse("ab)cd").unwrap();
    assert_eq!(charsets(&ast), [b"a".to_vec(), b"b".to_vec()]);
}

#[test]
fn full_length_of_the_seed_patterns() {
    assert_eq!(
        parse(r"[1-9]\d{0,2}").unwrap().full_length(),
        Count::Finite(999)
    );
    assert_eq!(parse("a|b|c").unwrap().full_length(), Count::Finite(3));
    assert_eq!(parse(r"(ab|cd)\1").unwrap().full_length(), Count::Finite(2));
    assert_eq!(parse("x{2,3}").unwrap().full_length(), Count::Finite(2));
    assert_eq!(parse("a*").unwrap().full_length(), Count::Unlimited);
    assert_eq!(parse("[01]{3}").unwrap().full_length(), Count::Finite(8));
}

#[test]
fn full_length_saturates_to_unlimited() {
    assert_eq!(parse(".{40}").unwrap().full_length(), Count::Unlimited);
    assert_eq!(parse("a+").unwrap().full_length(), Count::Unlimited);
}

#[test]
fn atoi_is_c_flavored() {
    assert_eq!(atoi(b"12"), 12);
    assert_eq!(atoi(b"12ab"), 12);
    assert_eq!(atoi(b""), 0);
    assert_eq!(atoi(b"xyz"), 0);
    assert_eq!(atoi(b"-3"), -3);
    assert_eq!(atoi(b"  7"), 7);
}

fn temp_word_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "everyword-parse-test-{}-{name}",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn word_files_load_a_word_per_line() {
    let path = temp_word_file("words", b"apple\nbanana\ncherry\ntrailing-junk");
    let ast = parse(&format!("(?F{})", path.display())).unwrap();
    let words = ast
        .exprs
        .iter()
        .find_map(|expr| match &expr.kind {
            ExprKind::Words { words, .. } => Some(words.clone()),
            _ => None,
        })
        .expect("pattern should hold a words node");
    // the line without a newline is not a word
    assert_eq!(words, [b"apple".to_vec(), b"banana".to_vec(), b"cherry".to_vec()]);
    assert_eq!(ast.full_length(), Count::Finite(3));
    std::fs::remove_file(&path).ok();
}

#[test]
fn word_file_groups_are_non_capturing() {
    let path = temp_word_file("group", b"one\n");
    let ast = parse(&format!("(?F{})(a)", path.display())).unwrap();
    assert_eq!(ast.group_count(), 1);
    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_word_file_is_an_error() {
    let err = parse("(?F/no/such/file/anywhere)").unwrap_err();
    assert!(matches!(err.kind(), ParseErrorKind::WordFile { .. }));
}

#[test]
fn errors_carry_the_offset() {
    let err = parse("ab[cd").unwrap_err();
    assert_eq!(err.offset(), 2);
    let rendered = err.to_string();
    assert!(rendered.contains("byte 2"));
    assert!(rendered.contains("ab[cd"));
}
