//! Property tests over the public surface: random small finite
//! patterns, checked against exhaustive enumeration.

use proptest::prelude::*;

use everyword::{parse, Alteration, Generator};

fn atom() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_owned()),
        Just("[abc]".to_owned()),
        Just("[0-2]".to_owned()),
        Just("(x|yz)".to_owned()),
        Just("q?".to_owned()),
        Just("[ab]{1,2}".to_owned()),
        Just("z{0,2}".to_owned()),
        Just("(0|1){2}".to_owned()),
    ]
}

fn pattern() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(atom(), 1..4),
        prop::collection::vec(atom(), 0..3),
    )
        .prop_map(|(left, right)| {
            if right.is_empty() {
                left.concat()
            } else {
                format!("{}|{}", left.concat(), right.concat())
            }
        })
}

/// Full enumeration through the raw surface, full `inc` only.
fn enumerate_slowly(pattern: &str) -> Vec<Vec<u8>> {
    let ast = parse(pattern).unwrap();
    let mut root = Alteration::new(&ast, ast.root());
    let mut words = Vec::new();
    let mut buf = vec![0u8; 256];
    loop {
        let n = root.value(&ast, &mut buf);
        words.push(buf[..n].to_vec());
        if !root.inc(&ast) {
            break;
        }
    }
    words
}

proptest! {
    #[test]
    fn cardinality_matches_enumeration(pattern in pattern()) {
        let gen = Generator::new(&pattern).unwrap();
        let full = gen.full_length().as_finite().expect("patterns here are finite");
        let words: Vec<_> = gen.collect();
        prop_assert_eq!(words.len() as i64, full);
    }

    #[test]
    fn fast_path_agrees_with_full_increments(pattern in pattern()) {
        let fast: Vec<_> = Generator::new(&pattern).unwrap().collect();
        let slow = enumerate_slowly(&pattern);
        prop_assert_eq!(fast, slow);
    }

    #[test]
    fn seeking_agrees_with_naive_advance(pattern in pattern(), index in 0u64..4096) {
        let all = enumerate_slowly(&pattern);
        let k = (index as usize) % all.len();
        let mut gen = Generator::with_offset_count(&pattern, k as u64, None).unwrap();
        let next = gen.next();
        prop_assert_eq!(next.as_ref(), Some(&all[k]));
    }

    #[test]
    fn seeking_is_idempotent(pattern in pattern(), index in 0u64..4096) {
        let ast = parse(&pattern).unwrap();
        let full = ast.full_length().as_finite().unwrap() as u64;
        let k = index % full.max(1);

        let mut once = Alteration::new(&ast, ast.root());
        let mut twice = Alteration::new(&ast, ast.root());
        once.set_offset(&ast, k);
        twice.set_offset(&ast, k);
        twice.set_offset(&ast, k);

        let mut buf_once = vec![0u8; 256];
        let mut buf_twice = vec![0u8; 256];
        for _ in 0..4 {
            let n_once = once.value(&ast, &mut buf_once);
            let n_twice = twice.value(&ast, &mut buf_twice);
            prop_assert_eq!(&buf_once[..n_once], &buf_twice[..n_twice]);
            once.inc(&ast);
            twice.inc(&ast);
        }
    }

    #[test]
    fn resumed_iteration_continues_the_sequence(pattern in pattern(), index in 0u64..4096) {
        let all = enumerate_slowly(&pattern);
        let k = (index as usize) % all.len();
        let resumed: Vec<_> = Generator::with_offset_count(&pattern, k as u64, None)
            .unwrap()
            .collect();
        prop_assert_eq!(&resumed[..], &all[k..]);
    }
}
