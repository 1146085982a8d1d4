//! The enumeration engine.
//!
//! Two iterator shapes mirror the AST. An [`Alteration`] wraps any
//! non-concat node and steps through its choice set: the bytes of a
//! charset, the lines of a word file, or the alternatives of an alter.
//! A `Concatenation` wraps a concat node and enumerates, shortest
//! total first, every way of distributing repetitions over its
//! children (a *composition*), running an odometer over the flattened
//! child iterators inside each composition.
//!
//! Iterators hold only [`ExprId`]s into the AST, so every method takes
//! the [`Ast`]; the AST is never mutated. All state needed to resume,
//! reposition, or in-place-advance the enumeration lives in this tree.
//!
//! The composition enumerator works on the parallel `maxs`/`added`
//! arrays: `added[i]` is how many repetitions child `i` currently has
//! beyond its minimum, and `maxs[i]` is the most it may have for the
//! current total. `fill_seq` builds the first composition of a total
//! by greedy left-to-right filling; `inc_seq` advances to the next
//! composition of the same total, or reports that the total is
//! exhausted.

use crate::ast::{Ast, ExprId, ExprKind};
use crate::count::{Count, BIGNUM};


/// Where the next word can be produced by touching only the bytes the
/// last `value` wrote, refreshed by every full [`Alteration::inc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fast {
    /// No cheap continuation point.
    Invalid,
    /// This node itself advanced last.
    Here,
    /// The rightmost flattened instance of the current alternative
    /// advanced last.
    Rightmost,
}

/// Iterator over the choice set of one non-concat AST node.
///
/// The low-level surface: [`value`][Alteration::value] writes the
/// current word, [`inc`][Alteration::inc] steps to the next one,
/// [`set_offset`][Alteration::set_offset] repositions without stepping,
/// and [`inc_in_place`][Alteration::inc_in_place] is the cheap advance
/// that patches the previous output buffer when only its tail changes.
///
/// ```
/// let ast = everyword::parse("[01]{3}")?;
/// let mut root = everyword::Alteration::new(&ast, ast.root());
/// let mut buf = [0u8; 8];
///
/// let n = root.value(&ast, &mut buf);
/// assert_eq!(&buf[..n], b"000");
/// assert!(root.inc(&ast));
/// let n = root.value(&ast, &mut buf);
/// assert_eq!(&buf[..n], b"001");
/// # Ok::<(), everyword::ParseError>(())
/// ```
#[derive(Debug)]
pub struct Alteration {
    pub(crate) src: ExprId,
    /// Current choice: byte index, word index, or alternative index.
    pub(crate) ptr: usize,
    /// One per alternative; empty unless the node is an alter.
    pub(crate) concats: Vec<Concatenation>,
    /// Where the last `value` put this node's bytes: buffer position
    /// and length.
    last: Option<(usize, usize)>,
    fast: Fast,
}

impl Alteration {
    /// Fresh iterator over `id`, positioned at the first word.
    ///
    /// # Panics
    ///
    /// `id` must not name a concat node; concats are only iterated
    /// through their enclosing alter.
    pub fn new(ast: &Ast, id: ExprId) -> Alteration {
        assert!(
            !matches!(ast[id].kind, ExprKind::Concat(_)),
            "an Alteration cannot wrap a concat node"
        );
        let mut concats = Vec::new();
        if let ExprKind::Alter(children) = &ast[id].kind {
            concats.reserve(children.len());
            for &child in children {
                concats.push(Concatenation::new(ast, child));
            }
        }
        Alteration {
            src: id,
            ptr: 0,
            concats,
            last: None,
            fast: Fast::Invalid,
        }
    }

    /// Back to the first word.
    pub fn reset(&mut self, ast: &Ast) {
        self.ptr = 0;
        self.last = None;
        self.fast = Fast::Invalid;
        for concat in &mut self.concats {
            concat.reset(ast);
        }
    }

    /// Writes the current word into `dst`, truncating at capacity, and
    /// returns the byte count. A return equal to `dst.len()` means the
    /// word may have been cut short; grow the buffer and retry.
    pub fn value(&mut self, ast: &Ast, dst: &mut [u8]) -> usize {
        let caps = Captures::resolve(self, ast);
        self.write_value(ast, &caps, dst, 0)
    }

    fn write_value(&mut self, ast: &Ast, caps: &Captures, dst: &mut [u8], at: usize) -> usize {
        let cap = dst.len().saturating_sub(at);
        let written = match &ast[self.src].kind {
            ExprKind::Backref { num, .. } => {
                let bytes = caps.get(*num);
                let len = bytes.len().min(cap);
                dst[at..at + len].copy_from_slice(&bytes[..len]);
                len
            }
            ExprKind::Charset(chars) => match chars.get(self.ptr) {
                Some(&b) if cap > 0 => {
                    dst[at] = b;
                    1
                }
                _ => 0,
            },
            ExprKind::Words { words, .. } => match words.get(self.ptr) {
                Some(word) => {
                    let len = word.len().min(cap);
                    dst[at..at + len].copy_from_slice(&word[..len]);
                    len
                }
                None => 0,
            },
            ExprKind::Alter(_) => match self.concats.get_mut(self.ptr) {
                Some(concat) => concat.write_value(ast, caps, dst, at),
                None => 0,
            },
            // excluded by `new`
            ExprKind::Concat(_) => 0,
        };
        self.last = Some((at, written));
        written
    }

    /// Advances to the next word. Returns `false` when the iterator
    /// wrapped back to its first word (the carry signal).
    pub fn inc(&mut self, ast: &Ast) -> bool {
        self.ptr += 1;
        self.fast = Fast::Invalid;
        match &ast[self.src].kind {
            ExprKind::Backref { .. } => false,
            ExprKind::Charset(chars) => {
                if self.ptr >= chars.len() {
                    self.ptr = 0;
                    false
                } else {
                    self.fast = Fast::Here;
                    true
                }
            }
            ExprKind::Words { words, .. } => {
                if self.ptr >= words.len() {
                    self.ptr = 0;
                    false
                } else {
                    self.fast = Fast::Here;
                    true
                }
            }
            ExprKind::Alter(_) => {
                // first: is there a later alternative still mid-cycle?
                while self.ptr < self.concats.len() {
                    if !self.concats[self.ptr].overflowed {
                        self.fast = Fast::Here;
                        return true;
                    }
                    self.ptr += 1;
                }
                // rotate: every live alternative moves to its next
                // word; the first that succeeds becomes current
                let mut advanced = false;
                for i in 0..self.concats.len() {
                    if !self.concats[i].overflowed && self.concats[i].inc(ast) && !advanced {
                        self.ptr = i;
                        self.fast = Fast::Rightmost;
                        advanced = true;
                    }
                }
                if !advanced {
                    self.ptr = 0;
                    for concat in &mut self.concats {
                        concat.reset(ast);
                    }
                }
                advanced
            }
            ExprKind::Concat(_) => false,
        }
    }

    /// Cheap advance: steps the iterator and patches the bytes of the
    /// previous [`value`][Alteration::value] in `dst` directly, when
    /// the next word differs only in this node's last-written bytes.
    /// Returns `false` when a structural advance is needed; fall back
    /// to a full [`inc`][Alteration::inc] then.
    pub fn inc_in_place(&mut self, ast: &Ast, dst: &mut [u8]) -> bool {
        match self.fast {
            Fast::Invalid => false,
            Fast::Here => self.patch_here(ast, dst),
            Fast::Rightmost => match self
                .concats
                .get_mut(self.ptr)
                .and_then(|concat| concat.alters.last_mut())
            {
                Some(alter) => alter.patch_here(ast, dst),
                None => false,
            },
        }
    }

    fn patch_here(&mut self, ast: &Ast, dst: &mut [u8]) -> bool {
        let Some((pos, len)) = self.last else {
            return false;
        };
        match &ast[self.src].kind {
            ExprKind::Charset(chars) => {
                if self.ptr + 1 >= chars.len() || pos >= dst.len() {
                    return false;
                }
                self.ptr += 1;
                dst[pos] = chars[self.ptr];
                true
            }
            ExprKind::Words { words, .. } => {
                let Some(next) = words.get(self.ptr + 1) else {
                    return false;
                };
                // a different length would shift everything behind it
                if next.len() != len || pos + len > dst.len() {
                    return false;
                }
                self.ptr += 1;
                dst[pos..pos + len].copy_from_slice(next);
                true
            }
            // backrefs and alters need a structural advance
            _ => false,
        }
    }

    /// Repositions so that the next [`value`][Alteration::value]
    /// produces word `offset` of this node's language (0-indexed,
    /// modulo the full length when finite), exactly as if `inc` had
    /// been called `offset` times from the start.
    pub fn set_offset(&mut self, ast: &Ast, offset: u64) {
        self.set_offset_signed(ast, offset.min(BIGNUM as u64) as i64);
    }

    fn set_offset_signed(&mut self, ast: &Ast, mut offset: i64) {
        match ast[self.src].full_length {
            Count::Finite(0) => return,
            Count::Finite(full) => offset %= full,
            Count::Unlimited => {}
        }
        match &ast[self.src].kind {
            ExprKind::Backref { .. } | ExprKind::Concat(_) => {}
            ExprKind::Charset(_) | ExprKind::Words { .. } => self.ptr = offset as usize,
            ExprKind::Alter(_) => self.skip_into_alternatives(ast, offset),
        }
        self.fast = Fast::Invalid;
    }

    /// Distributes `offset` words over the alternatives the way the
    /// rotation in `inc` would have consumed them: round-robin over
    /// the alternatives that still have words, retiring each as its
    /// capacity runs out.
    fn skip_into_alternatives(&mut self, ast: &Ast, mut offset: i64) {
        self.ptr = 0;
        let n = self.concats.len();
        let mut offsets = vec![0i64; n];
        let mut exhausted = vec![false; n];
        let rest_of = |concat: &Concatenation, taken: i64| match ast[concat.src].full_length {
            Count::Unlimited => Count::Unlimited,
            Count::Finite(full) => Count::Finite(full - taken),
        };

        while offset > 0 {
            let mut skipable: i64 = 0;
            let mut min_rest = Count::Unlimited;
            for i in 0..n {
                let rest = rest_of(&self.concats[i], offsets[i]);
                if rest == Count::Finite(0) {
                    continue;
                }
                skipable += 1;
                if rest < min_rest {
                    min_rest = rest;
                }
            }
            if skipable == 0 {
                break;
            }

            // the smallest alternative bounds how far one round-robin
            // round can go before the set of live alternatives changes
            let to_skip = match min_rest {
                Count::Unlimited => offset,
                Count::Finite(min_rest) => min_rest.saturating_mul(skipable).min(offset),
            };
            let skip_each = to_skip / skipable;
            let skip_remainder = to_skip % skipable;

            let mut n_skip = 0;
            for i in 0..n {
                let rest = rest_of(&self.concats[i], offsets[i]);
                if rest == Count::Finite(0) {
                    continue;
                }
                offsets[i] += skip_each;
                offset -= skip_each;
                if rest == Count::Finite(skip_each) {
                    exhausted[i] = true;
                }
                if n_skip == skip_remainder {
                    self.ptr = i;
                    offset -= skip_remainder;
                }
                n_skip += 1;
            }
        }

        for i in 0..n {
            self.concats[i].set_offset(ast, offsets[i]);
            self.concats[i].overflowed = exhausted[i];
        }
        if self.concats.get(self.ptr).is_some_and(|c| c.overflowed) {
            self.inc(ast);
        }
    }
}

/// Iterator over the repetition-composition lattice of one concat
/// node: the flattened child instances plus the `maxs`/`added` state
/// of the composition enumerator.
#[derive(Debug)]
pub(crate) struct Concatenation {
    pub(crate) src: ExprId,
    /// Flattened child iterators, one per repetition instance.
    pub(crate) alters: Vec<Alteration>,
    /// Sum of the children's minimum repetition counts.
    pub(crate) min_length: i64,
    pub(crate) maxs: Vec<i64>,
    pub(crate) added: Vec<i64>,
    /// Wrapped back to the first word; cleared by `reset`.
    pub(crate) overflowed: bool,
}

impl Concatenation {
    pub(crate) fn new(ast: &Ast, id: ExprId) -> Concatenation {
        let children = ast.concat_children(id);
        let min_length = children.iter().map(|&c| ast[c].repeat.min).sum();
        let mut concat = Concatenation {
            src: id,
            alters: Vec::new(),
            min_length,
            maxs: vec![0; children.len()],
            added: vec![0; children.len()],
            overflowed: false,
        };
        concat.reset(ast);
        concat
    }

    pub(crate) fn reset(&mut self, ast: &Ast) {
        self.overflowed = false;
        self.set_length(ast, self.min_length);
    }

    /// Moves to the first composition with `length` total instances.
    /// False when no composition has that total.
    fn set_length(&mut self, ast: &Ast, length: i64) -> bool {
        let global_max = length - self.min_length;
        let children = ast.concat_children(self.src);
        for (i, &child) in children.iter().enumerate() {
            let repeat = ast[child].repeat;
            self.maxs[i] = match repeat.max {
                None => global_max,
                Some(max) => max - repeat.min,
            };
        }
        if !fill_seq(global_max, &self.maxs, &mut self.added) {
            return false;
        }
        self.rebuild_alters(ast);
        self.alters.len() as i64 == length
    }

    /// Rebuilds the flattened instance list for the current
    /// composition: `min + added` fresh iterators per child.
    fn rebuild_alters(&mut self, ast: &Ast) {
        self.alters.clear();
        let children = ast.concat_children(self.src);
        for (i, &child) in children.iter().enumerate() {
            let instances = ast[child].repeat.min + self.added[i];
            for _ in 0..instances.max(0) {
                self.alters.push(Alteration::new(ast, child));
            }
        }
    }

    /// Word count of the current composition alone.
    fn seq_capacity(&self, ast: &Ast) -> Count {
        let children = ast.concat_children(self.src);
        let mut capacity = Count::Finite(1);
        for (i, &child) in children.iter().enumerate() {
            let sub = &ast[child];
            let instances = sub.repeat.min + self.added[i];
            match sub.full_length {
                Count::Unlimited if instances != 0 => return Count::Unlimited,
                Count::Unlimited | Count::Finite(0) => {}
                full => capacity = capacity.saturating_mul(full.saturating_pow(instances)),
            }
        }
        capacity
    }

    fn write_value(&mut self, ast: &Ast, caps: &Captures, dst: &mut [u8], at: usize) -> usize {
        let mut written = 0;
        for alter in &mut self.alters {
            written += alter.write_value(ast, caps, dst, at + written);
        }
        written
    }

    /// Odometer advance: rightmost instance first, carrying leftward;
    /// then the next composition of the same total; then the next
    /// total. Returns `false` and latches `overflowed` when the whole
    /// lattice is exhausted.
    pub(crate) fn inc(&mut self, ast: &Ast) -> bool {
        for i in (0..self.alters.len()).rev() {
            if self.alters[i].inc(ast) {
                return true;
            }
        }
        if inc_seq(&self.maxs, &mut self.added) {
            self.rebuild_alters(ast);
            return true;
        }
        let next_length = self.alters.len() as i64 + 1;
        if self.set_length(ast, next_length) {
            return true;
        }
        self.overflowed = true;
        false
    }

    /// Repositions to word `offset` (modulo the full length when
    /// finite): finds the composition whose capacity covers the
    /// offset, then distributes the rest over the instances
    /// right-to-left, mixed-radix.
    pub(crate) fn set_offset(&mut self, ast: &Ast, mut offset: i64) {
        match ast[self.src].full_length {
            Count::Finite(0) => return,
            Count::Finite(full) => offset %= full,
            Count::Unlimited => {}
        }
        self.overflowed = false;

        let mut length = self.min_length;
        loop {
            let global_max = length - self.min_length;
            {
                let children = ast.concat_children(self.src);
                for (i, &child) in children.iter().enumerate() {
                    let repeat = ast[child].repeat;
                    self.maxs[i] = match repeat.max {
                        None => global_max,
                        Some(max) => max - repeat.min,
                    };
                }
            }
            if !fill_seq(global_max, &self.maxs, &mut self.added) {
                // below the full length every total is fillable
                return;
            }
            let mut found = false;
            loop {
                match self.seq_capacity(ast) {
                    Count::Unlimited => {
                        found = true;
                        break;
                    }
                    Count::Finite(capacity) if capacity > offset => {
                        found = true;
                        break;
                    }
                    Count::Finite(capacity) => {
                        offset -= capacity;
                        if !inc_seq(&self.maxs, &mut self.added) {
                            break;
                        }
                    }
                }
            }
            if found {
                break;
            }
            length += 1;
        }

        self.rebuild_alters(ast);
        let mut off = offset;
        for alter in self.alters.iter_mut().rev() {
            match ast[alter.src].full_length {
                Count::Finite(0) => continue,
                Count::Unlimited => {
                    alter.set_offset_signed(ast, off);
                    break;
                }
                Count::Finite(full) => {
                    alter.set_offset_signed(ast, off);
                    off /= full;
                }
            }
        }
    }
}

/// Greedy left-to-right fill: the first composition of `need_sum`.
/// False when the bounds cannot absorb the sum.
fn fill_seq(mut need_sum: i64, maxs: &[i64], seq: &mut [i64]) -> bool {
    for (slot, &max) in seq.iter_mut().zip(maxs) {
        let d = max.min(need_sum);
        *slot = d;
        need_sum -= d;
    }
    need_sum == 0
}

/// The next composition with the same sum: pour values into slack
/// left-to-right until some position can grow, then refill the prefix.
/// False when the current sum is exhausted.
fn inc_seq(maxs: &[i64], seq: &mut [i64]) -> bool {
    let sum: i64 = seq.iter().sum();
    let mut s = sum;
    loop {
        let mut i = 0;
        while i < seq.len() {
            if seq[i] < maxs[i] {
                seq[i] += 1;
                s += 1;
                break;
            }
            s -= seq[i];
            seq[i] = 0;
            i += 1;
        }
        if i == seq.len() {
            return false;
        }
        if s == sum {
            return true;
        }
    }
}

/// Resolved bytes of every backref-targeted group, for one `value`
/// pass.
#[derive(Default)]
struct Captures {
    slots: [Option<Vec<u8>>; 9],
}

impl Captures {
    fn get(&self, num: u8) -> &[u8] {
        usize::from(num)
            .checked_sub(1)
            .and_then(|slot| self.slots.get(slot))
            .and_then(|bytes| bytes.as_deref())
            .unwrap_or(&[])
    }

    /// Renders the current word of every referenced group. Groups are
    /// resolved on demand so one may reference another regardless of
    /// their order; a group that transitively references itself
    /// resolves to the empty word.
    fn resolve(root: &Alteration, ast: &Ast) -> Captures {
        let mut caps = Captures::default();
        if ast.has_backrefs() {
            let mut busy = [false; 9];
            for &num in ast.referenced_groups() {
                resolve_group(root, ast, num, &mut caps, &mut busy);
            }
        }
        caps
    }
}

fn resolve_group(
    root: &Alteration,
    ast: &Ast,
    num: u8,
    caps: &mut Captures,
    busy: &mut [bool; 9],
) {
    let Some(slot) = usize::from(num).checked_sub(1) else {
        return;
    };
    if slot >= 9 || caps.slots[slot].is_some() || busy[slot] {
        return;
    }
    busy[slot] = true;
    let mut bytes = Vec::new();
    if let Some(target) = find_group(root, ast, num) {
        peek_value(target, root, ast, caps, busy, &mut bytes);
    }
    busy[slot] = false;
    caps.slots[slot] = Some(bytes);
}

/// The rightmost live instance of group `num` in the iterator tree:
/// the last one in instance order, the binding a backref reads.
fn find_group<'t>(alter: &'t Alteration, ast: &Ast, num: u8) -> Option<&'t Alteration> {
    let mut found = None;
    if ast[alter.src].group == u32::from(num) {
        found = Some(alter);
    }
    for concat in &alter.concats {
        for child in &concat.alters {
            if let Some(hit) = find_group(child, ast, num) {
                found = Some(hit);
            }
        }
    }
    found
}

/// Renders `alter`'s current word without touching any state.
fn peek_value(
    alter: &Alteration,
    root: &Alteration,
    ast: &Ast,
    caps: &mut Captures,
    busy: &mut [bool; 9],
    out: &mut Vec<u8>,
) {
    match &ast[alter.src].kind {
        ExprKind::Backref { num, .. } => {
            resolve_group(root, ast, *num, caps, busy);
            let bytes = caps.get(*num);
            out.extend_from_slice(bytes);
        }
        ExprKind::Charset(chars) => {
            if let Some(&b) = chars.get(alter.ptr) {
                out.push(b);
            }
        }
        ExprKind::Words { words, .. } => {
            if let Some(word) = words.get(alter.ptr) {
                out.extend_from_slice(word);
            }
        }
        ExprKind::Alter(_) => {
            if let Some(concat) = alter.concats.get(alter.ptr) {
                for child in &concat.alters {
                    peek_value(child, root, ast, caps, busy, out);
                }
            }
        }
        ExprKind::Concat(_) => {}
    }
}
