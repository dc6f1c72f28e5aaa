//! Concrete shrinkers for integers, lists, sets and strings.

use std::hash::Hash;
use std::ops::RangeInclusive;

use indexmap::IndexSet;
use num_traits::{NumCast, PrimInt};

use crate::sample::Shrinker;

/// Shrinks integers towards zero while staying inside a range
///
/// Candidates are `0, 1, -1, |v|, v/3, v/2, 2v/3` followed by the positive
/// values among `v-5 ..= v-1`, deduplicated, without `v` itself and without
/// anything outside the range. When zero is outside the range the in-range
/// value nearest zero is tried first.
#[derive(Debug, Clone)]
pub struct IntShrinker<T> {
    range: RangeInclusive<T>,
}

impl<T: PrimInt> IntShrinker<T> {
    pub fn new(range: RangeInclusive<T>) -> Self {
        Self { range }
    }

    /// A shrinker over the full range of `T`
    pub fn full() -> Self {
        Self::new(T::min_value()..=T::max_value())
    }

    fn nearest_zero(&self) -> T {
        let (lo, hi) = (*self.range.start(), *self.range.end());
        if lo > T::zero() { lo } else { hi }
    }

    fn candidates(&self, v: T) -> Vec<Option<T>> {
        let zero = T::zero();
        let one = T::one();
        let neg_one = zero.checked_sub(&one);

        if v == zero {
            return Vec::new();
        }
        if v == one || Some(v) == neg_one {
            return vec![Some(zero)];
        }

        let two = one + one;
        let three = two + one;
        let abs = if v < zero { zero.checked_sub(&v) } else { Some(v) };
        let two_thirds = match v.checked_mul(&two) {
            Some(doubled) => doubled / three,
            None => v - v / three,
        };

        let mut candidates = vec![
            Some(zero),
            Some(one),
            neg_one,
            abs,
            Some(v / three),
            Some(v / two),
            Some(two_thirds),
        ];
        for offset in (1..=5u8).rev() {
            let stepped = <T as NumCast>::from(offset)
                .and_then(|offset| v.checked_sub(&offset))
                .filter(|x| *x > zero);
            candidates.push(stepped);
        }
        candidates
    }
}

impl<T> Shrinker<T> for IntShrinker<T>
where
    T: PrimInt + Send + Sync,
{
    fn shrink(&self, value: &T) -> Vec<T> {
        let v = *value;
        let mut raw = self.candidates(v);
        if !self.range.contains(&T::zero()) && v != self.nearest_zero() && !raw.is_empty() {
            raw.insert(0, Some(self.nearest_zero()));
        }

        let mut out: Vec<T> = Vec::with_capacity(raw.len());
        for candidate in raw.into_iter().flatten() {
            if candidate != v && self.range.contains(&candidate) && !out.contains(&candidate) {
                out.push(candidate);
            }
        }
        out
    }
}

/// The sequence shrink rule shared by lists, sets and strings
///
/// Candidates are the first element alone, all but the last element, the
/// first half, and all but the first element, in that order, deduplicated
/// and restricted to lengths inside `range`. A single element shrinks to the
/// empty sequence only when the range allows it; an empty sequence has no
/// candidates.
pub fn shrink_sequence<T: Clone + PartialEq>(items: &[T], range: &RangeInclusive<usize>) -> Vec<Vec<T>> {
    let n = items.len();
    let raw: Vec<Vec<T>> = match n {
        0 => Vec::new(),
        1 => vec![Vec::new()],
        _ => vec![
            items[..1].to_vec(),
            items[..n - 1].to_vec(),
            items[..n / 2].to_vec(),
            items[1..].to_vec(),
        ],
    };

    let mut out: Vec<Vec<T>> = Vec::with_capacity(raw.len());
    for candidate in raw {
        if range.contains(&candidate.len()) && !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Shrinks lists by dropping elements, never shrinking the elements themselves
#[derive(Debug, Clone)]
pub struct ListShrinker {
    range: RangeInclusive<usize>,
}

impl ListShrinker {
    pub fn new(range: RangeInclusive<usize>) -> Self {
        Self { range }
    }
}

impl<T> Shrinker<Vec<T>> for ListShrinker
where
    T: Clone + PartialEq + Send + Sync,
{
    fn shrink(&self, value: &Vec<T>) -> Vec<Vec<T>> {
        shrink_sequence(value, &self.range)
    }
}

/// Shrinks insertion-ordered sets with the list rule
#[derive(Debug, Clone)]
pub struct SetShrinker {
    range: RangeInclusive<usize>,
}

impl SetShrinker {
    pub fn new(range: RangeInclusive<usize>) -> Self {
        Self { range }
    }
}

impl<T> Shrinker<IndexSet<T>> for SetShrinker
where
    T: Clone + Hash + Eq + Send + Sync,
{
    fn shrink(&self, value: &IndexSet<T>) -> Vec<IndexSet<T>> {
        let items: Vec<T> = value.iter().cloned().collect();
        shrink_sequence(&items, &self.range)
            .into_iter()
            .map(|items| items.into_iter().collect())
            .collect()
    }
}

/// Shrinks strings with the list rule applied to their characters
#[derive(Debug, Clone)]
pub struct StringShrinker {
    range: RangeInclusive<usize>,
}

impl StringShrinker {
    pub fn new(range: RangeInclusive<usize>) -> Self {
        Self { range }
    }
}

impl Shrinker<String> for StringShrinker {
    fn shrink(&self, value: &String) -> Vec<String> {
        let chars: Vec<char> = value.chars().collect();
        shrink_sequence(&chars, &self.range)
            .into_iter()
            .map(|chars| chars.into_iter().collect())
            .collect()
    }
}
