//! Sized collection generators: lists and insertion-ordered sets.

use std::cmp::max;
use std::hash::Hash;
use std::ops::RangeInclusive;
use std::sync::Arc;

use indexmap::IndexSet;
use rand::Rng;

use crate::config::ConfigError;
use crate::error::PropertyError;
use crate::generator::{Arb, DrawFn, Gen};
use crate::rng::RandomSource;
use crate::sample::{Sample, Shrinker, Value};
use crate::shrinkers::{ListShrinker, SetShrinker};

/// Duplicate draws allowed per requested set element before giving up
pub const DEFAULT_SLIPPAGE: usize = 10;

/// Where the elements of one collection come from: fresh random draws, or
/// an Exhaustive consumed once from its first value
enum ElementSource<T> {
    Draw(DrawFn<T>),
    Finite { values: Arc<Vec<T>>, next: usize },
}

impl<T: Value> ElementSource<T> {
    fn new(generator: &Gen<T>) -> Self {
        match generator {
            Gen::Arb(arb) => ElementSource::Draw(arb.drawer()),
            Gen::Exhaustive(exhaustive) => ElementSource::Finite {
                values: Arc::clone(&exhaustive.values),
                next: 0,
            },
        }
    }

    fn next(&mut self, rs: &mut RandomSource) -> Result<Option<T>, PropertyError> {
        match self {
            ElementSource::Draw(draw) => draw(rs).map(|sample| Some(sample.into_value())),
            ElementSource::Finite { values, next } => {
                let value = values.get(*next).cloned();
                *next += 1;
                Ok(value)
            }
        }
    }
}

fn check_range(range: &RangeInclusive<usize>) {
    if range.is_empty() {
        panic!(
            "{}",
            ConfigError::InvalidSizeRange {
                start: *range.start(),
                end: *range.end(),
            }
        );
    }
}

/// Lists whose size is drawn uniformly from `range`
///
/// Edge cases are the empty list when the range allows it, and the first
/// element edge case repeated `max(2, lo)` times when the range reaches 2 and
/// the element generator is an Arb with edge cases. Lists shrink by dropping
/// elements; the elements themselves are not shrunk.
///
/// # Panics
///
/// Panics if `range` is empty.
pub fn list<T, G>(generator: G, range: RangeInclusive<usize>) -> Arb<Vec<T>>
where
    T: Value,
    G: Into<Gen<T>>,
{
    check_range(&range);
    let generator: Gen<T> = generator.into();
    let shrinker: Arc<dyn Shrinker<Vec<T>>> = Arc::new(ListShrinker::new(range.clone()));

    let (lo, hi) = (*range.start(), *range.end());
    let mut edgecases = Vec::new();
    if range.contains(&0) {
        edgecases.push(Vec::new());
    }
    if hi >= 2
        && let Gen::Arb(arb) = &generator
        && let Some(first) = arb.edgecase_samples().first()
    {
        edgecases.push(vec![first.value().clone(); max(2, lo)]);
    }
    let edgecases = edgecases
        .into_iter()
        .map(|value| Sample::with_shrinker(value, Arc::clone(&shrinker)))
        .collect();

    Arb::from_factory(
        edgecases,
        Arc::new(move || -> DrawFn<Vec<T>> {
            let generator = generator.clone();
            let range = range.clone();
            let shrinker = Arc::clone(&shrinker);
            Box::new(move |rs: &mut RandomSource| {
                let target = rs.gen_range(range.clone());
                let mut elements = ElementSource::new(&generator);
                let mut items = Vec::with_capacity(target);
                while items.len() < target {
                    match elements.next(rs)? {
                        Some(item) => items.push(item),
                        None => {
                            return Err(PropertyError::generation_exhausted(
                                target,
                                items.len(),
                                0,
                            ));
                        }
                    }
                }
                Ok(Sample::with_shrinker(items, Arc::clone(&shrinker)))
            })
        }),
    )
}

/// Sets whose size is drawn uniformly from `range`, with the default slippage
///
/// # Panics
///
/// Panics if `range` is empty.
pub fn set<T, G>(generator: G, range: RangeInclusive<usize>) -> Arb<IndexSet<T>>
where
    T: Value + Hash + Eq,
    G: Into<Gen<T>>,
{
    set_with_slippage(generator, range, DEFAULT_SLIPPAGE)
}

/// Sets of exactly `size` distinct elements, with the default slippage
pub fn set_of_size<T, G>(generator: G, size: usize) -> Arb<IndexSet<T>>
where
    T: Value + Hash + Eq,
    G: Into<Gen<T>>,
{
    set_with_slippage(generator, size..=size, DEFAULT_SLIPPAGE)
}

/// Sets whose size is drawn uniformly from `range`
///
/// A draw keeps pulling elements until the set reaches its target size. Once
/// `target * slippage` draws have produced duplicates the draw fails with
/// [`PropertyError::GenerationExhausted`]. Sets keep insertion order, so the
/// same seed always yields the same iteration order.
///
/// # Panics
///
/// Panics if `range` is empty.
pub fn set_with_slippage<T, G>(
    generator: G,
    range: RangeInclusive<usize>,
    slippage: usize,
) -> Arb<IndexSet<T>>
where
    T: Value + Hash + Eq,
    G: Into<Gen<T>>,
{
    check_range(&range);
    let generator: Gen<T> = generator.into();
    let shrinker: Arc<dyn Shrinker<IndexSet<T>>> = Arc::new(SetShrinker::new(range.clone()));

    let edgecases = if range.contains(&0) {
        vec![Sample::with_shrinker(IndexSet::new(), Arc::clone(&shrinker))]
    } else {
        Vec::new()
    };

    Arb::from_factory(
        edgecases,
        Arc::new(move || -> DrawFn<IndexSet<T>> {
            let generator = generator.clone();
            let range = range.clone();
            let shrinker = Arc::clone(&shrinker);
            Box::new(move |rs: &mut RandomSource| {
                let target = rs.gen_range(range.clone());
                let max_misses = target * slippage;
                let mut elements = ElementSource::new(&generator);
                let mut items = IndexSet::with_capacity(target);
                let mut misses = 0;
                while items.len() < target {
                    if misses >= max_misses {
                        tracing::debug!(
                            target,
                            achieved = items.len(),
                            misses,
                            "set generator ran out of distinct elements"
                        );
                        return Err(PropertyError::generation_exhausted(
                            target,
                            items.len(),
                            misses,
                        ));
                    }
                    match elements.next(rs)? {
                        Some(item) => {
                            if !items.insert(item) {
                                misses += 1;
                            }
                        }
                        None => {
                            return Err(PropertyError::generation_exhausted(
                                target,
                                items.len(),
                                misses,
                            ));
                        }
                    }
                }
                Ok(Sample::with_shrinker(items, Arc::clone(&shrinker)))
            })
        }),
    )
}

impl<T: Value> Arb<T> {
    /// Group values of this generator into lists sized within `range`
    ///
    /// # Panics
    ///
    /// Panics if `range` is empty.
    pub fn chunked(self, range: RangeInclusive<usize>) -> Arb<Vec<T>> {
        list(self, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{arbitrary, exhaustive};

    fn digits() -> Arb<u8> {
        arbitrary(vec![0, 9], None, |rs| rs.gen_range(0..10))
    }

    #[test]
    fn test_list_edgecases() {
        assert_eq!(list(digits(), 0..=5).edgecases(), vec![vec![], vec![0, 0]]);
        assert_eq!(list(digits(), 1..=5).edgecases(), vec![vec![0, 0]]);
        assert_eq!(list(digits(), 3..=5).edgecases(), vec![vec![0, 0, 0]]);
        assert_eq!(list(digits(), 0..=1).edgecases(), vec![Vec::<u8>::new()]);
        assert!(list(digits(), 1..=1).edgecases().is_empty());
    }

    #[test]
    fn test_list_edgecases_need_element_edgecases() {
        let plain = arbitrary(vec![], None, |rs| rs.gen_range(0..10u8));
        assert_eq!(list(plain, 0..=5).edgecases(), vec![Vec::<u8>::new()]);
        assert_eq!(
            list(exhaustive(vec![1u8, 2]), 0..=5).edgecases(),
            vec![Vec::<u8>::new()]
        );
    }

    #[test]
    fn test_list_sizes_within_range() {
        let lists = list(digits(), 2..=6)
            .values(&mut RandomSource::seeded(17), 100)
            .unwrap();
        assert!(lists.iter().all(|l| (2..=6).contains(&l.len())));
        assert!(lists.iter().flatten().all(|d| *d < 10));
    }

    #[test]
    fn test_list_samples_shrink_within_range() {
        let arb = list(digits(), 2..=6);
        let mut rs = RandomSource::seeded(5);
        for sample in arb.samples(&mut rs).take(10) {
            let sample = sample.unwrap();
            assert!(sample.shrinks().all(|c| (2..=6).contains(&c.value().len())));
        }
    }

    #[test]
    fn test_list_over_exhaustive_runs_dry() {
        let arb = list(exhaustive(vec![1u8, 2]), 3..=3);
        let result = arb.next(&mut RandomSource::seeded(0));
        assert_eq!(result, Err(PropertyError::generation_exhausted(3, 2, 0)));

        let arb = list(exhaustive(vec![1u8, 2, 3]), 2..=2);
        assert_eq!(arb.next(&mut RandomSource::seeded(0)).unwrap(), vec![1, 2]);
    }

    #[test]
    #[should_panic(expected = "Invalid size range")]
    fn test_list_rejects_empty_range() {
        #[allow(clippy::reversed_empty_ranges)]
        let _ = list(digits(), 5..=1);
    }

    #[test]
    fn test_set_reaches_target_size() {
        let sets = set(digits(), 0..=5)
            .values(&mut RandomSource::seeded(3), 50)
            .unwrap();
        assert!(sets.iter().all(|s| s.len() <= 5));
        assert_eq!(set(digits(), 0..=5).edgecases(), vec![IndexSet::new()]);
    }

    #[test]
    fn test_set_exhaustion_is_reported() {
        let coin = arbitrary(vec![], None, |rs| rs.gen_bool(0.5));
        let result = set(coin, 3..=3).next(&mut RandomSource::seeded(8));
        assert_eq!(
            result,
            Err(PropertyError::generation_exhausted(3, 2, 30))
        );
    }

    #[test]
    fn test_set_slippage_override() {
        let coin = arbitrary(vec![], None, |rs| rs.gen_bool(0.5));
        let result = set_with_slippage(coin, 3..=3, 2).next(&mut RandomSource::seeded(8));
        assert!(matches!(
            result,
            Err(PropertyError::GenerationExhausted { attempts: 6, .. })
        ));
    }

    #[test]
    fn test_set_is_deterministic_per_seed() {
        let arb = set(Arb::ints(0i32..=1000), 5..=10);
        let first = arb.values(&mut RandomSource::seeded(99), 10).unwrap();
        let second = arb.values(&mut RandomSource::seeded(99), 10).unwrap();
        let as_vecs = |sets: &[IndexSet<i32>]| -> Vec<Vec<i32>> {
            sets.iter().map(|s| s.iter().copied().collect()).collect()
        };
        assert_eq!(as_vecs(&first), as_vecs(&second));
    }

    #[test]
    fn test_set_of_size_is_exact() {
        let arb = set_of_size(Arb::ints(0u16..=500), 4);
        assert!(arb.edgecases().is_empty());
        for value in arb.values(&mut RandomSource::seeded(17), 50).unwrap() {
            assert_eq!(value.len(), 4);
        }
        assert_eq!(set_of_size(Arb::bools(), 0).edgecases(), vec![IndexSet::new()]);
    }

    #[test]
    fn test_chunked_groups_draws() {
        let chunks = digits().chunked(2..=3);
        assert_eq!(chunks.edgecases(), vec![vec![0, 0]]);
        for chunk in chunks.values(&mut RandomSource::seeded(6), 40).unwrap() {
            assert!((2..=3).contains(&chunk.len()));
            assert!(chunk.iter().all(|d| *d < 10));
        }
    }
}
