//! Generated values paired with lazily computed shrink trees.

use std::fmt;
use std::sync::Arc;

/// Bound shared by every generated value
///
/// Equality deduplicates edge cases and verbose logs, `Debug` renders
/// reports, and `Send + Sync` lets generator definitions be shared with
/// concurrent runs.
pub trait Value: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {}

/// A pure function from a value to strictly smaller candidate values
///
/// Implementations must return a finite list that never contains the input
/// itself. Repeated shrinking should not cycle; the shrink search caps its
/// effort regardless.
pub trait Shrinker<T>: Send + Sync {
    /// Candidates smaller than `value`, most promising first
    fn shrink(&self, value: &T) -> Vec<T>;
}

impl<T, F> Shrinker<T> for F
where
    F: Fn(&T) -> Vec<T> + Send + Sync,
{
    fn shrink(&self, value: &T) -> Vec<T> {
        self(value)
    }
}

type ShrinkFn<T> = Arc<dyn Fn() -> Box<dyn Iterator<Item = Sample<T>>> + Send + Sync>;

/// A generated value together with its tree of smaller candidates
///
/// The tree is never materialized: each node's children are produced on
/// demand by [`Sample::shrinks`], and each child carries its own lazy
/// children.
#[derive(Clone)]
pub struct Sample<T> {
    value: T,
    shrinks: Option<ShrinkFn<T>>,
}

impl<T: fmt::Debug> fmt::Debug for Sample<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("value", &self.value)
            .field("shrinkable", &self.shrinks.is_some())
            .finish()
    }
}

impl<T: Value> Sample<T> {
    /// A sample with no shrink candidates
    pub fn new(value: T) -> Self {
        Self {
            value,
            shrinks: None,
        }
    }

    /// A sample whose tree is unfolded from `shrinker`
    pub fn with_shrinker(value: T, shrinker: Arc<dyn Shrinker<T>>) -> Self {
        let root = value.clone();
        let shrinks: ShrinkFn<T> = Arc::new(move || -> Box<dyn Iterator<Item = Sample<T>>> {
            let shrinker = Arc::clone(&shrinker);
            let candidates = shrinker.shrink(&root);
            Box::new(
                candidates
                    .into_iter()
                    .map(move |candidate| Sample::with_shrinker(candidate, Arc::clone(&shrinker))),
            )
        });
        Self {
            value,
            shrinks: Some(shrinks),
        }
    }

    /// Wrap `value` with `shrinker` when one is given
    pub fn with_optional_shrinker(value: T, shrinker: Option<&Arc<dyn Shrinker<T>>>) -> Self {
        match shrinker {
            Some(shrinker) => Self::with_shrinker(value, Arc::clone(shrinker)),
            None => Self::new(value),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Whether this node can have children at all
    pub fn is_shrinkable(&self) -> bool {
        self.shrinks.is_some()
    }

    /// The immediate shrink candidates of this node, in order
    pub fn shrinks(&self) -> Box<dyn Iterator<Item = Sample<T>>> {
        match &self.shrinks {
            Some(shrinks) => shrinks(),
            None => Box::new(std::iter::empty()),
        }
    }

    /// Apply `f` to the value and to every node of the tree
    pub fn map<U, F>(self, f: F) -> Sample<U>
    where
        U: Value,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.map_shared(Arc::new(f))
    }

    pub(crate) fn map_shared<U: Value>(self, f: Arc<dyn Fn(T) -> U + Send + Sync>) -> Sample<U> {
        let value = f(self.value.clone());
        if self.shrinks.is_none() {
            return Sample::new(value);
        }
        let source = self;
        let shrinks: ShrinkFn<U> = Arc::new(move || -> Box<dyn Iterator<Item = Sample<U>>> {
            let f = Arc::clone(&f);
            Box::new(
                source
                    .shrinks()
                    .map(move |child| child.map_shared(Arc::clone(&f))),
            )
        });
        Sample {
            value,
            shrinks: Some(shrinks),
        }
    }

    /// Prune every node of the tree whose value fails `predicate`
    ///
    /// The root is kept as is; only its descendants are filtered.
    pub fn filter<P>(self, predicate: P) -> Sample<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter_shared(Arc::new(predicate))
    }

    pub(crate) fn filter_shared(self, predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>) -> Sample<T> {
        let Some(inner) = self.shrinks else {
            return self;
        };
        let shrinks: ShrinkFn<T> = Arc::new(move || -> Box<dyn Iterator<Item = Sample<T>>> {
            let keep = Arc::clone(&predicate);
            let descend = Arc::clone(&predicate);
            Box::new(
                inner()
                    .filter(move |child| keep(child.value()))
                    .map(move |child| child.filter_shared(Arc::clone(&descend))),
            )
        });
        Sample {
            value: self.value,
            shrinks: Some(shrinks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn halving() -> Arc<dyn Shrinker<u32>> {
        Arc::new(|v: &u32| if *v == 0 { vec![] } else { vec![0, v / 2] })
    }

    fn child_values<T: Value>(sample: &Sample<T>) -> Vec<T> {
        sample.shrinks().map(Sample::into_value).collect()
    }

    #[test]
    fn test_plain_sample_has_no_children() {
        let sample = Sample::new(10u32);
        assert_eq!(*sample.value(), 10);
        assert!(!sample.is_shrinkable());
        assert!(sample.shrinks().next().is_none());
    }

    #[test]
    fn test_shrinker_unfolds_recursively() {
        let sample = Sample::with_shrinker(8u32, halving());
        assert_eq!(child_values(&sample), vec![0, 4]);

        let four = sample.shrinks().nth(1).unwrap();
        assert_eq!(child_values(&four), vec![0, 2]);

        let zero = sample.shrinks().next().unwrap();
        assert!(child_values(&zero).is_empty());
    }

    #[test]
    fn test_map_applies_to_whole_tree() {
        let sample = Sample::with_shrinker(8u32, halving()).map(|v| v.to_string());
        assert_eq!(sample.value(), "8");
        assert_eq!(child_values(&sample), vec!["0".to_string(), "4".to_string()]);

        let four = sample.shrinks().nth(1).unwrap();
        assert_eq!(child_values(&four), vec!["0".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_filter_prunes_descendants() {
        let sample = Sample::with_shrinker(8u32, halving()).filter(|v| *v != 0);
        assert_eq!(*sample.value(), 8);
        assert_eq!(child_values(&sample), vec![4]);

        let four = sample.shrinks().next().unwrap();
        assert_eq!(child_values(&four), vec![2]);
    }

    #[test]
    fn test_shrinks_are_recomputed_on_demand() {
        let sample = Sample::with_shrinker(6u32, halving());
        assert_eq!(child_values(&sample), child_values(&sample));
    }
}
