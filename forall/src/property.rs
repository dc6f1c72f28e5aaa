//! Property bodies: outcomes, argument tuples and the per-run context.

use std::cell::Cell;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::thread;

use indexmap::IndexMap;

use crate::error::PropertyError;
use crate::sample::Value;

/// Anything a property body may return
///
/// `false`, an `Err`, or a panic inside the body all count as failures.
pub trait TestOutcome {
    fn into_result(self) -> Result<(), PropertyError>;
}

impl TestOutcome for bool {
    fn into_result(self) -> Result<(), PropertyError> {
        if self {
            Ok(())
        } else {
            Err(PropertyError::property_failed("Property returned false"))
        }
    }
}

impl TestOutcome for () {
    fn into_result(self) -> Result<(), PropertyError> {
        Ok(())
    }
}

impl<E> TestOutcome for Result<(), E>
where
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    fn into_result(self) -> Result<(), PropertyError> {
        self.map_err(|error| {
            let boxed: Box<dyn StdError + Send + Sync> = error.into();
            match boxed.downcast::<PropertyError>() {
                Ok(property_error) => *property_error,
                Err(other) => PropertyError::from_error(other.as_ref()),
            }
        })
    }
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Chain a panic hook that stays silent while the current thread is inside
/// [`catch_quietly`] and defers to the previous hook otherwise
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// `catch_unwind` without the "thread panicked" line on stderr
///
/// Failing candidates are expected to panic many times during a run, so the
/// hook output is suppressed for this thread while `f` runs.
pub(crate) fn catch_quietly<F, R>(f: F) -> thread::Result<R>
where
    F: FnOnce() -> R,
{
    install_quiet_hook();
    let was_quiet = QUIET_PANICS.with(|quiet| quiet.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    QUIET_PANICS.with(|quiet| quiet.set(was_quiet));
    result
}

/// Run a property body, turning a panic into a failure
pub(crate) fn evaluate<F, R>(body: F) -> Result<(), PropertyError>
where
    F: FnOnce() -> R,
    R: TestOutcome,
{
    match catch_quietly(body) {
        Ok(outcome) => outcome.into_result(),
        Err(payload) => Err(PropertyError::from_panic(payload.as_ref())),
    }
}

/// Per-run state handed to every property invocation
///
/// Each run gets its own context; shrinking evaluates candidates against a
/// separate one so classifications only count the main run.
#[derive(Debug, Default)]
pub struct PropertyContext {
    attempts: usize,
    classifications: IndexMap<String, usize>,
}

impl PropertyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of inputs evaluated so far, the current one included
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Count this input under `label` when `condition` holds
    pub fn classify(&mut self, condition: bool, label: impl Into<String>) {
        if condition {
            self.label(label);
        }
    }

    /// Count this input under `label`
    pub fn label(&mut self, label: impl Into<String>) {
        *self.classifications.entry(label.into()).or_insert(0) += 1;
    }

    /// Label counts in first-seen order
    pub fn classifications(&self) -> &IndexMap<String, usize> {
        &self.classifications
    }

    pub(crate) fn mark_attempt(&mut self) {
        self.attempts += 1;
    }

    pub(crate) fn into_classifications(self) -> Vec<(String, usize)> {
        self.classifications.into_iter().collect()
    }
}

/// Tuples of property arguments
///
/// Renders a tuple for reports: a single argument prints as itself, several
/// as a parenthesized list.
pub trait Args: Value {
    fn describe(&self) -> String;
}

macro_rules! impl_args {
    ($first:ident $first_idx:tt) => {
        impl<$first: Value> Args for ($first,) {
            fn describe(&self) -> String {
                format!("{:?}", self.$first_idx)
            }
        }
    };
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Value),+> Args for ($($name,)+) {
            fn describe(&self) -> String {
                let parts: Vec<String> = vec![$(format!("{:?}", self.$idx)),+];
                format!("({})", parts.join(", "))
            }
        }
    };
}

impl_args!(A 0);
impl_args!(A 0, B 1);
impl_args!(A 0, B 1, C 2);
impl_args!(A 0, B 1, C 2, D 3);
impl_args!(A 0, B 1, C 2, D 3, E 4);
impl_args!(A 0, B 1, C 2, D 3, E 4, F 5);

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Overdrawn;

    impl fmt::Display for Overdrawn {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "balance went negative")
        }
    }

    impl StdError for Overdrawn {}

    #[test]
    fn test_bool_and_unit_outcomes() {
        assert!(true.into_result().is_ok());
        assert_eq!(
            false.into_result(),
            Err(PropertyError::property_failed("Property returned false"))
        );
        assert!(().into_result().is_ok());
    }

    #[test]
    fn test_result_outcomes() {
        let ok: Result<(), Overdrawn> = Ok(());
        assert!(ok.into_result().is_ok());

        let err: Result<(), Overdrawn> = Err(Overdrawn);
        assert_eq!(
            err.into_result().unwrap_err().message_chain(),
            vec!["balance went negative".to_string()]
        );

        let err: Result<(), String> = Err("plain message".to_string());
        assert_eq!(
            err.into_result(),
            Err(PropertyError::property_failed("plain message"))
        );
    }

    #[test]
    fn test_property_error_passes_through_unchanged() {
        let err: Result<(), PropertyError> = Err(PropertyError::property_failed("direct"));
        assert_eq!(
            err.into_result(),
            Err(PropertyError::property_failed("direct"))
        );
    }

    #[test]
    fn test_evaluate_catches_panics() {
        let result = evaluate(|| -> bool { panic!("assertion blew up") });
        assert_eq!(
            result,
            Err(PropertyError::property_failed("assertion blew up"))
        );
        assert!(evaluate(|| 1 + 1 == 2).is_ok());
    }

    #[test]
    fn test_catch_quietly_restores_hook_state() {
        let result = catch_quietly(|| -> u8 { panic!("silenced") });
        assert!(result.is_err());
        assert!(!QUIET_PANICS.with(Cell::get));

        let nested = catch_quietly(|| {
            let inner = catch_quietly(|| -> u8 { panic!("inner") });
            (inner.is_err(), QUIET_PANICS.with(Cell::get))
        });
        assert_eq!(nested.unwrap(), (true, true));
        assert!(!QUIET_PANICS.with(Cell::get));

        assert_eq!(catch_quietly(|| 7).unwrap(), 7);
    }

    #[test]
    fn test_context_classifications() {
        let mut ctx = PropertyContext::new();
        ctx.mark_attempt();
        ctx.classify(true, "even");
        ctx.classify(false, "odd");
        ctx.mark_attempt();
        ctx.label("even");
        ctx.label("zero");

        assert_eq!(ctx.attempts(), 2);
        assert_eq!(ctx.classifications().get("even"), Some(&2));
        assert!(ctx.classifications().get("odd").is_none());
        assert_eq!(
            ctx.into_classifications(),
            vec![("even".to_string(), 2), ("zero".to_string(), 1)]
        );
    }

    #[test]
    fn test_args_describe() {
        assert_eq!((5,).describe(), "5");
        assert_eq!(("x".to_string(), -1).describe(), "(\"x\", -1)");
        assert_eq!((1, 2, 3).describe(), "(1, 2, 3)");
    }
}
