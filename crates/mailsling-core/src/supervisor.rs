//! Render boundary around row and screen rendering.
//!
//! One malformed email must not take the whole list down. The supervisor
//! wraps a render closure, catches a panic, and keeps serving a fallback
//! until [`RenderSupervisor::reset`] is called, usually after a refresh
//! replaced the offending data.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error};

/// What came out of a supervised render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome<T> {
    /// The closure completed; here is its output.
    Rendered(T),
    /// The closure panicked now or previously; render the fallback with
    /// this message instead.
    Fallback(String),
}

impl<T> RenderOutcome<T> {
    /// The rendered value, if the closure completed.
    pub fn rendered(self) -> Option<T> {
        match self {
            Self::Rendered(value) => Some(value),
            Self::Fallback(_) => None,
        }
    }
}

/// Catches render panics and serves a sticky fallback until reset.
#[derive(Debug, Default)]
pub struct RenderSupervisor {
    failure: Option<String>,
}

impl RenderSupervisor {
    /// Creates a supervisor with no recorded failure.
    #[must_use]
    pub const fn new() -> Self {
        Self { failure: None }
    }

    /// Runs `render`, trading a panic for a [`RenderOutcome::Fallback`].
    ///
    /// Once a failure is recorded the closure is not run again; the same
    /// data would fail the same way. Call [`Self::reset`] after the
    /// underlying data changed to try again.
    pub fn render<T>(&mut self, render: impl FnOnce() -> T) -> RenderOutcome<T> {
        if let Some(message) = &self.failure {
            return RenderOutcome::Fallback(message.clone());
        }
        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(value) => RenderOutcome::Rendered(value),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Render failed: {message}");
                self.failure = Some(message.clone());
                RenderOutcome::Fallback(message)
            }
        }
    }

    /// The recorded failure, if the supervisor is serving fallbacks.
    #[must_use]
    pub fn last_failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Clears the recorded failure; the next [`Self::render`] runs the
    /// closure again.
    pub fn reset(&mut self) {
        if self.failure.take().is_some() {
            debug!("Render supervisor reset");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload.downcast_ref::<&str>().map_or_else(
        || {
            payload
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| "unknown render panic".to_owned())
        },
        |s| (*s).to_owned(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_passes_value_through() {
        let mut supervisor = RenderSupervisor::new();
        let outcome = supervisor.render(|| 7);
        assert_eq!(outcome, RenderOutcome::Rendered(7));
        assert!(supervisor.last_failure().is_none());
    }

    #[test]
    fn test_panic_becomes_fallback() {
        let mut supervisor = RenderSupervisor::new();
        let outcome: RenderOutcome<i32> = supervisor.render(|| panic!("bad row"));
        assert_eq!(outcome, RenderOutcome::Fallback("bad row".to_owned()));
        assert_eq!(supervisor.last_failure(), Some("bad row"));
    }

    #[test]
    fn test_fallback_is_sticky_until_reset() {
        let mut supervisor = RenderSupervisor::new();
        let _: RenderOutcome<i32> = supervisor.render(|| panic!("bad row"));

        // The closure must not run again while the failure stands.
        let outcome: RenderOutcome<i32> = supervisor.render(|| unreachable!("must not re-render"));
        assert_eq!(outcome, RenderOutcome::Fallback("bad row".to_owned()));

        supervisor.reset();
        let outcome = supervisor.render(|| 3);
        assert_eq!(outcome, RenderOutcome::Rendered(3));
        assert!(supervisor.last_failure().is_none());
    }

    #[test]
    fn test_string_panic_payload() {
        let mut supervisor = RenderSupervisor::new();
        let outcome: RenderOutcome<()> =
            supervisor.render(|| std::panic::panic_any(format!("row {} broke", 4)));
        assert_eq!(outcome, RenderOutcome::Fallback("row 4 broke".to_owned()));
    }

    #[test]
    fn test_rendered_accessor() {
        assert_eq!(RenderOutcome::Rendered(5).rendered(), Some(5));
        assert_eq!(RenderOutcome::<i32>::Fallback("x".to_owned()).rendered(), None);
    }
}
