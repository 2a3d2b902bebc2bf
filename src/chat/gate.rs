//! The single-in-flight gate.
//!
//! At most one request may be outstanding per gate. Acquiring the gate
//! disables the input and every example control; releasing it re-enables
//! them. Clones of an [`InputGate`] share the busy flag, so every entry point
//! that can start a send observes the same invariant.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// UI controls the chat session reads and toggles.
///
/// These are the non-message parts of the chat surface: the text input, the
/// list of example prompts and the subject tabs.
pub trait Controls {
    /// Current text of the input field.
    fn input_text(&self) -> String;

    /// Replace the text of the input field.
    fn set_input_text(&mut self, text: &str);

    /// Enable or disable the input field.
    fn set_input_enabled(&mut self, enabled: bool);

    /// Enable or disable every example control.
    fn set_examples_enabled(&mut self, enabled: bool);

    /// Label of the example at `index`, if there is one.
    fn example_label(&self, index: usize) -> Option<String>;

    /// Mark the example at `index` as the selected one.
    fn highlight_example(&mut self, index: usize);

    /// Clear the selected-example highlight.
    fn clear_example_highlight(&mut self);

    /// Label of the tab currently marked active.
    fn active_tab_label(&self) -> Option<String>;
}

/// Busy flag guarding the single outstanding request.
#[derive(Clone, Debug, Default)]
pub struct InputGate {
    busy: Arc<AtomicBool>,
}

impl InputGate {
    /// Creates an idle gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a send holds the gate.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Marks the gate busy and disables the controls.
    ///
    /// Returns false, changing nothing, if the gate is already busy; the
    /// caller must then abandon its send. Every `true` must be paired with
    /// exactly one [`InputGate::release`].
    pub fn try_set_busy<C: Controls + ?Sized>(&self, controls: &mut C) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        controls.set_input_enabled(false);
        controls.set_examples_enabled(false);
        true
    }

    /// Clears the busy flag, re-enables the controls and drops any example
    /// highlight.
    pub fn release<C: Controls + ?Sized>(&self, controls: &mut C) {
        self.busy.store(false, Ordering::Release);
        controls.set_input_enabled(true);
        controls.set_examples_enabled(true);
        controls.clear_example_highlight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Switches {
        input_enabled: bool,
        examples_enabled: bool,
        highlighted: Option<usize>,
    }

    impl Controls for Switches {
        fn input_text(&self) -> String {
            String::new()
        }

        fn set_input_text(&mut self, _: &str) {}

        fn set_input_enabled(&mut self, enabled: bool) {
            self.input_enabled = enabled;
        }

        fn set_examples_enabled(&mut self, enabled: bool) {
            self.examples_enabled = enabled;
        }

        fn example_label(&self, _: usize) -> Option<String> {
            None
        }

        fn highlight_example(&mut self, index: usize) {
            self.highlighted = Some(index);
        }

        fn clear_example_highlight(&mut self) {
            self.highlighted = None;
        }

        fn active_tab_label(&self) -> Option<String> {
            None
        }
    }

    #[test]
    fn acquire_disables_controls() {
        let gate = InputGate::new();
        let mut switches = Switches {
            input_enabled: true,
            examples_enabled: true,
            highlighted: Some(2),
        };
        assert!(gate.try_set_busy(&mut switches));
        assert!(gate.is_busy());
        assert!(!switches.input_enabled);
        assert!(!switches.examples_enabled);
        assert_eq!(switches.highlighted, Some(2));
    }

    #[test]
    fn second_acquire_is_rejected_without_side_effects() {
        let gate = InputGate::new();
        let mut first = Switches::default();
        assert!(gate.try_set_busy(&mut first));

        let mut second = Switches {
            input_enabled: true,
            examples_enabled: true,
            highlighted: None,
        };
        assert!(!gate.try_set_busy(&mut second));
        assert!(second.input_enabled);
        assert!(second.examples_enabled);
    }

    #[test]
    fn release_restores_controls() {
        let gate = InputGate::new();
        let mut switches = Switches::default();
        assert!(gate.try_set_busy(&mut switches));
        switches.highlight_example(1);
        gate.release(&mut switches);
        assert!(!gate.is_busy());
        assert!(switches.input_enabled);
        assert!(switches.examples_enabled);
        assert_eq!(switches.highlighted, None);
        assert!(gate.try_set_busy(&mut switches));
    }

    #[test]
    fn clones_share_the_flag() {
        let gate = InputGate::new();
        let other = gate.clone();
        let mut switches = Switches::default();
        assert!(gate.try_set_busy(&mut switches));
        assert!(other.is_busy());
        assert!(!other.try_set_busy(&mut switches));
        other.release(&mut switches);
        assert!(!gate.is_busy());
    }
}
