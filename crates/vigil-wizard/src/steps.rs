//! Step ordering and id normalization.

use vigil_core::StepId;

/// Legacy step ids accepted from older firmware and bookmarks, mapped to
/// their canonical replacement.
///
/// Older builds split security settings onto their own step and grouped
/// NFC with a "controls" page; those ids still arrive in
/// `setup_last_step` after an upgrade.
pub const STEP_ALIASES: [(&str, StepId); 4] = [
    ("security", StepId::Welcome),
    ("nfc", StepId::Sensors),
    ("controls", StepId::Sensors),
    ("power", StepId::Outputs),
];

/// Orders the wizard steps and tracks the one currently displayed.
///
/// Unknown ids never propagate: anything that is neither canonical nor an
/// alias normalizes to the first step, so the sequencer cannot be driven
/// into an invalid position by a stale bookmark or a newer firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSequencer {
    current: StepId,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSequencer {
    /// Start on the first step.
    #[must_use]
    pub fn new() -> Self {
        StepSequencer {
            current: StepId::first(),
        }
    }

    /// Resolve any incoming id to a canonical step.
    ///
    /// Canonical ids map to themselves, aliases to their target, anything
    /// else to the first step.
    #[must_use]
    pub fn normalize(raw: &str) -> StepId {
        if let Some(step) = StepId::from_canonical(raw) {
            return step;
        }
        STEP_ALIASES
            .iter()
            .find(|(alias, _)| *alias == raw)
            .map_or(StepId::first(), |(_, target)| *target)
    }

    /// The step currently displayed.
    #[must_use]
    pub fn current(&self) -> StepId {
        self.current
    }

    /// Jump to a canonical step.
    pub fn set_current(&mut self, step: StepId) {
        self.current = step;
    }

    /// Normalize `raw` and jump to the result, returning it.
    pub fn select(&mut self, raw: &str) -> StepId {
        let step = Self::normalize(raw);
        self.current = step;
        step
    }

    /// Move to the following step; a no-op on the last step.
    pub fn advance(&mut self) -> StepId {
        if let Some(next) = self.current.successor() {
            self.current = next;
        }
        self.current
    }

    /// True when the completion step is displayed.
    #[must_use]
    pub fn is_on_last(&self) -> bool {
        self.current.is_last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn alias_targets_are_canonical() {
        for (_, target) in STEP_ALIASES {
            assert!(StepId::ALL.contains(&target));
        }
    }

    #[rstest]
    #[case("welcome", StepId::Welcome)]
    #[case("review", StepId::Review)]
    #[case("security", StepId::Welcome)]
    #[case("nfc", StepId::Sensors)]
    #[case("controls", StepId::Sensors)]
    #[case("power", StepId::Outputs)]
    #[case("", StepId::Welcome)]
    #[case("doesnotexist", StepId::Welcome)]
    #[case("WELCOME", StepId::Welcome)]
    fn normalize_resolves_every_input(#[case] raw: &str, #[case] expected: StepId) {
        assert_eq!(StepSequencer::normalize(raw), expected);
    }

    #[test]
    fn aliases_normalize_to_their_target() {
        for (alias, target) in STEP_ALIASES {
            assert_eq!(
                StepSequencer::normalize(alias),
                StepSequencer::normalize(target.as_str())
            );
        }
    }

    #[test]
    fn starts_on_first_step() {
        assert_eq!(StepSequencer::new().current(), StepId::Welcome);
    }

    #[test]
    fn advance_walks_to_the_last_step() {
        let mut seq = StepSequencer::new();
        let mut seen = vec![seq.current()];
        for _ in 1..StepId::ALL.len() {
            seen.push(seq.advance());
        }
        assert_eq!(seen, StepId::ALL.to_vec());
        assert!(seq.is_on_last());
    }

    #[test]
    fn advance_on_last_step_is_idempotent() {
        let mut seq = StepSequencer::new();
        seq.set_current(StepId::Review);
        assert_eq!(seq.advance(), StepId::Review);
        assert_eq!(seq.advance(), StepId::Review);
        assert_eq!(seq.current(), StepId::Review);
    }

    #[test]
    fn select_normalizes_before_moving() {
        let mut seq = StepSequencer::new();
        assert_eq!(seq.select("power"), StepId::Outputs);
        assert_eq!(seq.current(), StepId::Outputs);
        assert_eq!(seq.select("junk"), StepId::Welcome);
        assert_eq!(seq.current(), StepId::Welcome);
    }
}
