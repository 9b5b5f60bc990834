//! Practice-mode note matching.
//!
//! Single estimates flicker, so a target note only counts as played after
//! `required_matches` consecutive in-tune estimates on the right note.

use alloc::vec::Vec;

use fw_core::PitchEstimate;

/// Consecutive matches needed to accept a note (about 250 ms at 60 polls/s).
pub const DEFAULT_REQUIRED_MATCHES: u32 = 15;

/// A note counts as in tune when `|cents|` is below this.
pub const MATCH_TOLERANCE_CENTS: i32 = 25;

/// Per-poll feedback for the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Feedback {
    /// No pitch heard, or a fresh note was just presented.
    #[default]
    Waiting,
    Perfect,
    Flat,
    Sharp,
}

/// What a single poll changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchProgress {
    /// Still on the same target note.
    Listening(Feedback),
    /// The target was held long enough; moved on to the note at this index.
    Advanced(usize),
    /// The last note was matched.
    Completed,
}

/// Walks a sequence of target MIDI notes, fed one estimate per poll.
#[derive(Clone, Debug)]
pub struct NoteMatcher {
    targets: Vec<i32>,
    index: usize,
    streak: u32,
    required_matches: u32,
    feedback: Feedback,
    completed: bool,
}

impl NoteMatcher {
    pub fn new(targets: Vec<i32>) -> Self {
        let completed = targets.is_empty();
        Self {
            targets,
            index: 0,
            streak: 0,
            required_matches: DEFAULT_REQUIRED_MATCHES,
            feedback: Feedback::Waiting,
            completed,
        }
    }

    pub fn with_required_matches(mut self, required: u32) -> Self {
        self.required_matches = required.max(1);
        self
    }

    pub fn targets(&self) -> &[i32] {
        &self.targets
    }

    /// Target MIDI note, or `None` once completed.
    pub fn current_target(&self) -> Option<i32> {
        if self.completed {
            None
        } else {
            self.targets.get(self.index).copied()
        }
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Fraction of notes already played, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.targets.is_empty() || self.completed {
            return 1.0;
        }
        self.index as f32 / self.targets.len() as f32
    }

    /// Judge one estimate against the current target.
    pub fn feed(&mut self, estimate: &PitchEstimate) -> MatchProgress {
        let Some(target) = self.current_target() else {
            return MatchProgress::Completed;
        };

        let (Some(midi), Some(cents)) = (estimate.midi(), estimate.cents()) else {
            self.feedback = Feedback::Waiting;
            self.streak = 0;
            return MatchProgress::Listening(self.feedback);
        };

        if midi == target {
            if cents.abs() < MATCH_TOLERANCE_CENTS {
                self.feedback = Feedback::Perfect;
                self.streak += 1;
            } else {
                self.feedback = if cents < 0 { Feedback::Flat } else { Feedback::Sharp };
                self.streak = 0;
            }
        } else {
            self.feedback = if midi < target { Feedback::Flat } else { Feedback::Sharp };
            self.streak = 0;
        }

        if self.streak < self.required_matches {
            return MatchProgress::Listening(self.feedback);
        }

        self.streak = 0;
        self.feedback = Feedback::Waiting;
        if self.index + 1 < self.targets.len() {
            self.index += 1;
            MatchProgress::Advanced(self.index)
        } else {
            self.completed = true;
            MatchProgress::Completed
        }
    }

    /// Rewind to the first note.
    pub fn restart(&mut self) {
        self.index = 0;
        self.streak = 0;
        self.feedback = Feedback::Waiting;
        self.completed = self.targets.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use fw_core::midi_to_frequency;

    fn at(midi: i32) -> PitchEstimate {
        PitchEstimate::voiced(midi_to_frequency(midi))
    }

    fn detuned(midi: i32, cents: f32) -> PitchEstimate {
        PitchEstimate::voiced(midi_to_frequency(midi) * libm::powf(2.0, cents / 1200.0))
    }

    #[test]
    fn holds_required_matches_then_advances() {
        let mut m = NoteMatcher::new(vec![64, 67]).with_required_matches(3);
        assert_eq!(m.feed(&at(64)), MatchProgress::Listening(Feedback::Perfect));
        assert_eq!(m.feed(&at(64)), MatchProgress::Listening(Feedback::Perfect));
        assert_eq!(m.feed(&at(64)), MatchProgress::Advanced(1));
        assert_eq!(m.current_target(), Some(67));
        assert_eq!(m.feedback(), Feedback::Waiting);
        assert_eq!(m.progress(), 0.5);
    }

    #[test]
    fn unvoiced_resets_streak() {
        let mut m = NoteMatcher::new(vec![64]).with_required_matches(3);
        m.feed(&at(64));
        m.feed(&at(64));
        assert_eq!(m.feed(&PitchEstimate::unvoiced()), MatchProgress::Listening(Feedback::Waiting));
        assert_eq!(m.streak(), 0);
        m.feed(&at(64));
        m.feed(&at(64));
        assert_eq!(m.feed(&at(64)), MatchProgress::Completed);
        assert!(m.is_completed());
        assert_eq!(m.current_target(), None);
    }

    #[test]
    fn wrong_note_direction() {
        let mut m = NoteMatcher::new(vec![60]);
        assert_eq!(m.feed(&at(59)), MatchProgress::Listening(Feedback::Flat));
        assert_eq!(m.feed(&at(72)), MatchProgress::Listening(Feedback::Sharp));
    }

    #[test]
    fn right_note_out_of_tune() {
        let mut m = NoteMatcher::new(vec![60]);
        m.feed(&at(60));
        assert_eq!(m.streak(), 1);
        assert_eq!(m.feed(&detuned(60, -35.0)), MatchProgress::Listening(Feedback::Flat));
        assert_eq!(m.streak(), 0);
        assert_eq!(m.feed(&detuned(60, 35.0)), MatchProgress::Listening(Feedback::Sharp));
        assert_eq!(m.feed(&detuned(60, 10.0)), MatchProgress::Listening(Feedback::Perfect));
    }

    #[test]
    fn default_needs_fifteen() {
        let mut m = NoteMatcher::new(vec![45]);
        for _ in 0..DEFAULT_REQUIRED_MATCHES - 1 {
            assert!(matches!(m.feed(&at(45)), MatchProgress::Listening(_)));
        }
        assert_eq!(m.feed(&at(45)), MatchProgress::Completed);
    }

    #[test]
    fn restart_rewinds() {
        let mut m = NoteMatcher::new(vec![50, 52]).with_required_matches(1);
        m.feed(&at(50));
        m.feed(&at(52));
        assert!(m.is_completed());
        assert_eq!(m.feed(&at(52)), MatchProgress::Completed);
        m.restart();
        assert!(!m.is_completed());
        assert_eq!(m.current_target(), Some(50));
        assert_eq!(m.progress(), 0.0);
    }

    #[test]
    fn empty_sequence_is_complete() {
        let mut m = NoteMatcher::new(vec![]);
        assert!(m.is_completed());
        assert_eq!(m.feed(&at(60)), MatchProgress::Completed);
    }
}
