use std::collections::VecDeque;

/// Majority vote over a sliding window of classifier labels.
///
/// Single raw predictions flicker frame to frame; the UI reacts to the
/// majority label over the last N samples instead (N = 10 by default).
#[derive(Debug, Clone)]
pub struct MajorityVote {
    window: VecDeque<String>,
    capacity: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedLabel {
    pub label: String,
    /// Fraction of the current window agreeing with the label.
    pub share: f64,
    pub samples: usize,
}

impl MajorityVote {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Push a label and return the current majority. Ties go to the label
    /// seen most recently.
    pub fn push(&mut self, label: &str) -> SmoothedLabel {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(label.to_string());

        let mut best_label = label;
        let mut best_count = 0usize;
        let mut best_last_index = 0usize;
        for (index, candidate) in self.window.iter().enumerate() {
            let count = self.window.iter().filter(|l| *l == candidate).count();
            if count > best_count || (count == best_count && index > best_last_index) {
                best_label = candidate;
                best_count = count;
                best_last_index = index;
            }
        }

        SmoothedLabel {
            label: best_label.to_string(),
            share: best_count as f64 / self.window.len() as f64,
            samples: self.window.len(),
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sample_is_its_own_majority() {
        let mut vote = MajorityVote::new(10);
        let smoothed = vote.push("awake");
        assert_eq!(smoothed.label, "awake");
        assert_eq!(smoothed.share, 1.0);
        assert_eq!(smoothed.samples, 1);
    }

    #[test]
    fn test_majority_wins_over_flicker() {
        let mut vote = MajorityVote::new(10);
        for _ in 0..6 {
            vote.push("awake");
        }
        let smoothed = vote.push("drowsy");
        assert_eq!(smoothed.label, "awake");
        assert!((smoothed.share - 6.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_slides_and_forgets_old_labels() {
        let mut vote = MajorityVote::new(3);
        vote.push("a");
        vote.push("a");
        vote.push("b");
        vote.push("b");
        // Window is now [a, b, b].
        let smoothed = vote.push("b");
        assert_eq!(smoothed.label, "b");
        assert_eq!(smoothed.samples, 3);
        assert_eq!(smoothed.share, 1.0);
    }

    #[test]
    fn test_tie_goes_to_most_recent_label() {
        let mut vote = MajorityVote::new(10);
        vote.push("awake");
        let smoothed = vote.push("drowsy");
        assert_eq!(smoothed.label, "drowsy");
        assert_eq!(smoothed.share, 0.5);
    }

    #[test]
    fn test_clear_empties_the_window() {
        let mut vote = MajorityVote::new(4);
        vote.push("a");
        vote.clear();
        assert!(vote.is_empty());
        let smoothed = vote.push("b");
        assert_eq!(smoothed.samples, 1);
    }
}
