//! # Puzzles
//!
//! Puzzle rooms hold one puzzle with a limited number of attempts. Solving
//! it completes the room with its reward; running out of attempts clears
//! the room with nothing.

use crate::config::MAX_PUZZLE_ATTEMPTS;
use crate::GameRng;
use serde::{Deserialize, Serialize};

/// Puzzle variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleKind {
    Riddle {
        question: String,
        answers: Vec<String>,
    },
    /// Levers must be pulled in `sequence` order (zero-based indices)
    LeverSequence { lever_count: usize, sequence: Vec<usize> },
    /// The code is the clue digits arranged from largest to smallest
    NumberLock { digits: Vec<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleState {
    Unsolved,
    Solved,
    Failed,
}

/// Result of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleOutcome {
    Solved,
    Incorrect { attempts_left: u32 },
    Failed,
    /// Lever input recorded, sequence not yet complete
    Pending,
    AlreadyResolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub kind: PuzzleKind,
    pub attempts_left: u32,
    pub state: PuzzleState,
    /// Levers pulled toward the current sequence attempt
    pub lever_input: Vec<usize>,
}

impl Puzzle {
    pub fn new(kind: PuzzleKind) -> Self {
        Self {
            kind,
            attempts_left: MAX_PUZZLE_ATTEMPTS,
            state: PuzzleState::Unsolved,
            lever_input: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state != PuzzleState::Unsolved
    }

    /// The text shown to the player.
    pub fn prompt(&self) -> String {
        match &self.kind {
            PuzzleKind::Riddle { question, .. } => question.clone(),
            PuzzleKind::LeverSequence {
                lever_count,
                sequence,
            } => {
                let runes: Vec<String> = sequence.iter().map(|i| (i + 1).to_string()).collect();
                format!(
                    "{} levers line the wall. Faded runes glow above them in turn: {}",
                    lever_count,
                    runes.join(", ")
                )
            }
            PuzzleKind::NumberLock { digits } => {
                let shown: Vec<String> = digits.iter().map(u32::to_string).collect();
                format!(
                    "A dial lock bears the inscription: \"{}, greatest first\"",
                    shown.join(" ")
                )
            }
        }
    }

    /// The canonical answer, as accepted by [`Puzzle::attempt`].
    pub fn solution(&self) -> String {
        match &self.kind {
            PuzzleKind::Riddle { answers, .. } => answers.first().cloned().unwrap_or_default(),
            PuzzleKind::LeverSequence { sequence, .. } => sequence
                .iter()
                .map(|i| (i + 1).to_string())
                .collect::<Vec<_>>()
                .join(" "),
            PuzzleKind::NumberLock { digits } => {
                let mut sorted = digits.clone();
                sorted.sort_unstable_by(|a, b| b.cmp(a));
                sorted.iter().map(u32::to_string).collect()
            }
        }
    }

    fn is_correct(&self, answer: &str) -> bool {
        let normalized = answer.trim().to_lowercase();
        match &self.kind {
            PuzzleKind::Riddle { answers, .. } => {
                let stripped = normalized
                    .trim_start_matches("a ")
                    .trim_start_matches("an ")
                    .trim_start_matches("the ");
                answers.iter().any(|a| a == stripped)
            }
            PuzzleKind::LeverSequence { .. } => {
                let given: Vec<&str> = normalized
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .collect();
                given.join(" ") == self.solution()
            }
            PuzzleKind::NumberLock { .. } => {
                normalized.replace(char::is_whitespace, "") == self.solution()
            }
        }
    }

    /// Spends one attempt on `answer`.
    pub fn attempt(&mut self, answer: &str) -> PuzzleOutcome {
        if self.is_resolved() {
            return PuzzleOutcome::AlreadyResolved;
        }
        if self.is_correct(answer) {
            self.state = PuzzleState::Solved;
            return PuzzleOutcome::Solved;
        }
        self.attempts_left = self.attempts_left.saturating_sub(1);
        if self.attempts_left == 0 {
            self.state = PuzzleState::Failed;
            PuzzleOutcome::Failed
        } else {
            PuzzleOutcome::Incorrect {
                attempts_left: self.attempts_left,
            }
        }
    }

    /// Records a lever pull. A full sequence is checked as one attempt.
    pub fn pull_lever(&mut self, index: usize) -> PuzzleOutcome {
        if self.is_resolved() {
            return PuzzleOutcome::AlreadyResolved;
        }
        let needed = match &self.kind {
            PuzzleKind::LeverSequence { sequence, .. } => sequence.len(),
            _ => return PuzzleOutcome::Pending,
        };
        self.lever_input.push(index);
        if self.lever_input.len() < needed {
            return PuzzleOutcome::Pending;
        }
        let answer = self
            .lever_input
            .drain(..)
            .map(|i| (i + 1).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.attempt(&answer)
    }
}

const RIDDLES: &[(&str, &[&str])] = &[
    (
        "I have keys but open no locks, space but no room. What am I?",
        &["keyboard"],
    ),
    (
        "The more you take, the more you leave behind. What are they?",
        &["footsteps", "steps"],
    ),
    ("What has a neck but no head?", &["bottle"]),
    (
        "I am always hungry and must be fed, the finger I touch will soon turn red. What am I?",
        &["fire", "flame"],
    ),
    (
        "What can run but never walks, has a mouth but never talks?",
        &["river"],
    ),
    ("What gets wetter the more it dries?", &["towel"]),
];

/// Rolls a puzzle for a room with `lever_count` levers.
///
/// Lever sequences need at least two levers; rooms with fewer get a riddle
/// or a number lock.
pub fn generate_puzzle(level: u32, lever_count: usize, rng: &mut GameRng) -> Puzzle {
    let roll = rng.next_index(3);
    let kind = match roll {
        0 if lever_count >= 2 => {
            let mut order: Vec<usize> = (0..lever_count).collect();
            rng.shuffle(&mut order);
            PuzzleKind::LeverSequence {
                lever_count,
                sequence: order,
            }
        }
        1 => {
            let length = if level >= 10 { 4 } else { 3 };
            let digits = (0..length).map(|_| rng.next_int(0, 9) as u32).collect();
            PuzzleKind::NumberLock { digits }
        }
        _ => {
            let (question, answers) = RIDDLES[rng.next_index(RIDDLES.len())];
            PuzzleKind::Riddle {
                question: question.to_string(),
                answers: answers.iter().map(|a| a.to_string()).collect(),
            }
        }
    };
    Puzzle::new(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn riddle() -> Puzzle {
        Puzzle::new(PuzzleKind::Riddle {
            question: "What has a neck but no head?".to_string(),
            answers: vec!["bottle".to_string()],
        })
    }

    #[test]
    fn test_riddle_accepts_articles_and_case() {
        let mut puzzle = riddle();
        assert_eq!(puzzle.attempt("  A Bottle "), PuzzleOutcome::Solved);
        assert_eq!(puzzle.attempt("bottle"), PuzzleOutcome::AlreadyResolved);
    }

    #[test]
    fn test_attempts_run_out() {
        let mut puzzle = riddle();
        assert_eq!(
            puzzle.attempt("jar"),
            PuzzleOutcome::Incorrect { attempts_left: 2 }
        );
        assert_eq!(
            puzzle.attempt("vase"),
            PuzzleOutcome::Incorrect { attempts_left: 1 }
        );
        assert_eq!(puzzle.attempt("flask"), PuzzleOutcome::Failed);
        assert_eq!(puzzle.state, PuzzleState::Failed);
    }

    #[test]
    fn test_number_lock_orders_digits() {
        let mut puzzle = Puzzle::new(PuzzleKind::NumberLock {
            digits: vec![3, 7, 1],
        });
        assert_eq!(puzzle.solution(), "731");
        assert_eq!(puzzle.attempt("7 3 1"), PuzzleOutcome::Solved);
    }

    #[test]
    fn test_lever_sequence_via_pulls() {
        let mut puzzle = Puzzle::new(PuzzleKind::LeverSequence {
            lever_count: 3,
            sequence: vec![2, 0, 1],
        });
        assert_eq!(puzzle.pull_lever(0), PuzzleOutcome::Pending);
        assert_eq!(puzzle.pull_lever(1), PuzzleOutcome::Pending);
        assert_eq!(
            puzzle.pull_lever(2),
            PuzzleOutcome::Incorrect { attempts_left: 2 }
        );
        assert!(puzzle.lever_input.is_empty());

        for lever in [2, 0, 1] {
            puzzle.pull_lever(lever);
        }
        assert_eq!(puzzle.state, PuzzleState::Solved);
    }

    #[test]
    fn test_generated_solution_is_accepted() {
        let mut rng = GameRng::from_u64(12);
        for level in 1..=15 {
            let mut puzzle = generate_puzzle(level, 3, &mut rng);
            let answer = puzzle.solution();
            assert_eq!(puzzle.attempt(&answer), PuzzleOutcome::Solved, "{:?}", puzzle.kind);
        }
    }

    #[test]
    fn test_no_lever_puzzle_without_levers() {
        let mut rng = GameRng::from_u64(12);
        for _ in 0..30 {
            let puzzle = generate_puzzle(5, 1, &mut rng);
            assert!(!matches!(puzzle.kind, PuzzleKind::LeverSequence { .. }));
        }
    }
}
