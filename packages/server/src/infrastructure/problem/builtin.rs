//! 組み込みの問題カタログ
//!
//! 問題本文・テストケースの中身はここでは扱わず、ゲーム進行に必要な
//! メタデータ（必要ケース数）のみを保持します。

use std::collections::BTreeMap;

use crate::domain::{Difficulty, Problem, ProblemCatalog, ProblemId};

/// (id, title, difficulty, example cases, submission cases)
const BUILTIN_PROBLEMS: [(&str, &str, Difficulty, u32, u32); 6] = [
    ("problem01", "Hello world!", Difficulty::EASY, 3, 5),
    ("problem02", "Maximum Stock Profit", Difficulty::MEDIUM, 3, 7),
    ("problem03", "Majority Element", Difficulty::EASY, 3, 6),
    ("problem04", "Palindrome", Difficulty::EASY, 5, 10),
    ("problem06", "Roman Numerals", Difficulty::MEDIUM, 4, 8),
    ("problem07", "Trapping Rainwater", Difficulty::HARD, 4, 8),
];

#[derive(Debug, Clone)]
pub struct BuiltinProblemCatalog {
    problems: BTreeMap<ProblemId, Problem>,
}

impl BuiltinProblemCatalog {
    pub fn new() -> Self {
        Self::from_problems(BUILTIN_PROBLEMS.iter().filter_map(
            |(id, title, difficulty, examples, submissions)| {
                let id = ProblemId::new(id.to_string()).ok()?;
                Some(Problem {
                    id,
                    title: title.to_string(),
                    difficulty: *difficulty,
                    required_case_count: examples + submissions,
                })
            },
        ))
    }

    pub fn from_problems(problems: impl IntoIterator<Item = Problem>) -> Self {
        Self {
            problems: problems.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

impl Default for BuiltinProblemCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemCatalog for BuiltinProblemCatalog {
    fn get_by_id(&self, id: &ProblemId) -> Option<Problem> {
        self.problems.get(id).cloned()
    }

    fn list(&self) -> Vec<Problem> {
        self.problems.values().cloned().collect()
    }
}
