/*!
 * Mock test paper generation.
 *
 * Questions are drawn uniformly at random, without replacement, from a pool in
 * which questions carrying a preferred mark value appear several times. A
 * question is kept only the first time it is drawn, so the paper never holds
 * the same question twice.
 */

use log::debug;
use rand::Rng;
use std::collections::HashSet;

use crate::database::models::QuestionRecord;

/// Extra pool references added for each question with a preferred mark value
pub const DEFAULT_PREFERRED_EXTRA_COPIES: usize = 2;

/// Mark values to favour when drawing a paper
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkPreferences {
    values: Vec<String>,
}

impl MarkPreferences {
    /// Build preferences from mark values given as text
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            values: values
                .into_iter()
                .map(|v| v.as_ref().trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list such as `"5, 3"`
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// No preference
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether a question worth `marks` is preferred
    pub fn prefers(&self, marks: i64) -> bool {
        let marks = marks.to_string();
        self.values.iter().any(|v| *v == marks)
    }
}

/// Draws mock test papers from a question pool
#[derive(Debug, Clone)]
pub struct PaperGenerator {
    preferred_extra_copies: usize,
}

impl Default for PaperGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFERRED_EXTRA_COPIES)
    }
}

impl PaperGenerator {
    /// Create a generator that adds `preferred_extra_copies` references per preferred question
    pub fn new(preferred_extra_copies: usize) -> Self {
        Self {
            preferred_extra_copies,
        }
    }

    /// Build the sampling pool: every question once, preferred ones repeated
    pub fn weighted_pool<'a>(
        &self,
        questions: &'a [QuestionRecord],
        preferences: &MarkPreferences,
    ) -> Vec<&'a QuestionRecord> {
        let mut pool = Vec::with_capacity(questions.len());

        for question in questions {
            pool.push(question);
            if preferences.prefers(question.marks) {
                for _ in 0..self.preferred_extra_copies {
                    pool.push(question);
                }
            }
        }

        pool
    }

    /// Draw up to `count` distinct questions.
    ///
    /// Returns fewer than `count` when the pool runs out of distinct questions.
    pub fn generate<R: Rng>(
        &self,
        questions: &[QuestionRecord],
        count: usize,
        preferences: &MarkPreferences,
        rng: &mut R,
    ) -> Vec<QuestionRecord> {
        let mut available = self.weighted_pool(questions, preferences);
        let mut picked: Vec<QuestionRecord> = Vec::with_capacity(count.min(questions.len()));
        let mut seen: HashSet<i64> = HashSet::new();

        while picked.len() < count && !available.is_empty() {
            let idx = rng.random_range(0..available.len());
            let item = available.swap_remove(idx);
            if seen.insert(item.id) {
                picked.push(item.clone());
            }
        }

        debug!(
            "Generated paper with {} of {} requested questions (pool {})",
            picked.len(),
            count,
            questions.len()
        );

        picked
    }
}
