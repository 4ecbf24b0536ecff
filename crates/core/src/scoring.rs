//! Scoring of a finished (or in-progress) answer sheet.
//!
//! There is no partial credit: a question counts only when the selected set is
//! exactly the correct set.

use std::collections::BTreeSet;

use crate::model::{AnswerSheet, Question};

/// Raw tallies derived from a question list and an answer sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreCard {
    total_questions: u32,
    correct: u32,
}

impl ScoreCard {
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// The score is defined as the number of fully correct questions.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total_questions - self.correct
    }

    /// Percentage of fully correct questions; `0.0` for an empty quiz.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total_questions) * 100.0
    }
}

/// A question is fully correct iff its selection is set-equal to its correct answers.
#[must_use]
pub fn is_fully_correct(question: &Question, selected: &BTreeSet<String>) -> bool {
    selected == question.correct_answers()
}

/// Scores `answers` against `questions`, matching by question index.
#[must_use]
pub fn score(questions: &[Question], answers: &AnswerSheet) -> ScoreCard {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(index, question)| is_fully_correct(question, answers.selected(*index)))
        .count();

    ScoreCard {
        total_questions: u32::try_from(questions.len()).unwrap_or(u32::MAX),
        correct: u32::try_from(correct).unwrap_or(u32::MAX),
    }
}

/// How one option looks in the post-quiz review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionReview {
    pub text: String,
    pub selected: bool,
    pub correct: bool,
}

impl OptionReview {
    /// Selected but not part of the correct set.
    #[must_use]
    pub fn is_wrong_pick(&self) -> bool {
        self.selected && !self.correct
    }
}

/// Per-question breakdown shown once a session is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub question: String,
    pub options: Vec<OptionReview>,
    pub fully_correct: bool,
}

/// Builds the per-question review in presentation order.
#[must_use]
pub fn review(questions: &[Question], answers: &AnswerSheet) -> Vec<QuestionReview> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = answers.selected(index);
            QuestionReview {
                question: question.text().to_owned(),
                options: question
                    .options()
                    .iter()
                    .map(|option| OptionReview {
                        text: option.text().to_owned(),
                        selected: selected.contains(option.text()),
                        correct: question.is_correct_option(option.text()),
                    })
                    .collect(),
                fully_correct: is_fully_correct(question, selected),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;

    fn question(text: &str, options: &[&str], correct: &[&str]) -> Question {
        Question::new(
            text,
            options.iter().copied().map(AnswerOption::from).collect(),
            correct.iter().copied(),
        )
        .unwrap()
    }

    fn three_single_answer_questions() -> Vec<Question> {
        vec![
            question("Q1", &["a", "b", "c", "d"], &["a"]),
            question("Q2", &["a", "b", "c", "d"], &["b"]),
            question("Q3", &["a", "b", "c", "d"], &["c"]),
        ]
    }

    #[test]
    fn two_of_three_correct() {
        let questions = three_single_answer_questions();
        let mut answers = AnswerSheet::new();
        answers.toggle(0, "a");
        answers.toggle(2, "c");

        let card = score(&questions, &answers);
        assert_eq!(card.score(), 2);
        assert_eq!(card.correct(), 2);
        assert_eq!(card.incorrect(), 1);
        assert_eq!(card.total_questions(), 3);
        assert!(((card.accuracy() * 100.0).round() / 100.0 - 66.67).abs() < f64::EPSILON);
    }

    #[test]
    fn extra_selection_fails_exact_match() {
        let q = question("Multi", &["A", "B", "C", "D"], &["A", "C"]);
        let mut answers = AnswerSheet::new();
        for option in ["A", "B", "C"] {
            answers.toggle(0, option);
        }
        assert!(!is_fully_correct(&q, answers.selected(0)));

        answers.toggle(0, "B");
        assert!(is_fully_correct(&q, answers.selected(0)));
    }

    #[test]
    fn missing_selection_fails_exact_match() {
        let q = question("Multi", &["A", "B", "C"], &["A", "C"]);
        let mut answers = AnswerSheet::new();
        answers.toggle(0, "A");
        assert!(!is_fully_correct(&q, answers.selected(0)));
    }

    #[test]
    fn empty_quiz_has_zero_accuracy() {
        let card = score(&[], &AnswerSheet::new());
        assert_eq!(card.total_questions(), 0);
        assert_eq!(card.incorrect(), 0);
        assert!(card.accuracy().abs() < f64::EPSILON);
    }

    #[test]
    fn scoring_is_idempotent() {
        let questions = three_single_answer_questions();
        let mut answers = AnswerSheet::new();
        answers.toggle(1, "b");
        assert_eq!(score(&questions, &answers), score(&questions, &answers));
    }

    #[test]
    fn review_marks_wrong_picks() {
        let questions = vec![question("Q", &["A", "B", "C"], &["A", "C"])];
        let mut answers = AnswerSheet::new();
        answers.toggle(0, "A");
        answers.toggle(0, "B");

        let reviews = review(&questions, &answers);
        assert_eq!(reviews.len(), 1);
        let r = &reviews[0];
        assert!(!r.fully_correct);
        let wrong: Vec<_> = r
            .options
            .iter()
            .filter(|o| o.is_wrong_pick())
            .map(|o| o.text.as_str())
            .collect();
        assert_eq!(wrong, vec!["B"]);
        assert!(r.options.iter().any(|o| o.text == "C" && o.correct && !o.selected));
    }
}
