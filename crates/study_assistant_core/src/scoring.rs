//! crates/study_assistant_core/src/scoring.rs
//!
//! Quiz scoring: compares submitted answers against stored correct answers.

use crate::domain::{AnsweredQuestion, Answers, Question, QuestionKind, NOT_ANSWERED};

/// Returns true when `given` counts as the correct answer for a question of `kind`.
///
/// Multiple-choice answers must equal the stored option exactly. Short answers are
/// compared after trimming surrounding whitespace and ignoring case.
pub fn answer_matches(kind: QuestionKind, given: &str, correct: &str) -> bool {
    match kind {
        QuestionKind::MultipleChoice => given == correct,
        QuestionKind::ShortAnswer => {
            given.trim().to_lowercase() == correct.trim().to_lowercase()
        }
    }
}

/// Counts the questions answered correctly.
///
/// Unanswered questions score nothing, and answers keyed past the end of the
/// question list are ignored.
pub fn score_answers(questions: &[Question], answers: &Answers) -> u32 {
    questions
        .iter()
        .enumerate()
        .filter(|(index, q)| {
            answers
                .get(index)
                .is_some_and(|given| answer_matches(q.kind, given, &q.correct_answer))
        })
        .count() as u32
}

/// Pairs every question with the student's answer, for the feedback flow.
pub fn answered_questions(questions: &[Question], answers: &Answers) -> Vec<AnsweredQuestion> {
    questions
        .iter()
        .enumerate()
        .map(|(index, q)| AnsweredQuestion {
            question: q.question.clone(),
            kind: q.kind,
            options: q.options.clone(),
            correct_answer: q.correct_answer.clone(),
            user_answer: answers
                .get(&index)
                .filter(|a| !a.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| NOT_ANSWERED.to_string()),
        })
        .collect()
}

/// Score as a percentage of the question count; 0 for an empty quiz.
pub fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(score) * 100.0 / f64::from(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mc(text: &str, correct: &str) -> Question {
        Question {
            question: text.to_string(),
            kind: QuestionKind::MultipleChoice,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: correct.to_string(),
            image_prompt: None,
            image_url: None,
        }
    }

    fn short(text: &str, correct: &str) -> Question {
        Question {
            kind: QuestionKind::ShortAnswer,
            options: Vec::new(),
            ..mc(text, correct)
        }
    }

    fn quiz() -> Vec<Question> {
        vec![mc("q1", "A"), mc("q2", "C"), short("q3", "Mitochondria")]
    }

    #[test]
    fn exact_answers_score_every_question() {
        let questions = quiz();
        let answers: Answers = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (i, q.correct_answer.clone()))
            .collect();
        assert_eq!(score_answers(&questions, &answers), questions.len() as u32);
    }

    #[test]
    fn empty_answers_score_zero() {
        assert_eq!(score_answers(&quiz(), &Answers::new()), 0);
    }

    #[test]
    fn short_answers_ignore_case_and_whitespace() {
        assert!(answer_matches(QuestionKind::ShortAnswer, "  mitochondria \n", "Mitochondria"));
        assert!(!answer_matches(QuestionKind::ShortAnswer, "mitochondrion", "Mitochondria"));
    }

    #[test]
    fn multiple_choice_requires_exact_option() {
        assert!(!answer_matches(QuestionKind::MultipleChoice, "a", "A"));
        assert!(!answer_matches(QuestionKind::MultipleChoice, " A", "A"));
    }

    #[test]
    fn out_of_range_answers_are_ignored() {
        let mut answers = Answers::new();
        answers.insert(0, "A".into());
        answers.insert(7, "A".into());
        assert_eq!(score_answers(&quiz(), &answers), 1);
    }

    #[test]
    fn skipped_questions_are_marked_not_answered() {
        let mut answers = Answers::new();
        answers.insert(1, "B".into());
        answers.insert(2, "   ".into());
        let paired = answered_questions(&quiz(), &answers);
        assert_eq!(paired.len(), 3);
        assert_eq!(paired[0].user_answer, NOT_ANSWERED);
        assert_eq!(paired[1].user_answer, "B");
        assert_eq!(paired[2].user_answer, NOT_ANSWERED);
    }

    #[test]
    fn percentage_of_empty_quiz_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 4), 75.0);
    }
}
