// Quiz questions and the session that walks through them.

use std::collections::BTreeSet;

use bevy::log::{debug, error, info};
use serde::Deserialize;
use strum::Display;

use crate::error::AuthoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum QuestionKind {
    TextInput,
    MultipleChoice,
    CrossOut,
}

/// The authored correct answer, which also fixes how a question is graded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerKey {
    /// Trimmed, case-insensitive text match.
    Text { answer: String },
    /// Index of the one correct option.
    Choice { correct: usize },
    /// Exactly these options must be crossed out, no more and no fewer.
    CrossOut { required: BTreeSet<usize> },
}

/// What the player handed in.
#[derive(Debug, Clone, Copy)]
pub enum Answer<'a> {
    Text(&'a str),
    Choice(usize),
    CrossOut(&'a BTreeSet<usize>),
}

impl AnswerKey {
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerKey::Text { .. } => QuestionKind::TextInput,
            AnswerKey::Choice { .. } => QuestionKind::MultipleChoice,
            AnswerKey::CrossOut { .. } => QuestionKind::CrossOut,
        }
    }

    /// `None` when the answer is for a different kind of question.
    pub fn grade(&self, answer: &Answer) -> Option<bool> {
        match (self, answer) {
            (AnswerKey::Text { answer: expected }, Answer::Text(given)) => {
                Some(given.trim().to_lowercase() == expected.trim().to_lowercase())
            }
            (AnswerKey::Choice { correct }, Answer::Choice(given)) => Some(correct == given),
            (AnswerKey::CrossOut { required }, Answer::CrossOut(given)) => {
                Some(required == *given)
            }
            _ => None,
        }
    }
}

fn one() -> u32 {
    1
}

/// A question as written in the story file.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionSpec {
    pub prompt: String,
    #[serde(default = "one")]
    pub points: u32,
    /// Button labels for choice and cross-out questions.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(flatten)]
    pub key: AnswerKey,
}

impl QuestionSpec {
    /// Every answer the key expects must have a button to give it.
    pub fn validate(&self, index: usize) -> Result<(), AuthoringError> {
        let options = self.options.len();
        match &self.key {
            AnswerKey::Text { .. } => {}
            AnswerKey::Choice { correct } => {
                if *correct >= options {
                    return Err(AuthoringError::ChoiceOutOfRange {
                        index,
                        correct: *correct,
                        options,
                    });
                }
            }
            AnswerKey::CrossOut { required } => {
                if let Some(&crossed) = required.iter().find(|&&i| i >= options) {
                    return Err(AuthoringError::CrossOutOutOfRange {
                        index,
                        crossed,
                        options,
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct QuizQuestion {
    prompt: String,
    options: Vec<String>,
    max_points: u32,
    key: AnswerKey,
    crossed_out: BTreeSet<usize>,
    awarded: u32,
    answered: bool,
    visible: bool,
}

impl QuizQuestion {
    pub fn new(prompt: impl Into<String>, max_points: u32, key: AnswerKey) -> Self {
        Self {
            prompt: prompt.into(),
            options: Vec::new(),
            max_points,
            key,
            crossed_out: BTreeSet::new(),
            awarded: 0,
            answered: false,
            visible: false,
        }
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Shows the question. Cross-out questions start from a clean selection.
    pub fn display(&mut self) {
        if self.answered {
            return;
        }
        self.visible = true;
        if self.kind() == QuestionKind::CrossOut {
            self.crossed_out.clear();
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn submit_text(&mut self, text: &str) {
        let result = self.key.grade(&Answer::Text(text));
        self.record(result);
    }

    pub fn select_choice(&mut self, index: usize) {
        let result = self.key.grade(&Answer::Choice(index));
        self.record(result);
    }

    pub fn toggle_cross_out(&mut self, index: usize) {
        if self.answered || self.kind() != QuestionKind::CrossOut {
            return;
        }
        if !self.crossed_out.remove(&index) {
            self.crossed_out.insert(index);
        }
        debug!(
            "Cross-out toggled {index}, {} selected",
            self.crossed_out.len()
        );
    }

    pub fn submit_cross_out(&mut self) {
        let result = self.key.grade(&Answer::CrossOut(&self.crossed_out));
        self.record(result);
    }

    pub fn kind(&self) -> QuestionKind {
        self.key.kind()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn max_points(&self) -> u32 {
        self.max_points
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Zero until the question is answered.
    pub fn awarded_points(&self) -> u32 {
        self.awarded
    }

    pub fn crossed_out(&self) -> &BTreeSet<usize> {
        &self.crossed_out
    }

    // Duplicate or mismatched UI events land here as `None` or after the
    // question is answered, and are dropped.
    fn record(&mut self, result: Option<bool>) {
        if self.answered {
            return;
        }
        let Some(correct) = result else {
            return;
        };
        self.awarded = if correct { self.max_points } else { 0 };
        self.answered = true;
        self.visible = false;
        debug!(
            "{} question answered {}, +{} points",
            self.kind(),
            if correct { "correctly" } else { "wrongly" },
            self.awarded
        );
    }
}

impl From<QuestionSpec> for QuizQuestion {
    fn from(spec: QuestionSpec) -> Self {
        QuizQuestion::new(spec.prompt, spec.points, spec.key).with_options(spec.options)
    }
}

/// Runs questions in order, one visible at a time.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    index: usize,
    total_score: u32,
    max_possible_score: u32,
    active: bool,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            ..Default::default()
        }
    }

    pub fn start(&mut self) {
        if self.questions.is_empty() {
            error!("Quiz has no questions");
            return;
        }

        self.index = 0;
        self.total_score = 0;
        self.max_possible_score = self
            .questions
            .iter()
            .map(QuizQuestion::max_points)
            .fold(0, u32::saturating_add);
        self.active = true;

        for question in &mut self.questions {
            question.hide();
        }
        self.questions[0].display();
        info!("Quiz started, {} points available", self.max_possible_score);
    }

    /// Called every frame while the quiz runs. Collects the current question's
    /// points once it is answered and moves on.
    pub fn poll_and_advance(&mut self) {
        if !self.active {
            return;
        }
        let Some(question) = self.questions.get_mut(self.index) else {
            return;
        };
        if !question.is_answered() {
            return;
        }

        self.total_score = self.total_score.saturating_add(question.awarded_points());
        question.hide();
        debug!("Score {}/{}", self.total_score, self.max_possible_score);

        self.index += 1;
        match self.questions.get_mut(self.index) {
            Some(next) => next.display(),
            None => {
                self.active = false;
                info!(
                    "Quiz finished, final score {}/{}",
                    self.total_score, self.max_possible_score
                );
            }
        }
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn max_possible_score(&self) -> u32 {
        self.max_possible_score
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.questions.iter().all(QuizQuestion::is_answered)
    }

    /// The question being asked, if the quiz is running.
    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index).filter(|_| self.active)
    }

    /// Position of the question being asked, counting from zero.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_mut(&mut self) -> Option<&mut QuizQuestion> {
        if !self.active {
            return None;
        }
        self.questions.get_mut(self.index)
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(answer: &str, points: u32) -> QuizQuestion {
        QuizQuestion::new(
            "Capital of France?",
            points,
            AnswerKey::Text {
                answer: answer.into(),
            },
        )
    }

    fn choice(correct: usize, points: u32) -> QuizQuestion {
        QuizQuestion::new("Pick one", points, AnswerKey::Choice { correct })
            .with_options(["a", "b", "c"])
    }

    fn cross_out(required: &[usize], points: u32) -> QuizQuestion {
        QuizQuestion::new(
            "Cross out the extra properties",
            points,
            AnswerKey::CrossOut {
                required: required.iter().copied().collect(),
            },
        )
        .with_options(["red", "round", "loud", "heavy"])
    }

    #[test]
    fn text_answers_ignore_case_and_padding() {
        for given in ["Paris", "paris ", " PARIS"] {
            let mut q = text("Paris", 2);
            q.submit_text(given);
            assert!(q.is_answered());
            assert_eq!(q.awarded_points(), 2, "{given:?}");
        }

        let mut q = text(" Paris ", 2);
        q.submit_text("London");
        assert!(q.is_answered());
        assert_eq!(q.awarded_points(), 0);
    }

    #[test]
    fn choice_grades_on_select() {
        let mut q = choice(1, 3);
        assert_eq!(q.awarded_points(), 0);
        q.select_choice(1);
        assert_eq!(q.awarded_points(), 3);

        let mut q = choice(1, 3);
        q.select_choice(2);
        assert!(q.is_answered());
        assert_eq!(q.awarded_points(), 0);
    }

    #[test]
    fn cross_out_needs_exact_set() {
        let cases: [(&[usize], u32); 6] = [
            (&[0, 2], 4),
            (&[2, 0], 4),
            (&[0], 0),
            (&[0, 2, 3], 0),
            (&[1, 3], 0),
            (&[], 0),
        ];
        for (selection, expected) in cases {
            let mut q = cross_out(&[0, 2], 4);
            q.display();
            for &i in selection {
                q.toggle_cross_out(i);
            }
            q.submit_cross_out();
            assert_eq!(q.awarded_points(), expected, "{selection:?}");
        }
    }

    #[test]
    fn cross_out_toggle_removes_again() {
        let mut q = cross_out(&[1], 1);
        q.toggle_cross_out(1);
        q.toggle_cross_out(3);
        q.toggle_cross_out(3);
        assert_eq!(q.crossed_out(), &BTreeSet::from([1]));
        q.submit_cross_out();
        assert_eq!(q.awarded_points(), 1);

        // No further toggles once graded.
        q.toggle_cross_out(2);
        assert_eq!(q.crossed_out(), &BTreeSet::from([1]));
    }

    #[test]
    fn display_clears_cross_out_selection() {
        let mut q = cross_out(&[1], 1);
        q.toggle_cross_out(0);
        q.display();
        assert!(q.crossed_out().is_empty());
        assert!(q.is_visible());
    }

    #[test]
    fn answered_questions_never_change() {
        let mut q = text("Paris", 5);
        q.submit_text("paris");
        assert_eq!(q.awarded_points(), 5);
        q.submit_text("wrong");
        assert_eq!(q.awarded_points(), 5);

        let mut q = choice(0, 2);
        q.select_choice(1);
        q.select_choice(0);
        assert_eq!(q.awarded_points(), 0);

        let mut q = cross_out(&[0], 2);
        q.submit_cross_out();
        q.toggle_cross_out(0);
        q.submit_cross_out();
        assert_eq!(q.awarded_points(), 0);
    }

    #[test]
    fn wrong_kind_actions_are_ignored() {
        let mut q = text("Paris", 1);
        q.select_choice(0);
        q.toggle_cross_out(0);
        q.submit_cross_out();
        assert!(!q.is_answered());
        assert!(q.crossed_out().is_empty());

        let mut q = choice(0, 1);
        q.submit_text("0");
        assert!(!q.is_answered());
    }

    #[test]
    fn answering_hides_the_question() {
        let mut q = choice(0, 1);
        q.display();
        assert!(q.is_visible());
        q.select_choice(0);
        assert!(!q.is_visible());

        // Answered questions stay hidden.
        q.display();
        assert!(!q.is_visible());
    }

    #[test]
    fn session_walks_through_questions() {
        let mut session = QuizSession::new(vec![text("Paris", 2), choice(1, 3), cross_out(&[0], 5)]);
        session.start();
        assert!(session.is_active());
        assert_eq!(session.max_possible_score(), 10);
        assert!(session.questions()[0].is_visible());

        // Nothing happens until the current question is answered.
        session.poll_and_advance();
        assert_eq!(session.current().unwrap().kind(), QuestionKind::TextInput);

        session.current_mut().unwrap().submit_text("paris");
        session.poll_and_advance();
        assert_eq!(session.total_score(), 2);
        assert_eq!(session.current().unwrap().kind(), QuestionKind::MultipleChoice);
        assert!(session.questions()[1].is_visible());

        session.current_mut().unwrap().select_choice(0);
        session.poll_and_advance();
        assert_eq!(session.total_score(), 2);

        let last = session.current_mut().unwrap();
        last.toggle_cross_out(0);
        last.submit_cross_out();
        session.poll_and_advance();

        assert!(!session.is_active());
        assert!(session.is_finished());
        assert!(session.current().is_none());
        assert_eq!(session.total_score(), 7);
        assert_eq!(session.max_possible_score(), 10);

        // Frozen once finished.
        session.poll_and_advance();
        assert_eq!(session.total_score(), 7);
    }

    #[test]
    fn max_score_does_not_depend_on_answers() {
        let mut session = QuizSession::new(vec![choice(0, 4), choice(0, 6)]);
        session.start();
        assert_eq!(session.max_possible_score(), 10);
        session.current_mut().unwrap().select_choice(2);
        session.poll_and_advance();
        assert_eq!(session.max_possible_score(), 10);
    }

    #[test]
    fn empty_session_stays_inactive() {
        let mut session = QuizSession::new(Vec::new());
        session.start();
        assert!(!session.is_active());
        assert_eq!(session.total_score(), 0);
        assert_eq!(session.max_possible_score(), 0);
    }

    #[test]
    fn question_spec_from_json() {
        let spec: QuestionSpec = serde_json::from_str(
            r#"{ "kind": "cross_out", "prompt": "Extra?", "points": 3,
                 "options": ["a", "b", "c"], "required": [2, 0] }"#,
        )
        .unwrap();
        let question = QuizQuestion::from(spec);
        assert_eq!(question.kind(), QuestionKind::CrossOut);
        assert_eq!(question.max_points(), 3);
        assert_eq!(question.options().len(), 3);

        let spec: QuestionSpec =
            serde_json::from_str(r#"{ "kind": "text", "prompt": "?", "answer": "x" }"#).unwrap();
        assert_eq!(spec.points, 1);
    }

    #[test]
    fn choice_outside_options_is_an_authoring_error() {
        let spec: QuestionSpec = serde_json::from_str(
            r#"{ "kind": "choice", "prompt": "?", "options": ["a"], "correct": 3 }"#,
        )
        .unwrap();
        assert_eq!(
            spec.validate(4),
            Err(AuthoringError::ChoiceOutOfRange {
                index: 4,
                correct: 3,
                options: 1
            })
        );
    }

    #[test]
    fn choice_without_options_is_an_authoring_error() {
        let spec: QuestionSpec =
            serde_json::from_str(r#"{ "kind": "choice", "prompt": "?", "correct": 0 }"#).unwrap();
        assert_eq!(
            spec.validate(0),
            Err(AuthoringError::ChoiceOutOfRange {
                index: 0,
                correct: 0,
                options: 0
            })
        );
    }

    #[test]
    fn cross_out_outside_options_is_an_authoring_error() {
        let spec: QuestionSpec = serde_json::from_str(
            r#"{ "kind": "cross_out", "prompt": "?", "options": ["a", "b"], "required": [1, 5] }"#,
        )
        .unwrap();
        assert_eq!(
            spec.validate(2),
            Err(AuthoringError::CrossOutOutOfRange {
                index: 2,
                crossed: 5,
                options: 2
            })
        );

        let ok: QuestionSpec = serde_json::from_str(
            r#"{ "kind": "cross_out", "prompt": "?", "options": ["a", "b"], "required": [1] }"#,
        )
        .unwrap();
        assert_eq!(ok.validate(0), Ok(()));
    }

    #[test]
    fn huge_point_totals_saturate() {
        let mut session = QuizSession::new(vec![choice(0, u32::MAX), choice(0, 1)]);
        session.start();
        assert_eq!(session.max_possible_score(), u32::MAX);

        for _ in 0..2 {
            session.current_mut().unwrap().select_choice(0);
            session.poll_and_advance();
        }
        assert!(!session.is_active());
        assert_eq!(session.total_score(), u32::MAX);
    }
}
