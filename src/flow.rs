// Scene and ending flows: the stage machines that sequence dialogue, quiz and transitions.
//
// Each flow keeps its current stage, and the sub-component that stage runs, in a
// single enum. Moving to the next stage is one assignment, so two stages are
// never live at once.

use bevy::log::{error, info, warn};
use strum::Display;

use crate::dialogue::DialogueSequencer;
use crate::error::FlowError;
use crate::quiz::QuizSession;
use crate::sections::BadEndingCounter;

/// What a finished flow asks the host to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowRequest {
    LoadScene(String),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Outcome {
    Good,
    Bad,
}

impl Outcome {
    /// Bad when the score is strictly below half the maximum. Exactly half
    /// passes, and a quiz worth nothing always passes.
    pub fn from_score(score: u32, max_score: u32) -> Self {
        if u64::from(score) * 2 < u64::from(max_score) {
            Outcome::Bad
        } else {
            Outcome::Good
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Ending {
    Good,
    Neutral,
    Bad,
}

impl Ending {
    pub fn from_count(bad_outcomes: u32) -> Self {
        match bad_outcomes {
            0 => Ending::Good,
            1 => Ending::Neutral,
            _ => Ending::Bad,
        }
    }
}

#[derive(Debug)]
enum SceneStage {
    Idle,
    Intro(DialogueSequencer),
    Quiz(QuizSession),
    Outcome(DialogueSequencer),
    Done,
    Halted,
}

/// Intro dialogue, then the quiz, then the outcome dialogue picked by the
/// score, then a transition to the next scene.
#[derive(Debug)]
pub struct SceneFlowController {
    stage: SceneStage,
    intro: Option<DialogueSequencer>,
    quiz: Option<QuizSession>,
    good_outcome: Option<DialogueSequencer>,
    bad_outcome: Option<DialogueSequencer>,
    next_scene: String,
    counts_toward_ending: bool,
    outcome: Option<Outcome>,
    score: Option<(u32, u32)>,
}

impl SceneFlowController {
    pub fn new(next_scene: impl Into<String>) -> Self {
        Self {
            stage: SceneStage::Idle,
            intro: None,
            quiz: None,
            good_outcome: None,
            bad_outcome: None,
            next_scene: next_scene.into(),
            counts_toward_ending: true,
            outcome: None,
            score: None,
        }
    }

    pub fn with_intro(mut self, intro: DialogueSequencer) -> Self {
        self.intro = Some(intro);
        self
    }

    pub fn with_quiz(mut self, quiz: QuizSession) -> Self {
        self.quiz = Some(quiz);
        self
    }

    pub fn with_good_outcome(mut self, dialogue: DialogueSequencer) -> Self {
        self.good_outcome = Some(dialogue);
        self
    }

    pub fn with_bad_outcome(mut self, dialogue: DialogueSequencer) -> Self {
        self.bad_outcome = Some(dialogue);
        self
    }

    /// Whether a bad outcome here adds to the bad ending counter.
    pub fn counting_toward_ending(mut self, counts: bool) -> Self {
        self.counts_toward_ending = counts;
        self
    }

    pub fn start(&mut self) {
        match self.intro.take() {
            Some(mut intro) => {
                info!("Phase: intro dialogue");
                intro.start();
                self.stage = SceneStage::Intro(intro);
            }
            None => {
                error!("Scene has no intro dialogue, starting with the quiz");
                self.enter_quiz();
            }
        }
    }

    /// Runs one frame. Returns a request once the scene is over.
    pub fn tick(
        &mut self,
        dt: f32,
        counter: Option<&mut BadEndingCounter>,
    ) -> Option<FlowRequest> {
        match &mut self.stage {
            SceneStage::Intro(dialogue) => {
                dialogue.tick(dt);
                if dialogue.is_dialog_ended() {
                    self.enter_quiz();
                }
                None
            }
            SceneStage::Quiz(quiz) => {
                quiz.poll_and_advance();
                if quiz.is_active() {
                    return None;
                }
                let (score, max) = (quiz.total_score(), quiz.max_possible_score());
                self.enter_outcome(score, max, counter)
            }
            SceneStage::Outcome(dialogue) => {
                dialogue.tick(dt);
                if dialogue.is_dialog_ended() {
                    return self.transition();
                }
                None
            }
            SceneStage::Idle | SceneStage::Done | SceneStage::Halted => None,
        }
    }

    pub fn advance_or_skip(&mut self) {
        if let Some(dialogue) = self.dialogue_mut() {
            dialogue.advance_or_skip();
        }
    }

    /// The dialogue on screen, if the current stage has one.
    pub fn dialogue(&self) -> Option<&DialogueSequencer> {
        match &self.stage {
            SceneStage::Intro(dialogue) | SceneStage::Outcome(dialogue) => Some(dialogue),
            _ => None,
        }
    }

    pub fn dialogue_mut(&mut self) -> Option<&mut DialogueSequencer> {
        match &mut self.stage {
            SceneStage::Intro(dialogue) | SceneStage::Outcome(dialogue) => Some(dialogue),
            _ => None,
        }
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        match &self.stage {
            SceneStage::Quiz(quiz) => Some(quiz),
            _ => None,
        }
    }

    pub fn quiz_mut(&mut self) -> Option<&mut QuizSession> {
        match &mut self.stage {
            SceneStage::Quiz(quiz) => Some(quiz),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Final quiz score and maximum, once the quiz is over.
    pub fn score(&self) -> Option<(u32, u32)> {
        self.score
    }

    pub fn is_done(&self) -> bool {
        matches!(self.stage, SceneStage::Done)
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.stage, SceneStage::Halted)
    }

    fn enter_quiz(&mut self) {
        info!("Phase: quiz");
        let mut quiz = self.quiz.take().unwrap_or_else(|| {
            error!("Scene has no quiz, skipping it");
            QuizSession::default()
        });
        quiz.start();
        self.stage = SceneStage::Quiz(quiz);
    }

    fn enter_outcome(
        &mut self,
        score: u32,
        max: u32,
        counter: Option<&mut BadEndingCounter>,
    ) -> Option<FlowRequest> {
        let outcome = Outcome::from_score(score, max);
        info!("Phase: outcome dialogue, score {score}/{max} is a {outcome} outcome");
        self.score = Some((score, max));
        self.outcome = Some(outcome);

        if outcome == Outcome::Bad && self.counts_toward_ending {
            match counter {
                Some(counter) => counter.increment(),
                None => warn!("{}, bad outcome not recorded", FlowError::MissingCounter),
            }
        }

        let dialogue = match outcome {
            Outcome::Good => self.good_outcome.take(),
            Outcome::Bad => self.bad_outcome.take(),
        };
        match dialogue {
            Some(mut dialogue) => {
                dialogue.start();
                self.stage = SceneStage::Outcome(dialogue);
                None
            }
            None => {
                warn!("No {outcome} outcome dialogue, going straight to the next scene");
                self.transition()
            }
        }
    }

    fn transition(&mut self) -> Option<FlowRequest> {
        if self.next_scene.trim().is_empty() {
            error!("{}", FlowError::MissingSceneName);
            self.stage = SceneStage::Halted;
            return None;
        }
        info!("Phase: transition to `{}`", self.next_scene);
        self.stage = SceneStage::Done;
        Some(FlowRequest::LoadScene(self.next_scene.clone()))
    }
}

#[derive(Debug)]
enum EndingStage {
    Idle,
    Intro(DialogueSequencer),
    Deciding,
    Ending(Ending, DialogueSequencer),
    Done,
    Halted,
}

/// The finale: an intro dialogue, then one of three endings picked from the
/// bad ending counter. Good and neutral endings quit the game, the bad ending
/// starts over from the first scene.
#[derive(Debug)]
pub struct EndingFlowController {
    stage: EndingStage,
    intro: Option<DialogueSequencer>,
    good: Option<DialogueSequencer>,
    neutral: Option<DialogueSequencer>,
    bad: Option<DialogueSequencer>,
    first_scene: String,
    ending: Option<Ending>,
}

impl EndingFlowController {
    pub fn new(first_scene: impl Into<String>) -> Self {
        Self {
            stage: EndingStage::Idle,
            intro: None,
            good: None,
            neutral: None,
            bad: None,
            first_scene: first_scene.into(),
            ending: None,
        }
    }

    pub fn with_intro(mut self, intro: DialogueSequencer) -> Self {
        self.intro = Some(intro);
        self
    }

    pub fn with_ending(mut self, ending: Ending, dialogue: DialogueSequencer) -> Self {
        let slot = match ending {
            Ending::Good => &mut self.good,
            Ending::Neutral => &mut self.neutral,
            Ending::Bad => &mut self.bad,
        };
        *slot = Some(dialogue);
        self
    }

    pub fn start(&mut self) {
        match self.intro.take() {
            Some(mut intro) => {
                info!("Phase: finale intro dialogue");
                intro.start();
                self.stage = EndingStage::Intro(intro);
            }
            None => {
                error!("Finale has no intro dialogue, choosing the ending right away");
                self.stage = EndingStage::Deciding;
            }
        }
    }

    /// Runs one frame. `counter` is `None` when no counter exists, which
    /// halts the finale.
    pub fn tick(
        &mut self,
        dt: f32,
        counter: Option<&mut BadEndingCounter>,
    ) -> Option<FlowRequest> {
        match &mut self.stage {
            EndingStage::Intro(dialogue) => {
                dialogue.tick(dt);
                if dialogue.is_dialog_ended() {
                    return self.decide(counter);
                }
                None
            }
            EndingStage::Deciding => self.decide(counter),
            EndingStage::Ending(ending, dialogue) => {
                dialogue.tick(dt);
                if dialogue.is_dialog_ended() {
                    let ending = *ending;
                    return self.conclude(ending, counter);
                }
                None
            }
            EndingStage::Idle | EndingStage::Done | EndingStage::Halted => None,
        }
    }

    pub fn advance_or_skip(&mut self) {
        if let Some(dialogue) = self.dialogue_mut() {
            dialogue.advance_or_skip();
        }
    }

    pub fn dialogue(&self) -> Option<&DialogueSequencer> {
        match &self.stage {
            EndingStage::Intro(dialogue) | EndingStage::Ending(_, dialogue) => Some(dialogue),
            _ => None,
        }
    }

    pub fn dialogue_mut(&mut self) -> Option<&mut DialogueSequencer> {
        match &mut self.stage {
            EndingStage::Intro(dialogue) | EndingStage::Ending(_, dialogue) => Some(dialogue),
            _ => None,
        }
    }

    pub fn ending(&self) -> Option<Ending> {
        self.ending
    }

    pub fn is_done(&self) -> bool {
        matches!(self.stage, EndingStage::Done)
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.stage, EndingStage::Halted)
    }

    fn decide(&mut self, counter: Option<&mut BadEndingCounter>) -> Option<FlowRequest> {
        let Some(counter) = counter else {
            error!("{}", FlowError::MissingCounter);
            self.stage = EndingStage::Halted;
            return None;
        };

        let count = counter.value();
        let ending = Ending::from_count(count);
        info!("Bad ending counter is {count}, starting the {ending} ending");
        self.ending = Some(ending);

        let dialogue = match ending {
            Ending::Good => self.good.take(),
            Ending::Neutral => self.neutral.take(),
            Ending::Bad => self.bad.take(),
        };
        match dialogue {
            Some(mut dialogue) => {
                dialogue.start();
                self.stage = EndingStage::Ending(ending, dialogue);
                None
            }
            None => {
                warn!("No dialogue for the {ending} ending");
                self.conclude(ending, Some(counter))
            }
        }
    }

    fn conclude(
        &mut self,
        ending: Ending,
        counter: Option<&mut BadEndingCounter>,
    ) -> Option<FlowRequest> {
        if ending != Ending::Bad {
            info!("Finale over, quitting");
            self.stage = EndingStage::Done;
            return Some(FlowRequest::Quit);
        }

        if self.first_scene.trim().is_empty() {
            error!("{}", FlowError::MissingSceneName);
            self.stage = EndingStage::Halted;
            return None;
        }
        // Loop-back also clears the counter, so the replay is judged on its
        // own outcomes rather than inheriting the last run's bad ending.
        if let Some(counter) = counter {
            counter.reset();
        }
        info!("Finale over, back to `{}`", self.first_scene);
        self.stage = EndingStage::Done;
        Some(FlowRequest::LoadScene(self.first_scene.clone()))
    }
}

/// Whichever flow the current scene runs.
#[derive(Debug)]
pub enum Flow {
    Scene(SceneFlowController),
    Ending(EndingFlowController),
}

impl Flow {
    pub fn start(&mut self) {
        match self {
            Flow::Scene(scene) => scene.start(),
            Flow::Ending(ending) => ending.start(),
        }
    }

    pub fn tick(
        &mut self,
        dt: f32,
        counter: Option<&mut BadEndingCounter>,
    ) -> Option<FlowRequest> {
        match self {
            Flow::Scene(scene) => scene.tick(dt, counter),
            Flow::Ending(ending) => ending.tick(dt, counter),
        }
    }

    pub fn advance_or_skip(&mut self) {
        match self {
            Flow::Scene(scene) => scene.advance_or_skip(),
            Flow::Ending(ending) => ending.advance_or_skip(),
        }
    }

    pub fn dialogue(&self) -> Option<&DialogueSequencer> {
        match self {
            Flow::Scene(scene) => scene.dialogue(),
            Flow::Ending(ending) => ending.dialogue(),
        }
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        match self {
            Flow::Scene(scene) => scene.quiz(),
            Flow::Ending(_) => None,
        }
    }

    pub fn quiz_mut(&mut self) -> Option<&mut QuizSession> {
        match self {
            Flow::Scene(scene) => scene.quiz_mut(),
            Flow::Ending(_) => None,
        }
    }
}
