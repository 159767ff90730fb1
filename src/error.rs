// Errors raised while loading the story or running a flow.

use thiserror::Error;

/// Mistakes in authored story data. These are caught when the story is
/// loaded so a broken script never reaches the player mid-scene.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthoringError {
    #[error("story data is malformed: {0}")]
    Malformed(String),

    #[error("line {line} refers to character {speaker}, but only {characters} are defined")]
    SpeakerOutOfRange {
        line: usize,
        speaker: usize,
        characters: usize,
    },

    #[error("the story has no first scene")]
    MissingFirstScene,

    #[error("scene `{from}` leads to unknown scene `{to}`")]
    UnknownScene { from: String, to: String },

    #[error("question {index} expects option {correct}, but has {options} options")]
    ChoiceOutOfRange {
        index: usize,
        correct: usize,
        options: usize,
    },

    #[error("question {index} expects option {crossed} crossed out, but has {options} options")]
    CrossOutOutOfRange {
        index: usize,
        crossed: usize,
        options: usize,
    },
}

impl From<serde_json::Error> for AuthoringError {
    fn from(err: serde_json::Error) -> Self {
        AuthoringError::Malformed(err.to_string())
    }
}

/// Failures that abandon a flow transition. The flow halts; other state is
/// left alone.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("no scene name given, cannot transition")]
    MissingSceneName,

    #[error("the bad ending counter is missing, cannot choose an ending")]
    MissingCounter,

    #[error("scene `{0}` is not in the story")]
    UnknownScene(String),

    #[error(transparent)]
    Authoring(#[from] AuthoringError),
}
