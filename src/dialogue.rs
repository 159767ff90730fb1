// Visual novel dialogue: a linear script of lines revealed one character at a time.

use bevy::log::{error, info};
use serde::Deserialize;

use crate::error::AuthoringError;

/// Default delay between revealed characters, in seconds.
pub const DEFAULT_TYPING_INTERVAL: f32 = 0.05;

/// One authored line of a script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialogueLine {
    /// Index into the character list.
    pub speaker: usize,
    pub text: String,
    /// Emotion to show on the speaker's portrait. Absent leaves it unchanged.
    #[serde(default)]
    pub emotion: Option<String>,
}

impl DialogueLine {
    pub fn new(speaker: usize, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            emotion: None,
        }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }
}

/// The set of emotions a character portrait can show, at most one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmotionDisplay {
    keys: Vec<String>,
    active: Option<usize>,
}

impl EmotionDisplay {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            active: None,
        }
    }

    /// Shows the emotion whose key matches exactly. An unknown key leaves every
    /// emotion hidden.
    pub fn activate(&mut self, key: &str) {
        self.active = self.keys.iter().position(|k| k == key);
    }

    pub fn active(&self) -> Option<&str> {
        self.active.map(|i| self.keys[i].as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    /// Characters without a portrait ignore emotion keys.
    pub emotions: Option<EmotionDisplay>,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emotions: None,
        }
    }

    pub fn with_emotions(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.emotions = Some(EmotionDisplay::new(keys));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Idle,
    Typing,
    LineComplete,
    Finished,
}

/// Plays a script line by line. The player drives it with `advance_or_skip`,
/// the frame loop with `tick`.
#[derive(Debug, Clone)]
pub struct DialogueSequencer {
    lines: Vec<DialogueLine>,
    characters: Vec<Character>,
    typing_interval: f32,
    state: DialogueState,
    index: usize,
    /// Characters of the current line shown so far.
    revealed: usize,
    elapsed: f32,
}

impl DialogueSequencer {
    /// Builds a sequencer, rejecting any line whose speaker is not in
    /// `characters`.
    pub fn new(
        lines: Vec<DialogueLine>,
        characters: Vec<Character>,
        typing_interval: f32,
    ) -> Result<Self, AuthoringError> {
        if let Some((line, bad)) = lines
            .iter()
            .enumerate()
            .find(|(_, l)| l.speaker >= characters.len())
        {
            return Err(AuthoringError::SpeakerOutOfRange {
                line,
                speaker: bad.speaker,
                characters: characters.len(),
            });
        }

        Ok(Self {
            lines,
            characters,
            typing_interval,
            state: DialogueState::Idle,
            index: 0,
            revealed: 0,
            elapsed: 0.0,
        })
    }

    pub fn start(&mut self) {
        if self.lines.is_empty() {
            error!("Dialogue script is empty, nothing to show");
            self.finish();
            return;
        }
        self.index = 0;
        self.begin_line();
    }

    /// The single player action: skips the reveal while typing, otherwise
    /// moves to the next line or finishes.
    pub fn advance_or_skip(&mut self) {
        match self.state {
            DialogueState::Typing => {
                self.revealed = self.current_len();
                self.state = DialogueState::LineComplete;
            }
            DialogueState::LineComplete => {
                self.index += 1;
                if self.index < self.lines.len() {
                    self.begin_line();
                } else {
                    self.finish();
                }
            }
            DialogueState::Idle | DialogueState::Finished => {}
        }
    }

    /// Advances the typed reveal by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if self.state != DialogueState::Typing {
            return;
        }
        self.elapsed += dt;
        let total = self.current_len();
        let emitted = ((self.elapsed / self.typing_interval) as usize).saturating_add(1);
        self.revealed = emitted.min(total);
        if self.revealed == total {
            self.state = DialogueState::LineComplete;
        }
    }

    /// Becomes true once the last line has been advanced past and stays true.
    pub fn is_dialog_ended(&self) -> bool {
        self.state == DialogueState::Finished
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    #[cfg(test)]
    pub fn line_index(&self) -> usize {
        self.index
    }

    /// Text on screen: a growing prefix of the line while typing, the full line
    /// once complete, nothing before start or after the end.
    pub fn displayed_text(&self) -> &str {
        let Some(line) = self.current_line() else {
            return "";
        };
        let end = line
            .text
            .char_indices()
            .nth(self.revealed)
            .map_or(line.text.len(), |(i, _)| i);
        &line.text[..end]
    }

    pub fn speaker(&self) -> Option<&Character> {
        self.current_line()
            .and_then(|line| self.characters.get(line.speaker))
    }

    pub fn speaker_name(&self) -> Option<&str> {
        self.speaker().map(|c| c.name.as_str())
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    fn current_line(&self) -> Option<&DialogueLine> {
        match self.state {
            DialogueState::Typing | DialogueState::LineComplete => self.lines.get(self.index),
            DialogueState::Idle | DialogueState::Finished => None,
        }
    }

    fn current_len(&self) -> usize {
        self.lines
            .get(self.index)
            .map_or(0, |line| line.text.chars().count())
    }

    fn begin_line(&mut self) {
        let line = &self.lines[self.index];
        if let Some(key) = line.emotion.as_deref().filter(|k| !k.is_empty()) {
            if let Some(emotions) = self.characters[line.speaker].emotions.as_mut() {
                emotions.activate(key);
            }
        }

        self.elapsed = 0.0;
        self.state = DialogueState::Typing;
        let total = self.current_len();
        self.revealed = if self.typing_interval > 0.0 {
            total.min(1)
        } else {
            total
        };
        if self.revealed == total {
            self.state = DialogueState::LineComplete;
        }
    }

    fn finish(&mut self) {
        if self.state != DialogueState::Finished {
            info!("Dialogue finished");
        }
        self.state = DialogueState::Finished;
        self.revealed = 0;
    }
}
