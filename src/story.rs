// Authored story data: characters, scenes and endings, loaded from JSON.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::Deserialize;

use crate::dialogue::{
    Character, DEFAULT_TYPING_INTERVAL, DialogueLine, DialogueSequencer, EmotionDisplay,
};
use crate::error::{AuthoringError, FlowError};
use crate::flow::{Ending, EndingFlowController, Flow, SceneFlowController};
use crate::quiz::{QuestionSpec, QuizQuestion, QuizSession};
use crate::sections::Sections;

const STORY: &str = include_str!("../assets/story.json");

pub struct StoryPlugin;

impl Plugin for StoryPlugin {
    fn build(&self, app: &mut App) {
        match StoryBook::from_json(STORY) {
            Ok(story) => {
                info!(
                    "Loaded story with {} scenes, starting at `{}`",
                    story.scenes.len(),
                    story.first_scene
                );
                app.insert_resource(story);
            }
            Err(err) => error!("Story failed to load: {err}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterSpec {
    pub name: String,
    /// Emotion keys of the character's portrait, if it has one.
    #[serde(default)]
    pub emotions: Option<Vec<String>>,
}

fn counts_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlotScene {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub intro: Option<Vec<DialogueLine>>,
    #[serde(default)]
    pub quiz: Option<Vec<QuestionSpec>>,
    #[serde(default)]
    pub good_outcome: Option<Vec<DialogueLine>>,
    #[serde(default)]
    pub bad_outcome: Option<Vec<DialogueLine>>,
    #[serde(default)]
    pub next_scene: String,
    #[serde(default = "counts_by_default")]
    pub counts_toward_ending: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndingScene {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub intro: Option<Vec<DialogueLine>>,
    #[serde(default)]
    pub good: Option<Vec<DialogueLine>>,
    #[serde(default)]
    pub neutral: Option<Vec<DialogueLine>>,
    #[serde(default)]
    pub bad: Option<Vec<DialogueLine>>,
    #[serde(default)]
    pub first_scene: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneEntry {
    Plot(PlotScene),
    Ending(EndingScene),
}

impl SceneEntry {
    pub fn title(&self) -> Option<&str> {
        match self {
            SceneEntry::Plot(scene) => scene.title.as_deref(),
            SceneEntry::Ending(scene) => scene.title.as_deref(),
        }
    }

    pub fn section(&self) -> Sections {
        match self {
            SceneEntry::Plot(_) => Sections::Plot,
            SceneEntry::Ending(_) => Sections::Ending,
        }
    }
}

fn default_typing_interval() -> f32 {
    DEFAULT_TYPING_INTERVAL
}

/// Everything the author configures. Read-only at runtime.
#[derive(Resource, Debug, Clone, Deserialize)]
pub struct StoryBook {
    pub first_scene: String,
    /// Seconds per revealed character.
    #[serde(default = "default_typing_interval")]
    pub typing_interval: f32,
    pub characters: Vec<CharacterSpec>,
    pub scenes: HashMap<String, SceneEntry>,
}

impl StoryBook {
    /// Parses and validates a story, so that every scene it names can be built.
    pub fn from_json(json: &str) -> Result<Self, AuthoringError> {
        let story: StoryBook = serde_json::from_str(json)?;
        story.validate()?;
        Ok(story)
    }

    pub fn validate(&self) -> Result<(), AuthoringError> {
        if self.first_scene.trim().is_empty() {
            return Err(AuthoringError::MissingFirstScene);
        }
        self.check_target("story", &self.first_scene)?;

        for (name, entry) in &self.scenes {
            match entry {
                SceneEntry::Plot(scene) => {
                    // An empty name is only caught when the transition happens.
                    if !scene.next_scene.is_empty() {
                        self.check_target(name, &scene.next_scene)?;
                    }
                    for (index, question) in scene.quiz.iter().flatten().enumerate() {
                        question.validate(index)?;
                    }
                }
                SceneEntry::Ending(scene) => {
                    if !scene.first_scene.is_empty() {
                        self.check_target(name, &scene.first_scene)?;
                    }
                }
            }
            self.build_entry(entry)?;
        }
        Ok(())
    }

    pub fn first_scene(&self) -> &str {
        &self.first_scene
    }

    pub fn scene(&self, name: &str) -> Result<&SceneEntry, FlowError> {
        self.scenes
            .get(name)
            .ok_or_else(|| FlowError::UnknownScene(name.to_string()))
    }

    /// A fresh, unstarted flow for the named scene.
    pub fn build_flow(&self, name: &str) -> Result<Flow, FlowError> {
        let entry = self.scene(name)?;
        Ok(self.build_entry(entry)?)
    }

    pub fn characters(&self) -> Vec<Character> {
        self.characters
            .iter()
            .map(|spec| Character {
                name: spec.name.clone(),
                emotions: spec.emotions.clone().map(EmotionDisplay::new),
            })
            .collect()
    }

    fn check_target(&self, from: &str, to: &str) -> Result<(), AuthoringError> {
        if self.scenes.contains_key(to) {
            Ok(())
        } else {
            Err(AuthoringError::UnknownScene {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn dialogue(
        &self,
        lines: &Option<Vec<DialogueLine>>,
    ) -> Result<Option<DialogueSequencer>, AuthoringError> {
        lines
            .as_ref()
            .map(|lines| {
                DialogueSequencer::new(lines.clone(), self.characters(), self.typing_interval)
            })
            .transpose()
    }

    fn build_entry(&self, entry: &SceneEntry) -> Result<Flow, AuthoringError> {
        match entry {
            SceneEntry::Plot(scene) => {
                let mut flow = SceneFlowController::new(scene.next_scene.clone())
                    .counting_toward_ending(scene.counts_toward_ending);
                if let Some(intro) = self.dialogue(&scene.intro)? {
                    flow = flow.with_intro(intro);
                }
                if let Some(questions) = &scene.quiz {
                    let questions = questions.iter().cloned().map(QuizQuestion::from).collect();
                    flow = flow.with_quiz(QuizSession::new(questions));
                }
                if let Some(good) = self.dialogue(&scene.good_outcome)? {
                    flow = flow.with_good_outcome(good);
                }
                if let Some(bad) = self.dialogue(&scene.bad_outcome)? {
                    flow = flow.with_bad_outcome(bad);
                }
                Ok(Flow::Scene(flow))
            }
            SceneEntry::Ending(scene) => {
                let mut flow = EndingFlowController::new(scene.first_scene.clone());
                if let Some(intro) = self.dialogue(&scene.intro)? {
                    flow = flow.with_intro(intro);
                }
                for (ending, lines) in [
                    (Ending::Good, &scene.good),
                    (Ending::Neutral, &scene.neutral),
                    (Ending::Bad, &scene.bad),
                ] {
                    if let Some(dialogue) = self.dialogue(lines)? {
                        flow = flow.with_ending(ending, dialogue);
                    }
                }
                Ok(Flow::Ending(flow))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_story_is_valid() {
        let story = StoryBook::from_json(STORY).unwrap();
        for name in story.scenes.keys() {
            assert!(story.build_flow(name).is_ok(), "{name}");
        }
        assert!(matches!(
            story.scene(story.first_scene()).unwrap(),
            SceneEntry::Plot(_)
        ));
    }

    const SMALL: &str = r#"{
        "first_scene": "lesson",
        "typing_interval": 0.02,
        "characters": [
            { "name": "Player" },
            { "name": "Tutor", "emotions": ["Normal", "Happy"] }
        ],
        "scenes": {
            "lesson": {
                "type": "plot",
                "intro": [{ "speaker": 1, "text": "Hi", "emotion": "Happy" }],
                "quiz": [{ "kind": "choice", "prompt": "?", "options": ["a", "b"], "correct": 1 }],
                "next_scene": "finale"
            },
            "finale": { "type": "ending", "first_scene": "lesson" }
        }
    }"#;

    #[test]
    fn parses_scenes_and_defaults() {
        let story = StoryBook::from_json(SMALL).unwrap();
        assert_eq!(story.typing_interval, 0.02);
        assert_eq!(story.characters().len(), 2);
        assert!(story.characters()[0].emotions.is_none());

        let SceneEntry::Plot(lesson) = story.scene("lesson").unwrap() else {
            panic!("lesson should be a plot scene");
        };
        assert!(lesson.counts_toward_ending);
        assert_eq!(lesson.quiz.as_ref().unwrap()[0].points, 1);
        assert_eq!(story.scene("finale").unwrap().section(), Sections::Ending);
    }

    #[test]
    fn built_flow_starts_with_intro() {
        let story = StoryBook::from_json(SMALL).unwrap();
        let mut flow = story.build_flow("lesson").unwrap();
        flow.start();
        let dialogue = flow.dialogue().unwrap();
        assert_eq!(dialogue.speaker_name(), Some("Tutor"));
        let tutor = &dialogue.characters()[1];
        assert_eq!(tutor.emotions.as_ref().unwrap().active(), Some("Happy"));
    }

    #[test]
    fn unknown_scene_is_reported() {
        let story = StoryBook::from_json(SMALL).unwrap();
        assert_eq!(
            story.build_flow("nowhere").unwrap_err(),
            FlowError::UnknownScene("nowhere".into())
        );
    }

    #[test]
    fn rejects_bad_speaker() {
        let json = SMALL.replace(r#""speaker": 1"#, r#""speaker": 7"#);
        assert!(matches!(
            StoryBook::from_json(&json),
            Err(AuthoringError::SpeakerOutOfRange { speaker: 7, .. })
        ));
    }

    #[test]
    fn rejects_dangling_scene_links() {
        let json = SMALL.replace(r#""next_scene": "finale""#, r#""next_scene": "epilogue""#);
        assert_eq!(
            StoryBook::from_json(&json).unwrap_err(),
            AuthoringError::UnknownScene {
                from: "lesson".into(),
                to: "epilogue".into()
            }
        );

        let json = SMALL.replace(r#""first_scene": "lesson","#, r#""first_scene": "","#);
        assert_eq!(
            StoryBook::from_json(&json).unwrap_err(),
            AuthoringError::MissingFirstScene
        );
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            StoryBook::from_json("{ not json"),
            Err(AuthoringError::Malformed(_))
        ));
    }
}
