// On-screen dialogue box and quiz panel for plot and ending scenes.

use bevy::input::ButtonState;
use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::prelude::*;

use crate::dialogue::{DialogueSequencer, EmotionDisplay};
use crate::menu::{self, HOVERED_BUTTON, NORMAL_BUTTON, PRESSED_BUTTON};
use crate::plot::ActiveFlow;
use crate::quiz::{QuestionKind, QuizQuestion, QuizSession};
use crate::sections::Sections;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TextEntry>()
            .add_systems(OnEnter(Sections::Plot), spawn_plot_hud)
            .add_systems(OnEnter(Sections::Ending), spawn_ending_hud)
            .add_systems(
                Update,
                (
                    type_answer,
                    quiz_buttons,
                    rebuild_options,
                    update_hud,
                    option_visuals,
                )
                    .chain()
                    .run_if(resource_exists::<ActiveFlow>),
            );
    }
}

const CROSSED_BUTTON: Color = Color::srgb(0.45, 0.12, 0.12);
const PANEL: Color = Color::srgba(0.05, 0.05, 0.1, 0.85);

/// What the player has typed for the current text question.
#[derive(Resource, Debug, Default)]
pub struct TextEntry(pub String);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
enum HudPanel {
    Dialogue,
    Quiz,
    Submit,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
enum HudText {
    Speaker,
    Emotion,
    Line,
    Progress,
    Prompt,
    Entry,
}

#[derive(Component)]
struct OptionsRow;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
enum QuizButton {
    Option(usize),
    Submit,
}

fn spawn_plot_hud(commands: Commands) {
    spawn_hud(commands, Sections::Plot);
}

fn spawn_ending_hud(commands: Commands) {
    spawn_hud(commands, Sections::Ending);
}

fn spawn_hud(mut commands: Commands, section: Sections) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::SpaceBetween,
                align_items: AlignItems::Center,
                padding: UiRect::all(Val::Px(24.0)),
                ..default()
            },
            DespawnOnExit(section),
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    HudPanel::Quiz,
                    Visibility::Hidden,
                    Node {
                        width: Val::Percent(80.0),
                        flex_direction: FlexDirection::Column,
                        align_items: AlignItems::Center,
                        row_gap: Val::Px(16.0),
                        padding: UiRect::all(Val::Px(16.0)),
                        ..default()
                    },
                    BackgroundColor(PANEL),
                ))
                .with_children(|quiz| {
                    hud_text(quiz, HudText::Progress, 18.0);
                    hud_text(quiz, HudText::Prompt, 28.0);
                    hud_text(quiz, HudText::Entry, 24.0);
                    quiz.spawn((
                        OptionsRow,
                        Node {
                            flex_direction: FlexDirection::Row,
                            flex_wrap: FlexWrap::Wrap,
                            justify_content: JustifyContent::Center,
                            column_gap: Val::Px(12.0),
                            row_gap: Val::Px(12.0),
                            ..default()
                        },
                    ));
                    quiz.spawn((HudPanel::Submit, Node::default()))
                        .with_children(|submit| {
                            menu::spawn_button(submit, "Submit", QuizButton::Submit);
                        });
                });

            parent
                .spawn((
                    HudPanel::Dialogue,
                    Visibility::Hidden,
                    Node {
                        width: Val::Percent(100.0),
                        min_height: Val::Px(160.0),
                        flex_direction: FlexDirection::Column,
                        row_gap: Val::Px(8.0),
                        padding: UiRect::all(Val::Px(16.0)),
                        border: UiRect::all(Val::Px(2.0)),
                        ..default()
                    },
                    BackgroundColor(PANEL),
                    BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3)),
                ))
                .with_children(|dialogue| {
                    dialogue
                        .spawn(Node {
                            column_gap: Val::Px(12.0),
                            ..default()
                        })
                        .with_children(|header| {
                            hud_text(header, HudText::Speaker, 26.0);
                            hud_text(header, HudText::Emotion, 20.0);
                        });
                    hud_text(dialogue, HudText::Line, 24.0);
                });
        });
}

fn hud_text(parent: &mut ChildSpawnerCommands, kind: HudText, font_size: f32) {
    let color = match kind {
        HudText::Speaker => Color::srgb(1.0, 0.85, 0.4),
        HudText::Emotion | HudText::Progress => Color::srgba(0.8, 0.8, 0.8, 1.0),
        _ => Color::WHITE,
    };
    parent.spawn((
        kind,
        Text::new(""),
        TextFont {
            font_size,
            ..default()
        },
        TextColor(color),
    ));
}

fn current_question(active: &ActiveFlow) -> Option<&QuizQuestion> {
    active.flow.quiz().and_then(QuizSession::current)
}

/// Keyboard entry for text questions. Enter submits.
fn type_answer(
    mut keys: MessageReader<KeyboardInput>,
    mut active: ResMut<ActiveFlow>,
    mut entry: ResMut<TextEntry>,
) {
    let Some(question) = active
        .flow
        .quiz_mut()
        .and_then(QuizSession::current_mut)
        .filter(|q| q.kind() == QuestionKind::TextInput)
    else {
        keys.clear();
        return;
    };

    for key in keys.read() {
        if key.state != ButtonState::Pressed {
            continue;
        }
        match &key.logical_key {
            Key::Character(text) => entry.0.push_str(text),
            Key::Space => entry.0.push(' '),
            Key::Backspace => {
                entry.0.pop();
            }
            Key::Enter => {
                question.submit_text(&entry.0);
                entry.0.clear();
            }
            _ => {}
        }
    }
}

fn quiz_buttons(
    query: Query<(&Interaction, &QuizButton), Changed<Interaction>>,
    mut active: ResMut<ActiveFlow>,
    mut entry: ResMut<TextEntry>,
) {
    for (interaction, button) in &query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let Some(question) = active.flow.quiz_mut().and_then(QuizSession::current_mut) else {
            continue;
        };
        press(question, *button, &mut entry.0);
    }
}

fn press(question: &mut QuizQuestion, button: QuizButton, entry: &mut String) {
    match (button, question.kind()) {
        (QuizButton::Option(index), QuestionKind::MultipleChoice) => question.select_choice(index),
        (QuizButton::Option(index), QuestionKind::CrossOut) => question.toggle_cross_out(index),
        (QuizButton::Submit, QuestionKind::TextInput) => {
            question.submit_text(entry);
            entry.clear();
        }
        (QuizButton::Submit, QuestionKind::CrossOut) => question.submit_cross_out(),
        _ => {}
    }
}

/// Respawns the option buttons whenever a different question comes up.
fn rebuild_options(
    mut commands: Commands,
    active: Res<ActiveFlow>,
    rows: Query<(Entity, Ref<OptionsRow>)>,
    mut entry: ResMut<TextEntry>,
    mut shown: Local<Option<(String, usize)>>,
) {
    let question = current_question(&active);
    let key = question.map(|_| {
        let index = active.flow.quiz().map_or(0, QuizSession::current_index);
        (active.scene.clone(), index)
    });

    for (row, row_ref) in &rows {
        if !row_ref.is_added() && !active.is_added() && *shown == key {
            continue;
        }
        commands.entity(row).despawn_related::<Children>();

        let Some(question) = question.filter(|q| q.kind() != QuestionKind::TextInput) else {
            continue;
        };
        commands.entity(row).with_children(|parent| {
            for (index, label) in question.options().iter().enumerate() {
                menu::spawn_button(parent, label, QuizButton::Option(index));
            }
        });
    }

    if *shown != key {
        entry.0.clear();
        *shown = key;
    }
}

fn update_hud(
    active: Res<ActiveFlow>,
    entry: Res<TextEntry>,
    mut panels: Query<(&mut Visibility, &HudPanel)>,
    mut texts: Query<(&mut Text, &HudText)>,
) {
    let dialogue = active.flow.dialogue();
    let quiz = active.flow.quiz();
    let question = current_question(&active);

    for (mut visibility, panel) in &mut panels {
        let shown = match panel {
            HudPanel::Dialogue => dialogue.is_some(),
            HudPanel::Quiz => question.is_some_and(QuizQuestion::is_visible),
            HudPanel::Submit => question.is_some_and(|q| q.kind() != QuestionKind::MultipleChoice),
        };
        let wanted = if shown {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if *visibility != wanted {
            *visibility = wanted;
        }
    }

    for (mut text, kind) in &mut texts {
        let value = match kind {
            HudText::Speaker => dialogue
                .and_then(DialogueSequencer::speaker_name)
                .unwrap_or_default()
                .to_string(),
            HudText::Emotion => dialogue
                .and_then(DialogueSequencer::speaker)
                .and_then(|c| c.emotions.as_ref())
                .and_then(EmotionDisplay::active)
                .map(|emotion| format!("({emotion})"))
                .unwrap_or_default(),
            HudText::Line => dialogue
                .map(DialogueSequencer::displayed_text)
                .unwrap_or_default()
                .to_string(),
            HudText::Progress => quiz
                .filter(|_| question.is_some())
                .map(|quiz| {
                    format!(
                        "Question {} of {}",
                        quiz.current_index() + 1,
                        quiz.questions().len()
                    )
                })
                .unwrap_or_default(),
            HudText::Prompt => question.map(|q| q.prompt().to_string()).unwrap_or_default(),
            HudText::Entry => match question.map(QuizQuestion::kind) {
                Some(QuestionKind::TextInput) => format!("> {}_", entry.0),
                _ => String::new(),
            },
        };
        if **text != value {
            **text = value;
        }
    }
}

fn option_visuals(
    active: Res<ActiveFlow>,
    mut buttons: Query<(&QuizButton, &Interaction, &mut BackgroundColor, &mut BorderColor)>,
) {
    let crossed = current_question(&active).map(QuizQuestion::crossed_out);
    for (button, interaction, mut bg, mut border) in &mut buttons {
        let crossed_out = match button {
            QuizButton::Option(index) => crossed.is_some_and(|set| set.contains(index)),
            QuizButton::Submit => false,
        };
        let color = match (crossed_out, *interaction) {
            (true, _) => CROSSED_BUTTON,
            (false, Interaction::Pressed) => PRESSED_BUTTON,
            (false, Interaction::Hovered) => HOVERED_BUTTON,
            (false, Interaction::None) => NORMAL_BUTTON,
        };
        if bg.0 != color {
            *bg = color.into();
        }
        let wanted = menu::border_for(*interaction);
        if *border != wanted {
            *border = wanted;
        }
    }
}
