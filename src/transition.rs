// Scene loading by name, and full-screen title cards that fade in and out between scenes.

use bevy::prelude::*;

use crate::error::FlowError;
use crate::flow::Flow;
use crate::plot::ActiveFlow;
use crate::sections::Sections;
use crate::story::{SceneEntry, StoryBook};

pub struct TransitionPlugin;

impl Plugin for TransitionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SceneTransition>()
            .add_systems(Update, (load_scene, fade_card).chain());
    }
}

/// Asks for the named scene to replace the current one.
#[derive(Message, Debug, Clone)]
pub struct SceneTransition(pub String);

const FADE_IN: f32 = 0.1;
const HOLD: f32 = 1.5;
const FADE_OUT: f32 = 1.0;
const TOTAL: f32 = FADE_IN + HOLD + FADE_OUT;

#[derive(Resource)]
struct CardTimer(f32);

#[derive(Component)]
struct CardRoot;

#[derive(Component)]
struct CardText;

fn load_scene(
    mut commands: Commands,
    mut requests: MessageReader<SceneTransition>,
    story: Option<Res<StoryBook>>,
    cards: Query<Entity, With<CardRoot>>,
    mut next_section: ResMut<NextState<Sections>>,
) {
    // Only the latest request of a frame counts.
    let Some(SceneTransition(name)) = requests.read().last() else {
        return;
    };
    let Some(story) = story else {
        error!("No story loaded, cannot open scene `{name}`");
        return;
    };

    let (entry, mut flow) = match open_scene(&story, name) {
        Ok(opened) => opened,
        Err(err) => {
            error!("Scene transition failed: {err}");
            return;
        }
    };

    info!("Loading scene `{name}`");
    flow.start();
    // Replacing the resource swaps the whole flow in one step.
    commands.insert_resource(ActiveFlow {
        scene: name.clone(),
        flow,
    });
    next_section.set(entry.section());

    if let Some(title) = entry.title() {
        for card in &cards {
            commands.entity(card).despawn();
        }
        spawn_card(&mut commands, title);
    }
}

fn open_scene<'a>(
    story: &'a StoryBook,
    name: &str,
) -> Result<(&'a SceneEntry, Flow), FlowError> {
    if name.trim().is_empty() {
        return Err(FlowError::MissingSceneName);
    }
    Ok((story.scene(name)?, story.build_flow(name)?))
}

fn spawn_card(commands: &mut Commands, title: &str) {
    commands.insert_resource(CardTimer(0.0));

    commands
        .spawn((
            CardRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                position_type: PositionType::Absolute,
                ..default()
            },
            BackgroundColor(Color::BLACK),
            GlobalZIndex(100),
        ))
        .with_children(|parent| {
            parent.spawn((
                CardText,
                Text::new(title),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 1.0, 1.0, 0.0)),
            ));
        });
}

fn fade_card(
    mut commands: Commands,
    time: Res<Time>,
    mut timer: Option<ResMut<CardTimer>>,
    roots: Query<Entity, With<CardRoot>>,
    mut texts: Query<&mut TextColor, With<CardText>>,
    mut backgrounds: Query<&mut BackgroundColor, With<CardRoot>>,
) {
    let Some(timer) = timer.as_mut() else {
        return;
    };

    timer.0 += time.delta_secs();
    let t = timer.0;

    if t >= TOTAL {
        for entity in &roots {
            commands.entity(entity).despawn();
        }
        commands.remove_resource::<CardTimer>();
        return;
    }

    let (text_alpha, bg_alpha) = card_alpha(t);
    for mut color in &mut texts {
        color.0 = Color::srgba(1.0, 1.0, 1.0, text_alpha);
    }
    for mut bg in &mut backgrounds {
        bg.0 = Color::srgba(0.0, 0.0, 0.0, bg_alpha);
    }
}

/// Text and background alpha `t` seconds into the card.
fn card_alpha(t: f32) -> (f32, f32) {
    if t < FADE_IN {
        // Text fades in over an opaque background.
        (t / FADE_IN, 1.0)
    } else if t < FADE_IN + HOLD {
        (1.0, 1.0)
    } else {
        let fade = 1.0 - (t - FADE_IN - HOLD) / FADE_OUT;
        (fade, fade)
    }
}
