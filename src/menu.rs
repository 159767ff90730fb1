// Main menu

use bevy::prelude::*;

use crate::sections::{BadEndingCounter, Sections};
use crate::story::StoryBook;
use crate::transition::SceneTransition;

pub struct MenuPlugin;

impl Plugin for MenuPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Sections::Menu), setup_menu)
            .add_systems(
                Update,
                (button_visuals, button_actions).run_if(in_state(Sections::Menu)),
            );
    }
}

pub const NORMAL_BUTTON: Color = Color::srgb(0.15, 0.15, 0.15);
pub const HOVERED_BUTTON: Color = Color::srgb(0.25, 0.25, 0.25);
pub const PRESSED_BUTTON: Color = Color::srgb(0.35, 0.35, 0.35);
const IDLE_BORDER: Color = Color::srgba(1.0, 1.0, 1.0, 0.3);

#[derive(Component)]
enum MenuButton {
    Start,
    #[cfg(not(target_arch = "wasm32"))]
    Exit,
}

fn setup_menu(mut commands: Commands, story: Option<Res<StoryBook>>) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(24.0),
                ..default()
            },
            DespawnOnExit(Sections::Menu),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Info Novel"),
                TextFont {
                    font_size: 64.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    margin: UiRect::bottom(Val::Px(32.0)),
                    ..default()
                },
            ));

            if story.is_some() {
                spawn_button(parent, "Start", MenuButton::Start);
            } else {
                parent.spawn((
                    Text::new("The story could not be loaded"),
                    TextFont {
                        font_size: 20.0,
                        ..default()
                    },
                    TextColor(Color::srgb(0.9, 0.4, 0.4)),
                ));
            }

            #[cfg(not(target_arch = "wasm32"))]
            spawn_button(parent, "Exit", MenuButton::Exit);
        });
}

/// A labelled button carrying `marker`, styled like every other button in the game.
pub fn spawn_button(parent: &mut ChildSpawnerCommands, label: &str, marker: impl Component) {
    parent
        .spawn((
            marker,
            Button,
            Node {
                min_width: Val::Px(200.0),
                height: Val::Px(50.0),
                padding: UiRect::horizontal(Val::Px(12.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BorderColor::all(IDLE_BORDER),
            BackgroundColor(NORMAL_BUTTON),
        ))
        .with_children(|btn| {
            btn.spawn((
                Text::new(label),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

/// Border for a button in the given interaction state.
pub fn border_for(interaction: Interaction) -> BorderColor {
    match interaction {
        Interaction::None => BorderColor::all(IDLE_BORDER),
        Interaction::Hovered | Interaction::Pressed => BorderColor::all(Color::WHITE),
    }
}

fn button_visuals(
    mut query: Query<
        (&Interaction, &mut BackgroundColor, &mut BorderColor),
        (Changed<Interaction>, With<MenuButton>),
    >,
) {
    for (interaction, mut bg, mut border) in &mut query {
        *bg = match *interaction {
            Interaction::Pressed => PRESSED_BUTTON.into(),
            Interaction::Hovered => HOVERED_BUTTON.into(),
            Interaction::None => NORMAL_BUTTON.into(),
        };
        *border = border_for(*interaction);
    }
}

fn button_actions(
    query: Query<(&Interaction, &MenuButton), Changed<Interaction>>,
    story: Option<Res<StoryBook>>,
    mut counter: ResMut<BadEndingCounter>,
    mut transitions: MessageWriter<SceneTransition>,
    #[cfg(not(target_arch = "wasm32"))] mut exit: MessageWriter<AppExit>,
) {
    for (interaction, button) in &query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match button {
            MenuButton::Start => {
                let Some(story) = story.as_ref() else {
                    error!("No story loaded, cannot start");
                    continue;
                };
                // A new playthrough starts with a clean record.
                counter.reset();
                transitions.write(SceneTransition(story.first_scene().to_string()));
            }
            #[cfg(not(target_arch = "wasm32"))]
            MenuButton::Exit => {
                exit.write(AppExit::Success);
            }
        }
    }
}
