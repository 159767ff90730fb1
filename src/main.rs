// Main
mod dialogue;
mod error;
mod flow;
mod hud;
mod menu;
mod plot;
mod quiz;
mod sections;
mod story;
mod transition;

use bevy::prelude::*;
use hud::HudPlugin;
use menu::MenuPlugin;
use plot::PlotPlugin;
use sections::{BadEndingCounter, Sections};
use story::StoryPlugin;
use transition::TransitionPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Info Novel".into(),
                ..default()
            }),
            ..default()
        }))
        .init_state::<Sections>()
        .init_resource::<BadEndingCounter>()
        .add_systems(Startup, spawn_camera)
        .add_plugins((
            StoryPlugin,
            MenuPlugin,
            PlotPlugin,
            HudPlugin,
            TransitionPlugin,
        ))
        .run();
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
