// Drives the flow of the scene on screen: player input in, scene changes out.

use bevy::prelude::*;

use crate::flow::{Flow, FlowRequest};
use crate::sections::{BadEndingCounter, Sections};
use crate::transition::SceneTransition;

pub struct PlotPlugin;

impl Plugin for PlotPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Sections::Menu), close_flow).add_systems(
            Update,
            (advance_on_input, tick_flow)
                .chain()
                .run_if(resource_exists::<ActiveFlow>)
                .run_if(in_state(Sections::Plot).or(in_state(Sections::Ending))),
        );
    }
}

/// The flow of the scene currently loaded, replaced whole on every scene change.
#[derive(Resource, Debug)]
pub struct ActiveFlow {
    pub scene: String,
    pub flow: Flow,
}

fn advance_on_input(
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    touches: Res<Touches>,
    mut active: ResMut<ActiveFlow>,
) {
    let pressed = mouse.just_pressed(MouseButton::Left)
        || touches.any_just_pressed()
        || keyboard.any_just_pressed([KeyCode::Space, KeyCode::Enter]);
    if pressed {
        active.flow.advance_or_skip();
    }
}

fn tick_flow(
    time: Res<Time>,
    mut active: ResMut<ActiveFlow>,
    mut counter: Option<ResMut<BadEndingCounter>>,
    mut transitions: MessageWriter<SceneTransition>,
    mut exit: MessageWriter<AppExit>,
) {
    match active.flow.tick(time.delta_secs(), counter.as_deref_mut()) {
        Some(FlowRequest::LoadScene(name)) => {
            transitions.write(SceneTransition(name));
        }
        Some(FlowRequest::Quit) => {
            info!("Story finished");
            exit.write(AppExit::Success);
        }
        None => {}
    }
}

fn close_flow(mut commands: Commands) {
    commands.remove_resource::<ActiveFlow>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::StoryBook;
    use crate::transition::TransitionPlugin;
    use bevy::state::app::StatesPlugin;

    // Nothing to read or answer, so the story runs through on its own.
    const QUIET: &str = r#"{
        "first_scene": "quiet",
        "characters": [{ "name": "Tutor" }],
        "scenes": {
            "quiet": { "type": "plot", "next_scene": "finale" },
            "finale": { "type": "ending", "first_scene": "quiet" }
        }
    }"#;

    fn app(counter: u32) -> App {
        let mut story_counter = BadEndingCounter::default();
        for _ in 0..counter {
            story_counter.increment();
        }

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .init_state::<Sections>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<Touches>()
            .insert_resource(story_counter)
            .insert_resource(StoryBook::from_json(QUIET).unwrap())
            .add_plugins((TransitionPlugin, PlotPlugin));
        app
    }

    fn run_until_exit(app: &mut App) -> Option<AppExit> {
        for _ in 0..20 {
            app.update();
            if let Some(exit) = app.should_exit() {
                return Some(exit);
            }
        }
        None
    }

    #[test]
    fn quiet_story_reaches_the_finale_and_quits() {
        let mut app = app(0);
        app.world_mut()
            .write_message(SceneTransition("quiet".into()));

        assert_eq!(run_until_exit(&mut app), Some(AppExit::Success));
        assert_eq!(app.world().resource::<ActiveFlow>().scene, "finale");
        assert_eq!(
            app.world().resource::<State<Sections>>().get(),
            &Sections::Ending
        );
    }

    #[test]
    fn bad_ending_loops_back_to_first_scene() {
        let mut app = app(3);
        app.world_mut()
            .write_message(SceneTransition("finale".into()));

        let mut looped = false;
        for _ in 0..10 {
            app.update();
            if app.world().resource::<BadEndingCounter>().value() == 0 {
                looped = true;
                break;
            }
        }
        assert!(looped);
        assert!(app.should_exit().is_none());
    }

    #[test]
    fn space_skips_typing() {
        let story = StoryBook::from_json(
            r#"{
                "first_scene": "talk",
                "typing_interval": 10.0,
                "characters": [{ "name": "Tutor" }],
                "scenes": {
                    "talk": {
                        "type": "ending",
                        "intro": [{ "speaker": 0, "text": "A long line" }]
                    }
                }
            }"#,
        )
        .unwrap();
        let mut flow = story.build_flow("talk").unwrap();
        flow.start();

        let mut app = app(0);
        app.insert_resource(ActiveFlow {
            scene: "talk".into(),
            flow,
        });
        app.world_mut()
            .resource_mut::<NextState<Sections>>()
            .set(Sections::Ending);
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Space);
        app.update();

        let active = app.world().resource::<ActiveFlow>();
        assert_eq!(
            active.flow.dialogue().map(|d| d.displayed_text()),
            Some("A long line")
        );
    }
}
