/// Game sections and shared plot state.
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum Sections {
    #[default]
    Menu,
    Plot,
    Ending,
}

/// Counts bad outcomes across the whole playthrough. Survives section and
/// scene transitions and is only cleared by an explicit `reset`.
///
/// Registered with `init_resource`, so the first instance inserted is the one
/// kept; later registrations leave it untouched.
#[derive(Resource, Debug, Default)]
pub struct BadEndingCounter {
    count: u32,
}

impl BadEndingCounter {
    pub fn increment(&mut self) {
        self.count += 1;
        info!("Bad ending counter increased to {}", self.count);
    }

    pub fn reset(&mut self) {
        self.count = 0;
        debug!("Bad ending counter reset");
    }

    pub fn value(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_are_monotonic_until_reset() {
        let mut counter = BadEndingCounter::default();
        let mut last = counter.value();
        for _ in 0..5 {
            counter.increment();
            assert!(counter.value() > last);
            last = counter.value();
        }
        assert_eq!(counter.value(), 5);

        counter.reset();
        assert_eq!(counter.value(), 0);

        counter.increment();
        assert_eq!(counter.value(), 1);
    }

    #[test]
    fn first_registered_counter_wins() {
        let mut app = App::new();
        app.init_resource::<BadEndingCounter>();
        app.world_mut()
            .resource_mut::<BadEndingCounter>()
            .increment();

        // A second registration, e.g. from another plugin, must not replace it.
        app.init_resource::<BadEndingCounter>();
        assert_eq!(app.world().resource::<BadEndingCounter>().value(), 1);
    }
}
