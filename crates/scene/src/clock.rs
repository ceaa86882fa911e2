use bevy::prelude::*;

use crate::config::WATER_TIME_STEP;

/// Animation time that only runs while the viewer is visible.
///
/// Hiding the window pauses the clock; elapsed time is frozen and picks up
/// exactly where it stopped once the window is visible again.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct AnimationClock {
    elapsed: f32,
    steps: u64,
    paused: bool,
    /// Time uniform fed to the animated water surface.
    pub water_time: f32,
}

impl AnimationClock {
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        !self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            info!("Animation paused at {:.3}s", self.elapsed);
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            info!("Animation resumed at {:.3}s", self.elapsed);
        }
        self.paused = false;
    }

    /// Accounts for one animation step of `dt` seconds. Ignored while paused.
    pub fn advance(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.elapsed += dt;
        self.steps += 1;
    }

    pub fn advance_water(&mut self) {
        self.water_time += WATER_TIME_STEP;
    }
}

/// Visibility of the viewer surface (window shown, hidden or minimized).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityChanged {
    pub visible: bool,
}

pub fn apply_visibility(mut events: EventReader<VisibilityChanged>, mut clock: ResMut<AnimationClock>) {
    for event in events.read() {
        if event.visible {
            clock.resume();
        } else {
            clock.pause();
        }
    }
}

pub fn clock_running(clock: Res<AnimationClock>) -> bool {
    clock.is_running()
}
