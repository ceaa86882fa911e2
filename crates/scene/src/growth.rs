//! Grow/degrow animation for buildings and trees.
//!
//! Each category runs an explicit `Idle / Growing / Degrowing` machine over a
//! progress scalar in [0, 1]. Progress drives the vertical scale; opacity
//! ramps separately toward its target. The step rate eases with progress.

use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

const BUILDING_RATE: f32 = 0.015;
const BUILDING_EASE: f32 = 80.0;
const BUILDING_FADE_IN: f32 = 0.01;
const BUILDING_FADE_OUT: f32 = 0.0075;

const TREE_RATE: f32 = 0.0075;
const TREE_EASE: f32 = 200.0;
const TREE_FADE: f32 = 0.007;
/// Trees never shrink below this fraction of full height while fading out.
const TREE_MIN_SCALE: f32 = 0.75;
pub const TREE_LEAVES_OPACITY: f32 = 0.4;
pub const TREE_TRUNK_OPACITY: f32 = 0.15;

/// Building opacity headroom added on top of `1 - transparency`.
const TRANSPARENCY_BIAS: f32 = 0.01;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPhase {
    #[default]
    Idle,
    Growing,
    Degrowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrowthState {
    phase: GrowthPhase,
    progress: f32,
}

impl GrowthState {
    pub fn phase(&self) -> GrowthPhase {
        self.phase
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_growing(&self) -> bool {
        self.phase == GrowthPhase::Growing
    }

    pub fn is_degrowing(&self) -> bool {
        self.phase == GrowthPhase::Degrowing
    }

    /// `Idle | Degrowing -> Growing`. Progress continues from where it is.
    pub fn request_show(&mut self) {
        self.phase = GrowthPhase::Growing;
    }

    /// `Idle | Growing -> Degrowing`.
    pub fn request_hide(&mut self) {
        self.phase = GrowthPhase::Degrowing;
    }

    /// Restarts the animation from zero height.
    pub fn restart(&mut self) {
        self.progress = 0.0;
        self.phase = GrowthPhase::Growing;
    }

    fn advance(&mut self, delta: f32) {
        self.progress = (self.progress + delta).clamp(0.0, 1.0);
    }
}

fn ramp(value: f32, toward: f32, step: f32) -> f32 {
    if value < toward {
        (value + step).min(toward.max(value))
    } else {
        (value - step).max(toward.min(value))
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingGrowth {
    pub state: GrowthState,
    pub opacity: f32,
    /// Opacity reached when fully grown, `1 - transparency`.
    pub target_opacity: f32,
}

impl Default for BuildingGrowth {
    fn default() -> Self {
        Self {
            state: GrowthState::default(),
            opacity: 0.0,
            target_opacity: 1.0,
        }
    }
}

impl BuildingGrowth {
    /// Vertical scale of the building batch.
    pub fn scale(&self) -> f32 {
        self.state.progress
    }

    /// Sets building transparency in [0, 1] and replays the growth.
    pub fn set_transparency(&mut self, transparency: f32) {
        let t = transparency.clamp(0.0, 1.0);
        self.target_opacity = 1.0 - t;
        self.opacity = (1.0 - t + TRANSPARENCY_BIAS).min(1.0);
        self.state.restart();
    }

    /// One animation step.
    pub fn step(&mut self) {
        let rate = BUILDING_RATE - self.state.progress / BUILDING_EASE;
        match self.state.phase {
            GrowthPhase::Growing => {
                self.state.advance(rate);
                if self.opacity < self.target_opacity {
                    self.opacity = (self.opacity + BUILDING_FADE_IN).min(1.0);
                }
                if self.state.progress >= 1.0 && self.opacity >= self.target_opacity {
                    self.state.phase = GrowthPhase::Idle;
                }
            }
            GrowthPhase::Degrowing => {
                self.state.advance(-rate);
                self.opacity = (self.opacity - BUILDING_FADE_OUT).max(0.0);
                if self.state.progress <= 0.0 {
                    self.state.phase = GrowthPhase::Idle;
                }
            }
            GrowthPhase::Idle => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Trees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TreeGrowth {
    pub state: GrowthState,
    pub leaves_opacity: f32,
    pub trunk_opacity: f32,
}

impl TreeGrowth {
    /// Vertical scale of the tree instances. While fading out the trees keep
    /// most of their height so they dissolve rather than sink.
    pub fn scale(&self, fading_out: bool) -> f32 {
        if fading_out {
            self.state.progress.max(TREE_MIN_SCALE)
        } else {
            self.state.progress
        }
    }

    /// One animation step. Trees follow the building animation: they shrink
    /// whenever buildings shrink, and grow with the buildings while enabled.
    /// Returns whether the trees are fading out this step.
    pub fn step(&mut self, buildings: GrowthPhase, enabled: bool) -> bool {
        let fading_out =
            buildings == GrowthPhase::Degrowing || self.state.phase == GrowthPhase::Degrowing;
        let fading_in = !fading_out
            && ((buildings == GrowthPhase::Growing && enabled)
                || self.state.phase == GrowthPhase::Growing);
        let rate = TREE_RATE - self.state.progress / TREE_EASE;

        if fading_out {
            self.state.advance(-rate);
            self.leaves_opacity = ramp(self.leaves_opacity, 0.0, TREE_FADE);
            self.trunk_opacity = ramp(self.trunk_opacity, 0.0, TREE_FADE);
            if self.state.phase == GrowthPhase::Degrowing && self.state.progress <= 0.0 {
                self.state.phase = GrowthPhase::Idle;
            }
        } else if fading_in {
            self.state.advance(rate);
            self.leaves_opacity = ramp(self.leaves_opacity, TREE_LEAVES_OPACITY, TREE_FADE);
            self.trunk_opacity = ramp(self.trunk_opacity, TREE_TRUNK_OPACITY, TREE_FADE);
            if self.state.phase == GrowthPhase::Growing
                && self.state.progress >= 1.0
                && self.leaves_opacity >= TREE_LEAVES_OPACITY
                && self.trunk_opacity >= TREE_TRUNK_OPACITY
            {
                self.state.phase = GrowthPhase::Idle;
            }
        }
        fading_out
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// Animation state shared by the scene systems and the renderer.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Growth {
    pub buildings: BuildingGrowth,
    pub trees: TreeGrowth,
    /// Whether the trees faded out on the last step.
    pub trees_fading_out: bool,
    /// Opacity of the shared road material.
    pub road_opacity: f32,
}

impl Default for Growth {
    fn default() -> Self {
        Self {
            buildings: BuildingGrowth::default(),
            trees: TreeGrowth::default(),
            trees_fading_out: false,
            road_opacity: 0.0,
        }
    }
}

impl Growth {
    pub fn tree_scale(&self) -> f32 {
        self.trees.scale(self.trees_fading_out)
    }

    /// Zero height and opacity for a freshly composed scene. The chosen
    /// transparency survives.
    pub fn reset_for_new_scene(&mut self) {
        let target_opacity = self.buildings.target_opacity;
        *self = Self::default();
        self.buildings.target_opacity = target_opacity;
    }
}
