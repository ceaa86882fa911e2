//! Road polylines and the traveling pulse drawn over them.

use bevy::math::{Vec2, Vec3};

use crate::config::{OVERLAY_DASH_SPEED, OVERLAY_FADE, OVERLAY_MIN_LENGTH};
use crate::features::Properties;
use crate::terrain::GroundSampler;

const OVERLAY_FADE_IN: f32 = 0.005;
const OVERLAY_FADE_OUT: f32 = 0.007;

/// Total length of a polyline, summed segment by segment.
pub fn polyline_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// The leading `length` units of a polyline, cut mid-segment if needed.
pub fn polyline_prefix(points: &[Vec3], length: f32) -> Vec<Vec3> {
    let mut out = Vec::new();
    let Some(first) = points.first() else {
        return out;
    };
    out.push(*first);
    let mut remaining = length;
    for w in points.windows(2) {
        if remaining <= 0.0 {
            break;
        }
        let segment = w[0].distance(w[1]);
        if segment <= remaining {
            out.push(w[1]);
            remaining -= segment;
        } else {
            out.push(w[0].lerp(w[1], remaining / segment));
            break;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadPolyline {
    /// Ground positions (world X, Z) of the vertices.
    pub ground: Vec<Vec2>,
    /// Draped world positions.
    pub points: Vec<Vec3>,
    pub properties: Properties,
    pub length: f32,
}

impl RoadPolyline {
    pub fn new(ground: Vec<Vec2>, properties: Properties, sampler: &dyn GroundSampler) -> Self {
        let mut road = Self {
            ground,
            points: Vec::new(),
            properties,
            length: 0.0,
        };
        road.drape(sampler);
        road
    }

    /// Recomputes vertex heights from `sampler` (zero where the probe misses).
    pub fn drape(&mut self, sampler: &dyn GroundSampler) {
        self.points = self
            .ground
            .iter()
            .map(|g| Vec3::new(g.x, sampler.ground_height_at(g.x, g.y).unwrap_or(0.0), g.y))
            .collect();
        self.length = polyline_length(&self.points);
    }
}

/// Dashed pulse that runs along one road.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadOverlay {
    /// Index of the road in the scene's road list.
    pub road: usize,
    /// Reference length the dash runs up to.
    pub length: f32,
    pub dash: f32,
    pub opacity: f32,
}

impl RoadOverlay {
    /// Only roads longer than [`OVERLAY_MIN_LENGTH`] get an overlay.
    pub fn for_road(road: usize, polyline: &RoadPolyline) -> Option<Self> {
        (polyline.length > OVERLAY_MIN_LENGTH).then(|| Self {
            road,
            length: polyline.length,
            dash: 0.0,
            opacity: 1.0,
        })
    }

    /// Advances the pulse. When it runs past the end of the road it restarts
    /// at full opacity; otherwise it fades. With `animate` off the dash stays
    /// put and only the fade runs.
    pub fn step(&mut self, animate: bool) {
        if animate && self.dash > self.length {
            self.dash = 0.0;
            self.opacity = 1.0;
            return;
        }
        if animate {
            self.dash += OVERLAY_DASH_SPEED;
        }
        self.opacity = (self.opacity - OVERLAY_FADE).max(0.0);
    }

    /// Opacity ramp tied to the building animation.
    pub fn fade_with_buildings(&mut self, buildings_growing: bool, buildings_degrowing: bool, animate: bool) {
        if buildings_degrowing {
            self.opacity = (self.opacity - OVERLAY_FADE_OUT).max(0.0);
        } else if buildings_growing && animate && self.opacity < 1.0 {
            self.opacity = (self.opacity + OVERLAY_FADE_IN).min(1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::NoGround;

    fn straight(len: f32) -> RoadPolyline {
        RoadPolyline::new(vec![Vec2::ZERO, Vec2::new(len, 0.0)], Properties::new(), &NoGround)
    }

    #[test]
    fn test_no_overlay_at_or_below_threshold() {
        assert!(RoadOverlay::for_road(0, &straight(0.5)).is_none());
        assert!(RoadOverlay::for_road(0, &straight(0.8)).is_none());
    }

    #[test]
    fn test_overlay_records_reference_length() {
        let road = RoadPolyline::new(
            vec![Vec2::ZERO, Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.6)],
            Properties::new(),
            &NoGround,
        );
        let overlay = RoadOverlay::for_road(3, &road).unwrap();
        assert_eq!(overlay.road, 3);
        assert!((overlay.length - 1.1).abs() < 1e-6);
        assert_eq!(overlay.length, road.length);
    }

    #[test]
    fn test_length_includes_height_changes() {
        let sampler = |x: f32, _z: f32| -> Option<f32> { (x > 0.5).then_some(0.75) };
        let road = RoadPolyline::new(vec![Vec2::ZERO, Vec2::new(1.0, 0.0)], Properties::new(), &sampler);
        assert!((road.length - 1.25).abs() < 1e-6);
        assert_eq!(road.points[1].y, 0.75);
    }

    #[test]
    fn test_dash_resets_past_end() {
        let mut o = RoadOverlay::for_road(0, &straight(1.0)).unwrap();
        o.opacity = 0.3;
        o.dash = 1.001;
        o.step(true);
        assert_eq!(o.dash, 0.0);
        assert_eq!(o.opacity, 1.0);
    }

    #[test]
    fn test_dash_advances_and_fades() {
        let mut o = RoadOverlay::for_road(0, &straight(1.0)).unwrap();
        o.step(true);
        assert!((o.dash - OVERLAY_DASH_SPEED).abs() < 1e-9);
        assert!((o.opacity - (1.0 - OVERLAY_FADE)).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_freezes_dash_but_fades() {
        let mut o = RoadOverlay::for_road(0, &straight(1.0)).unwrap();
        o.dash = 2.0;
        o.step(false);
        assert_eq!(o.dash, 2.0);
        assert!(o.opacity < 1.0);
        for _ in 0..1000 {
            o.step(false);
        }
        assert_eq!(o.opacity, 0.0);
    }

    #[test]
    fn test_prefix_cuts_mid_segment() {
        let pts = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)];
        let p = polyline_prefix(&pts, 1.5);
        assert_eq!(p.len(), 3);
        assert!((p[2] - Vec3::new(1.0, 0.0, 0.5)).length() < 1e-6);
        assert_eq!(polyline_prefix(&pts, 0.0), vec![Vec3::ZERO]);
    }

    #[test]
    fn test_fade_with_buildings() {
        let mut o = RoadOverlay::for_road(0, &straight(1.0)).unwrap();
        o.opacity = 0.5;
        o.fade_with_buildings(true, false, false);
        assert_eq!(o.opacity, 0.5);
        o.fade_with_buildings(true, false, true);
        assert!((o.opacity - 0.505).abs() < 1e-6);
        o.fade_with_buildings(false, true, true);
        assert!((o.opacity - 0.498).abs() < 1e-6);
    }
}
