//! Circular orbit resolution over the parsed body forest.
//!
//! Every body sits at `distance` from its parent, rotated by
//! `offset + 2π · time / period`. Positions are recomputed on demand and
//! never cached, since the time changes continuously.

use std::f64::consts::TAU;

use glam::DVec2;

use crate::core::point::{Bounds, PointExt};
use crate::data::scheme::{OrbitalBody, System, SystemObject};

/// One body placed at a given time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject<'a> {
    pub object: &'a SystemObject,
    /// Absolute position in the system frame.
    pub position: DVec2,
    /// Absolute position of the parent (the orbit's center).
    pub orbital_center: DVec2,
    pub orbital_radius: f64,
    /// 0 for bodies orbiting the system barycenter.
    pub depth: usize,
}

/// All bodies of a system at one instant, in depth-first order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectsAndPositions<'a> {
    /// Bounds of every position, including the barycenter.
    pub bounds: Bounds,
    pub objects: Vec<PlacedObject<'a>>,
}

/// Orbital angle of `body` at `time`, in radians.
///
/// The time is reduced modulo the period first so huge simulation times
/// keep full precision.
pub fn orbit_angle(body: &OrbitalBody, time: f64) -> f64 {
    body.offset + TAU * (time.rem_euclid(body.period) / body.period)
}

/// Resolve the absolute position of every body in `objects` at `time`.
pub fn objects_and_positions(objects: &[SystemObject], time: f64) -> ObjectsAndPositions<'_> {
    let mut result = ObjectsAndPositions {
        bounds: Bounds::default(),
        objects: Vec::new(),
    };
    place(objects, DVec2::ZERO, 0, time, &mut result);
    result
}

fn place<'a>(
    objects: &'a [SystemObject],
    parent: DVec2,
    depth: usize,
    time: f64,
    out: &mut ObjectsAndPositions<'a>,
) {
    for object in objects {
        let body = object.body();
        let mut position = DVec2::new(body.distance, 0.0);
        position.rotate_around(orbit_angle(body, time), DVec2::ZERO);
        position += parent;

        out.bounds.include(position);
        out.objects.push(PlacedObject {
            object,
            position,
            orbital_center: parent,
            orbital_radius: body.distance,
            depth,
        });
        place(&body.objects, position, depth + 1, time, out);
    }
}

impl System {
    /// Resolve every body of this system at `time`.
    pub fn objects_and_positions(&self, time: f64) -> ObjectsAndPositions<'_> {
        objects_and_positions(&self.objects, time)
    }

    /// Position of the planet called `name` at `time`.
    pub fn planet_position(&self, name: &str, time: f64) -> Option<DVec2> {
        self.objects_and_positions(time)
            .objects
            .iter()
            .find(|placed| placed.object.planet().is_some_and(|p| p.name == name))
            .map(|placed| placed.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::scheme::GameObject;

    fn body(distance: f64, offset: f64, period: f64, objects: Vec<SystemObject>) -> OrbitalBody {
        OrbitalBody {
            sprite: None,
            distance,
            offset,
            period,
            hazards: Vec::new(),
            objects,
        }
    }

    fn planet(name: &str, body: OrbitalBody) -> SystemObject {
        SystemObject::Planet {
            planet: GameObject {
                name: name.into(),
                display_name: name.into(),
                category: "planet".into(),
            },
            body,
        }
    }

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-6
    }

    fn star_and_planet() -> Vec<SystemObject> {
        vec![
            SystemObject::Generic(body(0.0, 0.0, 1.0, Vec::new())),
            planet("Earth", body(100.0, 0.0, 360.0, Vec::new())),
        ]
    }

    #[test]
    fn planet_quarter_period() {
        let objects = star_and_planet();
        let at0 = objects_and_positions(&objects, 0.0);
        assert!(close(at0.objects[1].position, DVec2::new(100.0, 0.0)));
        let at90 = objects_and_positions(&objects, 90.0);
        assert!(close(at90.objects[1].position, DVec2::new(0.0, 100.0)), "got {}", at90.objects[1].position);
        assert!(close(at90.objects[0].position, DVec2::ZERO));
    }

    #[test]
    fn deterministic_for_same_time() {
        let objects = star_and_planet();
        let a = objects_and_positions(&objects, 1_100_863.0);
        let b = objects_and_positions(&objects, 1_100_863.0);
        assert_eq!(a, b);
    }

    #[test]
    fn continuous_across_period_wrap() {
        let objects = star_and_planet();
        let before = objects_and_positions(&objects, 360.0 - 1e-6).objects[1].position;
        let after = objects_and_positions(&objects, 360.0 + 1e-6).objects[1].position;
        assert!((before - after).length() < 1e-3);
    }

    #[test]
    fn three_level_nesting_composes() {
        let moon = planet("Luna", body(10.0, 0.5, 27.0, Vec::new()));
        let earth = planet("Earth", body(100.0, 0.25, 365.0, vec![moon]));
        let star = SystemObject::Generic(body(20.0, 1.0, 50.0, vec![earth]));
        let objects = vec![star];
        let t = 123.4;
        let placed = objects_and_positions(&objects, t);
        assert_eq!(placed.objects.len(), 3);

        let mut expected = DVec2::ZERO;
        for (level, (d, off, per)) in [(20.0, 1.0, 50.0), (100.0, 0.25, 365.0), (10.0, 0.5, 27.0)]
            .into_iter()
            .enumerate()
        {
            let theta = off + TAU * (t.rem_euclid(per) / per);
            let parent = expected;
            expected = parent + d * DVec2::new(theta.cos(), theta.sin());
            let p = &placed.objects[level];
            assert_eq!(p.depth, level);
            assert!(close(p.orbital_center, parent));
            assert!(close(p.position, expected), "level {level}: {} vs {expected}", p.position);
            assert_eq!(p.orbital_radius, d);
        }
    }

    #[test]
    fn bounds_cover_origin_and_bodies() {
        let objects = star_and_planet();
        let placed = objects_and_positions(&objects, 180.0);
        assert!(placed.bounds.min.x <= -100.0 + 1e-6);
        assert!(placed.bounds.max.x >= 0.0);
    }

    #[test]
    fn finds_planet_position() {
        let objects = star_and_planet();
        let system = System {
            object: GameObject {
                name: "Sol".into(),
                display_name: "Sol".into(),
                category: "system".into(),
            },
            position: DVec2::ZERO,
            government: None,
            links: Vec::new(),
            belts: Vec::new(),
            jump_range: 100.0,
            haze: None,
            music: None,
            attributes: Vec::new(),
            inaccessible: false,
            hidden: false,
            shrouded: false,
            fleets: Vec::new(),
            raid_fleets: Vec::new(),
            hazards: Vec::new(),
            objects,
        };
        let pos = system.planet_position("Earth", 0.0).unwrap();
        assert!(close(pos, DVec2::new(100.0, 0.0)));
        assert!(system.planet_position("Mars", 0.0).is_none());
    }
}
