//! Ray-cast classifier: turns object chords along one mesh line into
//! ordered intersection records.

use std::cmp::Ordering;

use nalgebra::Point3;

use crate::geometry::{Axis, Ray, SolidObject};

/// Geometry of one mesh line: the ray starts at the domain's lower bound
/// along `axis` and grid point `i` sits at parameter `i * spacing`.
#[derive(Debug, Clone, Copy)]
pub struct LineFrame {
    pub axis: Axis,
    pub origin: Point3<f64>,
    pub spacing: f64,
    pub len: usize,
}

impl LineFrame {
    /// Ray parameter of the last grid point.
    pub fn length(&self) -> f64 {
        self.len.saturating_sub(1) as f64 * self.spacing
    }

    pub fn ray(&self) -> Ray {
        Ray::along(self.origin, self.axis)
    }

    pub fn param(&self, index: usize) -> f64 {
        index as f64 * self.spacing
    }
}

/// A surface crossing resolved against the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Grid index of the solid-side point next to the crossing.
    pub solid_coord: usize,
    /// True if the ray arrives from outside the object (entering).
    pub ray_outside: bool,
    pub shape_id: usize,
    /// Fluid-side distance from the crossing to the nearest fluid point, in
    /// units of the spacing.
    pub psi: f64,
    pub t: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineCast {
    /// Number of objects already containing the first grid point.
    pub initial_depth: usize,
    pub records: Vec<Intersection>,
}

/// Intersects every object with the line and returns the sorted records.
pub fn cast_line(frame: &LineFrame, objects: &[SolidObject]) -> LineCast {
    let ray = frame.ray();
    let length = frame.length();
    let h = frame.spacing;
    let mut cast = LineCast::default();

    for object in objects {
        let Some((t_in, t_out)) = object.shape.chord(&ray) else {
            continue;
        };
        if t_out < 0.0 || t_in > length {
            continue;
        }

        if t_in <= 0.0 {
            cast.initial_depth += 1;
        } else {
            let first = first_at_or_after(frame, t_in);
            let psi = (t_in - frame.param(first - 1)) / h;
            cast.records.push(Intersection {
                solid_coord: first,
                ray_outside: true,
                shape_id: object.id,
                psi: psi.clamp(0.0, 1.0),
                t: t_in,
            });
        }

        if t_out < length {
            let last = last_at_or_before(frame, t_out);
            let psi = (frame.param(last + 1) - t_out) / h;
            cast.records.push(Intersection {
                solid_coord: last,
                ray_outside: false,
                shape_id: object.id,
                psi: psi.clamp(0.0, 1.0),
                t: t_out,
            });
        }
    }

    cast.records.sort_by(compare_records);
    log::trace!(
        "line {:?} at {:?}: depth {}, {} crossings",
        frame.axis,
        frame.origin,
        cast.initial_depth,
        cast.records.len()
    );
    cast
}

/// Orders by parameter; on ties entering crossings come first so touching
/// objects merge into one solid run.
fn compare_records(a: &Intersection, b: &Intersection) -> Ordering {
    a.t.total_cmp(&b.t)
        .then(b.ray_outside.cmp(&a.ray_outside))
        .then(a.shape_id.cmp(&b.shape_id))
}

// Smallest i with i*h >= t, for 0 < t <= length.
fn first_at_or_after(frame: &LineFrame, t: f64) -> usize {
    let max = frame.len - 1;
    let mut i = ((t / frame.spacing).ceil() as usize).clamp(1, max);
    while i > 1 && frame.param(i - 1) >= t {
        i -= 1;
    }
    while i < max && frame.param(i) < t {
        i += 1;
    }
    i
}

// Largest i with i*h <= t, for 0 <= t < length.
fn last_at_or_before(frame: &LineFrame, t: f64) -> usize {
    let max = frame.len - 1;
    let mut i = ((t / frame.spacing).floor() as usize).min(max - 1);
    while i + 1 < max && frame.param(i + 1) <= t {
        i += 1;
    }
    while i > 0 && frame.param(i) > t {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rectangle, Shape};
    use crate::stencil::BoundaryKind;

    fn frame(len: usize, spacing: f64) -> LineFrame {
        LineFrame {
            axis: Axis::X,
            origin: Point3::origin(),
            spacing,
            len,
        }
    }

    fn sphere(id: usize, x: f64, radius: f64) -> SolidObject {
        SolidObject::sphere(id, Point3::new(x, 0.0, 0.0), radius).expect("valid sphere")
    }

    #[test]
    fn empty_object_list_gives_no_records() {
        let cast = cast_line(&frame(11, 0.1), &[]);
        assert_eq!(cast, LineCast::default());
    }

    #[test]
    fn sphere_crossing_records_solid_points_and_psi() {
        // Chord [0.33, 0.67] on a grid with spacing 0.1.
        let cast = cast_line(&frame(11, 0.1), &[sphere(7, 0.5, 0.17)]);
        assert_eq!(cast.initial_depth, 0);
        assert_eq!(cast.records.len(), 2);

        let enter = cast.records[0];
        assert!(enter.ray_outside);
        assert_eq!(enter.solid_coord, 4);
        assert_eq!(enter.shape_id, 7);
        assert!((enter.psi - 0.3).abs() < 1e-9);

        let exit = cast.records[1];
        assert!(!exit.ray_outside);
        assert_eq!(exit.solid_coord, 6);
        assert!((exit.psi - 0.3).abs() < 1e-9);
    }

    #[test]
    fn chords_outside_the_line_are_ignored() {
        let objects = [sphere(1, -1.0, 0.5), sphere(2, 3.0, 0.5)];
        let cast = cast_line(&frame(11, 0.1), &objects);
        assert_eq!(cast.initial_depth, 0);
        assert!(cast.records.is_empty());
    }

    #[test]
    fn line_starting_inside_counts_depth() {
        let cast = cast_line(&frame(11, 0.1), &[sphere(1, 0.0, 0.25)]);
        assert_eq!(cast.initial_depth, 1);
        assert_eq!(cast.records.len(), 1);
        assert!(!cast.records[0].ray_outside);
        assert_eq!(cast.records[0].solid_coord, 2);
        assert!((cast.records[0].psi - 0.5).abs() < 1e-9);
    }

    #[test]
    fn line_ending_inside_has_no_exit_record() {
        let cast = cast_line(&frame(11, 0.1), &[sphere(1, 1.0, 0.25)]);
        assert_eq!(cast.initial_depth, 0);
        assert_eq!(cast.records.len(), 1);
        assert!(cast.records[0].ray_outside);
        assert_eq!(cast.records[0].solid_coord, 8);
    }

    #[test]
    fn sliver_between_grid_points() {
        // Chord [0.42, 0.48] holds no grid point.
        let cast = cast_line(&frame(11, 0.1), &[sphere(1, 0.45, 0.03)]);
        let [enter, exit] = [cast.records[0], cast.records[1]];
        assert_eq!(enter.solid_coord, 5);
        assert_eq!(exit.solid_coord, 4);
        assert!((enter.psi - 0.2).abs() < 1e-9);
        assert!((exit.psi - 0.2).abs() < 1e-9);
    }

    #[test]
    fn records_sorted_with_entering_first_on_ties() {
        let left = SolidObject::new(
            4,
            Shape::Rectangle(Rectangle::axis_aligned(
                Point3::new(0.25, -1.0, -1.0),
                Point3::new(0.5, 1.0, 1.0),
            )),
            BoundaryKind::Dirichlet,
        )
        .expect("valid box");
        let right = SolidObject::new(
            2,
            Shape::Rectangle(Rectangle::axis_aligned(
                Point3::new(0.5, -1.0, -1.0),
                Point3::new(0.75, 1.0, 1.0),
            )),
            BoundaryKind::Dirichlet,
        )
        .expect("valid box");
        let cast = cast_line(&frame(11, 0.1), &[left, right]);
        let order: Vec<(bool, usize)> = cast
            .records
            .iter()
            .map(|r| (r.ray_outside, r.shape_id))
            .collect();
        assert_eq!(order, vec![(true, 4), (true, 2), (false, 4), (false, 2)]);
        assert!(cast.records.windows(2).all(|w| w[0].t <= w[1].t));
    }

    #[test]
    fn psi_stays_in_unit_interval() {
        let objects: Vec<SolidObject> = (0..20)
            .map(|k| sphere(k, 0.05 * k as f64, 0.011 + 0.003 * k as f64))
            .collect();
        let cast = cast_line(&frame(23, 1.0 / 22.0), &objects);
        assert!(cast
            .records
            .iter()
            .all(|r| (0.0..=1.0).contains(&r.psi) && r.solid_coord < 23));
    }
}
