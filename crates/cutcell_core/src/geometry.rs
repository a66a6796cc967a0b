//! Closed-form solid primitives and their intersection with axis-aligned rays.
//!
//! Shapes form a closed set (`Shape`), each exposing the chord a ray cuts
//! through the solid together with containment tests. The ray-cast
//! classifier only ever needs the entry and exit parameters of that chord.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::MeshError;
use crate::stencil::BoundaryKind;

/// Cartesian direction of a mesh line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        v[self.index()] = 1.0;
        v
    }

    /// The two remaining axes as `(slow, fast)`, in x < y < z order.
    pub fn orthogonal(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

/// A ray with unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn along(origin: Point3<f64>, axis: Axis) -> Self {
        Self {
            origin,
            direction: axis.unit(),
        }
    }

    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// A crossing of a ray with a shape surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Parametric distance along the ray.
    pub t: f64,
    /// True when the surface normal opposes the ray, i.e. the ray enters the solid.
    pub entering: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    fn chord(&self, ray: &Ray) -> Option<(f64, f64)> {
        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let c = oc.norm_squared() - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let s = disc.sqrt();
        Some((-b - s, -b + s))
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }
}

/// A box given by two opposite corners, rotated about its centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    center: Point3<f64>,
    half_extents: Vector3<f64>,
    orientation: UnitQuaternion<f64>,
}

impl Rectangle {
    /// Builds the box spanned by `corner_a` and `corner_b` (in its own frame),
    /// then rotates it by `orientation` about the centre.
    pub fn new(
        corner_a: Point3<f64>,
        corner_b: Point3<f64>,
        orientation: UnitQuaternion<f64>,
    ) -> Self {
        let center = nalgebra::center(&corner_a, &corner_b);
        let half_extents = (corner_b - corner_a).abs() * 0.5;
        Self {
            center,
            half_extents,
            orientation,
        }
    }

    pub fn axis_aligned(corner_a: Point3<f64>, corner_b: Point3<f64>) -> Self {
        Self::new(corner_a, corner_b, UnitQuaternion::identity())
    }

    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn half_extents(&self) -> Vector3<f64> {
        self.half_extents
    }

    fn to_local(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.orientation.inverse_transform_vector(&(point - self.center))
    }

    // Slab test in the box frame.
    fn chord(&self, ray: &Ray) -> Option<(f64, f64)> {
        let origin = self.to_local(&ray.origin);
        let direction = self.orientation.inverse_transform_vector(&ray.direction);

        let mut t_in = f64::NEG_INFINITY;
        let mut t_out = f64::INFINITY;
        for i in 0..3 {
            let half = self.half_extents[i];
            if direction[i] == 0.0 {
                if origin[i].abs() > half {
                    return None;
                }
                continue;
            }
            let t1 = (-half - origin[i]) / direction[i];
            let t2 = (half - origin[i]) / direction[i];
            t_in = t_in.max(t1.min(t2));
            t_out = t_out.min(t1.max(t2));
        }

        if t_in > t_out {
            return None;
        }
        Some((t_in, t_out))
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        let local = self.to_local(point);
        (0..3).all(|i| local[i].abs() <= self.half_extents[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Rectangle(Rectangle),
}

impl Shape {
    /// Entry and exit parameters of the chord the ray cuts through the solid.
    /// A tangent ray yields `t_in == t_out`.
    pub fn chord(&self, ray: &Ray) -> Option<(f64, f64)> {
        match self {
            Shape::Sphere(sphere) => sphere.chord(ray),
            Shape::Rectangle(rect) => rect.chord(ray),
        }
    }

    pub fn hits(&self, ray: &Ray) -> Option<[Hit; 2]> {
        self.chord(ray).map(|(t_in, t_out)| {
            [
                Hit {
                    t: t_in,
                    entering: true,
                },
                Hit {
                    t: t_out,
                    entering: false,
                },
            ]
        })
    }

    /// First crossing strictly after `t_min`.
    pub fn nearest_hit(&self, ray: &Ray, t_min: f64) -> Option<Hit> {
        self.hits(ray)?.into_iter().find(|hit| hit.t > t_min)
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        match self {
            Shape::Sphere(sphere) => sphere.contains(point),
            Shape::Rectangle(rect) => rect.contains(point),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Shape::Sphere(sphere) => {
                if !sphere.center.iter().all(|v| v.is_finite()) {
                    return Err("sphere centre must be finite".to_string());
                }
                if !(sphere.radius.is_finite() && sphere.radius > 0.0) {
                    return Err(format!("sphere radius must be positive, got {}", sphere.radius));
                }
            }
            Shape::Rectangle(rect) => {
                if !rect.center.iter().all(|v| v.is_finite())
                    || !rect.half_extents.iter().all(|v| v.is_finite())
                {
                    return Err("rectangle corners must be finite".to_string());
                }
                if rect.half_extents.iter().any(|&v| v <= 0.0) {
                    return Err("rectangle corners must differ along every axis".to_string());
                }
            }
        }
        Ok(())
    }
}

/// An immersed object: a shape with an id and its default boundary kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidObject {
    pub id: usize,
    pub shape: Shape,
    pub kind: BoundaryKind,
}

impl SolidObject {
    pub fn new(id: usize, shape: Shape, kind: BoundaryKind) -> Result<Self, MeshError> {
        shape
            .validate()
            .map_err(|reason| MeshError::InvalidObject { id, reason })?;
        Ok(Self { id, shape, kind })
    }

    pub fn sphere(id: usize, center: Point3<f64>, radius: f64) -> Result<Self, MeshError> {
        Self::new(
            id,
            Shape::Sphere(Sphere::new(center, radius)),
            BoundaryKind::Dirichlet,
        )
    }
}
