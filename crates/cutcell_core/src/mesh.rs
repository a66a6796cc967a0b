//! Cartesian mesh cut by immersed solid objects.
//!
//! Building a mesh casts one ray along every grid line of every axis,
//! segments the lines into fluid and solid runs and records the cut faces.

pub mod fluid;
pub mod segment;
pub mod types;

use std::collections::HashSet;

use nalgebra::Point3;

use crate::error::MeshError;
use crate::geometry::{Axis, SolidObject};
use crate::raycast::{cast_line, LineFrame};

pub use fluid::FluidIndex;
pub use types::{Boundary, CutFace, IndexSlice, Line, ObjectCut, RunKind};

/// Cut fraction below which boundary closures lose several digits.
pub const SMALL_PSI: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct CartesianMesh {
    extents: [usize; 3],
    lower: [f64; 3],
    upper: [f64; 3],
    spacing: [f64; 3],
    objects: Vec<SolidObject>,
    lines: [Vec<Line>; 3],
    faces: [Vec<CutFace>; 3],
    fluid: FluidIndex,
}

impl CartesianMesh {
    /// Classifies the grid `extents` spanning `[lower, upper]` against
    /// `objects`.
    pub fn new(
        extents: [usize; 3],
        lower: [f64; 3],
        upper: [f64; 3],
        objects: Vec<SolidObject>,
    ) -> Result<Self, MeshError> {
        let mut spacing = [0.0; 3];
        for axis in Axis::ALL {
            let a = axis.index();
            if extents[a] == 0 {
                return Err(MeshError::EmptyAxis { axis });
            }
            let (lo, hi) = (lower[a], upper[a]);
            if !(lo.is_finite() && hi.is_finite() && hi > lo) {
                return Err(MeshError::InvalidBounds {
                    axis,
                    lower: lo,
                    upper: hi,
                });
            }
            spacing[a] = if extents[a] > 1 {
                (hi - lo) / (extents[a] - 1) as f64
            } else {
                hi - lo
            };
        }

        let mut seen = HashSet::new();
        for object in &objects {
            if !seen.insert(object.id) {
                return Err(MeshError::DuplicateObject { id: object.id });
            }
        }

        let mut mesh = Self {
            extents,
            lower,
            upper,
            spacing,
            objects,
            lines: Default::default(),
            faces: Default::default(),
            fluid: FluidIndex::default(),
        };
        for axis in Axis::ALL {
            mesh.classify(axis)?;
        }
        mesh.fluid = FluidIndex::from_lines(mesh.lines(mesh.representative_axis()));
        log::debug!(
            "mesh {:?}: {} objects, {} of {} points are fluid in {} slices",
            extents,
            mesh.objects.len(),
            mesh.fluid.len(),
            mesh.len(),
            mesh.fluid.slices().len()
        );
        Ok(mesh)
    }

    /// Object-free mesh.
    pub fn uniform(extents: [usize; 3], lower: [f64; 3], upper: [f64; 3]) -> Result<Self, MeshError> {
        Self::new(extents, lower, upper, Vec::new())
    }

    fn classify(&mut self, axis: Axis) -> Result<(), MeshError> {
        let a = axis.index();
        let (slow, fast) = axis.orthogonal();
        let stride = self.stride(axis);
        let mut lines = Vec::new();
        let mut faces = Vec::new();

        for i in 0..self.extents[slow.index()] {
            for j in 0..self.extents[fast.index()] {
                let mut base = [0; 3];
                base[slow.index()] = i;
                base[fast.index()] = j;
                let mut origin = self.position(base);
                origin[a] = self.lower[a];
                let frame = LineFrame {
                    axis,
                    origin,
                    spacing: self.spacing[a],
                    len: self.extents[a],
                };
                let cast = cast_line(&frame, &self.objects);
                let offset = self.flat_index(base);
                lines.extend(segment::segment_line(
                    &frame, base, offset, stride, &cast, &mut faces,
                )?);
            }
        }

        let small = faces.iter().filter(|f| f.psi < SMALL_PSI).count();
        if small > 0 {
            log::warn!(
                "{small} cut faces along {axis:?} have psi < {SMALL_PSI}; closures there are ill-conditioned"
            );
        }
        log::debug!(
            "classified {:?}: {} runs, {} cut faces",
            axis,
            lines.len(),
            faces.len()
        );
        self.lines[a] = lines;
        self.faces[a] = faces;
        Ok(())
    }

    pub fn extents(&self) -> [usize; 3] {
        self.extents
    }

    pub fn extent(&self, axis: Axis) -> usize {
        self.extents[axis.index()]
    }

    pub fn lower(&self) -> [f64; 3] {
        self.lower
    }

    pub fn upper(&self) -> [f64; 3] {
        self.upper
    }

    pub fn spacing(&self, axis: Axis) -> f64 {
        self.spacing[axis.index()]
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.extents.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stride(&self, axis: Axis) -> usize {
        let [_, ny, nz] = self.extents;
        match axis {
            Axis::X => ny * nz,
            Axis::Y => nz,
            Axis::Z => 1,
        }
    }

    pub fn flat_index(&self, coordinate: [usize; 3]) -> usize {
        let [_, ny, nz] = self.extents;
        (coordinate[0] * ny + coordinate[1]) * nz + coordinate[2]
    }

    pub fn coordinate(&self, index: usize) -> [usize; 3] {
        let [_, ny, nz] = self.extents;
        [index / (ny * nz), (index / nz) % ny, index % nz]
    }

    pub fn position(&self, coordinate: [usize; 3]) -> Point3<f64> {
        let at = |a: usize| self.lower[a] + coordinate[a] as f64 * self.spacing[a];
        Point3::new(at(0), at(1), at(2))
    }

    /// Fluid and solid runs along `axis`, slow orthogonal axis outermost.
    pub fn lines(&self, axis: Axis) -> &[Line] {
        &self.lines[axis.index()]
    }

    pub fn fluid_lines(&self, axis: Axis) -> impl Iterator<Item = &Line> + '_ {
        self.lines(axis)
            .iter()
            .filter(|line| line.kind == RunKind::Fluid)
    }

    pub fn faces(&self, axis: Axis) -> &[CutFace] {
        &self.faces[axis.index()]
    }

    pub fn fluid(&self) -> &FluidIndex {
        &self.fluid
    }

    pub fn objects(&self) -> &[SolidObject] {
        &self.objects
    }

    pub fn object(&self, id: usize) -> Option<&SolidObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    /// Axis whose lines define the fluid slices; always unit stride.
    pub fn representative_axis(&self) -> Axis {
        let [_, ny, nz] = self.extents;
        if nz > 1 {
            Axis::Z
        } else if ny > 1 {
            Axis::Y
        } else {
            Axis::X
        }
    }

    /// Evaluates `f` at every grid point.
    pub fn sample(&self, f: impl Fn(Point3<f64>) -> f64) -> Vec<f64> {
        (0..self.len())
            .map(|index| f(self.position(self.coordinate(index))))
            .collect()
    }
}
