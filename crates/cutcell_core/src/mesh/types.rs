use std::ops::Range;

use nalgebra::Point3;

use crate::geometry::Axis;

/// A cut produced by an object on a mesh line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectCut {
    /// Index of the face in the mesh's cut-face list for this axis.
    pub object_coordinate: usize,
    pub shape_id: usize,
    pub psi: f64,
}

/// End of a run: a domain wall (`object == None`) or an object cut.
///
/// For a cut, `mesh_coordinate` is the solid-side grid point next to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub mesh_coordinate: [usize; 3],
    pub object: Option<ObjectCut>,
}

impl Boundary {
    pub fn wall(mesh_coordinate: [usize; 3]) -> Self {
        Self {
            mesh_coordinate,
            object: None,
        }
    }

    pub fn is_wall(&self) -> bool {
        self.object.is_none()
    }

    /// Position of the boundary point along `axis`.
    pub fn along(&self, axis: Axis) -> usize {
        self.mesh_coordinate[axis.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunKind {
    Fluid,
    Solid,
}

/// A maximal run of fluid or solid points on one mesh line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub axis: Axis,
    /// Flat-index distance between neighbours along the axis.
    pub stride: usize,
    /// Flat index of the line's point at axis coordinate 0.
    pub offset: usize,
    pub start: Boundary,
    pub end: Boundary,
    pub kind: RunKind,
}

impl Line {
    /// Axis coordinates covered by the run.
    ///
    /// Fluid runs exclude the solid points behind cuts; solid runs include
    /// both ends and are empty for a sliver with no grid point.
    pub fn points(&self) -> Range<usize> {
        let s = self.start.along(self.axis);
        let e = self.end.along(self.axis);
        match self.kind {
            RunKind::Fluid => {
                let lo = if self.start.is_wall() { s } else { s + 1 };
                let hi = if self.end.is_wall() { e + 1 } else { e };
                lo..hi
            }
            RunKind::Solid => s..e + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.points().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points().is_empty()
    }

    pub fn flat_index(&self, along: usize) -> usize {
        self.offset + along * self.stride
    }

    /// Flat indices of every point of the run, in increasing order.
    pub fn flat_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.points().map(move |k| self.flat_index(k))
    }
}

/// An object surface crossing registered on the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutFace {
    pub position: Point3<f64>,
    pub shape_id: usize,
    pub psi: f64,
    /// Solid-side grid point next to the face.
    pub mesh_coordinate: [usize; 3],
    /// `+1` if the fluid lies on the low-coordinate side, `-1` otherwise.
    pub outward: f64,
}

/// Half-open range of flat indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSlice {
    pub first: usize,
    pub last: usize,
}

impl IndexSlice {
    pub fn len(&self) -> usize {
        self.last - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.last == self.first
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.first..self.last).contains(&index)
    }

    pub fn range(&self) -> Range<usize> {
        self.first..self.last
    }
}
