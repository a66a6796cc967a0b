//! Direction-wise derivative operators on a cut mesh.
//!
//! An operator is assembled line by line: each fluid line gets a banded
//! block of mesh-to-mesh coefficients (closures at both ends, interior
//! stencil between) while coefficients of cut-face data go to sparse
//! matrices indexed by the mesh's cut-face list for that axis.

pub mod block;

use std::collections::HashMap;

use nalgebra::{DVector, Point3, Vector3};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};

use crate::error::OperatorError;
use crate::geometry::Axis;
use crate::mesh::{Boundary, CartesianMesh, Line};
use crate::stencil::{BoundaryKind, DerivativeOrder, Stencil, StencilShape};

pub use block::{BandRow, LineBlock};
use block::LineBlockBuilder;

/// Boundary kinds of the two domain walls normal to an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallPair {
    pub left: BoundaryKind,
    pub right: BoundaryKind,
}

impl WallPair {
    pub fn both(kind: BoundaryKind) -> Self {
        Self {
            left: kind,
            right: kind,
        }
    }
}

impl Default for WallPair {
    fn default() -> Self {
        Self::both(BoundaryKind::Floating)
    }
}

/// Boundary kinds for walls and objects.
///
/// Objects use their own default kind unless overridden by shape id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundarySpec {
    pub walls: [WallPair; 3],
    pub objects: HashMap<usize, BoundaryKind>,
}

impl BoundarySpec {
    pub fn with_walls(walls: WallPair) -> Self {
        Self {
            walls: [walls; 3],
            objects: HashMap::new(),
        }
    }

    pub fn object_kind(&self, mesh: &CartesianMesh, shape_id: usize) -> BoundaryKind {
        self.objects
            .get(&shape_id)
            .copied()
            .or_else(|| mesh.object(shape_id).map(|object| object.kind))
            .unwrap_or(BoundaryKind::Dirichlet)
    }
}

/// Boundary values consumed by an operator along one axis.
///
/// Slopes are derivatives along the axis, signed so that they point out of
/// the fluid.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryData {
    /// Per cut face: Dirichlet data or the Floating face unknown.
    pub face_values: Vec<f64>,
    /// Per cut face: outward normal derivative (Neumann data).
    pub face_slopes: Vec<f64>,
    /// Per mesh point: outward normal derivative at wall points.
    pub wall_slopes: Vec<f64>,
}

impl BoundaryData {
    pub fn zeros(mesh: &CartesianMesh, axis: Axis) -> Self {
        let faces = mesh.faces(axis).len();
        Self {
            face_values: vec![0.0; faces],
            face_slopes: vec![0.0; faces],
            wall_slopes: vec![0.0; mesh.len()],
        }
    }

    /// Evaluates boundary data from a value function and its gradient.
    pub fn sample(
        mesh: &CartesianMesh,
        axis: Axis,
        value: impl Fn(Point3<f64>) -> f64,
        gradient: impl Fn(Point3<f64>) -> Vector3<f64>,
    ) -> Self {
        let unit = axis.unit();
        let faces = mesh.faces(axis);
        let face_values = faces.iter().map(|face| value(face.position)).collect();
        let face_slopes = faces
            .iter()
            .map(|face| gradient(face.position).dot(&unit) * face.outward)
            .collect();

        let last = mesh.extent(axis) - 1;
        let wall_slopes = (0..mesh.len())
            .map(|index| {
                let coordinate = mesh.coordinate(index);
                let k = coordinate[axis.index()];
                let outward = if k == 0 && last > 0 {
                    -1.0
                } else if k == last && last > 0 {
                    1.0
                } else {
                    return 0.0;
                };
                gradient(mesh.position(coordinate)).dot(&unit) * outward
            })
            .collect();

        Self {
            face_values,
            face_slopes,
            wall_slopes,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Face {
    /// Wall point, by axis coordinate.
    Wall(usize),
    /// Cut face, by index in the axis's face list.
    Cut(usize),
}

#[derive(Debug, Clone, Copy)]
struct Side {
    kind: BoundaryKind,
    psi: f64,
    face: Face,
}

#[derive(Debug, Clone, Copy)]
enum Column {
    Mesh(usize),
    Face(usize),
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Mesh(usize),
    Face(usize),
}

/// Derivative along one axis.
#[derive(Debug, Clone)]
pub struct DerivativeOperator {
    axis: Axis,
    order: DerivativeOrder,
    points: usize,
    faces: usize,
    blocks: Vec<LineBlock>,
    face_values: CsrMatrix<f64>,
    face_slopes: CsrMatrix<f64>,
    wall_slopes: CsrMatrix<f64>,
    face_rows: CsrMatrix<f64>,
    face_rows_self: CsrMatrix<f64>,
    active: Vec<bool>,
    face_active: Vec<bool>,
}

impl DerivativeOperator {
    /// Assembles the operator for `axis` from the mesh's fluid lines.
    pub fn build<S: Stencil>(
        mesh: &CartesianMesh,
        axis: Axis,
        stencil: &S,
        spec: &BoundarySpec,
    ) -> Result<Self, OperatorError> {
        if mesh.extent(axis) < 2 {
            return Err(OperatorError::DegenerateAxis { axis });
        }
        let walls = spec.walls[axis.index()];
        let kinds = [walls.left, walls.right]
            .into_iter()
            .chain(
                mesh.faces(axis)
                    .iter()
                    .map(|face| spec.object_kind(mesh, face.shape_id)),
            );
        for kind in kinds {
            if !stencil.supports(kind) {
                return Err(OperatorError::UnsupportedKind { axis, kind });
            }
        }

        let mut assembler = Assembler::new(mesh, axis, stencil, spec);
        for line in mesh.fluid_lines(axis) {
            assembler.line(line)?;
        }
        let operator = assembler.finish();

        log::debug!(
            "built {:?} derivative along {:?}: {} lines, {} active rows, {} band + {} face coefficients",
            operator.order,
            axis,
            operator.blocks.len(),
            operator.active.iter().filter(|&&a| a).count(),
            operator.blocks.iter().map(LineBlock::nnz).sum::<usize>(),
            operator.face_values.nnz() + operator.face_slopes.nnz() + operator.wall_slopes.nnz()
        );
        Ok(operator)
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn order(&self) -> DerivativeOrder {
        self.order
    }

    pub fn blocks(&self) -> &[LineBlock] {
        &self.blocks
    }

    /// Coupling of mesh rows to cut-face values.
    pub fn face_value_matrix(&self) -> &CsrMatrix<f64> {
        &self.face_values
    }

    /// Coupling of mesh rows to cut-face normal derivatives.
    pub fn face_slope_matrix(&self) -> &CsrMatrix<f64> {
        &self.face_slopes
    }

    /// Coupling of mesh rows to wall normal derivatives (mesh-indexed).
    pub fn wall_slope_matrix(&self) -> &CsrMatrix<f64> {
        &self.wall_slopes
    }

    /// True if a derivative row was assembled for the mesh point.
    pub fn is_active(&self, index: usize) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    /// True if the cut face carries a Floating derivative row.
    pub fn is_face_active(&self, face: usize) -> bool {
        self.face_active.get(face).copied().unwrap_or(false)
    }

    pub fn apply(&self, field: &[f64], data: &BoundaryData) -> Result<Vec<f64>, OperatorError> {
        let mut out = vec![0.0; self.points];
        self.apply_into(field, data, &mut out)?;
        Ok(out)
    }

    /// Writes the derivative into `out`; inactive rows are zero.
    pub fn apply_into(
        &self,
        field: &[f64],
        data: &BoundaryData,
        out: &mut [f64],
    ) -> Result<(), OperatorError> {
        self.check(field, data)?;
        check_len("output", self.points, out.len())?;

        out.iter_mut().for_each(|v| *v = 0.0);
        for block in &self.blocks {
            block.apply_into(field, out);
        }
        spmv_add(&self.face_values, &data.face_values, out);
        spmv_add(&self.face_slopes, &data.face_slopes, out);
        spmv_add(&self.wall_slopes, &data.wall_slopes, out);
        Ok(())
    }

    /// Derivative at every Floating cut face; other faces are zero.
    pub fn face_derivatives(
        &self,
        field: &[f64],
        data: &BoundaryData,
    ) -> Result<Vec<f64>, OperatorError> {
        self.check(field, data)?;
        let mut out = vec![0.0; self.faces];
        spmv_add(&self.face_rows, field, &mut out);
        spmv_add(&self.face_rows_self, &data.face_values, &mut out);
        Ok(out)
    }

    fn check(&self, field: &[f64], data: &BoundaryData) -> Result<(), OperatorError> {
        check_len("field", self.points, field.len())?;
        check_len("face values", self.faces, data.face_values.len())?;
        check_len("face slopes", self.faces, data.face_slopes.len())?;
        check_len("wall slopes", self.points, data.wall_slopes.len())
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), OperatorError> {
    if expected != got {
        return Err(OperatorError::SizeMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

fn spmv_add(matrix: &CsrMatrix<f64>, x: &[f64], out: &mut [f64]) {
    if matrix.nnz() == 0 {
        return;
    }
    let product = matrix * &DVector::from_column_slice(x);
    out.iter_mut().zip(product.iter()).for_each(|(o, p)| *o += p);
}

struct Assembler<'a, S> {
    mesh: &'a CartesianMesh,
    axis: Axis,
    stencil: &'a S,
    spec: &'a BoundarySpec,
    h: f64,
    interior: Vec<f64>,
    weights: Vec<f64>,
    extra: Vec<f64>,
    blocks: Vec<LineBlock>,
    face_values: CooMatrix<f64>,
    face_slopes: CooMatrix<f64>,
    wall_slopes: CooMatrix<f64>,
    face_rows: CooMatrix<f64>,
    face_rows_self: CooMatrix<f64>,
    active: Vec<bool>,
    face_active: Vec<bool>,
}

impl<'a, S: Stencil> Assembler<'a, S> {
    fn new(mesh: &'a CartesianMesh, axis: Axis, stencil: &'a S, spec: &'a BoundarySpec) -> Self {
        let n = mesh.len();
        let faces = mesh.faces(axis).len();
        let max = stencil.query_max();
        Self {
            mesh,
            axis,
            stencil,
            spec,
            h: mesh.spacing(axis),
            interior: vec![0.0; 2 * max.p + 1],
            weights: vec![0.0; max.r * max.t],
            extra: vec![0.0; max.r * max.nextra],
            blocks: Vec::new(),
            face_values: CooMatrix::new(n, faces),
            face_slopes: CooMatrix::new(n, faces),
            wall_slopes: CooMatrix::new(n, n),
            face_rows: CooMatrix::new(faces, n),
            face_rows_self: CooMatrix::new(faces, faces),
            active: vec![false; n],
            face_active: vec![false; faces],
        }
    }

    fn side(&self, boundary: &Boundary, wall_point: usize, wall_kind: BoundaryKind) -> Side {
        match boundary.object {
            None => Side {
                kind: wall_kind,
                psi: 1.0,
                face: Face::Wall(wall_point),
            },
            Some(cut) => Side {
                kind: self.spec.object_kind(self.mesh, cut.shape_id),
                psi: cut.psi,
                face: Face::Cut(cut.object_coordinate),
            },
        }
    }

    fn line(&mut self, line: &Line) -> Result<(), OperatorError> {
        let points = line.points();
        let (fs, fe) = (points.start, points.end);
        let walls = self.spec.walls[self.axis.index()];
        let left = self.side(&line.start, fs, walls.left);
        let right = self.side(&line.end, fe - 1, walls.right);

        let b0 = if matches!(left.face, Face::Wall(_)) { fs + 1 } else { fs };
        let b1 = if matches!(right.face, Face::Wall(_)) { fe - 1 } else { fe };
        let p = self.stencil.radius();
        let t = self.stencil.width();
        let required = (t - 1).max(2 * p);
        let beyond = b1.saturating_sub(b0);
        if b1 < b0 || beyond < required {
            let mut coordinate = line.start.mesh_coordinate;
            coordinate[self.axis.index()] = fs;
            return Err(OperatorError::LineTooShort {
                axis: self.axis,
                coordinate,
                points: beyond,
                required,
            });
        }

        let mut block = LineBlockBuilder::new(line.offset, line.stride);

        // Left closure.
        let shape = self.closure(left, false)?;
        for i in 0..shape.r {
            let target = match left.kind {
                BoundaryKind::Floating if i == 0 => face_target(left.face),
                BoundaryKind::Floating => Target::Mesh(b0 + i - 1),
                _ => Target::Mesh(b0 + i),
            };
            let columns = (0..shape.t).map(|j| {
                if j == 0 {
                    face_column(left.face)
                } else {
                    Column::Mesh(b0 + j - 1)
                }
            });
            self.deposit(line, &mut block, target, left, shape, i, columns);
        }

        // Interior.
        self.stencil.interior(self.h, &mut self.interior)?;
        for k in b0 + p..b1 - p {
            block.push_row(k, k - p, &self.interior);
            self.active[line.flat_index(k)] = true;
        }

        // Right closure, rows and columns in increasing coordinate.
        let shape = self.closure(right, true)?;
        for i in 0..shape.r {
            let target = match right.kind {
                BoundaryKind::Floating if i == shape.r - 1 => face_target(right.face),
                _ => Target::Mesh(b1 - p + i),
            };
            let columns = (0..shape.t).map(|j| {
                if j == shape.t - 1 {
                    face_column(right.face)
                } else {
                    Column::Mesh(b1 + j + 1 - shape.t)
                }
            });
            self.deposit(line, &mut block, target, right, shape, i, columns);
        }

        self.blocks.push(block.finish());
        Ok(())
    }

    fn closure(&mut self, side: Side, right: bool) -> Result<StencilShape, OperatorError> {
        Ok(self.stencil.nbs(
            self.h,
            side.kind,
            side.psi,
            right,
            &mut self.weights,
            &mut self.extra,
        )?)
    }

    #[allow(clippy::too_many_arguments)]
    fn deposit(
        &mut self,
        line: &Line,
        block: &mut LineBlockBuilder,
        target: Target,
        side: Side,
        shape: StencilShape,
        i: usize,
        columns: impl Iterator<Item = Column>,
    ) {
        let t = shape.t;
        let row = &self.weights[i * t..(i + 1) * t];
        let mut band_start = None;
        let mut band = Vec::with_capacity(t);

        for (column, &w) in columns.zip(row) {
            // Neumann rows never read the face value.
            if side.kind == BoundaryKind::Neumann && is_face_column(column, side.face) {
                continue;
            }
            match (column, target) {
                (Column::Mesh(c), Target::Mesh(_)) => {
                    band_start.get_or_insert(c);
                    band.push(w);
                }
                (Column::Face(f), Target::Mesh(k)) => {
                    self.face_values.push(line.flat_index(k), f, w);
                }
                (Column::Mesh(c), Target::Face(f)) => {
                    self.face_rows.push(f, line.flat_index(c), w);
                }
                (Column::Face(g), Target::Face(f)) => {
                    self.face_rows_self.push(f, g, w);
                }
            }
        }

        match target {
            Target::Mesh(k) => {
                if let Some(start) = band_start {
                    block.push_row(k, start, &band);
                }
                self.active[line.flat_index(k)] = true;
                if shape.nextra == 1 {
                    let e = self.extra[i];
                    match side.face {
                        Face::Cut(f) => self.face_slopes.push(line.flat_index(k), f, e),
                        Face::Wall(c) => {
                            self.wall_slopes
                                .push(line.flat_index(k), line.flat_index(c), e)
                        }
                    }
                }
            }
            Target::Face(f) => self.face_active[f] = true,
        }
    }

    fn finish(self) -> DerivativeOperator {
        DerivativeOperator {
            axis: self.axis,
            order: self.stencil.order(),
            points: self.mesh.len(),
            faces: self.mesh.faces(self.axis).len(),
            blocks: self.blocks,
            face_values: CsrMatrix::from(&self.face_values),
            face_slopes: CsrMatrix::from(&self.face_slopes),
            wall_slopes: CsrMatrix::from(&self.wall_slopes),
            face_rows: CsrMatrix::from(&self.face_rows),
            face_rows_self: CsrMatrix::from(&self.face_rows_self),
            active: self.active,
            face_active: self.face_active,
        }
    }
}

fn face_target(face: Face) -> Target {
    match face {
        Face::Wall(c) => Target::Mesh(c),
        Face::Cut(f) => Target::Face(f),
    }
}

fn face_column(face: Face) -> Column {
    match face {
        Face::Wall(c) => Column::Mesh(c),
        Face::Cut(f) => Column::Face(f),
    }
}

fn is_face_column(column: Column, face: Face) -> bool {
    match (column, face) {
        (Column::Face(_), Face::Cut(_)) => true,
        (Column::Mesh(c), Face::Wall(w)) => c == w,
        _ => false,
    }
}

/// One derivative operator per non-degenerate axis, sharing a stencil.
#[derive(Debug, Clone)]
pub struct DerivativeSet {
    operators: [Option<DerivativeOperator>; 3],
}

impl DerivativeSet {
    pub fn build<S: Stencil>(
        mesh: &CartesianMesh,
        stencil: &S,
        spec: &BoundarySpec,
    ) -> Result<Self, OperatorError> {
        let mut operators: [Option<DerivativeOperator>; 3] = Default::default();
        for axis in Axis::ALL {
            if mesh.extent(axis) < 2 {
                log::debug!("skipping degenerate axis {:?}", axis);
                continue;
            }
            operators[axis.index()] = Some(DerivativeOperator::build(mesh, axis, stencil, spec)?);
        }
        Ok(Self { operators })
    }

    pub fn operator(&self, axis: Axis) -> Option<&DerivativeOperator> {
        self.operators[axis.index()].as_ref()
    }

    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL
            .into_iter()
            .filter(|axis| self.operators[axis.index()].is_some())
    }

    pub fn derivative(
        &self,
        axis: Axis,
        field: &[f64],
        data: &BoundaryData,
    ) -> Result<Vec<f64>, OperatorError> {
        self.operator(axis)
            .ok_or(OperatorError::DegenerateAxis { axis })?
            .apply(field, data)
    }
}
