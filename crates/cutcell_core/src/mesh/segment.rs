//! Splits one mesh line into alternating fluid and solid runs.

use crate::error::MeshError;
use crate::mesh::types::{Boundary, CutFace, Line, ObjectCut, RunKind};
use crate::raycast::{Intersection, LineCast, LineFrame};

/// Segments a single line.
///
/// `base` is the line's grid coordinate with the axis component at 0 and
/// `offset` its flat index. New cut faces are appended to `faces`; their
/// positions there become the `object_coordinate` of the cuts.
pub fn segment_line(
    frame: &LineFrame,
    base: [usize; 3],
    offset: usize,
    stride: usize,
    cast: &LineCast,
    faces: &mut Vec<CutFace>,
) -> Result<Vec<Line>, MeshError> {
    let axis = frame.axis;
    let n = frame.len;
    let at = |k: usize| {
        let mut c = base;
        c[axis.index()] = k;
        c
    };
    let run = |start: Boundary, end: Boundary, kind: RunKind| Line {
        axis,
        stride,
        offset,
        start,
        end,
        kind,
    };
    let register = |faces: &mut Vec<CutFace>, record: &Intersection| -> Boundary {
        let outward = if record.ray_outside { 1.0 } else { -1.0 };
        faces.push(CutFace {
            position: frame.ray().point_at(record.t),
            shape_id: record.shape_id,
            psi: record.psi,
            mesh_coordinate: at(record.solid_coord),
            outward,
        });
        Boundary {
            mesh_coordinate: at(record.solid_coord),
            object: Some(ObjectCut {
                object_coordinate: faces.len() - 1,
                shape_id: record.shape_id,
                psi: record.psi,
            }),
        }
    };

    let near_wall = Boundary::wall(at(0));
    let far_wall = Boundary::wall(at(n - 1));
    let mut lines = Vec::new();

    let mut depth = cast.initial_depth;
    // Start of the open solid run while depth > 0.
    let mut solid_start = (depth > 0).then_some(near_wall);
    // Closed solid run whose exit face waits for a non-empty fluid run.
    let mut pending: Option<(Boundary, Intersection)> = None;
    let mut fluid_lo = 0;

    for record in &cast.records {
        if record.ray_outside {
            depth += 1;
            if depth > 1 {
                continue;
            }
            if record.solid_coord > fluid_lo {
                let left = match pending.take() {
                    Some((start, exit)) => {
                        let cut = register(faces, &exit);
                        lines.push(run(start, cut, RunKind::Solid));
                        cut
                    }
                    None => near_wall,
                };
                let cut = register(faces, record);
                lines.push(run(left, cut, RunKind::Fluid));
                solid_start = Some(cut);
            } else {
                log::trace!(
                    "{:?} line {:?}: no fluid point before {}, merging solid runs",
                    axis,
                    base,
                    record.solid_coord
                );
                solid_start = Some(pending.take().map_or(near_wall, |(start, _)| start));
            }
        } else {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                if let Some(start) = solid_start.take() {
                    pending = Some((start, *record));
                    fluid_lo = record.solid_coord + 1;
                }
            }
        }
    }

    if depth > 0 {
        let start = solid_start.unwrap_or(near_wall);
        lines.push(run(start, far_wall, RunKind::Solid));
    } else {
        match pending {
            Some((start, exit)) if fluid_lo < n => {
                let cut = register(faces, &exit);
                lines.push(run(start, cut, RunKind::Solid));
                lines.push(run(cut, far_wall, RunKind::Fluid));
            }
            Some((start, _)) => lines.push(run(start, far_wall, RunKind::Solid)),
            None => lines.push(run(near_wall, far_wall, RunKind::Fluid)),
        }
    }

    if n > 1 && !lines.iter().any(|line| line.kind == RunKind::Fluid) {
        return Err(MeshError::EnclosedLine {
            axis,
            coordinate: base,
        });
    }
    Ok(lines)
}
