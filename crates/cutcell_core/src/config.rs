//! Serializable setup of a mesh, its objects, the stencil and the boundary
//! kinds, with a single `build` step producing ready-to-use operators.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use nalgebra::{Point3, Quaternion, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::derivative::{BoundarySpec, DerivativeSet, WallPair};
use crate::geometry::{Rectangle, Shape, SolidObject, Sphere};
use crate::mesh::CartesianMesh;
use crate::stencil::{AnyStencil, BoundaryKind, DerivativeOrder, StencilFamily, StencilSelection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    pub extents: [usize; 3],
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            extents: [16, 16, 16],
            lower: [0.0; 3],
            upper: [1.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ShapeConfig {
    Sphere {
        center: [f64; 3],
        radius: f64,
    },
    Rectangle {
        corner_a: [f64; 3],
        corner_b: [f64; 3],
        /// Quaternion `[w, x, y, z]` about the box centre; identity if absent.
        #[serde(default)]
        rotation: Option<[f64; 4]>,
    },
}

impl ShapeConfig {
    fn to_shape(&self) -> Result<Shape> {
        Ok(match self {
            ShapeConfig::Sphere { center, radius } => {
                Shape::Sphere(Sphere::new(Point3::from(*center), *radius))
            }
            ShapeConfig::Rectangle {
                corner_a,
                corner_b,
                rotation,
            } => {
                let orientation = match rotation {
                    None => UnitQuaternion::identity(),
                    Some([w, x, y, z]) => {
                        let q = Quaternion::new(*w, *x, *y, *z);
                        if !(q.norm() > 0.0 && q.norm().is_finite()) {
                            bail!("rectangle rotation must be a non-zero quaternion");
                        }
                        UnitQuaternion::from_quaternion(q)
                    }
                };
                Shape::Rectangle(Rectangle::new(
                    Point3::from(*corner_a),
                    Point3::from(*corner_b),
                    orientation,
                ))
            }
        })
    }
}

fn default_object_kind() -> BoundaryKind {
    BoundaryKind::Dirichlet
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub id: usize,
    #[serde(flatten)]
    pub shape: ShapeConfig,
    #[serde(default = "default_object_kind")]
    pub kind: BoundaryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StencilConfig {
    pub order: DerivativeOrder,
    /// One of `E2`, `E4`, `E6-uniform`, `E8-uniform`, `free`.
    pub family: String,
    /// Radius of the free family.
    #[serde(default)]
    pub radius: Option<usize>,
    /// First-derivative closure tuning, one coefficient per near-face row.
    #[serde(default)]
    pub tuning: Vec<f64>,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            order: DerivativeOrder::First,
            family: StencilFamily::E2.name().to_string(),
            radius: None,
            tuning: Vec::new(),
        }
    }
}

impl StencilConfig {
    pub fn selection(&self) -> Result<StencilSelection> {
        let family: StencilFamily = self
            .family
            .parse()
            .with_context(|| format!("invalid stencil family '{}'", self.family))?;
        if family != StencilFamily::Free && self.radius.is_some() {
            log::warn!("radius only applies to the free family; ignoring it for {family}");
        }
        let mut selection = StencilSelection::new(self.order, family);
        selection.radius = self.radius.unwrap_or(1);
        selection.tuning = self.tuning.clone();
        Ok(selection)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// Wall kinds per axis `[x, y, z]`; Floating when absent.
    #[serde(default)]
    pub walls: [WallPair; 3],
    /// Per shape id overrides of the objects' own kinds.
    #[serde(default)]
    pub objects: HashMap<usize, BoundaryKind>,
}

impl BoundaryConfig {
    pub fn spec(&self) -> BoundarySpec {
        BoundarySpec {
            walls: self.walls,
            objects: self.objects.clone(),
        }
    }
}

/// Complete description of a cut-cell derivative setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutCellConfig {
    pub mesh: MeshConfig,
    pub objects: Vec<ObjectConfig>,
    pub stencil: StencilConfig,
    pub boundaries: BoundaryConfig,
}

/// Everything built from a [`CutCellConfig`].
#[derive(Debug, Clone)]
pub struct CutCellSetup {
    pub mesh: CartesianMesh,
    pub stencil: AnyStencil,
    pub spec: BoundarySpec,
    pub derivatives: DerivativeSet,
}

impl CutCellConfig {
    pub fn build(&self) -> Result<CutCellSetup> {
        let mut objects = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            let shape = object
                .shape
                .to_shape()
                .with_context(|| format!("object {}", object.id))?;
            objects.push(SolidObject::new(object.id, shape, object.kind)?);
        }

        let mesh = CartesianMesh::new(
            self.mesh.extents,
            self.mesh.lower,
            self.mesh.upper,
            objects,
        )
        .context("failed to classify mesh")?;

        let selection = self.stencil.selection()?;
        let stencil =
            AnyStencil::from_selection(&selection).context("failed to build stencil")?;
        let spec = self.boundaries.spec();
        let derivatives = DerivativeSet::build(&mesh, &stencil, &spec)
            .context("failed to assemble derivative operators")?;

        Ok(CutCellSetup {
            mesh,
            stencil,
            spec,
            derivatives,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivative::BoundaryData;
    use crate::geometry::Axis;
    use crate::stencil::Stencil;

    fn assert_err_contains(err: anyhow::Error, needle: &str) {
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error containing '{needle}', got '{message}'"
        );
    }

    fn sphere(id: usize, radius: f64) -> ObjectConfig {
        ObjectConfig {
            id,
            shape: ShapeConfig::Sphere {
                center: [0.5; 3],
                radius,
            },
            kind: BoundaryKind::Dirichlet,
        }
    }

    const SAMPLE: &str = r#"{
        "mesh": { "extents": [24, 24, 24], "lower": [0, 0, 0], "upper": [1, 1, 1] },
        "objects": [
            { "id": 3, "shape": "sphere", "center": [0.5, 0.5, 0.5], "radius": 0.2 },
            { "id": 4, "shape": "rectangle", "corner_a": [0.15, 0.15, 0.78],
              "corner_b": [0.3, 0.3, 0.9], "kind": "Neumann" }
        ],
        "stencil": { "order": "First", "family": "E2" },
        "boundaries": {
            "walls": [
                { "left": "Dirichlet", "right": "Floating" },
                { "left": "Floating", "right": "Floating" },
                { "left": "Neumann", "right": "Neumann" }
            ],
            "objects": { "3": "Floating" }
        }
    }"#;

    #[test]
    fn parses_and_builds_sample() {
        let config: CutCellConfig = serde_json::from_str(SAMPLE).expect("valid json");
        assert_eq!(config.objects.len(), 2);
        assert_eq!(config.objects[0].kind, BoundaryKind::Dirichlet);
        assert_eq!(config.objects[1].kind, BoundaryKind::Neumann);
        assert!(matches!(
            config.objects[1].shape,
            ShapeConfig::Rectangle { rotation: None, .. }
        ));

        let setup = config.build().expect("setup builds");
        assert_eq!(setup.stencil.name(), "E2");
        assert_eq!(setup.spec.object_kind(&setup.mesh, 3), BoundaryKind::Floating);
        assert_eq!(setup.spec.object_kind(&setup.mesh, 4), BoundaryKind::Neumann);
        assert_eq!(setup.derivatives.axes().count(), 3);

        let field = setup.mesh.sample(|p| p.x + 2.0 * p.y);
        let data = BoundaryData::sample(&setup.mesh, Axis::Y, |p| p.x + 2.0 * p.y, |_| {
            nalgebra::Vector3::new(1.0, 2.0, 0.0)
        });
        let dy = setup
            .derivatives
            .derivative(Axis::Y, &field, &data)
            .expect("derivative");
        let fluid = setup.mesh.fluid();
        for index in fluid.indices() {
            assert!((dy[index] - 2.0).abs() < 1e-10);
        }
    }

    #[test]
    fn config_round_trips_through_json() {
        let config: CutCellConfig = serde_json::from_str(SAMPLE).expect("valid json");
        let text = serde_json::to_string(&config).expect("serialize");
        let back: CutCellConfig = serde_json::from_str(&text).expect("parse back");
        assert_eq!(config, back);
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config: CutCellConfig = serde_json::from_str("{}").expect("empty config");
        assert_eq!(config, CutCellConfig::default());
        let setup = config.build().expect("default setup");
        assert_eq!(setup.mesh.len(), 16 * 16 * 16);
        assert_eq!(setup.mesh.fluid().slices().len(), 1);
    }

    #[test]
    fn unknown_family_is_reported() {
        let mut config = CutCellConfig::default();
        config.stencil.family = "E5".to_string();
        let err = config.build().expect_err("unknown family");
        assert_err_contains(err, "unknown stencil family 'E5'");
    }

    #[test]
    fn bad_tuning_length_is_reported() {
        let mut config = CutCellConfig::default();
        config.stencil = StencilConfig {
            order: DerivativeOrder::First,
            family: "free".to_string(),
            radius: Some(2),
            tuning: vec![0.1, 0.2, 0.3],
        };
        let err = config.build().expect_err("tuning mismatch");
        assert_err_contains(err, "expected 2 tuning coefficients, got 3");
    }

    #[test]
    fn tuning_reaches_fixed_order_families() {
        let mut config = CutCellConfig::default();
        config.stencil = StencilConfig {
            order: DerivativeOrder::First,
            family: "E4".to_string(),
            radius: None,
            tuning: vec![0.25, -0.1],
        };
        let setup = config.build().expect("tuned E4 builds");
        assert_eq!(setup.stencil.name(), "E4");
        assert_eq!(setup.stencil.width(), 6);

        let f = |p: Point3<f64>| p.x.powi(4) - p.z;
        let field = setup.mesh.sample(f);
        let data = BoundaryData::sample(&setup.mesh, Axis::X, f, |p| {
            nalgebra::Vector3::new(4.0 * p.x.powi(3), 0.0, -1.0)
        });
        let dx = setup
            .derivatives
            .derivative(Axis::X, &field, &data)
            .expect("derivative");
        for index in 0..setup.mesh.len() {
            let p = setup.mesh.position(setup.mesh.coordinate(index));
            assert!((dx[index] - 4.0 * p.x.powi(3)).abs() < 1e-9);
        }

        config.stencil.order = DerivativeOrder::Second;
        let err = config.build().expect_err("second derivatives take no tuning");
        assert_err_contains(err, "takes no tuning");

        config.stencil.order = DerivativeOrder::First;
        config.stencil.tuning = vec![0.25];
        let err = config.build().expect_err("wrong length");
        assert_err_contains(err, "expected 2 tuning coefficients, got 1");
    }

    #[test]
    fn invalid_objects_are_reported_with_their_id() {
        let mut config = CutCellConfig::default();
        config.objects.push(ObjectConfig {
            id: 8,
            shape: ShapeConfig::Rectangle {
                corner_a: [0.2; 3],
                corner_b: [0.4; 3],
                rotation: Some([0.0; 4]),
            },
            kind: BoundaryKind::Dirichlet,
        });
        let err = config.build().expect_err("zero quaternion");
        assert_err_contains(err, "object 8");

        config.objects = vec![sphere(2, -1.0)];
        let err = config.build().expect_err("negative radius");
        assert_err_contains(err, "sphere radius must be positive");
    }

    #[test]
    fn enclosed_lines_fail_mesh_classification() {
        let mut config = CutCellConfig::default();
        config.objects.push(sphere(1, 5.0));
        let err = config.build().expect_err("all solid");
        assert_err_contains(err, "failed to classify mesh");
    }
}
