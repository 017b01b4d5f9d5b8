//! C9 — the orchestrator state machine (spec.md §4.8): owns the mesh/domain
//! lifecycle across one optimization run, threading calls through C3-C8 and
//! an injected `ExternalTools` implementation for the four external
//! binaries (mmg3d, mshdist, elastic, advect — spec.md §6).

mod scoped_rename;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::chem::ChemicalSystem;
use crate::config::{Config, HmodeLag};
use crate::error::Error;
use crate::io::mesh::{read_tet_file, write_hex_file, write_tet_file};
use crate::io::sol::write_sol_file;
use crate::levelset::{apply_to_hexmesh, apply_to_tetmesh, Shape};
use crate::mesh::{HexMesh, Mesh};
use crate::metric::build_metric;
use crate::overlap::matrix::OverlapMatrix;
use crate::overlap::{build_all, build_orbital_overlap_matrix, interior_tetrahedra, TetQuadrature};
use crate::probability::{compute_probability, shape_derivative_field};

use scoped_rename::ScopedRename;

/// The reserved scratch file names this orchestrator itself writes and
/// reads back between every remesh/redistance/advect call — a user-supplied
/// `save_mesh`/`save_data` path may never collide with one of these (spec.md
/// §4.8/§9's "metric.mesh dance").
const RESERVED_NAMES: [&str; 4] = ["metric.mesh", "metric.sol", "metric.o.mesh", "metric.o.sol"];

fn check_reserved_name(component: &'static str, path: &str) -> Result<(), Error> {
    let file_name = Path::new(path).file_name().and_then(|f| f.to_str()).unwrap_or("");
    if RESERVED_NAMES.contains(&file_name) {
        return Err(Error::InvalidArgument {
            component,
            what: "file name collides with a reserved orchestrator scratch name",
            value: path.to_string(),
        });
    }
    Ok(())
}

/// The seven states of spec.md §4.8's state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestratorState {
    LoadedMesh,
    HasDomain,
    HasMetric,
    Remeshed,
    HasLevelSet,
    RemeshedPrime,
    Loop,
}

/// The four external collaborators named in spec.md §6, each taking the path
/// to the mesh they should act on in place and failing with
/// `Error::ExternalToolFailure` on a non-zero exit. A production binary
/// implements this by `std::process::Command`-ing the real tools; tests
/// supply an in-memory double.
pub trait ExternalTools {
    fn remesh(&self, mesh_path: &Path) -> Result<(), Error>;
    fn redistance(&self, mesh_path: &Path) -> Result<(), Error>;
    fn extend(&self, mesh_path: &Path) -> Result<(), Error>;
    fn advect(&self, mesh_path: &Path) -> Result<(), Error>;
}

/// One optimization iteration's bookkeeping, returned from `run_iteration`
/// so a caller (or the test suite) can inspect convergence without
/// re-deriving it from the orchestrator's private state.
#[derive(Clone, Copy, Debug)]
pub struct IterationReport {
    pub iteration: usize,
    pub probability: f64,
    pub delta_probability: f64,
    pub gradient_norm: f64,
    pub converged: bool,
}

pub struct Orchestrator<'a> {
    config: Config,
    system: ChemicalSystem,
    mesh: Mesh,
    state: OrchestratorState,
    scratch_dir: PathBuf,
    tools: &'a dyn ExternalTools,
    abort: AtomicBool,
    last_probability: Option<f64>,
}

impl<'a> Orchestrator<'a> {
    /// Builds the orchestrator in `LoadedMesh`: the initial uniform box
    /// (spec.md §4.3) over `config.box_spec`, every hex labeled `Exterior`.
    pub fn new(config: Config, system: ChemicalSystem, tools: &'a dyn ExternalTools, scratch_dir: PathBuf) -> Result<Self, Error> {
        config.validate(system.nmorb())?;
        check_reserved_name("Orchestrator", &config.save.save_mesh)?;
        check_reserved_name("Orchestrator", &config.save.save_data)?;

        let b = &config.box_spec;
        let mesh = HexMesh::new_uniform(b.n_x, b.n_y, b.n_z, ([b.x_min, b.y_min, b.z_min], [b.x_max, b.y_max, b.z_max]))?;

        Ok(Self {
            config,
            system,
            mesh: Mesh::Hex(mesh),
            state: OrchestratorState::LoadedMesh,
            scratch_dir,
            tools,
            abort: AtomicBool::new(false),
            last_probability: None,
        })
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Signals the cooperative abort flag C5/C8's per-vertex loops and this
    /// module's iteration loop both check (spec.md §5).
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    pub fn should_abort(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    fn level_set_shape(&self) -> Shape {
        let ls = &self.config.level_set;
        match ls.ls_type {
            crate::config::LevelSetType::Cube => Shape::Cube {
                center: [ls.ls_x, ls.ls_y, ls.ls_z],
                side: ls.ls_r,
            },
            crate::config::LevelSetType::Sphere => Shape::Sphere {
                center: [ls.ls_x, ls.ls_y, ls.ls_z],
                radius: ls.ls_r,
            },
        }
    }

    /// `LoadedMesh -> HasDomain`: labels the initial hex grid's interior
    /// cells from the configured level-set shape (spec.md §4.4, §4.8).
    pub fn apply_domain(&mut self) -> Result<(), Error> {
        let shape = self.level_set_shape();
        match &mut self.mesh {
            Mesh::Hex(m) => apply_to_hexmesh(m, &shape)?,
            Mesh::Tet(m) => apply_to_tetmesh(m, &shape)?,
        }
        self.state = OrchestratorState::HasDomain;
        Ok(())
    }

    /// `HasDomain -> HasMetric`: the per-vertex anisotropic size field of
    /// C5, sampled on the mesh's current vertices.
    pub fn build_metric_field(&mut self) -> Result<Vec<f64>, Error> {
        let vertices = self.mesh.vertices().to_vec();
        let field = build_metric(&self.system, &vertices, &self.config.metric)?;
        self.state = OrchestratorState::HasMetric;
        Ok(field)
    }

    fn reserved_path(&self, name: &str) -> PathBuf {
        self.scratch_dir.join(name)
    }

    /// `HasMetric -> Remeshed`: writes the reserved `metric.mesh`/`.sol`
    /// scratch pair, guards any pre-existing files at those names with
    /// `ScopedRename` so they're restored on any exit path, invokes the
    /// external remesher, and reads its tetrahedral output back.
    pub fn remesh(&mut self, metric_field: &[f64]) -> Result<(), Error> {
        let mesh_path = self.reserved_path("metric.mesh");
        let sol_path = self.reserved_path("metric.sol");
        let out_path = self.reserved_path("metric.o.mesh");

        let _guard_mesh = ScopedRename::guard(&mesh_path)?;
        let _guard_sol = ScopedRename::guard(&sol_path)?;
        let _guard_out = ScopedRename::guard(&out_path)?;

        match &self.mesh {
            Mesh::Hex(m) => write_hex_file(&mesh_path, m)?,
            Mesh::Tet(m) => write_tet_file(&mesh_path, m)?,
        }
        write_sol_file(&sol_path, metric_field)?;

        self.tools.remesh(&mesh_path)?;

        let remeshed = read_tet_file(&out_path)?;
        info!("remesh: {} vertices, {} tetrahedra", remeshed.vertices.len(), remeshed.tetrahedra.len());
        self.mesh = Mesh::Tet(remeshed);
        self.state = OrchestratorState::Remeshed;
        Ok(())
    }

    /// `Remeshed -> HasLevelSet`: re-samples the level-set on the fresh
    /// tetrahedral mesh and invokes the external redistancer to re-signed
    /// it exactly (spec.md §4.8).
    pub fn redistance(&mut self) -> Result<(), Error> {
        let shape = self.level_set_shape();
        let tet = match &mut self.mesh {
            Mesh::Tet(m) => m,
            Mesh::Hex(_) => {
                return Err(Error::InvalidMesh {
                    component: "Orchestrator",
                    invariant: "redistance requires a tetrahedral mesh",
                    value: "hex".to_string(),
                })
            }
        };
        apply_to_tetmesh(tet, &shape)?;

        let mesh_path = self.reserved_path("metric.mesh");
        let _guard = ScopedRename::guard(&mesh_path)?;
        write_tet_file(&mesh_path, tet)?;
        self.tools.redistance(&mesh_path)?;
        let redistanced = read_tet_file(&mesh_path)?;
        *tet = redistanced;

        self.state = OrchestratorState::HasLevelSet;
        Ok(())
    }

    /// `HasLevelSet -> RemeshedPrime`: a second remesh pass honoring the
    /// redistanced level-set, after which the engine enters the iteration
    /// loop proper.
    pub fn remesh_prime(&mut self, metric_field: &[f64]) -> Result<(), Error> {
        self.remesh(metric_field)?;
        self.state = OrchestratorState::RemeshedPrime;
        Ok(())
    }

    fn active_tets(&self) -> Vec<crate::overlap::WorldTet> {
        interior_tetrahedra(&self.mesh)
    }

    fn boundary_points(&self) -> Vec<[f64; 3]> {
        match &self.mesh {
            Mesh::Tet(m) => m
                .boundary_triangles()
                .flat_map(|t| t.corners)
                .map(|idx| m.vertices[idx].position)
                .collect(),
            Mesh::Hex(_) => Vec::new(),
        }
    }

    fn assemble_matrices(&self) -> Result<Vec<OverlapMatrix>, Error> {
        let tets = self.active_tets();
        let quad = TetQuadrature::new();
        let global = build_orbital_overlap_matrix(&self.system, &tets, &quad);
        build_all(&self.system, &global, self.system.is_rhf())
    }

    /// One pass of spec.md §4.8's loop: evaluate `P_{n_u}`, its shape
    /// derivative field, advect the boundary along it, then remesh. Enters
    /// `Loop` on first call and stays there. Checks the cooperative abort
    /// flag before doing any work.
    pub fn run_iteration(&mut self, iteration: usize, metric_field: &[f64]) -> Result<IterationReport, Error> {
        self.state = OrchestratorState::Loop;
        if self.should_abort() {
            return Err(Error::InvalidArgument {
                component: "Orchestrator",
                what: "iteration aborted cooperatively",
                value: iteration.to_string(),
            });
        }

        let nu = self.config.optimization.nu_electrons;
        let matrices = self.assemble_matrices()?;
        let probability = compute_probability(&matrices, nu);

        let delta_probability = match self.last_probability {
            Some(prev) => (probability - prev).abs(),
            None => f64::INFINITY,
        };
        self.last_probability = Some(probability);

        let boundary_points = self.boundary_points();
        let gradient = shape_derivative_field(&self.system, &matrices, &boundary_points, nu);
        let gradient_norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();

        let opt = &self.config.optimization;
        let converged = delta_probability < opt.iter_told0p || gradient_norm < opt.iter_told1p || iteration + 1 >= opt.iter_max;

        if !converged {
            self.advect(&gradient)?;
            self.remesh(metric_field)?;
        }

        Ok(IterationReport {
            iteration,
            probability,
            delta_probability,
            gradient_norm,
            converged,
        })
    }

    fn remesh_size_for_lag(&self) -> (f64, f64, f64, f64) {
        let r = &self.config.remesh;
        match r.hmode_lag {
            HmodeLag::Iso => (r.hmin_iso, r.hmax_iso, r.hausd_iso, r.hgrad_iso),
            HmodeLag::Met => (r.hmin_met, r.hmax_met, r.hausd_met, r.hgrad_met),
            HmodeLag::Ls => (r.hmin_ls, r.hmax_ls, r.hausd_ls, r.hgrad_ls),
        }
    }

    fn advect(&mut self, boundary_speed: &[f64]) -> Result<(), Error> {
        let _ = self.remesh_size_for_lag();
        let mesh_path = self.reserved_path("metric.mesh");
        let sol_path = self.reserved_path("metric.sol");
        let _guard_mesh = ScopedRename::guard(&mesh_path)?;
        let _guard_sol = ScopedRename::guard(&sol_path)?;

        let tet = match &self.mesh {
            Mesh::Tet(m) => m,
            Mesh::Hex(_) => {
                return Err(Error::InvalidMesh {
                    component: "Orchestrator",
                    invariant: "advection requires a tetrahedral mesh",
                    value: "hex".to_string(),
                })
            }
        };
        write_tet_file(&mesh_path, tet)?;
        write_sol_file(&sol_path, boundary_speed)?;
        self.tools.advect(&mesh_path)?;
        self.tools.extend(&mesh_path)?;

        let advected = read_tet_file(&mesh_path)?;
        self.mesh = Mesh::Tet(advected);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::{AngularType, Determinant, MolecularOrbital, Nucleus, Primitive, Spin};
    use crate::config::*;
    use std::cell::Cell;

    struct NoopTools {
        calls: Cell<usize>,
    }

    impl ExternalTools for NoopTools {
        fn remesh(&self, _mesh_path: &Path) -> Result<(), Error> {
            self.calls.set(self.calls.get() + 1);
            Err(Error::ExternalToolFailure {
                component: "Orchestrator",
                tool: "mmg3d",
                status: 1,
            })
        }
        fn redistance(&self, _mesh_path: &Path) -> Result<(), Error> {
            Ok(())
        }
        fn extend(&self, _mesh_path: &Path) -> Result<(), Error> {
            Ok(())
        }
        fn advect(&self, _mesh_path: &Path) -> Result<(), Error> {
            Ok(())
        }
    }

    fn sample_config() -> Config {
        Config {
            opt_mode: OptMode::Hex(0),
            verbose: 0,
            n_cpu: 1,
            name_length: 64,
            path_length: 256,
            box_spec: BoxSpec {
                x_min: -2.0,
                y_min: -2.0,
                z_min: -2.0,
                x_max: 2.0,
                y_max: 2.0,
                z_max: 2.0,
                n_x: 5,
                n_y: 5,
                n_z: 5,
            },
            level_set: LevelSetSpec {
                ls_type: LevelSetType::Sphere,
                ls_x: 0.0,
                ls_y: 0.0,
                ls_z: 0.0,
                ls_r: 1.0,
            },
            metric: MetricSpec {
                met_err: 0.1,
                met_min: 0.01,
                met_max: 1.0,
            },
            trick_matrix: false,
            approx_mode: false,
            orb_rhf: true,
            optimization: OptimizationSpec {
                iter_max: 5,
                iter_told0p: 1e-6,
                iter_told1p: 1e-6,
                iter_told2p: 1e-6,
                nu_electrons: 1,
            },
            remesh: RemeshSizeSpec {
                hmin_iso: 0.1,
                hmax_iso: 1.0,
                hmin_met: 0.1,
                hmax_met: 1.0,
                hmin_ls: 0.1,
                hmax_ls: 1.0,
                hmin_lag: 0.1,
                hmax_lag: 1.0,
                hausd_iso: 0.01,
                hausd_met: 0.01,
                hausd_ls: 0.01,
                hausd_lag: 0.01,
                hgrad_iso: 1.3,
                hgrad_met: 1.3,
                hgrad_ls: 1.3,
                hgrad_lag: 1.3,
                hmode_lag: HmodeLag::Iso,
            },
            advection: AdvectionSpec {
                n_iter: 5,
                residual: 1e-6,
                delta_t: 0.01,
                no_cfl: false,
            },
            save: SaveSpec {
                save_type: 0,
                save_mesh: "out.mesh".into(),
                save_data: "out.sol".into(),
                save_print: 0,
                save_where: 0,
            },
            tools: ToolPaths {
                path_medit: "/usr/bin/medit".into(),
                path_mmg3d: "/usr/bin/mmg3d".into(),
                path_mshdist: "/usr/bin/mshdist".into(),
                path_elastic: "/usr/bin/elastic".into(),
                path_advect: "/usr/bin/advect".into(),
            },
        }
    }

    fn sample_system() -> ChemicalSystem {
        let nuclei = vec![Nucleus::new([0.0; 3], 1.0).unwrap()];
        let prim = Primitive::new(0, AngularType::S, 1.0, 1.0).unwrap();
        let orbitals = vec![MolecularOrbital::new(vec![prim], Spin::Alpha).unwrap()];
        let determinants = vec![Determinant::new(vec![0], 1.0, false).unwrap()];
        ChemicalSystem::new(nuclei, orbitals, determinants).unwrap()
    }

    #[test]
    fn construction_rejects_reserved_save_mesh_name() {
        let mut config = sample_config();
        config.save.save_mesh = "metric.mesh".into();
        let tools = NoopTools { calls: Cell::new(0) };
        let err = Orchestrator::new(config, sample_system(), &tools, PathBuf::from("/tmp"));
        assert!(err.is_err());
    }

    #[test]
    fn fresh_orchestrator_starts_in_loaded_mesh() {
        let tools = NoopTools { calls: Cell::new(0) };
        let orch = Orchestrator::new(sample_config(), sample_system(), &tools, PathBuf::from("/tmp")).unwrap();
        assert_eq!(orch.state(), OrchestratorState::LoadedMesh);
        assert!(orch.mesh().is_hex());
    }

    #[test]
    fn domain_then_metric_transition_states_in_order() {
        let tools = NoopTools { calls: Cell::new(0) };
        let mut orch = Orchestrator::new(sample_config(), sample_system(), &tools, PathBuf::from("/tmp")).unwrap();
        orch.apply_domain().unwrap();
        assert_eq!(orch.state(), OrchestratorState::HasDomain);
        let field = orch.build_metric_field().unwrap();
        assert_eq!(orch.state(), OrchestratorState::HasMetric);
        assert_eq!(field.len(), orch.mesh().vertices().len());
    }

    #[test]
    fn abort_flag_short_circuits_run_iteration() {
        let tools = NoopTools { calls: Cell::new(0) };
        let mut orch = Orchestrator::new(sample_config(), sample_system(), &tools, PathBuf::from("/tmp")).unwrap();
        orch.apply_domain().unwrap();
        let field = orch.build_metric_field().unwrap();
        orch.request_abort();
        assert!(orch.run_iteration(0, &field).is_err());
    }
}
