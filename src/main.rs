// -------------------------------------------------------------------------
// mpd — thin integration binary over mpd_core.
//
// The command-line driver proper (option parsing beyond two file paths,
// the save/print bookkeeping, the medit viewer launch) is named in spec.md
// §1 as an external collaborator and is out of scope for this crate; this
// binary exists only to wire the library's pieces together the way an
// external driver would, and to give the `ExternalTools` trait a process-
// exec-backed implementation (spec.md §6's "each by process exec with
// command-line path + mesh basename").
// -------------------------------------------------------------------------

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use mpd_core::config::Config;
use mpd_core::error::Error;
use mpd_core::io::chem::read_chem_file;
use mpd_core::orchestrator::{ExternalTools, Orchestrator};

/// Shells out to the configured tool path, passing the mesh's basename
/// (without extension) as its sole argument, per spec.md §6.
struct ProcessTools {
    path_mmg3d: String,
    path_mshdist: String,
    path_elastic: String,
    path_advect: String,
}

impl ProcessTools {
    fn run(component: &'static str, tool_name: &'static str, exe: &str, mesh_path: &Path) -> Result<(), Error> {
        let basename = mesh_path.with_extension("");
        let status = Command::new(exe)
            .arg(&basename)
            .status()
            .map_err(|e| Error::FileSystemError {
                component,
                path: exe.to_string(),
                source: e,
            })?;
        if !status.success() {
            return Err(Error::ExternalToolFailure {
                component,
                tool: tool_name,
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

impl ExternalTools for ProcessTools {
    fn remesh(&self, mesh_path: &Path) -> Result<(), Error> {
        Self::run("Orchestrator", "mmg3d", &self.path_mmg3d, mesh_path)
    }
    fn redistance(&self, mesh_path: &Path) -> Result<(), Error> {
        Self::run("Orchestrator", "mshdist", &self.path_mshdist, mesh_path)
    }
    fn extend(&self, mesh_path: &Path) -> Result<(), Error> {
        Self::run("Orchestrator", "elastic", &self.path_elastic, mesh_path)
    }
    fn advect(&self, mesh_path: &Path) -> Result<(), Error> {
        Self::run("Orchestrator", "advect", &self.path_advect, mesh_path)
    }
}

fn run(info_path: &str, chem_path: &str) -> Result<(), Error> {
    let info_text = fs::read_to_string(info_path).map_err(|e| Error::FileSystemError {
        component: "main",
        path: info_path.to_string(),
        source: e,
    })?;
    let config = Config::from_info_str(&info_text)?;

    let system = read_chem_file(chem_path)?;
    info!(
        "chemistry loaded: {} nuclei, {} orbitals, {} determinants, n_u={}",
        system.nuclei.len(),
        system.orbitals.len(),
        system.determinants.len(),
        config.optimization.nu_electrons
    );

    let tools = ProcessTools {
        path_mmg3d: config.tools.path_mmg3d.clone(),
        path_mshdist: config.tools.path_mshdist.clone(),
        path_elastic: config.tools.path_elastic.clone(),
        path_advect: config.tools.path_advect.clone(),
    };
    let scratch_dir = PathBuf::from(".");
    let mut orch = Orchestrator::new(config.clone(), system, &tools, scratch_dir)?;

    orch.apply_domain()?;
    let metric_field = orch.build_metric_field()?;
    info!("metric built over {} vertices", metric_field.len());

    orch.remesh(&metric_field)?;
    orch.redistance()?;
    orch.remesh_prime(&metric_field)?;

    for iter in 0..config.optimization.iter_max {
        let report = orch.run_iteration(iter, &metric_field)?;
        info!(
            "iter {}: P_nu = {:.6}, dP = {:.2e}, |G| = {:.2e}",
            report.iteration, report.probability, report.delta_probability, report.gradient_norm
        );
        if report.converged {
            break;
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: mpd <config.info> <system.chem>");
        std::process::exit(1);
    }

    if let Err(e) = run(&args[1], &args[2]) {
        eprintln!("mpd: {}", e);
        std::process::exit(1);
    }
}
