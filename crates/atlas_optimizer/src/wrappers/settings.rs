use std::{env, path::PathBuf};

use jiff::SignedDuration;

pub const ORTOOLS_EXEC_ENV: &str = "ATLAS_ORTOOLS_EXEC";
pub const VROOM_EXEC_ENV: &str = "ATLAS_VROOM_EXEC";
pub const TMP_DIR_ENV: &str = "ATLAS_TMP_DIR";

/// Process-level solver configuration, shared by every job.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    pub ortools_exec: PathBuf,
    pub vroom_exec: PathBuf,
    /// Directory of the exchange files, the system one when unset.
    pub tmp_dir: Option<PathBuf>,
    /// Time limit used when the problem sets none.
    pub default_duration: Option<SignedDuration>,
    pub default_iterations_without_improvement: Option<u64>,
    pub default_time_out_multiplier: Option<f64>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            ortools_exec: PathBuf::from("../optimizer-ortools/tsp_simple"),
            vroom_exec: PathBuf::from("../vroom/bin/vroom"),
            tmp_dir: None,
            default_duration: None,
            default_iterations_without_improvement: None,
            default_time_out_multiplier: None,
        }
    }
}

impl SolverSettings {
    /// Defaults overridden by the `ATLAS_*` environment variables.
    pub fn from_env() -> Self {
        let mut settings = SolverSettings::default();
        if let Some(exec) = env::var_os(ORTOOLS_EXEC_ENV) {
            settings.ortools_exec = PathBuf::from(exec);
        }
        if let Some(exec) = env::var_os(VROOM_EXEC_ENV) {
            settings.vroom_exec = PathBuf::from(exec);
        }
        settings.tmp_dir = env::var_os(TMP_DIR_ENV).map(PathBuf::from);
        settings
    }
}
