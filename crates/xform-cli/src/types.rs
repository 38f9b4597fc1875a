use std::path::PathBuf;

use xform_build::BuildStats;

#[derive(Debug)]
pub struct BuildResult {
    pub template: PathBuf,
    /// `None` for a dry run.
    pub output: Option<PathBuf>,
    pub stats: BuildStats,
}
