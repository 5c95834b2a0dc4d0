//! Named IQ-TREE operations: build the command, run it, locate or parse
//! what it wrote.
//!
//! Operations that take an optional prefix run inside a scoped temporary
//! directory when none is given; the directory is removed when the
//! operation returns, on success and on every error path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info};

use crate::command::{CommandBuilder, CommandSpec, ExtraFlags, RunMode, StartTree};
use crate::config::IqTreeConfig;
use crate::error::{IqRunError, Result};
use crate::extract::{
    alignment_composition, topology_distances, AlignmentComposition, LogText,
    TopologyDistanceSummary,
};
use crate::runner::{Executor, ProcessRunner, RunOutcome};

pub const LOG_SUFFIX: &str = ".log";
pub const TREE_SUFFIX: &str = ".treefile";
pub const REPORT_SUFFIX: &str = ".iqtree";
const PAIR_SUFFIX: &str = ".pair.trees";

/// `<prefix><suffix>`, appended to the final path component rather than
/// replacing an extension.
pub fn artifact_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut raw = OsString::from(prefix.as_os_str());
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Output location for one operation. A scoped location owns its directory.
enum Workspace {
    Explicit(PathBuf),
    Scoped { _dir: TempDir, prefix: PathBuf },
}

impl Workspace {
    fn prefix(&self) -> &Path {
        match self {
            Workspace::Explicit(prefix) => prefix,
            Workspace::Scoped { prefix, .. } => prefix,
        }
    }
}

/// Facade over one IQ-TREE executable.
#[derive(Clone)]
pub struct IqTree {
    executor: Arc<dyn Executor>,
    builder: CommandBuilder,
    scratch_dir: Option<PathBuf>,
}

impl std::fmt::Debug for IqTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IqTree")
            .field("builder", &self.builder)
            .field("scratch_dir", &self.scratch_dir)
            .finish_non_exhaustive()
    }
}

impl IqTree {
    /// Facade that runs `executable` as a real child process without a timeout.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self::with_executor(executable, Arc::new(ProcessRunner::new()))
    }

    pub fn from_config(config: &IqTreeConfig) -> Self {
        let runner = ProcessRunner::new().with_timeout(config.timeout_secs);
        let mut facade = Self::with_executor(config.executable.clone(), Arc::new(runner));
        facade.scratch_dir = config.scratch_dir.clone();
        facade
    }

    /// Facade over an arbitrary [`Executor`].
    pub fn with_executor(executable: impl Into<PathBuf>, executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            builder: CommandBuilder::new(executable),
            scratch_dir: None,
        }
    }

    /// Create implicit-prefix scratch directories under `dir`.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }

    /// Parsimony-only search for `count` trees; returns `<prefix>.treefile`.
    pub async fn infer_parsimony_trees(
        &self,
        alignment: &Path,
        model: &str,
        prefix: &Path,
        count: u32,
        extra: &ExtraFlags,
    ) -> Result<PathBuf> {
        let mode = RunMode::ParsimonyTrees { count };
        let command = self
            .builder
            .alignment_run(alignment, model, prefix, &mode, extra)?;
        self.run(mode.name(), &command).await?;
        require_artifact(prefix, TREE_SUFFIX).await
    }

    /// Full tree search; returns `<prefix>.treefile`.
    pub async fn infer_tree(
        &self,
        alignment: &Path,
        model: &str,
        prefix: &Path,
        start: StartTree,
        extra: &ExtraFlags,
    ) -> Result<PathBuf> {
        let mode = RunMode::TreeSearch { start };
        let command = self
            .builder
            .alignment_run(alignment, model, prefix, &mode, extra)?;
        self.run(mode.name(), &command).await?;
        require_artifact(prefix, TREE_SUFFIX).await
    }

    /// Score a fixed tree; returns `<prefix>.log`.
    pub async fn evaluate_tree(
        &self,
        alignment: &Path,
        tree: &Path,
        model: &str,
        prefix: &Path,
        extra: &ExtraFlags,
    ) -> Result<PathBuf> {
        let mode = RunMode::Evaluate {
            tree: tree.to_path_buf(),
        };
        let command = self
            .builder
            .alignment_run(alignment, model, prefix, &mode, extra)?;
        self.run(mode.name(), &command).await?;
        require_artifact(prefix, LOG_SUFFIX).await
    }

    /// Topology tests of `trees` against `reference`; returns `<prefix>.iqtree`.
    pub async fn run_significance_tests(
        &self,
        alignment: &Path,
        trees: &Path,
        reference: &Path,
        model: &str,
        prefix: &Path,
        extra: &ExtraFlags,
    ) -> Result<PathBuf> {
        let mode = RunMode::SignificanceTests {
            trees: trees.to_path_buf(),
            reference: reference.to_path_buf(),
        };
        let command = self
            .builder
            .alignment_run(alignment, model, prefix, &mode, extra)?;
        self.run(mode.name(), &command).await?;
        require_artifact(prefix, REPORT_SUFFIX).await
    }

    /// Pairwise RF distances between the trees in `trees`.
    pub async fn topology_distances(
        &self,
        trees: &Path,
        prefix: Option<&Path>,
        extra: &ExtraFlags,
    ) -> Result<TopologyDistanceSummary> {
        let workspace = self.workspace(prefix, "rfdist")?;
        let command = self
            .builder
            .rf_distances(trees, workspace.prefix(), extra)?;
        self.run("rf_distances", &command).await?;

        let log = read_log(workspace.prefix()).await?;
        Ok(topology_distances(&log)?)
    }

    /// Relative RF distance between a starting tree and the tree a search
    /// ended with. The first line of each file is taken as its Newick tree;
    /// the pair is written to `<prefix>.pair.trees` and fed to an RF run.
    pub async fn starting_final_rf_distance(
        &self,
        starting_tree: &Path,
        final_tree: &Path,
        prefix: Option<&Path>,
        extra: &ExtraFlags,
    ) -> Result<f64> {
        let workspace = self.workspace(prefix, "start_final")?;
        let pair = artifact_path(workspace.prefix(), PAIR_SUFFIX);
        let mut contents = String::new();
        for tree in [starting_tree, final_tree] {
            contents.push_str(first_line(&tokio::fs::read_to_string(tree).await?));
            contents.push('\n');
        }
        tokio::fs::write(&pair, contents).await?;

        let command = self
            .builder
            .rf_distances(&pair, workspace.prefix(), extra)?;
        self.run("starting_final_rf_distance", &command).await?;

        let log = read_log(workspace.prefix()).await?;
        Ok(topology_distances(&log)?.mean_relative_distance)
    }

    /// Have the tool parse `alignment` and report its composition.
    pub async fn alignment_composition(
        &self,
        alignment: &Path,
        model: &str,
        prefix: Option<&Path>,
        extra: &ExtraFlags,
    ) -> Result<AlignmentComposition> {
        let workspace = self.workspace(prefix, "parse")?;
        let mode = RunMode::AlignmentParse;
        let command =
            self.builder
                .alignment_run(alignment, model, workspace.prefix(), &mode, extra)?;
        self.run(mode.name(), &command).await?;

        let log = read_log(workspace.prefix()).await?;
        Ok(alignment_composition(&log)?)
    }

    async fn run(&self, mode: &'static str, command: &CommandSpec) -> Result<RunOutcome> {
        info!(mode, prefix = command.value_of("pre"), "Starting IQ-TREE run");
        debug!(command = %command, "IQ-TREE command line");

        let outcome = self.executor.execute(command).await?;

        info!(
            mode,
            exit_code = outcome.exit_code,
            duration_ms = outcome.duration_ms,
            "IQ-TREE run finished"
        );
        Ok(outcome)
    }

    fn workspace(&self, prefix: Option<&Path>, stem: &str) -> Result<Workspace> {
        if let Some(prefix) = prefix {
            return Ok(Workspace::Explicit(prefix.to_path_buf()));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("iqrun-");
        let dir = match &self.scratch_dir {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let prefix = dir.path().join(stem);
        debug!(dir = %dir.path().display(), "Created scoped work directory");
        Ok(Workspace::Scoped { _dir: dir, prefix })
    }
}

async fn require_artifact(prefix: &Path, suffix: &str) -> Result<PathBuf> {
    let path = artifact_path(prefix, suffix);
    if tokio::fs::try_exists(&path).await? {
        Ok(path)
    } else {
        Err(IqRunError::MissingArtifact { path })
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

async fn read_log(prefix: &Path) -> Result<LogText> {
    let path = require_artifact(prefix, LOG_SUFFIX).await?;
    let bytes = tokio::fs::read(&path).await?;
    Ok(LogText::new(path, String::from_utf8_lossy(&bytes).into_owned()))
}
