//! iqrun - drive IQ-TREE and extract statistics from its logs
//!
//! ## Commands
//!
//! - `parsimony`, `search`, `evaluate`, `significance`: run IQ-TREE and print
//!   the path of the artifact it produced
//! - `rfdist`, `rf-start-final`, `composition`: run IQ-TREE and print the
//!   parsed record as JSON
//! - `extract`: parse an existing log
//! - `collect`: gather one statistic over a list of logs

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use iqrun_core::batch::{
    collect_log_likelihoods, collect_parsimony_scores, collect_runtimes, read_log_list,
};
use iqrun_core::config::DEFAULT_EXECUTABLE;
use iqrun_core::extract::{
    alignment_composition, all_runtimes, iteration_count, likelihood_trace, log_summary,
    model_estimate, parsimony_scores, runtime, significance_tests, topology_distances,
};
use iqrun_core::telemetry::{init_tracing, report_notices};
use iqrun_core::{ExtraFlags, FlagValue, IqTree, IqTreeConfig, LogText, SampleStats, StartTree};

#[derive(Parser)]
#[command(name = "iqrun")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run IQ-TREE and extract typed statistics from its logs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// IQ-TREE executable
    #[arg(long, global = true, env = "IQRUN_IQTREE_BIN", default_value = DEFAULT_EXECUTABLE)]
    iqtree: PathBuf,

    /// Per-run timeout in seconds (0 = none)
    #[arg(long, global = true, env = "IQRUN_TIMEOUT_SECS", default_value_t = 0)]
    timeout_secs: u64,

    /// Root for temporary run directories (default: system temp dir)
    #[arg(long, global = true, env = "IQRUN_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Free-form IQ-TREE flags appended after the mode's own tokens.
#[derive(Args, Debug, Default)]
struct FlagArgs {
    /// Extra IQ-TREE flag, `name` or `name=value` (repeatable)
    #[arg(long = "flag", value_name = "K[=V]", value_parser = parse_flag)]
    flags: Vec<(String, Option<String>)>,
}

impl FlagArgs {
    fn to_extra(&self) -> ExtraFlags {
        let mut extra = ExtraFlags::new();
        for (name, value) in &self.flags {
            match value {
                Some(v) => extra.set(name, v.as_str()),
                None => extra.set(name, FlagValue::Switch),
            }
        }
        extra
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Infer maximum-parsimony trees
    Parsimony {
        #[arg(long)]
        msa: PathBuf,
        #[arg(long)]
        model: String,
        #[arg(long)]
        prefix: PathBuf,
        /// Number of parsimony trees
        #[arg(long, default_value_t = 100)]
        count: u32,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Run a full maximum-likelihood tree search
    Search {
        #[arg(long)]
        msa: PathBuf,
        #[arg(long)]
        model: String,
        #[arg(long)]
        prefix: PathBuf,
        /// Starting tree: pars, rand or bionj
        #[arg(long, default_value = "pars")]
        start: StartTree,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Evaluate a fixed tree
    Evaluate {
        #[arg(long)]
        msa: PathBuf,
        #[arg(long)]
        tree: PathBuf,
        #[arg(long)]
        model: String,
        #[arg(long)]
        prefix: PathBuf,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Run topology significance tests against a reference tree
    Significance {
        #[arg(long)]
        msa: PathBuf,
        /// File with candidate trees
        #[arg(long)]
        trees: PathBuf,
        #[arg(long)]
        reference: PathBuf,
        #[arg(long)]
        model: String,
        #[arg(long)]
        prefix: PathBuf,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Compute pairwise RF distances between trees
    Rfdist {
        #[arg(long)]
        trees: PathBuf,
        /// Output prefix (default: a temporary directory)
        #[arg(long)]
        prefix: Option<PathBuf>,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Relative RF distance between a starting and a final tree
    RfStartFinal {
        /// File whose first line is the starting tree
        #[arg(long)]
        starting_tree: PathBuf,
        /// File whose first line is the final tree
        #[arg(long)]
        final_tree: PathBuf,
        /// Output prefix (default: a temporary directory)
        #[arg(long)]
        prefix: Option<PathBuf>,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Report alignment composition (patterns, gaps, invariant sites)
    Composition {
        #[arg(long)]
        msa: PathBuf,
        #[arg(long)]
        model: String,
        /// Output prefix (default: a temporary directory)
        #[arg(long)]
        prefix: Option<PathBuf>,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Parse one statistic family from an existing log
    Extract {
        #[arg(value_enum)]
        kind: ExtractKind,
        log: PathBuf,
    },

    /// Gather one statistic over many logs
    Collect {
        /// File listing one log path per line
        #[arg(long)]
        log_list: PathBuf,
        #[arg(long, value_enum)]
        stat: CollectStat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExtractKind {
    Composition,
    Likelihood,
    Runtime,
    Runtimes,
    Iterations,
    Model,
    Rfdist,
    Parsimony,
    Summary,
    /// USER TREES table of a `.iqtree` report
    Significance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CollectStat {
    Likelihood,
    Parsimony,
    Runtime,
}

#[derive(Debug, Serialize)]
struct CollectReport {
    values: Vec<f64>,
    stats: Option<SampleStats>,
}

/// `name` or `name=value`.
fn parse_flag(raw: &str) -> std::result::Result<(String, Option<String>), String> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (raw, None),
    };
    let name = name.trim().trim_start_matches('-');
    if name.is_empty() {
        return Err(format!("flag '{raw}' has no name"));
    }
    Ok((name.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = IqTreeConfig {
        executable: cli.iqtree,
        timeout_secs: cli.timeout_secs,
        scratch_dir: cli.scratch_dir,
    };

    match cli.command {
        Commands::Parsimony {
            msa,
            model,
            prefix,
            count,
            flags,
        } => {
            let tree = IqTree::from_config(&config)
                .infer_parsimony_trees(&msa, &model, &prefix, count, &flags.to_extra())
                .await
                .context("Parsimony tree inference failed")?;
            println!("{}", tree.display());
            Ok(())
        }
        Commands::Search {
            msa,
            model,
            prefix,
            start,
            flags,
        } => {
            let tree = IqTree::from_config(&config)
                .infer_tree(&msa, &model, &prefix, start, &flags.to_extra())
                .await
                .context("Tree search failed")?;
            println!("{}", tree.display());
            Ok(())
        }
        Commands::Evaluate {
            msa,
            tree,
            model,
            prefix,
            flags,
        } => {
            let log = IqTree::from_config(&config)
                .evaluate_tree(&msa, &tree, &model, &prefix, &flags.to_extra())
                .await
                .context("Tree evaluation failed")?;
            println!("{}", log.display());
            Ok(())
        }
        Commands::Significance {
            msa,
            trees,
            reference,
            model,
            prefix,
            flags,
        } => {
            let report = IqTree::from_config(&config)
                .run_significance_tests(&msa, &trees, &reference, &model, &prefix, &flags.to_extra())
                .await
                .context("Significance tests failed")?;
            println!("{}", report.display());
            Ok(())
        }
        Commands::Rfdist {
            trees,
            prefix,
            flags,
        } => {
            let summary = IqTree::from_config(&config)
                .topology_distances(&trees, prefix.as_deref(), &flags.to_extra())
                .await
                .context("RF distance computation failed")?;
            print_json(&summary)
        }
        Commands::RfStartFinal {
            starting_tree,
            final_tree,
            prefix,
            flags,
        } => {
            let distance = IqTree::from_config(&config)
                .starting_final_rf_distance(
                    &starting_tree,
                    &final_tree,
                    prefix.as_deref(),
                    &flags.to_extra(),
                )
                .await
                .context("Starting-to-final RF distance failed")?;
            print_json(&distance)
        }
        Commands::Composition {
            msa,
            model,
            prefix,
            flags,
        } => {
            let composition = IqTree::from_config(&config)
                .alignment_composition(&msa, &model, prefix.as_deref(), &flags.to_extra())
                .await
                .context("Alignment composition failed")?;
            print_json(&composition)
        }
        Commands::Extract { kind, log } => cmd_extract(kind, &log),
        Commands::Collect { log_list, stat } => cmd_collect(&log_list, stat).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

fn cmd_extract(kind: ExtractKind, path: &Path) -> Result<()> {
    let log = LogText::read(path)?;
    let value = extract_value(kind, &log)
        .with_context(|| format!("Failed to extract {kind:?} from {}", path.display()))?;
    print_json(&value)
}

/// Run the extractor for `kind` and render its record as JSON.
/// Notices are reported through tracing, not included in the output.
fn extract_value(kind: ExtractKind, log: &LogText) -> Result<Value> {
    let mut notices = Vec::new();
    let value = match kind {
        ExtractKind::Composition => serde_json::to_value(alignment_composition(log)?)?,
        ExtractKind::Likelihood => {
            serde_json::to_value(likelihood_trace(log)?.drain_into(&mut notices))?
        }
        ExtractKind::Runtime => serde_json::to_value(runtime(log)?)?,
        ExtractKind::Runtimes => serde_json::to_value(all_runtimes(log))?,
        ExtractKind::Iterations => serde_json::to_value(iteration_count(log).drain_into(&mut notices))?,
        ExtractKind::Model => serde_json::to_value(model_estimate(log))?,
        ExtractKind::Rfdist => serde_json::to_value(topology_distances(log)?)?,
        ExtractKind::Parsimony => serde_json::to_value(parsimony_scores(log))?,
        ExtractKind::Summary => serde_json::to_value(log_summary(log)?.drain_into(&mut notices))?,
        ExtractKind::Significance => serde_json::to_value(significance_tests(log)?)?,
    };
    report_notices(&notices);
    Ok(value)
}

async fn cmd_collect(log_list: &Path, stat: CollectStat) -> Result<()> {
    let paths = read_log_list(log_list).await?;
    info!(logs = paths.len(), stat = ?stat, "Collecting statistic");

    let values = collect_values(&paths, stat)
        .await
        .with_context(|| format!("Failed to collect {stat:?} from {}", log_list.display()))?;
    let stats = SampleStats::from_values(&values);
    print_json(&CollectReport { values, stats })
}

async fn collect_values(paths: &[PathBuf], stat: CollectStat) -> Result<Vec<f64>> {
    let values = match stat {
        CollectStat::Likelihood => collect_log_likelihoods(paths).await?,
        CollectStat::Runtime => collect_runtimes(paths).await?,
        CollectStat::Parsimony => collect_parsimony_scores(paths)
            .await?
            .into_iter()
            .map(|score| score as f64)
            .collect(),
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_switch_and_value() {
        assert_eq!(parse_flag("redo").unwrap(), ("redo".to_string(), None));
        assert_eq!(
            parse_flag("-seed=42").unwrap(),
            ("seed".to_string(), Some("42".to_string()))
        );
        assert_eq!(
            parse_flag("bb=1000").unwrap(),
            ("bb".to_string(), Some("1000".to_string()))
        );
        assert!(parse_flag("=5").is_err());
        assert!(parse_flag("--").is_err());
    }

    #[test]
    fn test_flag_args_preserve_order() {
        let args = FlagArgs {
            flags: vec![
                ("seed".to_string(), Some("1".to_string())),
                ("redo".to_string(), None),
                ("seed".to_string(), Some("2".to_string())),
            ],
        };
        let extra = args.to_extra();
        let entries: Vec<_> = extra.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("seed", &FlagValue::Value("2".to_string())));
        assert_eq!(entries[1], ("redo", &FlagValue::Switch));
    }

    #[test]
    fn test_cli_parses_search_with_flags() {
        let cli = Cli::try_parse_from([
            "iqrun",
            "--iqtree",
            "/opt/iqtree3",
            "search",
            "--msa",
            "gene.phy",
            "--model",
            "GTR+G",
            "--prefix",
            "runs/gene",
            "--start",
            "rand",
            "--flag",
            "seed=7",
            "--flag",
            "redo",
        ])
        .unwrap();
        assert_eq!(cli.iqtree, PathBuf::from("/opt/iqtree3"));
        match cli.command {
            Commands::Search { start, flags, .. } => {
                assert_eq!(start, StartTree::Rand);
                assert_eq!(flags.flags.len(), 2);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_start() {
        let result = Cli::try_parse_from([
            "iqrun", "search", "--msa", "a", "--model", "b", "--prefix", "c", "--start", "upgma",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_extract_and_collect() {
        let cli = Cli::try_parse_from(["iqrun", "extract", "summary", "run.log"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Extract {
                kind: ExtractKind::Summary,
                ..
            }
        ));

        let cli =
            Cli::try_parse_from(["iqrun", "collect", "--log-list", "logs.txt", "--stat", "runtime"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Collect {
                stat: CollectStat::Runtime,
                ..
            }
        ));
    }

    #[test]
    fn test_extract_value_renders_records() {
        let log = LogText::new(
            "rf.log",
            "Average RF distance: 18.42 (relative 0.276)\nNumber of unique topologies: 12\n",
        );
        let value = extract_value(ExtractKind::Rfdist, &log).unwrap();
        assert_eq!(value["topology_count"], 12);
        assert_eq!(value["mean_absolute_distance"], 18.42);

        let value = extract_value(ExtractKind::Iterations, &log).unwrap();
        assert_eq!(value, 0);
    }

    #[test]
    fn test_extract_value_renders_significance_table() {
        let report = LogText::new(
            "tests.iqtree",
            "USER TREES\n\
             Tree      logL    deltaL  p-KH     p-AU\n\
             -----------------------------------\n  \
             1 -100.5       0  0.9 +  0.8 +\n  \
             2 -120.0    19.5  0.01 -  0.002 -\n",
        );
        let value = extract_value(ExtractKind::Significance, &report).unwrap();
        assert_eq!(value[0]["plausible"], true);
        assert_eq!(value[1]["plausible"], false);
        assert_eq!(value[1]["tests"][1]["name"], "p-AU");
    }

    #[test]
    fn test_cli_parses_rf_start_final() {
        let cli = Cli::try_parse_from([
            "iqrun",
            "rf-start-final",
            "--starting-tree",
            "run.start.tree",
            "--final-tree",
            "run.treefile",
        ])
        .unwrap();
        match cli.command {
            Commands::RfStartFinal { prefix, .. } => assert!(prefix.is_none()),
            _ => panic!("expected rf-start-final"),
        }
    }

    #[test]
    fn test_extract_value_missing_field_is_error() {
        let log = LogText::new("parse.log", "nothing\n");
        let err = extract_value(ExtractKind::Composition, &log).unwrap_err();
        assert!(err.to_string().contains("patterns"));
    }

    #[tokio::test]
    async fn test_collect_values_from_log_list() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        std::fs::write(&a, "Parsimony score: 100\n").unwrap();
        std::fs::write(&b, "Parsimony score: 110\nParsimony score: 90\n").unwrap();

        let values = collect_values(&[a, b], CollectStat::Parsimony).await.unwrap();
        assert_eq!(values, vec![100.0, 110.0]);
        let stats = SampleStats::from_values(&values).unwrap();
        assert_eq!(stats.mean, 105.0);
    }
}
