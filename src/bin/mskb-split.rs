use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use mskb_split::download::MASSIVE_DOWNLOAD_URL;
use mskb_split::{pipeline, MassiveDownloader, PipelineConfig, SageRunner, SplitSizes};

/// mskb-split CLI
#[derive(Parser)]
#[command(name = "mskb-split")]
#[command(version)]
#[command(about = "Create data splits from MassIVE-KB and search them with Sage", long_about = None)]
struct Cli {
    /// Number of files in the training split
    n_train: usize,
    /// Number of files in the validation split
    n_valid: usize,
    /// Number of files in the test split
    n_test: usize,

    /// The random seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Project root; all default paths are resolved below it
    #[arg(long, env = "MSKB_SPLIT_ROOT", default_value = ".")]
    root: PathBuf,

    /// MassIVE-KB file table (TSV with a `spectrum_filename` column)
    #[arg(long)]
    metadata: Option<PathBuf>,
    /// Download cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Directory for per-split search results and splits.json
    #[arg(long)]
    results_dir: Option<PathBuf>,
    /// Sage executable
    #[arg(long)]
    sage: Option<PathBuf>,
    /// Sage JSON configuration
    #[arg(long)]
    sage_config: Option<PathBuf>,
    /// Protein FASTA database
    #[arg(long)]
    fasta: Option<PathBuf>,
    /// Directory for Sage logs
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// MassIVE download endpoint
    #[arg(long, default_value = MASSIVE_DOWNLOAD_URL)]
    base_url: String,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let mut c = PipelineConfig::from_root(&self.root);
        let overrides = [
            (&self.metadata, &mut c.metadata),
            (&self.cache_dir, &mut c.cache_dir),
            (&self.results_dir, &mut c.results_dir),
            (&self.sage, &mut c.sage_bin),
            (&self.sage_config, &mut c.sage_config),
            (&self.fasta, &mut c.fasta),
            (&self.log_dir, &mut c.log_dir),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        c
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = cli.config();
    let sizes = SplitSizes::new(cli.n_train, cli.n_valid, cli.n_test);
    let fetcher = MassiveDownloader::with_base_url(&config.cache_dir, cli.base_url.as_str())
        .context("building the MassIVE download client")?;
    let runner = SageRunner::new(config.search_config());

    let outcome = pipeline::run(&config, sizes, cli.seed, &fetcher, &runner)?;
    log::info!("Wrote {}", outcome.splits_json.display());
    Ok(())
}
