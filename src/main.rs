//main.rs
use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use player_som::ingest::parse_bound;
use player_som::{
    cluster_dataset, export, DataSet, LoadOptions, RangeMode, RowFilter, TrainingConfig,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[clap(version = "0.1.0", author = "Stefan L. <stefan.lang@med.lu.se>")]
struct Opts {
    /// Input table with a header line
    #[clap(short, long)]
    file: PathBuf,

    /// Number of clusters
    #[clap(short, long, default_value_t = 3)]
    k: usize,

    #[clap(long, default_value_t = 0.3)]
    learning_rate: f64,

    /// Learning-rate decrement per level
    #[clap(long, default_value_t = 0.05)]
    decay: f64,

    /// Passes over the data per learning-rate level
    #[clap(long, default_value_t = 10)]
    repeats: usize,

    #[clap(long)]
    seed: Option<u64>,

    /// Reproduce the old single-scan range computation
    #[clap(long)]
    legacy_range: bool,

    /// Field delimiter of the input table
    #[clap(short, long, default_value_t = '\t')]
    delimiter: char,

    /// Two identity columns passed through to the output
    #[clap(long, num_args = 2, default_values = ["Player", "Tm"])]
    identity: Vec<String>,

    /// Columns excluded from the features (repeatable)
    #[clap(long = "drop")]
    drop_columns: Vec<String>,

    /// Keep rows with COLUMN >= VALUE (repeatable)
    #[clap(long, value_parser = bound)]
    at_least: Vec<(String, f64)>,

    /// Keep rows with COLUMN <= VALUE (repeatable)
    #[clap(long, value_parser = bound)]
    at_most: Vec<(String, f64)>,

    /// Cut the player label at this character
    #[clap(long)]
    name_separator: Option<char>,

    /// Directory for the per-cluster member lists
    #[clap(short, long, default_value = ".")]
    outdir: PathBuf,

    /// File name stem of the member lists
    #[clap(long, default_value = "clusters")]
    stem: String,
}

fn bound(s: &str) -> Result<(String, f64), String> {
    parse_bound(s).map_err(|e| e.to_string())
}

impl Opts {
    fn load_options(&self) -> Result<LoadOptions> {
        if !self.delimiter.is_ascii() {
            return Err(anyhow!("delimiter must be a single ASCII character"));
        }
        let mut opts = LoadOptions::new(&self.identity[0], &self.identity[1])
            .delimiter(self.delimiter as u8);
        for column in &self.drop_columns {
            opts = opts.drop_column(column);
        }
        for (column, value) in &self.at_least {
            opts = opts.filter(RowFilter::AtLeast {
                column: column.clone(),
                value: *value,
            });
        }
        for (column, value) in &self.at_most {
            opts = opts.filter(RowFilter::AtMost {
                column: column.clone(),
                value: *value,
            });
        }
        if let Some(sep) = self.name_separator {
            opts = opts.name_separator(sep);
        }
        Ok(opts)
    }

    fn training_config(&self) -> TrainingConfig {
        let mut config = TrainingConfig::new(self.k)
            .learning_rate(self.learning_rate)
            .decay(self.decay)
            .repeats(self.repeats);
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        if self.legacy_range {
            config = config.range_mode(RangeMode::LegacyScan);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    let ds = DataSet::from_tsv(&opts.file, &opts.load_options()?)?;
    println!(
        "Loaded {} rows × {} features",
        ds.n_records(),
        ds.n_features()
    );

    let config = opts.training_config();
    let started = Instant::now();
    let model = cluster_dataset(&ds, &config)?;
    info!(
        "Training took {:.4} seconds ({} levels, final error {:.4})",
        started.elapsed().as_secs_f64(),
        model.summary.levels.len(),
        model.summary.final_error().unwrap_or(f64::NAN)
    );

    println!("{}", model.report);

    export::write_memberships(&model.report, &opts.outdir, &opts.stem)?;
    export::write_prototypes(
        &model.report,
        opts.outdir.join(format!("{}_prototypes.tsv", opts.stem)),
        b'\t',
    )?;

    Ok(())
}
