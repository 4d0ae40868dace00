//! `plait`: encode files into coupled-layer erasure-coded fragments, decode
//! them back, and repair lost fragments.
//!
//! # Usage
//!
//! ```text
//! plait encode photo.jpg                        # k=4, m=2 reed_sol_van into ./Coding
//! plait encode photo.jpg -k 10 -m 4 -t cauchy_good -w 8 --packetsize 1024
//! plait encode --synthetic 104857600            # speed test on generated data
//! plait decode photo.jpg                        # writes Coding/photo_decoded.jpg
//! plait repair photo.jpg                        # rebuild missing or corrupt fragments
//! plait inspect photo.jpg                       # metadata and fragment health
//! ```

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use plait_layer::{CodecStats, LayeredCodec, MeteredSource, ProgressContext, RepairStrategy};
use plait_store::{FileStore, FragmentStatus};
use plait_types::Technique;
use tracing::{debug, info, warn};

use config::CliConfig;

/// How often the progress poller reports.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "plait",
    version,
    about = "Coupled-layer erasure coding for files"
)]
struct Cli {
    /// Path to TOML config file (default: ~/.plait/plait.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding fragments and metadata.
    #[arg(short = 'd', long, global = true)]
    coding_dir: Option<PathBuf>,

    /// Print read-in progress to stderr while working.
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file into k data and m coding fragments.
    Encode(EncodeArgs),

    /// Rebuild the original file from the surviving fragments.
    Decode {
        /// Name of the encoded file (as given to `encode`).
        name: String,

        /// Skip hashing fragments before decoding.
        #[arg(long)]
        no_verify: bool,
    },

    /// Rebuild lost or corrupt fragments in place.
    Repair {
        /// Name of the encoded file.
        name: String,

        /// Fragment indices to rebuild (0-based). Defaults to every
        /// missing or corrupt fragment.
        #[arg(short, long)]
        fragment: Vec<usize>,

        /// Skip hashing fragments before repairing.
        #[arg(long)]
        no_verify: bool,
    },

    /// Show metadata and fragment health of an encoded file.
    Inspect {
        /// Name of the encoded file.
        name: String,
    },
}

#[derive(Args)]
struct EncodeArgs {
    /// File to encode.
    #[arg(required_unless_present = "synthetic")]
    input: Option<PathBuf>,

    /// Encode this many bytes of generated data instead of a file.
    #[arg(long, conflicts_with = "input")]
    synthetic: Option<usize>,

    /// Number of data fragments.
    #[arg(short)]
    k: Option<usize>,

    /// Number of coding fragments.
    #[arg(short)]
    m: Option<usize>,

    /// Word size in bits.
    #[arg(short)]
    w: Option<u32>,

    /// Coding technique (reed_sol_van, reed_sol_r6_op, cauchy_orig,
    /// cauchy_good, liberation, blaum_roth, liber8tion).
    #[arg(short, long)]
    technique: Option<Technique>,

    /// Packet size in bytes (bitmatrix techniques only).
    #[arg(long)]
    packetsize: Option<usize>,

    /// Buffer size hint in bytes; 0 picks one automatically.
    #[arg(long)]
    buffersize: Option<usize>,

    /// Layers per stripe.
    #[arg(long)]
    layers: Option<usize>,
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init(&config.log.level);

    // CLI args override config file values.
    if let Some(dir) = cli.coding_dir {
        config.storage.coding_dir = dir;
    }

    match cli.command {
        Commands::Encode(args) => cmd_encode(config, args, cli.progress),
        Commands::Decode { name, no_verify } => {
            if no_verify {
                config.storage.verify_digests = false;
            }
            cmd_decode(&config, &name, cli.progress)
        }
        Commands::Repair {
            name,
            fragment,
            no_verify,
        } => {
            if no_verify {
                config.storage.verify_digests = false;
            }
            cmd_repair(&config, &name, &fragment)
        }
        Commands::Inspect { name } => cmd_inspect(&config, &name),
    }
}

// -----------------------------------------------------------------------
// plait encode
// -----------------------------------------------------------------------

fn cmd_encode(mut config: CliConfig, args: EncodeArgs, progress: bool) -> Result<()> {
    let coding = &mut config.coding;
    if let Some(k) = args.k {
        coding.k = k;
    }
    if let Some(m) = args.m {
        coding.m = m;
    }
    if let Some(w) = args.w {
        coding.w = w;
    }
    if let Some(t) = args.technique {
        coding.technique = t;
    }
    if let Some(p) = args.packetsize {
        coding.packetsize = p;
    }
    if let Some(b) = args.buffersize {
        coding.buffersize = b;
    }
    if args.layers.is_some() {
        coding.layers = args.layers;
    }

    let (name, data) = match (&args.input, args.synthetic) {
        (_, Some(size)) => (format!("synthetic-{size}.bin"), generate_data(size)),
        (Some(path), None) => {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("invalid input path {}", path.display()))?
                .to_string();
            let data =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            (name, data)
        }
        (None, None) => bail!("an input file or --synthetic size is required"),
    };

    let params = config.codec_params();
    info!(
        name = %name,
        size = data.len(),
        k = params.code.k,
        m = params.code.m,
        w = params.code.w,
        technique = %params.code.technique,
        layers = params.layers,
        "encoding"
    );

    let mut codec = LayeredCodec::new(params).context("invalid coding parameters")?;
    let ctx = progress.then(|| Arc::new(ProgressContext::new(params.code.technique)));
    if let Some(ctx) = &ctx {
        codec = codec.with_progress(ctx.clone());
    }

    let encoded = with_progress(ctx.as_deref(), || codec.encode(&name, &data))
        .with_context(|| format!("failed to encode {name}"))?;
    let dir = &config.storage.coding_dir;
    let store = FileStore::save(dir, &encoded)
        .with_context(|| format!("failed to store fragments in {}", dir.display()))?;

    let meta = store.meta();
    println!(
        "Encoded {} ({} bytes) into {} fragments of {} bytes",
        meta.name,
        meta.original_size,
        meta.k + meta.m,
        meta.fragment_size()
    );
    println!(
        "  {} k={} m={} w={} layers={} blocksize={} readins={}",
        meta.technique, meta.k, meta.m, meta.w, meta.layers, meta.blocksize, meta.readins
    );
    println!("  metadata: {}", store.names().meta().display());
    print_rates("Encoding", "En_Total", &encoded.stats);
    Ok(())
}

// -----------------------------------------------------------------------
// plait decode
// -----------------------------------------------------------------------

fn cmd_decode(config: &CliConfig, name: &str, progress: bool) -> Result<()> {
    let store = open_store(config, name)?;
    let meta = store.meta();

    let mut codec = LayeredCodec::from_meta(meta).context("metadata describes an invalid codec")?;
    let ctx = progress.then(|| Arc::new(ProgressContext::new(meta.technique)));
    if let Some(ctx) = &ctx {
        codec = codec.with_progress(ctx.clone());
    }

    let decoded = with_progress(ctx.as_deref(), || codec.decode(meta, &store))
        .with_context(|| format!("failed to decode {name}"))?;
    let path = store
        .write_decoded(&decoded.data)
        .context("failed to write decoded file")?;

    println!("Decoded {} ({} bytes) to {}", meta.name, meta.original_size, path.display());
    print_rates("Decoding", "De_Total", &decoded.stats);
    Ok(())
}

// -----------------------------------------------------------------------
// plait repair
// -----------------------------------------------------------------------

fn cmd_repair(config: &CliConfig, name: &str, requested: &[usize]) -> Result<()> {
    let store = open_store(config, name)?;
    let meta = store.meta();
    let codec = LayeredCodec::from_meta(meta).context("metadata describes an invalid codec")?;

    let targets = if requested.is_empty() {
        store.unhealthy()
    } else {
        requested.to_vec()
    };
    if targets.is_empty() {
        println!("All {} fragments of {} are healthy", meta.k + meta.m, meta.name);
        return Ok(());
    }

    for index in targets {
        let source = MeteredSource::new(&store);
        let repaired = codec
            .repair(meta, &source, index)
            .with_context(|| format!("failed to repair fragment {index}"))?;
        store
            .write_fragment(index, &repaired.data)
            .with_context(|| format!("failed to write fragment {index}"))?;

        let strategy = match repaired.strategy {
            RepairStrategy::RepairPlanes => "repair planes",
            RepairStrategy::FullDecode => "full decode",
        };
        println!(
            "Repaired {} via {strategy}: read {} bytes for {} rebuilt ({:.2}s)",
            store.fragment_path(index).display(),
            source.bytes_read(),
            repaired.data.len(),
            repaired.stats.total.as_secs_f64()
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// plait inspect
// -----------------------------------------------------------------------

fn cmd_inspect(config: &CliConfig, name: &str) -> Result<()> {
    let store = open_store(config, name)?;
    let meta = store.meta();

    println!("{}", meta.name);
    println!("  size:       {} bytes", meta.original_size);
    println!("  object id:  {}", meta.object_id);
    println!(
        "  code:       {} (id {}) k={} m={} w={} packetsize={}",
        meta.technique, meta.technique_id, meta.k, meta.m, meta.w, meta.packetsize
    );
    println!(
        "  layout:     layers={} blocksize={} readins={} buffersize={}",
        meta.layers, meta.blocksize, meta.readins, meta.buffersize
    );
    println!("  fragments:  {} bytes each", meta.fragment_size());
    for index in 0..meta.k + meta.m {
        let status = match store.status(index) {
            Some(FragmentStatus::Healthy) => "ok".to_string(),
            Some(FragmentStatus::Missing) => "missing".to_string(),
            Some(FragmentStatus::WrongSize { actual }) => format!("wrong size ({actual} bytes)"),
            Some(FragmentStatus::Corrupt) => "corrupt".to_string(),
            None => "unknown".to_string(),
        };
        println!(
            "    {:<3} {:<8} {}  {}",
            index,
            status,
            meta.fragments[index],
            store.fragment_path(index).display()
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

/// Open the stored object and, if configured, hash every fragment.
fn open_store(config: &CliConfig, name: &str) -> Result<FileStore> {
    let dir = &config.storage.coding_dir;
    let store = FileStore::open(dir, name)
        .with_context(|| format!("failed to open {name} in {}", dir.display()))?;
    if config.storage.verify_digests {
        let corrupt = store.verify().context("failed to verify fragments")?;
        if corrupt > 0 {
            warn!(corrupt, "corrupt fragments will be treated as erased");
        }
    }
    debug!(unhealthy = ?store.unhealthy(), "opened {name}");
    Ok(store)
}

/// Run `f`, printing progress snapshots from a side thread when a context
/// is given.
fn with_progress<T>(ctx: Option<&ProgressContext>, f: impl FnOnce() -> T) -> T {
    let Some(ctx) = ctx else {
        return f();
    };
    let (done_tx, done_rx) = mpsc::channel::<()>();
    std::thread::scope(|s| {
        s.spawn(move || {
            loop {
                let snap = ctx.snapshot();
                eprintln!(
                    "{}: read-in {}/{} ({:.1}%)",
                    snap.technique,
                    snap.current_readin,
                    snap.total_readins,
                    snap.fraction() * 100.0
                );
                match done_rx.recv_timeout(PROGRESS_INTERVAL) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
            }
        });
        let out = f();
        // Wakes the poller immediately.
        drop(done_tx);
        out
    })
}

fn print_rates(coding_label: &str, total_label: &str, stats: &CodecStats) {
    println!("  {coding_label} (MB/sec): {:.4}", stats.coding_rate());
    println!("  {total_label} (MB/sec): {:.4}", stats.total_rate());
}

/// Generate deterministic data for speed tests.
fn generate_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}
