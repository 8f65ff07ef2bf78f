use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spookyhash::{
    mixers::MIXERS,
    stats::{
        compute_stats, generate_8_random_bits, generate_bit_combinations, generate_counting,
        generate_random, generate_single_1_bit,
    },
    AnalysisError,
};

/// Measures avalanche behaviour of SpookyHash's mixing components.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Only run mixers whose name contains one of these (case-insensitive).
    filters: Vec<String>,

    /// Also compute bit independence statistics.  Slow for wide mixers.
    #[arg(long)]
    bic: bool,

    /// Skip the avalanche statistics.
    #[arg(long)]
    no_avalanche: bool,

    /// Rounds per input pattern.
    #[arg(long, default_value_t = 1 << 16)]
    rounds: usize,

    /// Directory to write avalanche charts to.  No images without it.
    #[arg(long)]
    png_dir: Option<PathBuf>,
}

/// A family of inputs to feed each mixer.
struct InputPattern {
    name: &'static str,
    generate: fn(usize, &mut [u8]),

    /// `None` runs one round per input bit.  Those samples are too few for
    /// even an ideal mixer to score near-perfect avalanche or BIC.
    rounds: Option<usize>,
}

const PATTERNS: [InputPattern; 5] = [
    InputPattern { name: "random", generate: generate_random, rounds: Some(1 << 16) },
    InputPattern { name: "counting", generate: generate_counting, rounds: Some(1 << 16) },
    InputPattern {
        name: "bit combinations",
        generate: generate_bit_combinations,
        rounds: Some(1 << 16),
    },
    InputPattern { name: "8 random bits", generate: generate_8_random_bits, rounds: Some(1 << 16) },
    InputPattern { name: "single-bit", generate: generate_single_1_bit, rounds: None },
];

fn main() -> Result<(), AnalysisError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let do_avalanche = !args.no_avalanche;
    let name_filters: Vec<String> = args.filters.iter().map(|f| f.to_lowercase()).collect();

    if let Some(dir) = &args.png_dir {
        std::fs::create_dir_all(dir)?;
    }

    let selected = MIXERS.iter().filter(|mixer| {
        let lower_name = mixer.name.to_lowercase();
        name_filters.is_empty() || name_filters.iter().any(|f| lower_name.contains(f.as_str()))
    });

    for mixer in selected {
        println!("\n================================");
        println!("{}", mixer.name);
        for pattern in &PATTERNS {
            let rounds = pattern
                .rounds
                .map_or(mixer.input_size * 8, |cap| cap.min(args.rounds));
            info!(mixer = mixer.name, pattern = pattern.name, rounds, "running");

            println!("\nInput bit pattern: {}", pattern.name);
            let stats = compute_stats(
                pattern.generate,
                mixer,
                rounds,
                do_avalanche,
                args.bic,
            )?;
            print!("{stats}");

            if let (true, Some(dir)) = (do_avalanche, &args.png_dir) {
                let path = dir.join(format!("{} - {}.png", mixer.name, pattern.name));
                stats.write_avalanche_png(&path)?;
                info!(path = %path.display(), "wrote avalanche chart");
            }
        }
    }

    Ok(())
}
