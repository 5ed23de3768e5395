use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex_gen::{BackrefMode, DEFAULT_REPEAT_SLACK, GenConfig, Pattern};

#[derive(Parser)]
#[command(name = "regex-gen")]
#[command(about = "Generate random strings that match (or, with \\i, fail) a pattern")]
#[command(long_about = None)]
struct Cli {
    /// Pattern to generate from
    pattern: String,

    /// Number of strings to print, one per line
    #[arg(short = 'n', long, env = "REGEX_GEN_COUNT", default_value_t = 1)]
    count: usize,

    /// Seed for reproducible output
    #[arg(long, env = "REGEX_GEN_SEED")]
    seed: Option<u64>,

    /// Extra iterations allowed for unbounded repeats
    #[arg(long, env = "REGEX_GEN_SLACK", default_value_t = DEFAULT_REPEAT_SLACK)]
    slack: usize,

    /// How backreferences produce their text
    #[arg(long, value_enum, env = "REGEX_GEN_BACKREFS", default_value_t = BackrefMode::Replay)]
    backrefs: BackrefMode,

    /// Do not check that invalid output really fails to match
    #[arg(long)]
    no_verify: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let pattern = Pattern::compile(&cli.pattern)
        .with_context(|| format!("Failed to compile pattern {:?}", cli.pattern))?;
    let config = GenConfig::default()
        .with_repeat_slack(cli.slack)
        .with_backrefs(cli.backrefs)
        .with_verify(!cli.no_verify);

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    tracing::info!(
        pattern = %cli.pattern,
        count = cli.count,
        seed = ?cli.seed,
        invalidating = pattern.is_invalidating(),
        "generating"
    );

    for i in 0..cli.count {
        let generated = pattern
            .generate(&mut rng, &config)
            .with_context(|| format!("Failed to generate string {} of {}", i + 1, cli.count))?;
        println!("{generated}");
    }
    Ok(())
}
