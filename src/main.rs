use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use quotesmith::{AssetResolver, QuoteInput};

/// Generate an implant treatment estimate PDF from a JSON quote record.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to the quote input JSON file.
    input: PathBuf,

    /// Output PDF path. Defaults to the suggested filename in the current
    /// directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory holding the optional font, QR, logo, and evidence assets.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(path) => {
            println!("Wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(&args.input)?;
    let input: QuoteInput = serde_json::from_str(&json)?;
    let resolver = AssetResolver::new(&args.assets);
    let doc = quotesmith::generate_quote(&input, &resolver)?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&doc.filename));
    std::fs::write(&path, &doc.bytes)?;
    Ok(path)
}
