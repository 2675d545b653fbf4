//! Thin CLI around the variation engine: read a settings file, generate the
//! ensemble, write one JSON file per datapoint.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use aquifex_core::{EnsembleGenerator, RunState, Settings};

#[derive(Parser, Debug)]
#[command(name = "deckgen", about = "Generate simulation input datapoints from a settings file")]
struct Args {
    /// Path to a JSON settings file. Defaults apply when omitted.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Directory the datapoint files are written to.
    #[arg(short, long, default_value = "datasets_out")]
    output: PathBuf,

    /// Print the resolved parameter set before generating.
    #[arg(long)]
    print_state: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("could not open settings file {}", path.display()))?;
            serde_json::from_str::<Settings>(&text)
                .with_context(|| format!("could not parse settings file {}", path.display()))?
        }
        None => Settings::default(),
    };

    let mut state = RunState::from_settings(settings)?;

    if args.print_state {
        println!("=== This state will be used ===");
        println!("{:#?}", state.general);
        for parameter in state.parameters() {
            println!(
                "===== {}: distribution: {}, vary: {}",
                parameter.name, parameter.distribution, parameter.vary
            );
        }
    }

    EnsembleGenerator::new().generate(&mut state)?;

    for datapoint in &state.datapoints {
        let dir = args.output.join(format!("datapoint-{}", datapoint.index));
        fs::create_dir_all(&dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
        let path = dir.join("datapoint.json");
        let json = serde_json::to_string_pretty(datapoint)?;
        fs::write(&path, json).with_context(|| format!("could not write {}", path.display()))?;
    }

    println!(
        "wrote {} datapoints to {}",
        state.datapoints.len(),
        args.output.display()
    );
    Ok(())
}
