use anyhow::{Context, Result};
use clap::Parser;
use iris_c::{
    batch,
    util::{
        cmd::{Args, Command},
        init_logging,
    },
    IrisClient,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let client = IrisClient::new(&args.url, Duration::from_secs(args.timeout_secs))?;

    match &args.command {
        Command::Predict { .. } => {
            let features = args
                .command
                .features()
                .context("predict command without measurements")?;
            let species = client.predict(&features).await?;
            println!("Predicted species: {} (label {})", species, species.label());
        }
        Command::Batch {
            input,
            output,
            chunk_size,
        } => {
            let file = File::open(input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let rows = batch::read_csv(BufReader::new(file))?;
            info!("Read {} rows from {}", rows.len(), input.display());

            let labels = client.predict_chunked(&rows.features, *chunk_size).await?;

            match output {
                Some(path) => {
                    let out = File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    batch::write_labeled(&rows, &labels, BufWriter::new(out))?;
                    eprintln!("Wrote {} predictions to {}", labels.len(), path.display());
                }
                None => batch::write_labeled(&rows, &labels, io::stdout().lock())?,
            }
        }
        Command::Info => {
            let info = client.info().await?;
            println!("{} v{}", info.name, info.version);
            println!("{}", info.description);
            println!("  predict:       {}", client.endpoint(&info.endpoints.predict));
            println!("  batch predict: {}", client.endpoint(&info.endpoints.batch_predict));
            println!("  metrics:       {}", client.endpoint(&info.endpoints.metrics));
            println!("  health:        {}", client.endpoint(&info.endpoints.health));
        }
    }
    Ok(())
}
