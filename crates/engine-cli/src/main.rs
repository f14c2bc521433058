use clap::Parser;
use engine_cli::{init_logging, run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let output = run(&cli)?;
    println!(
        "{} trades, {} resting orders -> {}",
        output.trades.len(),
        output.book.len(),
        cli.output_dir.display()
    );
    Ok(())
}
