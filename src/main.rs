use anyhow::Result;
use mcupdater::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
