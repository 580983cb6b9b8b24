use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = scout_worker::Args::parse();

	scout_worker::run(args).await
}
