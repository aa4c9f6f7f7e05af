use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = reva_api::Args::parse();
	reva_api::run(args).await
}
