// Entry point for `cargo run -p web-server`. The `tradebook serve` subcommand
// does the same thing with command-line overrides.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = configuration::load_config()?;
    let _guard = configuration::init_tracing(&config.logging)?;

    web_server::run_server(&config).await
}
