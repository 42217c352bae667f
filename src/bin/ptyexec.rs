#[path = "ptyexec/app.rs"]
mod app;
#[path = "ptyexec/args.rs"]
mod args;
#[path = "ptyexec/config/mod.rs"]
mod config;
#[path = "ptyexec/logging.rs"]
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let code = app::run().await?;
    std::process::exit(code);
}
