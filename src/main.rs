use anyhow::Result;

mod camera;
mod color;
mod config;
mod demo;
mod effect;
mod engine;
mod geometry;
mod rendering;
mod scene_graph;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let config = config::DemoConfig::load()?;
    log::debug!("Configuration: {:?}", config);

    window::run(config)?;

    Ok(())
}
