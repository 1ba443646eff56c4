use clap::Subcommand;
use nexus_core::{Config, VideoPool};
use serde_json::json;

#[derive(Subcommand)]
pub enum VideoAction {
    /// Pick one configured video URL at random
    Random,
    /// List configured video URLs
    List,
}

pub fn run(action: VideoAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    match action {
        VideoAction::Random => {
            let pool = VideoPool::from_config(&config.video);
            println!("{}", json!({ "url": pool.pick_any() }));
        }
        VideoAction::List => {
            println!("{}", serde_json::to_string_pretty(&config.video.urls)?);
        }
    }
    Ok(())
}
