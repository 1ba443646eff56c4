use clap::Subcommand;
use nexus_core::{Bridge, Config};
use serde_json::json;

#[derive(Subcommand)]
pub enum BridgeAction {
    /// Post a TEST event to the configured bridge URL
    Test,
}

pub fn run(action: BridgeAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    match action {
        BridgeAction::Test => {
            let bridge = Bridge::from_config(&config.bridge)?;
            let status = bridge.send_test()?;
            println!("{}", json!({ "ok": true, "status": status }));
        }
    }
    Ok(())
}
