use clap::Subcommand;
use nexus_core::{Actuator, Config, HttpActuator};

#[derive(Subcommand)]
pub enum DeviceAction {
    /// Send the lock command now
    Lock,
    /// Send the unlock command now
    Unlock,
}

pub fn run(action: DeviceAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let actuator = HttpActuator::from_config(&config.device)?;
    match action {
        DeviceAction::Lock => {
            actuator.lock()?;
            println!("locked");
        }
        DeviceAction::Unlock => {
            actuator.unlock()?;
            println!("unlocked");
        }
    }
    Ok(())
}
