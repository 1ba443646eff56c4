use clap::Subcommand;
use nexus_core::Config;
use serde_json::json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, raw (e.g. "session.hardcore_mode", "head.min_down_deg")
    Get { key: String },
    /// Change one value and save; prints the stored value
    Set { key: String, value: String },
    /// Print the whole config, or one section of it, as JSON
    List {
        /// Only this section ("session", "head", "video", "device", "bridge")
        section: Option<String>,
    },
    /// Overwrite the config file with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let output = match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
            return Ok(());
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            // Normalization may clamp what was asked for.
            json!({ "key": key, "value": config.get(&key) })
        }
        ConfigAction::List { section } => {
            let all = serde_json::to_value(Config::load()?)?;
            match section {
                None => all,
                Some(name) => all
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| format!("unknown section: {name}"))?,
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            json!({ "status": "reset", "path": Config::path()? })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
