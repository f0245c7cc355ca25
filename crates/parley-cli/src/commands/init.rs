//! Initialize a parley.toml config file.

use std::path::PathBuf;

use parley_config::schema::ParleyConfig;
use parley_core::ParleyError;

pub fn cmd_init(local: bool) -> parley_core::Result<()> {
    let path = if local {
        PathBuf::from("parley.toml")
    } else {
        let dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".parley");
        std::fs::create_dir_all(&dir)?;
        dir.join("parley.toml")
    };

    if path.exists() {
        return Err(ParleyError::Config(format!(
            "config already exists at {}",
            path.display()
        )));
    }

    let config = ParleyConfig::default();
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| ParleyError::Config(e.to_string()))?;
    std::fs::write(&path, rendered)?;

    println!("✅ Created {}", path.display());
    println!("   Set your API key under [services] (gemini_api_key), or export GEMINI_API_KEY.");
    println!("   Then run: parley chat");
    Ok(())
}
