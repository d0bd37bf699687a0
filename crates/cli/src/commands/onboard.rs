//! `shellsmith onboard` — First-time setup.

use shellsmith_config::AppConfig;
use std::path::Path;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("shellsmith — First-Time Setup");
    println!("=============================\n");

    let config_dir = AppConfig::config_dir();
    let created = write_default_config(&config_dir)?;
    let config_path = config_dir.join("config.toml");

    if created {
        println!("  Created config.toml at: {}", config_path.display());
        println!("\n  Next steps:");
        println!("   1. Add your API key to {} or export GEMINI_API_KEY", config_path.display());
        println!("   2. Run: shellsmith doctor");
        println!("   3. Run: shellsmith agent\n");
    } else {
        println!("  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete it and re-run onboard.\n");
    }

    Ok(())
}

/// Write the default `config.toml` into `config_dir` unless one exists.
///
/// Returns whether a file was written.
pub fn write_default_config(config_dir: &Path) -> std::io::Result<bool> {
    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".shellsmith");

        assert!(write_default_config(&config_dir).unwrap());
        let config = AppConfig::load_from(&config_dir.join("config.toml")).unwrap();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.tools.enabled, vec!["executeCommand", "writeFile"]);
    }

    #[test]
    fn existing_config_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "default_model = \"mine\"\n").unwrap();

        assert!(!write_default_config(dir.path()).unwrap());
        assert_eq!(
            std::fs::read_to_string(&config_path).unwrap(),
            "default_model = \"mine\"\n"
        );
    }
}
