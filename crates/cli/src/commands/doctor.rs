//! `shellsmith doctor` — Diagnose configuration and connectivity.

use shellsmith_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("shellsmith doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  [ok]   Config file found: {}", config_path.display());
    } else {
        println!("  [warn] No config file, using defaults (run `shellsmith onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok]   Configuration valid");
            config
        }
        Err(e) => {
            println!("  [fail] Configuration invalid: {e}");
            println!("\n  1 issue found. Fix the configuration and re-run.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  [ok]   API key configured");
    } else {
        println!("  [warn] No API key (set GEMINI_API_KEY or api_key in config.toml)");
        issues += 1;
    }

    let workdir = config.working_dir();
    if workdir.is_dir() {
        println!("  [ok]   Working directory: {}", workdir.display());
    } else {
        println!("  [fail] Working directory missing: {}", workdir.display());
        issues += 1;
    }

    println!("  [ok]   Tools enabled: {}", config.tools.enabled.join(", "));

    match shellsmith_providers::build_from_config(&config) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  [ok]   Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  [fail] Provider '{}' rejected the health check", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  [fail] Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [fail] Provider not usable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
