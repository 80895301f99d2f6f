//! `reactloop config`: configuration management commands.

use reactloop_config::LoopConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match LoopConfig::load() {
        Ok(config) => {
            println!("   OK  Config parsed and validated");

            let warnings = warnings(&config);
            if !warnings.is_empty() {
                println!();
                for w in &warnings {
                    println!("   WARN  {w}");
                }
            }

            println!();
            println!("   Max iterations:  {}", config.max_iterations);
            println!("   Streaming:       {}", config.enable_streaming);
            println!("   Verbose:         {}", config.verbose);
            println!("   Token budget:    {}", config.compaction.max_tokens);
            println!(
                "   System prompt:   {}",
                if config.system_prompt.is_some() { "custom" } else { "built-in" }
            );
            println!("   Tools:           {}", config.tools.len());
        }
        Err(e) => {
            println!("   ERROR  {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Settings that are valid but probably not what the user wants.
fn warnings(config: &LoopConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.max_iterations == 1 && !config.tools.is_empty() {
        warnings.push("max_iterations = 1 leaves no room to use a tool result".to_string());
    }

    if config.compaction.max_tokens < 512 {
        warnings.push(format!(
            "compaction.max_tokens = {} will drop most of the history",
            config.compaction.max_tokens
        ));
    }

    if config
        .system_prompt
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        warnings.push("system_prompt is set but empty".to_string());
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = LoopConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = LoopConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
