use crate::cli::commands::InitArgs;
use crate::io::config_io;

/// Environment variable names must be non-empty and shell-safe
fn validate_env_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("api.token_env cannot be empty".to_string());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(format!(
            "invalid api.token_env \"{}\" (use UPPER_SNAKE_CASE)",
            name
        ));
    }
    Ok(())
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;

    // Note a config further up that this one will shadow
    if let Some(parent) = cwd.parent()
        && let Ok(existing) = config_io::discover_config(parent)
    {
        eprintln!("Note: config found at {}", existing.display());
        eprintln!("Creating a new one in this directory");
    }

    let path = config_io::write_template(&cwd, args.force)?;
    let config = config_io::load_config(&path)?;
    validate_env_name(&config.api.token_env)?;

    println!("Wrote {}", path.display());
    for view in &config.views {
        let lanes = config.lanes.iter().filter(|l| l.set == view.lanes).count();
        let default = if view.default { " (default)" } else { "" };
        println!("  view: {} [{} lanes]{}", view.id, lanes, default);
    }
    println!("Set ${} (or point api.base_url at a proxy), then run `sb board`.", config.api.token_env);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_env_name() {
        assert!(validate_env_name("NOTION_API_KEY").is_ok());
        assert!(validate_env_name("TOKEN2").is_ok());
        assert!(validate_env_name("").is_err());
        assert!(validate_env_name("notion key").is_err());
        assert!(validate_env_name("lower_case").is_err());
    }
}
