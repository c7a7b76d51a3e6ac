use std::path::Path;

use nr_domain::config::{Config, ConfigSeverity};

/// Print every config issue. Returns `false` when any is an error.
pub fn validate(config: &Config, config_path: &Path) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({})", config_path.display());
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!(
        "\n{error_count} error(s), {warning_count} warning(s) in {}",
        config_path.display()
    );

    error_count == 0
}

/// Dump the resolved config (defaults filled in) as TOML. A literal API
/// key is masked.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let mut shown = config.clone();
    if let Some(key) = shown.llm.provider.auth.key.as_mut() {
        *key = mask(key);
    }
    let output = toml::to_string_pretty(&shown)?;
    print!("{output}");
    Ok(())
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "********".into()
    } else {
        format!("{visible}********")
    }
}
