//! Configuration commands.

use anyhow::Result;
use edge_core::{FrameworkConfig, ServerConfig, CONFIG_ENV_VAR, MODE_ENV_VAR};

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Path => show_path(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    for (key, value) in config_lines(&ctx.config) {
        ctx.output.kv(&key, &value);
    }

    let overrides: Vec<&str> = [CONFIG_ENV_VAR, MODE_ENV_VAR]
        .into_iter()
        .filter(|var| std::env::var_os(var).is_some())
        .collect();
    if !overrides.is_empty() {
        ctx.output.info("");
        ctx.output.info(&format!("Overridden by: {}", overrides.join(", ")));
    }

    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    match &ctx.config_path {
        Some(path) if ctx.output.is_json() => ctx.output.json(&serde_json::json!({ "path": path })),
        Some(path) => println!("{}", path.display()),
        None if ctx.output.is_json() => ctx.output.json(&serde_json::json!({ "path": null })),
        None => ctx.output.warn("No config file found; using defaults"),
    }
    Ok(())
}

/// Flatten the configuration into `key: value` lines.
fn config_lines(config: &FrameworkConfig) -> Vec<(String, String)> {
    let mut lines = vec![("mode".to_string(), config.mode.to_string())];
    server_lines("server", &config.server, &mut lines);
    server_lines("preview", &config.preview, &mut lines);

    let patterns = if config.assets.stale_asset_patterns.is_empty() {
        "(built-in only)".to_string()
    } else {
        config.assets.stale_asset_patterns.join(", ")
    };
    lines.push(("assets.stale_asset_patterns".to_string(), patterns));
    lines
}

fn server_lines(section: &str, server: &ServerConfig, lines: &mut Vec<(String, String)>) {
    lines.push((format!("{}.port", section), server.port().to_string()));
    lines.push((
        format!("{}.host", section),
        server.host.clone().unwrap_or_else(|| "localhost".to_string()),
    ));
}
