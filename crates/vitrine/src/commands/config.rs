//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::Style;
use serde_json::json;
use vitrine_config::VitrineConfig;

use super::{Context, print_done};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration as TOML
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Show configuration file path
    Path,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./vitrine.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Path => cmd_path(ctx),
        ConfigCommand::Init { local, force } => cmd_init(local, force, ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    if ctx.json_output {
        let sources: Vec<_> = ctx
            .loaded
            .loaded_from()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        println!(
            "{}",
            json!({
                "api_host": ctx.config.api.host,
                "sources": sources,
                "toml": ctx.config.to_toml()?,
            })
        );
        return Ok(());
    }

    println!("# Vitrine Configuration\n");
    let sources = ctx.loaded.loaded_from();
    if sources.is_empty() {
        println!("# No config files loaded (using defaults)\n");
    } else {
        for source in &sources {
            println!("# from {}", source.display());
        }
        println!();
    }
    print!("{}", ctx.config.to_toml()?);
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let green = Style::new().green();
    let dim = Style::new().dim();

    if ctx.json_output {
        let sources: Vec<_> = ctx
            .loaded
            .sources
            .iter()
            .map(|s| json!({ "path": s.path.display().to_string(), "loaded": s.loaded }))
            .collect();
        println!("{}", json!({ "sources": sources, "warnings": ctx.loaded.warnings }));
        return Ok(());
    }

    println!("Config sources (lowest precedence first):");
    for source in &ctx.loaded.sources {
        if source.loaded {
            println!("  {} {}", green.apply_to("✓"), source.path.display());
        } else {
            println!(
                "  {} {}",
                dim.apply_to("-"),
                dim.apply_to(source.path.display())
            );
        }
    }
    println!("  {} environment (VITRINE_API_HOST)", dim.apply_to("+"));
    println!("  {} command line (--api-host)", dim.apply_to("+"));

    for warning in &ctx.loaded.warnings {
        println!("{} {}", Style::new().yellow().apply_to("warning:"), warning);
    }
    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    let path = user_config_path()?;
    if ctx.json_output {
        println!("{}", json!({ "path": path.display().to_string() }));
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_init(local: bool, force: bool, ctx: &Context) -> Result<()> {
    let path = if local {
        std::env::current_dir()?.join("vitrine.toml")
    } else {
        user_config_path()?
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    vitrine_config::save_config(&VitrineConfig::default(), &path)?;
    print_done(format!("Wrote {}", path.display()), ctx);
    Ok(())
}

fn user_config_path() -> Result<PathBuf> {
    vitrine_config::xdg_config_path().context("Could not determine config directory")
}
