use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;
use anyhow::{bail, Result};
use colored::Colorize;
use addons::installer::short_hash;
use addons::{
    resolve, AddonError, Catalog, Config, Installer, Overrides, Removal, Remover,
    SystemFetcher, UnitKey,
};
use crate::cli::{AddonsCommand, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    let overrides = Overrides {
        base_dir: cli.paths.base_dir,
        install_location: cli.paths.install_location,
        state_path: cli.paths.state_path,
        config_file: cli.paths.config,
    };
    let config = Config::load(&overrides)?;
    match cli.command {
        AddonsCommand::Install { references } => {
            execute_install(&config, &references)
        }
        AddonsCommand::Remove { references, no_cascade, yes } => {
            execute_remove(&config, &references, !no_cascade, yes)
        }
        AddonsCommand::List => {
            execute_list(&config)
        }
        AddonsCommand::Official => {
            execute_official(&config)
        }
        AddonsCommand::Which { reference } => {
            execute_which(&config, &reference)
        }
    }
}

pub fn execute_install(config: &Config, references: &[String]) -> Result<()> {
    let fetcher = SystemFetcher::new(config)?;
    let mut manifest = config.manifest_store().load()?;
    let installed = Installer::new(config, &fetcher).install_all(&mut manifest, references)?;

    let mut seen = HashSet::new();
    let unique: Vec<String> = installed
        .into_iter()
        .filter(|key| seen.insert(key.clone()))
        .map(|key| key.to_string())
        .collect();
    println!("{} {}", "Installed:".green().bold(), unique.join(", "));
    Ok(())
}

pub fn execute_remove(config: &Config, references: &[String], cascade: bool, yes: bool) -> Result<()> {
    let mut manifest = config.manifest_store().load()?;
    let outcome = Remover::new(config).remove_all(&mut manifest, references, cascade, |planned| {
        confirm_removal(planned, yes)
    })?;

    match outcome {
        Removal::Nothing => {
            println!("No add-ons installed");
        }
        Removal::Declined { .. } => {
            println!("{}", "Aborted, nothing was removed".yellow());
        }
        Removal::Completed { removed, failed } => {
            for key in &removed {
                println!("{} {}", "Removed".green().bold(), key);
            }
            if !failed.is_empty() {
                for (key, err) in &failed {
                    eprintln!("{} {}: {}", "Failed".red().bold(), key, err);
                }
                bail!("{} add-on(s) could not be removed", failed.len());
            }
        }
    }
    Ok(())
}

/// Shows the removal plan and asks for a `y`/`yes` answer on stdin.
/// End of input counts as no.
fn confirm_removal(planned: &[UnitKey], yes: bool) -> addons::Result<bool> {
    println!("The following add-ons will be removed:");
    for key in planned {
        println!("  - {}", key);
    }
    if yes {
        return Ok(true);
    }

    let stdin_error = |source: io::Error| AddonError::Io { path: PathBuf::from("<stdin>"), source };
    eprint!("Proceed? [y/N] ");
    io::stderr().flush().map_err(stdin_error)?;
    let mut input = String::new();
    io::stdin().read_line(&mut input).map_err(stdin_error)?;
    Ok(matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub fn execute_list(config: &Config) -> Result<()> {
    let manifest = config.manifest_store().load()?;
    if manifest.is_empty() {
        println!("No add-ons installed");
        return Ok(());
    }

    for (key, record) in manifest.iter() {
        let on_disk = config.install_path(key).exists();
        match on_disk {
            true => println!("{}", key.to_string().bold()),
            false => println!("{} {}", key.to_string().bold(), "(missing on disk)".yellow()),
        }
        println!("  hash: {}", short_hash(&record.hash));
        if let (Some(remote), Some(target)) = (&record.remote, &record.remote_target) {
            println!("  remote: {} -> {}", remote, target);
        }
        if !record.deps.is_empty() {
            println!("  deps: {}", record.deps.join(", "));
        }
    }
    Ok(())
}

pub fn execute_official(config: &Config) -> Result<()> {
    let names = Catalog::new(config)?.list_official()?;
    let manifest = config.manifest_store().load()?;
    if names.is_empty() {
        println!("No official add-ons found for '{}'", config.catalog_org);
        return Ok(());
    }
    for name in names {
        let installed = UnitKey::parse(&name).is_ok_and(|key| manifest.contains(&key));
        match installed {
            true => println!("{} {}", name, "(installed)".green()),
            false => println!("{}", name),
        }
    }
    Ok(())
}

pub fn execute_which(config: &Config, reference: &str) -> Result<()> {
    let unit = resolve(reference, &config.hosting_root)?;
    let path = config.install_path(&unit.key);
    if path.exists() {
        println!("Found add-on at: {}", path.display());
    } else {
        println!("Add-on '{}' is not installed", unit.key);
    }
    Ok(())
}
