use super::load_config;
use crate::remote::HttpRemote;
use crate::store::DescriptorStore;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Probe the club page once and print what the monitor would see.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let url = config.require_club_url()?;
    let remote = HttpRemote::new(&config)?;

    println!("{}", "Club Boost Check".bold().blue());
    println!("{}", "=".repeat(50));
    println!("  Club: {url}");

    println!("\n{}", "Current item".bold());
    match remote.try_fetch_item_descriptor(url) {
        Ok(item) => {
            println!("  {}", item.summary());
            match &item.instance_id {
                Some(instance) => println!("  Owned instance: {instance}"),
                None => println!("  {}", "No owned instance".yellow()),
            }
            println!("  {}", item.members_line());
        }
        Err(e) => println!("  {} {e}", "ERROR:".red().bold()),
    }

    println!("\n{}", "Boost".bold());
    match remote.try_fetch_opportunity(url) {
        Ok(Some(target)) => println!("  {} Boost open: {target}", "✓".green().bold()),
        Ok(None) => println!("  No boost available"),
        Err(e) => println!("  {} {e}", "ERROR:".red().bold()),
    }

    let store = DescriptorStore::new(config.descriptor_path());
    if let Some(saved) = store.load()? {
        println!("\n{}", "Last saved item".bold());
        println!("  {}", saved.summary());
        println!("  {}", store.path().display().to_string().dimmed());
    }

    println!();
    Ok(())
}
