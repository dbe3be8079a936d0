use std::path::Path;

use regex::Regex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::snapshot_store::SnapshotStore;
use crate::model::{Hierarchy, OnetreeConfig};
use crate::ops::{self, HierarchyClient, item_ops};
use crate::parse::{write_hierarchy, write_item};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let config = config_io::load_or_default(cli.config.as_deref())?;
    log::debug!(
        "engine {:?}, store mode {:?}",
        config.parser.engine,
        config.store.mode
    );

    match cli.command {
        Commands::Tree(args) => cmd_tree(args, &config, json),
        Commands::Stats(args) => cmd_stats(args, &config, json),
        Commands::Pages(args) => cmd_pages(args, &config, json),
        Commands::Find(args) => cmd_find(args, &config, json),
        Commands::Export(args) => cmd_export(args, &config),
    }
}

/// Read a snapshot file through the configured engine and store session.
fn load_snapshot(file: &Path, config: &OnetreeConfig) -> Result<Hierarchy, Box<dyn std::error::Error>> {
    let store = SnapshotStore::open(file, config.parser.engine)?;
    let client = HierarchyClient::from_config(store, config);
    if client.session().mode() == crate::io::HandleMode::Manual {
        client.session().init()?;
    }
    let hierarchy = client.get_full_hierarchy()?;
    client.session().release();
    Ok(hierarchy)
}

fn lookup<'h>(
    hierarchy: &'h Hierarchy,
    id: &str,
) -> Result<crate::model::ItemRef<'h>, Box<dyn std::error::Error>> {
    item_ops::find_by_id(hierarchy, id).ok_or_else(|| format!("no item with id '{}'", id).into())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_tree(args: SnapshotArgs, config: &OnetreeConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let hierarchy = load_snapshot(&args.file, config)?;
    if json {
        let output = tree_to_json(&hierarchy, &config.paths);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_tree(&hierarchy) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_stats(args: SnapshotArgs, config: &OnetreeConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let hierarchy = load_snapshot(&args.file, config)?;
    let stats = count_kinds(ops::root_descendants(&hierarchy));
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_stats(&stats) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_pages(args: PagesArgs, config: &OnetreeConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let hierarchy = load_snapshot(&args.file, config)?;
    let pages: Vec<_> = match args.section.as_deref() {
        Some(id) => {
            let scope = lookup(&hierarchy, id)?;
            ops::all_pages(&hierarchy, scope.handle())?.collect()
        }
        None => ops::root_all_pages(&hierarchy).collect(),
    };

    if json {
        let output: Vec<_> = pages
            .iter()
            .filter_map(|page| page_to_json(*page, &config.paths))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for page in pages {
            println!(
                "{}",
                item_ops::relative_path(page, config.paths.use_display_name, &config.paths.separator)
            );
        }
    }
    Ok(())
}

fn cmd_find(args: FindArgs, config: &OnetreeConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let re = Regex::new(&args.pattern)?;
    let hierarchy = load_snapshot(&args.file, config)?;
    let hits: Vec<_> = ops::root_descendants_where(&hierarchy, |item| {
        re.is_match(item.name())
            || item
                .as_notebook()
                .is_some_and(|nb| re.is_match(&nb.display_name))
    })
    .collect();

    if json {
        let output: Vec<_> = hits
            .iter()
            .map(|item| item_to_json(*item, &config.paths))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for item in hits {
            println!(
                "{} {}",
                format_item_line(item),
                item_ops::relative_path(item, config.paths.use_display_name, &config.paths.separator)
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

fn cmd_export(args: ExportArgs, config: &OnetreeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let hierarchy = load_snapshot(&args.file, config)?;
    let xml = match args.id.as_deref() {
        Some(id) => write_item(&hierarchy, lookup(&hierarchy, id)?.handle())?,
        None => write_hierarchy(&hierarchy),
    };
    print!("{}", xml);
    Ok(())
}
