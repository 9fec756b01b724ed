#![forbid(unsafe_code)]

//! Field list demo binary entry point.
//!
//! Reads field names, mounts a [`FieldList`] backed by the state registry,
//! applies the requested commands and prints the mounted rows.

mod cli;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use fieldlist::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Command, Opts};

const APP_NAME: &str = "demo";

fn main() {
    init_tracing();
    let opts = Opts::parse();

    let stdout = io::stdout();
    if let Err(e) = run(&opts, &mut stdout.lock()) {
        eprintln!("fieldlist-demo: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("FIELDLIST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_fields(path: Option<&Path>) -> Result<Vec<String>> {
    let text = match path {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            for line in io::stdin().lock().lines() {
                text.push_str(&line?);
                text.push('\n');
            }
            text
        }
    };
    Ok(parse_fields(&text))
}

/// One field per line; blank lines and `#` comments are skipped.
fn parse_fields(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn open_registry(opts: &Opts) -> Arc<StateRegistry> {
    let registry = if opts.memory {
        StateRegistry::in_memory()
    } else {
        let storage = match &opts.state {
            Some(path) => FileStorage::new(path),
            None => FileStorage::default_for_app(APP_NAME),
        };
        tracing::debug!(path = %storage.path().display(), "using state file");
        StateRegistry::new(Box::new(storage))
    };

    if let Err(err) = registry.load() {
        tracing::warn!(
            backend = registry.backend_name(),
            error = %err,
            "stored state unreadable, starting from defaults"
        );
    }
    registry.shared()
}

fn run<W: Write>(opts: &Opts, out: &mut W) -> Result<()> {
    let fields = read_fields(opts.fields.as_deref())?;
    let registry = open_registry(opts);
    let store = RegistrySelectionStore::new(Arc::clone(&registry));

    let mut list = FieldList::with_store(FieldListConfig::from_env(), store)
        .on_add_to_query(|name| tracing::info!(field = name, "added to query"))
        .on_display_change(|columns| tracing::info!(?columns, "display columns changed"));
    list.set_fields(fields);
    list.set_search(opts.search.as_str());
    list.on_resize(opts.height);
    list.on_scroll(opts.scroll);

    for command in &opts.commands {
        match command {
            Command::Add(field) => {
                if !list.add(field) {
                    writeln!(out, "# {field} cannot be added")?;
                }
            }
            Command::Remove(field) => {
                if !list.remove(field) {
                    writeln!(out, "# {field} cannot be removed")?;
                }
            }
            Command::Query(field) => {
                let section = if list.selection().contains(field) {
                    Section::Displayed
                } else {
                    Section::Hidden
                };
                writeln!(out, "query: {}", list.add_to_query(field, section))?;
            }
        }
    }

    let mut renderer = TextRenderer::new();
    list.render(&mut renderer);
    writeln!(
        out,
        "# rows {:?} of {} ({}px)",
        list.window(),
        list.rows().len(),
        list.total_height()
    )?;
    out.write_all(renderer.output().as_bytes())?;
    Ok(())
}
