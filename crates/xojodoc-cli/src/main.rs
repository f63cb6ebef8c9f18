//! XojoDoc CLI - index and query Xojo documentation from the terminal.
//!
//! Results go to stdout, as plain text or JSON with `--json`. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;
use xojodoc_core::{
    ClassDetails, DocConfig, DocLibrary, IndexProgress, MethodDetails, SearchConfig, SearchHit,
    SearchOptions, StoreConfig,
};

#[derive(Parser, Debug)]
#[command(name = "xojodoc")]
#[command(about = "Offline index and search for Xojo documentation")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Documentation root (one subdirectory per module)
    #[arg(long, global = true)]
    docs_root: Option<PathBuf>,

    /// Database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build or refresh the index
    Index {
        /// Re-extract every page regardless of modification time
        #[arg(short, long)]
        force: bool,

        /// Afterwards, remove classes whose page no longer exists
        #[arg(long)]
        prune: bool,
    },
    /// Re-index a single class page
    Update { module: String, name: String },
    /// Search classes by `Module.Class` or free text
    Search {
        query: String,

        #[arg(short, long, default_value_t = SearchConfig::DEFAULT_LIMIT)]
        limit: usize,

        /// Leave out classes from deprecated modules
        #[arg(long)]
        no_deprecated: bool,
    },
    /// List classes alphabetically
    List {
        #[arg(short, long, default_value_t = SearchConfig::BROWSE_LIMIT)]
        limit: usize,

        #[arg(long)]
        no_deprecated: bool,
    },
    /// Show a class with its properties and methods
    Class {
        name: String,

        /// Restrict the lookup to one module
        #[arg(short, long)]
        module: Option<String>,
    },
    /// Show one method of a class
    Method { class: String, method: String },
    /// Show index statistics
    Stats,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Set up logging
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    FmtSubscriber::builder()
        .with_env_filter(log_filter(log_level(&args), &directives))
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let library = DocLibrary::new(resolve_config(&args)?);
    run(&library, &args)
}

fn log_level(args: &Args) -> Level {
    if args.debug {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        Level::INFO
    }
}

/// `RUST_LOG`-style directives, or the flag-selected level when there are none.
fn log_filter(level: Level, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(directives)
}

/// Config file first, then command-line overrides.
fn resolve_config(args: &Args) -> Result<DocConfig> {
    let mut config = match &args.config {
        Some(path) => DocConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DocConfig::new(".", StoreConfig::DB_FILENAME),
    };
    if let Some(docs_root) = &args.docs_root {
        config.docs_root = docs_root.clone();
    }
    if let Some(db) = &args.db {
        config.database = db.clone();
    }
    Ok(config)
}

fn run(library: &DocLibrary, args: &Args) -> Result<ExitCode> {
    match &args.command {
        Command::Index { force, prune } => {
            info!("Database: {}", library.config().database.display());
            let stats = library.build_index_with_progress(*force, report_progress)?;
            let pruned = if *prune {
                library.prune_missing()?
            } else {
                0
            };

            if args.json {
                println!("{}", json!({ "stats": stats, "pruned": pruned }));
            } else {
                println!(
                    "Indexed {} of {} pages ({} skipped, {} errors)",
                    stats.indexed, stats.total, stats.skipped, stats.errors
                );
                if *prune {
                    println!("Pruned {} class(es) with missing pages", pruned);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Update { module, name } => {
            let updated = library.update_class(module, name)?;
            if args.json {
                println!("{}", json!({ "updated": updated }));
            } else if updated {
                println!("Updated {}.{}", module, name);
            } else {
                println!("Could not update {}.{}", module, name);
            }
            Ok(exit_code(updated))
        }
        Command::Search {
            query,
            limit,
            no_deprecated,
        } => {
            let options = search_options(*limit, *no_deprecated);
            let hits = library.search_with(query, &options)?;
            print_hits(&hits, args.json)?;
            Ok(exit_code(!hits.is_empty()))
        }
        Command::List {
            limit,
            no_deprecated,
        } => {
            let hits = library.list_classes(&search_options(*limit, *no_deprecated))?;
            print_hits(&hits, args.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Class { name, module } => {
            let class = match module {
                Some(module) => library.get_class_in(name, module)?,
                None => library.get_class(name)?,
            };
            match &class {
                Some(class) if args.json => {
                    println!("{}", serde_json::to_string_pretty(class)?)
                }
                Some(class) => print_class(class),
                None => eprintln!("Class not found: {}", name),
            }
            Ok(exit_code(class.is_some()))
        }
        Command::Method { class, method } => {
            let details = library.get_method(class, method)?;
            match &details {
                Some(details) if args.json => {
                    println!("{}", serde_json::to_string_pretty(details)?)
                }
                Some(details) => print_method(details),
                None => eprintln!("Method not found: {}.{}", class, method),
            }
            Ok(exit_code(details.is_some()))
        }
        Command::Stats => {
            let stats = library.stats()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Classes:    {}", stats.total_classes);
                println!("Deprecated: {}", stats.deprecated_classes);
                println!("Properties: {}", stats.total_properties);
                println!("Methods:    {}", stats.total_methods);
                for (module, count) in &stats.modules {
                    println!("  {:<24} {}", module, count);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn search_options(limit: usize, no_deprecated: bool) -> SearchOptions {
    let options = SearchOptions::with_limit(limit);
    if no_deprecated {
        options.without_deprecated()
    } else {
        options
    }
}

fn exit_code(found: bool) -> ExitCode {
    if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report_progress(progress: &IndexProgress) {
    if progress.current % 100 == 0 || progress.current == progress.total {
        info!(
            "Processed {}/{} pages ({} indexed, {} skipped, {} errors)",
            progress.current,
            progress.total,
            progress.stats.indexed,
            progress.stats.skipped,
            progress.stats.errors
        );
    }
}

fn print_hits(hits: &[SearchHit], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No results");
    }
    for hit in hits {
        if hit.description.is_empty() {
            println!("{}", hit.qualified_name());
        } else {
            println!("{} - {}", hit.qualified_name(), hit.description);
        }
    }
    Ok(())
}

fn print_class(details: &ClassDetails) {
    let class = &details.class.record;
    println!("{} ({})", class.name, class.module);
    if !class.description.is_empty() {
        println!("\n{}", class.description);
    }

    if !details.properties.is_empty() {
        println!("\nProperties:");
        for property in &details.properties {
            let mut flags = Vec::new();
            if property.read_only {
                flags.push("read-only");
            }
            if property.shared {
                flags.push("shared");
            }
            let type_name = property.type_name.as_deref().unwrap_or("?");
            if flags.is_empty() {
                println!("  {} As {}", property.name, type_name);
            } else {
                println!("  {} As {} [{}]", property.name, type_name, flags.join(", "));
            }
        }
    }

    if !details.methods.is_empty() {
        println!("\nMethods:");
        for method in &details.methods {
            println!("  {}", method.signature());
        }
    }

    if let Some(code) = &class.sample_code {
        println!("\nSample code:\n{}", code);
    }
    if let Some(notes) = &class.notes {
        println!("\nNotes:\n{}", notes);
    }
    if let Some(compatibility) = &class.compatibility {
        println!("\nCompatibility: {}", compatibility);
    }
    if let Some(indexed_at) = details.class.indexed_at_utc() {
        println!("\nIndexed: {}", indexed_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

fn print_method(details: &MethodDetails) {
    println!(
        "{}.{}.{}",
        details.module, details.class_name, details.method.signature()
    );
    if details.overloads > 1 {
        println!("({} overloads)", details.overloads);
    }
    if let Some(description) = &details.method.description {
        println!("\n{}", description);
    }
    if let Some(code) = &details.method.sample_code {
        println!("\n{}", code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_flags() {
        let args = Args::try_parse_from(["xojodoc", "stats"]).unwrap();
        assert_eq!(log_level(&args), Level::INFO);

        let args = Args::try_parse_from(["xojodoc", "--debug", "stats"]).unwrap();
        assert_eq!(log_level(&args), Level::DEBUG);

        let args = Args::try_parse_from(["xojodoc", "stats", "-q"]).unwrap();
        assert_eq!(log_level(&args), Level::WARN);

        assert!(Args::try_parse_from(["xojodoc", "-d", "-q", "stats"]).is_err());
    }

    #[test]
    fn test_log_filter_directives() {
        let filter = log_filter(Level::WARN, "");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = log_filter(Level::INFO, "xojodoc_core=debug");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        // Unparseable directives are dropped rather than failing startup.
        let filter = log_filter(Level::INFO, "xojodoc_core=loud");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_resolve_config_overrides() {
        let args = Args::try_parse_from([
            "xojodoc",
            "--docs-root",
            "/docs/html/api",
            "--db",
            "/tmp/xojo.db",
            "search",
            "Graphics",
        ])
        .unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.docs_root, PathBuf::from("/docs/html/api"));
        assert_eq!(config.database, PathBuf::from("/tmp/xojo.db"));
    }
}
