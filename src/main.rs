use clap::{Parser, Subcommand};
use gallery_migrate::convert::GalleryConverter;
use gallery_migrate::identity::GalleryIndex;
use gallery_migrate::render::ShortcodePipeline;
use gallery_migrate::shortcode::scan_shortcodes;
use gallery_migrate::store::{ContentStore, MemoryStore};
use gallery_migrate::types::PostId;
use gallery_migrate::{admin, config, import, output, settings};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gallery-migrate")]
#[command(about = "Migrate WordPress [gallery] shortcodes to Modula galleries")]
#[command(long_about = "\
Migrate WordPress [gallery] shortcodes to Modula galleries

The site is read from a JSON snapshot (--store). Commands that change it
write the snapshot back in place.

Every shortcode maps to one Modula gallery, keyed by its post and its
position in that post. Running import or render again updates or reuses
those galleries; it never duplicates them.

Settings (stored as site options, read fresh by every command):

  gallery_migrate_excluded_types      post types import skips
  gallery_migrate_use_template        copy settings from the template gallery
  gallery_migrate_convert_on_render   convert galleries when pages render

Set RUST_LOG=info to see every gallery written, RUST_LOG=debug for decisions.

Run 'gallery-migrate gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site snapshot (JSON)
    #[arg(long, default_value = "site.json", global = true)]
    store: PathBuf,

    /// Config file [default: config.toml next to the store]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print admin results as JSON ({code, message, payload})
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the gallery shortcodes of a post and their Modula galleries
    Scan { post_id: PostId },
    /// Convert every WP gallery in the site
    Import,
    /// Render a post, converting galleries on the fly
    Render { post_id: PostId },
    /// Show, save or restore the migration settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the current values
    Show,
    /// Save NAME=VALUE pairs
    Save {
        #[arg(value_parser = parse_pair, required = true)]
        pairs: Vec<(String, String)>,
    },
    /// Reset all settings to their defaults
    Restore,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    Ok((name.trim().to_string(), value.to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&cli.store));
    let config = config::load_config(&config_path)?;
    let mut store = MemoryStore::load(&cli.store)?;

    match cli.command {
        Command::Scan { post_id } => {
            let post = store
                .get_post(post_id)?
                .ok_or_else(|| format!("Post {post_id} does not exist"))?;
            let spans = scan_shortcodes(&post.content, &config.source.token);
            let index = GalleryIndex::new(&store, &config);
            let galleries = spans
                .iter()
                .map(|span| index.matches(post.id, span.position))
                .collect::<Result<Vec<_>, _>>()?;
            output::print_scan_output(&config, &post, &spans, &galleries);
        }
        Command::Import => {
            if cli.json {
                let response = admin::import_all(&mut store, &config);
                store.save(&cli.store)?;
                finish(&response, true)?;
            } else {
                let result = import::run_bulk_import(&mut store, &config);
                // Galleries written before a failure stay written.
                store.save(&cli.store)?;
                output::print_import_output(&config, &result?);
            }
        }
        Command::Render { post_id } => {
            let post = store
                .get_post(post_id)?
                .ok_or_else(|| format!("Post {post_id} does not exist"))?;
            let html = ShortcodePipeline::new()
                .with_filter(GalleryConverter)
                .render(&mut store, &config, &post)?;
            store.save(&cli.store)?;
            println!("{}", html);
        }
        Command::Settings { action } => match action {
            SettingsCommand::Show => {
                let values = settings::current_values(&store)?;
                if cli.json {
                    let values: serde_json::Map<_, _> = values
                        .into_iter()
                        .map(|(name, value)| (name, serde_json::Value::String(value)))
                        .collect();
                    println!("{}", serde_json::Value::Object(values));
                } else {
                    output::print_settings(&values);
                }
            }
            SettingsCommand::Save { pairs } => {
                let response = admin::save_settings(&mut store, &pairs);
                if response.is_ok() {
                    store.save(&cli.store)?;
                }
                finish(&response, cli.json)?;
            }
            SettingsCommand::Restore => {
                let response = admin::restore_defaults(&mut store);
                store.save(&cli.store)?;
                finish(&response, cli.json)?;
            }
        },
        Command::GenConfig => unreachable!("handled before loading the store"),
    }

    Ok(())
}

/// Print an admin response; a failed one becomes the process error.
fn finish(response: &admin::AdminResponse, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json || response.is_ok() {
        output::print_admin_response(response, json);
    }
    if response.is_ok() {
        Ok(())
    } else {
        Err(response.message.clone().into())
    }
}

/// `config.toml` in the directory holding the store snapshot.
fn default_config_path(store: &Path) -> PathBuf {
    store.with_file_name("config.toml")
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
