#![forbid(unsafe_code)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

use prefs_tree::config::RunConfig;
use prefs_tree::resources::ResourceResolver;
use prefs_tree::{
    DisplayedList, JsonFileStore, LoadedPreferences, Preference, PreferenceKind, PreferenceLoader,
    PreferenceStore, StoreEditor, factory,
};

#[derive(Parser)]
#[command(name = "prefs-tree")]
#[command(about = "Inspect and edit JSON-defined preference trees")]
struct Cli {
    /// Directory holding one <namespace>.json store per document
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// JSON table resolving @type/name references
    #[arg(long, global = true)]
    resources: Option<PathBuf>,

    /// trace, debug, info, warn or error (falls back to $LOG_LEVEL, then info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the preferences that are currently displayed
    Show {
        definitions: PathBuf,

        /// Include preferences hidden by their dependencies
        #[arg(long)]
        all: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Change one preference and save it
    Set {
        definitions: PathBuf,
        key: String,
        value: String,
    },
    /// Store defaults for every preference that has no stored value yet
    Init { definitions: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RunConfig::resolve(cli.store_dir, cli.resources, cli.log_level.as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    if let Some(level) = &config.unknown_log_level {
        warn!(level = %level, "Unknown log level, using info");
    }
    debug!(config = ?config, "Resolved run configuration");

    let resolver: Arc<dyn ResourceResolver + Send + Sync> = Arc::from(config.load_resources()?);

    match cli.command {
        Command::Show {
            definitions,
            all,
            json,
        } => show(&config, resolver, &definitions, all, json).await,
        Command::Set {
            definitions,
            key,
            value,
        } => set(&config, resolver, &definitions, &key, &value).await,
        Command::Init { definitions } => init(&config, resolver, &definitions).await,
    }
}

async fn load(
    config: &RunConfig,
    resolver: Arc<dyn ResourceResolver + Send + Sync>,
    definitions: &Path,
) -> Result<LoadedPreferences<JsonFileStore>> {
    let raw = fs::read_to_string(definitions)
        .with_context(|| format!("Failed to read definitions from {}", definitions.display()))?;
    let namespace = factory::namespace_of(&raw)
        .with_context(|| format!("Failed to parse {}", definitions.display()))?;
    let store = config.open_store(&namespace)?;

    PreferenceLoader::new(resolver)
        .spawn(raw, store)
        .wait()
        .await
        .with_context(|| format!("Failed to load preferences from {}", definitions.display()))?
        .context("Preference load was superseded")
}

async fn show(
    config: &RunConfig,
    resolver: Arc<dyn ResourceResolver + Send + Sync>,
    definitions: &Path,
    all: bool,
    json: bool,
) -> Result<()> {
    let LoadedPreferences { group, .. } = load(config, resolver, definitions).await?;
    let rows: Vec<&Preference> = if all {
        group.preferences().iter().collect()
    } else {
        group.displayable_preferences().collect()
    };

    if json {
        let text = serde_json::to_string_pretty(&rows).context("Failed to serialize preferences")?;
        println!("{text}");
        return Ok(());
    }

    println!(
        "{} [{}]: {} of {} displayed",
        group.name.as_deref().unwrap_or(&group.namespace),
        group.namespace,
        group.displayable_len(),
        group.len()
    );
    for pref in rows {
        print_row(pref, 0);
    }
    Ok(())
}

async fn set(
    config: &RunConfig,
    resolver: Arc<dyn ResourceResolver + Send + Sync>,
    definitions: &Path,
    key: &str,
    value: &str,
) -> Result<()> {
    let LoadedPreferences { group, mut store } =
        load(config, Arc::clone(&resolver), definitions).await?;

    let Some(current) = group.find_descendant(key) else {
        bail!("No preference with key '{key}' in {}", definitions.display());
    };
    let mut updated = current.clone();
    if !updated.set_from_text(value, resolver.as_ref()) {
        bail!(
            "'{value}' is not a valid value for {} preference '{key}'",
            updated.type_name()
        );
    }

    let mut list = DisplayedList::new();
    list.set_group(group);
    let changes = list
        .notify_update(updated.clone())
        .with_context(|| format!("Preference '{key}' could not be updated"))?;

    let mut editor = StoreEditor::new();
    updated.save(&mut editor);
    store
        .commit(editor)
        .with_context(|| format!("Failed to save {}", store.path().display()))?;
    info!(key = %key, value = %value_text(&updated), "Saved preference");

    println!("{key} = {}", value_text(&updated));
    for edit in &changes.edits {
        println!("  {edit}");
    }
    Ok(())
}

async fn init(
    config: &RunConfig,
    resolver: Arc<dyn ResourceResolver + Send + Sync>,
    definitions: &Path,
) -> Result<()> {
    let LoadedPreferences { group, mut store } = load(config, resolver, definitions).await?;
    let written = group
        .pre_init(&mut store)
        .with_context(|| format!("Failed to initialise {}", store.path().display()))?;
    println!("Initialised {written} value(s) in {}", store.path().display());
    Ok(())
}

fn print_row(pref: &Preference, depth: usize) {
    let indent = "  ".repeat(depth);
    let marker = if pref.allow_display() { ' ' } else { '-' };
    let label = pref.name.as_deref().unwrap_or_default();
    println!(
        "{indent}{marker} {:<24} {:<14} {:<24} {}",
        pref.key,
        pref.type_name(),
        value_text(pref),
        label
    );
    if let Some(children) = pref.children() {
        for child in children.iter() {
            print_row(child, depth + 1);
        }
    }
}

fn value_text(pref: &Preference) -> String {
    match &pref.kind {
        PreferenceKind::Boolean(switch) => switch.checked.to_string(),
        PreferenceKind::List(list) => match &list.selected_display {
            Some(display) => format!("{} ({display})", list.selected_value),
            None => list.selected_value.to_string(),
        },
        PreferenceKind::AppList(app) => match (&app.app_package, &app.app_activity) {
            (Some(package), Some(activity)) => format!("{package}/{activity}"),
            (Some(package), None) => package.clone(),
            _ => "none".to_string(),
        },
        PreferenceKind::Color(color) => {
            let item = color.color;
            if item.is_from_swatch() {
                format!(
                    "#{:08X} (swatch {}:{})",
                    item.color as u32, item.swatch, item.swatch_position
                )
            } else {
                format!("#{:08X}", item.color as u32)
            }
        }
        PreferenceKind::Message(message) if message.dismissed => "dismissed".to_string(),
        PreferenceKind::Message(_) => "shown".to_string(),
        PreferenceKind::IntSeekbar(params) => format!(
            "{} (step {}/{})",
            params.value(),
            params.selected_step(),
            params.step_count()
        ),
        PreferenceKind::FloatSeekbar(params) => format!(
            "{} (step {}/{})",
            params.value(),
            params.selected_step(),
            params.step_count()
        ),
        PreferenceKind::ColorGroup(group) => format!("{} colors", group.colors.len()),
        PreferenceKind::Group(group) => format!("{} items", group.len()),
        PreferenceKind::Section | PreferenceKind::Simple => String::new(),
    }
}
