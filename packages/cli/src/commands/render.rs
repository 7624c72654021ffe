use crate::components::builtin_mapping;
use crate::config::Config;
use crate::watcher::FileWatcher;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagekit_common::{path, Model, PATH_PROP};
use pagekit_editor::{event_channel, HostEvent, MemoryModelStore, SyncedHost};
use pagekit_evaluator::{to_html, ComponentMapping, HtmlOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::LocalSet;
use tracing::{debug, info, warn};

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Page model JSON file
    pub model: PathBuf,

    /// Model path of the page root
    #[arg(short, long)]
    pub page_path: Option<String>,

    /// Render with edit affordances
    #[arg(short, long)]
    pub editor: bool,

    /// Re-render whenever the model file changes
    #[arg(short, long)]
    pub watch: bool,

    /// Pretty print the HTML
    #[arg(long)]
    pub pretty: bool,

    /// Write HTML to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Maximum container nesting
    #[arg(long)]
    pub max_depth: Option<usize>,
}

/// Settings after merging the config file with command line flags
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub page_path: String,
    pub editor_mode: bool,
    pub max_depth: usize,
    pub html: HtmlOptions,
}

impl RenderSettings {
    pub fn resolve(args: &RenderArgs, config: &Config, model: &Model) -> Self {
        let page_path = args
            .page_path
            .clone()
            .or_else(|| config.page_path.clone())
            .or_else(|| model.get(PATH_PROP).and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| "/".to_string());

        Self {
            page_path: path::sanitize(&page_path),
            editor_mode: args.editor || config.editor_mode,
            max_depth: args.max_depth.unwrap_or(config.max_depth),
            html: HtmlOptions {
                pretty: args.pretty,
                ..HtmlOptions::default()
            },
        }
    }
}

pub async fn render(args: RenderArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let model_file = cwd.join(&args.model);
    let model = load_model(&model_file)?;
    let settings = RenderSettings::resolve(&args, &config, &model);
    info!(page = %settings.page_path, editor = settings.editor_mode, "Rendering page");

    let local = LocalSet::new();
    local
        .run_until(render_local(args, config, model_file, model, settings))
        .await
}

async fn render_local(
    args: RenderArgs,
    config: Config,
    model_file: PathBuf,
    model: Model,
    settings: RenderSettings,
) -> Result<()> {
    let store = MemoryModelStore::new();
    store.insert_cached(&settings.page_path, model);

    let mut host = SyncedHost::new(Rc::new(store.clone()))
        .with_config(config.model_config())
        .with_max_depth(settings.max_depth);

    // Content-ready notifications only make sense to an editor host
    let mut events = None;
    if settings.editor_mode {
        let (sender, receiver) = event_channel(16);
        host = host.with_events(sender);
        events = Some(receiver);
    }

    let mapping = builtin_mapping();
    emit(&host, &mapping, &settings, args.out.as_deref())?;
    drain_events(events.as_mut());

    if !args.watch {
        return Ok(());
    }

    let mut watcher = FileWatcher::new(&model_file)
        .with_context(|| format!("Failed to watch {}", model_file.display()))?;
    eprintln!(
        "{} {} (Ctrl+C to stop)",
        "👀 Watching".bright_blue().bold(),
        model_file.display()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = watcher.next_change() => {
                if change.is_none() {
                    break;
                }

                let model = match load_model(&model_file) {
                    Ok(model) => model,
                    Err(err) => {
                        warn!(error = %err, "Ignoring unreadable model");
                        continue;
                    }
                };

                store.put(&settings.page_path, model);
                // Let any fetches spawned by the listeners settle
                tokio::task::yield_now().await;

                if host.is_dirty() {
                    emit(&host, &mapping, &settings, args.out.as_deref())?;
                    drain_events(events.as_mut());
                } else {
                    debug!("Model changed without affecting rendered props");
                }
            }
        }
    }

    Ok(())
}

pub fn load_model(file: &Path) -> Result<Model> {
    let source =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    Model::from_json(&source).with_context(|| format!("Invalid model in {}", file.display()))
}

/// Render the tree once and serialize it
pub fn render_html(
    host: &SyncedHost,
    mapping: &ComponentMapping,
    settings: &RenderSettings,
) -> Result<String> {
    let vdom = host.render_root(&settings.page_path, mapping, settings.editor_mode)?;
    Ok(to_html(&vdom, settings.html.clone()))
}

fn emit(
    host: &SyncedHost,
    mapping: &ComponentMapping,
    settings: &RenderSettings,
    out: Option<&Path>,
) -> Result<()> {
    let html = render_html(host, mapping, settings)?;

    match out {
        Some(out) => {
            fs::write(out, &html).with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!(
                "  {} {} ({} nodes mounted)",
                "✓".green(),
                out.display(),
                host.mounted_paths().len()
            );
        }
        None => println!("{}", html),
    }

    Ok(())
}

fn drain_events(events: Option<&mut tokio::sync::broadcast::Receiver<HostEvent>>) {
    let Some(events) = events else {
        return;
    };

    loop {
        match events.try_recv() {
            Ok(event) => info!(event = event.name(), "Host notified"),
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "Host events lagged"),
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{PAGE_TYPE, TEXT_TYPE};
    use serde_json::json;

    fn args(model: &str) -> RenderArgs {
        RenderArgs {
            model: PathBuf::from(model),
            page_path: None,
            editor: false,
            watch: false,
            pretty: false,
            out: None,
            max_depth: None,
        }
    }

    fn page() -> Model {
        Model::from_value(json!({
            ":type": PAGE_TYPE,
            ":path": "/content/site/en/",
            ":itemsOrder": ["intro", "missing"],
            ":items": {
                "intro": { ":type": TEXT_TYPE, "text": "Welcome" },
                "missing": { ":type": "pagekit/components/video" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_settings_precedence() {
        let model = page();
        let mut config = Config::default();

        let settings = RenderSettings::resolve(&args("page.json"), &config, &model);
        assert_eq!(settings.page_path, "/content/site/en");
        assert!(!settings.editor_mode);

        config.page_path = Some("/from/config".to_string());
        config.editor_mode = true;
        let settings = RenderSettings::resolve(&args("page.json"), &config, &model);
        assert_eq!(settings.page_path, "/from/config");
        assert!(settings.editor_mode);

        let mut flags = args("page.json");
        flags.page_path = Some("/from/flag".to_string());
        flags.max_depth = Some(2);
        let settings = RenderSettings::resolve(&flags, &config, &model);
        assert_eq!(settings.page_path, "/from/flag");
        assert_eq!(settings.max_depth, 2);
    }

    #[tokio::test]
    async fn test_render_html() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let model = page();
                let settings = RenderSettings::resolve(&args("page.json"), &Config::default(), &model);
                let store = MemoryModelStore::new();
                store.insert_cached(&settings.page_path, model);
                let host = SyncedHost::new(Rc::new(store.clone()));

                let html = render_html(&host, &builtin_mapping(), &settings).unwrap();
                assert!(html.contains("<p>Welcome</p>"));
                assert!(!html.contains("video"));
                assert_eq!(host.mounted_paths().len(), 2);
                assert_eq!(store.fetch_count(), 0);
            })
            .await;
    }

    #[test]
    fn test_load_model_reports_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        fs::write(&file, "[1, 2]").unwrap();

        let err = load_model(&file).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
