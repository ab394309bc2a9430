//! # CLI Layer
//!
//! This module is **one possible UI client** for s1kit; it is not the application
//! itself. It is the only place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr, prompts)
//! - Handles argument parsing
//! - Installs the tracing subscriber
//! - Formats output for human consumption
//!
//! ## Structure
//!
//! - `run()`: Main dispatch logic (called by `main.rs`)
//! - `init_context()`: Resolves the data directory, loads config, builds the API
//! - `handle_*()`: Per-command handlers that call the API and print the result

use super::render::{
    print_button_size, print_categories, print_commands, print_config, print_layout,
    print_messages, print_palette, print_plugins, print_presets, print_status,
};
use super::setup::{
    print_grouped_help, print_help_for_command, print_subcommand_help, BrowseCommands, Cli,
    Commands, DataCommands, MacroTarget, MiscCommands, OutputCommands, StickerAction,
};
use clap::Parser;
use directories::ProjectDirs;
use s1kit::api::{ButtonEdit, CmdResult, ConfigAction, ImportKind, KitApi, KitPaths};
use s1kit::config::KitConfig;
use s1kit::error::{KitError, Result};
use s1kit::query::{PluginFilter, PresetQuery};
use s1kit::report::{DirSink, TextRenderer};
use s1kit::store::fs::FsStore;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const HOME_ENV: &str = "S1KIT_HOME";
const LOG_ENV: &str = "S1KIT_LOG";

struct AppContext {
    api: KitApi<FsStore>,
    sink: DirSink,
    renderer: TextRenderer,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.help {
        if cli.command.is_none() {
            print_grouped_help();
        } else {
            print_subcommand_help(&cli.command);
        }
        return Ok(());
    }

    init_logging(cli.verbose);

    if let Some(Commands::Misc(MiscCommands::Help { command })) = &cli.command {
        return handle_help(command.clone());
    }

    let mut ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Data(cmd)) => match cmd {
            DataCommands::Import { kind, file } => handle_import(&mut ctx, kind, &file),
            DataCommands::Status => handle_status(&ctx),
            DataCommands::Split => print_result(ctx.api.split()?),
            DataCommands::Clear { yes } => handle_clear(&mut ctx, yes),
        },
        Some(Commands::Browse(cmd)) => match cmd {
            BrowseCommands::Commands { search } => {
                let result = ctx.api.list_commands(search.as_deref())?;
                print_commands(&result.commands);
                print_result(result)
            }
            BrowseCommands::Plugins {
                search,
                vst3,
                field,
                value,
            } => {
                let filter = PluginFilter {
                    vst3_only: vst3,
                    exact: field.zip(value),
                    search,
                };
                let result = ctx.api.list_plugins(&filter)?;
                print_plugins(&result.plugins);
                print_result(result)
            }
            BrowseCommands::Presets {
                category,
                page,
                page_size,
                search,
                field,
                value,
                sort,
                desc,
            } => {
                let mut query = ctx.api.preset_query(category);
                query.page = page.max(1) - 1;
                if let Some(size) = page_size.filter(|s| *s > 0) {
                    query.page_size = size;
                }
                query.search = search;
                query.exact = field.zip(value);
                query.sort_by = sort;
                query.ascending = !desc;
                handle_presets(&mut ctx, query.page + 1, query.page_size, &query)
            }
            BrowseCommands::Categories => {
                let result = ctx.api.categories()?;
                print_categories(&result.categories);
                print_result(result)
            }
        },
        Some(Commands::Output(cmd)) => match cmd {
            OutputCommands::Macro { target } => handle_macro(&ctx, target),
            OutputCommands::Report { kind, category } => print_result(ctx.api.report(
                kind,
                category,
                &ctx.renderer,
                &ctx.sink,
            )?),
            OutputCommands::Sticker { action } => handle_sticker(&ctx, action),
        },
        Some(Commands::Misc(cmd)) => match cmd {
            MiscCommands::Config { key, value } => handle_config(&ctx, key, value),
            MiscCommands::Help { command } => handle_help(command),
        },
        None => handle_status(&ctx),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// `--data`, then `$S1KIT_HOME`, then the platform data directory.
fn resolve_data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data {
        return Ok(dir.clone());
    }
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "s1kit", "s1kit")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| KitError::Api("Could not determine a data directory".to_string()))
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = resolve_data_dir(cli)?;
    std::fs::create_dir_all(&data_dir).map_err(KitError::Io)?;
    debug!(dir = %data_dir.display(), "using data directory");

    let config = KitConfig::load(&data_dir)?;
    let quota = usize::try_from(config.storage_quota_bytes).unwrap_or(usize::MAX);
    let store = FsStore::new(data_dir.clone()).with_quota(quota);

    let out_dir = cli.out.clone().unwrap_or_else(|| config.output_dir());
    let paths = KitPaths { data_dir };

    Ok(AppContext {
        api: KitApi::new(store, paths, config),
        sink: DirSink::new(out_dir),
        renderer: TextRenderer,
    })
}

fn print_result(result: CmdResult) -> Result<()> {
    print_messages(&result.messages);
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| KitError::Api(format!("Cannot read {}: {}", path.display(), e)))
}

fn handle_import(ctx: &mut AppContext, kind: ImportKind, file: &Path) -> Result<()> {
    let bytes = read_input(file)?;
    print_result(ctx.api.import(kind, &bytes)?)
}

fn handle_status(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.status()?;
    print_status(&result.status);
    print_result(result)
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn handle_clear(ctx: &mut AppContext, yes: bool) -> Result<()> {
    if !yes && !confirm("Remove all imported data and sticker settings?") {
        println!("Aborted.");
        return Ok(());
    }
    print_result(ctx.api.clear()?)
}

fn handle_presets(
    ctx: &mut AppContext,
    page_number: usize,
    page_size: usize,
    query: &PresetQuery,
) -> Result<()> {
    let result = ctx.api.list_presets(query)?;
    if let Some(page) = &result.presets {
        print_presets(page, page_number, page_size);
    }
    print_result(result)
}

fn handle_macro(ctx: &AppContext, target: MacroTarget) -> Result<()> {
    let result = match target {
        MacroTarget::Plugin {
            class_id,
            preset,
            title,
            description,
        } => ctx
            .api
            .plugin_macro(&ctx.sink, &class_id, preset.as_deref(), title, description)?,
        MacroTarget::Preset {
            category,
            preset,
            class_id,
            mode,
            title,
            description,
        } => ctx.api.preset_macro(
            &ctx.sink,
            category,
            &preset,
            class_id.as_deref(),
            mode,
            title,
            description,
        )?,
    };
    print_result(result)
}

fn handle_sticker(ctx: &AppContext, action: StickerAction) -> Result<()> {
    let result = match action {
        StickerAction::Show => {
            let result = ctx.api.sticker_show()?;
            if let Some(layout) = &result.layout {
                print_layout(layout, result.button_size.as_ref());
            }
            result
        }
        StickerAction::Init { rows, columns } => ctx.api.sticker_init(rows, columns)?,
        StickerAction::Assign {
            row,
            column,
            text,
            name,
            color,
            shape,
        } => ctx.api.sticker_assign(ButtonEdit {
            row,
            column,
            assigned_text: text,
            custom_name: name,
            color,
            shape: shape.map(Into::into),
        })?,
        StickerAction::Unassign { row, column } => ctx.api.sticker_unassign(row, column)?,
        StickerAction::Size {
            width,
            height,
            unit,
        } => {
            let result = ctx.api.sticker_size(width, height, unit.into())?;
            if let Some(size) = &result.button_size {
                print_button_size(size);
            }
            result
        }
        StickerAction::Export => ctx.api.sticker_export(&ctx.renderer, &ctx.sink)?,
        StickerAction::Colors => {
            let result = ctx.api.sticker_colors();
            print_palette(&result.palette);
            result
        }
    };
    print_result(result)
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let show_all = key.is_none();
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = ctx.api.config(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(config);
        }
    }
    print_result(result)
}

fn handle_help(command: Option<String>) -> Result<()> {
    match command {
        Some(cmd) => print_help_for_command(&cmd),
        None => print_grouped_help(),
    }
    Ok(())
}
