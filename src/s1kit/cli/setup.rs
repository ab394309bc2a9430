use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use s1kit::api::{ImportKind, ReportKind};
use s1kit::model::{ButtonShape, PresetCategory, SizeUnit};
use s1kit::query::{PluginField, PresetField};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "s1kit",
    bin_name = "s1kit",
    version,
    disable_help_flag = true,
    disable_help_subcommand = true
)]
#[command(about = "Studio One shortcuts, plugins and presets toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $S1KIT_HOME, then the platform data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Where generated files are written (overrides the output_dir setting)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub out: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print help
    #[arg(short, long, global = true)]
    pub help: bool,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Data,
    Browse,
    Output,
    Misc,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Data => "Data Commands:",
            CommandGroup::Browse => "Browse Commands:",
            CommandGroup::Output => "Output Commands:",
            CommandGroup::Misc => "Miscellaneous:",
        }
    }

    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "import" | "status" | "split" | "clear" => Some(CommandGroup::Data),
            "commands" | "plugins" | "presets" | "categories" => Some(CommandGroup::Browse),
            "macro" | "report" | "sticker" => Some(CommandGroup::Output),
            "config" | "help" => Some(CommandGroup::Misc),
            _ => None,
        }
    }

    pub fn all() -> &'static [CommandGroup] {
        &[
            CommandGroup::Data,
            CommandGroup::Browse,
            CommandGroup::Output,
            CommandGroup::Misc,
        ]
    }
}

/// Returns the custom grouped help output as a string
pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");

    let mut output = String::new();
    output.push_str(&format!("s1kit {version}\n"));
    output.push_str("Studio One shortcuts, plugins and presets toolkit\n");
    output.push('\n');
    output.push_str("Usage: s1kit [OPTIONS] [COMMAND]\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();
    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| {
                !sc.is_hide_set() && CommandGroup::for_command(sc.get_name()) == Some(*group)
            })
            .collect();

        if !group_cmds.is_empty() {
            output.push('\n');
            output.push_str(&format!("{}\n", group.heading()));
            for sc in group_cmds {
                let name = sc.get_name();
                let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
                output.push_str(&format!("  {:<12} {}\n", name, about));
            }
        }
    }

    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("      --data <DIR>  Data directory\n");
    output.push_str("      --out <DIR>   Output directory for generated files\n");
    output.push_str("  -v, --verbose     Verbose output\n");
    output.push_str("  -h, --help        Print help\n");
    output.push_str("  -V, --version     Print version\n");

    output
}

pub fn print_grouped_help() {
    print!("{}", get_grouped_help());
}

/// Prints help for a specific subcommand using clap's built-in rendering
pub fn print_subcommand_help(command: &Option<Commands>) {
    let name = match command {
        Some(Commands::Data(c)) => match c {
            DataCommands::Import { .. } => "import",
            DataCommands::Status => "status",
            DataCommands::Split => "split",
            DataCommands::Clear { .. } => "clear",
        },
        Some(Commands::Browse(c)) => match c {
            BrowseCommands::Commands { .. } => "commands",
            BrowseCommands::Plugins { .. } => "plugins",
            BrowseCommands::Presets { .. } => "presets",
            BrowseCommands::Categories => "categories",
        },
        Some(Commands::Output(c)) => match c {
            OutputCommands::Macro { .. } => "macro",
            OutputCommands::Report { .. } => "report",
            OutputCommands::Sticker { .. } => "sticker",
        },
        Some(Commands::Misc(c)) => match c {
            MiscCommands::Config { .. } => "config",
            MiscCommands::Help { .. } => "help",
        },
        None => {
            print_grouped_help();
            return;
        }
    };

    print_help_for_command(name);
}

pub fn print_help_for_command(name: &str) {
    let mut cmd = Cli::command();
    for subcmd in cmd.get_subcommands_mut() {
        if subcmd.get_name() == name {
            print!("{}", subcmd.render_help());
            return;
        }
    }

    eprintln!("Unknown command: {}", name);
    eprintln!();
    print_grouped_help();
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum UnitArg {
    Mm,
    Cm,
}

impl From<UnitArg> for SizeUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Mm => SizeUnit::Mm,
            UnitArg::Cm => SizeUnit::Cm,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ShapeArg {
    Square,
    Circle,
}

impl From<ShapeArg> for ButtonShape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Square => ButtonShape::Square,
            ShapeArg::Circle => ButtonShape::Circle,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Data(DataCommands),

    #[command(flatten)]
    Browse(BrowseCommands),

    #[command(flatten)]
    Output(OutputCommands),

    #[command(flatten)]
    Misc(MiscCommands),
}

#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Import a shortcuts (HTML), plugin registry (XML) or preset database (SQLite) export
    #[command(display_order = 1)]
    Import {
        /// commands, plugins or presets
        kind: ImportKind,

        /// The exported file
        file: PathBuf,
    },

    /// Show what has been imported and when
    #[command(alias = "st", display_order = 2)]
    Status,

    /// Move presets kept in the combined store into per-category storage
    #[command(display_order = 3)]
    Split,

    /// Remove all imported data and sticker settings
    #[command(display_order = 4)]
    Clear {
        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BrowseCommands {
    /// List keyboard shortcuts
    #[command(alias = "cmds", display_order = 10)]
    Commands {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List instrument and effect plugins
    #[command(display_order = 11)]
    Plugins {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Only VST3 plugins
        #[arg(long)]
        vst3: bool,

        /// Field for an exact match (name, vendor, folder, class_id)
        #[arg(long, requires = "value")]
        field: Option<PluginField>,

        /// Value the field must equal
        #[arg(long, requires = "field")]
        value: Option<String>,
    },

    /// List presets of one category
    #[command(alias = "ls", display_order = 12)]
    Presets {
        /// Preset category (e.g. AudioSynth, FXChain)
        category: PresetCategory,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Presets per page (defaults to the page_size setting)
        #[arg(long)]
        page_size: Option<usize>,

        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Field for an exact match (vendor, title, creator, sub_folder, class_id)
        #[arg(long, requires = "value")]
        field: Option<PresetField>,

        /// Value the field must equal
        #[arg(long, requires = "field")]
        value: Option<String>,

        /// Sort by field
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// List preset categories that have data
    #[command(display_order = 13)]
    Categories,
}

#[derive(Subcommand, Debug)]
pub enum OutputCommands {
    /// Generate a Studio One macro
    #[command(display_order = 20)]
    Macro {
        #[command(subcommand)]
        target: MacroTarget,
    },

    /// Write a report of commands, plugins or presets
    #[command(display_order = 21)]
    Report {
        /// commands, plugins or presets
        kind: ReportKind,

        /// Preset category (presets report only)
        #[arg(short, long)]
        category: Option<PresetCategory>,
    },

    /// Edit the controller sticker layout and export sticker sheets
    #[command(display_order = 22)]
    Sticker {
        #[command(subcommand)]
        action: StickerAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum MacroTarget {
    /// Macro that inserts a plugin
    Plugin {
        /// Plugin class ID
        class_id: String,

        /// Title of a stored preset to load after inserting
        #[arg(long)]
        preset: Option<String>,

        /// Macro title and file name
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Macro that loads a stored preset
    Preset {
        category: PresetCategory,

        /// Preset title
        preset: String,

        /// Narrow the match to this class ID
        #[arg(long)]
        class_id: Option<String>,

        /// Insert mode for FX chains
        #[arg(long)]
        mode: Option<u32>,

        /// Macro title and file name
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StickerAction {
    /// Show the current layout
    Show,

    /// Start a new blank layout
    Init { rows: u32, columns: u32 },

    /// Assign a command, name, color or shape to a button (1-based position)
    Assign {
        row: u32,
        column: u32,

        /// Command text
        #[arg(long)]
        text: Option<String>,

        /// Custom name printed instead of the command text
        #[arg(long)]
        name: Option<String>,

        /// Palette name or #RRGGBB
        #[arg(long)]
        color: Option<String>,

        #[arg(long, value_enum)]
        shape: Option<ShapeArg>,
    },

    /// Reset a button to blank
    Unassign { row: u32, column: u32 },

    /// Set the physical button size
    Size {
        width: f64,
        height: f64,

        #[arg(long, value_enum, default_value = "mm")]
        unit: UnitArg,
    },

    /// Render the layout as a printable sticker sheet
    Export,

    /// List the color palette
    Colors,
}

#[derive(Subcommand, Debug)]
pub enum MiscCommands {
    /// Get or set configuration
    #[command(display_order = 30)]
    Config {
        /// Configuration key (e.g., page_size)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },

    /// Print help for s1kit or a subcommand
    #[command(display_order = 31)]
    Help {
        /// Subcommand to get help for
        command: Option<String>,
    },
}
