//! # Macro Emitter
//!
//! Builds `.studioonemacro` documents: an XML declaration and a `Macro` root
//! holding a sequence of `CommandElement`s, each with `CommandArgument` children.
//!
//! What the commands are depends entirely on the kind of thing the macro is for,
//! captured as the closed [`MacroPlan`] union. Building a plan and rendering it
//! are both pure; delivering the file is the caller's business.

use crate::error::{KitError, Result};
use crate::model::{PluginCategory, PluginRecord, PresetCategory, PresetRecord};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const MACRO_EXTENSION: &str = "studioonemacro";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroArgument {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCommand {
    pub category: &'static str,
    pub name: &'static str,
    pub arguments: Vec<MacroArgument>,
}

impl MacroCommand {
    fn new(category: &'static str, name: &'static str) -> Self {
        Self {
            category,
            name,
            arguments: Vec::new(),
        }
    }

    fn arg(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.arguments.push(MacroArgument {
            name,
            value: value.into(),
        });
        self
    }
}

fn add_instrument_track(name: &str) -> MacroCommand {
    MacroCommand::new("Track", "Add Instrument Track").arg("Name", name)
}

fn add_instrument(class_id: &str, preset: &str) -> MacroCommand {
    MacroCommand::new("Track", "Add Instrument to Selected Tracks")
        .arg("mode", "1")
        .arg("cid", class_id)
        .arg("preset", preset)
}

fn add_insert(mode: u32, class_id: &str, preset: &str) -> MacroCommand {
    MacroCommand::new("Track", "Add Insert to Selected Channels")
        .arg("mode", mode.to_string())
        .arg("cid", class_id)
        .arg("preset", preset)
}

fn load_preset(title: &str) -> MacroCommand {
    MacroCommand::new("Track", "Load Preset").arg("Preset", title)
}

fn show_instrument_editor() -> MacroCommand {
    MacroCommand::new("Console", "Show Instrument Editor").arg("State", "")
}

fn show_channel_editor() -> MacroCommand {
    MacroCommand::new("Console", "Show Channel Editor").arg("State", "")
}

/// What a macro does, by the category of the plugin or preset it was made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroPlan {
    /// New instrument track with the plugin loaded
    PluginInstrument {
        name: Option<String>,
        class_id: String,
        group: String,
        /// Title of a preset to load after inserting
        preset: Option<String>,
    },
    /// Insert the plugin on the selected channels
    PluginEffect {
        name: Option<String>,
        class_id: String,
        preset: Option<String>,
    },
    FxChain {
        title: Option<String>,
        class_id: String,
        preset_path: String,
        mode: u32,
    },
    EffectPreset {
        title: Option<String>,
        class_id: String,
        preset_path: String,
    },
    InstrumentPreset {
        title: Option<String>,
        class_id: String,
        preset_path: String,
    },
    TrackPreset {
        title: Option<String>,
    },
    /// Nothing to do for this category; the document has only its root
    Empty {
        subject: Option<String>,
    },
}

impl MacroPlan {
    /// `preset` is a stored preset already matched to this plugin, if any.
    pub fn for_plugin(plugin: &PluginRecord, group: &str, preset: Option<&PresetRecord>) -> Self {
        let class_id = plugin.class_id.clone().unwrap_or_default();
        let preset = preset.and_then(|p| p.title.clone());
        match plugin.category {
            PluginCategory::AudioSynth => MacroPlan::PluginInstrument {
                name: plugin.name.clone(),
                class_id,
                group: group.to_string(),
                preset,
            },
            PluginCategory::AudioEffect => MacroPlan::PluginEffect {
                name: plugin.name.clone(),
                class_id,
                preset,
            },
        }
    }

    /// `fx_chain_mode` only applies to FX chains.
    pub fn for_preset(preset: &PresetRecord, fx_chain_mode: u32) -> Self {
        let title = preset.title.clone();
        let class_id = preset.class_id.clone().unwrap_or_default();
        match preset.category {
            PresetCategory::FxChain => MacroPlan::FxChain {
                title,
                class_id,
                preset_path: preset.preset_path(),
                mode: fx_chain_mode,
            },
            PresetCategory::AudioEffect => MacroPlan::EffectPreset {
                title,
                class_id,
                preset_path: preset.preset_path(),
            },
            PresetCategory::AudioSynth => MacroPlan::InstrumentPreset {
                title,
                class_id,
                preset_path: preset.preset_path(),
            },
            PresetCategory::TrackPreset => MacroPlan::TrackPreset { title },
            _ => MacroPlan::Empty { subject: title },
        }
    }

    /// The plugin name or preset title the macro is about.
    pub fn subject(&self) -> Option<&str> {
        match self {
            MacroPlan::PluginInstrument { name, .. } | MacroPlan::PluginEffect { name, .. } => {
                name.as_deref()
            }
            MacroPlan::FxChain { title, .. }
            | MacroPlan::EffectPreset { title, .. }
            | MacroPlan::InstrumentPreset { title, .. }
            | MacroPlan::TrackPreset { title } => title.as_deref(),
            MacroPlan::Empty { subject } => subject.as_deref(),
        }
    }

    pub fn commands(&self) -> Vec<MacroCommand> {
        match self {
            MacroPlan::PluginInstrument {
                name,
                class_id,
                group,
                preset,
            } => {
                let plugin_name = name.as_deref().unwrap_or_default();
                let mut commands = vec![
                    add_instrument_track(name.as_deref().unwrap_or("INSTRUMENT")),
                    add_instrument(class_id, &format!("{}/Instruments/{}", group, plugin_name)),
                ];
                if let Some(title) = preset {
                    commands.push(load_preset(title));
                }
                commands.push(show_instrument_editor());
                commands
            }
            MacroPlan::PluginEffect {
                class_id, preset, ..
            } => {
                let mut commands = vec![add_insert(1, class_id, "default")];
                if let Some(title) = preset {
                    commands.push(load_preset(title));
                }
                commands.push(show_channel_editor());
                commands
            }
            MacroPlan::FxChain {
                class_id,
                preset_path,
                mode,
                ..
            } => vec![add_insert(*mode, class_id, preset_path)],
            MacroPlan::EffectPreset {
                class_id,
                preset_path,
                ..
            } => vec![add_insert(1, class_id, preset_path), show_channel_editor()],
            MacroPlan::InstrumentPreset {
                title,
                class_id,
                preset_path,
            } => vec![
                add_instrument_track(title.as_deref().unwrap_or("INSTRUMENT")),
                add_instrument(class_id, preset_path),
                show_instrument_editor(),
            ],
            MacroPlan::TrackPreset { title } => vec![MacroCommand::new(
                "Track",
                "Load Track Preset",
            )
            .arg("Name", title.as_deref().unwrap_or_default())],
            MacroPlan::Empty { .. } => Vec::new(),
        }
    }

    /// Annotation written after the commands.
    pub fn comment(&self) -> Option<String> {
        match self {
            MacroPlan::TrackPreset { title } => Some(format!(
                "TrackPreset macro generated for: {}",
                title.as_deref().unwrap_or_default()
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MacroDocument {
    pub title: String,
    pub group: String,
    pub description: Option<String>,
    pub plan: MacroPlan,
}

fn render_err(e: impl std::fmt::Display) -> KitError {
    KitError::Render(e.to_string())
}

impl MacroDocument {
    pub fn new(title: impl Into<String>, group: impl Into<String>, plan: MacroPlan) -> Self {
        Self {
            title: title.into(),
            group: group.into(),
            description: None,
            plan,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn description(&self) -> String {
        self.description.clone().unwrap_or_else(|| {
            format!("Macro for {}", self.plan.subject().unwrap_or_default())
        })
    }

    /// `<title>.studioonemacro`, with path separators replaced.
    pub fn file_name(&self) -> String {
        let safe: String = self
            .title
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        format!("{}.{}", safe, MACRO_EXTENSION)
    }

    pub fn render(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(render_err)?;

        let description = self.description();
        let mut root = BytesStart::new("Macro");
        root.push_attribute(("title", self.title.as_str()));
        root.push_attribute(("group", self.group.as_str()));
        root.push_attribute(("description", description.as_str()));

        let commands = self.plan.commands();
        let comment = self.plan.comment();
        if commands.is_empty() && comment.is_none() {
            writer.write_event(Event::Empty(root)).map_err(render_err)?;
        } else {
            writer.write_event(Event::Start(root)).map_err(render_err)?;
            for command in &commands {
                let mut element = BytesStart::new("CommandElement");
                element.push_attribute(("category", command.category));
                element.push_attribute(("name", command.name));
                writer.write_event(Event::Start(element)).map_err(render_err)?;

                for argument in &command.arguments {
                    let mut arg = BytesStart::new("CommandArgument");
                    arg.push_attribute(("name", argument.name));
                    arg.push_attribute(("value", argument.value.as_str()));
                    writer.write_event(Event::Empty(arg)).map_err(render_err)?;
                }

                writer
                    .write_event(Event::End(BytesEnd::new("CommandElement")))
                    .map_err(render_err)?;
            }
            if let Some(comment) = comment {
                // "--" is not allowed inside XML comments
                let text = comment.replace("--", "- -");
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(text)))
                    .map_err(render_err)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("Macro")))
                .map_err(render_err)?;
        }

        String::from_utf8(writer.into_inner()).map_err(render_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> PluginRecord {
        PluginRecord {
            category: PluginCategory::AudioSynth,
            class_id: Some("{MAI-TAI}".into()),
            vendor: "PreSonus".into(),
            name: Some("Mai Tai".into()),
            version: "1.0".into(),
            folder: String::new(),
            sub_category: None,
        }
    }

    fn names(plan: &MacroPlan) -> Vec<&'static str> {
        plan.commands().iter().map(|c| c.name).collect()
    }

    fn parse_commands(xml: &str) -> Vec<(String, Vec<(String, String)>)> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        doc.descendants()
            .filter(|n| n.has_tag_name("CommandElement"))
            .map(|n| {
                let args = n
                    .children()
                    .filter(|c| c.has_tag_name("CommandArgument"))
                    .map(|c| {
                        (
                            c.attribute("name").unwrap().to_string(),
                            c.attribute("value").unwrap().to_string(),
                        )
                    })
                    .collect();
                (n.attribute("name").unwrap().to_string(), args)
            })
            .collect()
    }

    #[test]
    fn instrument_without_preset_has_three_commands() {
        let plan = MacroPlan::for_plugin(&synth(), "S1Kit", None);
        let xml = MacroDocument::new("Mai Tai", "S1Kit", plan).render().unwrap();

        let commands = parse_commands(&xml);
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].0, "Add Instrument Track");
        assert_eq!(commands[0].1, vec![("Name".into(), "Mai Tai".into())]);
        assert_eq!(
            commands[1].1,
            vec![
                ("mode".into(), "1".into()),
                ("cid".into(), "{MAI-TAI}".into()),
                ("preset".into(), "S1Kit/Instruments/Mai Tai".into()),
            ]
        );
        assert_eq!(commands[2].0, "Show Instrument Editor");
    }

    #[test]
    fn instrument_with_preset_loads_it_before_the_editor() {
        let mut preset = PresetRecord::new(PresetCategory::AudioSynth);
        preset.title = Some("Big Bass".into());
        let plan = MacroPlan::for_plugin(&synth(), "S1Kit", Some(&preset));
        assert_eq!(
            names(&plan),
            vec![
                "Add Instrument Track",
                "Add Instrument to Selected Tracks",
                "Load Preset",
                "Show Instrument Editor"
            ]
        );
    }

    #[test]
    fn unnamed_instrument_track_gets_placeholder() {
        let mut plugin = synth();
        plugin.name = None;
        let plan = MacroPlan::for_plugin(&plugin, "G", None);
        assert_eq!(plan.commands()[0].arguments[0].value, "INSTRUMENT");
        assert_eq!(plan.commands()[1].arguments[2].value, "G/Instruments/");
    }

    #[test]
    fn effect_plugin_inserts_with_default_preset() {
        let mut plugin = synth();
        plugin.category = PluginCategory::AudioEffect;
        let plan = MacroPlan::for_plugin(&plugin, "S1Kit", None);
        let commands = plan.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].arguments[2].value, "default");
        assert_eq!(commands[1].name, "Show Channel Editor");
    }

    #[test]
    fn fx_chain_uses_caller_mode_and_path() {
        let mut preset = PresetRecord::new(PresetCategory::FxChain);
        preset.title = Some("Vocal Chain".into());
        preset.sub_folder = Some("Vocals".into());
        preset.class_id = Some("{CHAIN}".into());

        let commands = MacroPlan::for_preset(&preset, 0).commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].arguments[0].value, "0");
        assert_eq!(commands[0].arguments[2].value, "Vocals/Vocal Chain");

        let commands = MacroPlan::for_preset(&preset, 2).commands();
        assert_eq!(commands[0].arguments[0].value, "2");
    }

    #[test]
    fn preset_plans_by_category() {
        let mut preset = PresetRecord::new(PresetCategory::AudioEffect);
        preset.title = Some("Air".into());
        assert_eq!(
            names(&MacroPlan::for_preset(&preset, 0)),
            vec!["Add Insert to Selected Channels", "Show Channel Editor"]
        );

        preset.category = PresetCategory::AudioSynth;
        assert_eq!(
            names(&MacroPlan::for_preset(&preset, 0)),
            vec![
                "Add Instrument Track",
                "Add Instrument to Selected Tracks",
                "Show Instrument Editor"
            ]
        );

        preset.category = PresetCategory::PatternBank;
        assert!(MacroPlan::for_preset(&preset, 0).commands().is_empty());
    }

    #[test]
    fn track_preset_carries_comment() {
        let mut preset = PresetRecord::new(PresetCategory::TrackPreset);
        preset.title = Some("Lead Vox".into());
        let xml = MacroDocument::new("Lead", "S1Kit", MacroPlan::for_preset(&preset, 0))
            .render()
            .unwrap();
        assert!(xml.contains("<!--TrackPreset macro generated for: Lead Vox-->"));
        assert_eq!(parse_commands(&xml)[0].0, "Load Track Preset");
    }

    #[test]
    fn empty_plan_renders_bare_root() {
        let plan = MacroPlan::Empty {
            subject: Some("Drums".into()),
        };
        let xml = MacroDocument::new("Beat", "S1Kit", plan).render().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.tag_name().name(), "Macro");
        assert_eq!(root.attribute("description"), Some("Macro for Drums"));
        assert_eq!(root.children().filter(|n| n.is_element()).count(), 0);
    }

    #[test]
    fn attributes_are_escaped_and_description_overrides() {
        let plan = MacroPlan::for_plugin(&synth(), "A&B", None);
        let doc = MacroDocument::new("Say \"hi\" <now>", "A&B", plan)
            .with_description(Some("Custom".into()));
        let xml = doc.render().unwrap();

        let parsed = roxmltree::Document::parse(&xml).unwrap();
        let root = parsed.root_element();
        assert_eq!(root.attribute("title"), Some("Say \"hi\" <now>"));
        assert_eq!(root.attribute("group"), Some("A&B"));
        assert_eq!(root.attribute("description"), Some("Custom"));
    }

    #[test]
    fn file_name_is_safe() {
        let doc = MacroDocument::new("Drums/Kit", "S1Kit", MacroPlan::Empty { subject: None });
        assert_eq!(doc.file_name(), "Drums_Kit.studioonemacro");
        assert_eq!(doc.description(), "Macro for ");
    }
}
