use crate::error::{KitError, Result};
use crate::model::{PluginCategory, PluginRecord};
use roxmltree::{Document, Node};

/// Value of the first `Attribute` below `attrs` whose `id` matches, or "".
fn persistent_value(attrs: Option<Node<'_, '_>>, id: &str) -> String {
    attrs
        .and_then(|node| {
            node.descendants()
                .find(|n| n.has_tag_name("Attribute") && n.attribute("id") == Some(id))
        })
        .and_then(|n| n.attribute("value"))
        .unwrap_or_default()
        .to_string()
}

/// Extract instrument and effect plugins from a plugin registry export.
///
/// Any other registry category is dropped in the same pass. Unparsable XML is
/// an error.
pub fn parse_plugins(xml: &str) -> Result<Vec<PluginRecord>> {
    let doc = Document::parse(xml)
        .map_err(|e| KitError::Parse(format!("Invalid plugin registry XML: {}", e)))?;

    let mut plugins = Vec::new();
    for section in doc.descendants().filter(|n| n.has_tag_name("Section")) {
        for class_desc in section
            .descendants()
            .filter(|n| n.has_tag_name("ClassDescription"))
        {
            let category = match class_desc
                .attribute("category")
                .and_then(PluginCategory::from_exact)
            {
                Some(category) => category,
                None => continue,
            };

            let attrs = class_desc
                .descendants()
                .find(|n| n.has_tag_name("PersistentAttributes"));

            plugins.push(PluginRecord {
                category,
                class_id: class_desc.attribute("classID").map(str::to_string),
                vendor: persistent_value(attrs, "Class:Vendor"),
                name: class_desc.attribute("name").map(str::to_string),
                version: persistent_value(attrs, "Class:Version"),
                folder: persistent_value(attrs, "Class:Folder"),
                sub_category: class_desc.attribute("subCategory").map(str::to_string),
            });
        }
    }

    Ok(plugins)
}
