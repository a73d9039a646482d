//! Hat catalog and menu layout
//!
//! A catalog is a JSON object mapping entry ids to descriptors. Key order is
//! preserved because it is the menu order. The reserved `options` key holds
//! settings rather than a hat.

use crate::command::HatCommand;
use crate::stage::{Placement, Vec3};
use crate::{Result, SessionError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use sync_core::AttachPoint;

/// Reserved catalog key for settings
pub const OPTIONS_KEY: &str = "options";

/// Default spacing between menu previews
pub const DEFAULT_PREVIEW_MARGIN: f64 = 1.5;

/// Catalog entry as stored in JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HatDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach_point: Option<AttachPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_scale: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_rotation: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_margin: Option<f64>,
}

impl HatDescriptor {
    /// Placement used when a user wears this hat
    pub fn worn_placement(&self) -> Placement {
        Placement {
            resource_id: self.resource_id.clone(),
            position: self.position.unwrap_or_default(),
            rotation: self.rotation.unwrap_or(Vec3::new(0.0, 180.0, 0.0)),
            scale: self.scale.unwrap_or(Vec3::splat(1.5)),
            attach_point: self.attach_point.clone().unwrap_or_default(),
        }
    }
}

/// Built-in command entries merged into a catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Controls {
    /// Clear, move and size commands
    #[default]
    Default,
    /// Clear only
    Min,
    /// No commands
    None,
}

impl Controls {
    /// Parse a controls parameter; unrecognized values select the default set
    pub fn parse(value: &str) -> Self {
        match value {
            "min" => Controls::Min,
            "none" => Controls::None,
            _ => Controls::Default,
        }
    }

    /// Command entries in menu order
    pub fn commands(&self) -> &'static [HatCommand] {
        match self {
            Controls::Default => HatCommand::ALL,
            Controls::Min => &[HatCommand::Clear],
            Controls::None => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Controls::Default => "default",
            Controls::Min => "min",
            Controls::None => "none",
        }
    }
}

/// Data file for a named hat kit
///
/// Unknown kits fall back to the combined catalog.
pub fn kit_file(kit: &str) -> &'static str {
    match kit {
        "city_helmets" => "1167643861778956427_city_helmets.json",
        "space_helmets" => "1166467957212054271_space_helmets.json",
        "galaxy_flyin_3" => "1166467957212054271_galaxy_flyin_3.json",
        "star_wars_scout_helmet" => "1172247038427922799_star_wars_scout_helmet.json",
        "samurai_helmets" => "1172272863143527350_samurai_helmets.json",
        "town_helmets" => "1172957249807582137_town_helmets.json",
        "viking_helmets" => "1184323616783729170_viking_helmets.json",
        _ => "all.json",
    }
}


/// One selectable item in the hat menu
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    /// Catalog id passed back on selection
    pub id: String,
    /// Preview model shown in the menu, if the entry has a resource
    pub preview: Option<Placement>,
    /// Position of the invisible click target
    pub button_position: Vec3,
}

/// Ordered collection of hat entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HatCatalog {
    entries: Vec<(String, HatDescriptor)>,
    options: HatDescriptor,
}

impl HatCatalog {
    /// Parse a catalog document
    pub fn from_json(text: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(text)?;
        Self::from_map(map)
    }

    /// Read and parse a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    fn from_map(map: Map<String, Value>) -> Result<Self> {
        let mut catalog = Self::default();
        for (id, value) in map {
            let descriptor: HatDescriptor = serde_json::from_value(value)
                .map_err(|source| SessionError::InvalidEntry {
                    id: id.clone(),
                    source,
                })?;
            catalog.upsert(id, descriptor);
        }
        Ok(catalog)
    }

    /// Insert an entry, replacing an existing one in place
    pub fn upsert(&mut self, id: String, descriptor: HatDescriptor) {
        if id == OPTIONS_KEY {
            self.options = descriptor;
            return;
        }
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = descriptor,
            None => self.entries.push((id, descriptor)),
        }
    }

    /// Overlay a built-in control set
    pub fn merge_controls(&mut self, controls: Controls) {
        for command in controls.commands() {
            self.upsert(command.id().to_string(), HatDescriptor::default());
        }
    }

    /// Look up an entry
    pub fn get(&self, id: &str) -> Option<&HatDescriptor> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, descriptor)| descriptor)
    }

    /// Entry ids in menu order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Number of entries, excluding options
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spacing between menu previews
    pub fn preview_margin(&self) -> f64 {
        self.options.preview_margin.unwrap_or(DEFAULT_PREVIEW_MARGIN)
    }

    /// Lay out the menu left to right
    pub fn menu_layout(&self) -> Vec<MenuEntry> {
        let margin = self.preview_margin();
        let mut x = 0.0;
        let mut menu = Vec::with_capacity(self.entries.len());

        for (id, descriptor) in &self.entries {
            let position = descriptor.menu_position.unwrap_or(Vec3::new(0.0, 1.0, 0.0));
            let preview = descriptor.resource_id.as_ref().map(|resource| Placement {
                resource_id: Some(resource.clone()),
                position: Vec3::new(x, position.y, position.z),
                rotation: descriptor.menu_rotation.unwrap_or_default(),
                scale: descriptor.menu_scale.unwrap_or(Vec3::splat(3.0)),
                attach_point: AttachPoint::new("none"),
            });

            menu.push(MenuEntry {
                id: id.clone(),
                preview,
                button_position: Vec3::new(x, 1.0, 0.0),
            });
            x += margin;
        }

        menu
    }
}
