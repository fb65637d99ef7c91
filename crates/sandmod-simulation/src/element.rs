//! Element identifiers, physical properties and the resolved element table

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Name of the built-in element that marks an unoccupied cell
pub const EMPTY_NAME: &str = "Empty";

/// Dense element identifier, assigned in declaration order (0 = Empty)
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ElementId(pub u16);

impl ElementId {
    pub const EMPTY: ElementId = ElementId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

/// Physical property keys (`density`, `gravity`, `spread`, `slide`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    Density,
    Gravity,
    Spread,
    Slide,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 4] = [
        PropertyKey::Density,
        PropertyKey::Gravity,
        PropertyKey::Spread,
        PropertyKey::Slide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::Density => "density",
            PropertyKey::Gravity => "gravity",
            PropertyKey::Spread => "spread",
            PropertyKey::Slide => "slide",
        }
    }

    fn slot(self) -> usize {
        match self {
            PropertyKey::Density => 0,
            PropertyKey::Gravity => 1,
            PropertyKey::Spread => 2,
            PropertyKey::Slide => 3,
        }
    }

    /// Whether `value` is acceptable for this key
    pub fn accepts(self, value: f32) -> bool {
        match self {
            PropertyKey::Density | PropertyKey::Gravity => value.is_finite(),
            PropertyKey::Spread | PropertyKey::Slide => value.is_finite() && value >= 0.0,
        }
    }
}

/// Physical properties consumed by the movement phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementProperties {
    /// Settling order: denser elements sink through lighter ones
    pub density: f32,
    /// Vertical bias: positive falls, negative rises, zero is inert
    pub gravity: f32,
    /// Chance per tick of a lateral jitter step
    pub spread: f32,
    /// Chance per tick of deflecting diagonally when blocked
    pub slide: f32,
}

impl ElementProperties {
    pub fn get(&self, key: PropertyKey) -> f32 {
        match key {
            PropertyKey::Density => self.density,
            PropertyKey::Gravity => self.gravity,
            PropertyKey::Spread => self.spread,
            PropertyKey::Slide => self.slide,
        }
    }

    pub fn set(&mut self, key: PropertyKey, value: f32) {
        match key {
            PropertyKey::Density => self.density = value,
            PropertyKey::Gravity => self.gravity = value,
            PropertyKey::Spread => self.spread = value,
            PropertyKey::Slide => self.slide = value,
        }
    }

    /// Inert elements (gravity 0, including -0.0) never move and are never displaced
    pub fn is_mobile(&self) -> bool {
        self.gravity != 0.0
    }

    /// +1 for falling (toward higher rows), -1 for rising, 0 for inert
    pub fn gravity_direction(&self) -> i32 {
        if self.gravity > 0.0 {
            1
        } else if self.gravity < 0.0 {
            -1
        } else {
            0
        }
    }

    pub(crate) fn from_slots(slots: [f32; 4]) -> Self {
        let mut props = Self::default();
        for key in PropertyKey::ALL {
            props.set(key, slots[key.slot()]);
        }
        props
    }

    pub(crate) fn slot_of(key: PropertyKey) -> usize {
        key.slot()
    }
}

/// A fully resolved element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementDef {
    pub id: ElementId,
    pub name: String,
    /// Display color as declared (`#RRGGBB`), opaque to the engine
    pub color: Option<String>,
    pub display_name: Option<String>,
    pub description: String,
    /// UI categories (`"Solids"`, `"(all)"`, ...)
    pub tags: Vec<String>,
    pub properties: ElementProperties,
    /// Relations this element is the subject of, in membership order
    pub relations: Vec<String>,
}

impl ElementDef {
    /// Display name if one was declared, otherwise the element name
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Read-only table of resolved elements, indexed by [`ElementId`]
#[derive(Clone, Debug, Default)]
pub struct Elements {
    defs: Vec<ElementDef>,
    by_name: AHashMap<String, ElementId>,
}

impl Elements {
    pub(crate) fn from_defs(defs: Vec<ElementDef>) -> Self {
        let by_name = defs.iter().map(|d| (d.name.clone(), d.id)).collect();
        Self { defs, by_name }
    }

    /// Get an element by id, falling back to Empty for unknown ids
    pub fn get(&self, id: ElementId) -> &ElementDef {
        self.defs
            .get(id.index())
            .unwrap_or(&self.defs[ElementId::EMPTY.index()])
    }

    pub fn properties(&self, id: ElementId) -> &ElementProperties {
        &self.get(id).properties
    }

    pub fn id_of(&self, name: &str) -> Option<ElementId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: ElementId) -> &str {
        &self.get(id).name
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementDef> {
        self.defs.iter()
    }

    /// Element names ordered by id, as used by snapshot palettes
    pub fn names(&self) -> Vec<String> {
        self.defs.iter().map(|d| d.name.clone()).collect()
    }
}
