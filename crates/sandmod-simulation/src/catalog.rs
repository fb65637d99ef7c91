//! Element catalog - element declarations and deferred property resolution
//!
//! Property assignments are recorded with a [`Provenance`] rather than applied
//! immediately, because a relation membership may be declared before or after
//! an element's own `density`/`gravity` statements. [`ElementCatalog::resolve`]
//! picks the winning assignment per key once everything is loaded:
//! explicit statements beat relation defaults, and among relation defaults the
//! later membership wins.

use ahash::AHashMap;

use crate::element::{EMPTY_NAME, ElementDef, ElementId, ElementProperties, Elements, PropertyKey};
use crate::error::CompileErrorKind;
use crate::relations::{MembershipOrigin, RelationRegistry};

/// Element ids are `u16`, `Empty` included
pub const MAX_ELEMENTS: usize = u16::MAX as usize + 1;

/// Precedence of an assignment. Ordering is significant: any `Explicit`
/// outranks every `Inherited`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Provenance {
    /// Instantiated from a `where` block through a relation membership
    Inherited {
        origin: MembershipOrigin,
        statement: usize,
    },
    /// Stated directly for a concrete element at top level
    Explicit { statement: usize },
}

#[derive(Clone, Debug)]
struct PendingElement {
    name: String,
    color: Option<String>,
    properties: [Option<(Provenance, f32)>; 4],
    display_name: Option<(Provenance, String)>,
    descriptions: Vec<(Provenance, String)>,
    tags: Vec<(Provenance, String)>,
}

impl PendingElement {
    fn new(name: &str, color: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            color,
            properties: [None; 4],
            display_name: None,
            descriptions: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn resolved_properties(&self) -> ElementProperties {
        let mut slots = [0.0; 4];
        for (slot, assignment) in slots.iter_mut().zip(&self.properties) {
            if let Some((_, value)) = assignment {
                *slot = *value;
            }
        }
        ElementProperties::from_slots(slots)
    }
}

/// Declared elements and their pending property assignments
#[derive(Clone, Debug)]
pub struct ElementCatalog {
    elements: Vec<PendingElement>,
    by_name: AHashMap<String, ElementId>,
    next_direct: usize,
}

impl ElementCatalog {
    /// Create a catalog containing only the built-in `Empty` element
    pub fn new() -> Self {
        let mut by_name = AHashMap::new();
        by_name.insert(EMPTY_NAME.to_string(), ElementId::EMPTY);
        Self {
            elements: vec![PendingElement::new(EMPTY_NAME, None)],
            by_name,
            next_direct: 0,
        }
    }

    pub fn define_element(&mut self, name: &str, color: &str) -> Result<ElementId, CompileErrorKind> {
        if self.by_name.contains_key(name) {
            return Err(CompileErrorKind::DuplicateElement(name.to_string()));
        }
        let id = u16::try_from(self.elements.len())
            .map(ElementId)
            .map_err(|_| CompileErrorKind::TooManyElements {
                limit: MAX_ELEMENTS,
            })?;
        self.elements
            .push(PendingElement::new(name, Some(color.to_string())));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Result<ElementId, CompileErrorKind> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CompileErrorKind::UnknownElement(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Explicitly set a property, outranking relation defaults and any
    /// earlier direct assignment
    pub fn set_property(&mut self, name: &str, key: PropertyKey, value: f32) -> Result<(), CompileErrorKind> {
        let id = self.id_of(name)?;
        let provenance = Provenance::Explicit {
            statement: self.next_direct,
        };
        self.next_direct += 1;
        self.assign_property(id, key, value, provenance)
    }

    /// Record a property assignment; the highest provenance wins at
    /// resolution, later calls win ties
    pub fn assign_property(
        &mut self,
        id: ElementId,
        key: PropertyKey,
        value: f32,
        provenance: Provenance,
    ) -> Result<(), CompileErrorKind> {
        if !key.accepts(value) {
            return Err(CompileErrorKind::InvalidProperty { key, value });
        }

        let slot = &mut self.elements[id.index()].properties[ElementProperties::slot_of(key)];
        if outranks(provenance, slot.as_ref().map(|(p, _)| *p)) {
            *slot = Some((provenance, value));
        }
        Ok(())
    }

    /// Record a relation-level default for a member element
    pub fn inherit_property(
        &mut self,
        id: ElementId,
        key: PropertyKey,
        value: f32,
        origin: MembershipOrigin,
        statement: usize,
    ) -> Result<(), CompileErrorKind> {
        self.assign_property(id, key, value, Provenance::Inherited { origin, statement })
    }

    pub fn add_tag(&mut self, id: ElementId, tag: &str, provenance: Provenance) {
        self.elements[id.index()]
            .tags
            .push((provenance, tag.to_string()));
    }

    pub fn set_display_name(&mut self, id: ElementId, name: &str, provenance: Provenance) {
        let slot = &mut self.elements[id.index()].display_name;
        if outranks(provenance, slot.as_ref().map(|(p, _)| *p)) {
            *slot = Some((provenance, name.to_string()));
        }
    }

    pub fn append_description(&mut self, id: ElementId, text: &str, provenance: Provenance) {
        self.elements[id.index()]
            .descriptions
            .push((provenance, text.to_string()));
    }

    /// Final physical properties of an element
    pub fn resolve(&self, name: &str) -> Result<ElementProperties, CompileErrorKind> {
        let id = self.id_of(name)?;
        Ok(self.elements[id.index()].resolved_properties())
    }

    /// Resolve every element into the read-only table used at runtime
    pub fn resolve_all(&self, relations: &RelationRegistry) -> Elements {
        let defs = self
            .elements
            .iter()
            .enumerate()
            .map(|(index, pending)| {
                let id = ElementId(index as u16);
                ElementDef {
                    id,
                    name: pending.name.clone(),
                    color: pending.color.clone(),
                    display_name: pending.display_name.as_ref().map(|(_, n)| n.clone()),
                    description: ordered_unique(&pending.descriptions).concat(),
                    tags: ordered_unique(&pending.tags),
                    properties: pending.resolved_properties(),
                    relations: relations.relations_of(id),
                }
            })
            .collect();
        Elements::from_defs(defs)
    }
}

impl Default for ElementCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn outranks(candidate: Provenance, current: Option<Provenance>) -> bool {
    current.is_none_or(|current| candidate >= current)
}

/// Sort fragments by precedence and drop repeats, keeping the first occurrence
fn ordered_unique(fragments: &[(Provenance, String)]) -> Vec<String> {
    let mut sorted: Vec<&(Provenance, String)> = fragments.iter().collect();
    sorted.sort_by_key(|(provenance, _)| *provenance);

    let mut out: Vec<String> = Vec::with_capacity(sorted.len());
    for (_, text) in sorted {
        if !out.iter().any(|existing| existing == text) {
            out.push(text.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inherited(statement: usize, sequence: usize) -> Provenance {
        Provenance::Inherited {
            origin: MembershipOrigin {
                statement,
                sequence,
            },
            statement: 0,
        }
    }

    #[test]
    fn test_empty_is_builtin() {
        let mut catalog = ElementCatalog::new();
        assert_eq!(catalog.id_of("Empty"), Ok(ElementId::EMPTY));
        assert_eq!(
            catalog.define_element("Empty", "#000000"),
            Err(CompileErrorKind::DuplicateElement("Empty".to_string()))
        );
    }

    #[test]
    fn test_duplicate_element() {
        let mut catalog = ElementCatalog::new();
        assert_eq!(catalog.define_element("Sand", "#D8E090"), Ok(ElementId(1)));
        assert!(matches!(
            catalog.define_element("Sand", "#FFFFFF"),
            Err(CompileErrorKind::DuplicateElement(_))
        ));
    }

    #[test]
    fn test_element_ids_do_not_wrap() {
        let mut catalog = ElementCatalog::new();
        for i in 1..MAX_ELEMENTS {
            catalog.define_element(&format!("E{i}"), "#FFFFFF").unwrap();
        }
        assert_eq!(catalog.len(), MAX_ELEMENTS);
        assert_eq!(catalog.id_of("E65535"), Ok(ElementId(u16::MAX)));

        assert_eq!(
            catalog.define_element("Overflow", "#FFFFFF"),
            Err(CompileErrorKind::TooManyElements {
                limit: MAX_ELEMENTS
            })
        );
        assert!(catalog.id_of("Overflow").is_err());
    }

    #[test]
    fn test_unknown_element() {
        let catalog = ElementCatalog::new();
        assert_eq!(
            catalog.resolve("Lava"),
            Err(CompileErrorKind::UnknownElement("Lava".to_string()))
        );
    }

    #[test]
    fn test_explicit_beats_inherited_regardless_of_order() {
        let mut catalog = ElementCatalog::new();
        let oil = catalog.define_element("Oil", "#804000").unwrap();

        catalog.set_property("Oil", PropertyKey::Density, 0.7).unwrap();
        catalog
            .assign_property(oil, PropertyKey::Density, 0.8, inherited(99, 99))
            .unwrap();

        let props = catalog.resolve("Oil").unwrap();
        assert_eq!(props.density, 0.7);
    }

    #[test]
    fn test_later_membership_wins_between_relations() {
        let mut catalog = ElementCatalog::new();
        let mud = catalog.define_element("Mud", "#402000").unwrap();

        catalog
            .assign_property(mud, PropertyKey::Density, 0.8, inherited(20, 3))
            .unwrap();
        let earlier = MembershipOrigin {
            statement: 10,
            sequence: 1,
        };
        catalog
            .inherit_property(mud, PropertyKey::Density, 0.9, earlier, 0)
            .unwrap();

        assert_eq!(catalog.resolve("Mud").unwrap().density, 0.8);
        // Unset keys default to zero
        assert_eq!(catalog.resolve("Mud").unwrap().slide, 0.0);
    }

    #[test]
    fn test_invalid_property_rejected() {
        let mut catalog = ElementCatalog::new();
        catalog.define_element("Water", "#0000FF").unwrap();
        assert_eq!(
            catalog.set_property("Water", PropertyKey::Spread, -0.3),
            Err(CompileErrorKind::InvalidProperty {
                key: PropertyKey::Spread,
                value: -0.3,
            })
        );
    }

    #[test]
    fn test_descriptions_and_tags_in_precedence_order() {
        let mut catalog = ElementCatalog::new();
        let sand = catalog.define_element("Sand", "#D8E090").unwrap();

        catalog.append_description(sand, "Falls. ", inherited(30, 2));
        catalog.append_description(sand, "Solid. ", inherited(10, 1));
        catalog.add_tag(sand, "(all)", Provenance::Explicit { statement: 12 });
        catalog.add_tag(sand, "Dusts", inherited(30, 2));
        catalog.add_tag(sand, "Dusts", inherited(31, 4));

        let elements = catalog.resolve_all(&RelationRegistry::new());
        let def = elements.get(sand);
        assert_eq!(def.description, "Solid. Falls. ");
        assert_eq!(def.tags, vec!["Dusts".to_string(), "(all)".to_string()]);
        assert_eq!(def.label(), "Sand");
    }
}
