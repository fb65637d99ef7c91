//! Compiled rule set - the read-only dispatch tables consulted every tick
//!
//! Reactions are bucketed by the concrete ordered `(left, right)` pair and self
//! transitions by source element, so lookup is a single hash probe. Each bucket
//! is kept in source order (statement ordinal, then binding enumeration order),
//! which is the order the resolver tries candidates in.

use ahash::AHashMap;

use crate::element::{ElementId, Elements};
use crate::relations::RelationRegistry;

/// Where an instantiated rule came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleSource {
    /// Source ordinal of the reaction/self statement
    pub statement: usize,
    /// Index of the binding that produced this instance (0 for literal rules)
    pub binding: usize,
}

/// An instantiated `reaction p left right => out_left out_right`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactionRule {
    pub probability: f32,
    pub left: ElementId,
    pub right: ElementId,
    pub out_left: ElementId,
    pub out_right: ElementId,
    pub source: RuleSource,
}

/// An instantiated `self p element => target`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelfRule {
    pub probability: f32,
    pub element: ElementId,
    pub target: ElementId,
    pub source: RuleSource,
}

/// Immutable result of compiling a mod
#[derive(Clone, Debug)]
pub struct RuleSet {
    title: Option<String>,
    elements: Elements,
    relations: RelationRegistry,
    reactions: Vec<ReactionRule>,
    self_rules: Vec<SelfRule>,
    reaction_index: AHashMap<(ElementId, ElementId), Vec<ReactionRule>>,
    self_index: AHashMap<ElementId, Vec<SelfRule>>,
    /// Per element id: does it appear as the left side of any reaction
    reactive: Vec<bool>,
}

impl RuleSet {
    pub(crate) fn new(
        title: Option<String>,
        elements: Elements,
        relations: RelationRegistry,
        mut reactions: Vec<ReactionRule>,
        mut self_rules: Vec<SelfRule>,
    ) -> Self {
        reactions.sort_by_key(|r| r.source);
        self_rules.sort_by_key(|r| r.source);

        let mut reaction_index: AHashMap<(ElementId, ElementId), Vec<ReactionRule>> =
            AHashMap::new();
        let mut reactive = vec![false; elements.len()];
        for rule in &reactions {
            reaction_index
                .entry((rule.left, rule.right))
                .or_default()
                .push(*rule);
            if let Some(flag) = reactive.get_mut(rule.left.index()) {
                *flag = true;
            }
        }

        let mut self_index: AHashMap<ElementId, Vec<SelfRule>> = AHashMap::new();
        for rule in &self_rules {
            self_index.entry(rule.element).or_default().push(*rule);
        }

        Self {
            title,
            elements,
            relations,
            reactions,
            self_rules,
            reaction_index,
            self_index,
            reactive,
        }
    }

    /// Mod title, if the declarations carried one
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    /// Every instantiated reaction in source order
    pub fn reactions(&self) -> &[ReactionRule] {
        &self.reactions
    }

    /// Every instantiated self transition in source order
    pub fn self_rules(&self) -> &[SelfRule] {
        &self.self_rules
    }

    /// Candidate reactions for an ordered (left, right) pair
    pub fn reactions_for(&self, left: ElementId, right: ElementId) -> &[ReactionRule] {
        self.reaction_index
            .get(&(left, right))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn self_rules_for(&self, element: ElementId) -> &[SelfRule] {
        self.self_index
            .get(&element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `element` can initiate any reaction at all
    pub fn has_reactions_from(&self, element: ElementId) -> bool {
        self.reactive.get(element.index()).copied().unwrap_or(false)
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    pub fn self_rule_count(&self) -> usize {
        self.self_rules.len()
    }
}
