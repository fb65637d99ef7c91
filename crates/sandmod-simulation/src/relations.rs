//! Relation registry - relation definitions and open membership sets

use ahash::{AHashMap, AHashSet};

use crate::element::{ElementId, PropertyKey};
use crate::error::CompileErrorKind;

/// Where a membership came from; later origins take precedence when
/// relation defaults conflict
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MembershipOrigin {
    /// Source ordinal of the statement that asserted the membership
    pub statement: usize,
    /// Discovery sequence number (unique per registry)
    pub sequence: usize,
}

/// A member tuple `(subject, args...)` of a relation
#[derive(Clone, Debug, PartialEq)]
pub struct Membership {
    pub subject: ElementId,
    pub args: Vec<ElementId>,
    pub origin: MembershipOrigin,
}

impl Membership {
    /// Subject followed by the bound arguments, in positional order
    pub fn terms(&self) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::once(self.subject).chain(self.args.iter().copied())
    }
}

/// Property and tag defaults declared for every member of a relation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyTemplate {
    pub properties: Vec<(PropertyKey, f32)>,
    pub tags: Vec<String>,
}

impl PropertyTemplate {
    pub fn get(&self, key: PropertyKey) -> Option<f32> {
        self.properties
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}

/// A declared relation
#[derive(Clone, Debug, PartialEq)]
pub struct RelationDef {
    pub name: String,
    /// Number of positional terms, subject included
    pub arity: usize,
    pub template: PropertyTemplate,
}

/// Registry of relations and their (append-only) memberships
#[derive(Clone, Debug, Default)]
pub struct RelationRegistry {
    relations: Vec<RelationDef>,
    by_name: AHashMap<String, usize>,
    members: Vec<Vec<Membership>>,
    seen: Vec<AHashSet<Vec<ElementId>>>,
    next_sequence: usize,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_relation(&mut self, name: &str, arity: usize) -> Result<(), CompileErrorKind> {
        if arity == 0 {
            return Err(CompileErrorKind::InvalidArity(name.to_string()));
        }
        if self.by_name.contains_key(name) {
            return Err(CompileErrorKind::DuplicateRelation(name.to_string()));
        }

        self.by_name.insert(name.to_string(), self.relations.len());
        self.relations.push(RelationDef {
            name: name.to_string(),
            arity,
            template: PropertyTemplate::default(),
        });
        self.members.push(Vec::new());
        self.seen.push(AHashSet::new());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&RelationDef, CompileErrorKind> {
        self.index_of(name).map(|i| &self.relations[i])
    }

    /// Check that `found` terms fit the relation's arity
    pub fn check_arity(&self, name: &str, found: usize) -> Result<(), CompileErrorKind> {
        let relation = self.get(name)?;
        if relation.arity != found {
            return Err(CompileErrorKind::ArityMismatch {
                relation: name.to_string(),
                expected: relation.arity,
                found,
            });
        }
        Ok(())
    }

    /// Add `(subject, args...)` to a relation
    ///
    /// Returns `Ok(false)` when the tuple was already a member.
    pub fn add_member(
        &mut self,
        relation: &str,
        subject: ElementId,
        args: &[ElementId],
        statement: usize,
    ) -> Result<bool, CompileErrorKind> {
        let index = self.index_of(relation)?;
        self.check_arity(relation, 1 + args.len())?;

        let mut key = Vec::with_capacity(1 + args.len());
        key.push(subject);
        key.extend_from_slice(args);
        if !self.seen[index].insert(key) {
            return Ok(false);
        }

        let origin = MembershipOrigin {
            statement,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.members[index].push(Membership {
            subject,
            args: args.to_vec(),
            origin,
        });
        Ok(true)
    }

    /// Current members of a relation, in discovery order
    pub fn members_of(&self, relation: &str) -> Result<&[Membership], CompileErrorKind> {
        self.index_of(relation).map(|i| self.members[i].as_slice())
    }

    pub fn property_defaults_of(&self, relation: &str) -> Result<&PropertyTemplate, CompileErrorKind> {
        self.get(relation).map(|r| &r.template)
    }

    pub(crate) fn template_mut(&mut self, relation: &str) -> Result<&mut PropertyTemplate, CompileErrorKind> {
        let index = self.index_of(relation)?;
        Ok(&mut self.relations[index].template)
    }

    pub fn is_member(&self, relation: &str, subject: ElementId) -> bool {
        self.members_of(relation)
            .map(|members| members.iter().any(|m| m.subject == subject))
            .unwrap_or(false)
    }

    /// Names of the relations `subject` belongs to, ordered by first membership
    pub fn relations_of(&self, subject: ElementId) -> Vec<String> {
        let mut found: Vec<(MembershipOrigin, &str)> = Vec::new();
        for (relation, members) in self.relations.iter().zip(&self.members) {
            if let Some(first) = members.iter().find(|m| m.subject == subject) {
                found.push((first.origin, relation.name.as_str()));
            }
        }
        found.sort_by_key(|(origin, _)| origin.sequence);
        found.into_iter().map(|(_, name)| name.to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations.iter()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn membership_count(&self) -> usize {
        self.members.iter().map(Vec::len).sum()
    }

    fn index_of(&self, name: &str) -> Result<usize, CompileErrorKind> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CompileErrorKind::UndefinedRelation(name.to_string()))
    }
}
