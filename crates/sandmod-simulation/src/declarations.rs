//! Declaration model delivered by a mod front end
//!
//! A mod is an ordered list of [`Statement`]s. Statements may appear in any
//! order: the compiler collects every element, relation and membership before
//! instantiating rules, so a `where` block also applies to members declared
//! after it. The model is serde-friendly so mods can be stored as RON.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::element::PropertyKey;

/// A statement slot: either a concrete element or a pattern variable
///
/// Serialized as a plain string, `"'x"` for variables and `"Water"` for
/// elements, mirroring the mod file notation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Term {
    Element(String),
    Var(String),
}

impl Term {
    pub fn var_name(&self) -> Option<&str> {
        match self {
            Term::Var(name) => Some(name),
            Term::Element(_) => None,
        }
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        match s.strip_prefix('\'') {
            Some(var) => Term::Var(var.to_string()),
            None => Term::Element(s.to_string()),
        }
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::from(s.as_str())
    }
}

impl From<Term> for String {
    fn from(term: Term) -> Self {
        term.to_string()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Element(name) => write!(f, "{name}"),
            Term::Var(name) => write!(f, "'{name}"),
        }
    }
}

/// One `Relation 'a 'b` clause of a `where` header
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    pub relation: String,
    pub terms: Vec<Term>,
}

impl WhereClause {
    pub fn new<T: Into<Term>>(relation: &str, terms: impl IntoIterator<Item = T>) -> Self {
        Self {
            relation: relation.to_string(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single mod statement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `title "Default Mod";`
    Title(String),
    /// `element Sand #D8E090;`
    Element { name: String, color: String },
    /// `relation Source/2;` (arity counts the subject)
    Relation { name: String, arity: usize },
    /// `Source Spring Water;` or, inside a where block, `Solid 'source;`
    Member { relation: String, terms: Vec<Term> },
    /// `density 'x 1.0;`
    Property {
        key: PropertyKey,
        subject: Term,
        value: f32,
    },
    /// `tag 'x "Solids";`
    Tag { subject: Term, tag: String },
    /// `name Fire1 "Fire";`
    Name { subject: Term, name: String },
    /// `description 'x "Falls. ";`
    Description { subject: Term, text: String },
    /// `reaction 1.0 Water Plant => Plant Plant;`
    Reaction {
        probability: f32,
        left: Term,
        right: Term,
        out_left: Term,
        out_right: Term,
    },
    /// `self 0.2 Fire1 => Fire2;`
    SelfTransition {
        probability: f32,
        source: Term,
        target: Term,
    },
    /// `where Flammable 'fuel, Firey 'fire 'extinguished: ... end;`
    Where {
        clauses: Vec<WhereClause>,
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn element(name: &str, color: &str) -> Self {
        Statement::Element {
            name: name.to_string(),
            color: color.to_string(),
        }
    }

    pub fn relation(name: &str, arity: usize) -> Self {
        Statement::Relation {
            name: name.to_string(),
            arity,
        }
    }

    pub fn member<T: Into<Term>>(relation: &str, terms: impl IntoIterator<Item = T>) -> Self {
        Statement::Member {
            relation: relation.to_string(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    pub fn property(key: PropertyKey, subject: &str, value: f32) -> Self {
        Statement::Property {
            key,
            subject: subject.into(),
            value,
        }
    }

    pub fn tag(subject: &str, tag: &str) -> Self {
        Statement::Tag {
            subject: subject.into(),
            tag: tag.to_string(),
        }
    }

    pub fn name(subject: &str, name: &str) -> Self {
        Statement::Name {
            subject: subject.into(),
            name: name.to_string(),
        }
    }

    pub fn description(subject: &str, text: &str) -> Self {
        Statement::Description {
            subject: subject.into(),
            text: text.to_string(),
        }
    }

    pub fn reaction(probability: f32, left: &str, right: &str, out_left: &str, out_right: &str) -> Self {
        Statement::Reaction {
            probability,
            left: left.into(),
            right: right.into(),
            out_left: out_left.into(),
            out_right: out_right.into(),
        }
    }

    pub fn self_transition(probability: f32, source: &str, target: &str) -> Self {
        Statement::SelfTransition {
            probability,
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn where_block(clauses: Vec<WhereClause>, body: Vec<Statement>) -> Self {
        Statement::Where { clauses, body }
    }

    /// Every term this statement refers to (not descending into where bodies)
    pub fn terms(&self) -> Vec<&Term> {
        match self {
            Statement::Member { terms, .. } => terms.iter().collect(),
            Statement::Property { subject, .. }
            | Statement::Tag { subject, .. }
            | Statement::Name { subject, .. }
            | Statement::Description { subject, .. } => vec![subject],
            Statement::Reaction {
                left,
                right,
                out_left,
                out_right,
                ..
            } => vec![left, right, out_left, out_right],
            Statement::SelfTransition { source, target, .. } => vec![source, target],
            Statement::Title(_)
            | Statement::Element { .. }
            | Statement::Relation { .. }
            | Statement::Where { .. } => Vec::new(),
        }
    }
}

/// An ordered list of mod statements
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Declarations {
    pub statements: Vec<Statement>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: Statement) -> &mut Self {
        self.statements.push(statement);
        self
    }

    /// Builder-style append
    pub fn with(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Parse declarations from RON text
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
