//! Mod compilation and reaction resolution for sandmod
//!
//! This crate turns a mod's declarations into an executable rule set:
//! - Declaration model (Declarations, Statement, Term, WhereClause)
//! - Relation registry with open membership (RelationRegistry)
//! - Element catalog with inherited and explicit properties (ElementCatalog)
//! - Rule compiler and the frozen dispatch tables (RuleCompiler, RuleSet)
//! - Reaction resolver (`RuleSet::try_react`, `RuleSet::try_self`)
//! - RNG abstraction shared with the grid simulator (SimRng)

mod catalog;
mod compiler;
mod declarations;
mod default_mod;
mod element;
mod error;
mod relations;
mod resolver;
mod rng;
mod rules;

pub use catalog::{ElementCatalog, MAX_ELEMENTS, Provenance};
pub use compiler::{RuleCompiler, compile};
pub use declarations::{Declarations, Statement, Term, WhereClause};
pub use element::{EMPTY_NAME, ElementDef, ElementId, ElementProperties, Elements, PropertyKey};
pub use error::{CompileError, CompileErrorKind, SourcePath};
pub use relations::{Membership, MembershipOrigin, PropertyTemplate, RelationDef, RelationRegistry};
pub use rng::{SimRng, shuffle};
pub use rules::{ReactionRule, RuleSet, RuleSource, SelfRule};
