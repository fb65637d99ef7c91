//! Rule compiler - turns [`Declarations`] into a frozen [`RuleSet`]
//!
//! Compilation runs in passes over the flattened statement list:
//! 1. declare every element and relation, wherever it appears
//! 2. validate every statement and collect relation templates
//! 3. load top-level membership facts
//! 4. derive memberships from `where` bodies until a fixed point
//! 5. instantiate properties, metadata and rules for every binding
//!
//! Because instantiation only starts once membership is closed, statement
//! order never changes which rules exist, only their precedence.

use ahash::AHashSet;
use log::debug;

use crate::catalog::{ElementCatalog, Provenance};
use crate::declarations::{Declarations, Statement, Term, WhereClause};
use crate::element::ElementId;
use crate::error::{CompileError, CompileErrorKind, SourcePath};
use crate::relations::{Membership, MembershipOrigin, RelationRegistry};
use crate::rules::{ReactionRule, RuleSet, RuleSource, SelfRule};

/// A statement with its position and the where clauses enclosing it
struct FlatStatement<'a> {
    ordinal: usize,
    path: SourcePath,
    clauses: Vec<&'a WhereClause>,
    statement: &'a Statement,
}

impl FlatStatement<'_> {
    fn in_where(&self) -> bool {
        !self.clauses.is_empty()
    }

    fn error(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(self.path.clone(), kind)
    }
}

/// Pre-order flattening; a where block gets its ordinal before its body
fn flatten<'a>(
    statements: &'a [Statement],
    parent: &SourcePath,
    clauses: &[&'a WhereClause],
    out: &mut Vec<FlatStatement<'a>>,
) {
    for (index, statement) in statements.iter().enumerate() {
        let path = parent.child(index);
        out.push(FlatStatement {
            ordinal: out.len(),
            path: path.clone(),
            clauses: clauses.to_vec(),
            statement,
        });

        if let Statement::Where {
            clauses: own,
            body,
        } = statement
        {
            let mut nested = clauses.to_vec();
            nested.extend(own.iter());
            flatten(body, &path, &nested, out);
        }
    }
}

/// One assignment of pattern variables to elements
#[derive(Clone, Debug, Default)]
struct Binding<'a> {
    vars: Vec<(&'a str, ElementId, MembershipOrigin)>,
    /// Origin of the membership matched by each clause
    origins: Vec<MembershipOrigin>,
}

impl<'a> Binding<'a> {
    fn get(&self, var: &str) -> Option<(ElementId, MembershipOrigin)> {
        self.vars
            .iter()
            .find(|(name, _, _)| *name == var)
            .map(|(_, id, origin)| (*id, *origin))
    }

    fn latest_origin(&self) -> MembershipOrigin {
        self.origins.iter().copied().max().unwrap_or_default()
    }

    /// Extend the row with a membership matching `clause`, or `None` when a
    /// literal or an already bound variable disagrees
    fn extend(
        &self,
        clause: &'a WhereClause,
        membership: &Membership,
        catalog: &ElementCatalog,
    ) -> Result<Option<Self>, CompileErrorKind> {
        let mut row = self.clone();
        for (term, id) in clause.terms.iter().zip(membership.terms()) {
            match term {
                Term::Element(name) => {
                    if catalog.id_of(name)? != id {
                        return Ok(None);
                    }
                }
                Term::Var(var) => match row.get(var) {
                    Some((bound, _)) if bound != id => return Ok(None),
                    Some(_) => {}
                    None => row.vars.push((var.as_str(), id, membership.origin)),
                },
            }
        }
        row.origins.push(membership.origin);
        Ok(Some(row))
    }
}

/// Cross product of the clauses' memberships, first clause outermost
fn enumerate_bindings<'a>(
    clauses: &[&'a WhereClause],
    relations: &RelationRegistry,
    catalog: &ElementCatalog,
) -> Result<Vec<Binding<'a>>, CompileErrorKind> {
    let mut rows = vec![Binding::default()];
    for &clause in clauses {
        let members = relations.members_of(&clause.relation)?;
        let mut next = Vec::with_capacity(rows.len() * members.len());
        for row in &rows {
            for membership in members {
                if let Some(extended) = row.extend(clause, membership, catalog)? {
                    next.push(extended);
                }
            }
        }
        rows = next;
    }
    Ok(rows)
}

fn resolve_term(
    term: &Term,
    row: &Binding<'_>,
    catalog: &ElementCatalog,
) -> Result<ElementId, CompileErrorKind> {
    match term {
        Term::Element(name) => catalog.id_of(name),
        Term::Var(var) => row
            .get(var)
            .map(|(id, _)| id)
            .ok_or_else(|| CompileErrorKind::UnboundVariable(var.clone())),
    }
}

fn check_probability(probability: f32) -> Result<(), CompileErrorKind> {
    if (0.0..=1.0).contains(&probability) {
        Ok(())
    } else {
        Err(CompileErrorKind::ProbabilityOutOfRange(probability))
    }
}

fn is_empty_literal(term: &Term) -> bool {
    matches!(term, Term::Element(name) if name == crate::element::EMPTY_NAME)
}

/// Compiles declarations into a [`RuleSet`]
pub struct RuleCompiler {
    catalog: ElementCatalog,
    relations: RelationRegistry,
    title: Option<String>,
    reactions: Vec<ReactionRule>,
    self_rules: Vec<SelfRule>,
}

impl RuleCompiler {
    /// Compile a full set of declarations
    ///
    /// All-or-nothing: the first failing statement aborts compilation.
    pub fn compile(declarations: &Declarations) -> Result<RuleSet, CompileError> {
        let mut flat = Vec::new();
        flatten(
            &declarations.statements,
            &SourcePath::default(),
            &[],
            &mut flat,
        );

        let mut compiler = Self {
            catalog: ElementCatalog::new(),
            relations: RelationRegistry::new(),
            title: None,
            reactions: Vec::new(),
            self_rules: Vec::new(),
        };

        for statement in &flat {
            compiler
                .declare(statement)
                .map_err(|kind| statement.error(kind))?;
        }
        for statement in &flat {
            compiler
                .validate(statement)
                .map_err(|kind| statement.error(kind))?;
        }
        compiler.load_facts(&flat)?;
        compiler.derive_memberships(&flat)?;
        for statement in &flat {
            compiler
                .instantiate(statement)
                .map_err(|kind| statement.error(kind))?;
        }

        Ok(compiler.finish())
    }

    fn declare(&mut self, flat: &FlatStatement<'_>) -> Result<(), CompileErrorKind> {
        match flat.statement {
            Statement::Element { .. } if flat.in_where() => {
                Err(CompileErrorKind::MisplacedDeclaration("element"))
            }
            Statement::Relation { .. } if flat.in_where() => {
                Err(CompileErrorKind::MisplacedDeclaration("relation"))
            }
            Statement::Title(_) if flat.in_where() => {
                Err(CompileErrorKind::MisplacedDeclaration("title"))
            }
            Statement::Element { name, color } => {
                self.catalog.define_element(name, color).map(|_| ())
            }
            Statement::Relation { name, arity } => self.relations.declare_relation(name, *arity),
            Statement::Title(title) => {
                self.title = Some(title.clone());
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Static checks that do not depend on membership, plus relation templates
    fn validate(&mut self, flat: &FlatStatement<'_>) -> Result<(), CompileErrorKind> {
        match flat.statement {
            Statement::Where { clauses, .. } => {
                for clause in clauses {
                    self.relations
                        .check_arity(&clause.relation, clause.terms.len())?;
                    for term in &clause.terms {
                        if let Term::Element(name) = term {
                            self.catalog.id_of(name)?;
                        }
                    }
                }
                return Ok(());
            }
            Statement::Member { relation, terms } => {
                self.relations.check_arity(relation, terms.len())?;
            }
            Statement::Property { key, value, .. } => {
                if !key.accepts(*value) {
                    return Err(CompileErrorKind::InvalidProperty {
                        key: *key,
                        value: *value,
                    });
                }
            }
            Statement::Reaction {
                probability, left, ..
            } => {
                check_probability(*probability)?;
                if is_empty_literal(left) {
                    return Err(CompileErrorKind::EmptyReactant);
                }
            }
            Statement::SelfTransition {
                probability,
                source,
                ..
            } => {
                check_probability(*probability)?;
                if is_empty_literal(source) {
                    return Err(CompileErrorKind::EmptyReactant);
                }
            }
            _ => {}
        }

        let bound: AHashSet<&str> = flat
            .clauses
            .iter()
            .flat_map(|clause| clause.terms.iter())
            .filter_map(Term::var_name)
            .collect();
        for term in flat.statement.terms() {
            match term {
                Term::Element(name) => {
                    self.catalog.id_of(name)?;
                }
                Term::Var(var) => {
                    if !bound.contains(var.as_str()) {
                        return Err(CompileErrorKind::UnboundVariable(var.clone()));
                    }
                }
            }
        }

        self.collect_template(flat)
    }

    /// `density 'x 1.0;` inside `where Solid 'x:` becomes a Solid default
    fn collect_template(&mut self, flat: &FlatStatement<'_>) -> Result<(), CompileErrorKind> {
        let (subject, property, tag) = match flat.statement {
            Statement::Property {
                key,
                subject,
                value,
            } => (subject, Some((*key, *value)), None),
            Statement::Tag { subject, tag } => (subject, None, Some(tag)),
            _ => return Ok(()),
        };
        let Some(var) = subject.var_name() else {
            return Ok(());
        };

        for clause in &flat.clauses {
            if clause.terms.first().and_then(Term::var_name) != Some(var) {
                continue;
            }
            let template = self.relations.template_mut(&clause.relation)?;
            if let Some(property) = property {
                template.properties.push(property);
            }
            if let Some(tag) = tag {
                template.tags.push(tag.clone());
            }
        }
        Ok(())
    }

    fn load_facts(&mut self, flat: &[FlatStatement<'_>]) -> Result<(), CompileError> {
        for statement in flat.iter().filter(|s| !s.in_where()) {
            if let Statement::Member { relation, terms } = statement.statement {
                self.add_member(relation, terms, &Binding::default(), statement.ordinal)
                    .map_err(|kind| statement.error(kind))?;
            }
        }
        Ok(())
    }

    /// Apply membership statements from where bodies until nothing new appears
    fn derive_memberships(&mut self, flat: &[FlatStatement<'_>]) -> Result<(), CompileError> {
        let derivations: Vec<&FlatStatement<'_>> = flat
            .iter()
            .filter(|s| s.in_where() && matches!(s.statement, Statement::Member { .. }))
            .collect();
        if derivations.is_empty() {
            return Ok(());
        }

        let mut round = 0;
        loop {
            round += 1;
            let mut added = 0;
            for statement in &derivations {
                let Statement::Member { relation, terms } = statement.statement else {
                    continue;
                };
                let rows = enumerate_bindings(&statement.clauses, &self.relations, &self.catalog)
                    .map_err(|kind| statement.error(kind))?;
                for row in &rows {
                    if self
                        .add_member(relation, terms, row, statement.ordinal)
                        .map_err(|kind| statement.error(kind))?
                    {
                        added += 1;
                    }
                }
            }

            debug!("Membership round {}: {} new tuples", round, added);
            if added == 0 {
                return Ok(());
            }
        }
    }

    fn add_member(
        &mut self,
        relation: &str,
        terms: &[Term],
        row: &Binding<'_>,
        statement: usize,
    ) -> Result<bool, CompileErrorKind> {
        let ids = terms
            .iter()
            .map(|term| resolve_term(term, row, &self.catalog))
            .collect::<Result<Vec<_>, _>>()?;
        let Some((subject, args)) = ids.split_first() else {
            return Err(CompileErrorKind::InvalidArity(relation.to_string()));
        };
        self.relations.add_member(relation, *subject, args, statement)
    }

    fn instantiate(&mut self, flat: &FlatStatement<'_>) -> Result<(), CompileErrorKind> {
        if matches!(
            flat.statement,
            Statement::Title(_)
                | Statement::Element { .. }
                | Statement::Relation { .. }
                | Statement::Member { .. }
                | Statement::Where { .. }
        ) {
            return Ok(());
        }

        let rows = if flat.in_where() {
            enumerate_bindings(&flat.clauses, &self.relations, &self.catalog)?
        } else {
            vec![Binding::default()]
        };

        for (index, row) in rows.iter().enumerate() {
            let source = RuleSource {
                statement: flat.ordinal,
                binding: index,
            };
            match flat.statement {
                Statement::Property {
                    key,
                    subject,
                    value,
                } => {
                    let id = resolve_term(subject, row, &self.catalog)?;
                    let provenance = self.provenance(flat, subject, row);
                    self.catalog.assign_property(id, *key, *value, provenance)?;
                }
                Statement::Tag { subject, tag } => {
                    let id = resolve_term(subject, row, &self.catalog)?;
                    let provenance = self.provenance(flat, subject, row);
                    self.catalog.add_tag(id, tag, provenance);
                }
                Statement::Name { subject, name } => {
                    let id = resolve_term(subject, row, &self.catalog)?;
                    let provenance = self.provenance(flat, subject, row);
                    self.catalog.set_display_name(id, name, provenance);
                }
                Statement::Description { subject, text } => {
                    let id = resolve_term(subject, row, &self.catalog)?;
                    let provenance = self.provenance(flat, subject, row);
                    self.catalog.append_description(id, text, provenance);
                }
                Statement::Reaction {
                    probability,
                    left,
                    right,
                    out_left,
                    out_right,
                } => {
                    let rule = ReactionRule {
                        probability: *probability,
                        left: resolve_term(left, row, &self.catalog)?,
                        right: resolve_term(right, row, &self.catalog)?,
                        out_left: resolve_term(out_left, row, &self.catalog)?,
                        out_right: resolve_term(out_right, row, &self.catalog)?,
                        source,
                    };
                    if rule.left.is_empty() {
                        return Err(CompileErrorKind::EmptyReactant);
                    }
                    self.reactions.push(rule);
                }
                Statement::SelfTransition {
                    probability,
                    source: element,
                    target,
                } => {
                    let rule = SelfRule {
                        probability: *probability,
                        element: resolve_term(element, row, &self.catalog)?,
                        target: resolve_term(target, row, &self.catalog)?,
                        source,
                    };
                    if rule.element.is_empty() {
                        return Err(CompileErrorKind::EmptyReactant);
                    }
                    self.self_rules.push(rule);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Top-level statements are explicit; instantiated ones inherit the
    /// precedence of the membership that bound their subject
    fn provenance(&self, flat: &FlatStatement<'_>, subject: &Term, row: &Binding<'_>) -> Provenance {
        if !flat.in_where() {
            return Provenance::Explicit {
                statement: flat.ordinal,
            };
        }
        let origin = subject
            .var_name()
            .and_then(|var| row.get(var))
            .map(|(_, origin)| origin)
            .unwrap_or_else(|| row.latest_origin());
        Provenance::Inherited {
            origin,
            statement: flat.ordinal,
        }
    }

    fn finish(self) -> RuleSet {
        let elements = self.catalog.resolve_all(&self.relations);
        debug!(
            "Compiled {} elements, {} relations ({} memberships), {} reactions, {} self rules",
            elements.len(),
            self.relations.len(),
            self.relations.membership_count(),
            self.reactions.len(),
            self.self_rules.len()
        );
        RuleSet::new(
            self.title,
            elements,
            self.relations,
            self.reactions,
            self.self_rules,
        )
    }
}

/// Compile declarations into a rule set
pub fn compile(declarations: &Declarations) -> Result<RuleSet, CompileError> {
    RuleCompiler::compile(declarations)
}
