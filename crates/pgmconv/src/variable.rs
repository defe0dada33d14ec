//! Discrete variables and the registry that assigns their identity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PgmError, Result};

/// A discrete random variable.
///
/// Identity is the integer `id`; two variables with the same id are the same
/// variable. Canonical order everywhere in the crate is ascending id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    id: usize,
    name: String,
    cardinality: usize,
    latent: bool,
    states: Vec<String>,
}

impl Variable {
    /// Create a variable with default state labels `"0".."k-1"`.
    pub fn new(id: usize, cardinality: usize, name: impl Into<String>, latent: bool) -> Self {
        Self {
            id,
            name: name.into(),
            cardinality,
            latent,
            states: default_states(cardinality),
        }
    }

    /// Create a variable with explicit state labels; cardinality is the label count.
    pub fn with_states(
        id: usize,
        name: impl Into<String>,
        states: Vec<String>,
        latent: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            cardinality: states.len(),
            latent,
            states,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn is_latent(&self) -> bool {
        self.latent
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Label of state `s`, falling back to its index.
    pub fn state_label(&self, s: usize) -> String {
        self.states
            .get(s)
            .cloned()
            .unwrap_or_else(|| s.to_string())
    }

    /// Name used by writers: unnamed schema variables render as their id.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

fn default_states(cardinality: usize) -> Vec<String> {
    (0..cardinality).map(|s| s.to_string()).collect()
}

/// Holds the variables of one conversion run.
///
/// Ids are assigned in strictly increasing discovery order, so a variable's id
/// is also its position in the registry.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    variables: Vec<Variable>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Id the next declared variable will receive.
    pub fn next_id(&self) -> usize {
        self.variables.len()
    }

    /// Declare a variable with default state labels.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        cardinality: usize,
        latent: bool,
    ) -> Result<&Variable> {
        let var = Variable::new(self.next_id(), cardinality, name, latent);
        self.push(var)
    }

    /// Declare a variable with explicit state labels.
    pub fn declare_with_states(
        &mut self,
        name: impl Into<String>,
        states: Vec<String>,
        latent: bool,
    ) -> Result<&Variable> {
        let var = Variable::with_states(self.next_id(), name, states, latent);
        self.push(var)
    }

    fn push(&mut self, var: Variable) -> Result<&Variable> {
        if !var.name.is_empty() {
            if self.by_name.contains_key(&var.name) {
                return Err(PgmError::DuplicateVariable(var.name));
            }
            self.by_name.insert(var.name.clone(), var.id);
        }
        let idx = self.variables.len();
        self.variables.push(var);
        Ok(&self.variables[idx])
    }

    /// Get a variable by id.
    pub fn get(&self, id: usize) -> Option<&Variable> {
        self.variables.get(id)
    }

    /// Find a variable by name.
    pub fn find_by_name(&self, name: &str) -> Option<&Variable> {
        self.by_name.get(name).map(|&id| &self.variables[id])
    }

    /// Look up a variable by name, failing on undeclared references.
    pub fn require(&self, name: &str) -> Result<&Variable> {
        self.find_by_name(name)
            .ok_or_else(|| PgmError::UnknownVariable(name.to_string()))
    }

    /// Name a variable that was registered without one (schema cardinality lines).
    pub fn assign_name(&mut self, id: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(PgmError::DuplicateVariable(name));
        }
        let var = self
            .variables
            .get_mut(id)
            .ok_or_else(|| PgmError::UnknownVariable(id.to_string()))?;
        if !var.name.is_empty() {
            return Err(PgmError::DuplicateVariable(var.name.clone()));
        }
        var.name = name.clone();
        self.by_name.insert(name, id);
        Ok(())
    }

    /// Variables in canonical (ascending id) order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }
}

/// Parse a comma-separated schema (header) into a pre-seeded registry.
///
/// A single line lists cardinalities only and leaves names empty. With two or
/// more lines, the first holds names and the second their cardinalities.
pub fn parse_schema(text: &str) -> Result<Registry> {
    let lines: Vec<(usize, Vec<&str>)> = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i + 1, l.split(',').map(str::trim).collect()))
        .collect();

    let mut registry = Registry::new();
    match lines.as_slice() {
        [] => {}
        [(line, cards)] => {
            for c in cards {
                registry.declare("", parse_cardinality(c, *line)?, false)?;
            }
        }
        [(_, names), (line, cards), ..] => {
            if names.len() != cards.len() {
                return Err(PgmError::parse(
                    *line,
                    format!(
                        "schema lists {} names but {} cardinalities",
                        names.len(),
                        cards.len()
                    ),
                ));
            }
            for (name, c) in names.iter().zip(cards) {
                registry.declare(*name, parse_cardinality(c, *line)?, false)?;
            }
        }
    }
    tracing::debug!(variables = registry.len(), "parsed schema");
    Ok(registry)
}

/// Largest state count accepted from text input.
pub const MAX_CARDINALITY: usize = 1 << 16;

pub(crate) fn parse_cardinality(token: &str, line: usize) -> Result<usize> {
    match token.parse::<usize>() {
        Ok(k) if k > 0 && k <= MAX_CARDINALITY => Ok(k),
        _ => Err(PgmError::parse(
            line,
            format!("invalid cardinality '{}'", token),
        )),
    }
}
