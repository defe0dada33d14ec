//! Bayesian networks in standard BIF.
//!
//! Unlike the latent-tree dialect, probability blocks may list several children
//! and several parents, and tables may be given as rows:
//!
//! ```text
//! probability ( c | p1, p2 ) {
//!   (a, a) 0.2, 0.8;
//!   (a, b) 0.5, 0.5;
//!   ...
//! }
//! ```
//!
//! Rows are addressed (parents..., children...) with the children fastest; a
//! `table` body is addressed in (children..., parents...) declaration order.

use tracing::{debug, info};

use crate::error::{PgmError, Result};
use crate::factor::Factor;
use crate::index::{joint_size, row_major_strides};
use crate::ltm::{read_values, read_variable_block, VariableBlock};
use crate::model::{Family, ModelView, DEFAULT_NETWORK_NAME};
use crate::token::{parse_value, Token, Tokens};
use crate::variable::{Registry, Variable};

/// How a flat table passed to [`BayesNet::add_cpt`] is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// (parents..., children...), children fastest: BIF rows, XMLBIF tables
    ParentsFirst,
    /// (children..., parents...), last parent fastest: BIF `table` bodies
    ChildrenFirst,
}

#[derive(Debug, Clone)]
struct Cpt {
    /// Parent ids in declared order
    parents: Vec<usize>,
    factor: Factor,
}

/// A Bayesian network: declared variables plus one potential per probability block.
#[derive(Debug, Clone)]
pub struct BayesNet {
    name: String,
    registry: Registry,
    cpts: Vec<Cpt>,
}

impl BayesNet {
    /// Create an empty network.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: Registry::new(),
            cpts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of conditional tables.
    pub fn num_cpts(&self) -> usize {
        self.cpts.len()
    }

    /// Potentials in family order.
    pub fn factors(&self) -> impl Iterator<Item = &Factor> {
        self.cpts.iter().map(|c| &c.factor)
    }

    /// Declare a variable; ids follow declaration order.
    pub fn declare_variable(&mut self, name: &str, states: Vec<String>) -> Result<&Variable> {
        self.registry.declare_with_states(name, states, false)
    }

    /// Add a conditional table for `children` given `parents`.
    pub fn add_cpt(
        &mut self,
        children: &[&str],
        parents: &[&str],
        values: Vec<f64>,
        layout: TableLayout,
    ) -> Result<()> {
        let children = self.lookup(children)?;
        let parents = self.lookup(parents)?;
        let declared: Vec<&Variable> = match layout {
            TableLayout::ParentsFirst => parents.iter().chain(&children).copied().collect(),
            TableLayout::ChildrenFirst => children.iter().chain(&parents).copied().collect(),
        };
        let factor = Factor::from_declared(&declared, values)?;
        let parents = parents.iter().map(|v| v.id()).collect();
        self.cpts.push(Cpt { parents, factor });
        // families are ordered by child; insertion order breaks ties
        self.cpts.sort_by_key(|c| {
            c.factor
                .ids()
                .into_iter()
                .find(|id| !c.parents.contains(id))
        });
        Ok(())
    }

    fn lookup(&self, names: &[&str]) -> Result<Vec<&Variable>> {
        names.iter().map(|n| self.registry.require(n)).collect()
    }
}

impl ModelView for BayesNet {
    fn name(&self) -> &str {
        &self.name
    }

    fn variables(&self) -> Vec<&Variable> {
        self.registry.iter().collect()
    }

    fn families(&self) -> Vec<Family<'_>> {
        self.cpts
            .iter()
            .map(|c| {
                let scope = c.factor.variables();
                let head = scope
                    .iter()
                    .filter(|v| !c.parents.contains(&v.id()))
                    .collect();
                let tail = c
                    .parents
                    .iter()
                    .filter_map(|id| scope.iter().find(|v| v.id() == *id))
                    .collect();
                Family {
                    head,
                    tail,
                    potential: &c.factor,
                }
            })
            .collect()
    }
}

/// Parse a standard BIF network.
pub fn parse_bif(src: &str) -> Result<BayesNet> {
    let mut tokens = Tokens::new(src);
    let mut net = BayesNet::new(DEFAULT_NETWORK_NAME);

    while let Some(tok) = tokens.skip_to(&["network", "variable", "probability"]) {
        match tok.text.as_str() {
            "network" => {
                net.name = tokens.expect_name("network name")?.text;
                tokens.expect("{")?;
                tokens.skip_block()?;
            }
            "variable" => {
                let VariableBlock {
                    name,
                    cardinality,
                    labels,
                } = read_variable_block(&mut tokens)?;
                let states = if labels.is_empty() {
                    (0..cardinality).map(|s| s.to_string()).collect()
                } else if labels.len() == cardinality {
                    labels
                } else {
                    return Err(PgmError::StateCountMismatch {
                        name: name.text,
                        declared: cardinality,
                        labels: labels.len(),
                    });
                };
                net.declare_variable(&name.text, states)?;
            }
            _ => parse_probability(&mut tokens, &mut net)?,
        }
    }

    info!(
        name = %net.name,
        variables = net.registry.len(),
        cpts = net.cpts.len(),
        "parsed BIF network"
    );
    Ok(net)
}

fn parse_probability(tokens: &mut Tokens, net: &mut BayesNet) -> Result<()> {
    tokens.expect("(")?;
    let mut children: Vec<Token> = Vec::new();
    let mut parents: Vec<Token> = Vec::new();
    let mut in_parents = false;
    loop {
        let name = tokens.expect_name("variable name")?;
        if in_parents {
            parents.push(name);
        } else {
            children.push(name);
        }
        let sep = tokens.expect_any("')'")?;
        if sep.is(")") {
            break;
        }
        if sep.is("|") && !in_parents {
            in_parents = true;
        } else if !sep.is(",") {
            return Err(PgmError::parse(
                sep.line,
                format!("unexpected '{}' in probability header", sep.text),
            ));
        }
    }

    let child_names: Vec<&str> = children.iter().map(|t| t.text.as_str()).collect();
    let parent_names: Vec<&str> = parents.iter().map(|t| t.text.as_str()).collect();
    let line = tokens.line();
    tokens.expect("{")?;

    let mut table: Option<Vec<f64>> = None;
    let mut rows: Vec<(Vec<Token>, Vec<f64>, usize)> = Vec::new();
    loop {
        let tok = tokens.expect_any("'}'")?;
        if tok.is("}") {
            break;
        } else if tok.is("table") {
            table = Some(read_values(tokens)?);
            break;
        } else if tok.is("(") {
            let labels = read_row_labels(tokens)?;
            let values = read_row_values(tokens)?;
            rows.push((labels, values, tok.line));
        } else if !tok.is(";") {
            return Err(PgmError::parse(
                tok.line,
                format!("unsupported probability entry '{}'", tok.text),
            ));
        }
    }

    let values = match (table, rows.is_empty()) {
        (Some(_), false) => {
            return Err(PgmError::parse(
                line,
                "probability block mixes a table with rows",
            ))
        }
        (Some(values), true) => {
            net.add_cpt(&child_names, &parent_names, values, TableLayout::ChildrenFirst)
                .map_err(|e| table_error(e, line))?;
            debug!(children = ?child_names, parents = ?parent_names, "parsed table");
            return Ok(());
        }
        (None, true) => {
            return Err(PgmError::parse(line, "probability block has no values"));
        }
        (None, false) => assemble_rows(net, &child_names, &parent_names, rows, line)?,
    };
    net.add_cpt(&child_names, &parent_names, values, TableLayout::ParentsFirst)
        .map_err(|e| table_error(e, line))?;
    debug!(children = ?child_names, parents = ?parent_names, "parsed rows");
    Ok(())
}

fn table_error(e: PgmError, line: usize) -> PgmError {
    match e {
        PgmError::DimensionMismatch { expected, got } => PgmError::parse(
            line,
            format!("table has {} values, expected {}", got, expected),
        ),
        other => other,
    }
}

/// Lay rows out as one (parents..., children...) array.
fn assemble_rows(
    net: &BayesNet,
    children: &[&str],
    parents: &[&str],
    rows: Vec<(Vec<Token>, Vec<f64>, usize)>,
    line: usize,
) -> Result<Vec<f64>> {
    let parent_vars = net.lookup(parents)?;
    let child_vars = net.lookup(children)?;
    let too_large = || PgmError::parse(line, "probability table is too large");
    let child_size = joint_size(child_vars.iter().map(|v| v.cardinality())).ok_or_else(too_large)?;
    let n_rows = joint_size(parent_vars.iter().map(|v| v.cardinality())).ok_or_else(too_large)?;
    if rows.len() < n_rows {
        return Err(PgmError::parse(
            line,
            format!("missing rows: {} of {} given", rows.len(), n_rows),
        ));
    }
    let strides = row_major_strides(parent_vars.iter().map(|v| v.cardinality()));

    let mut values = vec![0.0; n_rows * child_size];
    let mut filled = vec![false; n_rows];
    for (labels, row, row_line) in rows {
        if labels.len() != parent_vars.len() {
            return Err(PgmError::parse(
                row_line,
                format!(
                    "row lists {} parent states, expected {}",
                    labels.len(),
                    parent_vars.len()
                ),
            ));
        }
        if row.len() != child_size {
            return Err(PgmError::parse(
                row_line,
                format!("row has {} values, expected {}", row.len(), child_size),
            ));
        }
        let mut r = 0;
        for ((label, var), stride) in labels.iter().zip(&parent_vars).zip(&strides) {
            r += state_of(var, label)? * stride;
        }
        if filled[r] {
            return Err(PgmError::parse(row_line, "duplicate row"));
        }
        filled[r] = true;
        values[r * child_size..(r + 1) * child_size].copy_from_slice(&row);
    }
    if let Some(missing) = filled.iter().position(|f| !f) {
        return Err(PgmError::parse(
            line,
            format!("missing row {} of {}", missing, n_rows),
        ));
    }
    Ok(values)
}

fn state_of(var: &Variable, label: &Token) -> Result<usize> {
    let state = var.states().iter().position(|s| *s == label.text);
    state
        .or_else(|| {
            label
                .text
                .parse::<usize>()
                .ok()
                .filter(|&s| s < var.cardinality())
        })
        .ok_or_else(|| {
            PgmError::parse(
                label.line,
                format!("unknown state '{}' of {}", label.text, var.display_name()),
            )
        })
}

/// Labels of a row; the opening `(` was already consumed.
fn read_row_labels(tokens: &mut Tokens) -> Result<Vec<Token>> {
    let mut labels = Vec::new();
    loop {
        let tok = tokens.expect_any("')'")?;
        if tok.is(")") {
            return Ok(labels);
        }
        if !tok.is(",") {
            labels.push(tok);
        }
    }
}

/// Values of a row up to its terminating `;`.
fn read_row_values(tokens: &mut Tokens) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    loop {
        let tok = tokens.expect_any("';'")?;
        if tok.is(";") {
            return Ok(values);
        }
        if !tok.is(",") {
            values.push(parse_value(&tok)?);
        }
    }
}
