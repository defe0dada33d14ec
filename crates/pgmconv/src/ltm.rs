//! Reader for the latent-tree BIF dialect.
//!
//! The dialect has two block kinds:
//!
//! ```text
//! variable "x" { type discrete [ 2 ] { s0, s1 }; }
//! probability ( "y" | "x" ) { table 0.1 0.9 0.2 0.8 ; }
//! ```
//!
//! A probability block has one child and at most one parent. Its table is
//! listed in (child, parent) order with the last listed variable fastest, and
//! is re-permuted into canonical order when that differs.

use tracing::{debug, info, warn};

use crate::error::{PgmError, Result};
use crate::factor::Factor;
use crate::token::{parse_value, Token, Tokens};
use crate::variable::{parse_cardinality, Registry, Variable};

/// Name substring that marks a hidden variable in this dialect.
pub const LATENT_MARKER: &str = "variable";

/// Parse a latent-tree model, extending `registry` with newly declared variables.
///
/// Variables already in the registry (from a schema) keep their cardinality;
/// their declarations are ignored.
pub fn parse_ltm(src: &str, registry: &mut Registry) -> Result<Vec<Factor>> {
    LtmParser::new(registry).parse(src)
}

/// Parser state for one latent-tree input.
pub struct LtmParser<'r> {
    registry: &'r mut Registry,
    latent_marker: String,
}

impl<'r> LtmParser<'r> {
    pub fn new(registry: &'r mut Registry) -> Self {
        Self {
            registry,
            latent_marker: LATENT_MARKER.to_string(),
        }
    }

    /// Use a different hidden-variable naming convention.
    pub fn with_latent_marker(mut self, marker: impl Into<String>) -> Self {
        self.latent_marker = marker.into();
        self
    }

    /// Parse `src` into an unordered list of factors, one per probability block.
    pub fn parse(mut self, src: &str) -> Result<Vec<Factor>> {
        let mut tokens = Tokens::new(src);
        let mut factors = Vec::new();
        let seeded = self.registry.len();

        while let Some(tok) = tokens.skip_to(&["variable", "probability"]) {
            if tok.text == "variable" {
                self.parse_variable(&mut tokens)?;
            } else {
                factors.push(self.parse_probability(&mut tokens)?);
            }
        }

        info!(
            variables = self.registry.len(),
            declared = self.registry.len() - seeded,
            factors = factors.len(),
            "parsed latent-tree model"
        );
        Ok(factors)
    }

    fn parse_variable(&mut self, tokens: &mut Tokens) -> Result<()> {
        let VariableBlock {
            name,
            cardinality,
            labels,
        } = read_variable_block(tokens)?;

        if self.registry.find_by_name(&name.text).is_some() {
            debug!(name = %name.text, "variable already known, declaration ignored");
            return Ok(());
        }
        if !labels.is_empty() && labels.len() != cardinality {
            return Err(PgmError::StateCountMismatch {
                name: name.text,
                declared: cardinality,
                labels: labels.len(),
            });
        }

        let latent = name.text.contains(self.latent_marker.as_str());
        let var = if labels.is_empty() {
            self.registry.declare(name.text, cardinality, latent)?
        } else {
            self.registry.declare_with_states(name.text, labels, latent)?
        };
        debug!(id = var.id(), name = var.name(), cardinality, latent, "declared variable");
        Ok(())
    }

    fn parse_probability(&mut self, tokens: &mut Tokens) -> Result<Factor> {
        tokens.expect("(")?;
        let child = tokens.expect_name("child variable")?;
        let mut parents: Vec<Token> = Vec::new();

        let tok = tokens.expect_any("')' or '|'")?;
        if tok.is("|") {
            loop {
                parents.push(tokens.expect_name("parent variable")?);
                let sep = tokens.expect_any("')'")?;
                if sep.is(")") {
                    break;
                }
                if !sep.is(",") {
                    return Err(PgmError::parse(
                        sep.line,
                        format!("unexpected '{}' in parent list", sep.text),
                    ));
                }
            }
        } else if !tok.is(")") {
            return Err(PgmError::parse(
                tok.line,
                format!(
                    "probability block for {} declares more than one child",
                    child.text
                ),
            ));
        }
        if parents.len() > 1 {
            return Err(PgmError::TooManyParents {
                child: child.text,
                parents: parents.len(),
            });
        }

        let mut declared: Vec<Variable> = vec![self.registry.require(&child.text)?.clone()];
        for p in &parents {
            declared.push(self.registry.require(&p.text)?.clone());
        }

        tokens.expect("{")?;
        loop {
            let tok = tokens.expect_any("'table'")?;
            if tok.is("table") {
                break;
            }
            if tok.is("}") {
                return Err(PgmError::parse(
                    tok.line,
                    format!("probability block for {} has no table", child.text),
                ));
            }
            warn!(token = %tok.text, line = tok.line, "skipping unrecognized token");
        }

        let values = read_values(tokens)?;
        let refs: Vec<&Variable> = declared.iter().collect();
        let factor = Factor::from_declared(&refs, values).map_err(|e| match e {
            PgmError::DimensionMismatch { expected, got } => PgmError::parse(
                tokens.line(),
                format!(
                    "table for {} has {} values, expected {}",
                    child.text, got, expected
                ),
            ),
            other => other,
        })?;
        debug!(child = %child.text, scope = ?factor.ids(), "parsed probability block");
        Ok(factor)
    }
}

/// Contents of a `variable <name> { type discrete [ k ] { ... }; }` block.
pub(crate) struct VariableBlock {
    pub(crate) name: Token,
    pub(crate) cardinality: usize,
    pub(crate) labels: Vec<String>,
}

/// Read a variable block; the `variable` keyword was already consumed.
///
/// Tokens between the opening brace and `discrete` are skipped, as is
/// everything after the state list up to the closing brace.
pub(crate) fn read_variable_block(tokens: &mut Tokens) -> Result<VariableBlock> {
    let name = tokens.expect_name("variable name")?;
    tokens.expect("{")?;
    loop {
        let tok = tokens.expect_any("'discrete'")?;
        if tok.is("discrete") {
            break;
        }
        if tok.is("}") {
            return Err(PgmError::parse(
                tok.line,
                format!("variable {} has no discrete type", name.text),
            ));
        }
    }

    tokens.expect("[")?;
    let card_tok = tokens.expect_any("cardinality")?;
    let cardinality = parse_cardinality(&card_tok.text, card_tok.line)?;
    tokens.expect("]")?;
    let labels = read_labels(tokens)?;
    tokens.skip_block()?;
    Ok(VariableBlock {
        name,
        cardinality,
        labels,
    })
}

/// Read an optional `{ s0, s1, ... }` state list after the cardinality.
pub(crate) fn read_labels(tokens: &mut Tokens) -> Result<Vec<String>> {
    let mut labels = Vec::new();
    if !tokens.peek_is("{") {
        return Ok(labels);
    }
    tokens.expect("{")?;
    loop {
        let tok = tokens.expect_any("'}'")?;
        if tok.is("}") {
            break;
        }
        if !tok.is(",") {
            labels.push(tok.text);
        }
    }
    Ok(labels)
}

/// Read table values up to the closing `}`; separators are ignored.
pub(crate) fn read_values(tokens: &mut Tokens) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    loop {
        let tok = tokens.expect_any("'}'")?;
        if tok.is("}") {
            return Ok(values);
        }
        if tok.is(";") || tok.is(",") {
            continue;
        }
        values.push(parse_value(&tok)?);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"
network "ltm" {
}
variable "variable1" {
  type discrete[2] {"s0" "s1"};
}
variable "a" {
  type discrete[3] {"s0" "s1" "s2"};
}
probability ( "variable1" ) {
  table 0.4 0.6 ;
}
probability ( "a" | "variable1" ) {
  table 0.1 0.2 0.3 0.4 0.6 0.4 ;
}
"#;

    #[test]
    fn test_parse_model() {
        let mut reg = Registry::new();
        let factors = parse_ltm(MODEL, &mut reg).unwrap();

        assert_eq!(reg.len(), 2);
        assert!(reg.find_by_name("variable1").unwrap().is_latent());
        assert!(!reg.find_by_name("a").unwrap().is_latent());
        assert_eq!(reg.find_by_name("a").unwrap().states()[2], "s2");
        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0].flat_values(), vec![0.4, 0.6]);
    }

    #[test]
    fn test_child_declared_after_parent_keeps_canonical_layout() {
        // variable1 (id 0) is the parent; declared order (a, variable1) differs from
        // canonical (variable1, a), so the parent-fastest table is transposed.
        let mut reg = Registry::new();
        let factors = parse_ltm(MODEL, &mut reg).unwrap();
        let f = &factors[1];
        assert_eq!(f.ids(), vec![0, 1]);
        assert_eq!(f.flat_values(), vec![0.1, 0.3, 0.6, 0.2, 0.4, 0.4]);
    }

    #[test]
    fn test_child_first_table_is_transposed() {
        let src = "variable p { type discrete [ 2 ] { a, b }; }
                   variable c { type discrete [ 2 ] { a, b }; }
                   probability ( p ) { table 0.5 0.5; }
                   probability ( c | p ) { table 1 2 3 4; }";
        let mut reg = Registry::new();
        let factors = parse_ltm(src, &mut reg).unwrap();
        // declared (c, p), canonical (p, c)
        assert_eq!(factors[1].flat_values(), vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_canonical_declared_order_is_untouched() {
        let src = "variable p { type discrete [ 2 ] { a, b }; }
                   variable c { type discrete [ 2 ] { a, b }; }
                   probability ( p | c ) { table 1 2 3 4; }";
        let mut reg = Registry::new();
        let factors = parse_ltm(src, &mut reg).unwrap();
        assert_eq!(factors[0].flat_values(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_unknown_tokens_before_table_are_skipped() {
        let src = r#"variable "a" { type discrete [ 2 ] ; }
                     probability ( "a" ) { junk "x" 7 table 0.5 0.5 ; }"#;
        let mut reg = Registry::new();
        let factors = parse_ltm(src, &mut reg).unwrap();
        assert_eq!(factors[0].flat_values(), vec![0.5, 0.5]);

        let src = r#"variable "a" { type discrete [ 2 ] ; }
                     probability ( "a" ) { }"#;
        let mut reg = Registry::new();
        assert!(matches!(
            parse_ltm(src, &mut reg),
            Err(PgmError::Parse { .. })
        ));
    }

    #[test]
    fn test_oversized_cardinality_rejected() {
        let src = r#"variable "a" { type discrete [ 4294967296 ] ; }"#;
        let mut reg = Registry::new();
        assert!(matches!(
            parse_ltm(src, &mut reg),
            Err(PgmError::Parse { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_seeded_registry_is_authoritative() {
        let mut reg = Registry::new();
        reg.declare("a", 3, false).unwrap();
        let src = "variable a { type discrete [ 5 ] ; }
                   variable b { type discrete [ 2 ] ; }
                   probability ( b | a ) { table 1 1 1 1 1 1; }";
        let factors = parse_ltm(src, &mut reg).unwrap();
        assert_eq!(reg.find_by_name("a").unwrap().cardinality(), 3);
        assert_eq!(reg.find_by_name("b").unwrap().id(), 1);
        assert_eq!(factors[0].len(), 6);
    }

    #[test]
    fn test_rejects_two_parents() {
        let src = "variable a { type discrete [ 2 ] ; }
                   variable b { type discrete [ 2 ] ; }
                   variable c { type discrete [ 2 ] ; }
                   probability ( c | a, b ) { table 1 1 1 1 1 1 1 1; }";
        let mut reg = Registry::new();
        assert!(matches!(
            parse_ltm(src, &mut reg),
            Err(PgmError::TooManyParents { parents: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_undeclared_reference() {
        let src = "variable a { type discrete [ 2 ] ; }
                   probability ( a | ghost ) { table 1 1 1 1; }";
        let mut reg = Registry::new();
        assert!(matches!(
            parse_ltm(src, &mut reg),
            Err(PgmError::UnknownVariable(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_truncated_input_aborts() {
        let src = "variable a { type discrete [ 2 ] ; }
                   probability ( a ) { table 0.5 ";
        let mut reg = Registry::new();
        assert!(matches!(
            parse_ltm(src, &mut reg),
            Err(PgmError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_wrong_table_length_is_parse_error() {
        let src = "variable a { type discrete [ 2 ] ; }
                   probability ( a ) { table 0.5 0.25 0.25 ; }";
        let mut reg = Registry::new();
        assert!(matches!(
            parse_ltm(src, &mut reg),
            Err(PgmError::Parse { .. })
        ));
    }

    #[test]
    fn test_label_count_must_match() {
        let src = "variable a { type discrete [ 3 ] { x, y }; }";
        let mut reg = Registry::new();
        assert!(matches!(
            parse_ltm(src, &mut reg),
            Err(PgmError::StateCountMismatch { .. })
        ));
    }

    #[test]
    fn test_custom_latent_marker() {
        let src = "variable H1 { type discrete [ 2 ] ; }";
        let mut reg = Registry::new();
        LtmParser::new(&mut reg)
            .with_latent_marker("H")
            .parse(src)
            .unwrap();
        assert!(reg.get(0).unwrap().is_latent());
    }
}
