//! XMLBIF reader.
//!
//! `quick_xml` events are folded into a small element tree holding tag names,
//! children and character data (text and CDATA, entities resolved).
//! Declarations, processing instructions, comments and `DOCTYPE` are skipped.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};

use crate::bif::{BayesNet, TableLayout};
use crate::error::{PgmError, Result};
use crate::model::DEFAULT_NETWORK_NAME;

/// A parsed XML element.
#[derive(Debug, Clone, Default, PartialEq)]
struct Element {
    name: String,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// First child with the given tag name (case-insensitive).
    fn child(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    /// Trimmed text of the first child named `name`.
    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }
}

fn tag_name(raw: &[u8]) -> Result<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| PgmError::xml(format!("tag name is not UTF-8: {}", e)))
}

/// Parse an XML document into its root element.
fn parse_document(src: &str) -> Result<Element> {
    let mut reader = Reader::from_str(src);
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            PgmError::xml(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(PgmError::xml("content after the root element"));
                }
                open.push(Element {
                    name: tag_name(start.name().as_ref())?,
                    ..Element::default()
                });
            }
            Event::Empty(start) => {
                let element = Element {
                    name: tag_name(start.name().as_ref())?,
                    ..Element::default()
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => return Err(PgmError::xml("content after the root element")),
                }
            }
            Event::End(_) => {
                // end names are checked by the reader
                let element = open
                    .pop()
                    .ok_or_else(|| PgmError::xml("unbalanced closing tag"))?;
                match open.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let decoded = text
                    .unescape()
                    .map_err(|e| PgmError::xml(format!("bad character data: {}", e)))?;
                match open.last_mut() {
                    Some(element) => element.text.push_str(&decoded),
                    None if decoded.trim().is_empty() => {}
                    None => return Err(PgmError::xml("text outside the root element")),
                }
            }
            Event::CData(data) => {
                let raw = std::str::from_utf8(&data)
                    .map_err(|e| PgmError::xml(format!("CDATA is not UTF-8: {}", e)))?;
                match open.last_mut() {
                    Some(element) => element.text.push_str(raw),
                    None => return Err(PgmError::xml("CDATA outside the root element")),
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(PgmError::xml(format!("element <{}> is not closed", unclosed.name)));
    }
    root.ok_or_else(|| PgmError::xml("document has no root element"))
}

/// Parse an XMLBIF document into a network.
///
/// Variables get ids in document order. Each `DEFINITION` table is laid out
/// (given..., for...) with the `FOR` variables fastest.
pub fn parse_xmlbif(src: &str) -> Result<BayesNet> {
    let root = parse_document(src)?;
    let network = if root.name.eq_ignore_ascii_case("NETWORK") {
        &root
    } else {
        root.child("NETWORK")
            .ok_or_else(|| PgmError::xml("missing <NETWORK> element"))?
    };

    let name = network
        .child_text("NAME")
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_NETWORK_NAME);
    let mut net = BayesNet::new(name);

    for var in network.children_named("VARIABLE") {
        let var_name = var
            .child_text("NAME")
            .ok_or_else(|| PgmError::xml("<VARIABLE> without <NAME>"))?;
        let states: Vec<String> = var
            .children_named("OUTCOME")
            .map(|o| o.text.trim().to_string())
            .collect();
        if states.is_empty() {
            return Err(PgmError::xml(format!("variable {} has no outcomes", var_name)));
        }
        net.declare_variable(var_name, states)?;
    }

    // older documents use PROBABILITY instead of DEFINITION
    let definitions = network.children.iter().filter(|c| {
        c.name.eq_ignore_ascii_case("DEFINITION") || c.name.eq_ignore_ascii_case("PROBABILITY")
    });
    for def in definitions {
        let children: Vec<&str> = def.children_named("FOR").map(|e| e.text.trim()).collect();
        let parents: Vec<&str> = def.children_named("GIVEN").map(|e| e.text.trim()).collect();
        if children.is_empty() {
            return Err(PgmError::xml("<DEFINITION> without <FOR>"));
        }
        let table = def
            .child_text("TABLE")
            .ok_or_else(|| PgmError::xml(format!("definition of {} has no <TABLE>", children[0])))?;
        let values = table
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| PgmError::xml(format!("invalid table value '{}'", t)))
            })
            .collect::<Result<Vec<f64>>>()?;
        net.add_cpt(&children, &parents, values, TableLayout::ParentsFirst)?;
        debug!(children = ?children, parents = ?parents, "parsed definition");
    }

    info!(
        name = net.name(),
        variables = net.registry().len(),
        cpts = net.num_cpts(),
        "parsed XMLBIF network"
    );
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelView;

    const DOC: &str = r#"<?xml version="1.0"?>
<!DOCTYPE BIF [
  <!ELEMENT BIF ( NETWORK )*>
]>
<BIF VERSION="0.3">
<NETWORK>
  <NAME>dogs &amp; cats</NAME>
  <!-- two nodes -->
  <VARIABLE TYPE="nature">
    <NAME>x</NAME>
    <OUTCOME>lo</OUTCOME>
    <OUTCOME>hi</OUTCOME>
  </VARIABLE>
  <VARIABLE TYPE="nature">
    <NAME>y</NAME>
    <OUTCOME>a</OUTCOME>
    <OUTCOME>b</OUTCOME>
    <OUTCOME>c</OUTCOME>
  </VARIABLE>
  <DEFINITION>
    <FOR>x</FOR>
    <GIVEN>y</GIVEN>
    <TABLE>0.1 0.9 0.2 0.8 0.3 0.7</TABLE>
  </DEFINITION>
  <DEFINITION>
    <FOR>y</FOR>
    <TABLE> 0.2 0.3 0.5 </TABLE>
  </DEFINITION>
</NETWORK>
</BIF>
"#;

    #[test]
    fn test_parse_xmlbif() {
        let net = parse_xmlbif(DOC).unwrap();
        assert_eq!(net.name(), "dogs & cats");
        assert_eq!(net.registry().len(), 2);
        assert_eq!(net.registry().variables()[1].states()[2], "c");

        let families = net.families();
        assert_eq!(families.len(), 2);
        // canonical (x, y): y fastest
        assert_eq!(
            families[0].potential.flat_values(),
            vec![0.1, 0.2, 0.3, 0.9, 0.8, 0.7]
        );
        assert_eq!(families[0].conditionals()[2].values, vec![0.3, 0.7]);
    }

    #[test]
    fn test_entities_and_cdata() {
        let root = parse_document("<A>a &lt;b&gt; &#65;&#x42;<![CDATA[ <c> ]]></A>").unwrap();
        assert_eq!(root.text, "a <b> AB <c> ");
        assert!(parse_document("<A>&bogus;</A>").is_err());
    }

    #[test]
    fn test_cdata_table() {
        let doc = "<BIF><NETWORK><VARIABLE><NAME>x</NAME><OUTCOME>0</OUTCOME><OUTCOME>1</OUTCOME></VARIABLE>\
                   <DEFINITION><FOR>x</FOR><TABLE><![CDATA[0.5 0.5]]></TABLE></DEFINITION></NETWORK></BIF>";
        let net = parse_xmlbif(doc).unwrap();
        assert_eq!(net.families()[0].potential.flat_values(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_unclosed_root() {
        assert!(matches!(
            parse_document("<A><B></B>"),
            Err(PgmError::Xml { .. })
        ));
    }

    #[test]
    fn test_mismatched_close_tag() {
        assert!(matches!(
            parse_document("<A><B></A></B>"),
            Err(PgmError::Xml { .. })
        ));
    }

    #[test]
    fn test_table_length_checked() {
        let doc = "<NETWORK><VARIABLE><NAME>x</NAME><OUTCOME>0</OUTCOME><OUTCOME>1</OUTCOME></VARIABLE>\
                   <DEFINITION><FOR>x</FOR><TABLE>1</TABLE></DEFINITION></NETWORK>";
        assert!(matches!(
            parse_xmlbif(doc),
            Err(PgmError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }
}
