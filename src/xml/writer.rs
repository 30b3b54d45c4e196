//! `.slnx` writer
//!
//! The model is rebuilt as a `xot` tree and serialized through xot's pretty
//! printer: two-space indentation, content with text written verbatim.
//! Empty elements close as ` />`, keyed elements list their key attribute
//! first. No XML declaration and no trailing newline.

use xot::output::{NoopNormalizer, Output, TokenSerializeParameters};
use xot::{NameId, NamespaceId, Xot};

use super::model::{is_namespace_declaration, Node, SolutionDocument};
use crate::error::{Error, Result};

/// Namespace prefixes in scope, innermost last.
type Scope = Vec<(String, NamespaceId)>;

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::Xml {
        message: e.to_string(),
    }
}

fn resolve_name(xot: &mut Xot, scope: &Scope, qualified: &str, attribute: bool) -> Result<NameId> {
    let (prefix, local) = match qualified.split_once(':') {
        Some(split) => split,
        // unprefixed attributes never take the default namespace
        None if attribute => return Ok(xot.add_name(qualified)),
        None => ("", qualified),
    };
    let namespace = if prefix == "xml" {
        Some(xot.xml_namespace())
    } else {
        scope
            .iter()
            .rev()
            .find(|(declared, _)| declared == prefix)
            .map(|(_, namespace)| *namespace)
    };
    match namespace {
        Some(namespace) => Ok(xot.add_name_ns(local, namespace)),
        None if prefix.is_empty() => Ok(xot.add_name(local)),
        None => Err(xml_error(format!(
            "undeclared namespace prefix '{}' in '{}'",
            prefix, qualified
        ))),
    }
}

fn build_element(
    xot: &mut Xot,
    scope: &mut Scope,
    name: &str,
    attributes: &[(&str, &str)],
    children: &[Node],
) -> Result<xot::Node> {
    let mark = scope.len();
    let (declarations, attributes): (Vec<_>, Vec<_>) = attributes
        .iter()
        .partition(|(n, _)| is_namespace_declaration(n));
    for (declaration, uri) in declarations {
        let prefix = declaration.strip_prefix("xmlns:").unwrap_or("");
        let namespace = xot.add_namespace(uri);
        scope.push((prefix.to_string(), namespace));
    }

    let element_name = resolve_name(xot, scope, name, false)?;
    let element = xot.new_element(element_name);
    for (prefix, namespace) in &scope[mark..] {
        let prefix = xot.add_prefix(prefix);
        xot.namespaces_mut(element).insert(prefix, *namespace);
    }
    for (attribute, value) in attributes {
        let attribute = resolve_name(xot, scope, attribute, true)?;
        xot.attributes_mut(element).insert(attribute, value.to_string());
    }
    for child in children {
        build_node(xot, scope, element, child)?;
    }

    scope.truncate(mark);
    Ok(element)
}

fn as_pairs(attributes: &[(String, String)]) -> Vec<(&str, &str)> {
    attributes
        .iter()
        .map(|(n, v)| (n.as_str(), v.as_str()))
        .collect()
}

fn build_node(xot: &mut Xot, scope: &mut Scope, parent: xot::Node, node: &Node) -> Result<()> {
    let child = match node {
        Node::Text(text) => xot.new_text(text),
        Node::Comment(comment) => xot.new_comment(comment),
        Node::ProcessingInstruction { target, data } => {
            let target = resolve_name(xot, scope, target, true)?;
            xot.new_processing_instruction(target, data.as_deref())
        }
        Node::Configurations(e) | Node::Unknown(e) => {
            build_element(xot, scope, &e.name, &as_pairs(&e.attributes), &e.children)?
        }
        keyed => {
            let (Some(kind), Some(e)) = (keyed.key_kind(), keyed.as_keyed()) else {
                return Ok(());
            };
            let mut attributes = Vec::with_capacity(e.attributes.len() + 1);
            // declarations stay ahead of the key attribute
            attributes.extend(
                e.attributes
                    .iter()
                    .filter(|(n, _)| is_namespace_declaration(n))
                    .map(|(n, v)| (n.as_str(), v.as_str())),
            );
            if !e.key.trim().is_empty() {
                attributes.push((kind.key_attribute(), e.key.as_str()));
            }
            attributes.extend(
                e.attributes
                    .iter()
                    .filter(|(n, _)| !is_namespace_declaration(n))
                    .map(|(n, v)| (n.as_str(), v.as_str())),
            );
            build_element(xot, scope, kind.element_name(), &attributes, &e.children)?
        }
    };
    xot.append(parent, child).map_err(xml_error)
}

/// Serialize the document to `.slnx` text.
pub fn write(doc: &SolutionDocument) -> Result<String> {
    let mut xot = Xot::new();
    let mut scope = Scope::new();
    let root = build_element(
        &mut xot,
        &mut scope,
        "Solution",
        &as_pairs(&doc.root.attributes),
        &doc.root.children,
    )?;
    xot.new_document_with_element(root).map_err(xml_error)?;
    xot.create_missing_prefixes(root).map_err(xml_error)?;

    let mut out = String::new();
    for (_, output, token) in
        xot.pretty_tokens(root, TokenSerializeParameters::default(), &[], NoopNormalizer)
    {
        out.push_str(&"  ".repeat(token.indentation));
        if token.space {
            out.push(' ');
        }
        if matches!(output, Output::StartTagClose) && token.text == "/>" {
            out.push_str(" />");
        } else {
            out.push_str(&token.text);
        }
        if token.newline {
            out.push('\n');
        }
    }
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}
