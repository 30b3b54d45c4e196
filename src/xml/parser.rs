//! `.slnx` parser built on `xot`
//!
//! The XML tree is converted into [`Node`]s by qualified element name.
//! Namespace declarations become `xmlns` / `xmlns:*` attributes ahead of
//! the element's own attributes. Whitespace-only text is layout and is
//! dropped, except in text-only or mixed content and under
//! `xml:space="preserve"`; the writer regenerates indentation.

use xot::{NameId, Value, Xot};

use super::model::{Element, Node, SolutionDocument, SolutionElement};
use crate::error::{Error, Result};

fn xml_error(path: &str, e: impl std::fmt::Display) -> Error {
    Error::Xml {
        message: format!("{}: {}", path, e),
    }
}

fn qualified_name(xot: &Xot, path: &str, node: xot::Node, name: NameId) -> Result<String> {
    xot.full_name(node, name).map_err(|e| xml_error(path, e))
}

/// Text content is kept verbatim: the element holds only text, or text
/// that is not all whitespace sits among its children.
fn has_text_content(xot: &Xot, node: xot::Node) -> bool {
    xot.children(node)
        .all(|child| matches!(xot.value(child), Value::Text(_)))
        || xot.children(node).any(
            |child| matches!(xot.value(child), Value::Text(text) if !text.get().trim().is_empty()),
        )
}

fn convert_element(
    xot: &Xot,
    path: &str,
    node: xot::Node,
    name: NameId,
    preserve: bool,
) -> Result<Element> {
    let preserve = match xot
        .attributes(node)
        .get(xot.xml_space_name())
        .map(String::as_str)
    {
        Some("preserve") => true,
        Some("default") => false,
        _ => preserve,
    };

    let mut attributes = Vec::new();
    for (prefix, namespace) in xot.namespaces(node).iter() {
        let prefix = xot.prefix_str(prefix);
        let declaration = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", prefix)
        };
        attributes.push((declaration, xot.namespace_str(*namespace).to_string()));
    }
    for (attribute, value) in xot.attributes(node).iter() {
        attributes.push((qualified_name(xot, path, node, attribute)?, value.clone()));
    }

    let keep_whitespace = preserve || has_text_content(xot, node);
    let mut children = Vec::new();
    for child in xot.children(node) {
        if let Some(child) = convert(xot, path, child, preserve, keep_whitespace)? {
            children.push(child);
        }
    }

    Ok(Element {
        name: qualified_name(xot, path, node, name)?,
        attributes,
        children,
    })
}

fn convert(
    xot: &Xot,
    path: &str,
    node: xot::Node,
    preserve: bool,
    keep_whitespace: bool,
) -> Result<Option<Node>> {
    let converted = match xot.value(node) {
        Value::Element(element) => Some(Node::from_element(convert_element(
            xot,
            path,
            node,
            element.name(),
            preserve,
        )?)),
        Value::Text(text) => {
            let text = text.get();
            (keep_whitespace || !text.trim().is_empty()).then(|| Node::Text(text.to_string()))
        }
        Value::Comment(comment) => Some(Node::Comment(comment.get().to_string())),
        Value::ProcessingInstruction(pi) => Some(Node::ProcessingInstruction {
            target: qualified_name(xot, path, node, pi.target())?,
            data: pi.data().map(str::to_string),
        }),
        _ => None,
    };
    Ok(converted)
}

/// Parse `.slnx` content; `path` anchors relative project paths.
pub fn parse(path: &str, content: &str) -> Result<SolutionDocument> {
    let mut xot = Xot::new();
    let doc = xot.parse(content).map_err(|e| xml_error(path, e))?;

    let root = xot
        .document_element(doc)
        .map_err(|_| xml_error(path, "document has no root element"))?;
    let Some(name) = xot.node_name(root) else {
        return Err(xml_error(path, "the root element must be <Solution>"));
    };

    let element = convert_element(&xot, path, root, name, false)?;
    if element.name != "Solution" {
        return Err(xml_error(
            path,
            format!("the root element must be <Solution>, found <{}>", element.name),
        ));
    }

    Ok(SolutionDocument {
        path: path.to_string(),
        root: SolutionElement {
            attributes: element.attributes,
            children: element.children,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dispatches_elements() {
        let content = r#"<Solution Description="demo">
  <!-- generated -->
  <Configurations>
    <BuildType Name="Debug" />
    <Platform Name="Any CPU" />
  </Configurations>
  <Folder Name="/Solution Items/">
    <File Path="README.md" />
  </Folder>
  <Project Path="src/App/App.csproj" Type="Classic C#">
    <BuildDependency Project="src/Lib/Lib.csproj" />
  </Project>
</Solution>"#;
        let doc = parse("/repo/App.slnx", content).unwrap();
        assert_eq!(doc.path, "/repo/App.slnx");
        assert_eq!(
            doc.root.attributes,
            vec![("Description".to_string(), "demo".to_string())]
        );
        assert_eq!(doc.root.children.len(), 4);
        assert_eq!(doc.root.children[0], Node::Comment(" generated ".to_string()));

        let configurations = doc.root.configurations().unwrap();
        assert_eq!(configurations.children.len(), 2);
        assert_eq!(
            configurations.children[0].identity(),
            Some(("BuildType", "Name", "Debug"))
        );
        assert_eq!(configurations.children[1].name(), Some("Platform"));

        let folders = doc.root.folders();
        let items = folders["/Solution Items/"];
        assert_eq!(items.children[0].identity(), Some(("File", "Path", "README.md")));

        let projects = doc.root.projects();
        let app = projects["src/App/App.csproj"];
        assert_eq!(app.attribute("Type"), Some("Classic C#"));
        assert_eq!(app.children[0].name(), Some("BuildDependency"));
    }

    #[test]
    fn test_parse_keeps_text() {
        let doc = parse(
            "/a.slnx",
            "<Solution><Properties Name=\"x\"><Property>value</Property></Properties></Solution>",
        )
        .unwrap();
        let properties = &doc.root.children[0];
        let property = &properties.children()[0];
        assert_eq!(property.children(), &[Node::Text("value".to_string())]);
    }

    #[test]
    fn test_parse_keeps_foreign_markup() {
        let doc = parse(
            "/a.slnx",
            r#"<Solution xmlns:v="urn:x">
  <?pi x?>
  <Properties v:Foo="1">
    <Property Name="Space"> </Property>
  </Properties>
</Solution>"#,
        )
        .unwrap();
        assert_eq!(
            doc.root.attributes,
            vec![("xmlns:v".to_string(), "urn:x".to_string())]
        );
        assert_eq!(
            doc.root.children[0],
            Node::ProcessingInstruction {
                target: "pi".to_string(),
                data: Some("x".to_string()),
            }
        );

        let Node::Unknown(properties) = &doc.root.children[1] else {
            panic!("expected <Properties>");
        };
        assert_eq!(properties.attribute("v:Foo"), Some("1"));
        // layout whitespace between elements is dropped
        assert_eq!(properties.children.len(), 1);
        assert_eq!(
            properties.children[0].children(),
            &[Node::Text(" ".to_string())]
        );
    }

    #[test]
    fn test_parse_prefixed_elements_are_not_keyed() {
        let doc = parse(
            "/a.slnx",
            r#"<Solution xmlns:v="urn:x"><v:Project Path="a.csproj" /></Solution>"#,
        )
        .unwrap();
        assert!(doc.root.projects().is_empty());
        assert_eq!(doc.root.children[0].name(), Some("v:Project"));
    }

    #[test]
    fn test_parse_rejects_other_root() {
        let err = parse("/a.slnx", "<Project Path=\"x\" />").unwrap_err();
        assert!(matches!(err, Error::Xml { .. }));
        let err = parse("/a.slnx", "<Other />").unwrap_err();
        assert!(format!("{}", err).contains("<Other>"));
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse("/a.slnx", "<Solution>").unwrap_err();
        assert!(matches!(err, Error::Xml { .. }));
    }
}
