//! Owned, mutable XML tree for copy-patch editing.
//!
//! `roxmltree` gives us fast read-only parsing; patching needs an owned tree
//! that can be cloned, mutated in place and re-serialized under our own
//! rules (stable two-space indentation, preserved namespace declarations and
//! attribute order, controlled escaping). Namespace declarations are
//! recovered per element by diffing its in-scope set against its parent's,
//! so a serialized copy declares exactly what the original document declared.

use crate::XML_NS;
use std::fmt::Write as _;

/// Qualified name: optional lexical prefix plus local part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    pub name: QName,
    /// Namespace declarations introduced on this element: `(prefix, uri)`,
    /// `None` prefix meaning the default namespace.
    pub namespaces: Vec<(Option<String>, String)>,
    pub attrs: Vec<(QName, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            namespaces: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// First attribute whose local part matches, regardless of prefix.
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name.local == local)
            .map(|(_, value)| value.as_str())
    }

    /// Sets (or replaces) an attribute, keyed by prefix + local part.
    pub fn set_attr(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    pub fn remove_attr_local(&mut self, local: &str) {
        self.attrs.retain(|(name, _)| name.local != local);
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|child| match child {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    pub fn find_child(&self, local: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.local_name() == local)
    }

    pub fn find_child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.child_elements_mut().find(|el| el.local_name() == local)
    }

    /// Index (into `children`) of the first child element with this local name.
    pub fn child_index(&self, local: &str) -> Option<usize> {
        self.children.iter().position(|child| {
            matches!(child, XmlNode::Element(el) if el.local_name() == local)
        })
    }

    pub fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    pub fn insert_element(&mut self, index: usize, element: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(element));
    }

    pub fn remove_child(&mut self, index: usize) -> XmlNode {
        self.children.remove(index)
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(XmlNode::Text(text.into()));
    }

    pub fn text(&self) -> Option<&str> {
        self.children.iter().find_map(|child| match child {
            XmlNode::Text(text) => Some(text.as_str()),
            XmlNode::Element(_) => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    /// Builds an owned tree from XML text.
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        let root = convert_element(doc.root_element(), &[]);
        Ok(Self { root })
    }

    /// Serializes with an XML declaration and stable two-space indentation.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        write_element(&mut out, &self.root, 0);
        out
    }
}

fn in_scope_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<(Option<String>, String)> {
    node.namespaces()
        .filter(|ns| ns.uri() != XML_NS)
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect()
}

fn prefix_for(
    uri: Option<&str>,
    scope: &[(Option<String>, String)],
    attribute: bool,
) -> Option<String> {
    let uri = uri?;
    if uri == XML_NS {
        return Some("xml".to_string());
    }
    if !attribute {
        // Prefer the default namespace for elements when it binds this uri.
        if scope.iter().any(|(p, u)| p.is_none() && u == uri) {
            return None;
        }
    }
    scope
        .iter()
        .find(|(p, u)| p.is_some() && u == uri)
        .and_then(|(p, _)| p.clone())
}

fn convert_element(
    node: roxmltree::Node<'_, '_>,
    parent_scope: &[(Option<String>, String)],
) -> XmlElement {
    let scope = in_scope_namespaces(node);
    let declared: Vec<(Option<String>, String)> = scope
        .iter()
        .filter(|entry| !parent_scope.contains(entry))
        .cloned()
        .collect();

    let name = QName {
        prefix: prefix_for(node.tag_name().namespace(), &scope, false),
        local: node.tag_name().name().to_string(),
    };

    let mut element = XmlElement::new(name);
    element.namespaces = declared;

    for attr in node.attributes() {
        let attr_name = QName {
            prefix: prefix_for(attr.namespace(), &scope, true),
            local: attr.name().to_string(),
        };
        element.attrs.push((attr_name, attr.value().to_string()));
    }

    for child in node.children() {
        if child.is_element() {
            element
                .children
                .push(XmlNode::Element(convert_element(child, &scope)));
        } else if child.is_text() {
            let raw = child.text().unwrap_or("");
            if !raw.trim().is_empty() {
                element.children.push(XmlNode::Text(raw.trim().to_string()));
            }
        }
    }

    element
}

fn write_element(out: &mut String, element: &XmlElement, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}<{}", element.name.qualified());

    for (prefix, uri) in &element.namespaces {
        match prefix {
            Some(prefix) => {
                let _ = write!(out, " xmlns:{prefix}=\"{}\"", escape_attr(uri));
            }
            None => {
                let _ = write!(out, " xmlns=\"{}\"", escape_attr(uri));
            }
        }
    }

    for (name, value) in &element.attrs {
        let _ = write!(out, " {}=\"{}\"", name.qualified(), escape_attr(value));
    }

    if element.children.is_empty() {
        out.push_str("/>\n");
        return;
    }

    let only_text = element
        .children
        .iter()
        .all(|child| matches!(child, XmlNode::Text(_)));
    if only_text {
        out.push('>');
        for child in &element.children {
            if let XmlNode::Text(text) = child {
                out.push_str(&escape_text(text));
            }
        }
        let _ = writeln!(out, "</{}>", element.name.qualified());
        return;
    }

    out.push_str(">\n");
    for child in &element.children {
        match child {
            XmlNode::Element(el) => write_element(out, el, depth + 1),
            XmlNode::Text(text) => {
                let _ = writeln!(out, "{indent}  {}", escape_text(text));
            }
        }
    }
    let _ = writeln!(out, "{indent}</{}>", element.name.qualified());
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
