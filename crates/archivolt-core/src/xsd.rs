//! Offline validation against the official exchange schema set.
//!
//! The canonical `archimate3_Model.xsd` imports the generic XML-namespace
//! schema from the W3C site, and the richer `archimate3_Diagram.xsd`
//! redefines the base viewpoint type to permit rendering extensions. To stay
//! fully offline we synthesize a minimal local `xml.xsd`, rewrite every
//! `schemaLocation` onto `_local` copies, and validate against the richest
//! variant available (Diagram > View > Model).
//!
//! The validation engine reads the (patched) schema files themselves:
//! content models, attribute uses and enumerations are collected from the
//! XSD and the instance document is checked for child ordering, required
//! attributes and content, known `xsi:type` names, and referential
//! integrity of identifier-valued attributes. Schema violations are data
//! (`ok = false` plus the full error list), never an `Err`.

use crate::error::{Error, Result};
use crate::model::local_type_name;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<String>,
}

const LOCAL_XML_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.w3.org/XML/1998/namespace"
           xmlns:xml="http://www.w3.org/XML/1998/namespace"
           elementFormDefault="qualified"
           attributeFormDefault="unqualified">
  <xs:attribute name="lang" type="xs:language"/>
</xs:schema>
"#;

/// Validates `xml_path` against the schema set in `schema_dir`.
pub fn validate(xml_path: &Path, schema_dir: &Path) -> Result<ValidationReport> {
    let model_xsd = schema_dir.join("archimate3_Model.xsd");
    if !model_xsd.exists() {
        return Ok(ValidationReport {
            ok: false,
            errors: vec![format!("schema not found: {}", model_xsd.display())],
        });
    }

    ensure_local_xml_xsd(schema_dir)?;
    let entry = prepare_schema_set(schema_dir, &model_xsd)?;
    let schema = load_schema_set(&entry)?;

    let text = fs::read_to_string(xml_path)?;
    let doc = match roxmltree::Document::parse(&text) {
        Ok(doc) => doc,
        Err(err) => {
            return Ok(ValidationReport {
                ok: false,
                errors: vec![format!("{}: not well-formed: {err}", xml_path.display())],
            });
        }
    };

    let mut errors = Vec::new();
    validate_instance(&doc, &schema, &mut errors);
    Ok(ValidationReport {
        ok: errors.is_empty(),
        errors,
    })
}

fn ensure_local_xml_xsd(schema_dir: &Path) -> Result<()> {
    let xml_xsd = schema_dir.join("xml.xsd");
    if !xml_xsd.exists() {
        fs::write(&xml_xsd, LOCAL_XML_XSD)?;
    }
    Ok(())
}

/// Rewrites `schemaLocation` references onto local copies and returns the
/// richest usable entry point.
fn prepare_schema_set(schema_dir: &Path, model_xsd: &Path) -> Result<PathBuf> {
    let model_text = fs::read_to_string(model_xsd)?;
    let model_text = model_text.replace(
        "schemaLocation=\"http://www.w3.org/2001/xml.xsd\"",
        "schemaLocation=\"xml.xsd\"",
    );
    let model_local = schema_dir.join("_archimate3_Model_local.xsd");
    fs::write(&model_local, model_text)?;

    let view_xsd = schema_dir.join("archimate3_View.xsd");
    let mut view_local: Option<PathBuf> = None;
    if view_xsd.exists() {
        let view_text = fs::read_to_string(&view_xsd)?;
        let view_text = view_text.replace(
            "schemaLocation=\"archimate3_Model.xsd\"",
            "schemaLocation=\"_archimate3_Model_local.xsd\"",
        );
        let target = schema_dir.join("_archimate3_View_local.xsd");
        fs::write(&target, view_text)?;
        view_local = Some(target);
    }

    let diagram_xsd = schema_dir.join("archimate3_Diagram.xsd");
    if view_local.is_some() && diagram_xsd.exists() {
        let diagram_text = fs::read_to_string(&diagram_xsd)?;
        let diagram_text = diagram_text.replace(
            "schemaLocation=\"archimate3_View.xsd\"",
            "schemaLocation=\"_archimate3_View_local.xsd\"",
        );
        let target = schema_dir.join("_archimate3_Diagram_local.xsd");
        fs::write(&target, diagram_text)?;
        return Ok(target);
    }

    Ok(view_local.unwrap_or(model_local))
}

/// One slot of a content model; a choice slot lists several admissible
/// element names.
#[derive(Debug, Clone)]
struct Particle {
    /// `(element local name, declared type local name)`
    options: Vec<(String, Option<String>)>,
    min: u32,
    max: Option<u32>,
}

#[derive(Debug, Clone)]
struct AttributeUse {
    name: String,
    required: bool,
}

#[derive(Debug, Clone, Default)]
struct ComplexType {
    base: Option<String>,
    particles: Vec<Particle>,
    attributes: Vec<AttributeUse>,
}

#[derive(Debug, Default)]
struct SchemaSet {
    types: FxHashMap<String, ComplexType>,
    /// Global element declarations: name -> type local name.
    elements: FxHashMap<String, String>,
}

fn load_schema_set(entry: &Path) -> Result<SchemaSet> {
    let mut set = SchemaSet::default();
    let mut visited = FxHashSet::default();
    load_schema_file(entry, &mut set, &mut visited)?;
    Ok(set)
}

fn load_schema_file(
    path: &Path,
    set: &mut SchemaSet,
    visited: &mut FxHashSet<PathBuf>,
) -> Result<()> {
    let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Ok(());
    }

    let text = fs::read_to_string(path)?;
    let doc = roxmltree::Document::parse(&text).map_err(|err| Error::SchemaSetup {
        message: format!("{}: {err}", path.display()),
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "schema" {
        return Err(Error::SchemaSetup {
            message: format!("{}: not an XML schema document", path.display()),
        });
    }

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    for child in root.children().filter(|c| c.is_element()) {
        match child.tag_name().name() {
            "include" | "import" | "redefine" => {
                if let Some(location) = child.attribute("schemaLocation") {
                    // Offline contract: anything that still points at the
                    // network is skipped, never fetched.
                    if !location.contains("://") {
                        let target = base_dir.join(location);
                        if target.exists() {
                            load_schema_file(&target, set, visited)?;
                        }
                    }
                }
                // Redefined definitions override what the included file declared.
                for redefined in child.children().filter(|c| c.is_element()) {
                    collect_definition(redefined, set);
                }
            }
            _ => collect_definition(child, set),
        }
    }
    Ok(())
}

fn collect_definition(node: roxmltree::Node<'_, '_>, set: &mut SchemaSet) {
    match node.tag_name().name() {
        "element" => {
            if let (Some(name), Some(type_name)) = (node.attribute("name"), node.attribute("type"))
            {
                set.elements
                    .insert(name.to_string(), local_type_name(type_name).to_string());
            }
        }
        "complexType" => {
            if let Some(name) = node.attribute("name") {
                let parsed = parse_complex_type(node);
                set.types.insert(name.to_string(), parsed);
            }
        }
        _ => {}
    }
}

fn parse_complex_type(node: roxmltree::Node<'_, '_>) -> ComplexType {
    let mut ct = ComplexType::default();

    let mut content = node;
    if let Some(complex_content) = find_xsd_child(node, "complexContent") {
        if let Some(derived) = find_xsd_child(complex_content, "extension")
            .or_else(|| find_xsd_child(complex_content, "restriction"))
        {
            ct.base = derived
                .attribute("base")
                .map(|base| local_type_name(base).to_string());
            content = derived;
        }
    }

    for group in content.children().filter(|c| c.is_element()) {
        match group.tag_name().name() {
            "sequence" | "all" => collect_particles(group, &mut ct.particles),
            "choice" => {
                if let Some(particle) = choice_particle(group) {
                    ct.particles.push(particle);
                }
            }
            "attribute" => {
                if let Some(attr) = attribute_use(group) {
                    ct.attributes.push(attr);
                }
            }
            _ => {}
        }
    }
    ct
}

fn collect_particles(group: roxmltree::Node<'_, '_>, out: &mut Vec<Particle>) {
    for child in group.children().filter(|c| c.is_element()) {
        match child.tag_name().name() {
            "element" => {
                if let Some(particle) = element_particle(child) {
                    out.push(particle);
                }
            }
            "choice" => {
                if let Some(particle) = choice_particle(child) {
                    out.push(particle);
                }
            }
            "sequence" => collect_particles(child, out),
            "any" => out.push(Particle {
                options: Vec::new(),
                min: occurs(child.attribute("minOccurs"), 1),
                max: max_occurs(child.attribute("maxOccurs")),
            }),
            _ => {}
        }
    }
}

fn element_particle(node: roxmltree::Node<'_, '_>) -> Option<Particle> {
    let name = node
        .attribute("name")
        .or_else(|| node.attribute("ref"))
        .map(|n| local_type_name(n).to_string())?;
    let declared = node
        .attribute("type")
        .map(|t| local_type_name(t).to_string());
    Some(Particle {
        options: vec![(name, declared)],
        min: occurs(node.attribute("minOccurs"), 1),
        max: max_occurs(node.attribute("maxOccurs")),
    })
}

fn choice_particle(node: roxmltree::Node<'_, '_>) -> Option<Particle> {
    let mut options = Vec::new();
    collect_choice_options(node, &mut options);
    if options.is_empty() {
        return None;
    }
    Some(Particle {
        options,
        min: occurs(node.attribute("minOccurs"), 1),
        max: max_occurs(node.attribute("maxOccurs")),
    })
}

fn collect_choice_options(node: roxmltree::Node<'_, '_>, out: &mut Vec<(String, Option<String>)>) {
    for child in node.children().filter(|c| c.is_element()) {
        match child.tag_name().name() {
            "element" => {
                if let Some(name) = child.attribute("name").or_else(|| child.attribute("ref")) {
                    out.push((
                        local_type_name(name).to_string(),
                        child
                            .attribute("type")
                            .map(|t| local_type_name(t).to_string()),
                    ));
                }
            }
            "choice" | "sequence" => collect_choice_options(child, out),
            _ => {}
        }
    }
}

fn attribute_use(node: roxmltree::Node<'_, '_>) -> Option<AttributeUse> {
    let name = node
        .attribute("name")
        .or_else(|| node.attribute("ref"))
        .map(|n| local_type_name(n).to_string())?;
    Some(AttributeUse {
        name,
        required: node.attribute("use") == Some("required"),
    })
}

fn occurs(value: Option<&str>, default: u32) -> u32 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn max_occurs(value: Option<&str>) -> Option<u32> {
    match value {
        None => Some(1),
        Some("unbounded") => None,
        Some(v) => v.parse().ok().or(Some(1)),
    }
}

fn find_xsd_child<'a, 'b>(
    node: roxmltree::Node<'a, 'b>,
    local: &str,
) -> Option<roxmltree::Node<'a, 'b>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == local)
}

impl SchemaSet {
    /// Effective content model of a type: base particles first, then the
    /// derived type's own.
    fn effective(&self, type_name: &str) -> Option<(Vec<Particle>, Vec<AttributeUse>)> {
        let mut chain = Vec::new();
        let mut cursor = Some(type_name.to_string());
        let mut guard = FxHashSet::default();
        while let Some(name) = cursor {
            if !guard.insert(name.clone()) {
                break;
            }
            match self.types.get(&name) {
                Some(ct) => {
                    chain.push(ct.clone());
                    cursor = ct.base.clone();
                }
                None => break,
            }
        }
        if chain.is_empty() {
            return None;
        }
        let mut particles = Vec::new();
        let mut attributes = Vec::new();
        for ct in chain.iter().rev() {
            particles.extend(ct.particles.iter().cloned());
            attributes.extend(ct.attributes.iter().cloned());
        }
        Some((particles, attributes))
    }
}

fn node_pos(doc: &roxmltree::Document<'_>, node: roxmltree::Node<'_, '_>) -> String {
    let pos = doc.text_pos_at(node.range().start);
    format!("{}:{}", pos.row, pos.col)
}

fn validate_instance(
    doc: &roxmltree::Document<'_>,
    schema: &SchemaSet,
    errors: &mut Vec<String>,
) {
    let root = doc.root_element();
    let root_name = root.tag_name().name();
    let Some(root_type) = schema.elements.get(root_name) else {
        errors.push(format!(
            "{}: unknown root element <{root_name}>",
            node_pos(doc, root)
        ));
        return;
    };

    validate_element(doc, root, root_type, schema, errors);

    let mut identifiers = FxHashSet::default();
    collect_instance_identifiers(root, &mut identifiers);
    check_references(doc, root, &identifiers, errors);
}

fn validate_element(
    doc: &roxmltree::Document<'_>,
    node: roxmltree::Node<'_, '_>,
    declared_type: &str,
    schema: &SchemaSet,
    errors: &mut Vec<String>,
) {
    // xsi:type substitutes the declared type; an unknown name is an error.
    let mut effective_type = declared_type.to_string();
    if let Some(subst) = node.attribute((crate::XSI_NS, "type")) {
        let local = local_type_name(subst);
        if schema.types.contains_key(local) {
            effective_type = local.to_string();
        } else if !schema.types.is_empty() && !known_abstract_type(local) {
            errors.push(format!(
                "{}: <{}> has unknown xsi:type \"{subst}\"",
                node_pos(doc, node),
                node.tag_name().name()
            ));
        }
    }

    let Some((particles, attributes)) = schema.effective(&effective_type) else {
        // Types the schema set does not model are not checked further.
        return;
    };

    for attr in &attributes {
        if attr.required && node.attribute(attr.name.as_str()).is_none() {
            errors.push(format!(
                "{}: <{}> is missing required attribute \"{}\"",
                node_pos(doc, node),
                node.tag_name().name(),
                attr.name
            ));
        }
    }

    let mut last_rank: usize = 0;
    let mut seen = vec![0u32; particles.len()];
    for child in node.children().filter(|c| c.is_element()) {
        let child_name = child.tag_name().name();
        let rank = particles.iter().position(|p| {
            p.options.is_empty() || p.options.iter().any(|(name, _)| name == child_name)
        });
        match rank {
            Some(rank) => {
                if rank < last_rank {
                    errors.push(format!(
                        "{}: <{child_name}> out of order inside <{}> (expected sequence {})",
                        node_pos(doc, child),
                        node.tag_name().name(),
                        expected_sequence(&particles)
                    ));
                }
                last_rank = last_rank.max(rank);
                seen[rank] += 1;
                if let Some(max) = particles[rank].max {
                    if seen[rank] > max {
                        errors.push(format!(
                            "{}: <{child_name}> appears more than {max} time(s) inside <{}>",
                            node_pos(doc, child),
                            node.tag_name().name()
                        ));
                    }
                }
                let child_type = particles[rank]
                    .options
                    .iter()
                    .find(|(name, _)| name == child_name)
                    .and_then(|(_, type_name)| type_name.clone());
                if let Some(child_type) = child_type {
                    validate_element(doc, child, &child_type, schema, errors);
                }
            }
            None => errors.push(format!(
                "{}: unexpected <{child_name}> inside <{}> (expected sequence {})",
                node_pos(doc, child),
                node.tag_name().name(),
                expected_sequence(&particles)
            )),
        }
    }

    for (rank, particle) in particles.iter().enumerate() {
        if particle.min > 0 && seen[rank] < particle.min && !particle.options.is_empty() {
            let names: Vec<&str> = particle
                .options
                .iter()
                .map(|(name, _)| name.as_str())
                .collect();
            errors.push(format!(
                "{}: <{}> is missing required child <{}>",
                node_pos(doc, node),
                node.tag_name().name(),
                names.join("|")
            ));
        }
    }
}

/// `xsi:type` values that legitimately name abstract exchange types the
/// schema expresses through substitution rather than named complex types.
fn known_abstract_type(local: &str) -> bool {
    matches!(local, "Element" | "Label" | "Container" | "Relationship" | "Line" | "Diagram")
}

fn expected_sequence(particles: &[Particle]) -> String {
    let names: Vec<String> = particles
        .iter()
        .map(|p| {
            if p.options.is_empty() {
                "*".to_string()
            } else {
                p.options
                    .iter()
                    .map(|(name, _)| name.clone())
                    .collect::<Vec<_>>()
                    .join("|")
            }
        })
        .collect();
    format!("[{}]", names.join(", "))
}

fn collect_instance_identifiers(node: roxmltree::Node<'_, '_>, out: &mut FxHashSet<String>) {
    if let Some(identifier) = node.attribute("identifier") {
        out.insert(identifier.to_string());
    }
    for child in node.children().filter(|c| c.is_element()) {
        collect_instance_identifiers(child, out);
    }
}

const REFERENCE_ATTRS: &[&str] = &[
    "source",
    "target",
    "identifierRef",
    "elementRef",
    "relationshipRef",
    "ref",
];

fn check_references(
    doc: &roxmltree::Document<'_>,
    node: roxmltree::Node<'_, '_>,
    identifiers: &FxHashSet<String>,
    errors: &mut Vec<String>,
) {
    for attr in REFERENCE_ATTRS {
        if let Some(value) = node.attribute(*attr) {
            if !identifiers.contains(value) {
                errors.push(format!(
                    "{}: <{}> attribute {attr}=\"{value}\" resolves to no declared identifier",
                    node_pos(doc, node),
                    node.tag_name().name()
                ));
            }
        }
    }
    for child in node.children().filter(|c| c.is_element()) {
        check_references(doc, child, identifiers, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI_MODEL_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns="http://www.opengroup.org/xsd/archimate/3.0/"
           targetNamespace="http://www.opengroup.org/xsd/archimate/3.0/"
           elementFormDefault="qualified">
  <xs:import namespace="http://www.w3.org/XML/1998/namespace"
             schemaLocation="http://www.w3.org/2001/xml.xsd"/>
  <xs:element name="model" type="ModelType"/>
  <xs:complexType name="ModelType">
    <xs:sequence>
      <xs:element name="name" type="LangStringType" minOccurs="0"/>
      <xs:element name="documentation" type="LangStringType" minOccurs="0"/>
      <xs:element name="elements" type="ElementsType" minOccurs="0"/>
      <xs:element name="relationships" type="RelationshipsType" minOccurs="0"/>
      <xs:element name="views" type="ViewsType" minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="identifier" use="required"/>
  </xs:complexType>
  <xs:complexType name="LangStringType"/>
  <xs:complexType name="ElementsType">
    <xs:sequence>
      <xs:element name="element" type="ElementType" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="ElementType">
    <xs:sequence>
      <xs:element name="name" type="LangStringType" minOccurs="0"/>
      <xs:element name="documentation" type="LangStringType" minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="identifier" use="required"/>
  </xs:complexType>
  <xs:complexType name="RelationshipsType">
    <xs:sequence>
      <xs:element name="relationship" type="RelationshipType"
                  minOccurs="0" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="RelationshipType">
    <xs:attribute name="identifier" use="required"/>
    <xs:attribute name="source" use="required"/>
    <xs:attribute name="target" use="required"/>
  </xs:complexType>
  <xs:complexType name="ViewsType">
    <xs:sequence>
      <xs:element name="viewpoints" type="ViewpointsType"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="ViewpointsType"/>
</xs:schema>
"#;

    fn schema_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("archimate3_Model.xsd"), MINI_MODEL_XSD).unwrap();
        dir
    }

    fn write_doc(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    const VALID_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/" identifier="id-m">
  <name>Demo</name>
  <elements>
    <element identifier="id-a"><name>A</name></element>
    <element identifier="id-b"/>
  </elements>
  <relationships>
    <relationship identifier="id-r" source="id-a" target="id-b"/>
  </relationships>
  <views>
    <viewpoints/>
  </views>
</model>"#;

    #[test]
    fn valid_document_passes() {
        let dir = schema_dir();
        let doc = write_doc(&dir, "ok.xml", VALID_DOC);
        let report = validate(&doc, dir.path()).unwrap();
        assert!(report.ok, "unexpected errors: {:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn validation_is_deterministic() {
        let dir = schema_dir();
        let doc = write_doc(&dir, "ok.xml", VALID_DOC);
        let first = validate(&doc, dir.path()).unwrap();
        let second = validate(&doc, dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_order_children_are_reported() {
        let dir = schema_dir();
        let doc = write_doc(
            &dir,
            "disorder.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/" identifier="id-m">
  <elements>
    <element identifier="id-a"/>
  </elements>
  <name>Too late</name>
</model>"#,
        );
        let report = validate(&doc, dir.path()).unwrap();
        assert!(!report.ok);
        assert!(report.errors.iter().any(|e| e.contains("out of order")));
    }

    #[test]
    fn missing_required_attribute_is_reported() {
        let dir = schema_dir();
        let doc = write_doc(
            &dir,
            "noid.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/" identifier="id-m">
  <elements>
    <element/>
  </elements>
</model>"#,
        );
        let report = validate(&doc, dir.path()).unwrap();
        assert!(!report.ok);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("missing required attribute \"identifier\""))
        );
    }

    #[test]
    fn unresolved_references_are_reported() {
        let dir = schema_dir();
        let doc = write_doc(
            &dir,
            "dangling.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/" identifier="id-m">
  <elements>
    <element identifier="id-a"/>
  </elements>
  <relationships>
    <relationship identifier="id-r" source="id-a" target="id-ghost"/>
  </relationships>
</model>"#,
        );
        let report = validate(&doc, dir.path()).unwrap();
        assert!(!report.ok);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("target=\"id-ghost\""))
        );
    }

    #[test]
    fn missing_schema_is_data_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(&dir, "any.xml", VALID_DOC);
        let report = validate(&doc, dir.path()).unwrap();
        assert!(!report.ok);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("archimate3_Model.xsd"));
    }

    #[test]
    fn schema_preparation_writes_local_copies() {
        let dir = schema_dir();
        let doc = write_doc(&dir, "ok.xml", VALID_DOC);
        validate(&doc, dir.path()).unwrap();
        assert!(dir.path().join("xml.xsd").exists());
        let patched =
            fs::read_to_string(dir.path().join("_archimate3_Model_local.xsd")).unwrap();
        assert!(patched.contains("schemaLocation=\"xml.xsd\""));
        assert!(!patched.contains("http://www.w3.org/2001/xml.xsd"));
    }
}
