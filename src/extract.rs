//! Attribute and structure extraction from OTX documents

use crate::document::{NodeExt, OtxDocument};
use log::debug;
use roxmltree::Node;
use std::collections::BTreeMap;

/// An attribute together with its address in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo<'a> {
    /// Local attribute name
    pub name: &'a str,
    /// Attribute namespace, if qualified
    pub namespace: Option<&'a str>,
    /// Attribute value
    pub value: &'a str,
    /// Path of the attribute, `<element path>/@<name>`
    pub xpath: String,
}

/// An `<import>` declaration
#[derive(Debug, Clone, Copy)]
pub struct Import<'a, 'input> {
    pub prefix: Option<&'a str>,
    pub package: Option<&'a str>,
    pub document: Option<&'a str>,
    pub node: Node<'a, 'input>,
}

impl Import<'_, '_> {
    /// Human readable `[package, document, prefix]` triple
    pub fn describe(&self) -> String {
        format!(
            "[package: {}, document:{}, prefix:{}]",
            self.package.unwrap_or("None"),
            self.document.unwrap_or("None"),
            self.prefix.unwrap_or("None")
        )
    }
}

/// Every attribute of every element, in document order
pub fn all_attributes<'a>(doc: &'a OtxDocument<'_>) -> Vec<AttributeInfo<'a>> {
    let mut attributes = Vec::new();
    for element in doc.elements() {
        for attr in element.attributes() {
            attributes.push(AttributeInfo {
                name: attr.name(),
                namespace: attr.namespace(),
                value: attr.value(),
                xpath: doc.attribute_path(element, &attr),
            });
        }
    }
    attributes
}

/// All `<import>` declarations
pub fn imports<'a, 'input>(doc: &'a OtxDocument<'input>) -> Vec<Import<'a, 'input>> {
    doc.elements_named("import")
        .map(|node| Import {
            prefix: node.attribute("prefix"),
            package: node.attribute("package"),
            document: node.attribute("document"),
            node,
        })
        .collect()
}

/// Signature name to its declared field names
///
/// Fields are the `name` attributes of every descendant with local name
/// `element`. Signatures without a name are dropped.
pub fn signature_map(doc: &OtxDocument<'_>) -> BTreeMap<String, Vec<String>> {
    let mut signatures = BTreeMap::new();
    for signature in doc.elements_named("signature") {
        let Some(name) = signature.attribute("name") else {
            continue;
        };
        let fields: Vec<String> = signature
            .descendant_elements()
            .filter(|n| n.is_named("element"))
            .filter_map(|n| n.attribute("name"))
            .map(String::from)
            .collect();
        signatures.insert(name.to_string(), fields);
    }
    debug!("signature map: {:?}", signatures);
    signatures
}

/// Variable name to the structure type declared inside it
pub fn variable_structure_types(doc: &OtxDocument<'_>) -> BTreeMap<String, String> {
    let mut types = BTreeMap::new();
    for variable in doc.elements_named("variable") {
        let Some(name) = variable.attribute("name") else {
            continue;
        };
        let structure_type = variable
            .descendant_elements()
            .find_map(|n| n.attribute("structureType"));
        if let Some(structure_type) = structure_type {
            types.insert(name.to_string(), structure_type.to_string());
        }
    }
    debug!("variable structure types: {:?}", types);
    types
}
