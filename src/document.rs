//! OTX document wrapper for XML parsing

use regex::Regex;
use roxmltree::{Attribute, Document, Node};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Namespace URI bound to the `xsi` prefix in well-formed OTX documents
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Namespace URIs of the form `http://iso.org/OTX/<dotted version>`
static DATA_MODEL_NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^http://iso\.org/OTX/([0-9]+(?:\.[0-9]+)*)$").unwrap());

/// Error while loading a document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parse error in {path}: {message}")]
    Xml { path: PathBuf, message: String },
}

/// A parsed OTX document
///
/// The tree is immutable once parsed; every derived view (namespace map,
/// versions, paths) is computed from it.
pub struct OtxDocument<'input> {
    doc: Document<'input>,
    file: PathBuf,
    namespaces: BTreeMap<String, String>,
}

impl<'input> OtxDocument<'input> {
    /// Read the source text of a document
    pub fn read(path: &Path) -> Result<String, ParseError> {
        std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse an OTX source file
    pub fn parse(source: &'input str, file: &Path) -> Result<Self, ParseError> {
        let doc = Document::parse(source).map_err(|e| ParseError::Xml {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;

        let namespaces = doc
            .root_element()
            .namespaces()
            .filter_map(|ns| {
                let prefix = ns.name()?;
                (prefix != "xml").then(|| (prefix.to_string(), ns.uri().to_string()))
            })
            .collect();

        Ok(Self {
            doc,
            file: file.to_path_buf(),
            namespaces,
        })
    }

    /// Get the file path
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// File name without extension
    pub fn file_stem(&self) -> Option<&str> {
        self.file.file_stem().and_then(|s| s.to_str())
    }

    /// Get the root element
    pub fn root(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }

    /// Prefixed namespace declarations of the root element (prefix -> URI)
    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    /// URI bound to a prefix on the root element
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Check if the root element declares a prefix
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.namespaces.contains_key(prefix)
    }

    /// Namespace of the OTX core elements (the root element's namespace)
    pub fn core_namespace(&self) -> Option<&str> {
        let root = self.root();
        root.tag_name()
            .namespace()
            .or_else(|| root.lookup_namespace_uri(Some("otx")))
    }

    /// Schema version declared by the root `version` attribute
    pub fn schema_version(&self) -> Option<&str> {
        self.root().attribute("version")
    }

    /// Data model version taken from the `http://iso.org/OTX/<version>` namespace
    pub fn data_model_version(&self) -> Option<String> {
        let root = self.root();
        let candidates = self
            .core_namespace()
            .into_iter()
            .chain(root.lookup_namespace_uri(None))
            .chain(self.namespaces.values().map(String::as_str));

        for uri in candidates {
            if let Some(caps) = DATA_MODEL_NAMESPACE.captures(uri) {
                return Some(caps[1].to_string());
            }
        }
        None
    }

    /// Iterate over all elements in document order
    pub fn elements(&self) -> ElementIterator<'_, 'input> {
        ElementIterator::new(self.doc.root())
    }

    /// All elements with a given local name, in document order
    pub fn elements_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
        self.elements().filter(move |n| n.is_named(local))
    }

    /// Value of the `xsi:type` attribute, if the document declares `xsi`
    pub fn xsi_type<'a>(&self, node: Node<'a, 'input>) -> Option<&'a str> {
        let xsi = self.namespace("xsi")?;
        node.attribute((xsi, "type"))
    }

    /// All elements whose `xsi:type` equals the given value
    pub fn typed_elements(&self, xsi_type: &str) -> Vec<Node<'_, 'input>> {
        self.elements()
            .filter(|n| self.xsi_type(*n) == Some(xsi_type))
            .collect()
    }

    /// Deterministic XPath-like address of an element
    ///
    /// Core elements are written by local name, elements of other namespaces
    /// with their prefix. A 1-based index is appended when the parent has more
    /// than one child with the same name.
    pub fn path_of(&self, node: Node) -> String {
        let mut segments: Vec<String> = node
            .ancestors()
            .filter(|n| n.is_element())
            .map(|n| self.path_segment(n))
            .collect();
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Address of an attribute on an element
    pub fn attribute_path(&self, node: Node, attr: &Attribute) -> String {
        let name = match attr.namespace().and_then(|ns| node.lookup_prefix(ns)) {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, attr.name()),
            _ => attr.name().to_string(),
        };
        format!("{}/@{}", self.path_of(node), name)
    }

    fn path_segment(&self, node: Node) -> String {
        let tag = node.tag_name();
        let name = match tag.namespace() {
            Some(ns) if Some(ns) != self.core_namespace() => match node.lookup_prefix(ns) {
                Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, tag.name()),
                _ => tag.name().to_string(),
            },
            _ => tag.name().to_string(),
        };

        let Some(parent) = node.parent_element() else {
            return name;
        };

        let same_name: Vec<Node> = parent
            .children()
            .filter(|c| {
                c.is_element()
                    && c.tag_name().name() == tag.name()
                    && c.tag_name().namespace() == tag.namespace()
            })
            .collect();

        if same_name.len() > 1 {
            let position = same_name.iter().position(|c| *c == node).unwrap_or(0) + 1;
            format!("{}[{}]", name, position)
        } else {
            name
        }
    }
}

/// Iterator over all elements in document order
pub struct ElementIterator<'a, 'input> {
    stack: Vec<Node<'a, 'input>>,
}

impl<'a, 'input> ElementIterator<'a, 'input> {
    /// Walk `root` and everything below it
    pub fn new(root: Node<'a, 'input>) -> Self {
        Self { stack: vec![root] }
    }

    /// Walk everything below `node`, excluding `node` itself
    pub fn below(node: Node<'a, 'input>) -> Self {
        let mut stack: Vec<_> = node.children().collect();
        stack.reverse();
        Self { stack }
    }
}

impl<'a, 'input> Iterator for ElementIterator<'a, 'input> {
    type Item = Node<'a, 'input>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            // Push children in reverse order so we process them left-to-right
            let children: Vec<_> = node.children().collect();
            for child in children.into_iter().rev() {
                self.stack.push(child);
            }

            if node.is_element() {
                return Some(node);
            }
        }
        None
    }
}

/// Extension trait for Node
pub trait NodeExt<'a, 'input> {
    /// Check if this is an element with the given local name
    fn is_named(&self, local: &str) -> bool;

    /// Check if this is an element with the given namespace and local name
    fn is_named_in(&self, namespace: &str, local: &str) -> bool;

    /// Direct child elements with the given local name
    fn children_named(&self, local: &str) -> Vec<Node<'a, 'input>>;

    /// Direct child elements with the given namespace and local name
    fn children_named_in(&self, namespace: &str, local: &str) -> Vec<Node<'a, 'input>>;

    /// First direct child element with the given local name
    fn first_child_named(&self, local: &str) -> Option<Node<'a, 'input>>;

    /// All descendant elements, excluding this node
    fn descendant_elements(&self) -> ElementIterator<'a, 'input>;
}

impl<'a, 'input> NodeExt<'a, 'input> for Node<'a, 'input> {
    fn is_named(&self, local: &str) -> bool {
        self.is_element() && self.tag_name().name() == local
    }

    fn is_named_in(&self, namespace: &str, local: &str) -> bool {
        self.is_named(local) && self.tag_name().namespace() == Some(namespace)
    }

    fn children_named(&self, local: &str) -> Vec<Node<'a, 'input>> {
        self.children().filter(|c| c.is_named(local)).collect()
    }

    fn children_named_in(&self, namespace: &str, local: &str) -> Vec<Node<'a, 'input>> {
        self.children()
            .filter(|c| c.is_named_in(namespace, local))
            .collect()
    }

    fn first_child_named(&self, local: &str) -> Option<Node<'a, 'input>> {
        self.children().find(|c| c.is_named(local))
    }

    fn descendant_elements(&self) -> ElementIterator<'a, 'input> {
        ElementIterator::below(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<otx xmlns="http://iso.org/OTX/1.0.0"
     xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
     xmlns:smp="http://iso.org/OTX/1.0.0/StateMachineProcedure"
     id="1" name="Sample" package="pkg1" version="1.0.0">
  <procedures>
    <procedure id="p1" name="main" visibility="PUBLIC"/>
    <procedure id="p2" name="helper" xsi:type="smp:StateMachineProcedure">
      <smp:realisation initialState="A"/>
    </procedure>
  </procedures>
</otx>"#;

    fn parse(source: &str) -> OtxDocument<'_> {
        OtxDocument::parse(source, Path::new("dir/Sample.otx")).unwrap()
    }

    #[test]
    fn test_parse_invalid_xml() {
        let result = OtxDocument::parse("<otx><procedures>", Path::new("broken.otx"));
        assert!(matches!(result, Err(ParseError::Xml { .. })));
    }

    #[test]
    fn test_namespace_map_excludes_default() {
        let source = SOURCE.to_string();
        let doc = parse(&source);
        let prefixes: Vec<_> = doc.namespaces().keys().map(String::as_str).collect();
        assert_eq!(prefixes, vec!["smp", "xsi"]);
        assert!(doc.has_prefix("smp"));
        assert!(!doc.has_prefix("zip"));
        assert_eq!(doc.namespace("xsi"), Some(XSI_NAMESPACE));
    }

    #[test]
    fn test_versions() {
        let source = SOURCE.to_string();
        let doc = parse(&source);
        assert_eq!(doc.schema_version(), Some("1.0.0"));
        assert_eq!(doc.data_model_version().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_missing_versions() {
        let doc = parse("<otx name=\"x\"/>");
        assert_eq!(doc.schema_version(), None);
        assert_eq!(doc.data_model_version(), None);
    }

    #[test]
    fn test_extension_namespace_is_not_a_data_model_version() {
        let doc = parse(
            r#"<otx xmlns:smp="http://iso.org/OTX/1.0.0/StateMachineProcedure" name="x"/>"#,
        );
        assert_eq!(doc.data_model_version(), None);

        let doc = parse(
            r#"<otx xmlns:smp="http://iso.org/OTX/1.0.0/StateMachineProcedure" xmlns:core="http://iso.org/OTX/1.0.0" name="x"/>"#,
        );
        assert_eq!(doc.data_model_version().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_file_helpers() {
        let source = SOURCE.to_string();
        let doc = parse(&source);
        assert_eq!(doc.file_stem(), Some("Sample"));
        assert_eq!(doc.file(), Path::new("dir/Sample.otx"));
    }

    #[test]
    fn test_path_of_indexes_repeated_siblings() {
        let source = SOURCE.to_string();
        let doc = parse(&source);
        let procedures: Vec<_> = doc.elements_named("procedure").collect();
        assert_eq!(procedures.len(), 2);
        assert_eq!(doc.path_of(procedures[0]), "/otx/procedures/procedure[1]");
        assert_eq!(doc.path_of(procedures[1]), "/otx/procedures/procedure[2]");
        assert_eq!(doc.path_of(doc.root()), "/otx");
    }

    #[test]
    fn test_path_of_prefixes_foreign_namespaces() {
        let source = SOURCE.to_string();
        let doc = parse(&source);
        let realisation = doc.elements_named("realisation").next().unwrap();
        assert_eq!(
            doc.path_of(realisation),
            "/otx/procedures/procedure[2]/smp:realisation"
        );
    }

    #[test]
    fn test_attribute_path() {
        let source = SOURCE.to_string();
        let doc = parse(&source);
        let helper = doc.elements_named("procedure").nth(1).unwrap();
        let paths: Vec<_> = helper
            .attributes()
            .map(|a| doc.attribute_path(helper, &a))
            .collect();
        assert!(paths.contains(&"/otx/procedures/procedure[2]/@name".to_string()));
        assert!(paths.contains(&"/otx/procedures/procedure[2]/@xsi:type".to_string()));
    }

    #[test]
    fn test_typed_elements() {
        let source = SOURCE.to_string();
        let doc = parse(&source);
        let typed = doc.typed_elements("smp:StateMachineProcedure");
        assert_eq!(typed.len(), 1);
        assert_eq!(typed[0].attribute("name"), Some("helper"));
    }

    #[test]
    fn test_element_iterator_document_order() {
        let doc = parse("<a><b><c/></b><d/></a>");
        let names: Vec<_> = doc.elements().map(|n| n.tag_name().name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        let below: Vec<_> = doc
            .root()
            .descendant_elements()
            .map(|n| n.tag_name().name())
            .collect();
        assert_eq!(below, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_node_ext_children() {
        let source = SOURCE.to_string();
        let doc = parse(&source);
        let helper = doc.elements_named("procedure").nth(1).unwrap();
        let smp = doc.namespace("smp").unwrap();
        assert_eq!(helper.children_named_in(smp, "realisation").len(), 1);
        assert!(helper.first_child_named("realisation").is_some());
        assert!(helper.children_named("specification").is_empty());
    }
}
