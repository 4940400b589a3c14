//! Core document integrity rules

use crate::document::{NodeExt, OtxDocument};
use crate::engine::CheckContext;
use crate::extract::{all_attributes, imports};
use crate::issue::Severity;
use crate::paths::{find_otx_files, same_file};
use crate::rule::{CheckError, Rule, RuleGroup};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Attributes holding OtxLink references
const OTX_LINK_ATTRIBUTES: [&str; 5] = ["implements", "validFor", "procedure", "valueOf", "mutexLock"];

/// Elements made of a specification and an optional realisation
const SPECIFIED_NODES: [&str; 4] = ["declaration", "procedure", "signature", "validity"];

/// Get the core rules
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleGroup::Core,
            1,
            "document_name_matches_filename",
            "For OTX documents stored in a file system, the attribute name of the <otx> root element should match the filename of the containing file (without the extension '.otx').",
            document_name_matches_filename,
        )
        .with_severity(Severity::Warning),
        Rule::new(
            RuleGroup::Core,
            2,
            "document_name_package_uniqueness",
            "The value of the <otx> attribute name shall be unique within the scope of all OTX documents belonging to the same package.",
            document_name_package_uniqueness,
        ),
        Rule::new(
            RuleGroup::Core,
            3,
            "no_dead_import_links",
            "Imported OTX documents (referenced by package name and document name via <import> elements) should exist and should be accessible.",
            no_dead_import_links,
        ),
        Rule::new(
            RuleGroup::Core,
            4,
            "no_unused_imports",
            "An imported OTX document should be used at least once in the importing document.",
            no_unused_imports,
        )
        .with_severity(Severity::Warning),
        Rule::new(
            RuleGroup::Core,
            5,
            "no_use_of_undefined_import_prefixes",
            "If an imported name is accessed by prefix in an OtxLink type attribute, the corresponding prefix definition shall exist in an <import> element.",
            no_use_of_undefined_import_prefixes,
        ),
        Rule::new(
            RuleGroup::Core,
            6,
            "match_of_imported_document_data_model_version",
            "An imported OTX document (imported by an <import> element) shall be bound to the same data model version as the importing document.",
            match_of_imported_document_data_model_version,
        ),
        Rule::new(
            RuleGroup::Core,
            7,
            "have_specification_if_no_realisation_exists",
            "For all elements with specification and realisation parts in an OTX document: if there is no <realisation> given, the according <specification> element should exist and have content (no empty string).",
            have_specification_if_no_realisation_exists,
        )
        .with_severity(Severity::Warning),
        Rule::new(
            RuleGroup::Core,
            8,
            "public_main_procedure",
            "The value of <procedure> attribute visibility shall always be 'PUBLIC' if the procedure name is 'main'.",
            public_main_procedure,
        ),
        Rule::new(
            RuleGroup::Core,
            9,
            "mandatory_constant_initialization",
            "Constant declarations shall always be initialized.",
            mandatory_constant_initialization,
        ),
        Rule::new(
            RuleGroup::Core,
            10,
            "unique_node_names",
            "The value of a nodes name attribute should be unique among all nodes in a procedure.",
            unique_node_names,
        )
        .with_severity(Severity::Warning),
    ]
}

fn document_name_matches_filename(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let doc = ctx.document();
    let root = doc.root();

    let Some(name) = root.attribute("name") else {
        ctx.skip("No name attribute in otx root node. Skip the check.");
        return Ok(());
    };

    let stem = doc.file_stem().unwrap_or_default();
    if name != stem {
        let issue = ctx.issue("Document name not matching file name").at(
            doc.path_of(root),
            format!(
                "Invalid otx name {} detected. Do not match filename {}",
                name, stem
            ),
        );
        ctx.report(issue);
    }
    Ok(())
}

fn document_name_package_uniqueness(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let doc = ctx.document();
    let root = doc.root();

    let Some(name) = root.attribute("name") else {
        ctx.skip("No name attribute in otx root node. Skip the check.");
        return Ok(());
    };
    let Some(package) = root.attribute("package") else {
        ctx.skip("No package attribute in otx root node. Skip the check.");
        return Ok(());
    };

    let package_root = match ctx.paths().package_root(package) {
        Some(dir) if dir.is_dir() => dir,
        other => {
            let shown = other.map_or_else(|| package.to_string(), |p| p.display().to_string());
            ctx.skip(&format!(
                "The package root folder {} does not exist. Skip the check.",
                shown
            ));
            return Ok(());
        }
    };

    let key = format!("{}.{}", package, name);
    let duplicates: Vec<PathBuf> = find_otx_files(&package_root)
        .into_iter()
        .filter(|file| !same_file(file, doc.file()))
        .filter(|file| package_dot_name(file).as_deref() == Some(key.as_str()))
        .collect();
    debug!("documents sharing {}: {:?}", key, duplicates);

    if !duplicates.is_empty() {
        let others: Vec<String> = duplicates.iter().map(|p| p.display().to_string()).collect();
        let issue = ctx
            .issue("<otx> attribute name re-used in the same package")
            .at(
                doc.path_of(root),
                format!("Document {} is also declared in {}", key, others.join(", ")),
            );
        ctx.report(issue);
    }
    Ok(())
}

/// `package.name` of a sibling document, if it parses and declares both
fn package_dot_name(file: &Path) -> Option<String> {
    let source = match OtxDocument::read(file) {
        Ok(source) => source,
        Err(e) => {
            warn!("{}", e);
            return None;
        }
    };
    let doc = match OtxDocument::parse(&source, file) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Failed to parse XML file: {}", e);
            return None;
        }
    };

    let root = doc.root();
    let package = root.attribute("package")?;
    let name = root.attribute("name")?;
    Some(format!("{}.{}", package, name))
}

fn no_dead_import_links(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let doc = ctx.document();

    for import in imports(doc) {
        let Some(document) = import.document else {
            debug!("import without document attribute at {}", doc.path_of(import.node));
            continue;
        };

        let target = ctx.paths().document(document);
        debug!("resolved import {} to {}", document, target.display());
        if !target.exists() {
            let issue = ctx
                .issue("Imported otx document does not exists at specified package")
                .at(
                    doc.path_of(import.node),
                    format!("Imported otx document {} does not exists", import.describe()),
                );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn no_unused_imports(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let doc = ctx.document();
    let attributes = all_attributes(doc);

    for import in imports(doc) {
        let Some(prefix) = import.prefix else {
            continue;
        };

        let used = attributes.iter().any(|attr| {
            attr.value
                .split_once(':')
                .is_some_and(|(qualifier, _)| qualifier == prefix)
        });

        if !used {
            let issue = ctx
                .issue("Imported otx is never used in the current document")
                .at(
                    doc.path_of(import.node),
                    format!(
                        "Imported otx document {} is never used in current document",
                        import.describe()
                    ),
                );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn no_use_of_undefined_import_prefixes(
    ctx: &mut CheckContext<'_, '_>,
) -> Result<(), CheckError> {
    let doc = ctx.document();
    let prefixes: HashSet<&str> = imports(doc).iter().filter_map(|i| i.prefix).collect();

    let links = all_attributes(doc)
        .into_iter()
        .filter(|attr| attr.namespace.is_none() && OTX_LINK_ATTRIBUTES.contains(&attr.name));

    for link in links {
        let Some((prefix, _)) = link.value.split_once(':') else {
            continue;
        };
        if !prefixes.contains(prefix) {
            let issue = ctx
                .issue("Prefix definition does not exists in an <import> element")
                .at(
                    link.xpath,
                    format!("Imported prefix {} not found across import elements", prefix),
                );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn match_of_imported_document_data_model_version(
    ctx: &mut CheckContext<'_, '_>,
) -> Result<(), CheckError> {
    let doc = ctx.document();

    let Some(source_version) = doc.data_model_version() else {
        ctx.skip("xmlns version not found in current document root. Skip the check.");
        return Ok(());
    };

    for import in imports(doc) {
        let Some(document) = import.document else {
            continue;
        };
        let path = ctx.paths().document(document);
        if !path.exists() {
            debug!("imported document {} not found, skipping", path.display());
            continue;
        }

        let source = OtxDocument::read(&path)?;
        let imported = OtxDocument::parse(&source, &path)?;
        let imported_version = imported.data_model_version();
        debug!(
            "Current document {} - data model version {:?}",
            document, imported_version
        );

        if imported_version.as_deref() != Some(source_version.as_str()) {
            let issue = ctx
                .issue("Imported document data model version is different than the one in the current document")
                .at(
                    doc.path_of(import.node),
                    format!(
                        "Imported document {} data model version {} different than current model version {}",
                        document,
                        imported_version.as_deref().unwrap_or("None"),
                        source_version
                    ),
                );
            ctx.report(issue);
        }
    }
    Ok(())
}

fn have_specification_if_no_realisation_exists(
    ctx: &mut CheckContext<'_, '_>,
) -> Result<(), CheckError> {
    let doc = ctx.document();

    let nodes = doc
        .elements()
        .filter(|n| SPECIFIED_NODES.contains(&n.tag_name().name()));

    for node in nodes {
        if node.first_child_named("realisation").is_some() {
            continue;
        }

        // a literal pair of quotes counts as empty
        let has_content = node
            .first_child_named("specification")
            .and_then(|s| s.text())
            .is_some_and(|text| text != "\"\"");

        if !has_content {
            let path = doc.path_of(node);
            let description = format!(
                "Node {} has no realisation and no specification or empty string in specification",
                path
            );
            let issue = ctx
                .issue("Empty realisation has content in specification")
                .at(path, description);
            ctx.report(issue);
        }
    }
    Ok(())
}

fn public_main_procedure(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let doc = ctx.document();

    for procedure in doc.elements_named("procedure") {
        if procedure.attribute("name") != Some("main") {
            continue;
        }

        let visibility = procedure.attribute("visibility").unwrap_or("PRIVATE");
        if visibility != "PUBLIC" {
            let path = doc.path_of(procedure);
            let description = format!(
                "Procedure at {} is called main but its visibility is not PUBLIC",
                path
            );
            let issue = ctx
                .issue("Procedure called main has not PUBLIC visibility")
                .at(path, description);
            ctx.report(issue);
        }
    }
    Ok(())
}

fn mandatory_constant_initialization(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let doc = ctx.document();

    for constant in doc.elements_named("constant") {
        let initialized = constant.descendant_elements().any(|realisation| {
            realisation.is_named("realisation")
                && realisation.children_named("dataType").iter().any(|data_type| {
                    data_type.first_child_named("init").is_some()
                })
        });

        if !initialized {
            let path = doc.path_of(constant);
            let description = format!(
                "Constant {} at {} is not initialized",
                constant.attribute("name").unwrap_or("None"),
                path
            );
            let issue = ctx
                .issue("Constant declaration without initialization")
                .at(path, description);
            ctx.report(issue);
        }
    }
    Ok(())
}

fn unique_node_names(ctx: &mut CheckContext<'_, '_>) -> Result<(), CheckError> {
    let doc = ctx.document();

    for procedure in doc.elements_named("procedure") {
        let procedure_name = procedure.attribute("name").unwrap_or("None");

        // first-seen order keeps issue ordering stable
        let mut names: Vec<(&str, Vec<String>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for node in procedure.descendant_elements() {
            let Some(name) = node.attribute("name") else {
                continue;
            };
            let slot = *index.entry(name).or_insert_with(|| {
                names.push((name, Vec::new()));
                names.len() - 1
            });
            names[slot].1.push(doc.path_of(node));
        }

        for (name, paths) in names.into_iter().filter(|(_, paths)| paths.len() > 1) {
            let mut issue = ctx.issue("Nodes with same attribute name found in a procedure");
            for path in paths {
                issue = issue.at(
                    path,
                    format!(
                        "Procedure {} contains duplicated name {}.",
                        procedure_name, name
                    ),
                );
            }
            ctx.report(issue);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::report::{Report, Reporter, Status};
    use std::fs;
    use tempfile::TempDir;

    fn rule(name: &str) -> Rule {
        rules().into_iter().find(|r| r.name == name).unwrap()
    }

    fn check(name: &str, file: &Path, source: &str) -> Report {
        let doc = OtxDocument::parse(source, file).unwrap();
        let mut report = Report::new("otxBundle", "0.1.0", "test");
        Engine::with_rules(vec![rule(name)]).run(&doc, &mut report);
        report
    }

    fn checker<'r>(report: &'r Report, name: &str) -> &'r crate::report::CheckerResult {
        let id = rule(name).checker_id();
        report.checkers.iter().find(|c| c.checker_id == id).unwrap()
    }

    #[test]
    fn test_document_name_matches() {
        let source = r#"<otx name="Sample" version="1.0.0"/>"#;
        let report = check("document_name_matches_filename", Path::new("Sample.otx"), source);
        let result = checker(&report, "document_name_matches_filename");
        assert_eq!(result.status, Status::Completed);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_document_name_mismatch() {
        let source = r#"<otx name="Other" version="1.0.0"/>"#;
        let report = check("document_name_matches_filename", Path::new("Sample.otx"), source);
        let result = checker(&report, "document_name_matches_filename");
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].level, Severity::Warning);
        assert_eq!(result.issues[0].locations[0].xpath, "/otx");
        assert_eq!(
            result.issues[0].locations[0].description,
            "Invalid otx name Other detected. Do not match filename Sample"
        );
    }

    #[test]
    fn test_document_name_missing_skips() {
        let source = r#"<otx version="1.0.0"/>"#;
        let report = check("document_name_matches_filename", Path::new("Sample.otx"), source);
        let result = checker(&report, "document_name_matches_filename");
        assert_eq!(result.status, Status::Skipped);
        assert_eq!(
            result.summary,
            vec!["No name attribute in otx root node. Skip the check."]
        );
    }

    #[test]
    fn test_package_uniqueness_missing_root_skips() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Foo.otx");
        let source = r#"<otx name="Foo" package="nowhere" version="1.0.0"/>"#;
        let report = check("document_name_package_uniqueness", &file, source);
        let result = checker(&report, "document_name_package_uniqueness");
        assert_eq!(result.status, Status::Skipped);
        assert!(result.summary[0].starts_with("The package root folder"));
    }

    #[test]
    fn test_package_uniqueness_ignores_unparsable_siblings() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pkg1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Broken.otx"), "<otx name=").unwrap();
        let source = r#"<otx name="Foo" package="pkg1" version="1.0.0"/>"#;
        fs::write(dir.join("Foo.otx"), source).unwrap();

        let report = check("document_name_package_uniqueness", &dir.join("Foo.otx"), source);
        let result = checker(&report, "document_name_package_uniqueness");
        assert_eq!(result.status, Status::Completed);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_dead_import() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Present.otx"), "<otx/>").unwrap();
        let source = r#"<otx name="Main" version="1.0.0">
  <imports>
    <import prefix="a" package="p" document="Present"/>
    <import prefix="b" package="p" document="Missing"/>
    <import prefix="c" package="p"/>
  </imports>
</otx>"#;
        let report = check("no_dead_import_links", &temp.path().join("Main.otx"), source);
        let result = checker(&report, "no_dead_import_links");
        assert_eq!(result.status, Status::Completed);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].locations[0].xpath, "/otx/imports/import[2]");
        assert_eq!(
            result.issues[0].locations[0].description,
            "Imported otx document [package: p, document:Missing, prefix:b] does not exists"
        );
    }

    #[test]
    fn test_unused_imports() {
        let source = r#"<otx name="Main" version="1.0.0">
  <imports>
    <import prefix="used" package="p" document="A"/>
    <import prefix="unused" package="p" document="B"/>
    <import prefix="use" package="p" document="C"/>
  </imports>
  <procedures>
    <procedure name="main" implements="used:Signature"/>
  </procedures>
</otx>"#;
        let report = check("no_unused_imports", Path::new("Main.otx"), source);
        let result = checker(&report, "no_unused_imports");
        let paths: Vec<_> = result
            .issues
            .iter()
            .map(|i| i.locations[0].xpath.as_str())
            .collect();
        assert_eq!(paths, vec!["/otx/imports/import[2]", "/otx/imports/import[3]"]);
        assert!(result.issues.iter().all(|i| i.level == Severity::Warning));
    }

    #[test]
    fn test_undefined_import_prefixes() {
        let source = r#"<otx name="Main" version="1.0.0">
  <imports>
    <import prefix="lib" package="p" document="Lib"/>
  </imports>
  <procedures>
    <procedure name="a" implements="lib:Sig"/>
    <procedure name="b" implements="other:Sig"/>
    <procedure name="c" implements="LocalSig"/>
    <procedure name="d" comment="other:ignored"/>
  </procedures>
</otx>"#;
        let report = check("no_use_of_undefined_import_prefixes", Path::new("Main.otx"), source);
        let result = checker(&report, "no_use_of_undefined_import_prefixes");
        assert_eq!(result.issues.len(), 1);
        assert_eq!(
            result.issues[0].locations[0].xpath,
            "/otx/procedures/procedure[2]/@implements"
        );
        assert_eq!(
            result.issues[0].locations[0].description,
            "Imported prefix other not found across import elements"
        );
    }

    #[test]
    fn test_data_model_version_mismatch() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("Same.otx"),
            r#"<otx xmlns="http://iso.org/OTX/1.0.0" name="Same"/>"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("Newer.otx"),
            r#"<otx xmlns="http://iso.org/OTX/2.0.0" name="Newer"/>"#,
        )
        .unwrap();
        let source = r#"<otx xmlns="http://iso.org/OTX/1.0.0" name="Main" version="1.0.0">
  <imports>
    <import prefix="s" document="Same"/>
    <import prefix="n" document="Newer"/>
    <import prefix="m" document="Missing"/>
  </imports>
</otx>"#;
        let report = check(
            "match_of_imported_document_data_model_version",
            &temp.path().join("Main.otx"),
            source,
        );
        let result = checker(&report, "match_of_imported_document_data_model_version");
        assert_eq!(result.status, Status::Completed);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(
            result.issues[0].locations[0].description,
            "Imported document Newer data model version 2.0.0 different than current model version 1.0.0"
        );
    }

    #[test]
    fn test_data_model_version_unparsable_import_is_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Broken.otx"), "<otx").unwrap();
        let source = r#"<otx xmlns="http://iso.org/OTX/1.0.0" name="Main" version="1.0.0">
  <imports><import prefix="b" document="Broken"/></imports>
</otx>"#;
        let report = check(
            "match_of_imported_document_data_model_version",
            &temp.path().join("Main.otx"),
            source,
        );
        let id = rule("match_of_imported_document_data_model_version").checker_id();
        assert_eq!(report.status(&id), Some(Status::Error));
    }

    #[test]
    fn test_data_model_version_missing_skips() {
        let source = r#"<otx name="Main" version="1.0.0"/>"#;
        let report = check(
            "match_of_imported_document_data_model_version",
            Path::new("Main.otx"),
            source,
        );
        let id = rule("match_of_imported_document_data_model_version").checker_id();
        assert_eq!(report.status(&id), Some(Status::Skipped));
    }

    #[test]
    fn test_have_specification() {
        let source = r#"<otx name="Main" version="1.0.0">
  <procedures>
    <procedure name="implemented"><realisation/></procedure>
    <procedure name="documented"><specification>Does things</specification></procedure>
    <procedure name="quoted"><specification>""</specification></procedure>
    <procedure name="empty"><specification/></procedure>
    <procedure name="bare"/>
  </procedures>
</otx>"#;
        let report = check(
            "have_specification_if_no_realisation_exists",
            Path::new("Main.otx"),
            source,
        );
        let result = checker(&report, "have_specification_if_no_realisation_exists");
        let paths: Vec<_> = result
            .issues
            .iter()
            .map(|i| i.locations[0].xpath.as_str())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/otx/procedures/procedure[3]",
                "/otx/procedures/procedure[4]",
                "/otx/procedures/procedure[5]",
            ]
        );
    }

    #[test]
    fn test_public_main_procedure() {
        let source = r#"<otx name="Main" version="1.0.0">
  <procedures>
    <procedure name="main"/>
    <procedure name="helper"/>
  </procedures>
</otx>"#;
        let report = check("public_main_procedure", Path::new("Main.otx"), source);
        let result = checker(&report, "public_main_procedure");
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].level, Severity::Error);

        let public = r#"<otx name="Main" version="1.0.0">
  <procedures><procedure name="main" visibility="PUBLIC"/></procedures>
</otx>"#;
        let report = check("public_main_procedure", Path::new("Main.otx"), public);
        assert!(checker(&report, "public_main_procedure").issues.is_empty());
    }

    #[test]
    fn test_mandatory_constant_initialization() {
        let source = r#"<otx name="Main" version="1.0.0">
  <declarations>
    <constant name="Initialized">
      <realisation><dataType><init value="1"/></dataType></realisation>
    </constant>
    <constant name="Bare">
      <realisation><dataType/></realisation>
    </constant>
  </declarations>
</otx>"#;
        let report = check("mandatory_constant_initialization", Path::new("Main.otx"), source);
        let result = checker(&report, "mandatory_constant_initialization");
        assert_eq!(result.issues.len(), 1);
        assert_eq!(
            result.issues[0].locations[0].xpath,
            "/otx/declarations/constant[2]"
        );
        assert_eq!(
            result.issues[0].locations[0].description,
            "Constant Bare at /otx/declarations/constant[2] is not initialized"
        );
    }

    #[test]
    fn test_unique_node_names() {
        let source = r#"<otx name="Main" version="1.0.0">
  <procedures>
    <procedure name="main">
      <realisation>
        <flow>
          <action name="step"/>
          <action name="step"/>
          <action name="other"/>
        </flow>
        <declarations><variable name="other"/></declarations>
      </realisation>
    </procedure>
    <procedure name="second">
      <realisation><flow><action name="step"/></flow></realisation>
    </procedure>
  </procedures>
</otx>"#;
        let report = check("unique_node_names", Path::new("Main.otx"), source);
        let result = checker(&report, "unique_node_names");
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].locations.len(), 2);
        assert_eq!(
            result.issues[0].locations[0].description,
            "Procedure main contains duplicated name step."
        );
        assert_eq!(
            result.issues[1].locations[1].xpath,
            "/otx/procedures/procedure[1]/realisation/declarations/variable"
        );
    }
}
