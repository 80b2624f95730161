//! POM parsing: project coordinates, parent reference, properties,
//! dependencies, dependencyManagement, and licenses.
//!
//! The parser is a single pass over `quick-xml` events that dispatches on
//! the element path. Unknown elements are ignored; missing optional
//! children simply leave their defaults in place.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use mvn2get_util::errors::Mvn2getError;

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,

    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
    pub licenses: Vec<PomLicense>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone, Default)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// A dependency declared in a POM file.
#[derive(Debug, Clone, Default)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub type_: Option<String>,
    pub classifier: Option<String>,
    pub optional: bool,
    pub exclusions: Vec<PomExclusion>,
}

impl PomDependency {
    /// Declared scope, defaulting to `compile`.
    pub fn effective_scope(&self) -> &str {
        self.scope.as_deref().unwrap_or("compile")
    }

    /// Whether this is an `import`-scoped BOM entry.
    pub fn is_bom_import(&self) -> bool {
        self.effective_scope() == "import" && self.type_.as_deref().unwrap_or("jar") == "pom"
    }
}

/// An exclusion within a dependency declaration.
#[derive(Debug, Clone, Default)]
pub struct PomExclusion {
    pub group_id: String,
    pub artifact_id: Option<String>,
}

/// A license declared in a POM file.
#[derive(Debug, Clone, Default)]
pub struct PomLicense {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Declared packaging, defaulting to `jar`.
    pub fn effective_packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }

    /// Look up a version from dependencyManagement for `group:artifact`.
    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.dependency_management
            .iter()
            .find(|d| d.group_id == group_id && d.artifact_id == artifact_id)
            .and_then(|d| d.version.as_deref())
    }

    /// BOM imports declared in dependencyManagement.
    pub fn bom_imports(&self) -> impl Iterator<Item = &PomDependency> {
        self.dependency_management
            .iter()
            .filter(|d| d.is_bom_import())
    }
}

/// Parse a POM XML document.
pub fn parse_pom(xml: &str) -> miette::Result<Pom> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    // Collectors for the multi-element sections currently open.
    let mut dep: Option<PomDependency> = None;
    let mut exclusion: Option<PomExclusion> = None;
    let mut parent: Option<ParentRef> = None;
    let mut license: Option<PomLicense> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                text.clear();
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();
                match path.as_slice() {
                    ["project", "dependencies", "dependency"]
                    | ["project", "dependencyManagement", "dependencies", "dependency"] => {
                        dep = Some(PomDependency::default());
                    }
                    [.., "exclusions", "exclusion"] if dep.is_some() => {
                        exclusion = Some(PomExclusion::default());
                    }
                    ["project", "parent"] => parent = Some(ParentRef::default()),
                    ["project", "licenses", "license"] => license = Some(PomLicense::default()),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text = e.unescape().unwrap_or_default().into_owned();
            }
            Ok(Event::CData(e)) => {
                text = String::from_utf8_lossy(&e.into_inner()).into_owned();
            }
            Ok(Event::End(_)) => {
                let value = std::mem::take(&mut text);
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();
                match path.as_slice() {
                    ["project", "groupId"] => pom.group_id = Some(value),
                    ["project", "artifactId"] => pom.artifact_id = Some(value),
                    ["project", "version"] => pom.version = Some(value),
                    ["project", "packaging"] => pom.packaging = Some(value),

                    ["project", "parent", field] => {
                        if let Some(p) = parent.as_mut() {
                            match *field {
                                "groupId" => p.group_id = value,
                                "artifactId" => p.artifact_id = value,
                                "version" => p.version = value,
                                _ => {}
                            }
                        }
                    }
                    ["project", "parent"] => pom.parent = parent.take(),

                    ["project", "properties", key] => {
                        pom.properties.insert((*key).to_string(), value);
                    }

                    ["project", "licenses", "license", field] => {
                        if let Some(l) = license.as_mut() {
                            match *field {
                                "name" => l.name = Some(value),
                                "url" => l.url = Some(value),
                                _ => {}
                            }
                        }
                    }
                    ["project", "licenses", "license"] => {
                        if let Some(l) = license.take() {
                            pom.licenses.push(l);
                        }
                    }

                    [.., "exclusions", "exclusion", field] => {
                        if let Some(x) = exclusion.as_mut() {
                            match *field {
                                "groupId" => x.group_id = value,
                                "artifactId" => x.artifact_id = Some(value),
                                _ => {}
                            }
                        }
                    }
                    [.., "exclusions", "exclusion"] => {
                        if let (Some(d), Some(x)) = (dep.as_mut(), exclusion.take()) {
                            d.exclusions.push(x);
                        }
                    }

                    ["project", "dependencies", "dependency", field]
                    | ["project", "dependencyManagement", "dependencies", "dependency", field] => {
                        if let Some(d) = dep.as_mut() {
                            match *field {
                                "groupId" => d.group_id = value,
                                "artifactId" => d.artifact_id = value,
                                "version" => d.version = Some(value),
                                "scope" => d.scope = Some(value),
                                "type" => d.type_ = Some(value),
                                "classifier" => d.classifier = Some(value),
                                "optional" => d.optional = value.trim() == "true",
                                _ => {}
                            }
                        }
                    }
                    ["project", "dependencies", "dependency"] => {
                        if let Some(d) = dep.take() {
                            pom.dependencies.push(d);
                        }
                    }
                    ["project", "dependencyManagement", "dependencies", "dependency"] => {
                        if let Some(d) = dep.take() {
                            pom.dependency_management.push(d);
                        }
                    }

                    _ => {}
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Mvn2getError::Xml {
                    message: format!("Failed to parse POM: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(pom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.example</groupId>
    <artifactId>widget</artifactId>
    <version>1.4.0</version>

    <properties>
        <widget.dep.version>2.0.1</widget.dep.version>
    </properties>

    <dependencies>
        <dependency>
            <groupId>org.example</groupId>
            <artifactId>widget-api</artifactId>
            <version>${widget.dep.version}</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn parse_project_coordinates() {
        let pom = parse_pom(SIMPLE_POM).unwrap();
        assert_eq!(pom.group_id.as_deref(), Some("org.example"));
        assert_eq!(pom.artifact_id.as_deref(), Some("widget"));
        assert_eq!(pom.version.as_deref(), Some("1.4.0"));
        assert_eq!(pom.effective_packaging(), "jar");
    }

    #[test]
    fn parse_properties_and_dependencies() {
        let pom = parse_pom(SIMPLE_POM).unwrap();
        assert_eq!(pom.properties.get("widget.dep.version").unwrap(), "2.0.1");
        assert_eq!(pom.dependencies.len(), 2);
        assert_eq!(
            pom.dependencies[0].version.as_deref(),
            Some("${widget.dep.version}")
        );
        assert_eq!(pom.dependencies[0].effective_scope(), "compile");
        assert_eq!(pom.dependencies[1].effective_scope(), "test");
    }

    #[test]
    fn parse_parent_and_inheritance() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>widget-parent</artifactId>
        <version>3.0.0</version>
    </parent>
    <artifactId>widget-core</artifactId>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        let parent = pom.parent.as_ref().unwrap();
        assert_eq!(parent.group_id, "org.example");
        assert_eq!(parent.version, "3.0.0");
        assert_eq!(pom.effective_group_id(), Some("org.example"));
        assert_eq!(pom.effective_version(), Some("3.0.0"));
    }

    #[test]
    fn parse_dependency_management_and_bom_imports() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>bom-user</artifactId>
    <version>1.0</version>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.example.platform</groupId>
                <artifactId>platform-bom</artifactId>
                <version>5.1</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
            <dependency>
                <groupId>com.google.guava</groupId>
                <artifactId>guava</artifactId>
                <version>32.0.0-jre</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert_eq!(pom.dependency_management.len(), 2);
        assert_eq!(pom.managed_version("com.google.guava", "guava"), Some("32.0.0-jre"));
        let boms: Vec<_> = pom.bom_imports().collect();
        assert_eq!(boms.len(), 1);
        assert_eq!(boms[0].artifact_id, "platform-bom");
    }

    #[test]
    fn parse_exclusions() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <dependencies>
        <dependency>
            <groupId>com.example</groupId>
            <artifactId>lib</artifactId>
            <version>1.0</version>
            <exclusions>
                <exclusion>
                    <groupId>commons-logging</groupId>
                    <artifactId>commons-logging</artifactId>
                </exclusion>
            </exclusions>
        </dependency>
    </dependencies>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        let dep = &pom.dependencies[0];
        assert_eq!(dep.group_id, "com.example");
        assert_eq!(dep.exclusions.len(), 1);
        assert_eq!(dep.exclusions[0].group_id, "commons-logging");
    }

    #[test]
    fn parse_licenses() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <licenses>
        <license>
            <name>Apache License, Version 2.0</name>
            <url>https://www.apache.org/licenses/LICENSE-2.0.txt</url>
        </license>
        <license>
            <name>MIT</name>
        </license>
    </licenses>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert_eq!(pom.licenses.len(), 2);
        assert_eq!(
            pom.licenses[0].url.as_deref(),
            Some("https://www.apache.org/licenses/LICENSE-2.0.txt")
        );
        assert_eq!(pom.licenses[1].name.as_deref(), Some("MIT"));
        assert_eq!(pom.licenses[1].url, None);
    }

    #[test]
    fn parse_pom_packaging() {
        let xml = r#"<project>
    <groupId>g</groupId>
    <artifactId>a</artifactId>
    <version>1</version>
    <packaging>pom</packaging>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert_eq!(pom.effective_packaging(), "pom");
    }

    #[test]
    fn unknown_elements_are_ignored() {
        let xml = r#"<project>
    <groupId>g</groupId>
    <artifactId>a</artifactId>
    <version>1</version>
    <build><plugins><plugin><artifactId>whatever</artifactId></plugin></plugins></build>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert_eq!(pom.artifact_id.as_deref(), Some("a"));
        assert!(pom.dependencies.is_empty());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_pom("<project><groupId>g</project>").is_err());
    }

    #[test]
    fn optional_flag_parsing() {
        let xml = r#"<project>
    <groupId>g</groupId><artifactId>a</artifactId><version>1</version>
    <dependencies>
        <dependency>
            <groupId>x</groupId><artifactId>y</artifactId><version>2</version>
            <optional>true</optional>
        </dependency>
    </dependencies>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert!(pom.dependencies[0].optional);
    }
}
