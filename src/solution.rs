//! Solution and project metadata
//!
//! Reads the project list from a `.sln` file and the build properties each
//! project declares in its `<PropertyGroup>` elements.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

static PROJECT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*Project\("\{[^}]*\}"\)\s*=\s*"(?P<name>[^"]+)"\s*,\s*"(?P<path>[^"]+)"\s*,\s*"\{[^}]*\}""#,
    )
    .expect("project line pattern is valid")
});

static PROPERTY_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<PropertyGroup\b[^>]*>(?P<body>.*?)</PropertyGroup>")
        .expect("property group pattern is valid")
});

static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?P<open>[A-Za-z_][\w.]*)(?:\s[^>]*)?>(?P<value>[^<]*)</(?P<close>[A-Za-z_][\w.]*)\s*>")
        .expect("property pattern is valid")
});

/// Extensions of buildable project files
const PROJECT_EXTENSIONS: [&str; 4] = ["csproj", "fsproj", "vbproj", "proj"];

#[derive(Debug, Error)]
pub enum SolutionError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A project referenced by a solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub properties: IndexMap<String, String>,
}

impl Project {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// True when the property equals `value`, ignoring case
    pub fn has_property(&self, key: &str, value: &str) -> bool {
        self.property(key)
            .is_some_and(|actual| actual.trim().eq_ignore_ascii_case(value))
    }
}

/// Projects of a solution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    pub path: PathBuf,
    pub projects: Vec<Project>,
}

impl Solution {
    /// Parse the project list of a solution; properties are left empty
    pub fn parse(path: &Path, text: &str) -> Self {
        let dir = path.parent().unwrap_or(Path::new(""));

        let projects = PROJECT_LINE
            .captures_iter(text)
            .filter_map(|caps| {
                let relative = caps["path"].replace('\\', "/");
                let is_project = Path::new(&relative)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PROJECT_EXTENSIONS.contains(&ext));
                if !is_project {
                    debug!("Skipping solution folder {}", &caps["name"]);
                    return None;
                }

                Some(Project {
                    name: caps["name"].to_string(),
                    path: dir.join(relative),
                    properties: IndexMap::new(),
                })
            })
            .collect();

        Self {
            path: path.to_path_buf(),
            projects,
        }
    }

    /// Read a solution and the properties of each of its projects
    pub fn load(path: &Path) -> Result<Self, SolutionError> {
        let text = std::fs::read_to_string(path).map_err(|source| SolutionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut solution = Self::parse(path, &text);

        for project in &mut solution.projects {
            match std::fs::read_to_string(&project.path) {
                Ok(content) => project.properties = parse_properties(&content),
                Err(e) => warn!(
                    "Failed to read project {} ({}): {}",
                    project.name,
                    project.path.display(),
                    e
                ),
            }
        }

        Ok(solution)
    }

    /// Find a project by name, ignoring case
    pub fn find_project(&self, name: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|project| project.name.eq_ignore_ascii_case(name))
    }

    /// Projects whose property `key` equals `value`
    pub fn projects_with_property(&self, key: &str, value: &str) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|project| project.has_property(key, value))
            .collect()
    }

    pub fn packable_projects(&self) -> Vec<&Project> {
        self.projects_with_property("IsPackable", "true")
    }

    pub fn test_projects(&self) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|project| {
                project.has_property("IsTestProject", "true") || project.name.ends_with("Tests")
            })
            .collect()
    }
}

/// Flat scan of `<Key>Value</Key>` pairs inside every `<PropertyGroup>`
pub fn parse_properties(project_xml: &str) -> IndexMap<String, String> {
    let mut properties = IndexMap::new();

    for group in PROPERTY_GROUP.captures_iter(project_xml) {
        for caps in PROPERTY.captures_iter(&group["body"]) {
            if caps["open"] != caps["close"] {
                continue;
            }
            properties.insert(caps["open"].to_string(), caps["value"].trim().to_string());
        }
    }

    properties
}
