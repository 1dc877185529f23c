use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CoregenError;

pub const CAPI_KEY: &str = "CAPI=2";

/// Files found under one module root, partitioned by classification rule.
///
/// Every scanned path lands in exactly one of the five lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleInventory {
    pub root: String,
    pub includes: Vec<String>,
    pub packages: Vec<String>,
    pub sources: Vec<String>,
    pub nonsynth: Vec<String>,
    pub unclassified: Vec<String>,
}

impl ModuleInventory {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.includes.len()
            + self.packages.len()
            + self.sources.len()
            + self.nonsynth.len()
            + self.unclassified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Versioned core name: `vendor:library[.module]:name:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity {
    pub vendor: String,
    pub library: String,
    pub module: Option<String>,
    pub name: String,
    pub version: String,
}

impl Identity {
    pub fn new(
        vendor: impl Into<String>,
        library: impl Into<String>,
        module: Option<&str>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            library: library.into(),
            module: module.map(str::to_string),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Checks every part is usable both in the CAPI-2 name and as a path
    /// segment below the cores root.
    pub fn validate(&self) -> Result<(), CoregenError> {
        let parts = [
            Some(self.vendor.as_str()),
            Some(self.library.as_str()),
            self.module.as_deref(),
            Some(self.name.as_str()),
            Some(self.version.as_str()),
        ];
        for part in parts.into_iter().flatten() {
            if let Some(reason) = segment_problem(part) {
                return Err(CoregenError::InvalidIdentity {
                    identity: String::from(self.clone()),
                    reason: format!("part {part:?} {reason}"),
                });
            }
        }
        Ok(())
    }

    /// The CAPI-2 `name` field. The module, when present, is folded into the
    /// library part.
    pub fn versioned_name(&self) -> String {
        match &self.module {
            Some(module) => format!(
                "{}:{}.{}:{}:{}",
                self.vendor, self.library, module, self.name, self.version
            ),
            None => format!(
                "{}:{}:{}:{}",
                self.vendor, self.library, self.name, self.version
            ),
        }
    }
}

impl FromStr for Identity {
    type Err = CoregenError;

    /// Accepts `vendor:library:module:name:version` or
    /// `vendor:library:name:version`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value.split(':').collect::<Vec<_>>();
        let invalid = |reason: &str| CoregenError::InvalidIdentity {
            identity: value.to_string(),
            reason: reason.to_string(),
        };

        let identity = match parts.as_slice() {
            [vendor, library, module, name, version] => {
                Self::new(*vendor, *library, Some(*module), *name, *version)
            }
            [vendor, library, name, version] => Self::new(*vendor, *library, None, *name, *version),
            _ => return Err(invalid("expected 4 or 5 ':'-separated parts")),
        };
        identity.validate()?;
        Ok(identity)
    }
}

fn segment_problem(part: &str) -> Option<&'static str> {
    if part.trim().is_empty() {
        Some("must not be empty")
    } else if part.contains(':') {
        Some("must not contain ':'")
    } else if part.contains(['/', '\\']) {
        Some("must not contain a path separator")
    } else if part == "." || part == ".." {
        Some("must not be a relative directory reference")
    } else {
        None
    }
}

impl TryFrom<String> for Identity {
    type Error = CoregenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        match &value.module {
            Some(module) => format!(
                "{}:{}:{}:{}:{}",
                value.vendor, value.library, module, value.name, value.version
            ),
            None => value.versioned_name(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.versioned_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "systemVerilogSource")]
    SystemVerilogSource,
    #[serde(rename = "cppSource")]
    CppSource,
}

/// One entry of a fileset's `files` list. Includes render as
/// `<path>: {is_include_file: true}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEntry {
    Include(String),
    File(String),
}

impl FileEntry {
    pub fn path(&self) -> &str {
        match self {
            FileEntry::Include(path) | FileEntry::File(path) => path,
        }
    }

    pub fn is_include(&self) -> bool {
        matches!(self, FileEntry::Include(_))
    }
}

impl Serialize for FileEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FileEntry::File(path) => serializer.serialize_str(path),
            FileEntry::Include(path) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(path, &IncludeFlag)?;
                map.end()
            }
        }
    }
}

struct IncludeFlag;

impl Serialize for IncludeFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("is_include_file", &true)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fileset {
    pub files: Vec<FileEntry>,
    pub file_type: FileType,
}

impl Fileset {
    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(FileEntry::path).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Filesets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtl: Option<Fileset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonsynth: Option<Fileset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub default: i64,
}

impl Parameter {
    pub fn new(name: impl Into<String>, default: i64) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }

    pub fn assignment(&self) -> String {
        format!("{}={}", self.name, self.default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Targets {
    pub lint: LintTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintTarget {
    pub toplevel: String,
    pub filesets: Vec<String>,
    pub default_tool: String,
    pub tools: LintTool,
    pub parameters: Vec<String>,
}

/// Renders as `{<name>: {mode: ..., <name>_options: [...]}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintTool {
    pub name: String,
    pub mode: String,
    pub options: Vec<String>,
}

impl Serialize for LintTool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Settings<'a>(&'a LintTool);

        impl Serialize for Settings<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("mode", &self.0.mode)?;
                map.serialize_entry(&format!("{}_options", self.0.name), &self.0.options)?;
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &Settings(self))?;
        map.end()
    }
}

/// Upstream repository footer shared by every manifest in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub user: String,
    pub repo: String,
    pub version: String,
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            name: "github".to_string(),
            user: "bespoke-silicon-group".to_string(),
            repo: "basejump_stl".to_string(),
            version: "v0.0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    #[serde(rename = "CAPI=2")]
    pub capi: String,
    #[serde(rename = "name", serialize_with = "serialize_identity")]
    pub identity: Identity,
    pub description: String,
    pub filesets: Filesets,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_parameters"
    )]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Targets>,
    pub provider: Provider,
}

fn serialize_identity<S: Serializer>(identity: &Identity, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&identity.versioned_name())
}

fn serialize_parameters<S: Serializer>(
    parameters: &[Parameter],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    struct VlogParam;

    impl Serialize for VlogParam {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(2))?;
            map.serialize_entry("paramtype", "vlogparam")?;
            map.serialize_entry("datatype", "int")?;
            map.end()
        }
    }

    let mut map = serializer.serialize_map(Some(parameters.len()))?;
    for parameter in parameters {
        map.serialize_entry(&parameter.name, &VlogParam)?;
    }
    map.end()
}
