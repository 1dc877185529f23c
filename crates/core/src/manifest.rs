//! Assembles CAPI-2 manifests from classified file lists.
//!
//! The builder never reorders its inputs. Within every fileset the files
//! appear as all includes, then all packages, then all sources, so that
//! declarations are visible before anything that depends on them.

use crate::classify::ClassifierRules;
use crate::model::{
    FileEntry, FileType, Fileset, Filesets, Identity, LintTarget, LintTool, Manifest, Parameter,
    Provider, Targets,
};

pub const RTL_FILESET: &str = "rtl";
pub const LINT_TOOL: &str = "verilator";
pub const LINT_MODE: &str = "lint-only";
pub const LINT_OPTIONS: &[&str] = &["-Wwarn-lint", "-Wwarn-style", "-Wno-fatal"];

/// The three ordered input lists of a manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileGroups<'a> {
    pub includes: &'a [String],
    pub packages: &'a [String],
    pub sources: &'a [String],
}

impl<'a> FileGroups<'a> {
    pub fn new(includes: &'a [String], packages: &'a [String], sources: &'a [String]) -> Self {
        Self {
            includes,
            packages,
            sources,
        }
    }

    /// Every file tagged with its include flag, in declaration order.
    fn ordered(self) -> impl Iterator<Item = FileEntry> + 'a {
        let Self {
            includes,
            packages,
            sources,
        } = self;
        let includes = includes.iter().cloned().map(FileEntry::Include);
        let rest = packages
            .iter()
            .chain(sources.iter())
            .cloned()
            .map(FileEntry::File);
        includes.chain(rest)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManifestBuilder {
    rules: ClassifierRules,
    provider: Provider,
}

impl ManifestBuilder {
    pub fn new(rules: ClassifierRules, provider: Provider) -> Self {
        Self { rules, provider }
    }

    pub fn build(
        &self,
        identity: &Identity,
        description: &str,
        files: FileGroups<'_>,
        parameters: &[Parameter],
    ) -> Manifest {
        let filesets = self.filesets(files);
        let targets = lint_targets(&identity.name, &filesets, parameters);
        Manifest {
            capi: String::new(),
            identity: identity.clone(),
            description: description.to_string(),
            filesets,
            parameters: parameters.to_vec(),
            targets,
            provider: self.provider.clone(),
        }
    }

    fn filesets(&self, files: FileGroups<'_>) -> Filesets {
        let (secondary, primary): (Vec<_>, Vec<_>) = files
            .ordered()
            .partition(|entry| self.rules.is_secondary(entry.path()));

        Filesets {
            rtl: non_empty(primary, FileType::SystemVerilogSource),
            nonsynth: non_empty(secondary, FileType::CppSource),
        }
    }
}

pub fn build_manifest(
    identity: &Identity,
    description: &str,
    files: FileGroups<'_>,
    parameters: &[Parameter],
) -> Manifest {
    ManifestBuilder::default().build(identity, description, files, parameters)
}

fn non_empty(files: Vec<FileEntry>, file_type: FileType) -> Option<Fileset> {
    if files.is_empty() {
        None
    } else {
        Some(Fileset { files, file_type })
    }
}

/// The lint target only ever references the rtl fileset, so a manifest
/// without one gets no target even when it carries parameters.
fn lint_targets(toplevel: &str, filesets: &Filesets, parameters: &[Parameter]) -> Option<Targets> {
    if parameters.is_empty() || filesets.rtl.is_none() {
        return None;
    }

    Some(Targets {
        lint: LintTarget {
            toplevel: toplevel.to_string(),
            filesets: vec![RTL_FILESET.to_string()],
            default_tool: LINT_TOOL.to_string(),
            tools: LintTool {
                name: LINT_TOOL.to_string(),
                mode: LINT_MODE.to_string(),
                options: LINT_OPTIONS.iter().map(|option| option.to_string()).collect(),
            },
            parameters: parameters.iter().map(Parameter::assignment).collect(),
        },
    })
}
