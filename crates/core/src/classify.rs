use crate::model::ModuleInventory;

/// Category a single path falls into. The variant order mirrors rule
/// precedence: earlier rules win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Nonsynth,
    Include,
    Package,
    Secondary,
    Source,
    Unclassified,
}

/// Suffix and segment vocabularies driving classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRules {
    pub nonsynth_segments: Vec<String>,
    pub include_suffixes: Vec<String>,
    pub package_suffixes: Vec<String>,
    pub secondary_suffixes: Vec<String>,
    pub secondary_include_suffixes: Vec<String>,
    pub source_suffixes: Vec<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            nonsynth_segments: owned(&["nonsynth", "test", "tests", "testing"]),
            include_suffixes: owned(&[".svh", ".vh", "_defines.sv", "_defines.v"]),
            package_suffixes: owned(&["_pkg.sv", "_pkg.v"]),
            secondary_suffixes: owned(&[".cpp", ".cc", ".c", ".h", ".hpp"]),
            secondary_include_suffixes: owned(&[".h", ".hpp"]),
            source_suffixes: owned(&[".sv", ".v"]),
        }
    }
}

impl ClassifierRules {
    /// Applies every rule in precedence order.
    pub fn class_of(&self, path: &str) -> FileClass {
        if self.is_nonsynth_path(path) {
            return FileClass::Nonsynth;
        }
        self.kind_of(path)
    }

    /// Applies the name-based rules only, skipping the non-synthesizable
    /// subtree check.
    pub fn kind_of(&self, path: &str) -> FileClass {
        if ends_with_any(path, &self.include_suffixes) {
            FileClass::Include
        } else if ends_with_any(path, &self.package_suffixes) {
            FileClass::Package
        } else if ends_with_any(path, &self.secondary_suffixes) {
            FileClass::Secondary
        } else if ends_with_any(path, &self.source_suffixes) {
            FileClass::Source
        } else {
            FileClass::Unclassified
        }
    }

    /// True when a directory segment of `path` exactly equals a
    /// non-synthesizable marker. The file name itself is not considered.
    pub fn is_nonsynth_path(&self, path: &str) -> bool {
        let mut segments = path.split('/').collect::<Vec<_>>();
        segments.pop();
        segments.iter().any(|segment| {
            self.nonsynth_segments
                .iter()
                .any(|marker| marker.as_str() == *segment)
        })
    }

    pub fn is_secondary(&self, path: &str) -> bool {
        ends_with_any(path, &self.secondary_suffixes)
    }

    pub fn is_secondary_include(&self, path: &str) -> bool {
        ends_with_any(path, &self.secondary_include_suffixes)
    }
}

/// Paths split by the name-based rules, with secondary sources folded in
/// next to their primary counterparts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindSplit {
    pub includes: Vec<String>,
    pub packages: Vec<String>,
    pub sources: Vec<String>,
    pub unclassified: Vec<String>,
}

pub fn classify(root: &str, paths: &[String]) -> ModuleInventory {
    classify_with(&ClassifierRules::default(), root, paths)
}

pub fn classify_with(rules: &ClassifierRules, root: &str, paths: &[String]) -> ModuleInventory {
    let mut inventory = ModuleInventory::new(root);
    for path in paths {
        let bucket = match rules.class_of(path) {
            FileClass::Nonsynth | FileClass::Secondary => &mut inventory.nonsynth,
            FileClass::Include => &mut inventory.includes,
            FileClass::Package => &mut inventory.packages,
            FileClass::Source => &mut inventory.sources,
            FileClass::Unclassified => &mut inventory.unclassified,
        };
        bucket.push(path.clone());
    }
    inventory
}

/// Re-splits already non-synthesizable paths so they can feed a manifest.
/// Secondary headers count as includes and secondary sources as sources.
pub fn split_by_kind(rules: &ClassifierRules, paths: &[String]) -> KindSplit {
    let mut split = KindSplit::default();
    for path in paths {
        let bucket = match rules.kind_of(path) {
            FileClass::Include => &mut split.includes,
            FileClass::Secondary if rules.is_secondary_include(path) => &mut split.includes,
            FileClass::Package => &mut split.packages,
            FileClass::Secondary | FileClass::Source => &mut split.sources,
            FileClass::Nonsynth | FileClass::Unclassified => &mut split.unclassified,
        };
        bucket.push(path.clone());
    }
    split
}

fn ends_with_any(value: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| value.ends_with(suffix.as_str()))
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
