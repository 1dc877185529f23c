use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::aggregate::{aggregate_with, Selector};
use crate::catalog::{
    hardened_module, UnitSpec, DEFAULT_TECHNOLOGY, LIBRARY, PRODUCTION_MODULES, TEST_MODULES,
    VENDOR, VERSION,
};
use crate::classify::ClassifierRules;
use crate::emit::emit;
use crate::error::{CoregenError, Result};
use crate::manifest::{FileGroups, ManifestBuilder};
use crate::model::{Identity, Manifest, ModuleInventory, Provider};
use crate::scan::{scan_modules, ExcludeMatcher};

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub cores_root: PathBuf,
    pub preview: bool,
    pub strict: bool,
    pub excludes: Vec<String>,
    pub technology: String,
    pub provider: Provider,
    pub rules: ClassifierRules,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            cores_root: PathBuf::from("cores"),
            preview: false,
            strict: false,
            excludes: Vec::new(),
            technology: DEFAULT_TECHNOLOGY.to_string(),
            provider: Provider::default(),
            rules: ClassifierRules::default(),
        }
    }
}

impl GenerateOptions {
    fn builder(&self) -> ManifestBuilder {
        ManifestBuilder::new(self.rules.clone(), self.provider.clone())
    }
}

/// Group manifests ready to emit, plus every path no rule recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub manifests: Vec<Manifest>,
    pub unclassified: Vec<String>,
}

pub fn build_unit_manifests(units: &[UnitSpec], options: &GenerateOptions) -> Vec<Manifest> {
    let builder = options.builder();
    units
        .iter()
        .map(|unit| {
            builder.build(
                &unit.identity,
                &unit.description,
                FileGroups::new(&unit.includes, &unit.packages, &unit.sources),
                &unit.parameters,
            )
        })
        .collect()
}

pub fn generate_units(units: &[UnitSpec], options: &GenerateOptions) -> Result<Vec<PathBuf>> {
    let manifests = build_unit_manifests(units, options);
    emit_all(&manifests, options)
}

/// Scans the source tree and builds the production, test and hardened
/// manifests without writing anything.
pub fn plan_groups(source_root: &Path, options: &GenerateOptions) -> Result<GroupPlan> {
    let hard_identity = Identity::new(VENDOR, LIBRARY, Some("hard"), &options.technology, VERSION);
    hard_identity.validate()?;

    let excludes = ExcludeMatcher::new(&options.excludes);
    let rules = &options.rules;

    let production = scan_modules(source_root, &owned(PRODUCTION_MODULES), rules, &excludes)?;
    let test_only = scan_modules(source_root, &owned(TEST_MODULES), rules, &excludes)?;
    let hardened = scan_modules(
        source_root,
        &[hardened_module(&options.technology)],
        rules,
        &excludes,
    )?;

    let rtl = aggregate_with(rules, &production, Selector::Production);
    let nonsynth = aggregate_with(rules, &production, Selector::Test)
        .merge(aggregate_with(rules, &test_only, Selector::All))
        .merge(aggregate_with(rules, &hardened, Selector::Test));
    let hard = aggregate_with(rules, &hardened, Selector::Production);
    let unclassified = [
        rtl.unclassified.as_slice(),
        nonsynth.unclassified.as_slice(),
        hard.unclassified.as_slice(),
    ]
    .concat();

    let builder = options.builder();
    let groups = [
        (
            Identity::new(VENDOR, LIBRARY, None, "rtl", VERSION),
            "Synthesizable basejump_stl RTL".to_string(),
            &rtl,
        ),
        (
            Identity::new(VENDOR, LIBRARY, None, "nonsynth", VERSION),
            "Non-synthesizable basejump_stl models and testbenches".to_string(),
            &nonsynth,
        ),
        (
            hard_identity,
            format!("Hardened basejump_stl views for {}", options.technology),
            &hard,
        ),
    ];

    let manifests = groups
        .iter()
        .map(|(identity, description, files)| {
            builder.build(identity, description, files.file_groups(), &[])
        })
        .collect();

    Ok(GroupPlan {
        manifests,
        unclassified,
    })
}

/// Plans the group manifests, reports unclassified content, then writes.
/// In strict mode any unclassified path fails the run before output.
pub fn generate_groups(source_root: &Path, options: &GenerateOptions) -> Result<Vec<PathBuf>> {
    let plan = plan_groups(source_root, options)?;
    check_unclassified(&plan.unclassified, options.strict)?;
    emit_all(&plan.manifests, options)
}

pub fn collect_inventory(
    source_root: &Path,
    modules: &[String],
    options: &GenerateOptions,
) -> Result<Vec<ModuleInventory>> {
    let modules = if modules.is_empty() {
        default_modules(&options.technology)
    } else {
        modules.to_vec()
    };
    let excludes = ExcludeMatcher::new(&options.excludes);
    let inventories = scan_modules(source_root, &modules, &options.rules, &excludes)?;
    for inventory in &inventories {
        info!(
            "{}: {} file(s), {} unclassified",
            inventory.root,
            inventory.len(),
            inventory.unclassified.len()
        );
    }
    Ok(inventories)
}

pub fn default_modules(technology: &str) -> Vec<String> {
    let mut modules = owned(PRODUCTION_MODULES);
    modules.extend(owned(TEST_MODULES));
    modules.push(hardened_module(technology));
    modules
}

pub fn emit_all(manifests: &[Manifest], options: &GenerateOptions) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for manifest in manifests {
        if let Some(path) = emit(manifest, &options.cores_root, options.preview)? {
            written.push(path);
        }
    }
    Ok(written)
}

fn check_unclassified(unclassified: &[String], strict: bool) -> Result<()> {
    for path in unclassified {
        warn!("unclassified file left out of generated manifests: {path}");
    }
    if strict && !unclassified.is_empty() {
        return Err(CoregenError::Unclassified(unclassified.to_vec()));
    }
    Ok(())
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
