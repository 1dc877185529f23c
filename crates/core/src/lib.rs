pub mod aggregate;
pub mod catalog;
pub mod classify;
pub mod emit;
pub mod error;
pub mod generate;
pub mod manifest;
pub mod model;
pub mod scan;

pub use aggregate::{aggregate, aggregate_with, Aggregate, Selector};
pub use catalog::{
    builtin_units, hardened_module, load_unit_catalog, parse_unit_catalog, UnitSpec,
    DEFAULT_TECHNOLOGY, PRODUCTION_MODULES, TEST_MODULES,
};
pub use classify::{classify, classify_with, split_by_kind, ClassifierRules, FileClass, KindSplit};
pub use emit::{emit, output_path, render_manifest, write_manifest_file, write_preview};
pub use error::{CoregenError, Result};
pub use generate::{
    build_unit_manifests, collect_inventory, default_modules, emit_all, generate_groups,
    generate_units, plan_groups, GenerateOptions, GroupPlan,
};
pub use manifest::{build_manifest, FileGroups, ManifestBuilder};
pub use model::{
    FileEntry, FileType, Fileset, Filesets, Identity, LintTarget, LintTool, Manifest,
    ModuleInventory, Parameter, Provider, Targets,
};
pub use scan::{list_module_files, scan_module, scan_modules, ExcludeMatcher};
