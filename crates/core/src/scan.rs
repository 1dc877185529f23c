use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::classify::{classify_with, ClassifierRules};
use crate::error::{CoregenError, Result};
use crate::model::ModuleInventory;

/// Path filter applied while walking. Globs match the `/`-separated path
/// relative to the source root; patterns without glob metacharacters match
/// as substrings. Matching is case-sensitive in both forms, like the HDL
/// tools that resolve these paths.
#[derive(Debug, Clone, Default)]
pub struct ExcludeMatcher {
    globs: Option<GlobSet>,
    fragments: Vec<String>,
}

impl ExcludeMatcher {
    pub fn new(patterns: &[String]) -> Self {
        let mut globs = GlobSetBuilder::new();
        let mut fragments = Vec::new();

        for pattern in patterns.iter().map(|pattern| pattern.trim()) {
            if pattern.is_empty() {
                continue;
            }
            match exclude_glob(pattern) {
                Some(glob) => {
                    globs.add(glob);
                }
                None => fragments.push(pattern.to_string()),
            }
        }

        let globs = globs
            .build()
            .map_err(|err| warn!("exclude globs disabled: {err}"))
            .ok();
        Self { globs, fragments }
    }

    pub fn is_excluded(&self, relative: &str) -> bool {
        self.globs
            .as_ref()
            .is_some_and(|globs| globs.is_match(relative))
            || self
                .fragments
                .iter()
                .any(|fragment| relative.contains(fragment.as_str()))
    }
}

/// `None` means the pattern is matched as a plain fragment, either because it
/// has no metacharacters or because it does not compile as a glob.
fn exclude_glob(pattern: &str) -> Option<Glob> {
    let has_meta = pattern.contains(['*', '?', '[', ']', '{', '}']);
    if !has_meta {
        return None;
    }
    Glob::new(pattern)
        .map_err(|err| {
            warn!("exclude pattern '{pattern}' is not a glob ({err}); matching it as text")
        })
        .ok()
}

pub fn ensure_source_root(source_root: &Path) -> Result<()> {
    if source_root.is_dir() {
        Ok(())
    } else {
        Err(CoregenError::MissingSourceRoot(source_root.to_path_buf()))
    }
}

/// Lists every regular file under `source_root/module`, as `/`-separated
/// paths relative to `source_root`, sorted by walk order with siblings in
/// file-name order.
pub fn list_module_files(
    source_root: &Path,
    module: &str,
    excludes: &ExcludeMatcher,
) -> Result<Vec<String>> {
    let module_dir = source_root.join(module);
    if !module_dir.is_dir() {
        return Err(CoregenError::MissingModule(module.to_string()));
    }

    let walker = WalkDir::new(&module_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            match relative_path(source_root, entry.path()) {
                Some(relative) => !excludes.is_excluded(&relative),
                None => true,
            }
        });

    let mut files = Vec::new();
    for item in walker {
        let entry = item.map_err(|source| CoregenError::Walk {
            path: module_dir.clone(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(relative) = relative_path(source_root, entry.path()) {
            files.push(relative);
        }
    }
    Ok(files)
}

pub fn scan_module(
    source_root: &Path,
    module: &str,
    rules: &ClassifierRules,
    excludes: &ExcludeMatcher,
) -> Result<ModuleInventory> {
    let files = list_module_files(source_root, module, excludes)?;
    let inventory = classify_with(rules, module, &files);
    debug!(
        "scanned {module}: {} include(s), {} package(s), {} source(s), {} nonsynth, {} unclassified",
        inventory.includes.len(),
        inventory.packages.len(),
        inventory.sources.len(),
        inventory.nonsynth.len(),
        inventory.unclassified.len()
    );
    Ok(inventory)
}

/// Scans modules in the given order. The first failure aborts the scan.
pub fn scan_modules(
    source_root: &Path,
    modules: &[String],
    rules: &ClassifierRules,
    excludes: &ExcludeMatcher,
) -> Result<Vec<ModuleInventory>> {
    ensure_source_root(source_root)?;
    modules
        .iter()
        .map(|module| scan_module(source_root, module, rules, excludes))
        .collect()
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::{list_module_files, scan_module, scan_modules, ExcludeMatcher};
    use crate::classify::ClassifierRules;
    use crate::error::CoregenError;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "").expect("write");
    }

    #[test]
    fn exclude_matcher_matches_glob_and_substring() {
        let matcher = ExcludeMatcher::new(&[
            "**/*.bak".to_string(),
            "[".to_string(),
            "obj_dir".to_string(),
        ]);

        assert!(matcher.is_excluded("bsg_misc/old.bak"));
        assert!(matcher.is_excluded("bsg_misc/obj_dir/Vtop.cpp"));
        assert!(matcher.is_excluded("bsg_misc/[weird].sv"));
        assert!(!matcher.is_excluded("bsg_misc/bsg_abs.sv"));
    }

    #[test]
    fn exclude_matching_is_case_sensitive() {
        let matcher = ExcludeMatcher::new(&["obj_dir".to_string(), "**/*.BAK".to_string()]);

        assert!(matcher.is_excluded("bsg_misc/obj_dir/Vtop.cpp"));
        assert!(!matcher.is_excluded("bsg_misc/OBJ_DIR/Vtop.cpp"));
        assert!(matcher.is_excluded("bsg_misc/old.BAK"));
        assert!(!matcher.is_excluded("bsg_misc/old.bak"));
    }

    #[test]
    fn blank_patterns_exclude_nothing() {
        let matcher = ExcludeMatcher::new(&["  ".to_string(), String::new()]);
        assert!(!matcher.is_excluded("bsg_misc/bsg_abs.sv"));
    }

    #[test]
    fn lists_files_relative_to_source_root_in_name_order() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "bsg_misc/bsg_b.sv");
        touch(tmp.path(), "bsg_misc/bsg_a.sv");
        touch(tmp.path(), "bsg_misc/nonsynth/tb.sv");
        touch(tmp.path(), "bsg_mem/bsg_mem.sv");

        let files =
            list_module_files(tmp.path(), "bsg_misc", &ExcludeMatcher::default()).expect("list");
        assert_eq!(
            files,
            vec![
                "bsg_misc/bsg_a.sv".to_string(),
                "bsg_misc/bsg_b.sv".to_string(),
                "bsg_misc/nonsynth/tb.sv".to_string(),
            ]
        );
    }

    #[test]
    fn excluded_directories_are_pruned() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "bsg_misc/bsg_a.sv");
        touch(tmp.path(), "bsg_misc/obj_dir/Vbsg_a.cpp");

        let excludes = ExcludeMatcher::new(&["bsg_misc/obj_dir".to_string()]);
        let files = list_module_files(tmp.path(), "bsg_misc", &excludes).expect("list");
        assert_eq!(files, vec!["bsg_misc/bsg_a.sv".to_string()]);
    }

    #[test]
    fn scan_module_classifies_nested_paths() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "hard/ultrascale_plus/bsg_mem/bsg_mem_1rw_sync.sv");
        touch(tmp.path(), "hard/ultrascale_plus/README.md");

        let inventory = scan_module(
            tmp.path(),
            "hard/ultrascale_plus",
            &ClassifierRules::default(),
            &ExcludeMatcher::default(),
        )
        .expect("scan");
        assert_eq!(inventory.root, "hard/ultrascale_plus");
        assert_eq!(
            inventory.sources,
            vec!["hard/ultrascale_plus/bsg_mem/bsg_mem_1rw_sync.sv".to_string()]
        );
        assert_eq!(
            inventory.unclassified,
            vec!["hard/ultrascale_plus/README.md".to_string()]
        );
    }

    #[test]
    fn missing_source_root_is_fatal() {
        let tmp = TempDir::new().expect("tempdir");
        let missing = tmp.path().join("nope");
        let err = scan_modules(
            &missing,
            &["bsg_misc".to_string()],
            &ClassifierRules::default(),
            &ExcludeMatcher::default(),
        )
        .expect_err("missing root");
        assert!(matches!(err, CoregenError::MissingSourceRoot(_)));
    }

    #[test]
    fn missing_module_is_fatal() {
        let tmp = TempDir::new().expect("tempdir");
        touch(tmp.path(), "bsg_misc/bsg_a.sv");
        let err = scan_modules(
            tmp.path(),
            &["bsg_misc".to_string(), "bsg_noc".to_string()],
            &ClassifierRules::default(),
            &ExcludeMatcher::default(),
        )
        .expect_err("missing module");
        assert!(matches!(err, CoregenError::MissingModule(ref name) if name == "bsg_noc"));
    }
}
