//! Manifest serialization and output.
//!
//! Layout: mappings indent by 2, sequence dashes sit 2 columns inside their
//! parent key with item content 4 columns in, and a mapping inside a
//! sequence starts on the dash line.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{CoregenError, Result};
use crate::model::{Identity, Manifest};

const MAPPING_INDENT: usize = 2;
const SEQUENCE_OFFSET: usize = 2;

pub fn render_manifest(manifest: &Manifest) -> Result<String> {
    let failed = |source: serde_yaml::Error| CoregenError::Serialize {
        name: manifest.identity.versioned_name(),
        source,
    };
    let value = serde_yaml::to_value(manifest).map_err(failed)?;

    let mut out = String::new();
    match &value {
        Value::Mapping(mapping) => write_mapping(&mut out, mapping, 0, None).map_err(failed)?,
        other => {
            out.push_str(&scalar(other).map_err(failed)?);
            out.push('\n');
        }
    }
    Ok(out)
}

/// `<cores_root>/[<module>/]<name>.core`
pub fn output_path(cores_root: &Path, identity: &Identity) -> PathBuf {
    let mut path = cores_root.to_path_buf();
    if let Some(module) = &identity.module {
        path.push(module);
    }
    path.push(format!("{}.core", identity.name));
    path
}

/// Writes the manifest to stdout when `preview` is set, otherwise to its
/// derived path under `cores_root`. Returns the written path.
pub fn emit(manifest: &Manifest, cores_root: &Path, preview: bool) -> Result<Option<PathBuf>> {
    if preview {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_preview(manifest, &mut handle)?;
        return Ok(None);
    }
    write_manifest_file(manifest, cores_root).map(Some)
}

/// Writes one YAML document, `---` first so repeated previews form a stream.
pub fn write_preview<W: Write>(manifest: &Manifest, writer: &mut W) -> Result<()> {
    let rendered = render_manifest(manifest)?;
    writer
        .write_all(format!("---\n{rendered}").as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|source| CoregenError::io("<stdout>", source))
}

/// Replaces the target file atomically: the document goes to a temporary
/// file in the same directory which is then renamed over the target.
pub fn write_manifest_file(manifest: &Manifest, cores_root: &Path) -> Result<PathBuf> {
    manifest.identity.validate()?;
    let rendered = render_manifest(manifest)?;
    let target = output_path(cores_root, &manifest.identity);
    let dir = target.parent().unwrap_or(cores_root);

    fs::create_dir_all(dir).map_err(|source| CoregenError::io(dir, source))?;

    let mut staged = NamedTempFile::new_in(dir).map_err(|source| CoregenError::io(dir, source))?;
    staged
        .write_all(rendered.as_bytes())
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|source| CoregenError::io(staged.path(), source))?;
    staged
        .persist(&target)
        .map_err(|err| CoregenError::io(&target, err.error))?;

    info!("wrote {}", target.display());
    Ok(target)
}

fn write_mapping(
    out: &mut String,
    mapping: &Mapping,
    indent: usize,
    first_prefix: Option<&str>,
) -> serde_yaml::Result<()> {
    for (index, (key, value)) in mapping.iter().enumerate() {
        match first_prefix {
            Some(prefix) if index == 0 => out.push_str(prefix),
            _ => push_indent(out, indent),
        }
        out.push_str(&scalar(key)?);
        out.push(':');

        match value {
            Value::Mapping(inner) if !inner.is_empty() => {
                out.push('\n');
                write_mapping(out, inner, indent + MAPPING_INDENT, None)?;
            }
            Value::Sequence(items) if !items.is_empty() => {
                out.push('\n');
                write_sequence(out, items, indent + SEQUENCE_OFFSET)?;
            }
            other => {
                out.push(' ');
                out.push_str(&scalar(other)?);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn write_sequence(out: &mut String, items: &[Value], dash_indent: usize) -> serde_yaml::Result<()> {
    let prefix = format!("{}- ", " ".repeat(dash_indent));
    let content_indent = prefix.len();

    for item in items {
        match item {
            Value::Mapping(inner) if !inner.is_empty() => {
                write_mapping(out, inner, content_indent, Some(&prefix))?;
            }
            Value::Sequence(inner) if !inner.is_empty() => {
                out.push_str(&prefix);
                out.push('\n');
                write_sequence(out, inner, content_indent + SEQUENCE_OFFSET)?;
            }
            other => {
                out.push_str(&prefix);
                out.push_str(&scalar(other)?);
                out.push('\n');
            }
        }
    }
    Ok(())
}

/// Single-line rendering of a leaf. Scalars that would need a block style
/// fall back to a double-quoted JSON string, which YAML accepts verbatim.
fn scalar(value: &Value) -> serde_yaml::Result<String> {
    match value {
        Value::Mapping(_) => Ok("{}".to_string()),
        Value::Sequence(_) => Ok("[]".to_string()),
        Value::String(text) if text.contains('\n') => {
            serde_json::to_string(text).map_err(<serde_yaml::Error as serde::ser::Error>::custom)
        }
        other => serde_yaml::to_string(other)
            .map(|rendered| rendered.trim_end_matches('\n').to_string()),
    }
}

fn push_indent(out: &mut String, width: usize) {
    out.extend(std::iter::repeat(' ').take(width));
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_yaml::Value;
    use tempfile::TempDir;

    use super::{emit, output_path, render_manifest, scalar, write_manifest_file, write_preview};
    use crate::error::CoregenError;
    use crate::manifest::{build_manifest, FileGroups};
    use crate::model::{Identity, Manifest, Parameter, CAPI_KEY};

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn abs_manifest() -> Manifest {
        let identity: Identity = "bespoke-silicon-group:basejump_stl:bsg_misc:bsg_abs:0.0.1"
            .parse()
            .expect("identity");
        build_manifest(
            &identity,
            "Absolute value unit",
            FileGroups::new(
                &owned(&["bsg_misc/bsg_defines.sv"]),
                &[],
                &owned(&["bsg_misc/bsg_abs.sv"]),
            ),
            &[Parameter::new("width_p", 8)],
        )
    }

    fn parse(text: &str) -> Value {
        serde_yaml::from_str(text).expect("valid yaml")
    }

    #[test]
    fn renders_expected_document_shape() {
        let text = render_manifest(&abs_manifest()).expect("render");
        let doc = parse(&text);

        assert_eq!(doc[CAPI_KEY], Value::String(String::new()));
        assert_eq!(
            doc["name"].as_str(),
            Some("bespoke-silicon-group:basejump_stl.bsg_misc:bsg_abs:0.0.1")
        );
        assert_eq!(doc["description"].as_str(), Some("Absolute value unit"));

        let files = doc["filesets"]["rtl"]["files"]
            .as_sequence()
            .expect("files list");
        assert_eq!(files.len(), 2);
        assert_eq!(
            files[0]["bsg_misc/bsg_defines.sv"]["is_include_file"].as_bool(),
            Some(true)
        );
        assert_eq!(files[1].as_str(), Some("bsg_misc/bsg_abs.sv"));
        assert_eq!(
            doc["filesets"]["rtl"]["file_type"].as_str(),
            Some("systemVerilogSource")
        );
        assert!(doc["filesets"].get("nonsynth").is_none());

        assert_eq!(doc["parameters"]["width_p"]["paramtype"].as_str(), Some("vlogparam"));
        assert_eq!(doc["parameters"]["width_p"]["datatype"].as_str(), Some("int"));

        let lint = &doc["targets"]["lint"];
        assert_eq!(lint["toplevel"].as_str(), Some("bsg_abs"));
        assert_eq!(lint["default_tool"].as_str(), Some("verilator"));
        assert_eq!(lint["tools"]["verilator"]["mode"].as_str(), Some("lint-only"));
        assert_eq!(
            lint["tools"]["verilator"]["verilator_options"][2].as_str(),
            Some("-Wno-fatal")
        );
        assert_eq!(lint["parameters"][0].as_str(), Some("width_p=8"));

        assert_eq!(doc["provider"]["user"].as_str(), Some("bespoke-silicon-group"));
        assert_eq!(doc["provider"]["version"].as_str(), Some("v0.0.1"));
    }

    #[test]
    fn uses_offset_sequence_indentation() {
        let text = render_manifest(&abs_manifest()).expect("render");
        assert!(text.starts_with("CAPI=2: ''\n"));
        assert!(text.contains("filesets:\n  rtl:\n    files:\n      - bsg_misc/bsg_defines.sv:\n          is_include_file: true\n      - bsg_misc/bsg_abs.sv\n"));
        assert!(text.contains("    filesets:\n      - rtl\n"));
        assert!(text.lines().all(|line| line.len() <= 120));
    }

    #[test]
    fn keeps_top_level_key_order() {
        let text = render_manifest(&abs_manifest()).expect("render");
        let keys = text
            .lines()
            .filter(|line| !line.starts_with(' '))
            .map(|line| line.split(':').next().unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec!["CAPI=2", "name", "description", "filesets", "parameters", "targets", "provider"]
        );
    }

    #[test]
    fn rendering_is_byte_identical_across_runs() {
        let first = render_manifest(&abs_manifest()).expect("render");
        let second = render_manifest(&abs_manifest()).expect("render");
        assert_eq!(first, second);
    }

    #[test]
    fn multiline_scalars_stay_valid() {
        let mut manifest = abs_manifest();
        manifest.description = "line one\nline two".to_string();
        let text = render_manifest(&manifest).expect("render");
        assert_eq!(parse(&text)["description"].as_str(), Some("line one\nline two"));
    }

    #[test]
    fn leaf_scalars_render_or_report_errors() {
        assert_eq!(scalar(&Value::Null).expect("null"), "null");
        assert_eq!(scalar(&Value::Bool(true)).expect("bool"), "true");
        assert_eq!(scalar(&Value::from(8)).expect("number"), "8");
        assert_eq!(scalar(&Value::from("-Wno-fatal")).expect("string"), "-Wno-fatal");
        assert_eq!(scalar(&Value::from("a\nb")).expect("multiline"), "\"a\\nb\"");
        assert_eq!(scalar(&Value::Sequence(Vec::new())).expect("empty"), "[]");
    }

    #[test]
    fn refuses_to_write_outside_cores_root() {
        let tmp = TempDir::new().expect("tempdir");
        let cores = tmp.path().join("cores");
        let mut manifest = abs_manifest();
        manifest.identity = Identity::new("v", "l", Some(".."), "escaped", "0.0.1");

        let err = write_manifest_file(&manifest, &cores).expect_err("escaping identity");
        assert!(matches!(err, CoregenError::InvalidIdentity { .. }));
        assert!(!tmp.path().join("escaped.core").exists());
        assert!(!cores.exists());
    }

    #[test]
    fn derives_output_path_from_identity() {
        let root = std::path::Path::new("cores");
        let unit: Identity = "v:lib:bsg_misc:bsg_abs:0.0.1".parse().expect("identity");
        assert_eq!(output_path(root, &unit), root.join("bsg_misc").join("bsg_abs.core"));
        let group: Identity = "v:lib:rtl:0.0.1".parse().expect("identity");
        assert_eq!(output_path(root, &group), root.join("rtl.core"));
    }

    #[test]
    fn writes_and_overwrites_manifest_file() {
        let tmp = TempDir::new().expect("tempdir");
        let manifest = abs_manifest();

        fs::create_dir_all(tmp.path().join("bsg_misc")).expect("mkdir");
        fs::write(tmp.path().join("bsg_misc/bsg_abs.core"), "stale").expect("seed");

        let written = emit(&manifest, tmp.path(), false)
            .expect("emit")
            .expect("written path");
        assert_eq!(written, tmp.path().join("bsg_misc").join("bsg_abs.core"));

        let contents = fs::read_to_string(&written).expect("read back");
        assert_eq!(contents, render_manifest(&manifest).expect("render"));

        let again = emit(&manifest, tmp.path(), false).expect("emit twice");
        assert_eq!(again, Some(written.clone()));
        let entries = fs::read_dir(tmp.path().join("bsg_misc"))
            .expect("list")
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn preview_writes_document_to_writer() {
        let mut buffer = Vec::new();
        write_preview(&abs_manifest(), &mut buffer).expect("preview");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.starts_with("---\nCAPI=2: ''\n"));
    }
}
