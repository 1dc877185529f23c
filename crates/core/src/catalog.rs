use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoregenError, Result};
use crate::model::{Identity, Parameter};

pub const VENDOR: &str = "bespoke-silicon-group";
pub const LIBRARY: &str = "basejump_stl";
pub const VERSION: &str = "0.0.1";
pub const DEFAULT_TECHNOLOGY: &str = "ultrascale_plus";

/// Synthesizable modules, in compile order.
pub const PRODUCTION_MODULES: &[&str] = &[
    "bsg_misc",
    "bsg_dataflow",
    "bsg_mem",
    "bsg_async",
    "bsg_fsb",
    "bsg_cache",
    "bsg_noc",
    "bsg_link",
    "bsg_tag",
    "bsg_clk_gen",
    "bsg_comm_link",
    "bsg_dmc",
    "bsg_math",
    "bsg_fpu",
];

/// Modules made entirely of test code.
pub const TEST_MODULES: &[&str] = &["bsg_test"];

pub fn hardened_module(technology: &str) -> String {
    format!("hard/{technology}")
}

/// One hand-described unit manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitSpec {
    pub identity: Identity,
    pub description: String,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

pub fn builtin_units() -> Vec<UnitSpec> {
    let width = || vec![Parameter::new("width_p", 8)];
    vec![
        misc_unit("bsg_abs", "Absolute value unit", &["bsg_abs.sv"], width()),
        misc_unit(
            "bsg_adder_cin",
            "Adder with carry-in",
            &["bsg_adder_cin.sv"],
            width(),
        ),
        misc_unit(
            "bsg_adder_one_hot",
            "Adder of two one-hot vectors",
            &["bsg_adder_one_hot.sv"],
            width(),
        ),
        misc_unit(
            "bsg_adder_ripple_carry",
            "Adder of two vectors",
            &["bsg_adder_ripple_carry.sv"],
            width(),
        ),
        misc_unit(
            "bsg_arb_fixed",
            "Fixed priority arbiter",
            &[
                "bsg_arb_fixed.sv",
                "bsg_priority_encode_one_hot_out.sv",
                "bsg_scan.sv",
            ],
            vec![Parameter::new("inputs_p", 8), Parameter::new("lo_to_hi_p", 1)],
        ),
    ]
}

fn misc_unit(
    name: &str,
    description: &str,
    sources: &[&str],
    parameters: Vec<Parameter>,
) -> UnitSpec {
    UnitSpec {
        identity: Identity::new(VENDOR, LIBRARY, Some("bsg_misc"), name, VERSION),
        description: description.to_string(),
        includes: vec!["bsg_misc/bsg_defines.sv".to_string()],
        packages: Vec::new(),
        sources: sources
            .iter()
            .map(|source| format!("bsg_misc/{source}"))
            .collect(),
        parameters,
    }
}

pub fn parse_unit_catalog(text: &str) -> Result<Vec<UnitSpec>> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_unit_catalog(path: &Path) -> Result<Vec<UnitSpec>> {
    let text = fs::read_to_string(path).map_err(|source| CoregenError::io(path, source))?;
    parse_unit_catalog(&text)
}
