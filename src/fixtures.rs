//! On-disk test corpus loading.
//!
//! Each case lives in its own directory under `tests/programs/` with a
//! `program.fern` source file and a `case.yaml` spec. Specs carry a default
//! expectation plus optional per-backend overrides for the places where the
//! two backends diverge on purpose.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseClass {
    /// Runs to completion; `expected.value`/`stdout_file` are checked.
    RuntimeSuccess,
    /// Fails in the lexer/parser before any backend runs.
    FrontendError,
    /// Compiling or running fails; `expected.error_contains` is checked.
    RuntimeError,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExpectedOutcome {
    /// `inspect()` rendering of the final expression value.
    #[serde(default)]
    pub value: Option<String>,
    /// File holding the expected `puts` output, one line per call argument.
    #[serde(default)]
    pub stdout_file: Option<String>,
    /// Substring the error message must contain.
    #[serde(default)]
    pub error_contains: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendOverride {
    pub class: CaseClass,
    #[serde(default)]
    pub expected: ExpectedOutcome,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseSpec {
    pub class: CaseClass,
    #[serde(default)]
    pub expected: ExpectedOutcome,
    #[serde(default)]
    pub interpreter: Option<BackendOverride>,
    #[serde(default)]
    pub vm: Option<BackendOverride>,
}

impl CaseSpec {
    /// Expectation for a backend, with its override applied if present.
    pub fn for_backend(&self, backend: &str) -> (CaseClass, &ExpectedOutcome) {
        let overridden = match backend {
            "interpreter" => self.interpreter.as_ref(),
            "vm" => self.vm.as_ref(),
            _ => None,
        };
        match overridden {
            Some(entry) => (entry.class, &entry.expected),
            None => (self.class, &self.expected),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub dir: PathBuf,
    pub program_path: PathBuf,
    pub spec: CaseSpec,
}

impl Case {
    pub fn read_text(&self, relative_path: &str) -> Result<String> {
        fs::read_to_string(self.dir.join(relative_path))
            .with_context(|| format!("Reading {} fixture file {}", self.name, relative_path))
    }
}

pub fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}

pub fn load_cases(programs_dir: &Path) -> Result<Vec<Case>> {
    let mut cases = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let case_path = path.join("case.yaml");
        if !case_path.exists() {
            continue;
        }

        let program_path = path.join("program.fern");
        ensure!(
            program_path.exists(),
            "Missing program.fern for case {}",
            path.display()
        );

        let case_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid case directory name {}", path.display()))?;
        let case_raw = fs::read_to_string(&case_path)
            .with_context(|| format!("Reading {}", case_path.display()))?;
        let spec: CaseSpec = serde_yaml::from_str(&case_raw)
            .with_context(|| format!("Parsing {}", case_path.display()))?;

        cases.push(Case {
            name: case_name,
            dir: path,
            program_path,
            spec,
        });
    }

    ensure!(
        !cases.is_empty(),
        "No test cases found in {}",
        programs_dir.display()
    );
    cases.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(cases)
}
