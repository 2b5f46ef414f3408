//! Settings-header parsing.
//!
//! The simulation programs are configured through a C++ header
//! (`SETTINGS.h`) with declarations like:
//!
//! ```text
//! int N = 20;             ///< Number of sites
//! double a = 0.5;         ///< Time discretization
//! std::string output_name = "Ncf10000_NB100.dat";
//! ```
//!
//! The post-processing side reads the handful of scalars it needs back out
//! of that header with line-oriented regex matching. Contract:
//!
//! - each requested parameter is a `(name, kind)` spec; declaration order
//!   in the file is irrelevant and the **last** matching line wins
//! - a missing file is fatal (`ConfigNotFound`)
//! - a missing parameter is not: the value defaults to 0 / 0.0 / "" and
//!   the name is recorded in `Settings::missing` so the caller can warn

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::error::PostError;

/// Value type of a settings parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `int <name> = <value>;`
    Int,
    /// `double <name> = <value>;`
    Float,
    /// `std::string <name> = "<value>";`
    Str,
}

/// One requested parameter: name plus expected declaration type.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub const fn int(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Int }
    }

    pub const fn float(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Float }
    }

    pub const fn string(name: &'static str) -> Self {
        Self { name, kind: ParamKind::Str }
    }

    /// Declaration pattern for this parameter.
    ///
    /// Tolerant of surrounding whitespace and anything after the `;`
    /// (doxygen comments in practice).
    fn pattern(&self) -> Regex {
        let name = regex::escape(self.name);
        let pat = match self.kind {
            ParamKind::Int => format!(r"^\s*int\s+{name}\s*=\s*(-?\d+)\s*;"),
            ParamKind::Float => {
                format!(r"^\s*double\s+{name}\s*=\s*(-?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*;")
            }
            ParamKind::Str => format!(r#"^\s*std::string\s+{name}\s*=\s*"([^"]*)"\s*;"#),
        };
        // The pattern text is built from fixed templates; a failure here is
        // a programming error, not an input error.
        Regex::new(&pat).expect("settings pattern must compile")
    }
}

/// A parsed scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Parsed settings: found values plus the names that never matched.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, ParamValue>,
    /// Parameters that were requested but never found (defaults applied).
    pub missing: Vec<String>,
}

impl Settings {
    /// Integer parameter, defaulting to 0 when absent or mistyped.
    pub fn int(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(ParamValue::Int(v)) => *v,
            _ => 0,
        }
    }

    /// Float parameter, defaulting to 0.0 when absent or mistyped.
    pub fn float(&self, name: &str) -> f64 {
        match self.values.get(name) {
            Some(ParamValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    /// String parameter, defaulting to "" when absent or mistyped.
    pub fn str(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(ParamValue::Str(v)) => v.as_str(),
            _ => "",
        }
    }

    /// `(name, rendered value)` pairs in the order of the request specs,
    /// for the "found in header file ..." stdout lines.
    pub fn found(&self, specs: &[ParamSpec]) -> Vec<(String, String)> {
        specs
            .iter()
            .filter_map(|spec| {
                self.values.get(spec.name).map(|v| {
                    let rendered = match v {
                        ParamValue::Int(v) => v.to_string(),
                        ParamValue::Float(v) => v.to_string(),
                        ParamValue::Str(v) => format!("\"{v}\""),
                    };
                    (spec.name.to_string(), rendered)
                })
            })
            .collect()
    }
}

/// Scan a settings header for the requested parameters.
pub fn read_settings(path: &Path, specs: &[ParamSpec]) -> Result<Settings, PostError> {
    let contents = std::fs::read_to_string(path).map_err(|source| PostError::ConfigNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let mut settings = Settings::default();
    for spec in specs {
        let pattern = spec.pattern();

        let mut value = None;
        for line in contents.lines() {
            if let Some(caps) = pattern.captures(line) {
                let raw = &caps[1];
                let parsed = match spec.kind {
                    ParamKind::Int => raw.parse::<i64>().ok().map(ParamValue::Int),
                    ParamKind::Float => raw.parse::<f64>().ok().map(ParamValue::Float),
                    ParamKind::Str => Some(ParamValue::Str(raw.to_string())),
                };
                if let Some(parsed) = parsed {
                    // Last matching declaration wins, silently.
                    value = Some(parsed);
                }
            }
        }

        match value {
            Some(v) => {
                settings.values.insert(spec.name.to_string(), v);
            }
            None => settings.missing.push(spec.name.to_string()),
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_header(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SPECS: [ParamSpec; 3] = [
        ParamSpec::int("N"),
        ParamSpec::float("a"),
        ParamSpec::string("output_name"),
    ];

    #[test]
    fn extracts_typed_values() {
        let file = write_header(
            "#ifndef SETTINGS_H\n\
             int N = 20;             ///< Number of sites\n\
             double a = 0.5;         ///< Grid spacing\n\
             std::string output_name = \"run.dat\";  ///< Output filename\n\
             #endif\n",
        );
        let s = read_settings(file.path(), &SPECS).unwrap();
        assert_eq!(s.int("N"), 20);
        assert!((s.float("a") - 0.5).abs() < 1e-12);
        assert_eq!(s.str("output_name"), "run.dat");
        assert!(s.missing.is_empty());
    }

    #[test]
    fn last_declaration_wins() {
        let file = write_header("int N = 10;\nint N = 30;\nint N = 20;\n");
        let s = read_settings(file.path(), &[ParamSpec::int("N")]).unwrap();
        assert_eq!(s.int("N"), 20);
    }

    #[test]
    fn unrelated_lines_do_not_change_the_result() {
        let a = write_header("// comment\nint N = 7;\nint M = 9;\n");
        let b = write_header("int M = 9;\nint N = 7;\n// comment\n");
        let sa = read_settings(a.path(), &[ParamSpec::int("N")]).unwrap();
        let sb = read_settings(b.path(), &[ParamSpec::int("N")]).unwrap();
        assert_eq!(sa.int("N"), sb.int("N"));
    }

    #[test]
    fn missing_parameter_defaults_without_error() {
        let file = write_header("double a = 1.25;\n");
        let s = read_settings(file.path(), &SPECS).unwrap();
        assert_eq!(s.int("N"), 0);
        assert_eq!(s.str("output_name"), "");
        assert_eq!(s.missing, vec!["N".to_string(), "output_name".to_string()]);
    }

    #[test]
    fn whitespace_and_trailing_comments_are_tolerated() {
        let file = write_header("   double   time_bound =  4 ;   ///< propagation time\n");
        let s = read_settings(file.path(), &[ParamSpec::float("time_bound")]).unwrap();
        assert!((s.float("time_bound") - 4.0).abs() < 1e-12);
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = read_settings(Path::new("/nonexistent/SETTINGS.h"), &SPECS).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn negative_and_scientific_floats_parse() {
        let file = write_header("double epsilon = -1.4;\ndouble tiny = 2.5e-3;\n");
        let s = read_settings(
            file.path(),
            &[ParamSpec::float("epsilon"), ParamSpec::float("tiny")],
        )
        .unwrap();
        assert!((s.float("epsilon") + 1.4).abs() < 1e-12);
        assert!((s.float("tiny") - 2.5e-3).abs() < 1e-15);
    }
}
