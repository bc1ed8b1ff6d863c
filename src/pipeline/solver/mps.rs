//! Free-format MPS reading and writing
//!
//! The writer lists every variable in `COLUMNS` (with a zero objective entry
//! when it appears nowhere else) and gives every variable explicit bounds, so
//! variable order, domains and bounds survive a round trip. Reals use Rust's
//! shortest round-trip formatting.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use super::problem::{Domain, LinearConstraint, MipSpec, Objective, ObjectiveSense, Sense};

const OBJECTIVE_ROW: &str = "OBJ";
const RHS_SET: &str = "RHS";
const BOUND_SET: &str = "BND";

/// Serialize `spec` as free-format MPS
pub fn write_mps(spec: &MipSpec) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_sections(spec, &mut out);
    out
}

fn write_sections(spec: &MipSpec, out: &mut String) -> std::fmt::Result {
    writeln!(out, "NAME {}", spec.name)?;
    if spec.objective.sense == ObjectiveSense::Maximize {
        writeln!(out, "OBJSENSE")?;
        writeln!(out, "    MAX")?;
    }

    writeln!(out, "ROWS")?;
    writeln!(out, " N  {}", OBJECTIVE_ROW)?;
    for row in &spec.constraints {
        let code = match row.sense {
            Sense::Le => "L",
            Sense::Ge => "G",
            Sense::Eq => "E",
        };
        writeln!(out, " {}  {}", code, row.name)?;
    }

    // column-major view of the objective and the rows
    let mut entries: Vec<Vec<(&str, f64)>> = vec![Vec::new(); spec.num_variables()];
    for &(k, coef) in &spec.objective.terms {
        entries[k].push((OBJECTIVE_ROW, coef));
    }
    for row in &spec.constraints {
        for &(k, coef) in &row.terms {
            entries[k].push((row.name.as_str(), coef));
        }
    }

    writeln!(out, "COLUMNS")?;
    let mut in_integer_block = false;
    let mut marker = 0;
    for (var, column) in spec.variables.iter().zip(&entries) {
        let integral = var.domain.is_integral();
        if integral != in_integer_block {
            let kind = if integral { "'INTORG'" } else { "'INTEND'" };
            writeln!(out, "    MARKER{}  'MARKER'  {}", marker, kind)?;
            marker += 1;
            in_integer_block = integral;
        }
        if column.is_empty() {
            writeln!(out, "    {}  {}  0", var.name, OBJECTIVE_ROW)?;
        }
        for (row, coef) in column {
            writeln!(out, "    {}  {}  {}", var.name, row, coef)?;
        }
    }
    if in_integer_block {
        writeln!(out, "    MARKER{}  'MARKER'  'INTEND'", marker)?;
    }

    writeln!(out, "RHS")?;
    for row in spec.constraints.iter().filter(|r| r.rhs != 0.0) {
        writeln!(out, "    {}  {}  {}", RHS_SET, row.name, row.rhs)?;
    }

    writeln!(out, "BOUNDS")?;
    for var in &spec.variables {
        let name = &var.name;
        if var.domain == Domain::Binary && var.lower == 0.0 && var.upper == 1.0 {
            writeln!(out, " BV {}  {}", BOUND_SET, name)?;
            continue;
        }
        if var.lower == var.upper && var.lower.is_finite() {
            writeln!(out, " FX {}  {}  {}", BOUND_SET, name, var.lower)?;
            continue;
        }
        if var.lower == f64::NEG_INFINITY && var.upper == f64::INFINITY {
            writeln!(out, " FR {}  {}", BOUND_SET, name)?;
            continue;
        }
        let (lo, up) = if var.domain.is_integral() { ("LI", "UI") } else { ("LO", "UP") };
        if var.lower == f64::NEG_INFINITY {
            writeln!(out, " MI {}  {}", BOUND_SET, name)?;
        } else {
            writeln!(out, " {} {}  {}  {}", lo, BOUND_SET, name, var.lower)?;
        }
        if var.upper == f64::INFINITY {
            writeln!(out, " PL {}  {}", BOUND_SET, name)?;
        } else {
            writeln!(out, " {} {}  {}  {}", up, BOUND_SET, name, var.upper)?;
        }
    }
    writeln!(out, "ENDATA")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    ObjSense,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
    End,
}

/// Parse free-format MPS text into a `MipSpec`
///
/// Variables without a `BOUNDS` entry get the MPS default `[0, +inf)`.
/// `RANGES` and `SOS` sections are rejected.
pub fn parse_mps(text: &str) -> Result<MipSpec> {
    let mut spec = MipSpec::new("");
    let mut section = Section::Header;
    let mut objective_row: Option<String> = None;
    let mut row_index: HashMap<String, usize> = HashMap::new();
    let mut var_index: HashMap<String, usize> = HashMap::new();
    let mut objective_terms: Vec<(usize, f64)> = Vec::new();
    let mut in_integer_block = false;

    for (line_no, raw) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw.trim_end();
        if line.trim().is_empty() || line.starts_with('*') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();

        // section headers start in column 1
        if !line.starts_with(char::is_whitespace) {
            section = match tokens[0] {
                "NAME" => {
                    spec.name = tokens.get(1..).map(|t| t.join(" ")).unwrap_or_default();
                    Section::Header
                }
                "OBJSENSE" => {
                    if let Some(sense) = tokens.get(1) {
                        spec.objective.sense = parse_objective_sense(sense, line_no)?;
                    }
                    Section::ObjSense
                }
                "ROWS" => Section::Rows,
                "COLUMNS" => Section::Columns,
                "RHS" => Section::Rhs,
                "RANGES" => Section::Ranges,
                "BOUNDS" => Section::Bounds,
                "ENDATA" => Section::End,
                other => bail!("line {}: unknown MPS section '{}'", line_no, other),
            };
            if section == Section::Ranges {
                bail!("line {}: RANGES sections are not supported", line_no);
            }
            if section == Section::End {
                break;
            }
            continue;
        }

        match section {
            Section::Header => bail!("line {}: data before the first section", line_no),
            Section::ObjSense => {
                spec.objective.sense = parse_objective_sense(tokens[0], line_no)?;
            }
            Section::Rows => {
                let [code, name] = tokens[..] else {
                    bail!("line {}: expected '<type> <row>' in ROWS", line_no);
                };
                let sense = match code {
                    "N" => {
                        if objective_row.is_none() {
                            objective_row = Some(name.to_string());
                        }
                        continue;
                    }
                    "L" => Sense::Le,
                    "G" => Sense::Ge,
                    "E" => Sense::Eq,
                    other => bail!("line {}: unknown row type '{}'", line_no, other),
                };
                if row_index.contains_key(name) {
                    bail!("line {}: duplicate row '{}'", line_no, name);
                }
                row_index.insert(name.to_string(), spec.constraints.len());
                spec.constraints.push(LinearConstraint {
                    name: name.to_string(),
                    terms: Vec::new(),
                    sense,
                    rhs: 0.0,
                });
            }
            Section::Columns => {
                if tokens.get(1) == Some(&"'MARKER'") {
                    match tokens.get(2) {
                        Some(&"'INTORG'") => in_integer_block = true,
                        Some(&"'INTEND'") => in_integer_block = false,
                        _ => bail!("line {}: unknown marker", line_no),
                    }
                    continue;
                }
                if tokens.len() != 3 && tokens.len() != 5 {
                    bail!("line {}: expected '<column> <row> <value> [<row> <value>]'", line_no);
                }
                let column = tokens[0];
                let k = match var_index.get(column) {
                    Some(&k) => k,
                    None => {
                        let domain = if in_integer_block { Domain::Integer } else { Domain::Continuous };
                        let k = spec.add_variable(column, 0.0, f64::INFINITY, domain);
                        var_index.insert(column.to_string(), k);
                        k
                    }
                };
                for pair in tokens[1..].chunks(2) {
                    let value = parse_real(pair[1], line_no)?;
                    if Some(pair[0]) == objective_row.as_deref() {
                        if value != 0.0 {
                            objective_terms.push((k, value));
                        }
                    } else {
                        let r = *row_index
                            .get(pair[0])
                            .ok_or_else(|| anyhow!("line {}: unknown row '{}'", line_no, pair[0]))?;
                        if value != 0.0 {
                            spec.constraints[r].terms.push((k, value));
                        }
                    }
                }
            }
            Section::Rhs => {
                // the set name is optional in free format
                let pairs = if tokens.len() % 2 == 1 { &tokens[1..] } else { &tokens[..] };
                for pair in pairs.chunks(2) {
                    let value = parse_real(pair[1], line_no)?;
                    if Some(pair[0]) == objective_row.as_deref() {
                        continue;
                    }
                    let r = *row_index
                        .get(pair[0])
                        .ok_or_else(|| anyhow!("line {}: unknown row '{}'", line_no, pair[0]))?;
                    spec.constraints[r].rhs = value;
                }
            }
            Section::Bounds => parse_bound(&mut spec, &var_index, &tokens, line_no)?,
            Section::Ranges | Section::End => {}
        }
    }

    if section != Section::End {
        bail!("missing ENDATA");
    }

    for row in &mut spec.constraints {
        row.terms.sort_by_key(|&(k, _)| k);
    }
    objective_terms.sort_by_key(|&(k, _)| k);
    spec.objective = Objective {
        sense: spec.objective.sense,
        terms: objective_terms,
    };
    Ok(spec)
}

fn parse_bound(
    spec: &mut MipSpec,
    var_index: &HashMap<String, usize>,
    tokens: &[&str],
    line_no: usize,
) -> Result<()> {
    let kind = tokens[0];
    let needs_value = !matches!(kind, "FR" | "MI" | "PL" | "BV");
    // the set name is optional in free format
    let (name, value) = match (needs_value, tokens.len()) {
        (true, 4) => (tokens[2], Some(tokens[3])),
        (true, 3) => (tokens[1], Some(tokens[2])),
        (false, 3) => (tokens[2], None),
        (false, 2) => (tokens[1], None),
        _ => bail!("line {}: malformed {} bound", line_no, kind),
    };
    let k = *var_index
        .get(name)
        .ok_or_else(|| anyhow!("line {}: bound on unknown column '{}'", line_no, name))?;
    let value = value.map(|v| parse_real(v, line_no)).transpose()?;
    let var = &mut spec.variables[k];

    match (kind, value) {
        ("LO", Some(v)) => var.lower = v,
        ("UP", Some(v)) => var.upper = v,
        ("FX", Some(v)) => {
            var.lower = v;
            var.upper = v;
        }
        ("LI", Some(v)) => {
            var.lower = v;
            var.domain = Domain::Integer;
        }
        ("UI", Some(v)) => {
            var.upper = v;
            var.domain = Domain::Integer;
        }
        ("FR", None) => {
            var.lower = f64::NEG_INFINITY;
            var.upper = f64::INFINITY;
        }
        ("MI", None) => var.lower = f64::NEG_INFINITY,
        ("PL", None) => var.upper = f64::INFINITY,
        ("BV", None) => {
            var.lower = 0.0;
            var.upper = 1.0;
            var.domain = Domain::Binary;
        }
        _ => bail!("line {}: unsupported bound type '{}'", line_no, kind),
    }
    Ok(())
}

fn parse_objective_sense(token: &str, line_no: usize) -> Result<ObjectiveSense> {
    match token.to_ascii_uppercase().as_str() {
        "MIN" | "MINIMIZE" => Ok(ObjectiveSense::Minimize),
        "MAX" | "MAXIMIZE" => Ok(ObjectiveSense::Maximize),
        other => bail!("line {}: unknown objective sense '{}'", line_no, other),
    }
}

fn parse_real(token: &str, line_no: usize) -> Result<f64> {
    token
        .parse::<f64>()
        .with_context(|| format!("line {}: '{}' is not a number", line_no, token))
}

pub fn save_mps(spec: &MipSpec, path: &Path) -> Result<()> {
    std::fs::write(path, write_mps(spec))
        .with_context(|| format!("Failed to write MPS file {}", path.display()))
}

pub fn load_mps(path: &Path) -> Result<MipSpec> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read MPS file {}", path.display()))?;
    parse_mps(&text).with_context(|| format!("Failed to parse MPS file {}", path.display()))
}
