//! Parser for the section-based erasure-code description file format.
//! Ported from `erasure_code.py`'s line-oriented `__init__` scanner: each
//! `[section]` header is followed by one or more lines of content, with
//! list-valued sections using a `[[..],[..]]`-style nested-list syntax
//! and `[minimal fault sets]` terminated by a literal `[END]` line.

use std::path::Path;

use reliability_common::Error;
use reliability_core::{CodeDescription, CodeType};

pub fn parse_code_file(path: &Path) -> Result<CodeDescription, Error> {
    let text = std::fs::read_to_string(path)?;
    parse_code_text(&text)
}

pub fn parse_code_text(text: &str) -> Result<CodeDescription, Error> {
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0usize;

    let mut code_type = None;
    let mut k = None;
    let mut m = None;
    let mut hd = None;
    let mut min_disk_failures = None;
    let mut tanner_graph = Vec::new();
    let mut layout = Vec::new();
    let mut minimal_fault_sets = Vec::new();
    let mut dsft = Vec::new();
    let mut ftv = Vec::new();

    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;
        if line.is_empty() {
            continue;
        }

        let line_no = i;
        let err = move |msg: String| Error::Configuration(format!("line {}: {}", line_no, msg));

        match line {
            "[type]" => {
                let v = next_line(&lines, &mut i, "[type]")?;
                code_type = Some(match v {
                    "mds" => CodeType::Mds,
                    "flat xor" => CodeType::FlatXor,
                    "array xor" => CodeType::ArrayXor,
                    other => return Err(err(format!("unknown code type '{other}'"))),
                });
            }
            "[k]" => {
                k = Some(next_line(&lines, &mut i, "[k]")?.parse::<usize>().map_err(|e| err(e.to_string()))?);
            }
            "[m]" => {
                m = Some(next_line(&lines, &mut i, "[m]")?.parse::<usize>().map_err(|e| err(e.to_string()))?);
            }
            "[hd]" => {
                hd = Some(next_line(&lines, &mut i, "[hd]")?.parse::<usize>().map_err(|e| err(e.to_string()))?);
            }
            "[min disk failures]" => {
                min_disk_failures = Some(
                    next_line(&lines, &mut i, "[min disk failures]")?
                        .parse::<usize>()
                        .map_err(|e| err(e.to_string()))?,
                );
            }
            "[tanner graph]" => {
                tanner_graph = parse_nested_int_list(next_line(&lines, &mut i, "[tanner graph]")?)
                    .map_err(|e| err(e))?;
            }
            "[raw layout]" => {
                layout = parse_nested_int_list(next_line(&lines, &mut i, "[raw layout]")?)
                    .map_err(|e| err(e))?;
            }
            "[minimal fault sets]" => {
                loop {
                    let l = lines.get(i).map(|s| s.trim()).unwrap_or("[END]");
                    i += 1;
                    if l == "[END]" {
                        break;
                    }
                    if l.is_empty() {
                        continue;
                    }
                    minimal_fault_sets.push(parse_flat_int_list(l).map_err(|e| err(e))?);
                }
            }
            "[Disk sector conditional fault tolerance]" => {
                dsft = parse_nested_float_list(next_line(
                    &lines,
                    &mut i,
                    "[Disk sector conditional fault tolerance]",
                )?)
                .map_err(|e| err(e))?;
            }
            "[fault tolerance vector]" => {
                ftv = parse_flat_float_list(next_line(&lines, &mut i, "[fault tolerance vector]")?)
                    .map_err(|e| err(e))?;
            }
            other => {
                return Err(err(format!("unrecognized section header '{other}'")));
            }
        }
    }

    let code_type = code_type.ok_or_else(|| Error::Configuration("missing [type] section".into()))?;
    let k = k.ok_or_else(|| Error::Configuration("missing [k] section".into()))?;
    let m = m.ok_or_else(|| Error::Configuration("missing [m] section".into()))?;
    // The original defaults the minimum decodable-fault-tolerance distance
    // (hd) to 2 when unspecified, and derives min_disk_failures from hd.
    let hd = hd.unwrap_or(2);
    let min_disk_failures = min_disk_failures.unwrap_or(hd - 1);

    Ok(CodeDescription {
        code_type,
        k,
        m,
        hd: Some(hd),
        min_disk_failures,
        tanner_graph,
        layout,
        minimal_fault_sets,
        dsft,
        ftv,
    })
}

fn next_line<'a>(lines: &[&'a str], i: &mut usize, section: &str) -> Result<&'a str, Error> {
    let l = lines
        .get(*i)
        .ok_or_else(|| Error::Configuration(format!("{section} has no content line")))?;
    *i += 1;
    Ok(l.trim())
}

/// Parse a flat integer list like `[0, 1, 2]`.
fn parse_flat_int_list(s: &str) -> Result<Vec<usize>, String> {
    let inner = strip_brackets(s)?;
    if inner.trim().is_empty() {
        return Ok(vec![]);
    }
    inner
        .split(',')
        .map(|tok| tok.trim().parse::<usize>().map_err(|e| e.to_string()))
        .collect()
}

fn parse_flat_float_list(s: &str) -> Result<Vec<f64>, String> {
    let inner = strip_brackets(s)?;
    if inner.trim().is_empty() {
        return Ok(vec![]);
    }
    inner
        .split(',')
        .map(|tok| tok.trim().parse::<f64>().map_err(|e| e.to_string()))
        .collect()
}

/// Parse a Python-literal-like nested list, e.g. `[[0,1,2],[3,4]]`.
fn parse_nested_int_list(s: &str) -> Result<Vec<Vec<usize>>, String> {
    let inner = strip_brackets(s)?;
    split_top_level(&inner)
        .into_iter()
        .map(|group| parse_flat_int_list(group.trim()))
        .collect()
}

fn parse_nested_float_list(s: &str) -> Result<Vec<Vec<f64>>, String> {
    let inner = strip_brackets(s)?;
    split_top_level(&inner)
        .into_iter()
        .map(|group| parse_flat_float_list(group.trim()))
        .collect()
}

fn strip_brackets(s: &str) -> Result<&str, String> {
    let s = s.trim();
    let s = s.strip_prefix('[').ok_or_else(|| format!("expected '[' in '{s}'"))?;
    let s = s.strip_suffix(']').ok_or_else(|| format!("expected trailing ']' in '{s}'"))?;
    Ok(s)
}

/// Split a comma-separated list of bracketed groups at the top level,
/// i.e. `[0,1],[2,3]` -> `["[0,1]", "[2,3]"]`, respecting nesting depth.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (idx, ch) in s.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                groups.push(s[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() {
        groups.push(tail);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_an_mds_code() {
        let text = "[type]\nmds\n[k]\n10\n[m]\n4\n[min disk failures]\n4\n";
        let desc = parse_code_text(text).unwrap();
        assert_eq!(desc.code_type, CodeType::Mds);
        assert_eq!(desc.k, 10);
        assert_eq!(desc.m, 4);
        assert_eq!(desc.min_disk_failures, 4);
    }

    #[test]
    fn parses_a_flat_xor_code_with_tanner_graph_and_mel() {
        let text = "[type]\nflat xor\n[k]\n5\n[m]\n3\n[tanner graph]\n[[0,1,2],[1,2,3],[2,3,4]]\n[minimal fault sets]\n[0,5,6]\n[1,6,7]\n[END]\n";
        let desc = parse_code_text(text).unwrap();
        assert_eq!(desc.code_type, CodeType::FlatXor);
        assert_eq!(desc.tanner_graph, vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4]]);
        assert_eq!(desc.minimal_fault_sets.len(), 2);
        assert_eq!(desc.minimal_fault_sets[0], vec![0, 5, 6]);
    }

    #[test]
    fn rejects_an_unknown_section() {
        let text = "[type]\nmds\n[bogus]\nxyz\n";
        assert!(parse_code_text(text).is_err());
    }

    #[test]
    fn rejects_a_missing_required_section() {
        let text = "[type]\nmds\n[k]\n10\n";
        assert!(parse_code_text(text).is_err());
    }
}
