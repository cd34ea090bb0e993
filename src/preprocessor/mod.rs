/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! The macro preprocessor (§4.5): a two-pass expansion of `mcro`/`mcroend`
//! bodies over the raw source text, producing the `.am` stream the rest of
//! the pipeline sees. Nested macros, calls inside macro bodies, and
//! parameterised macros are not supported — a macro body is re-scanned
//! for expansion only if it appears *after* expansion in the output, same
//! as the original tool this behaviour is modelled on.

use std::collections::HashMap;

use crate::errors::AssemblyError;
use crate::validators::is_valid_macro_name;

const MAX_MACRO_BODY_BYTES: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct MacroEntry {
    pub name: String,
    pub body: Vec<String>,
}

/// Expands every macro invocation in `source`, returning the expanded
/// text. Errors here are collected, not short-circuited, matching the
/// rest of the pipeline's "surface every diagnostic" policy — but a
/// structural problem with the macro table itself (duplicate name,
/// unterminated definition) still prevents expansion of the file.
pub fn expand_macros(source: &str) -> Result<String, Vec<AssemblyError>> {
    let (macros, errors) = collect_macros(source);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(emit_expanded(source, &macros))
}

/// Pass one: collects every `mcro NAME` / `mcroend` definition.
fn collect_macros(source: &str) -> (HashMap<String, MacroEntry>, Vec<AssemblyError>) {
    let mut macros: HashMap<String, MacroEntry> = HashMap::new();
    let mut errors = Vec::new();

    let mut lines = source.lines().enumerate().peekable();
    while let Some((idx, line)) = lines.next() {
        let line_number = idx + 1;
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix("mcro") else { continue };
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            // a label/token that merely starts with "mcro" (e.g. "mcrofoo")
            continue;
        }

        let name = rest.trim();
        if name.is_empty() {
            errors.push(AssemblyError::structural(line_number, "mcro directive missing a name"));
            continue;
        }
        if !is_valid_macro_name(name) {
            errors.push(AssemblyError::naming(
                line_number,
                format!("invalid macro name: \"{name}\""),
            ));
            skip_to_mcroend(&mut lines);
            continue;
        }
        if macros.contains_key(name) {
            errors.push(AssemblyError::naming(
                line_number,
                format!("duplicate macro definition: \"{name}\""),
            ));
            skip_to_mcroend(&mut lines);
            continue;
        }

        let mut body = Vec::new();
        let mut body_bytes = 0usize;
        let mut closed = false;
        for (_body_idx, body_line) in lines.by_ref() {
            if body_line.trim() == "mcroend" {
                closed = true;
                break;
            }
            body_bytes += body_line.len() + 1;
            if body_bytes > MAX_MACRO_BODY_BYTES {
                errors.push(AssemblyError::structural(
                    line_number,
                    format!("macro \"{name}\" body exceeds {MAX_MACRO_BODY_BYTES} bytes"),
                ));
            }
            body.push(body_line.to_string());
        }

        if !closed {
            errors.push(AssemblyError::structural(
                line_number,
                format!("unterminated macro definition: \"{name}\""),
            ));
            continue;
        }

        macros.insert(name.to_string(), MacroEntry { name: name.to_string(), body });
    }

    (macros, errors)
}

fn skip_to_mcroend(lines: &mut std::iter::Peekable<std::iter::Enumerate<std::str::Lines>>) {
    for (_idx, line) in lines.by_ref() {
        if line.trim() == "mcroend" {
            break;
        }
    }
}

/// Pass two: drops macro-definition lines entirely and replaces any call
/// line with the macro's body, verbatim. Body lines are written as-is —
/// they are never re-scanned for further macro calls within this pass.
fn emit_expanded(source: &str, macros: &HashMap<String, MacroEntry>) -> String {
    let mut out = String::new();
    let mut lines = source.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("mcro") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                // skip header, body, and mcroend of this definition
                for body_line in lines.by_ref() {
                    if body_line.trim() == "mcroend" {
                        break;
                    }
                }
                continue;
            }
        }

        if let Some(entry) = macros.get(trimmed) {
            for body_line in &entry.body {
                out.push_str(body_line);
                out.push('\n');
            }
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_call_is_replaced_by_its_body() {
        let source = "mcro M\nmov r1, r2\nadd r1, r2\nmcroend\nM\nstop\n";
        let expanded = expand_macros(source).unwrap();
        assert_eq!(expanded, "mov r1, r2\nadd r1, r2\nstop\n");
    }

    #[test]
    fn macro_definition_lines_are_removed_even_when_unused() {
        let source = "mcro M\nstop\nmcroend\n";
        let expanded = expand_macros(source).unwrap();
        assert_eq!(expanded, "");
    }

    #[test]
    fn non_macro_lines_pass_through_unchanged() {
        let source = "LOOP: mov r1, r2\n.data 1, 2\n";
        let expanded = expand_macros(source).unwrap();
        assert_eq!(expanded, source);
    }

    #[test]
    fn unterminated_macro_is_an_error() {
        let source = "mcro M\nstop\n";
        assert!(expand_macros(source).is_err());
    }

    #[test]
    fn duplicate_macro_name_is_an_error() {
        let source = "mcro M\nstop\nmcroend\nmcro M\nclr r1\nmcroend\n";
        let errors = expand_macros(source).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], AssemblyError::Naming { .. }));
    }

    #[test]
    fn bad_macro_name_is_rejected() {
        let source = "mcro mov\nstop\nmcroend\n";
        let errors = expand_macros(source).unwrap_err();
        assert!(matches!(errors[0], AssemblyError::Naming { .. }));
    }

    #[test]
    fn expansion_is_idempotent_on_a_second_pass() {
        let source = "mcro M\nmov r1, r2\nmcroend\nM\n";
        let once = expand_macros(source).unwrap();
        let twice = expand_macros(&once).unwrap();
        assert_eq!(once, twice);
        assert!(!twice.contains("mcro"));
    }

    #[test]
    fn nested_macro_calls_in_a_body_are_not_expanded() {
        let source = "mcro INNER\nstop\nmcroend\nmcro OUTER\nINNER\nmcroend\nOUTER\n";
        let expanded = expand_macros(source).unwrap();
        assert_eq!(expanded, "INNER\n");
    }
}
