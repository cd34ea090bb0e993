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

//! The line parser (§4.3): a hand-rolled scanner over one physical line's
//! characters, not a whole-file grammar. Macro expansion (§4.5) always
//! happens as a raw-text pass before a line reaches here, so this parser
//! never has to recognise a macro invocation itself.

use crate::ast::{Command, Operand, ParsedLine, Register};
use crate::catalogue::{Directive, lookup_opcode};
use crate::errors::AssemblyError;
use crate::validators::{
    check_raw_line, is_valid_label, parse_immediate, parse_matrix_access, parse_register,
};

/// Parses every line of an already macro-expanded source, accumulating one
/// diagnostic per malformed line rather than stopping at the first one
/// (§4.6's "each malformed line records an error and skips its effect, but
/// the pass continues").
pub fn parse_program(source: &str) -> (Vec<ParsedLine>, Vec<AssemblyError>) {
    let mut lines = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line_number = idx + 1;
        match parse_line(raw, line_number) {
            Ok(Some(parsed)) => lines.push(parsed),
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    (lines, errors)
}

/// Parses one physical line. Returns `Ok(None)` for a blank line or a
/// full-line comment, which callers skip.
pub fn parse_line(raw: &str, line_number: usize) -> Result<Option<ParsedLine>, AssemblyError> {
    check_raw_line(raw).map_err(|msg| AssemblyError::lexical(line_number, msg))?;

    let trimmed = raw.trim_start();
    if trimmed.is_empty() || trimmed.starts_with(';') {
        return Ok(None);
    }

    let mut cursor = trimmed;
    let label = take_label(&mut cursor, line_number)?;

    cursor = cursor.trim_start();
    if cursor.is_empty() {
        if label.is_some() {
            return Err(AssemblyError::structural(
                line_number,
                "label with no following command",
            ));
        }
        return Ok(None);
    }

    let (command_token, after_command) = split_first_token(cursor);
    let command = resolve_command(command_token, line_number)?;

    let operands = parse_operand_tokens(after_command.trim_start(), line_number)?;

    Ok(Some(ParsedLine {
        line_number,
        label,
        command: Some(command),
        operands,
    }))
}

/// If a `:` occurs before any whitespace, the text preceding it is the
/// label. Advances `cursor` past the label and its colon when found.
fn take_label(cursor: &mut &str, line_number: usize) -> Result<Option<String>, AssemblyError> {
    let up_to_whitespace = cursor
        .find(char::is_whitespace)
        .map(|i| &cursor[..i])
        .unwrap_or(cursor);

    let Some(colon_idx) = up_to_whitespace.find(':') else {
        return Ok(None);
    };

    let label_text = &up_to_whitespace[..colon_idx];
    if !is_valid_label(label_text) {
        return Err(AssemblyError::lexical(
            line_number,
            format!("invalid label name: \"{label_text}\""),
        ));
    }

    *cursor = &cursor[colon_idx + 1..];
    Ok(Some(label_text.to_string()))
}

fn split_first_token(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    }
}

fn resolve_command(token: &str, line_number: usize) -> Result<Command, AssemblyError> {
    if let Some(info) = lookup_opcode(token) {
        return Ok(Command::Instruction(info.opcode));
    }
    if let Some(directive) = Directive::from_name(token) {
        return Ok(Command::Directive(directive));
    }
    Err(AssemblyError::structural(
        line_number,
        format!("unknown opcode or directive: \"{token}\""),
    ))
}

/// Splits the operand text on commas. A string operand is read verbatim
/// from its opening `"` to the next `"` so a comma inside it is not a
/// separator. Two consecutive commas, a trailing comma, or a comma
/// immediately followed by end-of-line is a syntax error.
fn parse_operand_tokens(text: &str, line_number: usize) -> Result<Vec<String>, AssemblyError> {
    let text = text.trim_end();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        if chars[i] == ',' {
            return Err(AssemblyError::structural(
                line_number,
                "unexpected comma (two consecutive commas or a leading comma)",
            ));
        }

        let start = i;
        if chars[i] == '"' {
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                i += 1;
            }
            if i >= chars.len() {
                return Err(AssemblyError::lexical(line_number, "unterminated string operand"));
            }
            i += 1; // consume closing quote
        } else {
            while i < chars.len() && chars[i] != ',' && !chars[i].is_whitespace() {
                i += 1;
            }
        }
        tokens.push(chars[start..i].iter().collect());

        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        if chars[i] == ',' {
            i += 1;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            if i >= chars.len() {
                return Err(AssemblyError::structural(
                    line_number,
                    "trailing comma with no following operand",
                ));
            }
            if chars[i] == ',' {
                return Err(AssemblyError::structural(
                    line_number,
                    "two consecutive commas",
                ));
            }
        } else {
            return Err(AssemblyError::structural(
                line_number,
                "operands must be separated by a comma",
            ));
        }
    }

    Ok(tokens)
}

/// Classifies one raw operand token into an `Operand`, without resolving
/// any label against a symbol table — that only happens in the second
/// pass once the symbol table is complete.
pub fn parse_operand(raw: &str, line_number: usize) -> Result<Operand, AssemblyError> {
    if raw.starts_with('#') {
        return parse_immediate(raw)
            .map(Operand::Immediate)
            .ok_or_else(|| AssemblyError::lexical(line_number, format!("malformed immediate operand: \"{raw}\"")));
    }

    if raw.contains('[') {
        let (label, a, b) = parse_matrix_access(raw).ok_or_else(|| {
            AssemblyError::lexical(line_number, format!("malformed matrix access operand: \"{raw}\""))
        })?;
        return Ok(Operand::MatrixAccess(label.to_string(), a, b));
    }

    if let Some(reg) = parse_register(raw) {
        return Ok(Operand::Register(reg));
    }

    if is_valid_label(raw) {
        return Ok(Operand::Direct(raw.to_string()));
    }

    Err(AssemblyError::lexical(line_number, format!("unrecognised operand: \"{raw}\"")))
}

pub fn operand_register(op: &Operand) -> Option<Register> {
    match op {
        Operand::Register(r) => Some(*r),
        _ => None,
    }
}
