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

//! First pass (§4.6): walks the expanded source once, sizing every
//! instruction, recording labels, and tracking IC/DC. Malformed lines
//! record a diagnostic and are otherwise skipped so multiple problems
//! surface per run (§7); the caller decides whether to continue to the
//! second pass based on whether any were recorded.

use std::collections::HashMap;

use crate::assembler::symbol_table::{SymbolKind, SymbolTable};
use crate::ast::{AddressingMode, Command, ParsedLine};
use crate::catalogue::{CATALOGUE, Directive};
use crate::errors::AssemblyError;
use crate::parser::parse_operand;
use crate::validators::{parse_matrix_dims, parse_signed_decimal, parse_string_operand};

const INITIAL_IC: u32 = 100;

pub struct FirstPassResult {
    pub symbol_table: SymbolTable,
    pub final_ic: u32,
    pub final_dc: u32,
}

pub fn run_first_pass(lines: &[ParsedLine]) -> Result<FirstPassResult, Vec<AssemblyError>> {
    let mut symbol_table = SymbolTable::new();
    let mut entry_lines: HashMap<String, usize> = HashMap::new();
    let mut ic = INITIAL_IC;
    let mut dc = 0u32;
    let mut errors = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some(command) = &line.command else { continue };

        match command {
            Command::Directive(Directive::Extern) => {
                for operand in &line.operands {
                    if let Err(e) = symbol_table.declare_external(operand, line.line_number) {
                        errors.push(e);
                    }
                }
            }
            Command::Directive(Directive::Entry) => {
                for operand in &line.operands {
                    entry_lines.entry(operand.clone()).or_insert(line.line_number);
                    symbol_table.mark_entry(operand);
                }
            }
            Command::Directive(Directive::Data) => {
                let mut values = Vec::with_capacity(line.operands.len());
                let mut ok = true;
                for operand in &line.operands {
                    match parse_signed_decimal(operand) {
                        Some(v) => values.push(v),
                        None => {
                            errors.push(AssemblyError::lexical(
                                line.line_number,
                                format!(".data operand is not a signed decimal integer: \"{operand}\""),
                            ));
                            ok = false;
                        }
                    }
                }
                if ok {
                    if let Some(label) = &line.label {
                        if let Err(e) = symbol_table.define(label, dc, SymbolKind::Data, line.line_number) {
                            errors.push(e);
                        }
                    }
                    dc += values.len() as u32;
                }
            }
            Command::Directive(Directive::String) => {
                if line.operands.len() != 1 {
                    errors.push(AssemblyError::structural(
                        line.line_number,
                        ".string requires exactly one quoted operand",
                    ));
                    continue;
                }
                match parse_string_operand(&line.operands[0]) {
                    Some(content) => {
                        if let Some(label) = &line.label {
                            if let Err(e) = symbol_table.define(label, dc, SymbolKind::Data, line.line_number) {
                                errors.push(e);
                            }
                        }
                        dc += content.chars().count() as u32 + 1;
                    }
                    None => errors.push(AssemblyError::lexical(
                        line.line_number,
                        format!("malformed .string operand: \"{}\"", line.operands[0]),
                    )),
                }
            }
            Command::Directive(Directive::Mat) => {
                if line.operands.is_empty() {
                    errors.push(AssemblyError::structural(
                        line.line_number,
                        ".mat requires a [rows][cols] dimension operand",
                    ));
                    continue;
                }
                let Some((rows, cols)) = parse_matrix_dims(&line.operands[0]) else {
                    errors.push(AssemblyError::structural(
                        line.line_number,
                        format!("malformed .mat dimensions: \"{}\"", line.operands[0]),
                    ));
                    continue;
                };
                let cell_count = rows * cols;
                let initial_values = &line.operands[1..];
                if !initial_values.is_empty() && initial_values.len() as u32 != cell_count {
                    errors.push(AssemblyError::structural(
                        line.line_number,
                        format!(
                            ".mat expects 0 or {cell_count} initial values, found {}",
                            initial_values.len()
                        ),
                    ));
                    continue;
                }
                let mut ok = true;
                for value in initial_values {
                    if parse_signed_decimal(value).is_none() {
                        errors.push(AssemblyError::lexical(
                            line.line_number,
                            format!(".mat initial value is not a signed decimal integer: \"{value}\""),
                        ));
                        ok = false;
                    }
                }
                if ok {
                    if let Some(label) = &line.label {
                        if let Err(e) = symbol_table.define(label, dc, SymbolKind::Data, line.line_number) {
                            errors.push(e);
                        }
                    }
                    dc += cell_count;
                }
            }
            Command::Instruction(opcode) => {
                let info = CATALOGUE
                    .iter()
                    .find(|c| c.opcode == *opcode)
                    .expect("every parsed opcode originates from the catalogue");

                if line.operands.len() != info.operand_count as usize {
                    errors.push(AssemblyError::structural(
                        line.line_number,
                        format!(
                            "{} expects {} operand(s), found {}",
                            info.name,
                            info.operand_count,
                            line.operands.len()
                        ),
                    ));
                    continue;
                }

                let mut modes = Vec::with_capacity(line.operands.len());
                let mut ok = true;
                for raw in &line.operands {
                    match parse_operand(raw, line.line_number) {
                        Ok(op) => modes.push(op.mode()),
                        Err(e) => {
                            errors.push(e);
                            ok = false;
                        }
                    }
                }
                if !ok {
                    continue;
                }

                let (src_mode, dst_mode) = match modes.as_slice() {
                    [] => (None, None),
                    [dst] => (None, Some(*dst)),
                    [src, dst] => (Some(*src), Some(*dst)),
                    _ => unreachable!("operand count already checked against the catalogue"),
                };

                if let Some(mode) = src_mode {
                    if mode.mask() & info.src_mask == 0 {
                        errors.push(AssemblyError::structural(
                            line.line_number,
                            format!("illegal source addressing mode for {}", info.name),
                        ));
                        ok = false;
                    }
                }
                if let Some(mode) = dst_mode {
                    if mode.mask() & info.dst_mask == 0 {
                        errors.push(AssemblyError::structural(
                            line.line_number,
                            format!("illegal destination addressing mode for {}", info.name),
                        ));
                        ok = false;
                    }
                }
                if !ok {
                    continue;
                }

                let size = instruction_word_count(src_mode, dst_mode);

                if let Some(label) = &line.label {
                    if let Err(e) = symbol_table.define(label, ic, SymbolKind::Code, line.line_number) {
                        errors.push(e);
                    }
                }
                ic += size;
            }
        }
    }

    symbol_table.relocate_data(ic);

    for name in symbol_table.undefined_entries() {
        let line = entry_lines.get(name).copied().unwrap_or(0);
        errors.push(AssemblyError::structural(
            line,
            format!("\"{name}\" declared .entry but never defined"),
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(FirstPassResult { symbol_table, final_ic: ic, final_dc: dc })
}

/// Word length per §4.7: the header word plus however many operand words
/// the addressing modes require.
fn instruction_word_count(src_mode: Option<AddressingMode>, dst_mode: Option<AddressingMode>) -> u32 {
    match (src_mode, dst_mode) {
        (None, None) => 1,
        (None, Some(mode)) => 1 + operand_word_count(mode),
        (Some(AddressingMode::Register), Some(AddressingMode::Register)) => 1 + 1,
        (Some(src), Some(dst)) => 1 + operand_word_count(src) + operand_word_count(dst),
    }
}

fn operand_word_count(mode: AddressingMode) -> u32 {
    match mode {
        AddressingMode::MatrixAccess => 2,
        _ => 1,
    }
}
