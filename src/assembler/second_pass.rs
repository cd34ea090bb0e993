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

//! Second pass (§4.8): re-walks the already-parsed lines, encoding
//! instructions into machine words and processing data directives.
//! Unlike the first pass, a reference error here aborts immediately —
//! by the time this runs, structural validity was already established.

use crate::assembler::symbol_table::{SymbolKind, SymbolTable};
use crate::ast::{AddressingMode, Command, Operand, ParsedLine};
use crate::catalogue::{CATALOGUE, Directive};
use crate::encoding::{
    Are, Word, pack_instruction_header, pack_matrix_index_word, pack_register_pair_word,
    pack_single_register_word, pack_value_word, wrap_to_bits,
};
use crate::errors::AssemblyError;
use crate::parser::{operand_register, parse_operand};
use crate::validators::{parse_matrix_dims, parse_signed_decimal, parse_string_operand};

pub struct SecondPassResult {
    pub instruction_words: Vec<Word>,
    pub data_words: Vec<Word>,
    pub external_refs: Vec<(String, u32)>,
}

const INITIAL_IC: u32 = 100;

pub fn run_second_pass(
    lines: &[ParsedLine],
    symbol_table: &SymbolTable,
) -> Result<SecondPassResult, AssemblyError> {
    let mut instruction_words = Vec::new();
    let mut data_words = Vec::new();
    let mut external_refs = Vec::new();
    let mut ic = INITIAL_IC;

    for line in lines {
        let Some(command) = &line.command else { continue };

        match command {
            Command::Instruction(opcode) => {
                let info = CATALOGUE
                    .iter()
                    .find(|c| c.opcode == *opcode)
                    .expect("every parsed opcode originates from the catalogue");

                let operands: Vec<Operand> = line
                    .operands
                    .iter()
                    .map(|raw| parse_operand(raw, line.line_number))
                    .collect::<Result<_, _>>()?;

                let (src, dst) = match operands.as_slice() {
                    [] => (None, None),
                    [dst] => (None, Some(dst.clone())),
                    [src, dst] => (Some(src.clone()), Some(dst.clone())),
                    _ => unreachable!("operand count already validated by the first pass"),
                };

                let src_ordinal = src.as_ref().map(|o| o.mode().ordinal()).unwrap_or(0);
                let dst_ordinal = dst.as_ref().map(|o| o.mode().ordinal()).unwrap_or(0);
                instruction_words.push(pack_instruction_header(
                    info.ordinal,
                    src_ordinal,
                    dst_ordinal,
                    Are::Absolute,
                ));
                ic += 1;

                match (src, dst) {
                    (None, None) => {}
                    (None, Some(operand)) => {
                        encode_operand(
                            &operand,
                            ic,
                            symbol_table,
                            line.line_number,
                            &mut instruction_words,
                            &mut external_refs,
                        )?;
                        ic += operand_word_count(&operand);
                    }
                    (Some(Operand::Register(a)), Some(Operand::Register(b))) => {
                        instruction_words.push(pack_register_pair_word(a.index(), b.index()));
                        ic += 1;
                    }
                    (Some(src_op), Some(dst_op)) => {
                        encode_operand(
                            &src_op,
                            ic,
                            symbol_table,
                            line.line_number,
                            &mut instruction_words,
                            &mut external_refs,
                        )?;
                        ic += operand_word_count(&src_op);
                        encode_operand(
                            &dst_op,
                            ic,
                            symbol_table,
                            line.line_number,
                            &mut instruction_words,
                            &mut external_refs,
                        )?;
                        ic += operand_word_count(&dst_op);
                    }
                }
            }
            Command::Directive(Directive::Data) => {
                for raw in &line.operands {
                    let value = parse_signed_decimal(raw)
                        .expect("the first pass already validated every .data operand");
                    data_words.push(wrap_to_bits(value, 10));
                }
            }
            Command::Directive(Directive::String) => {
                let content = parse_string_operand(&line.operands[0])
                    .expect("the first pass already validated the .string operand");
                for ch in content.chars() {
                    data_words.push(wrap_to_bits(ch as i32, 10));
                }
                data_words.push(0);
            }
            Command::Directive(Directive::Mat) => {
                let (rows, cols) = parse_matrix_dims(&line.operands[0])
                    .expect("the first pass already validated the .mat dimensions");
                let cell_count = rows * cols;
                let initial_values = &line.operands[1..];
                for i in 0..cell_count {
                    let word = match initial_values.get(i as usize) {
                        Some(raw) => {
                            let value = parse_signed_decimal(raw)
                                .expect("the first pass already validated .mat initial values");
                            wrap_to_bits(value, 10)
                        }
                        None => 0,
                    };
                    data_words.push(word);
                }
            }
            Command::Directive(Directive::Extern) | Command::Directive(Directive::Entry) => {}
        }
    }

    Ok(SecondPassResult { instruction_words, data_words, external_refs })
}

fn operand_word_count(operand: &Operand) -> u32 {
    match operand.mode() {
        AddressingMode::MatrixAccess => 2,
        _ => 1,
    }
}

/// Encodes one operand's word(s) at `address` (the address of the first
/// word produced), appending to `words` and, for an external Direct
/// reference, to `external_refs`.
fn encode_operand(
    operand: &Operand,
    address: u32,
    symbol_table: &SymbolTable,
    line_number: usize,
    words: &mut Vec<Word>,
    external_refs: &mut Vec<(String, u32)>,
) -> Result<(), AssemblyError> {
    if let Some(reg) = operand_register(operand) {
        words.push(pack_single_register_word(reg.index()));
        return Ok(());
    }

    match operand {
        Operand::Immediate(value) => {
            words.push(pack_value_word(wrap_to_bits(*value, 8), Are::Absolute));
        }
        Operand::Direct(label) => {
            let word = encode_label_word(label, address, symbol_table, line_number, external_refs)?;
            words.push(word);
        }
        Operand::MatrixAccess(label, a, b) => {
            let word = encode_label_word(label, address, symbol_table, line_number, external_refs)?;
            words.push(word);
            words.push(pack_matrix_index_word(a.index(), b.index()));
        }
        Operand::Register(_) => unreachable!("handled above"),
    }
    Ok(())
}

/// Resolves `label` against the symbol table, producing a single operand
/// word. External labels emit a zero payload with ARE External and record
/// a `(name, address)` entry; anything else emits the symbol's address
/// with ARE Relocatable. An unresolved label is a reference error.
fn encode_label_word(
    label: &str,
    address: u32,
    symbol_table: &SymbolTable,
    line_number: usize,
    external_refs: &mut Vec<(String, u32)>,
) -> Result<Word, AssemblyError> {
    let symbol = symbol_table.get(label).ok_or_else(|| {
        AssemblyError::reference(line_number, format!("undefined label: \"{label}\""))
    })?;

    if symbol.kind == SymbolKind::External {
        external_refs.push((label.to_string(), address));
        return Ok(pack_value_word(0, Are::External));
    }

    Ok(pack_value_word(wrap_to_bits(symbol.address as i32, 8), Are::Relocatable))
}
