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

//! Output emission (§4.9): `.ob`, `.ent`, `.ext`, and the expanded `.am`
//! source, each written through the `OutputSink` the caller supplies.

use std::io::Write;

use crate::assembler::second_pass::SecondPassResult;
use crate::assembler::symbol_table::SymbolTable;
use crate::encoding::{addr_to_base4, strip_leading_zero_digits, word_to_base4};
use crate::errors::AssemblyError;
use crate::file_reader::OutputSink;

const CODE_START: u32 = 100;

pub fn write_am(sink: &dyn OutputSink, base_name: &str, expanded_source: &str) -> Result<(), AssemblyError> {
    let mut writer = sink.create(base_name, "am")?;
    writer.write_all(expanded_source.as_bytes())?;
    Ok(())
}

/// The header line carries (final IC − 100) and final DC, each a base-4
/// number with leading `a` digits stripped (but at least one kept).
/// Body lines are "address code", one per instruction word then one per
/// data word, addresses running from 100 upward without a gap between
/// the two segments.
pub fn write_object_file(
    sink: &dyn OutputSink,
    base_name: &str,
    final_ic: u32,
    final_dc: u32,
    second: &SecondPassResult,
) -> Result<(), AssemblyError> {
    let mut writer = sink.create(base_name, "ob")?;

    let ic_offset = strip_leading_zero_digits(&addr_to_base4(final_ic - CODE_START));
    let dc_count = strip_leading_zero_digits(&addr_to_base4(final_dc));
    writeln!(writer, "{ic_offset} {dc_count}")?;

    let mut address = CODE_START;
    for word in &second.instruction_words {
        writeln!(writer, "{} {}", addr_to_base4(address), word_to_base4(*word))?;
        address += 1;
    }
    for word in &second.data_words {
        writeln!(writer, "{} {}", addr_to_base4(address), word_to_base4(*word))?;
        address += 1;
    }

    Ok(())
}

/// One line per symbol that is both an entry and defined, in the symbol
/// table's deterministic order. Omitted entirely when there are none.
pub fn write_entries_file(
    sink: &dyn OutputSink,
    base_name: &str,
    symbol_table: &SymbolTable,
) -> Result<(), AssemblyError> {
    let entries = symbol_table.entries();
    if entries.is_empty() {
        return Ok(());
    }

    let mut writer = sink.create(base_name, "ent")?;
    for (name, symbol) in entries {
        writeln!(writer, "{name} {}", addr_to_base4(symbol.address))?;
    }
    Ok(())
}

/// One line per external reference in encounter order. Omitted entirely
/// when the list is empty.
pub fn write_externals_file(
    sink: &dyn OutputSink,
    base_name: &str,
    second: &SecondPassResult,
) -> Result<(), AssemblyError> {
    if second.external_refs.is_empty() {
        return Ok(());
    }

    let mut writer = sink.create(base_name, "ext")?;
    for (name, address) in &second.external_refs {
        writeln!(writer, "{name} {}", addr_to_base4(*address))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::first_pass::run_first_pass;
    use crate::assembler::second_pass::run_second_pass;
    use crate::file_reader::MockOutputSink;
    use crate::parser::parse_program;

    fn assemble(source: &str) -> (MockOutputSink, u32, u32, SecondPassResult, SymbolTable) {
        let (lines, parse_errors) = parse_program(source);
        assert!(parse_errors.is_empty(), "{parse_errors:?}");
        let first = run_first_pass(&lines).unwrap();
        let second = run_second_pass(&lines, &first.symbol_table).unwrap();
        (MockOutputSink::new(), first.final_ic, first.final_dc, second, first.symbol_table)
    }

    #[test]
    fn object_file_header_reports_stripped_counts() {
        let (sink, final_ic, final_dc, second, _) = assemble("mov r1, r2\n");
        write_object_file(&sink, "prog", final_ic, final_dc, &second).unwrap();
        let contents = sink.contents("prog", "ob").unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, "c a");
    }

    #[test]
    fn object_file_body_has_one_line_per_word() {
        let (sink, final_ic, final_dc, second, _) = assemble("N: .data 1, -1, 5\n");
        write_object_file(&sink, "prog", final_ic, final_dc, &second).unwrap();
        let contents = sink.contents("prog", "ob").unwrap();
        assert_eq!(contents.lines().count(), 1 + 3);
    }

    #[test]
    fn entries_file_is_omitted_when_empty() {
        let (sink, _, _, _, symbols) = assemble("stop\n");
        write_entries_file(&sink, "prog", &symbols).unwrap();
        assert!(!sink.has_file("prog", "ent"));
    }

    #[test]
    fn entries_file_lists_defined_entries() {
        let (sink, _, _, _, symbols) = assemble(".entry N\nN: .data 7\n");
        write_entries_file(&sink, "prog", &symbols).unwrap();
        let contents = sink.contents("prog", "ent").unwrap();
        assert!(contents.starts_with("N "));
    }

    #[test]
    fn externals_file_lists_encounter_order() {
        let (sink, _, _, second, _) = assemble(".extern X\njmp X\n");
        write_externals_file(&sink, "prog", &second).unwrap();
        let contents = sink.contents("prog", "ext").unwrap();
        assert_eq!(contents.trim_end(), "X bcbb");
    }
}
