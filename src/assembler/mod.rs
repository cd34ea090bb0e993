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

//! Top-level per-file orchestration (§1, §10.1): macro expansion, parsing,
//! the two passes, and output emission, threaded through the
//! `SourceReader`/`OutputSink` traits so the core never touches the
//! filesystem directly.

pub mod first_pass;
pub mod output;
pub mod second_pass;
pub mod symbol_table;

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::errors::render_diagnostics;
use crate::file_reader::{OutputSink, SourceReader};
use crate::parser::parse_program;
use crate::preprocessor::expand_macros;

/// What a successfully assembled file produced, for the driver's summary.
pub struct AssembledFile {
    pub base_name: String,
    pub final_ic: u32,
    pub final_dc: u32,
}

pub fn assemble_file(
    source_path: &Path,
    reader: &dyn SourceReader,
    sink: &dyn OutputSink,
) -> Result<AssembledFile> {
    let base_name = source_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("source path has no file name: {}", source_path.display()))?
        .to_string();

    let source = reader
        .read_to_string(source_path)
        .with_context(|| format!("Failed reading source file: {}", source_path.display()))?;

    let expanded = expand_macros(&source).map_err(|errors| {
        anyhow!(render_diagnostics(&errors)).context("Failed during assembler phase 0 (macro expansion)")
    })?;

    output::write_am(sink, &base_name, &expanded)
        .context("Failed writing expanded source (.am)")?;

    let (lines, parse_errors) = parse_program(&expanded);
    if !parse_errors.is_empty() {
        return Err(anyhow!(render_diagnostics(&parse_errors))
            .context("Failed during assembler phase 1 (line parsing)"));
    }

    let first = first_pass::run_first_pass(&lines).map_err(|errors| {
        anyhow!(render_diagnostics(&errors)).context("Failed during assembler phase 1 (first pass)")
    })?;

    let second = second_pass::run_second_pass(&lines, &first.symbol_table)
        .context("Failed during assembler phase 2 (second pass)")?;

    output::write_object_file(sink, &base_name, first.final_ic, first.final_dc, &second)
        .context("Failed writing object file (.ob)")?;
    output::write_entries_file(sink, &base_name, &first.symbol_table)
        .context("Failed writing entries file (.ent)")?;
    output::write_externals_file(sink, &base_name, &second)
        .context("Failed writing externals file (.ext)")?;

    Ok(AssembledFile { base_name, final_ic: first.final_ic, final_dc: first.final_dc })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_reader::{MockOutputSink, MockSourceReader};
    use std::path::Path;

    #[test]
    fn assembles_a_simple_program_end_to_end() {
        let mut reader = MockSourceReader::default();
        reader.add_file("prog.as", "mov r1, r2\nstop\n");
        let sink = MockOutputSink::new();

        let result = assemble_file(Path::new("prog.as"), &reader, &sink).unwrap();
        assert_eq!(result.base_name, "prog");
        assert_eq!(result.final_ic, 103);
        assert!(sink.has_file("prog", "am"));
        assert!(sink.has_file("prog", "ob"));
        assert!(!sink.has_file("prog", "ent"));
        assert!(!sink.has_file("prog", "ext"));
    }

    #[test]
    fn macro_calls_are_expanded_before_parsing() {
        let mut reader = MockSourceReader::default();
        reader.add_file("prog.as", "mcro M\nmov r1, r2\nmcroend\nM\nstop\n");
        let sink = MockOutputSink::new();

        assemble_file(Path::new("prog.as"), &reader, &sink).unwrap();
        let am = sink.contents("prog", "am").unwrap();
        assert_eq!(am, "mov r1, r2\nstop\n");
    }

    #[test]
    fn a_reference_error_produces_no_object_file() {
        let mut reader = MockSourceReader::default();
        reader.add_file("prog.as", "jmp GHOST\n");
        let sink = MockOutputSink::new();

        assert!(assemble_file(Path::new("prog.as"), &reader, &sink).is_err());
        assert!(!sink.has_file("prog", "ob"));
    }

    #[test]
    fn a_structural_error_in_the_first_pass_aborts_before_the_second_pass() {
        let mut reader = MockSourceReader::default();
        reader.add_file("prog.as", "mov r1\n");
        let sink = MockOutputSink::new();

        assert!(assemble_file(Path::new("prog.as"), &reader, &sink).is_err());
        assert!(sink.has_file("prog", "am"));
        assert!(!sink.has_file("prog", "ob"));
    }
}
