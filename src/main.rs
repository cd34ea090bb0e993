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

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use tenbit_asm::assemble_file;
use tenbit_asm::file_reader::{FsOutputSink, FsSourceReader};

#[derive(ClapParser)]
#[clap(version, author = "Connor Nolan")]
struct Opts {
    /// Source files to assemble; each must end in `.as`.
    #[clap(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    let reader = FsSourceReader;

    let mut all_ok = true;
    for input in &opts.inputs {
        if input.extension().and_then(|e| e.to_str()) != Some("as") {
            eprintln!("{}: source file must have a .as extension", input.display());
            all_ok = false;
            continue;
        }

        let dir = input.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        let sink = FsOutputSink::new(dir);

        match assemble_file(input, &reader, &sink) {
            Ok(result) => println!(
                "Assembled {} ({} instruction words, {} data words)",
                input.display(),
                result.final_ic - 100,
                result.final_dc
            ),
            Err(err) => {
                eprintln!("Failed to assemble {}: {err:#}", input.display());
                all_ok = false;
            }
        }
    }

    if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
