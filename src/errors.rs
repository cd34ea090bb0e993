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

use thiserror::Error;

/// One diagnostic. Every variant but `Io` carries the 1-based source line
/// it was raised against.
#[derive(Error, Debug, PartialEq)]
pub enum AssemblyError {
    #[error("Lexical error on line {line}: {message}")]
    Lexical { line: usize, message: String },

    #[error("Naming error on line {line}: {message}")]
    Naming { line: usize, message: String },

    #[error("Structural error on line {line}: {message}")]
    Structural { line: usize, message: String },

    #[error("Reference error on line {line}: {message}")]
    Reference { line: usize, message: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl AssemblyError {
    pub fn lexical(line: usize, message: impl Into<String>) -> Self {
        Self::Lexical { line, message: message.into() }
    }

    pub fn naming(line: usize, message: impl Into<String>) -> Self {
        Self::Naming { line, message: message.into() }
    }

    pub fn structural(line: usize, message: impl Into<String>) -> Self {
        Self::Structural { line, message: message.into() }
    }

    pub fn reference(line: usize, message: impl Into<String>) -> Self {
        Self::Reference { line, message: message.into() }
    }
}

impl From<std::io::Error> for AssemblyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io { message: err.to_string() }
    }
}

/// Renders a batch of diagnostics the way they're written to the error
/// stream: one per line, in detection order.
pub fn render_diagnostics(errors: &[AssemblyError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
