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

//! The symbol table (§4.4, §9): a keyed mapping from label name to
//! {address, kind, defined-flag, is-entry-flag}. A `BTreeMap` backs it so
//! entries-file order is deterministic without reaching for a new
//! dependency — none of the source material this crate is built from
//! pulls in an insertion-ordered map crate.

use std::collections::BTreeMap;

use crate::errors::AssemblyError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Code,
    Data,
    External,
    /// Declared via `.entry` before any definition was seen. Resolved to
    /// `Code` or `Data` once the label is actually defined.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub address: u32,
    pub kind: SymbolKind,
    pub defined: bool,
    pub is_entry: bool,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Defines `name` as `kind` at `address`. If the name already exists
    /// as a `Placeholder` (declared `.entry` before being defined), the
    /// placeholder is resolved in place and `is_entry` is preserved;
    /// otherwise a fresh, non-entry symbol is inserted. Re-defining an
    /// already-defined symbol, or defining a name already declared
    /// `.extern`, is a naming error.
    pub fn define(
        &mut self,
        name: &str,
        address: u32,
        kind: SymbolKind,
        line: usize,
    ) -> Result<(), AssemblyError> {
        match self.symbols.get_mut(name) {
            Some(existing) if existing.kind == SymbolKind::External => {
                Err(AssemblyError::naming(
                    line,
                    format!("\"{name}\" is declared external and cannot also be defined"),
                ))
            }
            Some(existing) if existing.kind == SymbolKind::Placeholder => {
                existing.address = address;
                existing.kind = kind;
                existing.defined = true;
                Ok(())
            }
            Some(existing) if existing.defined => Err(AssemblyError::naming(
                line,
                format!("duplicate label definition: \"{name}\""),
            )),
            Some(existing) => {
                existing.address = address;
                existing.kind = kind;
                existing.defined = true;
                Ok(())
            }
            None => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol { address, kind, defined: true, is_entry: false },
                );
                Ok(())
            }
        }
    }

    /// Handles a `.entry NAME` operand: if `name` is unknown, inserts an
    /// undefined `Placeholder` entry; otherwise just sets `is_entry`,
    /// leaving kind and address untouched (§4.4).
    pub fn mark_entry(&mut self, name: &str) {
        match self.symbols.get_mut(name) {
            Some(existing) => existing.is_entry = true,
            None => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol {
                        address: 0,
                        kind: SymbolKind::Placeholder,
                        defined: false,
                        is_entry: true,
                    },
                );
            }
        }
    }

    /// Handles a `.extern NAME` operand. Redeclaring an already-defined
    /// name as external is an error; redeclaring an existing external is
    /// silently idempotent.
    pub fn declare_external(&mut self, name: &str, line: usize) -> Result<(), AssemblyError> {
        match self.symbols.get(name) {
            Some(existing) if existing.kind == SymbolKind::External => Ok(()),
            Some(existing) if existing.defined => Err(AssemblyError::naming(
                line,
                format!("\"{name}\" is already defined and cannot be declared external"),
            )),
            Some(_) | None => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol {
                        address: 0,
                        kind: SymbolKind::External,
                        defined: false,
                        is_entry: false,
                    },
                );
                Ok(())
            }
        }
    }

    pub fn update_address(&mut self, name: &str, address: u32) {
        if let Some(existing) = self.symbols.get_mut(name) {
            existing.address = address;
        }
    }

    pub fn delete(&mut self, name: &str) {
        self.symbols.remove(name);
    }

    /// Releases every entry. Called once a file's outputs are written or
    /// its processing is abandoned, so no per-file state survives into
    /// the next file (§5).
    pub fn destroy(&mut self) {
        self.symbols.clear();
    }

    /// Adds `final_ic` to the address of every `Data` symbol, so data
    /// addresses sit immediately above the code segment (§4.6 end-of-pass
    /// relocation).
    pub fn relocate_data(&mut self, final_ic: u32) {
        for symbol in self.symbols.values_mut() {
            if symbol.kind == SymbolKind::Data {
                symbol.address += final_ic;
            }
        }
    }

    /// The end-of-pass-one sweep (§9): every symbol still `Placeholder`
    /// was declared `.entry` but never defined.
    pub fn undefined_entries(&self) -> Vec<&str> {
        self.symbols
            .iter()
            .filter(|(_, sym)| sym.kind == SymbolKind::Placeholder)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Entries in deterministic (name) order, for `.ent` emission:
    /// defined symbols with `is_entry` set.
    pub fn entries(&self) -> Vec<(&str, &Symbol)> {
        self.symbols
            .iter()
            .filter(|(_, sym)| sym.is_entry && sym.defined)
            .map(|(name, sym)| (name.as_str(), sym))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_lookup_round_trips() {
        let mut table = SymbolTable::new();
        table.define("LOOP", 100, SymbolKind::Code, 1).unwrap();
        let sym = table.get("LOOP").unwrap();
        assert_eq!(sym.address, 100);
        assert_eq!(sym.kind, SymbolKind::Code);
        assert!(sym.defined);
        assert!(!sym.is_entry);
    }

    #[test]
    fn duplicate_definition_is_rejected() {
        let mut table = SymbolTable::new();
        table.define("X", 100, SymbolKind::Code, 1).unwrap();
        assert!(table.define("X", 101, SymbolKind::Code, 2).is_err());
    }

    #[test]
    fn entry_before_definition_resolves_into_placeholder() {
        let mut table = SymbolTable::new();
        table.mark_entry("N");
        assert_eq!(table.get("N").unwrap().kind, SymbolKind::Placeholder);
        assert!(!table.get("N").unwrap().defined);

        table.define("N", 104, SymbolKind::Data, 5).unwrap();
        let sym = table.get("N").unwrap();
        assert_eq!(sym.kind, SymbolKind::Data);
        assert!(sym.defined);
        assert!(sym.is_entry);
        assert_eq!(sym.address, 104);
    }

    #[test]
    fn entry_after_definition_just_sets_the_flag() {
        let mut table = SymbolTable::new();
        table.define("N", 104, SymbolKind::Data, 1).unwrap();
        table.mark_entry("N");
        let sym = table.get("N").unwrap();
        assert_eq!(sym.kind, SymbolKind::Data);
        assert!(sym.is_entry);
    }

    #[test]
    fn external_cannot_be_defined_and_vice_versa() {
        let mut table = SymbolTable::new();
        table.declare_external("X", 1).unwrap();
        assert!(table.define("X", 100, SymbolKind::Code, 2).is_err());

        let mut table2 = SymbolTable::new();
        table2.define("Y", 100, SymbolKind::Code, 1).unwrap();
        assert!(table2.declare_external("Y", 2).is_err());
    }

    #[test]
    fn redeclaring_external_is_idempotent() {
        let mut table = SymbolTable::new();
        table.declare_external("X", 1).unwrap();
        assert!(table.declare_external("X", 2).is_ok());
    }

    #[test]
    fn relocate_data_shifts_only_data_symbols() {
        let mut table = SymbolTable::new();
        table.define("CODE", 100, SymbolKind::Code, 1).unwrap();
        table.define("N", 0, SymbolKind::Data, 2).unwrap();
        table.relocate_data(103);
        assert_eq!(table.get("CODE").unwrap().address, 100);
        assert_eq!(table.get("N").unwrap().address, 103);
    }

    #[test]
    fn undefined_entries_reports_only_placeholders() {
        let mut table = SymbolTable::new();
        table.mark_entry("MISSING");
        table.define("N", 100, SymbolKind::Data, 1).unwrap();
        table.mark_entry("N");
        assert_eq!(table.undefined_entries(), vec!["MISSING"]);
    }

    #[test]
    fn entries_lists_only_defined_entry_symbols_in_name_order() {
        let mut table = SymbolTable::new();
        table.define("ZEBRA", 101, SymbolKind::Code, 1).unwrap();
        table.mark_entry("ZEBRA");
        table.define("APPLE", 100, SymbolKind::Code, 2).unwrap();
        table.mark_entry("APPLE");
        table.mark_entry("MISSING");
        table.define("PLAIN", 102, SymbolKind::Code, 3).unwrap();

        let names: Vec<&str> = table.entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["APPLE", "ZEBRA"]);
    }

    #[test]
    fn destroy_clears_every_symbol() {
        let mut table = SymbolTable::new();
        table.define("X", 100, SymbolKind::Code, 1).unwrap();
        table.destroy();
        assert!(table.get("X").is_none());
    }
}
