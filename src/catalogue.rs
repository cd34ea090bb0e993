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

//! The instruction catalogue: the sole source of truth for operand arity
//! and legal addressing modes per opcode (§4.2, §6).

/// Mode masks, reused from `AddressingMode::mask()` so the table below
/// reads the same as the appendix in the spec.
const IMM: u8 = 0b0001;
const DIR: u8 = 0b0010;
const MAT: u8 = 0b0100;
const REG: u8 = 0b1000;
const NONE: u8 = 0;
const ANY: u8 = IMM | DIR | MAT | REG;
const DEST_ONLY: u8 = DIR | MAT | REG;
const LABEL_ONLY: u8 = DIR | MAT;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Opcode {
    Mov,
    Cmp,
    Add,
    Sub,
    Not,
    Clr,
    Lea,
    Inc,
    Dec,
    Jmp,
    Bne,
    Red,
    Prn,
    Jsr,
    Rts,
    Stop,
}

#[derive(Debug, Copy, Clone)]
pub struct OpcodeInfo {
    pub opcode: Opcode,
    pub name: &'static str,
    pub ordinal: u8,
    pub operand_count: u8,
    pub src_mask: u8,
    pub dst_mask: u8,
}

/// A fixed array keyed by opcode ordinal (§4.2). Lookup by name is a
/// linear scan, matching the spec's description of the catalogue as the
/// sole source of truth rather than a derived data structure.
pub const CATALOGUE: [OpcodeInfo; 16] = [
    OpcodeInfo { opcode: Opcode::Mov, name: "mov", ordinal: 0, operand_count: 2, src_mask: ANY, dst_mask: DEST_ONLY },
    OpcodeInfo { opcode: Opcode::Cmp, name: "cmp", ordinal: 1, operand_count: 2, src_mask: ANY, dst_mask: ANY },
    OpcodeInfo { opcode: Opcode::Add, name: "add", ordinal: 2, operand_count: 2, src_mask: ANY, dst_mask: DEST_ONLY },
    OpcodeInfo { opcode: Opcode::Sub, name: "sub", ordinal: 3, operand_count: 2, src_mask: ANY, dst_mask: DEST_ONLY },
    OpcodeInfo { opcode: Opcode::Not, name: "not", ordinal: 4, operand_count: 1, src_mask: NONE, dst_mask: DEST_ONLY },
    OpcodeInfo { opcode: Opcode::Clr, name: "clr", ordinal: 5, operand_count: 1, src_mask: NONE, dst_mask: DEST_ONLY },
    OpcodeInfo { opcode: Opcode::Lea, name: "lea", ordinal: 6, operand_count: 2, src_mask: LABEL_ONLY, dst_mask: REG },
    OpcodeInfo { opcode: Opcode::Inc, name: "inc", ordinal: 7, operand_count: 1, src_mask: NONE, dst_mask: DEST_ONLY },
    OpcodeInfo { opcode: Opcode::Dec, name: "dec", ordinal: 8, operand_count: 1, src_mask: NONE, dst_mask: DEST_ONLY },
    OpcodeInfo { opcode: Opcode::Jmp, name: "jmp", ordinal: 9, operand_count: 1, src_mask: NONE, dst_mask: DIR | MAT },
    OpcodeInfo { opcode: Opcode::Bne, name: "bne", ordinal: 10, operand_count: 1, src_mask: NONE, dst_mask: DIR | MAT },
    OpcodeInfo { opcode: Opcode::Red, name: "red", ordinal: 11, operand_count: 1, src_mask: NONE, dst_mask: DEST_ONLY },
    OpcodeInfo { opcode: Opcode::Prn, name: "prn", ordinal: 12, operand_count: 1, src_mask: NONE, dst_mask: ANY },
    OpcodeInfo { opcode: Opcode::Jsr, name: "jsr", ordinal: 13, operand_count: 1, src_mask: NONE, dst_mask: DIR | MAT },
    OpcodeInfo { opcode: Opcode::Rts, name: "rts", ordinal: 14, operand_count: 0, src_mask: NONE, dst_mask: NONE },
    OpcodeInfo { opcode: Opcode::Stop, name: "stop", ordinal: 15, operand_count: 0, src_mask: NONE, dst_mask: NONE },
];

/// Linear lookup by mnemonic, case-sensitive (the source format is
/// lowercase-only per §6).
pub fn lookup_opcode(name: &str) -> Option<&'static OpcodeInfo> {
    CATALOGUE.iter().find(|info| info.name == name)
}

pub fn lookup_opcode_by_ordinal(ordinal: u8) -> Option<&'static OpcodeInfo> {
    CATALOGUE.iter().find(|info| info.ordinal == ordinal)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Directive {
    Data,
    String,
    Mat,
    Extern,
    Entry,
}

impl Directive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            ".data" => Some(Self::Data),
            ".string" => Some(Self::String),
            ".mat" => Some(Self::Mat),
            ".extern" => Some(Self::Extern),
            ".entry" => Some(Self::Entry),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Data => ".data",
            Self::String => ".string",
            Self::Mat => ".mat",
            Self::Extern => ".extern",
            Self::Entry => ".entry",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_sixteen_entries_in_ordinal_order() {
        for (i, info) in CATALOGUE.iter().enumerate() {
            assert_eq!(info.ordinal, i as u8);
        }
    }

    #[test]
    fn lookup_finds_known_mnemonics() {
        assert_eq!(lookup_opcode("mov").unwrap().opcode, Opcode::Mov);
        assert_eq!(lookup_opcode("stop").unwrap().opcode, Opcode::Stop);
        assert!(lookup_opcode("nope").is_none());
    }

    #[test]
    fn zero_operand_opcodes_have_empty_masks() {
        for name in ["rts", "stop"] {
            let info = lookup_opcode(name).unwrap();
            assert_eq!(info.operand_count, 0);
            assert_eq!(info.src_mask, 0);
            assert_eq!(info.dst_mask, 0);
        }
    }

    #[test]
    fn single_operand_opcodes_have_empty_source_mask() {
        for name in ["not", "clr", "inc", "dec", "red", "jmp", "bne", "prn", "jsr"] {
            assert_eq!(lookup_opcode(name).unwrap().src_mask, 0);
        }
    }

    #[test]
    fn directive_round_trips_by_name() {
        for d in [
            Directive::Data,
            Directive::String,
            Directive::Mat,
            Directive::Extern,
            Directive::Entry,
        ] {
            assert_eq!(Directive::from_name(d.name()), Some(d));
        }
        assert_eq!(Directive::from_name(".bogus"), None);
    }
}
