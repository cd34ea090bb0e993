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

//! Lexical validators (§4.1). Each one returns success/failure only; it's
//! up to the caller to decide whether a failure needs a diagnostic.

use crate::ast::Register;
use crate::catalogue::lookup_opcode;

pub const MAX_LABEL_LEN: usize = 30;
pub const MAX_LINE_LEN: usize = 80;

/// `1..30` characters, alphabetic first character, alphanumeric rest, not
/// an opcode mnemonic, not a register name.
pub fn is_valid_label(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_LABEL_LEN {
        return false;
    }
    let mut chars = name.chars();
    let Some(first) = chars.next() else { return false };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    if !chars.clone().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    if lookup_opcode(name).is_some() {
        return false;
    }
    if parse_register(name).is_some() {
        return false;
    }
    true
}

/// Same rules as a label, plus it must not start with a digit (implied by
/// the alphabetic-first-character rule already) and must not collide with
/// an already-defined macro; the duplicate check is the caller's job since
/// it needs the macro table.
pub fn is_valid_macro_name(name: &str) -> bool {
    is_valid_label(name)
}

/// Exactly two characters: `r` followed by a digit `0..7`.
pub fn parse_register(text: &str) -> Option<Register> {
    let bytes = text.as_bytes();
    if bytes.len() != 2 || bytes[0] != b'r' {
        return None;
    }
    let digit = bytes[1];
    if !digit.is_ascii_digit() {
        return None;
    }
    Register::from_index(digit - b'0')
}

/// `#` followed by an optional sign and one or more decimal digits.
pub fn parse_immediate(text: &str) -> Option<i32> {
    let rest = text.strip_prefix('#')?;
    if rest.is_empty() {
        return None;
    }
    let (sign, digits) = match rest.strip_prefix(['+', '-']) {
        Some(d) => (&rest[..1], d),
        None => ("", rest),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    format!("{sign}{digits}").parse::<i32>().ok()
}

/// Begins and ends with `"`, length at least 2 (an empty string `""` is
/// accepted; its content is the empty string).
pub fn parse_string_operand(text: &str) -> Option<&str> {
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return None;
    }
    Some(&text[1..text.len() - 1])
}

/// `LABEL[rA][rB]` with no whitespace inside the brackets.
pub fn parse_matrix_access(text: &str) -> Option<(&str, Register, Register)> {
    let open1 = text.find('[')?;
    let (label, rest) = text.split_at(open1);
    if !is_valid_label(label) {
        return None;
    }
    let close1 = rest.find(']')?;
    let reg_a_text = &rest[1..close1];
    let rest2 = &rest[close1 + 1..];
    if !rest2.starts_with('[') || !rest2.ends_with(']') {
        return None;
    }
    let reg_b_text = &rest2[1..rest2.len() - 1];
    if reg_a_text.contains(char::is_whitespace) || reg_b_text.contains(char::is_whitespace) {
        return None;
    }
    let reg_a = parse_register(reg_a_text)?;
    let reg_b = parse_register(reg_b_text)?;
    Some((label, reg_a, reg_b))
}

/// Bare matrix dimensions `[rows][cols]`, both positive, no label prefix
/// (used by `.mat`'s first operand).
pub fn parse_matrix_dims(text: &str) -> Option<(u32, u32)> {
    let rest = text.strip_prefix('[')?;
    let close1 = rest.find(']')?;
    let rows_text = &rest[..close1];
    let rest2 = &rest[close1 + 1..];
    let rest2 = rest2.strip_prefix('[')?;
    if !rest2.ends_with(']') {
        return None;
    }
    let cols_text = &rest2[..rest2.len() - 1];

    let rows: u32 = rows_text.parse().ok()?;
    let cols: u32 = cols_text.parse().ok()?;
    if rows == 0 || cols == 0 {
        return None;
    }
    Some((rows, cols))
}

/// A signed decimal integer (used by `.data` and `.mat` initial values).
/// Leading `+`/`-` is allowed; there is no `#` prefix here.
pub fn parse_signed_decimal(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i32>().ok()
}

/// Line-length and character-set validation ahead of any tokenising.
pub fn check_raw_line(line: &str) -> Result<(), String> {
    if line.len() > MAX_LINE_LEN {
        return Err(format!(
            "line exceeds the {MAX_LINE_LEN}-character limit ({} characters)",
            line.len()
        ));
    }
    if let Some(bad) = line
        .chars()
        .find(|c| c.is_control() && *c != '\t' && *c != '\n' && *c != '\r')
    {
        return Err(format!("non-printable character {:?} in line", bad));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_accept_alphanumeric_starting_with_a_letter() {
        assert!(is_valid_label("LOOP"));
        assert!(is_valid_label("a1"));
        assert!(!is_valid_label("1abc"));
        assert!(!is_valid_label(""));
    }

    #[test]
    fn labels_reject_opcodes_and_registers() {
        assert!(!is_valid_label("mov"));
        assert!(!is_valid_label("r3"));
    }

    #[test]
    fn labels_enforce_max_length() {
        let ok = "a".repeat(MAX_LABEL_LEN);
        let too_long = "a".repeat(MAX_LABEL_LEN + 1);
        assert!(is_valid_label(&ok));
        assert!(!is_valid_label(&too_long));
    }

    #[test]
    fn registers_parse_r0_through_r7_only() {
        assert_eq!(parse_register("r0"), Some(Register::R0));
        assert_eq!(parse_register("r7"), Some(Register::R7));
        assert_eq!(parse_register("r8"), None);
        assert_eq!(parse_register("R1"), None);
        assert_eq!(parse_register("r12"), None);
    }

    #[test]
    fn immediates_accept_optional_sign() {
        assert_eq!(parse_immediate("#5"), Some(5));
        assert_eq!(parse_immediate("#-1"), Some(-1));
        assert_eq!(parse_immediate("#+7"), Some(7));
        assert_eq!(parse_immediate("#"), None);
        assert_eq!(parse_immediate("5"), None);
        assert_eq!(parse_immediate("#-"), None);
    }

    #[test]
    fn string_operand_requires_matching_quotes() {
        assert_eq!(parse_string_operand("\"ab\""), Some("ab"));
        assert_eq!(parse_string_operand("\"\""), Some(""));
        assert_eq!(parse_string_operand("\"ab"), None);
        assert_eq!(parse_string_operand("a"), None);
    }

    #[test]
    fn matrix_access_requires_two_bracketed_registers() {
        assert_eq!(
            parse_matrix_access("M[r1][r2]"),
            Some(("M", Register::R1, Register::R2))
        );
        assert_eq!(parse_matrix_access("M[r1]"), None);
        assert_eq!(parse_matrix_access("M[ r1][r2]"), None);
        assert_eq!(parse_matrix_access("1M[r1][r2]"), None);
    }

    #[test]
    fn matrix_dims_require_two_positive_bracketed_numbers() {
        assert_eq!(parse_matrix_dims("[2][3]"), Some((2, 3)));
        assert_eq!(parse_matrix_dims("[0][3]"), None);
        assert_eq!(parse_matrix_dims("[2]"), None);
        assert_eq!(parse_matrix_dims("2][3]"), None);
    }

    #[test]
    fn signed_decimal_requires_digits_only() {
        assert_eq!(parse_signed_decimal("5"), Some(5));
        assert_eq!(parse_signed_decimal("-5"), Some(-5));
        assert_eq!(parse_signed_decimal("+5"), Some(5));
        assert_eq!(parse_signed_decimal("5a"), None);
        assert_eq!(parse_signed_decimal(""), None);
    }

    #[test]
    fn raw_line_rejects_overlong_and_control_characters() {
        assert!(check_raw_line("mov r1, r2").is_ok());
        assert!(check_raw_line(&"a".repeat(MAX_LINE_LEN + 1)).is_err());
        assert!(check_raw_line("mov r1\x07, r2").is_err());
    }
}
