//! Tests for the two-pass assembler front-end.

use assert_hex::assert_eq_hex;
use rv32_datapath::asm::{assemble, AsmErrorKind, Layout};

const LAYOUT: Layout = Layout {
    text_start: 0x0001_0000,
    data_start: 0x1000_0000,
};

/// Assembles a snippet expected to produce exactly one word.
fn one_word(source: &str) -> u32 {
    let program = assemble(source, &LAYOUT).expect("snippet assembles");
    assert_eq!(program.text.len(), 1, "expected exactly one word");
    program.text[0].word
}

/// Tests I-type encodings against the reference words.
#[test]
fn test_encode_i_type() {
    assert_eq_hex!(one_word("addi x5, x0, -1"), 0xFFF00293);
    assert_eq_hex!(one_word("addi x6, x0, 0x123"), 0x12300313);
    assert_eq_hex!(one_word("srai x6, x5, 1"), 0x4012D313);
}

/// Tests U-type encodings against the reference words.
#[test]
fn test_encode_u_type() {
    assert_eq_hex!(one_word("lui x28, 100000"), 0x186A0E37);
    assert_eq_hex!(one_word("auipc x5, 0"), 0x00000297);
}

/// Tests load/store displacement operands, with ABI register names.
#[test]
fn test_encode_displacement() {
    assert_eq_hex!(one_word("lw t0, 4(sp)"), 0x00412283);
    assert_eq_hex!(one_word("sw x6, 0(x0)"), 0x00602023);
    assert_eq_hex!(one_word("sb a0, -1(s0)"), 0xFEA40FA3);
}

/// Tests branch and jump encodings with literal byte displacements.
#[test]
fn test_encode_branch_and_jump() {
    assert_eq_hex!(one_word("bne x5, x0, -4"), 0xFE029EE3);
    assert_eq_hex!(one_word("jal x1, 8"), 0x008000EF);
    // Single-operand jal links through ra.
    assert_eq_hex!(one_word("jal 8"), 0x008000EF);
    assert_eq_hex!(one_word("jalr x0, 0(x1)"), 0x00008067);
}

/// Tests every pseudo-op expansion.
#[test]
fn test_pseudo_ops() {
    assert_eq_hex!(one_word("mv x5, x6"), 0x00030293);
    assert_eq_hex!(one_word("li x5, -5"), 0xFFB00293);
    assert_eq_hex!(one_word("nop"), 0x00000013);
    assert_eq_hex!(one_word("ret"), 0x00008067);
    assert_eq_hex!(one_word("j 8"), 0x0080006F);
    assert_eq_hex!(one_word("halt"), 0x00000000);
}

/// Tests two-pass label resolution, backward and forward, and the
/// source-line bookkeeping of the output.
#[test]
fn test_label_resolution() {
    let source = "start:
    addi x5, x0, 3
loop:
    addi x5, x5, -1
    bne x5, x0, loop
    j done
done:
    halt
";
    let program = assemble(source, &LAYOUT).expect("assembles");
    let words: Vec<u32> = program.words();
    assert_eq!(
        words,
        vec![0x00300293, 0xFFF28293, 0xFE029EE3, 0x0040006F, 0x00000000]
    );
    let lines: Vec<usize> = program.text.iter().map(|w| w.line).collect();
    assert_eq!(lines, vec![2, 4, 5, 6, 8]);
    assert!(program.data.is_empty());
}

/// Tests the data directives, including alignment padding and the
/// NUL-terminated string.
#[test]
fn test_data_directives() {
    let source = "    .byte 1, -1, 255
    .half 0x1234
    .align 2
    .word 0xDEADBEEF
    .string \"hi\\n\"
    .dword 1
";
    let program = assemble(source, &LAYOUT).expect("assembles");
    assert!(program.text.is_empty());
    assert_eq!(
        program.data,
        vec![
            1, 0xFF, 0xFF, // .byte
            0x34, 0x12, // .half
            0, 0, 0, // .align 2
            0xEF, 0xBE, 0xAD, 0xDE, // .word
            b'h', b'i', b'\n', 0, // .string
            1, 0, 0, 0, 0, 0, 0, 0, // .dword
        ]
    );
}

/// Tests comment and blank-line handling.
#[test]
fn test_comments_and_blank_lines() {
    let source = "# leading comment

addi x5, x0, 1 # trailing comment
";
    let program = assemble(source, &LAYOUT).expect("assembles");
    assert_eq!(program.text.len(), 1);
    assert_eq_hex!(program.text[0].word, 0x00100293);
    assert_eq!(program.text[0].line, 3);
}

/// Tests that an unknown mnemonic reports its line and column.
#[test]
fn test_unknown_mnemonic_position() {
    let err = assemble("  foo x1, x2", &LAYOUT).unwrap_err();
    assert_eq!(err.line, 1);
    assert_eq!(err.col, 3);
    assert_eq!(err.kind, AsmErrorKind::UnknownMnemonic("foo".to_string()));
}

/// Tests that an unknown register reports the operand column.
#[test]
fn test_unknown_register_position() {
    let err = assemble("addi q5, x0, 1", &LAYOUT).unwrap_err();
    assert_eq!((err.line, err.col), (1, 6));
    assert_eq!(err.kind, AsmErrorKind::UnknownRegister("q5".to_string()));
}

/// Tests the strict 12-bit range of `li`.
#[test]
fn test_li_range() {
    let err = assemble("nop\nli x5, 4096\n", &LAYOUT).unwrap_err();
    assert_eq!((err.line, err.col), (2, 8));
    assert_eq!(
        err.kind,
        AsmErrorKind::ImmediateRange {
            value: 4096,
            what: "li (12-bit)"
        }
    );
    assert_eq_hex!(one_word("li x5, 2047"), 0x7FF00293);
}

/// Tests that a reference to a missing label is an error.
#[test]
fn test_unknown_label() {
    let err = assemble("j nowhere", &LAYOUT).unwrap_err();
    assert_eq!((err.line, err.col), (1, 3));
    assert_eq!(err.kind, AsmErrorKind::UnknownLabel("nowhere".to_string()));
}

/// Tests that rebinding a label is an error at the second definition.
#[test]
fn test_duplicate_label() {
    let source = "dup:
    nop
dup:
    halt
";
    let err = assemble(source, &LAYOUT).unwrap_err();
    assert_eq!((err.line, err.col), (3, 1));
    assert_eq!(err.kind, AsmErrorKind::DuplicateLabel("dup".to_string()));
}

/// Tests that an odd branch displacement is rejected.
#[test]
fn test_unaligned_branch_target() {
    let err = assemble("beq x0, x0, 3", &LAYOUT).unwrap_err();
    assert_eq!((err.line, err.col), (1, 13));
    assert_eq!(err.kind, AsmErrorKind::UnalignedTarget { offset: 3 });
}

/// Tests that an unterminated string literal is rejected.
#[test]
fn test_unterminated_string() {
    let err = assemble(".string \"abc", &LAYOUT).unwrap_err();
    assert_eq!(err.line, 1);
    assert_eq!(err.kind, AsmErrorKind::UnterminatedString);
}

/// Tests that extra operands are rejected at their column.
#[test]
fn test_extra_operand() {
    let err = assemble("nop x1", &LAYOUT).unwrap_err();
    assert_eq!(err.line, 1);
    assert_eq!(err.kind, AsmErrorKind::ExtraOperand);
}
