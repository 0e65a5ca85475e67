//! Unit tests for the bit-vector and truth-table utilities.

use rv32_datapath::common::{Bits, TruthTable};

/// Tests the round-trip law: `to_int(Bits(v, width, signed), signed) == v`
/// for in-range values of both signednesses.
#[test]
fn test_bits_round_trip() {
    for width in [1u32, 5, 12, 13, 21, 32, 33] {
        let max = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
        for v in [0, 1, max / 2, max] {
            assert_eq!(Bits::unsigned(v, width).to_u64(), v);
        }
        if width > 1 {
            let lo = -(1i64 << (width - 1));
            let hi = (1i64 << (width - 1)) - 1;
            for v in [lo, -1, 0, 1, hi] {
                assert_eq!(Bits::signed(v, width).to_i64(), v);
            }
        }
    }
}

/// Tests that a sliced word can be reassembled by an MSB-first join.
#[test]
fn test_bits_slice_join_reassembly() {
    let word = Bits::unsigned(0x186A_0E37, 32);
    let rebuilt = Bits::join(&[word.slice(12, 32), word.slice(7, 12), word.slice(0, 7)]);
    assert_eq!(rebuilt.width(), 32);
    assert_eq!(rebuilt.to_u64(), 0x186A_0E37);
}

/// Tests single-bit access, LSB-first.
#[test]
fn test_bits_bit_access() {
    let v = Bits::unsigned(0b100110, 6);
    assert!(!v.bit(0));
    assert!(v.bit(1));
    assert!(v.bit(2));
    assert!(!v.bit(3));
    assert!(v.bit(5));
}

/// Tests zero extension against sign extension of a negative value.
#[test]
fn test_bits_extension() {
    let v = Bits::unsigned(0b1010, 4);
    assert_eq!(v.zero_extend(8).to_u64(), 0b0000_1010);
    assert_eq!(v.sign_extend(8).to_u64(), 0b1111_1010);
}

/// Tests that truth-table rows match in insertion order with don't-cares.
#[test]
fn test_truth_table_ordering() {
    let table = TruthTable::new(&[7])
        .row(&["0000011"], "load")
        .row(&["0X00011"], "load-or-store")
        .row(&["XXXXXXX"], "other");
    assert_eq!(
        table.lookup(&[Bits::unsigned(0b0000011, 7)]),
        Some(&"load")
    );
    assert_eq!(
        table.lookup(&[Bits::unsigned(0b0100011, 7)]),
        Some(&"load-or-store")
    );
    assert_eq!(
        table.lookup(&[Bits::unsigned(0b0110011, 7)]),
        Some(&"other")
    );
}

/// Tests that a width-mismatched lookup is treated as programmer error.
#[test]
#[should_panic(expected = "width mismatch")]
fn test_truth_table_width_mismatch_panics() {
    let table = TruthTable::new(&[7]).row(&["XXXXXXX"], ());
    let _ = table.lookup(&[Bits::unsigned(0, 3)]);
}
