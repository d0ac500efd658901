// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Wraparound copy into a circular FIFO region.

use proptest::prelude::*;

use shrm::{Error, FifoRegion};

/// Region of `cap` bytes whose write cursor sits at `w`.
fn region_at(cap: usize, w: usize) -> FifoRegion {
    let mut r = FifoRegion::with_capacity(cap);
    r.write(&vec![0xEE; w]).unwrap();
    assert_eq!(r.write_offset(), w);
    r
}

#[test]
fn contiguous_write() {
    let mut r = FifoRegion::with_capacity(16);
    assert_eq!(r.write(&[1, 2, 3]).unwrap(), 0);
    assert_eq!(r.write(&[4, 5]).unwrap(), 3);
    assert_eq!(r.write_offset(), 5);
    assert_eq!(&r.as_bytes()[..5], &[1, 2, 3, 4, 5]);
}

#[test]
fn wrapping_write_splits_at_end() {
    let mut r = region_at(16, 12);
    let start = r.write(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    assert_eq!(start, 12);
    assert_eq!(&r.as_bytes()[12..16], &[1, 2, 3, 4]);
    assert_eq!(&r.as_bytes()[0..4], &[5, 6, 7, 8]);
    assert_eq!(r.write_offset(), 4);
}

#[test]
fn write_ending_exactly_at_capacity() {
    let mut r = region_at(16, 10);
    r.write(&[9; 6]).unwrap();
    assert_eq!(r.write_offset(), 0);
    assert_eq!(&r.as_bytes()[10..], &[9; 6]);
}

#[test]
fn full_capacity_write_from_middle() {
    let mut r = region_at(8, 3);
    let payload: Vec<u8> = (1..=8).collect();
    r.write(&payload).unwrap();
    assert_eq!(r.write_offset(), 3);
    assert_eq!(r.as_bytes(), &[6, 7, 8, 1, 2, 3, 4, 5]);
}

#[test]
fn read_at_follows_the_wrap() {
    let mut r = region_at(16, 12);
    r.write(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    let mut out = [0u8; 8];
    r.read_at(12, &mut out).unwrap();
    assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn oversize_write_rejected() {
    let mut r = FifoRegion::with_capacity(4);
    assert!(matches!(
        r.write(&[0; 5]),
        Err(Error::Oversize {
            len: 5,
            capacity: 4
        })
    ));
    assert_eq!(r.write_offset(), 0);
}

#[test]
fn reset_rewinds_cursor() {
    let mut r = region_at(16, 7);
    r.reset();
    assert_eq!(r.write_offset(), 0);
    assert_eq!(r.write(&[1]).unwrap(), 0);
}

proptest! {
    #[test]
    fn wraparound_reconstructs_payload(
        (cap, w, payload) in (1usize..64).prop_flat_map(|cap| {
            (Just(cap), 0..cap, proptest::collection::vec(any::<u8>(), 0..=cap))
        })
    ) {
        let mut r = region_at(cap, w);
        let n = payload.len();
        prop_assert_eq!(r.write(&payload).unwrap(), w);
        prop_assert_eq!(r.write_offset(), (w + n) % cap);

        let bytes = r.as_bytes();
        for (i, b) in payload.iter().enumerate() {
            prop_assert_eq!(bytes[(w + i) % cap], *b);
        }

        let mut back = vec![0u8; n];
        r.read_at(w, &mut back).unwrap();
        prop_assert_eq!(back, payload);
    }
}
