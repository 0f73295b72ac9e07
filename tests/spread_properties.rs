//! Property and scenario tests for round-robin spread/unspread.

use proptest::prelude::*;
use rscore::spread::{spread, unspread};

proptest! {
    /// Invariant 4: `unspread(spread(x)) == x` for any length that is a
    /// multiple of `16*K`.
    #[test]
    fn spread_unspread_round_trips(k in 1usize..=6, rounds in 0usize..8) {
        let input: Vec<u8> = (0..(16 * k * rounds))
            .map(|i| (i % 256) as u8)
            .collect();
        let shards = spread(&input, k).unwrap();
        let shard_refs: Vec<&[u8]> = shards.iter().map(|s| s.as_slice()).collect();
        let out = unspread(&shard_refs, input.len()).unwrap();
        prop_assert_eq!(out, input);
    }
}

#[test]
fn spread_scenario_k3_q2() {
    let k = 3;
    let q = 2;
    let input: Vec<u8> = (0..(16 * k * q) as u32).map(|i| i as u8).collect();
    let shards = spread(&input, k).unwrap();

    let mut expected0: Vec<u8> = (0..16).collect();
    expected0.extend(48..64);
    let mut expected1: Vec<u8> = (16..32).collect();
    expected1.extend(64..80);
    let mut expected2: Vec<u8> = (32..48).collect();
    expected2.extend(80..96);

    assert_eq!(shards[0], expected0);
    assert_eq!(shards[1], expected1);
    assert_eq!(shards[2], expected2);

    let shard_refs: Vec<&[u8]> = shards.iter().map(|s| s.as_slice()).collect();
    let out = unspread(&shard_refs, input.len()).unwrap();
    assert_eq!(out, input);
}
