//! Property tests for Reed-Solomon encode/decode.

use proptest::prelude::*;
use rscore::coder::ReedSolomon;

proptest! {
    /// Invariant 5: encode-then-decode reconstructs the original shards
    /// bit-exactly for any erasure pattern of weight <= M.
    #[test]
    fn encode_decode_round_trip(
        seed in any::<u64>(),
        shard_size in 1usize..64,
        erasure_count in 0usize..=3,
    ) {
        let k = 5;
        let m = 3;
        let rs = ReedSolomon::new(k, m).unwrap();

        let mut state = seed | 1;
        let mut next_byte = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state & 0xFF) as u8
        };

        let data: Vec<Vec<u8>> = (0..k)
            .map(|_| (0..shard_size).map(|_| next_byte()).collect())
            .collect();
        let data_refs: Vec<&[u8]> = data.iter().map(|v| v.as_slice()).collect();

        let mut parity_bufs: Vec<Vec<u8>> = (0..m).map(|_| vec![0u8; shard_size]).collect();
        {
            let mut parity: Vec<&mut [u8]> = parity_bufs.iter_mut().map(|v| v.as_mut_slice()).collect();
            rs.encode(&data_refs, &mut parity, shard_size).unwrap();
        }

        let mut shard_bufs: Vec<Vec<u8>> = data.clone();
        shard_bufs.extend(parity_bufs);

        let n = k + m;
        let erasure_count = erasure_count.min(m);
        let mut erased = vec![false; n];
        for i in 0..erasure_count {
            erased[i] = true;
            shard_bufs[i] = vec![0u8; shard_size];
        }

        {
            let mut shard_refs: Vec<&mut [u8]> = shard_bufs.iter_mut().map(|v| v.as_mut_slice()).collect();
            rs.decode(&mut shard_refs, &erased, shard_size).unwrap();
        }

        for i in 0..k {
            prop_assert_eq!(&shard_bufs[i], &data[i]);
        }
    }
}
