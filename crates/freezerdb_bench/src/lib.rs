//! Shared helpers for the freezerdb benchmarks.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

/// Generates random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generates receipt-like records that compress roughly the way real
/// receipts do: a repeated log topic followed by a random tail.
pub fn receipt_batch(count: usize, size: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut record = vec![0xA5u8; size / 2];
            record.extend((size / 2..size).map(|_| rng.gen::<u8>()));
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_are_deterministic() {
        let a = receipt_batch(4, 64, 7);
        let b = receipt_batch(4, 64, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|r| r.len() == 64));
        assert_eq!(random_data(10).len(), 10);
    }
}
