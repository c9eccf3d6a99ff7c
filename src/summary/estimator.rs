//! HyperLogLog distinct counter for resource and connection identifiers.
//!
//! Small sets are kept exact as a set of 64-bit hashes. Once the set grows
//! past [`SPARSE_LIMIT`] it is folded into `2^PRECISION` dense registers,
//! which bounds memory per estimator at 16 KiB regardless of input size.

use std::collections::HashSet;
use xxhash_rust::xxh3::xxh3_64;

const PRECISION: u32 = 14;
const REGISTER_COUNT: usize = 1 << PRECISION;
const SPARSE_LIMIT: usize = 1024;

#[derive(Debug, Clone)]
enum Registers {
    Sparse(HashSet<u64>),
    Dense(Box<[u8]>),
}

/// Insert-only approximate distinct counter.
#[derive(Debug, Clone)]
pub struct CardinalityEstimator {
    registers: Registers,
    /// Exact distinct count observed when switching to dense registers.
    floor: u64,
}

impl Default for CardinalityEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl CardinalityEstimator {
    pub fn new() -> Self {
        Self {
            registers: Registers::Sparse(HashSet::new()),
            floor: 0,
        }
    }

    /// Record one identifier. Re-inserting an identifier has no effect on
    /// the estimate; an empty identifier is an ordinary value.
    pub fn insert(&mut self, id: &[u8]) {
        let hash = xxh3_64(id);
        let should_densify = match &mut self.registers {
            Registers::Sparse(hashes) => {
                hashes.insert(hash);
                hashes.len() > SPARSE_LIMIT
            }
            Registers::Dense(registers) => {
                update_register(registers, hash);
                false
            }
        };
        if should_densify {
            self.densify();
        }
    }

    /// Approximate number of distinct identifiers inserted so far.
    pub fn estimate(&self) -> u64 {
        match &self.registers {
            Registers::Sparse(hashes) => hashes.len() as u64,
            Registers::Dense(registers) => dense_estimate(registers).max(self.floor),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.registers {
            Registers::Sparse(hashes) => hashes.is_empty(),
            Registers::Dense(_) => false,
        }
    }

    fn densify(&mut self) {
        if let Registers::Sparse(hashes) = &self.registers {
            let mut registers = vec![0u8; REGISTER_COUNT].into_boxed_slice();
            for &hash in hashes {
                update_register(&mut registers, hash);
            }
            self.floor = hashes.len() as u64;
            self.registers = Registers::Dense(registers);
        }
    }
}

fn update_register(registers: &mut [u8], hash: u64) {
    let index = (hash >> (64 - PRECISION)) as usize;
    // Guard bit caps the rank at 64 - PRECISION + 1.
    let remainder = (hash << PRECISION) | (1 << (PRECISION - 1));
    let rank = remainder.leading_zeros() as u8 + 1;
    if rank > registers[index] {
        registers[index] = rank;
    }
}

fn dense_estimate(registers: &[u8]) -> u64 {
    let m = REGISTER_COUNT as f64;
    let mut sum = 0.0_f64;
    let mut zeros = 0usize;
    for &rank in registers {
        sum += 2.0_f64.powi(-(rank as i32));
        if rank == 0 {
            zeros += 1;
        }
    }

    let alpha = 0.7213 / (1.0 + 1.079 / m);
    let raw = alpha * m * m / sum;

    // Linear counting is far more accurate while registers are still empty.
    let estimate = if raw <= 2.5 * m && zeros > 0 {
        m * (m / zeros as f64).ln()
    } else {
        raw
    };
    estimate.round() as u64
}
