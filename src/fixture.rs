use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::session;

/// Characters product names are drawn from.
pub const PRODUCT_ALPHABET: &[char] = &['A', 'B', 'C', 'D', 'E', 'F', 'G', '1', '2', '3'];
/// Length of every generated product name.
pub const PRODUCT_NAME_LEN: usize = 3;
/// Seed used by the demonstration driver.
pub const DEFAULT_SEED: u64 = 20;

/// Generate `num` product names from `seed`. The same seed always yields the
/// same sequence.
pub fn create_products(seed: u64, num: usize) -> Vec<String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    create_products_with(&mut rng, num, PRODUCT_ALPHABET, PRODUCT_NAME_LEN)
}

/// Generate `num` names of `len` characters, each picked uniformly from
/// `alphabet`.
pub fn create_products_with(rng: &mut impl Rng, num: usize, alphabet: &[char], len: usize) -> Vec<String> {
    let _scope = session::scope("create_products");
    if alphabet.is_empty() {
        return vec![String::new(); num];
    }
    (0..num)
        .map(|_| {
            (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect()
        })
        .collect()
}
