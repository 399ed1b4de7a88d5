use std::time::Instant;

use countprof::fixture::{create_products, DEFAULT_SEED};
use countprof::{FrequencyCounter, MembershipCounter, NativeCounter, OptimisticCounter};

fn run_case<C: FrequencyCounter>(products: &[String]) {
    let t0 = Instant::now();
    let counts = C::count(products);
    let dur = t0.elapsed();
    println!(
        "{:<10} n={:<8} distinct={:<5} build_time={:?}",
        C::NAME,
        products.len(),
        counts.len(),
        dur
    );
}

fn main() {
    let sizes = [1_000usize, 10_000, 100_000, 1_000_000];
    for &n in &sizes {
        let products = create_products(DEFAULT_SEED, n);
        run_case::<MembershipCounter>(&products);
        run_case::<OptimisticCounter>(&products);
        run_case::<NativeCounter>(&products);
    }
}
