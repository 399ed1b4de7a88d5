use countprof::fixture::{create_products, DEFAULT_SEED};
use countprof::{
    Frequencies, FrequencyCounter, MembershipCounter, NativeCounter, OptimisticCounter, Profile,
    ProfileError,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Assume a year's worth of sales: which products sold most often?
const NUM_PRODUCTS: usize = 1_000_000;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

#[track_caller]
fn report(name: &'static str) -> Profile {
    Profile::new(name).sort_by("cumulative").lines_to_print(10).strip_dirs(true)
}

fn product_counter_v1(products: &[String]) -> Frequencies {
    MembershipCounter::count(products)
}

fn product_counter_v2(products: &[String]) -> Frequencies {
    OptimisticCounter::count(products)
}

fn product_counter_v3(products: &[String]) -> Frequencies {
    NativeCounter::count(products)
}

fn summarize(label: &str, counts: &Frequencies) {
    let top: Vec<String> = counts.iter().take(3).map(|(k, c)| format!("{k}={c}")).collect();
    info!(strategy = label, distinct = counts.len(), total = counts.total(), top = %top.join(" "), "counted products");
}

fn main() -> Result<(), ProfileError> {
    init_tracing();

    let products = create_products(DEFAULT_SEED, NUM_PRODUCTS);

    let v1 = report("product_counter_v1").wrap(product_counter_v1);
    let v2 = report("product_counter_v2").wrap(product_counter_v2);
    let v3 = report("product_counter_v3").wrap(product_counter_v3);

    let counts1 = v1(products.as_slice())?;
    let counts2 = v2(products.as_slice())?;
    let counts3 = v3(products.as_slice())?;

    summarize(MembershipCounter::NAME, &counts1);
    summarize(OptimisticCounter::NAME, &counts2);
    summarize(NativeCounter::NAME, &counts3);

    if !(counts1.same_counts(&counts2) && counts1.same_counts(&counts3)) {
        tracing::warn!("strategies disagree on product counts");
    }
    Ok(())
}
