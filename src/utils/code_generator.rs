use rand::Rng;

/// `CUS` followed by ten digits, e.g. `CUS4821093375`.
pub fn generate_customer_id() -> String {
    let mut rng = rand::thread_rng();
    format!("CUS{:010}", rng.gen_range(0..10_000_000_000_u64))
}

/// Ten-digit account number that never starts with 0.
pub fn generate_account_number() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(1_000_000_000_u64..=9_999_999_999_u64)
        .to_string()
}
