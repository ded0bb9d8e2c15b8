use rand::seq::SliceRandom;
use rand::Rng;

/// Example queries offered as clickable chips on startup.
pub const SUGGESTION_POOL: &[&str] = &[
    "recruiting breast cancer trials for women over 50",
    "phase 3 type 2 diabetes studies near Chicago",
    "pediatric asthma trials within 25 miles of Boston",
    "completed Alzheimer's disease interventional studies",
    "long COVID treatment trials",
    "melanoma immunotherapy recruiting now",
    "heart failure trials for adults over 65 near Houston",
    "depression studies using psilocybin",
    "sickle cell disease gene therapy",
    "migraine prevention trials within 50 miles of Seattle",
    "early stage lung cancer interventional trials",
    "Parkinson's disease exercise studies",
];

/// Pick `count` distinct queries from `pool` (fewer if the pool is smaller).
pub fn sample<'a, R: Rng + ?Sized>(pool: &[&'a str], count: usize, rng: &mut R) -> Vec<&'a str> {
    pool.choose_multiple(rng, count).copied().collect()
}

/// Sample from the built-in pool using the thread RNG.
pub fn sample_default(count: usize) -> Vec<&'static str> {
    sample(SUGGESTION_POOL, count, &mut rand::thread_rng())
}
