/// parent selection: a survival cutoff over the ranked population and a half-normal
/// bias toward its top.
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::individual::Individual;

/// number of top-ranked individuals eligible as parents: floor(rate * size)
#[inline]
pub fn survival_cutoff(survival_rate: f64, population_size: usize) -> usize {
    (survival_rate * population_size as f64).floor() as usize
}

/// draw an index in [0, cutoff) biased toward 0.
///
/// g = |N(0,1)|, re-drawn as uniform [0,1) when it lands above 1, then scaled by the cutoff.
/// roughly 68% of draws keep the half-normal shape, the rest spread uniformly.
pub fn fit_parent_index<R: Rng>(rng: &mut R, cutoff: usize) -> usize {
    debug_assert!(cutoff > 0);
    let normal: f64 = StandardNormal.sample(rng);
    let mut g = normal.abs();
    if g > 1.0 {
        g = rng.random::<f64>();
    }
    // g == 1.0 exactly would land one past the slice
    ((g * cutoff as f64).floor() as usize).min(cutoff - 1)
}

/// pick a (mother, father) pair of indices into `ranked` (best first) from its top `cutoff`.
///
/// both draws are repeated until the two individuals differ. a slice with a single
/// candidate can only pair with itself, which is the fallback for one-member populations.
pub fn select_parents<R: Rng>(ranked: &[Individual], cutoff: usize, rng: &mut R) -> (usize, usize) {
    profiling::scope!("select_parents");
    let cutoff = cutoff.clamp(1, ranked.len().max(1));
    if cutoff == 1 {
        return (0, 0);
    }
    loop {
        let mother = fit_parent_index(rng, cutoff);
        let father = fit_parent_index(rng, cutoff);
        if ranked[mother].id() != ranked[father].id() {
            return (mother, father);
        }
    }
}
