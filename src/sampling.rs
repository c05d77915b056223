//! Domain sampling for the data-supplying collaborator role.
//!
//! Collocation points come from a Latin hypercube over the (x, t)
//! rectangle: one occupied stratum per sample on each axis, with the axis
//! pairings shuffled. Initial-condition positions and boundary times are
//! plain uniform draws. Every function takes the caller's `StdRng`; the
//! crate never reads ambient global randomness.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Space-filling (x, t) sample of size `n` over the rectangle `lb..ub`.
pub fn latin_hypercube(
    rng: &mut StdRng,
    n: usize,
    lb: [f64; 2],
    ub: [f64; 2],
) -> Vec<[f64; 2]> {
    let mut unit = [vec![0.0; n], vec![0.0; n]];
    for axis in 0..2 {
        let mut strata: Vec<usize> = (0..n).collect();
        strata.shuffle(rng);
        for (slot, stratum) in strata.into_iter().enumerate() {
            unit[axis][slot] = (stratum as f64 + rng.random::<f64>()) / n as f64;
        }
    }
    (0..n)
        .map(|i| {
            [
                lb[0] + (ub[0] - lb[0]) * unit[0][i],
                lb[1] + (ub[1] - lb[1]) * unit[1][i],
            ]
        })
        .collect()
}

/// Draws `n` initial positions uniformly over `[x_lb, x_ub]` and attaches
/// the ground-truth field from `initial_field: x -> (u, v)`.
pub fn initial_condition_samples(
    rng: &mut StdRng,
    n: usize,
    x_lb: f64,
    x_ub: f64,
    initial_field: impl Fn(f64) -> (f64, f64),
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(n);
    let mut us = Vec::with_capacity(n);
    let mut vs = Vec::with_capacity(n);
    for _ in 0..n {
        let x = rng.random_range(x_lb..x_ub);
        let (u, v) = initial_field(x);
        xs.push(x);
        us.push(u);
        vs.push(v);
    }
    (xs, us, vs)
}

/// Draws `n` boundary times uniformly over `[t_lb, t_ub]`. The cubic-NLS
/// loss applies no boundary term; these samples exist for collaborators
/// that do.
pub fn boundary_times(rng: &mut StdRng, n: usize, t_lb: f64, t_ub: f64) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(t_lb..t_ub)).collect()
}
