use burn::config::Config;

// Note: the crate's one-argument `Result` alias must stay out of this
// module's scope; the `Config` derive expands serde impls that name
// `Result<_, _>` unqualified.
use crate::error::PinnError;

/// Build-time parameters of an NLS training run.
///
/// Defaults reproduce the reference problem: domain `[-5, 5] × [0, π/2]`,
/// a 12-block residual stack of hidden width 100, 50 initial-condition
/// samples, 20 000 collocation points and a 50 000-iteration Adam budget.
/// Everything is fixed at model-build time; there is no runtime
/// reconfiguration.
#[derive(Config, Debug)]
pub struct PinnConfig {
    /// Lower corner (x, t) of the rectangular domain.
    #[config(default = "[-5.0, 0.0]")]
    pub lower_bound: [f64; 2],
    /// Upper corner (x, t) of the rectangular domain.
    #[config(default = "[5.0, std::f64::consts::FRAC_PI_2]")]
    pub upper_bound: [f64; 2],
    /// Layer widths, input to output. Widths past the first hidden one
    /// become residual blocks.
    #[config(
        default = "vec![2, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 2]"
    )]
    pub layers: Vec<usize>,
    /// Initial-condition sample count (N0).
    #[config(default = 50)]
    pub n_initial: usize,
    /// Boundary-time sample count (N_b).
    #[config(default = 50)]
    pub n_boundary: usize,
    /// Collocation sample count (N_f).
    #[config(default = 20000)]
    pub n_collocation: usize,
    /// Fixed optimizer iteration budget.
    #[config(default = 50000)]
    pub iterations: usize,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    /// Seed for sampling and parameter initialization.
    #[config(default = 1234)]
    pub seed: u64,
}

impl PinnConfig {
    /// Rejects configurations the network builder or sampler cannot honor.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.layers.len() < 2 {
            return Err(PinnError::Config(format!(
                "layer list needs at least input and output widths, got {:?}",
                self.layers
            )));
        }
        if self.layers[0] != 2 {
            return Err(PinnError::Config(format!(
                "input width must be 2 for (x, t) coordinates, got {}",
                self.layers[0]
            )));
        }
        if *self.layers.last().unwrap() != 2 {
            return Err(PinnError::Config(format!(
                "output width must be 2 for the (u, v) field, got {}",
                self.layers.last().unwrap()
            )));
        }
        for axis in 0..2 {
            if self.lower_bound[axis] >= self.upper_bound[axis] {
                return Err(PinnError::Config(format!(
                    "degenerate domain on axis {axis}: lb={} ub={}",
                    self.lower_bound[axis], self.upper_bound[axis]
                )));
            }
        }
        if self.n_initial == 0 || self.n_collocation == 0 {
            return Err(PinnError::Config(
                "sample counts n_initial and n_collocation must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PinnConfig::new().validate().unwrap();
    }

    #[test]
    fn short_layer_list_is_rejected() {
        let config = PinnConfig::new().with_layers(vec![2]);
        assert!(matches!(config.validate(), Err(PinnError::Config(_))));
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        let config = PinnConfig::new()
            .with_lower_bound([-5.0, 0.0])
            .with_upper_bound([5.0, 0.0]);
        assert!(matches!(config.validate(), Err(PinnError::Config(_))));
    }
}
