use crate::genome::{Genome, INPUTS};
use crate::oracle::{DecisionOracle, Inputs, OracleError};

/// Feed-forward tanh network decoded from a genome.
///
/// 3 inputs -> `hidden` tanh neurons -> 1 tanh output. With no hidden layer
/// the inputs feed the output directly. Stateless between ticks.
#[derive(Clone, Debug)]
pub struct FeedForwardBrain {
    hidden: usize,
    /// Row-major [hidden][INPUTS], or [1][INPUTS] when `hidden == 0`.
    input_weights: Vec<f32>,
    hidden_biases: Vec<f32>,
    output_weights: Vec<f32>,
    output_bias: f32,
}

impl FeedForwardBrain {
    pub fn from_genome(genome: &Genome) -> Result<Self, OracleError> {
        if !genome.is_well_formed() {
            return Err(OracleError(format!(
                "genome with {} genes does not fit {} hidden neurons",
                genome.genes.len(),
                genome.hidden
            )));
        }
        let h = genome.hidden;
        if h == 0 {
            return Ok(Self {
                hidden: 0,
                input_weights: (0..INPUTS).map(|i| genome.decoded(i)).collect(),
                hidden_biases: Vec::new(),
                output_weights: Vec::new(),
                output_bias: genome.decoded(INPUTS),
            });
        }

        let bias_start = h * INPUTS;
        let out_start = bias_start + h;
        Ok(Self {
            hidden: h,
            input_weights: (0..bias_start).map(|i| genome.decoded(i)).collect(),
            hidden_biases: (bias_start..out_start).map(|i| genome.decoded(i)).collect(),
            output_weights: (out_start..out_start + h).map(|i| genome.decoded(i)).collect(),
            output_bias: genome.decoded(out_start + h),
        })
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }

    pub fn forward(&self, inputs: &Inputs) -> f32 {
        if self.hidden == 0 {
            return (dot(&self.input_weights, inputs) + self.output_bias).tanh();
        }
        let mut sum = self.output_bias;
        for (j, row) in self.input_weights.chunks_exact(INPUTS).enumerate() {
            let activation = (dot(row, inputs) + self.hidden_biases[j]).tanh();
            sum += self.output_weights[j] * activation;
        }
        sum.tanh()
    }
}

impl DecisionOracle for FeedForwardBrain {
    fn decide(&mut self, inputs: &Inputs) -> Result<Vec<f32>, OracleError> {
        Ok(vec![self.forward(inputs)])
    }
}

#[inline]
fn dot(weights: &[f32], inputs: &Inputs) -> f32 {
    weights.iter().zip(inputs).map(|(w, x)| w * x).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Gene that decodes to `v`.
    fn gene(v: f32) -> f32 {
        v / 16.0 + 0.5
    }

    #[test]
    fn direct_network_is_tanh_of_weighted_sum() {
        let genome = Genome {
            genes: vec![gene(1.0), gene(0.0), gene(-1.0), gene(0.5)],
            hidden: 0,
        };
        let brain = FeedForwardBrain::from_genome(&genome).unwrap();
        let out = brain.forward(&[0.25, 9.0, 0.5]);
        assert!((out - (0.25f32 - 0.5 + 0.5).tanh()).abs() < 1e-6);
    }

    #[test]
    fn hidden_layer_feeds_the_output() {
        // One hidden neuron reading input 0, output copies it.
        let genome = Genome {
            genes: vec![
                gene(2.0),
                gene(0.0),
                gene(0.0),
                gene(0.0),
                gene(1.0),
                gene(0.0),
            ],
            hidden: 1,
        };
        let brain = FeedForwardBrain::from_genome(&genome).unwrap();
        let expected = (0.3f32 * 2.0).tanh().tanh();
        assert!((brain.forward(&[0.3, 0.0, 0.0]) - expected).abs() < 1e-6);
    }

    #[test]
    fn outputs_are_single_and_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut brain = FeedForwardBrain::from_genome(&Genome::random(&mut rng, 4)).unwrap();
        assert_eq!(brain.hidden(), 4);
        for inputs in [[250.0, 30.0, 170.0], [0.0, 0.0, 0.0], [-5.0, 1e6, 3.0]] {
            let out = brain.decide(&inputs).unwrap();
            assert_eq!(out.len(), 1);
            assert!(out[0].is_finite() && out[0].abs() <= 1.0);
        }
    }

    #[test]
    fn mismatched_genome_is_rejected() {
        let genome = Genome {
            genes: vec![0.5; 5],
            hidden: 1,
        };
        assert!(FeedForwardBrain::from_genome(&genome).is_err());
    }
}
