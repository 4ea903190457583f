use ::rand::Rng;

/// Number of sensor inputs every brain reads.
pub const INPUTS: usize = 3;

/// Decoded weights and biases span [-WEIGHT_RANGE, WEIGHT_RANGE].
pub const WEIGHT_RANGE: f32 = 8.0;

/// Genes for a 3 -> H -> 1 network.
/// Layout: [input->hidden: H*3] [hidden biases: H] [hidden->output: H] [output bias: 1].
/// With no hidden layer: [input->output: 3] [output bias: 1].
pub fn gene_count(hidden: usize) -> usize {
    if hidden == 0 {
        INPUTS + 1
    } else {
        hidden * INPUTS + hidden + hidden + 1
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Genome {
    /// Raw gene values, all in [0, 1].
    pub genes: Vec<f32>,
    pub hidden: usize,
}

impl Genome {
    pub fn random(rng: &mut impl Rng, hidden: usize) -> Self {
        let genes = (0..gene_count(hidden))
            .map(|_| rng.gen_range(0.0..1.0))
            .collect();
        Self { genes, hidden }
    }

    /// Mutate this genome, returning a new child genome.
    pub fn mutate(&self, rng: &mut impl Rng, rate: f32, sigma: f32) -> Self {
        let mut child = self.clone();
        for gene in &mut child.genes {
            if rng.gen::<f32>() < rate {
                *gene += rng.gen_range(-sigma..sigma);
                *gene = gene.clamp(0.0, 1.0);
            }
        }
        child
    }

    /// Map gene `i` from [0,1] to [-8, 8].
    pub fn decoded(&self, i: usize) -> f32 {
        (self.genes[i] - 0.5) * 2.0 * WEIGHT_RANGE
    }

    pub fn is_well_formed(&self) -> bool {
        self.genes.len() == gene_count(self.hidden)
            && self.genes.iter().all(|g| (0.0..=1.0).contains(g))
    }
}
