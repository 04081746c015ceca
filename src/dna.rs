use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// one drawable primitive: a fixed-length vector of values in [0,1].
/// index 0 is the activation flag (see `phenotype::is_recessive`).
#[derive(Clone, Debug, PartialEq)]
pub struct Gene(Vec<f32>);

impl Gene {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn random<R: Rng>(len: usize, rng: &mut R) -> Self {
        Self((0..len).map(|_| rng.random::<f32>()).collect())
    }
}

impl Deref for Gene {
    type Target = [f32];
    fn deref(&self) -> &[f32] {
        &self.0
    }
}

impl DerefMut for Gene {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.0
    }
}

// arc wrapper enables copy-on-write: a child shares every gene it inherits unchanged,
// and mutation uses Arc::make_mut() to clone only the genes it actually touches.
#[derive(Clone, Debug, PartialEq)]
pub struct Dna {
    genes: Vec<Arc<Gene>>,
}

impl Dna {
    pub fn from_genes(genes: Vec<Gene>) -> Self {
        Self { genes: genes.into_iter().map(Arc::new).collect() }
    }

    /// random orphan dna: `dna_len` genes of `gene_len` independent uniform values
    pub fn random<R: Rng>(dna_len: usize, gene_len: usize, rng: &mut R) -> Self {
        profiling::scope!("Dna::random");
        Self {
            genes: (0..dna_len).map(|_| Arc::new(Gene::random(gene_len, rng))).collect(),
        }
    }

    /// single-point crossover, before any mutation. genes at index <= split come from
    /// the mother, genes after it from the father.
    pub fn crossover(mother: &Dna, father: &Dna, split: usize) -> Self {
        debug_assert_eq!(mother.len(), father.len());
        let genes = mother
            .genes
            .iter()
            .zip(&father.genes)
            .enumerate()
            .map(|(i, (m, f))| if i <= split { Arc::clone(m) } else { Arc::clone(f) })
            .collect();
        Self { genes }
    }

    /// recombine two parents with one random split point, then mutate every inherited gene
    pub fn inherit<R: Rng>(mother: &Dna, father: &Dna, mutation: &Mutation, rng: &mut R) -> Self {
        profiling::scope!("Dna::inherit");
        let split = rng.random_range(0..mother.len().max(1));
        let mut child = Dna::crossover(mother, father, split);
        for gene in &mut child.genes {
            mutation.apply(gene, rng);
        }
        child
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn gene(&self, index: usize) -> Option<&Gene> {
        self.genes.get(index).map(|g| &**g)
    }

    /// genes in paint order
    pub fn genes(&self) -> impl ExactSizeIterator<Item = &Gene> + '_ {
        self.genes.iter().map(|g| &**g)
    }

    /// true if both dna share the same allocation for gene `index` (inherited unmutated)
    pub fn shares_gene_with(&self, other: &Dna, index: usize) -> bool {
        match (self.genes.get(index), other.genes.get(index)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// how a child's inherited values are perturbed. one policy per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPolicy {
    /// nudge by a uniform step in [-impact, impact]; out-of-range results are re-rolled
    Continuous,
    /// replace with a fresh uniform value
    Discrete,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mutation {
    pub policy: MutationPolicy,
    /// per-value probability
    pub chance: f32,
    pub impact: f32,
}

impl Default for Mutation {
    fn default() -> Self {
        Self {
            policy: MutationPolicy::Continuous,
            chance: 0.01,
            impact: 0.1,
        }
    }
}

impl Mutation {
    /// roll every value of the gene. only clones the gene if some value actually changes.
    pub fn apply<R: Rng>(&self, gene: &mut Arc<Gene>, rng: &mut R) {
        for i in 0..gene.len() {
            if rng.random::<f32>() < self.chance {
                let values = Arc::make_mut(gene);
                values[i] = self.mutate_value(values[i], rng);
            }
        }
    }

    /// the new value for one value that was picked for mutation. always within [0,1].
    pub fn mutate_value<R: Rng>(&self, value: f32, rng: &mut R) -> f32 {
        match self.policy {
            MutationPolicy::Discrete => rng.random::<f32>(),
            MutationPolicy::Continuous => {
                let candidate = value + self.impact * (rng.random::<f32>() * 2.0 - 1.0);
                // no clamping: leaving the unit range means a fresh random value
                if (0.0..=1.0).contains(&candidate) {
                    candidate
                } else {
                    rng.random::<f32>()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn labelled(dna_len: usize, label: f32) -> Dna {
        Dna::from_genes((0..dna_len).map(|i| Gene::new(vec![label, i as f32 / 100.0])).collect())
    }

    #[test]
    fn test_random_shape_and_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        let dna = Dna::random(100, 8, &mut rng);
        assert_eq!(dna.len(), 100);
        assert!(dna.genes().all(|g| g.len() == 8));
        assert!(dna.genes().flat_map(|g| g.iter()).all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_random_is_seed_deterministic() {
        let a = Dna::random(20, 7, &mut Pcg32::seed_from_u64(42));
        let b = Dna::random(20, 7, &mut Pcg32::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_crossover_split_at_end_is_all_mother() {
        let mother = labelled(5, 0.0);
        let father = labelled(5, 1.0);
        let child = Dna::crossover(&mother, &father, 4);
        assert_eq!(child, mother);
    }

    #[test]
    fn test_crossover_shares_unmutated_genes() {
        let mother = labelled(4, 0.0);
        let father = labelled(4, 1.0);
        let child = Dna::crossover(&mother, &father, 1);
        assert!(child.shares_gene_with(&mother, 0));
        assert!(child.shares_gene_with(&mother, 1));
        assert!(child.shares_gene_with(&father, 2));
        assert!(child.shares_gene_with(&father, 3));
    }

    #[test]
    fn test_zero_chance_leaves_gene_shared() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mother = Dna::random(10, 8, &mut rng);
        let father = Dna::random(10, 8, &mut rng);
        let off = Mutation { chance: 0.0, ..Mutation::default() };
        let child = Dna::inherit(&mother, &father, &off, &mut rng);
        for i in 0..child.len() {
            assert!(child.shares_gene_with(&mother, i) || child.shares_gene_with(&father, i));
        }
    }

    #[test]
    fn test_full_chance_discrete_rewrites_values() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut gene = Arc::new(Gene::new(vec![2.0; 8])); // sentinel outside [0,1]
        let always = Mutation { policy: MutationPolicy::Discrete, chance: 1.0, impact: 0.1 };
        always.apply(&mut gene, &mut rng);
        assert!(gene.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_continuous_step_bounded_by_impact() {
        let mut rng = Pcg32::seed_from_u64(9);
        let m = Mutation { policy: MutationPolicy::Continuous, chance: 1.0, impact: 0.1 };
        for _ in 0..1_000 {
            let v = m.mutate_value(0.5, &mut rng);
            assert!((v - 0.5).abs() <= 0.1 + f32::EPSILON);
        }
    }

    proptest! {
        #[test]
        fn prop_continuous_stays_in_unit_range(value in 0.0f32..=1.0, impact in 0.0f32..2.0, seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let m = Mutation { policy: MutationPolicy::Continuous, chance: 1.0, impact };
            let v = m.mutate_value(value, &mut rng);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn prop_discrete_stays_in_unit_range(value in 0.0f32..=1.0, seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let m = Mutation { policy: MutationPolicy::Discrete, chance: 1.0, impact: 0.1 };
            let v = m.mutate_value(value, &mut rng);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn prop_crossover_law(len in 1usize..64, split_seed in any::<usize>()) {
            let split = split_seed % len;
            let mother = labelled(len, 0.0);
            let father = labelled(len, 1.0);
            let child = Dna::crossover(&mother, &father, split);
            prop_assert_eq!(child.len(), len);
            for i in 0..len {
                let expected = if i <= split { mother.gene(i) } else { father.gene(i) };
                prop_assert_eq!(child.gene(i), expected);
            }
        }

        #[test]
        fn prop_inherit_keeps_values_in_range(seed in any::<u64>(), chance in 0.0f32..=1.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mother = Dna::random(16, 8, &mut rng);
            let father = Dna::random(16, 8, &mut rng);
            for policy in [MutationPolicy::Continuous, MutationPolicy::Discrete] {
                let m = Mutation { policy, chance, impact: 0.1 };
                let child = Dna::inherit(&mother, &father, &m, &mut rng);
                prop_assert_eq!(child.len(), 16);
                prop_assert!(child.genes().flat_map(|g| g.iter()).all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }
}
