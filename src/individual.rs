use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tiny_skia as sk;

use crate::dna::Dna;
use crate::phenotype::Phenotype;
use crate::population::EvolutionContext;
use crate::render::{Frame, Renderer};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// process-wide unique identity, assigned at construction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndividualId(u64);

impl IndividualId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// one candidate drawing. immutable after construction; fitness is computed exactly once.
#[derive(Clone, Debug)]
pub struct Individual {
    id: IndividualId,
    dna: Dna,
    phenotype: Phenotype,
    fitness: f64,
}

impl Individual {
    /// wrap an already-built dna and score it
    pub fn from_dna(ctx: &EvolutionContext, dna: Dna, scratch: &mut sk::Pixmap) -> Self {
        let phenotype = ctx.settings().phenotype;
        let fitness = ctx.evaluator().evaluate(&dna, phenotype, scratch);
        Self::with_fitness(dna, phenotype, fitness)
    }

    /// wrap a dna whose fitness was computed elsewhere (parallel evaluation)
    pub(crate) fn with_fitness(dna: Dna, phenotype: Phenotype, fitness: f64) -> Self {
        Self { id: IndividualId::next(), dna, phenotype, fitness }
    }

    /// random dna, immediately evaluated
    pub fn spawn_orphan<R: Rng>(ctx: &EvolutionContext, rng: &mut R, scratch: &mut sk::Pixmap) -> Self {
        profiling::scope!("Individual::spawn_orphan");
        let settings = ctx.settings();
        let dna = Dna::random(settings.dna_length, settings.phenotype.gene_len(), rng);
        Self::from_dna(ctx, dna, scratch)
    }

    /// single-point recombination of the parents followed by mutation, then evaluation.
    /// the caller picks the parents (distinct unless the population has only one member).
    pub fn spawn_child<R: Rng>(
        ctx: &EvolutionContext,
        mother: &Individual,
        father: &Individual,
        rng: &mut R,
        scratch: &mut sk::Pixmap,
    ) -> Self {
        profiling::scope!("Individual::spawn_child");
        let dna = Dna::inherit(&mother.dna, &father.dna, ctx.mutation(), rng);
        Self::from_dna(ctx, dna, scratch)
    }

    /// draw this individual onto a caller-provided surface
    pub fn render(&self, renderer: &dyn Renderer, surface: &mut sk::PixmapMut<'_>, frame: Frame) {
        renderer.draw(surface, frame, &self.dna, self.phenotype);
    }

    pub fn id(&self) -> IndividualId {
        self.id
    }

    pub fn dna(&self) -> &Dna {
        &self.dna
    }

    pub fn phenotype(&self) -> Phenotype {
        self.phenotype
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }
}
