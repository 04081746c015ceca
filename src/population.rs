//─────────────────────────────────────────────────────────────────────────────
// generational loop: rank, record the fittest, breed a full replacement
//─────────────────────────────────────────────────────────────────────────────

use rand::SeedableRng;
use rand_pcg::Pcg32;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;
use tiny_skia as sk;

use crate::dna::{Dna, Mutation};
use crate::error::Result;
use crate::fitness::FitnessEvaluator;
use crate::individual::{Individual, IndividualId};
use crate::phenotype::Phenotype;
use crate::render::{Frame, Renderer};
use crate::selection::{select_parents, survival_cutoff};
use crate::settings::RunSettings;
use crate::target::TargetImage;

/// everything a run shares: the target, how to draw, how to score, and the settings
#[derive(Clone)]
pub struct EvolutionContext {
    target: Arc<TargetImage>,
    renderer: Arc<dyn Renderer>,
    evaluator: FitnessEvaluator,
    settings: RunSettings,
    mutation: Mutation,
}

impl EvolutionContext {
    /// validated context with the tiny-skia renderer described by the settings
    pub fn new(target: Arc<TargetImage>, settings: RunSettings) -> Result<Self> {
        let renderer: Arc<dyn Renderer> = Arc::new(settings.renderer());
        Self::with_renderer(target, renderer, settings)
    }

    /// validated context with a caller-supplied renderer
    pub fn with_renderer(target: Arc<TargetImage>, renderer: Arc<dyn Renderer>, settings: RunSettings) -> Result<Self> {
        settings.validate()?;
        let evaluator = FitnessEvaluator::new(Arc::clone(&target), Arc::clone(&renderer), settings.fitness_metric);
        let mutation = settings.to_mutation();
        Ok(Self { target, renderer, evaluator, settings, mutation })
    }

    pub fn target(&self) -> &Arc<TargetImage> {
        &self.target
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }
}

/// owned copy of the best individual of a generation.
/// genes are shared copy-on-write, so taking one is cheap.
#[derive(Clone, Debug)]
pub struct FittestSnapshot {
    pub id: IndividualId,
    /// generation the individual belonged to when it was ranked
    pub generation: u64,
    pub fitness: f64,
    pub dna: Dna,
    pub phenotype: Phenotype,
}

impl FittestSnapshot {
    fn of(individual: &Individual, generation: u64) -> Self {
        Self {
            id: individual.id(),
            generation,
            fitness: individual.fitness(),
            dna: individual.dna().clone(),
            phenotype: individual.phenotype(),
        }
    }

    pub fn render(&self, renderer: &dyn Renderer, surface: &mut sk::PixmapMut<'_>, frame: Frame) {
        renderer.draw(surface, frame, &self.dna, self.phenotype);
    }
}

/// fitness spread of one ranked generation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationStats {
    pub generation: u64,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

impl GenerationStats {
    /// `ranked` must be sorted best first and non-empty
    fn of(ranked: &[Individual], generation: u64) -> Self {
        let sum: f64 = ranked.iter().map(Individual::fitness).sum();
        Self {
            generation,
            best: ranked[0].fitness(),
            mean: sum / ranked.len() as f64,
            worst: ranked[ranked.len() - 1].fitness(),
        }
    }
}

pub struct Population {
    ctx: EvolutionContext,
    individuals: Vec<Individual>,
    generation: u64,
    rng: Pcg32,
    /// render target for sequential evaluation, sized like the target
    scratch: sk::Pixmap,
    fittest: FittestSnapshot,
    last_stats: Option<GenerationStats>,
}

impl Population {
    /// validate the settings, spawn the orphan generation and rank it
    pub fn new(ctx: EvolutionContext) -> Result<Self> {
        profiling::scope!("Population::new");
        let settings = ctx.settings();
        settings.validate()?;

        let seed = settings.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut scratch = ctx.evaluator().new_scratch();
        let size = settings.population_size;
        log::info!(
            "spawning {} {} individuals ({} genes, seed {:#x}, {:?}) against a {}x{} target",
            size,
            settings.phenotype,
            settings.dna_length,
            seed,
            ctx.evaluator().metric(),
            ctx.target().width(),
            ctx.target().height()
        );

        let mut individuals = if settings.parallel {
            let gene_len = settings.phenotype.gene_len();
            let dnas: Vec<Dna> = (0..size).map(|_| Dna::random(settings.dna_length, gene_len, &mut rng)).collect();
            evaluate_parallel(&ctx, dnas)
        } else {
            (0..size).map(|_| Individual::spawn_orphan(&ctx, &mut rng, &mut scratch)).collect()
        };
        rank(&mut individuals);
        let fittest = FittestSnapshot::of(&individuals[0], 0);

        Ok(Self {
            ctx,
            individuals,
            generation: 0,
            rng,
            scratch,
            fittest,
            last_stats: None,
        })
    }

    /// advance one generation: rank, record the fittest, then replace every individual
    /// with a child of two fit parents. returns the fittest of the generation just ranked.
    pub fn iterate(&mut self) -> FittestSnapshot {
        profiling::scope!("Population::iterate");

        rank(&mut self.individuals);
        self.fittest = FittestSnapshot::of(&self.individuals[0], self.generation);
        let stats = GenerationStats::of(&self.individuals, self.generation);
        log::info!("generation {}: top fitness {:.6}", stats.generation, stats.best);
        log::debug!(
            "generation {}: best {:.6} mean {:.6} worst {:.6}",
            stats.generation,
            stats.best,
            stats.mean,
            stats.worst
        );
        self.last_stats = Some(stats);

        let size = self.individuals.len();
        let cutoff = survival_cutoff(self.ctx.settings().survival_rate, size);
        let next = if self.ctx.settings().parallel {
            // draws and recombination stay on the run rng; only scoring fans out
            let dnas: Vec<Dna> = (0..size)
                .map(|_| {
                    let (m, f) = select_parents(&self.individuals, cutoff, &mut self.rng);
                    Dna::inherit(
                        self.individuals[m].dna(),
                        self.individuals[f].dna(),
                        self.ctx.mutation(),
                        &mut self.rng,
                    )
                })
                .collect();
            evaluate_parallel(&self.ctx, dnas)
        } else {
            let mut next = Vec::with_capacity(size);
            for _ in 0..size {
                let (m, f) = select_parents(&self.individuals, cutoff, &mut self.rng);
                next.push(Individual::spawn_child(
                    &self.ctx,
                    &self.individuals[m],
                    &self.individuals[f],
                    &mut self.rng,
                    &mut self.scratch,
                ));
            }
            next
        };

        self.individuals = next;
        self.generation += 1;
        self.fittest.clone()
    }

    /// fittest recorded at the last ranking
    pub fn fittest(&self) -> &FittestSnapshot {
        &self.fittest
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// number of completed iterations
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn last_stats(&self) -> Option<GenerationStats> {
        self.last_stats
    }

    pub fn context(&self) -> &EvolutionContext {
        &self.ctx
    }
}

/// sort best first
fn rank(individuals: &mut [Individual]) {
    profiling::scope!("rank");
    individuals.sort_by(|a, b| b.fitness().partial_cmp(&a.fitness()).unwrap_or(Ordering::Equal));
}

/// score dnas on the rayon pool, one scratch pixmap per worker. output keeps input order.
fn evaluate_parallel(ctx: &EvolutionContext, dnas: Vec<Dna>) -> Vec<Individual> {
    profiling::scope!("evaluate_parallel");
    let evaluator = ctx.evaluator();
    let phenotype = ctx.settings().phenotype;
    dnas.into_par_iter()
        .map_init(
            || evaluator.new_scratch(),
            |scratch, dna| {
                let fitness = evaluator.evaluate(&dna, phenotype, scratch);
                Individual::with_fitness(dna, phenotype, fitness)
            },
        )
        .collect()
}
