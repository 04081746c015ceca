//! Evolves a population of vector drawings (circles, dots, lines, bezier curves)
//! toward a target image with a generational genetic algorithm.

pub mod display;
pub mod dna;
pub mod error;
pub mod fitness;
pub mod individual;
pub mod phenotype;
pub mod population;
pub mod render;
pub mod selection;
pub mod settings;
pub mod target;

pub use display::{centering_parameters, compose_preview, CenteringParams, PreviewMode};
pub use dna::{Dna, Gene, Mutation, MutationPolicy};
pub use error::{ConfigError, EvolveError, Result, TargetError};
pub use fitness::{FitnessEvaluator, FitnessMetric};
pub use individual::{Individual, IndividualId};
pub use phenotype::{Phenotype, Primitive};
pub use population::{EvolutionContext, FittestSnapshot, GenerationStats, Population};
pub use render::{Frame, Renderer, SkiaRenderer};
pub use settings::RunSettings;
pub use target::TargetImage;
