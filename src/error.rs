use thiserror::Error;

/// configuration problems. all of these are fatal and are caught before the first generation runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown phenotype '{0}' (expected one of: lines, bezier, dots, circles, mixed)")]
    UnknownPhenotype(String),

    #[error("population size must be at least 1")]
    EmptyPopulation,

    #[error("dna length must be at least 1")]
    EmptyDna,

    #[error("survival rate must be in (0, 1], got {0}")]
    SurvivalRate(f64),

    #[error("survival cutoff of {cutoff} leaves fewer than 2 parents (population {population_size}, survival rate {survival_rate})")]
    SurvivalCutoffTooSmall {
        cutoff: usize,
        population_size: usize,
        survival_rate: f64,
    },

    #[error("mutation chance must be in [0, 1], got {0}")]
    MutationChance(f32),

    #[error("mutation impact must be non-negative, got {0}")]
    MutationImpact(f32),

    #[error("downscale ratio must be positive, got {0}")]
    DownscaleRatio(f32),
}

/// problems with the target image. surfaced before any population is built.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("failed to read target image: {0}")]
    Image(#[from] image::ImageError),

    #[error("target buffer of {len} bytes does not match {width}x{height} RGBA")]
    BufferSize { width: u32, height: u32, len: usize },

    #[error("target image is empty after downscaling ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

#[derive(Error, Debug)]
pub enum EvolveError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("target error: {0}")]
    Target(#[from] TargetError),

    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EvolveError>;
