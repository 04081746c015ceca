/// run settings for mirai-genesis.
/// fixed for the lifetime of a population: changing any of them means building a fresh one.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dna::{Mutation, MutationPolicy};
use crate::error::{ConfigError, Result};
use crate::fitness::FitnessMetric;
use crate::phenotype::Phenotype;
use crate::render::SkiaRenderer;
use crate::selection::survival_cutoff;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    // population shape
    pub population_size: usize,
    /// genes per individual
    pub dna_length: usize,
    pub phenotype: Phenotype,

    // selection
    /// fraction of the ranked population eligible as parents, in (0, 1]
    pub survival_rate: f64,

    // mutation
    pub mutation_policy: MutationPolicy,
    /// per-value probability (0.0-1.0)
    pub mutation_chance: f32,
    /// max continuous step
    pub mutation_impact: f32,

    // fitness
    pub fitness_metric: FitnessMetric,
    /// the target is shrunk by this factor before evolution starts
    pub downscale_ratio: f32,

    // rendering
    /// skip genes whose activation flag is above 0.5
    pub recessive_genes: bool,
    pub antialiasing: bool,
    /// bezier stroke color, un-premultiplied 0..1
    pub stroke_rgba: [f32; 4],
    /// stretch circle/dot opacity so a gene alpha of 1.0 is opaque
    pub full_opacity: bool,

    // execution
    /// rng seed; None draws one from the OS
    pub seed: Option<u64>,
    /// evaluate offspring fitness on the rayon pool
    pub parallel: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            population_size: 50,
            dna_length: 100,
            phenotype: Phenotype::Circles,

            survival_rate: 0.2,

            mutation_policy: MutationPolicy::Continuous,
            mutation_chance: 0.01,
            mutation_impact: 0.1,

            fitness_metric: FitnessMetric::SquaredDifference,
            downscale_ratio: 5.0,

            recessive_genes: true,
            antialiasing: true,
            stroke_rgba: [0.0, 0.0, 0.0, 1.0],
            full_opacity: false,

            seed: None,
            parallel: false,
        }
    }
}

impl RunSettings {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_dna_length(mut self, n: usize) -> Self {
        self.dna_length = n;
        self
    }

    pub fn with_phenotype(mut self, phenotype: Phenotype) -> Self {
        self.phenotype = phenotype;
        self
    }

    pub fn with_survival_rate(mut self, rate: f64) -> Self {
        self.survival_rate = rate;
        self
    }

    pub fn with_mutation_policy(mut self, policy: MutationPolicy) -> Self {
        self.mutation_policy = policy;
        self
    }

    pub fn with_mutation_chance(mut self, chance: f32) -> Self {
        self.mutation_chance = chance;
        self
    }

    pub fn with_mutation_impact(mut self, impact: f32) -> Self {
        self.mutation_impact = impact;
        self
    }

    pub fn with_fitness_metric(mut self, metric: FitnessMetric) -> Self {
        self.fitness_metric = metric;
        self
    }

    pub fn with_downscale_ratio(mut self, ratio: f32) -> Self {
        self.downscale_ratio = ratio;
        self
    }

    pub fn with_recessive_genes(mut self, enabled: bool) -> Self {
        self.recessive_genes = enabled;
        self
    }

    pub fn with_antialiasing(mut self, enabled: bool) -> Self {
        self.antialiasing = enabled;
        self
    }

    pub fn with_stroke_rgba(mut self, rgba: [f32; 4]) -> Self {
        self.stroke_rgba = rgba;
        self
    }

    pub fn with_full_opacity(mut self, enabled: bool) -> Self {
        self.full_opacity = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// reject settings that cannot drive a run. called before any population exists.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.dna_length == 0 {
            return Err(ConfigError::EmptyDna);
        }
        if !(self.survival_rate > 0.0 && self.survival_rate <= 1.0) {
            return Err(ConfigError::SurvivalRate(self.survival_rate));
        }
        // a single individual can only pair with itself; anything larger needs two parents
        let cutoff = survival_cutoff(self.survival_rate, self.population_size);
        if self.population_size >= 2 && cutoff < 2 {
            return Err(ConfigError::SurvivalCutoffTooSmall {
                cutoff,
                population_size: self.population_size,
                survival_rate: self.survival_rate,
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(ConfigError::MutationChance(self.mutation_chance));
        }
        if !(self.mutation_impact >= 0.0) {
            return Err(ConfigError::MutationImpact(self.mutation_impact));
        }
        if !(self.downscale_ratio > 0.0) {
            return Err(ConfigError::DownscaleRatio(self.downscale_ratio));
        }
        Ok(())
    }

    pub fn to_mutation(&self) -> Mutation {
        Mutation {
            policy: self.mutation_policy,
            chance: self.mutation_chance,
            impact: self.mutation_impact,
        }
    }

    /// tiny-skia renderer configured from these settings
    pub fn renderer(&self) -> SkiaRenderer {
        SkiaRenderer::default()
            .with_antialias(self.antialiasing)
            .with_recessive_genes(self.recessive_genes)
            .with_stroke_rgba(self.stroke_rgba)
            .with_full_opacity(self.full_opacity)
    }

    /// save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings from a JSON file. missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// load settings, or return defaults if the file doesn't exist or can't be parsed
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("failed to parse {}: {}. using defaults.", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let s = RunSettings::default();
        assert_eq!(s.population_size, 50);
        assert_eq!(s.dna_length, 100);
        assert_eq!(s.phenotype, Phenotype::Circles);
        assert_eq!(s.survival_rate, 0.2);
        assert_eq!(s.downscale_ratio, 5.0);
        assert!(s.seed.is_none());
        assert!(!s.parallel);
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn test_cutoff_below_two_is_rejected() {
        let s = RunSettings::default().with_population_size(5).with_survival_rate(0.2);
        assert_eq!(
            s.validate(),
            Err(ConfigError::SurvivalCutoffTooSmall { cutoff: 1, population_size: 5, survival_rate: 0.2 })
        );
    }

    #[test]
    fn test_single_individual_is_allowed() {
        let s = RunSettings::default().with_population_size(1).with_survival_rate(1.0);
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let base = RunSettings::default();
        assert_eq!(base.clone().with_population_size(0).validate(), Err(ConfigError::EmptyPopulation));
        assert_eq!(base.clone().with_dna_length(0).validate(), Err(ConfigError::EmptyDna));
        assert_eq!(base.clone().with_survival_rate(0.0).validate(), Err(ConfigError::SurvivalRate(0.0)));
        assert_eq!(base.clone().with_survival_rate(1.5).validate(), Err(ConfigError::SurvivalRate(1.5)));
        assert_eq!(base.clone().with_mutation_chance(1.5).validate(), Err(ConfigError::MutationChance(1.5)));
        assert_eq!(base.clone().with_mutation_impact(-0.1).validate(), Err(ConfigError::MutationImpact(-0.1)));
        assert_eq!(base.with_downscale_ratio(0.0).validate(), Err(ConfigError::DownscaleRatio(0.0)));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("mirai-genesis-settings-{}.json", std::process::id()));
        let s = RunSettings::default()
            .with_phenotype(Phenotype::Mixed)
            .with_mutation_policy(MutationPolicy::Discrete)
            .with_seed(99);
        s.save(&path).unwrap();
        let loaded = RunSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, s);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: RunSettings = serde_json::from_str(r#"{ "phenotype": "dots", "population_size": 10 }"#).unwrap();
        assert_eq!(s.phenotype, Phenotype::Dots);
        assert_eq!(s.population_size, 10);
        assert_eq!(s.dna_length, 100);
    }

    #[test]
    fn test_unknown_phenotype_in_json_fails() {
        let r: std::result::Result<RunSettings, _> = serde_json::from_str(r#"{ "phenotype": "triangles" }"#);
        assert!(r.is_err());
    }

    #[test]
    fn test_renderer_follows_settings() {
        let r = RunSettings::default().renderer();
        assert!(!r.full_opacity);
        assert!(r.recessive_genes);
        let r = RunSettings::default().with_full_opacity(true).with_antialiasing(false).renderer();
        assert!(r.full_opacity);
        assert!(!r.antialias);
    }

    #[test]
    fn test_unparsable_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("mirai-genesis-broken-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let s = RunSettings::load_or_default(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(s, RunSettings::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let s = RunSettings::load_or_default("/nonexistent/mirai-genesis/settings.json");
        assert_eq!(s, RunSettings::default());
    }
}
