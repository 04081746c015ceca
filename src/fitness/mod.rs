// fitness: render a dna into a scratch pixmap and score it against the target

pub mod sad;

pub use sad::{sad_rgba, ssd_rgba};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiny_skia as sk;

use crate::dna::Dna;
use crate::phenotype::Phenotype;
use crate::render::{Frame, Renderer};
use crate::target::TargetImage;

const CHANNEL_MAX: f64 = 255.0;

/// pixel distance used to turn a rendered surface into a score
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    /// 1 - sum(d^2) / (channels * 255^2)
    #[default]
    SquaredDifference,
    /// 1 - sum(|d|) / (channels * 255)
    AbsoluteDifference,
}

impl FitnessMetric {
    /// score a rendered RGBA buffer against the target's straight RGBA. renders sit on an opaque
    /// white background, so their premultiplied bytes are straight too. 1.0 is a perfect match.
    pub fn score(self, target_rgba: &[u8], rendered_rgba: &[u8]) -> f64 {
        let channels = target_rgba.len() as f64;
        if channels == 0.0 {
            return 1.0;
        }
        match self {
            FitnessMetric::SquaredDifference => {
                1.0 - ssd_rgba(target_rgba, rendered_rgba) as f64 / (channels * CHANNEL_MAX * CHANNEL_MAX)
            }
            FitnessMetric::AbsoluteDifference => {
                1.0 - sad_rgba(target_rgba, rendered_rgba) as f64 / (channels * CHANNEL_MAX)
            }
        }
    }
}

/// renders candidates and compares them to the shared target
#[derive(Clone)]
pub struct FitnessEvaluator {
    target: Arc<TargetImage>,
    renderer: Arc<dyn Renderer>,
    metric: FitnessMetric,
}

impl FitnessEvaluator {
    pub fn new(target: Arc<TargetImage>, renderer: Arc<dyn Renderer>, metric: FitnessMetric) -> Self {
        Self { target, renderer, metric }
    }

    /// a pixmap with the target's dimensions, to be reused across evaluations
    pub fn new_scratch(&self) -> sk::Pixmap {
        sk::Pixmap::new(self.target.width(), self.target.height()).expect("pixmap")
    }

    /// render the dna over a cleared scratch and score it.
    /// the scratch is fully overwritten, so stale contents never leak into the score;
    /// a scratch of the wrong size is reallocated to the target's.
    pub fn evaluate(&self, dna: &Dna, phenotype: Phenotype, scratch: &mut sk::Pixmap) -> f64 {
        profiling::scope!("FitnessEvaluator::evaluate");
        if (scratch.width(), scratch.height()) != (self.target.width(), self.target.height()) {
            *scratch = self.new_scratch();
        }

        let frame = Frame::full(scratch.width(), scratch.height());
        self.renderer.draw(&mut scratch.as_mut(), frame, dna, phenotype);
        self.metric.score(self.target.data(), scratch.data())
    }

    pub fn metric(&self) -> FitnessMetric {
        self.metric
    }
}

impl std::fmt::Debug for FitnessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitnessEvaluator")
            .field("target", &(self.target.width(), self.target.height()))
            .field("metric", &self.metric)
            .finish_non_exhaustive()
    }
}
