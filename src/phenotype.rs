/// phenotype codec: how many values a gene needs per drawing style and how to read them back
/// as a drawable primitive. pure data, no state.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// genes whose activation flag is above this are recessive (skipped while rendering)
pub const RECESSIVE_THRESHOLD: f32 = 0.5;

/// drawing style that interprets genes into primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phenotype {
    Lines,
    Bezier,
    Dots,
    Circles,
    /// delegates per gene to one of the other four styles
    Mixed,
}

impl Phenotype {
    pub const ALL: [Phenotype; 5] = [
        Phenotype::Lines,
        Phenotype::Bezier,
        Phenotype::Dots,
        Phenotype::Circles,
        Phenotype::Mixed,
    ];

    /// fixed number of values per gene for this style (activation flag included)
    pub const fn gene_len(self) -> usize {
        match self {
            Phenotype::Lines => 9,
            Phenotype::Bezier => 7,
            Phenotype::Dots => 7,
            Phenotype::Circles => 8,
            Phenotype::Mixed => 10,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Phenotype::Lines => "lines",
            Phenotype::Bezier => "bezier",
            Phenotype::Dots => "dots",
            Phenotype::Circles => "circles",
            Phenotype::Mixed => "mixed",
        }
    }

    /// pick the concrete style a mixed gene delegates to, from its selector value.
    /// four equal bands over [0, 1].
    pub fn mixed_delegate(selector: f32) -> Phenotype {
        if selector < 0.25 {
            Phenotype::Lines
        } else if selector < 0.5 {
            Phenotype::Bezier
        } else if selector < 0.75 {
            Phenotype::Dots
        } else {
            Phenotype::Circles
        }
    }

    /// decode one gene into the primitive it paints. returns None when the gene
    /// is too short for the style it resolves to.
    pub fn decode(self, gene: &[f32]) -> Option<Primitive> {
        match self {
            Phenotype::Lines => {
                let &[_, x0, y0, x1, y1, r, b, g, a] = gene.get(..9)? else { return None };
                Some(Primitive::Line { from: (x0, y0), to: (x1, y1), rgb: [r, g, b], alpha: a })
            }
            Phenotype::Bezier => {
                let &[_, x0, y0, x1, y1, cx, cy] = gene.get(..7)? else { return None };
                Some(Primitive::Bezier { from: (x0, y0), to: (x1, y1), control: (cx, cy) })
            }
            Phenotype::Dots => {
                let &[_, cx, cy, r, g, b, a] = gene.get(..7)? else { return None };
                Some(Primitive::Dot { center: (cx, cy), rgb: [r, g, b], alpha: a })
            }
            Phenotype::Circles => {
                let &[_, radius, cx, cy, r, g, b, a] = gene.get(..8)? else { return None };
                Some(Primitive::Circle { center: (cx, cy), radius, rgb: [r, g, b], alpha: a })
            }
            Phenotype::Mixed => {
                let selector = *gene.get(1)?;
                let delegate = Phenotype::mixed_delegate(selector);
                // rebuild [flag, rest...] without the selector, sized to the delegate
                let mut inner = [0.0f32; 9];
                inner[0] = gene[0];
                let rest = &gene[2..];
                let n = rest.len().min(delegate.gene_len() - 1);
                inner[1..=n].copy_from_slice(&rest[..n]);
                delegate.decode(&inner[..delegate.gene_len()])
            }
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phenotype {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Phenotype::ALL
            .into_iter()
            .find(|p| p.as_str() == tag)
            .ok_or_else(|| ConfigError::UnknownPhenotype(s.to_owned()))
    }
}

/// a decoded gene in normalized [0,1] coordinates. the renderer maps these onto a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Circle { center: (f32, f32), radius: f32, rgb: [f32; 3], alpha: f32 },
    Dot { center: (f32, f32), rgb: [f32; 3], alpha: f32 },
    Line { from: (f32, f32), to: (f32, f32), rgb: [f32; 3], alpha: f32 },
    Bezier { from: (f32, f32), to: (f32, f32), control: (f32, f32) },
}

/// true when the gene's activation flag marks it as recessive
#[inline]
pub fn is_recessive(gene: &[f32]) -> bool {
    gene.first().is_some_and(|&flag| flag > RECESSIVE_THRESHOLD)
}
