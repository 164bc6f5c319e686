use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Accidental, NoteName};

pub const DEFAULT_LEVEL: u32 = 1;

// Gating thresholds: each level introduces one notation concept
const LEDGER_LINES_FROM: u32 = 3;
const RESTS_FROM: u32 = 4;
const SEQUENCES_FROM: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelFeatures {
    pub include_rests: bool,
    pub include_stems: bool,
    pub use_ledger_lines: bool,
    pub use_sequenced_content: bool,
}

/// Rules for one difficulty tier. Pools are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelConfig {
    id: u32,
    name: String,
    description: String,
    notes: Vec<NoteName>,
    octaves: Vec<i32>,
    accidentals: Vec<Accidental>,
    #[serde(flatten)]
    features: LevelFeatures,
}

impl LevelConfig {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        description: impl Into<String>,
        notes: Vec<NoteName>,
        octaves: Vec<i32>,
        accidentals: Vec<Accidental>,
    ) -> Result<Self> {
        if id == 0 {
            return Err(Error::InvalidConfig("level id must be positive".to_string()));
        }
        if notes.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "level {} has an empty note pool",
                id
            )));
        }
        if octaves.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "level {} has an empty octave range",
                id
            )));
        }

        Ok(Self {
            id,
            name: name.into(),
            description: description.into(),
            notes: dedup(notes),
            octaves: dedup(octaves),
            accidentals: dedup(accidentals),
            features: LevelFeatures::default(),
        })
    }

    pub fn with_features(mut self, features: LevelFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn notes(&self) -> &[NoteName] {
        &self.notes
    }

    pub fn octaves(&self) -> &[i32] {
        &self.octaves
    }

    pub fn accidentals(&self) -> &[Accidental] {
        &self.accidentals
    }

    pub fn features(&self) -> LevelFeatures {
        self.features
    }

    /// Copy of this config with features switched off below their
    /// introducing level.
    pub fn gated_for(&self, level: u32) -> Self {
        let base = self.features;
        Self {
            features: LevelFeatures {
                include_rests: level >= RESTS_FROM && base.include_rests,
                include_stems: base.include_stems,
                use_ledger_lines: level >= LEDGER_LINES_FROM,
                use_sequenced_content: level >= SEQUENCES_FROM && base.use_sequenced_content,
            },
            ..self.clone()
        }
    }
}

// Order-preserving dedup; pools behave as sets
fn dedup<T: PartialEq + Copy>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn builtin(
    id: u32,
    name: &str,
    description: &str,
    octaves: &[i32],
    accidentals: &[Accidental],
    features: LevelFeatures,
) -> Result<LevelConfig> {
    Ok(LevelConfig::new(
        id,
        name,
        description,
        NoteName::ALL.to_vec(),
        octaves.to_vec(),
        accidentals.to_vec(),
    )?
    .with_features(features))
}

/// The built-in level table, in id order.
pub fn all_levels() -> Result<Vec<LevelConfig>> {
    let both = [Accidental::Flat, Accidental::Sharp];
    let extended = [2, 3, 4, 5, 6];

    Ok(vec![
        builtin(
            1,
            "Beginner Notes",
            "Learn the basic notes A through G",
            &[3, 4, 5],
            &[],
            LevelFeatures::default(),
        )?,
        builtin(
            2,
            "Sharps and Flats",
            "Add sharps and flats to your note knowledge",
            &[3, 4, 5],
            &both,
            LevelFeatures::default(),
        )?,
        builtin(
            3,
            "Ledger Lines",
            "Master notes above and below the staff",
            &extended,
            &both,
            LevelFeatures {
                include_stems: true,
                use_ledger_lines: true,
                ..LevelFeatures::default()
            },
        )?,
        builtin(
            4,
            "Rests and Stems",
            "Learn about rests and proper note stems",
            &extended,
            &both,
            LevelFeatures {
                include_rests: true,
                include_stems: true,
                use_ledger_lines: true,
                use_sequenced_content: false,
            },
        )?,
        builtin(
            5,
            "Sequenced Reading",
            "Read notes inside generated phrases",
            &extended,
            &both,
            LevelFeatures {
                include_rests: true,
                include_stems: true,
                use_ledger_lines: true,
                use_sequenced_content: true,
            },
        )?,
    ])
}

/// Looks up the configuration for `level_id`.
pub fn resolve(level_id: u32) -> Result<LevelConfig> {
    all_levels()?
        .into_iter()
        .find(|l| l.id == level_id)
        .ok_or(Error::LevelNotFound(level_id))
}

/// Caller-side fallback: unknown levels play as level 1.
pub fn resolve_or_default(level_id: u32) -> Result<LevelConfig> {
    match resolve(level_id) {
        Err(Error::LevelNotFound(_)) => {
            warn!(level_id, "unknown level, falling back to default level");
            resolve(DEFAULT_LEVEL)
        }
        other => other,
    }
}
