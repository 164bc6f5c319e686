use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::levels::LevelConfig;
use crate::models::{answer_label, Accidental, Clef, Note, NoteValue, StemDirection};

/// Chance that a generated note (or distractor) carries an accidental when
/// the level allows them.
pub const ACCIDENTAL_PROBABILITY: f64 = 0.3;

/// Chance that a sequence slot after the first is a rest, on levels with rests.
pub const REST_PROBABILITY: f64 = 0.2;

pub const OPTION_COUNT: usize = 4;

// Pools are non-empty by LevelConfig construction
fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

fn maybe_accidental<R: Rng + ?Sized>(config: &LevelConfig, rng: &mut R) -> Option<Accidental> {
    let allowed = config.accidentals();
    if !allowed.is_empty() && rng.gen_bool(ACCIDENTAL_PROBABILITY) {
        Some(pick(rng, allowed))
    } else {
        None
    }
}

pub fn generate_note<R: Rng + ?Sized>(config: &LevelConfig, clef: Clef, rng: &mut R) -> Note {
    let name = pick(rng, config.notes());
    let octave = pick(rng, config.octaves());
    let accidental = maybe_accidental(config, rng);

    Note {
        name,
        octave,
        accidental,
        clef,
    }
}

/// Four unique answer labels in random order, one of them `correct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerOptionSet(Vec<String>);

impl AnswerOptionSet {
    pub fn options(&self) -> &[String] {
        &self.0
    }
}

/// Every answer label the level can produce.
pub fn candidate_labels(config: &LevelConfig) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    for &name in config.notes() {
        labels.insert(answer_label(name, None));
        for &acc in config.accidentals() {
            labels.insert(answer_label(name, Some(acc)));
        }
    }
    labels
}

pub fn generate_options<R: Rng + ?Sized>(
    correct: &str,
    config: &LevelConfig,
    rng: &mut R,
) -> Result<AnswerOptionSet> {
    let mut distinct = candidate_labels(config);
    distinct.insert(correct.to_string());
    if distinct.len() < OPTION_COUNT {
        return Err(Error::DegenerateOptionPool {
            correct: correct.to_string(),
            available: distinct.len(),
            required: OPTION_COUNT,
        });
    }

    let mut options = vec![correct.to_string()];
    let mut draws = 0u32;
    while options.len() < OPTION_COUNT {
        draws += 1;
        let candidate = answer_label(pick(rng, config.notes()), maybe_accidental(config, rng));
        if !options.contains(&candidate) {
            options.push(candidate);
        }
    }
    debug!(correct, draws, "generated answer options");

    options.shuffle(rng);
    Ok(AnswerOptionSet(options))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SequenceItem {
    Note {
        note: Note,
        value: NoteValue,
        stem: Option<StemDirection>,
    },
    Rest {
        value: NoteValue,
    },
}

impl SequenceItem {
    pub fn value(&self) -> NoteValue {
        match self {
            SequenceItem::Note { value, .. } | SequenceItem::Rest { value } => *value,
        }
    }

    pub fn note(&self) -> Option<&Note> {
        match self {
            SequenceItem::Note { note, .. } => Some(note),
            SequenceItem::Rest { .. } => None,
        }
    }
}

/// A short generated phrase for sequenced reading levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteSequence {
    pub clef: Clef,
    pub items: Vec<SequenceItem>,
}

impl NoteSequence {
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.items.iter().filter_map(SequenceItem::note)
    }

    /// The note the player is asked to name.
    pub fn target(&self) -> Option<&Note> {
        self.notes().next()
    }

    pub fn total_beats(&self) -> f64 {
        self.items.iter().map(|i| i.value().beats()).sum()
    }
}

/// Builds `length` items (at least one). The first item is always a pitched
/// note; later slots may be rests when the level includes them.
pub fn generate_sequence<R: Rng + ?Sized>(
    config: &LevelConfig,
    clef: Clef,
    length: usize,
    rng: &mut R,
) -> NoteSequence {
    let features = config.features();
    let mut items = Vec::with_capacity(length.max(1));

    for i in 0..length.max(1) {
        let value = pick(rng, &NoteValue::ALL);
        if i > 0 && features.include_rests && rng.gen_bool(REST_PROBABILITY) {
            items.push(SequenceItem::Rest { value });
            continue;
        }

        let note = generate_note(config, clef, rng);
        // Whole notes carry no stem
        let stem = if features.include_stems && value != NoteValue::Whole {
            Some(note.stem_direction())
        } else {
            None
        };
        items.push(SequenceItem::Note { note, value, stem });
    }

    NoteSequence { clef, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{resolve, LevelFeatures};
    use crate::models::NoteName;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    fn small_config(notes: Vec<NoteName>, accidentals: Vec<Accidental>) -> LevelConfig {
        LevelConfig::new(9, "Test", "", notes, vec![4], accidentals).unwrap()
    }

    mod generate_note_tests {
        use super::*;

        #[test]
        fn never_adds_accidentals_when_none_allowed() {
            let config = resolve(1).unwrap();
            let mut rng = rng();
            for _ in 0..2000 {
                let note = generate_note(&config, Clef::Treble, &mut rng);
                assert!(note.accidental.is_none());
            }
        }

        #[test]
        fn name_and_octave_come_from_pools() {
            let mut rng = rng();
            for id in 1..=5 {
                let config = resolve(id).unwrap();
                for _ in 0..500 {
                    let note = generate_note(&config, Clef::Bass, &mut rng);
                    assert!(config.notes().contains(&note.name));
                    assert!(config.octaves().contains(&note.octave));
                    if let Some(acc) = note.accidental {
                        assert!(config.accidentals().contains(&acc));
                    }
                }
            }
        }

        #[test]
        fn keeps_requested_clef() {
            let config = resolve(2).unwrap();
            let mut rng = rng();
            assert_eq!(generate_note(&config, Clef::Bass, &mut rng).clef, Clef::Bass);
            assert_eq!(
                generate_note(&config, Clef::Treble, &mut rng).clef,
                Clef::Treble
            );
        }

        #[test]
        fn accidental_rate_is_roughly_thirty_percent() {
            let config = resolve(2).unwrap();
            let mut rng = rng();
            let trials = 10_000;
            let with_accidental = (0..trials)
                .filter(|_| generate_note(&config, Clef::Treble, &mut rng).accidental.is_some())
                .count();
            let rate = with_accidental as f64 / trials as f64;
            assert!((0.25..0.35).contains(&rate), "rate was {}", rate);
        }

        #[test]
        fn same_seed_same_note() {
            let config = resolve(3).unwrap();
            let a = generate_note(&config, Clef::Treble, &mut StdRng::seed_from_u64(7));
            let b = generate_note(&config, Clef::Treble, &mut StdRng::seed_from_u64(7));
            assert_eq!(a, b);
        }
    }

    mod generate_options_tests {
        use super::*;

        #[test]
        fn four_unique_options_containing_correct_once() {
            let mut rng = rng();
            for id in 1..=5 {
                let config = resolve(id).unwrap();
                for _ in 0..200 {
                    let note = generate_note(&config, Clef::Treble, &mut rng);
                    let correct = note.answer_label();
                    let options = generate_options(&correct, &config, &mut rng).unwrap();

                    assert_eq!(options.options().len(), OPTION_COUNT);
                    let unique: HashSet<&String> = options.options().iter().collect();
                    assert_eq!(unique.len(), OPTION_COUNT);
                    assert_eq!(
                        options.options().iter().filter(|o| **o == correct).count(),
                        1
                    );
                }
            }
        }

        #[test]
        fn beginner_options_have_no_accidentals() {
            let config = resolve(1).unwrap();
            let mut rng = rng();
            for _ in 0..200 {
                let options = generate_options("C", &config, &mut rng).unwrap();
                assert!(options.options().iter().all(|o| o.len() == 1));
            }
        }

        #[test]
        fn order_is_randomized() {
            let config = resolve(1).unwrap();
            let mut rng = rng();
            let positions: HashSet<usize> = (0..100)
                .map(|_| {
                    let options = generate_options("E", &config, &mut rng).unwrap();
                    options.options().iter().position(|o| o == "E").unwrap()
                })
                .collect();
            assert!(positions.len() > 1, "correct answer never moved");
        }

        #[test]
        fn exact_pool_of_four_terminates() {
            let config = small_config(
                vec![NoteName::C, NoteName::D, NoteName::E, NoteName::F],
                vec![],
            );
            let mut rng = rng();
            let options = generate_options("C", &config, &mut rng).unwrap();
            let mut sorted: Vec<String> = options.options().to_vec();
            sorted.sort();
            assert_eq!(sorted, vec!["C", "D", "E", "F"]);
        }

        #[test]
        fn accidentals_expand_a_small_pool() {
            let config = small_config(
                vec![NoteName::C, NoteName::D],
                vec![Accidental::Sharp],
            );
            let mut rng = rng();
            let options = generate_options("C", &config, &mut rng).unwrap();
            assert_eq!(options.options().len(), 4);
        }

        #[test]
        fn correct_answer_outside_pool_counts_toward_four() {
            let config = small_config(vec![NoteName::C, NoteName::D, NoteName::E], vec![]);
            let mut rng = rng();
            let options = generate_options("G", &config, &mut rng).unwrap();
            assert!(options.options().iter().any(|o| o == "G"));
            assert_eq!(options.options().len(), 4);
        }

        #[test]
        fn degenerate_pool_fails_fast() {
            let config = small_config(vec![NoteName::C, NoteName::D], vec![]);
            let mut rng = rng();
            let err = generate_options("C", &config, &mut rng).unwrap_err();
            assert!(matches!(
                err,
                Error::DegenerateOptionPool {
                    available: 2,
                    required: 4,
                    ..
                }
            ));
        }

        #[test]
        fn candidate_labels_counts_combinations() {
            assert_eq!(candidate_labels(&resolve(1).unwrap()).len(), 7);
            assert_eq!(candidate_labels(&resolve(2).unwrap()).len(), 21);
        }
    }

    mod sequence_tests {
        use super::*;

        #[test]
        fn first_item_is_always_a_note() {
            let config = resolve(5).unwrap().gated_for(5);
            let mut rng = rng();
            for _ in 0..200 {
                let seq = generate_sequence(&config, Clef::Treble, 6, &mut rng);
                assert_eq!(seq.items.len(), 6);
                assert!(seq.items[0].note().is_some());
                assert!(seq.target().is_some());
            }
        }

        #[test]
        fn zero_length_still_yields_one_note() {
            let config = resolve(5).unwrap();
            let seq = generate_sequence(&config, Clef::Bass, 0, &mut rng());
            assert_eq!(seq.items.len(), 1);
        }

        #[test]
        fn no_rests_without_rest_feature() {
            let config = resolve(5).unwrap().gated_for(3);
            let mut rng = rng();
            for _ in 0..100 {
                let seq = generate_sequence(&config, Clef::Treble, 8, &mut rng);
                assert!(seq
                    .items
                    .iter()
                    .all(|i| matches!(i, SequenceItem::Note { .. })));
            }
        }

        #[test]
        fn rests_appear_when_enabled() {
            let config = resolve(5).unwrap().gated_for(5);
            let mut rng = rng();
            let rests: usize = (0..100)
                .map(|_| {
                    generate_sequence(&config, Clef::Treble, 8, &mut rng)
                        .items
                        .iter()
                        .filter(|i| matches!(i, SequenceItem::Rest { .. }))
                        .count()
                })
                .sum();
            assert!(rests > 0);
        }

        #[test]
        fn stems_follow_staff_position_and_skip_whole_notes() {
            let config = resolve(5).unwrap().gated_for(5);
            let mut rng = rng();
            for _ in 0..100 {
                let seq = generate_sequence(&config, Clef::Treble, 8, &mut rng);
                for item in &seq.items {
                    if let SequenceItem::Note { note, value, stem } = item {
                        if *value == NoteValue::Whole {
                            assert!(stem.is_none());
                        } else {
                            assert_eq!(*stem, Some(note.stem_direction()));
                        }
                    }
                }
            }
        }

        #[test]
        fn no_stems_without_stem_feature() {
            let config = resolve(2)
                .unwrap()
                .with_features(LevelFeatures::default());
            let seq = generate_sequence(&config, Clef::Treble, 8, &mut rng());
            for item in &seq.items {
                if let SequenceItem::Note { stem, .. } = item {
                    assert!(stem.is_none());
                }
            }
        }

        #[test]
        fn total_beats_sums_values() {
            let seq = NoteSequence {
                clef: Clef::Treble,
                items: vec![
                    SequenceItem::Rest {
                        value: NoteValue::Half,
                    },
                    SequenceItem::Rest {
                        value: NoteValue::Eighth,
                    },
                ],
            };
            assert_eq!(seq.total_beats(), 2.5);
            assert!(seq.target().is_none());
        }
    }
}
