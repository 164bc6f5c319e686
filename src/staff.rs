//! Plain-text staff rendering for the terminal.
//!
//! Each output row is one staff position, top first. Lines are drawn with
//! `-`, note heads with `O` (whole/half) or `@` (quarter/eighth).

use crate::generator::SequenceItem;
use crate::models::{Accidental, Clef, Note, NoteValue, StemDirection};

const GUTTER: usize = 3;
const SLOT_WIDTH: usize = 6;
const STEM_LENGTH: i32 = 3;
const TOP_LINE: i32 = 8;
const REST_POSITION: i32 = 4;

fn is_staff_line(pos: i32) -> bool {
    pos.rem_euclid(2) == 0 && (0..=TOP_LINE).contains(&pos)
}

fn needs_ledger(pos: i32, note_pos: i32) -> bool {
    pos.rem_euclid(2) == 0 && ((pos < 0 && pos >= note_pos) || (pos > TOP_LINE && pos <= note_pos))
}

// Clef sign sits on the line it names: G for treble, F for bass
fn clef_anchor(clef: Clef) -> (i32, char) {
    match clef {
        Clef::Treble => (2, 'G'),
        Clef::Bass => (6, 'F'),
    }
}

fn head(value: NoteValue) -> char {
    match value {
        NoteValue::Whole | NoteValue::Half => 'O',
        NoteValue::Quarter | NoteValue::Eighth => '@',
    }
}

fn rest_glyph(value: NoteValue) -> &'static str {
    match value {
        NoteValue::Whole => "[=]",
        NoteValue::Half => "[-]",
        NoteValue::Quarter => " z ",
        NoteValue::Eighth => " 7 ",
    }
}

fn vertical_extent(item: &SequenceItem) -> (i32, i32) {
    match item {
        SequenceItem::Note { note, stem, .. } => {
            let pos = note.staff_position();
            match stem {
                Some(StemDirection::Up) => (pos, pos + STEM_LENGTH),
                Some(StemDirection::Down) => (pos - STEM_LENGTH, pos),
                None => (pos, pos),
            }
        }
        SequenceItem::Rest { .. } => (REST_POSITION, REST_POSITION),
    }
}

pub fn render_sequence(clef: Clef, items: &[SequenceItem]) -> Vec<String> {
    let (low, high) = items
        .iter()
        .map(vertical_extent)
        .fold((0, TOP_LINE), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
    let width = GUTTER + SLOT_WIDTH * items.len().max(1) + 1;
    let (anchor, sign) = clef_anchor(clef);

    let mut rows = Vec::with_capacity((high - low + 1) as usize);
    for pos in (low..=high).rev() {
        let fill = if is_staff_line(pos) { '-' } else { ' ' };
        let mut row = vec![fill; width];
        row[0] = if pos == anchor { sign } else { ' ' };

        for (i, item) in items.iter().enumerate() {
            let base = GUTTER + i * SLOT_WIDTH + 1;
            match item {
                SequenceItem::Note { note, value, stem } => {
                    let note_pos = note.staff_position();
                    if needs_ledger(pos, note_pos) {
                        for cell in &mut row[base..base + 5] {
                            *cell = '-';
                        }
                    }
                    if pos == note_pos {
                        if let Some(acc) = note.accidental {
                            row[base] = match acc {
                                Accidental::Sharp => '#',
                                Accidental::Flat => 'b',
                            };
                        }
                        row[base + 2] = head(*value);
                    }
                    match stem {
                        Some(StemDirection::Up) if pos > note_pos && pos <= note_pos + STEM_LENGTH => {
                            row[base + 3] = '|';
                            if *value == NoteValue::Eighth && pos == note_pos + STEM_LENGTH {
                                row[base + 4] = '\\';
                            }
                        }
                        Some(StemDirection::Down) if pos < note_pos && pos >= note_pos - STEM_LENGTH => {
                            row[base + 1] = '|';
                            if *value == NoteValue::Eighth && pos == note_pos - STEM_LENGTH {
                                row[base + 2] = '/';
                            }
                        }
                        _ => {}
                    }
                }
                SequenceItem::Rest { value } => {
                    if pos == REST_POSITION {
                        for (offset, c) in rest_glyph(*value).chars().enumerate() {
                            row[base + 1 + offset] = c;
                        }
                    }
                }
            }
        }

        rows.push(row.into_iter().collect::<String>().trim_end().to_string());
    }
    rows
}

/// A single note head with no stem, as shown in identification rounds.
pub fn render_note(note: &Note) -> Vec<String> {
    render_sequence(
        note.clef,
        &[SequenceItem::Note {
            note: *note,
            value: NoteValue::Whole,
            stem: None,
        }],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteName;

    fn note(name: NoteName, octave: i32, clef: Clef) -> Note {
        Note {
            name,
            octave,
            accidental: None,
            clef,
        }
    }

    // Rows whose staff area starts with a line segment
    fn staff_lines(rows: &[String]) -> usize {
        rows.iter().filter(|r| r.chars().nth(1) == Some('-')).count()
    }

    fn head_row(rows: &[String]) -> usize {
        rows.iter().position(|r| r.contains('O') || r.contains('@')).unwrap()
    }

    #[test]
    fn note_on_staff_draws_five_lines() {
        let rows = render_note(&note(NoteName::G, 4, Clef::Treble));
        assert_eq!(rows.len(), 9);
        assert_eq!(staff_lines(&rows), 5);
    }

    #[test]
    fn head_row_matches_staff_position() {
        // Top row is position 8, so position p sits at row 8 - p
        let e4 = note(NoteName::E, 4, Clef::Treble);
        assert_eq!(head_row(&render_note(&e4)), 8);
        let f5 = note(NoteName::F, 5, Clef::Treble);
        assert_eq!(head_row(&render_note(&f5)), 0);
    }

    #[test]
    fn middle_c_gets_one_ledger_line() {
        let rows = render_note(&note(NoteName::C, 4, Clef::Treble));
        assert_eq!(rows.len(), 11);
        let last = rows.last().unwrap();
        assert!(last.contains("-O-"), "ledger row was {:?}", last);
        assert_eq!(staff_lines(&rows), 5);
    }

    #[test]
    fn high_note_extends_upwards() {
        let c6 = note(NoteName::C, 6, Clef::Treble);
        assert_eq!(c6.ledger_lines(), 2);
        let rows = render_note(&c6);
        assert_eq!(head_row(&rows), 0);
        assert_eq!(rows.len(), 13);
    }

    #[test]
    fn accidental_precedes_head() {
        let mut n = note(NoteName::F, 4, Clef::Treble);
        n.accidental = Some(Accidental::Sharp);
        let rows = render_note(&n);
        assert!(rows[head_row(&rows)].contains("#-O") || rows[head_row(&rows)].contains("# O"));
    }

    #[test]
    fn clef_sign_marks_its_line() {
        let treble = render_note(&note(NoteName::B, 4, Clef::Treble));
        assert!(treble[6].starts_with('G'));
        let bass = render_note(&note(NoteName::D, 3, Clef::Bass));
        assert!(bass[2].starts_with('F'));
    }

    #[test]
    fn stems_and_rests_in_sequences() {
        let low = note(NoteName::E, 4, Clef::Treble);
        let items = [
            SequenceItem::Note {
                note: low,
                value: NoteValue::Quarter,
                stem: Some(StemDirection::Up),
            },
            SequenceItem::Rest {
                value: NoteValue::Quarter,
            },
        ];
        let rows = render_sequence(Clef::Treble, &items);
        assert_eq!(rows.len(), 9);
        let stem_rows = rows.iter().filter(|r| r.contains('|')).count();
        assert_eq!(stem_rows, 3);
        assert!(rows[4].contains('z'));
    }
}
