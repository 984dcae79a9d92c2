use crate::note::NoteEvent;

fn same_window(a: &NoteEvent, b: &NoteEvent) -> bool {
    a.start == b.start && a.end == b.end
}

/// Group adjacent notes that share start and end time into chords.
///
/// Returns `None` for fewer than two notes, or when a lone note is followed
/// by more notes: those are not a chord track. A single note left over at
/// the end stops the scan and is left out of the groups.
pub fn group_simultaneous(notes: &[NoteEvent]) -> Option<Vec<Vec<NoteEvent>>> {
    if notes.len() < 2 {
        return None;
    }

    let mut groups: Vec<Vec<NoteEvent>> = Vec::new();
    for note in notes {
        if let Some(group) = groups.last_mut() {
            if same_window(&group[0], note) {
                group.push(note.clone());
                continue;
            }
        }
        groups.push(vec![note.clone()]);
    }

    if groups.last().is_some_and(|g| g.len() < 2) {
        groups.pop();
    }
    if groups.iter().any(|g| g.len() < 2) {
        return None;
    }
    Some(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(pitch: u8, start: f64, end: f64) -> NoteEvent {
        NoteEvent {
            pitch,
            start,
            end,
            velocity: 100,
        }
    }

    #[test]
    fn groups_block_chords() {
        let notes = vec![
            note(48, 0.0, 1.0),
            note(52, 0.0, 1.0),
            note(55, 0.0, 1.0),
            note(50, 1.0, 2.0),
            note(53, 1.0, 2.0),
        ];
        let groups = group_simultaneous(&notes).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].iter().map(|n| n.pitch).collect::<Vec<_>>(), vec![48, 52, 55]);
        assert_eq!(groups[1].len(), 2);
        // Input untouched
        assert_eq!(notes.len(), 5);
    }

    #[test]
    fn too_few_notes() {
        assert_eq!(group_simultaneous(&[]), None);
        assert_eq!(group_simultaneous(&[note(60, 0.0, 1.0)]), None);
    }

    #[test]
    fn lone_note_rejects() {
        let leading = vec![note(60, 0.0, 0.5), note(48, 0.5, 1.0), note(52, 0.5, 1.0)];
        assert_eq!(group_simultaneous(&leading), None);

        let middle = vec![
            note(48, 0.0, 1.0),
            note(52, 0.0, 1.0),
            note(60, 1.0, 1.5),
            note(50, 1.5, 2.0),
            note(53, 1.5, 2.0),
        ];
        assert_eq!(group_simultaneous(&middle), None);
    }

    #[test]
    fn trailing_lone_note_ends_scan() {
        let trailing = vec![note(48, 0.0, 1.0), note(52, 0.0, 1.0), note(60, 1.0, 1.5)];
        let groups = group_simultaneous(&trailing).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].iter().map(|n| n.pitch).collect::<Vec<_>>(), vec![48, 52]);
    }

    #[test]
    fn same_start_different_end_is_not_a_chord() {
        let notes = vec![note(48, 0.0, 1.0), note(52, 0.0, 2.0)];
        assert_eq!(group_simultaneous(&notes), None);
    }
}
