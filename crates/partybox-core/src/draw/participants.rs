//! Participant list parsing
//!
//! Input is one participant per line, `name<TAB>id`. Extra fields are
//! ignored; lines with fewer than two fields are dropped without error.

use std::collections::HashSet;

use super::DrawError;
use crate::types::Participant;

/// Parse TAB separated participant records, dropping malformed lines
pub fn parse_participants(raw: &str) -> Vec<Participant> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let name = fields.next()?.trim();
            let id = fields.next()?.trim();
            Some(Participant::new(name, id))
        })
        .collect()
}

/// Parse and validate a participant list for a session of `lucky_count` winners
///
/// Repeated ids keep their first occurrence.
pub fn load_participants(raw: &str, lucky_count: usize) -> Result<Vec<Participant>, DrawError> {
    if raw.trim().is_empty() {
        return Err(DrawError::EmptyInput);
    }

    let parsed = parse_participants(raw);
    let line_count = raw.lines().filter(|l| !l.trim().is_empty()).count();
    if parsed.len() < line_count {
        log::warn!(
            "load_participants: Dropped {} malformed line(s)",
            line_count - parsed.len()
        );
    }

    let participants = dedupe_by_id(parsed);
    validate_pool(&participants, lucky_count)?;

    log::info!(
        "load_participants: Loaded {} participants for {} winners",
        participants.len(),
        lucky_count
    );
    Ok(participants)
}

/// Check a participant pool can serve `lucky_count` unique winners
pub(crate) fn validate_pool(participants: &[Participant], lucky_count: usize) -> Result<(), DrawError> {
    if participants.is_empty() {
        return Err(DrawError::NoValidParticipants);
    }
    if participants.len() < lucky_count {
        return Err(DrawError::NotEnoughParticipants {
            available: participants.len(),
            required: lucky_count,
        });
    }
    Ok(())
}

/// Drop participants whose id was already seen
pub(crate) fn dedupe_by_id(participants: Vec<Participant>) -> Vec<Participant> {
    let mut seen = HashSet::new();
    let before = participants.len();
    let unique: Vec<Participant> = participants
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect();
    if unique.len() < before {
        log::warn!(
            "dedupe_by_id: Ignored {} participant(s) with a repeated id",
            before - unique.len()
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_participants() {
        let parsed = parse_participants("Alice\t001\nBob\t002\nCarol\t003");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], Participant::new("Alice", "001"));
        assert_eq!(parsed[2], Participant::new("Carol", "003"));
    }

    #[test]
    fn test_malformed_lines_are_dropped() {
        let parsed = parse_participants("Alice\t001\nOnlyOneField\n\nBob\t002\n");
        assert_eq!(
            parsed,
            vec![Participant::new("Alice", "001"), Participant::new("Bob", "002")]
        );
    }

    #[test]
    fn test_fields_are_trimmed_and_extras_ignored() {
        let parsed = parse_participants("  Dana \t 004 \tVIP\r\n");
        assert_eq!(parsed, vec![Participant::new("Dana", "004")]);
    }

    #[test]
    fn test_load_rejects_blank_input() {
        assert_eq!(load_participants("  \n\n", 1), Err(DrawError::EmptyInput));
    }

    #[test]
    fn test_load_rejects_input_without_valid_lines() {
        assert_eq!(
            load_participants("no tabs here\nnor here", 1),
            Err(DrawError::NoValidParticipants)
        );
    }

    #[test]
    fn test_load_rejects_too_few_participants() {
        assert_eq!(
            load_participants("Alice\t001\nBob\t002", 3),
            Err(DrawError::NotEnoughParticipants {
                available: 2,
                required: 3
            })
        );
    }

    #[test]
    fn test_load_counts_only_valid_lines() {
        let loaded = load_participants("Alice\t001\nOnlyOneField\nBob\t002\nCarol\t003", 2).unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_repeated_ids_keep_first() {
        let loaded = load_participants("Alice\t001\nAlicia\t001\nBob\t002", 1).unwrap();
        assert_eq!(
            loaded,
            vec![Participant::new("Alice", "001"), Participant::new("Bob", "002")]
        );
    }
}
