//! Matches a round's AFF/NEG team names against the team table.

use super::{Pairing, Side};
use crate::error::RoundError;
use crate::records::{Record, TEAM_COLUMN, Table};

/// Find the team record whose `Team` field equals `name` exactly.
///
/// Comparison is case- and whitespace-sensitive. Records with an empty
/// `Team` field never match.
pub fn find_team<'a>(teams: &'a Table, name: &str) -> Option<&'a Record> {
    teams
        .iter()
        .find(|team| team.get(TEAM_COLUMN).is_some_and(|t| !t.is_empty() && t == name))
}

fn find_side<'a>(round: &Record, teams: &'a Table, side: Side) -> Result<&'a Record, RoundError> {
    let name = round.get(side.column()).unwrap_or_default();
    find_team(teams, name).ok_or_else(|| RoundError::UnresolvedTeam {
        side,
        name: name.to_string(),
    })
}

/// Resolve both teams of `round`. The affirmative side is checked first.
pub fn resolve<'a>(
    round: &Record,
    teams: &'a Table,
    round_number: &'a str,
) -> Result<Pairing<'a>, RoundError> {
    let aff = find_side(round, teams, Side::Affirmative)?;
    let neg = find_side(round, teams, Side::Negative)?;
    Ok(Pairing {
        aff,
        neg,
        round_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> Table {
        Table::from_records(vec![
            Record::new().with("Team", "Lions").with("Email", "l@x.com"),
            Record::new().with("Team", "Tigers").with("Email", "t@x.com"),
            Record::new().with("Team", "").with("Email", "blank@x.com"),
        ])
    }

    fn round(aff: &str, neg: &str) -> Record {
        Record::new().with("AFF", aff).with("NEG", neg).with("Room", "101")
    }

    #[test]
    fn resolves_both_sides() {
        let teams = teams();
        let pairing = resolve(&round("Lions", "Tigers"), &teams, "3").unwrap();
        assert_eq!(pairing.aff_name(), "Lions");
        assert_eq!(pairing.neg_name(), "Tigers");
        assert_eq!(pairing.round_number, "3");
        assert!(std::ptr::eq(pairing.aff, &teams.records[0]));
    }

    #[test]
    fn missing_aff_names_side_and_value() {
        let teams = teams();
        let err = resolve(&round("Bears", "Tigers"), &teams, "1").unwrap_err();
        match &err {
            RoundError::UnresolvedTeam { side, name } => {
                assert_eq!(*side, Side::Affirmative);
                assert_eq!(name, "Bears");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Could not find AFF team Bears. Make sure they match in the round and team file."
        );
    }

    #[test]
    fn missing_neg_names_side_and_value() {
        let teams = teams();
        let err = resolve(&round("Lions", "Wolves"), &teams, "1").unwrap_err();
        assert!(matches!(
            err,
            RoundError::UnresolvedTeam { side: Side::Negative, ref name } if name == "Wolves"
        ));
    }

    #[test]
    fn match_is_case_and_whitespace_sensitive() {
        let teams = teams();
        assert!(resolve(&round("lions", "Tigers"), &teams, "1").is_err());
        assert!(resolve(&round("Lions ", "Tigers"), &teams, "1").is_err());
    }

    #[test]
    fn empty_team_name_never_matches() {
        let teams = teams();
        let err = resolve(&round("", "Tigers"), &teams, "1").unwrap_err();
        assert!(matches!(err, RoundError::UnresolvedTeam { side: Side::Affirmative, .. }));
    }

    #[test]
    fn round_without_columns_fails_on_aff() {
        let teams = teams();
        let err = resolve(&Record::new().with("Room", "1"), &teams, "1").unwrap_err();
        assert!(matches!(err, RoundError::UnresolvedTeam { side: Side::Affirmative, .. }));
    }

    #[test]
    fn same_team_on_both_sides_resolves() {
        let teams = teams();
        let pairing = resolve(&round("Lions", "Lions"), &teams, "1").unwrap();
        assert_eq!(pairing.aff, pairing.neg);
    }
}
