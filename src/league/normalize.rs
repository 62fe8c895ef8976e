use super::types::{Member, Standing};

/// Flag members whose display name exactly matches an exclusion name.
///
/// Matching is case-sensitive string equality. Order is preserved.
pub fn mark_excluded(standings: Vec<Standing>, exclusions: &[String]) -> Vec<Standing> {
    standings
        .into_iter()
        .map(|mut standing| {
            standing.member.excluded = exclusions
                .iter()
                .any(|name| *name == standing.member.display_name);
            standing
        })
        .collect()
}

/// Drop excluded members from the roster, keeping the incoming (rank) order.
///
/// An empty or fully excluded roster is returned as-is; settlement reports
/// the insufficient-data condition.
pub fn normalize_standings(standings: Vec<Standing>, exclusions: &[String]) -> Vec<Standing> {
    mark_excluded(standings, exclusions)
        .into_iter()
        .filter(|standing| !standing.member.excluded)
        .collect()
}

/// Members that an exclusion list would remove, for reporting
pub fn excluded_members(standings: &[Standing], exclusions: &[String]) -> Vec<Member> {
    mark_excluded(standings.to_vec(), exclusions)
        .into_iter()
        .filter(|standing| standing.member.excluded)
        .map(|standing| standing.member)
        .collect()
}
