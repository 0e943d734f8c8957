//! Snake-draft team balancing.
//!
//! Goalkeepers and line players are drafted separately. Each group is sorted by
//! descending skill (stable, so equal ratings keep roster order). Goalkeepers are
//! dealt round-robin, line players in a snake order that reverses every round so
//! the team picking last in one round picks first in the next.
//!
//! The draft is deterministic. Callers wanting a different outcome on each run
//! must shuffle the roster explicitly with [`shuffle_roster`] before balancing.

use std::{cmp::Ordering, num::NonZeroUsize};

use rand::{Rng, seq::SliceRandom};

use crate::state::pelada::{Player, TeamAssignment};

/// Partition `roster` into exactly `team_count` teams.
///
/// Every player lands on exactly one team. An empty roster yields empty teams and
/// a roster smaller than `team_count` leaves some teams empty.
pub fn balance_teams(roster: &[Player], team_count: NonZeroUsize) -> Vec<Vec<Player>> {
    let team_count = team_count.get();
    let mut teams: Vec<Vec<Player>> = (0..team_count).map(|_| Vec::new()).collect();

    let (mut goalkeepers, mut line_players): (Vec<&Player>, Vec<&Player>) =
        roster.iter().partition(|player| player.is_goalkeeper());
    sort_by_skill_desc(&mut goalkeepers);
    sort_by_skill_desc(&mut line_players);

    for (index, goalkeeper) in goalkeepers.into_iter().enumerate() {
        teams[index % team_count].push(goalkeeper.clone());
    }

    for (index, player) in line_players.into_iter().enumerate() {
        teams[snake_slot(index, team_count)].push(player.clone());
    }

    teams
}

/// Team index receiving the `index`-th pick of a snake draft over `team_count` teams.
pub fn snake_slot(index: usize, team_count: usize) -> usize {
    let round = index / team_count;
    let position_in_round = index % team_count;
    if round % 2 == 0 {
        position_in_round
    } else {
        team_count - 1 - position_in_round
    }
}

/// Label for the team at `index`: `A`..`Z`, then `AA`, `AB`, ...
pub fn team_label(index: usize) -> String {
    let mut remaining = index + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        remaining -= 1;
        letters.push(char::from(b'A' + (remaining % 26) as u8));
        remaining /= 26;
    }
    letters.iter().rev().collect()
}

/// Flatten drafted teams into one labelled assignment per player.
pub fn label_assignments(teams: &[Vec<Player>]) -> Vec<TeamAssignment> {
    teams
        .iter()
        .enumerate()
        .flat_map(|(index, team)| {
            let label = team_label(index);
            team.iter().map(move |player| TeamAssignment {
                player_id: player.id,
                team: label.clone(),
            })
        })
        .collect()
}

/// Randomize roster order ahead of a draft. Only players sharing a skill rating can
/// end up on different teams because of it.
pub fn shuffle_roster<R: Rng + ?Sized>(roster: &mut [Player], rng: &mut R) {
    roster.shuffle(rng);
}

fn sort_by_skill_desc(players: &mut [&Player]) {
    // `sort_by` is stable: ties keep their roster order.
    players.sort_by(|a, b| {
        b.skill
            .value()
            .partial_cmp(&a.skill.value())
            .unwrap_or(Ordering::Equal)
    });
}
