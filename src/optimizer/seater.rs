//! Crew seating: assign a concrete set of crew to the 12 seats by
//! seek-and-displace backtracking, favoring trait-matched (ideal) placements.
//!
//! Every search pass runs in its own lane of a small arena of visited buffers.
//! A lane is reset before its pass starts and is never shared with another pass,
//! so a recursive displacement chain only ever sees its own bookkeeping.

use crate::data::{VoyageConfig, SEAT_COUNT};
use crate::optimizer::lineup::{build_lineup, Lineup};
use crate::optimizer::primer::PrimedCrew;
use crate::optimizer::progress::ProgressSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index into the primed roster.
    pub crew: usize,
    pub ideal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatAssignment {
    slots: [Option<Placement>; SEAT_COUNT],
}

impl SeatAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[Option<Placement>; SEAT_COUNT] {
        &self.slots
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == SEAT_COUNT
    }

    pub fn seat_of(&self, crew: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.map(|p| p.crew) == Some(crew))
    }

    pub fn place(&mut self, seat: usize, crew: usize, ideal: bool) {
        self.slots[seat] = Some(Placement { crew, ideal });
    }

    /// # Panics
    /// When one crew member occupies two seats.
    pub fn assert_consistent(&self) {
        for (i, a) in self.slots.iter().enumerate() {
            let Some(a) = a else { continue };
            for b in self.slots.iter().skip(i + 1).flatten() {
                assert!(
                    a.crew != b.crew,
                    "crew #{} is seated twice in one assignment",
                    a.crew
                );
            }
        }
    }
}

/// A request to seat one crew member, either chasing an ideal seat or any seat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoyagerCandidate {
    pub crew: usize,
    pub score: f64,
    pub is_ideal: bool,
}

/// Candidates for `members`: a plain candidate for each, plus an ideal candidate
/// scored `ideal_bonus` higher for crew with at least one trait-matched seat.
/// Returned worst score first, so the weakest placements get first refusal.
pub fn voyager_candidates(
    roster: &[PrimedCrew],
    members: &[usize],
    score: impl Fn(&PrimedCrew) -> f64,
    ideal_bonus: f64,
) -> Vec<VoyagerCandidate> {
    let mut candidates = Vec::with_capacity(members.len() * 2);
    for &crew in members {
        let member = &roster[crew];
        let value = score(member);
        candidates.push(VoyagerCandidate {
            crew,
            score: value,
            is_ideal: false,
        });
        if member.has_ideal_seat() {
            candidates.push(VoyagerCandidate {
                crew,
                score: value + ideal_bonus,
                is_ideal: true,
            });
        }
    }
    candidates.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.crew.cmp(&b.crew))
            .then_with(|| a.is_ideal.cmp(&b.is_ideal))
    });
    candidates
}

/// Bitmask of the seats flagged in `slots`.
pub fn slot_mask(slots: &[bool; SEAT_COUNT]) -> u16 {
    slots
        .iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .fold(0u16, |mask, (seat, _)| mask | 1 << seat)
}

/// Fill every seat with a distinct member by augmenting paths. `viable[m]` holds
/// member `m`'s seat mask; seats in `preferred[m]` are tried first. Returns the
/// member index for each seat, or `None` when some seat stays empty.
pub fn match_seats(viable: &[u16], preferred: &[u16]) -> Option<[usize; SEAT_COUNT]> {
    fn augment(
        member: usize,
        viable: &[u16],
        preferred: &[u16],
        owner: &mut [Option<usize>; SEAT_COUNT],
        visited: &mut u16,
    ) -> bool {
        let first = viable[member] & preferred.get(member).copied().unwrap_or(0);
        for mask in [first, viable[member] & !first] {
            for seat in 0..SEAT_COUNT {
                let bit = 1u16 << seat;
                if mask & bit == 0 || *visited & bit != 0 {
                    continue;
                }
                *visited |= bit;
                let free = match owner[seat] {
                    None => true,
                    Some(holder) => augment(holder, viable, preferred, owner, visited),
                };
                if free {
                    owner[seat] = Some(member);
                    return true;
                }
            }
        }
        false
    }

    let mut owner = [None; SEAT_COUNT];
    for member in 0..viable.len() {
        let mut visited = 0u16;
        augment(member, viable, preferred, &mut owner, &mut visited);
    }
    let mut seats = [0usize; SEAT_COUNT];
    for (seat, holder) in owner.iter().enumerate() {
        seats[seat] = (*holder)?;
    }
    Some(seats)
}

/// Seat `members` straight from a seat matching, trait-matched seats first.
/// Used when seek-and-displace leaves a seatable combination short.
pub fn seat_by_matching(
    voyage: &VoyageConfig,
    roster: &[PrimedCrew],
    members: &[usize],
) -> Option<Lineup> {
    let viable: Vec<u16> = members
        .iter()
        .map(|&crew| slot_mask(&roster[crew].viable_slots))
        .collect();
    let preferred: Vec<u16> = members
        .iter()
        .map(|&crew| slot_mask(&roster[crew].trait_slots))
        .collect();
    let seats = match_seats(&viable, &preferred)?;
    let mut assignment = SeatAssignment::new();
    for (seat, member) in seats.iter().enumerate() {
        let crew = members[*member];
        assignment.place(seat, crew, roster[crew].is_ideal_for(seat));
    }
    Some(build_lineup(voyage, roster, &assignment))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    /// Ideal pursuit; nobody loses an ideal seat.
    Strict = 0,
    /// Ideal pursuit; one ideal occupant may drop to a plain seat.
    Relaxed = 1,
    /// Plain pursuit; ideal occupants may only move to another ideal seat.
    Open = 2,
}

const LANE_COUNT: usize = 3;

#[derive(Debug)]
struct LaneArena {
    visited: [Vec<bool>; LANE_COUNT],
}

impl LaneArena {
    fn new(roster_len: usize) -> Self {
        Self {
            visited: [
                vec![false; roster_len],
                vec![false; roster_len],
                vec![false; roster_len],
            ],
        }
    }

    fn reset(&mut self, lane: Lane) {
        self.visited[lane as usize].fill(false);
    }

    fn visit(&mut self, lane: Lane, crew: usize) {
        self.visited[lane as usize][crew] = true;
    }

    fn seen(&self, lane: Lane, crew: usize) -> bool {
        self.visited[lane as usize][crew]
    }
}

struct Seater<'a> {
    roster: &'a [PrimedCrew],
    assignment: SeatAssignment,
    lanes: LaneArena,
}

impl<'a> Seater<'a> {
    fn new(roster: &'a [PrimedCrew]) -> Self {
        Self {
            roster,
            assignment: SeatAssignment::new(),
            lanes: LaneArena::new(roster.len()),
        }
    }

    fn viable(&self, crew: usize, seat: usize) -> bool {
        self.roster[crew].viable_slots[seat]
    }

    fn ideal(&self, crew: usize, seat: usize) -> bool {
        self.roster[crew].is_ideal_for(seat)
    }

    fn seek(&mut self, crew: usize, pursue_ideal: bool) -> bool {
        if let Some(current) = self.assignment.seat_of(crew) {
            let seated_ideal = self.assignment.slots[current].is_some_and(|p| p.ideal);
            if !pursue_ideal || seated_ideal {
                return true;
            }
            // try to trade the plain seat for an ideal one; put it back on failure
            let held = self.assignment.slots[current].take();
            if self.seek_ideal(crew) {
                return true;
            }
            self.assignment.slots[current] = held;
            return false;
        }

        if pursue_ideal {
            return self.seek_ideal(crew);
        }

        if let Some(seat) = self.open_seat(crew, true) {
            self.assignment.place(seat, crew, true);
            return true;
        }
        if let Some(seat) = self.open_seat(crew, false) {
            self.assignment.place(seat, crew, false);
            return true;
        }
        self.displace_into(crew, Lane::Open, 0, false)
    }

    fn seek_ideal(&mut self, crew: usize) -> bool {
        if let Some(seat) = self.open_seat(crew, true) {
            self.assignment.place(seat, crew, true);
            return true;
        }
        self.displace_into(crew, Lane::Strict, 0, true)
            || self.displace_into(crew, Lane::Relaxed, 1, true)
    }

    fn open_seat(&self, crew: usize, ideal: bool) -> Option<usize> {
        (0..SEAT_COUNT).find(|&s| {
            self.assignment.slots[s].is_none()
                && if ideal {
                    self.ideal(crew, s)
                } else {
                    self.viable(crew, s)
                }
        })
    }

    /// Put `crew` into an occupied seat by moving its occupant elsewhere.
    fn displace_into(&mut self, crew: usize, lane: Lane, demotions: u8, ideal_only: bool) -> bool {
        self.lanes.reset(lane);
        self.lanes.visit(lane, crew);

        for seat in 0..SEAT_COUNT {
            let wanted = if ideal_only {
                self.ideal(crew, seat)
            } else {
                self.viable(crew, seat)
            };
            if !wanted {
                continue;
            }
            let Some(occupant) = self.assignment.slots[seat] else {
                continue;
            };
            if self.lanes.seen(lane, occupant.crew) {
                continue;
            }
            if lane == Lane::Open && occupant.ideal && demotions == 0 && !self.has_other_ideal(occupant.crew, seat) {
                continue;
            }
            if self.relocate(seat, lane, demotions) {
                let ideal = self.ideal(crew, seat);
                self.assignment.place(seat, crew, ideal);
                return true;
            }
        }
        false
    }

    fn has_other_ideal(&self, crew: usize, seat: usize) -> bool {
        (0..SEAT_COUNT).any(|s| s != seat && self.ideal(crew, s))
    }

    /// Move the occupant of `seat` somewhere else, recursively displacing as needed.
    /// Nothing is mutated unless the whole chain succeeds.
    fn relocate(&mut self, seat: usize, lane: Lane, demotions: u8) -> bool {
        let Some(occupant) = self.assignment.slots[seat] else {
            return true;
        };
        let crew = occupant.crew;
        self.lanes.visit(lane, crew);

        let mut destinations: Vec<(usize, bool)> = (0..SEAT_COUNT)
            .filter(|&t| t != seat && self.viable(crew, t))
            .map(|t| (t, self.ideal(crew, t)))
            .filter(|&(_, keeps_ideal)| keeps_ideal || !occupant.ideal || demotions > 0)
            .collect();
        // open seats before occupied ones, ideal before plain
        destinations.sort_by_key(|&(t, ideal)| (self.assignment.slots[t].is_some(), !ideal, t));

        for (target, ideal_there) in destinations {
            let budget = if occupant.ideal && !ideal_there {
                demotions - 1
            } else {
                demotions
            };
            match self.assignment.slots[target] {
                None => {
                    self.assignment.slots[seat] = None;
                    self.assignment.place(target, crew, ideal_there);
                    return true;
                }
                Some(next) => {
                    if self.lanes.seen(lane, next.crew) {
                        continue;
                    }
                    if next.ideal && budget == 0 && !self.has_other_ideal(next.crew, target) {
                        continue;
                    }
                    if self.relocate(target, lane, budget) {
                        self.assignment.slots[seat] = None;
                        self.assignment.place(target, crew, ideal_there);
                        return true;
                    }
                }
            }
        }
        false
    }

    fn finish(self, voyage: &VoyageConfig) -> Option<Lineup> {
        self.assignment.assert_consistent();
        if !self.assignment.is_complete() {
            return None;
        }
        Some(build_lineup(voyage, self.roster, &self.assignment))
    }
}

/// Seat one combination. Deterministic for a given candidate order.
/// Returns `None` when fewer than 12 seats could be filled.
pub fn seat(
    voyage: &VoyageConfig,
    roster: &[PrimedCrew],
    candidates: &[VoyagerCandidate],
    debug: &mut dyn ProgressSink,
) -> Option<Lineup> {
    let mut seater = Seater::new(roster);
    for candidate in candidates {
        if !seater.seek(candidate.crew, candidate.is_ideal) && !candidate.is_ideal {
            debug.debug(&format!(
                "no seat for {} ({:.0})",
                roster[candidate.crew].id, candidate.score
            ));
        }
    }
    let filled = seater.assignment.filled();
    let lineup = seater.finish(voyage);
    if lineup.is_none() {
        debug.debug(&format!("seating failed with {filled}/{SEAT_COUNT} seats filled"));
    }
    lineup
}

/// Seat crew best-first until every seat is taken; returns the crew that made it
/// in, in seat order, or `None` when the roster runs out first.
pub fn seat_greedy(roster: &[PrimedCrew], order: &[usize]) -> Option<Vec<usize>> {
    let mut seater = Seater::new(roster);
    for &crew in order {
        if seater.assignment.is_complete() {
            break;
        }
        let member = &roster[crew];
        if !member.is_viable() {
            continue;
        }
        if member.has_ideal_seat() && seater.seek(crew, true) {
            continue;
        }
        seater.seek(crew, false);
    }
    seater.assignment.assert_consistent();
    if !seater.assignment.is_complete() {
        return None;
    }
    Some(
        seater
            .assignment
            .slots
            .iter()
            .flatten()
            .map(|placement| placement.crew)
            .collect(),
    )
}
