//! Combat field layout and team bookkeeping.

use super::state::CombatState;
use super::{CombatantId, TeamSlot, PLAYER_TEAM};
use crate::entity::Entity;
use crate::error::{CombatError, Result};
use crate::math::Vector;

/// Spacing between neighbouring combatants in a row, and between rows.
pub const SPAWN_SPACING: f64 = 2.0;

/// A named group of entities entering combat together.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRoster {
    /// Team name; [`PLAYER_TEAM`] for the player's side.
    pub name: String,
    /// Members, in spawn order.
    pub members: Vec<Entity>,
}

impl TeamRoster {
    /// Create a roster.
    #[must_use]
    pub fn new(name: impl Into<String>, members: Vec<Entity>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// A team placed on the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Team name.
    pub name: String,
    /// Side of the field.
    pub slot: TeamSlot,
    /// Members, in spawn order.
    pub members: Vec<CombatantId>,
}

/// Every combatant of one combat and where they stand.
///
/// The context owns all [`CombatState`]s. Everything else refers to them by
/// [`CombatantId`].
#[derive(Debug, Clone)]
pub struct CombatContext {
    combatants: Vec<CombatState>,
    teams: Vec<Team>,
    enemies: Vec<CombatantId>,
    player: Option<CombatantId>,
    max_power_level: f64,
    field_size: f64,
}

impl CombatContext {
    /// Place every roster on a square field of side `field_size`.
    ///
    /// The player team takes slot 4; other teams take slots 1..3 in the
    /// order given.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no [`PLAYER_TEAM`] roster or more than
    /// four rosters.
    pub fn new(rosters: Vec<TeamRoster>, field_size: f64) -> Result<Self> {
        if !rosters.iter().any(|roster| roster.name == PLAYER_TEAM) {
            return Err(CombatError::MissingPlayerTeam(PLAYER_TEAM.to_string()));
        }
        if rosters.len() > TeamSlot::COUNT {
            return Err(CombatError::TooManyTeams {
                count: rosters.len(),
                max: TeamSlot::COUNT,
            });
        }

        let mut context = Self {
            combatants: Vec::new(),
            teams: Vec::with_capacity(rosters.len()),
            enemies: Vec::new(),
            player: None,
            max_power_level: 0.0,
            field_size,
        };

        let mut free_slots = TeamSlot::OTHERS.into_iter();
        for roster in rosters {
            let slot = if roster.name == PLAYER_TEAM {
                TeamSlot::PLAYER
            } else {
                free_slots.next().ok_or(CombatError::TooManyTeams {
                    count: TeamSlot::COUNT + 1,
                    max: TeamSlot::COUNT,
                })?
            };

            let mut members = Vec::with_capacity(roster.members.len());
            for (index, entity) in roster.members.into_iter().enumerate() {
                let id = CombatantId(context.combatants.len());
                let position = spawn_position(slot, index, field_size);
                let state = CombatState::new(entity, roster.name.clone(), slot, position);

                context.max_power_level = context.max_power_level.max(state.power_level);
                if slot.is_player() {
                    if context.player.is_none() && state.is_player() {
                        context.player = Some(id);
                    }
                } else {
                    context.enemies.push(id);
                }
                context.combatants.push(state);
                members.push(id);
            }

            context.teams.push(Team {
                name: roster.name,
                slot,
                members,
            });
        }

        tracing::info!(
            combatants = context.combatants.len(),
            teams = context.teams.len(),
            field_size,
            max_power_level = context.max_power_level,
            "Combat context built"
        );
        Ok(context)
    }

    /// Side length of the field.
    #[must_use]
    pub fn field_size(&self) -> f64 {
        self.field_size
    }

    /// Highest power level among all combatants.
    #[must_use]
    pub fn max_power_level(&self) -> f64 {
        self.max_power_level
    }

    /// The player's combatant, if the player fights.
    #[must_use]
    pub fn player(&self) -> Option<CombatantId> {
        self.player
    }

    /// Number of combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// Whether there are no combatants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Every combatant handle, in processing order.
    pub fn ids(&self) -> impl Iterator<Item = CombatantId> {
        (0..self.combatants.len()).map(CombatantId)
    }

    /// Combatant by handle.
    #[must_use]
    pub fn get(&self, id: CombatantId) -> Option<&CombatState> {
        self.combatants.get(id.index())
    }

    /// Combatant by handle.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownCombatant`] for a foreign handle.
    pub fn combatant(&self, id: CombatantId) -> Result<&CombatState> {
        self.get(id).ok_or(CombatError::UnknownCombatant(id.index()))
    }

    /// Mutable combatant by handle.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownCombatant`] for a foreign handle.
    pub fn combatant_mut(&mut self, id: CombatantId) -> Result<&mut CombatState> {
        self.combatants
            .get_mut(id.index())
            .ok_or(CombatError::UnknownCombatant(id.index()))
    }

    /// Two distinct combatants at once.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownCombatant`] for a foreign handle.
    ///
    /// # Panics
    ///
    /// Panics if `a == b`.
    pub fn pair_mut(
        &mut self,
        a: CombatantId,
        b: CombatantId,
    ) -> Result<(&mut CombatState, &mut CombatState)> {
        assert_ne!(a, b, "pair_mut needs two distinct combatants");
        let len = self.combatants.len();
        for id in [a, b] {
            if id.index() >= len {
                return Err(CombatError::UnknownCombatant(id.index()));
            }
        }
        if a.index() < b.index() {
            let (low, high) = self.combatants.split_at_mut(b.index());
            Ok((&mut low[a.index()], &mut high[0]))
        } else {
            let (low, high) = self.combatants.split_at_mut(a.index());
            Ok((&mut high[0], &mut low[b.index()]))
        }
    }

    /// Teams in encounter order.
    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Team in a slot.
    #[must_use]
    pub fn team(&self, slot: TeamSlot) -> Option<&Team> {
        self.teams.iter().find(|team| team.slot == slot)
    }

    /// Living members of the team in `slot`.
    #[must_use]
    pub fn alive_in_team(&self, slot: TeamSlot) -> usize {
        self.team(slot).map_or(0, |team| self.count_alive(&team.members))
    }

    /// Living combatants outside the player team.
    #[must_use]
    pub fn alive_enemies(&self) -> usize {
        self.count_alive(&self.enemies)
    }

    /// Living members of the player team.
    #[must_use]
    pub fn alive_player_team(&self) -> usize {
        self.alive_in_team(TeamSlot::PLAYER)
    }

    fn count_alive(&self, ids: &[CombatantId]) -> usize {
        ids.iter()
            .filter(|&&id| self.get(id).is_some_and(CombatState::is_alive))
            .count()
    }

    /// Non-player combatants; the player refers to `enemies()[n - 1]` as `n`.
    #[must_use]
    pub fn enemies(&self) -> &[CombatantId] {
        &self.enemies
    }

    /// Enemy by player-facing number, starting at 1.
    #[must_use]
    pub fn enemy_by_number(&self, number: usize) -> Option<CombatantId> {
        number
            .checked_sub(1)
            .and_then(|index| self.enemies.get(index))
            .copied()
    }

    /// Living combatants of every team other than `id`'s.
    #[must_use]
    pub fn living_enemies_of(&self, id: CombatantId) -> Vec<CombatantId> {
        let Some(own_slot) = self.get(id).map(|state| state.slot) else {
            return Vec::new();
        };
        self.teams
            .iter()
            .filter(|team| team.slot != own_slot)
            .flat_map(|team| team.members.iter().copied())
            .filter(|&other| self.get(other).is_some_and(CombatState::is_alive))
            .collect()
    }

    /// Nearest living combatant of another team. Ties keep the first found.
    #[must_use]
    pub fn closest_enemy(&self, id: CombatantId) -> Option<CombatantId> {
        let origin = self.get(id)?;
        let mut closest: Option<(CombatantId, f64)> = None;
        for other in self.living_enemies_of(id) {
            let Some(state) = self.get(other) else {
                continue;
            };
            let distance = origin.distance_to(state);
            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((other, distance));
            }
        }
        closest.map(|(other, _)| other)
    }

    /// Distance between two combatants.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownCombatant`] for a foreign handle.
    pub fn distance(&self, a: CombatantId, b: CombatantId) -> Result<f64> {
        Ok(self.combatant(a)?.distance_to(self.combatant(b)?))
    }

    /// Power level of a combatant relative to the strongest.
    #[must_use]
    pub fn power_factor(&self, id: CombatantId) -> f64 {
        let Some(state) = self.get(id) else {
            return 0.0;
        };
        if self.max_power_level <= 0.0 {
            return 1.0;
        }
        state.power_level / self.max_power_level
    }

    /// Iterate combatants in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (CombatantId, &CombatState)> {
        self.combatants
            .iter()
            .enumerate()
            .map(|(index, state)| (CombatantId(index), state))
    }

    /// Hand the entities back, in processing order.
    #[must_use]
    pub fn into_entities(self) -> Vec<Entity> {
        self.combatants
            .into_iter()
            .map(|state| state.entity)
            .collect()
    }
}

/// Starting position of the `index`-th member of the team in `slot`.
///
/// Members alternate either side of the slot's base point along the row
/// axis; a full row of `field_size / 2` members starts a new row further
/// along the stacking axis.
#[must_use]
pub fn spawn_position(slot: TeamSlot, index: usize, field_size: f64) -> Vector {
    let half = field_size / 2.0;
    let (base, row_along_x) = match slot.0 {
        1 => (Vector::new(half, field_size), true),
        2 => (Vector::new(0.0, half), false),
        3 => (Vector::new(field_size, half), false),
        _ => (Vector::new(half, 0.0), true),
    };

    let per_row = (half as usize).max(1);
    let row = index / per_row;
    let in_row = index % per_row;
    let offset = if in_row % 2 == 0 {
        -((in_row / 2) as f64) * SPAWN_SPACING
    } else {
        ((in_row / 2 + 1) as f64) * SPAWN_SPACING
    };
    let stack = row as f64 * SPAWN_SPACING;

    if row_along_x {
        Vector::new(base.x + offset, base.y + stack)
    } else {
        Vector::new(base.x + stack, base.y + offset)
    }
}
