//! Turning a location's entities into teams.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::context::{CombatContext, TeamRoster};
use super::resolver::CombatResolver;
use super::PLAYER_TEAM;
use crate::config::CombatConfig;
use crate::entity::{Entity, PLAYER_TAG};
use crate::error::{CombatError, Result};
use crate::rng::RandomSource;

/// Most commanders `group_by_commanders` accepts; one per non-player slot.
pub const MAX_COMMANDERS: usize = 3;

/// Field size named by a location tag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum FieldSize {
    /// 10 units.
    #[strum(serialize = "small")]
    Small,
    /// 100 units.
    #[default]
    #[strum(serialize = "medium")]
    Medium,
    /// 1,000 units.
    #[strum(serialize = "large")]
    Large,
    /// 10,000 units.
    #[strum(serialize = "very large")]
    VeryLarge,
    /// 100,000 units.
    #[strum(serialize = "huge")]
    Huge,
    /// 1,000,000 units.
    #[strum(serialize = "gigantic")]
    Gigantic,
    /// 10,000,000 units.
    #[strum(serialize = "open field")]
    OpenField,
}

impl FieldSize {
    /// Side length of the field.
    #[must_use]
    pub const fn units(self) -> f64 {
        match self {
            Self::Small => 10.0,
            Self::Medium => 100.0,
            Self::Large => 1_000.0,
            Self::VeryLarge => 10_000.0,
            Self::Huge => 100_000.0,
            Self::Gigantic => 1_000_000.0,
            Self::OpenField => 10_000_000.0,
        }
    }

    /// First size, smallest to largest, that appears among `tags`.
    #[must_use]
    pub fn from_tags(tags: &[String]) -> Self {
        Self::iter()
            .find(|size| tags.iter().any(|tag| *tag == size.to_string()))
            .unwrap_or_default()
    }
}

/// A place where combat happens.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Display name.
    pub name: String,
    /// Descriptive tags, including at most one meaningful size tag.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Entities present.
    #[serde(default)]
    pub entities: Vec<Entity>,
}

/// Which entities join a team.
///
/// An entity matches when it carries every tag of at least one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRule {
    /// Team name; [`PLAYER_TEAM`] for the player's side.
    pub team: String,
    /// Alternative tag groups.
    pub groups: Vec<Vec<String>>,
}

impl TeamRule {
    /// Create a rule.
    #[must_use]
    pub fn new(team: impl Into<String>, groups: Vec<Vec<String>>) -> Self {
        Self {
            team: team.into(),
            groups,
        }
    }

    /// The standard player rule: everything tagged [`PLAYER_TAG`].
    #[must_use]
    pub fn player() -> Self {
        Self::new(PLAYER_TEAM, vec![vec![PLAYER_TAG.to_string()]])
    }

    /// Whether `entity` belongs to this team.
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        self.groups.iter().any(|group| entity.has_all_tags(group))
    }
}

/// Builds combats at one location.
#[derive(Debug, Clone)]
pub struct CombatStarter {
    location: Location,
    field_size: FieldSize,
}

impl CombatStarter {
    /// Prepare combat at `location`.
    #[must_use]
    pub fn new(location: Location) -> Self {
        let field_size = FieldSize::from_tags(&location.tags);
        Self {
            location,
            field_size,
        }
    }

    /// Location in use.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Field size derived from the location's tags.
    #[must_use]
    pub fn field_size(&self) -> FieldSize {
        self.field_size
    }

    /// Side length of the field.
    #[must_use]
    pub fn location_size(&self) -> f64 {
        self.field_size.units()
    }

    /// Group the location's entities by `rules`.
    ///
    /// Each entity joins the first rule it matches. The player team is kept
    /// even when empty; other empty teams are dropped. Teams come out in
    /// rule order.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::MissingPlayerTeam`] when no rule names the
    /// player team, [`CombatError::DuplicateTeam`] when two rules share a
    /// name, or [`CombatError::TooManyTeams`] for more than four populated
    /// teams.
    pub fn group_by_tags(&self, rules: &[TeamRule]) -> Result<CombatContext> {
        if !rules.iter().any(|rule| rule.team == PLAYER_TEAM) {
            return Err(CombatError::MissingPlayerTeam(PLAYER_TEAM.to_string()));
        }
        for (index, rule) in rules.iter().enumerate() {
            if rules[..index].iter().any(|earlier| earlier.team == rule.team) {
                return Err(CombatError::DuplicateTeam(rule.team.clone()));
            }
        }

        let mut members: Vec<Vec<Entity>> = vec![Vec::new(); rules.len()];
        for entity in &self.location.entities {
            if let Some(index) = rules.iter().position(|rule| rule.matches(entity)) {
                members[index].push(entity.clone());
            }
        }

        let rosters: Vec<TeamRoster> = rules
            .iter()
            .zip(members)
            .filter(|(rule, members)| rule.team == PLAYER_TEAM || !members.is_empty())
            .map(|(rule, members)| TeamRoster::new(rule.team.clone(), members))
            .collect();

        tracing::debug!(
            location = %self.location.name,
            teams = rosters.len(),
            "Grouped entities into teams"
        );
        CombatContext::new(rosters, self.location_size())
    }

    /// The player against everything sharing all of `target`'s tags.
    ///
    /// # Errors
    ///
    /// See [`CombatStarter::group_by_tags`].
    pub fn group_by_target_tags(&self, target: &Entity) -> Result<CombatContext> {
        self.group_by_tags(&[
            TeamRule::player(),
            TeamRule::new("team_1", vec![target.tags.clone()]),
        ])
    }

    /// One team per commander, each gathering everything that carries all
    /// of the commander's tags, plus the player team.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::TooManyCommanders`] for more than
    /// [`MAX_COMMANDERS`] and [`CombatError::DuplicateCommanderTags`] when
    /// two commanders carry the same tag set.
    pub fn group_by_commanders(&self, commanders: &[Entity]) -> Result<CombatContext> {
        if commanders.len() > MAX_COMMANDERS {
            return Err(CombatError::TooManyCommanders {
                count: commanders.len(),
                max: MAX_COMMANDERS,
            });
        }

        let mut seen: Vec<Vec<String>> = Vec::with_capacity(commanders.len());
        let mut rules = vec![TeamRule::player()];
        for commander in commanders {
            let mut tags = commander.tags.clone();
            tags.sort();
            tags.dedup();
            if seen.contains(&tags) {
                return Err(CombatError::DuplicateCommanderTags(tags));
            }
            seen.push(tags);
            rules.push(TeamRule::new(
                format!("team_{}", rules.len()),
                vec![commander.tags.clone()],
            ));
        }
        self.group_by_tags(&rules)
    }

    /// Hand a built context to a resolver.
    #[must_use]
    pub fn start_combat<R: RandomSource>(
        context: CombatContext,
        rng: R,
        config: CombatConfig,
    ) -> CombatResolver<R> {
        tracing::info!(
            combatants = context.len(),
            teams = context.teams().len(),
            field_size = context.field_size(),
            "Combat started"
        );
        CombatResolver::new(context, rng, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::TeamSlot;
    use crate::entity::EntityKind;
    use crate::rng::SeededRandom;
    use crate::stats::Stats;

    fn stats() -> Stats {
        Stats::new(2.0, 5.0, 5.0, 2.0, 1.0, 0.0)
    }

    fn wolf(id: &str) -> Entity {
        Entity::new(id, "Wolf", EntityKind::Beast, stats()).with_tag("Wolf")
    }

    fn bandit(id: &str) -> Entity {
        Entity::new(id, "Bandit", EntityKind::Human, stats()).with_tag("Bandit")
    }

    fn location(tags: &[&str]) -> Location {
        Location {
            name: "Forest road".to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
            entities: vec![
                Entity::new("you", "You", EntityKind::Player, stats()),
                wolf("w1"),
                bandit("b1"),
                wolf("w2"),
            ],
        }
    }

    fn team_sizes(context: &CombatContext) -> Vec<(String, usize)> {
        context
            .teams()
            .iter()
            .map(|team| (team.name.clone(), team.members.len()))
            .collect()
    }

    #[test]
    fn test_field_size_from_tags() {
        assert_eq!(FieldSize::from_tags(&[]), FieldSize::Medium);
        assert_eq!(FieldSize::from_tags(&["forest".to_string()]), FieldSize::Medium);
        assert_eq!(FieldSize::from_tags(&["open field".to_string()]), FieldSize::OpenField);
        // Table order decides, not tag order.
        let tags = vec!["huge".to_string(), "small".to_string()];
        assert_eq!(FieldSize::from_tags(&tags), FieldSize::Small);
        assert_eq!(CombatStarter::new(location(&["very large"])).location_size(), 10_000.0);
    }

    #[test]
    fn test_group_by_tags_first_rule_wins() {
        let starter = CombatStarter::new(location(&[]));
        let rules = [
            TeamRule::player(),
            TeamRule::new("beasts", vec![vec!["Beast".to_string()]]),
            TeamRule::new("wolves", vec![vec!["Wolf".to_string()]]),
            TeamRule::new("outlaws", vec![vec!["Human".to_string(), "Bandit".to_string()]]),
        ];
        let context = starter.group_by_tags(&rules).unwrap();
        assert_eq!(
            team_sizes(&context),
            vec![
                (PLAYER_TEAM.to_string(), 1),
                ("beasts".to_string(), 2),
                ("outlaws".to_string(), 1),
            ]
        );
        assert_eq!(context.team(TeamSlot(2)).unwrap().name, "outlaws");
    }

    #[test]
    fn test_player_rule_is_required() {
        let starter = CombatStarter::new(location(&[]));
        let wolves = TeamRule::new("wolves", vec![vec!["Wolf".to_string()]]);
        let result = starter.group_by_tags(&[wolves]);
        assert!(matches!(result, Err(CombatError::MissingPlayerTeam(_))));
    }

    #[test]
    fn test_team_names_are_unique() {
        let starter = CombatStarter::new(location(&[]));
        let result = starter.group_by_tags(&[TeamRule::player(), TeamRule::player()]);
        assert!(matches!(result, Err(CombatError::DuplicateTeam(name)) if name == PLAYER_TEAM));

        let wolves = || TeamRule::new("wolves", vec![vec!["Wolf".to_string()]]);
        let result = starter.group_by_tags(&[TeamRule::player(), wolves(), wolves()]);
        assert!(matches!(result, Err(CombatError::DuplicateTeam(name)) if name == "wolves"));
    }

    #[test]
    fn test_player_team_kept_when_empty() {
        let mut place = location(&[]);
        place.entities.remove(0);
        let context = CombatStarter::new(place)
            .group_by_target_tags(&wolf("template"))
            .unwrap();
        assert_eq!(
            team_sizes(&context),
            vec![(PLAYER_TEAM.to_string(), 0), ("team_1".to_string(), 2)]
        );
        assert_eq!(context.alive_player_team(), 0);
    }

    #[test]
    fn test_group_by_commanders() {
        let starter = CombatStarter::new(location(&["small"]));
        let context = starter
            .group_by_commanders(&[wolf("w1"), bandit("b1")])
            .unwrap();
        assert_eq!(
            team_sizes(&context),
            vec![
                (PLAYER_TEAM.to_string(), 1),
                ("team_1".to_string(), 2),
                ("team_2".to_string(), 1),
            ]
        );
        assert_eq!(context.field_size(), 10.0);
    }

    #[test]
    fn test_commander_limits() {
        let starter = CombatStarter::new(location(&[]));
        let many = [
            wolf("a"),
            bandit("b"),
            wolf("c").with_tag("Alpha"),
            bandit("d").with_tag("Boss"),
        ];
        assert!(matches!(
            starter.group_by_commanders(&many),
            Err(CombatError::TooManyCommanders { count: 4, max: 3 })
        ));

        let mut reordered = wolf("w3");
        reordered.tags.reverse();
        assert!(matches!(
            starter.group_by_commanders(&[wolf("w1"), reordered]),
            Err(CombatError::DuplicateCommanderTags(_))
        ));
    }

    #[test]
    fn test_start_combat() {
        let starter = CombatStarter::new(location(&[]));
        let context = starter.group_by_target_tags(&bandit("template")).unwrap();
        let resolver =
            CombatStarter::start_combat(context, SeededRandom::new(3), CombatConfig::default());
        assert_eq!(resolver.tick_count(), 0);
        assert_eq!(resolver.context().len(), 2);
    }
}
