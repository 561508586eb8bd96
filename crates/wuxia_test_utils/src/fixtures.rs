//! Test fixtures and helpers.
//!
//! Pre-built entities, techniques and arenas for consistent testing.

use wuxia_core::combat::{CombatContext, CombatantId, Location, TeamRoster, PLAYER_TEAM};
use wuxia_core::cultivation::{Cultivation, QiReserves};
use wuxia_core::entity::{Entity, EntityKind};
use wuxia_core::math::Vector;
use wuxia_core::packets::DamageType;
use wuxia_core::stats::Stats;
use wuxia_core::technique::{PhaseOutput, PhysicalPhase, Technique};

/// Field size used by [`duel`]: a medium location.
pub const DUEL_FIELD_SIZE: f64 = 100.0;

/// Two techniques in catalog RON: a physical strike and a qi bullet.
pub const SAMPLE_TECHNIQUES_RON: &str = r#"[
    Technique(
        name: "Open Palm",
        output_start: "You open your stance.",
        physical: Some(PhysicalPhase(
            damage_type: Crush,
            damage_points: 50.0,
            speed_points: 20.0,
            precision_points: 10.0,
        )),
    ),
    Technique(
        name: "Needle Breath",
        qi: Some(QiPhase(
            effect: Ranged(RangedQi(
                damage_points: 30.0,
                speed_points: 20.0,
                precision_points: 5.0,
                range_points: 30.0,
                area_of_effect_points: 5.0,
                damage_type: Pierce,
                area_type: Bullet,
            )),
        )),
    ),
]"#;

/// Stats with vitality 2 (100 hp) and endurance 2 (70 stamina).
#[must_use]
pub fn stats(agility: f64, luck: f64) -> Stats {
    Stats::new(2.0, 5.0, agility, 2.0, luck, 0.0)
}

/// A player character.
#[must_use]
pub fn player(agility: f64, luck: f64) -> Entity {
    Entity::new("player", "You", EntityKind::Player, stats(agility, luck))
}

/// A human enemy tagged `Bandit`.
#[must_use]
pub fn bandit(id: &str, agility: f64, luck: f64) -> Entity {
    Entity::new(id, "Bandit", EntityKind::Human, stats(agility, luck)).with_tag("Bandit")
}

/// A beast enemy tagged `Wolf`.
#[must_use]
pub fn wolf(id: &str) -> Entity {
    Entity::new(id, "Wolf", EntityKind::Beast, stats(8.0, 2.0)).with_tag("Wolf")
}

/// Give an entity qi reserves and soul.
#[must_use]
pub fn cultivated(entity: Entity, mortal_qi: f64, soul: f64) -> Entity {
    entity.with_cultivation(Cultivation::new(QiReserves::new(mortal_qi, 0.0, 0.0), soul))
}

/// A physical strike technique.
#[must_use]
pub fn strike(
    name: &str,
    damage_points: f64,
    speed_points: f64,
    precision_points: f64,
    crit_points: f64,
) -> Technique {
    Technique::new(name).with_physical(PhysicalPhase {
        weapon_required: None,
        damage_type: DamageType::Crush,
        damage_points,
        speed_points,
        precision_points,
        crit_points,
        output: PhaseOutput::default(),
    })
}

/// Damage 50, speed 20, precision 10, no crit points.
#[must_use]
pub fn open_palm() -> Technique {
    strike("Open Palm", 50.0, 20.0, 10.0, 0.0)
}

/// Player against a single-member `team_1` on a medium field, `distance`
/// units apart. The player is [`CombatantId`] 0, the enemy 1.
///
/// # Panics
///
/// Panics if the context cannot be built.
#[must_use]
pub fn duel(player: Entity, enemy: Entity, distance: f64) -> CombatContext {
    let mut context = CombatContext::new(
        vec![
            TeamRoster::new(PLAYER_TEAM, vec![player]),
            TeamRoster::new("team_1", vec![enemy]),
        ],
        DUEL_FIELD_SIZE,
    )
    .expect("duel layout is valid");
    let anchor = context
        .combatant(CombatantId(0))
        .expect("player is combatant 0")
        .position;
    context
        .combatant_mut(CombatantId(1))
        .expect("enemy is combatant 1")
        .position = anchor + Vector::new(0.0, distance);
    context
}

/// A location with the given tags and entities.
#[must_use]
pub fn location(tags: &[&str], entities: Vec<Entity>) -> Location {
    Location {
        name: "Test Grounds".to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        entities,
    }
}
