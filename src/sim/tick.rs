//! Fixed timestep simulation tick
//!
//! Order within a tick is fixed:
//! 1. rebuild the grid, dropping actors that left the field
//! 2. update every actor
//! 3. roll enemy fire per column
//! 4. advance the swarm (its movement shows up in next tick's grid)
//! 5. resolve collisions for the player projectile and the cannon
//! 6. remove actors marked dead

use glam::Vec2;

use super::actor::{ActorId, CannonInput, SpawnRequest, UpdateContext};
use super::state::{GameState, SimEvent};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Held fire; a shot spawns whenever none is in flight
    pub fire: bool,
    /// Manual difficulty bump, already edge-detected by the caller
    pub bump_difficulty: bool,
}

impl TickInput {
    fn cannon(&self) -> CannonInput {
        CannonInput {
            left: self.left,
            right: self.right,
            fire: self.fire,
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;

    rebuild_index(state);
    update_actors(state, input, dt);
    spawn_enemy_fire(state);

    let report = state
        .swarm
        .update(dt, input.bump_difficulty, &mut state.actors, state.field.x);
    for level in report.new_levels {
        state.set_level(level);
    }
    if report.mission_complete {
        log::info!("Mission complete at tick {}", state.time_ticks);
        state.push_event(SimEvent::MissionComplete);
    }

    if let Some(shot) = state.player_shot {
        resolve_collision(state, shot);
    }
    if let Some(cannon) = state.cannon {
        resolve_collision(state, cannon);
    }

    state.remove_dead();
}

/// Re-bucket every live actor; anything the grid cannot place is off-field
fn rebuild_index(state: &mut GameState) {
    state.index.clear();
    for actor in state.actors.values() {
        state.index.insert(actor.id, &actor.shape);
    }
    let off_field: Vec<ActorId> = state
        .actors
        .keys()
        .copied()
        .filter(|id| !state.index.contains(*id))
        .collect();
    for id in off_field {
        state.remove(id);
    }
}

fn update_actors(state: &mut GameState, input: &TickInput, dt: f32) {
    let ctx = UpdateContext {
        input: input.cannon(),
        field: state.field,
        player_shot_alive: state.player_shot.is_some(),
    };
    let requests: Vec<SpawnRequest> = state
        .actors
        .values_mut()
        .filter_map(|actor| actor.update(dt, &ctx))
        .collect();

    for request in requests {
        match request {
            SpawnRequest::PlayerShot { at } => {
                state.spawn_player_shot(at);
            }
        }
    }
}

fn spawn_enemy_fire(state: &mut GameState) {
    let shots: Vec<Vec2> = state.swarm.roll_fire(&mut state.rng, &state.actors);
    for at in shots {
        state.spawn_enemy_shot(at);
    }
}

/// Let `id` react to the first (lowest id) live actor it overlaps
fn resolve_collision(state: &mut GameState, id: ActorId) {
    let Some(actor) = state.actors.get(&id).filter(|a| !a.dead) else {
        return;
    };
    let actors = &state.actors;
    let hits = state.index.query_colliding(id, &actor.shape, |other| {
        actors.get(&other).filter(|a| !a.dead).map(|a| a.shape)
    });
    let Some(&other_id) = hits.first() else {
        return;
    };

    let outcome = actor.on_collide(&actors[&other_id]);
    if outcome.kill_self {
        state.mark_dead(id);
    }
    if outcome.kill_other {
        state.mark_dead(other_id);
    }
    if let Some(cue) = outcome.cue {
        state.push_event(SimEvent::Cue(cue));
    }
    if outcome.points > 0 {
        log::debug!("Enemy {:?} destroyed for {} points", other_id, outcome.points);
        state.award_points(outcome.points);
    }
    if outcome.player_hit {
        log::debug!("Cannon {:?} hit by {:?}", id, other_id);
        state.push_event(SimEvent::PlayerHit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Cue;
    use crate::consts::{MIN_FIELD_HEIGHT, MIN_FIELD_WIDTH, SIM_DT};
    use crate::error::SimError;
    use crate::settings::Settings;
    use crate::sim::actor::{Actor, ActorKind};

    fn quiet_settings() -> Settings {
        Settings {
            shoot_probability: 0.0,
            shoot_probability_step: 0.0,
            ..Settings::default()
        }
    }

    fn state() -> GameState {
        let mut state = GameState::new(quiet_settings(), Vec2::new(800.0, 650.0)).unwrap();
        state.drain_events();
        state
    }

    fn fire() -> TickInput {
        TickInput {
            fire: true,
            ..Default::default()
        }
    }

    fn count(state: &GameState, kind: ActorKind) -> usize {
        state.actors.values().filter(|a| a.kind == kind).count()
    }

    fn assert_layout_survives_first_tick(field: Vec2) {
        let mut state = GameState::new(quiet_settings(), field).unwrap();
        let spawned: Vec<ActorId> = state.actors.keys().copied().collect();
        assert_eq!(spawned.len(), 51);
        state.drain_events();

        tick(&mut state, &TickInput::default(), SIM_DT);
        for id in &spawned {
            assert!(state.actors.contains_key(id), "{:?} lost on a {:?} field", id, field);
        }
        assert!(state.cannon.is_some());
        assert_eq!(state.swarm.enemy_count(), 50);
        assert!(!state.drain_events().contains(&SimEvent::PlayerHit));
    }

    #[test]
    fn test_small_fields_keep_every_spawned_actor() {
        assert_layout_survives_first_tick(Vec2::new(300.0, 200.0));
        assert_layout_survives_first_tick(Vec2::new(120.0, 650.0));
        assert_layout_survives_first_tick(Vec2::new(800.0, 90.0));
        assert_layout_survives_first_tick(Vec2::new(MIN_FIELD_WIDTH, MIN_FIELD_HEIGHT));
    }

    #[test]
    fn test_field_too_short_for_cannon_is_rejected() {
        let err = GameState::new(quiet_settings(), Vec2::new(800.0, 30.0)).unwrap_err();
        assert!(matches!(err, SimError::InvalidFieldSize { .. }));
    }

    #[test]
    fn test_narrow_field_swarm_marches_and_turns() {
        let mut state = GameState::new(quiet_settings(), Vec2::new(300.0, 650.0)).unwrap();
        let enemy = *state.swarm.columns.values().next().unwrap().enemies.first().unwrap();
        let start = state.actors[&enemy].pos();
        let mut rightmost = start.x;
        let mut turned_back = false;
        for _ in 0..(60 * 10) {
            tick(&mut state, &TickInput::default(), SIM_DT);
            let x = state.actors[&enemy].pos().x;
            rightmost = rightmost.max(x);
            turned_back |= x < rightmost;
        }
        assert!(rightmost > start.x);
        assert!(turned_back);
        assert!(state.actors[&enemy].pos().y < start.y);
    }

    #[test]
    fn test_fire_spawns_single_projectile() {
        let mut state = state();
        tick(&mut state, &fire(), SIM_DT);
        assert_eq!(count(&state, ActorKind::PlayerProjectile), 1);
        assert!(state.player_shot.is_some());
        let events = state.drain_events();
        assert!(events.contains(&SimEvent::Cue(Cue::Shoot)));

        let first = state.player_shot;
        tick(&mut state, &fire(), SIM_DT);
        assert_eq!(count(&state, ActorKind::PlayerProjectile), 1);
        assert_eq!(state.player_shot, first);
    }

    #[test]
    fn test_projectile_removed_after_leaving_top() {
        let mut state = state();
        // Clear the swarm out of the way so the shot flies free
        state.swarm.columns.clear();
        let enemies: Vec<_> = state.actors.values().filter(|a| a.kind.is_enemy()).map(|a| a.id).collect();
        for id in enemies {
            state.actors.remove(&id);
        }

        tick(&mut state, &fire(), SIM_DT);
        assert!(state.player_shot.is_some());
        // 650 px at 400 px/s is well under 3 s
        for _ in 0..180 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.player_shot.is_none());
        assert_eq!(count(&state, ActorKind::PlayerProjectile), 0);
    }

    #[test]
    fn test_shot_and_enemy_both_die_on_overlap() {
        let mut state = state();
        let enemy = *state.swarm.columns.values().next().unwrap().enemies.first().unwrap();
        let enemy_pos = state.actors[&enemy].pos();
        let column_len_before = state.swarm.columns.values().next().unwrap().enemies.len();

        let id = state.next_entity_id();
        state.spawn(Actor::player_shot(id, enemy_pos - Vec2::new(0.0, 5.0), 400.0));
        state.player_shot = Some(id);

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(!state.actors.contains_key(&enemy));
        assert!(!state.actors.contains_key(&id));
        assert_eq!(state.player_shot, None);
        assert_eq!(state.player.score, 10);
        let column_len_after = state.swarm.columns.values().next().unwrap().enemies.len();
        assert_eq!(column_len_after, column_len_before - 1);
        assert!(state.drain_events().contains(&SimEvent::Cue(Cue::Kill)));
    }

    #[test]
    fn test_cannon_hit_by_enemy_shot() {
        let mut state = state();
        let cannon = state.cannon.unwrap();
        let pos = state.actors[&cannon].pos();
        let shot = state.spawn_enemy_shot(pos + Vec2::new(0.0, 10.0));

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.cannon, None);
        assert!(!state.actors.contains_key(&shot));
        let events = state.drain_events();
        assert!(events.contains(&SimEvent::PlayerHit));
        assert!(events.contains(&SimEvent::Cue(Cue::Death)));
    }

    #[test]
    fn test_enemy_shot_removed_below_field() {
        let mut state = state();
        let shot = state.spawn_enemy_shot(Vec2::new(100.0, 5.0));
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(!state.actors.contains_key(&shot));
    }

    #[test]
    fn test_last_enemy_reports_mission_complete_next_update() {
        let mut state = state();
        let enemies: Vec<_> = state.actors.values().filter(|a| a.kind.is_enemy()).map(|a| a.id).collect();
        for id in enemies {
            state.mark_dead(id);
        }
        state.remove_dead();
        assert_eq!(state.swarm.enemy_count(), 0);
        state.drain_events();

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.drain_events().contains(&SimEvent::MissionComplete));
    }

    #[test]
    fn test_manual_bump_raises_level() {
        let mut state = state();
        let input = TickInput {
            bump_difficulty: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.swarm.level, 2);
        assert_eq!(state.player.level, 2);
        assert!(state.drain_events().contains(&SimEvent::LevelChanged(2)));
    }

    #[test]
    fn test_enemy_fire_spawns_below_lead() {
        let mut state = state();
        state.swarm.shoot_probability = 1.0;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(count(&state, ActorKind::EnemyProjectile), 10);
    }

    #[test]
    fn test_no_overlapping_shot_enemy_pair_survives() {
        let mut settings = Settings::default();
        settings.shoot_probability = 0.02;
        let mut state = GameState::new(settings, Vec2::new(800.0, 650.0)).unwrap();
        for i in 0..2000 {
            let input = TickInput {
                left: (i / 90) % 2 == 0,
                right: (i / 90) % 2 == 1,
                fire: true,
                bump_difficulty: false,
            };
            tick(&mut state, &input, SIM_DT);
            if state.cannon.is_none() {
                state.spawn_cannon();
            }
            if let Some(shot) = state.player_shot {
                let shot = &state.actors[&shot];
                let overlapping = state
                    .actors
                    .values()
                    .any(|a| a.kind.is_enemy() && a.shape.overlaps(&shot.shape));
                assert!(!overlapping, "shot and enemy both alive while overlapping at tick {}", i);
            }
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut settings = Settings::default();
            settings.shoot_probability = 0.05;
            let mut state = GameState::new(settings, Vec2::new(800.0, 650.0)).unwrap();
            for i in 0..600 {
                let input = TickInput {
                    right: i % 200 < 100,
                    left: i % 200 >= 100,
                    fire: true,
                    bump_difficulty: false,
                };
                tick(&mut state, &input, SIM_DT);
                if state.cannon.is_none() {
                    state.spawn_cannon();
                }
            }
            state.snapshot()
        };
        assert_eq!(run(), run());
    }
}
