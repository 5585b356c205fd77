#![allow(dead_code)]

use frag_actor::*;
use std::collections::HashMap;

pub const TICK_RATE: f64 = 64.0;

/// Builds a decoder event stream for a ten player match. Players 1 to 5
/// start on CT, 6 to 10 on T, and sides flip at every swap round.
pub struct DemoBuilder {
    tick: Tick,
    round: u32,
    events: Vec<TimedEvent>,
    health: HashMap<PlayerId, i32>,
    positions: HashMap<PlayerId, Vector3>,
    loadouts: HashMap<PlayerId, (Vec<Weapon>, i32)>,
}

impl DemoBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            tick: 0,
            round: 0,
            events: Vec::new(),
            health: HashMap::new(),
            positions: HashMap::new(),
            loadouts: HashMap::new(),
        };
        for id in 1..=10 {
            let handle = builder.handle(id);
            builder.push(DemoEvent::PlayerConnect(handle));
        }
        builder.push(DemoEvent::MatchStart);
        builder
    }

    pub fn header() -> DemoHeader {
        DemoHeader {
            map_name: "de_mirage".to_string(),
            server_name: "test".to_string(),
            game_mode: "competitive".to_string(),
            tick_rate: Some(TICK_RATE),
        }
    }

    pub fn demo_team(&self, id: PlayerId) -> DemoTeam {
        let swaps = (1..=self.round).filter(|round| is_side_swap_round(*round)).count();
        let starts_ct = id <= 5;
        if starts_ct == (swaps % 2 == 0) {
            DemoTeam::CounterTerrorist
        } else {
            DemoTeam::Terrorist
        }
    }

    pub fn handle(&self, id: PlayerId) -> PlayerHandle {
        let health = self.health.get(&id).copied().unwrap_or(100);
        let (inventory, armor) = self
            .loadouts
            .get(&id)
            .cloned()
            .unwrap_or_else(|| (vec![Weapon::Ak47], 100));
        PlayerHandle {
            id,
            name: format!("player{}", id),
            team: self.demo_team(id),
            position: self.positions.get(&id).copied().unwrap_or_default(),
            health,
            armor,
            has_helmet: armor > 0,
            is_alive: health > 0,
            active_weapon: inventory.first().copied(),
            inventory,
            movement: MovementFlags {
                on_ground: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn push(&mut self, event: DemoEvent) -> &mut Self {
        self.events.push(TimedEvent::new(self.tick, event));
        self
    }

    pub fn at(&mut self, tick: Tick) -> &mut Self {
        self.tick = tick;
        self
    }

    pub fn move_to(&mut self, id: PlayerId, position: Vector3) -> &mut Self {
        self.positions.insert(id, position);
        self
    }

    pub fn loadout(&mut self, id: PlayerId, inventory: Vec<Weapon>, armor: i32) -> &mut Self {
        self.loadouts.insert(id, (inventory, armor));
        self
    }

    /// Round start and freeze end on the current tick.
    pub fn start_round(&mut self) -> &mut Self {
        self.round += 1;
        self.health.clear();
        self.push(DemoEvent::RoundStart);
        self.push(DemoEvent::RoundFreezeEnd)
    }

    pub fn end_round(&mut self, winner: Side) -> &mut Self {
        let reason = match winner {
            Side::CT => RoundEndReason::CTWin,
            Side::T => RoundEndReason::TerroristsWin,
        };
        self.push(DemoEvent::RoundEnd(RoundEndEvent {
            winner: Some(winner),
            reason,
        }))
    }

    /// Plays `count` uneventful rounds, each 1000 ticks long, won by `winner`.
    pub fn quiet_rounds(&mut self, count: u32, winner: Side) -> &mut Self {
        for _ in 0..count {
            let start = self.tick;
            self.start_round();
            self.at(start + 900).end_round(winner);
            self.at(start + 1000);
        }
        self
    }

    pub fn kill(&mut self, killer: PlayerId, victim: PlayerId) -> &mut Self {
        let weapon = self.handle(killer).active_weapon.unwrap_or(Weapon::Ak47);
        self.kill_with(killer, victim, weapon)
    }

    pub fn kill_with(&mut self, killer: PlayerId, victim: PlayerId, weapon: Weapon) -> &mut Self {
        self.health.insert(victim, 0);
        let event = KillEvent {
            killer: Some(self.handle(killer)),
            victim: Some(self.handle(victim)),
            assister: None,
            weapon: Some(weapon),
            is_headshot: false,
            penetrated_objects: 0,
            assisted_flash: false,
        };
        self.push(DemoEvent::Kill(event))
    }

    /// A death with no attacker, such as fall damage or the bomb.
    pub fn world_kill(&mut self, victim: PlayerId) -> &mut Self {
        self.health.insert(victim, 0);
        let event = KillEvent {
            killer: None,
            victim: Some(self.handle(victim)),
            assister: None,
            weapon: Some(Weapon::World),
            is_headshot: false,
            penetrated_objects: 0,
            assisted_flash: false,
        };
        self.push(DemoEvent::Kill(event))
    }

    pub fn disconnect(&mut self, id: PlayerId) -> &mut Self {
        let handle = self.handle(id);
        self.push(DemoEvent::PlayerDisconnect(handle))
    }

    pub fn hurt(
        &mut self,
        attacker: PlayerId,
        victim: PlayerId,
        damage: i32,
        weapon: Weapon,
    ) -> &mut Self {
        let health = (self.health.get(&victim).copied().unwrap_or(100) - damage).max(0);
        self.health.insert(victim, health);
        let event = PlayerHurtEvent {
            attacker: Some(self.handle(attacker)),
            player: Some(self.handle(victim)),
            weapon: Some(weapon),
            health_damage: damage,
            armor_damage: 0,
            hit_group: None,
        };
        self.push(DemoEvent::PlayerHurt(event))
    }

    pub fn fire(&mut self, shooter: PlayerId, weapon: Weapon) -> &mut Self {
        let event = WeaponFireEvent {
            shooter: Some(self.handle(shooter)),
            weapon: Some(weapon),
        };
        self.push(DemoEvent::WeaponFire(event))
    }

    fn projectile(
        &self,
        entity_id: EntityId,
        weapon: Weapon,
        thrower: PlayerId,
        position: Vector3,
    ) -> ProjectileEvent {
        ProjectileEvent {
            entity_id,
            weapon,
            thrower: Some(self.handle(thrower)),
            position,
        }
    }

    /// Weapon fire followed by the projectile spawn, both on the current tick.
    pub fn throw(&mut self, thrower: PlayerId, entity_id: EntityId, weapon: Weapon) -> &mut Self {
        let position = self.handle(thrower).position;
        self.fire(thrower, weapon);
        let projectile = self.projectile(entity_id, weapon, thrower, position);
        self.push(DemoEvent::GrenadeProjectileThrow(projectile))
    }

    pub fn detonate(
        &mut self,
        thrower: PlayerId,
        entity_id: EntityId,
        weapon: Weapon,
        position: Vector3,
    ) -> &mut Self {
        let projectile = self.projectile(entity_id, weapon, thrower, position);
        self.push(DemoEvent::GrenadeProjectileDestroy(projectile))
    }

    pub fn flash_explode(
        &mut self,
        thrower: PlayerId,
        entity_id: EntityId,
        position: Vector3,
    ) -> &mut Self {
        let projectile = self.projectile(entity_id, Weapon::Flashbang, thrower, position);
        self.push(DemoEvent::FlashExplode(projectile))
    }

    pub fn flashed(&mut self, victim: PlayerId, thrower: PlayerId, duration: f32) -> &mut Self {
        let event = PlayerFlashedEvent {
            player: Some(self.handle(victim)),
            attacker: Some(self.handle(thrower)),
            flash_duration: duration,
        };
        self.push(DemoEvent::PlayerFlashed(event))
    }

    pub fn events(&self) -> Vec<TimedEvent> {
        self.events.clone()
    }

    pub fn process(&self) -> MatchResult {
        self.process_with(ProcessorConfig::default())
    }

    pub fn process_with(&self, config: ProcessorConfig) -> MatchResult {
        MatchProcessor::new(Self::header(), config)
            .unwrap()
            .process(self.events())
            .unwrap()
    }
}

pub fn player_round(result: &MatchResult, round: u32, player_id: PlayerId) -> &PlayerRoundEvent {
    result
        .player_rounds
        .iter()
        .find(|record| record.round_number == round && record.player_id == player_id)
        .unwrap()
}

pub fn player_match(result: &MatchResult, player_id: PlayerId) -> &PlayerMatchEvent {
    result
        .player_matches
        .iter()
        .find(|record| record.player_id == player_id)
        .unwrap()
}
