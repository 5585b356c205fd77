use crate::aggregator::{finalize_match, finalize_round};
use crate::constants::*;
use crate::correlator::*;
use crate::*;
use std::collections::BTreeMap;

/// Drives one match: owns the [`MatchState`], routes every decoder event to
/// its correlator, runs round finalization at round boundaries and match
/// finalization at the end.
///
/// Events are processed strictly in order on the calling thread. Handler
/// failures that are not fatal are logged and the event is skipped; fatal
/// failures stop processing and are returned to the caller.
pub struct MatchProcessor {
    config: ProcessorConfig,
    state: MatchState,
    progress: Option<ProgressTracker>,
}

impl MatchProcessor {
    pub fn new(header: DemoHeader, config: ProcessorConfig) -> FragActorResult<Self> {
        config.validate()?;
        if let Some(rate) = header.tick_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return FragActorError::new_result(FragActorErrorVariant::InvalidHeader {
                    reason: format!("tick rate {} is not positive", rate),
                });
            }
        }
        log::info!(
            "Processing {} on {:?} ({:?})",
            header.map_name,
            MapType::classify(&header.map_name),
            GameMode::classify(&header.game_mode)
        );
        let state = MatchState::new(header, &config);
        Ok(Self {
            config,
            state,
            progress: None,
        })
    }

    pub fn with_progress<R: ProgressReporter + 'static>(mut self, reporter: R) -> Self {
        self.progress = Some(ProgressTracker::new(Box::new(reporter)));
        self
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn assigned_team_for_player(&self, player_id: &PlayerId) -> Option<TeamLabel> {
        self.state.team_for_player(player_id)
    }

    pub fn current_side_for_player(&self, player_id: &PlayerId) -> Option<Side> {
        self.state.current_side_for_player(player_id)
    }

    pub fn current_round_time(&self) -> f64 {
        self.state.current_round_time(self.state.current_tick)
    }

    /// Processes a whole event stream and finalizes the match.
    pub fn process<I>(mut self, events: I) -> FragActorResult<MatchResult>
    where
        I: IntoIterator<Item = TimedEvent>,
    {
        self.report(ProcessingStatus::Started, 0, BTreeMap::new())?;
        for event in events {
            self.process_event(&event)?;
        }
        self.finalize()
    }

    pub fn process_event(&mut self, timed: &TimedEvent) -> FragActorResult<()> {
        if self.state.finalized {
            return FragActorError::new_result(FragActorErrorVariant::MatchAlreadyFinalized);
        }
        if timed.tick < self.state.current_tick {
            log::debug!(
                "{} at tick {} arrived after tick {}",
                timed.event.name(),
                timed.tick,
                self.state.current_tick
            );
        }
        self.state.current_tick = self.state.current_tick.max(timed.tick);

        let result = self.dispatch(timed);
        for handle in timed.event.handles() {
            self.state.movement.observe(handle, timed.tick);
        }
        match result {
            Ok(()) => Ok(()),
            Err(error) if !error.is_fatal() => {
                match error.severity() {
                    ErrorSeverity::Info => log::info!(
                        "Skipping {} at tick {}: {}",
                        timed.event.name(),
                        timed.tick,
                        error
                    ),
                    _ => log::warn!(
                        "Skipping {} at tick {}: {}",
                        timed.event.name(),
                        timed.tick,
                        error
                    ),
                }
                Ok(())
            }
            Err(error) => {
                log::error!("Fatal error at tick {}: {}", timed.tick, error);
                if let Some(progress) = self.progress.as_mut() {
                    progress.fail(&error);
                }
                Err(error)
            }
        }
    }

    fn dispatch(&mut self, timed: &TimedEvent) -> FragActorResult<()> {
        let tick = timed.tick;
        let config = &self.config;
        let state = &mut self.state;
        match &timed.event {
            DemoEvent::MatchStart => {
                self.handle_match_start();
                Ok(())
            }
            DemoEvent::RoundStart => self.handle_round_start(tick),
            DemoEvent::RoundFreezeEnd => {
                self.handle_freeze_end(tick);
                Ok(())
            }
            DemoEvent::RoundEnd(end) => self.handle_round_end(end, tick),
            DemoEvent::Kill(kill) => record_kill(state, config, kill, tick),
            DemoEvent::PlayerHurt(hurt) => record_damage(state, hurt, tick),
            DemoEvent::WeaponFire(fire) => record_weapon_fire(state, fire, tick),
            DemoEvent::GrenadeProjectileThrow(projectile) => {
                record_projectile_throw(state, projectile, tick)
            }
            DemoEvent::GrenadeProjectileDestroy(projectile) | DemoEvent::SmokeStart(projectile) => {
                record_projectile_detonation(state, projectile, tick)
            }
            DemoEvent::FlashExplode(projectile) => {
                record_flash_explode(state, config, projectile, tick)
            }
            DemoEvent::PlayerFlashed(flashed) => {
                record_player_flashed(state, config, flashed, tick)
            }
            DemoEvent::BombPlanted(bomb) => {
                record_bomb_event(state, RoundEventType::BombPlanted, bomb, tick)
            }
            DemoEvent::BombDefused(bomb) => {
                record_bomb_event(state, RoundEventType::BombDefused, bomb, tick)
            }
            DemoEvent::BombExploded(bomb) => {
                record_bomb_event(state, RoundEventType::BombExploded, bomb, tick)
            }
            DemoEvent::PlayerConnect(handle) => {
                state.observe_player(handle);
                Ok(())
            }
            DemoEvent::PlayerDisconnect(handle) => record_disconnect(state, handle, tick),
            DemoEvent::PlayerTeamChange(change) => {
                let player = require_actor(&change.player, "player_team_change", "player")?;
                state.observe_player(&PlayerHandle {
                    team: change.new_team,
                    ..player.clone()
                });
                Ok(())
            }
        }
    }

    fn handle_match_start(&mut self) {
        let state = &mut self.state;
        if state.round.number == 0 && state.gunfights.is_empty() {
            return;
        }
        log::info!(
            "Match restarted after {} rounds, discarding warmup data",
            state.round.number
        );
        state.round = RoundTracker::default();
        state.rounds.clear();
        state.gunfights.clear();
        state.damages.clear();
        state.grenades.clear();
        state.player_rounds.clear();
        state.shots_fired.clear();
        state.tables.clear_round();
        state.teams.reset_score();
        for player in state.players.values_mut() {
            player.kills = 0;
            player.deaths = 0;
            player.headshots = 0;
            player.wallbangs = 0;
        }
    }

    fn handle_round_start(&mut self, tick: Tick) -> FragActorResult<()> {
        if self.state.round.is_open() {
            if self.state.round.phase == RoundPhase::Live {
                log::warn!(
                    "Round {} never ended, finalizing it at the next round start",
                    self.state.round.number
                );
            }
            finalize_round(&mut self.state, &self.config);
        }
        if self.state.teams.apply_pending_swap() {
            log::info!(
                "Sides swapped, team A now plays {:?}",
                self.state.teams.side_of(TeamLabel::A)
            );
        }
        self.state.begin_round(tick);
        log::debug!("Round {} started at tick {}", self.state.round.number, tick);
        let event = round_event(&self.state, RoundEventType::Start, tick);
        self.state.rounds.push(event);
        Ok(())
    }

    fn handle_freeze_end(&mut self, tick: Tick) {
        if self.state.round.phase != RoundPhase::Live {
            return;
        }
        self.state.round.freeze_end_tick = Some(tick);
        let event = round_event(&self.state, RoundEventType::FreezeEnd, tick);
        self.state.rounds.push(event);
    }

    fn handle_round_end(&mut self, end: &RoundEndEvent, tick: Tick) -> FragActorResult<()> {
        if self.state.round.phase != RoundPhase::Live {
            return FragActorError::new_result(FragActorErrorVariant::NoRoundInProgress {
                event: "round_end",
            });
        }
        let state = &mut self.state;
        let winner_team = end.winner.map(|side| state.teams.record_win(side));
        state.round.phase = RoundPhase::Ended;
        let mut event = round_event(state, RoundEventType::End, tick);
        event.winner_side = end.winner;
        event.winner_team = winner_team;
        event.end_reason = Some(end.reason);
        let round = state.round.number;
        state.rounds.push(event);
        if is_side_swap_round(round + 1) {
            state.teams.schedule_swap();
        }
        log::info!(
            "Round {} won by {:?} ({:?}), score {}-{}",
            round,
            winner_team,
            end.reason,
            state.teams.wins(TeamLabel::A),
            state.teams.wins(TeamLabel::B)
        );

        let mut context = BTreeMap::new();
        context.insert("round".to_string(), round.to_string());
        context.insert(
            "score".to_string(),
            format!(
                "{}-{}",
                state.teams.wins(TeamLabel::A),
                state.teams.wins(TeamLabel::B)
            ),
        );
        let expected = round.max(REGULATION_ROUNDS);
        let percent = (round as u64 * 100 / expected as u64).min(99) as u8;
        self.report(ProcessingStatus::Processing, percent, context)
    }

    fn report(
        &mut self,
        status: ProcessingStatus,
        progress: u8,
        context: BTreeMap<String, String>,
    ) -> FragActorResult<()> {
        let step = self.state.round.number;
        let total_steps = step.max(REGULATION_ROUNDS);
        match self.progress.as_mut() {
            Some(tracker) => tracker.update(ProgressUpdate {
                status,
                progress,
                step,
                total_steps,
                context,
            }),
            None => Ok(()),
        }
    }

    /// Finalizes the open round and the match, producing every record.
    /// A processor can be finalized once; later calls and events fail with
    /// [`FragActorErrorVariant::MatchAlreadyFinalized`].
    pub fn finalize(&mut self) -> FragActorResult<MatchResult> {
        if self.state.finalized {
            return FragActorError::new_result(FragActorErrorVariant::MatchAlreadyFinalized);
        }
        self.report(ProcessingStatus::Finalizing, 99, BTreeMap::new())?;
        if self.state.round.is_open() {
            finalize_round(&mut self.state, &self.config);
        }
        finalize_match(&mut self.state);
        self.state.finalized = true;

        let result = build_match_result(&self.state);
        let mut context = BTreeMap::new();
        context.insert(
            "rounds".to_string(),
            result.match_record.rounds_played.to_string(),
        );
        context.insert("gunfights".to_string(), result.gunfights.len().to_string());
        self.report(ProcessingStatus::Completed, 100, context)?;
        log::info!(
            "Finished {}: {} rounds, {} gunfights, {} grenades",
            result.match_record.map_name,
            result.match_record.rounds_played,
            result.gunfights.len(),
            result.grenades.len()
        );
        Ok(result)
    }
}

fn round_event(state: &MatchState, event_type: RoundEventType, tick: Tick) -> RoundEvent {
    RoundEvent {
        round_number: state.round.number,
        event_type,
        tick,
        round_time: state.current_round_time(tick),
        player_id: None,
        site: None,
        winner_side: None,
        winner_team: None,
        end_reason: None,
        team_a_side: state.teams.side_of(TeamLabel::A),
        team_a_score: state.teams.wins(TeamLabel::A),
        team_b_score: state.teams.wins(TeamLabel::B),
    }
}

fn record_weapon_fire(
    state: &mut MatchState,
    fire: &WeaponFireEvent,
    tick: Tick,
) -> FragActorResult<()> {
    if !state.round.is_open() {
        return FragActorError::new_result(FragActorErrorVariant::NoRoundInProgress {
            event: "weapon_fire",
        });
    }
    let shooter = require_actor(&fire.shooter, "weapon_fire", "shooter")?;
    let weapon = *require_actor(&fire.weapon, "weapon_fire", "weapon")?;
    if let Some(grenade) = weapon.grenade_kind() {
        record_grenade_fire(state, shooter, grenade, tick);
    } else if weapon.is_firearm() {
        *state
            .shots_fired
            .entry((state.round.number, shooter.id))
            .or_default() += 1;
    }
    state.observe_player(shooter);
    Ok(())
}

/// A player who leaves while alive in a live round is out of it from this
/// tick on. They stay registered and keep their earlier records.
fn record_disconnect(
    state: &mut MatchState,
    handle: &PlayerHandle,
    tick: Tick,
) -> FragActorResult<()> {
    let Some(player) = state.players.get_mut(&handle.id) else {
        return FragActorError::new_result(FragActorErrorVariant::UnregisteredPlayer {
            player_id: handle.id,
        });
    };
    player.connected = false;
    let in_play = state.round.phase == RoundPhase::Live
        && state.round.roster.contains_key(&handle.id)
        && state
            .player_states
            .get(&handle.id)
            .map_or(false, |player_state| player_state.is_alive);
    if in_play {
        log::debug!(
            "Player {} disconnected alive in round {}",
            handle.id,
            state.round.number
        );
        state.record_exit(handle.id, ExitCause::Disconnect, tick);
    } else if let Some(player_state) = state.player_states.get_mut(&handle.id) {
        player_state.is_alive = false;
    }
    Ok(())
}

fn record_bomb_event(
    state: &mut MatchState,
    event_type: RoundEventType,
    bomb: &BombEvent,
    tick: Tick,
) -> FragActorResult<()> {
    if !state.round.is_open() {
        return FragActorError::new_result(FragActorErrorVariant::NoRoundInProgress {
            event: "bomb",
        });
    }
    if let Some(player) = bomb.player.as_ref() {
        state.observe_player(player);
    }
    let mut event = round_event(state, event_type, tick);
    event.player_id = bomb.player.as_ref().map(|player| player.id);
    event.site = bomb.site.clone();
    state.rounds.push(event);
    Ok(())
}

fn build_match_result(state: &MatchState) -> MatchResult {
    let team_a_score = state.teams.wins(TeamLabel::A);
    let team_b_score = state.teams.wins(TeamLabel::B);
    let winner = match team_a_score.cmp(&team_b_score) {
        std::cmp::Ordering::Greater => Some(TeamLabel::A),
        std::cmp::Ordering::Less => Some(TeamLabel::B),
        std::cmp::Ordering::Equal => None,
    };
    MatchResult {
        match_record: MatchRecord {
            map_name: state.header.map_name.clone(),
            server_name: state.header.server_name.clone(),
            game_mode: GameMode::classify(&state.header.game_mode),
            map_type: MapType::classify(&state.header.map_name),
            tick_rate: state.tick_rate,
            rounds_played: state.round.number,
            team_a_score,
            team_b_score,
            winner,
        },
        players: state
            .players
            .values()
            .map(|player| PlayerRecord {
                player_id: player.id,
                name: player.name.clone(),
                team: state.team_for_player(&player.id),
                connected: player.connected,
            })
            .collect(),
        rounds: state.rounds.clone(),
        gunfights: state.gunfights.clone(),
        damages: state.damages.clone(),
        grenades: state.grenades.clone(),
        player_rounds: state.player_rounds.clone(),
        player_matches: state.player_matches.clone(),
    }
}
