//! Lucky draw engine
//!
//! Picks unique winners from a participant pool, one spin at a time.
//!
//! # Session lifecycle
//!
//! ```text
//! Idle -> Ready -> Drawing -> (AwaitingAck -> Drawing)* -> Complete -> Idle
//!          ^ start_session       ^ draw_next / tick settles      ^ new_game
//! ```
//!
//! `draw_next` samples the winner up front and commits it to the winner
//! list immediately, so a participant can never be drawn twice even if the
//! host drops frames. The reel animation is then advanced by `tick(now)`;
//! the winner is announced once the reel has settled. While a spin is in
//! flight further draws are ignored (`DrawOutcome::Busy`), never queued.

mod animation;
mod error;
mod participants;
mod reel;

pub use animation::{
    crossing_intensity, ease_out, Crossing, FrameUpdate, ReelAnimation, CROSSING_BASE_INTERVAL,
    CROSSING_CUTOFF,
};
pub use error::DrawError;
pub use participants::{load_participants, parse_participants};
pub use reel::{build_reel, filler_strip, finish_reel, Reel, ReelEntry, ReelLayout};

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::DrawConfig;
use crate::events::EventBus;
use crate::types::{clamp_volume, Participant};

/// Settings fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Number of winners to draw
    pub lucky_count: usize,
    /// Length of each reel spin
    pub spin_duration: Duration,
}

/// Where the engine is in the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPhase {
    /// No session configured
    Idle,
    /// Session configured, waiting for a draw
    Ready,
    /// Reel spinning
    Drawing,
    /// Winner announced, waiting for the host to dismiss it
    AwaitingAck,
    /// All winners drawn
    Complete,
}

/// Immediate result of a draw request
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// A winner was chosen and the reel started spinning towards it
    Spinning {
        winner: Participant,
        winner_index: usize,
    },
    /// A spin is already in flight; the request was ignored
    Busy,
    /// No further winners can be drawn in this session
    SessionComplete,
}

/// Notifications emitted by the draw engine
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// A fresh idle reel is ready to be displayed
    ReelRegenerated { len: usize },
    /// A spin started with this reel
    SpinStarted { reel_len: usize, winner_index: usize },
    /// The reel scrolled to a new offset
    ReelMoved { offset: f32, progress: f32 },
    /// The reel moved into a new entry (tick sound cue)
    Crossing {
        entry_index: usize,
        intensity: f32,
        /// Suggested cue volume, `sfx_volume * intensity`
        volume: f32,
    },
    /// The reel has settled on the winner
    WinnerAnnounced {
        participant: Participant,
        /// 1-based position in the winner list
        ordinal: usize,
    },
    /// Every winner of the session has been announced
    SessionComplete { winners: usize },
}

struct Spin {
    reel: Reel,
    animation: ReelAnimation,
    winner: Participant,
}

/// Lucky draw session state machine
pub struct DrawEngine<R: Rng> {
    rng: R,
    layout: ReelLayout,
    settle: Duration,
    completion_delay: Duration,
    sfx_volume: f32,
    participants: Vec<Participant>,
    winners: Vec<Participant>,
    session: Option<SessionConfig>,
    phase: DrawPhase,
    idle_strip: Vec<ReelEntry>,
    spin: Option<Spin>,
    completion_due: Option<Instant>,
    events: EventBus<DrawEvent>,
}

impl<R: Rng> DrawEngine<R> {
    pub fn new(config: &DrawConfig, rng: R) -> Self {
        Self {
            rng,
            layout: config.reel,
            settle: config.settle(),
            completion_delay: config.completion_delay(),
            sfx_volume: clamp_volume(config.sfx_volume),
            participants: Vec::new(),
            winners: Vec::new(),
            session: None,
            phase: DrawPhase::Idle,
            idle_strip: Vec::new(),
            spin: None,
            completion_due: None,
            events: EventBus::new(),
        }
    }

    /// Subscribe to draw notifications
    pub fn subscribe(&mut self) -> Receiver<DrawEvent> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────
    // Session control
    // ─────────────────────────────────────────────────────────────

    /// Configure a new session
    ///
    /// Validates before touching any state; on success prior winners are
    /// cleared and the engine is ready to draw.
    pub fn start_session(
        &mut self,
        participants: Vec<Participant>,
        lucky_count: usize,
        spin_duration: Duration,
    ) -> Result<(), DrawError> {
        if lucky_count == 0 {
            return Err(DrawError::InvalidLuckyCount);
        }
        if spin_duration.is_zero() {
            return Err(DrawError::InvalidSpinDuration);
        }
        let participants = participants::dedupe_by_id(participants);
        participants::validate_pool(&participants, lucky_count)?;

        log::info!(
            "start_session: {} participants, {} winners, {:?} spin",
            participants.len(),
            lucky_count,
            spin_duration
        );
        self.participants = participants;
        self.session = Some(SessionConfig {
            lucky_count,
            spin_duration,
        });
        self.reset_session();
        Ok(())
    }

    /// Parse `raw` participant text and start a session with it
    pub fn start_from_text(
        &mut self,
        raw: &str,
        lucky_count: usize,
        spin_duration: Duration,
    ) -> Result<(), DrawError> {
        let participants = load_participants(raw, lucky_count)?;
        self.start_session(participants, lucky_count, spin_duration)
    }

    /// Clear winners and any spin in flight, keeping participants and config
    pub fn reset_session(&mut self) {
        self.winners.clear();
        self.spin = None;
        self.completion_due = None;
        self.phase = if self.session.is_some() {
            DrawPhase::Ready
        } else {
            DrawPhase::Idle
        };
        if self.session.is_some() {
            self.regenerate_strip();
        } else {
            self.idle_strip.clear();
        }
        log::debug!("reset_session: phase {:?}", self.phase);
    }

    /// Abandon the session and return to `Idle`
    pub fn new_game(&mut self) {
        self.session = None;
        self.reset_session();
    }

    /// Dismiss the current winner announcement
    pub fn acknowledge(&mut self) {
        if self.phase == DrawPhase::AwaitingAck {
            self.phase = DrawPhase::Ready;
        }
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = clamp_volume(volume);
    }

    // ─────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────

    /// Draw the next winner and start the reel spinning towards it
    pub fn draw_next(&mut self, now: Instant) -> Result<DrawOutcome, DrawError> {
        let Some(session) = self.session else {
            return Err(DrawError::NotConfigured);
        };

        match self.phase {
            DrawPhase::Idle => return Err(DrawError::NotConfigured),
            DrawPhase::Drawing => {
                log::debug!("draw_next: Spin in flight, ignoring request");
                return Ok(DrawOutcome::Busy);
            }
            DrawPhase::Complete => return Ok(DrawOutcome::SessionComplete),
            DrawPhase::AwaitingAck => self.phase = DrawPhase::Ready,
            DrawPhase::Ready => {}
        }

        if self.winners.len() >= session.lucky_count {
            self.phase = DrawPhase::Complete;
            return Ok(DrawOutcome::SessionComplete);
        }

        let pool = self.unused_pool();
        let Some(winner) = pool.choose(&mut self.rng).cloned() else {
            log::info!("draw_next: Participant pool exhausted");
            self.phase = DrawPhase::Complete;
            return Ok(DrawOutcome::SessionComplete);
        };

        let strip = if self.idle_strip.is_empty() {
            filler_strip(&pool, &self.layout, &mut self.rng)
        } else {
            std::mem::take(&mut self.idle_strip)
        };
        let reel = finish_reel(strip, &winner, &pool, &self.layout, &mut self.rng);
        let winner_index = reel.winner_index;
        let animation =
            ReelAnimation::for_reel(&reel, &self.layout, now, session.spin_duration, self.settle);

        self.winners.push(winner.clone());
        self.events.emit(DrawEvent::SpinStarted {
            reel_len: reel.len(),
            winner_index,
        });
        self.spin = Some(Spin {
            reel,
            animation,
            winner: winner.clone(),
        });
        self.phase = DrawPhase::Drawing;

        log::info!(
            "draw_next: Spinning towards {} (winner {} of {})",
            winner,
            self.winners.len(),
            session.lucky_count
        );
        Ok(DrawOutcome::Spinning {
            winner,
            winner_index,
        })
    }

    /// Advance the spin in flight and any pending completion notice
    pub fn tick(&mut self, now: Instant) {
        let mut settled = false;
        if let Some(spin) = self.spin.as_mut() {
            let frame = spin.animation.advance(now);
            self.events.emit(DrawEvent::ReelMoved {
                offset: frame.offset,
                progress: frame.progress,
            });
            if let Some(crossing) = frame.crossing {
                self.events.emit(DrawEvent::Crossing {
                    entry_index: crossing.entry_index,
                    intensity: crossing.intensity,
                    volume: self.sfx_volume * crossing.intensity,
                });
            }
            settled = frame.settled;
        }

        if settled {
            if let Some(spin) = self.spin.take() {
                self.announce(spin, now);
            }
        }

        if let Some(due) = self.completion_due {
            if now >= due {
                self.completion_due = None;
                self.events.emit(DrawEvent::SessionComplete {
                    winners: self.winners.len(),
                });
                log::info!("tick: Session complete with {} winners", self.winners.len());
            }
        }
    }

    fn announce(&mut self, spin: Spin, now: Instant) {
        let ordinal = self.winners.len();
        debug_assert_eq!(spin.reel.winner(), &spin.winner);
        log::info!("announce: Winner #{} is {}", ordinal, spin.winner);
        self.events.emit(DrawEvent::WinnerAnnounced {
            participant: spin.winner,
            ordinal,
        });

        let lucky_count = self.session.map_or(0, |s| s.lucky_count);
        if ordinal >= lucky_count {
            self.phase = DrawPhase::Complete;
            self.completion_due = Some(now + self.completion_delay);
            self.idle_strip.clear();
        } else {
            self.phase = DrawPhase::AwaitingAck;
            self.regenerate_strip();
        }
    }

    fn regenerate_strip(&mut self) {
        let pool = self.unused_pool();
        self.idle_strip = filler_strip(&pool, &self.layout, &mut self.rng);
        self.events.emit(DrawEvent::ReelRegenerated {
            len: self.idle_strip.len(),
        });
    }

    // ─────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────

    pub fn phase(&self) -> DrawPhase {
        self.phase
    }

    pub fn session(&self) -> Option<SessionConfig> {
        self.session
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Winners in draw order, including one whose spin is still in flight
    pub fn winners(&self) -> &[Participant] {
        &self.winners
    }

    /// Participants not yet drawn in this session
    pub fn unused_pool(&self) -> Vec<Participant> {
        let drawn: HashSet<&str> = self.winners.iter().map(|w| w.id.as_str()).collect();
        self.participants
            .iter()
            .filter(|p| !drawn.contains(p.id.as_str()))
            .cloned()
            .collect()
    }

    /// `(winners drawn, winners requested)`
    pub fn progress(&self) -> (usize, usize) {
        (
            self.winners.len(),
            self.session.map_or(0, |s| s.lucky_count),
        )
    }

    /// Reel displayed between spins
    pub fn idle_reel(&self) -> &[ReelEntry] {
        &self.idle_strip
    }

    /// Reel of the spin in flight
    pub fn current_reel(&self) -> Option<&Reel> {
        self.spin.as_ref().map(|s| &s.reel)
    }

    /// Current scroll offset of the spin in flight
    pub fn current_offset(&self) -> Option<f32> {
        self.spin.as_ref().map(|s| s.animation.offset())
    }

    pub fn layout(&self) -> &ReelLayout {
        &self.layout
    }

    pub fn sfx_volume(&self) -> f32 {
        self.sfx_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FRAME: Duration = Duration::from_millis(16);
    const SPIN: Duration = Duration::from_millis(1000);

    fn engine(seed: u64) -> DrawEngine<StdRng> {
        DrawEngine::new(&DrawConfig::default(), StdRng::seed_from_u64(seed))
    }

    /// Tick at frame rate until the spin settles, returning the time reached
    fn run_spin(engine: &mut DrawEngine<StdRng>, start: Instant) -> Instant {
        let mut t = start;
        while engine.phase() == DrawPhase::Drawing {
            t += FRAME;
            engine.tick(t);
        }
        t
    }

    #[test]
    fn test_scenario_two_of_three() {
        let mut engine = engine(42);
        engine
            .start_from_text("Alice\t001\nBob\t002\nCarol\t003", 2, SPIN)
            .unwrap();
        assert_eq!(engine.participants().len(), 3);

        let t0 = Instant::now();
        let first = match engine.draw_next(t0).unwrap() {
            DrawOutcome::Spinning { winner, .. } => winner,
            other => panic!("expected a spin, got {:?}", other),
        };
        let t1 = run_spin(&mut engine, t0);

        let second = match engine.draw_next(t1).unwrap() {
            DrawOutcome::Spinning { winner, .. } => winner,
            other => panic!("expected a spin, got {:?}", other),
        };
        let t2 = run_spin(&mut engine, t1);

        assert_ne!(first.id, second.id);
        assert!(engine.participants().contains(&first));
        assert!(engine.participants().contains(&second));
        assert_eq!(engine.draw_next(t2).unwrap(), DrawOutcome::SessionComplete);
        assert_eq!(engine.phase(), DrawPhase::Complete);
    }

    #[test]
    fn test_winners_are_unique_and_bounded() {
        for seed in 0..25 {
            let mut engine = engine(seed);
            let raw: String = (0..8).map(|i| format!("P{}\t{:03}\n", i, i)).collect();
            engine.start_from_text(&raw, 8, SPIN).unwrap();

            let mut t = Instant::now();
            for _ in 0..12 {
                let before: Vec<_> = engine.winners().to_vec();
                if let DrawOutcome::Spinning { winner, .. } = engine.draw_next(t).unwrap() {
                    assert!(!before.iter().any(|w| w.id == winner.id));
                }
                t = run_spin(&mut engine, t);
            }

            let winners = engine.winners();
            assert!(winners.len() <= 8);
            let ids: HashSet<_> = winners.iter().map(|w| &w.id).collect();
            assert_eq!(ids.len(), winners.len());
        }
    }

    #[test]
    fn test_draw_while_spinning_is_ignored() {
        let mut engine = engine(1);
        engine
            .start_from_text("Alice\t001\nBob\t002\nCarol\t003", 3, SPIN)
            .unwrap();
        let t0 = Instant::now();

        assert!(matches!(engine.draw_next(t0).unwrap(), DrawOutcome::Spinning { .. }));
        assert_eq!(engine.draw_next(t0 + FRAME).unwrap(), DrawOutcome::Busy);
        assert_eq!(engine.winners().len(), 1);
    }

    #[test]
    fn test_winner_announced_only_after_settle() {
        let mut engine = engine(9);
        let events = engine.subscribe();
        engine
            .start_from_text("Alice\t001\nBob\t002\nCarol\t003", 3, SPIN)
            .unwrap();
        let t0 = Instant::now();
        let winner = match engine.draw_next(t0).unwrap() {
            DrawOutcome::Spinning { winner, .. } => winner,
            other => panic!("unexpected {:?}", other),
        };

        engine.tick(t0 + SPIN);
        assert_eq!(engine.phase(), DrawPhase::Drawing);
        assert!(!events
            .try_iter()
            .any(|e| matches!(e, DrawEvent::WinnerAnnounced { .. })));

        engine.tick(t0 + SPIN + Duration::from_millis(800));
        assert_eq!(engine.phase(), DrawPhase::AwaitingAck);
        let announced: Vec<_> = events
            .try_iter()
            .filter_map(|e| match e {
                DrawEvent::WinnerAnnounced { participant, ordinal } => Some((participant, ordinal)),
                _ => None,
            })
            .collect();
        assert_eq!(announced, vec![(winner, 1)]);
    }

    #[test]
    fn test_spin_reel_ends_on_winner() {
        let mut engine = engine(5);
        let raw: String = (0..20).map(|i| format!("P{}\t{:03}\n", i, i)).collect();
        engine.start_from_text(&raw, 5, SPIN).unwrap();

        let outcome = engine.draw_next(Instant::now()).unwrap();
        let DrawOutcome::Spinning { winner, winner_index } = outcome else {
            panic!("expected a spin");
        };
        let reel = engine.current_reel().unwrap();
        assert_eq!(reel.winner_index, winner_index);
        assert_eq!(reel.entries[winner_index].participant, winner);
        assert_eq!(winner_index, engine.layout().filler_len);
    }

    #[test]
    fn test_idle_reel_excludes_previous_winners() {
        let mut engine = engine(11);
        engine
            .start_from_text("Alice\t001\nBob\t002\nCarol\t003", 3, SPIN)
            .unwrap();
        let t0 = Instant::now();
        let DrawOutcome::Spinning { winner, .. } = engine.draw_next(t0).unwrap() else {
            panic!("expected a spin");
        };
        run_spin(&mut engine, t0);

        assert_eq!(engine.idle_reel().len(), 100);
        assert!(engine.idle_reel().iter().all(|e| e.participant.id != winner.id));
    }

    #[test]
    fn test_completion_notice_is_delayed() {
        let mut engine = engine(3);
        let events = engine.subscribe();
        engine.start_from_text("Alice\t001\nBob\t002", 1, SPIN).unwrap();
        let t0 = Instant::now();
        engine.draw_next(t0).unwrap();
        let settled_at = run_spin(&mut engine, t0);
        assert_eq!(engine.phase(), DrawPhase::Complete);

        let completed = |events: &Receiver<DrawEvent>| {
            events
                .try_iter()
                .any(|e| matches!(e, DrawEvent::SessionComplete { winners: 1 }))
        };
        assert!(!completed(&events));

        engine.tick(settled_at + Duration::from_millis(2000));
        assert!(completed(&events));
    }

    #[test]
    fn test_crossing_volume_follows_sfx_volume() {
        let mut engine = engine(8);
        let events = engine.subscribe();
        engine.set_sfx_volume(0.5);
        let raw: String = (0..10).map(|i| format!("P{}\t{:03}\n", i, i)).collect();
        engine.start_from_text(&raw, 1, SPIN).unwrap();
        let t0 = Instant::now();
        engine.draw_next(t0).unwrap();
        run_spin(&mut engine, t0);

        let crossings: Vec<_> = events
            .try_iter()
            .filter_map(|e| match e {
                DrawEvent::Crossing { intensity, volume, .. } => Some((intensity, volume)),
                _ => None,
            })
            .collect();
        assert!(!crossings.is_empty());
        for (intensity, volume) in crossings {
            assert!((volume - 0.5 * intensity).abs() < 1e-6);
        }
    }

    #[test]
    fn test_start_session_validation_keeps_state() {
        let mut engine = engine(2);
        engine
            .start_from_text("Alice\t001\nBob\t002", 1, SPIN)
            .unwrap();
        engine.draw_next(Instant::now()).unwrap();

        let err = engine.start_from_text("Carol\t003", 2, SPIN).unwrap_err();
        assert_eq!(
            err,
            DrawError::NotEnoughParticipants {
                available: 1,
                required: 2
            }
        );
        assert_eq!(engine.participants().len(), 2);
        assert_eq!(engine.winners().len(), 1);

        assert_eq!(
            engine.start_session(vec![Participant::new("A", "1")], 0, SPIN),
            Err(DrawError::InvalidLuckyCount)
        );
        assert_eq!(
            engine.start_session(vec![Participant::new("A", "1")], 1, Duration::ZERO),
            Err(DrawError::InvalidSpinDuration)
        );
    }

    #[test]
    fn test_reset_keeps_pool_and_new_game_returns_to_idle() {
        let mut engine = engine(4);
        engine
            .start_from_text("Alice\t001\nBob\t002\nCarol\t003", 2, SPIN)
            .unwrap();
        let t0 = Instant::now();
        engine.draw_next(t0).unwrap();
        run_spin(&mut engine, t0);

        engine.reset_session();
        assert!(engine.winners().is_empty());
        assert_eq!(engine.participants().len(), 3);
        assert_eq!(engine.phase(), DrawPhase::Ready);
        assert_eq!(engine.progress(), (0, 2));

        engine.new_game();
        assert_eq!(engine.phase(), DrawPhase::Idle);
        assert_eq!(engine.draw_next(t0), Err(DrawError::NotConfigured));
    }

    #[test]
    fn test_acknowledge_returns_to_ready() {
        let mut engine = engine(6);
        engine
            .start_from_text("Alice\t001\nBob\t002\nCarol\t003", 2, SPIN)
            .unwrap();
        let t0 = Instant::now();
        engine.draw_next(t0).unwrap();
        let t1 = run_spin(&mut engine, t0);
        assert_eq!(engine.phase(), DrawPhase::AwaitingAck);

        engine.acknowledge();
        assert_eq!(engine.phase(), DrawPhase::Ready);
        assert!(matches!(engine.draw_next(t1).unwrap(), DrawOutcome::Spinning { .. }));
    }
}
