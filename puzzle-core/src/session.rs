//! Player progress collaborator and the session tying one player to an engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::{Engine, LevelRequest, PointerUp};
use crate::error::Result;
use crate::models::Point;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    pub current_level: u32,
}

impl PlayerRecord {
    pub fn new(id: &str) -> Self {
        PlayerRecord {
            id: id.to_string(),
            current_level: 1,
        }
    }
}

/// Where player levels live. Storage and session bookkeeping belong to the
/// implementor; the engine only reports completed levels.
pub trait LevelProgress {
    /// Returns the player's record, creating it at level 1 if unknown.
    fn login(&mut self, player: &str) -> PlayerRecord;
    fn current_level(&self, player: &str) -> u32;
    fn advance_level(&mut self, player: &str);

    /// Called once per completed level. Ending the play session here, or
    /// not, is up to the implementor.
    fn on_level_complete(&mut self, player: &str) {
        self.advance_level(player);
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryProgress {
    players: HashMap<String, PlayerRecord>,
}

impl MemoryProgress {
    pub fn record(&self, player: &str) -> Option<&PlayerRecord> {
        self.players.get(player)
    }
}

impl LevelProgress for MemoryProgress {
    fn login(&mut self, player: &str) -> PlayerRecord {
        self.players
            .entry(player.to_string())
            .or_insert_with(|| PlayerRecord::new(player))
            .clone()
    }

    fn current_level(&self, player: &str) -> u32 {
        self.players.get(player).map_or(1, |r| r.current_level)
    }

    fn advance_level(&mut self, player: &str) {
        let rec = self
            .players
            .entry(player.to_string())
            .or_insert_with(|| PlayerRecord::new(player));
        rec.current_level += 1;
    }
}

/// One logged-in player playing levels on one engine.
pub struct GameSession<P: LevelProgress> {
    engine: Engine,
    progress: P,
    player: PlayerRecord,
}

impl<P: LevelProgress> GameSession<P> {
    pub fn login(engine: Engine, mut progress: P, player: &str) -> Self {
        let player = progress.login(player);
        log::info!("player {} at level {}", player.id, player.current_level);
        GameSession {
            engine,
            progress,
            player,
        }
    }

    pub fn player(&self) -> &PlayerRecord {
        &self.player
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Requests the player's current level from the store.
    pub fn start_level(&mut self) -> Result<LevelRequest> {
        let level = self.progress.current_level(&self.player.id);
        self.player.current_level = level;
        self.engine.begin_level(level)
    }

    /// Moves on after a completed level; the store has already advanced.
    pub fn next_level(&mut self) -> Result<LevelRequest> {
        self.start_level()
    }

    pub fn pointer_down(&mut self, at: Point) -> bool {
        self.engine.pointer_down(at)
    }

    pub fn pointer_move(&mut self, at: Point) -> bool {
        self.engine.pointer_move(at)
    }

    pub fn pointer_up(&mut self) -> PointerUp {
        let up = self.engine.pointer_up();
        if up.completed {
            self.progress.on_level_complete(&self.player.id);
        }
        up
    }

    /// Runs the win check outside of a pointer release.
    pub fn check_win(&mut self) -> bool {
        let won = self.engine.check_win();
        if won {
            self.progress.on_level_complete(&self.player.id);
        }
        won
    }
}
