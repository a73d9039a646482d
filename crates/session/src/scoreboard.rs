//! Basketball scoreboard with a single scorekeeper
//!
//! One user at a time holds the scorekeeper seat. Only that user can change
//! the score; the seat frees up when they release it or leave.

use crate::stage::UserId;
use crate::{Result, SessionError};
use std::fmt;
use tracing::info;

/// Largest single score change (a three-pointer)
pub const MAX_POINTS: i32 = 3;

/// Side of the court
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Home,
    Away,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Home => f.write_str("home"),
            Team::Away => f.write_str("away"),
        }
    }
}

/// Score state for one session
#[derive(Debug, Default)]
pub struct ScoreBoard {
    home: u32,
    away: u32,
    scorekeeper: Option<UserId>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the scorekeeper seat
    ///
    /// Succeeds if the seat is empty or already held by `user`.
    pub fn claim(&mut self, user: UserId) -> Result<()> {
        match self.scorekeeper {
            Some(current) if current != user => Err(SessionError::SeatTaken),
            Some(_) => Ok(()),
            None => {
                info!("User {} is now scorekeeper", user);
                self.scorekeeper = Some(user);
                Ok(())
            }
        }
    }

    /// Give up the seat; returns whether `user` held it
    pub fn release(&mut self, user: UserId) -> bool {
        if self.scorekeeper == Some(user) {
            self.scorekeeper = None;
            true
        } else {
            false
        }
    }

    /// Free the seat if the leaving user held it
    pub fn user_left(&mut self, user: UserId) {
        self.release(user);
    }

    /// Current scorekeeper
    pub fn scorekeeper(&self) -> Option<UserId> {
        self.scorekeeper
    }

    /// Add (or with a negative delta, correct) points for a team
    ///
    /// Scores never go below zero.
    pub fn score(&mut self, user: UserId, team: Team, delta: i32) -> Result<u32> {
        self.require_scorekeeper(user)?;
        if delta == 0 || delta.unsigned_abs() > MAX_POINTS.unsigned_abs() {
            return Err(SessionError::InvalidPoints(delta));
        }

        let slot = match team {
            Team::Home => &mut self.home,
            Team::Away => &mut self.away,
        };
        *slot = if delta > 0 {
            slot.saturating_add(delta as u32)
        } else {
            slot.saturating_sub(delta.unsigned_abs())
        };
        Ok(*slot)
    }

    /// Zero both scores
    pub fn reset(&mut self, user: UserId) -> Result<()> {
        self.require_scorekeeper(user)?;
        self.home = 0;
        self.away = 0;
        Ok(())
    }

    /// Score of one team
    pub fn points(&self, team: Team) -> u32 {
        match team {
            Team::Home => self.home,
            Team::Away => self.away,
        }
    }

    fn require_scorekeeper(&self, user: UserId) -> Result<()> {
        if self.scorekeeper == Some(user) {
            Ok(())
        } else {
            Err(SessionError::NotScorekeeper)
        }
    }
}

impl fmt::Display for ScoreBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HOME {:>3} : {:<3} AWAY", self.home, self.away)
    }
}
