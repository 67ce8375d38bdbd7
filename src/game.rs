//! Lyric guessing game over a canonical dataset.
//!
//! A random song is picked and its first line shown. Each wrong guess costs a
//! life and reveals one more line; a right guess scores and moves to a new
//! song. The round ends when lives or time run out.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::models::CanonicalRecord;
use crate::normalize::guess_key;

pub const STARTING_LIVES: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("dataset has no songs with lyrics")]
    EmptyDataset,

    #[error("unknown game mode '{0}' (expected 30sec, 1min or 5min)")]
    UnknownMode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    ThirtySeconds,
    OneMinute,
    FiveMinutes,
}

impl GameMode {
    pub fn time_limit(self) -> Duration {
        match self {
            GameMode::ThirtySeconds => Duration::from_secs(30),
            GameMode::OneMinute => Duration::from_secs(60),
            GameMode::FiveMinutes => Duration::from_secs(300),
        }
    }
}

impl FromStr for GameMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "30sec" => Ok(GameMode::ThirtySeconds),
            "1min" => Ok(GameMode::OneMinute),
            "5min" => Ok(GameMode::FiveMinutes),
            other => Err(GameError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::ThirtySeconds => "30sec",
            GameMode::OneMinute => "1min",
            GameMode::FiveMinutes => "5min",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct { score: u32 },
    /// `revealed` is true when a new lyric line was uncovered.
    Wrong { lives: u32, revealed: bool },
    GameOver,
    /// Guess arrived after the game ended.
    Ignored,
}

pub struct Game<'a, R: Rng> {
    songs: Vec<&'a CanonicalRecord>,
    rng: R,
    mode: GameMode,
    score: u32,
    lives: u32,
    remaining: Duration,
    current: usize,
    revealed: usize,
    over: bool,
}

impl<'a, R: Rng> Game<'a, R> {
    /// Start a game. Songs without lyric lines are skipped.
    pub fn new(dataset: &'a [CanonicalRecord], mode: GameMode, rng: R) -> Result<Self, GameError> {
        let songs: Vec<&CanonicalRecord> = dataset.iter().filter(|s| !s.lyrics.is_empty()).collect();
        if songs.is_empty() {
            return Err(GameError::EmptyDataset);
        }

        let mut game = Self {
            songs,
            rng,
            mode,
            score: 0,
            lives: STARTING_LIVES,
            remaining: mode.time_limit(),
            current: 0,
            revealed: 0,
            over: false,
        };
        game.next_song();
        Ok(game)
    }

    /// Play again in the same mode.
    pub fn restart(&mut self) {
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.remaining = self.mode.time_limit();
        self.over = false;
        self.next_song();
    }

    fn next_song(&mut self) {
        self.current = self.rng.gen_range(0..self.songs.len());
        self.revealed = 1;
    }

    fn song(&self) -> &'a CanonicalRecord {
        self.songs[self.current]
    }

    pub fn guess(&mut self, text: &str) -> GuessOutcome {
        if self.over {
            return GuessOutcome::Ignored;
        }

        if guess_key(text) == guess_key(&self.song().title) {
            self.score += 1;
            self.next_song();
            return GuessOutcome::Correct { score: self.score };
        }

        let lives_before = self.lives;
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.over = true;
            return GuessOutcome::GameOver;
        }

        let revealed = lives_before > 1 && self.revealed < self.song().lyrics.len();
        if revealed {
            self.revealed += 1;
        }
        GuessOutcome::Wrong {
            lives: self.lives,
            revealed,
        }
    }

    /// Advance the clock. Returns true once the game is over.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if !self.over {
            self.remaining = self.remaining.saturating_sub(elapsed);
            if self.remaining.is_zero() {
                self.over = true;
            }
        }
        self.over
    }

    pub fn revealed_lines(&self) -> &'a [String] {
        let lyrics = &self.song().lyrics;
        &lyrics[..self.revealed.min(lyrics.len())]
    }

    /// Title of the song being guessed (shown when the round ends).
    pub fn answer(&self) -> &'a str {
        &self.song().title
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_over(&self) -> bool {
        self.over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> Vec<CanonicalRecord> {
        vec![CanonicalRecord {
            title: "No Children".to_string(),
            lyrics: vec![
                "I hope that our few remaining friends".to_string(),
                "Give up on trying to save us".to_string(),
                "I hope we come up with a fail-safe plot".to_string(),
            ],
        }]
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_new_game_state() {
        let songs = dataset();
        let game = Game::new(&songs, GameMode::OneMinute, rng()).unwrap();
        assert_eq!(game.score(), 0);
        assert_eq!(game.lives(), STARTING_LIVES);
        assert_eq!(game.remaining(), Duration::from_secs(60));
        assert_eq!(game.revealed_lines(), &songs[0].lyrics[..1]);
        assert!(!game.is_over());
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let songs = vec![CanonicalRecord {
            title: "Empty".to_string(),
            lyrics: vec![],
        }];
        assert_eq!(
            Game::new(&songs, GameMode::OneMinute, rng()).err(),
            Some(GameError::EmptyDataset)
        );
        assert!(Game::new(&[], GameMode::OneMinute, rng()).is_err());
    }

    #[test]
    fn test_correct_guess_scores() {
        let songs = dataset();
        let mut game = Game::new(&songs, GameMode::OneMinute, rng()).unwrap();
        assert_eq!(game.guess("  no children "), GuessOutcome::Correct { score: 1 });
        assert_eq!(game.lives(), STARTING_LIVES);
        assert_eq!(game.revealed_lines().len(), 1);
    }

    #[test]
    fn test_wrong_guess_reveals_next_line() {
        let songs = dataset();
        let mut game = Game::new(&songs, GameMode::OneMinute, rng()).unwrap();

        assert_eq!(game.guess("This Year"), GuessOutcome::Wrong { lives: 4, revealed: true });
        assert_eq!(game.revealed_lines().len(), 2);
        assert_eq!(game.guess("Cotton"), GuessOutcome::Wrong { lives: 3, revealed: true });
        // All three lines showing; nothing left to reveal
        assert_eq!(game.guess("Jenny"), GuessOutcome::Wrong { lives: 2, revealed: false });
        assert_eq!(game.revealed_lines().len(), 3);
    }

    #[test]
    fn test_out_of_lives_ends_game() {
        let songs = dataset();
        let mut game = Game::new(&songs, GameMode::FiveMinutes, rng()).unwrap();
        for _ in 0..STARTING_LIVES - 1 {
            assert!(matches!(game.guess("wrong"), GuessOutcome::Wrong { .. }));
        }
        assert_eq!(game.guess("wrong"), GuessOutcome::GameOver);
        assert!(game.is_over());
        assert_eq!(game.lives(), 0);
        assert_eq!(game.guess("No Children"), GuessOutcome::Ignored);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_time_runs_out() {
        let songs = dataset();
        let mut game = Game::new(&songs, GameMode::ThirtySeconds, rng()).unwrap();
        assert!(!game.tick(Duration::from_secs(29)));
        assert!(game.tick(Duration::from_secs(5)));
        assert_eq!(game.remaining(), Duration::ZERO);
        assert_eq!(game.guess("No Children"), GuessOutcome::Ignored);
    }

    #[test]
    fn test_restart_resets_state() {
        let songs = dataset();
        let mut game = Game::new(&songs, GameMode::ThirtySeconds, rng()).unwrap();
        game.guess("No Children");
        game.tick(Duration::from_secs(30));
        game.restart();
        assert_eq!(game.score(), 0);
        assert_eq!(game.lives(), STARTING_LIVES);
        assert_eq!(game.remaining(), Duration::from_secs(30));
        assert!(!game.is_over());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("30sec".parse::<GameMode>(), Ok(GameMode::ThirtySeconds));
        assert_eq!("5min".parse::<GameMode>(), Ok(GameMode::FiveMinutes));
        assert!("2min".parse::<GameMode>().is_err());
        assert_eq!(GameMode::OneMinute.to_string(), "1min");
    }
}
