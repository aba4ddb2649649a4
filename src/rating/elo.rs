use crate::config::harness::RatingConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Result of one match, from the first participant's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn score(self) -> f64 {
        match self {
            Self::Win => 1.0,
            Self::Draw => 0.5,
            Self::Loss => 0.0,
        }
    }

    /// Same match seen from the other side
    pub fn mirrored(self) -> Self {
        match self {
            Self::Win => Self::Loss,
            Self::Draw => Self::Draw,
            Self::Loss => Self::Win,
        }
    }
}

impl FromStr for MatchOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "win" | "1" => Ok(Self::Win),
            "draw" | "0.5" => Ok(Self::Draw),
            "loss" | "0" => Ok(Self::Loss),
            other => Err(format!("unknown match outcome '{}'", other)),
        }
    }
}

/// Pure ELO update over a fixed configuration
#[derive(Debug, Clone)]
pub struct EloRating {
    config: RatingConfig,
}

impl EloRating {
    pub fn new(config: RatingConfig) -> Self {
        Self { config }
    }

    /// Expected score of a player rated `rating` against `opponent`
    pub fn expected(&self, rating: f64, opponent: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf((opponent - rating) / self.config.scale))
    }

    /// K for a player rated `rating`: first tier it is strictly above
    pub fn k_factor(&self, rating: f64) -> f64 {
        self.config
            .tiers
            .iter()
            .find(|tier| rating > tier.above)
            .map(|tier| tier.k)
            .unwrap_or(self.config.base_k)
    }

    /// New rating of the first participant. Unclamped.
    pub fn update(&self, rating: f64, opponent: f64, outcome: MatchOutcome) -> f64 {
        rating + self.k_factor(rating) * (outcome.score() - self.expected(rating, opponent))
    }

    /// New ratings of both participants
    pub fn update_pair(&self, first: f64, second: f64, outcome: MatchOutcome) -> (f64, f64) {
        (
            self.update(first, second, outcome),
            self.update(second, first, outcome.mirrored()),
        )
    }
}

impl Default for EloRating {
    fn default() -> Self {
        Self::new(RatingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn equal_ratings_draw_is_a_fixed_point() {
        let elo = EloRating::default();
        assert!((elo.expected(1500.0, 1500.0) - 0.5).abs() < EPS);
        assert!((elo.update(1500.0, 1500.0, MatchOutcome::Draw) - 1500.0).abs() < EPS);
    }

    #[test]
    fn win_raises_and_loss_lowers() {
        let elo = EloRating::default();
        for (r1, r2) in [(1000.0, 1000.0), (1900.0, 1200.0), (2500.0, 2600.0)] {
            assert!(elo.update(r1, r2, MatchOutcome::Win) > r1);
            assert!(elo.update(r1, r2, MatchOutcome::Loss) < r1);
        }
    }

    #[test]
    fn k_factor_tiers_are_strict() {
        let elo = EloRating::default();
        assert_eq!(elo.k_factor(2401.0), 10.0);
        assert_eq!(elo.k_factor(2400.0), 20.0);
        assert_eq!(elo.k_factor(1801.0), 20.0);
        assert_eq!(elo.k_factor(1800.0), 40.0);
    }

    #[test]
    fn known_update() {
        // 1500 beats 1500 with K = 40: +20
        let elo = EloRating::default();
        assert!((elo.update(1500.0, 1500.0, MatchOutcome::Win) - 1520.0).abs() < EPS);
    }

    #[test]
    fn pair_update_uses_mirrored_outcome() {
        let elo = EloRating::default();
        let (a, b) = elo.update_pair(1600.0, 1400.0, MatchOutcome::Loss);
        assert!((a - elo.update(1600.0, 1400.0, MatchOutcome::Loss)).abs() < EPS);
        assert!((b - elo.update(1400.0, 1600.0, MatchOutcome::Win)).abs() < EPS);
        // Same K on both sides: zero-sum
        assert!(((a - 1600.0) + (b - 1400.0)).abs() < EPS);
    }

    #[test]
    fn outcome_parses_from_cli_words() {
        assert_eq!("win".parse::<MatchOutcome>().unwrap(), MatchOutcome::Win);
        assert_eq!("0.5".parse::<MatchOutcome>().unwrap(), MatchOutcome::Draw);
        assert!("tie-ish".parse::<MatchOutcome>().is_err());
    }
}
