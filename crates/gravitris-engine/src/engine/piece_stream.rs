use std::fmt::Write as _;

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the piece randomizer. Two streams built from the same
/// seed draw the same kinds in the same order, which is what the gameplay
/// tests lean on.
///
/// # Example
///
/// ```
/// use gravitris_engine::{BoardSize, GameSession, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let a = GameSession::with_seed(BoardSize::DEFAULT, seed);
/// let b = GameSession::with_seed(BoardSize::DEFAULT, seed);
/// assert_eq!(a.falling_piece(), b.falling_piece());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PieceSeed([u8; 16]);

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").unwrap();
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// Uniform random piece source.
///
/// Every draw picks one of the 7 kinds uniformly at random, with
/// replacement. There is no bag or drought protection; the distribution is
/// memoryless by design.
#[derive(Debug, Clone)]
pub struct PieceStream {
    rng: Pcg32,
}

impl Default for PieceStream {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceStream {
    /// Creates a stream seeded from the thread RNG. For deterministic draws,
    /// use [`Self::with_seed`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
        }
    }

    /// Draws the next piece kind.
    pub fn next_kind(&mut self) -> PieceKind {
        self.rng.random()
    }
}
