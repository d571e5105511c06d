// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player errors.

use ordoplay_cinematic::CinematicError;
use thiserror::Error;

/// Errors that end a player run
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Engine error while loading or playing
    #[error(transparent)]
    Cinematic(#[from] CinematicError),

    /// `--scene` argument not in `NAME:SECONDS` form
    #[error("Invalid scene argument '{0}': expected NAME:SECONDS with a positive length")]
    InvalidSceneArg(String),

    /// Neither a sequence file nor a scene was given
    #[error("Nothing to play: pass a sequence file or --scene")]
    NothingToPlay,

    /// The engine refused the play request
    #[error("Cinematic did not start")]
    NotStarted,

    /// Simulation ran past its time limit
    #[error("Cinematic still running after {0:.1}s of simulated time")]
    Timeout(f64),

    /// Settings could not be formatted for the log
    #[error("Failed to format settings: {0}")]
    Format(#[from] ron::Error),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
