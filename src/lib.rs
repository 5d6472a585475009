//! Interactive video linker.
//!
//! Guesses what a video file is from its name, confirms the guess against
//! TMDb (movies) or TheTVDB (episodes) with the user, and drops a readable
//! symlink such as `[M] Alien (1979)` into a links directory.

pub mod config;
pub mod console;
pub mod error;
pub mod guess;
pub mod media;
pub mod providers;
pub mod resolver;
pub mod tracker;
