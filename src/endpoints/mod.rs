//! Typed calls on [`KoboldClient`](crate::KoboldClient), one module per
//! area of the KoboldCpp API.

pub mod generation;
pub mod image;
pub mod info;
pub mod multiplayer;
pub mod tokens;
pub mod transcribe;
pub mod web_search;
