//! Fundamental type definitions shared across the engine.
//!
//! This module contains participant identity, quality tiers and pointer
//! samples, organized into focused submodules.

pub mod participant;
pub mod pointer;
pub mod quality;

pub use participant::ParticipantId;
pub use pointer::{LocalCursor, PointerSample};
pub use quality::QualityTier;
