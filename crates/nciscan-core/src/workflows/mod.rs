//! # Workflows Module
//!
//! End-to-end entry points that turn structure files into finished interaction
//! tables.
//!
//! ## Overview
//!
//! A workflow owns nothing but the shared, read-only parameter tables
//! ([`analyze::AnalysisParams`]). Every frame is parsed, classified, detected
//! and post-processed on its own, so frames never share mutable state.
//!
//! ## Architecture
//!
//! - **Single frame** ([`analyze`]) - Validation, detection and the
//!   post-processing passes for one structure
//! - **Trajectory** ([`trajectory`]) - Frame discovery, independent (optionally
//!   parallel) evaluation of each frame, failure isolation and label totals

pub mod analyze;
pub mod trajectory;
