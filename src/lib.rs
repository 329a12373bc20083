//! Play-calling models built from college play-by-play exports: derive a
//! situation feature table, fit per-task classifiers, and serve calls for
//! a given down, distance and formation.

pub mod bundle;
pub mod classifier;
pub mod contract;
pub mod dataset;
pub mod features;
pub mod filter;
pub mod play_text;
pub mod predict;
pub mod trainer;
