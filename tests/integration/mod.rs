//! Integration tests for the peakfit-rs library
//!
//! This module organizes all integration tests that exercise the library as a
//! whole, rather than individual components.

// Peak and background fitting on synthetic diffractograms
pub mod fitting;

// JSON persistence of functions and fit setups
pub mod persistence;

// Diffractogram caches and their invalidation
pub mod caching;
