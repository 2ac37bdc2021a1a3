//! Peakform - Fitness Progress Tracking Backend
//!
//! This crate implements the entitlement and subscription reconciliation
//! engine behind the Peakform app: payment event processing, promo code
//! redemption, and the scheduled reminder pipeline.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
