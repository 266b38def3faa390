//! Service booking lifecycle with a full audit trail.
//!
//! This crate provides the booking state machine: the legal statuses, the
//! ordinary transition table with the actor allowed to trigger each step, an
//! unconditional administrative override, and an append-only history that
//! records who changed what and when.

pub mod booking;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod observers;
pub mod persistence;
pub mod provider;
pub mod status;
pub mod transition;
pub mod visualization;

pub use booking::{Booking, BookingId, ProviderId};
pub use command::Command;
pub use config::EngineConfig;
pub use engine::BookingEngine;
pub use error::{BookingError, ConfigError, SnapshotError};
pub use history::{History, HistoryEntry};
pub use status::BookingStatus;
pub use transition::{Actor, Operation};
pub use visualization::LifecycleVisualization;
