//! Shift planning core: staff a demand forecast from a roster, let a
//! manager move shifts around, and reconcile employee requests back
//! into the live schedule.

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod mutation;
pub mod notification;
pub mod publish;
pub mod request_desk;
pub mod rng;
pub mod roster;
pub mod schedule;
pub mod session;
pub mod source;
pub mod store;
pub mod types;
