//! Kerberos V5 (RFC 4120) message codec and validation core.
//!
//! Inbound bytes are classified with [`message::classify`] or decoded into a
//! [`message::KrbMessage`]. Encrypted parts are opened through the [`envelope`] using a
//! [`crypto::CryptoTransform`] and a key usage, and AP-REQs are checked by the
//! [`validation::ApReqValidator`] against a [`replay::ReplayCache`]. Authorization data
//! recovered from a validated ticket is expanded by [`restriction::expand`].

// #![deny(warnings)]

#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::disallowed_types)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]

pub mod asn1;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod keystore;
pub mod message;
pub mod replay;
pub mod restriction;
pub mod time;
pub mod validation;

pub use crate::error::KrbError;
