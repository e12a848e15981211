//! Thread Relay - ephemeral code-addressed discussion threads.
//!
//! An instructor opens a thread and gets a four-digit code, participants
//! join by code and exchange notes in real time, and closing the thread
//! archives its transcript and frees the code.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
