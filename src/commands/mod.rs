//! # Commands Module
//!
//! This module contains the two command handlers for feistelcp:
//!
//! ## `send`
//! Sends one file to a listening peer:
//! - Connects to the peer's address and port
//! - Runs the Diffie-Hellman exchange as the client
//! - Streams the file through the Feistel cluster cipher
//! - Prints the average throughput
//!
//! ## `receive`
//! Listens for incoming files:
//! - Accepts connections one at a time, once or in a loop
//! - Runs the Diffie-Hellman exchange as the server
//! - Decrypts into the output directory under the sender's chosen name
//! - Reports whether the integrity trailer matched

pub mod send;
pub mod receive;
