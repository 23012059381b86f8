//! Protocols are used to communicate with the game engine from other programs
//! (game servers, clients, bots).
//!
//! kfchess implements a single one:
//! - Sync protocol, keeping client replicas in line with an authoritative host

pub mod sync;
