//! Unicore high precision GNSS receiver data stream decoding.
//!
//! Decodes the receiver's binary frame stream into satellite observation
//! and broadcast ephemeris records. The crate is a resumable byte-stream
//! decoder: frames are located by their sync signature, validated against
//! their trailing CRC-32, and dispatched to per-message decoders for range
//! measurements (uncompressed and compressed) and GPS, GLONASS, Galileo,
//! and BeiDou ephemerides. All decoding is synchronous and a [`Decoder`]
//! holds the state for exactly one stream.
//!
//! Reference: Unicorecomm Inc., Reference Commands Manual for High
//! Precision GNSS Board and Module, V1.0.
//!
//! # Example
//! ```no_run
//! use std::fs::File;
//! use unicore::{Config, Decoder, FrameReader, Update};
//!
//! let file = File::open("rover.bin").unwrap();
//! let mut frames = FrameReader::new(file);
//! let mut decoder = Decoder::new(Config::default());
//! loop {
//!     match frames.next_frame() {
//!         Ok(Some(frame)) => match decoder.decode_frame(&frame) {
//!             Ok(Update::Observations) => {
//!                 println!("epoch has {} satellites", decoder.observations().len());
//!             }
//!             Ok(Update::Ephemeris(sat)) => println!("new ephemeris for {sat}"),
//!             Ok(Update::None) => {}
//!             Err(err) => eprintln!("frame rejected: {err}"),
//!         },
//!         Ok(None) => break,
//!         Err(err) => eprintln!("framing: {err}"),
//!     }
//! }
//! ```

mod bytes;
mod crc32;
mod error;

pub mod decoder;
pub mod eph;
pub mod frame;
pub mod obs;
pub mod sat;
pub mod time;
pub mod trackstat;

pub use bytes::extend_sign;
pub use crc32::checksum;
pub use decoder::{Config, Decoder, GalileoNav, NavStore, Update};
pub use error::{Error, Result};
pub use frame::{FrameAssembler, FrameReader, RawFrame};
