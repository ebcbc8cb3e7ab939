//! Value model and wire codec for marker-framed game-state blocks.
//!
//! The producer runs inside the game's scripting context and can only emit
//! text, so one turn's state travels as a single framed block appended to a
//! log stream. This crate owns both ends of that contract: the restricted
//! value model the producer builds, the encoder that flattens it (tolerating
//! cyclic record graphs), the decoder, and the extractor that pulls the
//! latest complete block back out of a noisy, occasionally truncated log.
//!
//! Everything in here is pure computation; file I/O lives with the callers.

mod decode;
mod encode;
mod frame;
mod value;

pub use decode::{decode, DecodeError};
pub use encode::{encode, CIRCULAR_SENTINEL};
pub use frame::{
    extract_blocks, extract_latest, frame_block, frame_chunked, StreamCursor, CHUNK_PREFIX,
    END_MARKER, START_MARKER,
};
pub use value::{MapKey, Value, ValueList, ValueMap};
