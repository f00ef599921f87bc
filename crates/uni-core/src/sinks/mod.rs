//! Ready-made sinks that reconstruct higher-level views from a decode pass.

mod raw_extract;
mod recording;
mod rw_extract;
mod spiketrain;

pub use raw_extract::{RawExtractSink, RawReshapeSink};
pub use recording::RecordingSink;
pub use rw_extract::{RwEntry, RwExtractSink};
pub use spiketrain::SpiketrainSink;
