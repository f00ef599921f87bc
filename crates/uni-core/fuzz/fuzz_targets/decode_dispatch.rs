#![no_main]

use libfuzzer_sys::fuzz_target;
use uni_core::{
    encode, run, Instruction, RecordingSink, SliceReader, SliceWriter, SpiketrainSink,
    StandardMapV2, StandardMapV3, WireVersion,
};

fn reencode(instructions: &[Instruction], version: WireVersion) -> Vec<u8> {
    let total: usize = instructions.iter().map(Instruction::encoded_len).sum();
    let mut bytes = vec![0_u8; total];
    let mut writer = SliceWriter::new(&mut bytes);
    for instruction in instructions {
        encode(&mut writer, instruction, version).expect("decoded instructions re-encode");
    }
    bytes
}

fuzz_target!(|data: &[u8]| {
    for version in [WireVersion::V2, WireVersion::V3] {
        let mut reader = SliceReader::new(data);
        let mut sink = RecordingSink::new();
        let Ok(end) = run(&mut reader, version, &mut sink) else {
            continue;
        };

        let bytes = reencode(&sink.instructions, version);
        let mut reader = SliceReader::new(&bytes);
        let mut replay = RecordingSink::new();
        let replay_end = run(&mut reader, version, &mut replay).expect("re-encoded bytes decode");
        assert_eq!(replay_end, end);
        assert_eq!(replay.instructions, sink.instructions);

        let mut reader = SliceReader::new(data);
        let mut spikes_v2 = SpiketrainSink::new(StandardMapV2);
        let _ = run(&mut reader, version, &mut spikes_v2);
        let mut reader = SliceReader::new(data);
        let mut spikes_v3 = SpiketrainSink::new(StandardMapV3);
        let _ = run(&mut reader, version, &mut spikes_v3);
    }
});
