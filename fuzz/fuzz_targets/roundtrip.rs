#![no_main]
use huffstream::{decode, Encoder, EncoderConfig, ReplayBacking};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (Vec<u8>, u16)| {
    let (input, chunk) = data;
    let chunk = (chunk as usize % 4096) + 1;

    let config = EncoderConfig::default()
        .with_replay(ReplayBacking::Memory)
        .with_chunk_size(chunk);
    let encoder = match Encoder::new(config) {
        Ok(encoder) => encoder,
        Err(_) => return,
    };

    let mut packed = Vec::new();
    encoder.encode(&input[..], &mut packed).unwrap();

    let mut output = Vec::new();
    decode(&packed[..], &mut output).unwrap();
    assert_eq!(input, output);
});
