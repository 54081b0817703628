#![no_main]

use libfuzzer_sys::fuzz_target;

use stretcher::decoder::{Decoder, DecoderPhase, Event};

fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::new();

    for &byte in data {
        let before = decoder.phase();
        let events = decoder.feed(byte);

        if events.len() == 2 {
            assert_eq!(before, DecoderPhase::Training);
            assert!(matches!(events[0], Event::FinishTraining { .. }));
            assert_eq!(events[1], Event::StartStretching);
        }
    }
});
