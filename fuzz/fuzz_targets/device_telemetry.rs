#![no_main]

use libfuzzer_sys::fuzz_target;

use stretcher::{
    config::DeviceConfig,
    decoder::{Decoder, Event},
    device::{ClockStretcher, TickInput},
};

// Every input byte is one tick: bit 0 is the line level, bit 1 the trigger.
fuzz_target!(|data: &[u8]| {
    let mut device = ClockStretcher::new(DeviceConfig {
        tick_rate_hz: 1_000,
        min_bus_frequency_hz: 1,
    });
    let mut decoder = Decoder::new();

    for &sample in data {
        let output = device.tick(TickInput::new(sample & 1 != 0, sample & 2 != 0));
        for &byte in output.telemetry() {
            for event in decoder.feed(byte) {
                assert!(!matches!(event, Event::Unhandled { .. }), "{event:?}");
            }
        }
    }
});
