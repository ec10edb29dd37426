#![no_main]

use libfuzzer_sys::fuzz_target;
use octet_core::{disassemble, Engine};

fuzz_target!(|data: &[u8]| {
    let mut engine = Engine::default();
    let copied = engine.load(data);
    assert_eq!(copied, data.len().min(256));

    engine.run(1024);
    let _ = engine.get_state();
    let _ = disassemble(0, 64, engine.machine().memory_bytes(), engine.instructions());
});
