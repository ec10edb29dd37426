#![no_main]

use libfuzzer_sys::fuzz_target;
use octet_core::codec::{long_form, short_form};
use octet_core::Engine;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut engine = Engine::default();
    let (image, _warnings) = long_form::decode(text);
    engine.load_image(&image);

    if let Some(image) = short_form::decode(text) {
        let encoded = short_form::encode(&image);
        assert_eq!(short_form::decode(&encoded).map(|i| i.memory), Some(image.memory));
        engine.load_image(&image);
    }
});
