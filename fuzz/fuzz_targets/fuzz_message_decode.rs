//! Fuzz target: JSON text → `DynamicMessage` → entity decode
//!
//! Drives arbitrary bytes through the JSON interchange and every entity
//! codec and asserts that decoding never panics, and that whatever does
//! decode re-encodes to a message that decodes to the same entity.
//!
//! cargo fuzz run fuzz_message_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use packbridge::{
    AssetLocation, DynamicMessage, MessageCodec, PackLocation, PackState, PackStates,
};

fn check<T: MessageCodec + PartialEq + core::fmt::Debug>(msg: &DynamicMessage) {
    if let Ok(entity) = T::decode(msg) {
        assert_eq!(T::decode(&entity.encode()).as_ref(), Ok(&entity));
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(msg) = DynamicMessage::from_json(text) else {
        return;
    };

    check::<AssetLocation>(&msg);
    check::<PackLocation>(&msg);
    check::<PackState>(&msg);
    check::<PackStates>(&msg);

    // Re-serialising an accepted document must succeed and be stable.
    let json = msg.to_json().expect("accepted message must serialise");
    assert_eq!(DynamicMessage::from_json(&json).ok().as_ref(), Some(&msg));
});
