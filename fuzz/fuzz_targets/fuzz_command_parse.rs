//! Fuzz target: `BridgeCommand::parse`
//!
//! Splits the input into a method name and a JSON argument document and
//! routes it through the command parser. Parsing must never panic, and a
//! parsed command must survive `to_message` → `parse` unchanged.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use packbridge::{BridgeCommand, DynamicMessage, METHODS};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let method = METHODS[usize::from(selector) % METHODS.len()];
    let Ok(text) = core::str::from_utf8(rest) else {
        return;
    };
    let Ok(args) = DynamicMessage::from_json(text) else {
        return;
    };

    if let Ok(cmd) = BridgeCommand::parse(method, &args) {
        assert_eq!(cmd.method(), method);
        assert_eq!(BridgeCommand::parse(method, &cmd.to_message()).as_ref(), Ok(&cmd));
    }
});
