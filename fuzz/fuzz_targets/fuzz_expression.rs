#![no_main]

use hostbind::Bindings;
use libfuzzer_sys::fuzz_target;

const DOM: &str = include_str!("../../schemas/dom.idl");

thread_local! {
    static BINDINGS: Option<Bindings> = Bindings::from_source(DOM).ok();
}

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 4 * 1024 {
        return;
    }

    BINDINGS.with(|bindings| {
        let Some(bindings) = bindings else {
            return;
        };
        // Translation and lowering report errors, never panic
        let _ = bindings.lower(source);
    });
});
