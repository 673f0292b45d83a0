#![no_main]

use hostbind::{Bindings, check_metadata};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 64 * 1024 {
        return;
    }

    // Any schema that resolves must satisfy the lowering contract
    if let Ok(bindings) = Bindings::from_source(source) {
        let violations = check_metadata(&bindings.metadata());
        assert!(violations.is_empty(), "{:?}", violations);
        let _ = bindings.rust();
    }
});
