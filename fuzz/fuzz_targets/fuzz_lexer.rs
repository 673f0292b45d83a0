#![no_main]

use hostbind::lexer::{Lexer, TokenKind};
use hostbind::string_dict::StringDict;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 64 * 1024 {
        return;
    }

    let mut dict = StringDict::new();
    let mut lexer = Lexer::new(source, &mut dict);

    // Every token span lies inside the source
    loop {
        let token = lexer.next_token();
        assert!(token.span.start <= token.span.end);
        assert!(token.span.end <= source.len());
        if matches!(token.kind, TokenKind::Eof) {
            break;
        }
    }
});
