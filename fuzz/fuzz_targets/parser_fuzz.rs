//! Parser fuzz target: feed arbitrary bytes through the whole conversion.
//! Conversion must not panic; it returns either JSON text or an error.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let options = pdl_json::Options::default();
    if let Ok(document) = pdl_json::load(s, &options) {
        let _ = pdl_json::serialize::to_string(&document, &options);
        let _ = pdl_json::load(&pdl_json::to_pdl(&document), &options);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
