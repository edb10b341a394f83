#![no_main]

use libfuzzer_sys::fuzz_target;

use colbench::format::{parse_column_names, split_path, FormatDescriptor};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Suffix splitting and format resolution must never panic
    let (basename, suffix) = split_path(text);
    assert_eq!(basename.len() + suffix.len() + usize::from(text.contains('.')), text.len());
    if let Ok(descriptor) = FormatDescriptor::from_path(text) {
        assert_eq!(descriptor.suffix, suffix);
    }

    // Sidecar text splits into non-empty names without whitespace
    for name in parse_column_names(text) {
        assert!(!name.is_empty());
        assert!(!name.contains(char::is_whitespace));
    }
});
