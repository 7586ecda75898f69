#![no_main]

use libfuzzer_sys::fuzz_target;
use refdump::typename::{parse_type_name, KnownTypes, TypeName};

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };

    let table = KnownTypes::from_iter(["app.Outer", "app.Outer.Inner"]);
    let scope = TypeName {
        generic_args: vec![TypeName::new("app", "Item")],
        ..TypeName::new("app", "Outer")
    };

    if let Ok(node) = parse_type_name(name, &table, Some(&scope)) {
        let _ = node.to_string();
    }
});
