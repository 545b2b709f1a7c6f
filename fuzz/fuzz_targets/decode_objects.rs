#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use rpki_inspect::manifest::Manifest;
use rpki_inspect::roa::Roa;
use rpki_inspect::sigobj::SignedObject;

fuzz_target!(|data: &[u8]| {
    let (which, data) = match data.split_first() {
        Some((first, data)) => (*first, data),
        None => return,
    };
    let data = Bytes::copy_from_slice(data);

    match which % 6 {
        0 => { let _ = Manifest::decode(data, false); },
        1 => { let _ = Manifest::decode(data, true); },
        2 => { let _ = Roa::decode(data, false); },
        3 => { let _ = Roa::decode(data, true); },
        4 => {
            if let Ok(obj) = SignedObject::decode(data, false) {
                let _ = obj.dump().to_string();
            }
        }
        5 => { let _ = SignedObject::decode(data, true); },
        _ => panic!("what?"),
    }
});
