#![no_main]
use libfuzzer_sys::fuzz_target;

use fposbridge_membrane::{
    BridgeMode, Decision, HandleRegistry, TemporalState, classify, decide_copy, decide_release,
};

fuzz_target!(|data: &[u8]| {
    // Drive a private registry with register/release/copy ops over a small
    // address space; hardened decisions must agree with the address map, and
    // the map must never outgrow the outstanding count.
    let registry = HandleRegistry::new();
    let mode = BridgeMode::Hardened;

    for chunk in data.chunks(2) {
        let [op, slot] = chunk else {
            break;
        };
        let addr = (usize::from(*slot % 16) + 1) * 64;
        match op % 3 {
            0 => {
                if classify(&registry, addr).temporal != TemporalState::Valid {
                    registry.register(addr, 16);
                }
            }
            1 => {
                let facts = classify(&registry, addr);
                match decide_release(mode, facts) {
                    Decision::Allow => {
                        assert_eq!(facts.temporal, TemporalState::Valid);
                        assert!(registry.release(addr));
                    }
                    Decision::Deny(_) => assert_eq!(facts.temporal, TemporalState::Unknown),
                    Decision::Skip => unreachable!("addresses are never null"),
                }
            }
            _ => {
                let other = (usize::from(*op >> 2) % 16 + 1) * 64;
                let decision = decide_copy(classify(&registry, other), classify(&registry, addr));
                let expected = if other == addr {
                    Decision::Skip
                } else {
                    Decision::Allow
                };
                assert_eq!(decision, expected);
            }
        }
        assert_eq!(registry.stats().outstanding() as usize, registry.tracked_count());
    }
});
