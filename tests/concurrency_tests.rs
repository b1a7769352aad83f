//! Concurrent installs of different libraries into the same home

mod common;

use std::thread;

#[test]
fn test_concurrent_installs_of_different_libraries() {
    let mut home = common::TestHome::new();
    let names = ["Servo", "Ethernet", "Stepper", "Wire"];
    for name in names {
        home.publish(name, "1.0.0");
    }

    let handles: Vec<_> = names
        .iter()
        .map(|name| {
            let mut cmd = home.cmd();
            cmd.args(["install", name]);
            thread::spawn(move || {
                cmd.assert().success();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("install thread panicked");
    }

    assert_eq!(home.library_entries(), ["Ethernet", "Servo", "Stepper", "Wire"]);
    for name in names {
        assert!(home.library_exists(&format!("{name}/src/{name}.h")));
    }
}
