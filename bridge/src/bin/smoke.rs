use anyhow::{bail, Result};
use skadivm_bridge::bridge::{Bridge, LaunchRequest};
use skadivm_bridge::error::status_of;

fn main() -> Result<()> {
    skadivm_bridge::logging::init();

    // Accept optional library path and working dir
    let lib = std::env::args().nth(1).unwrap_or_else(|| "libc.so.6".into());
    let dir = std::env::args().nth(2).unwrap_or_else(|| ".".into());

    runner(&lib, &dir)
}

fn runner(lib: &str, dir: &str) -> Result<()> {
    let bridge = Bridge::default();
    let req = LaunchRequest::new(dir, lib, "-version");

    // Load twice: the second call must not see anything left over from the first
    let first = bridge.run(&req, &mut |_: &str| {});
    let second = bridge.run(&req, &mut |_: &str| {});
    println!("first : status={} {:?}", status_of(&first), first);
    println!("second: status={} {:?}", status_of(&second), second);

    check_same(status_of(&first), status_of(&second))?;
    println!("load/unload ok");
    Ok(())
}

fn check_same(first: i32, second: i32) -> Result<()> {
    if first != second {
        bail!("load/unload mismatch: first call returned {first}, second returned {second}");
    }
    Ok(())
}
