use std::path::Path;

use skadivm_bridge::error::{status_of, STATUS_LOAD_FAILED, STATUS_OK, STATUS_WORKDIR_FAILED};
use skadivm_bridge::workdir::WorkDirMode;
use skadivm_bridge::{Bridge, BridgeError, LaunchRequest};

fn quiet() -> impl FnMut(&str) {
    |_: &str| {}
}

#[test]
fn missing_library_always_maps_to_load_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let bridge = Bridge::default();
    for lib in ["/nonexistent/libqemu-system-x86_64.so", "libqemu-system-nothere.so", "sub/lib.so"] {
        let res = bridge.run(&LaunchRequest::new(tmp.path(), lib, ""), &mut quiet());
        assert!(matches!(res, Err(BridgeError::Load { .. })), "{lib}: {res:?}");
        assert_eq!(status_of(&res), STATUS_LOAD_FAILED);
    }
}

#[test]
fn working_directory_is_checked_before_loading() {
    let tmp = tempfile::tempdir().unwrap();
    let req = LaunchRequest::new(tmp.path().join("missing"), "/nonexistent/lib.so", "");
    let res = Bridge::default().run(&req, &mut quiet());
    assert!(matches!(res, Err(BridgeError::WorkDir { .. })), "{res:?}");
    assert_eq!(status_of(&res), STATUS_WORKDIR_FAILED);
}

#[test]
fn relative_library_is_anchored_to_working_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let req = LaunchRequest::new(tmp.path(), "lib/libqemu-system-x86_64.so", "");
    match Bridge::default().run(&req, &mut quiet()) {
        Err(BridgeError::Load { path, .. }) => assert_eq!(path, tmp.path().join("lib/libqemu-system-x86_64.so")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn command_line_and_sink_do_not_change_the_outcome() {
    let tmp = tempfile::tempdir().unwrap();
    let bridge = Bridge::default();
    let mut lines = Vec::new();

    let a = bridge.run(&LaunchRequest::new(tmp.path(), "/nonexistent/q.so", ""), &mut quiet());
    let b = bridge.run(
        &LaunchRequest::new(tmp.path(), "/nonexistent/q.so", "-m 2G -smp 4 -hda disk.qcow2"),
        &mut |l: &str| lines.push(l.to_string()),
    );
    assert_eq!(status_of(&a), status_of(&b));
    assert_eq!(a.unwrap_err().to_string(), b.unwrap_err().to_string());
    assert!(lines.is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn loadable_library_is_released_every_call() {
    let tmp = tempfile::tempdir().unwrap();
    let bridge = Bridge::default();
    let req = LaunchRequest::new(tmp.path(), "libc.so.6", "-version");

    let first = bridge.run(&req, &mut quiet()).unwrap();
    let second = bridge.run(&req, &mut quiet()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.library, Path::new("libc.so.6"));
    assert!(!first.exports_main);
    assert_eq!(status_of(&Ok::<_, BridgeError>(first)), STATUS_OK);
}

// Path of the libc mapped into this test process.
#[cfg(target_os = "linux")]
fn mapped_libc() -> std::path::PathBuf {
    let maps = std::fs::read_to_string("/proc/self/maps").unwrap();
    maps.lines()
        .filter_map(|l| l.split_whitespace().nth(5))
        .find(|p| {
            let name = Path::new(p).file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.starts_with("libc.so") || (name.starts_with("libc-") && name.ends_with(".so"))
        })
        .expect("libc mapping")
        .into()
}

// The only test in this binary that changes the process cwd.
#[cfg(target_os = "linux")]
#[test]
fn chdir_mode_restores_previous_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let before = std::env::current_dir().unwrap();
    let bridge = Bridge::new(WorkDirMode::Chdir);

    let ok = bridge.run(&LaunchRequest::new(tmp.path(), "libc.so.6", ""), &mut quiet());
    assert!(ok.is_ok(), "{ok:?}");
    assert_eq!(std::env::current_dir().unwrap(), before);

    let failed = bridge.run(&LaunchRequest::new(tmp.path(), "nothere/lib.so", ""), &mut quiet());
    assert_eq!(status_of(&failed), STATUS_LOAD_FAILED);
    assert_eq!(std::env::current_dir().unwrap(), before);

    // Relative working dir + relative library: the library is found from the new cwd.
    std::fs::create_dir_all(tmp.path().join("vms/a/lib")).unwrap();
    std::os::unix::fs::symlink(mapped_libc(), tmp.path().join("vms/a/lib/libq.so")).unwrap();
    std::env::set_current_dir(tmp.path()).unwrap();
    let relative = bridge.run(&LaunchRequest::new("vms/a", "lib/libq.so", ""), &mut quiet());
    let after = std::env::current_dir().unwrap();
    std::env::set_current_dir(&before).unwrap();

    let report = relative.unwrap();
    assert_eq!(report.library, Path::new("lib/libq.so"));
    assert_eq!(after, tmp.path().canonicalize().unwrap());
}
