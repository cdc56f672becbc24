//! Watch directories for changes and print each event.
//!
//! Usage: cargo run --example watch -- [PATH ...]

#[cfg(target_os = "macos")]
fn main() {
    use std::time::Duration;

    use core_foundation::runloop::CFRunLoop;
    use fsevent_bridge::{flags, FsEventStream, OsStreamSystem, RunLoopHandle, RunLoopMode};

    let mut paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        paths.push(".".into());
    }
    println!("watching {:?} (Ctrl-C to quit)", paths);

    let stream = FsEventStream::create(
        OsStreamSystem,
        &paths,
        fsevent_bridge::EVENT_ID_SINCE_NOW,
        Duration::from_millis(300),
        flags::FILE_EVENTS | flags::NO_DEFER,
        |_, events| {
            for event in events {
                println!(
                    "{:>16} {:#010x} {}",
                    event.id,
                    event.flags,
                    event.path.display()
                );
            }
        },
    )
    .expect("failed to create the event stream");

    stream.schedule(RunLoopHandle::current(), RunLoopMode::Default);
    stream.start();
    CFRunLoop::run_current();
}

#[cfg(not(target_os = "macos"))]
fn main() {
    eprintln!("the watch example drives the FSEvents framework and only runs on macOS");
}
