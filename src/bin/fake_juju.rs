//! Fake juju binary for integration testing
//!
//! Understands just enough of the juju command line to let the harness run a
//! whole scenario without a cloud. Every invocation is appended to
//! `$FAKE_JUJU_LOG`; deployed applications are remembered under `$JUJU_HOME`
//! and reported as started by `status`.
//!
//! - `FAKE_JUJU_VERSION` overrides the reported version
//! - `FAKE_JUJU_FAIL=<command>` makes that command exit with status 1
//! - `FAKE_JUJU_HANG=<command>` makes that command sleep for a minute

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

const DEFAULT_VERSION: &str = "2.0.0-xenial-amd64";
const DEPLOYED_FILE: &str = "fake-juju-deployed";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--version") {
        let version =
            std::env::var("FAKE_JUJU_VERSION").unwrap_or_else(|_| DEFAULT_VERSION.to_string());
        println!("{version}");
        return;
    }

    record(&args);

    let Some(command) = args.iter().find(|a| !a.starts_with('-')) else {
        fail("no command given");
    };

    if std::env::var("FAKE_JUJU_FAIL").as_deref() == Ok(command.as_str()) {
        fail(&format!("fake failure in {command}"));
    }

    if std::env::var("FAKE_JUJU_HANG").as_deref() == Ok(command.as_str()) {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }

    match command.as_str() {
        "bootstrap" | "add-machine" | "kill-controller" | "destroy-environment" => {}
        "deploy" => {
            let charm = args.last().map(String::as_str).unwrap_or_default();
            let name = charm.rsplit('/').next().unwrap_or(charm);
            let mut deployed = OpenOptions::new()
                .create(true)
                .append(true)
                .open(state_dir().join(DEPLOYED_FILE))
                .unwrap_or_else(|e| fail(&format!("cannot record deploy: {e}")));
            writeln!(deployed, "{name}").ok();
        }
        "status" => print!("{}", status_yaml()),
        "debug-log" => println!("machine-0: 12:00:00 INFO juju.cmd running jujud"),
        other => fail(&format!("unrecognized command \"{other}\"")),
    }
}

fn record(args: &[String]) {
    let Ok(log) = std::env::var("FAKE_JUJU_LOG") else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log) {
        writeln!(file, "{}", args.join(" ")).ok();
    }
}

fn state_dir() -> PathBuf {
    match std::env::var_os("JUJU_HOME") {
        Some(home) => PathBuf::from(home),
        None => fail("JUJU_HOME is not set"),
    }
}

fn status_yaml() -> String {
    let deployed = std::fs::read_to_string(state_dir().join(DEPLOYED_FILE)).unwrap_or_default();

    let mut yaml = String::from("machines:\n  \"0\":\n    juju-status:\n      current: started\n");
    if deployed.trim().is_empty() {
        return yaml;
    }
    yaml.push_str("applications:\n");
    for name in deployed.lines() {
        yaml.push_str(&format!(
            "  {name}:\n    units:\n      {name}/0:\n        juju-status:\n          current: idle\n"
        ));
    }
    yaml
}

fn fail(message: &str) -> ! {
    eprintln!("ERROR {message}");
    std::process::exit(1);
}
