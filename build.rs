// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: artifact references
fn refs_arg(help: &'static str) -> Arg {
    Arg::new("refs")
        .required(true)
        .num_args(1..)
        .value_name("REF")
        .help(help)
}

fn build_cli() -> Command {
    Command::new("plugdeps")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Plugdeps Contributors")
        .about("Resolve plugin dependency closures and check versions against known advisories")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Hide download progress bars"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file (default: ~/.config/plugdeps/config.toml)"),
        )
        .arg(
            Arg::new("cache_dir")
                .long("cache-dir")
                .value_name("DIR")
                .global(true)
                .help("Artifact cache directory (default: a temporary directory)"),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Report fatal errors as warnings and exit successfully"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .global(true)
                .help("Parallel downloads per resolution batch"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .value_name("N")
                .global(true)
                .help("Download attempts before giving up"),
        )
        .arg(
            Arg::new("connect_timeout")
                .long("connect-timeout")
                .value_name("SECS")
                .global(true)
                .help("Connect timeout in seconds"),
        )
        .subcommand(
            Command::new("versions")
                .about("List or navigate published versions of artifacts")
                .alias("plugin-versions")
                .arg(refs_arg("Artifact references (name[:version]); use \"core\" for the host application"))
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .value_parser(["all", "latest", "next", "prev", "secure"])
                        .default_value("all")
                        .help("Selection mode"),
                ),
        )
        .subcommand(
            Command::new("last-secure")
                .about("Print the first version above every known advisory")
                .arg(
                    Arg::new("names")
                        .required(true)
                        .num_args(1..)
                        .value_name("NAME")
                        .help("Artifact names"),
                ),
        )
        .subcommand(
            Command::new("is-vulnerable")
                .about("Check references against the advisory feed")
                .arg(refs_arg("Artifact references (name[:version])")),
        )
        .subcommand(
            Command::new("resolve-deps")
                .about("Compute the mandatory dependency closure of a set of plugins")
                .arg(refs_arg("Plugin references (name[:version]); versioned references are pins"))
                .arg(
                    Arg::new("fix")
                        .long("fix")
                        .action(ArgAction::SetTrue)
                        .help("Keep dependencies that exceed a pin instead of failing"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("plugdeps.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
