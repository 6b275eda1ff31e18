use anyhow::{bail, Context, Result};
use skadivm_bridge::bridge::{Bridge, LaunchRequest};
use skadivm_bridge::console::ConsoleSink;
use skadivm_bridge::profiles::{self, Profile};
use skadivm_bridge::workdir::WorkDirMode;
use skadivm_bridge::{config, launch, logging, menu};

#[derive(Default)]
struct Cli {
    config: Option<String>,
    profile: Option<String>,
    arch: Option<String>,
    lib: Option<String>,
    workdir: Option<String>,
    cmdline: Option<String>,
    chdir: bool,
    list_archs: bool,
    extract: bool,
}

fn parse_args() -> Result<Cli> {
    let mut cli = Cli::default();
    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        let mut value = |flag: &str| args.next().with_context(|| format!("{flag} needs a value"));
        match a.as_str() {
            "--profile" => cli.profile = Some(value("--profile")?),
            "--arch" => cli.arch = Some(value("--arch")?),
            "--lib" => cli.lib = Some(value("--lib")?),
            "--workdir" => cli.workdir = Some(value("--workdir")?),
            "--cmdline" => cli.cmdline = Some(value("--cmdline")?),
            "--chdir" => cli.chdir = true,
            "--list-archs" => cli.list_archs = true,
            "--extract" => cli.extract = true,
            other if other.starts_with("--") => bail!("unknown option: {other}"),
            path if cli.config.is_none() => cli.config = Some(path.to_string()),
            extra => bail!("unexpected argument: {extra}"),
        }
    }
    Ok(cli)
}

fn run() -> Result<()> {
    logging::init();

    // No args: interactive operator console with default install layout
    if std::env::args().len() == 1 {
        return menu::run_operator_menu(&config::Config::default());
    }

    let cli = parse_args()?;
    let mut cfg = match &cli.config {
        Some(path) => config::load(path).with_context(|| format!("loading config {path}"))?,
        None => config::Config::default(),
    };
    if cli.chdir {
        cfg.workdir_mode = WorkDirMode::Chdir;
    }
    let mut sink = ConsoleSink::stdout("qemu");

    if cli.list_archs {
        for arch in launch::install_for(&cfg).architectures()? {
            println!("{arch}");
        }
        return Ok(());
    }
    if cli.extract {
        let done = launch::prepare_assets(&cfg, &mut sink)?;
        println!("{}", if done { "assets extracted" } else { "assets up to date" });
        return Ok(());
    }

    // Explicit library path: bypass install layout and asset handling.
    if let Some(lib) = &cli.lib {
        let req = LaunchRequest::new(
            cli.workdir.as_deref().unwrap_or("."),
            lib,
            cli.cmdline.clone().unwrap_or_default(),
        );
        let report = Bridge::new(cfg.workdir_mode).run(&req, &mut sink)?;
        println!("released {} (exports main: {})", report.library.display(), report.exports_main);
        return Ok(());
    }

    let mut profile = match &cli.profile {
        Some(path) => profiles::load_profile(path)?,
        None => Profile::default(),
    };
    if let Some(arch) = cli.arch { profile.arch = arch; }
    if let Some(dir) = cli.workdir { profile.working_dir = dir; }
    if let Some(cmdline) = cli.cmdline { profile.cmdline = cmdline; }

    let report = launch::launch(&cfg, &profile, &mut sink)?;
    println!("released {} (exports main: {})", report.library.display(), report.exports_main);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}
