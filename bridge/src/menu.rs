// Interactive operator console for driving the bridge from a terminal.

use anyhow::{bail, Result};
use dialoguer::{theme::ColorfulTheme, Input, Select};

use crate::config::Config;
use crate::console::ConsoleSink;
use crate::launch;
use crate::profiles::{self, Profile};

pub fn run_operator_menu(cfg: &Config) -> Result<()> {
    banner();
    let theme = ColorfulTheme::default();

    let picked = Select::with_theme(&theme)
        .with_prompt("Action")
        .items(&ACTIONS)
        .default(0)
        .interact()?;
    let Some(action) = Action::from_index(picked) else { return Ok(()) };

    let profile = match action {
        Action::LoadProfile => load_or_prompt(&theme, cfg)?,
        _ => prompt_profile(&theme, cfg)?,
    };

    if action == Action::SaveProfile {
        let path = ask_path(&theme, "Save profile path (YAML)")?;
        match profiles::save_profile(&path, &profile) {
            Ok(()) => println!("Saved profile: {path}"),
            Err(e) => eprintln!("Failed to save profile: {e}"),
        }
    }

    println!("\n[+] Loading QEMU...");
    println!("Arch      : {}", profile.arch);
    println!("Work dir  : {}", profile.working_dir);
    println!("Cmdline   : {}", profile.cmdline);

    let report = launch::launch(cfg, &profile, &mut ConsoleSink::stdout("qemu"))?;
    println!("Released  : {} (exports main: {})", report.library.display(), report.exports_main);
    Ok(())
}

const ACTIONS: [&str; 4] = ["Launch", "Load profile", "Save profile", "Exit"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Launch,
    LoadProfile,
    SaveProfile,
}

impl Action {
    /// `None` means Exit.
    fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Action::Launch),
            1 => Some(Action::LoadProfile),
            2 => Some(Action::SaveProfile),
            _ => None,
        }
    }
}

fn ask_path(theme: &ColorfulTheme, prompt: &str) -> Result<String> {
    Ok(Input::with_theme(theme).with_prompt(prompt).default("profile.yaml".to_string()).interact_text()?)
}

// A profile that fails to load falls back to the interactive prompts.
fn load_or_prompt(theme: &ColorfulTheme, cfg: &Config) -> Result<Profile> {
    let path = ask_path(theme, "Profile path (YAML)")?;
    match profiles::load_profile(&path) {
        Ok(p) => {
            println!("Loaded profile: {path}");
            Ok(p)
        }
        Err(e) => {
            eprintln!("Failed to load profile: {e}");
            prompt_profile(theme, cfg)
        }
    }
}

fn prompt_profile(theme: &ColorfulTheme, cfg: &Config) -> Result<Profile> {
    let defaults = Profile::default();
    let archs = launch::install_for(cfg).architectures()?;
    if archs.is_empty() {
        bail!("no libqemu-system-*.so found in {}", cfg.native_lib_dir.display());
    }
    let default_idx = archs.iter().position(|a| *a == defaults.arch).unwrap_or(0);
    let arch_idx = Select::with_theme(theme)
        .with_prompt("Choose architecture")
        .items(&archs)
        .default(default_idx)
        .interact()?;

    let working_dir: String = Input::with_theme(theme)
        .with_prompt("VM working directory")
        .default(defaults.working_dir)
        .validate_with(|s: &String| -> Result<(), &str> { if std::path::Path::new(s).is_dir() { Ok(()) } else { Err("not a directory") } })
        .interact_text()?;

    let cmdline: String = Input::with_theme(theme)
        .with_prompt("QEMU arguments")
        .default(defaults.cmdline)
        .allow_empty(true)
        .interact_text()?;

    Ok(Profile { arch: archs[arch_idx].clone(), working_dir, cmdline, vars: Default::default() })
}

fn banner() {
    println!("\x1b[1;36m[ SkadiVM - in-process QEMU ]\x1b[0m\n\x1b[90m=============================\x1b[0m");
}
