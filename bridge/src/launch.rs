//! Host-side launch flow: assets, library lookup, argv, bridge call.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;

use crate::assets::QemuInstall;
use crate::bridge::{Bridge, LaunchRequest, LineSink, LoadReport};
use crate::cmdline;
use crate::config::Config;
use crate::profiles::Profile;

pub fn install_for(cfg: &Config) -> QemuInstall {
    QemuInstall::new(&cfg.native_lib_dir, &cfg.cache_dir)
}

/// Extract assets if an archive is configured. Returns whether anything was written.
pub fn prepare_assets(cfg: &Config, sink: &mut dyn LineSink) -> Result<bool> {
    let Some(zip) = &cfg.assets_zip else { return Ok(false) };
    let file = File::open(zip).with_context(|| format!("opening asset archive {}", zip.display()))?;
    install_for(cfg).extract_assets(BufReader::new(file), sink)
}

pub fn build_request(cfg: &Config, profile: &Profile) -> LaunchRequest {
    let install = install_for(cfg);
    let resource_path = install.resource_path();
    let expanded = cmdline::expand_vars(&profile.cmdline, |name| match name {
        "qemu.path" => Some(resource_path.display().to_string()),
        "vm.path" => Some(profile.working_dir.clone()),
        "system.arch" => Some(profile.arch.clone()),
        other => profile.vars.get(other).cloned(),
    });
    let argv = cmdline::qemu_argv(&resource_path, &cmdline::tokenize(&expanded));
    tracing::debug!(arch = %profile.arch, ?argv, "qemu argv");
    LaunchRequest::new(&profile.working_dir, install.binary_path(&profile.arch), cmdline::stringify(&argv).join(" "))
}

pub fn launch(cfg: &Config, profile: &Profile, sink: &mut dyn LineSink) -> Result<LoadReport> {
    prepare_assets(cfg, sink)?;
    let req = build_request(cfg, profile);
    tracing::info!(arch = %profile.arch, library = %req.library.display(), "launching");
    let report = Bridge::new(cfg.workdir_mode)
        .run(&req, sink)
        .with_context(|| format!("running qemu-system-{}", profile.arch))?;
    Ok(report)
}
