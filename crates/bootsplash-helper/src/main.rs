mod dispatch;

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use bootsplash_core::{ActionReply, ActionRequest, HelperMessage};
use bootsplash_installer::HelperLayout;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::dispatch::dispatch;

#[derive(Parser, Debug)]
#[command(name = "bootsplash-helper")]
#[command(
    about = "Privileged helper that installs, removes, and activates boot splash themes",
    long_about = None
)]
struct Cli {
    /// Directory holding one subdirectory per installed theme.
    #[arg(long, default_value = "/usr/share/bootsplash/themes")]
    themes_root: PathBuf,
    /// Config store carrying the active theme setting.
    #[arg(long, default_value = "/etc/bootsplash/bootsplash.conf")]
    config: PathBuf,
    /// Command run to regenerate the boot image after a theme switch.
    #[arg(long, default_value = "/usr/sbin/update-initramfs")]
    rebuild_command: PathBuf,
}

/// One invocation serves one action: the broker writes a single JSON
/// request to stdin and reads newline-delimited JSON messages from stdout.
/// Logs go to stderr so stdout stays a clean protocol channel.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = HelperLayout::new(cli.themes_root, cli.config, cli.rebuild_command);

    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read action request from stdin")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let reply = match serde_json::from_str::<ActionRequest>(raw.trim()) {
        Ok(request) => dispatch(&request, &layout, &mut |data| {
            // fire-and-forget: a broker that stopped reading must not fail
            // the action itself
            let _ = write_message(
                &mut out,
                &HelperMessage::Progress { data: data.clone() },
            );
        }),
        Err(err) => ActionReply::backend_error(format!("malformed action request: {err}")),
    };

    write_message(&mut out, &HelperMessage::Reply { reply })
}

fn write_message(out: &mut impl Write, message: &HelperMessage) -> Result<()> {
    let line = serde_json::to_string(message).context("failed to serialize helper message")?;
    writeln!(out, "{line}").context("failed to write helper message")?;
    out.flush().context("failed to flush helper message")
}
