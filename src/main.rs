mod cancel;
mod cell_render;
mod ffmpeg;
mod pipeline;
mod pixel_grid;
mod still;
mod term_fit;
mod video;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cancel::CancelFlag;
use crate::cell_render::{HIDE_CURSOR, RESET, SHOW_CURSOR};

#[derive(Debug, Parser)]
#[command(name = "tvr")]
#[command(about = "Plays images and video as truecolor cells in the terminal")]
struct Cli {
    /// Image or video file to render
    source: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Anything that decodes as a static image renders once and returns;
    // everything else goes to the streaming video path.
    if let Some(image) = still::try_decode(&cli.source)? {
        return still::render(image);
    }

    let cancel = CancelFlag::new();
    cancel::install_interrupt_handler(&cancel)?;

    // The cursor stays hidden only for the duration of playback, and is
    // restored even when the pipeline stops on an error or Ctrl-C.
    print!("{HIDE_CURSOR}");
    io::stdout().flush()?;

    let played = video::play(&cli.source, cancel);

    print!("{SHOW_CURSOR}{RESET}");
    io::stdout().flush()?;

    played
}
