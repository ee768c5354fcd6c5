// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommands of the `labelwerk` binary.  Each one maps onto a single
// operation of the client library and prints a plain-text summary to stdout.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tracing::info;

use labelwerk_client::{Image, Printer, Session};
use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::types::ImageId;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the images queued on the label
    List,
    /// Upload an image file
    Upload { path: PathBuf },
    /// Delete one image
    Delete { id: String },
    /// Delete every image
    Clear,
    /// Toggle colour inversion of an image
    Invert { id: String },
    /// Set the black/white threshold of an image (0-255)
    Threshold { id: String, value: u8 },
    /// Show printer state
    Printer {
        /// Re-query the physical device instead of the cached state
        #[arg(long)]
        refresh: bool,
    },
    /// Print the current label
    Print,
    /// Save a PNG preview of the label, or of one image with --id
    Preview {
        out: PathBuf,
        #[arg(long)]
        id: Option<String>,
    },
    /// Show the resolved configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

/// Run a subcommand that talks to the label server.
pub async fn run(command: Command, session: &Session) -> Result<()> {
    match command {
        Command::List => {
            let images = Image::list(session).await?;
            if images.is_empty() {
                println!("no images queued");
            }
            for image in &images {
                println!("{}", image_row(image));
            }
        }

        Command::Upload { path } => {
            let file_name = file_name(&path)?;
            let bytes = tokio::fs::read(&path).await?;
            let image = Image::upload(session, bytes, &file_name).await?;
            println!("{}", image_row(&image));
        }

        Command::Delete { id } => {
            let mut image = Image::find(session, &ImageId::new(id)).await?;
            image.delete().await?;
            println!("deleted {}", image.id());
        }

        Command::Clear => {
            Image::delete_all(session).await?;
            println!("all images deleted");
        }

        Command::Invert { id } => {
            let mut image = Image::find(session, &ImageId::new(id)).await?;
            image.invert().await?;
            println!("{}", image_row(&image));
        }

        Command::Threshold { id, value } => {
            let mut image = Image::find(session, &ImageId::new(id)).await?;
            image.set_threshold(value).await?;
            println!("{}", image_row(&image));
        }

        Command::Printer { refresh } => {
            let printer = if refresh {
                Printer::refresh(session).await?
            } else {
                Printer::get(session).await?
            };
            print!("{}", printer_summary(&printer));
        }

        Command::Print => {
            Printer::print(session).await?;
            println!("print job accepted");
        }

        Command::Preview { out, id } => {
            let png = match id {
                Some(id) => Image::find(session, &ImageId::new(id)).await?.fetch_png().await?,
                None => session.fetch_preview().await?,
            };
            tokio::fs::write(&out, &png).await?;
            info!(path = %out.display(), len = png.len(), "preview written");
            println!("wrote {}", out.display());
        }

        // Handled before a session exists.
        Command::Config { .. } => {}
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| LabelwerkError::upload(format!("'{}' is not a file", path.display())))
}

fn image_row(image: &Image) -> String {
    format!(
        "{id}  {name}  {dims} (orig {orig})  {len:.1}mm  threshold={threshold}  inverted={inverted}",
        id = image.id(),
        name = image.file_name(),
        dims = image.dimensions(),
        orig = image.original_dimensions(),
        len = image.length_mm(),
        threshold = image.threshold(),
        inverted = image.inverted(),
    )
}

fn printer_summary(printer: &Printer) -> String {
    format!(
        "model:       {}\n\
         resolution:  {} dpi\n\
         print head:  {} px ({:.1} mm)\n\
         media:       {} {}\n\
         colours:     {} on {}\n\
         as of:       {}\n",
        printer.ty(),
        printer.dpi(),
        printer.max_pixels(),
        printer.max_width_mm(),
        printer.media_type(),
        printer.media_width(),
        printer.text_color(),
        printer.tape_color(),
        printer.fetched_at().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
