//! Stdin/stdout transport for local use.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use colored::Colorize;
use log::info;

use super::{ChatTransport, MESSAGE_LIMIT};
use crate::error::{TransportError, TransportResult};

/// Prints replies to stdout and writes images into a directory.
pub struct ConsoleTransport {
    image_dir: Option<PathBuf>,
    images: AtomicUsize,
}

impl ConsoleTransport {
    /// Create a transport. Images are discarded when `image_dir` is `None`.
    pub fn new(image_dir: Option<PathBuf>) -> Self {
        Self {
            image_dir,
            images: AtomicUsize::new(0),
        }
    }

    fn print(&self, text: &str) -> TransportResult<()> {
        let chars = text.chars().count();
        if chars > MESSAGE_LIMIT {
            return Err(TransportError::TooLong(chars));
        }
        let mut out = std::io::stdout().lock();
        writeln!(out, "{} {text}", "arcana>".magenta().bold())?;
        out.flush()?;
        Ok(())
    }

    async fn save_image(&self, png: &[u8]) -> TransportResult<Option<PathBuf>> {
        let Some(dir) = &self.image_dir else {
            return Ok(None);
        };
        tokio::fs::create_dir_all(dir).await?;
        let n = self.images.fetch_add(1, Ordering::SeqCst) + 1;
        let path = dir.join(format!(
            "reading-{}-{n:03}.png",
            chrono::Utc::now().format("%Y%m%d%H%M%S")
        ));
        tokio::fs::write(&path, png).await?;
        info!("wrote spread image to {}", path.display());
        Ok(Some(path))
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn reply(&self, text: &str, image: Option<&[u8]>) -> TransportResult<()> {
        self.print(text)?;
        if let Some(png) = image {
            match self.save_image(png).await? {
                Some(path) => println!("{} {}", "image:".cyan(), path.display()),
                None => println!("{} {} bytes not saved", "image:".cyan(), png.len()),
            }
        }
        Ok(())
    }

    async fn send_followup(&self, text: &str) -> TransportResult<()> {
        self.print(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn images_land_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ConsoleTransport::new(Some(dir.path().join("out")));
        transport.reply("hello", Some(b"png-bytes")).await.unwrap();
        transport.reply("again", Some(b"more")).await.unwrap();
        let files: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .collect();
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn oversize_messages_are_refused() {
        let transport = ConsoleTransport::new(None);
        let text = "x".repeat(MESSAGE_LIMIT + 1);
        assert!(matches!(
            transport.send_followup(&text).await,
            Err(TransportError::TooLong(_))
        ));
    }
}
