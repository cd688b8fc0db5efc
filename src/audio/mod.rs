//! Audio acquisition.
//!
//! Fetches the audio track behind a URL into a local file that the
//! transcriber can read.

mod decode;
mod downloader;

pub use decode::{decode_to_pcm, resample};
pub use downloader::{AudioDownloader, YtDlpDownloader, AUDIO_FILE_STEM};
