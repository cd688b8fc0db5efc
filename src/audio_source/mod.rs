//! Audio-backed document sources.
//!
//! Turns a media URL into a transcript [`Document`](crate::document::Document)
//! by downloading the audio track and running it through a transcriber.

mod youtube;

pub use youtube::{extract_video_id, YoutubeTranscriber};
