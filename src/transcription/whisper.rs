//! Local Whisper transcription with candle.

use super::mel::mel_filters;
use super::{format_timestamp, Transcriber, Transcript, TranscriptSegment};
use crate::audio::decode_to_pcm;
use crate::config::TranscriptionSettings;
use crate::error::{Result, SamleError};
use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Language codes known to multilingual Whisper checkpoints, in token order.
const LANGUAGES: &[&str] = &[
    "en", "zh", "de", "es", "ru", "ko", "fr", "ja", "pt", "tr", "pl", "ca", "nl", "ar", "sv",
    "it", "id", "hi", "fi", "vi", "he", "uk", "el", "ms", "cs", "ro", "da", "hu", "ta", "no",
    "th", "ur", "hr", "bg", "lt", "la", "mi", "ml", "cy", "sk", "te", "fa", "lv", "bn", "sr",
    "az", "sl", "kn", "et", "mk", "br", "eu", "is", "hy", "ne", "mn", "bs", "kk", "sq", "sw",
    "gl", "mr", "pa", "si", "km", "sn", "yo", "so", "af", "oc", "ka", "be", "tg", "sd", "gu",
    "am", "yi", "lo", "uz", "fo", "ht", "ps", "tk", "nn", "mt", "sa", "lb", "my", "bo", "tl",
    "mg", "as", "tt", "haw", "ln", "ha", "ba", "jw", "su",
];

/// Whisper model, tokenizer and front end, loaded once.
struct WhisperModel {
    model: m::model::Whisper,
    config: Config,
    tokenizer: Tokenizer,
    mel_filters: Vec<f32>,
    device: Device,
}

impl WhisperModel {
    /// Download (or reuse from the hf-hub cache) and load a checkpoint.
    fn load(repo_id: &str) -> Result<Self> {
        let device = Device::Cpu;
        info!(repo = repo_id, "Loading Whisper model");

        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| SamleError::ModelLoad(format!("hf-hub init: {e}")))?;
        let repo = api.model(repo_id.to_string());

        let config_path = repo
            .get("config.json")
            .map_err(|e| SamleError::ModelLoad(format!("config.json from {repo_id}: {e}")))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| SamleError::ModelLoad(format!("tokenizer.json from {repo_id}: {e}")))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| SamleError::ModelLoad(format!("model.safetensors from {repo_id}: {e}")))?;

        let config: Config = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| SamleError::ModelLoad(format!("tokenizer: {e}")))?;

        // SAFETY: the weights file comes from the hf-hub cache and is not
        // modified while the mapping is alive
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| SamleError::ModelLoad(format!("weights: {e}")))?
        };
        let model = m::model::Whisper::load(&vb, config.clone())?;
        let mel_filters = mel_filters(m::SAMPLE_RATE, m::N_FFT, config.num_mel_bins);

        info!("Whisper model loaded");
        Ok(Self {
            model,
            config,
            tokenizer,
            mel_filters,
            device,
        })
    }

    fn token_id(&self, token: &str) -> Result<u32> {
        self.tokenizer
            .token_to_id(token)
            .ok_or_else(|| SamleError::Transcription(format!("token {token} not in tokenizer")))
    }

    /// Additive logit mask removing tokens the model must never emit.
    fn suppress_mask(&self) -> Result<Tensor> {
        let mask: Vec<f32> = (0..self.config.vocab_size as u32)
            .map(|i| {
                if self.config.suppress_tokens.contains(&i) {
                    f32::NEG_INFINITY
                } else {
                    0.0
                }
            })
            .collect();
        Ok(Tensor::new(mask.as_slice(), &self.device)?)
    }

    /// Pick the most likely language token for the first window.
    ///
    /// Returns `None` for checkpoints without language tokens.
    fn detect_language(&mut self, mel: &Tensor) -> Result<Option<(String, u32)>> {
        let candidates: Vec<(&str, u32)> = LANGUAGES
            .iter()
            .filter_map(|code| {
                self.tokenizer
                    .token_to_id(&format!("<|{code}|>"))
                    .map(|id| (*code, id))
            })
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }

        let sot = self.token_id(m::SOT_TOKEN)?;
        let (_, _, frames) = mel.dims3()?;
        let window = mel.narrow(2, 0, frames.min(m::N_FRAMES))?;

        self.model.reset_kv_cache();
        let features = self.model.encoder.forward(&window, true)?;
        let tokens = Tensor::new(&[[sot]], &self.device)?;
        let ys = self.model.decoder.forward(&tokens, &features, true)?;
        let logits = self.model.decoder.final_linear(&ys.i(..1)?)?.i(0)?.i(0)?;

        let ids: Vec<u32> = candidates.iter().map(|(_, id)| *id).collect();
        let ids = Tensor::new(ids.as_slice(), &self.device)?;
        let best = logits
            .index_select(&ids, 0)?
            .argmax(D::Minus1)?
            .to_scalar::<u32>()? as usize;

        let (code, id) = candidates[best];
        info!("Detected language: {}", code);
        Ok(Some((code.to_string(), id)))
    }

    /// Greedy decode of one mel window into text.
    fn decode_window(
        &mut self,
        mel: &Tensor,
        prompt: &[u32],
        eot: u32,
        suppress: &Tensor,
    ) -> Result<String> {
        self.model.reset_kv_cache();
        let features = self.model.encoder.forward(mel, true)?;
        let max_tokens = self.config.max_target_positions / 2;

        let mut tokens = prompt.to_vec();
        for i in 0..max_tokens {
            let input = Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?;
            let ys = self.model.decoder.forward(&input, &features, i == 0)?;
            let (_, seq_len, _) = ys.dims3()?;
            let logits = self
                .model
                .decoder
                .final_linear(&ys.i((..1, seq_len - 1..))?)?
                .i(0)?
                .i(0)?
                .broadcast_add(suppress)?;
            let next = logits.argmax(D::Minus1)?.to_scalar::<u32>()?;
            if next == eot {
                break;
            }
            tokens.push(next);
        }

        let text = self
            .tokenizer
            .decode(&tokens[prompt.len()..], true)
            .map_err(|e| SamleError::Transcription(format!("decode: {e}")))?;
        Ok(text.trim().to_string())
    }

    /// Transcribe 16 kHz mono samples window by window.
    fn transcribe_pcm(&mut self, pcm: &[f32], language: Option<&str>) -> Result<Transcript> {
        let n_mels = self.config.num_mel_bins;
        let mel = m::audio::pcm_to_mel(&self.config, pcm, &self.mel_filters);
        let mel_len = mel.len() / n_mels;
        let mel = Tensor::from_vec(mel, (1, n_mels, mel_len), &self.device)?;
        // pcm_to_mel pads with silence; only frames backed by audio are decoded
        let content_frames = (pcm.len() / m::HOP_LENGTH).min(mel_len);

        let sot = self.token_id(m::SOT_TOKEN)?;
        let transcribe = self.token_id(m::TRANSCRIBE_TOKEN)?;
        let no_timestamps = self.token_id(m::NO_TIMESTAMPS_TOKEN)?;
        let eot = self.token_id(m::EOT_TOKEN)?;

        let language = match language {
            Some(code) => Some((code.to_string(), self.token_id(&format!("<|{code}|>"))?)),
            None => self.detect_language(&mel)?,
        };

        let mut prompt = vec![sot];
        if let Some((_, token)) = &language {
            prompt.push(*token);
        }
        prompt.extend([transcribe, no_timestamps]);
        let suppress = self.suppress_mask()?;

        let windows = content_frames.div_ceil(m::N_FRAMES);
        let pb = ProgressBar::new(windows as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );

        let frame_seconds = m::HOP_LENGTH as f64 / m::SAMPLE_RATE as f64;
        let mut segments = Vec::new();
        let mut seek = 0;
        while seek < content_frames {
            let window = mel.narrow(2, seek, m::N_FRAMES.min(mel_len - seek))?;
            let start = seek as f64 * frame_seconds;
            let end = (seek + m::N_FRAMES).min(content_frames) as f64 * frame_seconds;

            let text = self.decode_window(&window, &prompt, eot, &suppress)?;
            debug!(
                "[{} - {}] {}",
                format_timestamp(start),
                format_timestamp(end),
                text
            );
            if !text.is_empty() {
                segments.push(TranscriptSegment::new(start, end, text));
            }

            seek += m::N_FRAMES;
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(Transcript::new(segments, language.map(|(code, _)| code)))
    }
}

/// Whisper transcriber running on the CPU.
///
/// The checkpoint is fetched and loaded on the first call to
/// [`Transcriber::transcribe`] and reused afterwards.
pub struct WhisperTranscriber {
    repo_id: String,
    language: Option<String>,
    model: OnceCell<Arc<Mutex<WhisperModel>>>,
}

impl WhisperTranscriber {
    /// Create a transcriber for a Hugging Face Whisper repository.
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            language: None,
            model: OnceCell::new(),
        }
    }

    /// Create a transcriber from the `[transcription]` settings.
    pub fn from_settings(settings: &TranscriptionSettings) -> Self {
        Self::new(settings.model.clone()).with_language(settings.language.clone())
    }

    /// Fix the spoken language instead of detecting it. Blank means detect.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty());
        self
    }

    async fn model(&self) -> Result<Arc<Mutex<WhisperModel>>> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let repo_id = self.repo_id.clone();
                let loaded = tokio::task::spawn_blocking(move || WhisperModel::load(&repo_id))
                    .await
                    .map_err(|e| SamleError::ModelLoad(e.to_string()))??;
                Ok::<_, SamleError>(Arc::new(Mutex::new(loaded)))
            })
            .await?;
        Ok(Arc::clone(model))
    }
}

impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("repo_id", &self.repo_id)
            .field("language", &self.language)
            .field("loaded", &self.model.initialized())
            .finish()
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        let model = self.model().await?;
        let path = audio_path.to_path_buf();
        let language = self.language.clone();

        info!("Transcribing with {}", self.repo_id);
        let transcript = tokio::task::spawn_blocking(move || {
            let pcm = decode_to_pcm(&path)?;
            let mut model = model
                .lock()
                .map_err(|e| SamleError::Transcription(format!("lock: {e}")))?;
            model.transcribe_pcm(&pcm, language.as_deref())
        })
        .await
        .map_err(|e| SamleError::Transcription(e.to_string()))??;

        info!(
            "Transcribed {} segments ({})",
            transcript.segments.len(),
            format_timestamp(transcript.duration_seconds)
        );
        Ok(transcript)
    }
}
