mod audio_decoder;
mod candle_whisper_engine;

pub use audio_decoder::{TARGET_SAMPLE_RATE, decode_audio_file};
pub use candle_whisper_engine::{CandleWhisperEngine, resolve_model_id};
