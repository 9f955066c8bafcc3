mod temp_audio_staging;

pub use temp_audio_staging::TempAudioStaging;
