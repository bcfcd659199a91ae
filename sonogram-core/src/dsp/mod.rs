pub mod downmix;
pub mod magnitude;
pub mod spectrogram;
pub mod stft;
