/// Sound cues: procedural 8-bit style effects via rodio.
///
/// Three cues, generated as in-memory WAV buffers at init time and
/// played fire-and-forget: a clean landing, a net catch, and the
/// end-of-session fanfare/dirge. Compile without the "sound" feature
/// for the silent stub.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_freed: Arc<Vec<u8>>,
        sfx_caught: Arc<Vec<u8>>,
        sfx_finished: Arc<Vec<u8>>,
        sfx_over: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_freed: Arc::new(make_wav(&gen_freed())),
                sfx_caught: Arc::new(make_wav(&gen_caught())),
                sfx_finished: Arc::new(make_wav(&gen_fanfare())),
                sfx_over: Arc::new(make_wav(&gen_dirge())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_freed(&self) { self.play(&self.sfx_freed); }
        pub fn play_caught(&self) { self.play(&self.sfx_caught); }
        pub fn play_finished(&self) { self.play(&self.sfx_finished); }
        pub fn play_over(&self) { self.play(&self.sfx_over); }
    }

    fn tone_run(notes: &[f32], note_dur: f32, gain: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * gain);
            }
        }
        samples
    }

    /// Clean landing: quick ascending blip pair
    fn gen_freed() -> Vec<f32> {
        tone_run(&[784.0, 1047.0], 0.06, 0.25) // G5→C6
    }

    /// Net catch: low descending buzz
    fn gen_caught() -> Vec<f32> {
        let duration = 0.2;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 - t * 120.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.7);
                ((ti * freq * TAU).sin() * 0.6 + (ti * freq * 1.5 * TAU).sin() * 0.4) * env * 0.3
            })
            .collect()
    }

    /// Game finished: ascending fanfare
    fn gen_fanfare() -> Vec<f32> {
        tone_run(&[523.0, 659.0, 784.0, 1047.0], 0.1, 0.3) // C5→E5→G5→C6
    }

    /// Game over: sad descending run
    fn gen_dirge() -> Vec<f32> {
        tone_run(&[440.0, 370.0, 311.0, 261.0], 0.12, 0.3) // A4→F#4→Eb4→C4
    }

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_freed(&self) {}
    pub fn play_caught(&self) {}
    pub fn play_finished(&self) {}
    pub fn play_over(&self) {}
}
