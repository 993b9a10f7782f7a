/// Procedural sound effects via rodio.
///
/// Every effect is a short note sequence rendered to an in-memory WAV
/// buffer once, at startup. Playback is fire-and-forget.
///
/// Without the `sound` feature the stub engine below does nothing.

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    pub(super) const SAMPLE_RATE: u32 = 22050;

    /// Harmonic mix of a note: (multiple of base frequency, weight).
    pub(super) type Timbre = &'static [(f32, f32)];

    const PURE: Timbre = &[(1.0, 1.0)];
    const BRIGHT: Timbre = &[(1.0, 0.7), (3.0, 0.3)];
    const BRASS: Timbre = &[(1.0, 0.6), (2.0, 0.3), (3.0, 0.1)];
    const REEDY: Timbre = &[(1.0, 0.5), (2.0, 0.25), (5.0, 0.25)];

    #[derive(Clone, Copy)]
    pub(super) struct Note {
        freq: f32,
        secs: f32,
    }

    const fn note(freq: f32, secs: f32) -> Note {
        Note { freq, secs }
    }

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        coin: Arc<Vec<u8>>,
        bump: Arc<Vec<u8>>,
        win: Arc<Vec<u8>>,
        lose: Arc<Vec<u8>>,
        error: Arc<Vec<u8>>,
        command: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let bake = |samples: Vec<f32>| Arc::new(make_wav(&samples));

            Some(SoundEngine {
                _stream: stream,
                handle,
                // E6 → B6, a quick "ding"
                coin: bake(render(&[note(1319.0, 0.04), note(1976.0, 0.07)], BRIGHT, 0.25)),
                // low dull knock against the map edge
                bump: bake(render(&[note(110.0, 0.06)], REEDY, 0.3)),
                // C5 E5 G5 C6, last note held
                win: bake(render(
                    &[note(523.0, 0.09), note(659.0, 0.09), note(784.0, 0.09), note(1047.0, 0.3)],
                    BRASS,
                    0.3,
                )),
                // G4 Eb4 C4, slow and falling
                lose: bake(render(&[note(392.0, 0.16), note(311.0, 0.16), note(262.0, 0.35)], PURE, 0.3)),
                error: bake(render(&[note(180.0, 0.07), note(150.0, 0.09)], REEDY, 0.25)),
                command: bake(render(&[note(880.0, 0.025)], PURE, 0.15)),
            })
        }

        fn play(&self, wav: &Arc<Vec<u8>>) {
            let Ok(sink) = Sink::try_new(&self.handle) else {
                return;
            };
            if let Ok(src) = rodio::Decoder::new(Cursor::new(wav.as_ref().clone())) {
                sink.append(src);
                sink.detach();
            }
        }

        pub fn play_coin(&self) { self.play(&self.coin); }
        pub fn play_bump(&self) { self.play(&self.bump); }
        pub fn play_win(&self) { self.play(&self.win); }
        pub fn play_lose(&self) { self.play(&self.lose); }
        pub fn play_error(&self) { self.play(&self.error); }
        pub fn play_command(&self) { self.play(&self.command); }
    }

    // ── Synthesis ──

    /// Notes back to back, each with its own attack/decay envelope.
    pub(super) fn render(notes: &[Note], timbre: Timbre, volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for n in notes {
            let len = (SAMPLE_RATE as f32 * n.secs) as usize;
            let attack = (len / 20).max(1);
            for i in 0..len {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = if i < attack {
                    i as f32 / attack as f32
                } else {
                    1.0 - ((i - attack) as f32 / (len - attack) as f32).powf(0.7)
                };
                let wave: f32 = timbre
                    .iter()
                    .map(|(mult, weight)| (t * n.freq * mult * TAU).sin() * weight)
                    .sum();
                out.push(wave * env * volume);
            }
        }
        out
    }

    /// 16-bit mono PCM WAV.
    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        const HEADER_LEN: u32 = 44;
        let data_len = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity((HEADER_LEN + data_len) as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(HEADER_LEN - 8 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            buf.extend_from_slice(&((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    pub(super) fn test_note(freq: f32, secs: f32) -> Note {
        note(freq, secs)
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_coin(&self) {}
    pub fn play_bump(&self) {}
    pub fn play_win(&self) {}
    pub fn play_lose(&self) {}
    pub fn play_error(&self) {}
    pub fn play_command(&self) {}
}
