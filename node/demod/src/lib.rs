//! Component K: FM, NBFM, WBFM, AM, NBAM, USB, LSB, CW demodulators
//! (spec §4.6). Each takes the channelizer's post-translate, pre-demod IQ
//! stream at the bandwidth class's nominal output rate and produces audio
//! at the internal rate (spec §3: 16 kHz, 8 kHz at compile time via
//! `rt-dsp`'s `audio-8khz` feature).

pub mod am;
pub mod cw;
pub mod decimate;
pub mod fm;
pub mod ssb;

pub use am::AmDemodulator;
pub use cw::CwDemodulator;
pub use fm::FmDemodulator;
pub use ssb::SsbDemodulator;

use rt_dsp::discriminator::FmParams;
use rt_dsp::IqSample;

/// The eight demodulation modes of spec §4.6, independent of wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemodMode {
    Fm,
    NbFm,
    WbFm,
    Am,
    NbAm,
    Usb,
    Lsb,
    Cw,
}

impl DemodMode {
    /// Per-mode translation offset applied by the channelizer's mixer
    /// before this demodulator ever sees a sample (spec §4.5 step 1):
    /// LSB +2000 Hz, USB -2000 Hz, CW +600 Hz, everything else 0.
    pub fn translate_offset_hz(self) -> i64 {
        match self {
            DemodMode::Lsb => 2_000,
            DemodMode::Usb => -2_000,
            DemodMode::Cw => 600,
            _ => 0,
        }
    }
}

pub enum Demodulator {
    Fm(FmDemodulator),
    Am(AmDemodulator),
    Ssb(SsbDemodulator),
    Cw(CwDemodulator),
}

impl Demodulator {
    pub fn new(mode: DemodMode, channel_rate: u32, audio_rate: u32) -> Self {
        match mode {
            DemodMode::Fm => Demodulator::Fm(FmDemodulator::new(FmParams::FM, channel_rate, audio_rate)),
            DemodMode::NbFm => Demodulator::Fm(FmDemodulator::new(FmParams::NBFM, channel_rate, audio_rate)),
            DemodMode::WbFm => Demodulator::Fm(FmDemodulator::new(FmParams::WBFM, channel_rate, audio_rate)),
            DemodMode::Am | DemodMode::NbAm => Demodulator::Am(AmDemodulator::new(channel_rate, audio_rate)),
            DemodMode::Usb | DemodMode::Lsb => Demodulator::Ssb(SsbDemodulator::new(channel_rate, audio_rate)),
            DemodMode::Cw => Demodulator::Cw(CwDemodulator::new(channel_rate, audio_rate)),
        }
    }

    pub fn process(&mut self, samples: &[IqSample]) -> Vec<f32> {
        match self {
            Demodulator::Fm(d) => d.process(samples),
            Demodulator::Am(d) => d.process(samples),
            Demodulator::Ssb(d) => d.process(samples),
            Demodulator::Cw(d) => d.process(samples),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_offsets_match_spec_table() {
        assert_eq!(DemodMode::Lsb.translate_offset_hz(), 2_000);
        assert_eq!(DemodMode::Usb.translate_offset_hz(), -2_000);
        assert_eq!(DemodMode::Cw.translate_offset_hz(), 600);
        assert_eq!(DemodMode::Fm.translate_offset_hz(), 0);
    }

    #[test]
    fn every_mode_constructs_and_processes_a_block() {
        for mode in [
            DemodMode::Fm,
            DemodMode::NbFm,
            DemodMode::WbFm,
            DemodMode::Am,
            DemodMode::NbAm,
            DemodMode::Usb,
            DemodMode::Lsb,
            DemodMode::Cw,
        ] {
            let mut d = Demodulator::new(mode, 16_000, 16_000);
            let out = d.process(&vec![IqSample::new(0.1, 0.0); 64]);
            assert_eq!(out.len(), 64);
        }
    }
}
