//! Component J step 2 (decimate): the bandwidth-class cascade table of
//! spec §4.5, grounded on `original_source/src/svxlink/trx/Ddr.cpp`'s
//! anonymous-namespace `Channelizer960`/`Channelizer2400` classes — each
//! multistage `DecimatorMS4`/`DecimatorMS5` chain there corresponds to one
//! [`BandwidthClass`] cascade here, built from [`rt_dsp::fir`] instead of
//! transcribing the original's coefficient tables (spec §1 Non-goals:
//! "an implementer chooses equivalent filters").

use num_complex::Complex32;

use rt_demod::DemodMode;
use rt_dsp::fir::{design_lowpass, design_lowpass_norm, FirDecimator};
use rt_dsp::TunerRate;

/// The six channel bandwidth classes of spec §4.5's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthClass {
    Wide,
    Bw20k,
    Bw10k,
    Bw6k,
    Bw3k,
    Bw500,
}

impl BandwidthClass {
    /// Per-modulation bandwidth class, grounded on `Ddr::Channel::setModulation`
    /// in `Ddr.cpp` (FM->20k, NBFM->10k, WBFM->wide, AM->10k, NBAM->6k,
    /// USB/LSB->3k, CW->500).
    pub fn for_mode(mode: DemodMode) -> Self {
        match mode {
            DemodMode::Fm => BandwidthClass::Bw20k,
            DemodMode::NbFm => BandwidthClass::Bw10k,
            DemodMode::WbFm => BandwidthClass::Wide,
            DemodMode::Am => BandwidthClass::Bw10k,
            DemodMode::NbAm => BandwidthClass::Bw6k,
            DemodMode::Usb | DemodMode::Lsb => BandwidthClass::Bw3k,
            DemodMode::Cw => BandwidthClass::Bw500,
        }
    }

    /// Nominal 3 dB channel bandwidth in Hz (spec §4.5 table); `None` for
    /// `Wide`, which has no dedicated channel filter (spec table only gives
    /// a lower bound "≥ 150 kHz" there — the multirate cascade's own
    /// anti-alias response is the only shaping applied).
    fn nominal_bw_hz(self) -> Option<f64> {
        match self {
            BandwidthClass::Wide => None,
            BandwidthClass::Bw20k => Some(20_000.0),
            BandwidthClass::Bw10k => Some(10_000.0),
            BandwidthClass::Bw6k => Some(6_000.0),
            BandwidthClass::Bw3k => Some(3_000.0),
            BandwidthClass::Bw500 => Some(500.0),
        }
    }

    /// Nominal output sample rate for this class at the given tuner rate
    /// (spec §4.5 table: WIDE is 192 kHz at 960 kHz tuner rate, 160 kHz at
    /// 2.4 MHz; BW_20K is 32 kHz; everything narrower is 16 kHz).
    pub fn output_rate_hz(self, tuner_rate: TunerRate) -> u32 {
        match self {
            BandwidthClass::Wide => match tuner_rate {
                TunerRate::Hz960k => 192_000,
                TunerRate::Hz2_4M => 160_000,
            },
            BandwidthClass::Bw20k => 32_000,
            BandwidthClass::Bw10k | BandwidthClass::Bw6k | BandwidthClass::Bw3k | BandwidthClass::Bw500 => 16_000,
        }
    }

    /// The decimation-factor cascade (multirate stages first, channel filter
    /// last) for this class at `tuner_rate`, mirroring `Channelizer960`'s and
    /// `Channelizer2400`'s `setBw` tables in `Ddr.cpp`.
    fn dec_factors(self, tuner_rate: TunerRate) -> &'static [usize] {
        match (tuner_rate, self) {
            (TunerRate::Hz960k, BandwidthClass::Wide) => &[5],
            (TunerRate::Hz960k, BandwidthClass::Bw20k) => &[5, 3, 2, 1],
            (TunerRate::Hz960k, _) => &[5, 4, 3, 1],
            (TunerRate::Hz2_4M, BandwidthClass::Wide) => &[3, 5],
            (TunerRate::Hz2_4M, BandwidthClass::Bw20k) => &[3, 5, 5, 1],
            (TunerRate::Hz2_4M, _) => &[3, 5, 5, 2, 1],
        }
    }

    /// Build the full channelizer cascade: one [`FirDecimator`] per entry of
    /// [`Self::dec_factors`], with the final (always `dec_fact == 1` unless
    /// this class is `Wide`) stage shaped to this class's nominal channel
    /// bandwidth instead of a generic multirate anti-alias response.
    pub fn build_cascade(self, tuner_rate: TunerRate) -> Vec<FirDecimator<Complex32>> {
        let factors = self.dec_factors(tuner_rate);
        let mut rate = tuner_rate.as_hz();
        let mut stages = Vec::with_capacity(factors.len());
        for (i, &factor) in factors.iter().enumerate() {
            let is_last = i == factors.len() - 1;
            let stage = if is_last && factor == 1 {
                let bw = self.nominal_bw_hz().expect("dec_fact 1 final stage only used for channel-filtered classes");
                let taps = 63;
                FirDecimator::new(1, design_lowpass_norm((bw / rate as f64).min(0.45), taps))
            } else {
                let taps = if factor <= 3 { 15 } else { 31 };
                FirDecimator::new(factor, design_lowpass(factor, taps))
            };
            rate /= factor as u32;
            stages.push(stage);
        }
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_rate_matches_spec_table() {
        assert_eq!(BandwidthClass::Wide.output_rate_hz(TunerRate::Hz960k), 192_000);
        assert_eq!(BandwidthClass::Wide.output_rate_hz(TunerRate::Hz2_4M), 160_000);
        assert_eq!(BandwidthClass::Bw20k.output_rate_hz(TunerRate::Hz960k), 32_000);
        assert_eq!(BandwidthClass::Bw10k.output_rate_hz(TunerRate::Hz960k), 16_000);
        assert_eq!(BandwidthClass::Bw6k.output_rate_hz(TunerRate::Hz2_4M), 16_000);
        assert_eq!(BandwidthClass::Bw3k.output_rate_hz(TunerRate::Hz2_4M), 16_000);
        assert_eq!(BandwidthClass::Bw500.output_rate_hz(TunerRate::Hz960k), 16_000);
    }

    #[test]
    fn mode_to_class_matches_original_switch() {
        assert_eq!(BandwidthClass::for_mode(DemodMode::Fm), BandwidthClass::Bw20k);
        assert_eq!(BandwidthClass::for_mode(DemodMode::NbFm), BandwidthClass::Bw10k);
        assert_eq!(BandwidthClass::for_mode(DemodMode::WbFm), BandwidthClass::Wide);
        assert_eq!(BandwidthClass::for_mode(DemodMode::Am), BandwidthClass::Bw10k);
        assert_eq!(BandwidthClass::for_mode(DemodMode::NbAm), BandwidthClass::Bw6k);
        assert_eq!(BandwidthClass::for_mode(DemodMode::Usb), BandwidthClass::Bw3k);
        assert_eq!(BandwidthClass::for_mode(DemodMode::Lsb), BandwidthClass::Bw3k);
        assert_eq!(BandwidthClass::for_mode(DemodMode::Cw), BandwidthClass::Bw500);
    }

    #[test]
    fn cascade_decimation_product_matches_output_rate() {
        for (rate, class) in [
            (TunerRate::Hz960k, BandwidthClass::Wide),
            (TunerRate::Hz960k, BandwidthClass::Bw20k),
            (TunerRate::Hz960k, BandwidthClass::Bw10k),
            (TunerRate::Hz2_4M, BandwidthClass::Wide),
            (TunerRate::Hz2_4M, BandwidthClass::Bw20k),
            (TunerRate::Hz2_4M, BandwidthClass::Bw500),
        ] {
            let cascade = class.build_cascade(rate);
            let total_dec: usize = cascade.iter().map(|s| s.dec_fact()).product();
            assert_eq!(rate.as_hz() / total_dec as u32, class.output_rate_hz(rate));
        }
    }

    #[test]
    fn feeding_a_block_through_the_cascade_yields_the_output_rate_length() {
        let cascade_len_factor: usize =
            BandwidthClass::Bw10k.build_cascade(TunerRate::Hz960k).iter().map(|s| s.dec_fact()).product();
        let mut stages = BandwidthClass::Bw10k.build_cascade(TunerRate::Hz960k);
        let mut block = vec![Complex32::new(1.0, 0.0); 960];
        for stage in stages.iter_mut() {
            block = stage.process(&block);
        }
        assert_eq!(block.len(), 960 / cascade_len_factor);
    }
}
