//! Post-demodulator decimation down to the internal audio rate (spec §4.6:
//! FM's discriminator output is "followed by a pair of decimators down to
//! 16 kHz" whenever the channelizer's bandwidth class doesn't already land
//! on the audio rate — the WIDE class used for WBFM is the case that needs
//! it; the narrower classes already output at 16 kHz).

use rt_dsp::fir::{design_lowpass, FirDecimator};

/// Build a cascade of at most two [`FirDecimator`] stages taking
/// `input_rate` down to `output_rate` exactly. Empty if the rates already
/// match.
pub fn build_cascade(input_rate: u32, output_rate: u32) -> Vec<FirDecimator<f32>> {
    if input_rate == output_rate {
        return Vec::new();
    }
    assert_eq!(input_rate % output_rate, 0, "{input_rate} is not an integer multiple of {output_rate}");
    let factor = (input_rate / output_rate) as usize;
    split_factor(factor)
        .into_iter()
        .map(|f| {
            let taps = if f <= 2 { 15 } else { 31 };
            FirDecimator::new(f, design_lowpass(f, taps))
        })
        .collect()
}

/// Split a decimation factor into at most two cascaded stages, biggest
/// factor first.
fn split_factor(factor: usize) -> Vec<usize> {
    if factor <= 4 {
        return vec![factor];
    }
    let sqrt = (factor as f64).sqrt() as usize;
    for d in 2..=sqrt {
        if factor % d == 0 {
            return vec![factor / d, d];
        }
    }
    vec![factor]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_rates_produce_no_stages() {
        assert!(build_cascade(16_000, 16_000).is_empty());
    }

    #[test]
    fn wide_to_audio_rate_splits_into_two_stages() {
        let stages = build_cascade(192_000, 16_000);
        let total: usize = stages.iter().map(|s| s.dec_fact()).product();
        assert_eq!(total, 12);
        assert!(stages.len() <= 2);
    }
}
