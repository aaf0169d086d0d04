//! Frequency auto-placement (spec §4.5): given the set of frequencies every
//! registered DDR wants to receive, pick a tuner center frequency such that
//! all of them fit within `samplerate/2 - 12.5 kHz` of it, nudging away from
//! the DC spike that direct-conversion tuners always have at baseband.

const DC_GUARD_HZ: i64 = 12_500;
const EDGE_GUARD_HZ: i64 = 12_500;

/// Outcome of a placement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub center_hz: u32,
    /// Frequencies that fit within the tuner's usable span around `center_hz`.
    pub enabled: Vec<u32>,
    /// Frequencies dropped because the whole set didn't fit the tuner span.
    pub disabled: Vec<u32>,
}

/// Compute a center frequency for `freqs_hz` given a tuner `samplerate_hz`
/// (spec §4.5's placement algorithm). Returns `None` if `freqs_hz` is empty.
pub fn place(freqs_hz: &[u32], samplerate_hz: u32) -> Option<Placement> {
    if freqs_hz.is_empty() {
        return None;
    }

    let mut kept: Vec<i64> = freqs_hz.iter().map(|&f| f as i64).collect();
    kept.sort_unstable();
    let mut disabled = Vec::new();

    let max_span = samplerate_hz as i64 - 25_000;
    while kept.len() > 1 && (kept[kept.len() - 1] - kept[0]) > max_span {
        let gap_low = kept[1] - kept[0];
        let gap_high = kept[kept.len() - 1] - kept[kept.len() - 2];
        if gap_low >= gap_high {
            disabled.push(kept.remove(0) as u32);
        } else {
            disabled.push(kept.pop().unwrap() as u32);
        }
    }

    let min = kept[0];
    let max = *kept.last().unwrap();
    let span = max - min;
    let mut center = (min + max) / 2;

    let headroom = ((samplerate_hz as i64 - span) / 2).max(0);
    if let Some(&closest) = kept.iter().min_by_key(|&&f| (f - center).abs()).filter(|&&f| (f - center).abs() < DC_GUARD_HZ) {
        let diff = closest - center;
        let needed = DC_GUARD_HZ - diff.abs();
        let shift = needed.min(headroom);
        center -= if diff >= 0 { shift } else { -shift };
    }

    Some(Placement {
        center_hz: center as u32,
        enabled: kept.into_iter().map(|f| f as u32).collect(),
        disabled,
    })
}

/// Whether `freq_hz` fits within the tuner's usable span around `center_hz`
/// at the given `samplerate_hz` (used to decide whether a DDR should be
/// disabled after a re-placement).
pub fn fits(freq_hz: u32, center_hz: u32, samplerate_hz: u32) -> bool {
    let half = samplerate_hz as i64 / 2 - EDGE_GUARD_HZ;
    (freq_hz as i64 - center_hz as i64).abs() <= half
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frequency_centers_on_itself() {
        let p = place(&[100_000_000], 960_000).unwrap();
        assert_eq!(p.center_hz, 100_000_000);
        assert!(p.disabled.is_empty());
    }

    #[test]
    fn two_close_frequencies_center_at_midpoint() {
        let p = place(&[100_000_000, 100_100_000], 960_000).unwrap();
        assert_eq!(p.center_hz, 100_050_000);
        assert_eq!(p.enabled, vec![100_000_000, 100_100_000]);
    }

    #[test]
    fn out_of_span_endpoint_is_dropped() {
        // 960kHz tuner -> max_span = 935kHz. Third freq is far outside.
        let freqs = [100_000_000u32, 100_100_000, 102_000_000];
        let p = place(&freqs, 960_000).unwrap();
        assert_eq!(p.disabled, vec![102_000_000]);
        assert_eq!(p.enabled, vec![100_000_000, 100_100_000]);
    }

    #[test]
    fn frequency_near_dc_shifts_center_away() {
        // A single DDR sitting exactly at what would be DC must get nudged.
        let freqs = [100_000_000u32];
        let p = place(&freqs, 960_000).unwrap();
        // With only one frequency min==max==center, so it IS the center and
        // within the DC guard; center must shift by the guard amount.
        assert!((p.center_hz as i64 - 100_000_000).abs() >= DC_GUARD_HZ);
    }

    #[test]
    fn fits_checks_edge_guard() {
        assert!(fits(100_000_000, 100_000_000, 960_000));
        assert!(!fits(100_470_000, 100_000_000, 960_000)); // 470kHz > 468kHz edge
    }
}
