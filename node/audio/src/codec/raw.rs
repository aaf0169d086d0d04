//! Raw S16LE passthrough codec (component H), grounded on the wire's own
//! `Audio { payload: Vec<u8> }` framing (`shared/wire/src/message.rs`): the
//! "null" codec that every NetTrx implementation must support since it is
//! what a peer falls back to when no codec name is negotiated.

/// Encode/decode 16-bit signed little-endian PCM with no compression.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawCodec;

impl RawCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&mut self, pcm: &[i16], out: &mut Vec<u8>) {
        out.reserve(pcm.len() * 2);
        for sample in pcm {
            out.extend_from_slice(&sample.to_le_bytes());
        }
    }

    pub fn decode(&mut self, payload: &[u8], out: &mut Vec<i16>) {
        out.extend(
            payload
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]])),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_pcm() {
        let pcm = [0i16, 1, -1, i16::MAX, i16::MIN, 1234];
        let mut bytes = Vec::new();
        RawCodec::new().encode(&pcm, &mut bytes);
        let mut back = Vec::new();
        RawCodec::new().decode(&bytes, &mut back);
        assert_eq!(pcm.as_slice(), back.as_slice());
    }
}
