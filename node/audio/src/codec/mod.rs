//! Component H: named audio codec plug-ins with keyed options, dispatched
//! from the wire's [`rt_wire::message::CodecSelect`] the way
//! `RxAudioCodecSelect`/`TxAudioCodecSelect` name a codec by string plus
//! an option list (spec §4.1, §6 msg 100/101). Kept as one tagged enum
//! rather than a trait object, following the same "dynamic factory ->
//! closed enum" redesign direction used for the siglev detector family.

pub mod adpcm;
pub mod raw;
pub mod ulaw;

use rt_wire::message::CodecSelect;

pub use adpcm::AdpcmCodec;
pub use raw::RawCodec;
pub use ulaw::UlawCodec;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unknown codec name {0:?}")]
    UnknownCodec(String),
}

pub enum AudioCodec {
    Raw(RawCodec),
    Ulaw(UlawCodec),
    Adpcm(AdpcmCodec),
}

impl AudioCodec {
    /// Build the codec named by a peer's `CodecSelect`. Recognized names
    /// are case-insensitive: `"RAW"`, `"S16"` (raw aliases), `"ULAW"`,
    /// `"G711U"` (µ-law aliases), `"ADPCM"`, `"IMA"` (ADPCM aliases).
    /// Option keys are not interpreted beyond presence/absence here; a
    /// caller wiring `<CODEC>_ENC_`/`<CODEC>_DEC_` config keys (spec §6.1)
    /// applies them before or after construction as the codec permits.
    pub fn from_select(select: &CodecSelect) -> Result<Self, CodecError> {
        match select.name.to_ascii_uppercase().as_str() {
            "RAW" | "S16" => Ok(AudioCodec::Raw(RawCodec::new())),
            "ULAW" | "G711U" => Ok(AudioCodec::Ulaw(UlawCodec::new())),
            "ADPCM" | "IMA" => Ok(AudioCodec::Adpcm(AdpcmCodec::new())),
            other => Err(CodecError::UnknownCodec(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AudioCodec::Raw(_) => "RAW",
            AudioCodec::Ulaw(_) => "ULAW",
            AudioCodec::Adpcm(_) => "ADPCM",
        }
    }

    pub fn encode(&mut self, pcm: &[i16], out: &mut Vec<u8>) {
        match self {
            AudioCodec::Raw(c) => c.encode(pcm, out),
            AudioCodec::Ulaw(c) => c.encode(pcm, out),
            AudioCodec::Adpcm(c) => c.encode(pcm, out),
        }
    }

    pub fn decode(&mut self, payload: &[u8], out: &mut Vec<i16>) {
        match self {
            AudioCodec::Raw(c) => c.decode(payload, out),
            AudioCodec::Ulaw(c) => c.decode(payload, out),
            AudioCodec::Adpcm(c) => c.decode(payload, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_names_case_insensitively() {
        let select = CodecSelect {
            name: "ulaw".to_string(),
            options: vec![],
        };
        let codec = AudioCodec::from_select(&select).unwrap();
        assert_eq!(codec.name(), "ULAW");
    }

    #[test]
    fn rejects_unknown_names() {
        let select = CodecSelect {
            name: "GSM".to_string(),
            options: vec![],
        };
        assert!(AudioCodec::from_select(&select).is_err());
    }
}
