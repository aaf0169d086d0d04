//! The message catalog (spec §6) and the payload encode/decode routines for
//! each variant. Variable-length fields use the `{u8 len, bytes}` convention
//! from spec §4.1; the codec-select option area is the fixed 256-byte region
//! described in §6.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{WireError, WireResult};

pub mod type_id {
    pub const PROTO_VER: u32 = 0;
    pub const HEARTBEAT: u32 = 1;
    pub const AUTH_CHALLENGE: u32 = 10;
    pub const AUTH_RESPONSE: u32 = 11;
    pub const AUTH_OK: u32 = 12;
    pub const RX_AUDIO_CODEC_SELECT: u32 = 100;
    pub const TX_AUDIO_CODEC_SELECT: u32 = 101;
    pub const AUDIO: u32 = 102;
    pub const SET_MUTE_STATE: u32 = 200;
    pub const ADD_TONE_DETECTOR: u32 = 201;
    pub const RESET: u32 = 202;
    pub const SET_RX_FQ: u32 = 203;
    pub const SET_RX_MODULATION: u32 = 204;
    pub const SQUELCH: u32 = 250;
    pub const DTMF: u32 = 251;
    pub const TONE: u32 = 252;
    pub const SEL5: u32 = 253;
    pub const SIGLEV_UPDATE: u32 = 254;
    pub const SET_TX_CTRL_MODE: u32 = 300;
    pub const ENABLE_CTCSS: u32 = 301;
    pub const SEND_DTMF: u32 = 302;
    pub const FLUSH: u32 = 303;
    pub const TRANSMITTED_SIGNAL_STRENGTH: u32 = 304;
    pub const SET_TX_FQ: u32 = 305;
    pub const SET_TX_MODULATION: u32 = 306;
    pub const TX_TIMEOUT: u32 = 350;
    pub const TRANSMITTER_STATE_CHANGE: u32 = 351;
    pub const ALL_SAMPLES_FLUSHED: u32 = 352;
}

/// Demodulation mode, shared by `SetRxModulation`/`SetTxModulation` and by
/// `rt-demod`/`rt-ddr` (component J/K).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Modulation {
    Fm = 0,
    NbFm = 1,
    WbFm = 2,
    Am = 3,
    NbAm = 4,
    Usb = 5,
    Lsb = 6,
    Cw = 7,
}

impl Modulation {
    pub fn from_u8(v: u8) -> WireResult<Self> {
        Ok(match v {
            0 => Modulation::Fm,
            1 => Modulation::NbFm,
            2 => Modulation::WbFm,
            3 => Modulation::Am,
            4 => Modulation::NbAm,
            5 => Modulation::Usb,
            6 => Modulation::Lsb,
            7 => Modulation::Cw,
            other => return Err(WireError::ProtocolFormat(format!("bad modulation {other}"))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MuteState {
    None = 0,
    Content = 1,
    All = 2,
}

impl MuteState {
    pub fn from_u8(v: u8) -> WireResult<Self> {
        Ok(match v {
            0 => MuteState::None,
            1 => MuteState::Content,
            2 => MuteState::All,
            other => return Err(WireError::ProtocolFormat(format!("bad mute state {other}"))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TxCtrlMode {
    Off = 0,
    On = 1,
    Auto = 2,
}

impl TxCtrlMode {
    pub fn from_u8(v: u8) -> WireResult<Self> {
        Ok(match v {
            0 => TxCtrlMode::Off,
            1 => TxCtrlMode::On,
            2 => TxCtrlMode::Auto,
            other => return Err(WireError::ProtocolFormat(format!("bad tx ctrl mode {other}"))),
        })
    }
}

/// A single codec option keyword/value pair, e.g. `("bitrate", "8000")`.
pub type CodecOption = (String, String);

const CODEC_NAME_LEN: usize = 32;
const CODEC_OPTIONS_AREA_LEN: usize = 256;
const SEL5_MAX_DIGITS: usize = 25;
const SEND_DTMF_MAX_DIGITS: usize = 256;
const AUDIO_MAX_BYTES: usize = 2048;

#[derive(Debug, Clone, PartialEq)]
pub struct CodecSelect {
    pub name: String,
    pub options: Vec<CodecOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ProtoVer { major: u16, minor: u16 },
    Heartbeat,
    AuthChallenge { nonce: [u8; 32] },
    AuthResponse { digest: [u8; 20] },
    AuthOk,
    RxAudioCodecSelect(CodecSelect),
    TxAudioCodecSelect(CodecSelect),
    Audio { payload: Vec<u8> },
    SetMuteState(MuteState),
    AddToneDetector { fq: f32, bw: i32, thresh: f32, required_ms: i32 },
    Reset,
    SetRxFq { hz: u32 },
    SetRxModulation(Modulation),
    Squelch { is_open: bool, siglev: f32, rx_id: u8 },
    Dtmf { digit: u8, duration_ms: i32 },
    Tone { freq_hz: f32 },
    Sel5 { digits: String },
    SiglevUpdate { siglev: f32, rx_id: u8 },
    SetTxCtrlMode(TxCtrlMode),
    EnableCtcss { enable: bool },
    SendDtmf { duration_ms: u32, digits: String },
    Flush,
    TransmittedSignalStrength { siglev: f32, rx_id: u8 },
    SetTxFq { hz: u32 },
    SetTxModulation(Modulation),
    TxTimeout,
    TransmitterStateChange { is_transmitting: bool },
    AllSamplesFlushed,
}

impl Message {
    pub fn type_id(&self) -> u32 {
        use type_id::*;
        match self {
            Message::ProtoVer { .. } => PROTO_VER,
            Message::Heartbeat => HEARTBEAT,
            Message::AuthChallenge { .. } => AUTH_CHALLENGE,
            Message::AuthResponse { .. } => AUTH_RESPONSE,
            Message::AuthOk => AUTH_OK,
            Message::RxAudioCodecSelect(_) => RX_AUDIO_CODEC_SELECT,
            Message::TxAudioCodecSelect(_) => TX_AUDIO_CODEC_SELECT,
            Message::Audio { .. } => AUDIO,
            Message::SetMuteState(_) => SET_MUTE_STATE,
            Message::AddToneDetector { .. } => ADD_TONE_DETECTOR,
            Message::Reset => RESET,
            Message::SetRxFq { .. } => SET_RX_FQ,
            Message::SetRxModulation(_) => SET_RX_MODULATION,
            Message::Squelch { .. } => SQUELCH,
            Message::Dtmf { .. } => DTMF,
            Message::Tone { .. } => TONE,
            Message::Sel5 { .. } => SEL5,
            Message::SiglevUpdate { .. } => SIGLEV_UPDATE,
            Message::SetTxCtrlMode(_) => SET_TX_CTRL_MODE,
            Message::EnableCtcss { .. } => ENABLE_CTCSS,
            Message::SendDtmf { .. } => SEND_DTMF,
            Message::Flush => FLUSH,
            Message::TransmittedSignalStrength { .. } => TRANSMITTED_SIGNAL_STRENGTH,
            Message::SetTxFq { .. } => SET_TX_FQ,
            Message::SetTxModulation(_) => SET_TX_MODULATION,
            Message::TxTimeout => TX_TIMEOUT,
            Message::TransmitterStateChange { .. } => TRANSMITTER_STATE_CHANGE,
            Message::AllSamplesFlushed => ALL_SAMPLES_FLUSHED,
        }
    }

    /// Encode the payload (header excluded) into `out`.
    pub fn encode_payload(&self, out: &mut BytesMut) {
        match self {
            Message::ProtoVer { major, minor } => {
                out.put_u16_le(*major);
                out.put_u16_le(*minor);
            }
            Message::Heartbeat | Message::AuthOk | Message::Reset | Message::Flush
            | Message::TxTimeout | Message::AllSamplesFlushed => {}
            Message::AuthChallenge { nonce } => out.put_slice(nonce),
            Message::AuthResponse { digest } => out.put_slice(digest),
            Message::RxAudioCodecSelect(cs) | Message::TxAudioCodecSelect(cs) => {
                encode_codec_select(cs, out);
            }
            Message::Audio { payload } => {
                out.put_u32_le(payload.len() as u32);
                out.put_slice(payload);
            }
            Message::SetMuteState(m) => out.put_u8(*m as u8),
            Message::AddToneDetector { fq, bw, thresh, required_ms } => {
                out.put_f32_le(*fq);
                out.put_i32_le(*bw);
                out.put_f32_le(*thresh);
                out.put_i32_le(*required_ms);
            }
            Message::SetRxFq { hz } => out.put_u32_le(*hz),
            Message::SetRxModulation(m) => out.put_u8(*m as u8),
            Message::Squelch { is_open, siglev, rx_id } => {
                out.put_u8(*is_open as u8);
                out.put_f32_le(*siglev);
                out.put_u8(*rx_id);
            }
            Message::Dtmf { digit, duration_ms } => {
                out.put_u8(*digit);
                out.put_i32_le(*duration_ms);
            }
            Message::Tone { freq_hz } => out.put_f32_le(*freq_hz),
            Message::Sel5 { digits } => encode_len_prefixed_str(digits, SEL5_MAX_DIGITS, out),
            Message::SiglevUpdate { siglev, rx_id } => {
                out.put_f32_le(*siglev);
                out.put_u8(*rx_id);
            }
            Message::SetTxCtrlMode(m) => out.put_u8(*m as u8),
            Message::EnableCtcss { enable } => out.put_u8(*enable as u8),
            Message::SendDtmf { duration_ms, digits } => {
                out.put_u32_le(*duration_ms);
                encode_len_prefixed_str(digits, SEND_DTMF_MAX_DIGITS, out);
            }
            Message::TransmittedSignalStrength { siglev, rx_id } => {
                out.put_f32_le(*siglev);
                out.put_u8(*rx_id);
            }
            Message::SetTxFq { hz } => out.put_u32_le(*hz),
            Message::SetTxModulation(m) => out.put_u8(*m as u8),
            Message::TransmitterStateChange { is_transmitting } => {
                out.put_u8(*is_transmitting as u8)
            }
        }
    }

    /// Decode a payload given its message type. `payload` excludes the header.
    pub fn decode(msg_type: u32, mut payload: &[u8]) -> WireResult<Self> {
        use type_id::*;
        Ok(match msg_type {
            PROTO_VER => {
                require_len(payload, 4)?;
                let major = payload.get_u16_le();
                let minor = payload.get_u16_le();
                Message::ProtoVer { major, minor }
            }
            HEARTBEAT => Message::Heartbeat,
            AUTH_CHALLENGE => {
                require_len(payload, 32)?;
                let mut nonce = [0u8; 32];
                nonce.copy_from_slice(&payload[..32]);
                Message::AuthChallenge { nonce }
            }
            AUTH_RESPONSE => {
                require_len(payload, 20)?;
                let mut digest = [0u8; 20];
                digest.copy_from_slice(&payload[..20]);
                Message::AuthResponse { digest }
            }
            AUTH_OK => Message::AuthOk,
            RX_AUDIO_CODEC_SELECT => Message::RxAudioCodecSelect(decode_codec_select(payload)?),
            TX_AUDIO_CODEC_SELECT => Message::TxAudioCodecSelect(decode_codec_select(payload)?),
            AUDIO => {
                require_len(payload, 4)?;
                let len = payload.get_u32_le() as usize;
                if len > AUDIO_MAX_BYTES {
                    return Err(WireError::ProtocolFormat(format!(
                        "audio frame of {len} bytes exceeds {AUDIO_MAX_BYTES}"
                    )));
                }
                require_len(payload, len)?;
                Message::Audio { payload: payload[..len].to_vec() }
            }
            SET_MUTE_STATE => {
                require_len(payload, 1)?;
                Message::SetMuteState(MuteState::from_u8(payload.get_u8())?)
            }
            ADD_TONE_DETECTOR => {
                require_len(payload, 16)?;
                let fq = payload.get_f32_le();
                let bw = payload.get_i32_le();
                let thresh = payload.get_f32_le();
                let required_ms = payload.get_i32_le();
                Message::AddToneDetector { fq, bw, thresh, required_ms }
            }
            RESET => Message::Reset,
            SET_RX_FQ => {
                require_len(payload, 4)?;
                Message::SetRxFq { hz: payload.get_u32_le() }
            }
            SET_RX_MODULATION => {
                require_len(payload, 1)?;
                Message::SetRxModulation(Modulation::from_u8(payload.get_u8())?)
            }
            SQUELCH => {
                require_len(payload, 6)?;
                let is_open = payload.get_u8() != 0;
                let siglev = payload.get_f32_le();
                let rx_id = payload.get_u8();
                Message::Squelch { is_open, siglev, rx_id }
            }
            DTMF => {
                require_len(payload, 5)?;
                let digit = payload.get_u8();
                let duration_ms = payload.get_i32_le();
                Message::Dtmf { digit, duration_ms }
            }
            TONE => {
                require_len(payload, 4)?;
                Message::Tone { freq_hz: payload.get_f32_le() }
            }
            SEL5 => Message::Sel5 { digits: decode_len_prefixed_str(payload, SEL5_MAX_DIGITS)? },
            SIGLEV_UPDATE => {
                require_len(payload, 5)?;
                let siglev = payload.get_f32_le();
                let rx_id = payload.get_u8();
                Message::SiglevUpdate { siglev, rx_id }
            }
            SET_TX_CTRL_MODE => {
                require_len(payload, 1)?;
                Message::SetTxCtrlMode(TxCtrlMode::from_u8(payload.get_u8())?)
            }
            ENABLE_CTCSS => {
                require_len(payload, 1)?;
                Message::EnableCtcss { enable: payload.get_u8() != 0 }
            }
            SEND_DTMF => {
                require_len(payload, 4)?;
                let duration_ms = payload.get_u32_le();
                let digits = decode_len_prefixed_str(payload, SEND_DTMF_MAX_DIGITS)?;
                Message::SendDtmf { duration_ms, digits }
            }
            FLUSH => Message::Flush,
            TRANSMITTED_SIGNAL_STRENGTH => {
                require_len(payload, 5)?;
                let siglev = payload.get_f32_le();
                let rx_id = payload.get_u8();
                Message::TransmittedSignalStrength { siglev, rx_id }
            }
            SET_TX_FQ => {
                require_len(payload, 4)?;
                Message::SetTxFq { hz: payload.get_u32_le() }
            }
            SET_TX_MODULATION => {
                require_len(payload, 1)?;
                Message::SetTxModulation(Modulation::from_u8(payload.get_u8())?)
            }
            TX_TIMEOUT => Message::TxTimeout,
            TRANSMITTER_STATE_CHANGE => {
                require_len(payload, 1)?;
                Message::TransmitterStateChange { is_transmitting: payload.get_u8() != 0 }
            }
            ALL_SAMPLES_FLUSHED => Message::AllSamplesFlushed,
            other => return Err(WireError::UnknownType(other)),
        })
    }
}

fn require_len(payload: &[u8], n: usize) -> WireResult<()> {
    if payload.len() < n {
        return Err(WireError::ProtocolFormat(format!(
            "payload of {} bytes too short for field of {n} bytes",
            payload.len()
        )));
    }
    Ok(())
}

fn encode_len_prefixed_str(s: &str, max: usize, out: &mut BytesMut) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(max).min(u8::MAX as usize);
    out.put_u8(n as u8);
    out.put_slice(&bytes[..n]);
}

fn decode_len_prefixed_str(mut payload: &[u8], max: usize) -> WireResult<String> {
    require_len(payload, 1)?;
    let len = payload.get_u8() as usize;
    if len > max {
        return Err(WireError::ProtocolFormat(format!("string length {len} exceeds max {max}")));
    }
    require_len(payload, len)?;
    String::from_utf8(payload[..len].to_vec())
        .map_err(|e| WireError::ProtocolFormat(format!("invalid utf8: {e}")))
}

fn encode_codec_select(cs: &CodecSelect, out: &mut BytesMut) {
    let mut name_area = [0u8; CODEC_NAME_LEN];
    let name_bytes = cs.name.as_bytes();
    let n = name_bytes.len().min(CODEC_NAME_LEN);
    name_area[..n].copy_from_slice(&name_bytes[..n]);
    out.put_slice(&name_area);

    out.put_u8(cs.options.len().min(u8::MAX as usize) as u8);

    let mut area = [0u8; CODEC_OPTIONS_AREA_LEN];
    let mut cursor = 0usize;
    for (k, v) in &cs.options {
        let kb = k.as_bytes();
        let vb = v.as_bytes();
        let entry_len = 1 + kb.len() + 1 + vb.len();
        if cursor + entry_len > CODEC_OPTIONS_AREA_LEN || kb.len() > u8::MAX as usize || vb.len() > u8::MAX as usize {
            break;
        }
        area[cursor] = kb.len() as u8;
        cursor += 1;
        area[cursor..cursor + kb.len()].copy_from_slice(kb);
        cursor += kb.len();
        area[cursor] = vb.len() as u8;
        cursor += 1;
        area[cursor..cursor + vb.len()].copy_from_slice(vb);
        cursor += vb.len();
    }
    out.put_slice(&area);
}

fn decode_codec_select(mut payload: &[u8]) -> WireResult<CodecSelect> {
    require_len(payload, CODEC_NAME_LEN + 1 + CODEC_OPTIONS_AREA_LEN)?;
    let name_area = &payload[..CODEC_NAME_LEN];
    let nul = name_area.iter().position(|&b| b == 0).unwrap_or(CODEC_NAME_LEN);
    let name = String::from_utf8_lossy(&name_area[..nul]).into_owned();
    payload.advance(CODEC_NAME_LEN);

    let option_cnt = payload.get_u8() as usize;
    let area = &payload[..CODEC_OPTIONS_AREA_LEN];

    let mut options = Vec::with_capacity(option_cnt);
    let mut cursor = 0usize;
    for _ in 0..option_cnt {
        if cursor >= area.len() {
            break;
        }
        let klen = area[cursor] as usize;
        cursor += 1;
        if cursor + klen > area.len() {
            break;
        }
        let k = String::from_utf8_lossy(&area[cursor..cursor + klen]).into_owned();
        cursor += klen;
        if cursor >= area.len() {
            break;
        }
        let vlen = area[cursor] as usize;
        cursor += 1;
        if cursor + vlen > area.len() {
            break;
        }
        let v = String::from_utf8_lossy(&area[cursor..cursor + vlen]).into_owned();
        cursor += vlen;
        options.push((k, v));
    }

    Ok(CodecSelect { name, options })
}
