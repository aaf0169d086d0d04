//! Component F: Remote Rx proxy (spec §4.4, "Remote Rx").
//!
//! Pure state machine over inbound wire messages — no I/O of its own, so it
//! can be driven directly from `client_fsm::ClientEvent`s and unit-tested
//! without a socket.

use rt_wire::{CodecSelect, Message, Modulation, MuteState};

#[derive(Debug, Clone, PartialEq)]
pub enum RxEvent {
    SquelchOpen { siglev: f32, rx_id: u8 },
    SquelchClose,
    SignalLevelUpdated { siglev: f32, rx_id: u8 },
    Dtmf { digit: u8, duration_ms: i32 },
    Tone { freq_hz: f32 },
    Sel5 { digits: String },
    /// Encoded audio handed to the local decoder.
    AudioFrame { payload: Vec<u8> },
}

pub struct RemoteRx {
    codec: CodecSelect,
    mute_state: MuteState,
    freq_hz: u32,
    modulation: Modulation,
    squelch_open: bool,
    siglev: f32,
    rx_id: u8,
    /// Decoder still has samples in flight; a squelch close is deferred
    /// until `on_decoder_flushed` until those samples drain (spec §4.4).
    decoder_pending: bool,
    close_deferred: bool,
}

impl RemoteRx {
    pub fn new(codec: CodecSelect, freq_hz: u32, modulation: Modulation) -> Self {
        Self {
            codec,
            mute_state: MuteState::None,
            freq_hz,
            modulation,
            squelch_open: false,
            siglev: 0.0,
            rx_id: 0,
            decoder_pending: false,
            close_deferred: false,
        }
    }

    pub fn set_mute_state(&mut self, state: MuteState) {
        self.mute_state = state;
    }

    pub fn set_frequency(&mut self, hz: u32) {
        self.freq_hz = hz;
    }

    pub fn set_modulation(&mut self, modulation: Modulation) {
        self.modulation = modulation;
    }

    /// Messages to (re-)send once the connection reaches READY (spec §4.2
    /// client half step 2: "(re-)send any queued state", §4.4 "the
    /// configured codec selection with its options, current mute state,
    /// frequency, and modulation").
    pub fn on_ready(&self) -> Vec<Message> {
        vec![
            Message::RxAudioCodecSelect(self.codec.clone()),
            Message::SetMuteState(self.mute_state),
            Message::SetRxFq { hz: self.freq_hz },
            Message::SetRxModulation(self.modulation),
        ]
    }

    /// Feed one inbound wire message, appending any resulting high-level
    /// events to `out`.
    pub fn on_message(&mut self, msg: &Message, out: &mut Vec<RxEvent>) {
        match msg {
            Message::Squelch { is_open, siglev, rx_id } => {
                self.siglev = *siglev;
                self.rx_id = *rx_id;
                if *is_open && !self.squelch_open {
                    self.squelch_open = true;
                    self.close_deferred = false;
                    out.push(RxEvent::SquelchOpen { siglev: *siglev, rx_id: *rx_id });
                } else if !*is_open && self.squelch_open {
                    self.squelch_open = false;
                    if self.decoder_pending {
                        self.close_deferred = true;
                    } else {
                        out.push(RxEvent::SquelchClose);
                    }
                }
            }
            Message::SiglevUpdate { siglev, rx_id } => {
                self.siglev = *siglev;
                self.rx_id = *rx_id;
                out.push(RxEvent::SignalLevelUpdated { siglev: *siglev, rx_id: *rx_id });
            }
            Message::Dtmf { digit, duration_ms } => {
                if self.mute_state == MuteState::None {
                    out.push(RxEvent::Dtmf { digit: *digit, duration_ms: *duration_ms });
                }
            }
            Message::Tone { freq_hz } => {
                if self.mute_state == MuteState::None {
                    out.push(RxEvent::Tone { freq_hz: *freq_hz });
                }
            }
            Message::Sel5 { digits } => {
                if self.mute_state == MuteState::None {
                    out.push(RxEvent::Sel5 { digits: digits.clone() });
                }
            }
            Message::Audio { payload } => {
                if self.mute_state == MuteState::None && self.squelch_open {
                    self.decoder_pending = true;
                    out.push(RxEvent::AudioFrame { payload: payload.clone() });
                }
            }
            _ => {}
        }
    }

    /// The local audio decoder reports `allEncodedSamplesFlushed`.
    pub fn on_decoder_flushed(&mut self, out: &mut Vec<RxEvent>) {
        self.decoder_pending = false;
        if self.close_deferred {
            self.close_deferred = false;
            out.push(RxEvent::SquelchClose);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> CodecSelect {
        CodecSelect { name: "raw".into(), options: vec![] }
    }

    #[test]
    fn on_ready_resends_codec_mute_frequency_and_modulation() {
        let mut rx = RemoteRx::new(codec(), 145_000_000, Modulation::Fm);
        rx.set_mute_state(MuteState::Content);
        rx.set_frequency(146_520_000);
        rx.set_modulation(Modulation::NbFm);
        assert_eq!(
            rx.on_ready(),
            vec![
                Message::RxAudioCodecSelect(codec()),
                Message::SetMuteState(MuteState::Content),
                Message::SetRxFq { hz: 146_520_000 },
                Message::SetRxModulation(Modulation::NbFm),
            ]
        );
    }

    #[test]
    fn squelch_open_then_close_without_pending_audio() {
        let mut rx = RemoteRx::new(codec(), 145_000_000, Modulation::Fm);
        let mut events = Vec::new();
        rx.on_message(&Message::Squelch { is_open: true, siglev: 0.8, rx_id: 1 }, &mut events);
        rx.on_message(&Message::Squelch { is_open: false, siglev: 0.0, rx_id: 1 }, &mut events);
        assert_eq!(
            events,
            vec![RxEvent::SquelchOpen { siglev: 0.8, rx_id: 1 }, RxEvent::SquelchClose]
        );
    }

    #[test]
    fn squelch_close_deferred_until_decoder_flush() {
        let mut rx = RemoteRx::new(codec(), 145_000_000, Modulation::Fm);
        let mut events = Vec::new();
        rx.on_message(&Message::Squelch { is_open: true, siglev: 1.0, rx_id: 1 }, &mut events);
        rx.on_message(&Message::Audio { payload: vec![1, 2, 3] }, &mut events);
        rx.on_message(&Message::Squelch { is_open: false, siglev: 0.0, rx_id: 1 }, &mut events);
        assert!(!events.contains(&RxEvent::SquelchClose));

        rx.on_decoder_flushed(&mut events);
        assert!(events.contains(&RxEvent::SquelchClose));
    }

    #[test]
    fn dtmf_dropped_while_muted() {
        let mut rx = RemoteRx::new(codec(), 145_000_000, Modulation::Fm);
        rx.set_mute_state(MuteState::All);
        let mut events = Vec::new();
        rx.on_message(&Message::Dtmf { digit: b'5', duration_ms: 100 }, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn audio_dropped_when_squelch_closed() {
        let mut rx = RemoteRx::new(codec(), 145_000_000, Modulation::Fm);
        let mut events = Vec::new();
        rx.on_message(&Message::Audio { payload: vec![9] }, &mut events);
        assert!(events.is_empty());
    }
}
