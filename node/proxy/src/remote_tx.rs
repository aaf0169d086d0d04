//! Component G: Remote Tx proxy (spec §4.4, "Remote Tx").
//!
//! Owns the paced-audio-encoder-facing half of the session: turns local
//! encoded frames into `Audio`/`Flush` wire messages and tracks the
//! `isTransmitting` latch across disconnects in `TX_AUTO` mode.

use rt_wire::{CodecSelect, Message, TxCtrlMode};

pub struct RemoteTx {
    codec: CodecSelect,
    ctrl_mode: TxCtrlMode,
    connected: bool,
    is_transmitting: bool,
    pending_flush: bool,
}

impl RemoteTx {
    pub fn new(codec: CodecSelect) -> Self {
        Self { codec, ctrl_mode: TxCtrlMode::Off, connected: false, is_transmitting: false, pending_flush: false }
    }

    pub fn is_transmitting(&self) -> bool {
        self.is_transmitting
    }

    /// Messages to (re-)announce on READY (spec §4.2: "preferred codec with
    /// options").
    pub fn on_ready(&mut self) -> Vec<Message> {
        self.connected = true;
        vec![Message::TxAudioCodecSelect(self.codec.clone()), Message::SetTxCtrlMode(self.ctrl_mode)]
    }

    pub fn on_disconnected(&mut self) {
        self.connected = false;
    }

    pub fn set_ctrl_mode(&mut self, mode: TxCtrlMode) -> Option<Message> {
        self.ctrl_mode = mode;
        self.connected.then_some(Message::SetTxCtrlMode(mode))
    }

    /// A block of locally encoded audio is ready to go out. While
    /// disconnected and in `TX_AUTO`, the proxy asserts `isTransmitting`
    /// itself, without any wire confirmation (spec §4.4).
    pub fn on_audio_encoded(&mut self, payload: Vec<u8>) -> Vec<Message> {
        if !self.connected {
            if self.ctrl_mode == TxCtrlMode::Auto {
                self.is_transmitting = true;
            }
            return Vec::new();
        }
        self.pending_flush = true;
        vec![Message::Audio { payload }]
    }

    /// The local audio stream went idle; flush any pending transmit.
    pub fn on_stream_idle(&mut self) -> Option<Message> {
        if self.connected && self.pending_flush {
            self.pending_flush = false;
            Some(Message::Flush)
        } else {
            None
        }
    }

    /// `AllSamplesFlushed` arrived from the hub. Returns `true` if the
    /// caller should raise `transmitterStateChange(false)` locally.
    pub fn on_all_samples_flushed(&mut self) -> bool {
        self.pending_flush = false;
        if !self.connected && self.ctrl_mode == TxCtrlMode::Auto && self.is_transmitting {
            self.is_transmitting = false;
            true
        } else {
            false
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
    fn disconnected_tx_auto_asserts_transmitting_locally() {
        let mut tx = RemoteTx::new(codec());
        tx.set_ctrl_mode(TxCtrlMode::Auto);
        assert!(!tx.is_transmitting());
        let msgs = tx.on_audio_encoded(vec![1, 2, 3]);
        assert!(msgs.is_empty());
        assert!(tx.is_transmitting());
    }

    #[test]
    fn flushed_while_disconnected_clears_transmitting() {
        let mut tx = RemoteTx::new(codec());
        tx.set_ctrl_mode(TxCtrlMode::Auto);
        tx.on_audio_encoded(vec![1]);
        assert!(tx.is_transmitting());
        assert!(tx.on_all_samples_flushed());
        assert!(!tx.is_transmitting());
    }

    #[test]
    fn connected_audio_sets_pending_flush_and_idle_emits_flush() {
        let mut tx = RemoteTx::new(codec());
        tx.on_ready();
        let msgs = tx.on_audio_encoded(vec![9, 9]);
        assert_eq!(msgs, vec![Message::Audio { payload: vec![9, 9] }]);
        assert_eq!(tx.on_stream_idle(), Some(Message::Flush));
        assert_eq!(tx.on_stream_idle(), None);
    }
}
