//! TCP tuner source speaking the `rtl_tcp` wire protocol (spec §4.5
//! component I), grounded on `original_source/src/svxlink/trx/RtlTcp.{h,cpp}`:
//! a 12-byte dongle-info header on connect, 5-byte `{u8 cmd, u32 be param}`
//! commands, and an unframed stream of interleaved 8-bit unsigned I/Q pairs.

use async_trait::async_trait;
use num_complex::Complex32;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::iq::{IqSample, IqSource, SdrError, SdrResult};

const DONGLE_HEADER_LEN: usize = 12;
const TARGET_READ_CHUNK_SAMPLES: usize = 16 * 1024;

/// Read-chunk size for `sample_rate`, rounded up to a multiple of the
/// largest total decimation factor any `BandwidthClass` cascade uses at
/// that tuner rate (60 at 960 kHz, 150 at 2.4 MHz). Every cascade stage
/// requires its input length to be a multiple of its own decimation factor
/// (`FirDecimator::process` asserts this), and since a shared tuner feeds
/// every registered DDR's cascade from the same block, the block handed to
/// `recv`'s caller must divide evenly for all of them, not just the one
/// that happens to be under test.
fn read_chunk_samples(sample_rate: u32) -> usize {
    let multiple = match sample_rate {
        960_000 => 60,
        2_400_000 => 150,
        _ => 1,
    };
    multiple * TARGET_READ_CHUNK_SAMPLES.div_ceil(multiple)
}

mod cmd {
    pub const SET_FREQUENCY: u8 = 0x01;
    pub const SET_SAMPLE_RATE: u8 = 0x02;
    pub const SET_GAIN_MODE: u8 = 0x03;
    pub const SET_GAIN: u8 = 0x04;
    pub const SET_FREQ_CORRECTION: u8 = 0x05;
    pub const SET_AGC_MODE: u8 = 0x08;
}

pub struct RtlTcpSource {
    stream: TcpStream,
    sample_rate: u32,
    chunk_samples: usize,
    read_buf: Vec<u8>,
}

impl RtlTcpSource {
    pub async fn connect(host: &str, port: u16, sample_rate: u32) -> SdrResult<Self> {
        if sample_rate != 960_000 && sample_rate != 2_400_000 {
            return Err(SdrError::UnsupportedSampleRate(sample_rate));
        }

        let mut stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true).ok();

        let mut header = [0u8; DONGLE_HEADER_LEN];
        stream.read_exact(&mut header).await?;
        if &header[0..4] != b"RTL0" {
            return Err(SdrError::Protocol("missing RTL0 magic in dongle header".into()));
        }
        let tuner_type = u32::from_be_bytes(header[4..8].try_into().unwrap());
        debug!(tuner_type, "rtl_tcp dongle info received");

        let mut source =
            Self { stream, sample_rate, chunk_samples: read_chunk_samples(sample_rate), read_buf: Vec::new() };
        source.send_command(cmd::SET_SAMPLE_RATE, sample_rate).await?;
        source.send_command(cmd::SET_GAIN_MODE, 0).await?;
        source.send_command(cmd::SET_AGC_MODE, 1).await?;
        Ok(source)
    }

    async fn send_command(&mut self, c: u8, param: u32) -> SdrResult<()> {
        let mut buf = [0u8; 5];
        buf[0] = c;
        buf[1..5].copy_from_slice(&param.to_be_bytes());
        self.stream.write_all(&buf).await?;
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn set_gain(&mut self, gain_tenths_db: i32) -> SdrResult<()> {
        self.send_command(cmd::SET_GAIN, gain_tenths_db as u32).await
    }

    #[allow(dead_code)]
    pub async fn set_freq_correction_ppm(&mut self, ppm: i32) -> SdrResult<()> {
        self.send_command(cmd::SET_FREQ_CORRECTION, ppm as u32).await
    }
}

#[async_trait]
impl IqSource for RtlTcpSource {
    async fn recv(&mut self) -> SdrResult<Vec<IqSample>> {
        let byte_len = self.chunk_samples * 2;
        if self.read_buf.len() < byte_len {
            self.read_buf.resize(byte_len, 0);
        }
        self.stream.read_exact(&mut self.read_buf[..byte_len]).await?;

        let samples = self.read_buf[..byte_len]
            .chunks_exact(2)
            .map(|pair| {
                let i = (pair[0] as f32 - 127.5) / 127.5;
                let q = (pair[1] as f32 - 127.5) / 127.5;
                Complex32::new(i, q)
            })
            .collect();
        Ok(samples)
    }

    async fn set_center_freq(&mut self, hz: u32) -> SdrResult<()> {
        self.send_command(cmd::SET_FREQUENCY, hz).await
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_divides_every_cascade_total_decimation() {
        let chunk_960k = read_chunk_samples(960_000);
        assert_eq!(chunk_960k % 60, 0);
        assert!(chunk_960k >= TARGET_READ_CHUNK_SAMPLES);

        let chunk_2_4m = read_chunk_samples(2_400_000);
        assert_eq!(chunk_2_4m % 150, 0);
        assert!(chunk_2_4m >= TARGET_READ_CHUNK_SAMPLES);
    }
}
