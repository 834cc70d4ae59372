//! HID transport abstraction for device communication.
//!
//! Provides a trait-based transport layer so that the real hub and the mock
//! used by tests share the same interface. The transport never opens or
//! enumerates devices; it is handed an already-open handle.

use crate::error::{Error, Result};
use crate::protocol::{Packet, REPORT_LEN};
use tracing::{trace, warn};

/// Abstraction over raw HID read/write.
pub trait HidTransport: Send {
    /// Write one full-length report.
    fn write_report(&self, data: &[u8]) -> Result<()>;

    /// Read one input report, waiting at most `timeout_ms`.
    fn read_report(&self, timeout_ms: i32) -> Result<Vec<u8>>;
}

/// Encode and write a single packet.
pub fn send_packet(transport: &dyn HidTransport, packet: &Packet) -> Result<()> {
    let encoded = packet.encode()?;
    trace!(
        address = format_args!("0x{:04X}", packet.address),
        payload_len = packet.payload.len(),
        report_hex = format_args!("{:02X?}", &encoded[..packet.payload.len() + 3]),
        "UniHub TX"
    );

    transport.write_report(&encoded).inspect_err(|e| {
        warn!(
            address = format_args!("0x{:04X}", packet.address),
            error = %e,
            "UniHub write failed"
        );
    })
}

/// Write a request and read back its response.
///
/// The hub echoes the request address in the response header; anything else
/// is reported as a protocol error.
pub fn query(transport: &dyn HidTransport, request: &Packet, timeout_ms: i32) -> Result<Packet> {
    send_packet(transport, request)?;

    let raw = transport.read_report(timeout_ms)?;
    let resp = Packet::decode(&raw)?;

    trace!(
        address = format_args!("0x{:04X}", resp.address),
        payload_hex = format_args!("{:02X?}", resp.payload),
        "UniHub RX"
    );

    if resp.address != request.address {
        return Err(Error::Protocol {
            address: request.address,
            reason: format!("response addressed to 0x{:04X}", resp.address),
        });
    }

    Ok(resp)
}

/// Transport backed by an open hidapi device.
pub struct HidDeviceTransport {
    device: hidapi::HidDevice,
}

impl HidDeviceTransport {
    pub fn new(device: hidapi::HidDevice) -> Self {
        Self { device }
    }
}

impl HidTransport for HidDeviceTransport {
    fn write_report(&self, data: &[u8]) -> Result<()> {
        let written = self
            .device
            .write(data)
            .map_err(|e| Error::Hid(format!("write: {e}")))?;

        if written < data.len() {
            return Err(Error::Hid(format!(
                "short write: {written} of {} bytes",
                data.len()
            )));
        }
        Ok(())
    }

    fn read_report(&self, timeout_ms: i32) -> Result<Vec<u8>> {
        let mut response = [0u8; REPORT_LEN];
        let n = self
            .device
            .read_timeout(&mut response, timeout_ms)
            .map_err(|e| Error::Hid(format!("read_timeout: {e}")))?;

        if n == 0 {
            return Err(Error::Timeout(format!(
                "hid_read timed out after {timeout_ms}ms"
            )));
        }

        Ok(response[..n].to_vec())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{QUERY_FIRMWARE, QUERY_SERIAL, TRANSACTION_ID};

    #[test]
    fn send_packet_writes_full_report() {
        let mock = mock::MockTransport::new();
        send_packet(&mock, &Packet::new(0x3001, vec![1, 2, 3])).unwrap();

        let written = mock.written();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].len(), REPORT_LEN);
        assert_eq!(written[0][0], TRANSACTION_ID);
    }

    #[test]
    fn send_packet_propagates_write_failure() {
        let mock = mock::MockTransport::new();
        mock.fail_writes();
        let result = send_packet(&mock, &Packet::new(0x3001, vec![]));
        assert!(matches!(result, Err(Error::Hid(_))));
    }

    #[test]
    fn query_returns_echoed_response() {
        let mock = mock::MockTransport::new();
        mock.on_query(QUERY_FIRMWARE, b"1.7");

        let resp = query(&mock, &Packet::new(QUERY_FIRMWARE, vec![]), 100).unwrap();
        assert_eq!(resp.address, QUERY_FIRMWARE);
        assert_eq!(&resp.payload[..3], b"1.7");
    }

    #[test]
    fn query_rejects_mismatched_address() {
        let mock = mock::MockTransport::new();
        let mut resp = vec![TRANSACTION_ID];
        resp.extend_from_slice(&QUERY_SERIAL.to_be_bytes());
        mock.on_request(QUERY_FIRMWARE, resp);

        let result = query(&mock, &Packet::new(QUERY_FIRMWARE, vec![]), 100);
        assert!(matches!(result, Err(Error::Protocol { .. })));
    }

    #[test]
    fn query_without_response_times_out() {
        let mock = mock::MockTransport::new();
        let result = query(&mock, &Packet::new(QUERY_SERIAL, vec![]), 100);
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
