//! Binary framing for the GeoBrick Ethernet protocol.
//!
//! ```text
//! +--------+--------+-----------+-----------+-----------+-----------+------+
//! | reqType| request| value     | index     | length    | payload   | 0x00 |
//! | 1 byte | 1 byte | u16 LE    | u16 LE    | u16 BE    | N bytes   |      |
//! +--------+--------+-----------+-----------+-----------+-----------+------+
//! ```
//!
//! `length` is `N + 1` (payload plus terminator) and is the only big-endian
//! field; the controller rejects frames where it disagrees with the bytes
//! that follow.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;

/// Fixed header size in bytes.
pub const HEADER_LEN: usize = 8;

/// Largest payload the length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - 1;

/// Request direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestType {
    /// Host to controller.
    Download = 0x40,
    /// Controller to host.
    Upload = 0xC0,
}

/// Request code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Request {
    /// Send a line without waiting for a response.
    SendLine = 0xB0,
    /// Read a pending line.
    GetLine = 0xB1,
    /// Flush the controller's buffers.
    Flush = 0xB3,
    /// Read DPRAM.
    GetMem = 0xB4,
    /// Write DPRAM.
    SetMem = 0xB5,
    /// Set a single DPRAM bit.
    SetBit = 0xBA,
    /// Set masked DPRAM bits.
    SetBits = 0xBB,
    /// Raw port access.
    Port = 0xBE,
    /// Send a line and return the controller's response.
    GetResponse = 0xBF,
    /// Poll for a ready response.
    ReadReady = 0xC2,
    /// Fetch a response.
    Response = 0xC4,
    /// Read the rotary buffer.
    GetBuffer = 0xC5,
    /// Write the rotary buffer.
    WriteBuffer = 0xC6,
    /// Read the last write error.
    WriteError = 0xC7,
    /// Firmware download.
    FwDownload = 0xCB,
    /// Query or set the IP address.
    IpAddress = 0xE0,
}

/// Encode one frame.
pub fn frame(
    request_type: RequestType,
    request: Request,
    value: u16,
    index: u16,
    payload: &[u8],
) -> Result<Bytes, FrameError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLong { len: payload.len() });
    }
    // Checked above: fits in u16 with room for the terminator.
    let length = (payload.len() + 1) as u16;

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len() + 1);
    buf.put_u8(request_type as u8);
    buf.put_u8(request as u8);
    buf.put_u16_le(value);
    buf.put_u16_le(index);
    buf.put_u16(length);
    buf.put_slice(payload);
    buf.put_u8(0);
    Ok(buf.freeze())
}

/// Frame an ASCII program as a `download`/`getresponse` request with zero
/// value and index, which is how every command in this gateway is sent.
pub fn command_frame(program: &str) -> Result<Bytes, FrameError> {
    frame(
        RequestType::Download,
        Request::GetResponse,
        0,
        0,
        program.as_bytes(),
    )
}
