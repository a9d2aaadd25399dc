use crate::error::MqttError;

/// Writes an MQTT UTF-8 string (2-byte big-endian length prefix followed by the bytes) into
/// `out`, returning the number of bytes written.
pub fn write_str(s: &str, out: &mut [u8]) -> Result<usize, MqttError> {
    let bytes = s.as_bytes();
    let len: u16 = bytes.len().try_into().map_err(|_| MqttError::StringLengthError)?;
    if out.len() < 2 + bytes.len() {
        return Err(MqttError::OutOfMemory);
    }
    out[0..2].copy_from_slice(&len.to_be_bytes());
    out[2..2 + bytes.len()].copy_from_slice(bytes);
    Ok(2 + bytes.len())
}

/// Reads an MQTT UTF-8 string from the front of `buf`, returning the string slice and the
/// number of bytes consumed.
pub fn read_str(buf: &[u8]) -> Result<(&str, usize), MqttError> {
    if buf.len() < 2 {
        return Err(MqttError::MalformedResponse);
    }
    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    if buf.len() < 2 + len {
        return Err(MqttError::MalformedResponse);
    }
    let s = core::str::from_utf8(&buf[2..2 + len]).map_err(|_| MqttError::MalformedResponse)?;
    Ok((s, 2 + len))
}

/// Writes an MQTT binary field (2-byte big-endian length prefix followed by raw bytes).
pub fn write_binary(data: &[u8], out: &mut [u8]) -> Result<usize, MqttError> {
    let len: u16 = data.len().try_into().map_err(|_| MqttError::StringLengthError)?;
    if out.len() < 2 + data.len() {
        return Err(MqttError::OutOfMemory);
    }
    out[0..2].copy_from_slice(&len.to_be_bytes());
    out[2..2 + data.len()].copy_from_slice(data);
    Ok(2 + data.len())
}

/// Reads an MQTT binary field from the front of `buf`.
pub fn read_binary(buf: &[u8]) -> Result<(&[u8], usize), MqttError> {
    if buf.len() < 2 {
        return Err(MqttError::MalformedResponse);
    }
    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    if buf.len() < 2 + len {
        return Err(MqttError::MalformedResponse);
    }
    Ok((&buf[2..2 + len], 2 + len))
}
