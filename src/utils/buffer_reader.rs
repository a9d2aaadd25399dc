use crate::encoding::{read_binary, read_str, VariableByteIntegerDecoder};
use crate::error::MqttError;

/// A cursor over an immutable byte slice, used to decode incoming packets.
///
/// Grounded in `rust_mqtt::utils::buffer_reader::BuffReader`; stripped of the MQTT5
/// property-decode helpers, since 3.1.1 control packets carry no property lists.
pub struct BuffReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BuffReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn increment_position(&mut self, by: usize) {
        self.position += by;
    }

    pub fn peek_u8(&self) -> Result<u8, MqttError> {
        self.buffer
            .get(self.position)
            .copied()
            .ok_or(MqttError::MalformedResponse)
    }

    pub fn read_u8(&mut self) -> Result<u8, MqttError> {
        let byte = self.peek_u8()?;
        self.position += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, MqttError> {
        if self.remaining() < 2 {
            return Err(MqttError::MalformedResponse);
        }
        let v = u16::from_be_bytes([self.buffer[self.position], self.buffer[self.position + 1]]);
        self.position += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32, MqttError> {
        if self.remaining() < 4 {
            return Err(MqttError::MalformedResponse);
        }
        let v = u32::from_be_bytes(self.buffer[self.position..self.position + 4].try_into().unwrap());
        self.position += 4;
        Ok(v)
    }

    pub fn read_variable_byte_int(&mut self) -> Result<u32, MqttError> {
        let (value, consumed) = VariableByteIntegerDecoder::decode(&self.buffer[self.position..])?;
        self.position += consumed;
        Ok(value)
    }

    pub fn read_string(&mut self) -> Result<&'a str, MqttError> {
        let (s, consumed) = read_str(&self.buffer[self.position..])?;
        self.position += consumed;
        Ok(s)
    }

    pub fn read_binary_data(&mut self) -> Result<&'a [u8], MqttError> {
        let (data, consumed) = read_binary(&self.buffer[self.position..])?;
        self.position += consumed;
        Ok(data)
    }

    /// Reads exactly `len` raw bytes without any length prefix (used for PUBLISH payloads,
    /// whose length is implied by the fixed header's remaining length rather than its own
    /// prefix).
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], MqttError> {
        if self.remaining() < len {
            return Err(MqttError::MalformedResponse);
        }
        let slice = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_primitives_in_order() {
        let buf = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03];
        let mut r = BuffReader::new(&buf);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16().unwrap(), 0x0002);
        assert_eq!(r.read_u32().unwrap(), 0x0000_0003);
    }

    #[test]
    fn read_past_end_is_malformed() {
        let buf = [0x01];
        let mut r = BuffReader::new(&buf);
        let _ = r.read_u8();
        assert_eq!(r.read_u8(), Err(MqttError::MalformedResponse));
    }

    #[test]
    fn reads_variable_byte_remaining_length() {
        let buf = [0x80, 0x01, 0xFF];
        let mut r = BuffReader::new(&buf);
        assert_eq!(r.read_variable_byte_int().unwrap(), 128);
        assert_eq!(r.position(), 2);
    }
}
