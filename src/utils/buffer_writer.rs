use crate::encoding::{write_binary, write_str, VariableByteIntegerEncoder};
use crate::error::MqttError;

/// A cursor over a mutable byte slice, used to encode outgoing packets.
///
/// Mirrors [`crate::utils::buffer_reader::BuffReader`]'s cursor shape on the write side; the
/// teacher repository does not expose a standalone writer (it encodes properties inline per
/// packet type), so this is built fresh in the same idiom.
pub struct BuffWriter<'a> {
    buffer: &'a mut [u8],
    position: usize,
}

impl<'a> BuffWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), MqttError> {
        if self.remaining() < 1 {
            return Err(MqttError::OutOfMemory);
        }
        self.buffer[self.position] = value;
        self.position += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), MqttError> {
        if self.remaining() < 2 {
            return Err(MqttError::OutOfMemory);
        }
        self.buffer[self.position..self.position + 2].copy_from_slice(&value.to_be_bytes());
        self.position += 2;
        Ok(())
    }

    pub fn write_variable_byte_int(&mut self, value: u32) -> Result<(), MqttError> {
        let encoded = VariableByteIntegerEncoder::encode(value)?;
        if self.remaining() < encoded.len() {
            return Err(MqttError::OutOfMemory);
        }
        self.buffer[self.position..self.position + encoded.len()].copy_from_slice(encoded.as_bytes());
        self.position += encoded.len();
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), MqttError> {
        let n = write_str(s, &mut self.buffer[self.position..])?;
        self.position += n;
        Ok(())
    }

    pub fn write_binary(&mut self, data: &[u8]) -> Result<(), MqttError> {
        let n = write_binary(data, &mut self.buffer[self.position..])?;
        self.position += n;
        Ok(())
    }

    /// Writes raw bytes with no length prefix (PUBLISH payload).
    pub fn write_raw(&mut self, data: &[u8]) -> Result<(), MqttError> {
        if self.remaining() < data.len() {
            return Err(MqttError::OutOfMemory);
        }
        self.buffer[self.position..self.position + data.len()].copy_from_slice(data);
        self.position += data.len();
        Ok(())
    }

    pub fn into_written(self) -> usize {
        self.position
    }
}
