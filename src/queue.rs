use crate::error::MqttError;

/// An outbound packet waiting to be written to the transport.
///
/// Grounded in `OutboundPacket{transmit_time, packet}` from
/// `original_source/.../MQTT_Transport/MQTTTransmitter.h`; `transmit_time` becomes the
/// `enqueued_at_ms` field here, stamped by the caller's [`crate::clock::Clock`].
#[derive(Debug, Clone)]
pub struct OutboundPacket<const BUF: usize> {
    pub bytes: heapless::Vec<u8, BUF>,
    pub bytes_sent: usize,
    pub packet_id: u16,
    pub is_publish: bool,
    pub enqueued_at_ms: u64,
}

impl<const BUF: usize> OutboundPacket<BUF> {
    pub fn new(bytes: &[u8], packet_id: u16, is_publish: bool, enqueued_at_ms: u64) -> Result<Self, MqttError> {
        let mut v = heapless::Vec::new();
        v.extend_from_slice(bytes).map_err(|_| MqttError::OutOfMemory)?;
        Ok(Self {
            bytes: v,
            bytes_sent: 0,
            packet_id,
            is_publish,
            enqueued_at_ms,
        })
    }

    pub fn remaining(&self) -> &[u8] {
        &self.bytes[self.bytes_sent..]
    }

    pub fn is_fully_sent(&self) -> bool {
        self.bytes_sent >= self.bytes.len()
    }

    /// Sets the PUBLISH DUP bit (fixed header bit 3) ahead of a retransmission.
    pub fn mark_dup(&mut self) {
        if self.is_publish && !self.bytes.is_empty() {
            self.bytes[0] |= 0x08;
        }
    }
}

/// Ordered sequence of [`OutboundPacket`] with a cursor, bounded to `N` simultaneously queued
/// packets.
///
/// Grounded in the `TxQueue` entry of the data model: push-back for ordinary traffic,
/// push-front for the priority CONNECT handshake packet, `advance`/`remove_current` for the
/// transmitter's pump loop.
pub struct TxQueue<const N: usize, const BUF: usize> {
    packets: heapless::Deque<OutboundPacket<BUF>, N>,
}

impl<const N: usize, const BUF: usize> TxQueue<N, BUF> {
    pub const fn new() -> Self {
        Self {
            packets: heapless::Deque::new(),
        }
    }

    pub fn push_back(&mut self, packet: OutboundPacket<BUF>) -> Result<(), MqttError> {
        self.packets.push_back(packet).map_err(|_| MqttError::SendBufferFull)
    }

    /// Priority enqueue used only for the CONNECT handshake packet.
    pub fn push_front(&mut self, packet: OutboundPacket<BUF>) -> Result<(), MqttError> {
        self.packets.push_front(packet).map_err(|_| MqttError::SendBufferFull)
    }

    pub fn current(&self) -> Option<&OutboundPacket<BUF>> {
        self.packets.front()
    }

    pub fn current_mut(&mut self) -> Option<&mut OutboundPacket<BUF>> {
        self.packets.front_mut()
    }

    /// Drops the packet at the front of the queue; called once it has been fully written and
    /// needs no further retransmission bookkeeping.
    pub fn remove_current(&mut self) -> Option<OutboundPacket<BUF>> {
        self.packets.pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.packets.len() == N
    }
}

impl<const N: usize, const BUF: usize> Default for TxQueue<N, BUF> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_back_preserves_fifo_order() {
        let mut q: TxQueue<4, 8> = TxQueue::new();
        q.push_back(OutboundPacket::new(&[1], 0, false, 0).unwrap()).unwrap();
        q.push_back(OutboundPacket::new(&[2], 0, false, 0).unwrap()).unwrap();
        assert_eq!(q.remove_current().unwrap().bytes[0], 1);
        assert_eq!(q.remove_current().unwrap().bytes[0], 2);
    }

    #[test]
    fn push_front_jumps_the_queue() {
        let mut q: TxQueue<4, 8> = TxQueue::new();
        q.push_back(OutboundPacket::new(&[2], 0, false, 0).unwrap()).unwrap();
        q.push_front(OutboundPacket::new(&[1], 0, false, 0).unwrap()).unwrap();
        assert_eq!(q.remove_current().unwrap().bytes[0], 1);
    }

    #[test]
    fn reports_send_buffer_full() {
        let mut q: TxQueue<1, 8> = TxQueue::new();
        q.push_back(OutboundPacket::new(&[1], 0, false, 0).unwrap()).unwrap();
        assert_eq!(
            q.push_back(OutboundPacket::new(&[2], 0, false, 0).unwrap()),
            Err(MqttError::SendBufferFull)
        );
    }

    #[test]
    fn mark_dup_sets_bit_three_on_publish_packets_only() {
        let mut p = OutboundPacket::<8>::new(&[0x30, 0x00], 1, true, 0).unwrap();
        p.mark_dup();
        assert_eq!(p.bytes[0], 0x38);

        let mut ack = OutboundPacket::<8>::new(&[0x40, 0x00], 1, false, 0).unwrap();
        ack.mark_dup();
        assert_eq!(ack.bytes[0], 0x40);
    }
}
