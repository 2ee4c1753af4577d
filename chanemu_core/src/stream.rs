//! Stream handles binding channels to medium ports.

use crate::medium::SharedMedium;
use chanemu_env::{Direction, EmuError, EmuResult, PortId, Sample, StreamFormat, StreamResult};
use std::sync::Arc;

/// An open stream over one or more ports.
///
/// Buffer `i` of every read/write call goes to `ports()[i]`. Direction and
/// format are recorded but not enforced; the medium moves `CF32` both ways.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    medium: Arc<SharedMedium>,
    direction: Direction,
    format: StreamFormat,
    ports: Vec<PortId>,
}

impl StreamHandle {
    /// Creates a handle over `ports` in order.
    pub fn new(
        medium: Arc<SharedMedium>,
        direction: Direction,
        format: StreamFormat,
        ports: Vec<PortId>,
    ) -> Self {
        Self {
            medium,
            direction,
            format,
            ports,
        }
    }
    
    pub fn direction(&self) -> Direction {
        self.direction
    }
    
    pub fn format(&self) -> StreamFormat {
        self.format
    }
    
    /// Ports addressed by this stream, in buffer order.
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }
    
    fn check_buffers(&self, given: usize) -> EmuResult<()> {
        if given > self.ports.len() {
            return Err(EmuError::InvalidChannel {
                channel: self.ports.len(),
                count: self.ports.len(),
            });
        }
        Ok(())
    }
    
    /// Transmits the first `count` samples of each buffer on its port.
    ///
    /// Always reports a full transfer of `count`; a buffer shorter than
    /// `count` is sent as far as it goes.
    pub fn write<B: AsRef<[Sample]>>(&self, buffers: &[B], count: usize) -> EmuResult<StreamResult> {
        self.check_buffers(buffers.len())?;
        for (buffer, &port) in buffers.iter().zip(&self.ports) {
            let buffer = buffer.as_ref();
            self.medium.write(port, &buffer[..count.min(buffer.len())])?;
        }
        Ok(StreamResult::transferred(count))
    }
    
    /// Fills the first `count` samples of each buffer from its port.
    ///
    /// Always reports a full transfer of `count`; a buffer shorter than
    /// `count` is filled as far as it goes.
    pub fn read<B: AsMut<[Sample]>>(&self, buffers: &mut [B], count: usize) -> EmuResult<StreamResult> {
        self.check_buffers(buffers.len())?;
        for (buffer, &port) in buffers.iter_mut().zip(&self.ports) {
            let buffer = buffer.as_mut();
            let heard = self.medium.read(port, count)?;
            let n = count.min(buffer.len());
            buffer[..n].copy_from_slice(&heard[..n]);
        }
        Ok(StreamResult::transferred(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelParams, MediumConfig};
    
    fn setup(ports: usize) -> (Arc<SharedMedium>, Vec<PortId>) {
        let config = MediumConfig {
            buffer_len: 256,
            ..MediumConfig::seeded(7, ChannelParams::ideal())
        };
        let medium = SharedMedium::shared(config).unwrap();
        let ids = medium.register_ports(ports);
        (medium, ids)
    }
    
    #[test]
    fn test_two_channel_round_trip() {
        let (medium, ids) = setup(4);
        let tx = StreamHandle::new(medium.clone(), Direction::Tx, StreamFormat::CF32, ids[..2].to_vec());
        let rx = StreamHandle::new(medium, Direction::Rx, StreamFormat::CF32, ids[2..].to_vec());
        
        let a = vec![Sample::new(0.5, 0.0); 32];
        let b = vec![Sample::new(0.0, 0.25); 32];
        let status = tx.write(&[a, b], 32).unwrap();
        assert_eq!(status.ret, 32);
        
        let mut bufs = vec![vec![Sample::new(0.0, 0.0); 32]; 2];
        let status = rx.read(&mut bufs, 32).unwrap();
        assert_eq!(status.ret, 32);
        // Each receive port hears the sum of both transmitters
        assert!(bufs[0].iter().all(|s| *s == Sample::new(0.5, 0.25)));
        assert!(bufs[1].iter().all(|s| *s == Sample::new(0.5, 0.25)));
    }
    
    #[test]
    fn test_count_limits_write() {
        let (medium, ids) = setup(2);
        let tx = StreamHandle::new(medium.clone(), Direction::Tx, StreamFormat::CF32, vec![ids[0]]);
        let rx = StreamHandle::new(medium, Direction::Rx, StreamFormat::CF32, vec![ids[1]]);
        
        tx.write(&[vec![Sample::new(0.5, 0.0); 64]], 16).unwrap();
        let mut buf = [Sample::new(1.0, 1.0); 32];
        rx.read(&mut [&mut buf[..]], 32).unwrap();
        
        assert!(buf[..16].iter().all(|s| *s == Sample::new(0.5, 0.0)));
        assert!(buf[16..].iter().all(|s| *s == Sample::new(0.0, 0.0)));
    }
    
    #[test]
    fn test_short_buffer_still_full_transfer() {
        let (medium, ids) = setup(2);
        let rx = StreamHandle::new(medium, Direction::Rx, StreamFormat::CS16, vec![ids[1]]);
        let mut bufs = vec![vec![Sample::new(0.0, 0.0); 8]];
        let status = rx.read(&mut bufs, 100).unwrap();
        assert_eq!(status.ret, 100);
        assert_eq!(rx.format(), StreamFormat::CS16);
    }
    
    #[test]
    fn test_too_many_buffers() {
        let (medium, ids) = setup(2);
        let tx = StreamHandle::new(medium, Direction::Tx, StreamFormat::CF32, vec![ids[0]]);
        let bufs = vec![vec![Sample::new(0.0, 0.0); 4]; 2];
        let err = tx.write(&bufs, 4).unwrap_err();
        assert!(matches!(err, EmuError::InvalidChannel { channel: 1, count: 1 }));
    }
    
    #[test]
    fn test_surplus_buffers_name_first_extra() {
        let (medium, ids) = setup(2);
        let rx = StreamHandle::new(medium, Direction::Rx, StreamFormat::CF32, vec![ids[1]]);
        let mut bufs = vec![vec![Sample::new(0.0, 0.0); 4]; 3];
        let err = rx.read(&mut bufs, 4).unwrap_err();
        assert!(matches!(err, EmuError::InvalidChannel { channel: 1, count: 1 }));
    }
}
