use std::io;

use crate::i2c::Transport;
use super::{
	Address,
	CAPACITY,
	Fram,
	FramError,
};

fn io_error(e: FramError) -> io::Error {
	io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// `std::io` view of the FRAM memory, starting at some position.
///
/// Reads stop at the end of memory (no wrap around), writes past the end
/// fail with `WriteZero`.
pub struct Cursor<'a, T: Transport + 'a> {
	fram: &'a mut Fram<T>,
	position: u32,
}

impl<'a, T: Transport> Cursor<'a, T> {
	pub fn new(fram: &'a mut Fram<T>, position: Address) -> Self {
		Cursor {
			fram,
			position: position.min(CAPACITY),
		}
	}

	pub fn position(&self) -> Address {
		self.position
	}

	fn remaining(&self) -> usize {
		(CAPACITY - self.position) as usize
	}
}

impl<'a, T: Transport> io::Read for Cursor<'a, T> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let len = buf.len().min(self.remaining());
		if 0 == len {
			return Ok(0);
		}
		self.fram.read_from_address(self.position, &mut buf[..len]).map_err(io_error)?;
		self.position += len as u32;
		Ok(len)
	}
}

impl<'a, T: Transport> io::Write for Cursor<'a, T> {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		if data.is_empty() {
			return Ok(0);
		}
		let len = data.len().min(self.remaining());
		if 0 == len {
			return Err(io::Error::new(io::ErrorKind::WriteZero, "end of FRAM memory"));
		}
		self.fram.write_to_address(self.position, &data[..len]).map_err(io_error)?;
		self.position += len as u32;
		Ok(len)
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<'a, T: Transport> io::Seek for Cursor<'a, T> {
	fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
		let (base, offset) = match pos {
			io::SeekFrom::Start(offset) => {
				self.position = offset.min(CAPACITY as u64) as u32;
				return Ok(self.position as u64);
			},
			io::SeekFrom::End(offset) => (CAPACITY, offset),
			io::SeekFrom::Current(offset) => (self.position, offset),
		};
		// base is at most CAPACITY, so only a positive offset can overflow
		let target = (base as i64).checked_add(offset).unwrap_or(i64::max_value());
		if target < 0 {
			return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek before start of FRAM memory"));
		}
		self.position = target.min(CAPACITY as i64) as u32;
		Ok(self.position as u64)
	}
}

#[cfg(test)]
mod tests {
	use std::io::{
		Read,
		Seek,
		SeekFrom,
		Write,
	};

	use crate::fram::{
		Config,
		Fram,
		MAX_ADDRESS,
	};
	use crate::sim::SimulatedFram;

	#[test]
	fn write_then_read_back() {
		let mut fram = Fram::start(SimulatedFram::new(), Config::default());
		{
			let mut cursor = fram.cursor(0x1_fff0);
			cursor.write_all(b"hello fram").unwrap();
			assert_eq!(cursor.position(), 0x1_fffa);
		}

		let mut cursor = fram.cursor(0x1_fff0);
		let mut buf = [0u8; 10];
		cursor.read_exact(&mut buf).unwrap();
		assert_eq!(&buf, b"hello fram");
	}

	#[test]
	fn read_stops_at_end() {
		let mut fram = Fram::start(SimulatedFram::new(), Config::default());
		let mut cursor = fram.cursor(MAX_ADDRESS - 3);
		let mut data = Vec::new();
		cursor.read_to_end(&mut data).unwrap();
		assert_eq!(data.len(), 4);
		assert_eq!(cursor.read(&mut [0u8; 4]).unwrap(), 0);
	}

	#[test]
	fn write_past_end() {
		let mut fram = Fram::start(SimulatedFram::new(), Config::default());
		let mut cursor = fram.cursor(MAX_ADDRESS - 1);
		assert_eq!(cursor.write(&[1, 2, 3, 4]).unwrap(), 2);
		let err = cursor.write(&[5]).unwrap_err();
		assert_eq!(err.kind(), std::io::ErrorKind::WriteZero);
		assert_eq!(&fram.bus().memory()[MAX_ADDRESS as usize - 1..], &[1, 2]);
	}

	#[test]
	fn seek() {
		let mut fram = Fram::start(SimulatedFram::new(), Config::default());
		let mut cursor = fram.cursor(0);
		assert_eq!(cursor.seek(SeekFrom::Start(0x100)).unwrap(), 0x100);
		assert_eq!(cursor.seek(SeekFrom::Current(-0x10)).unwrap(), 0xf0);
		assert_eq!(cursor.seek(SeekFrom::End(-1)).unwrap(), MAX_ADDRESS as u64);
		assert_eq!(cursor.seek(SeekFrom::End(10)).unwrap(), MAX_ADDRESS as u64 + 1);
		assert!(cursor.seek(SeekFrom::Current(-0x2_0001)).is_err());
	}

	#[test]
	fn seek_far_out_clamps_to_end() {
		let mut fram = Fram::start(SimulatedFram::new(), Config::default());
		let mut cursor = fram.cursor(0x10);
		assert_eq!(cursor.seek(SeekFrom::End(i64::max_value())).unwrap(), MAX_ADDRESS as u64 + 1);
		assert_eq!(cursor.seek(SeekFrom::Start(0x10)).unwrap(), 0x10);
		assert_eq!(cursor.seek(SeekFrom::Current(i64::max_value())).unwrap(), MAX_ADDRESS as u64 + 1);
		assert_eq!(cursor.seek(SeekFrom::Start(u64::max_value())).unwrap(), MAX_ADDRESS as u64 + 1);

		let err = cursor.seek(SeekFrom::End(i64::min_value())).unwrap_err();
		assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
		assert_eq!(cursor.position(), MAX_ADDRESS + 1);
		assert_eq!(cursor.read(&mut [0u8; 4]).unwrap(), 0);
	}

	#[test]
	fn driver_errors_map_to_io() {
		let mut fram = Fram::start(SimulatedFram::new(), Config::default());
		fram.bus().fail_next(crate::i2c::TransferCode::ERR_LB_NAK);
		let mut cursor = fram.cursor(0x10);
		let err = cursor.write(&[1]).unwrap_err();
		assert_eq!(err.kind(), std::io::ErrorKind::Other);
		assert_eq!(err.to_string(), "I2C transfer failed: 0x04 [ERR_LB_NAK]");
		assert_eq!(cursor.position(), 0x10);
	}
}
