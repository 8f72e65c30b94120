//! Driver for the Cypress FM24V10, a 1-Mbit (128k x 8) I²C F-RAM.
//!
//! Protocol:
//! - write: slave address (with page select bit), address MSB, address LSB,
//!   data bytes...
//! - "current address" read: slave address, data bytes...
//!
//! The chip keeps an internal address latch which is incremented after every
//! data byte (wrapping at the end of memory). There is no command to read a
//! byte at a given address; a random read needs an address-only write first.
//! The driver tracks where the latch should be to skip that write when
//! possible.

use std::time::{
	Duration,
	Instant,
};

use crate::i2c::{
	MasterStatus,
	TransferCode,
	TransferMode,
	Transport,
};

mod address;
mod cache;
mod cursor;
mod error;

pub use self::address::{
	WireAddress,
	check_address,
	encode,
};

pub use self::cache::AddressCache;

pub use self::cursor::Cursor;

pub use self::error::{
	Direction,
	FramError,
	PARAMETER_ERROR,
	TIMEOUT_ERROR,
};

pub type Address = u32;

/// 7-bit slave address with A2 = A1 = 0; bit 0 is the page select bit
pub const BASE_BUS_ADDRESS: u8 = 0x50;
/// highest memory address of the FM24V10
pub const MAX_ADDRESS: Address = 0x1_ffff;
/// memory size in bytes
pub const CAPACITY: u32 = MAX_ADDRESS + 1;
/// `AddressCache::raw` value when the latch position is unknown
pub const INVALID_ADDRESS: u32 = 0xffff_ffff;

const ADDRESS_BYTES: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Wait {
	/// poll the bus status until the transfer finished
	Blocking,
	/// return as soon as the transfer was started
	NonBlocking,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Config {
	/// 7-bit slave address of the chip, page select bit cleared
	pub slave_address: u8,
	/// upper bound for blocking waits; `None` waits forever
	pub wait_timeout: Option<Duration>,
	/// wrap the cached address at the end of memory after writes too (reads
	/// always wrap)
	pub wrap_after_write: bool,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			slave_address: BASE_BUS_ADDRESS,
			wait_timeout: Some(Duration::from_millis(100)),
			wrap_after_write: false,
		}
	}
}

fn wrapped_add(address: Address, count: usize) -> Address {
	((address as u64 + count as u64) % CAPACITY as u64) as Address
}

pub struct Fram<T: Transport> {
	bus: T,
	config: Config,
	cache: AddressCache,
}

impl<T: Transport> Fram<T> {
	/// Brings up the bus and creates a driver with unknown latch position.
	pub fn start(mut bus: T, config: Config) -> Self {
		bus.start();
		debug!("FRAM at slave address 0x{:02x}", config.slave_address);
		Fram {
			bus,
			config,
			cache: AddressCache::new(),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn slave_address(&self) -> u8 {
		self.config.slave_address
	}

	/// Address the FRAM latch is expected to point to once pending transfers
	/// are done; `None` if unknown.
	pub fn current_address(&self) -> Option<Address> {
		self.cache.get()
	}

	/// Forget the latch position; the next `read_from_address` sets it again.
	pub fn invalidate_address(&mut self) {
		self.cache.invalidate();
	}

	pub fn bus_status(&mut self) -> MasterStatus {
		self.bus.status()
	}

	pub fn bus(&mut self) -> &mut T {
		&mut self.bus
	}

	pub fn into_bus(self) -> T {
		self.bus
	}

	pub fn cursor<'a>(&'a mut self, position: Address) -> Cursor<'a, T> {
		Cursor::new(self, position)
	}

	// The FRAM latch follows a transfer unless the result code carries the
	// transport's "no error" bit pattern. With the usual all-zero pattern
	// that holds for every code, failed transfers included.
	fn latch_moved(&self, code: TransferCode) -> bool {
		!code.intersects(T::NO_ERROR)
	}

	fn result(&self, code: TransferCode) -> Result<(), FramError> {
		if code == T::NO_ERROR {
			Ok(())
		} else {
			Err(FramError::Transfer(code))
		}
	}

	fn wait_for(&mut self, direction: Direction) -> Result<(), FramError> {
		let flag = match direction {
			Direction::Read => MasterStatus::READ_COMPLETE,
			Direction::Write => MasterStatus::WRITE_COMPLETE,
		};
		let started = Instant::now();
		loop {
			if self.bus.status().contains(flag) {
				return Ok(());
			}
			if let Some(limit) = self.config.wait_timeout {
				if started.elapsed() >= limit {
					debug!("{} not complete after {:?}, latch position unknown", direction, limit);
					// can't tell whether the transfer reached the chip
					self.cache.invalidate();
					return Err(FramError::Timeout(direction));
				}
			}
			self.bus.idle();
		}
	}

	/// Points the FRAM latch to `address` with an address-only write.
	pub fn set_address(&mut self, address: Address, wait: Wait) -> Result<(), FramError> {
		let wire = encode(address, self.config.slave_address)?;

		trace!("set address 0x{:05x} (slave 0x{:02x})", address, wire.bus_address);
		let code = self.bus.write(wire.bus_address, &wire.bytes(), TransferMode::CompleteTransfer);

		if wait == Wait::Blocking {
			self.wait_for(Direction::Write)?;
		}

		if self.latch_moved(code) {
			self.cache.set(address);
		}

		self.result(code)
	}

	/// Reads `buffer.len()` bytes from wherever the FRAM latch points to.
	///
	/// With `Wait::NonBlocking` the buffer is only filled once the bus reports
	/// the read as complete; the cached address is advanced right away.
	pub fn read_from_current_address(&mut self, buffer: &mut [u8], wait: Wait) -> Result<(), FramError> {
		if buffer.is_empty() {
			return Err(FramError::EmptyBuffer);
		}
		let count = buffer.len();

		trace!("read {} bytes from current address {:?}", count, self.cache.get());
		let code = self.bus.read(self.config.slave_address, buffer, TransferMode::CompleteTransfer);

		if self.latch_moved(code) {
			if let Some(current) = self.cache.get() {
				self.cache.set(wrapped_add(current, count));
			}
		}

		if wait == Wait::Blocking {
			self.wait_for(Direction::Read)?;
		}

		self.result(code)
	}

	/// Reads `buffer.len()` bytes starting at `address`; only sets the
	/// address first if the latch isn't known to be there already.
	pub fn read_from_address(&mut self, address: Address, buffer: &mut [u8]) -> Result<(), FramError> {
		check_address(address)?;

		if self.cache.get() != Some(address) {
			self.set_address(address, Wait::Blocking)?;
		} else {
			trace!("latch already at 0x{:05x}", address);
		}

		self.read_from_current_address(buffer, Wait::Blocking)
	}

	/// Writes `data` starting at `address` in a single transfer.
	pub fn write_to_address(&mut self, address: Address, data: &[u8]) -> Result<(), FramError> {
		if data.is_empty() {
			return Err(FramError::EmptyBuffer);
		}
		let wire = encode(address, self.config.slave_address)?;

		let mut out = Vec::with_capacity(ADDRESS_BYTES + data.len());
		out.extend_from_slice(&wire.bytes());
		out.extend_from_slice(data);

		trace!("write {} bytes to 0x{:05x} (slave 0x{:02x})", data.len(), address, wire.bus_address);
		let code = self.bus.write(wire.bus_address, &out, TransferMode::CompleteTransfer);

		self.wait_for(Direction::Write)?;

		if self.latch_moved(code) {
			if self.config.wrap_after_write {
				self.cache.set(wrapped_add(address, data.len()));
			} else {
				let next = address as u64 + data.len() as u64;
				if next <= Address::max_value() as u64 {
					self.cache.set(next as Address);
				} else {
					self.cache.invalidate();
				}
			}
		}

		self.result(code)
	}
}
