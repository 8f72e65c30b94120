//! Bus master interface used by the FRAM driver.
//!
//! The driver only needs buffered write and read transfers to a 7-bit slave
//! address, plus a status register it can poll for completion. Transfers may
//! run in the background; the returned `TransferCode` only tells whether the
//! transfer was accepted, completion is signalled by the `RD_CMPLT` /
//! `WR_CMPLT` flags in `status()`.

mod linux;
mod status;

pub use self::linux::{
	LinuxBus,
	open_bus,
};

pub use self::status::{
	MasterStatus,
	TransferCode,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum TransferMode {
	/// START, address, data, STOP
	CompleteTransfer,
}

pub trait Transport {
	/// bit pattern in a `TransferCode` meaning "no error"
	const NO_ERROR: TransferCode = TransferCode::NO_ERROR;

	/// one-time bring-up of the bus master, before any transfer
	fn start(&mut self);

	fn write(&mut self, bus_address: u8, data: &[u8], mode: TransferMode) -> TransferCode;
	fn read(&mut self, bus_address: u8, buffer: &mut [u8], mode: TransferMode) -> TransferCode;

	fn status(&mut self) -> MasterStatus;

	// called between two `status` polls while waiting for completion
	fn idle(&mut self) {
		std::hint::spin_loop();
	}
}

impl<'a, T: ?Sized + Transport> Transport for &'a mut T {
	const NO_ERROR: TransferCode = T::NO_ERROR;

	fn start(&mut self) {
		T::start(*self)
	}

	fn write(&mut self, bus_address: u8, data: &[u8], mode: TransferMode) -> TransferCode {
		T::write(*self, bus_address, data, mode)
	}

	fn read(&mut self, bus_address: u8, buffer: &mut [u8], mode: TransferMode) -> TransferCode {
		T::read(*self, bus_address, buffer, mode)
	}

	fn status(&mut self) -> MasterStatus {
		T::status(*self)
	}

	fn idle(&mut self) {
		T::idle(*self)
	}
}
