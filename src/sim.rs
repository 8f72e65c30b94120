//! In-memory FM24V10 behind a simulated bus master.
//!
//! Models the parts of the chip the driver relies on: the address latch with
//! auto-increment (wrapping at the end of memory), the page select bit in the
//! slave address, and NAK for foreign slave addresses. Every transfer is
//! logged so tests can check what went over the wire.

use std::collections::VecDeque;

use crate::fram::{
	Address,
	BASE_BUS_ADDRESS,
	CAPACITY,
};
use crate::i2c::{
	MasterStatus,
	TransferCode,
	TransferMode,
	Transport,
};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Transfer {
	Write {
		bus_address: u8,
		data: Vec<u8>,
	},
	Read {
		bus_address: u8,
		count: usize,
	},
}

impl Transfer {
	/// a write that only carries the two address bytes
	pub fn is_address_set(&self) -> bool {
		match self {
			Transfer::Write { data, .. } => 2 == data.len(),
			Transfer::Read { .. } => false,
		}
	}
}

pub struct SimulatedFram {
	memory: Vec<u8>,
	slave_address: u8,
	latch: Address,
	started: bool,
	status: MasterStatus,
	// status polls until a started transfer completes; `None`: never
	latency: Option<u32>,
	pending: Option<(MasterStatus, Option<u32>)>,
	injected: VecDeque<TransferCode>,
	transfers: Vec<Transfer>,
}

impl SimulatedFram {
	pub fn new() -> Self {
		SimulatedFram::with_slave_address(BASE_BUS_ADDRESS)
	}

	pub fn with_slave_address(slave_address: u8) -> Self {
		SimulatedFram {
			memory: vec![0u8; CAPACITY as usize],
			slave_address,
			latch: 0,
			started: false,
			status: MasterStatus::default(),
			latency: Some(0),
			pending: None,
			injected: VecDeque::new(),
			transfers: Vec::new(),
		}
	}

	pub fn is_started(&self) -> bool {
		self.started
	}

	pub fn memory(&self) -> &[u8] {
		&self.memory
	}

	pub fn memory_mut(&mut self) -> &mut [u8] {
		&mut self.memory
	}

	/// real position of the chip's address latch
	pub fn latch(&self) -> Address {
		self.latch
	}

	/// Number of `status()` polls before a transfer reports completion;
	/// `None` keeps every transfer in progress forever.
	pub fn set_latency(&mut self, latency: Option<u32>) {
		self.latency = latency;
	}

	/// Next transfer returns `code` without reaching the chip.
	pub fn fail_next(&mut self, code: TransferCode) {
		self.injected.push_back(code);
	}

	pub fn transfers(&self) -> &[Transfer] {
		&self.transfers
	}

	pub fn address_sets(&self) -> usize {
		self.transfers.iter().filter(|t| t.is_address_set()).count()
	}

	pub fn clear_transfers(&mut self) {
		self.transfers.clear();
	}

	fn advance(&mut self) {
		self.latch = (self.latch + 1) % CAPACITY;
	}

	fn begin(&mut self, bus_address: u8, complete: MasterStatus) -> TransferCode {
		let code = if !self.started {
			TransferCode::NOT_READY
		} else if let Some(code) = self.injected.pop_front() {
			code
		} else if bus_address & !0x01 != self.slave_address {
			TransferCode::ERR_LB_NAK
		} else {
			TransferCode::NO_ERROR
		};

		let mut done = complete;
		if code == TransferCode::ERR_LB_NAK {
			done.insert(MasterStatus::ADDRESS_NAK);
		}
		if code != TransferCode::NO_ERROR {
			done.insert(MasterStatus::TRANSFER_ERROR);
		}
		self.status = MasterStatus::IN_PROGRESS;
		self.pending = Some((done, self.latency));
		code
	}
}

impl Default for SimulatedFram {
	fn default() -> Self {
		SimulatedFram::new()
	}
}

impl Transport for SimulatedFram {
	fn start(&mut self) {
		self.started = true;
	}

	fn write(&mut self, bus_address: u8, data: &[u8], _mode: TransferMode) -> TransferCode {
		self.transfers.push(Transfer::Write { bus_address, data: data.to_vec() });
		let code = self.begin(bus_address, MasterStatus::WRITE_COMPLETE);
		if code != TransferCode::NO_ERROR || data.len() < 2 {
			return code;
		}

		let page = (bus_address & 0x01) as Address;
		self.latch = page << 16 | (data[0] as Address) << 8 | data[1] as Address;
		for &b in &data[2..] {
			self.memory[self.latch as usize] = b;
			self.advance();
		}
		code
	}

	fn read(&mut self, bus_address: u8, buffer: &mut [u8], _mode: TransferMode) -> TransferCode {
		self.transfers.push(Transfer::Read { bus_address, count: buffer.len() });
		let code = self.begin(bus_address, MasterStatus::READ_COMPLETE);
		if code != TransferCode::NO_ERROR {
			return code;
		}

		for b in buffer.iter_mut() {
			*b = self.memory[self.latch as usize];
			self.advance();
		}
		code
	}

	fn status(&mut self) -> MasterStatus {
		if let Some((done, remaining)) = self.pending {
			match remaining {
				Some(0) => {
					self.status = done;
					self.pending = None;
				},
				Some(n) => self.pending = Some((done, Some(n - 1))),
				None => (),
			}
		}
		self.status
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn started() -> SimulatedFram {
		let mut sim = SimulatedFram::new();
		sim.start();
		sim
	}

	#[test]
	fn not_ready_before_start() {
		let mut sim = SimulatedFram::new();
		assert_eq!(sim.write(0x50, &[0, 0], TransferMode::CompleteTransfer), TransferCode::NOT_READY);
		sim.start();
		assert!(sim.is_started());
		assert_eq!(sim.write(0x50, &[0, 0], TransferMode::CompleteTransfer), TransferCode::NO_ERROR);
	}

	#[test]
	fn latch_with_page_select() {
		let mut sim = started();
		sim.write(0x51, &[0x23, 0x45, 0xaa], TransferMode::CompleteTransfer);
		assert_eq!(sim.memory()[0x1_2345], 0xaa);
		assert_eq!(sim.latch(), 0x1_2346);
	}

	#[test]
	fn latch_wraps_at_end() {
		let mut sim = started();
		sim.write(0x51, &[0xff, 0xfe, 1, 2, 3], TransferMode::CompleteTransfer);
		assert_eq!(&sim.memory()[0x1_fffe..], &[1, 2]);
		assert_eq!(sim.memory()[0], 3);
		assert_eq!(sim.latch(), 1);

		sim.write(0x51, &[0xff, 0xff], TransferMode::CompleteTransfer);
		let mut buf = [0u8; 2];
		sim.read(0x50, &mut buf, TransferMode::CompleteTransfer);
		assert_eq!(buf, [2, 3]);
		assert_eq!(sim.latch(), 1);
	}

	#[test]
	fn foreign_slave_naks() {
		let mut sim = started();
		let code = sim.write(0x52, &[0x00, 0x10, 0xaa], TransferMode::CompleteTransfer);
		assert_eq!(code, TransferCode::ERR_LB_NAK);
		assert_eq!(sim.memory()[0x10], 0);
		let status = sim.status();
		assert!(status.is_write_complete());
		assert!(status.is_address_nak());
		assert!(status.has_error());
	}

	#[test]
	fn latency() {
		let mut sim = started();
		sim.set_latency(Some(2));
		sim.read(0x50, &mut [0u8; 1], TransferMode::CompleteTransfer);
		assert!(sim.status().is_in_progress());
		assert!(sim.status().is_in_progress());
		assert!(sim.status().is_read_complete());

		sim.set_latency(None);
		sim.write(0x50, &[0, 0], TransferMode::CompleteTransfer);
		for _ in 0..100 {
			assert!(!sim.status().is_write_complete());
		}
	}

	#[test]
	fn injected_failure() {
		let mut sim = started();
		sim.fail_next(TransferCode::ERR_ARB_LOST);
		assert_eq!(sim.write(0x50, &[0, 5, 1], TransferMode::CompleteTransfer), TransferCode::ERR_ARB_LOST);
		assert_eq!(sim.latch(), 0);
		assert_eq!(sim.memory()[5], 0);
		assert_eq!(sim.write(0x50, &[0, 5, 1], TransferMode::CompleteTransfer), TransferCode::NO_ERROR);
		assert_eq!(sim.memory()[5], 1);
		assert_eq!(sim.transfers().len(), 2);
		assert_eq!(sim.address_sets(), 0);
	}
}
