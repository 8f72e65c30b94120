use std::ffi::CString;
use std::fs;
use std::io::{
	self,
	Read,
	Write,
};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{
	AsRawFd,
	FromRawFd,
};
use std::path::{
	Path,
	PathBuf,
};

use libc::{
	O_CLOEXEC,
	O_RDWR,
	c_ulong,
	ioctl,
	open,
};

use super::{
	MasterStatus,
	TransferCode,
	TransferMode,
	Transport,
};

// from <linux/i2c-dev.h> and <linux/i2c.h>
const I2C_SLAVE: c_ulong = 0x0703;
const I2C_FUNCS: c_ulong = 0x0705;
const I2C_FUNC_I2C: c_ulong = 0x0000_0001;

/// I²C master backed by a Linux `i2c-dev` character device.
///
/// `read(2)` / `write(2)` on the device block until the transfer is done, so
/// a transfer is always complete when the `Transport` call returns.
#[derive(Debug)]
pub struct LinuxBus {
	file: fs::File,
	path: PathBuf,
	// slave address currently selected with I2C_SLAVE
	slave: Option<u8>,
	status: MasterStatus,
}

impl LinuxBus {
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn select(&mut self, bus_address: u8) -> io::Result<()> {
		if self.slave == Some(bus_address) {
			return Ok(());
		}
		let res = unsafe {
			ioctl(self.file.as_raw_fd(), I2C_SLAVE as _, bus_address as c_ulong)
		};
		if res < 0 {
			self.slave = None;
			return Err(io::Error::last_os_error());
		}
		trace!("{}: selected slave 0x{:02x}", self.path.display(), bus_address);
		self.slave = Some(bus_address);
		Ok(())
	}

	fn finish(&mut self, complete: MasterStatus, result: io::Result<usize>, expected: usize) -> TransferCode {
		let mut status = complete;
		let code = match result {
			Ok(n) if n == expected => TransferCode::NO_ERROR,
			Ok(n) => {
				debug!("{}: short transfer ({} of {} bytes)", self.path.display(), n, expected);
				status.insert(MasterStatus::SHORT_TRANSFER);
				TransferCode::ERR_LB_NAK
			},
			Err(e) => {
				let code = errno_code(&e);
				if code == TransferCode::ERR_LB_NAK {
					status.insert(MasterStatus::ADDRESS_NAK);
				} else if code == TransferCode::ERR_ARB_LOST {
					status.insert(MasterStatus::ARBITRATION_LOST);
				} else if code == TransferCode::ERR_BUS_ERR {
					warn!("{}: transfer failed: {}", self.path.display(), e);
					status.insert(MasterStatus::BUS_ERROR);
				}
				code
			},
		};
		if code != TransferCode::NO_ERROR {
			status.insert(MasterStatus::TRANSFER_ERROR);
		}
		self.status = status;
		code
	}
}

fn errno_code(e: &io::Error) -> TransferCode {
	match e.raw_os_error() {
		Some(libc::ENXIO) | Some(libc::EREMOTEIO) => TransferCode::ERR_LB_NAK,
		Some(libc::EAGAIN) => TransferCode::ERR_ARB_LOST,
		Some(libc::EBUSY) => TransferCode::BUS_BUSY,
		_ => TransferCode::ERR_BUS_ERR,
	}
}

impl Transport for LinuxBus {
	fn start(&mut self) {
		// the kernel adapter driver already brought the bus up
		debug!("{}: I2C bus ready", self.path.display());
	}

	fn write(&mut self, bus_address: u8, data: &[u8], _mode: TransferMode) -> TransferCode {
		self.status = MasterStatus::IN_PROGRESS;
		let result = match self.select(bus_address) {
			Ok(()) => self.file.write(data),
			Err(e) => Err(e),
		};
		self.finish(MasterStatus::WRITE_COMPLETE, result, data.len())
	}

	fn read(&mut self, bus_address: u8, buffer: &mut [u8], _mode: TransferMode) -> TransferCode {
		self.status = MasterStatus::IN_PROGRESS;
		let expected = buffer.len();
		let result = match self.select(bus_address) {
			Ok(()) => self.file.read(buffer),
			Err(e) => Err(e),
		};
		self.finish(MasterStatus::READ_COMPLETE, result, expected)
	}

	fn status(&mut self) -> MasterStatus {
		self.status
	}
}

fn inner_open(path: PathBuf) -> crate::AResult<LinuxBus> {
	let cpath = CString::new(path.as_os_str().as_bytes())?;
	let fd = unsafe { open(cpath.as_ptr(), O_RDWR | O_CLOEXEC) };
	if fd < 0 {
		return Err(io::Error::last_os_error().into());
	}
	let file = unsafe { fs::File::from_raw_fd(fd) };

	let mut funcs: c_ulong = 0;
	let res = unsafe {
		ioctl(file.as_raw_fd(), I2C_FUNCS as _, &mut funcs as *mut c_ulong)
	};
	if res < 0 {
		return Err(io::Error::last_os_error().into());
	}
	ensure!(0 != funcs & I2C_FUNC_I2C, "adapter doesn't support plain I2C transfers (funcs: 0x{:08x})", funcs);

	Ok(LinuxBus {
		file,
		path,
		slave: None,
		status: MasterStatus::default(),
	})
}

// TODO: flock() the device so two tools cannot interleave transfers to the same chip
pub fn open_bus<P: AsRef<Path>>(path: P) -> crate::AResult<LinuxBus> {
	let path = path.as_ref();
	with_context!(("couldn't open I2C bus {}", path.display()), inner_open(path.to_path_buf()))
}
