//! Inter-process advisory lock: an OS-level exclusive lock on a persistent file that also names
//! its owner process.
//!
//! The operating system drops the lock when the owning process exits, so a crashed owner never
//! leaves the file locked. The file itself stays in place between owners; only its contents
//! change.

// std
use std::{
	fs::{self, File, OpenOptions},
	io::{self, ErrorKind, Read, Seek, SeekFrom, Write},
	process,
};
// crates.io
use fs2::FileExt;
// self
use crate::{_prelude::*, lock::LockError};

/// Held inter-process lock. While held, the file contains the owner's process id in decimal.
#[derive(Debug)]
pub struct LockFile {
	path: PathBuf,
	file: File,
	owner: u32,
}
impl LockFile {
	/// Takes the exclusive lock on `path` without waiting, creating the file if needed.
	pub fn try_lock(path: &Path) -> Result<Self, LockError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| LockError::Io {
				message: format!("Failed to create lock directory {}: {e}", parent.display()),
			})?;
		}

		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(false)
			.open(path)
			.map_err(|e| LockError::Io {
				message: format!("Failed to open lock file {}: {e}", path.display()),
			})?;

		if let Err(e) = file.try_lock_exclusive() {
			if is_contended(&e) {
				return Err(LockError::Busy);
			}

			return Err(LockError::Io {
				message: format!("Failed to lock {}: {e}", path.display()),
			});
		}

		let mut lock = Self { path: path.to_path_buf(), file, owner: process::id() };

		if let Err(e) = lock.write_owner(Some(lock.owner)) {
			let _ = FileExt::unlock(&lock.file);

			return Err(e);
		}

		Ok(lock)
	}

	/// Reads the process id recorded in the lock file, if the file exists and names one.
	///
	/// An unlocked file is normally empty, so `None` usually means the lock is free.
	pub fn read_owner(path: &Path) -> Result<Option<u32>, LockError> {
		match fs::read_to_string(path) {
			Ok(contents) => Ok(contents.trim().parse().ok()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(LockError::Io {
				message: format!("Failed to read lock file {}: {e}", path.display()),
			}),
		}
	}

	/// Process id recorded as owner.
	pub fn owner(&self) -> u32 {
		self.owner
	}

	/// Lock file path.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Clears the owner and drops the OS lock after confirming this process is still named.
	///
	/// A file that names another owner is left untouched and reported as
	/// [`LockError::NotOwner`]; the OS lock is still dropped with the handle.
	pub fn unlock(mut self) -> Result<(), LockError> {
		let found = self.recorded_owner()?;

		if found != Some(self.owner) {
			return Err(LockError::NotOwner { expected: self.owner, found });
		}

		self.write_owner(None)?;
		FileExt::unlock(&self.file).map_err(|e| LockError::Io {
			message: format!("Failed to unlock {}: {e}", self.path.display()),
		})
	}

	fn recorded_owner(&mut self) -> Result<Option<u32>, LockError> {
		let mut contents = String::new();

		read_from_start(&mut self.file, &mut contents).map_err(|e| LockError::Io {
			message: format!("Failed to read lock file {}: {e}", self.path.display()),
		})?;

		Ok(contents.trim().parse().ok())
	}

	fn write_owner(&mut self, owner: Option<u32>) -> Result<(), LockError> {
		overwrite(&mut self.file, owner).map_err(|e| LockError::Io {
			message: format!("Failed to record owner in {}: {e}", self.path.display()),
		})
	}
}

fn read_from_start(file: &mut File, buf: &mut String) -> io::Result<()> {
	file.seek(SeekFrom::Start(0))?;
	file.read_to_string(buf)?;

	Ok(())
}

fn overwrite(file: &mut File, owner: Option<u32>) -> io::Result<()> {
	file.set_len(0)?;
	file.seek(SeekFrom::Start(0))?;

	if let Some(owner) = owner {
		write!(file, "{owner}")?;
	}

	Ok(())
}

fn is_contended(e: &io::Error) -> bool {
	e.kind() == ErrorKind::WouldBlock
		|| e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
