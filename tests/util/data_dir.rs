
use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;


pub struct DataDir {
	dir: TempDir
}

impl DataDir {

	pub fn new() -> DataDir {
		Self {
			dir: TempDir::new()
				.expect("Failed to make temp folder")
		}
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}

	pub fn make_dir(&self, path: impl AsRef<Path>) -> PathBuf {
		let path = self.dir.path().join(path.as_ref());
		fs::create_dir_all(&path)
			.expect(&format!("Failed to make folder: {}", path.to_string_lossy()));
		path
	}

	pub fn file(&self, path: impl AsRef<Path>) -> DataFile {
		DataFile {
			path: self.dir.path().join(path.as_ref())
		}
	}
}

impl AsRef<Path> for DataDir {
	fn as_ref(&self) -> &Path {
		self.dir.path()
	}
}


pub struct DataFile {
	path: PathBuf
}

impl DataFile {

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn write(&self, txt: impl AsRef<str>) {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)
				.expect(&format!("Failed to make folder: {}", parent.to_string_lossy()));
		}
		fs::write(self.path(), txt.as_ref())
			.expect(&format!("Failed to write file: {}", self.path().to_string_lossy()));
	}

	pub fn exists(&self) -> bool {
		self.path.exists()
	}

	pub fn read(&self) -> String {
		fs::read_to_string(self.path())
			.expect(&format!("Failed to read file: {}", self.path().to_string_lossy()))
	}
}
