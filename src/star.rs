
// STAR file (from the Self-defining Text Archive and Retrieval format)
// https://en.wikipedia.org/wiki/Self-defining_Text_Archive_and_Retrieval

// RELION dialect reference:
// https://relion.readthedocs.io/en/release-4.0/Reference/Conventions.html

use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};


/// an ordered list of named data blocks, each holding one table
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
	blocks: Vec<Block>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
	pub name: String,
	pub table: Table
}


impl Star {

	pub fn new() -> Self {
		Self {
			blocks: Vec::new()
		}
	}

	pub fn push(&mut self, name: impl AsRef<str>, table: Table) {
		self.blocks.push(Block {
			name: name.as_ref().to_string(),
			table
		});
	}

	pub fn blocks(&self) -> &[Block] {
		&self.blocks
	}

	pub fn table(&self, name: impl AsRef<str>) -> Result<&Table> {
		let name = name.as_ref();
		self.blocks.iter()
			.find(|block| block.name == name)
			.map(|block| &block.table)
			.context(format!("No data block named: {}", name))
	}

	/// the single-block read used for pipeline inputs: files there carry exactly one table
	pub fn first_table(&self) -> Result<&Table> {
		self.blocks.first()
			.map(|block| &block.table)
			.context("STAR file has no data blocks")
	}

	pub fn read(path: impl AsRef<Path>) -> Result<Star> {
		let path = path.as_ref();
		let text = fs::read_to_string(path)
			.context(format!("Failed to read STAR file: {}", path.to_string_lossy()))?;
		Self::parse(text)
			.context(format!("Failed to parse STAR file: {}", path.to_string_lossy()))
	}

	pub fn parse(text: impl AsRef<str>) -> Result<Star> {

		let mut blocks = Vec::<Block>::new();
		let mut block: Option<BlockBuilder> = None;

		for (linei, line) in text.as_ref().lines().enumerate() {
			let linenum = linei + 1;

			// everything after a # is a comment, including the #N ordinals on column names
			let line = match line.find('#') {
				Some(i) => &line[..i],
				None => line
			};
			let line = line.trim();
			if line.is_empty() {
				continue;
			}

			// a new data block
			if let Some(name) = line.strip_prefix("data_") {
				if let Some(block) = block.take() {
					blocks.push(block.finish());
				}
				block = Some(BlockBuilder::new(name));
				continue;
			}

			let Some(block) = block.as_mut()
				else { bail!("Content before the first data block, line {}", linenum); };

			// the start of a loop table
			if line == "loop_" {
				match block.looped {
					Loop::None => block.looped = Loop::Header(Table::new(Vec::new())),
					_ => bail!("Multiple loops in data block {}, line {}", block.name, linenum)
				}
				continue;
			}

			// a column declaration or a tag/value pair
			if let Some(tag) = line.strip_prefix('_') {
				let mut tokens = tag.split_whitespace();
				let name = tokens.next()
					.context(format!("Tag without a name, line {}", linenum))?;
				match &mut block.looped {
					Loop::Header(table) => table.columns.push(name.to_string()),
					Loop::Rows(_) => bail!("Tag after loop values in data block {}, line {}", block.name, linenum),
					Loop::None => {
						let value = tokens.collect::<Vec<_>>().join(" ");
						if value.is_empty() {
							bail!("Tag {} without a value, line {}", name, linenum);
						}
						block.pair_columns.push(name.to_string());
						block.pair_values.push(value);
					}
				}
				continue;
			}

			// anything else is a row of loop values
			match std::mem::replace(&mut block.looped, Loop::None) {
				Loop::Header(mut table) | Loop::Rows(mut table) => {
					let row = line.split_whitespace()
						.map(str::to_string)
						.collect::<Vec<_>>();
					if row.len() != table.columns.len() {
						bail!("Expected {} values but found {} in data block {}, line {}", table.columns.len(), row.len(), block.name, linenum);
					}
					table.rows.push(row);
					block.looped = Loop::Rows(table);
				}
				Loop::None => bail!("Values outside of a loop in data block {}, line {}", block.name, linenum)
			}
		}

		if let Some(block) = block.take() {
			blocks.push(block.finish());
		}

		Ok(Star {
			blocks
		})
	}

	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {

		let path = path.as_ref();

		let mut file = File::create(path)
			.context(format!("Failed to open file for writing: {}", path.to_string_lossy()))?;
		let mut writer = BufWriter::new(&mut file);

		for block in &self.blocks {
			writeln!(writer, "data_{}", block.name)?;
			writeln!(writer)?;
			writeln!(writer, "loop_")?;
			for (coli, column) in block.table.columns.iter().enumerate() {
				writeln!(writer, "_{} #{}", column, coli + 1)?;
			}
			for row in &block.table.rows {
				writeln!(writer, "{}", row.join("\t"))?;
			}
			writeln!(writer)?;
		}

		// write buffers should be flushed before dropping
		writer.flush()?;

		Ok(())
	}
}


/// named columns over rows of cells
/// cells stay strings end-to-end, so untouched columns round-trip byte-for-byte
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
	columns: Vec<String>,
	rows: Vec<Vec<String>>
}

impl Table {

	pub fn new(columns: Vec<String>) -> Self {
		Self {
			columns,
			rows: Vec::new()
		}
	}

	pub fn with_columns<'a>(columns: impl IntoIterator<Item=&'a str>) -> Self {
		Self::new(columns.into_iter()
			.map(str::to_string)
			.collect())
	}

	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	pub fn column_index(&self, name: impl AsRef<str>) -> Result<usize> {
		let name = name.as_ref();
		self.columns.iter()
			.position(|column| column == name)
			.context(format!("No column named: {}", name))
	}

	pub fn num_rows(&self) -> usize {
		self.rows.len()
	}

	pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
		if row.len() != self.columns.len() {
			bail!("Expected {} values for a row, but found {}", self.columns.len(), row.len());
		}
		self.rows.push(row);
		Ok(())
	}

	pub fn get(&self, rowi: usize, coli: usize) -> Result<&str> {
		self.rows.get(rowi)
			.and_then(|row| row.get(coli))
			.map(String::as_str)
			.context(format!("No value at row {}, column {}", rowi, coli))
	}

	pub fn get_f64(&self, rowi: usize, coli: usize) -> Result<f64> {
		let value = self.get(rowi, coli)?;
		value.parse::<f64>()
			.context(format!("Value was not a number: {}", value))
	}

	pub fn set(&mut self, rowi: usize, coli: usize, value: String) -> Result<()> {
		let cell = self.rows.get_mut(rowi)
			.and_then(|row| row.get_mut(coli))
			.context(format!("No value at row {}, column {}", rowi, coli))?;
		*cell = value;
		Ok(())
	}

	/// move all rows of another table onto the end of this one
	pub fn append(&mut self, mut other: Table) -> Result<()> {
		if other.columns != self.columns {
			bail!("Column mismatch: expected [{}], but found [{}]", self.columns.join(", "), other.columns.join(", "));
		}
		self.rows.append(&mut other.rows);
		Ok(())
	}
}


struct BlockBuilder {
	name: String,
	pair_columns: Vec<String>,
	pair_values: Vec<String>,
	looped: Loop
}

enum Loop {
	None,
	Header(Table),
	Rows(Table)
}

impl BlockBuilder {

	fn new(name: impl AsRef<str>) -> Self {
		Self {
			name: name.as_ref().to_string(),
			pair_columns: Vec::new(),
			pair_values: Vec::new(),
			looped: Loop::None
		}
	}

	fn finish(self) -> Block {
		let table = match self.looped {

			Loop::Header(table) | Loop::Rows(table) => table,

			// no loop: expose any tag/value pairs as a one-row table
			Loop::None => {
				let mut table = Table::new(self.pair_columns);
				if !table.columns.is_empty() {
					table.rows.push(self.pair_values);
				}
				table
			}
		};
		Block {
			name: self.name,
			table
		}
	}
}
