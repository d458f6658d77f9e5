//! The game lump, a second directory of engine-specific lumps nested inside [`LumpKind::GameLump`].

use crate::*;

/// Points to a game lump, by absolute file offset.
#[derive(BspValue, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameLumpEntry {
	/// Identifies what the lump contains, e.g. [`GameLumpEntry::STATIC_PROPS`].
	pub id: [u8; 4],
	pub flags: u16,
	/// Format version of the game lump, independent from the file-level version.
	pub version: u16,
	/// Offset from the start of the file, not the start of the game lump.
	pub offset: u32,
	pub size: u32,
}

impl GameLumpEntry {
	pub const STATIC_PROPS: [u8; 4] = *b"prps";

	/// Returns the slice of `data` (BSP file input) that this entry points to.
	pub fn get<'a>(&self, data: &'a [u8]) -> BspResult<&'a [u8]> {
		let (from, to) = (self.offset as usize, self.offset as usize + self.size as usize);
		data.get(from..to).ok_or(BspParseError::BufferOutOfBounds { from, to, size: data.len() })
	}
}

/// The list of game lumps in the file, in the order they are stored in the directory.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameLumpDirectory {
	pub entries: Vec<GameLumpEntry>,
}

impl GameLumpDirectory {
	/// Reads the directory from the top-level game lump `entry`. `data` is the whole BSP file.
	///
	/// A file without a game lump (zero length) has an empty directory.
	pub fn parse(data: &[u8], entry: LumpEntry, ctx: &BspParseContext) -> BspResult<Self> {
		let lump_data = entry.get(data)?;
		if lump_data.is_empty() {
			return Ok(Self::default());
		}

		let entries: BspVariableArray<GameLumpEntry, i32> = BspByteReader::new(lump_data, ctx).read()?;
		log::debug!("Read {} game lump entries", entries.len());

		Ok(Self { entries: entries.inner })
	}

	/// Returns the first game lump with the specified id.
	pub fn find(&self, id: [u8; 4]) -> Option<&GameLumpEntry> {
		self.entries.iter().find(|entry| entry.id == id)
	}
}
