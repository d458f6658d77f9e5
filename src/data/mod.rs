//! BSP file data parsing.

pub mod game_lump;
pub mod geometry;
pub mod lighting;
pub mod static_props;
pub mod texture;
pub mod util;

pub use self::{game_lump::*, geometry::*, lighting::*, static_props::*, texture::*, util::*};

use crate::*;
use strum::IntoEnumIterator;

/// Number of lump slots in the header's directory.
pub const HEADER_LUMPS: usize = 64;

/// The header at the very start of every BSP file.
#[derive(BspValue, Debug, Clone)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspHeader {
	/// Should always be [`BspHeader::MAGIC`].
	pub magic: [u8; 4],
	/// The file-level format version, 19 to 21 for most Source games. Changes the layout of some records, see [`BspParseContext`].
	pub version: i32,
	pub lumps: LumpDirectory,
	/// How many times the map has been saved in the editor before being compiled.
	pub map_revision: i32,
}

impl BspHeader {
	pub const MAGIC: [u8; 4] = *b"VBSP";
}

/// Points to the chunk of data in the file a lump resides in.
#[derive(BspValue, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LumpEntry {
	pub offset: u32,
	pub len: u32,
	/// Format version of the lump itself, independent from the file-level version.
	pub version: i32,
	/// Usually zero. Holds the uncompressed size for compressed lumps.
	pub four_cc: [u8; 4],
}

impl LumpEntry {
	/// Returns the slice of `data` (BSP file input) that this entry points to.
	pub fn get<'a>(&self, data: &'a [u8]) -> BspResult<&'a [u8]> {
		let (from, to) = (self.offset as usize, self.offset as usize + self.len as usize);
		if to > data.len() {
			Err(BspParseError::LumpOutOfBounds(*self))
		} else {
			Ok(&data[from..to])
		}
	}
}

/// Every lump slot in the directory, by index.
///
/// Referenced from the [Valve Developer Community](https://developer.valvesoftware.com/wiki/BSP_(Source)#Lump_types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumCount, strum::FromRepr, strum::Display)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(usize)]
pub enum LumpKind {
	Entities = 0,
	Planes = 1,
	TexData = 2,
	Vertices = 3,
	Visibility = 4,
	Nodes = 5,
	TexInfo = 6,
	Faces = 7,
	Lighting = 8,
	Occlusion = 9,
	Leaves = 10,
	FaceIds = 11,
	Edges = 12,
	SurfEdges = 13,
	Models = 14,
	WorldLights = 15,
	LeafFaces = 16,
	LeafBrushes = 17,
	Brushes = 18,
	BrushSides = 19,
	Areas = 20,
	AreaPortals = 21,
	PropCollision = 22,
	PropHulls = 23,
	PropHullVerts = 24,
	PropTris = 25,
	DispInfo = 26,
	OriginalFaces = 27,
	PhysDisp = 28,
	PhysCollide = 29,
	VertNormals = 30,
	VertNormalIndices = 31,
	DispLightmapAlphas = 32,
	DispVerts = 33,
	DispLightmapSamplePositions = 34,
	GameLump = 35,
	LeafWaterData = 36,
	Primitives = 37,
	PrimVerts = 38,
	PrimIndices = 39,
	PakFile = 40,
	ClipPortalVerts = 41,
	Cubemaps = 42,
	/// Null-terminated texture names, one after the other.
	TexDataStringData = 43,
	/// Offsets into [`LumpKind::TexDataStringData`].
	TexDataStringTable = 44,
	Overlays = 45,
	LeafMinDistToWater = 46,
	FaceMacroTextureInfo = 47,
	DispTris = 48,
	PhysCollideSurface = 49,
	WaterOverlays = 50,
	LeafAmbientIndexHdr = 51,
	LeafAmbientIndex = 52,
	LightingHdr = 53,
	WorldLightsHdr = 54,
	LeafAmbientLightingHdr = 55,
	LeafAmbientLighting = 56,
	XZipPakFile = 57,
	FacesHdr = 58,
	MapFlags = 59,
	OverlayFades = 60,
	OverlaySystemLevels = 61,
	PhysLevel = 62,
	DispMultiBlend = 63,
}

/// Contains the list of lump entries, one for every [`LumpKind`].
#[derive(BspValue, Debug, Clone)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
pub struct LumpDirectory {
	pub entries: [LumpEntry; HEADER_LUMPS],
}

impl LumpDirectory {
	#[inline]
	pub fn get(&self, lump: LumpKind) -> LumpEntry {
		self.entries[lump as usize]
	}

	/// Iterates over every slot along with the kind of lump it holds.
	pub fn iter(&self) -> impl Iterator<Item = (LumpKind, LumpEntry)> + '_ {
		LumpKind::iter().zip(self.entries.iter().copied())
	}
}

// Serde only implements its traits for arrays up to 32 elements.
#[cfg(feature = "serde")]
impl Serialize for LumpDirectory {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_seq(self.entries.iter())
	}
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for LumpDirectory {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let entries: Vec<LumpEntry> = Vec::deserialize(deserializer)?;
		let len = entries.len();

		Ok(Self {
			entries: entries
				.try_into()
				.map_err(|_| serde::de::Error::invalid_length(len, &"64 lump entries"))?,
		})
	}
}
