//! Parsing for Valve Source engine (`VBSP`) map files.

// So the derive macros can refer to `::vbsp` from inside this crate.
extern crate self as vbsp;

pub mod prelude;
pub(crate) use prelude::*;

pub mod data;
pub use data::*;

pub mod reader;
pub use reader::*;

pub mod util;

#[cfg(test)]
mod loading_tests;

// Re-exports
pub use glam;

use std::borrow::Cow;

pub struct BspParseInput<'a> {
	/// The data for the BSP file itself.
	pub bsp: &'a [u8],

	pub settings: BspParseSettings,
}

/// Settings to control how a BSP file is parsed.
#[derive(Debug, Clone)]
pub struct BspParseSettings {
	/// Strips `_<int>_<int>_<int>` suffixes from texture names, so that per-instance material variants (like those generated for cubemapped
	/// brushes) share the name of the material they were generated from. Default: `true`
	pub normalize_texture_names: bool,
	/// Parses the `prps` game lump. If `false`, [`BspData::static_props`] will be empty. Default: `true`
	pub parse_static_props: bool,
}

impl Default for BspParseSettings {
	fn default() -> Self {
		Self {
			normalize_texture_names: true,
			parse_static_props: true,
		}
	}
}

#[derive(Debug, Clone, Error)]
pub enum BspParseError {
	#[error("Lump ({0:?}) out of bounds of data! Malformed/corrupted BSP?")]
	LumpOutOfBounds(LumpEntry),
	#[error("Tried to read bytes from {from} to {to} from buffer of size {size}")]
	BufferOutOfBounds { from: usize, to: usize, size: usize },
	#[error("{lump} lump has a length of {len}, which is not a multiple of its record size {struct_size} ({} records)", *len as f64 / *struct_size as f64)]
	MalformedLump { lump: LumpKind, len: usize, struct_size: usize },
	#[error("Failed to parse string at index {index}, invalid utf-8 sequence: {sequence:?}")]
	InvalidString { index: usize, sequence: Vec<u8> },
	#[error("Wrong magic number! Expected {expected}, found \"{}\"", display_magic_number(found))]
	WrongMagicNumber { found: [u8; 4], expected: &'static str },
	#[error("Invalid value: {value}, acceptable:\n{acceptable}")]
	InvalidVariant { value: i64, acceptable: &'static str },
	#[error("Invalid element count {0}")]
	InvalidCount(i64),
	#[error("Static prop lump of size {size} can't hold {count} props after its {consumed} byte header")]
	StaticPropLumpTooSmall { size: u32, consumed: usize, count: usize },

	/// For telling the user exactly where the error occurred in the process.
	#[error("{0} - {1}")]
	DoingJob(String, Box<BspParseError>),
}

impl BspParseError {
	/// The error error behind any [`BspParseError::DoingJob`].
	pub fn root(&self) -> &BspParseError {
		let mut err = self;
		loop {
			match err {
				Self::DoingJob(_, child) => err = child,
				_ => return err,
			}
		}
	}

	/// Maps a UTF-8 error in `data` to [`BspParseError::InvalidString`], `offset` being where `data` starts in the lump it was read from.
	#[inline]
	pub fn map_utf8_error(data: &[u8], offset: usize) -> impl FnOnce(std::str::Utf8Error) -> Self + '_ {
		move |err| {
			let (from, len) = (err.valid_up_to(), err.error_len().unwrap_or(data.len() - err.valid_up_to()));
			BspParseError::InvalidString {
				index: offset + from,
				sequence: data[from..from + len].to_vec(),
			}
		}
	}
}

pub type BspResult<T> = Result<T, BspParseError>;

pub trait BspParseResultDoingJobExt {
	/// Like `map_err`, but specifically for adding messages to BSP errors to tell the user exactly what was going on when the error occurred.
	fn job(self, job: impl ToString) -> Self;
	/// Lazy version of [`job`](Self::job), for messages that need formatting.
	fn job_with(self, job: impl FnOnce() -> String) -> Self;
}

impl<T> BspParseResultDoingJobExt for BspResult<T> {
	#[inline]
	fn job(self, job: impl ToString) -> Self {
		self.map_err(|err| BspParseError::DoingJob(job.to_string(), Box::new(err)))
	}

	#[inline]
	fn job_with(self, job: impl FnOnce() -> String) -> Self {
		self.map_err(|err| BspParseError::DoingJob(job(), Box::new(err)))
	}
}

/// The data parsed from a BSP file.
///
/// Records reference each other by index (e.g. [`BspFace::tex_info_idx`] into [`tex_info`](Self::tex_info)), these indices are not validated when parsing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspData {
	pub header: BspHeader,

	pub planes: Vec<BspPlane>,
	pub edges: Vec<BspEdge>,
	/// Signed indices into `edges`. If negative, the edge is traversed from `b` to `a`.
	pub surface_edges: Vec<i32>,
	/// All vertex positions.
	pub vertices: Vec<Vec3>,
	pub vertex_normals: Vec<Vec3>,
	/// Indices into `vertex_normals`.
	pub vertex_normal_indices: Vec<u16>,
	pub faces: Vec<BspFace>,
	/// The faces before they were split up by the BSP process.
	pub original_faces: Vec<BspFace>,
	pub models: Vec<BspModel>,
	pub brushes: Vec<BspBrush>,
	pub brush_sides: Vec<BspBrushSide>,
	pub tex_data: Vec<BspTexData>,
	pub tex_info: Vec<BspTexInfo>,
	pub world_lights: Vec<BspWorldLight>,
	pub world_lights_hdr: Vec<BspWorldLight>,
	/// Byte offsets of each texture name in the texdata string data lump.
	pub tex_data_string_table: Vec<i32>,
	/// Texture names from the texdata string data lump, in order.
	pub texture_names: Vec<String>,
	pub nodes: Vec<BspNode>,

	pub game_lumps: GameLumpDirectory,
	pub static_props: StaticPropSection,
}

impl BspData {
	/// Parses the data from BSP input.
	pub fn parse(input: BspParseInput) -> BspResult<Self> {
		let BspParseInput { bsp, settings } = input;

		let header: BspHeader = BspByteReader::new(bsp, &BspParseContext::default()).read().job("Reading header")?;
		if header.magic != BspHeader::MAGIC {
			return Err(BspParseError::WrongMagicNumber {
				found: header.magic,
				expected: "VBSP",
			});
		}
		log::debug!("Read BSP header (version {}, map revision {})", header.version, header.map_revision);

		let ctx = BspParseContext { version: header.version };
		let dir = &header.lumps;

		let mut texture_names = read_string_lump(bsp, dir.get(LumpKind::TexDataStringData)).job("Reading texture names")?;
		if settings.normalize_texture_names {
			for name in &mut texture_names {
				let normalized = match normalize_texture_name(name) {
					Cow::Owned(normalized) => normalized,
					Cow::Borrowed(_) => continue,
				};
				*name = normalized;
			}
		}

		let game_lumps = GameLumpDirectory::parse(bsp, dir.get(LumpKind::GameLump), &ctx).job("Reading game lump directory")?;

		let mut static_props = StaticPropSection::default();
		for entry in &game_lumps.entries {
			if entry.id != GameLumpEntry::STATIC_PROPS {
				log::debug!("Skipping unrecognized game lump \"{}\"", display_magic_number(&entry.id));
				continue;
			}
			if !settings.parse_static_props {
				continue;
			}

			// Later static prop lumps replace earlier ones.
			let mut reader = BspByteReader::new(bsp, &ctx).with_pos(entry.offset as usize);
			static_props = StaticPropSection::parse(&mut reader, entry).job("Reading static prop game lump")?;
		}

		Ok(Self {
			planes: read_lump(bsp, dir, LumpKind::Planes, &ctx)?,
			edges: read_lump(bsp, dir, LumpKind::Edges, &ctx)?,
			surface_edges: read_lump(bsp, dir, LumpKind::SurfEdges, &ctx)?,
			vertices: read_lump(bsp, dir, LumpKind::Vertices, &ctx)?,
			vertex_normals: read_lump(bsp, dir, LumpKind::VertNormals, &ctx)?,
			vertex_normal_indices: read_lump(bsp, dir, LumpKind::VertNormalIndices, &ctx)?,
			faces: read_lump(bsp, dir, LumpKind::Faces, &ctx)?,
			original_faces: read_lump(bsp, dir, LumpKind::OriginalFaces, &ctx)?,
			models: read_lump(bsp, dir, LumpKind::Models, &ctx)?,
			brushes: read_lump(bsp, dir, LumpKind::Brushes, &ctx)?,
			brush_sides: read_lump(bsp, dir, LumpKind::BrushSides, &ctx)?,
			tex_data: read_lump(bsp, dir, LumpKind::TexData, &ctx)?,
			tex_info: read_lump(bsp, dir, LumpKind::TexInfo, &ctx)?,
			world_lights: read_lump(bsp, dir, LumpKind::WorldLights, &ctx)?,
			world_lights_hdr: read_lump(bsp, dir, LumpKind::WorldLightsHdr, &ctx)?,
			tex_data_string_table: read_lump(bsp, dir, LumpKind::TexDataStringTable, &ctx)?,
			nodes: read_lump(bsp, dir, LumpKind::Nodes, &ctx)?,
			texture_names,

			game_lumps,
			static_props,
			header,
		})
	}

	/// Follows a face's texture info and texture data to the name of the texture it uses. Returns `None` if any index along the way is out of range.
	pub fn face_texture_name(&self, face: &BspFace) -> Option<&str> {
		let tex_info = self.tex_info.get(usize::try_from(face.tex_info_idx).ok()?)?;
		let tex_data = self.tex_data.get(usize::try_from(tex_info.tex_data_idx).ok()?)?;
		self.texture_names.get(usize::try_from(tex_data.name_idx).ok()?).map(String::as_str)
	}
}
