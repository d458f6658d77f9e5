//! Texture and material related data definitions.

use crate::*;
use bitflags::bitflags;

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanarTextureProjection {
	pub u_axis: Vec3,
	pub u_offset: f32,

	pub v_axis: Vec3,
	pub v_offset: f32,
}

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
	#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
	#[repr(transparent)]
	#[cfg_attr(feature = "bevy_reflect", reflect(opaque))]
	pub struct BspSurfaceFlags: u32 {
		/// The surface emits light, `value` holds the strength.
		const LIGHT = 0x1;
		/// Don't draw, indicates we should skylight and draw the 2d sky, but not the 3d skybox.
		const SKY_2D = 0x2;
		/// Don't draw, but add to the skybox.
		const SKY = 0x4;
		/// Turbulent water warp.
		const WARP = 0x8;
		const TRANSLUCENT = 0x10;
		/// A portal can't be placed on this surface.
		const NO_PORTAL = 0x20;
		/// Originally an Xbox hack to work around elimination of trigger surfaces, which breaks occluders.
		const TRIGGER = 0x40;
		/// Don't bother referencing the texture.
		const NO_DRAW = 0x80;
		/// Make a primary BSP splitter.
		const HINT = 0x100;
		/// Completely ignore, allowing non-closed brushes.
		const SKIP = 0x200;
		const NO_LIGHT = 0x400;
		/// Calculate three lightmaps for the surface for bump mapping.
		const BUMP_LIGHT = 0x800;
		const NO_SHADOWS = 0x1000;
		const NO_DECALS = 0x2000;
		/// Don't subdivide patches on this surface.
		const NO_CHOP = 0x4000;
		/// The surface is part of a hitbox.
		const HITBOX = 0x8000;
	}
}

impl BspValue for BspSurfaceFlags {
	fn bsp_parse(reader: &mut BspByteReader) -> BspResult<Self> {
		u32::bsp_parse(reader).map(Self::from_bits_truncate)
	}

	fn bsp_struct_size(ctx: &BspParseContext) -> usize {
		u32::bsp_struct_size(ctx)
	}
}

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspTexInfo {
	/// Maps world positions to texture pixels.
	pub projection: PlanarTextureProjection,
	/// Maps world positions to lightmap luxels.
	pub lightmap_projection: PlanarTextureProjection,

	pub flags: BspSurfaceFlags,
	/// Index into [`BspData::tex_data`].
	pub tex_data_idx: i32,
}

impl BspTexInfo {
	/// Whether faces using this texture info end up rendered as regular world geometry.
	pub fn is_visible(&self) -> bool {
		!self
			.flags
			.intersects(BspSurfaceFlags::NO_DRAW | BspSurfaceFlags::SKIP | BspSurfaceFlags::HINT | BspSurfaceFlags::TRIGGER)
	}
}

#[derive(BspValue, Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspTexData {
	/// Average color of the texture, used for radiosity.
	pub reflectivity: Vec3,
	/// Index into the texdata string table, and so also into [`BspData::texture_names`].
	pub name_idx: i32,

	pub width: i32,
	pub height: i32,
	pub view_width: i32,
	pub view_height: i32,
}

/// Reads a lump of null-terminated strings, like the texdata string data lump. `data` is the whole BSP file.
///
/// A single terminator at the end of the lump doesn't produce a trailing empty string.
pub fn read_string_lump(data: &[u8], entry: LumpEntry) -> BspResult<Vec<String>> {
	let lump_data = entry.get(data)?;
	let lump_data = lump_data.strip_suffix(&[0u8]).unwrap_or(lump_data);
	if lump_data.is_empty() {
		return Ok(Vec::new());
	}

	let mut strings = Vec::new();
	let mut offset = 0;

	for (i, segment) in lump_data.split(|b| *b == 0).enumerate() {
		let string = std::str::from_utf8(segment)
			.map_err(BspParseError::map_utf8_error(segment, offset))
			.job_with(|| format!("Reading string {i} at offset {offset}"))?;

		strings.push(string.to_owned());
		offset += segment.len() + 1;
	}

	log::debug!("Read {} strings", strings.len());

	Ok(strings)
}
