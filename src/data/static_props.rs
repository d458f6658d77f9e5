//! Static props, stored in the `prps` game lump.
//!
//! The static prop record layout changed across engine releases without a companion size field. The size of each record is derived from
//! the size of the game lump instead, see [`StaticPropLayout`].

use crate::*;

/// Describes the layout of every static prop record in a `prps` game lump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StaticPropLayout {
	/// Version of the game lump, from [`GameLumpEntry::version`].
	pub version: u16,
	/// Size in bytes of a single record, derived from the size of the game lump.
	pub record_size: usize,
}

impl StaticPropLayout {
	#[inline]
	pub fn has_forced_fade_scale(&self) -> bool {
		self.version >= 5
	}

	#[inline]
	pub fn has_dx_level(&self) -> bool {
		self.version == 6 || self.version == 7
	}

	#[inline]
	pub fn has_cpu_gpu_levels(&self) -> bool {
		self.version >= 8
	}

	/// Version 7 files exist both with and without the color, so this also depends on the record size.
	#[inline]
	pub fn has_diffuse_modulation(&self) -> bool {
		self.version >= 7 && self.record_size > 72
	}

	#[inline]
	pub fn has_unknown(&self) -> bool {
		self.version >= 10
	}

	#[inline]
	pub fn has_disable_x360(&self) -> bool {
		self.version >= 9
	}

	/// Moves `reader` to the start of the next record, skipping any bytes of the current record the fields above don't cover.
	#[inline]
	pub fn skip_to_record_end(&self, reader: &mut BspByteReader, record_start: usize) {
		reader.seek(record_start + self.record_size);
	}
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StaticProp {
	pub origin: Vec3,
	/// Pitch, yaw, roll in degrees.
	pub angles: Vec3,
	/// Index into [`StaticPropSection::names`].
	pub model_idx: u16,
	/// Index into [`StaticPropSection::leaves`].
	pub first_leaf: u16,
	pub leaf_count: u16,
	pub solid: u8,
	pub flags: u8,
	pub skin: i32,
	pub fade_min_dist: f32,
	pub fade_max_dist: f32,
	/// Position to sample lighting from, if different from `origin`.
	pub lighting_origin: Vec3,

	pub forced_fade_scale: Option<f32>,
	/// Minimum and maximum DirectX level.
	pub dx_level: Option<[u16; 2]>,
	/// Minimum and maximum CPU level.
	pub cpu_level: Option<[u8; 2]>,
	/// Minimum and maximum GPU level.
	pub gpu_level: Option<[u8; 2]>,
	/// RGB color multiplier.
	pub diffuse_modulation: Option<Vec3>,
	pub unknown: Option<f32>,
	pub disable_x360: Option<bool>,
}

impl StaticProp {
	/// Size of the fields every version has.
	pub const BASE_SIZE: usize = 56;

	/// Parses a record, only reading the fields `layout` says are there. Doesn't skip to the end of the record.
	pub fn parse(reader: &mut BspByteReader, layout: &StaticPropLayout) -> BspResult<Self> {
		fn read_if<T: BspValue>(reader: &mut BspByteReader, present: bool) -> BspResult<Option<T>> {
			if present {
				reader.read().map(Some)
			} else {
				Ok(None)
			}
		}

		Ok(Self {
			origin: reader.read().job("origin")?,
			angles: reader.read().job("angles")?,
			model_idx: reader.read().job("model_idx")?,
			first_leaf: reader.read().job("first_leaf")?,
			leaf_count: reader.read().job("leaf_count")?,
			solid: reader.read().job("solid")?,
			flags: reader.read().job("flags")?,
			skin: reader.read().job("skin")?,
			fade_min_dist: reader.read().job("fade_min_dist")?,
			fade_max_dist: reader.read().job("fade_max_dist")?,
			lighting_origin: reader.read().job("lighting_origin")?,

			forced_fade_scale: read_if(reader, layout.has_forced_fade_scale()).job("forced_fade_scale")?,
			dx_level: read_if(reader, layout.has_dx_level()).job("dx_level")?,
			cpu_level: read_if(reader, layout.has_cpu_gpu_levels()).job("cpu_level")?,
			gpu_level: read_if(reader, layout.has_cpu_gpu_levels()).job("gpu_level")?,
			diffuse_modulation: read_if(reader, layout.has_diffuse_modulation()).job("diffuse_modulation")?,
			unknown: read_if(reader, layout.has_unknown()).job("unknown")?,
			disable_x360: read_if::<u8>(reader, layout.has_disable_x360()).job("disable_x360")?.map(|b| b != 0),
		})
	}
}

/// The contents of the `prps` game lump.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StaticPropSection {
	/// Model paths, referenced by [`StaticProp::model_idx`].
	pub names: Vec<FixedStr<128>>,
	/// Leaf indices, referenced by [`StaticProp::first_leaf`] and [`StaticProp::leaf_count`].
	pub leaves: Vec<u16>,
	pub props: Vec<StaticProp>,
	/// `None` if there are no props.
	pub layout: Option<StaticPropLayout>,
}

impl StaticPropSection {
	/// Parses the section from `reader`, which should be at the start of the game lump `entry` points to.
	///
	/// Leaves `reader` at the end of the last record.
	pub fn parse(reader: &mut BspByteReader, entry: &GameLumpEntry) -> BspResult<Self> {
		let start = reader.pos();

		let names: BspVariableArray<FixedStr<128>, i32> = reader.read().job("Reading model dictionary")?;
		let leaves: BspVariableArray<u16, i32> = reader.read().job("Reading leaf table")?;
		let count: i32 = reader.read().job("Reading prop count")?;
		let count = usize::try_from(count).map_err(|_| BspParseError::InvalidCount(count as i64))?;

		let mut section = Self {
			names: names.inner,
			leaves: leaves.inner,
			props: Vec::new(),
			layout: None,
		};
		if count == 0 {
			return Ok(section);
		}

		let consumed = reader.pos() - start;
		let record_size = (entry.size as usize).saturating_sub(consumed) / count;
		if record_size < StaticProp::BASE_SIZE {
			return Err(BspParseError::StaticPropLumpTooSmall {
				size: entry.size,
				consumed,
				count,
			});
		}

		let layout = StaticPropLayout {
			version: entry.version,
			record_size,
		};
		log::debug!("Reading {count} static props (version {}, {record_size} bytes each)", layout.version);

		section.props.reserve(count.min(reader.len() / record_size));
		for i in 0..count {
			let record_start = reader.pos();
			section
				.props
				.push(StaticProp::parse(reader, &layout).job_with(|| format!("Reading static prop {i}/{count}"))?);
			layout.skip_to_record_end(reader, record_start);
		}
		section.layout = Some(layout);

		Ok(section)
	}

	/// Returns the model path of `prop`, or `None` if its model index is out of range.
	pub fn model_name(&self, prop: &StaticProp) -> Option<&str> {
		self.names.get(prop.model_idx as usize).map(FixedStr::as_str)
	}
}
