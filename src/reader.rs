//! Module containing the core of reading a binary BSP file and interpreting it into structured data.

#[cfg(feature = "bevy_reflect")]
use bevy_reflect::Reflect;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::mem;

use crate::{
	data::{LumpDirectory, LumpKind},
	BspParseError, BspParseResultDoingJobExt, BspResult,
};

use glam::{I16Vec3, IVec2, Vec3};

/// Like a [`Cursor`](std::io::Cursor), but i don't have to constantly juggle buffers.
///
/// Positions are absolute offsets into the buffer the reader was created with. Seeking never fails by itself,
/// reading past the end of the buffer does.
#[derive(Clone)]
pub struct BspByteReader<'a> {
	pub ctx: &'a BspParseContext,
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> BspByteReader<'a> {
	#[inline]
	pub fn new(bytes: &'a [u8], ctx: &'a BspParseContext) -> Self {
		Self { ctx, bytes, pos: 0 }
	}

	/// Number of bytes left between the current position and the end of the buffer.
	#[inline]
	pub fn len(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	#[inline]
	pub fn read<T: BspValue>(&mut self) -> BspResult<T> {
		T::bsp_parse(self)
	}

	#[inline]
	pub fn read_bytes(&mut self, count: usize) -> BspResult<&'a [u8]> {
		let (from, to) = (self.pos, self.pos.saturating_add(count));
		if to > self.bytes.len() {
			return Err(BspParseError::BufferOutOfBounds {
				from,
				to,
				size: self.bytes.len(),
			});
		}
		let bytes = &self.bytes[from..to];
		self.pos = to;
		Ok(bytes)
	}

	#[inline]
	pub fn with_pos(&self, pos: usize) -> Self {
		Self {
			ctx: self.ctx,
			bytes: self.bytes,
			pos,
		}
	}

	/// Moves to an absolute position in the buffer.
	#[inline]
	pub fn seek(&mut self, pos: usize) {
		self.pos = pos;
	}

	/// Moves `count` bytes forward from the current position.
	#[inline]
	pub fn skip(&mut self, count: usize) {
		self.pos = self.pos.saturating_add(count);
	}

	#[inline]
	pub fn pos(&self) -> usize {
		self.pos
	}
}

/// Defines how a type should be read from a BSP file.
pub trait BspValue: Sized {
	fn bsp_parse(reader: &mut BspByteReader) -> BspResult<Self>;
	/// The nominal number of bytes this value takes up on disk. May depend on state already decoded from the header.
	fn bsp_struct_size(ctx: &BspParseContext) -> usize;
}

macro_rules! impl_bsp_parse_primitive {
	($ty:ty) => {
		impl BspValue for $ty {
			#[inline]
			fn bsp_parse(reader: &mut BspByteReader) -> BspResult<Self> {
				Ok(<$ty>::from_le_bytes(reader.read_bytes(size_of::<$ty>())?.try_into().unwrap()))
			}
			#[inline]
			fn bsp_struct_size(_ctx: &BspParseContext) -> usize {
				size_of::<$ty>()
			}
		}
	};
}

macro_rules! impl_bsp_parse_vector {
	($ty:ty : [$element:ty; $count:expr]) => {
		impl BspValue for $ty {
			fn bsp_parse(reader: &mut BspByteReader) -> BspResult<Self> {
				Ok(<$ty>::from_array(reader.read::<[$element; $count]>()?))
			}
			fn bsp_struct_size(_ctx: &BspParseContext) -> usize {
				size_of::<$element>() * $count
			}
		}
	};
}

impl_bsp_parse_primitive!(i8);

impl_bsp_parse_primitive!(u16);
impl_bsp_parse_primitive!(u32);

impl_bsp_parse_primitive!(i16);
impl_bsp_parse_primitive!(i32);

impl_bsp_parse_primitive!(f32);

impl BspValue for u8 {
	#[inline]
	fn bsp_parse(reader: &mut BspByteReader) -> BspResult<Self> {
		reader.read_bytes(1).map(|bytes| bytes[0])
	}
	#[inline]
	fn bsp_struct_size(_ctx: &BspParseContext) -> usize {
		1
	}
}

impl_bsp_parse_vector!(Vec3: [f32; 3]);
impl_bsp_parse_vector!(IVec2: [i32; 2]);
impl_bsp_parse_vector!(I16Vec3: [i16; 3]);

impl<T: BspValue + std::fmt::Debug, const N: usize> BspValue for [T; N] {
	#[inline]
	fn bsp_parse(reader: &mut BspByteReader) -> BspResult<Self> {
		// Look ma, no heap allocations!
		let mut out = [(); N].map(|_| mem::MaybeUninit::uninit());
		for out in out.iter_mut() {
			out.write(reader.read()?);
		}
		Ok(out.map(|v| unsafe { v.assume_init() }))
	}
	#[inline]
	fn bsp_struct_size(ctx: &BspParseContext) -> usize {
		T::bsp_struct_size(ctx) * N
	}
}

/// State decoded from the file header that record layouts depend on.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BspParseContext {
	/// The file-level format version from the header.
	pub version: i32,
}

/// Reads an array of records of type `T` from the lump in `lump` slot of the directory. Takes in the BSP file data, the lump directory, and the lump to read from.
///
/// Fails with [`BspParseError::MalformedLump`] if the lump's length isn't an exact multiple of the record size.
pub fn read_lump<T: BspValue>(data: &[u8], dir: &LumpDirectory, lump: LumpKind, ctx: &BspParseContext) -> BspResult<Vec<T>> {
	let entry = dir.get(lump);
	let lump_data = entry.get(data).job_with(|| format!("Reading {lump} lump"))?;
	let struct_size = T::bsp_struct_size(ctx);

	if lump_data.len() % struct_size != 0 {
		return Err(BspParseError::MalformedLump {
			lump,
			len: lump_data.len(),
			struct_size,
		});
	}
	let lump_entries = lump_data.len() / struct_size;
	log::debug!("Reading {lump_entries} {lump} records");

	let mut reader = BspByteReader::new(lump_data, ctx);
	let mut out = Vec::with_capacity(lump_entries);

	for i in 0..lump_entries {
		out.push(reader.read().job_with(|| format!("Parsing {lump} lump entry {i}"))?);
	}

	Ok(out)
}
