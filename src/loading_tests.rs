use crate::*;

/// Size of the header, the directory included.
const HEADER_SIZE: usize = 4 + 4 + HEADER_LUMPS * 16 + 4;

/// Writes BSP files in memory, for testing the parser without shipping map files.
struct TestBspBuilder {
	magic: [u8; 4],
	version: i32,
	lumps: Vec<(LumpKind, Vec<u8>)>,
	/// Game lumps by id and version, written into [`LumpKind::GameLump`] along with their directory.
	game_lumps: Vec<([u8; 4], u16, Vec<u8>)>,
}

impl TestBspBuilder {
	fn new(version: i32) -> Self {
		Self {
			magic: BspHeader::MAGIC,
			version,
			lumps: Vec::new(),
			game_lumps: Vec::new(),
		}
	}

	fn lump(mut self, kind: LumpKind, data: impl Into<Vec<u8>>) -> Self {
		self.lumps.push((kind, data.into()));
		self
	}

	fn game_lump(mut self, id: [u8; 4], version: u16, data: Vec<u8>) -> Self {
		self.game_lumps.push((id, version, data));
		self
	}

	fn build(self) -> Vec<u8> {
		let mut entries = [LumpEntry::default(); HEADER_LUMPS];
		let mut body: Vec<u8> = Vec::new();

		for (kind, data) in &self.lumps {
			entries[*kind as usize] = LumpEntry {
				offset: (HEADER_SIZE + body.len()) as u32,
				len: data.len() as u32,
				version: 0,
				four_cc: [0; 4],
			};
			body.extend(data);
		}

		if !self.game_lumps.is_empty() {
			let dir_offset = HEADER_SIZE + body.len();
			let mut data_offset = dir_offset + 4 + self.game_lumps.len() * 16;

			let mut dir = (self.game_lumps.len() as i32).to_le_bytes().to_vec();
			let mut contents: Vec<u8> = Vec::new();
			for (id, version, data) in &self.game_lumps {
				dir.extend(id);
				dir.extend(0u16.to_le_bytes());
				dir.extend(version.to_le_bytes());
				dir.extend((data_offset as u32).to_le_bytes());
				dir.extend((data.len() as u32).to_le_bytes());
				contents.extend(data);
				data_offset += data.len();
			}

			entries[LumpKind::GameLump as usize] = LumpEntry {
				offset: dir_offset as u32,
				len: dir.len() as u32,
				version: 0,
				four_cc: [0; 4],
			};
			body.extend(dir);
			body.extend(contents);
		}

		let mut bsp = Vec::with_capacity(HEADER_SIZE + body.len());
		bsp.extend(self.magic);
		bsp.extend(self.version.to_le_bytes());
		for entry in entries {
			bsp.extend(entry.offset.to_le_bytes());
			bsp.extend(entry.len.to_le_bytes());
			bsp.extend(entry.version.to_le_bytes());
			bsp.extend(entry.four_cc);
		}
		bsp.extend(7i32.to_le_bytes());
		assert_eq!(bsp.len(), HEADER_SIZE);

		bsp.extend(body);
		bsp
	}
}

fn parse(bsp: &[u8]) -> BspResult<BspData> {
	BspData::parse(BspParseInput {
		bsp,
		settings: BspParseSettings::default(),
	})
}

fn le_bytes<const N: usize>(values: impl IntoIterator<Item = [u8; N]>) -> Vec<u8> {
	values.into_iter().flatten().collect()
}

fn face_bytes(first_edge: i32, num_edges: i16, tex_info_idx: i16) -> Vec<u8> {
	let mut bytes = Vec::new();
	bytes.extend(0u16.to_le_bytes());
	bytes.extend([0, 0]);
	bytes.extend(first_edge.to_le_bytes());
	bytes.extend(num_edges.to_le_bytes());
	bytes.extend(tex_info_idx.to_le_bytes());
	bytes.extend((-1i16).to_le_bytes());
	bytes.extend(0i16.to_le_bytes());
	bytes.extend([0, 255, 255, 255]);
	bytes.extend((-1i32).to_le_bytes());
	bytes.extend(64f32.to_le_bytes());
	bytes.extend([0; 16]);
	bytes.extend((-1i32).to_le_bytes());
	bytes.extend([0; 8]);
	assert_eq!(bytes.len(), 56);
	bytes
}

fn tex_info_bytes(flags: u32, tex_data_idx: i32) -> Vec<u8> {
	let mut bytes = vec![0; 64];
	bytes.extend(flags.to_le_bytes());
	bytes.extend(tex_data_idx.to_le_bytes());
	bytes
}

fn tex_data_bytes(name_idx: i32) -> Vec<u8> {
	let mut bytes = le_bytes([0.5f32, 0.5, 0.5].map(f32::to_le_bytes));
	bytes.extend(le_bytes([name_idx, 256, 256, 256, 256].map(i32::to_le_bytes)));
	bytes
}

fn world_light_bytes(version: i32) -> Vec<u8> {
	let mut bytes = le_bytes([0f32, 0., 128., 50., 50., 50., 0., 0., -1.].map(f32::to_le_bytes));
	if version > 20 {
		bytes.extend(le_bytes([0f32, 0., 0.].map(f32::to_le_bytes)));
	}
	bytes.extend(le_bytes([0i32, BspEmitType::Point as i32, 0].map(i32::to_le_bytes)));
	bytes.extend(le_bytes([0f32, 0., 0., 0., 0., 0., 1.].map(f32::to_le_bytes)));
	bytes.extend(le_bytes([0i32, -1, 0].map(i32::to_le_bytes)));
	bytes
}

fn static_prop_lump(names: &[&str], record_size: usize, count: usize) -> Vec<u8> {
	let mut bytes = (names.len() as i32).to_le_bytes().to_vec();
	for name in names {
		let mut data = [0u8; 128];
		data[..name.len()].copy_from_slice(name.as_bytes());
		bytes.extend(data);
	}
	bytes.extend(0i32.to_le_bytes());
	bytes.extend((count as i32).to_le_bytes());

	for i in 0..count {
		let mut record = le_bytes([i as f32 * 64., 0., 0., 0., 45., 0.].map(f32::to_le_bytes));
		record.extend(le_bytes([(i % names.len()) as u16, 0, 0].map(u16::to_le_bytes)));
		record.resize(record_size, 0);
		bytes.extend(record);
	}
	bytes
}

#[test]
fn empty_bsp() {
	let bsp = TestBspBuilder::new(20).build();
	let data = parse(&bsp).unwrap();

	assert_eq!(data.header.version, 20);
	assert_eq!(data.header.map_revision, 7);
	assert_eq!(data.header.lumps.iter().count(), HEADER_LUMPS);
	assert!(data.planes.is_empty());
	assert!(data.texture_names.is_empty());
	assert!(data.game_lumps.entries.is_empty());
	assert!(data.static_props.props.is_empty());
}

#[test]
fn surface_edges() {
	let bsp = TestBspBuilder::new(20)
		.lump(LumpKind::SurfEdges, le_bytes([5i32, -7, 0].map(i32::to_le_bytes)))
		.build();
	let data = parse(&bsp).unwrap();

	assert_eq!(data.surface_edges, [5, -7, 0]);
	assert_eq!(data.header.lumps.get(LumpKind::SurfEdges).len, 12);
}

#[test]
fn malformed_lump() {
	let bsp = TestBspBuilder::new(20).lump(LumpKind::Planes, vec![0; 20 * 2 + 1]).build();

	let err = parse(&bsp).unwrap_err();
	assert!(
		matches!(
			err.root(),
			BspParseError::MalformedLump {
				lump: LumpKind::Planes,
				len: 41,
				struct_size: 20
			}
		),
		"{err}"
	);
}

#[test]
fn world_light_size_depends_on_version() {
	for (version, other) in [(21, 19), (19, 21)] {
		let lights = [world_light_bytes(version), world_light_bytes(version)].concat();

		let bsp = TestBspBuilder::new(version)
			.lump(LumpKind::WorldLights, lights.clone())
			.lump(LumpKind::WorldLightsHdr, world_light_bytes(version))
			.build();
		let data = parse(&bsp).unwrap();
		assert_eq!(data.world_lights.len(), 2);
		assert_eq!(data.world_lights_hdr.len(), 1);
		assert_eq!(data.world_lights[1].ty, BspEmitType::Point);
		assert_eq!(data.world_lights[1].intensity, Vec3::splat(50.));
		assert_eq!(data.world_lights[0].shadow_cast_offset.is_some(), version > 20);

		// 176 and 200 bytes are never multiples of each other's record size.
		let bsp = TestBspBuilder::new(other).lump(LumpKind::WorldLights, lights).build();
		let err = parse(&bsp).unwrap_err();
		assert!(matches!(
			err.root(),
			BspParseError::MalformedLump {
				lump: LumpKind::WorldLights,
				..
			}
		));
	}
}

#[test]
fn wrong_magic_number() {
	let mut builder = TestBspBuilder::new(20);
	builder.magic = *b"IBSP";
	let bsp = builder.build();

	assert!(matches!(
		parse(&bsp),
		Err(BspParseError::WrongMagicNumber {
			found: [b'I', b'B', b'S', b'P'],
			..
		})
	));
}

#[test]
fn truncated_header() {
	let bsp = TestBspBuilder::new(20).build();
	let err = parse(&bsp[..100]).unwrap_err();

	assert!(matches!(err.root(), BspParseError::BufferOutOfBounds { .. }));
	assert!(parse(&[]).is_err());
}

#[test]
fn lump_out_of_bounds() {
	let mut bsp = TestBspBuilder::new(20).lump(LumpKind::Vertices, vec![0; 24]).build();
	bsp.truncate(bsp.len() - 12);

	let err = parse(&bsp).unwrap_err();
	match err.root() {
		BspParseError::LumpOutOfBounds(entry) => assert_eq!(entry.len, 24),
		err => panic!("Unexpected error: {err}"),
	}
}

#[test]
fn texture_names() {
	let names = b"maps/cp_test/brick/wall01_128_-64_32\0maps/cp_test/concrete/floor_16_32_48\0tools/toolsnodraw\0";
	let builder = || {
		TestBspBuilder::new(20)
			.lump(LumpKind::TexDataStringData, names.to_vec())
			.lump(LumpKind::TexDataStringTable, le_bytes([0i32, 37, 74].map(i32::to_le_bytes)))
			.lump(LumpKind::TexData, [tex_data_bytes(1), tex_data_bytes(2), tex_data_bytes(9)].concat())
			.lump(
				LumpKind::TexInfo,
				[tex_info_bytes(0, 0), tex_info_bytes(BspSurfaceFlags::NO_DRAW.bits(), 1), tex_info_bytes(0, 2)].concat(),
			)
			.lump(
				LumpKind::Faces,
				[face_bytes(0, 0, 0), face_bytes(0, 0, 1), face_bytes(0, 0, 2), face_bytes(0, 0, -1)].concat(),
			)
			.build()
	};

	let data = parse(&builder()).unwrap();
	assert_eq!(
		data.texture_names,
		["maps/cp_test/brick/wall01_128_-64_32", "maps/cp_test/concrete/floor", "tools/toolsnodraw"]
	);
	assert_eq!(data.tex_data_string_table, [0, 37, 74]);
	assert!(data.tex_info[0].is_visible());
	assert!(!data.tex_info[1].is_visible());

	assert_eq!(data.face_texture_name(&data.faces[0]), Some("maps/cp_test/concrete/floor"));
	assert_eq!(data.face_texture_name(&data.faces[1]), Some("tools/toolsnodraw"));
	// Texture data pointing at a name that doesn't exist.
	assert_eq!(data.face_texture_name(&data.faces[2]), None);
	assert_eq!(data.face_texture_name(&data.faces[3]), None);

	let data = BspData::parse(BspParseInput {
		bsp: &builder(),
		settings: BspParseSettings {
			normalize_texture_names: false,
			..Default::default()
		},
	})
	.unwrap();
	assert_eq!(data.texture_names[1], "maps/cp_test/concrete/floor_16_32_48");
}

#[test]
fn invalid_texture_name() {
	let bsp = TestBspBuilder::new(20)
		.lump(LumpKind::TexDataStringData, b"ok\0bad\xC3\0".to_vec())
		.build();

	let err = parse(&bsp).unwrap_err();
	assert!(matches!(err.root(), BspParseError::InvalidString { index: 6, .. }), "{err}");
}

#[test]
fn face_vertices() {
	// A triangle, with the last edge stored backwards.
	let vertices = le_bytes([0f32, 0., 0., 64., 0., 0., 0., 64., 0.].map(f32::to_le_bytes));
	let edges = le_bytes([0u16, 1, 1, 2, 0, 2].map(u16::to_le_bytes));
	let surface_edges = le_bytes([0i32, 1, -2, 40].map(i32::to_le_bytes));

	let bsp = TestBspBuilder::new(20)
		.lump(LumpKind::Vertices, vertices)
		.lump(LumpKind::Edges, edges)
		.lump(LumpKind::SurfEdges, surface_edges)
		.lump(LumpKind::Faces, [face_bytes(0, 3, 0), face_bytes(2, 2, 0)].concat())
		.build();
	let data = parse(&bsp).unwrap();

	let vertices: Vec<_> = data.faces[0].vertices(&data).collect();
	assert_eq!(vertices, [Some(Vec3::ZERO), Some(vec3(64., 0., 0.)), Some(vec3(0., 64., 0.))]);

	let vertices: Vec<_> = data.faces[1].vertices(&data).collect();
	assert_eq!(vertices, [Some(vec3(0., 64., 0.)), None]);
	assert!(!data.faces[0].is_displacement());
}

#[test]
fn static_props() {
	let bsp = TestBspBuilder::new(21)
		.game_lump(*b"dprp", 4, vec![1, 2, 3, 4])
		.game_lump(GameLumpEntry::STATIC_PROPS, 10, static_prop_lump(&["models/a.mdl", "models/b.mdl"], 84, 3))
		.build();
	let data = parse(&bsp).unwrap();

	assert_eq!(data.game_lumps.entries.len(), 2);
	assert_eq!(data.game_lumps.entries[0].id, *b"dprp");

	let section = &data.static_props;
	assert_eq!(section.layout, Some(StaticPropLayout { version: 10, record_size: 84 }));
	assert_eq!(section.names.len(), 2);
	assert_eq!(section.props.len(), 3);
	assert_eq!(section.props[2].origin, vec3(128., 0., 0.));
	assert_eq!(section.props[2].angles, vec3(0., 45., 0.));
	assert_eq!(section.model_name(&section.props[0]), Some("models/a.mdl"));
	assert_eq!(section.model_name(&section.props[1]), Some("models/b.mdl"));
	assert_eq!(section.model_name(&section.props[2]), Some("models/a.mdl"));
	assert!(section.props.iter().all(|prop| prop.diffuse_modulation.is_some() && prop.dx_level.is_none()));

	let data = BspData::parse(BspParseInput {
		bsp: &bsp,
		settings: BspParseSettings {
			parse_static_props: false,
			..Default::default()
		},
	})
	.unwrap();
	assert_eq!(data.game_lumps.entries.len(), 2);
	assert!(data.static_props.props.is_empty());
	assert!(data.static_props.names.is_empty());
}

#[test]
fn unrecognized_game_lumps_are_ignored() {
	// Contents that would fail to parse as static props.
	let bsp = TestBspBuilder::new(20).game_lump(*b"sprp", 4, vec![0xFF; 12]).build();
	let data = parse(&bsp).unwrap();

	assert_eq!(data.game_lumps.entries.len(), 1);
	assert!(data.static_props.layout.is_none());
}

#[test]
fn last_static_prop_lump_wins() {
	let bsp = TestBspBuilder::new(20)
		.game_lump(GameLumpEntry::STATIC_PROPS, 4, static_prop_lump(&["models/old.mdl"], 56, 1))
		.game_lump(GameLumpEntry::STATIC_PROPS, 5, static_prop_lump(&["models/new.mdl"], 60, 2))
		.build();
	let data = parse(&bsp).unwrap();

	let section = &data.static_props;
	assert_eq!(section.layout, Some(StaticPropLayout { version: 5, record_size: 60 }));
	assert_eq!(section.props.len(), 2);
	assert_eq!(section.model_name(&section.props[1]), Some("models/new.mdl"));
}
